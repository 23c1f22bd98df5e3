//! Authentication and session-status backend messages.

use crate::error::{Error, Result};
use crate::protocol::codec::{MessageBuilder, ReadBuf, ensure_cstr};
use crate::protocol::types::TransactionStatus;

/// Authentication method constants.
pub mod auth_type {
    pub const OK: i32 = 0;
    pub const KERBEROS_V5: i32 = 2;
    pub const CLEARTEXT_PASSWORD: i32 = 3;
    pub const MD5_PASSWORD: i32 = 5;
    pub const SCM_CREDENTIAL: i32 = 6;
    pub const GSS: i32 = 7;
    pub const GSS_CONTINUE: i32 = 8;
    pub const SSPI: i32 = 9;
    pub const SASL: i32 = 10;
    pub const SASL_CONTINUE: i32 = 11;
    pub const SASL_FINAL: i32 = 12;
}

/// Authentication message from the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authentication {
    /// Authentication successful
    Ok,
    /// Kerberos V5 authentication required
    KerberosV5,
    /// Cleartext password required
    CleartextPassword,
    /// MD5 password required (with 4-byte salt)
    Md5Password { salt: [u8; 4] },
    /// SCM credentials message required
    ScmCredential,
    /// GSS authentication
    Gss,
    /// GSS continue (with additional data)
    GssContinue { data: Vec<u8> },
    /// SSPI authentication
    Sspi,
    /// SASL authentication required (with list of mechanisms)
    Sasl(AuthenticationSasl),
    /// SASL continue (with server-first-message)
    SaslContinue { data: Vec<u8> },
    /// SASL final (with server-final-message)
    SaslFinal { data: Vec<u8> },
}

impl Authentication {
    /// Authentication subtype code on the wire.
    pub fn code(&self) -> i32 {
        match self {
            Authentication::Ok => auth_type::OK,
            Authentication::KerberosV5 => auth_type::KERBEROS_V5,
            Authentication::CleartextPassword => auth_type::CLEARTEXT_PASSWORD,
            Authentication::Md5Password { .. } => auth_type::MD5_PASSWORD,
            Authentication::ScmCredential => auth_type::SCM_CREDENTIAL,
            Authentication::Gss => auth_type::GSS,
            Authentication::GssContinue { .. } => auth_type::GSS_CONTINUE,
            Authentication::Sspi => auth_type::SSPI,
            Authentication::Sasl(_) => auth_type::SASL,
            Authentication::SaslContinue { .. } => auth_type::SASL_CONTINUE,
            Authentication::SaslFinal { .. } => auth_type::SASL_FINAL,
        }
    }

    /// Decode an Authentication message payload.
    pub fn decode(buf: &mut ReadBuf<'_>) -> Result<Self> {
        let auth_type = buf.read_i32()?;

        match auth_type {
            auth_type::OK => Ok(Authentication::Ok),
            auth_type::KERBEROS_V5 => Ok(Authentication::KerberosV5),
            auth_type::CLEARTEXT_PASSWORD => Ok(Authentication::CleartextPassword),
            auth_type::MD5_PASSWORD => {
                let salt = buf
                    .read_array::<4>()
                    .map_err(|_| Error::Protocol("MD5Password: missing salt".into()))?;
                Ok(Authentication::Md5Password { salt })
            }
            auth_type::SCM_CREDENTIAL => Ok(Authentication::ScmCredential),
            auth_type::GSS => Ok(Authentication::Gss),
            auth_type::GSS_CONTINUE => Ok(Authentication::GssContinue {
                data: buf.read_rest().to_vec(),
            }),
            auth_type::SSPI => Ok(Authentication::Sspi),
            auth_type::SASL => AuthenticationSasl::decode(buf).map(Authentication::Sasl),
            auth_type::SASL_CONTINUE => Ok(Authentication::SaslContinue {
                data: buf.read_rest().to_vec(),
            }),
            auth_type::SASL_FINAL => Ok(Authentication::SaslFinal {
                data: buf.read_rest().to_vec(),
            }),
            _ => Err(Error::Protocol(format!(
                "Unknown authentication type: {}",
                auth_type
            ))),
        }
    }

    pub(crate) fn write_payload(&self, msg: &mut MessageBuilder<'_>) {
        msg.write_i32(self.code());
        match self {
            Authentication::Md5Password { salt } => msg.write_bytes(salt),
            Authentication::Sasl(sasl) => sasl.write_payload(msg),
            Authentication::GssContinue { data }
            | Authentication::SaslContinue { data }
            | Authentication::SaslFinal { data } => msg.write_bytes(data),
            _ => {}
        }
    }
}

/// AuthenticationSASL - the mechanisms the server is willing to use.
///
/// Mechanisms are kept in the server's order of preference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticationSasl {
    mechanisms: Vec<String>,
}

impl AuthenticationSasl {
    /// Create an AuthenticationSASL message.
    ///
    /// An empty name would read back as the list terminator, so it is rejected
    /// along with names containing NUL.
    pub fn new(mechanisms: Vec<String>) -> Result<Self> {
        for mechanism in &mechanisms {
            if mechanism.is_empty() {
                return Err(Error::empty("mechanisms"));
            }
            ensure_cstr("mechanisms", mechanism)?;
        }
        Ok(Self { mechanisms })
    }

    /// Mechanism names in server order.
    pub fn mechanisms(&self) -> &[String] {
        &self.mechanisms
    }

    /// Check if the server offers a mechanism.
    pub fn supports(&self, mechanism: &str) -> bool {
        self.mechanisms.iter().any(|m| m == mechanism)
    }

    fn decode(buf: &mut ReadBuf<'_>) -> Result<Self> {
        let mut mechanisms = Vec::new();
        loop {
            let mechanism = buf.read_cstr()?;
            if mechanism.is_empty() {
                break;
            }
            mechanisms.push(mechanism.to_string());
        }
        Ok(Self { mechanisms })
    }

    fn write_payload(&self, msg: &mut MessageBuilder<'_>) {
        for mechanism in &self.mechanisms {
            msg.write_cstr(mechanism);
        }
        msg.write_u8(0);
    }
}

/// BackendKeyData message - contains process ID and secret key for cancellation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendKeyData {
    process_id: u32,
    secret_key: Vec<u8>,
}

impl BackendKeyData {
    /// Shortest secret key the protocol allows (the 3.0 key size).
    pub const MIN_SECRET_KEY_LEN: usize = 4;

    /// Longest secret key the protocol allows (3.2 and later).
    pub const MAX_SECRET_KEY_LEN: usize = 256;

    /// Create a BackendKeyData message.
    ///
    /// Protocol 3.0 keys are 4 bytes; 3.2 allows up to 256.
    pub fn new(process_id: u32, secret_key: Vec<u8>) -> Result<Self> {
        Self::check_secret_key(&secret_key)?;
        Ok(Self {
            process_id,
            secret_key,
        })
    }

    /// Get the process ID.
    pub fn process_id(&self) -> u32 {
        self.process_id
    }

    /// Get the secret key.
    pub fn secret_key(&self) -> &[u8] {
        &self.secret_key
    }

    /// Reject keys the decoder would not accept back.
    pub(crate) fn check_secret_key(secret_key: &[u8]) -> Result<()> {
        if (Self::MIN_SECRET_KEY_LEN..=Self::MAX_SECRET_KEY_LEN).contains(&secret_key.len()) {
            Ok(())
        } else {
            Err(Error::InvalidField {
                field: "secret_key",
                reason: "must be between 4 and 256 bytes",
            })
        }
    }

    pub(crate) fn decode(buf: &mut ReadBuf<'_>) -> Result<Self> {
        let process_id = buf.read_u32()?;
        let secret_key = buf.read_rest();
        if Self::check_secret_key(secret_key).is_err() {
            return Err(Error::Protocol(format!(
                "BackendKeyData: invalid secret key length {}",
                secret_key.len()
            )));
        }
        Ok(Self {
            process_id,
            secret_key: secret_key.to_vec(),
        })
    }

    pub(crate) fn write_payload(&self, msg: &mut MessageBuilder<'_>) {
        msg.write_u32(self.process_id);
        msg.write_bytes(&self.secret_key);
    }
}

/// ParameterStatus message - server parameter name and value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterStatus {
    name: String,
    value: String,
}

impl ParameterStatus {
    /// Create a ParameterStatus message.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let value = value.into();
        ensure_cstr("name", &name)?;
        ensure_cstr("value", &value)?;
        Ok(Self { name, value })
    }

    /// Parameter name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parameter value
    pub fn value(&self) -> &str {
        &self.value
    }

    pub(crate) fn decode(buf: &mut ReadBuf<'_>) -> Result<Self> {
        let name = buf.read_cstr()?.to_string();
        let value = buf.read_cstr()?.to_string();
        Ok(Self { name, value })
    }

    pub(crate) fn write_payload(&self, msg: &mut MessageBuilder<'_>) {
        msg.write_cstr(&self.name);
        msg.write_cstr(&self.value);
    }
}

/// ReadyForQuery message - indicates server is ready for a new query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadyForQuery {
    status: TransactionStatus,
}

impl ReadyForQuery {
    /// Create a ReadyForQuery message.
    pub fn new(status: TransactionStatus) -> Self {
        Self { status }
    }

    /// Get the transaction status.
    pub fn transaction_status(&self) -> TransactionStatus {
        self.status
    }

    pub(crate) fn decode(buf: &mut ReadBuf<'_>) -> Result<Self> {
        let byte = buf.read_u8()?;
        let status = TransactionStatus::from_byte(byte).ok_or_else(|| {
            Error::Protocol(format!(
                "ReadyForQuery: unknown transaction status '{}'",
                byte.escape_ascii()
            ))
        })?;
        Ok(Self { status })
    }

    pub(crate) fn write_payload(&self, msg: &mut MessageBuilder<'_>) {
        msg.write_u8(self.status.as_byte());
    }
}

/// NotificationResponse message - asynchronous notification from LISTEN/NOTIFY.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationResponse {
    process_id: u32,
    channel: String,
    payload: String,
}

impl NotificationResponse {
    /// Create a NotificationResponse message.
    pub fn new(
        process_id: u32,
        channel: impl Into<String>,
        payload: impl Into<String>,
    ) -> Result<Self> {
        let channel = channel.into();
        let payload = payload.into();
        ensure_cstr("channel", &channel)?;
        ensure_cstr("payload", &payload)?;
        Ok(Self {
            process_id,
            channel,
            payload,
        })
    }

    /// PID of the notifying backend
    pub fn process_id(&self) -> u32 {
        self.process_id
    }

    /// Channel name
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Notification payload
    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub(crate) fn decode(buf: &mut ReadBuf<'_>) -> Result<Self> {
        let process_id = buf.read_u32()?;
        let channel = buf.read_cstr()?.to_string();
        let payload = buf.read_cstr()?.to_string();
        Ok(Self {
            process_id,
            channel,
            payload,
        })
    }

    pub(crate) fn write_payload(&self, msg: &mut MessageBuilder<'_>) {
        msg.write_u32(self.process_id);
        msg.write_cstr(&self.channel);
        msg.write_cstr(&self.payload);
    }
}

/// NegotiateProtocolVersion message - server doesn't support requested protocol features.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NegotiateProtocolVersion {
    newest_minor_version: u32,
    unrecognized_options: Vec<String>,
}

impl NegotiateProtocolVersion {
    /// Create a NegotiateProtocolVersion message.
    pub fn new(newest_minor_version: u32, unrecognized_options: Vec<String>) -> Result<Self> {
        for option in &unrecognized_options {
            ensure_cstr("unrecognized_options", option)?;
        }
        Ok(Self {
            newest_minor_version,
            unrecognized_options,
        })
    }

    /// Newest minor protocol version supported
    pub fn newest_minor_version(&self) -> u32 {
        self.newest_minor_version
    }

    /// Unrecognized protocol options
    pub fn unrecognized_options(&self) -> &[String] {
        &self.unrecognized_options
    }

    pub(crate) fn decode(buf: &mut ReadBuf<'_>) -> Result<Self> {
        let newest_minor_version = buf.read_u32()?;
        let num_options = buf.read_u32()?;

        // Each option takes at least one byte, so the count is bounded by the payload.
        if num_options as usize > buf.remaining() {
            return Err(Error::Protocol(format!(
                "NegotiateProtocolVersion: {} options in {} bytes",
                num_options,
                buf.remaining()
            )));
        }

        let mut unrecognized_options = Vec::with_capacity(num_options as usize);
        for _ in 0..num_options {
            unrecognized_options.push(buf.read_cstr()?.to_string());
        }

        Ok(Self {
            newest_minor_version,
            unrecognized_options,
        })
    }

    pub(crate) fn write_payload(&self, msg: &mut MessageBuilder<'_>) {
        msg.write_u32(self.newest_minor_version);
        msg.write_u32(self.unrecognized_options.len() as u32);
        for option in &self.unrecognized_options {
            msg.write_cstr(option);
        }
    }
}
