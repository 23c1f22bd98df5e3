//! Startup-phase messages.
//!
//! Startup-phase messages carry no type byte: they are a length followed by
//! a 4-byte code.

use crate::error::{Error, Result};
use crate::protocol::backend::BackendKeyData;
use crate::protocol::codec::{MessageBuilder, ensure_cstr, ensure_frame_len};

/// Protocol version 3.0 (0x00030000)
pub const PROTOCOL_VERSION_3_0: i32 = 196608;

/// Protocol version 3.2 (0x00030002)
pub const PROTOCOL_VERSION_3_2: i32 = 196610;

/// SSL request code
pub const SSL_REQUEST_CODE: i32 = 80877103;

/// GSSAPI encryption request code
pub const GSSENC_REQUEST_CODE: i32 = 80877104;

/// Cancel request code
pub const CANCEL_REQUEST_CODE: i32 = 80877102;

/// StartupMessage - opens a session.
///
/// Parameters are sent in order. `user` is required; `database`, `options`,
/// `application_name`, `client_encoding` and friends are optional.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartupMessage {
    protocol_version: i32,
    parameters: Vec<(String, String)>,
}

impl StartupMessage {
    /// Create a protocol 3.0 StartupMessage.
    pub fn new(parameters: Vec<(String, String)>) -> Result<Self> {
        Self::with_version(PROTOCOL_VERSION_3_0, parameters)
    }

    /// Create a StartupMessage requesting a specific protocol version.
    pub fn with_version(protocol_version: i32, parameters: Vec<(String, String)>) -> Result<Self> {
        for (name, value) in &parameters {
            // An empty name would read as the list terminator
            if name.is_empty() {
                return Err(Error::InvalidField {
                    field: "parameters",
                    reason: "must not contain an empty name",
                });
            }
            ensure_cstr("parameters", name)?;
            ensure_cstr("parameters", value)?;
        }

        let payload_len = parameters.iter().fold(5, |acc: usize, (name, value)| {
            acc.saturating_add(name.len() + 1)
                .saturating_add(value.len() + 1)
        });
        ensure_frame_len("parameters", payload_len)?;

        match parameters.iter().find(|(name, _)| name == "user") {
            Some((_, user)) if !user.is_empty() => {}
            _ => return Err(Error::empty("user")),
        }

        Ok(Self {
            protocol_version,
            parameters,
        })
    }

    /// Requested protocol version.
    pub fn protocol_version(&self) -> i32 {
        self.protocol_version
    }

    /// Parameters in wire order.
    pub fn parameters(&self) -> &[(String, String)] {
        &self.parameters
    }

    /// Look up a parameter by name.
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Append the encoded message to `buf`.
    pub fn encode(&self, buf: &mut Vec<u8>) -> Result<()> {
        let mut msg = MessageBuilder::new_startup(buf);
        msg.write_i32(self.protocol_version);
        for (name, value) in &self.parameters {
            msg.write_cstr(name);
            msg.write_cstr(value);
        }
        // Terminator
        msg.write_u8(0);
        msg.finish()
    }
}

/// CancelRequest - sent on a new connection to cancel a running query.
///
/// The server closes the connection without replying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelRequest {
    process_id: u32,
    secret_key: Vec<u8>,
}

impl CancelRequest {
    /// Create a CancelRequest message.
    pub fn new(process_id: u32, secret_key: Vec<u8>) -> Result<Self> {
        BackendKeyData::check_secret_key(&secret_key)?;
        Ok(Self {
            process_id,
            secret_key,
        })
    }

    /// Cancel the session identified by a BackendKeyData message.
    pub fn for_key(key: &BackendKeyData) -> Self {
        Self {
            process_id: key.process_id(),
            secret_key: key.secret_key().to_vec(),
        }
    }

    /// Target backend process ID.
    pub fn process_id(&self) -> u32 {
        self.process_id
    }

    /// Secret key of the target session.
    pub fn secret_key(&self) -> &[u8] {
        &self.secret_key
    }

    /// Append the encoded message to `buf`.
    pub fn encode(&self, buf: &mut Vec<u8>) -> Result<()> {
        let mut msg = MessageBuilder::new_startup(buf);
        msg.write_i32(CANCEL_REQUEST_CODE);
        msg.write_u32(self.process_id);
        msg.write_bytes(&self.secret_key);
        msg.finish()
    }
}

/// Write an SSLRequest message.
///
/// This is sent before StartupMessage to request TLS encryption.
/// Server responds with single byte: 'S' (accepted) or 'N' (rejected).
pub fn write_ssl_request(buf: &mut Vec<u8>) -> Result<()> {
    let mut msg = MessageBuilder::new_startup(buf);
    msg.write_i32(SSL_REQUEST_CODE);
    msg.finish()
}

/// Write a GSSENCRequest message.
///
/// Server responds with single byte: 'G' (accepted) or 'N' (rejected).
pub fn write_gssenc_request(buf: &mut Vec<u8>) -> Result<()> {
    let mut msg = MessageBuilder::new_startup(buf);
    msg.write_i32(GSSENC_REQUEST_CODE);
    msg.finish()
}
