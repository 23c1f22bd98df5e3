//! Authentication messages and the password/SCRAM computations behind them.
//!
//! PasswordMessage, SASLInitialResponse, SASLResponse and GSSResponse all
//! share the 'p' type byte; the server knows which one to expect from the
//! authentication request it sent.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};
use crate::protocol::codec::{
    MessageBuilder, ensure_cstr, ensure_frame_len, ensure_i32_len, length_prefixed_len,
};

/// Name of the only SASL mechanism implemented here.
pub const SCRAM_SHA_256: &str = "SCRAM-SHA-256";

/// PasswordMessage - cleartext or MD5-hashed password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordMessage {
    password: String,
}

impl PasswordMessage {
    /// Create a PasswordMessage.
    pub fn new(password: impl Into<String>) -> Result<Self> {
        let password = password.into();
        ensure_cstr("password", &password)?;
        ensure_frame_len("password", password.len() + 1)?;
        Ok(Self { password })
    }

    /// Create a PasswordMessage answering an MD5 challenge.
    pub fn md5(user: &str, password: &str, salt: &[u8; 4]) -> Result<Self> {
        Self::new(md5_password(user, password, salt))
    }

    /// Password as sent.
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Append the encoded message to `buf`.
    pub fn encode(&self, buf: &mut Vec<u8>) -> Result<()> {
        let mut msg = MessageBuilder::new(buf, super::msg_type::PASSWORD);
        msg.write_cstr(&self.password);
        msg.finish()
    }
}

/// Compute MD5 password hash.
///
/// PostgreSQL MD5 password format: "md5" + md5(md5(password + username) + salt)
pub fn md5_password(username: &str, password: &str, salt: &[u8; 4]) -> String {
    use md5::Md5;

    // First hash: md5(password + username)
    let mut hasher = Md5::new();
    hasher.update(password.as_bytes());
    hasher.update(username.as_bytes());
    let first_hash_hex = format!("{:x}", hasher.finalize());

    // Second hash: md5(first_hash_hex + salt)
    let mut hasher = Md5::new();
    hasher.update(first_hash_hex.as_bytes());
    hasher.update(salt);

    format!("md5{:x}", hasher.finalize())
}

/// SASLInitialResponse - selects a mechanism and carries its first message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaslInitialResponse {
    mechanism: String,
    initial_response: Option<Vec<u8>>,
}

impl SaslInitialResponse {
    /// Create a SASLInitialResponse message.
    ///
    /// `initial_response` is `None` when the mechanism has no initial
    /// client response; it is then sent with length -1.
    pub fn new(mechanism: impl Into<String>, initial_response: Option<Vec<u8>>) -> Result<Self> {
        let mechanism = mechanism.into();
        if mechanism.is_empty() {
            return Err(Error::empty("mechanism"));
        }
        ensure_cstr("mechanism", &mechanism)?;
        if let Some(data) = &initial_response {
            ensure_i32_len("initial_response", data.len())?;
        }
        let payload_len = (mechanism.len() + 1)
            .saturating_add(length_prefixed_len([initial_response.as_deref()]));
        ensure_frame_len("initial_response", payload_len)?;
        Ok(Self {
            mechanism,
            initial_response,
        })
    }

    /// Selected mechanism name.
    pub fn mechanism(&self) -> &str {
        &self.mechanism
    }

    /// Mechanism-specific initial response.
    pub fn initial_response(&self) -> Option<&[u8]> {
        self.initial_response.as_deref()
    }

    /// Append the encoded message to `buf`.
    pub fn encode(&self, buf: &mut Vec<u8>) -> Result<()> {
        let mut msg = MessageBuilder::new(buf, super::msg_type::PASSWORD);
        msg.write_cstr(&self.mechanism);
        msg.write_length_prefixed(self.initial_response.as_deref());
        msg.finish()
    }
}

/// SASLResponse - continuation data for the selected mechanism.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaslResponse {
    data: Vec<u8>,
}

impl SaslResponse {
    /// Create a SASLResponse message.
    pub fn new(data: Vec<u8>) -> Result<Self> {
        ensure_frame_len("data", data.len())?;
        Ok(Self { data })
    }

    /// Mechanism-specific data.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Append the encoded message to `buf`.
    pub fn encode(&self, buf: &mut Vec<u8>) -> Result<()> {
        let mut msg = MessageBuilder::new(buf, super::msg_type::PASSWORD);
        msg.write_bytes(&self.data);
        msg.finish()
    }
}

/// GSSResponse - GSSAPI or SSPI token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GssResponse {
    data: Vec<u8>,
}

impl GssResponse {
    /// Create a GSSResponse message.
    pub fn new(data: Vec<u8>) -> Result<Self> {
        ensure_frame_len("data", data.len())?;
        Ok(Self { data })
    }

    /// Token bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Append the encoded message to `buf`.
    pub fn encode(&self, buf: &mut Vec<u8>) -> Result<()> {
        let mut msg = MessageBuilder::new(buf, super::msg_type::PASSWORD);
        msg.write_bytes(&self.data);
        msg.finish()
    }
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Hmac<Sha256>> {
    let mut mac = <Hmac<Sha256> as Mac>::new_from_slice(key)
        .map_err(|e| Error::Auth(format!("HMAC error: {}", e)))?;
    mac.update(data);
    Ok(mac)
}

/// SCRAM-SHA-256 client (RFC 5802 / RFC 7677) without channel binding.
pub struct ScramClient {
    /// Client nonce
    nonce: String,
    /// Username sent in client-first (PostgreSQL ignores it)
    username: String,
    /// Password
    password: String,
    /// Auth message for signature verification
    auth_message: Option<String>,
    /// Salted password for server signature verification
    salted_password: Option<[u8; 32]>,
}

impl std::fmt::Debug for ScramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScramClient")
            .field("nonce", &self.nonce)
            .finish_non_exhaustive()
    }
}

impl ScramClient {
    /// GS2 header: no channel binding, no authzid.
    const GS2_HEADER: &'static str = "n,,";

    /// Highest PBKDF2 iteration count accepted from a server.
    pub const MAX_ITERATIONS: u32 = 10_000_000;

    /// Create a new SCRAM client with a random nonce.
    pub fn new(password: &str) -> Self {
        use rand::Rng;

        // 24 random bytes, base64 encoded
        let mut nonce_bytes = [0u8; 24];
        rand::rng().fill(&mut nonce_bytes);
        Self::with_nonce("", password, BASE64.encode(nonce_bytes))
    }

    /// Create a SCRAM client with a caller-chosen username and nonce.
    pub fn with_nonce(username: &str, password: &str, nonce: impl Into<String>) -> Self {
        Self {
            nonce: nonce.into(),
            username: username.to_string(),
            password: password.to_string(),
            auth_message: None,
            salted_password: None,
        }
    }

    /// Generate the client-first-message.
    pub fn client_first_message(&self) -> String {
        format!("{}{}", Self::GS2_HEADER, self.client_first_message_bare())
    }

    fn client_first_message_bare(&self) -> String {
        format!("n={},r={}", self.username, self.nonce)
    }

    /// Process server-first-message and generate client-final-message.
    pub fn process_server_first(&mut self, server_first: &str) -> Result<String> {
        // r=<nonce>,s=<salt>,i=<iterations>
        let mut combined_nonce = None;
        let mut salt_b64 = None;
        let mut iterations = None;

        for part in server_first.split(',') {
            if let Some(value) = part.strip_prefix("r=") {
                combined_nonce = Some(value);
            } else if let Some(value) = part.strip_prefix("s=") {
                salt_b64 = Some(value);
            } else if let Some(value) = part.strip_prefix("i=") {
                iterations = value.parse::<u32>().ok();
            } else if part.starts_with("m=") {
                return Err(Error::Auth(
                    "unsupported mandatory SCRAM extension".to_string(),
                ));
            }
        }

        let missing = |what: &str| Error::Auth(format!("missing {} in server-first-message", what));
        let combined_nonce = combined_nonce.ok_or_else(|| missing("nonce"))?;
        let salt_b64 = salt_b64.ok_or_else(|| missing("salt"))?;
        let iterations = iterations
            .filter(|&i| i > 0)
            .ok_or_else(|| missing("iteration count"))?;
        if iterations > Self::MAX_ITERATIONS {
            return Err(Error::Auth(format!(
                "iteration count {} exceeds the limit of {}",
                iterations,
                Self::MAX_ITERATIONS
            )));
        }

        if combined_nonce.len() <= self.nonce.len() || !combined_nonce.starts_with(&self.nonce) {
            return Err(Error::Auth(
                "server nonce does not extend the client nonce".to_string(),
            ));
        }

        let salt = BASE64
            .decode(salt_b64)
            .map_err(|e| Error::Auth(format!("invalid salt: {}", e)))?;

        // SaltedPassword = Hi(password, salt, iterations)
        let mut salted_password = [0u8; 32];
        pbkdf2::pbkdf2_hmac::<Sha256>(
            self.password.as_bytes(),
            &salt,
            iterations,
            &mut salted_password,
        );

        // ClientKey = HMAC(SaltedPassword, "Client Key")
        let client_key = hmac_sha256(&salted_password, b"Client Key")?
            .finalize()
            .into_bytes();
        // StoredKey = H(ClientKey)
        let stored_key = Sha256::digest(client_key);

        let client_final_without_proof = format!(
            "c={},r={}",
            BASE64.encode(Self::GS2_HEADER),
            combined_nonce
        );
        let auth_message = format!(
            "{},{},{}",
            self.client_first_message_bare(),
            server_first,
            client_final_without_proof
        );

        // ClientProof = ClientKey XOR HMAC(StoredKey, AuthMessage)
        let client_signature = hmac_sha256(&stored_key, auth_message.as_bytes())?
            .finalize()
            .into_bytes();
        let client_proof: Vec<u8> = client_key
            .iter()
            .zip(client_signature.iter())
            .map(|(k, s)| k ^ s)
            .collect();

        self.salted_password = Some(salted_password);
        self.auth_message = Some(auth_message);

        Ok(format!(
            "{},p={}",
            client_final_without_proof,
            BASE64.encode(client_proof)
        ))
    }

    /// Verify server-final-message.
    pub fn verify_server_final(&self, server_final: &str) -> Result<()> {
        if let Some(error) = server_final.strip_prefix("e=") {
            return Err(Error::Auth(format!("server rejected SCRAM exchange: {}", error)));
        }
        let server_signature_b64 = server_final
            .strip_prefix("v=")
            .ok_or_else(|| Error::Auth("invalid server-final-message".to_string()))?;
        let server_signature = BASE64
            .decode(server_signature_b64)
            .map_err(|e| Error::Auth(format!("invalid server signature: {}", e)))?;

        let (Some(salted_password), Some(auth_message)) =
            (&self.salted_password, &self.auth_message)
        else {
            return Err(Error::InvalidUsage(
                "server-final-message before server-first-message".to_string(),
            ));
        };

        // ServerSignature = HMAC(HMAC(SaltedPassword, "Server Key"), AuthMessage)
        let server_key = hmac_sha256(salted_password, b"Server Key")?
            .finalize()
            .into_bytes();
        hmac_sha256(&server_key, auth_message.as_bytes())?
            .verify_slice(&server_signature)
            .map_err(|_| Error::Auth("server signature verification failed".to_string()))
    }
}
