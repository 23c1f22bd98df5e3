//! Authentication negotiator.
//!
//! Drives the exchange between the StartupMessage and AuthenticationOk:
//! cleartext, MD5 and SCRAM-SHA-256. It never performs I/O; each server
//! message yields at most one client message to send.

use crate::error::{Error, Result};
use crate::protocol::backend::{Authentication, BackendMessage, ErrorResponse};
use crate::protocol::frontend::auth::SCRAM_SHA_256;
use crate::protocol::frontend::{
    FrontendMessage, PasswordMessage, SaslInitialResponse, SaslResponse, ScramClient,
};

/// Negotiation state.
///
/// Non-terminal states only ever move forward:
/// `AwaitingChallenge` < `AwaitingResult` | `SaslContinue` < `SaslFinal` < `AwaitingOk`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    /// Waiting for the server's first authentication request
    AwaitingChallenge,
    /// Password sent, waiting for AuthenticationOk
    AwaitingResult,
    /// SASLInitialResponse sent, waiting for SASLContinue
    SaslContinue,
    /// SASLResponse sent, waiting for SASLFinal
    SaslFinal,
    /// Server signature verified, waiting for AuthenticationOk
    AwaitingOk,
    /// Authentication succeeded
    Authenticated,
    /// Authentication failed
    Failed,
}

impl AuthState {
    /// Check if no further step is possible.
    pub fn is_terminal(self) -> bool {
        matches!(self, AuthState::Authenticated | AuthState::Failed)
    }
}

/// What the caller should do after a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthAction {
    /// Send this message, then wait for the next server message
    Send(FrontendMessage),
    /// Nothing to send; wait for the next server message
    Wait,
    /// Authentication is complete
    Authenticated,
}

/// Authentication negotiator.
#[derive(Debug)]
pub struct Authenticator {
    state: AuthState,
    user: String,
    password: Option<String>,
    scram: Option<ScramClient>,
}

impl Authenticator {
    /// Create a negotiator for a user.
    pub fn new(user: impl Into<String>, password: Option<String>) -> Self {
        Self {
            state: AuthState::AwaitingChallenge,
            user: user.into(),
            password,
            scram: None,
        }
    }

    /// Get the current state.
    pub fn state(&self) -> AuthState {
        self.state
    }

    /// Process one server message.
    ///
    /// Any error moves the negotiator to [`AuthState::Failed`], except
    /// stepping a negotiator that has already finished, which leaves the
    /// state untouched.
    pub fn step(&mut self, msg: &BackendMessage) -> Result<AuthAction> {
        if self.state.is_terminal() {
            return Err(Error::InvalidUsage(format!(
                "authentication already finished ({:?})",
                self.state
            )));
        }

        let result = self.transition(msg);
        match &result {
            Ok(_) => tracing::debug!("authentication state: {:?}", self.state),
            Err(e) => {
                self.state = AuthState::Failed;
                tracing::debug!("authentication failed: {}", e);
            }
        }
        result
    }

    fn transition(&mut self, msg: &BackendMessage) -> Result<AuthAction> {
        let auth = match msg {
            BackendMessage::Authentication(auth) => auth,
            BackendMessage::ErrorResponse(err) => return Err(server_rejected(err)),
            other => {
                return Err(Error::Auth(format!(
                    "unexpected {} during authentication",
                    other.name()
                )));
            }
        };

        match (self.state, auth) {
            (
                AuthState::AwaitingChallenge | AuthState::AwaitingResult | AuthState::AwaitingOk,
                Authentication::Ok,
            ) => {
                self.scram = None;
                self.state = AuthState::Authenticated;
                Ok(AuthAction::Authenticated)
            }
            (AuthState::AwaitingChallenge, Authentication::CleartextPassword) => {
                let msg = PasswordMessage::new(self.password()?)?;
                self.state = AuthState::AwaitingResult;
                Ok(AuthAction::Send(FrontendMessage::PasswordMessage(msg)))
            }
            (AuthState::AwaitingChallenge, Authentication::Md5Password { salt }) => {
                let msg = PasswordMessage::md5(&self.user, self.password()?, salt)?;
                self.state = AuthState::AwaitingResult;
                Ok(AuthAction::Send(FrontendMessage::PasswordMessage(msg)))
            }
            (AuthState::AwaitingChallenge, Authentication::Sasl(sasl)) => {
                // First advertised mechanism we implement, in server order
                let Some(mechanism) = sasl.mechanisms().iter().find(|m| *m == SCRAM_SHA_256)
                else {
                    return Err(Error::Auth(format!(
                        "no supported SASL mechanism; server offers {:?}",
                        sasl.mechanisms()
                    )));
                };

                let scram = ScramClient::new(self.password()?);
                let msg = SaslInitialResponse::new(
                    mechanism.as_str(),
                    Some(scram.client_first_message().into_bytes()),
                )?;
                self.scram = Some(scram);
                self.state = AuthState::SaslContinue;
                Ok(AuthAction::Send(FrontendMessage::SaslInitialResponse(msg)))
            }
            (AuthState::SaslContinue, Authentication::SaslContinue { data }) => {
                let scram = self.scram_client()?;
                let server_first = simdutf8::compat::from_utf8(data)
                    .map_err(|e| Error::Auth(format!("invalid server-first-message: {}", e)))?;
                let client_final = scram.process_server_first(server_first)?;
                let msg = SaslResponse::new(client_final.into_bytes())?;
                self.state = AuthState::SaslFinal;
                Ok(AuthAction::Send(FrontendMessage::SaslResponse(msg)))
            }
            (AuthState::SaslFinal, Authentication::SaslFinal { data }) => {
                let scram = self.scram_client()?;
                let server_final = simdutf8::compat::from_utf8(data)
                    .map_err(|e| Error::Auth(format!("invalid server-final-message: {}", e)))?;
                scram.verify_server_final(server_final)?;
                self.state = AuthState::AwaitingOk;
                Ok(AuthAction::Wait)
            }
            (
                AuthState::AwaitingChallenge,
                Authentication::KerberosV5
                | Authentication::ScmCredential
                | Authentication::Gss
                | Authentication::Sspi,
            ) => Err(Error::Unsupported(format!(
                "authentication method {:?}",
                auth
            ))),
            (state, auth) => Err(Error::Auth(format!(
                "unexpected authentication request {} in state {:?}",
                auth.code(),
                state
            ))),
        }
    }

    fn password(&self) -> Result<&str> {
        self.password
            .as_deref()
            .ok_or_else(|| Error::Auth("password required but not provided".into()))
    }

    fn scram_client(&mut self) -> Result<&mut ScramClient> {
        self.scram
            .as_mut()
            .ok_or_else(|| Error::Auth("SCRAM exchange not started".into()))
    }
}

fn server_rejected(err: &ErrorResponse) -> Error {
    Error::Auth(format!(
        "{} (SQLSTATE {})",
        err.message().unwrap_or("server rejected authentication"),
        err.code().unwrap_or("?????")
    ))
}
