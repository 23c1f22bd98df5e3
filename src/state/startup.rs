//! Session startup state machine.
//!
//! Sends the StartupMessage, hands authentication to [`Authenticator`], then
//! collects the session parameters the server reports until ReadyForQuery.

use crate::error::{Error, Result};
use crate::opts::Opts;
use crate::protocol::backend::{
    BackendKeyData, BackendMessage, NegotiateProtocolVersion, NoticeResponse,
};
use crate::protocol::frontend::{FrontendMessage, StartupMessage};
use crate::protocol::types::TransactionStatus;

use super::auth::{AuthAction, AuthState, Authenticator};

/// Startup phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupState {
    /// `start` has not been called
    Initial,
    /// Authentication exchange in progress
    Authenticating,
    /// Authenticated, waiting for ReadyForQuery
    WaitingReady,
    /// Session is ready for queries
    Ready,
    /// Startup failed
    Failed,
}

/// What the caller should do after a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartupAction {
    /// Send this message, then wait for the next server message
    Send(FrontendMessage),
    /// Nothing to send; wait for the next server message
    Wait,
    /// Session is ready for queries
    Ready,
}

/// Session startup state machine.
#[derive(Debug)]
pub struct StartupStateMachine {
    state: StartupState,
    opts: Opts,
    auth: Authenticator,
    backend_key: Option<BackendKeyData>,
    server_params: Vec<(String, String)>,
    notices: Vec<NoticeResponse>,
    negotiated: Option<NegotiateProtocolVersion>,
    transaction_status: TransactionStatus,
}

impl StartupStateMachine {
    /// Create a new startup state machine.
    pub fn new(opts: Opts) -> Self {
        let auth = Authenticator::new(opts.user.clone(), opts.password.clone());
        Self {
            state: StartupState::Initial,
            opts,
            auth,
            backend_key: None,
            server_params: Vec::new(),
            notices: Vec::new(),
            negotiated: None,
            transaction_status: TransactionStatus::Idle,
        }
    }

    /// Get the current startup state.
    pub fn state(&self) -> StartupState {
        self.state
    }

    /// Get the authentication state.
    pub fn auth_state(&self) -> AuthState {
        self.auth.state()
    }

    /// Get the options this session was started with.
    pub fn opts(&self) -> &Opts {
        &self.opts
    }

    /// Get the backend key data (for cancellation).
    pub fn backend_key(&self) -> Option<&BackendKeyData> {
        self.backend_key.as_ref()
    }

    /// Get server parameters in the order first reported.
    pub fn server_params(&self) -> &[(String, String)] {
        &self.server_params
    }

    /// Look up a server parameter.
    pub fn server_param(&self, name: &str) -> Option<&str> {
        self.server_params
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Notices received during startup.
    pub fn notices(&self) -> &[NoticeResponse] {
        &self.notices
    }

    /// Protocol downgrade reported by the server, if any.
    pub fn negotiated_protocol(&self) -> Option<&NegotiateProtocolVersion> {
        self.negotiated.as_ref()
    }

    /// Get the transaction status from the final ReadyForQuery.
    pub fn transaction_status(&self) -> TransactionStatus {
        self.transaction_status
    }

    /// Build the StartupMessage and begin authentication.
    pub fn start(&mut self) -> Result<FrontendMessage> {
        if self.state != StartupState::Initial {
            return Err(Error::InvalidUsage("startup already started".into()));
        }
        let msg = StartupMessage::with_version(
            self.opts.protocol_version,
            self.opts.startup_parameters(),
        )
        .inspect_err(|_| self.state = StartupState::Failed)?;
        self.state = StartupState::Authenticating;
        Ok(FrontendMessage::StartupMessage(msg))
    }

    /// Process one server message.
    pub fn step(&mut self, msg: &BackendMessage) -> Result<StartupAction> {
        let result = match self.state {
            StartupState::Initial => {
                return Err(Error::InvalidUsage("step before start".into()));
            }
            StartupState::Ready | StartupState::Failed => {
                return Err(Error::InvalidUsage(format!(
                    "startup already finished ({:?})",
                    self.state
                )));
            }
            StartupState::Authenticating => self.step_auth(msg),
            StartupState::WaitingReady => self.step_ready(msg),
        };
        if result.is_err() {
            self.state = StartupState::Failed;
        }
        result
    }

    fn step_auth(&mut self, msg: &BackendMessage) -> Result<StartupAction> {
        match msg {
            BackendMessage::NegotiateProtocolVersion(npv) => {
                self.record_negotiation(npv);
                Ok(StartupAction::Wait)
            }
            BackendMessage::NoticeResponse(notice) => {
                self.notices.push(notice.clone());
                Ok(StartupAction::Wait)
            }
            _ => match self.auth.step(msg)? {
                AuthAction::Send(msg) => Ok(StartupAction::Send(msg)),
                AuthAction::Wait => Ok(StartupAction::Wait),
                AuthAction::Authenticated => {
                    self.state = StartupState::WaitingReady;
                    tracing::debug!("authenticated as {}", self.opts.user);
                    Ok(StartupAction::Wait)
                }
            },
        }
    }

    fn step_ready(&mut self, msg: &BackendMessage) -> Result<StartupAction> {
        match msg {
            BackendMessage::BackendKeyData(key) => {
                self.backend_key = Some(key.clone());
            }
            BackendMessage::ParameterStatus(param) => {
                match self.server_params.iter_mut().find(|(n, _)| n == param.name()) {
                    Some(entry) => entry.1 = param.value().to_string(),
                    None => self
                        .server_params
                        .push((param.name().to_string(), param.value().to_string())),
                }
            }
            BackendMessage::NoticeResponse(notice) => {
                self.notices.push(notice.clone());
            }
            BackendMessage::NegotiateProtocolVersion(npv) => {
                self.record_negotiation(npv);
            }
            BackendMessage::ReadyForQuery(ready) => {
                self.transaction_status = ready.transaction_status();
                self.state = StartupState::Ready;
                tracing::debug!(
                    "session ready with {} server parameter(s)",
                    self.server_params.len()
                );
                return Ok(StartupAction::Ready);
            }
            BackendMessage::ErrorResponse(err) => {
                return Err(err.clone().into_error());
            }
            other => {
                return Err(Error::Protocol(format!(
                    "unexpected {} during startup",
                    other.name()
                )));
            }
        }
        Ok(StartupAction::Wait)
    }

    fn record_negotiation(&mut self, npv: &NegotiateProtocolVersion) {
        tracing::debug!(
            "server supports protocol 3.{} (unrecognized options: {:?})",
            npv.newest_minor_version(),
            npv.unrecognized_options()
        );
        self.negotiated = Some(npv.clone());
    }
}
