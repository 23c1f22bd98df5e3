//! Sans-I/O state machines for session startup.
//!
//! These state machines handle the protocol logic without performing any I/O.
//! They consume decoded backend messages and return the next action for the
//! caller: a message to send, nothing, or completion.

pub mod auth;
pub mod startup;

pub use auth::{AuthAction, AuthState, Authenticator};
pub use startup::{StartupAction, StartupState, StartupStateMachine};
