//! A sans-I/O PostgreSQL wire protocol codec.
//!
//! # Features
//!
//! - **Validated messages**: Every frontend and backend message is checked when
//!   constructed; a frame whose length does not fit in an Int32 is reported
//!   as an error instead of being written
//! - **Strict decoding**: Backend payloads must be consumed exactly; unknown
//!   message types and malformed lengths are rejected
//! - **Deferred COPY encoding**: COPY FROM STDIN data is produced chunk by chunk
//! - **Sans-I/O state machines**: Authentication (cleartext, MD5, SCRAM-SHA-256)
//!   and session startup without owning a socket
//!
//! # Example
//!
//! ```
//! use pgcodec::protocol::backend::{Authentication, BackendMessage, ReadyForQuery};
//! use pgcodec::protocol::TransactionStatus;
//! use pgcodec::state::{StartupAction, StartupStateMachine};
//! use pgcodec::Opts;
//!
//! fn main() -> pgcodec::Result<()> {
//!     let opts = Opts::try_from("postgres://alice@localhost/shop")?;
//!     let mut startup = StartupStateMachine::new(opts);
//!
//!     // Bytes for the transport to write
//!     let _startup_bytes = startup.start()?.to_bytes()?;
//!
//!     // Messages as decoded from the transport
//!     let replies = [
//!         BackendMessage::Authentication(Authentication::Ok),
//!         BackendMessage::ReadyForQuery(ReadyForQuery::new(TransactionStatus::Idle)),
//!     ];
//!     for reply in &replies {
//!         if let StartupAction::Ready = startup.step(reply)? {
//!             break;
//!         }
//!     }
//!     assert_eq!(startup.transaction_status(), TransactionStatus::Idle);
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod opts;
pub mod protocol;
pub mod state;

pub use error::{Error, ErrorFields, Result};
pub use opts::Opts;
pub use protocol::backend::BackendMessage;
pub use protocol::frontend::FrontendMessage;
pub use protocol::types::{FormatCode, Oid, Target, TransactionStatus};
pub use protocol::{CopyInStream, Encoded, FrameReader};
pub use state::{Authenticator, StartupStateMachine};
