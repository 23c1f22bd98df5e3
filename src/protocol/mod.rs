//! PostgreSQL wire protocol implementation.
//!
//! This module contains the sans-I/O encoding and decoding layer.
//!
//! # Structure
//!
//! - `frame`: Splitting a byte stream into tagged frames
//! - `backend`: Server → Client messages (decoding, plus encoding for tests and tooling)
//! - `frontend`: Client → Server messages (encoding)
//! - `encoded`: Materialized or lazily produced frontend output
//! - `codec`: Low-level encoding/decoding primitives
//! - `types`: Common protocol types (FormatCode, Oid, TransactionStatus)

pub mod backend;
pub mod codec;
pub mod encoded;
pub mod frame;
pub mod frontend;
pub mod types;

// Re-export commonly used types
pub use backend::{BackendMessage, decode, decode_frame};
pub use encoded::{CopyInStream, DeferredEncoding, Encoded};
pub use frame::{Frame, FrameReader, FrameRef};
pub use frontend::FrontendMessage;
pub use types::{FormatCode, Oid, Target, TransactionStatus};
