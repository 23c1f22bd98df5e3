//! PostgreSQL frontend (client → server) messages.
//!
//! Every message is validated when it is constructed, including its total
//! frame length, so encoding a constructed message always succeeds and
//! always produces the same bytes.

pub mod auth;
pub mod copy;
pub mod extended;
pub mod function;
pub mod simple;
pub mod startup;

pub use auth::{
    GssResponse, PasswordMessage, SaslInitialResponse, SaslResponse, ScramClient, md5_password,
};
pub use copy::{CopyData, CopyFail};
pub use extended::{Bind, Close, Describe, Execute, Parse};
pub use function::FunctionCall;
pub use simple::Query;
pub use startup::{CancelRequest, StartupMessage};

use crate::error::Result;
use crate::protocol::codec::MessageBuilder;
use crate::protocol::encoded::{DeferredEncoding, Encoded};

/// Frontend message type bytes.
pub mod msg_type {
    /// Password/SASL/GSS response (all auth response types use 'p')
    pub const PASSWORD: u8 = b'p';
    /// Query (simple query protocol)
    pub const QUERY: u8 = b'Q';
    /// Parse (extended query protocol)
    pub const PARSE: u8 = b'P';
    /// Bind (extended query protocol)
    pub const BIND: u8 = b'B';
    /// Execute (extended query protocol)
    pub const EXECUTE: u8 = b'E';
    /// Describe (extended query protocol)
    pub const DESCRIBE: u8 = b'D';
    /// Close (extended query protocol)
    pub const CLOSE: u8 = b'C';
    /// Sync (extended query protocol)
    pub const SYNC: u8 = b'S';
    /// Flush (extended query protocol)
    pub const FLUSH: u8 = b'H';
    /// Function call
    pub const FUNCTION_CALL: u8 = b'F';
    /// CopyData
    pub const COPY_DATA: u8 = b'd';
    /// CopyDone
    pub const COPY_DONE: u8 = b'c';
    /// CopyFail
    pub const COPY_FAIL: u8 = b'f';
    /// Terminate
    pub const TERMINATE: u8 = b'X';
}

/// A message sent by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrontendMessage {
    /// StartupMessage (untagged)
    StartupMessage(StartupMessage),
    /// SSLRequest (untagged)
    SslRequest,
    /// GSSENCRequest (untagged)
    GssEncRequest,
    /// CancelRequest (untagged)
    CancelRequest(CancelRequest),
    /// PasswordMessage 'p'
    PasswordMessage(PasswordMessage),
    /// SASLInitialResponse 'p'
    SaslInitialResponse(SaslInitialResponse),
    /// SASLResponse 'p'
    SaslResponse(SaslResponse),
    /// GSSResponse 'p'
    GssResponse(GssResponse),
    /// Query 'Q'
    Query(Query),
    /// Parse 'P'
    Parse(Parse),
    /// Bind 'B'
    Bind(Bind),
    /// Describe 'D'
    Describe(Describe),
    /// Close 'C'
    Close(Close),
    /// Execute 'E'
    Execute(Execute),
    /// FunctionCall 'F'
    FunctionCall(FunctionCall),
    /// Sync 'S'
    Sync,
    /// Flush 'H'
    Flush,
    /// Terminate 'X'
    Terminate,
    /// CopyData 'd'
    CopyData(CopyData),
    /// CopyDone 'c'
    CopyDone,
    /// CopyFail 'f'
    CopyFail(CopyFail),
}

impl FrontendMessage {
    /// Message type byte, `None` for startup-phase messages.
    pub fn tag(&self) -> Option<u8> {
        let tag = match self {
            FrontendMessage::StartupMessage(_)
            | FrontendMessage::SslRequest
            | FrontendMessage::GssEncRequest
            | FrontendMessage::CancelRequest(_) => return None,
            FrontendMessage::PasswordMessage(_)
            | FrontendMessage::SaslInitialResponse(_)
            | FrontendMessage::SaslResponse(_)
            | FrontendMessage::GssResponse(_) => msg_type::PASSWORD,
            FrontendMessage::Query(_) => msg_type::QUERY,
            FrontendMessage::Parse(_) => msg_type::PARSE,
            FrontendMessage::Bind(_) => msg_type::BIND,
            FrontendMessage::Describe(_) => msg_type::DESCRIBE,
            FrontendMessage::Close(_) => msg_type::CLOSE,
            FrontendMessage::Execute(_) => msg_type::EXECUTE,
            FrontendMessage::FunctionCall(_) => msg_type::FUNCTION_CALL,
            FrontendMessage::Sync => msg_type::SYNC,
            FrontendMessage::Flush => msg_type::FLUSH,
            FrontendMessage::Terminate => msg_type::TERMINATE,
            FrontendMessage::CopyData(_) => msg_type::COPY_DATA,
            FrontendMessage::CopyDone => msg_type::COPY_DONE,
            FrontendMessage::CopyFail(_) => msg_type::COPY_FAIL,
        };
        Some(tag)
    }

    /// Check if this message belongs to the COPY sub-protocol and is
    /// encoded lazily by [`into_encoded`](Self::into_encoded).
    pub fn is_deferred(&self) -> bool {
        matches!(
            self,
            FrontendMessage::CopyData(_) | FrontendMessage::CopyDone | FrontendMessage::CopyFail(_)
        )
    }

    /// Append the encoded message to `buf`.
    pub fn encode(&self, buf: &mut Vec<u8>) -> Result<()> {
        match self {
            FrontendMessage::StartupMessage(m) => m.encode(buf),
            FrontendMessage::SslRequest => startup::write_ssl_request(buf),
            FrontendMessage::GssEncRequest => startup::write_gssenc_request(buf),
            FrontendMessage::CancelRequest(m) => m.encode(buf),
            FrontendMessage::PasswordMessage(m) => m.encode(buf),
            FrontendMessage::SaslInitialResponse(m) => m.encode(buf),
            FrontendMessage::SaslResponse(m) => m.encode(buf),
            FrontendMessage::GssResponse(m) => m.encode(buf),
            FrontendMessage::Query(m) => m.encode(buf),
            FrontendMessage::Parse(m) => m.encode(buf),
            FrontendMessage::Bind(m) => m.encode(buf),
            FrontendMessage::Describe(m) => m.encode(buf),
            FrontendMessage::Close(m) => m.encode(buf),
            FrontendMessage::Execute(m) => m.encode(buf),
            FrontendMessage::FunctionCall(m) => m.encode(buf),
            FrontendMessage::CopyData(m) => m.encode(buf),
            FrontendMessage::CopyFail(m) => m.encode(buf),
            FrontendMessage::Sync
            | FrontendMessage::Flush
            | FrontendMessage::Terminate
            | FrontendMessage::CopyDone => match self.tag() {
                Some(tag) => MessageBuilder::new(buf, tag).finish(),
                None => Ok(()),
            },
        }
    }

    /// Encode into a fresh buffer.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.encode(&mut buf)?;
        Ok(buf)
    }

    /// Encode, deferring COPY messages until the transport polls them.
    pub fn into_encoded(self) -> Result<Encoded> {
        if self.is_deferred() {
            Ok(Encoded::Deferred(DeferredEncoding::once(move || self.to_bytes())))
        } else {
            Ok(Encoded::Ready(self.to_bytes()?))
        }
    }
}
