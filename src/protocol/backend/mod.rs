//! PostgreSQL backend (server → client) messages.
//!
//! Decoding goes through a fixed dispatch table keyed by the message type
//! byte. Every decoder must consume its payload exactly.

pub mod auth;
pub mod copy;
pub mod error;
pub mod extended;
pub mod query;

pub use auth::{
    Authentication, AuthenticationSasl, BackendKeyData, NegotiateProtocolVersion,
    NotificationResponse, ParameterStatus, ReadyForQuery,
};
pub use copy::{CopyData, CopyResponse};
pub use error::{ErrorResponse, Fields, NoticeResponse};
pub use extended::{FunctionCallResponse, ParameterDescription};
pub use query::{CommandComplete, DataRow, FieldDescription, RowDescription};

use crate::error::{Error, Result};
use crate::protocol::codec::{MessageBuilder, ReadBuf};
use crate::protocol::frame::parse_frame;

/// Backend message type bytes.
pub mod msg_type {
    /// Authentication message
    pub const AUTHENTICATION: u8 = b'R';
    /// BackendKeyData
    pub const BACKEND_KEY_DATA: u8 = b'K';
    /// ParameterStatus
    pub const PARAMETER_STATUS: u8 = b'S';
    /// ReadyForQuery
    pub const READY_FOR_QUERY: u8 = b'Z';
    /// RowDescription
    pub const ROW_DESCRIPTION: u8 = b'T';
    /// DataRow
    pub const DATA_ROW: u8 = b'D';
    /// CommandComplete
    pub const COMMAND_COMPLETE: u8 = b'C';
    /// EmptyQueryResponse
    pub const EMPTY_QUERY_RESPONSE: u8 = b'I';
    /// ErrorResponse
    pub const ERROR_RESPONSE: u8 = b'E';
    /// NoticeResponse
    pub const NOTICE_RESPONSE: u8 = b'N';
    /// NotificationResponse
    pub const NOTIFICATION_RESPONSE: u8 = b'A';
    /// ParseComplete
    pub const PARSE_COMPLETE: u8 = b'1';
    /// BindComplete
    pub const BIND_COMPLETE: u8 = b'2';
    /// CloseComplete
    pub const CLOSE_COMPLETE: u8 = b'3';
    /// ParameterDescription
    pub const PARAMETER_DESCRIPTION: u8 = b't';
    /// NoData
    pub const NO_DATA: u8 = b'n';
    /// PortalSuspended
    pub const PORTAL_SUSPENDED: u8 = b's';
    /// CopyInResponse
    pub const COPY_IN_RESPONSE: u8 = b'G';
    /// CopyOutResponse
    pub const COPY_OUT_RESPONSE: u8 = b'H';
    /// CopyBothResponse
    pub const COPY_BOTH_RESPONSE: u8 = b'W';
    /// CopyData
    pub const COPY_DATA: u8 = b'd';
    /// CopyDone
    pub const COPY_DONE: u8 = b'c';
    /// FunctionCallResponse
    pub const FUNCTION_CALL_RESPONSE: u8 = b'V';
    /// NegotiateProtocolVersion
    pub const NEGOTIATE_PROTOCOL_VERSION: u8 = b'v';

    /// Every backend type byte.
    pub const ALL: [u8; 24] = [
        AUTHENTICATION,
        BACKEND_KEY_DATA,
        PARAMETER_STATUS,
        READY_FOR_QUERY,
        ROW_DESCRIPTION,
        DATA_ROW,
        COMMAND_COMPLETE,
        EMPTY_QUERY_RESPONSE,
        ERROR_RESPONSE,
        NOTICE_RESPONSE,
        NOTIFICATION_RESPONSE,
        PARSE_COMPLETE,
        BIND_COMPLETE,
        CLOSE_COMPLETE,
        PARAMETER_DESCRIPTION,
        NO_DATA,
        PORTAL_SUSPENDED,
        COPY_IN_RESPONSE,
        COPY_OUT_RESPONSE,
        COPY_BOTH_RESPONSE,
        COPY_DATA,
        COPY_DONE,
        FUNCTION_CALL_RESPONSE,
        NEGOTIATE_PROTOCOL_VERSION,
    ];
}

/// A decoded message from the PostgreSQL server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendMessage {
    /// 'R'
    Authentication(Authentication),
    /// 'K'
    BackendKeyData(BackendKeyData),
    /// '2'
    BindComplete,
    /// '3'
    CloseComplete,
    /// 'C'
    CommandComplete(CommandComplete),
    /// 'd'
    CopyData(CopyData),
    /// 'c'
    CopyDone,
    /// 'G'
    CopyInResponse(CopyResponse),
    /// 'H'
    CopyOutResponse(CopyResponse),
    /// 'W'
    CopyBothResponse(CopyResponse),
    /// 'D'
    DataRow(DataRow),
    /// 'I'
    EmptyQueryResponse,
    /// 'E'
    ErrorResponse(ErrorResponse),
    /// 'V'
    FunctionCallResponse(FunctionCallResponse),
    /// 'v'
    NegotiateProtocolVersion(NegotiateProtocolVersion),
    /// 'n'
    NoData,
    /// 'N'
    NoticeResponse(NoticeResponse),
    /// 'A'
    NotificationResponse(NotificationResponse),
    /// 't'
    ParameterDescription(ParameterDescription),
    /// 'S'
    ParameterStatus(ParameterStatus),
    /// '1'
    ParseComplete,
    /// 's'
    PortalSuspended,
    /// 'Z'
    ReadyForQuery(ReadyForQuery),
    /// 'T'
    RowDescription(RowDescription),
}

impl BackendMessage {
    /// Message type byte.
    pub fn tag(&self) -> u8 {
        match self {
            BackendMessage::Authentication(_) => msg_type::AUTHENTICATION,
            BackendMessage::BackendKeyData(_) => msg_type::BACKEND_KEY_DATA,
            BackendMessage::BindComplete => msg_type::BIND_COMPLETE,
            BackendMessage::CloseComplete => msg_type::CLOSE_COMPLETE,
            BackendMessage::CommandComplete(_) => msg_type::COMMAND_COMPLETE,
            BackendMessage::CopyData(_) => msg_type::COPY_DATA,
            BackendMessage::CopyDone => msg_type::COPY_DONE,
            BackendMessage::CopyInResponse(_) => msg_type::COPY_IN_RESPONSE,
            BackendMessage::CopyOutResponse(_) => msg_type::COPY_OUT_RESPONSE,
            BackendMessage::CopyBothResponse(_) => msg_type::COPY_BOTH_RESPONSE,
            BackendMessage::DataRow(_) => msg_type::DATA_ROW,
            BackendMessage::EmptyQueryResponse => msg_type::EMPTY_QUERY_RESPONSE,
            BackendMessage::ErrorResponse(_) => msg_type::ERROR_RESPONSE,
            BackendMessage::FunctionCallResponse(_) => msg_type::FUNCTION_CALL_RESPONSE,
            BackendMessage::NegotiateProtocolVersion(_) => msg_type::NEGOTIATE_PROTOCOL_VERSION,
            BackendMessage::NoData => msg_type::NO_DATA,
            BackendMessage::NoticeResponse(_) => msg_type::NOTICE_RESPONSE,
            BackendMessage::NotificationResponse(_) => msg_type::NOTIFICATION_RESPONSE,
            BackendMessage::ParameterDescription(_) => msg_type::PARAMETER_DESCRIPTION,
            BackendMessage::ParameterStatus(_) => msg_type::PARAMETER_STATUS,
            BackendMessage::ParseComplete => msg_type::PARSE_COMPLETE,
            BackendMessage::PortalSuspended => msg_type::PORTAL_SUSPENDED,
            BackendMessage::ReadyForQuery(_) => msg_type::READY_FOR_QUERY,
            BackendMessage::RowDescription(_) => msg_type::ROW_DESCRIPTION,
        }
    }

    /// Message name as used in the protocol documentation.
    pub fn name(&self) -> &'static str {
        message_name(self.tag()).unwrap_or("Unknown")
    }

    /// Check if this message can arrive at any time, outside of a request cycle.
    pub fn is_async(&self) -> bool {
        matches!(
            self,
            BackendMessage::NoticeResponse(_)
                | BackendMessage::NotificationResponse(_)
                | BackendMessage::ParameterStatus(_)
        )
    }

    /// Append the framed message to `out`.
    ///
    /// Fails with [`Error::Encode`] only if the
    /// payload does not fit the Int32 length field.
    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        let mut msg = MessageBuilder::new(out, self.tag());
        match self {
            BackendMessage::Authentication(m) => m.write_payload(&mut msg),
            BackendMessage::BackendKeyData(m) => m.write_payload(&mut msg),
            BackendMessage::CommandComplete(m) => m.write_payload(&mut msg),
            BackendMessage::CopyData(m) => m.write_payload(&mut msg),
            BackendMessage::CopyInResponse(m)
            | BackendMessage::CopyOutResponse(m)
            | BackendMessage::CopyBothResponse(m) => m.write_payload(&mut msg),
            BackendMessage::DataRow(m) => m.write_payload(&mut msg),
            BackendMessage::ErrorResponse(m) => m.write_payload(&mut msg),
            BackendMessage::FunctionCallResponse(m) => m.write_payload(&mut msg),
            BackendMessage::NegotiateProtocolVersion(m) => m.write_payload(&mut msg),
            BackendMessage::NoticeResponse(m) => m.write_payload(&mut msg),
            BackendMessage::NotificationResponse(m) => m.write_payload(&mut msg),
            BackendMessage::ParameterDescription(m) => m.write_payload(&mut msg),
            BackendMessage::ParameterStatus(m) => m.write_payload(&mut msg),
            BackendMessage::ReadyForQuery(m) => m.write_payload(&mut msg),
            BackendMessage::RowDescription(m) => m.write_payload(&mut msg),
            BackendMessage::BindComplete
            | BackendMessage::CloseComplete
            | BackendMessage::CopyDone
            | BackendMessage::EmptyQueryResponse
            | BackendMessage::NoData
            | BackendMessage::ParseComplete
            | BackendMessage::PortalSuspended => {}
        }
        msg.finish()
    }

    /// Encode into a fresh buffer.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.encode(&mut out)?;
        Ok(out)
    }
}

/// Payload decoder for one message type.
pub type DecodeFn = fn(&mut ReadBuf<'_>) -> Result<BackendMessage>;

/// Dispatch table: type byte, message name, decoder.
pub const DECODERS: [(u8, &str, DecodeFn); 24] = [
    (msg_type::AUTHENTICATION, "Authentication", |buf| {
        Authentication::decode(buf).map(BackendMessage::Authentication)
    }),
    (msg_type::BACKEND_KEY_DATA, "BackendKeyData", |buf| {
        BackendKeyData::decode(buf).map(BackendMessage::BackendKeyData)
    }),
    (msg_type::BIND_COMPLETE, "BindComplete", |_| {
        Ok(BackendMessage::BindComplete)
    }),
    (msg_type::CLOSE_COMPLETE, "CloseComplete", |_| {
        Ok(BackendMessage::CloseComplete)
    }),
    (msg_type::COMMAND_COMPLETE, "CommandComplete", |buf| {
        CommandComplete::decode(buf).map(BackendMessage::CommandComplete)
    }),
    (msg_type::COPY_DATA, "CopyData", |buf| {
        CopyData::decode(buf).map(BackendMessage::CopyData)
    }),
    (msg_type::COPY_DONE, "CopyDone", |_| Ok(BackendMessage::CopyDone)),
    (msg_type::COPY_IN_RESPONSE, "CopyInResponse", |buf| {
        CopyResponse::decode(buf).map(BackendMessage::CopyInResponse)
    }),
    (msg_type::COPY_OUT_RESPONSE, "CopyOutResponse", |buf| {
        CopyResponse::decode(buf).map(BackendMessage::CopyOutResponse)
    }),
    (msg_type::COPY_BOTH_RESPONSE, "CopyBothResponse", |buf| {
        CopyResponse::decode(buf).map(BackendMessage::CopyBothResponse)
    }),
    (msg_type::DATA_ROW, "DataRow", |buf| {
        DataRow::decode(buf).map(BackendMessage::DataRow)
    }),
    (msg_type::EMPTY_QUERY_RESPONSE, "EmptyQueryResponse", |_| {
        Ok(BackendMessage::EmptyQueryResponse)
    }),
    (msg_type::ERROR_RESPONSE, "ErrorResponse", |buf| {
        ErrorResponse::decode(buf).map(BackendMessage::ErrorResponse)
    }),
    (msg_type::FUNCTION_CALL_RESPONSE, "FunctionCallResponse", |buf| {
        FunctionCallResponse::decode(buf).map(BackendMessage::FunctionCallResponse)
    }),
    (
        msg_type::NEGOTIATE_PROTOCOL_VERSION,
        "NegotiateProtocolVersion",
        |buf| NegotiateProtocolVersion::decode(buf).map(BackendMessage::NegotiateProtocolVersion),
    ),
    (msg_type::NO_DATA, "NoData", |_| Ok(BackendMessage::NoData)),
    (msg_type::NOTICE_RESPONSE, "NoticeResponse", |buf| {
        NoticeResponse::decode(buf).map(BackendMessage::NoticeResponse)
    }),
    (msg_type::NOTIFICATION_RESPONSE, "NotificationResponse", |buf| {
        NotificationResponse::decode(buf).map(BackendMessage::NotificationResponse)
    }),
    (msg_type::PARAMETER_DESCRIPTION, "ParameterDescription", |buf| {
        ParameterDescription::decode(buf).map(BackendMessage::ParameterDescription)
    }),
    (msg_type::PARAMETER_STATUS, "ParameterStatus", |buf| {
        ParameterStatus::decode(buf).map(BackendMessage::ParameterStatus)
    }),
    (msg_type::PARSE_COMPLETE, "ParseComplete", |_| {
        Ok(BackendMessage::ParseComplete)
    }),
    (msg_type::PORTAL_SUSPENDED, "PortalSuspended", |_| {
        Ok(BackendMessage::PortalSuspended)
    }),
    (msg_type::READY_FOR_QUERY, "ReadyForQuery", |buf| {
        ReadyForQuery::decode(buf).map(BackendMessage::ReadyForQuery)
    }),
    (msg_type::ROW_DESCRIPTION, "RowDescription", |buf| {
        RowDescription::decode(buf).map(BackendMessage::RowDescription)
    }),
];

/// Type byte → index into [`DECODERS`].
const LOOKUP: [Option<usize>; 256] = {
    let mut lookup = [None; 256];
    let mut i = 0;
    while i < DECODERS.len() {
        let tag = DECODERS[i].0 as usize;
        assert!(lookup[tag].is_none(), "duplicate backend message tag");
        lookup[tag] = Some(i);
        i += 1;
    }
    lookup
};

const _: () = {
    let mut i = 0;
    while i < msg_type::ALL.len() {
        assert!(
            LOOKUP[msg_type::ALL[i] as usize].is_some(),
            "backend message tag without a decoder"
        );
        i += 1;
    }
};

fn entry(tag: u8) -> Option<(u8, &'static str, DecodeFn)> {
    LOOKUP[tag as usize].and_then(|i| DECODERS.get(i).copied())
}

/// Name of the message with the given type byte.
pub fn message_name(tag: u8) -> Option<&'static str> {
    entry(tag).map(|(_, name, _)| name)
}

/// Decode a message payload.
///
/// The payload must be consumed exactly; short input and trailing bytes are
/// both protocol errors.
pub fn decode(tag: u8, payload: &[u8]) -> Result<BackendMessage> {
    let Some((_, name, decoder)) = entry(tag) else {
        return Err(Error::UnknownMessage(tag));
    };

    let mut buf = ReadBuf::new(payload);
    let msg = decoder(&mut buf).map_err(|e| match e {
        Error::Protocol(m) => Error::Protocol(format!("{}: {}", name, m)),
        other => other,
    })?;
    buf.finish(name)?;
    Ok(msg)
}

/// Decode one complete captured frame (`tag`, length and payload).
pub fn decode_frame(frame: &[u8]) -> Result<BackendMessage> {
    parse_frame(frame)?.decode()
}
