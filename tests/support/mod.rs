//! Shared helpers for the message conformance tests.

#![expect(dead_code)]

use pgcodec::protocol::backend::{
    self, Authentication, AuthenticationSasl, BackendKeyData, BackendMessage, CommandComplete,
    CopyData, CopyResponse, DataRow, ErrorResponse, FieldDescription, Fields,
    FunctionCallResponse, NegotiateProtocolVersion, NoticeResponse, NotificationResponse,
    ParameterDescription, ParameterStatus, ReadyForQuery, RowDescription,
};
use pgcodec::{Error, FormatCode, FrontendMessage, TransactionStatus};
use tracing_subscriber::{EnvFilter, fmt};

/// Install a test log subscriber once; `RUST_LOG=pgcodec=trace` shows frames.
pub fn init_logging() {
    let _ = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Assert that a frontend message encodes to exactly `expected`, both
/// eagerly and through [`FrontendMessage::into_encoded`].
#[track_caller]
pub fn assert_encoded_as(msg: FrontendMessage, expected: &[u8]) {
    let eager = msg.to_bytes().unwrap();
    assert_eq!(
        eager,
        expected,
        "{:?}\n  got:      {}\n  expected: {}",
        msg,
        eager.escape_ascii(),
        expected.escape_ascii()
    );
    let encoded = msg.into_encoded().unwrap().drain().unwrap();
    assert_eq!(encoded, expected, "deferred encoding differs");
}

/// Decode one complete backend frame.
pub fn decode_frame_bytes(frame: &[u8]) -> Result<BackendMessage, Error> {
    backend::decode_frame(frame)
}

/// Build an ordered field list from `(code, value)` pairs.
pub fn fields(pairs: &[(u8, &str)]) -> Fields {
    Fields::new(pairs.iter().map(|(c, v)| (*c, v.to_string())).collect()).unwrap()
}

/// One message of every backend type, covering each Authentication subtype.
pub fn every_backend_message() -> Vec<BackendMessage> {
    vec![
        BackendMessage::Authentication(Authentication::Ok),
        BackendMessage::Authentication(Authentication::KerberosV5),
        BackendMessage::Authentication(Authentication::CleartextPassword),
        BackendMessage::Authentication(Authentication::Md5Password { salt: [9, 8, 7, 6] }),
        BackendMessage::Authentication(Authentication::ScmCredential),
        BackendMessage::Authentication(Authentication::Gss),
        BackendMessage::Authentication(Authentication::GssContinue { data: vec![1, 2, 3] }),
        BackendMessage::Authentication(Authentication::Sspi),
        BackendMessage::Authentication(Authentication::Sasl(
            AuthenticationSasl::new(vec!["SCRAM-SHA-256".into()]).unwrap(),
        )),
        BackendMessage::Authentication(Authentication::SaslContinue { data: b"r=a".to_vec() }),
        BackendMessage::Authentication(Authentication::SaslFinal { data: b"v=b".to_vec() }),
        BackendMessage::BackendKeyData(BackendKeyData::new(5, vec![1; 32]).unwrap()),
        BackendMessage::BindComplete,
        BackendMessage::CloseComplete,
        BackendMessage::CommandComplete(CommandComplete::new("SELECT 3").unwrap()),
        BackendMessage::CopyData(CopyData::new(vec![0, 1, 2])),
        BackendMessage::CopyDone,
        BackendMessage::CopyInResponse(
            CopyResponse::new(FormatCode::Binary, vec![FormatCode::Binary, FormatCode::Text])
                .unwrap(),
        ),
        BackendMessage::CopyOutResponse(CopyResponse::new(FormatCode::Text, vec![]).unwrap()),
        BackendMessage::CopyBothResponse(
            CopyResponse::new(FormatCode::Binary, vec![FormatCode::Binary]).unwrap(),
        ),
        BackendMessage::DataRow(
            DataRow::new(vec![Some(b"1".to_vec()), None, Some(vec![])]).unwrap(),
        ),
        BackendMessage::EmptyQueryResponse,
        BackendMessage::ErrorResponse(ErrorResponse::new(fields(&[
            (b'S', "FATAL"),
            (b'V', "FATAL"),
            (b'C', "28P01"),
            (b'M', "password authentication failed"),
        ]))),
        BackendMessage::FunctionCallResponse(FunctionCallResponse::new(Some(vec![])).unwrap()),
        BackendMessage::NegotiateProtocolVersion(
            NegotiateProtocolVersion::new(2, vec!["_pq_.a".into(), "_pq_.b".into()]).unwrap(),
        ),
        BackendMessage::NoData,
        BackendMessage::NoticeResponse(NoticeResponse::new(fields(&[(b'S', "WARNING")]))),
        BackendMessage::NotificationResponse(NotificationResponse::new(1, "c", "").unwrap()),
        BackendMessage::ParameterDescription(ParameterDescription::new(vec![]).unwrap()),
        BackendMessage::ParameterStatus(ParameterStatus::new("is_superuser", "off").unwrap()),
        BackendMessage::ParseComplete,
        BackendMessage::PortalSuspended,
        BackendMessage::ReadyForQuery(ReadyForQuery::new(TransactionStatus::InTransaction)),
        BackendMessage::RowDescription(
            RowDescription::new(vec![
                FieldDescription::new("a", 25),
                FieldDescription::new("b", 20),
            ])
            .unwrap(),
        ),
    ]
}

/// Build a tagged frame around `payload`.
pub fn frame(tag: u8, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 5);
    out.push(tag);
    out.extend_from_slice(&(payload.len() as i32 + 4).to_be_bytes());
    out.extend_from_slice(payload);
    out
}

/// Build a tagged frame with an arbitrary declared length.
pub fn frame_with_len(tag: u8, declared_len: i32, payload: &[u8]) -> Vec<u8> {
    let mut out = vec![tag];
    out.extend_from_slice(&declared_len.to_be_bytes());
    out.extend_from_slice(payload);
    out
}

/// Payload builder for hand-written backend messages.
#[derive(Default)]
pub struct Payload(Vec<u8>);

impl Payload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn i16(mut self, v: i16) -> Self {
        self.0.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub fn i32(mut self, v: i32) -> Self {
        self.0.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub fn u32(mut self, v: u32) -> Self {
        self.0.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub fn u8(mut self, v: u8) -> Self {
        self.0.push(v);
        self
    }

    pub fn bytes(mut self, v: &[u8]) -> Self {
        self.0.extend_from_slice(v);
        self
    }

    pub fn cstr(mut self, v: &str) -> Self {
        self.0.extend_from_slice(v.as_bytes());
        self.0.push(0);
        self
    }

    pub fn frame(&self, tag: u8) -> Vec<u8> {
        frame(tag, &self.0)
    }

    pub fn build(self) -> Vec<u8> {
        self.0
    }
}
