//! Exact wire bytes for every frontend message, and construction rejections.

mod support;

use pgcodec::Error;
use pgcodec::protocol::frontend::{
    Bind, CancelRequest, Close, CopyData, CopyFail, Describe, Execute, FunctionCall, GssResponse,
    Parse, PasswordMessage, Query, SaslInitialResponse, SaslResponse, StartupMessage,
};
use pgcodec::protocol::backend::BackendKeyData;
use pgcodec::{FormatCode, FrontendMessage, Target};
use support::assert_encoded_as;

fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(n, v)| (n.to_string(), v.to_string()))
        .collect()
}

#[test]
fn startup_message() {
    let msg = StartupMessage::new(params(&[("user", "alice"), ("database", "shop")])).unwrap();
    assert_encoded_as(
        FrontendMessage::StartupMessage(msg),
        b"\0\0\0\x22\0\x03\0\0user\0alice\0database\0shop\0\0",
    );
}

#[test]
fn ssl_and_gssenc_requests() {
    assert_encoded_as(FrontendMessage::SslRequest, b"\0\0\0\x08\x04\xd2\x16\x2f");
    assert_encoded_as(FrontendMessage::GssEncRequest, b"\0\0\0\x08\x04\xd2\x16\x30");
}

#[test]
fn cancel_request() {
    let msg = CancelRequest::new(7, vec![0, 0, 0, 9]).unwrap();
    assert_encoded_as(
        FrontendMessage::CancelRequest(msg),
        b"\0\0\0\x10\x04\xd2\x16\x2e\0\0\0\x07\0\0\0\x09",
    );

    let key = BackendKeyData::new(7, vec![0, 0, 0, 9]).unwrap();
    assert_eq!(
        CancelRequest::for_key(&key),
        CancelRequest::new(7, vec![0, 0, 0, 9]).unwrap()
    );
}

#[test]
fn authentication_responses() {
    assert_encoded_as(
        FrontendMessage::PasswordMessage(PasswordMessage::new("secret").unwrap()),
        b"p\0\0\0\x0bsecret\0",
    );
    assert_encoded_as(
        FrontendMessage::SaslInitialResponse(
            SaslInitialResponse::new("SCRAM-SHA-256", Some(b"n,,".to_vec())).unwrap(),
        ),
        b"p\0\0\0\x19SCRAM-SHA-256\0\0\0\0\x03n,,",
    );
    assert_encoded_as(
        FrontendMessage::SaslInitialResponse(
            SaslInitialResponse::new("SCRAM-SHA-256", None).unwrap(),
        ),
        b"p\0\0\0\x16SCRAM-SHA-256\0\xff\xff\xff\xff",
    );
    assert_encoded_as(
        FrontendMessage::SaslResponse(SaslResponse::new(b"c=biws".to_vec()).unwrap()),
        b"p\0\0\0\x0ac=biws",
    );
    assert_encoded_as(
        FrontendMessage::GssResponse(GssResponse::new(vec![1, 2]).unwrap()),
        b"p\0\0\0\x06\x01\x02",
    );
}

#[test]
fn simple_query() {
    assert_encoded_as(
        FrontendMessage::Query(Query::new("SELECT 1").unwrap()),
        b"Q\0\0\0\x0dSELECT 1\0",
    );
}

#[test]
fn extended_query() {
    assert_encoded_as(
        FrontendMessage::Parse(Parse::new("s1", "SELECT $1", vec![23]).unwrap()),
        b"P\0\0\0\x17s1\0SELECT $1\0\0\x01\0\0\0\x17",
    );
    assert_encoded_as(
        FrontendMessage::Bind(
            Bind::new(
                "",
                "s1",
                vec![FormatCode::Binary],
                vec![Some(42i32.to_be_bytes().to_vec()), None],
                vec![FormatCode::Text],
            )
            .unwrap(),
        ),
        b"B\0\0\0\x1e\0s1\0\0\x01\0\x01\0\x02\0\0\0\x04\0\0\0\x2a\xff\xff\xff\xff\0\x01\0\0",
    );
    assert_encoded_as(
        FrontendMessage::Describe(Describe::new(Target::Statement, "s1").unwrap()),
        b"D\0\0\0\x08Ss1\0",
    );
    assert_encoded_as(
        FrontendMessage::Close(Close::new(Target::Portal, "").unwrap()),
        b"C\0\0\0\x06P\0",
    );
    assert_encoded_as(
        FrontendMessage::Execute(Execute::new("", 0).unwrap()),
        b"E\0\0\0\x09\0\0\0\0\0",
    );
    assert_encoded_as(FrontendMessage::Sync, b"S\0\0\0\x04");
    assert_encoded_as(FrontendMessage::Flush, b"H\0\0\0\x04");
    assert_encoded_as(FrontendMessage::Terminate, b"X\0\0\0\x04");
}

#[test]
fn function_call() {
    let call = FunctionCall::new(1598, vec![], vec![Some(b"42".to_vec())], FormatCode::Text)
        .unwrap();
    assert_encoded_as(
        FrontendMessage::FunctionCall(call),
        b"F\0\0\0\x14\0\0\x06\x3e\0\0\0\x01\0\0\0\x0242\0\0",
    );
}

#[test]
fn copy_messages() {
    assert_encoded_as(
        FrontendMessage::CopyData(CopyData::new(b"1\t2\n".to_vec()).unwrap()),
        b"d\0\0\0\x081\t2\n",
    );
    assert_encoded_as(FrontendMessage::CopyDone, b"c\0\0\0\x04");
    assert_encoded_as(
        FrontendMessage::CopyFail(CopyFail::new("test-message").unwrap()),
        b"f\0\0\0\x11test-message\0",
    );
}

#[track_caller]
fn assert_rejected<T: std::fmt::Debug>(result: Result<T, Error>, expected: &str) {
    let err = result.unwrap_err();
    assert!(matches!(err, Error::InvalidField { .. }), "{:?}", err);
    assert_eq!(err.to_string(), expected);
}

#[test]
fn nul_bytes_are_rejected() {
    assert_rejected(Query::new("SELECT\01"), "sql must not contain a nul byte");
    assert_rejected(
        PasswordMessage::new("pass\0word"),
        "password must not contain a nul byte",
    );
    assert_rejected(Parse::new("a\0b", "SELECT 1", vec![]), "name must not contain a nul byte");
    assert_rejected(Parse::new("", "SELECT\0", vec![]), "query must not contain a nul byte");
    assert_rejected(
        Bind::new("p\0", "", vec![], vec![], vec![]),
        "portal must not contain a nul byte",
    );
    assert_rejected(
        Bind::new("", "s\0", vec![], vec![], vec![]),
        "statement must not contain a nul byte",
    );
    assert_rejected(
        Describe::new(Target::Portal, "\0"),
        "name must not contain a nul byte",
    );
    assert_rejected(Close::new(Target::Statement, "\0"), "name must not contain a nul byte");
    assert_rejected(Execute::new("\0", 0), "portal must not contain a nul byte");
    assert_rejected(CopyFail::new("bad\0"), "message must not contain a nul byte");
    assert_rejected(
        SaslInitialResponse::new("SCRAM\0", None),
        "mechanism must not contain a nul byte",
    );
}

#[test]
fn startup_parameters_are_validated() {
    assert_rejected(
        StartupMessage::new(params(&[("database", "shop")])),
        "user must not be empty",
    );
    assert_rejected(
        StartupMessage::new(params(&[("user", "")])),
        "user must not be empty",
    );
    assert_rejected(
        StartupMessage::new(params(&[("user", "a"), ("", "x")])),
        "parameters must not contain an empty name",
    );
    assert_rejected(
        StartupMessage::new(params(&[("user", "a\0b")])),
        "parameters must not contain a nul byte",
    );
}

#[test]
fn counts_and_lengths_are_validated() {
    assert_rejected(
        Parse::new("", "SELECT 1", vec![0; 40_000]),
        "parameter_types has too many entries",
    );
    assert_rejected(
        Bind::new("", "", vec![FormatCode::Text; 2], vec![None; 3], vec![]),
        "parameter_formats must have zero, one, or one entry per parameter",
    );
    assert_rejected(
        FunctionCall::new(1, vec![FormatCode::Binary; 2], vec![None], FormatCode::Text),
        "argument_formats must have zero, one, or one entry per argument",
    );
    assert_rejected(Execute::new("", u32::MAX), "max_rows is too large");
    assert_rejected(SaslInitialResponse::new("", None), "mechanism must not be empty");
    for len in [0, 1, 3, 257] {
        assert_rejected(
            CancelRequest::new(1, vec![0; len]),
            "secret_key must be between 4 and 256 bytes",
        );
    }
}

#[test]
fn frame_length_includes_length_field() {
    // vec! of zeroes maps fresh pages that are never touched here
    let largest = i32::MAX as usize - 4;
    assert!(CopyData::new(vec![0; largest]).is_ok());
    assert_rejected(CopyData::new(vec![0; largest + 1]), "data is too large");
}

#[test]
fn bind_accepts_single_format_for_all_parameters() {
    let bind = Bind::new(
        "",
        "",
        vec![FormatCode::Binary],
        vec![None, None, None],
        vec![],
    )
    .unwrap();
    assert_eq!(bind.parameter_formats(), &[FormatCode::Binary]);
    assert_eq!(bind.parameters().len(), 3);
}
