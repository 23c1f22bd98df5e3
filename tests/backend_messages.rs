//! Hand-built backend frames decode to the expected values, and every
//! backend message survives an encode/decode round trip.

mod support;

use pgcodec::protocol::backend::{
    Authentication, AuthenticationSasl, BackendKeyData, BackendMessage, CommandComplete,
    CopyData, CopyResponse, FieldDescription, Fields, FunctionCallResponse,
    NegotiateProtocolVersion, NotificationResponse, ParameterDescription, ParameterStatus,
    ReadyForQuery, RowDescription,
};
use pgcodec::{Error, FormatCode, TransactionStatus};
use support::{Payload, decode_frame_bytes, every_backend_message, frame};

#[test]
fn authentication_requests() {
    support::init_logging();

    let cases: [(i32, Authentication); 7] = [
        (0, Authentication::Ok),
        (2, Authentication::KerberosV5),
        (3, Authentication::CleartextPassword),
        (6, Authentication::ScmCredential),
        (7, Authentication::Gss),
        (9, Authentication::Sspi),
        (8, Authentication::GssContinue { data: vec![] }),
    ];
    for (code, expected) in cases {
        let msg = decode_frame_bytes(&Payload::new().i32(code).frame(b'R')).unwrap();
        assert_eq!(msg, BackendMessage::Authentication(expected));
    }

    let md5 = decode_frame_bytes(b"R\0\0\0\x0c\0\0\0\x05\x01\x02\x03\x04").unwrap();
    assert_eq!(
        md5,
        BackendMessage::Authentication(Authentication::Md5Password { salt: [1, 2, 3, 4] })
    );

    let cont = decode_frame_bytes(&Payload::new().i32(11).bytes(b"r=abc").frame(b'R')).unwrap();
    assert_eq!(
        cont,
        BackendMessage::Authentication(Authentication::SaslContinue {
            data: b"r=abc".to_vec()
        })
    );
    let fin = decode_frame_bytes(&Payload::new().i32(12).bytes(b"v=xyz").frame(b'R')).unwrap();
    assert_eq!(
        fin,
        BackendMessage::Authentication(Authentication::SaslFinal {
            data: b"v=xyz".to_vec()
        })
    );
}

#[test]
fn authentication_errors() {
    // Unknown subtype
    assert!(matches!(
        decode_frame_bytes(&Payload::new().i32(4).frame(b'R')),
        Err(Error::Protocol(_))
    ));
    // Short salt
    assert!(matches!(
        decode_frame_bytes(&Payload::new().i32(5).bytes(&[1, 2]).frame(b'R')),
        Err(Error::Protocol(_))
    ));
    // Trailing bytes after AuthenticationOk
    assert!(matches!(
        decode_frame_bytes(&Payload::new().i32(0).u8(0).frame(b'R')),
        Err(Error::Protocol(_))
    ));
}

#[test]
fn sasl_mechanisms_keep_server_order() {
    let msg = decode_frame_bytes(
        b"R\0\0\0\x2a\0\0\0\x0aSCRAM-SHA-256-PLUS\0SCRAM-SHA-256\0\0",
    )
    .unwrap();
    let BackendMessage::Authentication(Authentication::Sasl(sasl)) = msg else {
        panic!("expected AuthenticationSASL, got {:?}", msg);
    };
    assert_eq!(sasl.mechanisms(), ["SCRAM-SHA-256-PLUS", "SCRAM-SHA-256"]);
    assert!(sasl.supports("SCRAM-SHA-256"));
    assert!(!sasl.supports("OAUTHBEARER"));

    // Zero mechanisms is still a well-formed list
    let empty = decode_frame_bytes(&Payload::new().i32(10).u8(0).frame(b'R')).unwrap();
    assert!(matches!(
        empty,
        BackendMessage::Authentication(Authentication::Sasl(ref s)) if s.mechanisms().is_empty()
    ));

    // Missing list terminator
    assert!(
        decode_frame_bytes(&Payload::new().i32(10).cstr("SCRAM-SHA-256").frame(b'R')).is_err()
    );
}

#[test]
fn session_status_messages() {
    assert_eq!(
        decode_frame_bytes(b"K\0\0\0\x0c\0\0\x04\xd2\xde\xad\xbe\xef").unwrap(),
        BackendMessage::BackendKeyData(BackendKeyData::new(1234, vec![0xde, 0xad, 0xbe, 0xef]).unwrap())
    );
    // 3.2 allows longer keys
    let long_key = Payload::new().u32(1).bytes(&[7; 32]).frame(b'K');
    assert!(decode_frame_bytes(&long_key).is_ok());
    // but not shorter than 4 bytes
    assert!(decode_frame_bytes(&Payload::new().u32(1).bytes(&[7; 2]).frame(b'K')).is_err());

    assert_eq!(
        decode_frame_bytes(b"S\0\0\0\x11TimeZone\0UTC\0").unwrap(),
        BackendMessage::ParameterStatus(ParameterStatus::new("TimeZone", "UTC").unwrap())
    );

    for (byte, status) in [
        (b'I', TransactionStatus::Idle),
        (b'T', TransactionStatus::InTransaction),
        (b'E', TransactionStatus::Failed),
    ] {
        assert_eq!(
            decode_frame_bytes(&frame(b'Z', &[byte])).unwrap(),
            BackendMessage::ReadyForQuery(ReadyForQuery::new(status))
        );
    }
    assert!(decode_frame_bytes(&frame(b'Z', b"X")).is_err());

    assert_eq!(
        decode_frame_bytes(b"A\0\0\0\x10\0\0\0\x63jobs\0go\0").unwrap(),
        BackendMessage::NotificationResponse(NotificationResponse::new(99, "jobs", "go").unwrap())
    );

    assert_eq!(
        decode_frame_bytes(b"v\0\0\0\x13\0\0\0\0\0\0\0\x01_pq_.x\0").unwrap(),
        BackendMessage::NegotiateProtocolVersion(
            NegotiateProtocolVersion::new(0, vec!["_pq_.x".into()]).unwrap()
        )
    );
}

#[test]
fn empty_payload_messages() {
    let cases = [
        (b'1', BackendMessage::ParseComplete),
        (b'2', BackendMessage::BindComplete),
        (b'3', BackendMessage::CloseComplete),
        (b'n', BackendMessage::NoData),
        (b's', BackendMessage::PortalSuspended),
        (b'I', BackendMessage::EmptyQueryResponse),
        (b'c', BackendMessage::CopyDone),
    ];
    for (tag, expected) in cases {
        assert_eq!(decode_frame_bytes(&frame(tag, &[])).unwrap(), expected);
        let err = decode_frame_bytes(&frame(tag, &[0])).unwrap_err();
        assert!(matches!(err, Error::Protocol(_)), "{}: {:?}", tag.escape_ascii(), err);
    }
}

#[test]
fn query_result_messages() {
    let rows = decode_frame_bytes(
        b"T\0\0\0\x1b\0\x01id\0\0\0\x40\0\0\x01\0\0\0\x17\0\x04\xff\xff\xff\xff\0\0",
    )
    .unwrap();
    let expected_field = FieldDescription {
        name: "id".into(),
        table_oid: 16384,
        column_id: 1,
        type_oid: 23,
        type_size: 4,
        type_modifier: -1,
        format: FormatCode::Text,
    };
    assert_eq!(
        rows,
        BackendMessage::RowDescription(RowDescription::new(vec![expected_field]).unwrap())
    );

    let row = decode_frame_bytes(b"D\0\0\0\x10\0\x02\0\0\0\x0242\xff\xff\xff\xff").unwrap();
    let BackendMessage::DataRow(row) = row else {
        panic!("expected DataRow");
    };
    assert_eq!(row.get(0), Some(Some(&b"42"[..])));
    assert_eq!(row.get(1), Some(None));
    assert_eq!(row.get(2), None);

    // -2 is not a valid column length
    let bad = Payload::new().i16(1).i32(-2).frame(b'D');
    assert!(decode_frame_bytes(&bad).is_err());

    let done = decode_frame_bytes(b"C\0\0\0\x0fINSERT 0 5\0").unwrap();
    let BackendMessage::CommandComplete(done) = done else {
        panic!("expected CommandComplete");
    };
    assert_eq!(done.tag(), "INSERT 0 5");
    assert_eq!(done.rows_affected(), Some(5));
    assert_eq!(done.command(), Some("INSERT"));
}

#[test]
fn extended_query_messages() {
    assert_eq!(
        decode_frame_bytes(b"t\0\0\0\x0e\0\x02\0\0\0\x17\0\0\0\x19").unwrap(),
        BackendMessage::ParameterDescription(ParameterDescription::new(vec![23, 25]).unwrap())
    );
    assert_eq!(
        decode_frame_bytes(b"V\0\0\0\x09\0\0\0\x01\x07").unwrap(),
        BackendMessage::FunctionCallResponse(FunctionCallResponse::new(Some(vec![7])).unwrap())
    );
    assert_eq!(
        decode_frame_bytes(b"V\0\0\0\x08\xff\xff\xff\xff").unwrap(),
        BackendMessage::FunctionCallResponse(FunctionCallResponse::new(None).unwrap())
    );
}

#[test]
fn copy_messages() {
    assert_eq!(
        decode_frame_bytes(b"G\0\0\0\x0b\0\0\x02\0\0\0\0").unwrap(),
        BackendMessage::CopyInResponse(
            CopyResponse::new(FormatCode::Text, vec![FormatCode::Text; 2]).unwrap()
        )
    );
    let out = decode_frame_bytes(b"H\0\0\0\x09\x01\0\x01\0\x01").unwrap();
    let BackendMessage::CopyOutResponse(out) = out else {
        panic!("expected CopyOutResponse");
    };
    assert!(out.is_binary());
    assert_eq!(out.column_formats(), &[FormatCode::Binary]);

    // Binary column under an overall text format
    let mixed = decode_frame_bytes(b"G\0\0\0\x09\0\0\x01\0\x01").unwrap_err();
    assert!(matches!(mixed, Error::Protocol(_)), "{:?}", mixed);
    assert!(mixed.to_string().contains("CopyInResponse"), "{}", mixed);

    assert_eq!(
        decode_frame_bytes(&frame(b'd', b"1\t2\n")).unwrap(),
        BackendMessage::CopyData(CopyData::new(b"1\t2\n".to_vec()))
    );
}

#[test]
fn error_and_notice_fields() {
    let msg = decode_frame_bytes(
        b"E\0\0\0\x30SERROR\0C42P01\0Mrelation \"t\" does not exist\0\0",
    )
    .unwrap();
    let BackendMessage::ErrorResponse(err) = msg else {
        panic!("expected ErrorResponse");
    };
    assert_eq!(err.severity(), Some("ERROR"));
    assert_eq!(err.code(), Some("42P01"));
    assert_eq!(err.message(), Some("relation \"t\" does not exist"));
    let codes: Vec<u8> = err.fields().entries().iter().map(|(c, _)| *c).collect();
    assert_eq!(codes, b"SCM");

    let error = err.into_error();
    assert_eq!(error.sqlstate(), Some("42P01"));
    assert!(!error.is_connection_broken());

    // Unknown field codes are kept
    let notice = Payload::new()
        .u8(b'S')
        .cstr("NOTICE")
        .u8(b'Z')
        .cstr("future")
        .u8(0)
        .frame(b'N');
    let BackendMessage::NoticeResponse(notice) = decode_frame_bytes(&notice).unwrap() else {
        panic!("expected NoticeResponse");
    };
    assert_eq!(notice.fields().get(b'Z'), Some("future"));

    // Missing terminator
    let unterminated = Payload::new().u8(b'S').cstr("ERROR").frame(b'E');
    assert!(decode_frame_bytes(&unterminated).is_err());
}

#[test]
fn encode_decode_round_trip() {
    let messages = every_backend_message();

    // Every message type is represented
    let mut tags: Vec<u8> = messages.iter().map(|m| m.tag()).collect();
    tags.sort_unstable();
    tags.dedup();
    assert_eq!(tags.len(), pgcodec::protocol::backend::msg_type::ALL.len());

    for msg in messages {
        let bytes = msg.to_bytes().unwrap();
        assert_eq!(bytes.first(), Some(&msg.tag()));
        assert_eq!(decode_frame_bytes(&bytes).unwrap(), msg, "{}", msg.name());
    }
}

#[test]
fn backend_constructors_validate() {
    assert_eq!(
        AuthenticationSasl::new(vec!["".into()]).unwrap_err().to_string(),
        "mechanisms must not be empty"
    );
    assert!(AuthenticationSasl::new(vec![]).is_ok());
    assert!(AuthenticationSasl::new(vec!["A\0".into()]).is_err());
    assert!(ParameterStatus::new("a\0", "b").is_err());
    assert!(CommandComplete::new("OK\0").is_err());
    for len in [0, 1, 3, 257] {
        assert_eq!(
            BackendKeyData::new(1, vec![0; len]).unwrap_err().to_string(),
            "secret_key must be between 4 and 256 bytes"
        );
    }
    assert!(Fields::new(vec![(0, "x".into())]).is_err());
    assert!(Fields::new(vec![(b'M', "x\0".into())]).is_err());
    assert!(CopyResponse::new(FormatCode::Text, vec![FormatCode::Binary]).is_err());
}
