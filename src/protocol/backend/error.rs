//! Error and notice response messages.

use crate::error::{Error, ErrorFields, Result};
use crate::protocol::codec::{MessageBuilder, ReadBuf, ensure_cstr};

/// Error field type codes from PostgreSQL protocol.
pub mod field_type {
    /// Severity (localized)
    pub const SEVERITY: u8 = b'S';
    /// Severity (non-localized, PostgreSQL 9.6+)
    pub const SEVERITY_NON_LOCALIZED: u8 = b'V';
    /// SQLSTATE code
    pub const CODE: u8 = b'C';
    /// Message
    pub const MESSAGE: u8 = b'M';
    /// Detail
    pub const DETAIL: u8 = b'D';
    /// Hint
    pub const HINT: u8 = b'H';
    /// Position in query
    pub const POSITION: u8 = b'P';
    /// Internal position
    pub const INTERNAL_POSITION: u8 = b'p';
    /// Internal query
    pub const INTERNAL_QUERY: u8 = b'q';
    /// Where (context)
    pub const WHERE: u8 = b'W';
    /// Schema name
    pub const SCHEMA: u8 = b's';
    /// Table name
    pub const TABLE: u8 = b't';
    /// Column name
    pub const COLUMN: u8 = b'c';
    /// Data type name
    pub const DATA_TYPE: u8 = b'd';
    /// Constraint name
    pub const CONSTRAINT: u8 = b'n';
    /// File name
    pub const FILE: u8 = b'F';
    /// Line number
    pub const LINE: u8 = b'L';
    /// Routine name
    pub const ROUTINE: u8 = b'R';
}

/// Ordered `(code, value)` pairs of an ErrorResponse or NoticeResponse.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fields {
    entries: Vec<(u8, String)>,
}

impl Fields {
    /// Create a field list.
    ///
    /// A zero code would terminate the list on the wire.
    pub fn new(entries: Vec<(u8, String)>) -> Result<Self> {
        for (code, value) in &entries {
            if *code == 0 {
                return Err(Error::InvalidField {
                    field: "fields",
                    reason: "must not use a zero field code",
                });
            }
            ensure_cstr("fields", value)?;
        }
        Ok(Self { entries })
    }

    /// Raw entries in wire order.
    pub fn entries(&self) -> &[(u8, String)] {
        &self.entries
    }

    /// First value for a field code.
    pub fn get(&self, code: u8) -> Option<&str> {
        self.entries
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, v)| v.as_str())
    }

    /// Project into the typed field set.
    pub fn to_error_fields(&self) -> ErrorFields {
        let mut fields = ErrorFields::default();
        for (code, value) in &self.entries {
            let value = value.clone();
            match *code {
                field_type::SEVERITY => fields.severity = Some(value),
                field_type::SEVERITY_NON_LOCALIZED => fields.severity_non_localized = Some(value),
                field_type::CODE => fields.code = Some(value),
                field_type::MESSAGE => fields.message = Some(value),
                field_type::DETAIL => fields.detail = Some(value),
                field_type::HINT => fields.hint = Some(value),
                field_type::POSITION => fields.position = value.parse().ok(),
                field_type::INTERNAL_POSITION => fields.internal_position = value.parse().ok(),
                field_type::INTERNAL_QUERY => fields.internal_query = Some(value),
                field_type::WHERE => fields.where_ = Some(value),
                field_type::SCHEMA => fields.schema = Some(value),
                field_type::TABLE => fields.table = Some(value),
                field_type::COLUMN => fields.column = Some(value),
                field_type::DATA_TYPE => fields.data_type = Some(value),
                field_type::CONSTRAINT => fields.constraint = Some(value),
                field_type::FILE => fields.file = Some(value),
                field_type::LINE => fields.line = value.parse().ok(),
                field_type::ROUTINE => fields.routine = Some(value),
                other => {
                    // Unknown field type - ignore
                    tracing::debug!("Unknown error field type: {}", other.escape_ascii());
                }
            }
        }
        fields
    }

    /// Severity, preferring the non-localized form.
    pub fn severity(&self) -> Option<&str> {
        self.get(field_type::SEVERITY_NON_LOCALIZED)
            .or_else(|| self.get(field_type::SEVERITY))
    }

    fn decode(buf: &mut ReadBuf<'_>) -> Result<Self> {
        let mut entries = Vec::new();
        loop {
            let code = buf.read_u8()?;
            if code == 0 {
                break;
            }
            entries.push((code, buf.read_cstr()?.to_string()));
        }
        Ok(Self { entries })
    }

    fn write(&self, msg: &mut MessageBuilder<'_>) {
        for (code, value) in &self.entries {
            msg.write_u8(*code);
            msg.write_cstr(value);
        }
        msg.write_u8(0);
    }
}

/// ErrorResponse message - error reported by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorResponse {
    fields: Fields,
}

impl ErrorResponse {
    /// Create an ErrorResponse message.
    pub fn new(fields: Fields) -> Self {
        Self { fields }
    }

    /// Raw fields in wire order.
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// Convert to an Error.
    pub fn into_error(self) -> Error {
        Error::Server(self.fields.to_error_fields())
    }

    /// Get the SQLSTATE code.
    pub fn code(&self) -> Option<&str> {
        self.fields.get(field_type::CODE)
    }

    /// Get the primary message.
    pub fn message(&self) -> Option<&str> {
        self.fields.get(field_type::MESSAGE)
    }

    /// Get the severity.
    pub fn severity(&self) -> Option<&str> {
        self.fields.severity()
    }

    pub(crate) fn decode(buf: &mut ReadBuf<'_>) -> Result<Self> {
        Ok(Self {
            fields: Fields::decode(buf)?,
        })
    }

    pub(crate) fn write_payload(&self, msg: &mut MessageBuilder<'_>) {
        self.fields.write(msg);
    }
}

/// NoticeResponse message - non-fatal warning/info from server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoticeResponse {
    fields: Fields,
}

impl NoticeResponse {
    /// Create a NoticeResponse message.
    pub fn new(fields: Fields) -> Self {
        Self { fields }
    }

    /// Raw fields in wire order.
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// Get the SQLSTATE code.
    pub fn code(&self) -> Option<&str> {
        self.fields.get(field_type::CODE)
    }

    /// Get the primary message.
    pub fn message(&self) -> Option<&str> {
        self.fields.get(field_type::MESSAGE)
    }

    /// Get the severity.
    pub fn severity(&self) -> Option<&str> {
        self.fields.severity()
    }

    pub(crate) fn decode(buf: &mut ReadBuf<'_>) -> Result<Self> {
        Ok(Self {
            fields: Fields::decode(buf)?,
        })
    }

    pub(crate) fn write_payload(&self, msg: &mut MessageBuilder<'_>) {
        self.fields.write(msg);
    }
}
