//! Error types for pgcodec.

use thiserror::Error;

/// Result type for pgcodec operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Typed view of the fields of an ErrorResponse or NoticeResponse.
///
/// Fields the server did not send are `None`; numeric fields that fail to
/// parse are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorFields {
    /// Severity: ERROR, FATAL, PANIC, WARNING, NOTICE, DEBUG, INFO, LOG
    pub severity: Option<String>,
    /// Non-localized severity (same as severity but never translated)
    pub severity_non_localized: Option<String>,
    /// SQLSTATE error code (5 characters)
    pub code: Option<String>,
    /// Primary error message
    pub message: Option<String>,
    /// Detailed error explanation
    pub detail: Option<String>,
    /// Suggestion for fixing the error
    pub hint: Option<String>,
    /// Cursor position in query string (1-based)
    pub position: Option<u32>,
    /// Position in internal query
    pub internal_position: Option<u32>,
    /// Failed internal command text
    pub internal_query: Option<String>,
    /// Context/stack trace
    pub where_: Option<String>,
    /// Schema name
    pub schema: Option<String>,
    /// Table name
    pub table: Option<String>,
    /// Column name
    pub column: Option<String>,
    /// Data type name
    pub data_type: Option<String>,
    /// Constraint name
    pub constraint: Option<String>,
    /// Source file name
    pub file: Option<String>,
    /// Source line number
    pub line: Option<u32>,
    /// Source routine name
    pub routine: Option<String>,
}

impl ErrorFields {
    /// Severity, preferring the non-localized form.
    pub fn severity(&self) -> Option<&str> {
        self.severity_non_localized
            .as_deref()
            .or(self.severity.as_deref())
    }

    /// Check if the server ends the session after this error (FATAL or PANIC).
    pub fn is_fatal(&self) -> bool {
        matches!(self.severity(), Some("FATAL" | "PANIC"))
    }

    /// SQLSTATE class, the first two characters of the code (e.g. `28` for
    /// invalid authorization).
    pub fn sqlstate_class(&self) -> Option<&str> {
        self.code.as_deref().and_then(|code| code.get(..2))
    }
}

impl std::fmt::Display for ErrorFields {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(severity) = &self.severity {
            write!(f, "{}: ", severity)?;
        }
        if let Some(message) = &self.message {
            write!(f, "{}", message)?;
        }
        if let Some(code) = &self.code {
            write!(f, " (SQLSTATE {})", code)?;
        }
        if let Some(detail) = &self.detail {
            write!(f, "\nDETAIL: {}", detail)?;
        }
        if let Some(hint) = &self.hint {
            write!(f, "\nHINT: {}", hint)?;
        }
        Ok(())
    }
}

/// Error type for pgcodec.
#[derive(Debug, Error)]
pub enum Error {
    /// A message was constructed with an invalid field.
    ///
    /// The display form (`"<field> <reason>"`) is stable and may be matched on.
    #[error("{field} {reason}")]
    InvalidField {
        /// Name of the offending field
        field: &'static str,
        /// What is wrong with it
        reason: &'static str,
    },

    /// Server error response
    #[error("PostgreSQL error: {0}")]
    Server(ErrorFields),

    /// Protocol error (malformed message, bad framing, unexpected response, etc.)
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Backend message with a type byte outside the known set
    #[error("Protocol error: unknown backend message type '{}' (0x{:02X})", .0.escape_ascii(), .0)]
    UnknownMessage(u8),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// A message could not be encoded even though it was constructed successfully
    #[error("Encode error: {0}")]
    Encode(String),

    /// Invalid usage (e.g., stepping a finished state machine)
    #[error("Invalid usage: {0}")]
    InvalidUsage(String),

    /// Unsupported feature
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

impl Error {
    /// Shorthand for a field that must not contain a NUL byte.
    pub(crate) fn nul_in(field: &'static str) -> Self {
        Error::InvalidField {
            field,
            reason: "must not contain a nul byte",
        }
    }

    /// Shorthand for a field that must not be empty.
    pub(crate) fn empty(field: &'static str) -> Self {
        Error::InvalidField {
            field,
            reason: "must not be empty",
        }
    }

    /// Returns true if the error indicates the connection is broken and cannot be reused.
    ///
    /// Framing and decode errors desynchronize the message stream, so they always
    /// break the connection.
    pub fn is_connection_broken(&self) -> bool {
        match self {
            Error::Io(_) | Error::Protocol(_) | Error::UnknownMessage(_) | Error::Auth(_) => true,
            Error::Server(fields) => fields.is_fatal(),
            _ => false,
        }
    }

    /// Get the SQLSTATE code if this is a server error.
    pub fn sqlstate(&self) -> Option<&str> {
        match self {
            Error::Server(fields) => fields.code.as_deref(),
            _ => None,
        }
    }
}
