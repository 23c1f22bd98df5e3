//! Simple query protocol messages.

use crate::error::Result;
use crate::protocol::codec::{MessageBuilder, ensure_cstr, ensure_frame_len};

/// Query message - run one or more SQL statements.
///
/// The query string may contain multiple SQL statements separated by semicolons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    sql: String,
}

impl Query {
    /// Create a Query message.
    pub fn new(sql: impl Into<String>) -> Result<Self> {
        let sql = sql.into();
        ensure_cstr("sql", &sql)?;
        ensure_frame_len("sql", sql.len() + 1)?;
        Ok(Self { sql })
    }

    /// Query text.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Append the encoded message to `buf`.
    pub fn encode(&self, buf: &mut Vec<u8>) -> Result<()> {
        let mut msg = MessageBuilder::new(buf, super::msg_type::QUERY);
        msg.write_cstr(&self.sql);
        msg.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query() {
        let mut buf = Vec::new();
        Query::new("SELECT 1").unwrap().encode(&mut buf).unwrap();

        assert_eq!(buf[0], b'Q');

        // Length should be 4 (length field) + 9 (query + null terminator)
        let len = i32::from_be_bytes([buf[1], buf[2], buf[3], buf[4]]);
        assert_eq!(len, 13);
        assert_eq!(&buf[5..14], b"SELECT 1\0");
    }

    #[test]
    fn test_query_rejects_nul() {
        let err = Query::new("SELECT 1\0; DROP TABLE t").unwrap_err();
        assert_eq!(err.to_string(), "sql must not contain a nul byte");
    }
}
