//! Query-related backend messages.

use std::mem::size_of;

use zerocopy::byteorder::big_endian::{I16 as I16BE, I32 as I32BE, U32 as U32BE};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::error::{Error, Result};
use crate::protocol::codec::{MessageBuilder, ReadBuf, ensure_cstr, ensure_i16_len};
use crate::protocol::types::{FormatCode, Oid};

/// Fixed-size tail of a field description (18 bytes).
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C, packed)]
struct FieldDescriptionTail {
    table_oid: U32BE,
    column_id: I16BE,
    type_oid: U32BE,
    type_size: I16BE,
    type_modifier: I32BE,
    format: I16BE,
}

const TAIL_SIZE: usize = size_of::<FieldDescriptionTail>();

/// Field description within a RowDescription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescription {
    /// Field name
    pub name: String,
    /// Table OID (0 if not a table column)
    pub table_oid: Oid,
    /// Column attribute number (0 if not a table column)
    pub column_id: i16,
    /// Data type OID
    pub type_oid: Oid,
    /// Type size (-1 for variable, -2 for null-terminated)
    pub type_size: i16,
    /// Type modifier (type-specific)
    pub type_modifier: i32,
    /// Format code
    pub format: FormatCode,
}

impl FieldDescription {
    /// Create a field description for a computed column (no table, text format).
    pub fn new(name: impl Into<String>, type_oid: Oid) -> Self {
        Self {
            name: name.into(),
            table_oid: 0,
            column_id: 0,
            type_oid,
            type_size: -1,
            type_modifier: -1,
            format: FormatCode::Text,
        }
    }

    fn decode(buf: &mut ReadBuf<'_>) -> Result<Self> {
        let name = buf.read_cstr()?.to_string();
        let tail = FieldDescriptionTail::read_from_bytes(buf.read_bytes(TAIL_SIZE)?)
            .map_err(|e| Error::Protocol(format!("FieldDescription tail: {e:?}")))?;

        Ok(Self {
            name,
            table_oid: tail.table_oid.get(),
            column_id: tail.column_id.get(),
            type_oid: tail.type_oid.get(),
            type_size: tail.type_size.get(),
            type_modifier: tail.type_modifier.get(),
            format: FormatCode::try_from(tail.format.get())?,
        })
    }

    fn write(&self, msg: &mut MessageBuilder<'_>) {
        msg.write_cstr(&self.name);
        let tail = FieldDescriptionTail {
            table_oid: U32BE::new(self.table_oid),
            column_id: I16BE::new(self.column_id),
            type_oid: U32BE::new(self.type_oid),
            type_size: I16BE::new(self.type_size),
            type_modifier: I32BE::new(self.type_modifier),
            format: I16BE::new(self.format.code()),
        };
        msg.write_bytes(tail.as_bytes());
    }
}

/// RowDescription message - describes the columns in a result set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowDescription {
    fields: Vec<FieldDescription>,
}

impl RowDescription {
    /// Create a RowDescription message.
    pub fn new(fields: Vec<FieldDescription>) -> Result<Self> {
        ensure_i16_len("fields", fields.len())?;
        for field in &fields {
            ensure_cstr("fields", &field.name)?;
        }
        Ok(Self { fields })
    }

    /// Get the number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if there are no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Get field descriptions.
    pub fn fields(&self) -> &[FieldDescription] {
        &self.fields
    }

    /// Iterate over field descriptions.
    pub fn iter(&self) -> impl Iterator<Item = &FieldDescription> {
        self.fields.iter()
    }

    pub(crate) fn decode(buf: &mut ReadBuf<'_>) -> Result<Self> {
        let num_fields = buf.read_i16()?;
        if num_fields < 0 {
            return Err(Error::Protocol(format!(
                "RowDescription: negative field count {}",
                num_fields
            )));
        }

        let mut fields = Vec::with_capacity(num_fields as usize);
        for _ in 0..num_fields {
            fields.push(FieldDescription::decode(buf)?);
        }
        Ok(Self { fields })
    }

    pub(crate) fn write_payload(&self, msg: &mut MessageBuilder<'_>) {
        msg.write_i16(self.fields.len() as i16);
        for field in &self.fields {
            field.write(msg);
        }
    }
}

/// DataRow message - contains a single row of data.
///
/// Each column is `None` for SQL NULL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataRow {
    columns: Vec<Option<Vec<u8>>>,
}

impl DataRow {
    /// Create a DataRow message.
    pub fn new(columns: Vec<Option<Vec<u8>>>) -> Result<Self> {
        ensure_i16_len("columns", columns.len())?;
        Ok(Self { columns })
    }

    /// Get the number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Check if there are no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Iterate over column values.
    pub fn iter(&self) -> impl Iterator<Item = Option<&[u8]>> {
        self.columns.iter().map(|c| c.as_deref())
    }

    /// Get a column value by index.
    ///
    /// Returns `None` if out of range, `Some(None)` if the column is NULL.
    pub fn get(&self, index: usize) -> Option<Option<&[u8]>> {
        self.columns.get(index).map(|c| c.as_deref())
    }

    /// Take ownership of the column values.
    pub fn into_columns(self) -> Vec<Option<Vec<u8>>> {
        self.columns
    }

    pub(crate) fn decode(buf: &mut ReadBuf<'_>) -> Result<Self> {
        let num_columns = buf.read_i16()?;
        if num_columns < 0 {
            return Err(Error::Protocol(format!(
                "DataRow: negative column count {}",
                num_columns
            )));
        }

        let mut columns = Vec::with_capacity(num_columns as usize);
        for _ in 0..num_columns {
            columns.push(buf.read_length_prefixed()?.map(<[u8]>::to_vec));
        }
        Ok(Self { columns })
    }

    pub(crate) fn write_payload(&self, msg: &mut MessageBuilder<'_>) {
        msg.write_i16(self.columns.len() as i16);
        for column in &self.columns {
            msg.write_length_prefixed(column.as_deref());
        }
    }
}

/// CommandComplete message - indicates successful completion of a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandComplete {
    tag: String,
}

impl CommandComplete {
    /// Create a CommandComplete message.
    pub fn new(tag: impl Into<String>) -> Result<Self> {
        let tag = tag.into();
        ensure_cstr("tag", &tag)?;
        Ok(Self { tag })
    }

    /// Command tag (e.g., "SELECT 5", "INSERT 0 1", "UPDATE 10")
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Parse the number of rows affected from the command tag.
    ///
    /// Returns `Some(count)` for commands like SELECT, INSERT, UPDATE, DELETE.
    /// Returns `None` for other commands or parse failures.
    pub fn rows_affected(&self) -> Option<u64> {
        let parts: Vec<&str> = self.tag.split_whitespace().collect();

        match parts.as_slice() {
            ["INSERT", _oid, count] => count.parse().ok(),
            [
                "SELECT" | "UPDATE" | "DELETE" | "MERGE" | "COPY" | "MOVE" | "FETCH",
                count,
            ] => count.parse().ok(),
            _ => None,
        }
    }

    /// Get the command name from the tag.
    pub fn command(&self) -> Option<&str> {
        self.tag.split_whitespace().next()
    }

    pub(crate) fn decode(buf: &mut ReadBuf<'_>) -> Result<Self> {
        Ok(Self {
            tag: buf.read_cstr()?.to_string(),
        })
    }

    pub(crate) fn write_payload(&self, msg: &mut MessageBuilder<'_>) {
        msg.write_cstr(&self.tag);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row_description_payload() -> Vec<u8> {
        let mut payload = Vec::new();
        payload.extend_from_slice(&1_i16.to_be_bytes());
        payload.extend_from_slice(b"id\0");
        payload.extend_from_slice(&16384_u32.to_be_bytes()); // table oid
        payload.extend_from_slice(&1_i16.to_be_bytes()); // column id
        payload.extend_from_slice(&23_u32.to_be_bytes()); // int4
        payload.extend_from_slice(&4_i16.to_be_bytes());
        payload.extend_from_slice(&(-1_i32).to_be_bytes());
        payload.extend_from_slice(&1_i16.to_be_bytes());
        payload
    }

    #[test]
    fn test_row_description() {
        let payload = row_description_payload();
        let mut buf = ReadBuf::new(&payload);
        let desc = RowDescription::decode(&mut buf).unwrap();
        buf.finish("RowDescription").unwrap();

        assert_eq!(desc.len(), 1);
        let field = &desc.fields()[0];
        assert_eq!(field.name, "id");
        assert_eq!(field.table_oid, 16384);
        assert_eq!(field.column_id, 1);
        assert_eq!(field.type_oid, 23);
        assert_eq!(field.type_size, 4);
        assert_eq!(field.type_modifier, -1);
        assert_eq!(field.format, FormatCode::Binary);
    }

    #[test]
    fn test_row_description_truncated_tail() {
        let payload = row_description_payload();
        let mut buf = ReadBuf::new(&payload[..payload.len() - 1]);
        assert!(RowDescription::decode(&mut buf).is_err());
    }

    #[test]
    fn test_row_description_bad_format() {
        let mut payload = row_description_payload();
        let last = payload.len() - 1;
        payload[last] = 7;
        let mut buf = ReadBuf::new(&payload);
        assert!(RowDescription::decode(&mut buf).is_err());
    }

    #[test]
    fn test_data_row_with_null() {
        let mut payload = Vec::new();
        payload.extend_from_slice(&3_i16.to_be_bytes());
        payload.extend_from_slice(&2_i32.to_be_bytes());
        payload.extend_from_slice(b"42");
        payload.extend_from_slice(&(-1_i32).to_be_bytes());
        payload.extend_from_slice(&0_i32.to_be_bytes());

        let mut buf = ReadBuf::new(&payload);
        let row = DataRow::decode(&mut buf).unwrap();
        buf.finish("DataRow").unwrap();

        assert_eq!(row.len(), 3);
        assert_eq!(row.get(0), Some(Some(&b"42"[..])));
        assert_eq!(row.get(1), Some(None));
        assert_eq!(row.get(2), Some(Some(&b""[..])));
        assert_eq!(row.get(3), None);
        assert_eq!(row.iter().filter(Option::is_none).count(), 1);
    }

    #[test]
    fn test_data_row_overlong_column() {
        let mut payload = Vec::new();
        payload.extend_from_slice(&1_i16.to_be_bytes());
        payload.extend_from_slice(&10_i32.to_be_bytes());
        payload.extend_from_slice(b"short");
        let mut buf = ReadBuf::new(&payload);
        assert!(DataRow::decode(&mut buf).is_err());
    }

    #[test]
    fn test_command_complete_rows_affected() {
        let cases = [
            ("SELECT 5", Some(5)),
            ("INSERT 0 1", Some(1)),
            ("UPDATE 10", Some(10)),
            ("DELETE 3", Some(3)),
            ("MERGE 2", Some(2)),
            ("COPY 7", Some(7)),
            ("CREATE TABLE", None),
            ("BEGIN", None),
        ];
        for (tag, expected) in cases {
            let cc = CommandComplete::new(tag).unwrap();
            assert_eq!(cc.rows_affected(), expected, "tag {tag}");
        }
        assert_eq!(
            CommandComplete::new("CREATE TABLE").unwrap().command(),
            Some("CREATE")
        );
    }

    #[test]
    fn test_command_complete_rejects_nul() {
        let err = CommandComplete::new("SELECT\01").unwrap_err();
        assert_eq!(err.to_string(), "tag must not contain a nul byte");
    }
}
