//! COPY protocol backend messages.

use crate::error::{Error, Result};
use crate::protocol::codec::{MessageBuilder, ReadBuf, ensure_i16_len};
use crate::protocol::types::FormatCode;

/// Body shared by CopyInResponse, CopyOutResponse and CopyBothResponse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyResponse {
    format: FormatCode,
    column_formats: Vec<FormatCode>,
}

impl CopyResponse {
    /// Create a copy response.
    ///
    /// With an overall text format every column must be text as well.
    pub fn new(format: FormatCode, column_formats: Vec<FormatCode>) -> Result<Self> {
        ensure_i16_len("column_formats", column_formats.len())?;
        if format == FormatCode::Text && column_formats.contains(&FormatCode::Binary) {
            return Err(Error::InvalidField {
                field: "column_formats",
                reason: "must all be text when the overall format is text",
            });
        }
        Ok(Self {
            format,
            column_formats,
        })
    }

    /// Overall COPY format.
    pub fn format(&self) -> FormatCode {
        self.format
    }

    /// Per-column format codes.
    pub fn column_formats(&self) -> &[FormatCode] {
        &self.column_formats
    }

    /// Check if binary format is used.
    pub fn is_binary(&self) -> bool {
        matches!(self.format, FormatCode::Binary)
    }

    pub(crate) fn decode(buf: &mut ReadBuf<'_>) -> Result<Self> {
        let format = FormatCode::try_from(i16::from(buf.read_u8()?))?;

        let num_columns = buf.read_i16()?;
        if num_columns < 0 {
            return Err(Error::Protocol(format!(
                "negative column count {}",
                num_columns
            )));
        }

        let mut column_formats = Vec::with_capacity(num_columns as usize);
        for _ in 0..num_columns {
            column_formats.push(FormatCode::try_from(buf.read_i16()?)?);
        }
        if format == FormatCode::Text && column_formats.contains(&FormatCode::Binary) {
            return Err(Error::Protocol(
                "binary column format under an overall text format".into(),
            ));
        }

        Ok(Self {
            format,
            column_formats,
        })
    }

    pub(crate) fn write_payload(&self, msg: &mut MessageBuilder<'_>) {
        msg.write_u8(self.format.code() as u8);
        msg.write_i16(self.column_formats.len() as i16);
        for format in &self.column_formats {
            msg.write_i16(format.code());
        }
    }
}

/// CopyData message - a chunk of the COPY data stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyData {
    data: Vec<u8>,
}

impl CopyData {
    /// Create a CopyData message.
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// Raw data bytes
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Take ownership of the data bytes.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub(crate) fn decode(buf: &mut ReadBuf<'_>) -> Result<Self> {
        Ok(Self {
            data: buf.read_rest().to_vec(),
        })
    }

    pub(crate) fn write_payload(&self, msg: &mut MessageBuilder<'_>) {
        msg.write_bytes(&self.data);
    }
}
