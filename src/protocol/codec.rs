//! PostgreSQL wire protocol encoding and decoding primitives.
//!
//! PostgreSQL uses big-endian (network byte order) for all integers.
//! Strings are either raw bytes whose length is known from context or
//! null-terminated C-strings.

use zerocopy::FromBytes;
use zerocopy::byteorder::big_endian::{I16 as I16BE, I32 as I32BE, U16 as U16BE, U32 as U32BE};

use crate::error::{Error, Result};

/// Read 1-byte unsigned integer.
#[inline]
pub fn read_u8(data: &[u8]) -> Result<(u8, &[u8])> {
    match data.split_first() {
        Some((&value, rest)) => Ok((value, rest)),
        None => Err(Error::Protocol("read_u8: empty buffer".into())),
    }
}

/// Read 2-byte big-endian signed integer.
#[inline]
pub fn read_i16(data: &[u8]) -> Result<(i16, &[u8])> {
    let (value, rest) = I16BE::read_from_prefix(data).map_err(|_| {
        Error::Protocol(format!("read_i16: buffer too short: {} < 2", data.len()))
    })?;
    Ok((value.get(), rest))
}

/// Read 2-byte big-endian unsigned integer.
#[inline]
pub fn read_u16(data: &[u8]) -> Result<(u16, &[u8])> {
    let (value, rest) = U16BE::read_from_prefix(data).map_err(|_| {
        Error::Protocol(format!("read_u16: buffer too short: {} < 2", data.len()))
    })?;
    Ok((value.get(), rest))
}

/// Read 4-byte big-endian signed integer.
#[inline]
pub fn read_i32(data: &[u8]) -> Result<(i32, &[u8])> {
    let (value, rest) = I32BE::read_from_prefix(data).map_err(|_| {
        Error::Protocol(format!("read_i32: buffer too short: {} < 4", data.len()))
    })?;
    Ok((value.get(), rest))
}

/// Read 4-byte big-endian unsigned integer.
#[inline]
pub fn read_u32(data: &[u8]) -> Result<(u32, &[u8])> {
    let (value, rest) = U32BE::read_from_prefix(data).map_err(|_| {
        Error::Protocol(format!("read_u32: buffer too short: {} < 4", data.len()))
    })?;
    Ok((value.get(), rest))
}

/// Read fixed-length bytes.
#[inline]
pub fn read_bytes(data: &[u8], len: usize) -> Result<(&[u8], &[u8])> {
    data.split_at_checked(len).ok_or_else(|| {
        Error::Protocol(format!(
            "read_bytes: buffer too short: {} < {}",
            data.len(),
            len
        ))
    })
}

/// Read null-terminated string (PostgreSQL String type).
/// Returns the string bytes (without the null terminator) and remaining data.
#[inline]
pub fn read_cstring(data: &[u8]) -> Result<(&[u8], &[u8])> {
    match memchr::memchr(0, data) {
        Some(pos) => {
            let (bytes, rest) = data.split_at(pos);
            Ok((bytes, rest.get(1..).unwrap_or_default()))
        }
        None => Err(Error::Protocol(
            "read_cstring: no null terminator found".into(),
        )),
    }
}

/// Read null-terminated string as &str.
#[inline]
pub fn read_cstr(data: &[u8]) -> Result<(&str, &[u8])> {
    let (bytes, rest) = read_cstring(data)?;
    let s = simdutf8::compat::from_utf8(bytes)
        .map_err(|e| Error::Protocol(format!("read_cstr: invalid UTF-8: {e}")))?;
    Ok((s, rest))
}

/// Write 1-byte unsigned integer.
#[inline]
pub fn write_u8(out: &mut Vec<u8>, value: u8) {
    out.push(value);
}

/// Write 2-byte big-endian signed integer.
#[inline]
pub fn write_i16(out: &mut Vec<u8>, value: i16) {
    out.extend_from_slice(&value.to_be_bytes());
}

/// Write 2-byte big-endian unsigned integer.
#[inline]
pub fn write_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_be_bytes());
}

/// Write 4-byte big-endian signed integer.
#[inline]
pub fn write_i32(out: &mut Vec<u8>, value: i32) {
    out.extend_from_slice(&value.to_be_bytes());
}

/// Write 4-byte big-endian unsigned integer.
#[inline]
pub fn write_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_be_bytes());
}

/// Write raw bytes.
#[inline]
pub fn write_bytes(out: &mut Vec<u8>, data: &[u8]) {
    out.extend_from_slice(data);
}

/// Write null-terminated string (PostgreSQL String type).
#[inline]
pub fn write_cstring(out: &mut Vec<u8>, s: &[u8]) {
    out.extend_from_slice(s);
    out.push(0);
}

/// Write null-terminated string from &str.
#[inline]
pub fn write_cstr(out: &mut Vec<u8>, s: &str) {
    write_cstring(out, s.as_bytes());
}

/// Write an Int32 length followed by the bytes, or `-1` for NULL.
#[inline]
pub fn write_length_prefixed(out: &mut Vec<u8>, value: Option<&[u8]>) {
    match value {
        Some(bytes) => {
            write_i32(out, bytes.len() as i32);
            write_bytes(out, bytes);
        }
        None => write_i32(out, -1),
    }
}

/// Reject values that cannot be framed as a C-string.
#[inline]
pub fn ensure_cstr(field: &'static str, value: &str) -> Result<()> {
    match memchr::memchr(0, value.as_bytes()) {
        Some(_) => Err(Error::nul_in(field)),
        None => Ok(()),
    }
}

/// Convert a collection length into an Int16 count field.
#[inline]
pub fn ensure_i16_len(field: &'static str, len: usize) -> Result<i16> {
    i16::try_from(len).map_err(|_| Error::InvalidField {
        field,
        reason: "has too many entries",
    })
}

/// Convert a byte length into an Int32 length field.
#[inline]
pub fn ensure_i32_len(field: &'static str, len: usize) -> Result<i32> {
    i32::try_from(len).map_err(|_| Error::InvalidField {
        field,
        reason: "is too large",
    })
}

/// Reject a message whose payload of `payload_len` bytes plus the length
/// field itself does not fit in the Int32 frame length.
#[inline]
pub fn ensure_frame_len(field: &'static str, payload_len: usize) -> Result<()> {
    ensure_i32_len(field, payload_len.saturating_add(4)).map(drop)
}

/// Encoded size of a run of length-prefixed values, saturating on overflow.
pub fn length_prefixed_len<'v>(values: impl IntoIterator<Item = Option<&'v [u8]>>) -> usize {
    values.into_iter().fold(0, |acc: usize, value| {
        acc.saturating_add(4)
            .saturating_add(value.map_or(0, <[u8]>::len))
    })
}

/// Length field value for a message of `written` bytes, length field included.
fn length_field(written: usize) -> Result<i32> {
    i32::try_from(written).map_err(|_| {
        Error::Encode(format!(
            "message of {} bytes exceeds the Int32 length field",
            written
        ))
    })
}

/// Message builder helper that handles the length field.
///
/// PostgreSQL message format:
/// - Type byte (1 byte) - NOT included in length
/// - Length (4 bytes) - includes itself
/// - Payload (Length - 4 bytes)
pub struct MessageBuilder<'a> {
    buf: &'a mut Vec<u8>,
    start: usize,
    tagged: bool,
}

impl<'a> MessageBuilder<'a> {
    /// Start building a message with a type byte.
    pub fn new(buf: &'a mut Vec<u8>, type_byte: u8) -> Self {
        buf.push(type_byte);
        let start = buf.len();
        buf.extend_from_slice(&[0, 0, 0, 0]); // Placeholder for length
        Self {
            buf,
            start,
            tagged: true,
        }
    }

    /// Start building a startup-phase message (no type byte).
    pub fn new_startup(buf: &'a mut Vec<u8>) -> Self {
        let start = buf.len();
        buf.extend_from_slice(&[0, 0, 0, 0]); // Placeholder for length
        Self {
            buf,
            start,
            tagged: false,
        }
    }

    /// Write a u8.
    pub fn write_u8(&mut self, value: u8) {
        write_u8(self.buf, value);
    }

    /// Write an i16.
    pub fn write_i16(&mut self, value: i16) {
        write_i16(self.buf, value);
    }

    /// Write a u16.
    pub fn write_u16(&mut self, value: u16) {
        write_u16(self.buf, value);
    }

    /// Write an i32.
    pub fn write_i32(&mut self, value: i32) {
        write_i32(self.buf, value);
    }

    /// Write a u32.
    pub fn write_u32(&mut self, value: u32) {
        write_u32(self.buf, value);
    }

    /// Write raw bytes.
    pub fn write_bytes(&mut self, data: &[u8]) {
        write_bytes(self.buf, data);
    }

    /// Write null-terminated string.
    pub fn write_cstr(&mut self, s: &str) {
        write_cstr(self.buf, s);
    }

    /// Write null-terminated byte string.
    pub fn write_cstring(&mut self, s: &[u8]) {
        write_cstring(self.buf, s);
    }

    /// Write a length-prefixed value (`-1` for NULL).
    pub fn write_length_prefixed(&mut self, value: Option<&[u8]>) {
        write_length_prefixed(self.buf, value);
    }

    /// Finish building the message and fill in the length field.
    ///
    /// A message longer than `i32::MAX` bytes is removed from the buffer
    /// again and reported as [`Error::Encode`].
    pub fn finish(self) -> Result<()> {
        let len = match length_field(self.buf.len() - self.start) {
            Ok(len) => len,
            Err(e) => {
                // Drop the type byte too, if there is one
                let tag_start = self.start.saturating_sub(usize::from(self.tagged));
                self.buf.truncate(tag_start);
                return Err(e);
            }
        };
        if let Some(slot) = self.buf.get_mut(self.start..self.start + 4) {
            slot.copy_from_slice(&len.to_be_bytes());
        }
        Ok(())
    }
}

/// Read cursor over a single frame payload.
///
/// The cursor never reads past the slice it was created over, so callers
/// hand it a frame-limited view. `mark`/`reset` allow backtracking while
/// probing optional trailing content.
#[derive(Debug, Clone)]
pub struct ReadBuf<'a> {
    data: &'a [u8],
    pos: usize,
    mark: usize,
}

impl<'a> ReadBuf<'a> {
    /// Create a cursor positioned at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            mark: 0,
        }
    }

    /// Number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Check if every byte has been consumed.
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Current read offset from the start of the payload.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Remember the current position.
    pub fn mark(&mut self) {
        self.mark = self.pos;
    }

    /// Return to the last marked position (the start if never marked).
    pub fn reset(&mut self) {
        self.pos = self.mark;
    }

    fn rest(&self) -> &'a [u8] {
        self.data.get(self.pos..).unwrap_or_default()
    }

    fn advance_to(&mut self, rest: &'a [u8]) {
        self.pos = self.data.len() - rest.len();
    }

    /// Look at the next byte without consuming it.
    pub fn peek_u8(&self) -> Option<u8> {
        self.rest().first().copied()
    }

    /// Read 1-byte unsigned integer.
    pub fn read_u8(&mut self) -> Result<u8> {
        let (value, rest) = read_u8(self.rest())?;
        self.advance_to(rest);
        Ok(value)
    }

    /// Read 2-byte big-endian signed integer.
    pub fn read_i16(&mut self) -> Result<i16> {
        let (value, rest) = read_i16(self.rest())?;
        self.advance_to(rest);
        Ok(value)
    }

    /// Read 2-byte big-endian unsigned integer.
    pub fn read_u16(&mut self) -> Result<u16> {
        let (value, rest) = read_u16(self.rest())?;
        self.advance_to(rest);
        Ok(value)
    }

    /// Read 4-byte big-endian signed integer.
    pub fn read_i32(&mut self) -> Result<i32> {
        let (value, rest) = read_i32(self.rest())?;
        self.advance_to(rest);
        Ok(value)
    }

    /// Read 4-byte big-endian unsigned integer.
    pub fn read_u32(&mut self) -> Result<u32> {
        let (value, rest) = read_u32(self.rest())?;
        self.advance_to(rest);
        Ok(value)
    }

    /// Read fixed-length bytes.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        let (value, rest) = read_bytes(self.rest(), len)?;
        self.advance_to(rest);
        Ok(value)
    }

    /// Read a fixed-size array.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let bytes = self.read_bytes(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    /// Read null-terminated byte string.
    pub fn read_cstring(&mut self) -> Result<&'a [u8]> {
        let (value, rest) = read_cstring(self.rest())?;
        self.advance_to(rest);
        Ok(value)
    }

    /// Read null-terminated UTF-8 string.
    pub fn read_cstr(&mut self) -> Result<&'a str> {
        let (value, rest) = read_cstr(self.rest())?;
        self.advance_to(rest);
        Ok(value)
    }

    /// Read an Int32 length followed by that many bytes; `-1` means NULL.
    pub fn read_length_prefixed(&mut self) -> Result<Option<&'a [u8]>> {
        self.mark();
        let len = self.read_i32()?;
        match len {
            -1 => Ok(None),
            n if n < 0 => {
                self.reset();
                Err(Error::Protocol(format!("invalid value length: {}", n)))
            }
            n => match self.read_bytes(n as usize) {
                Ok(bytes) => Ok(Some(bytes)),
                Err(e) => {
                    self.reset();
                    Err(e)
                }
            },
        }
    }

    /// Consume every remaining byte.
    pub fn read_rest(&mut self) -> &'a [u8] {
        let rest = self.rest();
        self.pos = self.data.len();
        rest
    }

    /// Fail unless the payload has been consumed exactly.
    pub fn finish(&self, context: &str) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(Error::Protocol(format!(
                "{}: {} unexpected trailing byte(s)",
                context,
                self.remaining()
            )))
        }
    }
}
