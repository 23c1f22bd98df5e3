//! COPY protocol frontend messages.
//!
//! CopyDone carries no payload and is a unit variant of
//! [`FrontendMessage`](super::FrontendMessage).

use crate::error::Result;
use crate::protocol::codec::{MessageBuilder, ensure_cstr, ensure_frame_len};

/// CopyData message - one chunk of COPY FROM STDIN data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyData {
    data: Vec<u8>,
}

impl CopyData {
    /// Create a CopyData message.
    pub fn new(data: Vec<u8>) -> Result<Self> {
        ensure_frame_len("data", data.len())?;
        Ok(Self { data })
    }

    /// Chunk bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Append the encoded message to `buf`.
    pub fn encode(&self, buf: &mut Vec<u8>) -> Result<()> {
        write_copy_data(buf, &self.data)
    }
}

/// CopyFail message - abort COPY FROM STDIN with an error message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyFail {
    message: String,
}

impl CopyFail {
    /// Create a CopyFail message.
    pub fn new(message: impl Into<String>) -> Result<Self> {
        let message = message.into();
        ensure_cstr("message", &message)?;
        ensure_frame_len("message", message.len() + 1)?;
        Ok(Self { message })
    }

    /// Failure reason reported to the server.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Append the encoded message to `buf`.
    pub fn encode(&self, buf: &mut Vec<u8>) -> Result<()> {
        write_copy_fail(buf, &self.message)
    }
}

pub(crate) fn write_copy_data(buf: &mut Vec<u8>, data: &[u8]) -> Result<()> {
    let mut msg = MessageBuilder::new(buf, super::msg_type::COPY_DATA);
    msg.write_bytes(data);
    msg.finish()
}

pub(crate) fn write_copy_done(buf: &mut Vec<u8>) -> Result<()> {
    let msg = MessageBuilder::new(buf, super::msg_type::COPY_DONE);
    msg.finish()
}

pub(crate) fn write_copy_fail(buf: &mut Vec<u8>, message: &str) -> Result<()> {
    let mut msg = MessageBuilder::new(buf, super::msg_type::COPY_FAIL);
    msg.write_cstr(message);
    msg.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_data() {
        let mut buf = Vec::new();
        CopyData::new(b"hello\tworld\n".to_vec())
            .unwrap()
            .encode(&mut buf)
            .unwrap();

        assert_eq!(buf[0], b'd');
        let len = i32::from_be_bytes([buf[1], buf[2], buf[3], buf[4]]);
        assert_eq!(len as usize, buf.len() - 1);
        assert_eq!(&buf[5..], b"hello\tworld\n");
    }

    #[test]
    fn test_copy_done() {
        let mut buf = Vec::new();
        write_copy_done(&mut buf).unwrap();
        assert_eq!(buf, [b'c', 0, 0, 0, 4]);
    }

    #[test]
    fn test_copy_fail() {
        let mut buf = Vec::new();
        CopyFail::new("test-message").unwrap().encode(&mut buf).unwrap();
        assert_eq!(buf, b"f\x00\x00\x00\x11test-message\x00");

        let err = CopyFail::new("bad\0message").unwrap_err();
        assert_eq!(err.to_string(), "message must not contain a nul byte");
    }
}
