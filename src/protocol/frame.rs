//! Message framing.
//!
//! Every backend message is `[type byte][Int32 length][payload]` where the
//! length counts itself and the payload but not the type byte.

use std::io::Read;

use crate::error::{Error, Result};
use crate::protocol::backend::{self, BackendMessage};
use crate::protocol::codec::read_i32;

/// Size of the tag + length header.
pub const HEADER_LEN: usize = 5;

/// Default upper bound on a single backend message (1 GiB, the server's own limit).
pub const DEFAULT_MAX_MESSAGE_LEN: usize = 0x4000_0000;

/// Owned backend frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Message type byte
    pub tag: u8,
    /// Message payload (after length field)
    pub payload: Vec<u8>,
}

impl Frame {
    /// Borrow this frame.
    pub fn as_frame_ref(&self) -> FrameRef<'_> {
        FrameRef {
            tag: self.tag,
            payload: &self.payload,
        }
    }

    /// Decode the payload into a typed message.
    pub fn decode(&self) -> Result<BackendMessage> {
        backend::decode(self.tag, &self.payload)
    }
}

/// Frame borrowed from an input buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRef<'a> {
    /// Message type byte
    pub tag: u8,
    /// Message payload (after length field)
    pub payload: &'a [u8],
}

impl FrameRef<'_> {
    /// Copy into an owned frame.
    pub fn to_frame(&self) -> Frame {
        Frame {
            tag: self.tag,
            payload: self.payload.to_vec(),
        }
    }

    /// Decode the payload into a typed message.
    pub fn decode(&self) -> Result<BackendMessage> {
        backend::decode(self.tag, self.payload)
    }
}

/// Validate a length field and return the payload length.
fn payload_len(len: i32, max_message_len: usize) -> Result<usize> {
    if len < 4 {
        return Err(Error::Protocol(format!(
            "invalid message length: {} < 4",
            len
        )));
    }
    let len = len as usize;
    if len > max_message_len {
        return Err(Error::Protocol(format!(
            "message length {} exceeds limit {}",
            len, max_message_len
        )));
    }
    Ok(len - 4)
}

/// Peek one tagged frame at the start of `buf`.
///
/// Returns `Ok(None)` if more bytes are needed, or the frame and the total
/// number of bytes it occupies.
pub fn split_frame(buf: &[u8], max_message_len: usize) -> Result<Option<(FrameRef<'_>, usize)>> {
    let Some((&tag, rest)) = buf.split_first() else {
        return Ok(None);
    };
    let Ok((len, rest)) = read_i32(rest) else {
        return Ok(None);
    };
    let body_len = payload_len(len, max_message_len)?;
    match rest.get(..body_len) {
        Some(payload) => Ok(Some((FrameRef { tag, payload }, HEADER_LEN + body_len))),
        None => Ok(None),
    }
}

/// Parse a complete captured frame.
///
/// The slice must hold exactly one frame: a length field that disagrees with
/// the number of bytes present is a protocol error in both directions.
pub fn parse_frame(frame: &[u8]) -> Result<FrameRef<'_>> {
    let Some((&tag, rest)) = frame.split_first() else {
        return Err(Error::Protocol("empty frame".into()));
    };
    let (len, payload) = read_i32(rest)?;
    let body_len = payload_len(len, usize::MAX)?;
    if payload.len() != body_len {
        return Err(Error::Protocol(format!(
            "frame length mismatch for '{}': declared {} payload byte(s), found {}",
            tag.escape_ascii(),
            body_len,
            payload.len()
        )));
    }
    Ok(FrameRef { tag, payload })
}

/// Incremental frame splitter over a byte stream.
///
/// The transport feeds whatever chunks it receives; complete frames are
/// returned strictly in arrival order.
#[derive(Debug)]
pub struct FrameReader {
    buffer: Vec<u8>,
    start: usize,
    max_message_len: usize,
}

impl FrameReader {
    /// Create a reader with the default message size limit.
    pub fn new() -> Self {
        Self::with_max_message_len(DEFAULT_MAX_MESSAGE_LEN)
    }

    /// Create a reader with a custom message size limit.
    pub fn with_max_message_len(max_message_len: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(8192),
            start: 0,
            max_message_len,
        }
    }

    /// Append bytes received from the transport.
    pub fn feed(&mut self, data: &[u8]) {
        if self.start > 0 {
            self.buffer.drain(..self.start);
            self.start = 0;
        }
        self.buffer.extend_from_slice(data);
    }

    /// Number of buffered bytes not yet returned as frames.
    pub fn buffered(&self) -> usize {
        self.buffer.len() - self.start
    }

    /// Take the next complete frame, if any.
    pub fn next_frame(&mut self) -> Result<Option<Frame>> {
        let pending = self.buffer.get(self.start..).unwrap_or_default();
        let Some((frame, consumed)) = split_frame(pending, self.max_message_len)? else {
            return Ok(None);
        };
        let frame = frame.to_frame();
        self.start += consumed;
        if self.start == self.buffer.len() {
            self.buffer.clear();
            self.start = 0;
        }
        tracing::trace!(
            tag = %frame.tag.escape_ascii(),
            len = frame.payload.len(),
            "frame received"
        );
        Ok(Some(frame))
    }

    /// Take and decode the next complete message, if any.
    pub fn next_message(&mut self) -> Result<Option<BackendMessage>> {
        match self.next_frame()? {
            Some(frame) => frame.decode().map(Some),
            None => Ok(None),
        }
    }
}

impl Default for FrameReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Read one complete message from a blocking reader.
///
/// `buf` is reused for the payload to avoid reallocating per message.
pub fn read_message<R: Read>(
    reader: &mut R,
    buf: &mut Vec<u8>,
    max_message_len: usize,
) -> Result<BackendMessage> {
    let mut header = [0u8; HEADER_LEN];
    reader.read_exact(&mut header)?;
    let [tag, l0, l1, l2, l3] = header;
    let body_len = payload_len(i32::from_be_bytes([l0, l1, l2, l3]), max_message_len)?;

    buf.clear();
    buf.resize(body_len, 0);
    reader.read_exact(buf)?;

    backend::decode(tag, buf)
}
