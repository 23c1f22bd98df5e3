//! Encoded frontend output, either materialized or produced lazily.
//!
//! Most messages are encoded straight into a byte buffer. COPY data can be
//! arbitrarily large and is produced chunk by chunk from an upstream source
//! instead, so the transport can write each chunk as it arrives.

use crate::error::{Error, Result};
use crate::protocol::codec::ensure_frame_len;
use crate::protocol::frontend::copy::{write_copy_data, write_copy_done, write_copy_fail};

/// A producer of byte chunks.
pub trait ChunkSource: Iterator<Item = Result<Vec<u8>>> {}

impl<T: Iterator<Item = Result<Vec<u8>>>> ChunkSource for T {}

/// Bytes of one or more encoded frontend messages.
#[derive(Debug)]
pub enum Encoded {
    /// Fully materialized bytes.
    Ready(Vec<u8>),
    /// Bytes produced on demand, in order.
    Deferred(DeferredEncoding),
}

impl Encoded {
    /// Check if the bytes are produced lazily.
    pub fn is_deferred(&self) -> bool {
        matches!(self, Encoded::Deferred(_))
    }

    /// Collect every chunk into one buffer.
    pub fn drain(self) -> Result<Vec<u8>> {
        match self {
            Encoded::Ready(bytes) => Ok(bytes),
            Encoded::Deferred(deferred) => deferred.drain(),
        }
    }
}

impl Iterator for Encoded {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Encoded::Ready(bytes) if bytes.is_empty() => None,
            Encoded::Ready(bytes) => Some(Ok(std::mem::take(bytes))),
            Encoded::Deferred(deferred) => deferred.next(),
        }
    }
}

/// Lazily produced encoding.
///
/// Consumed once, by value or by iteration. Dropping it early drops the
/// upstream source.
pub struct DeferredEncoding {
    source: Box<dyn ChunkSource>,
}

impl DeferredEncoding {
    /// Wrap a chunk source.
    pub fn new(source: impl ChunkSource + 'static) -> Self {
        Self {
            source: Box::new(source),
        }
    }

    /// Produce a single chunk with `f` when first polled.
    pub fn once(f: impl FnOnce() -> Result<Vec<u8>> + 'static) -> Self {
        Self::new(std::iter::once_with(f))
    }

    /// Collect every chunk into one buffer.
    pub fn drain(self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        for chunk in self {
            out.extend_from_slice(&chunk?);
        }
        Ok(out)
    }
}

impl std::fmt::Debug for DeferredEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeferredEncoding").finish_non_exhaustive()
    }
}

impl Iterator for DeferredEncoding {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.source.next()
    }
}

/// COPY FROM STDIN stream over an upstream chunk source.
///
/// Each non-empty upstream chunk becomes one CopyData frame. When the source
/// is exhausted a CopyDone frame follows; when it fails a CopyFail frame
/// carrying the error text is emitted instead and the stream ends. A chunk
/// too large for a single frame ends the stream with [`Error::Encode`].
#[derive(Debug)]
pub struct CopyInStream<S> {
    source: Option<S>,
}

impl<S: ChunkSource> CopyInStream<S> {
    /// Wrap an upstream source.
    pub fn new(source: S) -> Self {
        Self {
            source: Some(source),
        }
    }

    /// Check if the terminating frame has been produced.
    pub fn is_finished(&self) -> bool {
        self.source.is_none()
    }

    fn fail(&mut self, reason: &str) -> Result<Vec<u8>> {
        self.source = None;
        tracing::debug!("COPY source failed: {}", reason);
        let mut buf = Vec::new();
        write_copy_fail(&mut buf, &reason.replace('\0', ""))?;
        Ok(buf)
    }

    fn data(&mut self, chunk: &[u8]) -> Result<Vec<u8>> {
        if ensure_frame_len("data", chunk.len()).is_err() {
            self.source = None;
            return Err(Error::Encode(format!(
                "CopyData chunk of {} bytes does not fit in one frame",
                chunk.len()
            )));
        }
        let mut buf = Vec::with_capacity(chunk.len() + 5);
        write_copy_data(&mut buf, chunk)?;
        Ok(buf)
    }
}

impl<S: ChunkSource + 'static> CopyInStream<S> {
    /// Turn the stream into a deferred encoding.
    pub fn into_encoded(self) -> Encoded {
        Encoded::Deferred(DeferredEncoding::new(self))
    }
}

impl<S: ChunkSource> Iterator for CopyInStream<S> {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        let source = self.source.as_mut()?;
        loop {
            match source.next() {
                Some(Ok(chunk)) if chunk.is_empty() => {}
                Some(Ok(chunk)) => return Some(self.data(&chunk)),
                Some(Err(e)) => return Some(self.fail(&e.to_string())),
                None => {
                    self.source = None;
                    let mut buf = Vec::with_capacity(5);
                    return Some(write_copy_done(&mut buf).map(|()| buf));
                }
            }
        }
    }
}
