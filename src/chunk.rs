//! Buffered chunk reading over a byte stream.
//!
//! [`Chunk`] is an owned, resizable byte buffer with a read cursor; it may
//! hold several complete frames plus a trailing partial frame that is
//! carried across refills by compacting the buffer. [`ChunkReader`] drives
//! a stream into a `Chunk`, retrying short reads, and accounts for
//! *overflow*: bytes buffered past the worker's nominal end offset because
//! a record that started before that offset extends past it.
//!
//! Overflow is bounded. A well-formed straddling record plus a full
//! boundary scan can only require a fixed multiple of the maximum record
//! size; a length field demanding more than that is reported as corruption
//! rather than read.

use std::io::{ErrorKind, Read};

use log::trace;

use crate::error::{CorruptKind, Error, Result};
use crate::frame;

/// Owned byte buffer with a read cursor.
///
/// Valid data lives in `data[begin..end)`. Consuming moves `begin`;
/// refilling appends at `end`; compaction slides the unconsumed tail back
/// to the front so a partial frame survives the refill.
#[derive(Debug, Default)]
pub struct Chunk {
    data: Vec<u8>,
    begin: usize,
    end: usize,
}

impl Chunk {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unconsumed bytes currently buffered.
    #[inline]
    pub fn available(&self) -> usize {
        self.end - self.begin
    }

    /// The unconsumed window.
    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.data[self.begin..self.end]
    }

    /// Slide the unconsumed tail to the front of the buffer.
    fn compact(&mut self) {
        if self.begin == 0 {
            return;
        }
        self.data.copy_within(self.begin..self.end, 0);
        self.end -= self.begin;
        self.begin = 0;
    }

    /// Append up to `want` bytes from `stream`, retrying short reads until
    /// `want` bytes arrive or the stream is exhausted. Returns the bytes
    /// actually added.
    fn fill<R: Read>(&mut self, stream: &mut R, want: usize) -> std::io::Result<usize> {
        let target = self.end + want;
        if self.data.len() < target {
            self.data.resize(target, 0);
        }
        let mut added = 0;
        while added < want {
            match stream.read(&mut self.data[self.end..target]) {
                Ok(0) => break,
                Ok(n) => {
                    self.end += n;
                    added += n;
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(added)
    }
}

/// Streams bytes into a [`Chunk`] on demand, tracking the absolute read
/// position and the overflow past a nominal end offset.
pub struct ChunkReader<R> {
    stream: R,
    chunk: Chunk,
    /// Absolute offset (in the concatenated file set) of the first
    /// unconsumed byte.
    abs: u64,
    /// The owning worker's nominal end offset.
    nominal_end: u64,
    /// Read granularity when buffering ahead inside the nominal range.
    buffer_size: usize,
    /// Most overflow tolerated before declaring the stream corrupt.
    overflow_limit: u64,
    /// High-water mark of bytes buffered past `nominal_end`.
    overflow: u64,
}

impl<R: Read> ChunkReader<R> {
    pub fn new(stream: R, abs: u64, nominal_end: u64, buffer_size: usize, max_record_size: u32) -> Self {
        Self {
            stream,
            chunk: Chunk::new(),
            abs,
            nominal_end,
            buffer_size: buffer_size.max(frame::HEADER_SIZE),
            overflow_limit: overflow_limit(max_record_size),
            overflow: 0,
        }
    }

    /// Absolute offset of the next unconsumed byte.
    #[inline]
    pub fn abs_offset(&self) -> u64 {
        self.abs
    }

    /// High-water mark of bytes buffered past the nominal end.
    #[inline]
    pub fn overflow(&self) -> u64 {
        self.overflow
    }

    /// The unconsumed window, starting at [`Self::abs_offset`].
    #[inline]
    pub fn bytes(&self) -> &[u8] {
        self.chunk.bytes()
    }

    /// Make at least `need` bytes available, reading more if the stream
    /// allows. Returns the bytes actually available, which is less than
    /// `need` only when the stream is exhausted.
    ///
    /// Buffering ahead is greedy up to `buffer_size` but clamped at the
    /// nominal end: past it, only the bytes actually demanded are read, so
    /// the overflow count reflects genuine record-completion reads.
    pub fn ensure(&mut self, need: usize) -> Result<usize> {
        let avail = self.chunk.available();
        if avail >= need {
            return Ok(avail);
        }
        let to_end = usize::try_from(self.nominal_end.saturating_sub(self.abs)).unwrap_or(usize::MAX);
        let target = need.max(self.buffer_size.min(to_end));
        let past_end = (self.abs + target as u64).saturating_sub(self.nominal_end);
        if past_end > self.overflow_limit {
            return Err(Error::corrupt(CorruptKind::BadLength, self.abs));
        }
        self.chunk.compact();
        let added = self.chunk.fill(&mut self.stream, target - avail)?;
        trace!("chunk refill: +{added}B at offset {}", self.abs);
        let buffered_end = self.abs + self.chunk.available() as u64;
        self.overflow = self.overflow.max(buffered_end.saturating_sub(self.nominal_end));
        Ok(self.chunk.available())
    }

    /// Discard `n` buffered bytes. `n` must not exceed [`Chunk::available`].
    pub fn advance(&mut self, n: usize) {
        debug_assert!(n <= self.chunk.available());
        self.chunk.begin += n;
        self.abs += n as u64;
    }

    /// Consume one whole frame of `frame_len` bytes and return its payload,
    /// `payload_len` bytes starting `payload_offset` into the frame.
    ///
    /// The returned slice stays valid until the next `ensure` call, which
    /// may compact the buffer over it.
    pub fn consume_frame(&mut self, frame_len: usize, payload_offset: usize, payload_len: usize) -> &[u8] {
        debug_assert!(frame_len <= self.chunk.available());
        debug_assert!(payload_offset + payload_len <= frame_len);
        let start = self.chunk.begin + payload_offset;
        self.chunk.begin += frame_len;
        self.abs += frame_len as u64;
        &self.chunk.data[start..start + payload_len]
    }
}

/// Bound on bytes buffered past the nominal end: one straddling maximal
/// frame plus one full boundary-scan window.
fn overflow_limit(max_record_size: u32) -> u64 {
    frame::scan_window(max_record_size) + frame::frame_size(max_record_size)
}
