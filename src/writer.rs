//! Record writing.
//!
//! [`RecordWriter`] frames payloads onto any `Write` sink using the wire
//! format in [`frame`](crate::frame). Because every frame's padded size is
//! a multiple of the alignment and the first frame starts at offset 0, a
//! file produced here always satisfies the invariants partitioned reading
//! depends on — there is no way to write a misaligned frame.
//!
//! # Example
//!
//! ```no_run
//! use std::fs::File;
//! use recio::RecordWriter;
//!
//! # fn main() -> recio::Result<()> {
//! let file = File::create("out.rec")?;
//! let mut writer = RecordWriter::new(file);
//! writer.append(b"first record")?;
//! writer.append(b"second record")?;
//! writer.into_inner()?;
//! # Ok(())
//! # }
//! ```

use std::io::Write;

use crate::config::DEFAULT_MAX_RECORD_SIZE;
use crate::error::{Error, Result};
use crate::frame;

/// Frames payloads onto a byte sink.
pub struct RecordWriter<W: Write> {
    inner: W,
    max_record_size: u32,
    records: u64,
    bytes: u64,
}

impl<W: Write> RecordWriter<W> {
    /// Wrap a sink, enforcing the default record size bound.
    pub fn new(inner: W) -> Self {
        Self::with_max_record_size(inner, DEFAULT_MAX_RECORD_SIZE)
    }

    /// Wrap a sink with an explicit record size bound. Readers of the
    /// resulting file must use a bound at least this large.
    pub fn with_max_record_size(inner: W, max_record_size: u32) -> Self {
        Self { inner, max_record_size, records: 0, bytes: 0 }
    }

    /// Append one record.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] if the payload exceeds the record size bound —
    /// checked before anything is written, so the sink is never left with
    /// a partial frame for an oversized payload. [`Error::Io`] on sink
    /// failure.
    pub fn append(&mut self, payload: &[u8]) -> Result<()> {
        if payload.len() as u64 > self.max_record_size as u64 {
            return Err(Error::Config(format!(
                "record payload of {} bytes exceeds max_record_size {}",
                payload.len(),
                self.max_record_size
            )));
        }
        self.bytes += frame::write_frame(&mut self.inner, payload)?;
        self.records += 1;
        Ok(())
    }

    /// Records appended so far.
    pub fn records_written(&self) -> u64 {
        self.records
    }

    /// Total frame bytes emitted so far; also the offset of the next
    /// frame, always a multiple of the frame alignment.
    pub fn bytes_written(&self) -> u64 {
        self.bytes
    }

    /// Flush the sink.
    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }

    /// Flush and return the sink.
    pub fn into_inner(mut self) -> Result<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}
