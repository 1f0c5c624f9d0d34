//! Partitioned record reading.
//!
//! [`SplitReader`] is one worker's view of a record file set: it computes
//! the worker's nominal byte range, recovers the true record boundaries,
//! and then yields every record whose frame starts inside the range, in
//! file order. Run one reader per `(rank, workers)` pair over the same
//! locator and every record in the set is delivered to exactly one worker,
//! with no communication between them.
//!
//! # Ownership rule
//!
//! A record belongs to the worker whose nominal range its frame start
//! falls in, half-open: a frame starting *strictly before* the range end
//! is owned even when it extends past the end (the reader finishes it with
//! an overflow read); a frame starting exactly at the range end belongs to
//! the next worker. Adjacent workers apply the same rule to the same
//! metadata, so the record sets they resolve are disjoint and their union
//! is the whole file set.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use recio::{LocalFs, SplitConfig, SplitReader};
//!
//! # fn main() -> recio::Result<()> {
//! let fs = Arc::new(LocalFs);
//! let mut reader = SplitReader::open(fs, "data/part-*.rec", 0, 4, SplitConfig::default())?;
//! while let Some(record) = reader.next_record()? {
//!     println!("{} bytes at offset {}", record.len(), record.offset());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! A returned [`Blob`] borrows the reader's buffer and is invalidated by
//! the next `next_record` call; copy the payload out to retain it.

use std::ops::{Deref, Range};
use std::sync::Arc;

use log::debug;

use crate::boundary::seek_record_begin;
use crate::chunk::ChunkReader;
use crate::config::SplitConfig;
use crate::error::{CorruptKind, Error, Result};
use crate::frame::{self, HEADER_SIZE};
use crate::fs::{FileSetStream, FileSystem};
use crate::partition::FileSet;

/// A borrowed view of one record's payload.
///
/// Valid until the next [`SplitReader::next_record`] call; dereferences to
/// the payload bytes.
#[derive(Debug)]
pub struct Blob<'a> {
    offset: u64,
    data: &'a [u8],
}

impl Blob<'_> {
    /// Absolute offset of this record's frame in the concatenated file set.
    #[inline]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// The payload bytes.
    #[inline]
    pub fn payload(&self) -> &[u8] {
        self.data
    }
}

impl Deref for Blob<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.data
    }
}

impl AsRef<[u8]> for Blob<'_> {
    fn as_ref(&self) -> &[u8] {
        self.data
    }
}

/// Read position within a partition, for observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionCursor {
    /// Index of the file the next unconsumed byte falls in; equal to the
    /// file count once the set is exhausted.
    pub file_index: usize,
    /// Absolute offset of the next unconsumed byte.
    pub offset: u64,
    /// High-water mark of bytes read past the nominal end: finishing a
    /// record that started before it, plus the peek that validates the
    /// handoff frame's header.
    pub overflow: u64,
}

enum State {
    Seeking,
    Streaming,
    Done,
}

/// One worker's sequential record iterator over a partitioned file set.
pub struct SplitReader {
    file_set: FileSet,
    range: Range<u64>,
    total: u64,
    config: SplitConfig,
    state: State,
    rd: Option<ChunkReader<FileSetStream>>,
    /// The range start coincides with a file start, which is always a
    /// frame start; no scan needed.
    start_is_exact: bool,
    resolved_start: Option<u64>,
    records: u64,
    overflow: u64,
}

impl std::fmt::Debug for SplitReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SplitReader")
            .field("file_set", &self.file_set)
            .field("range", &self.range)
            .field("total", &self.total)
            .field("config", &self.config)
            .field("start_is_exact", &self.start_is_exact)
            .field("resolved_start", &self.resolved_start)
            .field("records", &self.records)
            .field("overflow", &self.overflow)
            .finish_non_exhaustive()
    }
}

impl SplitReader {
    /// Open the partition of `rank` out of `workers` over the file set
    /// named by `locator`.
    ///
    /// Configuration and worker geometry are validated, the file set is
    /// enumerated, and the stream is opened at the nominal start — but no
    /// record bytes are inspected until the first [`next_record`] call, so
    /// corruption always surfaces through the iteration API.
    ///
    /// [`next_record`]: SplitReader::next_record
    ///
    /// # Errors
    ///
    /// [`Error::Config`] for an impossible configuration or geometry;
    /// [`Error::Io`] if enumeration or the initial open fails.
    pub fn open(
        fs: Arc<dyn FileSystem>,
        locator: &str,
        rank: u32,
        workers: u32,
        config: SplitConfig,
    ) -> Result<Self> {
        config.validate()?;
        let file_set = FileSet::from_locator(fs.as_ref(), locator, config.recursive)?;
        let range = file_set.nominal_range(rank, workers)?;
        Self::over_range(fs, file_set, range, config)
    }

    /// Open a reader over an explicit byte range of an already-enumerated
    /// file set.
    ///
    /// The same boundary rules apply as for [`open`](SplitReader::open);
    /// any tiling of `[0, total)` into such ranges delivers every record
    /// exactly once.
    pub fn over_range(
        fs: Arc<dyn FileSystem>,
        file_set: FileSet,
        range: Range<u64>,
        config: SplitConfig,
    ) -> Result<Self> {
        config.validate()?;
        let total = file_set.total_bytes();
        if range.start > range.end || range.end > total {
            return Err(Error::Config(format!(
                "byte range [{}, {}) does not fit in {total} total bytes",
                range.start, range.end
            )));
        }

        let mut reader = Self {
            file_set,
            range: range.clone(),
            total,
            config,
            state: State::Seeking,
            rd: None,
            start_is_exact: false,
            resolved_start: None,
            records: 0,
            overflow: 0,
        };
        if range.is_empty() {
            reader.state = State::Done;
            return Ok(reader);
        }

        let (file_index, within) = reader.file_set.locate(range.start);
        let paths = reader.file_set.entries().iter().map(|e| e.path.clone()).collect();
        let stream = FileSetStream::open(fs, paths, file_index, within)?;
        reader.rd = Some(ChunkReader::new(
            stream,
            range.start,
            range.end,
            reader.config.buffer_size,
            reader.config.max_record_size,
        ));
        reader.start_is_exact = within == 0;
        Ok(reader)
    }

    /// Yield the next owned record, or `None` once the partition is
    /// exhausted.
    ///
    /// Exhaustion is terminal and idempotent: every later call returns
    /// `None`. Corruption is fatal: after an error, the reader behaves as
    /// exhausted.
    ///
    /// # Errors
    ///
    /// [`Error::Corrupt`] when the bytes at the read position do not form
    /// a valid frame; [`Error::Io`] on stream failure.
    pub fn next_record(&mut self) -> Result<Option<Blob<'_>>> {
        let (pos, frame_len, payload_len) = match self.prepare_next() {
            Ok(Some(t)) => t,
            Ok(None) => return Ok(None),
            Err(e) => return Err(e),
        };
        self.records += 1;
        let Some(rd) = self.rd.as_mut() else {
            return Ok(None);
        };
        let payload = rd.consume_frame(frame_len, HEADER_SIZE, payload_len);
        Ok(Some(Blob { offset: pos, data: payload }))
    }

    /// Collect every remaining record's payload.
    pub fn read_all(&mut self) -> Result<Vec<Vec<u8>>> {
        let mut out = Vec::new();
        while let Some(record) = self.next_record()? {
            out.push(record.to_vec());
        }
        Ok(out)
    }

    /// The nominal byte range this reader was assigned.
    pub fn nominal_range(&self) -> Range<u64> {
        self.range.clone()
    }

    /// The record-aligned start offset, once boundary resolution has run.
    pub fn resolved_start(&self) -> Option<u64> {
        self.resolved_start
    }

    /// Records yielded so far.
    pub fn records_read(&self) -> u64 {
        self.records
    }

    /// Current read position.
    pub fn cursor(&self) -> PartitionCursor {
        let offset = self.rd.as_ref().map_or(self.range.end, ChunkReader::abs_offset);
        let overflow = self.rd.as_ref().map_or(self.overflow, ChunkReader::overflow);
        let file_index = if offset >= self.total {
            self.file_set.entries().len()
        } else {
            self.file_set.locate(offset).0
        };
        PartitionCursor { file_index, offset, overflow }
    }

    /// Tear down the stream and make exhaustion permanent.
    fn retire(&mut self) {
        if let Some(rd) = self.rd.take() {
            self.overflow = rd.overflow();
        }
        self.state = State::Done;
    }

    fn prepare_next(&mut self) -> Result<Option<(u64, usize, usize)>> {
        let prepared = self.try_prepare();
        if prepared.is_err() {
            self.retire();
        }
        prepared
    }

    /// Advance the state machine until a frame is ready to consume or the
    /// partition is known to be exhausted. Returns the frame's absolute
    /// offset, its on-wire size, and its payload length.
    fn try_prepare(&mut self) -> Result<Option<(u64, usize, usize)>> {
        if matches!(self.state, State::Seeking) {
            let resolved = if self.start_is_exact {
                self.range.start
            } else {
                let (start, total, max) = (self.range.start, self.total, self.config.max_record_size);
                match self.rd.as_mut() {
                    Some(rd) => seek_record_begin(rd, start, total, max)?,
                    None => self.range.end,
                }
            };
            if resolved >= self.range.end {
                debug!(
                    "no records start in [{}, {}); empty partition",
                    self.range.start, self.range.end
                );
                self.retire();
                return Ok(None);
            }
            self.resolved_start = Some(resolved);
            self.state = State::Streaming;
        }

        if matches!(self.state, State::Done) {
            return Ok(None);
        }

        let Some(rd) = self.rd.as_mut() else {
            self.state = State::Done;
            return Ok(None);
        };
        let pos = rd.abs_offset();
        if pos >= self.range.end {
            // the frame starting here belongs to the next worker, but its
            // header is still validated before retiring: that worker's
            // boundary scan cannot tell a corrupt frame start from
            // mid-record bytes, so the handoff offset must be checked by
            // the worker that streamed up to it
            if pos < self.total {
                let avail = rd.ensure(HEADER_SIZE)?;
                if avail < HEADER_SIZE {
                    return Err(Error::corrupt(CorruptKind::TruncatedFile, pos + avail as u64));
                }
                let len = frame::decode_header(rd.bytes(), pos, self.config.max_record_size)?;
                if pos + frame::frame_size(len) > self.total {
                    return Err(Error::corrupt(CorruptKind::TruncatedFile, pos));
                }
            }
            self.retire();
            return Ok(None);
        }

        let avail = rd.ensure(HEADER_SIZE)?;
        if avail < HEADER_SIZE {
            return Err(Error::corrupt(CorruptKind::TruncatedFile, pos + avail as u64));
        }
        let payload_len = frame::decode_header(rd.bytes(), pos, self.config.max_record_size)?;
        let frame_len = frame::frame_size(payload_len);
        if pos + frame_len > self.total {
            return Err(Error::corrupt(CorruptKind::TruncatedFile, pos));
        }
        let frame_len = frame_len as usize;
        let got = rd.ensure(frame_len)?;
        if got < frame_len {
            return Err(Error::corrupt(CorruptKind::TruncatedFile, pos + got as u64));
        }
        Ok(Some((pos, frame_len, payload_len as usize)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryFs;
    use crate::writer::RecordWriter;

    fn record_file(payloads: &[&[u8]]) -> Vec<u8> {
        let mut w = RecordWriter::new(Vec::new());
        for p in payloads {
            w.append(p).unwrap();
        }
        w.into_inner().unwrap()
    }

    fn fs_with(files: &[(&str, Vec<u8>)]) -> Arc<dyn FileSystem> {
        let mut fs = MemoryFs::new();
        for (path, bytes) in files {
            fs.insert(*path, bytes.clone());
        }
        Arc::new(fs)
    }

    #[test]
    fn single_worker_reads_everything_in_order() {
        let fs = fs_with(&[("f.rec", record_file(&[b"one", b"two", b"three"]))]);
        let mut r = SplitReader::open(fs, "f.rec", 0, 1, SplitConfig::default()).unwrap();
        assert_eq!(r.resolved_start(), None);
        let all = r.read_all().unwrap();
        assert_eq!(all, vec![b"one".to_vec(), b"two".to_vec(), b"three".to_vec()]);
        assert_eq!(r.resolved_start(), Some(0));
        assert_eq!(r.records_read(), 3);
    }

    #[test]
    fn blob_reports_frame_offset() {
        let fs = fs_with(&[("f.rec", record_file(&[b"abcd", b"efgh"]))]);
        let mut r = SplitReader::open(fs, "f.rec", 0, 1, SplitConfig::default()).unwrap();
        let first = r.next_record().unwrap().unwrap();
        assert_eq!(first.offset(), 0);
        assert_eq!(&*first, b"abcd");
        let second = r.next_record().unwrap().unwrap();
        assert_eq!(second.offset(), 12);
    }

    #[test]
    fn exhaustion_is_idempotent() {
        let fs = fs_with(&[("f.rec", record_file(&[b"only"]))]);
        let mut r = SplitReader::open(fs, "f.rec", 0, 1, SplitConfig::default()).unwrap();
        assert!(r.next_record().unwrap().is_some());
        for _ in 0..3 {
            assert!(r.next_record().unwrap().is_none());
        }
    }

    #[test]
    fn rank_must_be_in_range() {
        let fs = fs_with(&[("f.rec", record_file(&[b"x"]))]);
        let err = SplitReader::open(fs, "f.rec", 2, 2, SplitConfig::default()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn empty_file_set_is_a_clean_empty_partition() {
        let fs = fs_with(&[]);
        let mut r = SplitReader::open(fs, "", 0, 3, SplitConfig::default()).unwrap();
        assert!(r.next_record().unwrap().is_none());
        assert_eq!(r.cursor().offset, 0);
    }

    #[test]
    fn over_range_rejects_ranges_past_total() {
        let fs = fs_with(&[("f.rec", record_file(&[b"x"]))]);
        let set = FileSet::from_locator(fs.as_ref(), "f.rec", false).unwrap();
        let err =
            SplitReader::over_range(fs, set, 0..999, SplitConfig::default()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
