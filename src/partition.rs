//! Byte-range partitioning across a file set.
//!
//! Workers never talk to each other; each one computes its own byte range
//! from the same immutable file metadata with the same arithmetic, and the
//! ranges tile the total byte count exactly. Boundary recovery (see
//! [`boundary`](crate::boundary)) then turns a byte range into a record
//! range without any coordination either.

use std::ops::Range;

use log::debug;

use crate::error::{Error, Result};
use crate::fs::{FileEntry, FileSystem};

/// The nominal byte range of `rank` out of `workers` over `total` bytes:
/// `[total·rank/workers, total·(rank+1)/workers)`, floor division.
///
/// Ranges for all ranks tile `[0, total)` with no gaps or overlaps; the
/// last rank always ends at `total`. A range may be empty when there are
/// more workers than bytes.
///
/// Callers validate `rank < workers`; see [`FileSet::nominal_range`].
pub fn nominal_range(total: u64, rank: u32, workers: u32) -> Range<u64> {
    debug_assert!(workers > 0 && rank < workers);
    let at = |k: u64| ((total as u128 * k as u128) / workers as u128) as u64;
    at(rank as u64)..at(rank as u64 + 1)
}

/// An ordered file set with precomputed cumulative offsets, mapping between
/// the concatenated byte space and per-file positions.
#[derive(Debug, Clone)]
pub struct FileSet {
    entries: Vec<FileEntry>,
    /// `cum[i]` is the concatenated offset of entry `i`'s first byte;
    /// `cum[len]` is the total.
    cum: Vec<u64>,
}

impl FileSet {
    pub fn new(entries: Vec<FileEntry>) -> Self {
        let mut cum = Vec::with_capacity(entries.len() + 1);
        let mut total = 0u64;
        cum.push(0);
        for e in &entries {
            total += e.size;
            cum.push(total);
        }
        Self { entries, cum }
    }

    /// Enumerate `locator` through `fs` and build the set.
    pub fn from_locator(fs: &dyn FileSystem, locator: &str, recursive: bool) -> Result<Self> {
        let entries = fs.list_entries(locator, recursive)?;
        debug!("file set {locator:?}: {} files", entries.len());
        Ok(Self::new(entries))
    }

    #[inline]
    pub fn entries(&self) -> &[FileEntry] {
        &self.entries
    }

    #[inline]
    pub fn total_bytes(&self) -> u64 {
        *self.cum.last().unwrap_or(&0)
    }

    /// Map a concatenated offset to `(file index, offset within file)`.
    ///
    /// Offsets on a seam resolve into the later file, skipping any
    /// zero-sized entries. `abs` must be less than [`Self::total_bytes`].
    pub fn locate(&self, abs: u64) -> (usize, u64) {
        debug_assert!(abs < self.total_bytes());
        let idx = self.cum.partition_point(|&c| c <= abs) - 1;
        (idx, abs - self.cum[idx])
    }

    /// This worker's nominal byte range, validating the worker geometry.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] when `workers` is zero or `rank >= workers`.
    pub fn nominal_range(&self, rank: u32, workers: u32) -> Result<Range<u64>> {
        if workers == 0 {
            return Err(Error::Config("worker count must be at least 1".into()));
        }
        if rank >= workers {
            return Err(Error::Config(format!(
                "rank {rank} out of range for {workers} workers"
            )));
        }
        let range = nominal_range(self.total_bytes(), rank, workers);
        debug!(
            "rank {rank}/{workers}: nominal range [{}, {}) of {} total",
            range.start,
            range.end,
            self.total_bytes()
        );
        Ok(range)
    }
}
