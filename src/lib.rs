//! # recio
//!
//! **Coordination-free record I/O** for data-parallel batch workers: many
//! independent processes read disjoint portions of one or more large
//! record files such that every record is delivered to exactly one worker,
//! in file order — with no locks, no message passing, and no coordinator.
//!
//! Each worker is assigned a byte range by pure arithmetic over the file
//! sizes, so ranges almost never align with record boundaries. The crate's
//! job is recovering exact record ownership from that boundary-insensitive
//! partitioning:
//!
//! - every worker computes the same ranges from the same immutable
//!   metadata, so the ranges tile the byte space exactly;
//! - a bounded forward scan with dual magic validation finds the first
//!   true record start inside a range;
//! - a record belongs to the worker whose range its frame *starts* in, so
//!   adjacent workers independently agree on every boundary record.
//!
//! ## Key Features
//!
//! - **Exactly-once partitioning** - deterministic byte-range tiling plus
//!   record boundary recovery, no runtime coordination
//! - **Self-describing frames** - magic marker, length, alignment padding;
//!   portable across machines of differing byte order
//! - **Bounded corruption defense** - length fields are validated before
//!   any proportional allocation or read; malformed frames are errors,
//!   never silently skipped
//! - **Multi-file sets** - a worker's range spans file seams transparently
//! - **Pluggable storage** - a small [`FileSystem`] trait with local-disk
//!   and in-memory implementations
//! - **Parallel fan-out** - decode an assigned partition on a rayon pool
//!   (feature: `parallel`)
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::fs::File;
//! use std::sync::Arc;
//! use recio::{LocalFs, RecordWriter, SplitConfig, SplitReader};
//!
//! # fn main() -> recio::Result<()> {
//! // Write a record file
//! let mut writer = RecordWriter::new(File::create("data.rec")?);
//! for i in 0..1000u32 {
//!     writer.append(format!("record {i}").as_bytes())?;
//! }
//! writer.into_inner()?;
//!
//! // Read it as worker 2 of 4; workers 0, 1, and 3 run the same code
//! // elsewhere and together consume every record exactly once.
//! let fs = Arc::new(LocalFs);
//! let mut reader = SplitReader::open(fs, "data.rec", 2, 4, SplitConfig::default())?;
//! while let Some(record) = reader.next_record()? {
//!     println!("offset {}: {} bytes", record.offset(), record.len());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! A record returned by [`next_record`](SplitReader::next_record) is a
//! [`Blob`]: a borrowed view into the reader's buffer, valid until the
//! next call. Copy it out to retain it.
//!
//! ## Module Overview
//!
//! - [`reader`] - the per-worker record iterator ([`SplitReader`])
//! - [`writer`] - record framing onto any `Write` sink ([`RecordWriter`])
//! - [`partition`] - byte-range arithmetic and file-set bookkeeping
//! - [`boundary`] - record boundary recovery inside a byte range
//! - [`frame`] - the wire format and its constants
//! - [`fs`] - the storage trait seam and its implementations
//! - [`testing`] - fixture builders and partition assertions
//! - [`parallel`] - fan-out decoding of one partition (feature: `parallel`)

pub mod boundary;
pub mod chunk;
pub mod config;
pub mod endian;
pub mod error;
pub mod frame;
pub mod fs;
pub mod partition;
pub mod reader;
pub mod testing;
pub mod writer;

// General re-exports
pub use config::{SplitConfig, DEFAULT_BUFFER_SIZE, DEFAULT_MAX_RECORD_SIZE};
pub use error::{CorruptKind, Error, Result};
pub use fs::{FileEntry, FileSystem, LocalFs, MemoryFs};
pub use partition::{nominal_range, FileSet};
pub use reader::{Blob, PartitionCursor, SplitReader};
pub use writer::RecordWriter;

// Gated re-exports
#[cfg_attr(docsrs, doc(cfg(feature = "parallel")))]
#[cfg(feature = "parallel")]
pub mod parallel;

#[cfg(feature = "parallel")]
pub use parallel::read_partition_parallel;
