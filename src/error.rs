//! Error types for record I/O partitioning.
//!
//! Three failure categories with different blame and recovery semantics:
//!
//! - [`Error::Config`] — the caller asked for something impossible (e.g. a
//!   rank outside the worker count). Rejected before any I/O happens.
//! - [`Error::Io`] — the file system or stream failed. Never retried here;
//!   retry policy belongs to the caller.
//! - [`Error::Corrupt`] — the bytes on disk do not form valid record frames.
//!   Fatal for the affected worker: skipping a malformed frame would break
//!   the exactly-once delivery guarantee, so the reader never resynchronizes
//!   past corruption.
//!
//! A reader may yield any number of well-formed records before the call that
//! discovers corruption; there is no partial-success return from a single
//! call.

use std::fmt;
use thiserror::Error;

/// The way in which on-disk bytes failed to form a valid record frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorruptKind {
    /// The expected magic marker was not found where a frame must start.
    BadMagic,
    /// A length field exceeds the configured maximum record size, or would
    /// require buffering unboundedly far past the partition end.
    BadLength,
    /// The data ends mid-frame: a header's declared length runs past the
    /// genuine end of the file set, or the bytes simply stop short.
    TruncatedFile,
}

impl fmt::Display for CorruptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CorruptKind::BadMagic => "bad magic marker",
            CorruptKind::BadLength => "bad record length",
            CorruptKind::TruncatedFile => "truncated file",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt record stream: {kind} at byte offset {offset}")]
    Corrupt { kind: CorruptKind, offset: u64 },
}

impl Error {
    pub(crate) fn corrupt(kind: CorruptKind, offset: u64) -> Self {
        Error::Corrupt { kind, offset }
    }

    /// The corruption kind, if this is a [`Error::Corrupt`].
    pub fn corrupt_kind(&self) -> Option<CorruptKind> {
        match self {
            Error::Corrupt { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Unwrap into an `io::Error`, preserving the original where possible.
    ///
    /// Used at `std::io::Read` seams where only `io::Error` can cross.
    pub(crate) fn into_io(self) -> std::io::Error {
        match self {
            Error::Io(e) => e,
            other => std::io::Error::other(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corrupt_kind_accessor() {
        let e = Error::corrupt(CorruptKind::BadMagic, 42);
        assert_eq!(e.corrupt_kind(), Some(CorruptKind::BadMagic));
        assert_eq!(Error::Config("x".into()).corrupt_kind(), None);
    }

    #[test]
    fn display_includes_offset() {
        let e = Error::corrupt(CorruptKind::TruncatedFile, 1024);
        let s = e.to_string();
        assert!(s.contains("truncated file"));
        assert!(s.contains("1024"));
    }
}
