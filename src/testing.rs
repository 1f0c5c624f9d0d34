//! Test helpers for record file sets.
//!
//! This module provides utilities for building record files on disk and in
//! memory, and for asserting partition behavior, without hand-assembling
//! frame bytes in every test.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::{NamedTempFile, TempDir};

use crate::config::SplitConfig;
use crate::error::Result;
use crate::fs::{FileSystem, MemoryFs};
use crate::reader::SplitReader;
use crate::writer::RecordWriter;

/// Encode payloads into one in-memory record file.
pub fn encode_records(payloads: &[&[u8]]) -> Vec<u8> {
    let mut w = RecordWriter::new(Vec::new());
    for p in payloads {
        w.append(p).expect("payload within default bound");
    }
    w.into_inner().expect("Vec sink cannot fail")
}

/// A temporary record file that is deleted when dropped.
pub struct TempRecordFile {
    #[allow(dead_code)]
    temp_file: NamedTempFile,
    path: PathBuf,
}

impl TempRecordFile {
    /// Get the path to the file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Create a temporary record file with the given payloads.
///
/// # Errors
///
/// Returns an error if the temporary file cannot be created or written.
pub fn mock_record_file(payloads: &[&[u8]]) -> Result<TempRecordFile> {
    let temp_file = NamedTempFile::new().map_err(crate::Error::Io)?;
    let mut w = RecordWriter::new(temp_file.as_file());
    for p in payloads {
        w.append(p)?;
    }
    w.flush()?;
    let path = temp_file.path().to_path_buf();
    Ok(TempRecordFile { temp_file, path })
}

/// A temporary directory of record files, deleted when dropped.
pub struct TempRecordDir {
    #[allow(dead_code)]
    temp_dir: TempDir,
    path: PathBuf,
}

impl TempRecordDir {
    /// Get the path to the directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Create a temporary directory holding one record file per payload group,
/// named `part-00000.rec`, `part-00001.rec`, … so enumeration order
/// matches the group order.
///
/// # Errors
///
/// Returns an error if the directory or any file cannot be created.
pub fn mock_record_dir(files: &[&[&[u8]]]) -> Result<TempRecordDir> {
    let temp_dir = TempDir::new().map_err(crate::Error::Io)?;
    for (i, payloads) in files.iter().enumerate() {
        let path = temp_dir.path().join(format!("part-{i:05}.rec"));
        let mut w = RecordWriter::new(std::fs::File::create(&path)?);
        for p in *payloads {
            w.append(p)?;
        }
        w.into_inner()?;
    }
    let path = temp_dir.path().to_path_buf();
    Ok(TempRecordDir { temp_dir, path })
}

/// Build an in-memory file system from `(path, payload group)` pairs.
pub fn memory_file_set(files: &[(&str, &[&[u8]])]) -> Arc<dyn FileSystem> {
    let mut fs = MemoryFs::new();
    for (path, payloads) in files {
        fs.insert(*path, encode_records(payloads));
    }
    Arc::new(fs)
}

/// Read one rank's partition to completion.
///
/// # Errors
///
/// Propagates any configuration, I/O, or corruption error from the read.
pub fn read_rank(
    fs: &Arc<dyn FileSystem>,
    locator: &str,
    rank: u32,
    workers: u32,
    config: &SplitConfig,
) -> Result<Vec<Vec<u8>>> {
    SplitReader::open(Arc::clone(fs), locator, rank, workers, config.clone())?.read_all()
}

/// Read every rank's partition.
///
/// # Errors
///
/// Propagates the first failing rank's error.
pub fn read_all_ranks(
    fs: &Arc<dyn FileSystem>,
    locator: &str,
    workers: u32,
    config: &SplitConfig,
) -> Result<Vec<Vec<Vec<u8>>>> {
    (0..workers).map(|rank| read_rank(fs, locator, rank, workers, config)).collect()
}

/// Assert that the per-rank record sets partition `expected` exactly: each
/// record delivered once, in file order, with no overlap between ranks.
///
/// # Panics
///
/// Panics if the assertion fails.
pub fn assert_exactly_once(per_rank: &[Vec<Vec<u8>>], expected: &[&[u8]]) {
    let flattened: Vec<&[u8]> = per_rank.iter().flatten().map(Vec::as_slice).collect();
    assert_eq!(
        flattened.len(),
        expected.len(),
        "record count mismatch:\n  Expected: {} records\n  Actual: {} records",
        expected.len(),
        flattened.len()
    );
    for (i, (a, e)) in flattened.iter().zip(expected.iter()).enumerate() {
        assert_eq!(a, e, "record mismatch at index {i}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_record_file_round_trips() {
        let f = mock_record_file(&[b"a", b"bb"]).unwrap();
        let fs: Arc<dyn FileSystem> = Arc::new(crate::LocalFs);
        let got = read_rank(
            &fs,
            f.path().to_str().unwrap(),
            0,
            1,
            &SplitConfig::default(),
        )
        .unwrap();
        assert_eq!(got, vec![b"a".to_vec(), b"bb".to_vec()]);
    }

    #[test]
    fn mock_record_dir_names_sort_in_group_order() {
        let d = mock_record_dir(&[&[b"x" as &[u8]], &[b"y"]]).unwrap();
        let entries = crate::LocalFs
            .list_entries(d.path().to_str().unwrap(), false)
            .unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries[0].path.ends_with("part-00000.rec"));
        assert!(entries[1].path.ends_with("part-00001.rec"));
    }
}
