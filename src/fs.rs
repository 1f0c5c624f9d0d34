//! File-system access behind a trait seam.
//!
//! The partitioning core needs exactly two capabilities: enumerate a file
//! set with sizes, and open a file for sequential reading from an arbitrary
//! offset. [`FileSystem`] captures both; [`LocalFs`] implements them over
//! the local disk and [`MemoryFs`] over an in-memory map for tests.
//! Additional backends (object stores, distributed file systems) implement
//! the same trait outside this crate.
//!
//! Enumeration order is part of the correctness contract: every worker must
//! see the same file list in the same order, so both implementations return
//! entries sorted by path.

use std::collections::BTreeMap;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One file in a file set: its path and its size in bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub path: PathBuf,
    pub size: u64,
}

/// The file-system capabilities the partitioning core consumes.
///
/// Streams returned by [`open_at`](FileSystem::open_at) only need to
/// support forward sequential reads; a zero-byte read signals end of
/// stream.
pub trait FileSystem: Send + Sync {
    /// Enumerate the file set named by `locator`, sorted by path.
    ///
    /// An empty result is not an error; it partitions into empty ranges.
    fn list_entries(&self, locator: &str, recursive: bool) -> Result<Vec<FileEntry>>;

    /// Open `path` for reading, positioned at `offset`.
    fn open_at(&self, path: &Path, offset: u64) -> Result<Box<dyn Read + Send>>;
}

/// Local-disk implementation.
///
/// The locator may be a plain file path, a directory (listed recursively
/// when asked), or a glob pattern such as `data/part-*.rec`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFs;

impl FileSystem for LocalFs {
    fn list_entries(&self, locator: &str, recursive: bool) -> Result<Vec<FileEntry>> {
        let root = Path::new(locator);
        let pattern = if root.is_file() {
            let size = std::fs::metadata(root)?.len();
            return Ok(vec![FileEntry { path: root.to_path_buf(), size }]);
        } else if root.is_dir() {
            let sub = if recursive { "**/*" } else { "*" };
            root.join(sub).to_string_lossy().into_owned()
        } else {
            locator.to_owned()
        };

        let paths = glob::glob(&pattern)
            .map_err(|e| Error::Config(format!("invalid locator pattern {pattern:?}: {e}")))?;
        let mut entries = Vec::new();
        for entry in paths {
            let path = entry.map_err(|e| Error::Io(e.into_error()))?;
            if path.is_file() {
                let size = std::fs::metadata(&path)?.len();
                entries.push(FileEntry { path, size });
            }
        }
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }

    fn open_at(&self, path: &Path, offset: u64) -> Result<Box<dyn Read + Send>> {
        let mut file = std::fs::File::open(path)?;
        if offset > 0 {
            file.seek(SeekFrom::Start(offset))?;
        }
        Ok(Box::new(file))
    }
}

/// In-memory test double.
///
/// Files live in a sorted map, so enumeration order is deterministic. The
/// locator is treated as a path prefix; the empty locator matches
/// everything. The `recursive` flag has no meaning in a flat store and is
/// ignored.
#[derive(Debug, Default)]
pub struct MemoryFs {
    files: BTreeMap<PathBuf, Arc<Vec<u8>>>,
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a file.
    pub fn insert(&mut self, path: impl Into<PathBuf>, bytes: Vec<u8>) -> &mut Self {
        self.files.insert(path.into(), Arc::new(bytes));
        self
    }
}

impl FileSystem for MemoryFs {
    fn list_entries(&self, locator: &str, _recursive: bool) -> Result<Vec<FileEntry>> {
        let prefix = Path::new(locator);
        Ok(self
            .files
            .iter()
            .filter(|(path, _)| locator.is_empty() || path.starts_with(prefix))
            .map(|(path, bytes)| FileEntry { path: path.clone(), size: bytes.len() as u64 })
            .collect())
    }

    fn open_at(&self, path: &Path, offset: u64) -> Result<Box<dyn Read + Send>> {
        let bytes = self.files.get(path).ok_or_else(|| {
            Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no such in-memory file: {}", path.display()),
            ))
        })?;
        Ok(Box::new(MemReader {
            data: Arc::clone(bytes),
            pos: (offset as usize).min(bytes.len()),
        }))
    }
}

struct MemReader {
    data: Arc<Vec<u8>>,
    pos: usize,
}

impl Read for MemReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let remaining = &self.data[self.pos..];
        let n = remaining.len().min(buf.len());
        buf[..n].copy_from_slice(&remaining[..n]);
        self.pos += n;
        Ok(n)
    }
}

/// Sequential reader over the logical concatenation of a file set,
/// starting at a given (file, offset) position and advancing across file
/// boundaries transparently.
pub(crate) struct FileSetStream {
    fs: Arc<dyn FileSystem>,
    paths: Vec<PathBuf>,
    next_index: usize,
    current: Option<Box<dyn Read + Send>>,
}

impl FileSetStream {
    pub(crate) fn open(
        fs: Arc<dyn FileSystem>,
        paths: Vec<PathBuf>,
        start_index: usize,
        start_offset: u64,
    ) -> Result<Self> {
        let (current, next_index) = if start_index < paths.len() {
            let reader = fs.open_at(&paths[start_index], start_offset)?;
            (Some(reader), start_index + 1)
        } else {
            (None, paths.len())
        };
        Ok(Self { fs, paths, next_index, current })
    }
}

impl Read for FileSetStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        loop {
            if let Some(reader) = self.current.as_mut() {
                let n = reader.read(buf)?;
                if n > 0 {
                    return Ok(n);
                }
                self.current = None;
            }
            if self.next_index >= self.paths.len() {
                return Ok(0);
            }
            let path = &self.paths[self.next_index];
            self.next_index += 1;
            self.current = Some(self.fs.open_at(path, 0).map_err(Error::into_io)?);
        }
    }
}
