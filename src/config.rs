//! Reader configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default cap on a single record's payload size: 64 MiB.
pub const DEFAULT_MAX_RECORD_SIZE: u32 = 64 << 20;

/// Default read granularity when buffering ahead: 1 MiB.
pub const DEFAULT_BUFFER_SIZE: usize = 1 << 20;

/// Configuration for partitioned record reading.
///
/// The defaults suit large files on local disk; the interesting knob is
/// `max_record_size`, which doubles as the corruption defense: a length
/// field above it is rejected before any allocation or read proportional
/// to it, and it bounds how far boundary recovery will scan.
///
/// `max_record_size` must match or exceed the bound the writer enforced;
/// it is a format parameter, not a tuning knob, so partition arithmetic
/// stays identical across all workers of a job.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SplitConfig {
    /// Recurse into subdirectories when the locator names a directory.
    pub recursive: bool,
    /// Upper bound on a single record's payload, in bytes.
    pub max_record_size: u32,
    /// Read granularity hint for chunk buffering, in bytes.
    pub buffer_size: usize,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            recursive: false,
            max_record_size: DEFAULT_MAX_RECORD_SIZE,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

impl SplitConfig {
    /// Reject impossible configurations before any I/O happens.
    pub(crate) fn validate(&self) -> Result<()> {
        if self.max_record_size == 0 {
            return Err(Error::Config("max_record_size must be at least 1".into()));
        }
        if self.buffer_size == 0 {
            return Err(Error::Config("buffer_size must be at least 1".into()));
        }
        Ok(())
    }
}
