//! Parallel fan-out over an assigned partition.
//!
//! A single worker's partition can itself be decoded in parallel: the
//! nominal range is subdivided with the same floor arithmetic used for
//! worker partitioning, each sub-range is resolved and read independently
//! on a rayon pool, and the results are concatenated in sub-range order —
//! which is file order, by the same disjoint-union argument that makes
//! worker partitioning exact.
//!
//! Payloads are copied out eagerly here: the borrowed-view contract of
//! [`next_record`](crate::SplitReader::next_record) cannot cross threads.
//!
//! Failure semantics: every sub-range runs to completion regardless of
//! sibling failures, then the first error in sub-range order is returned.
//! No sub-range is ever interrupted mid-flight, so the cost of a doomed
//! run is bounded and deterministic rather than raced.

use std::sync::Arc;

use log::debug;
use rayon::prelude::*;

use crate::config::SplitConfig;
use crate::error::Result;
use crate::fs::FileSystem;
use crate::partition::{nominal_range, FileSet};
use crate::reader::SplitReader;

/// Read the partition of `rank` out of `workers`, decoding `shards`
/// sub-ranges concurrently (defaults to the number of CPUs).
///
/// When `threads` is set, the global rayon pool is sized accordingly on
/// first use. Returns every payload of the partition, in file order.
///
/// # Errors
///
/// Exactly the errors of running each sub-range sequentially; when several
/// sub-ranges fail, the error of the earliest one is returned, after all
/// of them have finished.
pub fn read_partition_parallel(
    fs: Arc<dyn FileSystem>,
    locator: &str,
    rank: u32,
    workers: u32,
    shards: Option<usize>,
    threads: Option<usize>,
    config: &SplitConfig,
) -> Result<Vec<Vec<u8>>> {
    config.validate()?;
    let file_set = FileSet::from_locator(fs.as_ref(), locator, config.recursive)?;
    let range = file_set.nominal_range(rank, workers)?;

    if let Some(t) = threads {
        // ok() to ignore "already built" on repeated calls
        rayon::ThreadPoolBuilder::new().num_threads(t).build_global().ok();
    }
    let shards = shards.unwrap_or_else(num_cpus::get).max(1) as u32;
    let span = range.end - range.start;
    debug!("fan-out: rank {rank}/{workers}, {span}B over {shards} shards");

    let results: Vec<Result<Vec<Vec<u8>>>> = (0..shards)
        .into_par_iter()
        .map(|shard| {
            let sub = nominal_range(span, shard, shards);
            let sub = range.start + sub.start..range.start + sub.end;
            SplitReader::over_range(Arc::clone(&fs), file_set.clone(), sub, config.clone())?
                .read_all()
        })
        .collect();

    let mut out = Vec::new();
    for r in results {
        out.extend(r?);
    }
    Ok(out)
}
