//! Decode one worker's partition on a thread pool: the assigned range is
//! subdivided with the same arithmetic used for worker partitioning and
//! each sub-range is resolved independently.
//!
//! Run with: `cargo run --example parallel_read`

use std::fs::File;
use std::sync::Arc;
use std::time::Instant;

use recio::{read_partition_parallel, LocalFs, RecordWriter, SplitConfig};

fn main() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("big.rec");

    let mut writer = RecordWriter::new(File::create(&path)?);
    for i in 0..200_000u32 {
        writer.append(format!("record {i:06} {}", "payload ".repeat(4)).as_bytes())?;
    }
    let written = writer.records_written();
    writer.into_inner()?;
    println!("wrote {written} records");

    let fs = Arc::new(LocalFs);
    let start = Instant::now();
    let records = read_partition_parallel(
        fs,
        path.to_str().unwrap(),
        0,
        1,
        None, // shards: one per CPU
        None, // threads: rayon default
        &SplitConfig::default(),
    )?;
    println!("decoded {} records in {:?}", records.len(), start.elapsed());

    assert_eq!(records.len() as u64, written);
    Ok(())
}
