use recio::testing::encode_records;
use recio::{CorruptKind, Error, FileSystem, MemoryFs, SplitConfig, SplitReader};
use std::sync::Arc;

fn fs_of(bytes: Vec<u8>) -> Arc<dyn FileSystem> {
    let mut fs = MemoryFs::new();
    fs.insert("f.rec", bytes);
    Arc::new(fs)
}

fn corrupt_kind(err: &Error) -> CorruptKind {
    err.corrupt_kind().unwrap_or_else(|| panic!("expected corruption, got: {err}"))
}

#[test]
fn flipped_magic_fails_the_owning_worker_only() -> anyhow::Result<()> {
    // three 12-byte frames; corrupt the second frame's magic marker
    let mut bytes = encode_records(&[b"r1r1", b"r2r2", b"r3r3"]);
    bytes[12] ^= 0xff;
    let fs = fs_of(bytes);

    // worker 0 owns offset 12: it yields its well-formed prefix, then
    // fails on the call that reaches the corruption — never a silent skip
    let mut w0 = SplitReader::open(Arc::clone(&fs), "f.rec", 0, 2, SplitConfig::default())?;
    let first = w0.next_record()?.expect("first record is intact");
    assert_eq!(&*first, b"r1r1");
    let err = w0.next_record().unwrap_err();
    assert_eq!(corrupt_kind(&err), CorruptKind::BadMagic);
    // corruption is terminal: the reader now reports exhaustion
    assert!(w0.next_record()?.is_none());

    // worker 1 starts past the damage and is unaffected
    let mut w1 = SplitReader::open(Arc::clone(&fs), "f.rec", 1, 2, SplitConfig::default())?;
    let got = w1.read_all()?;
    assert_eq!(got, vec![b"r3r3".to_vec()]);
    Ok(())
}

#[test]
fn maximum_length_field_is_rejected_before_allocation() -> anyhow::Result<()> {
    // a frame whose length field is the maximum representable value; the
    // reader must reject it from the 8 header bytes alone
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&recio::frame::MAGIC.to_le_bytes());
    bytes.extend_from_slice(&u32::MAX.to_le_bytes());
    bytes.extend_from_slice(&[0u8; 16]);
    let fs = fs_of(bytes);

    let mut r = SplitReader::open(fs, "f.rec", 0, 1, SplitConfig::default())?;
    let err = r.next_record().unwrap_err();
    assert_eq!(corrupt_kind(&err), CorruptKind::BadLength);
    Ok(())
}

#[test]
fn declared_length_past_end_of_set_is_truncation() -> anyhow::Result<()> {
    // a valid header whose payload would run past the end of the data
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&recio::frame::MAGIC.to_le_bytes());
    bytes.extend_from_slice(&100u32.to_le_bytes());
    bytes.extend_from_slice(&[7u8; 20]);
    let fs = fs_of(bytes);

    let mut r = SplitReader::open(fs, "f.rec", 0, 1, SplitConfig::default())?;
    let err = r.next_record().unwrap_err();
    assert_eq!(corrupt_kind(&err), CorruptKind::TruncatedFile);
    Ok(())
}

#[test]
fn stray_trailing_bytes_are_truncation_not_a_record() -> anyhow::Result<()> {
    // a well-formed record followed by half a header
    let mut bytes = encode_records(&[b"full"]);
    bytes.extend_from_slice(&[0xce, 0xd7, 0x23, 0x0a]);
    let fs = fs_of(bytes);

    let mut r = SplitReader::open(fs, "f.rec", 0, 1, SplitConfig::default())?;
    assert!(r.next_record()?.is_some());
    let err = r.next_record().unwrap_err();
    assert_eq!(corrupt_kind(&err), CorruptKind::TruncatedFile);
    Ok(())
}

#[test]
fn corruption_on_a_partition_boundary_is_reported_by_the_handoff() -> anyhow::Result<()> {
    // with 3 workers over three 12-byte frames, the corrupt second frame
    // starts exactly at worker 0's nominal end. Worker 1's scan cannot
    // tell that frame start from mid-record bytes, so worker 0 validates
    // the handoff header after its last record and reports the damage.
    let mut bytes = encode_records(&[b"r1r1", b"r2r2", b"r3r3"]);
    bytes[12] ^= 0xff;
    let fs = fs_of(bytes);

    let mut w0 = SplitReader::open(Arc::clone(&fs), "f.rec", 0, 3, SplitConfig::default())?;
    assert!(w0.next_record()?.is_some());
    let err = w0.next_record().unwrap_err();
    assert_eq!(corrupt_kind(&err), CorruptKind::BadMagic);

    // the record set of the remaining workers is unaffected
    let mut w1 = SplitReader::open(Arc::clone(&fs), "f.rec", 1, 3, SplitConfig::default())?;
    assert!(w1.read_all()?.is_empty());
    let mut w2 = SplitReader::open(Arc::clone(&fs), "f.rec", 2, 3, SplitConfig::default())?;
    assert_eq!(w2.read_all()?, vec![b"r3r3".to_vec()]);
    Ok(())
}

#[test]
fn corruption_at_offset_zero_is_immediate() -> anyhow::Result<()> {
    let fs = fs_of(vec![0x00u8; 64]);
    let mut r = SplitReader::open(fs, "f.rec", 0, 1, SplitConfig::default())?;
    let err = r.next_record().unwrap_err();
    assert_eq!(corrupt_kind(&err), CorruptKind::BadMagic);
    assert_eq!(r.records_read(), 0);
    Ok(())
}
