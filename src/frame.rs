//! The record frame codec.
//!
//! One record on the wire is one *frame*:
//!
//! ```text
//! ┌──────────────┬──────────────┬─────────────┬──────────────────┐
//! │ magic (4 B)  │ length (4 B) │ payload     │ zero padding     │
//! │ 0xced7230a   │ u32, LE      │ length B    │ to 4 B boundary  │
//! └──────────────┴──────────────┴─────────────┴──────────────────┘
//! ```
//!
//! Byte offset 0 of every file is a frame start, and every frame's padded
//! size is a multiple of [`ALIGN`], so every frame start in a well-formed
//! file sits on a 4-byte boundary. Boundary recovery relies on both facts.
//!
//! The wire constants below are shared by writer and reader and must never
//! change independently:
//!
//! - magic marker: [`MAGIC`], written little-endian
//! - length field: `u32`, little-endian
//! - pad byte: `0x00`
//! - alignment: 4 bytes
//!
//! Length fields are validated against the configured maximum *before* any
//! allocation or read proportional to them, so a corrupt length cannot
//! drive an oversized allocation or an unbounded scan.

use std::io::Write;

use crate::endian;
use crate::error::{CorruptKind, Error, Result};

/// Magic marker opening every frame.
pub const MAGIC: u32 = 0xced7_230a;

/// Frame alignment; also the scan step during boundary recovery.
pub const ALIGN: usize = 4;

/// Bytes of magic + length preceding each payload.
pub const HEADER_SIZE: usize = 8;

/// Payload length rounded up to the frame alignment.
#[inline]
pub fn padded_len(len: u32) -> u64 {
    let a = ALIGN as u64;
    (len as u64).div_ceil(a) * a
}

/// Total on-wire size of a frame carrying `len` payload bytes.
#[inline]
pub fn frame_size(len: u32) -> u64 {
    HEADER_SIZE as u64 + padded_len(len)
}

/// Validate the frame header at the start of `buf` and return the payload
/// length.
///
/// `offset` is the absolute position of `buf[0]` in the file set, used only
/// for error reporting.
///
/// # Errors
///
/// - [`CorruptKind::TruncatedFile`] if fewer than [`HEADER_SIZE`] bytes are
///   present
/// - [`CorruptKind::BadMagic`] if the magic marker does not match
/// - [`CorruptKind::BadLength`] if the length exceeds `max_record_size`
pub fn decode_header(buf: &[u8], offset: u64, max_record_size: u32) -> Result<u32> {
    let (magic, len) = match buf {
        [m0, m1, m2, m3, l0, l1, l2, l3, ..] => (
            endian::decode_u32([*m0, *m1, *m2, *m3]),
            endian::decode_u32([*l0, *l1, *l2, *l3]),
        ),
        _ => return Err(Error::corrupt(CorruptKind::TruncatedFile, offset)),
    };
    if magic != MAGIC {
        return Err(Error::corrupt(CorruptKind::BadMagic, offset));
    }
    if len > max_record_size {
        return Err(Error::corrupt(CorruptKind::BadLength, offset));
    }
    Ok(len)
}

/// Write one complete frame for `payload`, returning the bytes written.
///
/// The caller is responsible for the length bound; see
/// [`RecordWriter`](crate::writer::RecordWriter) for the checked entry
/// point.
pub(crate) fn write_frame<W: Write>(w: &mut W, payload: &[u8]) -> std::io::Result<u64> {
    const PAD: [u8; ALIGN] = [0u8; ALIGN];
    let len = payload.len() as u32;
    w.write_all(&endian::encode_u32(MAGIC))?;
    w.write_all(&endian::encode_u32(len))?;
    w.write_all(payload)?;
    let pad = (padded_len(len) - len as u64) as usize;
    w.write_all(&PAD[..pad])?;
    Ok(frame_size(len))
}

/// The distance a boundary scan may look ahead of a nominal start offset.
///
/// A frame straddling the nominal start can push the next frame start at
/// most one maximal frame past it.
pub(crate) fn scan_window(max_record_size: u32) -> u64 {
    frame_size(max_record_size) + ALIGN as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_are_aligned() {
        assert_eq!(frame_size(0), 8);
        assert_eq!(frame_size(1), 12);
        assert_eq!(frame_size(4), 12);
        assert_eq!(frame_size(5), 16);
        assert_eq!(frame_size(u32::MAX), 8 + 0x1_0000_0000);
    }

    #[test]
    fn header_round_trip() {
        let mut buf = Vec::new();
        let n = write_frame(&mut buf, b"hello").unwrap();
        assert_eq!(n, 16);
        assert_eq!(buf.len(), 16);
        let len = decode_header(&buf, 0, 1024).unwrap();
        assert_eq!(len, 5);
        assert_eq!(&buf[8..13], b"hello");
        assert_eq!(&buf[13..16], &[0, 0, 0]);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut buf = Vec::new();
        write_frame(&mut buf, b"x").unwrap();
        buf[0] ^= 0xff;
        let err = decode_header(&buf, 7, 1024).unwrap_err();
        assert_eq!(err.corrupt_kind(), Some(crate::CorruptKind::BadMagic));
        assert!(err.to_string().contains('7'));
    }

    #[test]
    fn rejects_oversized_length() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&crate::endian::encode_u32(MAGIC));
        buf.extend_from_slice(&crate::endian::encode_u32(u32::MAX));
        let err = decode_header(&buf, 0, 1024).unwrap_err();
        assert_eq!(err.corrupt_kind(), Some(crate::CorruptKind::BadLength));
    }

    #[test]
    fn rejects_short_header() {
        let err = decode_header(&[0xce; 7], 3, 1024).unwrap_err();
        assert_eq!(err.corrupt_kind(), Some(crate::CorruptKind::TruncatedFile));
    }
}
