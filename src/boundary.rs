//! Record boundary recovery.
//!
//! A worker's nominal byte range almost never starts on a frame boundary.
//! `seek_record_begin` finds the first true frame start at or after the
//! nominal start by scanning forward, bounded by one maximal frame.
//!
//! Validation is deliberately paranoid: payload bytes can contain the magic
//! marker, so a candidate offset is accepted only when the magic matches,
//! the decoded length is in bounds, the implied frame end lands inside the
//! file set, *and* the following frame's magic (when bytes exist there)
//! also matches. Frame starts are always 4-byte aligned, so the scan steps
//! 4 bytes and unaligned look-alikes are never considered at all.
//!
//! A scan that reaches the true end of the file set without finding a frame
//! resolves to the end offset, yielding an empty partition: the enclosing
//! record runs to end-of-set and belongs to the worker owning its start.
//! If that record is actually truncated, its owner reports the corruption
//! when it reads the frame.

use std::io::Read;

use log::debug;

use crate::chunk::ChunkReader;
use crate::endian;
use crate::error::{CorruptKind, Error, Result};
use crate::frame::{self, ALIGN, HEADER_SIZE, MAGIC};

/// Resolve the first frame start at or after `start`.
///
/// `rd` must be positioned at `start`. On success the reader is advanced to
/// the resolved offset; a return value of `total` means no frame starts at
/// or after `start` (an empty partition for every range ending at or before
/// `total`).
///
/// # Errors
///
/// - [`CorruptKind::BadMagic`] if a full scan window of bytes is present
///   but no offset in it validates (a well-formed record straddling `start`
///   must end, and the next frame begin, inside one window)
/// - [`CorruptKind::TruncatedFile`] if the stream ends before the size the
///   file metadata promised
pub fn seek_record_begin<R: Read>(
    rd: &mut ChunkReader<R>,
    start: u64,
    total: u64,
    max_record_size: u32,
) -> Result<u64> {
    debug_assert_eq!(rd.abs_offset(), start);
    if start == 0 {
        return Ok(0);
    }

    let align = ALIGN as u64;
    let window_end = start.saturating_add(frame::scan_window(max_record_size)).min(total);
    let mut cand = start.div_ceil(align) * align;

    while cand < window_end && cand + HEADER_SIZE as u64 <= total {
        let need = (cand - rd.abs_offset()) as usize + HEADER_SIZE;
        let avail = rd.ensure(need)?;
        if avail < need {
            // metadata promised more bytes than the stream delivered
            return Err(Error::corrupt(CorruptKind::TruncatedFile, rd.abs_offset() + avail as u64));
        }
        if let Some(next) = frame_end_if_valid(rd, cand, total, max_record_size)? {
            let skipped = cand - start;
            rd.advance((cand - rd.abs_offset()) as usize);
            debug!("resolved record begin {cand} (skipped {skipped}B, next frame at {next})");
            return Ok(cand);
        }
        cand += align;
    }

    if window_end == total {
        debug!("no record begins in [{start}, {total}); empty partition");
        return Ok(total);
    }
    Err(Error::corrupt(CorruptKind::BadMagic, start))
}

/// Dual-validate the frame candidate at `cand`: magic, length bounds, frame
/// end inside the set, and the following magic when one must exist.
/// Returns the end offset of the candidate frame if it validates.
///
/// Requires the candidate header to be buffered already.
fn frame_end_if_valid<R: Read>(
    rd: &mut ChunkReader<R>,
    cand: u64,
    total: u64,
    max_record_size: u32,
) -> Result<Option<u64>> {
    let off = (cand - rd.abs_offset()) as usize;
    let buf = rd.bytes();
    if endian::read_u32_at(buf, off) != Some(MAGIC) {
        return Ok(None);
    }
    let Some(len) = endian::read_u32_at(buf, off + 4) else {
        return Ok(None);
    };
    if len > max_record_size {
        return Ok(None);
    }
    let next = cand + frame::frame_size(len);
    if next == total {
        return Ok(Some(next));
    }
    // a following frame needs at least a header's worth of room
    if next + HEADER_SIZE as u64 > total {
        return Ok(None);
    }
    let need = (next - rd.abs_offset()) as usize + ALIGN;
    let avail = rd.ensure(need)?;
    if avail < need {
        return Err(Error::corrupt(CorruptKind::TruncatedFile, rd.abs_offset() + avail as u64));
    }
    let off_next = (next - rd.abs_offset()) as usize;
    if endian::read_u32_at(rd.bytes(), off_next) == Some(MAGIC) {
        Ok(Some(next))
    } else {
        Ok(None)
    }
}
