//! Header and footer framing shared by the metadata and data files.
//!
//! ```text
//! header: magic(u32) codec(vint len + utf8) version(u32) segment_id(u128) suffix(u8 len + bytes)
//! ...body...
//! footer: footer_magic(u32) algorithm(u32) checksum(u64)   = 16 bytes
//! ```
//!
//! The footer checksum is a CRC32 over every byte of the file that precedes
//! the checksum field, including the footer magic and algorithm id.

use std::io;

use crate::error::{Error, Result};
use crate::segment::SegmentId;
use crate::store::{IndexInput, IndexOutput, checksum_of};

/// Magic number opening every header
pub const CODEC_MAGIC: u32 = 0x3fd7_6c17;

/// Magic number opening every footer
pub const FOOTER_MAGIC: u32 = !CODEC_MAGIC;

/// Footer algorithm id for CRC32
pub const CHECKSUM_CRC32: u32 = 0;

/// Footer size: magic(4) + algorithm(4) + checksum(8)
pub const FOOTER_SIZE: usize = 16;

/// Longest codec name or suffix that fits the header encoding
pub const MAX_CODEC_NAME_LEN: usize = 127;

/// Write the file header.
pub fn write_header(
    out: &mut IndexOutput,
    codec: &str,
    version: u32,
    segment_id: SegmentId,
    suffix: &str,
) -> io::Result<()> {
    debug_assert!(codec.is_ascii() && codec.len() <= MAX_CODEC_NAME_LEN);
    debug_assert!(suffix.is_ascii() && suffix.len() <= MAX_CODEC_NAME_LEN);
    out.write_int(CODEC_MAGIC)?;
    out.write_string(codec)?;
    out.write_int(version)?;
    out.write_u128(segment_id.0)?;
    out.write_byte(suffix.len() as u8)?;
    out.write_bytes(suffix.as_bytes())
}

/// Size in bytes of the header written by [`write_header`].
pub fn header_length(codec: &str, suffix: &str) -> usize {
    // codec names are < 128 bytes, so their vint length prefix is one byte
    4 + 1 + codec.len() + 4 + 16 + 1 + suffix.len()
}

/// Validate the header at the input's cursor and return the file's version.
pub fn check_header(
    input: &mut IndexInput,
    codec: &str,
    min_version: u32,
    max_version: u32,
    segment_id: SegmentId,
    suffix: &str,
) -> Result<u32> {
    let magic = input.read_int()?;
    if magic != CODEC_MAGIC {
        return Err(Error::Corruption(format!(
            "{}: bad header magic 0x{:08x} (expected 0x{:08x})",
            input.name(),
            magic,
            CODEC_MAGIC
        )));
    }
    let actual_codec = input.read_string()?;
    if actual_codec != codec {
        return Err(Error::Corruption(format!(
            "{}: codec mismatch: expected {:?}, got {:?}",
            input.name(),
            codec,
            actual_codec
        )));
    }
    let version = input.read_int()?;
    if version < min_version || version > max_version {
        return Err(Error::Corruption(format!(
            "{}: format version {} outside supported range {}..={}",
            input.name(),
            version,
            min_version,
            max_version
        )));
    }
    let actual_id = SegmentId(input.read_u128()?);
    if actual_id != segment_id {
        return Err(Error::Corruption(format!(
            "{}: segment id mismatch: expected {}, got {}",
            input.name(),
            segment_id.to_hex(),
            actual_id.to_hex()
        )));
    }
    let suffix_len = input.read_byte()? as usize;
    let actual_suffix = input.read_bytes(suffix_len)?;
    if actual_suffix.as_slice() != suffix.as_bytes() {
        return Err(Error::Corruption(format!(
            "{}: segment suffix mismatch: expected {:?}, got {:?}",
            input.name(),
            suffix,
            String::from_utf8_lossy(actual_suffix.as_slice())
        )));
    }
    Ok(version)
}

/// Write the checksum footer. Must be the last write to `out`.
pub fn write_footer(out: &mut IndexOutput) -> io::Result<()> {
    out.write_int(FOOTER_MAGIC)?;
    out.write_int(CHECKSUM_CRC32)?;
    let checksum = out.checksum();
    out.write_long(checksum as i64)
}

/// Verify the footer of a whole file and return the length of the body
/// (everything before the footer).
pub fn check_footer(input: &IndexInput) -> Result<usize> {
    let len = input.len();
    if len < FOOTER_SIZE {
        return Err(Error::Corruption(format!(
            "{}: file too short for footer ({} bytes)",
            input.name(),
            len
        )));
    }
    let data = input.data().as_slice();
    let footer_start = len - FOOTER_SIZE;
    let word = |at: usize| u32::from_le_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]]);

    let magic = word(footer_start);
    if magic != FOOTER_MAGIC {
        return Err(Error::Corruption(format!(
            "{}: bad footer magic 0x{:08x}",
            input.name(),
            magic
        )));
    }
    let algorithm = word(footer_start + 4);
    if algorithm != CHECKSUM_CRC32 {
        return Err(Error::Corruption(format!(
            "{}: unknown checksum algorithm {}",
            input.name(),
            algorithm
        )));
    }
    let mut stored = [0u8; 8];
    stored.copy_from_slice(&data[footer_start + 8..]);
    let stored = u64::from_le_bytes(stored);
    if stored >> 32 != 0 {
        return Err(Error::Corruption(format!(
            "{}: illegal checksum value 0x{:016x}",
            input.name(),
            stored
        )));
    }
    let actual = checksum_of(&data[..footer_start + 8]);
    if stored as u32 != actual {
        return Err(Error::Corruption(format!(
            "{}: checksum mismatch: expected 0x{:08x}, got 0x{:08x} (file corrupted)",
            input.name(),
            stored,
            actual
        )));
    }
    Ok(footer_start)
}
