//! Sequential output and random-access input over segment files
//!
//! [`IndexOutput`] appends to a [`StreamingWriter`](crate::directories::StreamingWriter)
//! while keeping a running CRC32 and a monotonically increasing file pointer.
//! [`IndexInput`] reads the same primitives back from an in-memory file.

mod input;
mod output;

pub use input::IndexInput;
pub use output::IndexOutput;

use byteorder::{ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Write};

/// CRC32 of `data`, the checksum algorithm used by every file footer.
pub fn checksum_of(data: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

/// Write variable-length integer (1-10 bytes)
///
/// Uses continuation bit encoding: 7 bits of data per byte,
/// high bit indicates more bytes follow.
#[inline]
pub fn write_vlong<W: Write + ?Sized>(writer: &mut W, mut value: u64) -> io::Result<()> {
    loop {
        let byte = (value & 0x7F) as u8;
        value >>= 7;
        if value == 0 {
            writer.write_u8(byte)?;
            return Ok(());
        } else {
            writer.write_u8(byte | 0x80)?;
        }
    }
}

/// Read variable-length integer
#[inline]
pub fn read_vlong<R: Read + ?Sized>(reader: &mut R) -> io::Result<u64> {
    let mut result = 0u64;
    let mut shift = 0;

    loop {
        let byte = reader.read_u8()?;
        result |= ((byte & 0x7F) as u64) << shift;
        if byte & 0x80 == 0 {
            return Ok(result);
        }
        shift += 7;
        if shift >= 64 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "varint too long",
            ));
        }
    }
}
