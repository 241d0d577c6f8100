use std::io::{self, Write};

use byteorder::{LittleEndian, WriteBytesExt};

use super::write_vlong;
use crate::directories::StreamingWriter;

/// Append-only output stream for one segment file.
///
/// Every byte goes through the running checksum, so the footer can be written
/// without re-reading the file.
pub struct IndexOutput {
    name: String,
    writer: Box<dyn StreamingWriter>,
    hasher: crc32fast::Hasher,
    written: u64,
}

impl IndexOutput {
    pub fn new(name: impl Into<String>, writer: Box<dyn StreamingWriter>) -> Self {
        Self {
            name: name.into(),
            writer,
            hasher: crc32fast::Hasher::new(),
            written: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of bytes written so far; the offset of the next write.
    #[inline]
    pub fn file_pointer(&self) -> u64 {
        self.written
    }

    /// CRC32 of every byte written so far.
    pub fn checksum(&self) -> u32 {
        self.hasher.clone().finalize()
    }

    pub fn write_byte(&mut self, b: u8) -> io::Result<()> {
        self.write_all(&[b])
    }

    pub fn write_bytes(&mut self, buf: &[u8]) -> io::Result<()> {
        self.write_all(buf)
    }

    pub fn write_int(&mut self, v: u32) -> io::Result<()> {
        WriteBytesExt::write_u32::<LittleEndian>(self, v)
    }

    pub fn write_long(&mut self, v: i64) -> io::Result<()> {
        WriteBytesExt::write_i64::<LittleEndian>(self, v)
    }

    pub fn write_u128(&mut self, v: u128) -> io::Result<()> {
        WriteBytesExt::write_u128::<LittleEndian>(self, v)
    }

    /// 32-bit varint. `-1i32 as u32` is the 5-byte end-of-fields marker.
    pub fn write_vint(&mut self, v: u32) -> io::Result<()> {
        write_vlong(self, v as u64)
    }

    pub fn write_vlong(&mut self, v: u64) -> io::Result<()> {
        write_vlong(self, v)
    }

    /// vint length + UTF-8 bytes
    pub fn write_string(&mut self, s: &str) -> io::Result<()> {
        self.write_vint(s.len() as u32)?;
        self.write_all(s.as_bytes())
    }

    /// Flush and publish the file.
    pub fn finish(mut self) -> io::Result<()> {
        self.writer.flush()?;
        self.writer.finish()
    }

    /// Discard the file without publishing it.
    pub fn abort(self) -> io::Result<()> {
        self.writer.abort()
    }
}

impl Write for IndexOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.writer.write(buf)?;
        self.hasher.update(&buf[..n]);
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

impl std::fmt::Debug for IndexOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexOutput")
            .field("name", &self.name)
            .field("written", &self.written)
            .finish()
    }
}
