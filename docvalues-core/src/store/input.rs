use std::ops::Range;

use crate::directories::OwnedBytes;
use crate::error::{Error, Result};

/// Positional reader over a whole segment file held in memory.
///
/// Every read is bounds-checked: malformed files surface as
/// [`Error::Corruption`], never as a panic.
#[derive(Debug, Clone)]
pub struct IndexInput {
    name: String,
    data: OwnedBytes,
    pos: usize,
}

impl IndexInput {
    pub fn new(name: impl Into<String>, data: OwnedBytes) -> Self {
        Self {
            name: name.into(),
            data,
            pos: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    pub fn data(&self) -> &OwnedBytes {
        &self.data
    }

    pub fn seek(&mut self, pos: u64) -> Result<()> {
        if pos > self.data.len() as u64 {
            return Err(self.eof(pos as usize));
        }
        self.pos = pos as usize;
        Ok(())
    }

    /// Zero-copy view of `range`, independent of the cursor.
    pub fn slice(&self, range: Range<usize>) -> Result<OwnedBytes> {
        if range.start > range.end || range.end > self.data.len() {
            return Err(Error::Corruption(format!(
                "{}: slice {:?} out of bounds (len {})",
                self.name,
                range,
                self.data.len()
            )));
        }
        Ok(self.data.slice(range))
    }

    fn eof(&self, at: usize) -> Error {
        Error::Corruption(format!(
            "{}: read past EOF at {} (len {})",
            self.name,
            at,
            self.data.len()
        ))
    }

    fn take(&mut self, n: usize) -> Result<&[u8]> {
        let end = self.pos.checked_add(n).ok_or_else(|| self.eof(self.pos))?;
        if end > self.data.len() {
            return Err(self.eof(end));
        }
        let start = self.pos;
        self.pos = end;
        Ok(&self.data.as_slice()[start..end])
    }

    pub fn read_byte(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    /// Read `n` bytes as a zero-copy slice.
    pub fn read_bytes(&mut self, n: usize) -> Result<OwnedBytes> {
        let start = self.pos;
        self.take(n)?;
        Ok(self.data.slice(start..start + n))
    }

    pub fn read_int(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_long(&mut self) -> Result<i64> {
        let b = self.take(8)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(b);
        Ok(i64::from_le_bytes(raw))
    }

    pub fn read_u128(&mut self) -> Result<u128> {
        let b = self.take(16)?;
        let mut raw = [0u8; 16];
        raw.copy_from_slice(b);
        Ok(u128::from_le_bytes(raw))
    }

    pub fn read_vlong(&mut self) -> Result<u64> {
        let mut result = 0u64;
        let mut shift = 0;
        loop {
            let byte = self.read_byte()?;
            result |= ((byte & 0x7F) as u64) << shift;
            if byte & 0x80 == 0 {
                return Ok(result);
            }
            shift += 7;
            if shift >= 64 {
                return Err(Error::Corruption(format!(
                    "{}: varint too long at {}",
                    self.name, self.pos
                )));
            }
        }
    }

    pub fn read_vint(&mut self) -> Result<u32> {
        let v = self.read_vlong()?;
        u32::try_from(v).map_err(|_| {
            Error::Corruption(format!(
                "{}: vint {} overflows 32 bits at {}",
                self.name, v, self.pos
            ))
        })
    }

    pub fn read_string(&mut self) -> Result<String> {
        let len = self.read_vint()? as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| Error::Corruption(format!("{}: invalid utf8: {}", self.name, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directories::{DirectoryWriter, RamDirectory};
    use crate::store::IndexOutput;
    use std::path::Path;

    #[tokio::test]
    async fn test_output_input_primitives() {
        let dir = RamDirectory::new();
        let w = dir.streaming_writer(Path::new("f")).await.unwrap();
        let mut out = IndexOutput::new("f", w);
        out.write_byte(7).unwrap();
        out.write_vint(300).unwrap();
        out.write_vint(-1i32 as u32).unwrap();
        out.write_long(i64::MIN).unwrap();
        out.write_int(0xDEAD_BEEF).unwrap();
        out.write_string("norms").unwrap();
        out.write_vlong(u64::MAX).unwrap();
        let fp = out.file_pointer();
        let crc = out.checksum();
        out.finish().unwrap();

        use crate::directories::Directory;
        let bytes = dir.open_read(Path::new("f")).await.unwrap();
        assert_eq!(bytes.len() as u64, fp);
        assert_eq!(crate::store::checksum_of(&bytes), crc);

        let mut input = IndexInput::new("f", bytes);
        assert_eq!(input.read_byte().unwrap(), 7);
        assert_eq!(input.read_vint().unwrap(), 300);
        assert_eq!(input.read_vint().unwrap() as i32, -1);
        assert_eq!(input.read_long().unwrap(), i64::MIN);
        assert_eq!(input.read_int().unwrap(), 0xDEAD_BEEF);
        assert_eq!(input.read_string().unwrap(), "norms");
        assert_eq!(input.read_vlong().unwrap(), u64::MAX);
        assert_eq!(input.remaining(), 0);
        assert!(matches!(input.read_byte(), Err(Error::Corruption(_))));
    }

    #[test]
    fn test_out_of_bounds_is_corruption() {
        let mut input = IndexInput::new("tiny", OwnedBytes::new(vec![1, 2, 3]));
        assert!(input.read_long().is_err());
        // a failed read does not move the cursor
        assert_eq!(input.position(), 0);
        assert!(input.slice(2..5).is_err());
        assert!(input.seek(4).is_err());
        assert_eq!(input.read_bytes(3).unwrap().as_slice(), &[1, 2, 3]);
    }
}
