//! Fixed-width packing at 1, 2, 4 or 8 bits per value.
//!
//! `64 / bits` values share one little-endian u64 word and never straddle a
//! word boundary, so a lookup is one load, one shift and one mask.

use std::io::{self, Write};

use byteorder::{LittleEndian, WriteBytesExt};

use super::read_le_u64;
use crate::directories::OwnedBytes;
use crate::error::{Error, Result};

#[inline]
fn is_supported(bits: u8) -> bool {
    matches!(bits, 1 | 2 | 4 | 8)
}

/// Streams values into whole u64 words.
pub struct FixedWidthWriter<'a, W: Write + ?Sized> {
    out: &'a mut W,
    bits: u8,
    per_word: usize,
    word: u64,
    filled: usize,
    count: usize,
}

impl<'a, W: Write + ?Sized> FixedWidthWriter<'a, W> {
    /// Panics if `bits` is not one of 1, 2, 4, 8.
    pub fn new(out: &'a mut W, bits: u8) -> Self {
        assert!(
            is_supported(bits),
            "unsupported fixed width: {} bits per value",
            bits
        );
        Self {
            out,
            bits,
            per_word: 64 / bits as usize,
            word: 0,
            filled: 0,
            count: 0,
        }
    }

    pub fn add(&mut self, value: u64) -> io::Result<()> {
        debug_assert!(value >> self.bits == 0, "{} does not fit {} bits", value, self.bits);
        self.word |= value << (self.filled * self.bits as usize);
        self.filled += 1;
        self.count += 1;
        if self.filled == self.per_word {
            self.out.write_u64::<LittleEndian>(self.word)?;
            self.word = 0;
            self.filled = 0;
        }
        Ok(())
    }

    /// Flush the last partial word. Returns the number of values written.
    pub fn finish(self) -> io::Result<usize> {
        if self.filled > 0 {
            self.out.write_u64::<LittleEndian>(self.word)?;
        }
        Ok(self.count)
    }

    /// Bytes occupied by `count` values at `bits`.
    pub fn byte_len(count: usize, bits: u8) -> usize {
        count.div_ceil(64 / bits as usize) * 8
    }
}

/// Random access over a fixed-width payload.
#[derive(Debug, Clone)]
pub struct FixedWidthReader {
    data: OwnedBytes,
    bits: u8,
    per_word: usize,
    len: usize,
}

impl FixedWidthReader {
    pub fn new(data: OwnedBytes, bits: u8, len: usize) -> Result<Self> {
        if !is_supported(bits) {
            return Err(Error::Corruption(format!(
                "unsupported fixed width: {} bits per value",
                bits
            )));
        }
        let needed = FixedWidthWriter::<Vec<u8>>::byte_len(len, bits);
        if data.len() < needed {
            return Err(Error::Corruption(format!(
                "fixed-width payload truncated: {} < {} bytes",
                data.len(),
                needed
            )));
        }
        Ok(Self {
            data: data.slice(0..needed),
            bits,
            per_word: 64 / bits as usize,
            len,
        })
    }

    #[inline]
    pub fn get(&self, index: usize) -> u64 {
        let word = read_le_u64(&self.data, (index / self.per_word) * 8);
        let shift = (index % self.per_word) * self.bits as usize;
        (word >> shift) & ((1u64 << self.bits) - 1)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn bits_per_value(&self) -> u8 {
        self.bits
    }

    pub fn ram_bytes_used(&self) -> usize {
        self.data.len() + std::mem::size_of::<Self>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn pack(bits: u8, values: &[u64]) -> Vec<u8> {
        let mut buf = Vec::new();
        let mut writer = FixedWidthWriter::new(&mut buf, bits);
        for &v in values {
            writer.add(v).unwrap();
        }
        assert_eq!(writer.finish().unwrap(), values.len());
        buf
    }

    #[test]
    fn test_word_layout() {
        // 16 four-bit values fill exactly one word
        let values: Vec<u64> = (0..16).collect();
        let buf = pack(4, &values);
        assert_eq!(buf.len(), 8);
        assert_eq!(u64::from_le_bytes(buf[..8].try_into().unwrap()), 0xFEDC_BA98_7654_3210);

        // 17th value starts a new word
        let values: Vec<u64> = (0..17).map(|v| v % 16).collect();
        assert_eq!(pack(4, &values).len(), 16);
    }

    #[test]
    fn test_empty() {
        let buf = pack(2, &[]);
        assert!(buf.is_empty());
        let reader = FixedWidthReader::new(OwnedBytes::new(buf), 2, 0).unwrap();
        assert!(reader.is_empty());
    }

    #[test]
    #[should_panic(expected = "unsupported fixed width")]
    fn test_unsupported_width_panics() {
        let mut buf = Vec::new();
        let _ = FixedWidthWriter::new(&mut buf, 3);
    }

    #[test]
    fn test_truncated_payload() {
        let buf = pack(8, &[1, 2, 3, 4, 5, 6, 7, 8, 9]);
        let short = OwnedBytes::new(buf[..8].to_vec());
        assert!(matches!(
            FixedWidthReader::new(short, 8, 9),
            Err(Error::Corruption(_))
        ));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_fixed_width_get(
            bits in prop::sample::select(vec![1u8, 2, 4, 8]),
            raw in proptest::collection::vec(any::<u8>(), 0..300),
        ) {
            let mask = (1u64 << bits) - 1;
            let values: Vec<u64> = raw.iter().map(|&v| v as u64 & mask).collect();
            let buf = pack(bits, &values);
            prop_assert_eq!(buf.len(), FixedWidthWriter::<Vec<u8>>::byte_len(values.len(), bits));
            let reader = FixedWidthReader::new(OwnedBytes::new(buf), bits, values.len()).unwrap();
            for (i, &v) in values.iter().enumerate() {
                prop_assert_eq!(reader.get(i), v);
            }
        }
    }
}
