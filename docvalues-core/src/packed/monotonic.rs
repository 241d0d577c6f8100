//! Monotonic block packing.
//!
//! Each block stores a base, an average slope and non-negative residuals:
//! `value_i = base + (slope * i) as i64 + residual_i`. Evenly spaced
//! sequences pack at zero bits per value.
//!
//! ```text
//! base:     vlong   zigzag(base)
//! slope:    u32     f32 bits
//! bpv:      u8
//! data:     [u8]    ceil(len * bpv / 8) bytes of residuals
//! ```

use std::cmp::Ordering;
use std::io::{self, Write};

use byteorder::{LittleEndian, WriteBytesExt};

use super::{
    bitpack_read, bitpack_write, bits_needed_u64, packed_byte_len, zigzag_decode, zigzag_encode,
};
use crate::directories::OwnedBytes;
use crate::error::{Error, Result};
use crate::store::{IndexInput, write_vlong};

#[inline]
fn expected(slope: f32, index: usize) -> i64 {
    (slope * index as f32) as i64
}

pub struct MonotonicBlockPackedWriter<'a, W: Write + ?Sized> {
    out: &'a mut W,
    block_size: usize,
    buffer: Vec<i64>,
    scratch: Vec<u64>,
    count: u64,
    previous: Option<i64>,
}

impl<'a, W: Write + ?Sized> MonotonicBlockPackedWriter<'a, W> {
    pub fn new(out: &'a mut W, block_size: usize) -> Self {
        assert!(block_size > 0, "block size must be positive");
        Self {
            out,
            block_size,
            buffer: Vec::with_capacity(block_size),
            scratch: Vec::with_capacity(block_size),
            count: 0,
            previous: None,
        }
    }

    pub fn add(&mut self, value: i64) -> io::Result<()> {
        debug_assert!(
            self.previous.is_none_or(|p| p <= value),
            "monotonic writer got {} after {:?}",
            value,
            self.previous
        );
        self.previous = Some(value);
        self.buffer.push(value);
        self.count += 1;
        if self.buffer.len() == self.block_size {
            self.flush_block()?;
        }
        Ok(())
    }

    pub fn finish(mut self) -> io::Result<u64> {
        if !self.buffer.is_empty() {
            self.flush_block()?;
        }
        Ok(self.count)
    }

    fn flush_block(&mut self) -> io::Result<()> {
        let n = self.buffer.len();
        let slope = if n > 1 {
            self.buffer[n - 1].wrapping_sub(self.buffer[0]) as f32 / (n - 1) as f32
        } else {
            0.0
        };
        let base = self
            .buffer
            .iter()
            .enumerate()
            .map(|(i, &v)| v.wrapping_sub(expected(slope, i)))
            .min()
            .unwrap_or(0);

        self.scratch.clear();
        self.scratch.extend(self.buffer.iter().enumerate().map(|(i, &v)| {
            v.wrapping_sub(expected(slope, i)).wrapping_sub(base) as u64
        }));
        let max_residual = self.scratch.iter().copied().max().unwrap_or(0);
        let bpv = bits_needed_u64(max_residual);

        write_vlong(&mut *self.out, zigzag_encode(base))?;
        self.out.write_u32::<LittleEndian>(slope.to_bits())?;
        self.out.write_u8(bpv)?;
        if bpv > 0 {
            let mut packed = Vec::with_capacity(packed_byte_len(n, bpv));
            bitpack_write(&self.scratch, bpv, &mut packed);
            self.out.write_all(&packed)?;
        }
        self.buffer.clear();
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct Block {
    base: i64,
    slope: f32,
    bpv: u8,
    data: OwnedBytes,
}

#[derive(Debug, Clone)]
pub struct MonotonicBlockPackedReader {
    blocks: Vec<Block>,
    block_size: usize,
    len: usize,
}

impl MonotonicBlockPackedReader {
    pub fn open(input: &mut IndexInput, block_size: usize, len: usize) -> Result<Self> {
        if block_size == 0 {
            return Err(Error::Corruption("block size 0".to_string()));
        }
        let num_blocks = len.div_ceil(block_size);
        let mut blocks = Vec::with_capacity(num_blocks);
        for b in 0..num_blocks {
            let values = block_size.min(len - b * block_size);
            let base = zigzag_decode(input.read_vlong()?);
            let slope = f32::from_bits(input.read_int()?);
            let bpv = input.read_byte()?;
            if bpv > 64 {
                return Err(Error::Corruption(format!(
                    "{}: monotonic block {} has {} bits per value",
                    input.name(),
                    b,
                    bpv
                )));
            }
            let data = input.read_bytes(packed_byte_len(values, bpv))?;
            blocks.push(Block {
                base,
                slope,
                bpv,
                data,
            });
        }
        Ok(Self {
            blocks,
            block_size,
            len,
        })
    }

    #[inline]
    pub fn get(&self, index: usize) -> i64 {
        let block = &self.blocks[index / self.block_size];
        let i = index % self.block_size;
        let residual = bitpack_read(&block.data, block.bpv, i);
        block
            .base
            .wrapping_add(expected(block.slope, i))
            .wrapping_add(residual as i64)
    }

    /// Binary search over the stored non-decreasing sequence, with the
    /// same contract as `slice::binary_search`.
    pub fn binary_search(&self, target: i64) -> std::result::Result<usize, usize> {
        let mut lo = 0;
        let mut hi = self.len;
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            match self.get(mid).cmp(&target) {
                Ordering::Less => lo = mid + 1,
                Ordering::Greater => hi = mid,
                Ordering::Equal => return Ok(mid),
            }
        }
        Err(lo)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn ram_bytes_used(&self) -> usize {
        self.blocks
            .iter()
            .map(|b| b.data.len() + std::mem::size_of::<Block>())
            .sum::<usize>()
            + std::mem::size_of::<Self>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn pack(values: &[i64], block_size: usize) -> (Vec<u8>, MonotonicBlockPackedReader) {
        let mut buf = Vec::new();
        let mut writer = MonotonicBlockPackedWriter::new(&mut buf, block_size);
        for &v in values {
            writer.add(v).unwrap();
        }
        writer.finish().unwrap();
        let mut input = IndexInput::new("mono", OwnedBytes::new(buf.clone()));
        let reader = MonotonicBlockPackedReader::open(&mut input, block_size, values.len()).unwrap();
        assert_eq!(input.remaining(), 0);
        (buf, reader)
    }

    #[test]
    fn test_uniform_spacing_is_zero_bits() {
        let values: Vec<i64> = (0..1000).map(|i| i * 31).collect();
        let (buf, reader) = pack(&values, 1024);
        // vlong base + slope + bpv, no residuals
        assert_eq!(buf.len(), 1 + 4 + 1);
        assert_eq!(reader.blocks[0].bpv, 0);
        for (i, &v) in values.iter().enumerate() {
            assert_eq!(reader.get(i), v);
        }
    }

    #[test]
    fn test_binary_search() {
        let values = vec![3i64, 9, 10, 400, 401, 5000];
        let (_, reader) = pack(&values, 4);
        for (i, &v) in values.iter().enumerate() {
            assert_eq!(reader.binary_search(v), Ok(i));
        }
        assert_eq!(reader.binary_search(0), Err(0));
        assert_eq!(reader.binary_search(11), Err(3));
        assert_eq!(reader.binary_search(9999), Err(6));
    }

    #[test]
    fn test_empty() {
        let (buf, reader) = pack(&[], 16);
        assert!(buf.is_empty());
        assert_eq!(reader.binary_search(5), Err(0));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_monotonic_get_and_search(
            mut values in proptest::collection::vec(-1_000_000_000i64..1_000_000_000, 0..400),
            block_size in 1usize..128,
            probe in -1_000_000_001i64..1_000_000_001,
        ) {
            values.sort_unstable();
            values.dedup();
            let (_, reader) = pack(&values, block_size);
            for (i, &v) in values.iter().enumerate() {
                prop_assert_eq!(reader.get(i), v);
            }
            prop_assert_eq!(reader.binary_search(probe), values.binary_search(&probe));
        }
    }
}
