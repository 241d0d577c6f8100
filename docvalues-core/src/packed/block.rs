//! Block-delta packing (frame of reference per block).
//!
//! Per block of up to `block_size` values:
//!
//! ```text
//! token: u8            (bpv << 1) | (min == 0)
//! min:   vlong         zigzag(min) - 1, only when min != 0
//! data:  [u8]          ceil(len * bpv / 8) bytes of (value - min)
//! ```
//!
//! Deltas are computed with wrapping unsigned arithmetic so any pair of
//! i64 values fits in 64 bits.

use std::io::{self, Write};

use byteorder::WriteBytesExt;

use super::{
    bitpack_read, bitpack_write, bits_needed_u64, packed_byte_len, zigzag_decode, zigzag_encode,
};
use crate::directories::OwnedBytes;
use crate::error::{Error, Result};
use crate::store::{IndexInput, write_vlong};

const MIN_VALUE_EQUALS_0: u8 = 1;
const BPV_SHIFT: u8 = 1;

/// Buffers one block of values and flushes it when full.
pub struct BlockPackedWriter<'a, W: Write + ?Sized> {
    out: &'a mut W,
    block_size: usize,
    buffer: Vec<i64>,
    scratch: Vec<u64>,
    count: u64,
}

impl<'a, W: Write + ?Sized> BlockPackedWriter<'a, W> {
    pub fn new(out: &'a mut W, block_size: usize) -> Self {
        assert!(block_size > 0, "block size must be positive");
        Self {
            out,
            block_size,
            buffer: Vec::with_capacity(block_size),
            scratch: Vec::with_capacity(block_size),
            count: 0,
        }
    }

    pub fn add(&mut self, value: i64) -> io::Result<()> {
        self.buffer.push(value);
        self.count += 1;
        if self.buffer.len() == self.block_size {
            self.flush_block()?;
        }
        Ok(())
    }

    /// Flush the trailing partial block. Returns the number of values written.
    pub fn finish(mut self) -> io::Result<u64> {
        if !self.buffer.is_empty() {
            self.flush_block()?;
        }
        Ok(self.count)
    }

    fn flush_block(&mut self) -> io::Result<()> {
        let min = self.buffer.iter().copied().min().unwrap_or(0);
        let max = self.buffer.iter().copied().max().unwrap_or(0);
        let range = (max as u64).wrapping_sub(min as u64);
        let bpv = bits_needed_u64(range);

        let min_flag = if min == 0 { MIN_VALUE_EQUALS_0 } else { 0 };
        self.out.write_u8((bpv << BPV_SHIFT) | min_flag)?;
        if min != 0 {
            write_vlong(&mut *self.out, zigzag_encode(min) - 1)?;
        }

        if bpv > 0 {
            self.scratch.clear();
            self.scratch.extend(
                self.buffer
                    .iter()
                    .map(|&v| (v as u64).wrapping_sub(min as u64)),
            );
            let mut packed = Vec::with_capacity(packed_byte_len(self.scratch.len(), bpv));
            bitpack_write(&self.scratch, bpv, &mut packed);
            self.out.write_all(&packed)?;
        }
        self.buffer.clear();
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct Block {
    min: i64,
    bpv: u8,
    data: OwnedBytes,
}

/// Random access over block-delta payloads; the block table is parsed eagerly.
#[derive(Debug, Clone)]
pub struct BlockPackedReader {
    blocks: Vec<Block>,
    block_size: usize,
    len: usize,
}

impl BlockPackedReader {
    /// Parse `len` values starting at the input's cursor; leaves the cursor after the last block.
    pub fn open(input: &mut IndexInput, block_size: usize, len: usize) -> Result<Self> {
        if block_size == 0 {
            return Err(Error::Corruption("block size 0".to_string()));
        }
        let num_blocks = len.div_ceil(block_size);
        let mut blocks = Vec::with_capacity(num_blocks);
        for b in 0..num_blocks {
            let values = block_size.min(len - b * block_size);
            let token = input.read_byte()?;
            let bpv = token >> BPV_SHIFT;
            if bpv > 64 {
                return Err(Error::Corruption(format!(
                    "{}: block {} has {} bits per value",
                    input.name(),
                    b,
                    bpv
                )));
            }
            let min = if token & MIN_VALUE_EQUALS_0 != 0 {
                0
            } else {
                zigzag_decode(input.read_vlong()?.wrapping_add(1))
            };
            let data = input.read_bytes(packed_byte_len(values, bpv))?;
            blocks.push(Block { min, bpv, data });
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
        let delta = bitpack_read(&block.data, block.bpv, index % self.block_size);
        (block.min as u64).wrapping_add(delta) as i64
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
