//! Bit-packing primitives used by the doc values writers and readers.
//!
//! | Primitive          | Use                                                   |
//! |--------------------|-------------------------------------------------------|
//! | Fixed-width        | table ordinals at 1, 2, 4 or 8 bits per value         |
//! | Block-delta        | raw values with too many distinct entries for a table |
//! | Monotonic block    | doc id lists and byte addresses                       |
//!
//! All payloads are LSB-first bit streams inside little-endian bytes.

mod block;
mod fixed;
mod monotonic;

pub use block::{BlockPackedReader, BlockPackedWriter};
pub use fixed::{FixedWidthReader, FixedWidthWriter};
pub use monotonic::{MonotonicBlockPackedReader, MonotonicBlockPackedWriter};

/// Version stamped in front of every packed payload.
pub const PACKED_VERSION: u32 = 2;

/// Format id of the fixed-width layout (values never straddle a 64-bit word).
pub const FORMAT_PACKED_SINGLE_BLOCK: u32 = 1;

/// Zigzag-encode an i64 to u64 (small magnitudes map to small values).
#[inline]
pub fn zigzag_encode(v: i64) -> u64 {
    ((v << 1) ^ (v >> 63)) as u64
}

/// Zigzag-decode a u64 back to i64.
#[inline]
pub fn zigzag_decode(v: u64) -> i64 {
    ((v >> 1) as i64) ^ -((v & 1) as i64)
}

/// Minimum number of bits needed to represent `val`.
#[inline]
pub fn bits_needed_u64(val: u64) -> u8 {
    if val == 0 {
        0
    } else {
        64 - val.leading_zeros() as u8
    }
}

/// Bits required to store `max_value`, never less than one.
#[inline]
pub fn bits_required(max_value: u64) -> u8 {
    bits_needed_u64(max_value).max(1)
}

/// Smallest fixed-width layout covering `bits`: 3 rounds to 4, anything above 4 to 8.
#[inline]
pub fn fastest_bits_per_value(bits: u8) -> u8 {
    match bits {
        0 | 1 => 1,
        2 => 2,
        3 | 4 => 4,
        _ => 8,
    }
}

#[inline]
fn read_le_u64(data: &[u8], offset: usize) -> u64 {
    let mut word = [0u8; 8];
    word.copy_from_slice(&data[offset..offset + 8]);
    u64::from_le_bytes(word)
}

/// Pack `values` at `bits_per_value` bits each into `out`.
/// Appends `ceil(values.len() * bits_per_value / 8)` bytes.
pub fn bitpack_write(values: &[u64], bits_per_value: u8, out: &mut Vec<u8>) {
    if bits_per_value == 0 {
        return;
    }
    let bpv = bits_per_value as usize;
    let total_bytes = (values.len() * bpv).div_ceil(8);

    let start = out.len();
    out.resize(start + total_bytes, 0);
    let buf = &mut out[start..];

    for (i, &val) in values.iter().enumerate() {
        let bit_offset = i * bpv;
        let mut remaining_bits = bpv;
        let mut v = val;
        let mut bo = bit_offset / 8;
        let mut bs = bit_offset % 8;

        while remaining_bits > 0 {
            let can_write = (8 - bs).min(remaining_bits);
            let mask = (1u64 << can_write) - 1;
            buf[bo] |= ((v & mask) << bs) as u8;
            v >>= can_write;
            remaining_bits -= can_write;
            bo += 1;
            bs = 0;
        }
    }
}

/// Read value at `index` from bit-packed data.
///
/// Reads a single unaligned u64 covering the target bits when the buffer
/// allows it, otherwise assembles the value byte by byte.
#[inline]
pub fn bitpack_read(data: &[u8], bits_per_value: u8, index: usize) -> u64 {
    if bits_per_value == 0 {
        return 0;
    }
    let bpv = bits_per_value as usize;
    let bit_offset = index * bpv;
    let byte_offset = bit_offset / 8;
    let bit_shift = bit_offset % 8;

    if bit_shift + bpv <= 64 && byte_offset + 8 <= data.len() {
        let raw = read_le_u64(data, byte_offset);
        let mask = if bpv >= 64 {
            u64::MAX
        } else {
            (1u64 << bpv) - 1
        };
        return (raw >> bit_shift) & mask;
    }

    let mut result: u64 = 0;
    let mut remaining_bits = bpv;
    let mut bo = byte_offset;
    let mut bs = bit_shift;
    let mut out_shift = 0;

    while remaining_bits > 0 {
        let can_read = (8 - bs).min(remaining_bits);
        let mask = ((1u64 << can_read) - 1) as u8;
        let byte_val = data.get(bo).copied().unwrap_or(0);
        result |= (((byte_val >> bs) & mask) as u64) << out_shift;
        remaining_bits -= can_read;
        out_shift += can_read;
        bo += 1;
        bs = 0;
    }

    result
}

/// Number of bytes `count` values occupy at `bits_per_value`.
#[inline]
pub fn packed_byte_len(count: usize, bits_per_value: u8) -> usize {
    (count * bits_per_value as usize).div_ceil(8)
}
