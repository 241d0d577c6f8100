//! Value to ordinal deduplication for table encoding.

use rustc_hash::FxHashMap;

const UNSET: i16 = -1;

/// Maps up to a few hundred distinct values to dense ordinals in insertion order.
///
/// Values in `[-128, 127]` (the overwhelmingly common case for norms) go
/// through a direct-indexed array; everything else through a hash map.
#[derive(Debug, Clone)]
pub struct NormMap {
    single_byte_range: [i16; 256],
    other: FxHashMap<i64, i16>,
    size: usize,
}

impl Default for NormMap {
    fn default() -> Self {
        Self::new()
    }
}

impl NormMap {
    pub fn new() -> Self {
        Self {
            single_byte_range: [UNSET; 256],
            other: FxHashMap::default(),
            size: 0,
        }
    }

    #[inline]
    fn byte_slot(value: i64) -> Option<usize> {
        if (i8::MIN as i64..=i8::MAX as i64).contains(&value) {
            Some((value + 128) as usize)
        } else {
            None
        }
    }

    /// Add `value`; returns true if it was not present before.
    pub fn add(&mut self, value: i64) -> bool {
        debug_assert!(
            self.size < i16::MAX as usize,
            "norm map kept past its capacity"
        );
        let ord = self.size as i16;
        let added = match Self::byte_slot(value) {
            Some(slot) => {
                if self.single_byte_range[slot] == UNSET {
                    self.single_byte_range[slot] = ord;
                    true
                } else {
                    false
                }
            }
            None => match self.other.entry(value) {
                std::collections::hash_map::Entry::Occupied(_) => false,
                std::collections::hash_map::Entry::Vacant(e) => {
                    e.insert(ord);
                    true
                }
            },
        };
        if added {
            self.size += 1;
        }
        added
    }

    /// Ordinal of a previously added value.
    ///
    /// # Panics
    ///
    /// If `value` was never added.
    pub fn ord(&self, value: i64) -> u32 {
        let ord = match Self::byte_slot(value) {
            Some(slot) => self.single_byte_range[slot],
            None => self.other.get(&value).copied().unwrap_or(UNSET),
        };
        if ord == UNSET {
            panic!("value {} was never added to the norm map", value);
        }
        ord as u32
    }

    /// Values in ordinal order.
    pub fn decode_table(&self) -> Vec<i64> {
        let mut decode = vec![0i64; self.size];
        for (slot, &ord) in self.single_byte_range.iter().enumerate() {
            if ord != UNSET {
                decode[ord as usize] = slot as i64 - 128;
            }
        }
        for (&value, &ord) in &self.other {
            decode[ord as usize] = value;
        }
        decode
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }
}
