//! Per-document value streams.
//!
//! A stream yields exactly one entry per document, in doc id order. For
//! numeric streams `Some(0)` is the "no value" sentinel and `None` is a
//! caller contract violation that the writer reports as
//! [`Error::IllegalState`](crate::Error::IllegalState).
//!
//! Every call to `iter()` starts a fresh single pass, so a writer can scan a
//! stream once to classify it and once more to encode it without the stream
//! being materialized. Filters and adapters are lazy.

mod merge;
mod writer;

pub use merge::{MergeSource, MergedValues, SourceValues};
pub use writer::{BytesDocValuesWriter, NumericDocValuesWriter};

use std::collections::BTreeSet;

use rustc_hash::FxHashMap;

/// Sentinel stored for documents without a numeric value.
pub const MISSING: i64 = 0;

pub trait NumericValues {
    fn iter(&self) -> Box<dyn Iterator<Item = Option<i64>> + '_>;
}

pub trait FloatValues {
    fn iter(&self) -> Box<dyn Iterator<Item = Option<f64>> + '_>;
}

/// Byte-string stream; an empty string means "no value".
pub trait BytesValues {
    fn iter(&self) -> Box<dyn Iterator<Item = Option<&[u8]>> + '_>;
}

impl NumericValues for [i64] {
    fn iter(&self) -> Box<dyn Iterator<Item = Option<i64>> + '_> {
        Box::new(<[i64]>::iter(self).map(|&v| Some(v)))
    }
}

impl NumericValues for Vec<i64> {
    fn iter(&self) -> Box<dyn Iterator<Item = Option<i64>> + '_> {
        NumericValues::iter(self.as_slice())
    }
}

impl NumericValues for [Option<i64>] {
    fn iter(&self) -> Box<dyn Iterator<Item = Option<i64>> + '_> {
        Box::new(<[Option<i64>]>::iter(self).copied())
    }
}

impl NumericValues for Vec<Option<i64>> {
    fn iter(&self) -> Box<dyn Iterator<Item = Option<i64>> + '_> {
        NumericValues::iter(self.as_slice())
    }
}

impl<const N: usize> NumericValues for [i64; N] {
    fn iter(&self) -> Box<dyn Iterator<Item = Option<i64>> + '_> {
        NumericValues::iter(self.as_slice())
    }
}

impl FloatValues for [f64] {
    fn iter(&self) -> Box<dyn Iterator<Item = Option<f64>> + '_> {
        Box::new(<[f64]>::iter(self).map(|&v| Some(v)))
    }
}

impl FloatValues for Vec<f64> {
    fn iter(&self) -> Box<dyn Iterator<Item = Option<f64>> + '_> {
        FloatValues::iter(self.as_slice())
    }
}

impl FloatValues for [Option<f64>] {
    fn iter(&self) -> Box<dyn Iterator<Item = Option<f64>> + '_> {
        Box::new(<[Option<f64>]>::iter(self).copied())
    }
}

impl FloatValues for Vec<Option<f64>> {
    fn iter(&self) -> Box<dyn Iterator<Item = Option<f64>> + '_> {
        FloatValues::iter(self.as_slice())
    }
}

impl BytesValues for [Vec<u8>] {
    fn iter(&self) -> Box<dyn Iterator<Item = Option<&[u8]>> + '_> {
        Box::new(<[Vec<u8>]>::iter(self).map(|v| Some(v.as_slice())))
    }
}

impl BytesValues for Vec<Vec<u8>> {
    fn iter(&self) -> Box<dyn Iterator<Item = Option<&[u8]>> + '_> {
        BytesValues::iter(self.as_slice())
    }
}

impl BytesValues for [Option<Vec<u8>>] {
    fn iter(&self) -> Box<dyn Iterator<Item = Option<&[u8]>> + '_> {
        Box::new(<[Option<Vec<u8>>]>::iter(self).map(|v| v.as_deref()))
    }
}

impl BytesValues for Vec<Option<Vec<u8>>> {
    fn iter(&self) -> Box<dyn Iterator<Item = Option<&[u8]>> + '_> {
        BytesValues::iter(self.as_slice())
    }
}

impl BytesValues for [&[u8]] {
    fn iter(&self) -> Box<dyn Iterator<Item = Option<&[u8]>> + '_> {
        Box::new(<[&[u8]]>::iter(self).map(|v| Some(*v)))
    }
}

impl BytesValues for Vec<&[u8]> {
    fn iter(&self) -> Box<dyn Iterator<Item = Option<&[u8]>> + '_> {
        BytesValues::iter(self.as_slice())
    }
}

/// Only the entries that carry a value (drops the sentinel, keeps nulls).
pub struct NonMissing<'a>(pub &'a dyn NumericValues);

impl NumericValues for NonMissing<'_> {
    fn iter(&self) -> Box<dyn Iterator<Item = Option<i64>> + '_> {
        Box::new(self.0.iter().filter(|v| *v != Some(MISSING)))
    }
}

/// Doc ids of the documents that carry a value, ascending.
pub fn docs_with_value(values: &dyn NumericValues) -> impl Iterator<Item = u32> + '_ {
    values
        .iter()
        .enumerate()
        .filter(|(_, v)| *v != Some(MISSING))
        .map(|(doc, _)| doc as u32)
}

/// Floats viewed through their IEEE bit pattern.
pub struct FloatBits<'a>(pub &'a dyn FloatValues);

impl NumericValues for FloatBits<'_> {
    fn iter(&self) -> Box<dyn Iterator<Item = Option<i64>> + '_> {
        Box::new(self.0.iter().map(|v| v.map(|f| f.to_bits() as i64)))
    }
}

/// Dictionary and per-document ordinals of a sorted bytes stream.
///
/// The dictionary is in byte order and always starts with the empty
/// string, so ordinal 0 doubles as the missing sentinel.
pub struct SortedOrds<'a> {
    values: &'a dyn BytesValues,
    dictionary: Vec<&'a [u8]>,
    ords: FxHashMap<&'a [u8], u32>,
}

impl<'a> SortedOrds<'a> {
    pub fn new(values: &'a dyn BytesValues) -> Self {
        let mut distinct: BTreeSet<&'a [u8]> = BTreeSet::new();
        distinct.insert(&[]);
        for value in values.iter().flatten() {
            distinct.insert(value);
        }
        let dictionary: Vec<&'a [u8]> = distinct.into_iter().collect();
        let ords = dictionary
            .as_slice()
            .iter()
            .enumerate()
            .map(|(ord, &v)| (v, ord as u32))
            .collect();
        Self {
            values,
            dictionary,
            ords,
        }
    }

    pub fn dictionary(&self) -> &[&'a [u8]] {
        &self.dictionary
    }

    pub fn value_count(&self) -> usize {
        self.dictionary.len()
    }
}

impl NumericValues for SortedOrds<'_> {
    fn iter(&self) -> Box<dyn Iterator<Item = Option<i64>> + '_> {
        Box::new(
            self.values
                .iter()
                .map(|v| v.and_then(|bytes| self.ords.get(bytes).map(|&ord| ord as i64))),
        )
    }
}

/// Adapter exposing a dictionary slice as a bytes stream.
pub struct Dictionary<'a, 'b>(pub &'b [&'a [u8]]);

impl BytesValues for Dictionary<'_, '_> {
    fn iter(&self) -> Box<dyn Iterator<Item = Option<&[u8]>> + '_> {
        Box::new(self.0.iter().map(|v| Some(*v)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_missing_filter() {
        let values = vec![0i64, 5, 0, 0, -3, 0];
        let filtered: Vec<_> = NonMissing(&values).iter().collect();
        assert_eq!(filtered, vec![Some(5), Some(-3)]);
        let docs: Vec<u32> = docs_with_value(&values).collect();
        assert_eq!(docs, vec![1, 4]);
    }

    #[test]
    fn test_non_missing_keeps_nulls() {
        let values = vec![Some(0i64), None, Some(2)];
        let filtered: Vec<_> = NonMissing(&values).iter().collect();
        assert_eq!(filtered, vec![None, Some(2)]);
    }

    #[test]
    fn test_float_bits() {
        let values = vec![1.5f64, 0.0, -2.25];
        let bits: Vec<_> = FloatBits(&values).iter().collect();
        assert_eq!(bits[0], Some(1.5f64.to_bits() as i64));
        assert_eq!(bits[1], Some(MISSING));
        assert_eq!(bits[2], Some((-2.25f64).to_bits() as i64));
    }

    #[test]
    fn test_sorted_ords() {
        let values: Vec<Vec<u8>> = vec![b"pear".to_vec(), b"".to_vec(), b"apple".to_vec(), b"pear".to_vec()];
        let sorted = SortedOrds::new(&values);
        assert_eq!(
            sorted.dictionary(),
            &[b"".as_slice(), b"apple".as_slice(), b"pear".as_slice()]
        );
        let ords: Vec<_> = sorted.iter().collect();
        assert_eq!(ords, vec![Some(2), Some(0), Some(1), Some(2)]);
    }

    #[test]
    fn test_sorted_ords_match_dictionary_positions() {
        let values: Vec<&[u8]> = ["delta", "alpha", "charlie", "alpha", "bravo"]
            .map(str::as_bytes)
            .to_vec();
        let sorted = SortedOrds::new(&values);
        // "" plus four distinct values
        assert_eq!(sorted.value_count(), 5);
        let view = Dictionary(sorted.dictionary());
        let dictionary: Vec<_> = view.iter().collect();
        for (doc, ord) in sorted.iter().enumerate() {
            let ord = ord.unwrap() as usize;
            assert_eq!(dictionary[ord], Some(values[doc]));
        }
    }

    #[test]
    fn test_sorted_ords_propagate_null() {
        let values: Vec<Option<Vec<u8>>> = vec![Some(b"a".to_vec()), None];
        let sorted = SortedOrds::new(&values);
        let ords: Vec<_> = sorted.iter().collect();
        assert_eq!(ords, vec![Some(1), None]);
    }
}
