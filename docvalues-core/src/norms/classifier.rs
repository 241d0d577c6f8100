//! Single-pass field statistics and strategy selection.

use super::format::{INDIRECT_THRESHOLD, MAX_TABLE_VALUES, Strategy};
use super::norm_map::NormMap;
use crate::error::{Error, Result};
use crate::packed::{bits_required, fastest_bits_per_value};
use crate::values::{MISSING, NumericValues};

/// What one scan of a value stream learned about it.
#[derive(Debug, Clone)]
pub struct FieldStats {
    pub count: u32,
    pub missing: u32,
    pub min: i64,
    pub max: i64,
    /// Distinct values, dropped once there are more than [`MAX_TABLE_VALUES`].
    pub norm_map: Option<NormMap>,
}

impl FieldStats {
    /// Scan `values` once. A null entry fails with [`Error::IllegalState`].
    pub fn collect(field: &str, values: &dyn NumericValues) -> Result<Self> {
        let mut min = i64::MAX;
        let mut max = i64::MIN;
        let mut norm_map = Some(NormMap::new());
        let mut count = 0u32;
        let mut missing = 0u32;

        for value in values.iter() {
            let Some(v) = value else {
                return Err(Error::IllegalState {
                    field: field.to_string(),
                    doc: count,
                });
            };
            if v == MISSING {
                missing += 1;
            }
            min = min.min(v);
            max = max.max(v);
            if let Some(map) = norm_map.as_mut()
                && map.add(v)
                && map.size() > MAX_TABLE_VALUES
            {
                norm_map = None;
            }
            count += 1;
        }

        if count == 0 {
            min = MISSING;
            max = MISSING;
        }
        Ok(Self {
            count,
            missing,
            min,
            max,
            norm_map,
        })
    }

    pub fn distinct(&self) -> Option<usize> {
        self.norm_map.as_ref().map(NormMap::size)
    }

    /// Bits per table ordinal, if the field is table-encodable.
    pub fn table_bits(&self) -> Option<u8> {
        let size = self.distinct()?;
        Some(fastest_bits_per_value(bits_required(
            size.saturating_sub(1) as u64,
        )))
    }

    fn is_sparse(&self) -> bool {
        self.count as usize > MAX_TABLE_VALUES
            && self.missing as f64 > self.count as f64 * INDIRECT_THRESHOLD
    }

    fn fits_byte(&self) -> bool {
        self.min >= i8::MIN as i64 && self.max <= i8::MAX as i64
    }

    /// Cheapest encoding for the scanned stream.
    pub fn select_strategy(&self) -> Strategy {
        match self.distinct() {
            Some(n) if n <= 1 => Strategy::Const,
            _ if self.is_sparse() => Strategy::Indirect,
            Some(_) => {
                if self.table_bits() == Some(8) && self.fits_byte() {
                    Strategy::Uncompressed
                } else {
                    Strategy::Table
                }
            }
            None => Strategy::Delta,
        }
    }
}
