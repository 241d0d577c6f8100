//! Per-field metadata entries as parsed from the metadata file.

use super::format::{
    CONST_COMPRESSED, DELTA_COMPRESSED, INDIRECT, Strategy, TABLE_COMPRESSED, UNCOMPRESSED,
};
use crate::error::{Error, Result};
use crate::store::IndexInput;

/// Sparse fields nest one level, sorted fields two; anything deeper is corrupt.
const MAX_NESTING: usize = 4;

/// Where and how one numeric stream is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NumericEntry {
    Const { value: i64 },
    Uncompressed { count: u32, offset: u64 },
    Table { count: u32, offset: u64 },
    Delta { count: u32, offset: u64 },
    Indirect {
        /// Documents that carry a value
        count: u32,
        offset: u64,
        values: Box<NumericEntry>,
    },
}

impl NumericEntry {
    pub fn strategy(&self) -> Strategy {
        match self {
            NumericEntry::Const { .. } => Strategy::Const,
            NumericEntry::Uncompressed { .. } => Strategy::Uncompressed,
            NumericEntry::Table { .. } => Strategy::Table,
            NumericEntry::Delta { .. } => Strategy::Delta,
            NumericEntry::Indirect { .. } => Strategy::Indirect,
        }
    }

    /// Stored value count; const entries do not record one.
    pub fn count(&self) -> Option<u32> {
        match self {
            NumericEntry::Const { .. } => None,
            NumericEntry::Uncompressed { count, .. }
            | NumericEntry::Table { count, .. }
            | NumericEntry::Delta { count, .. }
            | NumericEntry::Indirect { count, .. } => Some(*count),
        }
    }

    fn check_offsets(&self, data_start: u64, data_end: u64) -> Result<()> {
        let offset = match self {
            NumericEntry::Const { .. } => return Ok(()),
            NumericEntry::Uncompressed { offset, .. }
            | NumericEntry::Table { offset, .. }
            | NumericEntry::Delta { offset, .. } => *offset,
            NumericEntry::Indirect { offset, values, .. } => {
                values.check_offsets(data_start, data_end)?;
                *offset
            }
        };
        check_offset(offset, data_start, data_end)
    }

    fn read(meta: &mut IndexInput, field: u32, depth: usize) -> Result<Self> {
        match FieldMeta::read(meta, field, depth)? {
            FieldMeta::Numeric(entry) => Ok(entry),
            other => Err(Error::Corruption(format!(
                "{}: field {} nests a {} entry where numeric values are expected",
                meta.name(),
                field,
                other.strategy()
            ))),
        }
    }

    /// Check the stored count of a stream that must cover `expected` values.
    fn check_count(&self, name: &str, field: u32, expected: u32) -> Result<()> {
        match self.count() {
            Some(count) if count != expected => Err(Error::Corruption(format!(
                "{}: field {} stores {} values, expected {}",
                name, field, count, expected
            ))),
            _ => Ok(()),
        }
    }
}

/// Metadata of one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldMeta {
    Numeric(NumericEntry),
    Bytes {
        count: u32,
        offset: u64,
    },
    Sorted {
        value_count: u32,
        offset: u64,
        ords: NumericEntry,
    },
}

impl FieldMeta {
    pub fn strategy(&self) -> Strategy {
        match self {
            FieldMeta::Numeric(entry) => entry.strategy(),
            FieldMeta::Bytes { .. } => Strategy::Bytes,
            FieldMeta::Sorted { .. } => Strategy::Sorted,
        }
    }

    /// Strategy of the stream nested under an indirect or sorted entry.
    pub fn nested_strategy(&self) -> Option<Strategy> {
        match self {
            FieldMeta::Numeric(NumericEntry::Indirect { values, .. }) => Some(values.strategy()),
            FieldMeta::Sorted { ords, .. } => Some(ords.strategy()),
            _ => None,
        }
    }

    /// Values stored for the field (dictionary size for sorted fields).
    pub fn stored_count(&self) -> Option<u32> {
        match self {
            FieldMeta::Numeric(entry) => entry.count(),
            FieldMeta::Bytes { count, .. } => Some(*count),
            FieldMeta::Sorted { value_count, .. } => Some(*value_count),
        }
    }

    /// Parse the entry following a field number.
    pub fn read(meta: &mut IndexInput, field: u32, depth: usize) -> Result<Self> {
        if depth > MAX_NESTING {
            return Err(Error::Corruption(format!(
                "{}: field {} nests deeper than {} levels",
                meta.name(),
                field,
                MAX_NESTING
            )));
        }
        let count = meta.read_vint()?;
        let tag = meta.read_byte()?;
        let Some(strategy) = Strategy::from_tag(tag) else {
            return Err(Error::Corruption(format!(
                "{}: unknown format tag {} for field {}",
                meta.name(),
                tag,
                field
            )));
        };

        let entry = match strategy {
            Strategy::Const => {
                debug_assert_eq!(tag, CONST_COMPRESSED);
                FieldMeta::Numeric(NumericEntry::Const {
                    value: meta.read_long()?,
                })
            }
            Strategy::Uncompressed | Strategy::Table | Strategy::Delta => {
                let offset = read_offset(meta)?;
                FieldMeta::Numeric(match tag {
                    UNCOMPRESSED => NumericEntry::Uncompressed { count, offset },
                    TABLE_COMPRESSED => NumericEntry::Table { count, offset },
                    _ => {
                        debug_assert_eq!(tag, DELTA_COMPRESSED);
                        NumericEntry::Delta { count, offset }
                    }
                })
            }
            Strategy::Indirect => {
                debug_assert_eq!(tag, INDIRECT);
                let offset = read_offset(meta)?;
                let values = read_nested(meta, field, depth)?;
                values.check_count(meta.name(), field, count)?;
                FieldMeta::Numeric(NumericEntry::Indirect {
                    count,
                    offset,
                    values: Box::new(values),
                })
            }
            Strategy::Bytes => FieldMeta::Bytes {
                count,
                offset: read_offset(meta)?,
            },
            Strategy::Sorted => {
                let offset = read_offset(meta)?;
                let ords = read_nested(meta, field, depth)?;
                FieldMeta::Sorted {
                    value_count: count,
                    offset,
                    ords,
                }
            }
        };
        Ok(entry)
    }

    /// Check that a top-level entry covers every document of the segment.
    pub fn check_max_doc(&self, name: &str, field: u32, max_doc: u32) -> Result<()> {
        match self {
            FieldMeta::Numeric(entry) => match entry {
                // an indirect entry counts only documents with a value
                NumericEntry::Indirect { count, .. } if *count <= max_doc => Ok(()),
                NumericEntry::Indirect { count, .. } => Err(Error::Corruption(format!(
                    "{}: field {} has {} values for {} documents",
                    name, field, count, max_doc
                ))),
                _ => entry.check_count(name, field, max_doc),
            },
            FieldMeta::Bytes { count, .. } if *count != max_doc => Err(Error::Corruption(
                format!("{}: field {} stores {} values, expected {}", name, field, count, max_doc),
            )),
            FieldMeta::Bytes { .. } => Ok(()),
            FieldMeta::Sorted { ords, .. } => ords.check_count(name, field, max_doc),
        }
    }

    /// Check every payload offset lies within `data_start..=data_end`.
    pub fn check_offsets(&self, data_start: u64, data_end: u64) -> Result<()> {
        match self {
            FieldMeta::Numeric(entry) => entry.check_offsets(data_start, data_end),
            FieldMeta::Bytes { offset, .. } => check_offset(*offset, data_start, data_end),
            FieldMeta::Sorted { offset, ords, .. } => {
                check_offset(*offset, data_start, data_end)?;
                ords.check_offsets(data_start, data_end)
            }
        }
    }
}

fn read_offset(meta: &mut IndexInput) -> Result<u64> {
    let offset = meta.read_long()?;
    u64::try_from(offset).map_err(|_| {
        Error::Corruption(format!("{}: negative data offset {}", meta.name(), offset))
    })
}

fn read_nested(meta: &mut IndexInput, field: u32, depth: usize) -> Result<NumericEntry> {
    let nested_field = meta.read_vint()?;
    if nested_field != field {
        return Err(Error::Corruption(format!(
            "{}: nested entry of field {} is labelled field {}",
            meta.name(),
            field,
            nested_field
        )));
    }
    NumericEntry::read(meta, field, depth + 1)
}

fn check_offset(offset: u64, data_start: u64, data_end: u64) -> Result<()> {
    if offset < data_start || offset > data_end {
        return Err(Error::Corruption(format!(
            "data offset {} outside {}..={}",
            offset, data_start, data_end
        )));
    }
    Ok(())
}
