//! On-disk constants of the doc values file pair.
//!
//! Metadata file, after the header:
//!
//! ```text
//! repeated:  field(vint) entry
//! entry:     count(vint) tag(u8) payload
//!   CONST          value(i64)
//!   UNCOMPRESSED   offset(i64)
//!   TABLE          offset(i64)
//!   DELTA          offset(i64)
//!   INDIRECT       offset(i64) field(vint) entry         count = docs with a value
//!   BYTES          offset(i64)
//!   SORTED         offset(i64) field(vint) entry         count = dictionary size
//! end:       -1(vint)
//! footer
//! ```
//!
//! Data file payloads at `offset`:
//!
//! ```text
//! UNCOMPRESSED   count x i8
//! TABLE          version(vint) size(vint) size x i64 format(vint) bpv(vint) fixed-width ords
//! DELTA          version(vint) block_size(vint) block-delta values
//! INDIRECT       version(vint) block_size(vint) monotonic doc ids
//! BYTES/SORTED   total(vlong) bytes version(vint) block_size(vint) monotonic addresses (count + 1)
//! ```

use std::fmt;

pub const VERSION_START: u32 = 0;
pub const VERSION_CURRENT: u32 = VERSION_START;

pub const DELTA_COMPRESSED: u8 = 0;
pub const TABLE_COMPRESSED: u8 = 1;
pub const CONST_COMPRESSED: u8 = 2;
pub const UNCOMPRESSED: u8 = 3;
pub const INDIRECT: u8 = 4;
pub const BYTES: u8 = 5;
pub const SORTED: u8 = 6;

/// Values per block for block-delta and monotonic payloads.
pub const BLOCK_SIZE: usize = 1 << 14;

/// Most distinct values a field can have and still be table-encoded.
pub const MAX_TABLE_VALUES: usize = 256;

/// A field with more than this share of missing documents (and more than
/// [`MAX_TABLE_VALUES`] documents) is stored sparsely.
pub const INDIRECT_THRESHOLD: f64 = 1.0 - 1.0 / 31.0;

/// Marks the end of the field list in the metadata file.
pub const END_OF_FIELDS: u32 = -1i32 as u32;

/// How one field's values are laid out on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// A single value shared by every document, no data payload
    Const,
    /// Dictionary of at most 256 values plus fixed-width ordinals
    Table,
    /// One signed byte per document
    Uncompressed,
    /// Block-delta packed raw values
    Delta,
    /// Doc ids with a value plus a nested encoding of just those values
    Indirect,
    /// Concatenated byte strings with monotonic addresses
    Bytes,
    /// Sorted dictionary of byte strings plus nested per-document ordinals
    Sorted,
}

impl Strategy {
    pub fn tag(self) -> u8 {
        match self {
            Strategy::Delta => DELTA_COMPRESSED,
            Strategy::Table => TABLE_COMPRESSED,
            Strategy::Const => CONST_COMPRESSED,
            Strategy::Uncompressed => UNCOMPRESSED,
            Strategy::Indirect => INDIRECT,
            Strategy::Bytes => BYTES,
            Strategy::Sorted => SORTED,
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            DELTA_COMPRESSED => Some(Strategy::Delta),
            TABLE_COMPRESSED => Some(Strategy::Table),
            CONST_COMPRESSED => Some(Strategy::Const),
            UNCOMPRESSED => Some(Strategy::Uncompressed),
            INDIRECT => Some(Strategy::Indirect),
            BYTES => Some(Strategy::Bytes),
            SORTED => Some(Strategy::Sorted),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Strategy::Const => "const",
            Strategy::Table => "table",
            Strategy::Uncompressed => "uncompressed",
            Strategy::Delta => "delta",
            Strategy::Indirect => "indirect",
            Strategy::Bytes => "bytes",
            Strategy::Sorted => "sorted",
        }
    }

    /// Whether this strategy stores a numeric stream.
    pub fn is_numeric(self) -> bool {
        !matches!(self, Strategy::Bytes | Strategy::Sorted)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
