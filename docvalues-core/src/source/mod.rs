//! Random-access views over one field's stored values.
//!
//! A [`Source`] is built once from the file pair and is immutable
//! afterwards, so it can be shared across threads behind an `Arc`.
//! [`DocValues`] memoizes one source per field; [`ValuesEnum`] walks a
//! source document by document.

mod bytes;
mod cache;
mod numeric;
mod values_enum;

pub use bytes::{SortedBytesSource, StraightBytesSource};
pub use cache::{DocValues, Loader, SortedLoader};
pub use numeric::{NumericKind, NumericReader, NumericSource};
pub use values_enum::ValuesEnum;

use std::cmp::Ordering;

use crate::DocId;
use crate::error::{Error, Result};

/// Typed per-document accessors. Each accessor fails with
/// [`Error::Unsupported`] unless the field stores that type.
pub trait Source: Send + Sync {
    fn get_int(&self, doc: DocId) -> Result<i64> {
        let _ = doc;
        Err(Error::Unsupported("ints are not supported by this source"))
    }

    fn get_float(&self, doc: DocId) -> Result<f64> {
        let _ = doc;
        Err(Error::Unsupported("floats are not supported by this source"))
    }

    fn get_bytes(&self, doc: DocId) -> Result<&[u8]> {
        let _ = doc;
        Err(Error::Unsupported("bytes are not supported by this source"))
    }

    /// Number of stored values, where the encoding records it.
    fn value_count(&self) -> Result<u32> {
        Err(Error::Unsupported("value count is not recorded by this source"))
    }

    /// Documents covered by this source.
    fn max_doc(&self) -> u32;

    fn ram_bytes_used(&self) -> usize;

    fn as_sorted(&self) -> Option<&dyn SortedSource> {
        None
    }
}

/// A source whose values are dense ordinals into a sorted dictionary.
pub trait SortedSource: Source {
    /// Ordinal of the document's value; 0 for documents without one.
    fn ord(&self, doc: DocId) -> Result<u32>;

    fn get_by_ord(&self, ord: u32) -> Result<&[u8]>;

    /// Greatest ordinal whose value is <= `value`.
    fn get_by_value(&self, value: &[u8]) -> Result<LookupResult> {
        let count = self.value_count()?;
        let mut lo = 0u32;
        let mut hi = count;
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            match self.get_by_ord(mid)?.cmp(value) {
                Ordering::Less => lo = mid + 1,
                Ordering::Greater => hi = mid,
                Ordering::Equal => {
                    return Ok(LookupResult {
                        found: true,
                        ord: Some(mid),
                    });
                }
            }
        }
        Ok(LookupResult {
            found: false,
            ord: lo.checked_sub(1),
        })
    }
}

/// Outcome of [`SortedSource::get_by_value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookupResult {
    /// Whether the value at `ord` equals the probe
    pub found: bool,
    /// Greatest ordinal whose value is <= the probe; `None` if the probe
    /// sorts before every stored value
    pub ord: Option<u32>,
}

#[inline]
pub(crate) fn check_doc(doc: DocId, max_doc: u32) -> Result<usize> {
    if doc >= max_doc {
        return Err(Error::DocumentNotFound(doc));
    }
    Ok(doc as usize)
}
