//! Forward-only cursors over a loaded source.

use super::{SortedSource, Source};
use crate::DocId;
use crate::error::Result;

/// Walks a field document by document, decoding one value per step.
///
/// Nothing is materialized up front; every step calls the source's random
/// access getter for the current document. Yields `(doc, value)` for every
/// document below `max_doc`, including those without a stored value.
pub struct ValuesEnum<'a, T> {
    get: Box<dyn Fn(DocId) -> Result<T> + 'a>,
    max_doc: u32,
    doc: DocId,
}

impl<'a, T> ValuesEnum<'a, T> {
    /// Fails up front if `get` rejects the first document, so an accessor
    /// the source does not support surfaces before iteration starts.
    fn new(max_doc: u32, get: impl Fn(DocId) -> Result<T> + 'a) -> Result<Self> {
        if max_doc > 0 {
            get(0)?;
        }
        Ok(Self {
            get: Box::new(get),
            max_doc,
            doc: 0,
        })
    }

    /// Document the next step decodes.
    pub fn doc(&self) -> DocId {
        self.doc
    }

    /// Move to the first document `>= target` and decode it. Never moves
    /// backwards; `None` once past the last document.
    pub fn advance(&mut self, target: DocId) -> Option<Result<(DocId, T)>> {
        self.doc = self.doc.max(target);
        self.next()
    }
}

impl<T> Iterator for ValuesEnum<'_, T> {
    type Item = Result<(DocId, T)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.doc >= self.max_doc {
            return None;
        }
        let doc = self.doc;
        self.doc += 1;
        Some((self.get)(doc).map(|value| (doc, value)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.max_doc.saturating_sub(self.doc) as usize;
        (left, Some(left))
    }
}

impl<'s> dyn Source + 's {
    pub fn ints(&self) -> Result<ValuesEnum<'_, i64>> {
        ValuesEnum::new(self.max_doc(), move |doc| self.get_int(doc))
    }

    pub fn floats(&self) -> Result<ValuesEnum<'_, f64>> {
        ValuesEnum::new(self.max_doc(), move |doc| self.get_float(doc))
    }

    pub fn bytes(&self) -> Result<ValuesEnum<'_, &[u8]>> {
        ValuesEnum::new(self.max_doc(), move |doc| self.get_bytes(doc))
    }
}

impl<'s> dyn SortedSource + 's {
    /// Per-document ordinals; 0 for documents without a value.
    pub fn ords(&self) -> Result<ValuesEnum<'_, u32>> {
        ValuesEnum::new(self.max_doc(), move |doc| self.ord(doc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::source::{NumericKind, NumericReader, NumericSource};

    fn uncompressed(values: &[i8]) -> NumericSource {
        let bytes = values.iter().map(|&v| v as u8).collect();
        NumericSource::new(
            NumericReader::Uncompressed(crate::directories::OwnedBytes::new(bytes)),
            NumericKind::Int,
            values.len() as u32,
        )
    }

    #[test]
    fn test_walks_every_document() {
        let source = uncompressed(&[3, -1, 0, 7]);
        let source: &dyn Source = &source;
        let cursor = source.ints().unwrap();
        assert_eq!(cursor.size_hint(), (4, Some(4)));
        let pairs: Vec<(DocId, i64)> = cursor.map(|entry| entry.unwrap()).collect();
        assert_eq!(pairs, vec![(0, 3), (1, -1), (2, 0), (3, 7)]);
    }

    #[test]
    fn test_advance_only_moves_forward() {
        let source = uncompressed(&[10, 11, 12, 13, 14, 15]);
        let source: &dyn Source = &source;
        let mut cursor = source.ints().unwrap();
        assert_eq!(cursor.advance(3).unwrap().unwrap(), (3, 13));
        assert_eq!(cursor.doc(), 4);
        assert_eq!(cursor.advance(1).unwrap().unwrap(), (4, 14));
        assert_eq!(cursor.next().unwrap().unwrap(), (5, 15));
        assert!(cursor.next().is_none());
        assert!(cursor.advance(100).is_none());
    }

    #[test]
    fn test_unsupported_accessor_fails_up_front() {
        let source = uncompressed(&[1, 2]);
        let source: &dyn Source = &source;
        assert!(matches!(source.bytes(), Err(Error::Unsupported(_))));

        let empty = uncompressed(&[]);
        let empty: &dyn Source = &empty;
        assert!(empty.ints().unwrap().next().is_none());
    }
}
