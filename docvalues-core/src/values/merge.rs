//! Consolidating several segments' value streams into one.

use super::NumericValues;
use crate::source::Source;

/// One input segment of a merge: its values and, optionally, which of its
/// documents are still live. Deleted documents are dropped from the output.
#[derive(Clone, Copy)]
pub struct MergeSource<'a> {
    pub values: &'a dyn NumericValues,
    pub live_docs: Option<&'a [bool]>,
}

impl<'a> MergeSource<'a> {
    pub fn new(values: &'a dyn NumericValues) -> Self {
        Self {
            values,
            live_docs: None,
        }
    }

    pub fn with_live_docs(mut self, live_docs: &'a [bool]) -> Self {
        self.live_docs = Some(live_docs);
        self
    }

    fn iter(&self) -> Box<dyn Iterator<Item = Option<i64>> + 'a> {
        let stream: &'a dyn NumericValues = self.values;
        let values = stream.iter();
        match self.live_docs {
            None => values,
            Some(live) => Box::new(
                values
                    .enumerate()
                    .filter(move |(doc, _)| live.get(*doc).copied().unwrap_or(true))
                    .map(|(_, v)| v),
            ),
        }
    }
}

/// The concatenation of all live documents of every merge source, in order.
pub struct MergedValues<'a, 'b> {
    sources: &'b [MergeSource<'a>],
}

impl<'a, 'b> MergedValues<'a, 'b> {
    pub fn new(sources: &'b [MergeSource<'a>]) -> Self {
        Self { sources }
    }

    /// Number of documents in the merged segment.
    pub fn max_doc(&self) -> u32 {
        self.sources
            .iter()
            .map(|s| s.iter().count() as u32)
            .sum()
    }
}

impl NumericValues for MergedValues<'_, '_> {
    fn iter(&self) -> Box<dyn Iterator<Item = Option<i64>> + '_> {
        Box::new(self.sources.iter().flat_map(|s| s.iter()))
    }
}

/// A loaded integer [`Source`] read back as a value stream.
///
/// Documents the source cannot answer become nulls so that re-encoding
/// reports them instead of silently storing the sentinel.
pub struct SourceValues<'a> {
    source: &'a dyn Source,
    max_doc: u32,
}

impl<'a> SourceValues<'a> {
    pub fn new(source: &'a dyn Source, max_doc: u32) -> Self {
        Self { source, max_doc }
    }
}

impl NumericValues for SourceValues<'_> {
    fn iter(&self) -> Box<dyn Iterator<Item = Option<i64>> + '_> {
        Box::new((0..self.max_doc).map(|doc| self.source.get_int(doc).ok()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::values::MISSING;

    #[test]
    fn test_concatenation_skips_deleted() {
        let a = vec![1i64, 2, 3];
        let b = vec![Some(4i64), Some(MISSING)];
        let live = [true, false, true];
        let sources = [MergeSource::new(&a).with_live_docs(&live), MergeSource::new(&b)];
        let merged = MergedValues::new(&sources);
        let values: Vec<_> = merged.iter().collect();
        assert_eq!(values, vec![Some(1), Some(3), Some(4), Some(0)]);
        assert_eq!(merged.max_doc(), 4);
    }
}
