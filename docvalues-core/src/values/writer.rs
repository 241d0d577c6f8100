//! In-memory per-document collectors used while a segment is being built.

use super::MISSING;
use crate::DocId;

/// Collects one i64 per document. Gaps are filled with the missing sentinel.
#[derive(Debug, Default, Clone)]
pub struct NumericDocValuesWriter {
    values: Vec<i64>,
}

impl NumericDocValuesWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `value` for `doc_id`; a later call for the same doc wins.
    pub fn add(&mut self, doc_id: DocId, value: i64) {
        let idx = doc_id as usize;
        if idx >= self.values.len() {
            self.values.resize(idx + 1, MISSING);
        }
        self.values[idx] = value;
    }

    /// Ensure the column covers `num_docs` entries.
    pub fn pad_to(&mut self, num_docs: u32) {
        let n = num_docs as usize;
        if self.values.len() < n {
            self.values.resize(n, MISSING);
        }
    }

    pub fn values(&self) -> &Vec<i64> {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Collects one byte string per document. Gaps are filled with the empty string.
#[derive(Debug, Default, Clone)]
pub struct BytesDocValuesWriter {
    values: Vec<Vec<u8>>,
    bytes_used: usize,
}

impl BytesDocValuesWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, doc_id: DocId, value: &[u8]) {
        let idx = doc_id as usize;
        if idx >= self.values.len() {
            self.values.resize(idx + 1, Vec::new());
        }
        self.bytes_used = self.bytes_used - self.values[idx].len() + value.len();
        self.values[idx] = value.to_vec();
    }

    pub fn pad_to(&mut self, num_docs: u32) {
        let n = num_docs as usize;
        if self.values.len() < n {
            self.values.resize(n, Vec::new());
        }
    }

    pub fn values(&self) -> &Vec<Vec<u8>> {
        &self.values
    }

    /// Total payload bytes currently held.
    pub fn bytes_used(&self) -> usize {
        self.bytes_used
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
