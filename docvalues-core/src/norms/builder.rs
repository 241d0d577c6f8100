//! Collect values per document and flush them as one segment.

use std::sync::Arc;

use super::consumer::DocValuesConsumer;
use crate::DocId;
use crate::config::DocValuesFormatConfig;
use crate::directories::DirectoryWriter;
use crate::error::{Error, Result};
use crate::schema::{Field, Schema, ValueType};
use crate::segment::{SegmentId, SegmentMeta, SegmentState};
use crate::values::{BytesDocValuesWriter, NumericDocValuesWriter};

enum FieldWriter {
    Int(NumericDocValuesWriter),
    /// f64 bit patterns
    Float(NumericDocValuesWriter),
    Bytes(BytesDocValuesWriter),
    Sorted(BytesDocValuesWriter),
}

impl FieldWriter {
    fn new(value_type: ValueType) -> Self {
        match value_type {
            ValueType::Int => FieldWriter::Int(NumericDocValuesWriter::new()),
            ValueType::Float => FieldWriter::Float(NumericDocValuesWriter::new()),
            ValueType::Bytes => FieldWriter::Bytes(BytesDocValuesWriter::new()),
            ValueType::SortedBytes => FieldWriter::Sorted(BytesDocValuesWriter::new()),
        }
    }

    fn value_type(&self) -> ValueType {
        match self {
            FieldWriter::Int(_) => ValueType::Int,
            FieldWriter::Float(_) => ValueType::Float,
            FieldWriter::Bytes(_) => ValueType::Bytes,
            FieldWriter::Sorted(_) => ValueType::SortedBytes,
        }
    }
}

/// In-memory segment under construction.
///
/// Documents without a value for a field get the missing sentinel (`0`, or
/// the empty string for byte fields).
pub struct DocValuesBuilder {
    schema: Arc<Schema>,
    writers: Vec<FieldWriter>,
    num_docs: u32,
}

impl DocValuesBuilder {
    pub fn new(schema: Arc<Schema>) -> Self {
        let writers = schema
            .fields()
            .map(|(_, entry)| FieldWriter::new(entry.value_type))
            .collect();
        Self {
            schema,
            writers,
            num_docs: 0,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Documents in the segment so far (highest doc id seen + 1).
    pub fn num_docs(&self) -> u32 {
        self.num_docs
    }

    /// Grow the segment to at least `num_docs` documents.
    pub fn ensure_num_docs(&mut self, num_docs: u32) {
        self.num_docs = self.num_docs.max(num_docs);
    }

    fn writer(&mut self, field: Field, doc: DocId, expected: ValueType) -> Result<&mut FieldWriter> {
        let writer = self
            .writers
            .get_mut(field.0 as usize)
            .ok_or_else(|| Error::FieldNotFound(format!("#{}", field.0)))?;
        if writer.value_type() != expected {
            return Err(Error::InvalidFieldType {
                expected: writer.value_type().to_string(),
                got: expected.to_string(),
            });
        }
        self.num_docs = self.num_docs.max(doc.saturating_add(1));
        Ok(writer)
    }

    pub fn add_i64(&mut self, field: Field, doc: DocId, value: i64) -> Result<()> {
        if let FieldWriter::Int(w) = self.writer(field, doc, ValueType::Int)? {
            w.add(doc, value);
        }
        Ok(())
    }

    pub fn add_f64(&mut self, field: Field, doc: DocId, value: f64) -> Result<()> {
        if let FieldWriter::Float(w) = self.writer(field, doc, ValueType::Float)? {
            w.add(doc, value.to_bits() as i64);
        }
        Ok(())
    }

    pub fn add_bytes(&mut self, field: Field, doc: DocId, value: &[u8]) -> Result<()> {
        if let FieldWriter::Bytes(w) = self.writer(field, doc, ValueType::Bytes)? {
            w.add(doc, value);
        }
        Ok(())
    }

    pub fn add_sorted(&mut self, field: Field, doc: DocId, value: &[u8]) -> Result<()> {
        if let FieldWriter::Sorted(w) = self.writer(field, doc, ValueType::SortedBytes)? {
            w.add(doc, value);
        }
        Ok(())
    }

    /// Write every field, in field order, as segment `segment_id`.
    pub async fn flush<D: DirectoryWriter>(
        mut self,
        dir: &D,
        segment_id: SegmentId,
        config: &DocValuesFormatConfig,
    ) -> Result<SegmentMeta> {
        let num_docs = self.num_docs;
        let state = SegmentState::new(segment_id, num_docs);
        let mut consumer = DocValuesConsumer::create(dir, &state, config).await?;

        for ((field, entry), writer) in self.schema.fields().zip(self.writers.iter_mut()) {
            match writer {
                FieldWriter::Int(w) | FieldWriter::Float(w) => {
                    w.pad_to(num_docs);
                    consumer.add_numeric_field(field, &entry.name, w.values())?;
                }
                FieldWriter::Bytes(w) => {
                    w.pad_to(num_docs);
                    consumer.add_bytes_field(field, &entry.name, w.values())?;
                }
                FieldWriter::Sorted(w) => {
                    w.pad_to(num_docs);
                    consumer.add_sorted_field(field, &entry.name, w.values())?;
                }
            }
        }
        consumer.close()?;

        let meta = SegmentMeta {
            id: segment_id.0,
            num_docs,
        };
        meta.write_to(dir).await?;
        log::info!(
            "[docvalues] flushed segment {} ({} docs, {} fields)",
            segment_id.to_hex(),
            num_docs,
            self.writers.len()
        );
        Ok(meta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directories::RamDirectory;
    use crate::norms::{DocValuesProducer, Strategy};

    #[tokio::test]
    async fn test_flush_pads_missing_documents() {
        let mut sb = Schema::builder();
        let norms = sb.add_i64_field("norms");
        let title = sb.add_sorted_bytes_field("title");
        let schema = Arc::new(sb.build());

        let mut builder = DocValuesBuilder::new(Arc::clone(&schema));
        builder.add_i64(norms, 0, 12).unwrap();
        builder.add_i64(norms, 2, 3).unwrap();
        builder.add_sorted(title, 1, b"rust").unwrap();
        builder.ensure_num_docs(4);
        assert!(matches!(
            builder.add_f64(norms, 0, 1.0),
            Err(Error::InvalidFieldType { .. })
        ));

        let dir = RamDirectory::new();
        let id = SegmentId::from_u128(42);
        let config = DocValuesFormatConfig::default();
        let meta = builder.flush(&dir, id, &config).await.unwrap();
        assert_eq!(meta.num_docs, 4);
        assert_eq!(SegmentMeta::load(&dir, id).await.unwrap(), meta);

        let state = SegmentState::new(id, meta.num_docs);
        let producer = DocValuesProducer::open(&dir, schema, &state, &config)
            .await
            .unwrap();
        let source = producer.load(norms).unwrap();
        let values: Vec<i64> = (0..4).map(|d| source.get_int(d).unwrap()).collect();
        assert_eq!(values, vec![12, 0, 3, 0]);

        assert_eq!(producer.strategy(title), Some(Strategy::Sorted));
        let sorted = producer.load_sorted(title).unwrap();
        assert_eq!(sorted.get_bytes(1).unwrap(), b"rust");
        assert_eq!(sorted.get_bytes(3).unwrap(), b"");
        assert_eq!(sorted.ord(0).unwrap(), 0);
    }

    #[test]
    fn test_unknown_field() {
        let schema = Arc::new(Schema::builder().build());
        let mut builder = DocValuesBuilder::new(schema);
        assert!(matches!(
            builder.add_i64(Field(0), 0, 1),
            Err(Error::FieldNotFound(_))
        ));
    }
}
