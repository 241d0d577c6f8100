//! Reader of the doc values file pair.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use super::entry::FieldMeta;
use super::format::{END_OF_FIELDS, Strategy, VERSION_CURRENT, VERSION_START};
use crate::codec::{check_footer, check_header};
use crate::config::DocValuesFormatConfig;
use crate::directories::Directory;
use crate::error::{Error, Result};
use crate::schema::{Field, Schema, ValueType};
use crate::segment::{SegmentFiles, SegmentReadState};
use crate::source::{
    DocValues, NumericKind, NumericReader, NumericSource, SortedBytesSource, SortedSource, Source,
    StraightBytesSource,
};
use crate::store::IndexInput;

/// Opens a segment's doc values and builds [`Source`]s on demand.
///
/// Both files are verified (header, footer, checksum) and the metadata is
/// fully parsed at open time; payloads are decoded lazily per field.
pub struct DocValuesProducer {
    data: IndexInput,
    fields: BTreeMap<u32, FieldMeta>,
    schema: Arc<Schema>,
    max_doc: u32,
}

impl DocValuesProducer {
    pub async fn open<D: Directory>(
        dir: &D,
        schema: Arc<Schema>,
        state: &SegmentReadState,
        config: &DocValuesFormatConfig,
    ) -> Result<Self> {
        config.validate()?;
        let files = SegmentFiles::new(state, config);

        let mut meta = read_input(dir, &files.meta).await?;
        let meta_end = check_footer(&meta)?;
        let version = check_header(
            &mut meta,
            &config.meta_codec,
            VERSION_START,
            VERSION_CURRENT,
            state.segment_id,
            &state.suffix,
        )?;
        let fields = read_fields(&mut meta, state.max_doc)?;
        if meta.position() != meta_end {
            return Err(Error::Corruption(format!(
                "{}: {} unexpected bytes after the field list",
                meta.name(),
                meta_end.saturating_sub(meta.position())
            )));
        }

        let mut data = read_input(dir, &files.data).await?;
        let data_end = check_footer(&data)?;
        let data_version = check_header(
            &mut data,
            &config.data_codec,
            VERSION_START,
            VERSION_CURRENT,
            state.segment_id,
            &state.suffix,
        )?;
        if data_version != version {
            return Err(Error::Corruption(format!(
                "format versions differ: {} has {}, {} has {}",
                meta.name(),
                version,
                data.name(),
                data_version
            )));
        }
        let data_start = data.position() as u64;
        for (number, entry) in &fields {
            entry.check_offsets(data_start, data_end as u64)?;
            check_schema(&schema, *number, entry)?;
        }

        // payloads never reach into the footer
        let data_body = data.slice(0..data_end)?;
        let data = IndexInput::new(data.name().to_string(), data_body);

        log::debug!(
            "[docvalues] opened segment {} with {} fields ({} docs)",
            state.segment_id.to_hex(),
            fields.len(),
            state.max_doc
        );
        Ok(Self {
            data,
            fields,
            schema,
            max_doc: state.max_doc,
        })
    }

    pub fn max_doc(&self) -> u32 {
        self.max_doc
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Fields stored in this segment, in field order.
    pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.fields.keys().map(|&n| Field(n))
    }

    pub fn strategy(&self, field: Field) -> Option<Strategy> {
        self.fields.get(&field.0).map(FieldMeta::strategy)
    }

    /// Strategy of the stream nested under an indirect or sorted field.
    pub fn nested_strategy(&self, field: Field) -> Option<Strategy> {
        self.fields.get(&field.0).and_then(FieldMeta::nested_strategy)
    }

    /// Values recorded in the metadata for `field`.
    pub fn stored_count(&self, field: Field) -> Option<u32> {
        self.fields.get(&field.0).and_then(FieldMeta::stored_count)
    }

    fn entry(&self, field: Field) -> Result<&FieldMeta> {
        self.fields.get(&field.0).ok_or_else(|| {
            Error::FieldNotFound(
                self.schema
                    .get_field_name(field)
                    .map_or_else(|| format!("#{}", field.0), str::to_string),
            )
        })
    }

    fn value_type(&self, field: Field) -> Result<ValueType> {
        self.schema
            .get_field_entry(field)
            .map(|e| e.value_type)
            .ok_or_else(|| Error::FieldNotFound(format!("#{}", field.0)))
    }

    /// Decode `field` into a new source.
    ///
    /// The producer keeps no reference to the result; memory is accounted
    /// by whoever holds it (see [`DocValues::ram_bytes_used`]).
    pub fn load(&self, field: Field) -> Result<Arc<dyn Source>> {
        let source: Arc<dyn Source> = match self.entry(field)? {
            FieldMeta::Numeric(entry) => {
                let kind = match self.value_type(field)? {
                    ValueType::Float => NumericKind::Float,
                    _ => NumericKind::Int,
                };
                let reader = NumericReader::open(&self.data, entry)?;
                Arc::new(NumericSource::new(reader, kind, self.max_doc))
            }
            FieldMeta::Bytes { count, offset } => {
                Arc::new(StraightBytesSource::open(&self.data, *offset, *count)?)
            }
            FieldMeta::Sorted { .. } => self.open_sorted(field)?,
        };
        Ok(source)
    }

    /// Decode a sorted bytes field into a new source.
    pub fn load_sorted(&self, field: Field) -> Result<Arc<dyn SortedSource>> {
        let source = self.open_sorted(field)?;
        Ok(source)
    }

    fn open_sorted(&self, field: Field) -> Result<Arc<SortedBytesSource>> {
        match self.entry(field)? {
            FieldMeta::Sorted {
                value_count,
                offset,
                ords,
            } => {
                let ords = NumericReader::open(&self.data, ords)?;
                Ok(Arc::new(SortedBytesSource::open(
                    &self.data,
                    *offset,
                    *value_count,
                    ords,
                    self.max_doc,
                )?))
            }
            other => Err(Error::InvalidFieldType {
                expected: ValueType::SortedBytes.to_string(),
                got: other.strategy().to_string(),
            }),
        }
    }

    /// Cached per-field handle.
    pub fn doc_values(self: &Arc<Self>, field: Field) -> Result<DocValues> {
        let entry = self.entry(field)?;
        let producer = Arc::clone(self);
        let doc_values = DocValues::new(field, Box::new(move || producer.load(field)));
        Ok(match entry {
            FieldMeta::Sorted { .. } => {
                let producer = Arc::clone(self);
                doc_values.with_sorted_loader(Box::new(move || producer.load_sorted(field)))
            }
            _ => doc_values,
        })
    }
}

async fn read_input<D: Directory>(dir: &D, path: &Path) -> Result<IndexInput> {
    let bytes = dir.open_read(path).await?;
    Ok(IndexInput::new(path.display().to_string(), bytes))
}

fn read_fields(meta: &mut IndexInput, max_doc: u32) -> Result<BTreeMap<u32, FieldMeta>> {
    let mut fields = BTreeMap::new();
    loop {
        let number = meta.read_vint()?;
        if number == END_OF_FIELDS {
            return Ok(fields);
        }
        let entry = FieldMeta::read(meta, number, 0)?;
        entry.check_max_doc(meta.name(), number, max_doc)?;
        if fields.insert(number, entry).is_some() {
            return Err(Error::Corruption(format!(
                "{}: field {} written twice",
                meta.name(),
                number
            )));
        }
    }
}

fn check_schema(schema: &Schema, number: u32, entry: &FieldMeta) -> Result<()> {
    let Some(field_entry) = schema.get_field_entry(Field(number)) else {
        return Err(Error::FieldNotFound(format!("#{}", number)));
    };
    let compatible = match entry {
        FieldMeta::Numeric(_) => {
            matches!(field_entry.value_type, ValueType::Int | ValueType::Float)
        }
        FieldMeta::Bytes { .. } => field_entry.value_type == ValueType::Bytes,
        FieldMeta::Sorted { .. } => field_entry.value_type == ValueType::SortedBytes,
    };
    if !compatible {
        return Err(Error::InvalidFieldType {
            expected: field_entry.value_type.to_string(),
            got: entry.strategy().to_string(),
        });
    }
    Ok(())
}
