//! Writer of the doc values file pair.

use std::path::Path;

use super::classifier::FieldStats;
use super::format::{
    BLOCK_SIZE, CONST_COMPRESSED, DELTA_COMPRESSED, END_OF_FIELDS, INDIRECT, Strategy,
    TABLE_COMPRESSED, UNCOMPRESSED, VERSION_CURRENT,
};
use super::norm_map::NormMap;
use crate::codec::{write_footer, write_header};
use crate::config::DocValuesFormatConfig;
use crate::directories::DirectoryWriter;
use crate::error::{Error, Result};
use crate::packed::{
    BlockPackedWriter, FORMAT_PACKED_SINGLE_BLOCK, FixedWidthWriter, MonotonicBlockPackedWriter,
    PACKED_VERSION,
};
use crate::schema::Field;
use crate::segment::{SegmentFiles, SegmentWriteState};
use crate::store::IndexOutput;
use crate::values::{
    BytesValues, Dictionary, FloatBits, FloatValues, MergeSource, MergedValues, NonMissing,
    NumericValues, SortedOrds, docs_with_value,
};

/// Writes one segment's doc values: a metadata stream describing every field
/// and a data stream holding the payloads.
///
/// Fields are written one at a time, in any order, each at most once. The
/// consumer must be [`close`](Self::close)d for either file to be published;
/// dropping it discards both.
pub struct DocValuesConsumer {
    meta: Option<IndexOutput>,
    data: Option<IndexOutput>,
    max_doc: u32,
    failed: bool,
}

impl std::fmt::Debug for DocValuesConsumer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocValuesConsumer")
            .field("max_doc", &self.max_doc)
            .field("failed", &self.failed)
            .finish_non_exhaustive()
    }
}

impl DocValuesConsumer {
    /// Open both outputs and write their headers.
    pub async fn create<D: DirectoryWriter>(
        dir: &D,
        state: &SegmentWriteState,
        config: &DocValuesFormatConfig,
    ) -> Result<Self> {
        config.validate()?;
        let files = SegmentFiles::new(state, config);

        let mut data = open_output(dir, &files.data).await?;
        if let Err(e) = write_header(
            &mut data,
            &config.data_codec,
            VERSION_CURRENT,
            state.segment_id,
            &state.suffix,
        ) {
            abort_quietly(data);
            return Err(e.into());
        }

        let mut meta = match open_output(dir, &files.meta).await {
            Ok(meta) => meta,
            Err(e) => {
                abort_quietly(data);
                return Err(e);
            }
        };
        if let Err(e) = write_header(
            &mut meta,
            &config.meta_codec,
            VERSION_CURRENT,
            state.segment_id,
            &state.suffix,
        ) {
            abort_quietly(meta);
            abort_quietly(data);
            return Err(e.into());
        }

        log::debug!(
            "[docvalues] writing segment {} ({} docs) to {:?} / {:?}",
            state.segment_id.to_hex(),
            state.max_doc,
            files.meta,
            files.data
        );
        Ok(Self {
            meta: Some(meta),
            data: Some(data),
            max_doc: state.max_doc,
            failed: false,
        })
    }

    pub fn max_doc(&self) -> u32 {
        self.max_doc
    }

    /// Encode an integer field; `values` must hold exactly `max_doc` entries.
    pub fn add_numeric_field(
        &mut self,
        field: Field,
        name: &str,
        values: &dyn NumericValues,
    ) -> Result<Strategy> {
        let max_doc = self.max_doc;
        self.with_outputs(|meta, data| {
            write_numeric(meta, data, field, name, values, Some(max_doc))
        })
    }

    /// Encode a float field by bit pattern.
    pub fn add_float_field(
        &mut self,
        field: Field,
        name: &str,
        values: &dyn FloatValues,
    ) -> Result<Strategy> {
        self.add_numeric_field(field, name, &FloatBits(values))
    }

    /// Encode one byte string per document.
    pub fn add_bytes_field(
        &mut self,
        field: Field,
        name: &str,
        values: &dyn BytesValues,
    ) -> Result<Strategy> {
        let max_doc = self.max_doc;
        self.with_outputs(|meta, data| write_bytes(meta, data, field, name, values, max_doc))
    }

    /// Encode one byte string per document as a sorted dictionary plus ordinals.
    pub fn add_sorted_field(
        &mut self,
        field: Field,
        name: &str,
        values: &dyn BytesValues,
    ) -> Result<Strategy> {
        let max_doc = self.max_doc;
        self.with_outputs(|meta, data| write_sorted(meta, data, field, name, values, max_doc))
    }

    /// Encode the concatenation of several segments' live values.
    pub fn merge_numeric_field(
        &mut self,
        field: Field,
        name: &str,
        sources: &[MergeSource<'_>],
    ) -> Result<Strategy> {
        self.add_numeric_field(field, name, &MergedValues::new(sources))
    }

    fn with_outputs<T>(
        &mut self,
        f: impl FnOnce(&mut IndexOutput, &mut IndexOutput) -> Result<T>,
    ) -> Result<T> {
        let (Some(meta), Some(data)) = (self.meta.as_mut(), self.data.as_mut()) else {
            return Err(Error::AlreadyClosed);
        };
        let result = f(meta, data);
        if result.is_err() {
            self.failed = true;
        }
        result
    }

    /// Write the end marker and both footers, then publish the files.
    ///
    /// After a failed field write nothing is published: both outputs are
    /// discarded and close fails with [`Error::Discarded`]. Failures while
    /// discarding are only logged.
    pub fn close(mut self) -> Result<()> {
        let (Some(mut meta), Some(mut data)) = (self.meta.take(), self.data.take()) else {
            return Err(Error::AlreadyClosed);
        };

        if self.failed {
            let names = format!("{} and {}", meta.name(), data.name());
            log::warn!("[docvalues] discarding {} after a failed field write", names);
            abort_quietly(meta);
            abort_quietly(data);
            return Err(Error::Discarded(names));
        }

        let trailer = meta
            .write_vint(END_OF_FIELDS)
            .and_then(|_| write_footer(&mut meta))
            .and_then(|_| write_footer(&mut data));
        if let Err(e) = trailer {
            abort_quietly(meta);
            abort_quietly(data);
            return Err(e.into());
        }

        log::debug!(
            "[docvalues] closing {} ({} bytes) and {} ({} bytes)",
            meta.name(),
            meta.file_pointer(),
            data.name(),
            data.file_pointer()
        );
        if let Err(e) = data.finish() {
            abort_quietly(meta);
            return Err(e.into());
        }
        meta.finish()?;
        Ok(())
    }
}

impl Drop for DocValuesConsumer {
    fn drop(&mut self) {
        if let Some(meta) = self.meta.take() {
            log::warn!("[docvalues] consumer dropped without close, discarding output");
            abort_quietly(meta);
        }
        if let Some(data) = self.data.take() {
            abort_quietly(data);
        }
    }
}

async fn open_output<D: DirectoryWriter>(dir: &D, path: &Path) -> Result<IndexOutput> {
    let writer = dir.streaming_writer(path).await?;
    Ok(IndexOutput::new(path.display().to_string(), writer))
}

fn abort_quietly(out: IndexOutput) {
    let name = out.name().to_string();
    if let Err(e) = out.abort() {
        log::warn!("[docvalues] failed to discard {}: {}", name, e);
    }
}

/// Call `f` with every value, failing on the first null.
fn for_each_value(
    name: &str,
    values: &dyn NumericValues,
    mut f: impl FnMut(i64) -> std::io::Result<()>,
) -> Result<()> {
    for (doc, value) in values.iter().enumerate() {
        let v = value.ok_or_else(|| Error::IllegalState {
            field: name.to_string(),
            doc: doc as u32,
        })?;
        f(v)?;
    }
    Ok(())
}

fn check_count(name: &str, count: u32, expected: Option<u32>) -> Result<()> {
    match expected {
        Some(max_doc) if max_doc != count => Err(Error::InvalidArgument(format!(
            "field {} has {} values for a segment of {} documents",
            name, count, max_doc
        ))),
        _ => Ok(()),
    }
}

/// Classify and encode one numeric stream. Recurses for sparse fields.
fn write_numeric(
    meta: &mut IndexOutput,
    data: &mut IndexOutput,
    field: Field,
    name: &str,
    values: &dyn NumericValues,
    expected_count: Option<u32>,
) -> Result<Strategy> {
    meta.write_vint(field.0)?;
    let stats = FieldStats::collect(name, values)?;
    check_count(name, stats.count, expected_count)?;
    let strategy = stats.select_strategy();
    log::debug!(
        "[docvalues] field {} ({}): {} values, {} missing, {} distinct -> {}",
        name,
        field.0,
        stats.count,
        stats.missing,
        stats
            .distinct()
            .map_or_else(|| ">256".to_string(), |n| n.to_string()),
        strategy
    );

    match (strategy, &stats.norm_map) {
        (Strategy::Const, _) => {
            meta.write_vint(0)?;
            meta.write_byte(CONST_COMPRESSED)?;
            meta.write_long(stats.min)?;
        }
        (Strategy::Indirect, _) => {
            write_indirect(meta, data, field, name, values, &stats)?;
        }
        (Strategy::Uncompressed, _) => {
            meta.write_vint(stats.count)?;
            meta.write_byte(UNCOMPRESSED)?;
            meta.write_long(data.file_pointer() as i64)?;
            for_each_value(name, values, |v| data.write_byte(v as i8 as u8))?;
        }
        (Strategy::Table, Some(norm_map)) => {
            let bits = stats.table_bits().unwrap_or(8);
            write_table(meta, data, name, values, stats.count, norm_map, bits)?;
        }
        _ => {
            meta.write_vint(stats.count)?;
            meta.write_byte(DELTA_COMPRESSED)?;
            meta.write_long(data.file_pointer() as i64)?;
            data.write_vint(PACKED_VERSION)?;
            data.write_vint(BLOCK_SIZE as u32)?;
            let mut writer = BlockPackedWriter::new(data, BLOCK_SIZE);
            for_each_value(name, values, |v| writer.add(v))?;
            writer.finish()?;
        }
    }
    Ok(strategy)
}

fn write_table(
    meta: &mut IndexOutput,
    data: &mut IndexOutput,
    name: &str,
    values: &dyn NumericValues,
    count: u32,
    norm_map: &NormMap,
    bits: u8,
) -> Result<()> {
    meta.write_vint(count)?;
    meta.write_byte(TABLE_COMPRESSED)?;
    meta.write_long(data.file_pointer() as i64)?;
    data.write_vint(PACKED_VERSION)?;

    // table padded to a power of two matching the ordinal width
    let decode = norm_map.decode_table();
    let size = 1usize << bits;
    data.write_vint(size as u32)?;
    for &v in &decode {
        data.write_long(v)?;
    }
    for _ in decode.len()..size {
        data.write_long(0)?;
    }

    data.write_vint(FORMAT_PACKED_SINGLE_BLOCK)?;
    data.write_vint(bits as u32)?;
    let mut writer = FixedWidthWriter::new(data, bits);
    for_each_value(name, values, |v| writer.add(norm_map.ord(v) as u64))?;
    writer.finish()?;
    Ok(())
}

fn write_indirect(
    meta: &mut IndexOutput,
    data: &mut IndexOutput,
    field: Field,
    name: &str,
    values: &dyn NumericValues,
    stats: &FieldStats,
) -> Result<()> {
    meta.write_vint(stats.count - stats.missing)?;
    meta.write_byte(INDIRECT)?;
    meta.write_long(data.file_pointer() as i64)?;
    data.write_vint(PACKED_VERSION)?;
    data.write_vint(BLOCK_SIZE as u32)?;

    let mut writer = MonotonicBlockPackedWriter::new(data, BLOCK_SIZE);
    for doc in docs_with_value(values) {
        writer.add(doc as i64)?;
    }
    writer.finish()?;

    let nested = write_numeric(meta, data, field, name, &NonMissing(values), None)?;
    log::debug!(
        "[docvalues] field {} ({}): sparse values stored as {}",
        name,
        field.0,
        nested
    );
    Ok(())
}

/// Concatenated bytes followed by `count + 1` monotonic start addresses.
fn write_bytes_body(data: &mut IndexOutput, values: &dyn BytesValues) -> Result<()> {
    let total: u64 = values
        .iter()
        .map(|v| v.map_or(0, |b| b.len() as u64))
        .sum();
    data.write_vlong(total)?;
    for value in values.iter().flatten() {
        data.write_bytes(value)?;
    }

    data.write_vint(PACKED_VERSION)?;
    data.write_vint(BLOCK_SIZE as u32)?;
    let mut writer = MonotonicBlockPackedWriter::new(data, BLOCK_SIZE);
    let mut address = 0i64;
    writer.add(address)?;
    for value in values.iter() {
        address += value.map_or(0, |b| b.len() as i64);
        writer.add(address)?;
    }
    writer.finish()?;
    Ok(())
}

/// Count entries, failing on the first null.
fn count_bytes(name: &str, values: &dyn BytesValues) -> Result<u32> {
    let mut count = 0u32;
    for value in values.iter() {
        if value.is_none() {
            return Err(Error::IllegalState {
                field: name.to_string(),
                doc: count,
            });
        }
        count += 1;
    }
    Ok(count)
}

fn write_bytes(
    meta: &mut IndexOutput,
    data: &mut IndexOutput,
    field: Field,
    name: &str,
    values: &dyn BytesValues,
    max_doc: u32,
) -> Result<Strategy> {
    meta.write_vint(field.0)?;
    let count = count_bytes(name, values)?;
    check_count(name, count, Some(max_doc))?;
    meta.write_vint(count)?;
    meta.write_byte(Strategy::Bytes.tag())?;
    meta.write_long(data.file_pointer() as i64)?;
    write_bytes_body(data, values)?;
    log::debug!("[docvalues] field {} ({}): {} byte values", name, field.0, count);
    Ok(Strategy::Bytes)
}

fn write_sorted(
    meta: &mut IndexOutput,
    data: &mut IndexOutput,
    field: Field,
    name: &str,
    values: &dyn BytesValues,
    max_doc: u32,
) -> Result<Strategy> {
    meta.write_vint(field.0)?;
    let count = count_bytes(name, values)?;
    check_count(name, count, Some(max_doc))?;

    let ords = SortedOrds::new(values);
    meta.write_vint(ords.value_count() as u32)?;
    meta.write_byte(Strategy::Sorted.tag())?;
    meta.write_long(data.file_pointer() as i64)?;
    write_bytes_body(data, &Dictionary(ords.dictionary()))?;

    let nested = write_numeric(meta, data, field, name, &ords, Some(max_doc))?;
    log::debug!(
        "[docvalues] field {} ({}): {} sorted values, ordinals stored as {}",
        name,
        field.0,
        ords.value_count(),
        nested
    );
    Ok(Strategy::Sorted)
}
