//! Segment operations: encode, inspect, dump

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tracing::info;

use docvalues_core::{
    DocValuesBuilder, DocValuesFormatConfig, DocValuesProducer, FsDirectory, Schema, SegmentId,
    SegmentMeta, SegmentState, ValueType,
};

fn load_schema(path: &Path) -> Result<Arc<Schema>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read schema file: {:?}", path))?;
    let schema: Schema = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse schema file: {:?}", path))?;
    info!("Parsed schema with {} fields", schema.num_fields());
    Ok(Arc::new(schema))
}

fn parse_segment_id(hex: &str) -> Result<SegmentId> {
    match SegmentId::from_hex(hex) {
        Some(id) => Ok(id),
        None => bail!("Invalid segment id: {:?}", hex),
    }
}

async fn open_producer(
    dir: &Path,
    schema: Arc<Schema>,
    segment: &str,
) -> Result<DocValuesProducer> {
    let segment_id = parse_segment_id(segment)?;
    let directory = FsDirectory::new(dir);
    let meta = SegmentMeta::load(&directory, segment_id)
        .await
        .with_context(|| format!("Failed to load segment info for {}", segment))?;
    let state = SegmentState::new(segment_id, meta.num_docs);
    let producer = DocValuesProducer::open(
        &directory,
        schema,
        &state,
        &DocValuesFormatConfig::default(),
    )
    .await
    .with_context(|| format!("Failed to open segment {}", segment))?;
    Ok(producer)
}

pub async fn encode(dir: PathBuf, schema_path: PathBuf, input: PathBuf) -> Result<()> {
    let schema = load_schema(&schema_path)?;
    let file =
        File::open(&input).with_context(|| format!("Failed to open input file: {:?}", input))?;

    let mut builder = DocValuesBuilder::new(Arc::clone(&schema));
    let mut doc = 0u32;
    for (line_no, line) in BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read line {}", line_no + 1))?;
        if line.trim().is_empty() {
            continue;
        }
        let object: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&line)
            .with_context(|| format!("Line {} is not a JSON object", line_no + 1))?;

        for (name, value) in &object {
            let Some(field) = schema.get_field(name) else {
                bail!("Line {}: unknown field {:?}", line_no + 1, name);
            };
            let value_type = schema
                .get_field_entry(field)
                .map(|e| e.value_type)
                .with_context(|| format!("Field {:?} has no schema entry", name))?;
            match (value_type, value) {
                (ValueType::Int, serde_json::Value::Number(n)) if n.is_i64() => {
                    builder.add_i64(field, doc, n.as_i64().unwrap_or_default())?;
                }
                (ValueType::Float, serde_json::Value::Number(n)) => {
                    builder.add_f64(field, doc, n.as_f64().unwrap_or_default())?;
                }
                (ValueType::Bytes, serde_json::Value::String(s)) => {
                    builder.add_bytes(field, doc, s.as_bytes())?;
                }
                (ValueType::SortedBytes, serde_json::Value::String(s)) => {
                    builder.add_sorted(field, doc, s.as_bytes())?;
                }
                (expected, other) => {
                    bail!(
                        "Line {}: field {:?} expects {}, got {}",
                        line_no + 1,
                        name,
                        expected,
                        other
                    );
                }
            }
        }
        doc += 1;
        builder.ensure_num_docs(doc);
    }

    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create directory: {:?}", dir))?;
    let directory = FsDirectory::new(&dir);
    let segment_id = SegmentId::new();
    let config = DocValuesFormatConfig::default();
    let meta = builder
        .flush(&directory, segment_id, &config)
        .await
        .context("Failed to write segment")?;
    info!("Encoded {} documents", meta.num_docs);

    let state = SegmentState::new(segment_id, meta.num_docs);
    let producer = DocValuesProducer::open(&directory, Arc::clone(&schema), &state, &config)
        .await
        .context("Failed to reopen written segment")?;

    println!("{}", segment_id.to_hex());
    for field in producer.fields() {
        let name = schema.get_field_name(field).unwrap_or("?");
        match (producer.strategy(field), producer.nested_strategy(field)) {
            (Some(strategy), Some(nested)) => println!("{}\t{}({})", name, strategy, nested),
            (Some(strategy), None) => println!("{}\t{}", name, strategy),
            _ => {}
        }
    }
    Ok(())
}

pub async fn inspect(dir: PathBuf, schema_path: PathBuf, segment: String) -> Result<()> {
    let schema = load_schema(&schema_path)?;
    let producer = open_producer(&dir, Arc::clone(&schema), &segment).await?;

    println!("Segment: {}", segment);
    println!("Documents: {}", producer.max_doc());
    println!();
    println!("{:<24} {:<24} {:>12} {:>12}", "field", "strategy", "stored", "ram bytes");
    let mut total = 0usize;
    for field in producer.fields() {
        let name = schema.get_field_name(field).unwrap_or("?");
        let strategy = match (producer.strategy(field), producer.nested_strategy(field)) {
            (Some(strategy), Some(nested)) => format!("{}({})", strategy, nested),
            (Some(strategy), None) => strategy.to_string(),
            (None, _) => continue,
        };
        let stored = producer
            .stored_count(field)
            .map_or_else(|| "-".to_string(), |c| c.to_string());
        let source = producer
            .load(field)
            .with_context(|| format!("Failed to load field {:?}", name))?;
        total += source.ram_bytes_used();
        println!(
            "{:<24} {:<24} {:>12} {:>12}",
            name,
            strategy,
            stored,
            source.ram_bytes_used()
        );
    }
    println!();
    println!("Total source memory: {} bytes", total);
    Ok(())
}

pub async fn dump(dir: PathBuf, schema_path: PathBuf, segment: String, field: String) -> Result<()> {
    let schema = load_schema(&schema_path)?;
    let Some(field_id) = schema.get_field(&field) else {
        bail!("Unknown field {:?}", field);
    };
    let value_type = schema
        .get_field_entry(field_id)
        .map(|e| e.value_type)
        .with_context(|| format!("Field {:?} has no schema entry", field))?;

    let producer = Arc::new(open_producer(&dir, Arc::clone(&schema), &segment).await?);
    let doc_values = producer
        .doc_values(field_id)
        .with_context(|| format!("Field {:?} is not stored in segment {}", field, segment))?;
    let source = doc_values.get_or_load()?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    match value_type {
        ValueType::Int => {
            for entry in source.ints()? {
                let (doc, value) = entry?;
                writeln!(out, "{}\t{}", doc, value)?;
            }
        }
        ValueType::Float => {
            for entry in source.floats()? {
                let (doc, value) = entry?;
                writeln!(out, "{}\t{}", doc, value)?;
            }
        }
        ValueType::Bytes | ValueType::SortedBytes => {
            for entry in source.bytes()? {
                let (doc, value) = entry?;
                writeln!(out, "{}\t{}", doc, String::from_utf8_lossy(value))?;
            }
        }
    }
    out.flush()?;
    Ok(())
}
