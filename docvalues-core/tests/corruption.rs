//! Any damage to the file pair is reported as corruption at open time.

mod common;

use std::sync::Arc;

use common::state;
use docvalues_core::segment::SegmentFiles;
use docvalues_core::{
    Directory, DocValuesConsumer, DocValuesFormatConfig, DocValuesProducer, Error, RamDirectory,
    Schema, SegmentState,
};

fn schema() -> Arc<Schema> {
    let mut builder = Schema::builder();
    builder.add_i64_field("table");
    builder.add_i64_field("delta");
    builder.add_i64_field("sparse");
    builder.add_sorted_bytes_field("tag");
    Arc::new(builder.build())
}

async fn write_segment(dir: &RamDirectory, state: &SegmentState, config: &DocValuesFormatConfig) {
    let docs = state.max_doc as i64;
    let table: Vec<i64> = (0..docs).map(|i| (i % 3) * 1_000).collect();
    let delta: Vec<i64> = (0..docs).map(|i| i * i - 500).collect();
    let sparse: Vec<i64> = (0..docs).map(|i| if i == 17 { 4 } else { 0 }).collect();
    let tags: Vec<Vec<u8>> = (0..docs).map(|i| format!("t{}", i % 5).into_bytes()).collect();

    let mut consumer = DocValuesConsumer::create(dir, state, config).await.unwrap();
    let schema = schema();
    consumer
        .add_numeric_field(schema.get_field("table").unwrap(), "table", &table)
        .unwrap();
    consumer
        .add_numeric_field(schema.get_field("delta").unwrap(), "delta", &delta)
        .unwrap();
    consumer
        .add_numeric_field(schema.get_field("sparse").unwrap(), "sparse", &sparse)
        .unwrap();
    consumer
        .add_sorted_field(schema.get_field("tag").unwrap(), "tag", &tags)
        .unwrap();
    consumer.close().unwrap();
}

async fn read_file(dir: &RamDirectory, path: &std::path::Path) -> Vec<u8> {
    dir.open_read(path).await.unwrap().to_vec()
}

#[tokio::test]
async fn test_intact_segment_opens() {
    let dir = RamDirectory::new();
    let state = state(31, 300);
    let config = DocValuesFormatConfig::default();
    write_segment(&dir, &state, &config).await;
    let producer = DocValuesProducer::open(&dir, schema(), &state, &config)
        .await
        .unwrap();
    assert_eq!(producer.fields().count(), 4);
}

#[tokio::test]
async fn test_every_flipped_byte_is_detected() {
    let dir = RamDirectory::new();
    let state = state(32, 300);
    let config = DocValuesFormatConfig::default();
    write_segment(&dir, &state, &config).await;
    let files = SegmentFiles::new(&state, &config);

    for path in [&files.meta, &files.data] {
        let original = read_file(&dir, path).await;
        for pos in 0..original.len() {
            let mut damaged = original.clone();
            damaged[pos] ^= 0x5A;
            dir.overwrite(path, damaged);
            let result = DocValuesProducer::open(&dir, schema(), &state, &config).await;
            assert!(
                matches!(result, Err(Error::Corruption(_))),
                "{} byte {} not detected",
                path.display(),
                pos
            );
        }
        dir.overwrite(path, original);
    }
}

#[tokio::test]
async fn test_truncated_files_are_detected() {
    let dir = RamDirectory::new();
    let state = state(33, 100);
    let config = DocValuesFormatConfig::default();
    write_segment(&dir, &state, &config).await;
    let files = SegmentFiles::new(&state, &config);

    for path in [&files.meta, &files.data] {
        let original = read_file(&dir, path).await;
        for len in [0, 1, original.len() / 2, original.len() - 1] {
            dir.overwrite(path, original[..len].to_vec());
            let result = DocValuesProducer::open(&dir, schema(), &state, &config).await;
            assert!(matches!(result, Err(Error::Corruption(_))), "length {}", len);
        }
        dir.overwrite(path, original);
    }
}

#[tokio::test]
async fn test_swapped_files_are_rejected() {
    let dir = RamDirectory::new();
    let state = state(34, 50);
    let config = DocValuesFormatConfig::default();
    write_segment(&dir, &state, &config).await;
    let files = SegmentFiles::new(&state, &config);

    // headers carry distinct codec names
    let meta = read_file(&dir, &files.meta).await;
    let data = read_file(&dir, &files.data).await;
    dir.overwrite(&files.meta, data);
    dir.overwrite(&files.data, meta);
    let result = DocValuesProducer::open(&dir, schema(), &state, &config).await;
    assert!(matches!(result, Err(Error::Corruption(_))));
}

#[tokio::test]
async fn test_wrong_max_doc_is_rejected() {
    let dir = RamDirectory::new();
    let state = state(35, 50);
    let config = DocValuesFormatConfig::default();
    write_segment(&dir, &state, &config).await;

    let wrong = SegmentState::new(state.segment_id, 49);
    let result = DocValuesProducer::open(&dir, schema(), &wrong, &config).await;
    assert!(matches!(result, Err(Error::Corruption(_))));
}

#[tokio::test]
async fn test_missing_files_are_io_errors() {
    let dir = RamDirectory::new();
    let state = state(36, 10);
    let result =
        DocValuesProducer::open(&dir, schema(), &state, &DocValuesFormatConfig::default()).await;
    assert!(matches!(result, Err(Error::Io(_))));
}
