//! Writer failure handling, cached sources and on-disk segments.

mod common;

use std::path::Path;
use std::sync::Arc;
use std::thread;

use common::{single_field_schema, state, write_ints};
use docvalues_core::segment::SegmentFiles;
use docvalues_core::{
    Directory, DocValuesBuilder, DocValuesConsumer, DocValuesFormatConfig, DocValuesProducer,
    Error, Field, FsDirectory, RamDirectory, Schema, SegmentId, SegmentMeta, SegmentState,
    Strategy, ValueType,
};

#[tokio::test]
async fn test_null_value_fails_and_close_publishes_nothing() {
    let dir = RamDirectory::new();
    let state = state(41, 3);
    let config = DocValuesFormatConfig::default();
    let mut consumer = DocValuesConsumer::create(&dir, &state, &config)
        .await
        .unwrap();
    consumer
        .add_numeric_field(Field(0), "ok", &vec![1i64, 2, 3])
        .unwrap();

    let err = consumer
        .add_numeric_field(Field(1), "broken", &vec![Some(1i64), None, Some(3)])
        .unwrap_err();
    match err {
        Error::IllegalState { field, doc } => {
            assert_eq!(field, "broken");
            assert_eq!(doc, 1);
        }
        other => panic!("unexpected error: {}", other),
    }

    assert!(matches!(consumer.close(), Err(Error::Discarded(_))));
    let files = SegmentFiles::new(&state, &config);
    assert!(!dir.exists(&files.meta).await.unwrap());
    assert!(!dir.exists(&files.data).await.unwrap());
    assert!(dir.list_files(Path::new("")).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_null_float_is_illegal_state() {
    let dir = RamDirectory::new();
    let state = state(42, 2);
    let mut consumer =
        DocValuesConsumer::create(&dir, &state, &DocValuesFormatConfig::default())
            .await
            .unwrap();
    let err = consumer
        .add_float_field(Field(0), "f", &vec![None, Some(1.0f64)])
        .unwrap_err();
    assert!(matches!(err, Error::IllegalState { doc: 0, .. }));
}

#[tokio::test]
async fn test_schema_mismatch_is_rejected() {
    let (dir, _, _) = write_ints(&[1, 2, 3]).await;
    let result = DocValuesProducer::open(
        &dir,
        single_field_schema(ValueType::Bytes),
        &state(7, 3),
        &DocValuesFormatConfig::default(),
    )
    .await;
    assert!(matches!(result, Err(Error::InvalidFieldType { .. })));
}

#[tokio::test]
async fn test_concurrent_get_or_load_shares_one_source() {
    let values: Vec<i64> = (0..10_000).map(|i| i * 3).collect();
    let (_, _, producer) = write_ints(&values).await;
    let doc_values = Arc::new(producer.doc_values(Field(0)).unwrap());

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let doc_values = Arc::clone(&doc_values);
            thread::spawn(move || doc_values.get_or_load().unwrap())
        })
        .collect();
    let sources: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    for source in &sources[1..] {
        assert!(Arc::ptr_eq(&sources[0], source));
    }
    assert_eq!(sources[0].get_int(9_999).unwrap(), 29_997);
    assert_eq!(doc_values.ram_bytes_used(), sources[0].ram_bytes_used());
}

#[tokio::test]
async fn test_ram_accounting_tracks_release() {
    let values: Vec<i64> = (0..5_000).map(|i| i % 300 * 1_000).collect();
    let (_, strategy, producer) = write_ints(&values).await;
    assert_eq!(strategy, Strategy::Delta);
    let doc_values = producer.doc_values(Field(0)).unwrap();

    for _ in 0..3 {
        let source = doc_values.get_or_load().unwrap();
        assert_eq!(doc_values.ram_bytes_used(), source.ram_bytes_used());
        doc_values.release();
        assert_eq!(doc_values.ram_bytes_used(), 0);
    }
    // uncached loads are owned by the caller
    let fresh = producer.load(Field(0)).unwrap();
    assert!(fresh.ram_bytes_used() > 0);
    assert_eq!(doc_values.ram_bytes_used(), 0);
}

#[tokio::test]
async fn test_release_then_reload() {
    let (_, _, producer) = write_ints(&[4, 8, 15, 16, 23, 42]).await;
    let doc_values = producer.doc_values(Field(0)).unwrap();
    assert!(doc_values.get_cached().is_none());

    let first = doc_values.get_or_load().unwrap();
    assert!(doc_values.get_cached().is_some());
    let released = doc_values.release().unwrap();
    assert!(Arc::ptr_eq(&first, &released));
    assert!(doc_values.get_cached().is_none());

    // released sources stay usable
    assert_eq!(first.get_int(5).unwrap(), 42);
    let second = doc_values.get_or_load().unwrap();
    assert!(!Arc::ptr_eq(&first, &second));

    let bypass = doc_values.load().unwrap();
    assert!(!Arc::ptr_eq(&second, &bypass));
    assert!(Arc::ptr_eq(&second, &doc_values.get_cached().unwrap()));
}

#[tokio::test]
async fn test_builder_flush_to_filesystem() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = FsDirectory::new(tmp.path());

    let mut schema = Schema::builder();
    let norms = schema.add_i64_field("norms");
    let score = schema.add_f64_field("score");
    let body = schema.add_bytes_field("body");
    let lang = schema.add_sorted_bytes_field("lang");
    let schema = Arc::new(schema.build());

    let mut builder = DocValuesBuilder::new(Arc::clone(&schema));
    builder.add_i64(norms, 0, 12).unwrap();
    builder.add_i64(norms, 3, -5).unwrap();
    builder.add_f64(score, 1, 0.25).unwrap();
    builder.add_bytes(body, 2, b"payload").unwrap();
    builder.add_sorted(lang, 0, b"en").unwrap();
    builder.add_sorted(lang, 3, b"de").unwrap();
    builder.ensure_num_docs(5);
    assert!(matches!(
        builder.add_bytes(norms, 0, b"x"),
        Err(Error::InvalidFieldType { .. })
    ));
    assert!(matches!(
        builder.add_i64(Field(9), 0, 1),
        Err(Error::FieldNotFound(_))
    ));

    let segment_id = SegmentId::new();
    let config = DocValuesFormatConfig::default();
    let meta = builder.flush(&dir, segment_id, &config).await.unwrap();
    assert_eq!(meta.num_docs, 5);

    let loaded = SegmentMeta::load(&dir, segment_id).await.unwrap();
    assert_eq!(loaded.num_docs, 5);
    let state = SegmentState::new(segment_id, loaded.num_docs);
    let producer = Arc::new(
        DocValuesProducer::open(&dir, schema, &state, &config)
            .await
            .unwrap(),
    );

    let norms_source = producer.load(norms).unwrap();
    let got: Vec<i64> = (0..5).map(|d| norms_source.get_int(d).unwrap()).collect();
    assert_eq!(got, vec![12, 0, 0, -5, 0]);
    assert_eq!(producer.load(score).unwrap().get_float(1).unwrap(), 0.25);
    assert_eq!(producer.load(score).unwrap().get_float(0).unwrap(), 0.0);
    assert_eq!(producer.load(body).unwrap().get_bytes(2).unwrap(), b"payload");

    let lang_values = producer.doc_values(lang).unwrap();
    let sorted = lang_values.load_sorted().unwrap();
    assert_eq!(sorted.value_count().unwrap(), 3);
    assert_eq!(sorted.get_bytes(3).unwrap(), b"de");
    assert_eq!(sorted.ord(1).unwrap(), 0);
    assert!(matches!(
        producer.doc_values(norms).unwrap().load_sorted(),
        Err(Error::Unsupported(_))
    ));

    for path in [
        SegmentFiles::new(&state, &config).meta,
        SegmentFiles::new(&state, &config).data,
    ] {
        assert!(tmp.path().join(path).exists());
    }
}
