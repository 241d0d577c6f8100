#![allow(dead_code)]

use std::sync::Arc;

use docvalues_core::{
    DocValuesConsumer, DocValuesFormatConfig, DocValuesProducer, Field, RamDirectory, Schema,
    SegmentId, SegmentState, Strategy, ValueType,
};

pub fn single_field_schema(value_type: ValueType) -> Arc<Schema> {
    let mut builder = Schema::builder();
    builder.add_field("dv", value_type);
    Arc::new(builder.build())
}

pub fn state(id: u128, max_doc: u32) -> SegmentState {
    SegmentState::new(SegmentId::from_u128(id), max_doc)
}

/// Write one int field and reopen the segment.
pub async fn write_ints(values: &[i64]) -> (RamDirectory, Strategy, Arc<DocValuesProducer>) {
    let dir = RamDirectory::new();
    let state = state(7, values.len() as u32);
    let config = DocValuesFormatConfig::default();
    let mut consumer = DocValuesConsumer::create(&dir, &state, &config)
        .await
        .unwrap();
    let strategy = consumer
        .add_numeric_field(Field(0), "dv", &values.to_vec())
        .unwrap();
    consumer.close().unwrap();

    let producer = DocValuesProducer::open(&dir, single_field_schema(ValueType::Int), &state, &config)
        .await
        .unwrap();
    (dir, strategy, Arc::new(producer))
}

/// Decode every document of field 0.
pub fn read_ints(producer: &DocValuesProducer) -> Vec<i64> {
    let source = producer.load(Field(0)).unwrap();
    (0..producer.max_doc())
        .map(|doc| source.get_int(doc).unwrap())
        .collect()
}
