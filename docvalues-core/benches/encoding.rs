//! Doc values encoding benchmarks
//!
//! Run with: cargo bench -p docvalues-core --bench encoding

use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use docvalues_core::{
    DocValuesConsumer, DocValuesFormatConfig, DocValuesProducer, Field, RamDirectory, Schema,
    SegmentId, SegmentState,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::runtime::Runtime;

const DOCS: usize = 100_000;

fn generate(kind: &str, count: usize) -> Vec<i64> {
    let mut rng = StdRng::seed_from_u64(42);
    match kind {
        "const" => vec![7; count],
        "table" => (0..count).map(|_| rng.random_range(0..16) * 1_000).collect(),
        "uncompressed" => (0..count).map(|_| rng.random_range(-128..128)).collect(),
        "delta" => (0..count).map(|_| rng.random_range(0..1_000_000)).collect(),
        _ => (0..count)
            .map(|_| if rng.random_bool(0.01) { rng.random_range(1..100) } else { 0 })
            .collect(),
    }
}

fn schema() -> Arc<Schema> {
    let mut builder = Schema::builder();
    builder.add_i64_field("dv");
    Arc::new(builder.build())
}

async fn write(dir: &RamDirectory, state: &SegmentState, values: &Vec<i64>) {
    let mut consumer = DocValuesConsumer::create(dir, state, &DocValuesFormatConfig::default())
        .await
        .unwrap();
    consumer.add_numeric_field(Field(0), "dv", values).unwrap();
    consumer.close().unwrap();
}

const KINDS: [&str; 5] = ["const", "table", "uncompressed", "delta", "indirect"];

fn bench_write(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let state = SegmentState::new(SegmentId::from_u128(1), DOCS as u32);

    let mut group = c.benchmark_group("write");
    group.throughput(Throughput::Elements(DOCS as u64));
    for kind in KINDS {
        let values = generate(kind, DOCS);
        group.bench_with_input(BenchmarkId::new("numeric", kind), &values, |b, values| {
            b.iter(|| {
                let dir = RamDirectory::new();
                rt.block_on(write(&dir, &state, black_box(values)));
            })
        });
    }
    group.finish();
}

fn bench_read(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let state = SegmentState::new(SegmentId::from_u128(2), DOCS as u32);
    let config = DocValuesFormatConfig::default();

    let mut group = c.benchmark_group("read");
    group.throughput(Throughput::Elements(DOCS as u64));
    for kind in KINDS {
        let dir = RamDirectory::new();
        rt.block_on(write(&dir, &state, &generate(kind, DOCS)));
        let producer = rt
            .block_on(DocValuesProducer::open(&dir, schema(), &state, &config))
            .unwrap();

        group.bench_function(BenchmarkId::new("load", kind), |b| {
            b.iter(|| producer.load(black_box(Field(0))).unwrap())
        });

        let source = producer.load(Field(0)).unwrap();
        group.bench_function(BenchmarkId::new("get_int", kind), |b| {
            b.iter(|| {
                let mut sum = 0i64;
                for doc in 0..DOCS as u32 {
                    sum = sum.wrapping_add(source.get_int(doc).unwrap());
                }
                black_box(sum)
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_write, bench_read);
criterion_main!(benches);
