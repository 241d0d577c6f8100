//! Adaptive per-document value storage.
//!
//! Each field's stream is scanned once by the classifier, which picks the
//! cheapest of five numeric layouts (const, table, uncompressed, delta,
//! indirect); byte-string fields are stored as an addressed payload or as
//! a sorted dictionary with per-document ordinals.

mod builder;
mod classifier;
mod consumer;
mod entry;
mod format;
mod norm_map;
mod producer;

pub use builder::DocValuesBuilder;
pub use classifier::FieldStats;
pub use consumer::DocValuesConsumer;
pub use entry::{FieldMeta, NumericEntry};
pub use format::*;
pub use norm_map::NormMap;
pub use producer::DocValuesProducer;
