//! Docvalues - adaptive per-document value storage for index segments
//!
//! Every field of a segment stores exactly one value per document. The
//! writer scans each field once and picks the cheapest layout:
//! - Constant: one value shared by all documents
//! - Table: up to 256 distinct values, fixed-width ordinals at 1/2/4/8 bits
//! - Uncompressed: one signed byte per document
//! - Delta: block-wise frame of reference for high-cardinality fields
//! - Indirect: doc id list plus a nested encoding for very sparse fields
//!
//! Byte-string fields are stored as addressed payloads or as a sorted
//! dictionary with per-document ordinals. Values live in a checksummed
//! metadata/data file pair, read back through lazily cached [`Source`]s.

pub mod codec;
pub mod config;
pub mod directories;
pub mod error;
pub mod norms;
pub mod packed;
pub mod schema;
pub mod segment;
pub mod source;
pub mod store;
pub mod values;

pub use config::DocValuesFormatConfig;

// Re-exports from directories
#[cfg(feature = "native")]
pub use directories::FsDirectory;
pub use directories::{
    Directory, DirectoryWriter, OwnedBytes, RamDirectory, StreamingWriter,
};

pub use error::{Error, Result};

// Re-exports from norms
pub use norms::{DocValuesBuilder, DocValuesConsumer, DocValuesProducer, NormMap, Strategy};

pub use schema::{Field, FieldEntry, Schema, SchemaBuilder, ValueType};

pub use segment::{SegmentId, SegmentMeta, SegmentReadState, SegmentState, SegmentWriteState};

// Re-exports from source
pub use source::{DocValues, LookupResult, SortedSource, Source, ValuesEnum};

pub use values::{BytesValues, FloatValues, MergeSource, NumericValues};

pub type DocId = u32;
