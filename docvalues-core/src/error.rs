//! Error types for docvalues

use std::io;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Field not found: {0}")]
    FieldNotFound(String),

    #[error("Invalid field type: expected {expected}, got {got}")]
    InvalidFieldType { expected: String, got: String },

    #[error("Index corruption: {0}")]
    Corruption(String),

    #[error("Illegal doc values data for field {field}: got null for document {doc}")]
    IllegalState { field: String, doc: u32 },

    #[error("Unsupported operation: {0}")]
    Unsupported(&'static str),

    #[error("Document not found: {0}")]
    DocumentNotFound(u32),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Writer is already closed")]
    AlreadyClosed,

    #[error("Output discarded after a failed write: {0}")]
    Discarded(String),
}

pub type Result<T> = std::result::Result<T, Error>;
