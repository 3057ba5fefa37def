#![deny(warnings)]
#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]

//! # csvbind-core
//!
//! Core data model for csvbind: the immutable CSV format descriptor, the
//! header/record view of one row, source positions for diagnostics, and the
//! in-memory document collection.
//!
//! This crate holds no parsing logic; the tokenizer and formatter live in
//! `csvbind-parser`, and typed conversion lives in `csvbind-mapping`.

/// In-memory ordered row collection bound to an optional header.
pub mod document;
/// Immutable CSV dialect descriptor and quoting policy.
pub mod format;
/// Named column schema shared by records.
pub mod header;
/// Line/offset positions used in diagnostics.
pub mod position;
/// One row of fields, with lookup by index or column name.
pub mod record;

/// Primary document type.
pub use document::CsvDocument;
/// Dialect descriptor and quoting policy.
pub use format::{CsvFormat, QuoteStyle};
/// Column schema type.
pub use header::Header;
/// Diagnostic position type.
pub use position::Position;
/// Row type and its mutate-and-rebuild builder.
pub use record::{Record, RecordBuilder};

use thiserror::Error;

/// Errors that can occur when working with the core model
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid format: {reason}")]
    InvalidFormat { reason: String },

    #[error("Record has {actual} fields but the header defines {expected} columns")]
    HeaderMismatch { expected: usize, actual: usize },

    #[error("Index {index} is out of range for a record of {len} fields")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Unknown column '{name}'")]
    UnknownColumn { name: String },
}

impl Error {
    /// Build an invalid-format error with a reason.
    pub fn invalid_format(reason: impl Into<String>) -> Self {
        Self::InvalidFormat {
            reason: reason.into(),
        }
    }

    /// Build an unknown-column error.
    pub fn unknown_column(name: impl Into<String>) -> Self {
        Self::UnknownColumn { name: name.into() }
    }
}

/// Crate-local result type for core model operations.
pub type Result<T> = std::result::Result<T, Error>;
