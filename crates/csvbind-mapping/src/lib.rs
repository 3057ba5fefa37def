//! # csvbind-mapping
//!
//! Typed conversion engine: turns values of mapped types into flat
//! header/value rows and back.
//!
//! Types describe themselves through a [`TypeSchema`] descriptor and the
//! [`Mappable`] trait. The node builder expands a descriptor (including
//! nested object types, up to a configured depth and with reference-loop
//! detection) into a tree of property nodes; the flattening engine projects
//! the tree onto an ordered column/value list, and the unflattening engine
//! rebuilds a value tree from a flat row using a stack-based matching pass.
//! Scalar leaves go through pluggable [`ValueConverter`]s.

pub mod convert;
pub mod engine;
pub mod flatten;
pub mod nodes;
pub mod options;
pub mod schema;
pub mod unflatten;
pub mod value;

pub use convert::{DefaultConverter, DefaultGuesser, TypeGuesser, ValueConverter};
pub use engine::CsvConverter;
pub use flatten::flatten;
pub use nodes::{build_nodes, PropertyNode};
pub use unflatten::{read_collection_run, unflatten, validate_exact};
pub use options::{
    CollectionHandling, ConvertOptions, LoopPolicy, NamingConvention, NestedHandling,
};
pub use schema::{FieldKind, FieldSchema, Mappable, MemberKind, SchemaFn, TypeSchema};
pub use value::{FieldValue, ScalarType, StructValue};

use thiserror::Error;

/// Errors that can occur while converting between rows and typed values
#[derive(Error, Debug)]
pub enum Error {
    /// MatchExact validation: a row column has no mapped counterpart
    #[error("Field '{name}' not found")]
    FieldNotFound { name: String },

    /// A mapped leaf's column is absent from the row
    #[error("Column '{column}' is missing from the row")]
    MissingColumn { column: String },

    /// A cell's text does not parse as the declared scalar type
    #[error("Type mismatch: expected {expected}, got '{text}'")]
    TypeMismatch { expected: String, text: String },

    /// No converter could produce a string for the value
    #[error("Cannot serialize value to type {type_name}")]
    CannotSerialize { type_name: String },

    /// No converter could decode a cell for the target type
    #[error("No converter available for type {type_name}")]
    NoConverter { type_name: String },

    /// An explicitly bound converter name is not registered
    #[error("No converter registered under name '{name}'")]
    UnknownConverter { name: String },

    /// Nested expansion went past the configured depth bound
    #[error("Nested object depth {depth} exceeds the configured maximum of {max}")]
    DepthExceeded { depth: usize, max: usize },

    /// A nested member's type already appears in its own ancestor chain
    #[error("Reference loop detected on type {type_name}")]
    ReferenceLoop { type_name: String },

    /// A collection or tuple leaf was reached without collection handling
    #[error("Collection handling is required to map '{column}'")]
    CollectionRequired { column: String },

    /// Usage error: the collection tag is empty
    #[error("Collection tag must not be empty")]
    EmptyTag,

    /// Shape error reported by a `Mappable` implementation
    #[error("Mapping error: {0}")]
    Mapping(String),

    #[error(transparent)]
    Core(#[from] csvbind_core::Error),

    #[error(transparent)]
    Parse(#[from] csvbind_parser::Error),
}

impl Error {
    /// Build a type-mismatch error.
    pub fn type_mismatch(expected: impl Into<String>, text: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            text: text.into(),
        }
    }

    /// Build a shape error for a `Mappable` implementation.
    pub fn mapping(message: impl Into<String>) -> Self {
        Self::Mapping(message.into())
    }
}

/// Crate-local result type for conversion operations.
pub type Result<T> = std::result::Result<T, Error>;
