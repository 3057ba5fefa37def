//! Runtime schema descriptors for mapped types
//!
//! Instead of runtime reflection, each mapped type declares its members once
//! through a [`TypeSchema`] and projects its values through the [`Mappable`]
//! trait. Nested member schemas are referenced lazily through a function
//! pointer so that self-referencing types can still describe themselves; the
//! node builder bounds the expansion.

use crate::value::{ScalarType, StructValue};
use crate::Result;

/// Lazy reference to a nested member's schema
pub type SchemaFn = fn() -> TypeSchema;

/// Whether a member is an accessor-backed property or a bare field.
///
/// Bare fields take part in mapping only when `include_fields` is set on the
/// conversion options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Property,
    Field,
}

/// The declared shape of one member
#[derive(Debug, Clone)]
pub enum FieldKind {
    /// A built-in scalar
    Scalar(ScalarType),
    /// One level of homogeneous collection
    Collection(ScalarType),
    /// A fixed-arity tuple of scalars
    Tuple(Vec<ScalarType>),
    /// A nested object type
    Nested(SchemaFn),
    /// A dynamically typed member, decoded through type guessers
    Dynamic,
}

/// Descriptor of one mapped member
#[derive(Debug, Clone)]
pub struct FieldSchema {
    name: String,
    rename: Option<String>,
    ignore: bool,
    converter: Option<String>,
    member: MemberKind,
    kind: FieldKind,
}

impl FieldSchema {
    fn with_kind(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            rename: None,
            ignore: false,
            converter: None,
            member: MemberKind::Property,
            kind,
        }
    }

    /// Declare a scalar member
    pub fn scalar(name: impl Into<String>, ty: ScalarType) -> Self {
        Self::with_kind(name, FieldKind::Scalar(ty))
    }

    /// Declare a collection member with the given element type
    pub fn collection(name: impl Into<String>, element: ScalarType) -> Self {
        Self::with_kind(name, FieldKind::Collection(element))
    }

    /// Declare a fixed-arity tuple member
    pub fn tuple(name: impl Into<String>, elements: Vec<ScalarType>) -> Self {
        Self::with_kind(name, FieldKind::Tuple(elements))
    }

    /// Declare a nested object member
    pub fn nested(name: impl Into<String>, schema: SchemaFn) -> Self {
        Self::with_kind(name, FieldKind::Nested(schema))
    }

    /// Declare a dynamically typed member
    pub fn dynamic(name: impl Into<String>) -> Self {
        Self::with_kind(name, FieldKind::Dynamic)
    }

    /// Map this member under an explicit column name
    pub fn renamed(mut self, column: impl Into<String>) -> Self {
        self.rename = Some(column.into());
        self
    }

    /// Exclude this member from mapping
    pub fn ignored(mut self) -> Self {
        self.ignore = true;
        self
    }

    /// Bind this member to a named converter
    pub fn with_converter(mut self, name: impl Into<String>) -> Self {
        self.converter = Some(name.into());
        self
    }

    /// Mark this member as a bare field rather than a property
    pub fn as_bare_field(mut self) -> Self {
        self.member = MemberKind::Field;
        self
    }

    /// The member's original name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The explicit column rename, if any
    pub fn rename(&self) -> Option<&str> {
        self.rename.as_deref()
    }

    /// Whether the member is excluded from mapping
    pub fn ignore(&self) -> bool {
        self.ignore
    }

    /// The explicitly bound converter name, if any
    pub fn converter(&self) -> Option<&str> {
        self.converter.as_deref()
    }

    /// Property or bare field
    pub fn member(&self) -> MemberKind {
        self.member
    }

    /// The declared shape
    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }
}

/// Descriptor of a mapped type: its name and ordered members
#[derive(Debug, Clone)]
pub struct TypeSchema {
    type_name: String,
    fields: Vec<FieldSchema>,
}

impl TypeSchema {
    /// Create an empty descriptor
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: Vec::new(),
        }
    }

    /// Add a member, builder-style
    pub fn field(mut self, field: FieldSchema) -> Self {
        self.fields.push(field);
        self
    }

    /// The declaring type's name
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The ordered member descriptors
    pub fn fields(&self) -> &[FieldSchema] {
        &self.fields
    }
}

/// A type that can be mapped to and from flat CSV rows.
///
/// Implementations declare their members once in [`Mappable::type_schema`]
/// and move values across the dynamic model in the two projection methods.
pub trait Mappable: Sized {
    /// The member descriptor for this type
    fn type_schema() -> TypeSchema;

    /// Project this value into the dynamic model
    fn to_struct(&self) -> StructValue;

    /// Rebuild a value from the dynamic model
    ///
    /// # Errors
    ///
    /// Returns a mapping error when a member is absent or has the wrong shape.
    fn from_struct(value: StructValue) -> Result<Self>;
}
