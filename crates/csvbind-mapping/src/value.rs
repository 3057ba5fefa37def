//! Dynamic value model for the conversion engine
//!
//! Mapped types project themselves into [`FieldValue`] trees during
//! serialization and are rebuilt from them during deserialization. The model
//! covers the shapes flat tabular rows support: scalars, one level of
//! homogeneous collections, and nested structs.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use std::net::IpAddr;
use uuid::Uuid;

/// Built-in scalar types the converters understand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    Bool,
    Integer,
    Float,
    Text,
    Date,
    Time,
    DateTime,
    Uuid,
    Ip,
}

impl std::fmt::Display for ScalarType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Bool => "bool",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Text => "text",
            Self::Date => "date",
            Self::Time => "time",
            Self::DateTime => "datetime",
            Self::Uuid => "uuid",
            Self::Ip => "ip",
        };
        write!(f, "{label}")
    }
}

/// A dynamically typed field value
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Absent/empty value
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(DateTime<Utc>),
    Uuid(Uuid),
    Ip(IpAddr),
    /// One level of homogeneous collection
    List(Vec<FieldValue>),
    /// A nested object
    Struct(StructValue),
}

impl FieldValue {
    /// Whether this is the null value
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The scalar type of this value, when it is a scalar
    pub fn scalar_type(&self) -> Option<ScalarType> {
        match self {
            Self::Bool(_) => Some(ScalarType::Bool),
            Self::Integer(_) => Some(ScalarType::Integer),
            Self::Float(_) => Some(ScalarType::Float),
            Self::Text(_) => Some(ScalarType::Text),
            Self::Date(_) => Some(ScalarType::Date),
            Self::Time(_) => Some(ScalarType::Time),
            Self::DateTime(_) => Some(ScalarType::DateTime),
            Self::Uuid(_) => Some(ScalarType::Uuid),
            Self::Ip(_) => Some(ScalarType::Ip),
            Self::Null | Self::List(_) | Self::Struct(_) => None,
        }
    }

    /// Short label for diagnostics
    pub fn type_label(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::Date(_) => "date",
            Self::Time(_) => "time",
            Self::DateTime(_) => "datetime",
            Self::Uuid(_) => "uuid",
            Self::Ip(_) => "ip",
            Self::List(_) => "list",
            Self::Struct(_) => "struct",
        }
    }

    /// The bool payload, if any
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The integer payload, if any
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// The float payload, if any
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// The text payload, if any
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// The date payload, if any
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// The list payload, if any
    pub fn as_list(&self) -> Option<&[FieldValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// The struct payload, if any
    pub fn as_struct(&self) -> Option<&StructValue> {
        match self {
            Self::Struct(s) => Some(s),
            _ => None,
        }
    }

    /// Consume the value, returning the struct payload if any
    pub fn into_struct(self) -> Option<StructValue> {
        match self {
            Self::Struct(s) => Some(s),
            _ => None,
        }
    }

    /// Consume the value, returning the list payload if any
    pub fn into_list(self) -> Option<Vec<FieldValue>> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        Self::Integer(i64::from(v))
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(v: NaiveDate) -> Self {
        Self::Date(v)
    }
}

impl From<NaiveTime> for FieldValue {
    fn from(v: NaiveTime) -> Self {
        Self::Time(v)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(v: DateTime<Utc>) -> Self {
        Self::DateTime(v)
    }
}

impl From<Uuid> for FieldValue {
    fn from(v: Uuid) -> Self {
        Self::Uuid(v)
    }
}

impl From<IpAddr> for FieldValue {
    fn from(v: IpAddr) -> Self {
        Self::Ip(v)
    }
}

impl From<StructValue> for FieldValue {
    fn from(v: StructValue) -> Self {
        Self::Struct(v)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(value) => value.into(),
            None => Self::Null,
        }
    }
}

impl<T: Into<FieldValue>> From<Vec<T>> for FieldValue {
    fn from(v: Vec<T>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}

/// A nested object value: ordered (member name, value) pairs plus the type
/// name used for reference-loop diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct StructValue {
    type_name: String,
    fields: Vec<(String, FieldValue)>,
}

impl StructValue {
    /// Create an empty struct value
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: Vec::new(),
        }
    }

    /// The declaring type's name
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Add a member, builder-style
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.set(name, value);
        self
    }

    /// Set a member, replacing any existing value under the same name
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        let name = name.into();
        let value = value.into();
        if let Some(slot) = self.fields.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        } else {
            self.fields.push((name, value));
        }
    }

    /// Read a member
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Remove and return a member
    pub fn take(&mut self, name: &str) -> Option<FieldValue> {
        let index = self.fields.iter().position(|(n, _)| n == name)?;
        Some(self.fields.remove(index).1)
    }

    /// Iterate members in insertion order
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Number of members
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the struct has no members
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_type_mapping() {
        assert_eq!(FieldValue::Bool(true).scalar_type(), Some(ScalarType::Bool));
        assert_eq!(
            FieldValue::Integer(1).scalar_type(),
            Some(ScalarType::Integer)
        );
        assert_eq!(FieldValue::Null.scalar_type(), None);
        assert_eq!(FieldValue::List(vec![]).scalar_type(), None);
    }

    #[test]
    fn test_from_impls() {
        assert_eq!(FieldValue::from(42), FieldValue::Integer(42));
        assert_eq!(FieldValue::from("x"), FieldValue::Text("x".to_string()));
        assert_eq!(FieldValue::from(None::<i64>), FieldValue::Null);
        assert_eq!(
            FieldValue::from(vec![1, 2]),
            FieldValue::List(vec![FieldValue::Integer(1), FieldValue::Integer(2)])
        );
    }

    #[test]
    fn test_struct_value_members() {
        let mut value = StructValue::new("Product")
            .with_field("Name", "Keyboard")
            .with_field("Price", 19.99);

        assert_eq!(value.type_name(), "Product");
        assert_eq!(value.len(), 2);
        assert_eq!(
            value.get("Name"),
            Some(&FieldValue::Text("Keyboard".to_string()))
        );

        value.set("Name", "Mouse");
        assert_eq!(value.len(), 2);
        assert_eq!(
            value.take("Name"),
            Some(FieldValue::Text("Mouse".to_string()))
        );
        assert_eq!(value.get("Name"), None);
    }

    #[test]
    fn test_struct_value_preserves_order() {
        let value = StructValue::new("T")
            .with_field("b", 1)
            .with_field("a", 2)
            .with_field("c", 3);
        let names: Vec<&str> = value.fields().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }
}
