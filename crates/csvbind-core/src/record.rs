//! Record model
//!
//! A record is an ordered, fixed-length sequence of field strings, optionally
//! bound to a shared header. Records are immutable after construction; edits
//! go through [`RecordBuilder`], which owns a copy of the backing storage and
//! produces a fresh record on completion.

use crate::format::CsvFormat;
use crate::header::Header;
use crate::{Error, Result};
use std::sync::Arc;

/// One row of field values
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    values: Vec<String>,
    header: Option<Arc<Header>>,
    format: CsvFormat,
}

impl Record {
    /// Create a header-less record
    pub fn new(values: Vec<String>, format: CsvFormat) -> Self {
        Self {
            values,
            header: None,
            format,
        }
    }

    /// Create a record bound to a shared header.
    ///
    /// # Errors
    ///
    /// Returns an error if the value count differs from the header width.
    pub fn with_header(values: Vec<String>, header: Arc<Header>) -> Result<Self> {
        if values.len() != header.len() {
            return Err(Error::HeaderMismatch {
                expected: header.len(),
                actual: values.len(),
            });
        }
        let format = header.format().clone();
        Ok(Self {
            values,
            header: Some(header),
            format,
        })
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the record has no fields
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Field value at the given position
    pub fn get(&self, index: usize) -> Option<&str> {
        self.values.get(index).map(String::as_str)
    }

    /// Field value under the given column name, resolved through the header
    pub fn field(&self, name: &str) -> Option<&str> {
        let header = self.header.as_ref()?;
        self.get(header.index_of(name)?)
    }

    /// All field values in order
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Consume the record, returning its backing storage
    pub fn into_values(self) -> Vec<String> {
        self.values
    }

    /// The header this record is bound to, if any
    pub fn header(&self) -> Option<&Arc<Header>> {
        self.header.as_ref()
    }

    /// The format this record was produced with
    pub fn format(&self) -> &CsvFormat {
        &self.format
    }

    /// Start an edit session over a copy of this record's fields
    pub fn to_builder(&self) -> RecordBuilder {
        RecordBuilder {
            values: self.values.clone(),
            header: self.header.clone(),
            format: self.format.clone(),
        }
    }
}

/// Owned-copy editor for a record.
///
/// The builder never aliases the record it was created from; `build` validates
/// the header invariant and produces a new immutable record.
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    values: Vec<String>,
    header: Option<Arc<Header>>,
    format: CsvFormat,
}

impl RecordBuilder {
    /// Replace the field at the given position
    ///
    /// # Errors
    ///
    /// Returns an error if the index is out of range.
    pub fn set(&mut self, index: usize, value: impl Into<String>) -> Result<&mut Self> {
        let len = self.values.len();
        let slot = self
            .values
            .get_mut(index)
            .ok_or(Error::IndexOutOfRange { index, len })?;
        *slot = value.into();
        Ok(self)
    }

    /// Replace the field under the given column name
    ///
    /// # Errors
    ///
    /// Returns an error if the record is header-less or the column is unknown.
    pub fn set_field(&mut self, name: &str, value: impl Into<String>) -> Result<&mut Self> {
        let index = self
            .header
            .as_ref()
            .and_then(|h| h.index_of(name))
            .ok_or_else(|| Error::unknown_column(name))?;
        self.set(index, value)
    }

    /// Append a field to a header-less record
    ///
    /// # Errors
    ///
    /// Returns an error if the record is bound to a header, since appending
    /// would break the width invariant.
    pub fn push(&mut self, value: impl Into<String>) -> Result<&mut Self> {
        if let Some(header) = &self.header {
            return Err(Error::HeaderMismatch {
                expected: header.len(),
                actual: self.values.len() + 1,
            });
        }
        self.values.push(value.into());
        Ok(self)
    }

    /// Remove a field from a header-less record
    ///
    /// # Errors
    ///
    /// Returns an error if the record is bound to a header or the index is
    /// out of range.
    pub fn remove(&mut self, index: usize) -> Result<String> {
        if let Some(header) = &self.header {
            return Err(Error::HeaderMismatch {
                expected: header.len(),
                actual: self.values.len().saturating_sub(1),
            });
        }
        if index >= self.values.len() {
            return Err(Error::IndexOutOfRange {
                index,
                len: self.values.len(),
            });
        }
        Ok(self.values.remove(index))
    }

    /// Produce the edited record
    ///
    /// # Errors
    ///
    /// Returns an error if the field count no longer matches a bound header.
    pub fn build(self) -> Result<Record> {
        match self.header {
            Some(header) => Record::with_header(self.values, header),
            None => Ok(Record::new(self.values, self.format)),
        }
    }
}
