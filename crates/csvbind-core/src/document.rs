//! In-memory CSV document
//!
//! A document is an ordered collection of records that all share one header
//! (or none). Every mutation re-checks the header width invariant, so a
//! document can never hold a row whose field count disagrees with its header.

use crate::format::CsvFormat;
use crate::header::Header;
use crate::record::Record;
use crate::{Error, Result};
use std::sync::Arc;
use tracing::trace;

/// Ordered collection of records with optional shared header
#[derive(Debug, Clone)]
pub struct CsvDocument {
    header: Option<Arc<Header>>,
    rows: Vec<Record>,
    format: CsvFormat,
}

impl CsvDocument {
    /// Create an empty header-less document
    pub fn new(format: CsvFormat) -> Self {
        Self {
            header: None,
            rows: Vec::new(),
            format,
        }
    }

    /// Create an empty document bound to a header
    pub fn with_header(header: Arc<Header>) -> Self {
        let format = header.format().clone();
        Self {
            header: Some(header),
            rows: Vec::new(),
            format,
        }
    }

    /// The shared header, if any
    pub fn header(&self) -> Option<&Arc<Header>> {
        self.header.as_ref()
    }

    /// The format shared by the document's rows
    pub fn format(&self) -> &CsvFormat {
        &self.format
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the document has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All rows in order
    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    /// Row at the given position
    pub fn get(&self, index: usize) -> Option<&Record> {
        self.rows.get(index)
    }

    /// Iterate over the rows in order
    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.rows.iter()
    }

    /// Append a row
    ///
    /// # Errors
    ///
    /// Returns an error if the row width disagrees with the document header.
    pub fn append(&mut self, record: Record) -> Result<()> {
        let record = self.bind(record)?;
        trace!(row = self.rows.len(), fields = record.len(), "appended row");
        self.rows.push(record);
        Ok(())
    }

    /// Append a row built from raw values
    ///
    /// # Errors
    ///
    /// Returns an error if the value count disagrees with the document header.
    pub fn append_values(&mut self, values: Vec<String>) -> Result<()> {
        self.append(Record::new(values, self.format.clone()))
    }

    /// Insert a row at the given position
    ///
    /// # Errors
    ///
    /// Returns an error if the index is past the end or the row width
    /// disagrees with the document header.
    pub fn insert(&mut self, index: usize, record: Record) -> Result<()> {
        if index > self.rows.len() {
            return Err(Error::IndexOutOfRange {
                index,
                len: self.rows.len(),
            });
        }
        let record = self.bind(record)?;
        self.rows.insert(index, record);
        Ok(())
    }

    /// Replace the row at the given position, returning the previous row
    ///
    /// # Errors
    ///
    /// Returns an error if the index is out of range or the row width
    /// disagrees with the document header.
    pub fn update(&mut self, index: usize, record: Record) -> Result<Record> {
        if index >= self.rows.len() {
            return Err(Error::IndexOutOfRange {
                index,
                len: self.rows.len(),
            });
        }
        let record = self.bind(record)?;
        Ok(std::mem::replace(&mut self.rows[index], record))
    }

    /// Remove and return the row at the given position
    ///
    /// # Errors
    ///
    /// Returns an error if the index is out of range.
    pub fn remove(&mut self, index: usize) -> Result<Record> {
        if index >= self.rows.len() {
            return Err(Error::IndexOutOfRange {
                index,
                len: self.rows.len(),
            });
        }
        Ok(self.rows.remove(index))
    }

    /// Rebind an incoming row to the document header, enforcing the width
    /// invariant.
    fn bind(&self, record: Record) -> Result<Record> {
        match &self.header {
            Some(header) => Record::with_header(record.into_values(), Arc::clone(header)),
            None => Ok(record),
        }
    }
}

impl<'a> IntoIterator for &'a CsvDocument {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| (*s).to_string()).collect()
    }

    fn document(names: &[&str]) -> CsvDocument {
        let header = Arc::new(Header::new(strings(names), CsvFormat::default()));
        CsvDocument::with_header(header)
    }

    #[test]
    fn test_append_and_get() {
        let mut doc = document(&["name", "age"]);
        doc.append_values(strings(&["Homer", "35"])).unwrap();
        doc.append_values(strings(&["Marge", "28"])).unwrap();

        assert_eq!(doc.len(), 2);
        assert_eq!(doc.get(0).unwrap().field("name"), Some("Homer"));
        assert_eq!(doc.get(1).unwrap().field("age"), Some("28"));
    }

    #[test]
    fn test_append_enforces_width() {
        let mut doc = document(&["name", "age"]);
        let result = doc.append_values(strings(&["Homer"]));
        assert!(matches!(result, Err(Error::HeaderMismatch { .. })));
        assert!(doc.is_empty());
    }

    #[test]
    fn test_append_rebinds_headerless_record() {
        let mut doc = document(&["name", "age"]);
        let row = Record::new(strings(&["Homer", "35"]), CsvFormat::default());
        doc.append(row).unwrap();
        // The stored row resolves names through the document header.
        assert_eq!(doc.get(0).unwrap().field("age"), Some("35"));
    }

    #[test]
    fn test_insert_update_remove() {
        let mut doc = document(&["name"]);
        doc.append_values(strings(&["a"])).unwrap();
        doc.append_values(strings(&["c"])).unwrap();

        doc.insert(1, Record::new(strings(&["b"]), CsvFormat::default()))
            .unwrap();
        assert_eq!(doc.len(), 3);
        assert_eq!(doc.get(1).unwrap().get(0), Some("b"));

        let old = doc
            .update(0, Record::new(strings(&["z"]), CsvFormat::default()))
            .unwrap();
        assert_eq!(old.get(0), Some("a"));
        assert_eq!(doc.get(0).unwrap().get(0), Some("z"));

        let removed = doc.remove(2).unwrap();
        assert_eq!(removed.get(0), Some("c"));
        assert_eq!(doc.len(), 2);
    }

    #[test]
    fn test_out_of_range_mutations() {
        let mut doc = document(&["name"]);
        assert!(doc.remove(0).is_err());
        assert!(
            doc.update(0, Record::new(strings(&["x"]), CsvFormat::default()))
                .is_err()
        );
        assert!(
            doc.insert(1, Record::new(strings(&["x"]), CsvFormat::default()))
                .is_err()
        );
    }

    #[test]
    fn test_headerless_document_accepts_ragged_rows() {
        let mut doc = CsvDocument::new(CsvFormat::default());
        doc.append_values(strings(&["a"])).unwrap();
        doc.append_values(strings(&["b", "c"])).unwrap();
        assert_eq!(doc.len(), 2);
    }
}
