//! CSV reader
//!
//! Thin wrapper that drives the scanner over a line source, consuming an
//! optional header row and producing bound records or a whole document.

use crate::scanner::Scanner;
use crate::source::{LineSource, StringSource};
use crate::{Error, Result};
use csvbind_core::{CsvDocument, CsvFormat, Header, Record};
use std::sync::Arc;
use tracing::debug;

/// Reader for CSV streams
#[derive(Debug, Clone)]
pub struct CsvReader {
    format: CsvFormat,
    has_header: bool,
}

impl CsvReader {
    /// Create a reader with the default format and a header row
    pub fn new() -> Self {
        Self {
            format: CsvFormat::default(),
            has_header: true,
        }
    }

    /// Set the format to tokenize with
    pub fn with_format(mut self, format: CsvFormat) -> Self {
        self.format = format;
        self
    }

    /// Configure whether the first record is a header row
    pub fn has_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    /// Read an entire document from a string
    ///
    /// # Errors
    ///
    /// Returns the first format violation encountered.
    pub fn read_str(&self, text: &str) -> Result<CsvDocument> {
        let mut source = StringSource::new(text);
        self.read(&mut source)
    }

    /// Read an entire document from a line source
    ///
    /// # Errors
    ///
    /// Returns the first format violation or IO error encountered.
    pub fn read(&self, source: &mut dyn LineSource) -> Result<CsvDocument> {
        let mut scanner = Scanner::new(self.format.clone());

        let mut doc = if self.has_header {
            match scanner.parse_next(source)? {
                Some(columns) => {
                    let header = Arc::new(Header::new(columns, self.format.clone()));
                    CsvDocument::with_header(header)
                }
                None => return Ok(CsvDocument::new(self.format.clone())),
            }
        } else {
            CsvDocument::new(self.format.clone())
        };

        while let Some(fields) = scanner.parse_next(source)? {
            doc.append_values(fields)?;
        }
        debug!(rows = doc.len(), "finished reading CSV document");
        Ok(doc)
    }

    /// Iterate records from a line source without collecting them
    pub fn records<'a>(&self, source: &'a mut dyn LineSource) -> RecordIter<'a> {
        RecordIter {
            scanner: Scanner::new(self.format.clone()),
            source,
            format: self.format.clone(),
            pending_header: self.has_header,
            header: None,
            done: false,
        }
    }
}

impl Default for CsvReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Streaming record iterator over a line source
pub struct RecordIter<'a> {
    scanner: Scanner,
    source: &'a mut dyn LineSource,
    format: CsvFormat,
    pending_header: bool,
    header: Option<Arc<Header>>,
    done: bool,
}

impl RecordIter<'_> {
    /// The header row, available once the first record has been pulled
    pub fn header(&self) -> Option<&Arc<Header>> {
        self.header.as_ref()
    }
}

impl Iterator for RecordIter<'_> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if self.pending_header {
            self.pending_header = false;
            match self.scanner.parse_next(self.source) {
                Ok(Some(columns)) => {
                    self.header = Some(Arc::new(Header::new(columns, self.format.clone())));
                }
                Ok(None) => {
                    self.done = true;
                    return None;
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
        match self.scanner.parse_next(self.source) {
            Ok(Some(fields)) => Some(match &self.header {
                Some(header) => {
                    Record::with_header(fields, Arc::clone(header)).map_err(Error::from)
                }
                None => Ok(Record::new(fields, self.format.clone())),
            }),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
