//! CSV writer
//!
//! Drives the formatter over an `io::Write` sink, emitting the optional
//! header row first and one line per record.

use crate::formatter::Formatter;
use crate::Result;
use csvbind_core::{CsvDocument, CsvFormat};
use std::io::Write;
use tracing::{debug, trace};

/// Line ending used between written records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    /// Unix-style line feed (\n)
    LF,
    /// Windows-style carriage return + line feed (\r\n)
    CRLF,
    /// Platform native
    Native,
}

impl LineEnding {
    /// Get the line ending as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            LineEnding::LF => "\n",
            LineEnding::CRLF => "\r\n",
            LineEnding::Native => {
                if cfg!(windows) {
                    "\r\n"
                } else {
                    "\n"
                }
            }
        }
    }
}

/// Writer for CSV streams
#[derive(Debug, Clone)]
pub struct CsvWriter {
    format: CsvFormat,
    line_ending: LineEnding,
    write_header: bool,
}

impl CsvWriter {
    /// Create a writer with the default format and native line endings
    pub fn new() -> Self {
        Self {
            format: CsvFormat::default(),
            line_ending: LineEnding::Native,
            write_header: true,
        }
    }

    /// Set the format to write with
    pub fn with_format(mut self, format: CsvFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the line ending between records
    pub fn with_line_ending(mut self, line_ending: LineEnding) -> Self {
        self.line_ending = line_ending;
        self
    }

    /// Configure whether the document header is written first
    pub fn write_header(mut self, write_header: bool) -> Self {
        self.write_header = write_header;
        self
    }

    /// Write a document to the sink
    ///
    /// # Errors
    ///
    /// Returns an error when the sink fails.
    pub fn write<W: Write>(&self, mut writer: W, doc: &CsvDocument) -> Result<()> {
        let formatter = Formatter::new(self.format.clone());
        let ending = self.line_ending.as_str();

        if self.write_header {
            if let Some(header) = doc.header() {
                let line = formatter.to_line(header.columns());
                writer.write_all(line.as_bytes())?;
                writer.write_all(ending.as_bytes())?;
            }
        }

        for record in doc {
            let line = formatter.to_line(record.values());
            trace!(?line, "wrote CSV row");
            writer.write_all(line.as_bytes())?;
            writer.write_all(ending.as_bytes())?;
        }

        writer.flush()?;
        debug!(rows = doc.len(), "finished writing CSV document");
        Ok(())
    }

    /// Write raw rows to the sink, without a header
    ///
    /// # Errors
    ///
    /// Returns an error when the sink fails.
    pub fn write_rows<W: Write>(&self, mut writer: W, rows: &[Vec<String>]) -> Result<()> {
        let formatter = Formatter::new(self.format.clone());
        let ending = self.line_ending.as_str();

        for row in rows {
            let line = formatter.to_line(row);
            writer.write_all(line.as_bytes())?;
            writer.write_all(ending.as_bytes())?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Render a document to a string
    ///
    /// # Errors
    ///
    /// Never fails for an in-memory sink; kept fallible for symmetry with
    /// [`CsvWriter::write`].
    pub fn to_string(&self, doc: &CsvDocument) -> Result<String> {
        let mut buffer = Vec::new();
        self.write(&mut buffer, doc)?;
        Ok(String::from_utf8(buffer).expect("formatter emits valid UTF-8"))
    }
}

impl Default for CsvWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::CsvReader;

    #[test]
    fn test_write_document_with_header() {
        let doc = CsvReader::new()
            .read_str("name,age\nHomer,35\nMarge,28\n")
            .unwrap();

        let writer = CsvWriter::new().with_line_ending(LineEnding::LF);
        let output = writer.to_string(&doc).unwrap();
        assert_eq!(output, "name,age\nHomer,35\nMarge,28\n");
    }

    #[test]
    fn test_write_without_header() {
        let doc = CsvReader::new().read_str("name\nHomer\n").unwrap();

        let writer = CsvWriter::new()
            .with_line_ending(LineEnding::LF)
            .write_header(false);
        let output = writer.to_string(&doc).unwrap();
        assert_eq!(output, "Homer\n");
    }

    #[test]
    fn test_write_quoted_fields() {
        let rows = vec![vec!["Item, with comma".to_string(), "10.99".to_string()]];

        let writer = CsvWriter::new().with_line_ending(LineEnding::LF);
        let mut output = Vec::new();
        writer.write_rows(&mut output, &rows).unwrap();

        let result = String::from_utf8(output).unwrap();
        assert_eq!(result, "\"Item, with comma\",10.99\n");
    }

    #[test]
    fn test_crlf_line_ending() {
        let rows = vec![vec!["a".to_string()], vec!["b".to_string()]];

        let writer = CsvWriter::new().with_line_ending(LineEnding::CRLF);
        let mut output = Vec::new();
        writer.write_rows(&mut output, &rows).unwrap();

        assert_eq!(String::from_utf8(output).unwrap(), "a\r\nb\r\n");
    }

    #[test]
    fn test_round_trip_through_writer_and_reader() {
        let input = "name,quote\nFrida,\"Frida \"\"The Painter\"\"\"\n";
        let doc = CsvReader::new().read_str(input).unwrap();
        assert_eq!(
            doc.get(0).unwrap().field("quote"),
            Some("Frida \"The Painter\"")
        );

        let writer = CsvWriter::new().with_line_ending(LineEnding::LF);
        let output = writer.to_string(&doc).unwrap();
        let reparsed = CsvReader::new().read_str(&output).unwrap();
        assert_eq!(
            reparsed.get(0).unwrap().field("quote"),
            Some("Frida \"The Painter\"")
        );
    }
}
