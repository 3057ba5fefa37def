//! Line-oriented input sources for the scanner

use crate::{Error, Result};
use std::io::{BufRead, Seek, SeekFrom};

/// A line-oriented character source.
///
/// The scanner pulls one physical line at a time; line terminators are
/// stripped before the line is handed over. A source either supports
/// rewinding to its start or reports that explicitly.
pub trait LineSource {
    /// Pull the next physical line, without its terminator. `None` signals
    /// end of stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying read fails.
    fn read_line(&mut self) -> std::io::Result<Option<String>>;

    /// Rewind to the start of the source.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ResetUnsupported`] when the source cannot seek.
    fn reset(&mut self) -> Result<()>;
}

/// In-memory source over a string slice
#[derive(Debug, Clone)]
pub struct StringSource {
    lines: Vec<String>,
    next: usize,
}

impl StringSource {
    /// Split a text into physical lines. A trailing newline terminates the
    /// last line rather than opening an empty one.
    pub fn new(text: &str) -> Self {
        if text.is_empty() {
            return Self {
                lines: Vec::new(),
                next: 0,
            };
        }
        let mut lines: Vec<String> = text
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
            .collect();
        if text.ends_with('\n') {
            lines.pop();
        }
        Self { lines, next: 0 }
    }
}

impl LineSource for StringSource {
    fn read_line(&mut self) -> std::io::Result<Option<String>> {
        match self.lines.get(self.next) {
            Some(line) => {
                self.next += 1;
                Ok(Some(line.clone()))
            }
            None => Ok(None),
        }
    }

    fn reset(&mut self) -> Result<()> {
        self.next = 0;
        Ok(())
    }
}

/// Source over any buffered reader. Does not support resetting.
#[derive(Debug)]
pub struct ReadSource<R: BufRead> {
    inner: R,
}

impl<R: BufRead> ReadSource<R> {
    /// Wrap a buffered reader
    pub fn new(inner: R) -> Self {
        Self { inner }
    }
}

impl<R: BufRead> LineSource for ReadSource<R> {
    fn read_line(&mut self) -> std::io::Result<Option<String>> {
        read_one_line(&mut self.inner)
    }

    fn reset(&mut self) -> Result<()> {
        Err(Error::ResetUnsupported)
    }
}

/// Source over a seekable buffered reader. Resetting seeks back to the start.
#[derive(Debug)]
pub struct SeekSource<R: BufRead + Seek> {
    inner: R,
}

impl<R: BufRead + Seek> SeekSource<R> {
    /// Wrap a seekable buffered reader
    pub fn new(inner: R) -> Self {
        Self { inner }
    }
}

impl<R: BufRead + Seek> LineSource for SeekSource<R> {
    fn read_line(&mut self) -> std::io::Result<Option<String>> {
        read_one_line(&mut self.inner)
    }

    fn reset(&mut self) -> Result<()> {
        self.inner.seek(SeekFrom::Start(0))?;
        Ok(())
    }
}

fn read_one_line<R: BufRead>(reader: &mut R) -> std::io::Result<Option<String>> {
    let mut line = String::new();
    let read = reader.read_line(&mut line)?;
    if read == 0 {
        return Ok(None);
    }
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    Ok(Some(line))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_string_source_lines() {
        let mut source = StringSource::new("a\r\nb\nc");
        assert_eq!(source.read_line().unwrap(), Some("a".to_string()));
        assert_eq!(source.read_line().unwrap(), Some("b".to_string()));
        assert_eq!(source.read_line().unwrap(), Some("c".to_string()));
        assert_eq!(source.read_line().unwrap(), None);
    }

    #[test]
    fn test_string_source_trailing_newline() {
        let mut source = StringSource::new("a\nb\n");
        assert_eq!(source.read_line().unwrap(), Some("a".to_string()));
        assert_eq!(source.read_line().unwrap(), Some("b".to_string()));
        assert_eq!(source.read_line().unwrap(), None);
    }

    #[test]
    fn test_string_source_reset() {
        let mut source = StringSource::new("a\nb");
        assert_eq!(source.read_line().unwrap(), Some("a".to_string()));
        source.reset().unwrap();
        assert_eq!(source.read_line().unwrap(), Some("a".to_string()));
    }

    #[test]
    fn test_read_source_no_reset() {
        let mut source = ReadSource::new(Cursor::new("a\nb"));
        assert_eq!(source.read_line().unwrap(), Some("a".to_string()));
        assert!(matches!(source.reset(), Err(Error::ResetUnsupported)));
    }

    #[test]
    fn test_seek_source_reset() {
        let mut source = SeekSource::new(Cursor::new("a\nb"));
        assert_eq!(source.read_line().unwrap(), Some("a".to_string()));
        assert_eq!(source.read_line().unwrap(), Some("b".to_string()));
        source.reset().unwrap();
        assert_eq!(source.read_line().unwrap(), Some("a".to_string()));
    }

    #[test]
    fn test_empty_input() {
        let mut source = StringSource::new("");
        assert_eq!(source.read_line().unwrap(), None);
    }

    #[test]
    fn test_seek_source_over_file() {
        use std::io::{BufReader, Write};

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "name,age\nHomer,35\n").unwrap();

        let reopened = std::fs::File::open(file.path()).unwrap();
        let mut source = SeekSource::new(BufReader::new(reopened));
        assert_eq!(source.read_line().unwrap(), Some("name,age".to_string()));
        source.reset().unwrap();
        assert_eq!(source.read_line().unwrap(), Some("name,age".to_string()));
    }
}
