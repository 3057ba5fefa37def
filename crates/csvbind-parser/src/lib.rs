//! # csvbind-parser
//!
//! Character-level CSV tokenizer and formatter.
//!
//! The [`Scanner`] consumes a line-oriented source and produces one record
//! per call, honoring quoting, doubled-quote escaping, and quoted fields
//! spanning multiple physical lines. The [`Formatter`] is its inverse: it
//! turns an ordered field sequence back into one well-formed CSV line.
//! [`CsvReader`] and [`CsvWriter`] wrap the two around streams.

pub mod formatter;
pub mod reader;
pub mod scanner;
pub mod source;
pub mod writer;

pub use formatter::Formatter;
pub use reader::{CsvReader, RecordIter};
pub use scanner::Scanner;
pub use source::{LineSource, ReadSource, SeekSource, StringSource};
pub use writer::{CsvWriter, LineEnding};

use csvbind_core::Position;
use thiserror::Error;

/// The kind of format violation the scanner detected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// A quote was opened and the stream ended before it was closed
    UnclosedQuote,
    /// A quote appeared mid-field without being doubled and without being
    /// followed by a delimiter or end of line
    ExpectedEscapeQuote,
    /// A finished field contains the delimiter, the quote literal, or a line
    /// break but is not properly quote-enclosed
    ExpectedEncloseWithQuote,
}

impl std::fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnclosedQuote => write!(f, "unclosed quote"),
            Self::ExpectedEscapeQuote => write!(f, "expected escaped quote"),
            Self::ExpectedEncloseWithQuote => write!(f, "expected field enclosed with quotes"),
        }
    }
}

/// One-line excerpt of the offending source line, with the offset of the
/// character the error points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Excerpt {
    text: String,
    offset: usize,
}

impl Excerpt {
    /// Capture an excerpt of a source line
    pub fn new(text: impl Into<String>, offset: usize) -> Self {
        Self {
            text: text.into(),
            offset,
        }
    }

    /// The captured line text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Render the excerpt with a caret pointing at the offending offset
    pub fn render(&self) -> String {
        format!("{}\n{}^", self.text, " ".repeat(self.offset))
    }
}

/// Errors that can occur when tokenizing or formatting CSV
#[derive(Error, Debug)]
pub enum Error {
    #[error("{kind} at {position}")]
    Parse {
        kind: ParseErrorKind,
        position: Position,
        excerpt: Option<Excerpt>,
    },

    #[error("Source does not support resetting to the start")]
    ResetUnsupported,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Core(#[from] csvbind_core::Error),
}

impl Error {
    /// Build an unclosed-quote error at the position the quote was opened.
    pub fn unclosed_quote(position: Position, excerpt: Option<Excerpt>) -> Self {
        Self::Parse {
            kind: ParseErrorKind::UnclosedQuote,
            position,
            excerpt,
        }
    }

    /// Build an expected-escaped-quote error at the offending quote.
    pub fn expected_escape_quote(position: Position, excerpt: Option<Excerpt>) -> Self {
        Self::Parse {
            kind: ParseErrorKind::ExpectedEscapeQuote,
            position,
            excerpt,
        }
    }

    /// Build an enclose-with-quotes error at the start of the finished field.
    pub fn expected_enclose_with_quote(position: Position, excerpt: Option<Excerpt>) -> Self {
        Self::Parse {
            kind: ParseErrorKind::ExpectedEncloseWithQuote,
            position,
            excerpt,
        }
    }

    /// The format-violation kind, when this is a parse error
    pub fn kind(&self) -> Option<ParseErrorKind> {
        match self {
            Self::Parse { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// The diagnostic position, when this is a parse error
    pub fn position(&self) -> Option<Position> {
        match self {
            Self::Parse { position, .. } => Some(*position),
            _ => None,
        }
    }

    /// The captured source excerpt, when one is available
    pub fn excerpt(&self) -> Option<&Excerpt> {
        match self {
            Self::Parse { excerpt, .. } => excerpt.as_ref(),
            _ => None,
        }
    }
}

/// Crate-local result type for tokenizer operations.
pub type Result<T> = std::result::Result<T, Error>;
