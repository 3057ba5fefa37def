//! CSV format descriptor
//!
//! The format descriptor is an immutable value describing the dialect used
//! by every other component: delimiter, quote literal, quoting style, and
//! whitespace handling. Changes go through the `with_*` builder methods,
//! which copy and validate rather than mutate.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Default field delimiter
pub const DEFAULT_DELIMITER: &str = ",";
/// Default quote literal
pub const DEFAULT_QUOTE: &str = "\"";

/// Policy for when enclosing quotes are applied to fields
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuoteStyle {
    /// Every field is enclosed in quotes
    Always,
    /// Quotes are stripped from fields entirely (lossy)
    Never,
    /// Fields are quoted only when they contain the delimiter, the quote
    /// literal, or a line break
    #[default]
    WhenNeeded,
}

/// Dialect descriptor shared by the scanner, formatter, and converter.
///
/// Invariant: the delimiter and quote literals are non-empty and distinct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvFormat {
    delimiter: String,
    quote: String,
    style: QuoteStyle,
    trim_whitespace: bool,
    ignore_new_line: bool,
}

impl Default for CsvFormat {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER.to_string(),
            quote: DEFAULT_QUOTE.to_string(),
            style: QuoteStyle::WhenNeeded,
            trim_whitespace: true,
            ignore_new_line: false,
        }
    }
}

impl CsvFormat {
    /// Create a format with the default dialect (comma, double quote,
    /// `WhenNeeded`, whitespace trimmed)
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the delimiter literal
    ///
    /// # Errors
    ///
    /// Returns an error if the delimiter is empty or equals the quote literal.
    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Result<Self> {
        self.delimiter = delimiter.into();
        self.check()?;
        Ok(self)
    }

    /// Replace the quote literal
    ///
    /// # Errors
    ///
    /// Returns an error if the quote is empty or equals the delimiter literal.
    pub fn with_quote(mut self, quote: impl Into<String>) -> Result<Self> {
        self.quote = quote.into();
        self.check()?;
        Ok(self)
    }

    /// Replace the quoting style
    pub fn with_style(mut self, style: QuoteStyle) -> Self {
        self.style = style;
        self
    }

    /// Configure whitespace trimming around fields
    pub fn with_trim_whitespace(mut self, trim: bool) -> Self {
        self.trim_whitespace = trim;
        self
    }

    /// Configure whether line breaks inside quoted fields are dropped
    pub fn with_ignore_new_line(mut self, ignore: bool) -> Self {
        self.ignore_new_line = ignore;
        self
    }

    /// The field delimiter literal
    pub fn delimiter(&self) -> &str {
        &self.delimiter
    }

    /// The quote literal
    pub fn quote(&self) -> &str {
        &self.quote
    }

    /// The quoting style
    pub fn style(&self) -> QuoteStyle {
        self.style
    }

    /// Whether fields are trimmed of surrounding whitespace
    pub fn trim_whitespace(&self) -> bool {
        self.trim_whitespace
    }

    /// Whether line breaks inside quoted fields are dropped
    pub fn ignore_new_line(&self) -> bool {
        self.ignore_new_line
    }

    /// Validate the descriptor invariants.
    ///
    /// Deserialized descriptors bypass the builder checks, so callers loading
    /// a format from configuration should validate before use.
    ///
    /// # Errors
    ///
    /// Returns an error if either literal is empty or the two are equal.
    pub fn validate(&self) -> Result<()> {
        self.check()
    }

    fn check(&self) -> Result<()> {
        if self.delimiter.is_empty() {
            return Err(Error::invalid_format("delimiter must not be empty"));
        }
        if self.quote.is_empty() {
            return Err(Error::invalid_format("quote must not be empty"));
        }
        if self.delimiter == self.quote {
            return Err(Error::invalid_format(
                "delimiter and quote must be distinct",
            ));
        }
        Ok(())
    }
}
