//! CSV tokenizer
//!
//! The scanner walks each physical line with a character cursor, consuming
//! the delimiter and quote literals of the configured format. A record spans
//! multiple physical lines while a quote remains open. Positions are tracked
//! per character for diagnostics.

use crate::source::LineSource;
use crate::{Error, Excerpt, Result};
use csvbind_core::{CsvFormat, Position, QuoteStyle};
use tracing::trace;

/// State of the field currently being accumulated.
///
/// The buffer holds the field in display form: quote literals are emitted
/// into it according to the configured style, and doubled quotes collapse to
/// one. The flush step strips the enclosure again, so finished fields carry
/// unquoted content.
#[derive(Debug, Default)]
struct FieldBuffer {
    buf: String,
    quote_open: bool,
    was_quoted: bool,
    started: bool,
    start: Position,
    open_pos: Position,
    open_excerpt: Option<Excerpt>,
}

impl FieldBuffer {
    fn reset(&mut self) {
        *self = Self::default();
    }

    /// Whether a quote at the cursor would open a quoted section. Only a
    /// quote at field start opens one; leading whitespace counts as field
    /// start when trimming is on.
    fn at_field_start(&self, trim: bool) -> bool {
        if self.was_quoted {
            return false;
        }
        self.buf.is_empty() || (trim && self.buf.chars().all(char::is_whitespace))
    }
}

/// Tokenizer over a line-oriented source.
///
/// Stateful per instance (cursor position, open-quote flag): each parse call
/// must run to completion before another begins on the same scanner.
#[derive(Debug)]
pub struct Scanner {
    format: CsvFormat,
    line: usize,
    offset: usize,
}

impl Scanner {
    /// Create a scanner for the given format
    pub fn new(format: CsvFormat) -> Self {
        Self {
            format,
            line: 0,
            offset: 0,
        }
    }

    /// The format this scanner tokenizes with
    pub fn format(&self) -> &CsvFormat {
        &self.format
    }

    /// Current position within the source
    pub fn position(&self) -> Position {
        Position::new(self.line, self.offset)
    }

    /// Rewind the scanner and its source to the start.
    ///
    /// # Errors
    ///
    /// Returns an error if the source does not support seeking.
    pub fn reset(&mut self, source: &mut dyn LineSource) -> Result<()> {
        source.reset()?;
        self.line = 0;
        self.offset = 0;
        Ok(())
    }

    /// Parse the next record from the source.
    ///
    /// Returns `Ok(None)` when the source is exhausted. A record spans
    /// multiple physical lines while a quoted field remains open.
    ///
    /// # Errors
    ///
    /// Returns a format violation (`UnclosedQuote`, `ExpectedEscapeQuote`,
    /// `ExpectedEncloseWithQuote`) with position and excerpt, or an IO error
    /// from the source.
    pub fn parse_next(&mut self, source: &mut dyn LineSource) -> Result<Option<Vec<String>>> {
        let mut record: Vec<String> = Vec::new();
        let mut field = FieldBuffer::default();
        let mut started = false;

        loop {
            let Some(text) = source.read_line()? else {
                if field.quote_open {
                    return Err(Error::unclosed_quote(
                        field.open_pos,
                        field.open_excerpt.take(),
                    ));
                }
                if !started {
                    return Ok(None);
                }
                self.flush_field(&mut field, &mut record)?;
                trace!(fields = record.len(), "parsed record at end of stream");
                return Ok(Some(record));
            };
            self.line += 1;
            self.offset = 0;

            // Whitespace-only lines between records are skipped, not emitted
            // as empty records.
            if !field.quote_open && self.format.trim_whitespace() && text.trim().is_empty() {
                continue;
            }
            started = true;

            let still_open = self.scan_line(&text, &mut field, &mut record)?;
            if still_open {
                if !self.format.ignore_new_line() {
                    field.buf.push('\n');
                }
                continue;
            }
            self.flush_field(&mut field, &mut record)?;
            trace!(line = self.line, fields = record.len(), "parsed record");
            return Ok(Some(record));
        }
    }

    /// Scan one physical line. Returns whether a quote is still open at the
    /// end of the line.
    fn scan_line(
        &mut self,
        text: &str,
        field: &mut FieldBuffer,
        record: &mut Vec<String>,
    ) -> Result<bool> {
        let chars: Vec<char> = text.chars().collect();
        let delimiter: Vec<char> = self.format.delimiter().chars().collect();
        let quote: Vec<char> = self.format.quote().chars().collect();

        let mut i = 0;
        while i < chars.len() {
            self.offset = i;
            if !field.started {
                field.started = true;
                field.start = Position::new(self.line, i);
            }

            if starts_with(&chars, i, &delimiter) {
                if field.quote_open {
                    // A delimiter inside an open quote is literal content.
                    field.buf.push_str(self.format.delimiter());
                } else {
                    self.flush_field(field, record)?;
                    field.reset();
                }
                i += delimiter.len();
                continue;
            }

            if starts_with(&chars, i, &quote) {
                i = self.consume_quote(&chars, i, &delimiter, &quote, text, field)?;
                continue;
            }

            let ch = chars[i];
            if (ch == '\r' || ch == '\n') && !field.quote_open {
                // Line-ending normalization: stray CR/LF outside quotes is
                // discarded.
                i += 1;
                continue;
            }
            field.buf.push(ch);
            i += 1;
        }

        Ok(field.quote_open)
    }

    /// Handle a quote literal at position `at`. Returns the cursor position
    /// after everything consumed.
    fn consume_quote(
        &mut self,
        chars: &[char],
        at: usize,
        delimiter: &[char],
        quote: &[char],
        text: &str,
        field: &mut FieldBuffer,
    ) -> Result<usize> {
        let emit = !matches!(self.format.style(), QuoteStyle::Never);
        let mut i = at + quote.len();

        if field.quote_open {
            if starts_with(chars, i, quote) {
                // Doubled quote inside an open section: one literal quote.
                i += quote.len();
                if emit {
                    field.buf.push_str(self.format.quote());
                }
                return Ok(i);
            }
            // Closing quote. Only whitespace may separate it from the
            // delimiter or the end of the line.
            if emit {
                field.buf.push_str(self.format.quote());
            }
            field.quote_open = false;
            let mut j = i;
            loop {
                if j >= chars.len() || starts_with(chars, j, delimiter) {
                    break;
                }
                if chars[j].is_whitespace() {
                    j += 1;
                    continue;
                }
                return Err(Error::expected_escape_quote(
                    Position::new(self.line, at),
                    Some(Excerpt::new(text, at)),
                ));
            }
            return Ok(j);
        }

        if field.at_field_start(self.format.trim_whitespace()) {
            // Opening quote; whitespace scanned before it is not content.
            field.buf.clear();
            field.quote_open = true;
            field.was_quoted = true;
            field.open_pos = Position::new(self.line, at);
            field.open_excerpt = Some(Excerpt::new(text, at));
            if emit {
                field.buf.push_str(self.format.quote());
            }
            return Ok(i);
        }

        // Bare quote mid-field: legal only when doubled or when it directly
        // precedes the delimiter or the end of the line (the flush step then
        // rejects the field unless it is properly enclosed).
        if starts_with(chars, i, quote) {
            i += quote.len();
            if emit {
                field.buf.push_str(self.format.quote());
            }
            return Ok(i);
        }
        if i >= chars.len() || starts_with(chars, i, delimiter) {
            if emit {
                field.buf.push_str(self.format.quote());
            }
            return Ok(i);
        }
        Err(Error::expected_escape_quote(
            Position::new(self.line, at),
            Some(Excerpt::new(text, at)),
        ))
    }

    /// Flush the accumulated buffer into the record (the
    /// `WriteCurrentFieldToRecord` step): trim, enforce the quote style,
    /// validate enclosure, and store the unquoted content.
    fn flush_field(&self, field: &mut FieldBuffer, record: &mut Vec<String>) -> Result<()> {
        let quote = self.format.quote();
        let mut raw = std::mem::take(&mut field.buf);

        if self.format.trim_whitespace() {
            raw = raw.trim().to_string();
        }

        match self.format.style() {
            QuoteStyle::Always => {
                if !is_enclosed(&raw, quote) {
                    raw = format!("{quote}{raw}{quote}");
                }
            }
            QuoteStyle::Never => {
                if is_enclosed(&raw, quote) {
                    raw = strip_enclosure(&raw, quote);
                }
            }
            QuoteStyle::WhenNeeded => {}
        }

        let content = if is_enclosed(&raw, quote) {
            strip_enclosure(&raw, quote)
        } else {
            raw
        };

        let has_special = content.contains(quote)
            || content.contains(self.format.delimiter())
            || content.contains('\n')
            || content.contains('\r');
        if has_special && !field.was_quoted {
            return Err(Error::expected_enclose_with_quote(
                field.start,
                Some(Excerpt::new(content.as_str(), 0)),
            ));
        }

        record.push(content);
        Ok(())
    }
}

/// Whether `chars[at..]` starts with the given literal
fn starts_with(chars: &[char], at: usize, literal: &[char]) -> bool {
    chars.len() >= at + literal.len() && chars[at..at + literal.len()] == *literal
}

/// Whether the text starts and ends with the quote literal
fn is_enclosed(text: &str, quote: &str) -> bool {
    text.len() >= 2 * quote.len() && text.starts_with(quote) && text.ends_with(quote)
}

/// Strip one enclosing quote pair
fn strip_enclosure(text: &str, quote: &str) -> String {
    text[quote.len()..text.len() - quote.len()].to_string()
}
