//! CSV line formatter
//!
//! The inverse of the scanner: takes an ordered field sequence and produces
//! one well-formed CSV line for the configured format. Pure per-call, no
//! state beyond the format descriptor.

use csvbind_core::{CsvFormat, QuoteStyle};

/// Formats field sequences into CSV lines
#[derive(Debug, Clone)]
pub struct Formatter {
    format: CsvFormat,
}

impl Formatter {
    /// Create a formatter for the given format
    pub fn new(format: CsvFormat) -> Self {
        Self { format }
    }

    /// The format this formatter writes with
    pub fn format(&self) -> &CsvFormat {
        &self.format
    }

    /// Produce one CSV line from the given fields, without a terminator
    pub fn to_line<I, S>(&self, fields: I) -> String
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let formatted: Vec<String> = fields
            .into_iter()
            .map(|field| self.format_field(field.as_ref()))
            .collect();
        formatted.join(self.format.delimiter())
    }

    /// Escape and enclose a single field according to the format
    pub fn format_field(&self, field: &str) -> String {
        let quote = self.format.quote();
        let doubled = format!("{quote}{quote}");
        let mut text = field.to_string();

        if self.format.ignore_new_line() {
            text.retain(|c| c != '\n' && c != '\r');
        }
        if self.format.trim_whitespace() {
            text = text.trim().to_string();
        }

        if is_enclosed(&text, quote) {
            // Already enclosed: double only the interior quotes.
            let interior = &text[quote.len()..text.len() - quote.len()];
            text = format!("{quote}{}{quote}", interior.replace(quote, &doubled));
        } else {
            text = text.replace(quote, &doubled);
            if self.needs_quotes(&text) {
                text = format!("{quote}{text}{quote}");
            }
        }

        match self.format.style() {
            QuoteStyle::Always => {
                if !is_enclosed(&text, quote) {
                    text = format!("{quote}{text}{quote}");
                }
            }
            QuoteStyle::Never => {
                // Lossy by design: quotes and line breaks are removed.
                text = text.replace(quote, "");
                text.retain(|c| c != '\n' && c != '\r');
            }
            QuoteStyle::WhenNeeded => {}
        }

        text
    }

    fn needs_quotes(&self, text: &str) -> bool {
        text.contains(self.format.quote())
            || text.contains(self.format.delimiter())
            || text.contains('\n')
            || text.contains('\r')
    }
}

fn is_enclosed(text: &str, quote: &str) -> bool {
    text.len() >= 2 * quote.len() && text.starts_with(quote) && text.ends_with(quote)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_fields_joined_with_delimiter() {
        let formatter = Formatter::new(CsvFormat::default());
        assert_eq!(formatter.to_line(["Homer", "35"]), "Homer,35");
    }

    #[test]
    fn test_custom_delimiter() {
        let format = CsvFormat::default().with_delimiter(";").unwrap();
        let formatter = Formatter::new(format);
        assert_eq!(
            formatter.to_line(["Keyboard", "2000", "black"]),
            "Keyboard;2000;black"
        );
    }

    #[test]
    fn test_field_with_delimiter_is_quoted() {
        let formatter = Formatter::new(CsvFormat::default());
        assert_eq!(formatter.to_line(["a,b", "c"]), "\"a,b\",c");
    }

    #[test]
    fn test_embedded_quotes_doubled_and_enclosed() {
        let formatter = Formatter::new(CsvFormat::default());
        assert_eq!(
            formatter.format_field("Frida \"The Painter\""),
            "\"Frida \"\"The Painter\"\"\""
        );
    }

    #[test]
    fn test_already_enclosed_field_untouched() {
        let formatter = Formatter::new(CsvFormat::default());
        assert_eq!(formatter.format_field("\"a,b\""), "\"a,b\"");
    }

    #[test]
    fn test_field_with_newline_is_quoted() {
        let formatter = Formatter::new(CsvFormat::default());
        assert_eq!(formatter.format_field("a\nb"), "\"a\nb\"");
    }

    #[test]
    fn test_style_always_forces_quotes() {
        let format = CsvFormat::default().with_style(QuoteStyle::Always);
        let formatter = Formatter::new(format);
        assert_eq!(formatter.to_line(["Homer", "35"]), "\"Homer\",\"35\"");
    }

    #[test]
    fn test_style_never_strips_quotes_and_newlines() {
        let format = CsvFormat::default().with_style(QuoteStyle::Never);
        let formatter = Formatter::new(format);
        assert_eq!(
            formatter.format_field("Frida \"The Painter\""),
            "Frida The Painter"
        );
        assert_eq!(formatter.format_field("a\nb"), "ab");
    }

    #[test]
    fn test_trim_whitespace() {
        let formatter = Formatter::new(CsvFormat::default());
        assert_eq!(formatter.to_line(["  a  ", " b"]), "a,b");
    }

    #[test]
    fn test_trim_off_preserves_whitespace() {
        let format = CsvFormat::default().with_trim_whitespace(false);
        let formatter = Formatter::new(format);
        assert_eq!(formatter.to_line([" a ", "b"]), " a ,b");
    }

    #[test]
    fn test_ignore_new_line_strips_embedded_breaks() {
        let format = CsvFormat::default().with_ignore_new_line(true);
        let formatter = Formatter::new(format);
        assert_eq!(formatter.format_field("a\r\nb"), "ab");
    }

    #[test]
    fn test_single_quote_field() {
        let formatter = Formatter::new(CsvFormat::default());
        assert_eq!(formatter.format_field("\""), "\"\"\"\"");
    }

    #[test]
    fn test_empty_field() {
        let formatter = Formatter::new(CsvFormat::default());
        assert_eq!(formatter.to_line(["", "b"]), ",b");
    }
}
