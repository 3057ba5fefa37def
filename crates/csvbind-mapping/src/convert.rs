//! Value converters and type guessers
//!
//! Scalar leaves of the flattening engine go through a [`ValueConverter`]:
//! explicit per-member binding first, then user-registered converters in
//! registration order, then the built-in default. Dynamically typed cells are
//! decoded by [`TypeGuesser`]s tried in registration order.

use crate::value::{FieldValue, ScalarType};
use crate::{Error, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use std::net::IpAddr;
use uuid::Uuid;

/// String⇄value codec for scalar cells
pub trait ValueConverter: Send + Sync {
    /// Whether this converter handles the given scalar type
    fn handles(&self, ty: ScalarType) -> bool;

    /// Produce the cell text for a value
    ///
    /// # Errors
    ///
    /// Returns an error when the value has no string form under this codec.
    fn format_value(&self, value: &FieldValue) -> Result<String>;

    /// Decode cell text into a value of the given scalar type
    ///
    /// # Errors
    ///
    /// Returns an error when the text does not parse as the target type.
    fn parse_value(&self, text: &str, ty: ScalarType) -> Result<FieldValue>;
}

/// Built-in codec for every scalar type.
///
/// Dates use ISO 8601 (`%Y-%m-%d`), times `%H:%M:%S`, datetimes RFC 3339.
/// An empty cell decodes to null for every non-text type; null formats as
/// the empty string.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultConverter;

impl ValueConverter for DefaultConverter {
    fn handles(&self, _ty: ScalarType) -> bool {
        true
    }

    fn format_value(&self, value: &FieldValue) -> Result<String> {
        match value {
            FieldValue::Null => Ok(String::new()),
            FieldValue::Bool(b) => Ok(b.to_string()),
            FieldValue::Integer(i) => Ok(i.to_string()),
            FieldValue::Float(f) => Ok(f.to_string()),
            FieldValue::Text(s) => Ok(s.clone()),
            FieldValue::Date(d) => Ok(d.format("%Y-%m-%d").to_string()),
            FieldValue::Time(t) => Ok(t.format("%H:%M:%S").to_string()),
            FieldValue::DateTime(dt) => Ok(dt.to_rfc3339()),
            FieldValue::Uuid(u) => Ok(u.to_string()),
            FieldValue::Ip(ip) => Ok(ip.to_string()),
            FieldValue::List(_) | FieldValue::Struct(_) => Err(Error::CannotSerialize {
                type_name: value.type_label().to_string(),
            }),
        }
    }

    fn parse_value(&self, text: &str, ty: ScalarType) -> Result<FieldValue> {
        if text.is_empty() && ty != ScalarType::Text {
            return Ok(FieldValue::Null);
        }
        match ty {
            ScalarType::Bool => text
                .parse::<bool>()
                .map(FieldValue::Bool)
                .map_err(|_| Error::type_mismatch("bool", text)),
            ScalarType::Integer => text
                .parse::<i64>()
                .map(FieldValue::Integer)
                .map_err(|_| Error::type_mismatch("integer", text)),
            ScalarType::Float => text
                .parse::<f64>()
                .map(FieldValue::Float)
                .map_err(|_| Error::type_mismatch("float", text)),
            ScalarType::Text => Ok(FieldValue::Text(text.to_string())),
            ScalarType::Date => NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .map(FieldValue::Date)
                .map_err(|_| Error::type_mismatch("date", text)),
            ScalarType::Time => NaiveTime::parse_from_str(text, "%H:%M:%S")
                .map(FieldValue::Time)
                .map_err(|_| Error::type_mismatch("time", text)),
            ScalarType::DateTime => DateTime::parse_from_rfc3339(text)
                .map(|dt| FieldValue::DateTime(dt.with_timezone(&Utc)))
                .map_err(|_| Error::type_mismatch("datetime", text)),
            ScalarType::Uuid => Uuid::parse_str(text)
                .map(FieldValue::Uuid)
                .map_err(|_| Error::type_mismatch("uuid", text)),
            ScalarType::Ip => text
                .parse::<IpAddr>()
                .map(FieldValue::Ip)
                .map_err(|_| Error::type_mismatch("ip", text)),
        }
    }
}

/// Decoder for dynamically typed cells
pub trait TypeGuesser: Send + Sync {
    /// Guess a value for the cell text, or pass
    fn guess(&self, text: &str) -> Option<FieldValue>;
}

/// Built-in guesser: bool, integer, float, date, datetime, uuid, in that
/// order. Passes on anything else so the caller falls back to text.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultGuesser;

impl TypeGuesser for DefaultGuesser {
    fn guess(&self, text: &str) -> Option<FieldValue> {
        if text.is_empty() {
            return Some(FieldValue::Null);
        }
        if let Ok(b) = text.parse::<bool>() {
            return Some(FieldValue::Bool(b));
        }
        if let Ok(i) = text.parse::<i64>() {
            return Some(FieldValue::Integer(i));
        }
        if let Ok(f) = text.parse::<f64>() {
            return Some(FieldValue::Float(f));
        }
        if let Ok(d) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
            return Some(FieldValue::Date(d));
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
            return Some(FieldValue::DateTime(dt.with_timezone(&Utc)));
        }
        if let Ok(u) = Uuid::parse_str(text) {
            return Some(FieldValue::Uuid(u));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_converter_round_trips_scalars() {
        let converter = DefaultConverter;
        let values = [
            (FieldValue::Bool(true), ScalarType::Bool),
            (FieldValue::Integer(-42), ScalarType::Integer),
            (FieldValue::Float(2.5), ScalarType::Float),
            (FieldValue::Text("plain".to_string()), ScalarType::Text),
            (
                FieldValue::Date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()),
                ScalarType::Date,
            ),
            (
                FieldValue::Time(NaiveTime::from_hms_opt(13, 30, 5).unwrap()),
                ScalarType::Time,
            ),
            (
                FieldValue::Uuid(Uuid::parse_str("67e55044-10b1-426f-9247-bb680e5fe0c8").unwrap()),
                ScalarType::Uuid,
            ),
            (
                FieldValue::Ip("192.168.0.1".parse::<IpAddr>().unwrap()),
                ScalarType::Ip,
            ),
        ];

        for (value, ty) in values {
            let text = converter.format_value(&value).unwrap();
            let back = converter.parse_value(&text, ty).unwrap();
            assert_eq!(back, value, "round trip failed for {ty}");
        }
    }

    #[test]
    fn test_datetime_round_trip() {
        let converter = DefaultConverter;
        let dt = DateTime::parse_from_rfc3339("2024-03-01T13:30:05Z")
            .unwrap()
            .with_timezone(&Utc);
        let text = converter.format_value(&FieldValue::DateTime(dt)).unwrap();
        assert_eq!(
            converter.parse_value(&text, ScalarType::DateTime).unwrap(),
            FieldValue::DateTime(dt)
        );
    }

    #[test]
    fn test_empty_cell_is_null_for_non_text() {
        let converter = DefaultConverter;
        assert_eq!(
            converter.parse_value("", ScalarType::Integer).unwrap(),
            FieldValue::Null
        );
        assert_eq!(
            converter.parse_value("", ScalarType::Text).unwrap(),
            FieldValue::Text(String::new())
        );
    }

    #[test]
    fn test_null_formats_as_empty_string() {
        assert_eq!(DefaultConverter.format_value(&FieldValue::Null).unwrap(), "");
    }

    #[test]
    fn test_parse_type_mismatch() {
        let err = DefaultConverter
            .parse_value("abc", ScalarType::Integer)
            .unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
    }

    #[test]
    fn test_list_has_no_default_string_form() {
        let err = DefaultConverter
            .format_value(&FieldValue::List(vec![]))
            .unwrap_err();
        assert!(matches!(err, Error::CannotSerialize { .. }));
    }

    #[test]
    fn test_default_guesser_order() {
        let guesser = DefaultGuesser;
        assert_eq!(guesser.guess("true"), Some(FieldValue::Bool(true)));
        assert_eq!(guesser.guess("35"), Some(FieldValue::Integer(35)));
        assert_eq!(guesser.guess("3.5"), Some(FieldValue::Float(3.5)));
        assert_eq!(
            guesser.guess("2024-03-01"),
            Some(FieldValue::Date(
                NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
            ))
        );
        assert_eq!(guesser.guess(""), Some(FieldValue::Null));
        assert_eq!(guesser.guess("plain text"), None);
    }
}
