//! Conversion entry points
//!
//! [`CsvConverter`] owns one set of options and exposes the serialize and
//! deserialize pipelines: schema → node tree → flatten → record, and record →
//! node tree → unflatten → value → type. Plain targets (a lone scalar or an
//! enumerable of scalars) skip node building entirely and use the fixed
//! `value` column or the synthesized `{tag}{index}` columns.

use crate::flatten::flatten;
use crate::nodes::build_nodes;
use crate::options::ConvertOptions;
use crate::schema::{FieldKind, Mappable};
use crate::unflatten::{read_collection_run, unflatten, validate_exact};
use crate::value::{FieldValue, ScalarType};
use crate::{Error, Result};
use csvbind_core::{CsvDocument, Header, Record};
use csvbind_parser::{CsvReader, CsvWriter, LineEnding};
use std::sync::Arc;
use tracing::debug;

/// Fixed column name used when serializing a lone scalar
pub const SCALAR_COLUMN: &str = "value";

/// Typed conversion facade
#[derive(Clone, Default)]
pub struct CsvConverter {
    options: ConvertOptions,
}

impl CsvConverter {
    /// Create a converter with default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a converter with the given options
    pub fn with_options(options: ConvertOptions) -> Self {
        Self { options }
    }

    /// The options this converter runs with
    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Serialize one mapped value into a record
    ///
    /// # Errors
    ///
    /// Returns an error from node building (depth, reference loops) or
    /// flattening (missing converters, collection handling).
    pub fn serialize<T: Mappable>(&self, value: &T) -> Result<Record> {
        let schema = T::type_schema();
        let instance = value.to_struct();
        let mut ancestors = vec![schema.type_name().to_string()];
        let nodes = build_nodes(&schema, &self.options, Some(&instance), 0, &mut ancestors)?;
        let pairs = flatten(&nodes, &self.options)?;
        debug!(type_name = schema.type_name(), columns = pairs.len(), "serialized value");
        self.record_from_pairs(pairs)
    }

    /// Serialize a slice of mapped values into a document
    ///
    /// # Errors
    ///
    /// Returns the first serialization error, or a width mismatch when rows
    /// disagree on their flattened column count.
    pub fn serialize_all<T: Mappable>(&self, values: &[T]) -> Result<CsvDocument> {
        let mut doc: Option<CsvDocument> = None;
        for value in values {
            let record = self.serialize(value)?;
            if let Some(doc) = doc.as_mut() {
                doc.append(record)?;
            } else {
                let mut first = match record.header() {
                    Some(header) => CsvDocument::with_header(Arc::clone(header)),
                    None => CsvDocument::new(self.options.format().clone()),
                };
                first.append(record)?;
                doc = Some(first);
            }
        }
        Ok(doc.unwrap_or_else(|| CsvDocument::new(self.options.format().clone())))
    }

    /// Serialize a plain value: a scalar maps to the fixed `value` column,
    /// a list of scalars to `{tag}{index}` columns.
    ///
    /// # Errors
    ///
    /// Returns an error for struct values (use [`CsvConverter::serialize`])
    /// and for lists without collection handling.
    pub fn serialize_value(&self, value: &FieldValue) -> Result<Record> {
        let pairs = match value {
            FieldValue::Struct(_) => {
                return Err(Error::CannotSerialize {
                    type_name: "struct".to_string(),
                });
            }
            FieldValue::List(items) => {
                let handling =
                    self.options
                        .collections()
                        .ok_or_else(|| Error::CollectionRequired {
                            column: SCALAR_COLUMN.to_string(),
                        })?;
                let mut pairs = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    let ty = item.scalar_type().unwrap_or(ScalarType::Text);
                    let converter = self.options.resolve_converter(None, ty)?;
                    pairs.push((handling.column_for(i + 1), converter.format_value(item)?));
                }
                pairs
            }
            scalar => {
                let ty = scalar.scalar_type().unwrap_or(ScalarType::Text);
                let converter = self.options.resolve_converter(None, ty)?;
                vec![(SCALAR_COLUMN.to_string(), converter.format_value(scalar)?)]
            }
        };
        self.record_from_pairs(pairs)
    }

    /// Deserialize one record into a mapped value
    ///
    /// # Errors
    ///
    /// Returns an error from node building, MatchExact validation, column
    /// matching, or cell decoding.
    pub fn deserialize<T: Mappable>(&self, record: &Record) -> Result<T> {
        let schema = T::type_schema();
        let mut ancestors = vec![schema.type_name().to_string()];
        let nodes = build_nodes(&schema, &self.options, None, 0, &mut ancestors)?;
        if self.options.match_exact() {
            validate_exact(record, &nodes, &self.options)?;
        }
        let value = unflatten(record, &nodes, schema.type_name(), &self.options)?;
        T::from_struct(value)
    }

    /// Deserialize every row of a document
    ///
    /// # Errors
    ///
    /// Returns the first deserialization error.
    pub fn deserialize_all<T: Mappable>(&self, doc: &CsvDocument) -> Result<Vec<T>> {
        doc.iter().map(|record| self.deserialize(record)).collect()
    }

    /// Deserialize a plain value: the reverse of
    /// [`CsvConverter::serialize_value`].
    ///
    /// # Errors
    ///
    /// Returns an error when the record does not carry the expected columns
    /// or a cell fails to decode.
    pub fn deserialize_value(&self, record: &Record, target: &FieldKind) -> Result<FieldValue> {
        match target {
            FieldKind::Scalar(ty) => {
                let text = match record.header() {
                    Some(header) => match header.index_of(SCALAR_COLUMN) {
                        Some(idx) => record.get(idx).unwrap_or(""),
                        None => record.get(0).unwrap_or(""),
                    },
                    None => record.get(0).unwrap_or(""),
                };
                let converter = self.options.resolve_converter(None, *ty)?;
                converter.parse_value(text, *ty)
            }
            FieldKind::Collection(element) => {
                let (items, _) = read_collection_run(record, 0, *element, None, &self.options)?;
                Ok(FieldValue::List(items))
            }
            FieldKind::Dynamic => {
                let text = record.get(0).unwrap_or("");
                Ok(self.options.guess_value(text))
            }
            FieldKind::Tuple(_) | FieldKind::Nested(_) => Err(Error::NoConverter {
                type_name: "plain target".to_string(),
            }),
        }
    }

    /// Serialize mapped values straight to CSV text
    ///
    /// # Errors
    ///
    /// Returns serialization or formatting errors.
    pub fn to_csv<T: Mappable>(&self, values: &[T]) -> Result<String> {
        let doc = self.serialize_all(values)?;
        let writer = CsvWriter::new()
            .with_format(self.options.format().clone())
            .with_line_ending(LineEnding::LF)
            .write_header(self.options.include_header());
        Ok(writer.to_string(&doc)?)
    }

    /// Parse CSV text and deserialize every row
    ///
    /// # Errors
    ///
    /// Returns tokenizer errors or deserialization errors.
    pub fn from_csv<T: Mappable>(&self, text: &str) -> Result<Vec<T>> {
        let reader = CsvReader::new()
            .with_format(self.options.format().clone())
            .has_header(self.options.include_header());
        let doc = reader.read_str(text)?;
        self.deserialize_all(&doc)
    }

    fn record_from_pairs(&self, pairs: Vec<(String, String)>) -> Result<Record> {
        let (columns, values): (Vec<String>, Vec<String>) = pairs.into_iter().unzip();
        if self.options.include_header() {
            let header = Arc::new(Header::new(columns, self.options.format().clone()));
            Ok(Record::with_header(values, header)?)
        } else {
            Ok(Record::new(values, self.options.format().clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::CollectionHandling;
    use crate::schema::{FieldSchema, TypeSchema};
    use crate::value::StructValue;

    #[derive(Debug, Clone, PartialEq)]
    struct Pricing {
        currency: String,
        price: f64,
    }

    fn pricing_schema() -> TypeSchema {
        TypeSchema::new("Pricing")
            .field(FieldSchema::scalar("Currency", ScalarType::Text))
            .field(FieldSchema::scalar("Price", ScalarType::Float))
    }

    impl Mappable for Pricing {
        fn type_schema() -> TypeSchema {
            pricing_schema()
        }

        fn to_struct(&self) -> StructValue {
            StructValue::new("Pricing")
                .with_field("Currency", self.currency.clone())
                .with_field("Price", self.price)
        }

        fn from_struct(mut value: StructValue) -> Result<Self> {
            let currency = value
                .take("Currency")
                .and_then(|v| v.as_str().map(str::to_string))
                .ok_or_else(|| Error::mapping("Pricing.Currency missing"))?;
            let price = value
                .take("Price")
                .and_then(|v| v.as_f64())
                .ok_or_else(|| Error::mapping("Pricing.Price missing"))?;
            Ok(Self { currency, price })
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Product {
        name: String,
        pricing: Pricing,
    }

    impl Mappable for Product {
        fn type_schema() -> TypeSchema {
            TypeSchema::new("Product")
                .field(FieldSchema::scalar("Name", ScalarType::Text))
                .field(FieldSchema::nested("Pricing", pricing_schema))
        }

        fn to_struct(&self) -> StructValue {
            StructValue::new("Product")
                .with_field("Name", self.name.clone())
                .with_field("Pricing", self.pricing.to_struct())
        }

        fn from_struct(mut value: StructValue) -> Result<Self> {
            let name = value
                .take("Name")
                .and_then(|v| v.as_str().map(str::to_string))
                .ok_or_else(|| Error::mapping("Product.Name missing"))?;
            let pricing = value
                .take("Pricing")
                .and_then(FieldValue::into_struct)
                .ok_or_else(|| Error::mapping("Product.Pricing missing"))?;
            Ok(Self {
                name,
                pricing: Pricing::from_struct(pricing)?,
            })
        }
    }

    fn sample_product() -> Product {
        Product {
            name: "Keyboard".to_string(),
            pricing: Pricing {
                currency: "EUR".to_string(),
                price: 45.0,
            },
        }
    }

    #[test]
    fn test_serialize_nested_product() {
        let converter = CsvConverter::new();
        let record = converter.serialize(&sample_product()).unwrap();

        let header = record.header().unwrap();
        assert_eq!(header.columns(), &["Name", "Currency", "Price"]);
        assert_eq!(record.values(), &["Keyboard", "EUR", "45"]);
    }

    #[test]
    fn test_deserialize_nested_product() {
        let converter = CsvConverter::new();
        let record = converter.serialize(&sample_product()).unwrap();
        let product: Product = converter.deserialize(&record).unwrap();
        assert_eq!(product, sample_product());
    }

    #[test]
    fn test_to_csv_renders_header_and_row() {
        let converter = CsvConverter::new();
        let text = converter.to_csv(&[sample_product()]).unwrap();
        assert_eq!(text, "Name,Currency,Price\nKeyboard,EUR,45\n");
    }

    #[test]
    fn test_from_csv_round_trip() {
        let converter = CsvConverter::new();
        let products = vec![
            sample_product(),
            Product {
                name: "Mouse".to_string(),
                pricing: Pricing {
                    currency: "USD".to_string(),
                    price: 19.5,
                },
            },
        ];
        let text = converter.to_csv(&products).unwrap();
        let back: Vec<Product> = converter.from_csv(&text).unwrap();
        assert_eq!(back, products);
    }

    #[test]
    fn test_serialize_plain_scalar_uses_value_column() {
        let converter = CsvConverter::new();
        let record = converter.serialize_value(&FieldValue::Integer(42)).unwrap();
        assert_eq!(record.header().unwrap().columns(), &[SCALAR_COLUMN]);
        assert_eq!(record.values(), &["42"]);

        let back = converter
            .deserialize_value(&record, &FieldKind::Scalar(ScalarType::Integer))
            .unwrap();
        assert_eq!(back, FieldValue::Integer(42));
    }

    #[test]
    fn test_serialize_plain_list_uses_tag_columns() {
        let options = ConvertOptions::default()
            .with_collections(Some(CollectionHandling::new("item").unwrap()));
        let converter = CsvConverter::with_options(options);

        let record = converter
            .serialize_value(&FieldValue::from(vec![1, 2, 3, 4, 5]))
            .unwrap();
        assert_eq!(
            record.header().unwrap().columns(),
            &["item1", "item2", "item3", "item4", "item5"]
        );
        assert_eq!(record.values(), &["1", "2", "3", "4", "5"]);

        let back = converter
            .deserialize_value(&record, &FieldKind::Collection(ScalarType::Integer))
            .unwrap();
        assert_eq!(back, FieldValue::from(vec![1, 2, 3, 4, 5]));
    }

    #[test]
    fn test_serialize_without_header() {
        let options = ConvertOptions::default().with_include_header(false);
        let converter = CsvConverter::with_options(options);
        let record = converter.serialize(&sample_product()).unwrap();
        assert!(record.header().is_none());
        assert_eq!(record.values(), &["Keyboard", "EUR", "45"]);
    }

    #[test]
    fn test_serialize_all_shares_header() {
        let converter = CsvConverter::new();
        let doc = converter
            .serialize_all(&[sample_product(), sample_product()])
            .unwrap();
        assert_eq!(doc.len(), 2);
        assert_eq!(
            doc.header().unwrap().columns(),
            &["Name", "Currency", "Price"]
        );
    }

    #[test]
    fn test_match_exact_precedes_leaf_matching() {
        // The row is missing a mapped column AND carries an unknown one;
        // MatchExact runs first, so its error wins.
        use csvbind_core::CsvFormat;
        use std::sync::Arc;

        let header = Arc::new(Header::new(
            vec!["Name".to_string(), "Unknown".to_string()],
            CsvFormat::default(),
        ));
        let record =
            Record::with_header(vec!["Keyboard".to_string(), "x".to_string()], header).unwrap();

        let exact = CsvConverter::with_options(ConvertOptions::default().with_match_exact(true));
        let err = exact.deserialize::<Product>(&record).unwrap_err();
        assert!(matches!(err, Error::FieldNotFound { .. }));

        // Without MatchExact the per-leaf check reports the missing column.
        let lenient = CsvConverter::new();
        let err = lenient.deserialize::<Product>(&record).unwrap_err();
        assert!(matches!(err, Error::MissingColumn { .. }));
    }
}
