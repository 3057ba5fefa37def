//! Conversion options
//!
//! One options value configures a whole conversion run: the CSV format,
//! header and matching behavior, naming conventions, nested-object and
//! collection handling, and the converter/guesser registries.

use crate::convert::{DefaultConverter, DefaultGuesser, TypeGuesser, ValueConverter};
use crate::value::{FieldValue, ScalarType};
use crate::{Error, Result};
use csvbind_core::CsvFormat;
use std::collections::HashMap;
use std::sync::Arc;

/// Column-name transform applied when no explicit rename exists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamingConvention {
    SnakeCase,
    CamelCase,
    PascalCase,
    KebabCase,
    UpperSnakeCase,
}

impl NamingConvention {
    /// Transform a member name into a column name
    pub fn apply(&self, name: &str) -> String {
        let words = split_words(name);
        match self {
            Self::SnakeCase => words.join("_"),
            Self::KebabCase => words.join("-"),
            Self::UpperSnakeCase => words
                .iter()
                .map(|w| w.to_uppercase())
                .collect::<Vec<_>>()
                .join("_"),
            Self::CamelCase => {
                let mut out = String::new();
                for (i, word) in words.iter().enumerate() {
                    if i == 0 {
                        out.push_str(word);
                    } else {
                        out.push_str(&capitalize(word));
                    }
                }
                out
            }
            Self::PascalCase => words.iter().map(|w| capitalize(w)).collect(),
        }
    }
}

/// Split a member name into lowercase words at underscores, dashes, spaces,
/// and lower-to-upper case boundaries.
fn split_words(name: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;

    for ch in name.chars() {
        if ch == '_' || ch == '-' || ch == ' ' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if ch.is_uppercase() && prev_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        prev_lower = ch.is_lowercase() || ch.is_numeric();
        current.extend(ch.to_lowercase());
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// What to do when a nested member's type already appears in its own
/// ancestor chain
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoopPolicy {
    /// Fail the conversion
    #[default]
    Error,
    /// Omit the cyclic subtree
    Ignore,
    /// Include one extra level when the value is non-null, then stop
    Serialize,
}

/// Bounds for nested-object expansion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NestedHandling {
    max_depth: usize,
    on_loop: LoopPolicy,
}

impl Default for NestedHandling {
    fn default() -> Self {
        Self {
            max_depth: 8,
            on_loop: LoopPolicy::Error,
        }
    }
}

impl NestedHandling {
    /// Create the default handling (depth 8, loops are errors)
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum nested expansion depth
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the reference-loop policy
    pub fn with_loop_policy(mut self, policy: LoopPolicy) -> Self {
        self.on_loop = policy;
        self
    }

    /// The maximum nested expansion depth
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// The reference-loop policy
    pub fn on_loop(&self) -> LoopPolicy {
        self.on_loop
    }
}

/// Naming scheme for expanded collection and tuple elements
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionHandling {
    tag: String,
}

impl CollectionHandling {
    /// Create collection handling with the given tag prefix
    ///
    /// # Errors
    ///
    /// Returns an error if the tag is empty.
    pub fn new(tag: impl Into<String>) -> Result<Self> {
        let tag = tag.into();
        if tag.is_empty() {
            return Err(Error::EmptyTag);
        }
        Ok(Self { tag })
    }

    /// The tag prefix
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Synthesize the column name for a 1-based element index
    pub fn column_for(&self, index: usize) -> String {
        format!("{}{}", self.tag, index)
    }

    /// Parse a column name back into its 1-based element index
    pub fn index_of(&self, column: &str) -> Option<usize> {
        let rest = column.strip_prefix(self.tag.as_str())?;
        if rest.is_empty() || !rest.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        rest.parse().ok()
    }
}

/// Options consumed by the node builder and the two engines
#[derive(Clone)]
pub struct ConvertOptions {
    format: CsvFormat,
    include_fields: bool,
    include_header: bool,
    match_exact: bool,
    naming: Option<NamingConvention>,
    nested: Option<NestedHandling>,
    collections: Option<CollectionHandling>,
    converters: Vec<Arc<dyn ValueConverter>>,
    named_converters: HashMap<String, Arc<dyn ValueConverter>>,
    guessers: Vec<Arc<dyn TypeGuesser>>,
    default_converter: Arc<dyn ValueConverter>,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            format: CsvFormat::default(),
            include_fields: false,
            include_header: true,
            match_exact: false,
            naming: None,
            nested: Some(NestedHandling::default()),
            collections: None,
            converters: Vec::new(),
            named_converters: HashMap::new(),
            guessers: Vec::new(),
            default_converter: Arc::new(DefaultConverter),
        }
    }
}

impl ConvertOptions {
    /// Create options with defaults (header on, nested handling enabled)
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the CSV format
    pub fn with_format(mut self, format: CsvFormat) -> Self {
        self.format = format;
        self
    }

    /// Map bare fields in addition to properties
    pub fn with_include_fields(mut self, include: bool) -> Self {
        self.include_fields = include;
        self
    }

    /// Attach a header to serialized records
    pub fn with_include_header(mut self, include: bool) -> Self {
        self.include_header = include;
        self
    }

    /// Reject rows whose header carries unmapped columns
    pub fn with_match_exact(mut self, exact: bool) -> Self {
        self.match_exact = exact;
        self
    }

    /// Set the naming convention for members without an explicit rename
    pub fn with_naming(mut self, naming: NamingConvention) -> Self {
        self.naming = Some(naming);
        self
    }

    /// Set nested-object handling; `None` disables nested expansion
    pub fn with_nested(mut self, nested: Option<NestedHandling>) -> Self {
        self.nested = nested;
        self
    }

    /// Set collection handling; `None` disables collection expansion
    pub fn with_collections(mut self, collections: Option<CollectionHandling>) -> Self {
        self.collections = collections;
        self
    }

    /// Register a converter, consulted in registration order before the
    /// default converter
    pub fn register_converter(mut self, converter: Arc<dyn ValueConverter>) -> Self {
        self.converters.push(converter);
        self
    }

    /// Register a converter under a name for explicit per-member bindings
    pub fn bind_converter(
        mut self,
        name: impl Into<String>,
        converter: Arc<dyn ValueConverter>,
    ) -> Self {
        self.named_converters.insert(name.into(), converter);
        self
    }

    /// Register a type guesser, consulted in registration order before the
    /// built-in guesser
    pub fn register_guesser(mut self, guesser: Arc<dyn TypeGuesser>) -> Self {
        self.guessers.push(guesser);
        self
    }

    /// The CSV format
    pub fn format(&self) -> &CsvFormat {
        &self.format
    }

    /// Whether bare fields are mapped
    pub fn include_fields(&self) -> bool {
        self.include_fields
    }

    /// Whether serialized records carry a header
    pub fn include_header(&self) -> bool {
        self.include_header
    }

    /// Whether unmapped row columns are rejected
    pub fn match_exact(&self) -> bool {
        self.match_exact
    }

    /// The naming convention, if any
    pub fn naming(&self) -> Option<NamingConvention> {
        self.naming
    }

    /// Nested-object handling, if enabled
    pub fn nested(&self) -> Option<&NestedHandling> {
        self.nested.as_ref()
    }

    /// Collection handling, if enabled
    pub fn collections(&self) -> Option<&CollectionHandling> {
        self.collections.as_ref()
    }

    /// Resolve the converter for a leaf: the explicit binding when present,
    /// else the first registered converter that handles the type, else the
    /// default converter.
    ///
    /// # Errors
    ///
    /// Returns an error when an explicit binding names an unregistered
    /// converter.
    pub fn resolve_converter(
        &self,
        explicit: Option<&str>,
        ty: ScalarType,
    ) -> Result<Arc<dyn ValueConverter>> {
        if let Some(name) = explicit {
            return self
                .named_converters
                .get(name)
                .cloned()
                .ok_or_else(|| Error::UnknownConverter {
                    name: name.to_string(),
                });
        }
        for converter in &self.converters {
            if converter.handles(ty) {
                return Ok(Arc::clone(converter));
            }
        }
        Ok(Arc::clone(&self.default_converter))
    }

    /// Decode a dynamically typed cell: registered guessers in order, then
    /// the built-in guesser, then text.
    pub fn guess_value(&self, text: &str) -> FieldValue {
        for guesser in &self.guessers {
            if let Some(value) = guesser.guess(text) {
                return value;
            }
        }
        if let Some(value) = DefaultGuesser.guess(text) {
            return value;
        }
        FieldValue::Text(text.to_string())
    }
}
