//! Unflattening engine (deserialize direction)
//!
//! Rebuilds a value tree from a flat row using two parallel stacks: a visit
//! stack of property nodes (children pushed in reverse so they pop in
//! original order, with a completion marker for each expanded parent) and a
//! stack of partially built parent instances. Leaves consume row columns by
//! name when the row carries a header, positionally otherwise; collection
//! leaves consume a contiguous `{tag}1..{tag}N` run.

use crate::nodes::PropertyNode;
use crate::options::ConvertOptions;
use crate::schema::FieldKind;
use crate::value::{FieldValue, ScalarType, StructValue};
use crate::{Error, Result};
use csvbind_core::Record;

enum Visit<'a> {
    /// Expand or read a node
    Node(&'a PropertyNode),
    /// All of the node's children are resolved; assign the built instance
    Complete(&'a PropertyNode),
}

/// Positional read cursor over the row
struct RowCursor {
    next: usize,
}

/// Rebuild a struct value for `type_name` from the row and its node tree.
///
/// # Errors
///
/// Returns an error when a mapped column is missing, a cell fails to decode,
/// or a collection leaf is reached without collection handling.
pub fn unflatten(
    record: &Record,
    nodes: &[PropertyNode],
    type_name: &str,
    options: &ConvertOptions,
) -> Result<StructValue> {
    let mut visit: Vec<Visit<'_>> = nodes.iter().rev().map(Visit::Node).collect();
    let mut parents: Vec<StructValue> = vec![StructValue::new(type_name)];
    let mut cursor = RowCursor { next: 0 };

    while let Some(item) = visit.pop() {
        match item {
            Visit::Complete(node) => {
                let child = parents.pop().expect("completed child instance on stack");
                let parent = parents.last_mut().expect("parent instance on stack");
                parent.set(node.original_name(), FieldValue::Struct(child));
            }
            Visit::Node(node) => {
                if node.ignore() {
                    continue;
                }
                if !node.children().is_empty() {
                    visit.push(Visit::Complete(node));
                    for child in node.children().iter().rev() {
                        visit.push(Visit::Node(child));
                    }
                    parents.push(StructValue::new(
                        node.nested_type().unwrap_or(node.original_name()),
                    ));
                    continue;
                }
                let value = read_leaf(node, record, &mut cursor, options)?;
                let parent = parents.last_mut().expect("parent instance on stack");
                parent.set(node.original_name(), value);
            }
        }
    }

    Ok(parents.pop().expect("root instance on stack"))
}

/// Validate the whole row against the node tree before any assignment:
/// every header column must match some mapped column (`MatchExact`).
///
/// # Errors
///
/// Returns a field-not-found error naming the first unmapped column.
pub fn validate_exact(
    record: &Record,
    nodes: &[PropertyNode],
    options: &ConvertOptions,
) -> Result<()> {
    let Some(header) = record.header() else {
        return Ok(());
    };
    let mut expected = Vec::new();
    collect_expected(nodes, options, &mut expected);

    for name in header.columns() {
        let matched = expected.iter().any(|column| column.matches(name, options));
        if !matched {
            return Err(Error::FieldNotFound { name: name.clone() });
        }
    }
    Ok(())
}

enum ExpectedColumn {
    Exact(String),
    TagRun,
}

impl ExpectedColumn {
    fn matches(&self, name: &str, options: &ConvertOptions) -> bool {
        match self {
            Self::Exact(column) => column == name,
            Self::TagRun => options
                .collections()
                .is_some_and(|handling| handling.index_of(name).is_some()),
        }
    }
}

fn collect_expected(
    nodes: &[PropertyNode],
    options: &ConvertOptions,
    out: &mut Vec<ExpectedColumn>,
) {
    for node in nodes {
        if node.ignore() {
            continue;
        }
        if !node.children().is_empty() {
            collect_expected(node.children(), options, out);
            continue;
        }
        match node.kind() {
            FieldKind::Collection(_) | FieldKind::Tuple(_) if options.collections().is_some() => {
                out.push(ExpectedColumn::TagRun);
            }
            _ => out.push(ExpectedColumn::Exact(node.column_name().to_string())),
        }
    }
}

fn read_leaf(
    node: &PropertyNode,
    record: &Record,
    cursor: &mut RowCursor,
    options: &ConvertOptions,
) -> Result<FieldValue> {
    match node.kind() {
        FieldKind::Collection(element) => {
            if options.collections().is_none() {
                return Err(Error::CollectionRequired {
                    column: node.column_name().to_string(),
                });
            }
            let (items, next) =
                read_collection_run(record, cursor.next, *element, node.converter(), options)?;
            cursor.next = next;
            Ok(FieldValue::List(items))
        }
        FieldKind::Tuple(elements) => {
            let handling = options
                .collections()
                .ok_or_else(|| Error::CollectionRequired {
                    column: node.column_name().to_string(),
                })?;
            let mut items = Vec::new();
            match record.header() {
                Some(header) => {
                    for (i, ty) in elements.iter().enumerate() {
                        let column = handling.column_for(i + 1);
                        let idx = header
                            .index_of(&column)
                            .ok_or(Error::MissingColumn { column })?;
                        let converter = options.resolve_converter(node.converter(), *ty)?;
                        items.push(converter.parse_value(record.get(idx).unwrap_or(""), *ty)?);
                        cursor.next = cursor.next.max(idx + 1);
                    }
                }
                None => {
                    for ty in elements {
                        let text =
                            record
                                .get(cursor.next)
                                .ok_or_else(|| Error::MissingColumn {
                                    column: node.column_name().to_string(),
                                })?;
                        let converter = options.resolve_converter(node.converter(), *ty)?;
                        items.push(converter.parse_value(text, *ty)?);
                        cursor.next += 1;
                    }
                }
            }
            Ok(FieldValue::List(items))
        }
        FieldKind::Nested(_) => {
            // A nested leaf decodes only through an explicit converter.
            let Some(name) = node.converter() else {
                return Err(Error::NoConverter {
                    type_name: node
                        .nested_type()
                        .unwrap_or(node.original_name())
                        .to_string(),
                });
            };
            let text = take_scalar_column(node, record, cursor)?;
            let converter = options.resolve_converter(Some(name), ScalarType::Text)?;
            converter.parse_value(&text, ScalarType::Text)
        }
        FieldKind::Dynamic => {
            let text = take_scalar_column(node, record, cursor)?;
            Ok(options.guess_value(&text))
        }
        FieldKind::Scalar(ty) => {
            let text = take_scalar_column(node, record, cursor)?;
            let converter = options.resolve_converter(node.converter(), *ty)?;
            converter.parse_value(&text, *ty)
        }
    }
}

/// Consume a contiguous `{tag}1..{tag}N` run from the record, starting at
/// the given positional cursor (`ReadCollectionFromRecord`).
///
/// The run ends when the row is exhausted, a column name stops matching the
/// next expected index, or `{tag}1` appears again (the start of a different
/// collection). Without a header the remaining columns are consumed. Returns
/// the decoded elements and the new cursor position.
///
/// # Errors
///
/// Returns an error when collection handling is absent or an element fails
/// to decode.
pub fn read_collection_run(
    record: &Record,
    start: usize,
    element: ScalarType,
    explicit_converter: Option<&str>,
    options: &ConvertOptions,
) -> Result<(Vec<FieldValue>, usize)> {
    let handling = options
        .collections()
        .ok_or_else(|| Error::CollectionRequired {
            column: "collection run".to_string(),
        })?;
    let converter = options.resolve_converter(explicit_converter, element)?;
    let mut items = Vec::new();
    let mut next = start;

    match record.header() {
        Some(header) => {
            let columns = header.columns();
            let first = handling.column_for(1);
            let run_start = (start..columns.len()).find(|&idx| columns[idx] == first);
            if let Some(run_start) = run_start {
                let mut idx = run_start;
                let mut n = 1;
                while idx < columns.len() && columns[idx] == handling.column_for(n) {
                    items.push(converter.parse_value(record.get(idx).unwrap_or(""), element)?);
                    idx += 1;
                    n += 1;
                }
                next = idx;
            }
        }
        None => {
            while next < record.len() {
                items.push(converter.parse_value(record.get(next).unwrap_or(""), element)?);
                next += 1;
            }
        }
    }

    Ok((items, next))
}

fn take_scalar_column(
    node: &PropertyNode,
    record: &Record,
    cursor: &mut RowCursor,
) -> Result<String> {
    match record.header() {
        Some(header) => {
            let idx = header
                .index_of(node.column_name())
                .ok_or_else(|| Error::MissingColumn {
                    column: node.column_name().to_string(),
                })?;
            cursor.next = cursor.next.max(idx + 1);
            Ok(record.get(idx).unwrap_or("").to_string())
        }
        None => {
            let idx = cursor.next;
            let text = record.get(idx).ok_or_else(|| Error::MissingColumn {
                column: node.column_name().to_string(),
            })?;
            cursor.next += 1;
            Ok(text.to_string())
        }
    }
}
