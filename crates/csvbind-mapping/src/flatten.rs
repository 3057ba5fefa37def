//! Flattening engine (serialize direction)
//!
//! Pre-order traversal over the property-node tree, accumulating leaves only.
//! Collection and tuple leaves expand into one synthetic `{tag}{index}`
//! column per element; every other leaf contributes its resolved column name
//! and the converted string value.

use crate::nodes::PropertyNode;
use crate::options::ConvertOptions;
use crate::schema::FieldKind;
use crate::value::{FieldValue, ScalarType};
use crate::{Error, Result};

/// Flatten a node tree into ordered (column name, cell text) pairs.
///
/// # Errors
///
/// Returns an error when a leaf has no usable converter, a collection leaf
/// is reached without collection handling, or a value does not match its
/// declared shape.
pub fn flatten(nodes: &[PropertyNode], options: &ConvertOptions) -> Result<Vec<(String, String)>> {
    let mut pairs = Vec::new();
    flatten_into(nodes, options, &mut pairs)?;
    Ok(pairs)
}

fn flatten_into(
    nodes: &[PropertyNode],
    options: &ConvertOptions,
    out: &mut Vec<(String, String)>,
) -> Result<()> {
    for node in nodes {
        if node.ignore() {
            continue;
        }
        if !node.children().is_empty() {
            flatten_into(node.children(), options, out)?;
            continue;
        }
        flatten_leaf(node, options, out)?;
    }
    Ok(())
}

fn flatten_leaf(
    node: &PropertyNode,
    options: &ConvertOptions,
    out: &mut Vec<(String, String)>,
) -> Result<()> {
    match node.kind() {
        FieldKind::Collection(element) => {
            let handling = options
                .collections()
                .ok_or_else(|| Error::CollectionRequired {
                    column: node.column_name().to_string(),
                })?;
            let converter = options.resolve_converter(node.converter(), *element)?;
            let items: &[FieldValue] = match node.value() {
                Some(FieldValue::List(items)) => items,
                Some(FieldValue::Null) | None => &[],
                Some(other) => {
                    return Err(Error::type_mismatch("list", other.type_label()));
                }
            };
            for (i, item) in items.iter().enumerate() {
                out.push((handling.column_for(i + 1), converter.format_value(item)?));
            }
        }
        FieldKind::Tuple(elements) => {
            let handling = options
                .collections()
                .ok_or_else(|| Error::CollectionRequired {
                    column: node.column_name().to_string(),
                })?;
            let items = match node.value() {
                Some(FieldValue::List(items)) => items.as_slice(),
                Some(FieldValue::Null) | None => &[],
                Some(other) => {
                    return Err(Error::type_mismatch("tuple", other.type_label()));
                }
            };
            if !items.is_empty() && items.len() != elements.len() {
                return Err(Error::mapping(format!(
                    "tuple member '{}' has {} slots but {} values",
                    node.original_name(),
                    elements.len(),
                    items.len()
                )));
            }
            for (i, (item, ty)) in items.iter().zip(elements).enumerate() {
                let converter = options.resolve_converter(node.converter(), *ty)?;
                out.push((handling.column_for(i + 1), converter.format_value(item)?));
            }
        }
        FieldKind::Nested(_) => {
            // A nested leaf survives only with an explicit converter bound.
            let Some(name) = node.converter() else {
                return Err(Error::CannotSerialize {
                    type_name: node
                        .nested_type()
                        .unwrap_or(node.original_name())
                        .to_string(),
                });
            };
            let converter = options.resolve_converter(Some(name), ScalarType::Text)?;
            let value = node.value().cloned().unwrap_or(FieldValue::Null);
            out.push((node.column_name().to_string(), converter.format_value(&value)?));
        }
        FieldKind::Dynamic => {
            let value = node.value().cloned().unwrap_or(FieldValue::Null);
            match &value {
                FieldValue::List(items) => {
                    let handling =
                        options
                            .collections()
                            .ok_or_else(|| Error::CollectionRequired {
                                column: node.column_name().to_string(),
                            })?;
                    for (i, item) in items.iter().enumerate() {
                        let ty = item.scalar_type().unwrap_or(ScalarType::Text);
                        let converter = options.resolve_converter(node.converter(), ty)?;
                        out.push((handling.column_for(i + 1), converter.format_value(item)?));
                    }
                }
                FieldValue::Struct(_) => {
                    return Err(Error::CannotSerialize {
                        type_name: "struct".to_string(),
                    });
                }
                _ => {
                    let ty = value.scalar_type().unwrap_or(ScalarType::Text);
                    let converter = options.resolve_converter(node.converter(), ty)?;
                    out.push((node.column_name().to_string(), converter.format_value(&value)?));
                }
            }
        }
        FieldKind::Scalar(ty) => {
            let converter = options.resolve_converter(node.converter(), *ty)?;
            let value = node.value().cloned().unwrap_or(FieldValue::Null);
            out.push((node.column_name().to_string(), converter.format_value(&value)?));
        }
    }
    Ok(())
}
