//! Property-node tree builder
//!
//! The builder walks a type's schema descriptor (and, when serializing, its
//! live values) into an ephemeral tree of property nodes. Nested members are
//! expanded recursively up to the configured depth; the ancestor chain is a
//! plain list of type names carried through the recursion, which is also how
//! reference loops are detected.

use crate::options::{ConvertOptions, LoopPolicy};
use crate::schema::{FieldKind, FieldSchema, MemberKind, TypeSchema};
use crate::value::{FieldValue, StructValue};
use crate::{Error, Result};
use tracing::trace;

/// One mapped member of a target type during conversion.
///
/// Built fresh on every conversion call and owned by it; children are owned
/// by their parent node.
#[derive(Debug, Clone)]
pub struct PropertyNode {
    original_name: String,
    column_name: String,
    kind: FieldKind,
    ignore: bool,
    converter: Option<String>,
    value: Option<FieldValue>,
    nested_type: Option<String>,
    children: Vec<PropertyNode>,
}

impl PropertyNode {
    /// The member's original name
    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    /// The resolved column name (rename, else naming convention, else the
    /// original name)
    pub fn column_name(&self) -> &str {
        &self.column_name
    }

    /// The declared member shape
    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    /// Whether the member is excluded from mapping
    pub fn ignore(&self) -> bool {
        self.ignore
    }

    /// The explicitly bound converter name, if any
    pub fn converter(&self) -> Option<&str> {
        self.converter.as_deref()
    }

    /// The live value read during serialization, if any
    pub fn value(&self) -> Option<&FieldValue> {
        self.value.as_ref()
    }

    /// The nested member type's name, when this node was expanded
    pub fn nested_type(&self) -> Option<&str> {
        self.nested_type.as_deref()
    }

    /// Child nodes of an expanded nested member
    pub fn children(&self) -> &[PropertyNode] {
        &self.children
    }
}

/// Build the property-node tree for a type schema.
///
/// `instance` carries the live values when serializing and is `None` when
/// deserializing. `depth` is the current nesting level (0 at the root) and
/// `ancestors` the chain of type names above the current schema, used for
/// reference-loop detection.
///
/// # Errors
///
/// Returns a depth-exceeded error when expansion passes the configured
/// maximum, or a reference-loop error under the `Error` loop policy.
pub fn build_nodes(
    schema: &TypeSchema,
    options: &ConvertOptions,
    instance: Option<&StructValue>,
    depth: usize,
    ancestors: &mut Vec<String>,
) -> Result<Vec<PropertyNode>> {
    let mut nodes = Vec::new();

    for field in schema.fields() {
        if field.member() == MemberKind::Field && !options.include_fields() {
            continue;
        }

        let mut node = PropertyNode {
            original_name: field.name().to_string(),
            column_name: resolve_column_name(field, options),
            kind: field.kind().clone(),
            ignore: field.ignore(),
            converter: field.converter().map(str::to_string),
            value: instance.and_then(|s| s.get(field.name())).cloned(),
            nested_type: None,
            children: Vec::new(),
        };

        if node.ignore {
            nodes.push(node);
            continue;
        }

        if let FieldKind::Nested(schema_fn) = field.kind() {
            // A nested member with an explicit converter, or with nested
            // handling disabled, stays a leaf.
            let Some(handling) = options.nested().copied() else {
                nodes.push(node);
                continue;
            };
            if field.converter().is_some() {
                nodes.push(node);
                continue;
            }

            let child_schema = schema_fn();
            node.nested_type = Some(child_schema.type_name().to_string());
            let child_instance = match &node.value {
                Some(FieldValue::Struct(s)) => Some(s.clone()),
                _ => None,
            };
            let child_depth = depth + 1;

            if ancestors.iter().any(|a| a == child_schema.type_name()) {
                match handling.on_loop() {
                    LoopPolicy::Error => {
                        return Err(Error::ReferenceLoop {
                            type_name: child_schema.type_name().to_string(),
                        });
                    }
                    LoopPolicy::Ignore => {
                        trace!(member = field.name(), "omitted cyclic member");
                        continue;
                    }
                    LoopPolicy::Serialize => {
                        // One extra level for a live value, then stop. A null
                        // value (including the deserialize direction) is
                        // omitted like Ignore.
                        let Some(inst) = child_instance else {
                            continue;
                        };
                        if child_depth > handling.max_depth() {
                            return Err(Error::DepthExceeded {
                                depth: child_depth,
                                max: handling.max_depth(),
                            });
                        }
                        node.children =
                            build_final_level(&child_schema, options, Some(&inst))?;
                        nodes.push(node);
                        continue;
                    }
                }
            }

            if child_depth > handling.max_depth() {
                return Err(Error::DepthExceeded {
                    depth: child_depth,
                    max: handling.max_depth(),
                });
            }

            ancestors.push(child_schema.type_name().to_string());
            node.children = build_nodes(
                &child_schema,
                options,
                child_instance.as_ref(),
                child_depth,
                ancestors,
            )?;
            ancestors.pop();
        }

        nodes.push(node);
    }

    Ok(nodes)
}

/// Expand one final level of a cyclic member: scalar, collection, tuple, and
/// dynamic members only, nested members skipped.
fn build_final_level(
    schema: &TypeSchema,
    options: &ConvertOptions,
    instance: Option<&StructValue>,
) -> Result<Vec<PropertyNode>> {
    let mut nodes = Vec::new();
    for field in schema.fields() {
        if field.member() == MemberKind::Field && !options.include_fields() {
            continue;
        }
        if matches!(field.kind(), FieldKind::Nested(_)) {
            continue;
        }
        nodes.push(PropertyNode {
            original_name: field.name().to_string(),
            column_name: resolve_column_name(field, options),
            kind: field.kind().clone(),
            ignore: field.ignore(),
            converter: field.converter().map(str::to_string),
            value: instance.and_then(|s| s.get(field.name())).cloned(),
            nested_type: None,
            children: Vec::new(),
        });
    }
    Ok(nodes)
}

fn resolve_column_name(field: &FieldSchema, options: &ConvertOptions) -> String {
    if let Some(rename) = field.rename() {
        return rename.to_string();
    }
    if let Some(naming) = options.naming() {
        return naming.apply(field.name());
    }
    field.name().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{NamingConvention, NestedHandling};
    use crate::schema::FieldSchema;
    use crate::value::ScalarType;

    fn pricing_schema() -> TypeSchema {
        TypeSchema::new("Pricing")
            .field(FieldSchema::scalar("Currency", ScalarType::Text))
            .field(FieldSchema::scalar("Price", ScalarType::Float))
    }

    fn product_schema() -> TypeSchema {
        TypeSchema::new("Product")
            .field(FieldSchema::scalar("Name", ScalarType::Text))
            .field(FieldSchema::nested("Pricing", pricing_schema))
    }

    fn build(schema: &TypeSchema, options: &ConvertOptions) -> Result<Vec<PropertyNode>> {
        let mut ancestors = vec![schema.type_name().to_string()];
        build_nodes(schema, options, None, 0, &mut ancestors)
    }

    #[test]
    fn test_nested_member_expands_into_children() {
        let options = ConvertOptions::default();
        let nodes = build(&product_schema(), &options).unwrap();

        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].column_name(), "Name");
        assert!(nodes[0].children().is_empty());
        assert_eq!(nodes[1].nested_type(), Some("Pricing"));
        let children: Vec<&str> = nodes[1].children().iter().map(|n| n.column_name()).collect();
        assert_eq!(children, vec!["Currency", "Price"]);
    }

    #[test]
    fn test_nested_disabled_keeps_leaf() {
        let options = ConvertOptions::default().with_nested(None);
        let nodes = build(&product_schema(), &options).unwrap();
        assert!(nodes[1].children().is_empty());
    }

    #[test]
    fn test_rename_wins_over_naming_convention() {
        let schema = TypeSchema::new("T")
            .field(FieldSchema::scalar("UnitPrice", ScalarType::Float).renamed("price_eur"))
            .field(FieldSchema::scalar("ItemName", ScalarType::Text));
        let options = ConvertOptions::default().with_naming(NamingConvention::SnakeCase);
        let nodes = build(&schema, &options).unwrap();

        assert_eq!(nodes[0].column_name(), "price_eur");
        assert_eq!(nodes[1].column_name(), "item_name");
    }

    #[test]
    fn test_bare_fields_excluded_by_default() {
        let schema = TypeSchema::new("T")
            .field(FieldSchema::scalar("visible", ScalarType::Text))
            .field(FieldSchema::scalar("bare", ScalarType::Text).as_bare_field());

        let nodes = build(&schema, &ConvertOptions::default()).unwrap();
        assert_eq!(nodes.len(), 1);

        let options = ConvertOptions::default().with_include_fields(true);
        let nodes = build(&schema, &options).unwrap();
        assert_eq!(nodes.len(), 2);
    }

    #[test]
    fn test_ignored_member_is_carried_but_not_expanded() {
        let schema = TypeSchema::new("T")
            .field(FieldSchema::nested("Pricing", pricing_schema).ignored());
        let nodes = build(&schema, &ConvertOptions::default()).unwrap();
        assert_eq!(nodes.len(), 1);
        assert!(nodes[0].ignore());
        assert!(nodes[0].children().is_empty());
    }

    #[test]
    fn test_depth_bound() {
        fn level2_schema() -> TypeSchema {
            TypeSchema::new("Level2").field(FieldSchema::scalar("x", ScalarType::Integer))
        }
        fn level1_schema() -> TypeSchema {
            TypeSchema::new("Level1").field(FieldSchema::nested("inner", level2_schema))
        }
        let schema = TypeSchema::new("Root").field(FieldSchema::nested("outer", level1_schema));

        // Depth 2 expansion succeeds with max_depth 2.
        let options = ConvertOptions::default()
            .with_nested(Some(NestedHandling::new().with_max_depth(2)));
        assert!(build(&schema, &options).is_ok());

        // max_depth 1 rejects the second expansion.
        let options = ConvertOptions::default()
            .with_nested(Some(NestedHandling::new().with_max_depth(1)));
        let err = build(&schema, &options).unwrap_err();
        assert!(matches!(err, Error::DepthExceeded { depth: 2, max: 1 }));
    }

    #[test]
    fn test_self_reference_loop_policies() {
        fn node_schema() -> TypeSchema {
            TypeSchema::new("TreeNode")
                .field(FieldSchema::scalar("Label", ScalarType::Text))
                .field(FieldSchema::nested("Next", node_schema))
        }
        let schema = node_schema();

        // Error policy fails.
        let err = build(&schema, &ConvertOptions::default()).unwrap_err();
        assert!(matches!(err, Error::ReferenceLoop { .. }));

        // Ignore policy drops the cyclic member.
        let options = ConvertOptions::default().with_nested(Some(
            NestedHandling::new().with_loop_policy(LoopPolicy::Ignore),
        ));
        let nodes = build(&schema, &options).unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].column_name(), "Label");
    }

    #[test]
    fn test_serialize_loop_policy_includes_one_extra_level() {
        fn node_schema() -> TypeSchema {
            TypeSchema::new("TreeNode")
                .field(FieldSchema::scalar("Label", ScalarType::Text))
                .field(FieldSchema::nested("Next", node_schema))
        }
        let schema = node_schema();
        let options = ConvertOptions::default().with_nested(Some(
            NestedHandling::new().with_loop_policy(LoopPolicy::Serialize),
        ));

        // With a live non-null value, the cyclic member keeps one level of
        // scalar children.
        let inner = StructValue::new("TreeNode").with_field("Label", "child");
        let instance = StructValue::new("TreeNode")
            .with_field("Label", "root")
            .with_field("Next", inner);
        let mut ancestors = vec!["TreeNode".to_string()];
        let nodes = build_nodes(&schema, &options, Some(&instance), 0, &mut ancestors).unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[1].children().len(), 1);
        assert_eq!(nodes[1].children()[0].column_name(), "Label");

        // With a null value the member is omitted.
        let nodes = build(&schema, &options).unwrap();
        assert_eq!(nodes.len(), 1);
    }
}
