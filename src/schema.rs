//! Field model and schema graph
//!
//! The compiler input: one or more root `Field` trees handed over by the
//! ingestion layer. Trees may share struct definitions through
//! `objectIdentity`; the first field declaring an identity together with
//! properties owns the definition, every other mention is a weak reference
//! resolved by lookup.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

use crate::codegen::config::UntypedPolicy;
use crate::error::{Result, SchemaError};
use crate::types::{classify, Type};

/// A single node of a schema tree
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    /// Name, unique among siblings
    pub name: String,
    /// Explicitly declared type (inferred by `classify` when absent)
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub declared_type: Option<Type>,
    /// Key used on the wire (defaults to `name`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wire_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_value: Option<serde_json::Value>,
    /// Nested fields (STRUCT leaf kinds only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<Field>,
    /// Shared struct name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_identity: Option<String>,
    /// Extra declared capabilities of the generated record
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub capabilities: Vec<String>,
    /// Positional hint for builder parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
}

impl Field {
    /// Create an untyped field
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_type(mut self, ty: Type) -> Self {
        self.declared_type = Some(ty);
        self
    }

    pub fn with_wire_name(mut self, wire_name: impl Into<String>) -> Self {
        self.wire_name = Some(wire_name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_default(mut self, value: serde_json::Value) -> Self {
        self.default_value = Some(value);
        self
    }

    pub fn with_sample(mut self, value: serde_json::Value) -> Self {
        self.sample_value = Some(value);
        self
    }

    pub fn with_properties(mut self, properties: Vec<Field>) -> Self {
        self.properties = properties;
        self
    }

    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.object_identity = Some(identity.into());
        self
    }

    pub fn with_capability(mut self, capability: impl Into<String>) -> Self {
        self.capabilities.push(capability.into());
        self
    }

    pub fn with_position(mut self, position: u32) -> Self {
        self.position = Some(position);
        self
    }

    /// Key used on the wire
    pub fn wire_name(&self) -> &str {
        self.wire_name.as_deref().unwrap_or(&self.name)
    }
}

/// The full set of field trees for one compilation unit
#[derive(Debug, Clone, Default)]
pub struct SchemaGraph {
    roots: Vec<Field>,
    /// Identities provided outside this unit; compiled as opaque values
    external: BTreeSet<String>,
}

impl SchemaGraph {
    pub fn new(roots: Vec<Field>) -> Self {
        Self {
            roots,
            external: BTreeSet::new(),
        }
    }

    /// Build a graph from a JSON array of root fields
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        let roots: Vec<Field> = serde_json::from_value(value)?;
        Ok(Self::new(roots))
    }

    /// Register an identity implemented outside this unit
    pub fn with_external(mut self, identity: impl Into<String>) -> Self {
        self.external.insert(identity.into());
        self
    }

    pub fn add_external<I, S>(&mut self, identities: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.external.extend(identities.into_iter().map(Into::into));
    }

    pub fn roots(&self) -> &[Field] {
        &self.roots
    }

    pub fn is_external(&self, identity: &str) -> bool {
        self.external.contains(identity)
    }

    /// Properties of the field owning `identity`, searched depth-first across
    /// all roots. `None` is not an error here: the owner may live in another
    /// unit.
    pub fn resolve_properties_for(&self, identity: &str) -> Option<&[Field]> {
        self.owner_of(identity).map(|f| f.properties.as_slice())
    }

    /// The field owning the definition of `identity`
    pub fn owner_of(&self, identity: &str) -> Option<&Field> {
        find_owner(&self.roots, identity)
    }

    /// Check sibling uniqueness and the struct/properties invariant
    pub fn validate(&self, policy: UntypedPolicy) -> Result<()> {
        let mut seen = HashSet::new();
        for root in &self.roots {
            if !seen.insert(root.name.as_str()) {
                return Err(SchemaError::DuplicateField {
                    parent: "<roots>".to_string(),
                    name: root.name.clone(),
                });
            }
            validate_field(root, &root.name, policy)?;
        }
        Ok(())
    }
}

fn find_owner<'a>(fields: &'a [Field], identity: &str) -> Option<&'a Field> {
    for field in fields {
        if field.object_identity.as_deref() == Some(identity) && !field.properties.is_empty() {
            return Some(field);
        }
        if let Some(found) = find_owner(&field.properties, identity) {
            return Some(found);
        }
    }
    None
}

fn validate_field(field: &Field, path: &str, policy: UntypedPolicy) -> Result<()> {
    let ty = classify(field, policy).map_err(|e| match e {
        SchemaError::UntypedField { .. } => SchemaError::UntypedField {
            path: path.to_string(),
        },
        other => other,
    })?;

    if !field.properties.is_empty() && !ty.is_struct_leaf() {
        return Err(SchemaError::PropertiesOnNonStruct {
            path: path.to_string(),
            declared: ty.to_string(),
        });
    }

    let mut seen = HashSet::new();
    for child in &field.properties {
        if !seen.insert(child.name.as_str()) {
            return Err(SchemaError::DuplicateField {
                parent: path.to_string(),
                name: child.name.clone(),
            });
        }
        validate_field(child, &format!("{}.{}", path, child.name), policy)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ScalarKind;

    fn address(city_type: ScalarKind) -> Field {
        Field::new("address")
            .with_identity("Address")
            .with_properties(vec![Field::new("city").with_type(Type::Scalar(city_type))])
    }

    #[test]
    fn test_wire_name_defaults_to_name() {
        assert_eq!(Field::new("id").wire_name(), "id");
        assert_eq!(Field::new("id").with_wire_name("ID").wire_name(), "ID");
    }

    #[test]
    fn test_resolve_first_owner_wins() {
        let graph = SchemaGraph::new(vec![
            Field::new("Order").with_properties(vec![
                Field::new("billing").with_identity("Address"),
                address(ScalarKind::String),
            ]),
            Field::new("Customer").with_properties(vec![address(ScalarKind::Int)]),
        ]);

        let props = graph.resolve_properties_for("Address").unwrap();
        assert_eq!(props.len(), 1);
        assert_eq!(props[0].declared_type, Some(Type::Scalar(ScalarKind::String)));
        assert!(graph.resolve_properties_for("Missing").is_none());
    }

    #[test]
    fn test_validate_duplicate_sibling() {
        let graph = SchemaGraph::new(vec![Field::new("Order")
            .with_properties(vec![Field::new("id"), Field::new("id")])]);
        assert!(matches!(
            graph.validate(UntypedPolicy::DefaultToString),
            Err(SchemaError::DuplicateField { .. })
        ));
    }

    #[test]
    fn test_validate_properties_on_scalar() {
        let graph = SchemaGraph::new(vec![Field::new("Order").with_properties(vec![
            Field::new("id")
                .with_type(Type::Scalar(ScalarKind::Long))
                .with_properties(vec![Field::new("x")]),
        ])]);
        match graph.validate(UntypedPolicy::DefaultToString) {
            Err(SchemaError::PropertiesOnNonStruct { path, declared }) => {
                assert_eq!(path, "Order.id");
                assert_eq!(declared, "LONG");
            }
            other => panic!("expected PropertiesOnNonStruct, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_struct_list_may_carry_properties() {
        let graph = SchemaGraph::new(vec![Field::new("Order").with_properties(vec![
            Field::new("lines")
                .with_type(Type::list(Type::Struct))
                .with_properties(vec![Field::new("sku")]),
        ])]);
        assert!(graph.validate(UntypedPolicy::Reject).is_err());
        assert!(graph.validate(UntypedPolicy::DefaultToString).is_ok());
    }

    #[test]
    fn test_deserialize_camel_case() {
        let graph = SchemaGraph::from_json(serde_json::json!([
            {
                "name": "Order",
                "properties": [
                    { "name": "id", "type": "LONG", "wireName": "order_id" },
                    { "name": "owner", "objectIdentity": "Person" }
                ]
            }
        ]))
        .unwrap();
        let order = &graph.roots()[0];
        assert_eq!(order.properties[0].wire_name(), "order_id");
        assert_eq!(order.properties[1].object_identity.as_deref(), Some("Person"));
    }
}
