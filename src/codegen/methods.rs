//! Structural Method Synthesizer
//!
//! Derives equality, total ordering and deep-copy logic for a record from
//! its field list. Each field gets a comparator and a copy strategy mirroring
//! its type; struct leaves delegate to the nested record's own methods.

use serde::{Deserialize, Serialize};

use super::artifacts::{RecordField, StructTarget};
use super::names::QualifiedName;
use crate::types::{ScalarKind, Type};

/// How two field values are compared (for equality and ordering)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparator {
    Scalar(ScalarKind),
    /// Element-wise, then by length
    List(Box<Comparator>),
    /// Over the union of keys in sorted order, then by size
    Map(Box<Comparator>),
    /// Delegate to the nested record's methods
    Struct(QualifiedName),
    /// Concrete type name, then string rendering
    Opaque,
}

/// How a field value is deep-copied
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CopyStrategy {
    ByValue,
    ListElements(Box<CopyStrategy>),
    MapEntries(Box<CopyStrategy>),
    Delegate(QualifiedName),
    CloneOpaque,
}

/// Method steps for a single field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMethod {
    pub field: String,
    pub accessor: String,
    pub comparator: Comparator,
    pub copy: CopyStrategy,
}

/// Equality, ordering and deep copy for one record, in declaration order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuralMethods {
    pub record: QualifiedName,
    pub fields: Vec<FieldMethod>,
}

/// Synthesize the structural methods of a record
pub fn synthesize(record: &QualifiedName, fields: &[RecordField]) -> StructuralMethods {
    StructuralMethods {
        record: record.clone(),
        fields: fields
            .iter()
            .map(|f| {
                let target = f.target.as_ref().and_then(|t| t.record());
                FieldMethod {
                    field: f.name.clone(),
                    accessor: f.accessor.clone(),
                    comparator: comparator(&f.ty, target),
                    copy: copy_strategy(&f.ty, target),
                }
            })
            .collect(),
    }
}

fn comparator(ty: &Type, target: Option<&QualifiedName>) -> Comparator {
    match ty {
        Type::Scalar(kind) => Comparator::Scalar(*kind),
        Type::List(item) => Comparator::List(Box::new(comparator(item, target))),
        Type::Map(value) => Comparator::Map(Box::new(comparator(value, target))),
        Type::Struct => match target {
            Some(record) => Comparator::Struct(record.clone()),
            None => Comparator::Opaque,
        },
    }
}

fn copy_strategy(ty: &Type, target: Option<&QualifiedName>) -> CopyStrategy {
    match ty {
        Type::Scalar(_) => CopyStrategy::ByValue,
        Type::List(item) => CopyStrategy::ListElements(Box::new(copy_strategy(item, target))),
        Type::Map(value) => CopyStrategy::MapEntries(Box::new(copy_strategy(value, target))),
        Type::Struct => match target {
            Some(record) => CopyStrategy::Delegate(record.clone()),
            None => CopyStrategy::CloneOpaque,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::config::NamingConfig;
    use crate::codegen::names::Namer;

    fn field(name: &str, ty: Type, target: Option<StructTarget>) -> RecordField {
        RecordField {
            name: name.to_string(),
            wire_name: name.to_string(),
            accessor: name.to_string(),
            constant: name.to_uppercase(),
            signature: ty.to_string(),
            ty,
            target,
            description: None,
            default_value: None,
            sample_value: None,
            position: None,
            boxed: false,
        }
    }

    #[test]
    fn test_synthesize_follows_declaration_order() {
        let config = NamingConfig::default();
        let namer = Namer::new(&config);
        let order = namer.artifact_names("Order");
        let address = namer.artifact_names("Address");

        let methods = synthesize(
            &order.record,
            &[
                field("id", Type::Scalar(ScalarKind::Long), None),
                field("ship_to", Type::list(Type::Struct), Some(StructTarget::Generated(address.clone()))),
                field("extra", Type::map(Type::Struct), Some(StructTarget::Opaque)),
            ],
        );

        let names: Vec<_> = methods.fields.iter().map(|f| f.field.as_str()).collect();
        assert_eq!(names, vec!["id", "ship_to", "extra"]);
        assert_eq!(methods.fields[0].comparator, Comparator::Scalar(ScalarKind::Long));
        assert_eq!(methods.fields[0].copy, CopyStrategy::ByValue);
        assert_eq!(
            methods.fields[1].comparator,
            Comparator::List(Box::new(Comparator::Struct(address.record.clone())))
        );
        assert_eq!(
            methods.fields[1].copy,
            CopyStrategy::ListElements(Box::new(CopyStrategy::Delegate(address.record.clone())))
        );
        assert_eq!(methods.fields[2].comparator, Comparator::Map(Box::new(Comparator::Opaque)));
        assert_eq!(methods.fields[2].copy, CopyStrategy::MapEntries(Box::new(CopyStrategy::CloneOpaque)));
    }
}
