//! Structural method interpreter
//!
//! Equality, total ordering and deep copy driven by the `StructuralMethods`
//! generated for each record.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use super::value::{Decimal, Record, Value};
use crate::codegen::artifacts::ArtifactSet;
use crate::codegen::methods::{Comparator, CopyStrategy, StructuralMethods};

pub struct Structural<'a> {
    artifacts: &'a ArtifactSet,
}

impl<'a> Structural<'a> {
    pub fn new(artifacts: &'a ArtifactSet) -> Self {
        Self { artifacts }
    }

    fn methods(&self, record: &Record) -> Option<&'a StructuralMethods> {
        self.artifacts.methods_for(record.name())
    }

    /// Field-by-field equality; records of different kinds are never equal
    pub fn equals(&self, a: &Record, b: &Record) -> bool {
        if a.name() != b.name() {
            return false;
        }
        match self.methods(a) {
            Some(methods) => methods
                .fields
                .iter()
                .all(|m| self.field_equals(&m.comparator, a.get(&m.field), b.get(&m.field))),
            None => a == b,
        }
    }

    /// Total order over records. Never fails.
    pub fn compare(&self, a: &Record, b: &Record) -> Ordering {
        if a.name() != b.name() {
            return a
                .name()
                .simple_name()
                .cmp(b.name().simple_name())
                .then_with(|| a.name().cmp(b.name()));
        }
        let Some(methods) = self.methods(a) else {
            return generic_compare(&Value::Record(a.clone()), &Value::Record(b.clone()));
        };
        for method in &methods.fields {
            let ord = self.compare_field(&method.comparator, a.get(&method.field), b.get(&method.field));
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }

    /// Independent copy equal to `record`
    pub fn deep_copy(&self, record: &Record) -> Record {
        let methods = self.methods(record);
        let mut copy = Record::new(record.name().clone());
        for (field, value) in record.fields() {
            let strategy = methods.and_then(|m| m.fields.iter().find(|f| f.field == field)).map(|f| &f.copy);
            let copied = match strategy {
                Some(strategy) => self.copy_value(strategy, value),
                None => value.clone(),
            };
            copy.set(field, copied);
        }
        copy
    }

    pub fn field_equals(&self, comparator: &Comparator, x: &Value, y: &Value) -> bool {
        match (comparator, x, y) {
            (_, Value::Null, Value::Null) => true,
            (_, Value::Null, _) | (_, _, Value::Null) => false,
            (Comparator::List(inner), Value::List(xs), Value::List(ys)) => {
                xs.len() == ys.len() && xs.iter().zip(ys).all(|(a, b)| self.field_equals(inner, a, b))
            }
            (Comparator::Map(inner), Value::Map(xs), Value::Map(ys)) => {
                xs.len() == ys.len()
                    && xs
                        .iter()
                        .all(|(k, a)| ys.get(k).is_some_and(|b| self.field_equals(inner, a, b)))
            }
            (Comparator::Struct(_), Value::Record(a), Value::Record(b)) => self.equals(a, b),
            _ => self.compare_field(comparator, x, y) == Ordering::Equal,
        }
    }

    /// Ordering of two values of one field; `null` sorts first
    pub fn compare_field(&self, comparator: &Comparator, x: &Value, y: &Value) -> Ordering {
        match (x, y) {
            (Value::Null, Value::Null) => return Ordering::Equal,
            (Value::Null, _) => return Ordering::Less,
            (_, Value::Null) => return Ordering::Greater,
            _ => {}
        }

        match (comparator, x, y) {
            (Comparator::Scalar(_), _, _) => compare_scalars(x, y),
            (Comparator::List(inner), Value::List(xs), Value::List(ys)) => xs
                .iter()
                .zip(ys)
                .map(|(a, b)| self.compare_field(inner, a, b))
                .find(|ord| *ord != Ordering::Equal)
                .unwrap_or_else(|| xs.len().cmp(&ys.len())),
            (Comparator::Map(inner), Value::Map(xs), Value::Map(ys)) => self.compare_maps(inner, xs, ys),
            (Comparator::Struct(_), Value::Record(a), Value::Record(b)) => self.compare(a, b),
            _ => generic_compare(x, y),
        }
    }

    fn compare_maps(
        &self,
        inner: &Comparator,
        xs: &BTreeMap<String, Value>,
        ys: &BTreeMap<String, Value>,
    ) -> Ordering {
        let keys: BTreeSet<&String> = xs.keys().chain(ys.keys()).collect();
        for key in keys {
            let a = xs.get(key).unwrap_or(&Value::Null);
            let b = ys.get(key).unwrap_or(&Value::Null);
            let ord = self.compare_field(inner, a, b);
            if ord != Ordering::Equal {
                return ord;
            }
        }
        xs.len().cmp(&ys.len())
    }

    fn copy_value(&self, strategy: &CopyStrategy, value: &Value) -> Value {
        match (strategy, value) {
            (CopyStrategy::ListElements(inner), Value::List(items)) => {
                Value::List(items.iter().map(|v| self.copy_value(inner, v)).collect())
            }
            (CopyStrategy::MapEntries(inner), Value::Map(entries)) => Value::Map(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), self.copy_value(inner, v)))
                    .collect(),
            ),
            (CopyStrategy::Delegate(_), Value::Record(record)) => Value::Record(self.deep_copy(record)),
            _ => value.clone(),
        }
    }
}

/// Numbers compare by value across INT, LONG and DECIMAL
fn compare_scalars(x: &Value, y: &Value) -> Ordering {
    match (x, y) {
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
        (Value::Int(a), Value::Int(b)) => a.cmp(b),
        (Value::Long(a), Value::Long(b)) => a.cmp(b),
        _ => match (as_decimal(x), as_decimal(y)) {
            (Some(a), Some(b)) => a.cmp(&b),
            _ => generic_compare(x, y),
        },
    }
}

fn as_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Int(i) => Some(Decimal::from(i64::from(*i))),
        Value::Long(l) => Some(Decimal::from(*l)),
        Value::Decimal(d) => Some(d.clone()),
        _ => None,
    }
}

/// Concrete type name, then string rendering
fn generic_compare(x: &Value, y: &Value) -> Ordering {
    x.type_name()
        .cmp(y.type_name())
        .then_with(|| x.render().cmp(&y.render()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ScalarKind;
    use serde_json::json;

    fn map(entries: &[(&str, Value)]) -> Value {
        Value::Map(entries.iter().map(|(k, v)| (k.to_string(), v.clone())).collect())
    }

    #[test]
    fn test_null_sorts_first() {
        let artifacts = ArtifactSet::default();
        let s = Structural::new(&artifacts);
        let cmp = Comparator::Scalar(ScalarKind::Long);
        assert_eq!(s.compare_field(&cmp, &Value::Null, &Value::Long(i64::MIN)), Ordering::Less);
        assert_eq!(s.compare_field(&cmp, &Value::Long(0), &Value::Null), Ordering::Greater);
        assert_eq!(s.compare_field(&cmp, &Value::Null, &Value::Null), Ordering::Equal);
    }

    #[test]
    fn test_list_elementwise_then_length() {
        let artifacts = ArtifactSet::default();
        let s = Structural::new(&artifacts);
        let cmp = Comparator::List(Box::new(Comparator::Scalar(ScalarKind::Int)));
        let short = Value::List(vec![Value::Int(1), Value::Int(2)]);
        let long = Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(0)]);
        let big = Value::List(vec![Value::Int(3)]);
        assert_eq!(s.compare_field(&cmp, &short, &long), Ordering::Less);
        assert_eq!(s.compare_field(&cmp, &long, &big), Ordering::Less);
    }

    #[test]
    fn test_map_ordering_is_antisymmetric() {
        let artifacts = ArtifactSet::default();
        let s = Structural::new(&artifacts);
        let cmp = Comparator::Map(Box::new(Comparator::Scalar(ScalarKind::Long)));
        let a = map(&[("a", Value::Long(1)), ("c", Value::Long(5))]);
        let b = map(&[("b", Value::Long(1))]);
        let ab = s.compare_field(&cmp, &a, &b);
        let ba = s.compare_field(&cmp, &b, &a);
        assert_ne!(ab, Ordering::Equal);
        assert_eq!(ab, ba.reverse());
    }

    #[test]
    fn test_opaque_by_type_then_rendering() {
        let artifacts = ArtifactSet::default();
        let s = Structural::new(&artifacts);
        let cmp = Comparator::Opaque;
        let array = Value::Opaque(json!([1]));
        let number = Value::Opaque(json!(1));
        assert_eq!(s.compare_field(&cmp, &array, &number), Ordering::Less);
        assert!(s.field_equals(&cmp, &Value::Opaque(json!({"k": 1})), &Value::Opaque(json!({"k": 1}))));
    }

    #[test]
    fn test_mixed_numbers_compare_by_value() {
        let d = Value::Decimal(Decimal::parse("2.5").unwrap());
        assert_eq!(compare_scalars(&Value::Int(2), &d), Ordering::Less);
        assert_eq!(compare_scalars(&Value::Long(3), &d), Ordering::Greater);
    }
}
