//! Structural Method Tests
//!
//! Equality, total ordering and deep copy on decoded records.

use std::cmp::Ordering;

use serde_json::json;

use schemac::{ArtifactSet, Compiler, Record, SchemaGraph};

fn orders() -> ArtifactSet {
    let graph = SchemaGraph::from_json(serde_json::from_str(include_str!("fixtures/orders.json")).unwrap())
        .unwrap();
    Compiler::default().compile(&graph).unwrap()
}

fn samples(set: &ArtifactSet) -> Vec<Record> {
    [
        json!({
            "id": 1,
            "customer": {"name": "Ada", "address": {"city": "Oslo", "zip": 150}},
            "lines": [{"sku": "A", "qty": 2, "price": "9.99"}],
            "tags": {"gift": "yes", "rush": null}
        }),
        json!({
            "id": 1,
            "customer": {"name": "Ada", "address": {"city": "Oslo", "zip": 150}},
            "lines": [{"sku": "A", "qty": 2, "price": 9.990}, {"sku": "B"}],
            "tags": {"gift": "yes"}
        }),
        json!({
            "id": 1,
            "customer": {"name": "Ada", "address": null},
            "tags": {"audit": "no", "gift": "yes"},
            "note": "leave at door"
        }),
    ]
    .iter()
    .map(|doc| set.decode_json("Order", doc).unwrap())
    .collect()
}

#[test]
fn test_ordering_is_total() {
    let set = orders();
    let methods = set.structural();
    let values = samples(&set);

    for x in &values {
        assert_eq!(methods.compare(x, x), Ordering::Equal);
        for y in &values {
            assert_eq!(methods.compare(x, y), methods.compare(y, x).reverse());
        }
    }

    for x in &values {
        for y in &values {
            for z in &values {
                if methods.compare(x, y) != Ordering::Greater && methods.compare(y, z) != Ordering::Greater {
                    assert_ne!(methods.compare(x, z), Ordering::Greater);
                }
            }
        }
    }
}

#[test]
fn test_ordering_follows_fields() {
    let set = orders();
    let methods = set.structural();
    let values = samples(&set);

    // Equal up to `lines`; a shorter list with equal prefix sorts first
    assert_eq!(methods.compare(&values[0], &values[1]), Ordering::Less);
    // Null address sorts before a present one
    assert_eq!(methods.compare(&values[2], &values[0]), Ordering::Less);

    let mut sorted = values.clone();
    sorted.sort_by(|a, b| methods.compare(a, b));
    assert_eq!(sorted, vec![values[2].clone(), values[0].clone(), values[1].clone()]);
}

#[test]
fn test_decimal_equality_is_numeric() {
    let set = orders();
    let methods = set.structural();
    let a = set.decode_json("OrderLines", &json!({"sku": "A", "price": "9.990"})).unwrap();
    let b = set.decode_json("OrderLines", &json!({"sku": "A", "price": 9.99})).unwrap();
    assert!(methods.equals(&a, &b));
    assert_eq!(methods.compare(&a, &b), Ordering::Equal);
}

#[test]
fn test_different_kinds_never_equal() {
    let set = orders();
    let methods = set.structural();
    let address = set.new_record("Address").unwrap();
    let customer = set.new_record("Customer").unwrap();

    assert!(!methods.equals(&address, &customer));
    assert_eq!(methods.compare(&address, &customer), Ordering::Less);
    assert_eq!(methods.compare(&customer, &address), Ordering::Greater);
}

#[test]
fn test_deep_copy_is_equal_and_independent() {
    let set = orders();
    let methods = set.structural();

    for original in samples(&set) {
        let copy = methods.deep_copy(&original);
        assert!(methods.equals(&original, &copy));
        assert_eq!(methods.compare(&original, &copy), Ordering::Equal);

        let mut changed = copy.clone();
        changed.set("id", 99i64);
        assert!(!methods.equals(&original, &changed));
        assert!(methods.equals(&original, &copy));
    }
}
