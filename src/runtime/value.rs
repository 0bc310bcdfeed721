//! Dynamic value model for generated records

use regex::Regex;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use crate::codegen::names::QualifiedName;

static DECIMAL_LITERAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([+-])?(\d+)(?:\.(\d+))?(?:[eE]([+-]?\d+))?$").expect("decimal literal pattern")
});

/// Largest accepted decimal exponent magnitude
const MAX_EXPONENT: i64 = 4096;

// =============================================================================
// Decimal
// =============================================================================

/// Exact decimal number kept as normalized digits and a scale.
///
/// `digits` has no leading or trailing zeros (zero is `"0"` with scale 0), so
/// equal numbers have equal representations regardless of the literal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Decimal {
    negative: bool,
    digits: String,
    scale: i64,
}

impl Decimal {
    /// Parse a JSON-style numeric literal
    pub fn parse(text: &str) -> Option<Self> {
        let caps = DECIMAL_LITERAL.captures(text.trim())?;
        let negative = caps.get(1).is_some_and(|m| m.as_str() == "-");
        let int_part = caps.get(2).map_or("", |m| m.as_str());
        let frac_part = caps.get(3).map_or("", |m| m.as_str());
        let exponent: i64 = match caps.get(4) {
            Some(m) => m.as_str().parse().ok()?,
            None => 0,
        };
        if exponent.abs() > MAX_EXPONENT {
            return None;
        }
        let digits = format!("{}{}", int_part, frac_part);
        Some(Self::normalized(negative, digits, frac_part.len() as i64 - exponent))
    }

    fn normalized(negative: bool, digits: String, mut scale: i64) -> Self {
        let trimmed = digits.trim_start_matches('0');
        if trimmed.is_empty() {
            return Self::zero();
        }
        let mut digits = trimmed.to_string();
        while digits.ends_with('0') {
            digits.pop();
            scale -= 1;
        }
        Self { negative, digits, scale }
    }

    pub fn zero() -> Self {
        Self {
            negative: false,
            digits: "0".to_string(),
            scale: 0,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.digits == "0"
    }

    pub fn is_negative(&self) -> bool {
        self.negative
    }

    fn cmp_magnitude(&self, other: &Self) -> Ordering {
        match (self.is_zero(), other.is_zero()) {
            (true, true) => return Ordering::Equal,
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            (false, false) => {}
        }
        let exp_self = self.digits.len() as i64 - self.scale;
        let exp_other = other.digits.len() as i64 - other.scale;
        exp_self
            .cmp(&exp_other)
            .then_with(|| self.digits.cmp(&other.digits))
    }
}

impl Ord for Decimal {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.negative, other.negative) {
            (false, true) => Ordering::Greater,
            (true, false) => Ordering::Less,
            (false, false) => self.cmp_magnitude(other),
            (true, true) => other.cmp_magnitude(self),
        }
    }
}

impl PartialOrd for Decimal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negative {
            f.write_str("-")?;
        }
        let len = self.digits.len() as i64;
        if self.scale <= 0 {
            write!(f, "{}{}", self.digits, "0".repeat((-self.scale) as usize))
        } else if self.scale >= len {
            write!(f, "0.{}{}", "0".repeat((self.scale - len) as usize), self.digits)
        } else {
            let (int_part, frac_part) = self.digits.split_at((len - self.scale) as usize);
            write!(f, "{}.{}", int_part, frac_part)
        }
    }
}

impl From<i64> for Decimal {
    fn from(value: i64) -> Self {
        let digits = value.unsigned_abs().to_string();
        Self::normalized(value < 0, digits, 0)
    }
}

// =============================================================================
// Value
// =============================================================================

/// A runtime value held by a record field
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    String(String),
    Int(i32),
    Long(i64),
    Decimal(Decimal),
    Boolean(bool),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Record(Record),
    /// Value of an opaque struct
    Opaque(serde_json::Value),
}

static NULL: Value = Value::Null;

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Concrete type name, used to order values of unrelated types
    pub fn type_name(&self) -> &str {
        match self {
            Value::Null => "null",
            Value::String(_) => "string",
            Value::Int(_) => "int",
            Value::Long(_) => "long",
            Value::Decimal(_) => "decimal",
            Value::Boolean(_) => "boolean",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Record(r) => r.name().simple_name(),
            Value::Opaque(json) => json_type_name(json),
        }
    }

    /// Plain JSON view of the value
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;
        match self {
            Value::Null => Json::Null,
            Value::String(s) => Json::String(s.clone()),
            Value::Int(i) => Json::from(*i),
            Value::Long(l) => Json::from(*l),
            Value::Decimal(d) => serde_json::from_str::<serde_json::Number>(&d.to_string())
                .map(Json::Number)
                .unwrap_or_else(|_| Json::String(d.to_string())),
            Value::Boolean(b) => Json::Bool(*b),
            Value::List(items) => Json::Array(items.iter().map(Value::to_json).collect()),
            Value::Map(entries) => Json::Object(
                entries.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
            Value::Record(record) => Json::Object(
                record.fields().map(|(k, v)| (k.to_string(), v.to_json())).collect(),
            ),
            Value::Opaque(json) => json.clone(),
        }
    }

    /// String rendering, used to order values of the same unordered type
    pub fn render(&self) -> String {
        self.to_json().to_string()
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

pub(crate) fn json_type_name(json: &serde_json::Value) -> &'static str {
    match json {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Long(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<Decimal> for Value {
    fn from(value: Decimal) -> Self {
        Value::Decimal(value)
    }
}

impl From<Record> for Value {
    fn from(value: Record) -> Self {
        Value::Record(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::List(value)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(value: BTreeMap<String, Value>) -> Self {
        Value::Map(value)
    }
}

// =============================================================================
// Record
// =============================================================================

/// Instance of a generated record
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    name: QualifiedName,
    fields: BTreeMap<String, Value>,
}

impl Record {
    pub fn new(name: QualifiedName) -> Self {
        Self {
            name,
            fields: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &QualifiedName {
        &self.name
    }

    /// Field value; unset fields read as null
    pub fn get(&self, field: &str) -> &Value {
        self.fields.get(field).unwrap_or(&NULL)
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(field.into(), value.into());
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}
