//! Type Algebra
//!
//! The field type grammar: five scalar kinds, opaque/nested structs, and
//! string-keyed maps and lists that wrap any type to arbitrary depth.
//!
//! Canonical text form is `<SUBTYPE>_<KIND>` read right to left, so
//! `STRING_LIST_MAP` is a map of lists of strings. Scalar tokens and `STRUCT`
//! are terminal and may only appear as the innermost token.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::codegen::config::UntypedPolicy;
use crate::error::{Result, SchemaError};
use crate::schema::Field;

const STRUCT_TOKEN: &str = "STRUCT";
const LIST_TOKEN: &str = "LIST";
const MAP_TOKEN: &str = "MAP";

// =============================================================================
// Scalar Kind
// =============================================================================

/// Terminal scalar kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScalarKind {
    String,
    Int,
    Long,
    Decimal,
    Boolean,
}

impl ScalarKind {
    /// Every scalar kind, in grammar order
    pub const ALL: [ScalarKind; 5] = [
        ScalarKind::String,
        ScalarKind::Int,
        ScalarKind::Long,
        ScalarKind::Decimal,
        ScalarKind::Boolean,
    ];

    /// Grammar token for this kind
    pub fn token(&self) -> &'static str {
        match self {
            ScalarKind::String => "STRING",
            ScalarKind::Int => "INT",
            ScalarKind::Long => "LONG",
            ScalarKind::Decimal => "DECIMAL",
            ScalarKind::Boolean => "BOOLEAN",
        }
    }

    /// Look up a kind by its grammar token
    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.token() == token)
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

// =============================================================================
// Type
// =============================================================================

/// Innermost non-collection kind of a type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LeafKind {
    Scalar(ScalarKind),
    Struct,
}

/// Field type descriptor
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Type {
    Scalar(ScalarKind),
    Struct,
    List(Box<Type>),
    Map(Box<Type>),
}

impl Type {
    pub fn list(item: Type) -> Self {
        Type::List(Box::new(item))
    }

    pub fn map(value: Type) -> Self {
        Type::Map(Box::new(value))
    }

    /// Strip LIST/MAP layers down to the leaf
    pub fn leaf_kind(&self) -> LeafKind {
        match self {
            Type::Scalar(kind) => LeafKind::Scalar(*kind),
            Type::Struct => LeafKind::Struct,
            Type::List(inner) | Type::Map(inner) => inner.leaf_kind(),
        }
    }

    pub fn is_struct_leaf(&self) -> bool {
        self.leaf_kind() == LeafKind::Struct
    }

    /// Number of collection layers around the leaf
    pub fn depth(&self) -> usize {
        match self {
            Type::Scalar(_) | Type::Struct => 0,
            Type::List(inner) | Type::Map(inner) => 1 + inner.depth(),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Scalar(kind) => f.write_str(kind.token()),
            Type::Struct => f.write_str(STRUCT_TOKEN),
            Type::List(inner) => write!(f, "{}_{}", inner, LIST_TOKEN),
            Type::Map(inner) => write!(f, "{}_{}", inner, MAP_TOKEN),
        }
    }
}

impl FromStr for Type {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self> {
        parse_type_name(s)
    }
}

impl TryFrom<String> for Type {
    type Error = SchemaError;

    fn try_from(value: String) -> Result<Self> {
        parse_type_name(&value)
    }
}

impl From<Type> for String {
    fn from(ty: Type) -> Self {
        format_type_name(&ty)
    }
}

// =============================================================================
// Grammar
// =============================================================================

/// Parse canonical type text. Malformed text is always an error.
pub fn parse_type_name(text: &str) -> Result<Type> {
    if text.is_empty() {
        return Err(SchemaError::grammar(text, "empty type name"));
    }
    parse_segment(text, text)
}

fn parse_segment(whole: &str, text: &str) -> Result<Type> {
    if text.is_empty() {
        return Err(SchemaError::grammar(whole, "empty segment"));
    }
    if let Some(kind) = ScalarKind::from_token(text) {
        return Ok(Type::Scalar(kind));
    }
    if text == STRUCT_TOKEN {
        return Ok(Type::Struct);
    }
    if text == LIST_TOKEN || text == MAP_TOKEN {
        return Err(SchemaError::grammar(
            whole,
            format!("{} requires a subtype", text),
        ));
    }

    let Some((subtype, suffix)) = text.rsplit_once('_') else {
        return Err(SchemaError::grammar(whole, format!("unknown token '{}'", text)));
    };

    match suffix {
        LIST_TOKEN => Ok(Type::list(parse_segment(whole, subtype)?)),
        MAP_TOKEN => Ok(Type::map(parse_segment(whole, subtype)?)),
        "" => Err(SchemaError::grammar(whole, "empty segment")),
        terminal if ScalarKind::from_token(terminal).is_some() || terminal == STRUCT_TOKEN => {
            Err(SchemaError::grammar(
                whole,
                format!("terminal token {} cannot follow a subtype", terminal),
            ))
        }
        other => Err(SchemaError::grammar(whole, format!("unknown token '{}'", other))),
    }
}

/// Render canonical type text
pub fn format_type_name(ty: &Type) -> String {
    ty.to_string()
}

// =============================================================================
// Classification
// =============================================================================

/// Determine the effective type of a field.
///
/// Explicit declarations win; otherwise properties or an object identity make
/// a STRUCT; otherwise `policy` decides between STRING and an error.
pub fn classify(field: &Field, policy: UntypedPolicy) -> Result<Type> {
    if let Some(ty) = &field.declared_type {
        return Ok(ty.clone());
    }
    if !field.properties.is_empty() || field.object_identity.is_some() {
        return Ok(Type::Struct);
    }
    match policy {
        UntypedPolicy::DefaultToString => Ok(Type::Scalar(ScalarKind::String)),
        UntypedPolicy::Reject => Err(SchemaError::UntypedField {
            path: field.name.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_terminals() {
        assert_eq!(parse_type_name("STRING").unwrap(), Type::Scalar(ScalarKind::String));
        assert_eq!(parse_type_name("DECIMAL").unwrap(), Type::Scalar(ScalarKind::Decimal));
        assert_eq!(parse_type_name("STRUCT").unwrap(), Type::Struct);
    }

    #[test]
    fn test_parse_nested() {
        let ty = parse_type_name("STRING_LIST_MAP").unwrap();
        assert_eq!(ty, Type::map(Type::list(Type::Scalar(ScalarKind::String))));
        assert_eq!(ty.depth(), 2);
        assert_eq!(ty.leaf_kind(), LeafKind::Scalar(ScalarKind::String));

        let ty = parse_type_name("STRUCT_MAP_LIST").unwrap();
        assert_eq!(ty, Type::list(Type::map(Type::Struct)));
        assert!(ty.is_struct_leaf());
    }

    #[test]
    fn test_format() {
        let ty = Type::list(Type::map(Type::list(Type::Scalar(ScalarKind::Long))));
        assert_eq!(format_type_name(&ty), "LONG_LIST_MAP_LIST");
    }

    #[test]
    fn test_grammar_errors() {
        for bad in ["", "LIST", "MAP", "INT_STRING", "STRUCT_STRUCT", "STRING__LIST", "_LIST",
                    "STRING_", "string", "FLOAT", "STRING_SET", "STRING_LIST_INT"] {
            assert!(
                matches!(parse_type_name(bad), Err(SchemaError::Grammar { .. })),
                "expected grammar error for {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_serde_uses_canonical_text() {
        let ty = Type::map(Type::Scalar(ScalarKind::Int));
        let json = serde_json::to_string(&ty).unwrap();
        assert_eq!(json, "\"INT_MAP\"");
        let back: Type = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ty);
        assert!(serde_json::from_str::<Type>("\"INT_BOOLEAN\"").is_err());
    }

    #[test]
    fn test_classify() {
        let explicit = Field::new("count").with_type(Type::Scalar(ScalarKind::Int));
        assert_eq!(
            classify(&explicit, UntypedPolicy::DefaultToString).unwrap(),
            Type::Scalar(ScalarKind::Int)
        );

        let nested = Field::new("address").with_properties(vec![Field::new("city")]);
        assert_eq!(classify(&nested, UntypedPolicy::Reject).unwrap(), Type::Struct);

        let shared = Field::new("owner").with_identity("Person");
        assert_eq!(classify(&shared, UntypedPolicy::Reject).unwrap(), Type::Struct);

        let bare = Field::new("note");
        assert_eq!(
            classify(&bare, UntypedPolicy::DefaultToString).unwrap(),
            Type::Scalar(ScalarKind::String)
        );
        assert!(matches!(
            classify(&bare, UntypedPolicy::Reject),
            Err(SchemaError::UntypedField { .. })
        ));
    }
}
