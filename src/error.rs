//! Error types for the schema compiler

use thiserror::Error;

use crate::types::ScalarKind;

/// Result type for compiler and runtime operations
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Schema compiler errors
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Invalid type name '{text}': {reason}")]
    Grammar { text: String, reason: String },

    #[error("Unresolved object identity '{identity}' referenced from {path}")]
    UnresolvedReference { identity: String, path: String },

    #[error("Cannot decode {path}: expected {expected}, found {found}")]
    DecodeValue {
        path: String,
        expected: ScalarKind,
        found: String,
    },

    #[error("Malformed token stream at {path}: {detail}")]
    MalformedStream { path: String, detail: String },

    #[error("Duplicate field '{name}' in {parent}")]
    DuplicateField { parent: String, name: String },

    #[error("Field {path} has type {declared} but declares nested properties")]
    PropertiesOnNonStruct { path: String, declared: String },

    #[error("Field {path} declares no type and no properties")]
    UntypedField { path: String },

    #[error("Root field '{name}' must describe a struct, found {found}")]
    InvalidRoot { name: String, found: String },

    #[error("Invalid default value for {path}: {reason}")]
    InvalidDefault { path: String, reason: String },

    #[error("Cannot encode {path}: expected {expected}, found {found}")]
    EncodeValue {
        path: String,
        expected: String,
        found: String,
    },

    #[error("Record not found in artifact set: {0}")]
    UnknownRecord(String),

    #[error("Record {record} has no field '{field}'")]
    UnknownField { record: String, field: String },

    #[error("Configuration error: {0}")]
    Config(#[from] config_crate::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::ser::Error),
}

impl SchemaError {
    /// Shorthand for a grammar error on `text`
    pub(crate) fn grammar(text: &str, reason: impl Into<String>) -> Self {
        Self::Grammar {
            text: text.to_string(),
            reason: reason.into(),
        }
    }

    /// Shorthand for a structural stream error at `path`
    pub(crate) fn malformed(path: impl ToString, detail: impl Into<String>) -> Self {
        Self::MalformedStream {
            path: path.to_string(),
            detail: detail.into(),
        }
    }
}
