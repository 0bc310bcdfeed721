//! Codegen Configuration
//!
//! Settings that shape generated artifacts:
//! - NamingConfig: namespaces, suffixes, collision marker, acronyms
//! - ClassificationConfig: how untyped fields are treated
//!
//! Instruction generation and structural methods are config-free; only naming
//! and classification read these values.

use std::collections::HashSet;
use serde::{Deserialize, Serialize};

// =============================================================================
// Naming
// =============================================================================

/// Naming configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingConfig {
    /// Root namespace every artifact lives under
    pub root_namespace: String,

    /// Sibling namespaces below the root
    pub model_namespace: String,
    pub encoder_namespace: String,
    pub decoder_namespace: String,
    pub builder_namespace: String,

    /// Suffixes appended to the record name
    pub encoder_suffix: String,
    pub decoder_suffix: String,
    pub builder_suffix: String,

    /// Appended (repeatedly) to resolve identifier collisions
    pub collision_marker: char,

    /// Acronyms to preserve (e.g., ID, URL, UUID, API)
    pub acronyms: HashSet<String>,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            root_namespace: "generated".to_string(),
            model_namespace: "model".to_string(),
            encoder_namespace: "encoder".to_string(),
            decoder_namespace: "decoder".to_string(),
            builder_namespace: "builder".to_string(),
            encoder_suffix: "Encoder".to_string(),
            decoder_suffix: "Decoder".to_string(),
            builder_suffix: "Builder".to_string(),
            collision_marker: '_',
            acronyms: ["ID", "URL", "UUID", "API", "HTTP", "JSON", "XML", "SQL", "URI", "UI", "IO"]
                .iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl NamingConfig {
    /// Full namespace for one of the sibling namespaces
    pub fn namespace(&self, leaf: &str) -> String {
        if self.root_namespace.is_empty() {
            leaf.to_string()
        } else {
            format!("{}.{}", self.root_namespace, leaf)
        }
    }
}

// =============================================================================
// Classification
// =============================================================================

/// What to do with a field that declares neither a type nor properties
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UntypedPolicy {
    /// Treat it as a STRING scalar
    #[default]
    DefaultToString,
    /// Fail compilation with `SchemaError::UntypedField`
    Reject,
}

/// Classification configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationConfig {
    pub untyped_fields: UntypedPolicy,
}
