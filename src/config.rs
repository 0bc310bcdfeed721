//! Configuration management for the schema compiler
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (schemac.toml)
//! - Environment variables (SCHEMAC__*)
//!
//! ## Example config file (schemac.toml):
//! ```toml
//! [naming]
//! root_namespace = "com.acme.api"
//! collision_marker = "_"
//! acronyms = ["ID", "URL"]
//!
//! [classification]
//! untyped_fields = "reject"
//!
//! [external]
//! identities = ["Instant", "Money"]
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::codegen::config::{ClassificationConfig, NamingConfig};
use crate::error::Result;

/// Main configuration for the compiler
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompilerConfig {
    /// Naming settings
    #[serde(default)]
    pub naming: NamingConfig,

    /// Type classification settings
    #[serde(default)]
    pub classification: ClassificationConfig,

    /// Externally provided struct identities
    #[serde(default)]
    pub external: ExternalConfig,
}

/// Identities implemented outside the compilation unit
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExternalConfig {
    #[serde(default)]
    pub identities: Vec<String>,
}

impl CompilerConfig {
    /// Load configuration from default locations
    pub fn load() -> std::result::Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, adding a required file on top of the defaults
    pub fn load_from(config_path: Option<&Path>) -> std::result::Result<Self, ConfigError> {
        let mut builder = Config::builder();

        // Load from default locations
        let config_locations = [
            "schemac.toml",
            ".schemac.toml",
            "config/schemac.toml",
        ];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // Load from XDG config directory
        if let Some(config_dir) = directories::ProjectDirs::from("dev", "familiar", "schemac") {
            let xdg_config = config_dir.config_dir().join("schemac.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        // Load from specified path
        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }

        // Load from environment variables (SCHEMAC__*)
        builder = builder.add_source(
            Environment::with_prefix("SCHEMAC")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::config::UntypedPolicy;

    #[test]
    fn test_default_config() {
        let config = CompilerConfig::default();
        assert_eq!(config.naming.collision_marker, '_');
        assert_eq!(config.classification.untyped_fields, UntypedPolicy::DefaultToString);
        assert!(config.external.identities.is_empty());
    }

    #[test]
    fn test_serialize_config() {
        let config = CompilerConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[naming]"));
        assert!(toml_str.contains("[classification]"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schemac.toml");
        std::fs::write(
            &path,
            r#"
[naming]
root_namespace = "com.acme.api"

[classification]
untyped_fields = "reject"

[external]
identities = ["Instant"]
"#,
        )
        .unwrap();

        let config = CompilerConfig::load_from(Some(&path)).unwrap();
        assert_eq!(config.naming.root_namespace, "com.acme.api");
        assert_eq!(config.naming.encoder_suffix, "Encoder");
        assert_eq!(config.classification.untyped_fields, UntypedPolicy::Reject);
        assert_eq!(config.external.identities, vec!["Instant".to_string()]);
    }

    #[test]
    fn test_save_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.toml");
        let mut config = CompilerConfig::default();
        config.naming.root_namespace = "acme".to_string();
        config.save(&path).unwrap();

        let loaded = CompilerConfig::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.naming.root_namespace, "acme");
    }
}
