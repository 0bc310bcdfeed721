//! Environment overrides for configuration
//!
//! Kept in its own test binary: it mutates the process environment.

use schemac::codegen::config::UntypedPolicy;
use schemac::CompilerConfig;

#[test]
fn test_environment_overrides_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("schemac.toml");
    std::fs::write(&path, "[naming]\nroot_namespace = \"from.file\"\nencoder_suffix = \"Writer\"\n").unwrap();

    std::env::set_var("SCHEMAC__NAMING__ROOT_NAMESPACE", "from.env");
    std::env::set_var("SCHEMAC__CLASSIFICATION__UNTYPED_FIELDS", "reject");
    let config = CompilerConfig::load_from(Some(&path));
    std::env::remove_var("SCHEMAC__NAMING__ROOT_NAMESPACE");
    std::env::remove_var("SCHEMAC__CLASSIFICATION__UNTYPED_FIELDS");

    let config = config.unwrap();
    assert_eq!(config.naming.root_namespace, "from.env");
    assert_eq!(config.naming.encoder_suffix, "Writer");
    assert_eq!(config.classification.untyped_fields, UntypedPolicy::Reject);
}
