//! schemac - Schema-Driven Record and Codec Compiler
//!
//! Turns a tree of nested field descriptors into a consistent family of
//! artifacts per struct: a record definition, a stream decoder, a stream
//! encoder, structural equality/ordering/deep-copy methods and a 64-bit
//! compatibility fingerprint. Root structs also get a builder.
//!
//! ## Features
//!
//! - **Unbounded Nesting**: `LIST` and `MAP` wrap any type (`LONG_LIST_MAP`)
//! - **Shared Structs**: fields sharing an object identity share one record
//! - **Deterministic Names**: collisions resolved by a pure, ordered fold
//! - **Instruction Runtime**: generated codecs and methods run against a
//!   token stream and a dynamic value model
//!
//! ## Pipeline
//!
//! ```text
//! SchemaGraph ──validate──► Compiler::compile ──► ArtifactSet ──emit──► ArtifactSink
//!                               │                     │
//!                     names / codec / methods    runtime::{Decoder, Encoder, Structural}
//!                     fingerprint / graph (SCC)
//! ```
//!
//! ## Example
//!
//! ```
//! use schemac::{Compiler, Field, SchemaGraph, ScalarKind, Type};
//!
//! let graph = SchemaGraph::new(vec![Field::new("Order").with_properties(vec![
//!     Field::new("id").with_type(Type::Scalar(ScalarKind::Long)),
//! ])]);
//! let artifacts = Compiler::default().compile(&graph).unwrap();
//! let order = artifacts.decode_json("Order", &serde_json::json!({"id": 7})).unwrap();
//! assert_eq!(artifacts.encode_json(&order).unwrap(), serde_json::json!({"id": 7}));
//! ```

pub mod codegen;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod graph;
pub mod runtime;
pub mod schema;
pub mod types;

pub use codegen::artifacts::{
    Artifact, ArtifactSet, ArtifactSink, BuilderArtifact, RecordBuilder, RecordDefinition, RecordField,
    StructTarget,
};
pub use codegen::names::{
    resolve_identifiers, resolve_identifiers_from, ArtifactNames, QualifiedName, UsedNames,
};
pub use codegen::rust::{RustRenderer, RustTypeMappings};
pub use codegen::Compiler;
pub use config::CompilerConfig;
pub use error::{Result, SchemaError};
pub use fingerprint::Fingerprint;
pub use runtime::{Decimal, Record, Token, TokenBuffer, Value};
pub use schema::{Field, SchemaGraph};
pub use types::{classify, format_type_name, parse_type_name, LeafKind, ScalarKind, Type};
