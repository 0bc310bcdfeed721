//! Code Generation
//!
//! Compiles a schema graph into an `ArtifactSet`.
//!
//! Architecture:
//! - Compiler: immutable configuration, one `compile` call per graph
//! - CompilationRun: all per-run state (name accumulator, identity table,
//!   codec cache, finished records); created and dropped inside `compile`
//! - ArtifactSet: the complete output, handed to an `ArtifactSink`
//!
//! Records are finished depth-first, so every record's dependencies precede
//! it in the set. A run either yields the whole set or an error.

pub mod artifacts;
pub mod codec;
pub mod config;
pub mod methods;
pub mod names;
pub mod rust;

use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

use crate::config::CompilerConfig;
use crate::error::{Result, SchemaError};
use crate::fingerprint::Fingerprint;
use crate::graph::{compute_scc_analysis, RecordGraph};
use crate::runtime::{decode_detached, Value};
use crate::schema::{Field, SchemaGraph};
use crate::types::{classify, Type};

use artifacts::{ArtifactSet, BuilderArtifact, RecordDefinition, RecordField, StructTarget};
use codec::CodecCache;
use config::UntypedPolicy;
use names::{ArtifactNames, Namer, QualifiedName, UsedNames};

// =============================================================================
// Compiler
// =============================================================================

/// Schema compiler. Holds configuration only; every `compile` call starts
/// from fresh state.
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    config: CompilerConfig,
}

impl Compiler {
    pub fn new(config: CompilerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Compile every root tree of `graph`
    pub fn compile(&self, graph: &SchemaGraph) -> Result<ArtifactSet> {
        let policy = self.config.classification.untyped_fields;
        graph.validate(policy)?;

        info!(roots = graph.roots().len(), "Compiling schema graph");
        let mut run = CompilationRun::new(&self.config, graph);
        for root in graph.roots() {
            run.compile_root(root)?;
        }
        run.finish()
    }
}

// =============================================================================
// Compilation Run
// =============================================================================

struct CompilationRun<'a> {
    config: &'a CompilerConfig,
    graph: &'a SchemaGraph,
    namer: Namer<'a>,
    /// Record type names claimed so far
    type_names: UsedNames,
    /// Identity -> names of its record
    identities: HashMap<String, ArtifactNames>,
    cache: CodecCache,
    /// Finished records, dependencies first
    records: Vec<RecordDefinition>,
    roots: HashSet<QualifiedName>,
}

impl<'a> CompilationRun<'a> {
    fn new(config: &'a CompilerConfig, graph: &'a SchemaGraph) -> Self {
        Self {
            config,
            graph,
            namer: Namer::new(&config.naming),
            type_names: UsedNames::new(),
            identities: HashMap::new(),
            cache: CodecCache::new(),
            records: Vec::new(),
            roots: HashSet::new(),
        }
    }

    fn policy(&self) -> UntypedPolicy {
        self.config.classification.untyped_fields
    }

    fn is_external(&self, identity: &str) -> bool {
        self.graph.is_external(identity) || self.config.external.identities.iter().any(|i| i == identity)
    }

    fn compile_root(&mut self, root: &'a Field) -> Result<()> {
        let ty = classify(root, self.policy())?;
        if ty != Type::Struct {
            return Err(SchemaError::InvalidRoot {
                name: root.name.clone(),
                found: ty.to_string(),
            });
        }
        match self.resolve_struct(root, "", &root.name)? {
            StructTarget::Generated(names) => {
                self.roots.insert(names.record);
                Ok(())
            }
            StructTarget::Opaque => Err(SchemaError::InvalidRoot {
                name: root.name.clone(),
                found: "opaque STRUCT".to_string(),
            }),
        }
    }

    /// Resolve the record a STRUCT-leaf field points at, generating it on
    /// first sight.
    fn resolve_struct(&mut self, field: &'a Field, enclosing: &str, path: &str) -> Result<StructTarget> {
        let Some(identity) = field.object_identity.as_deref() else {
            if field.properties.is_empty() {
                return Ok(StructTarget::Opaque);
            }
            let names = self.allocate(None, enclosing, &field.name);
            self.build_record(field, names.clone(), None, path)?;
            return Ok(StructTarget::Generated(names));
        };

        let graph = self.graph;
        let owner = graph.owner_of(identity);
        if !field.properties.is_empty() && owner.is_some_and(|o| !std::ptr::eq(o, field)) {
            warn!(identity, path, "Ignoring properties re-declared for an owned identity");
        }

        if let Some(names) = self.identities.get(identity) {
            debug!(identity, path, record = %names.record, "Weak reference to shared record");
            return Ok(StructTarget::Generated(names.clone()));
        }

        match owner {
            Some(owner) => {
                let names = self.allocate(Some(identity), enclosing, &field.name);
                // Registered before recursing so self-references resolve
                self.identities.insert(identity.to_string(), names.clone());
                self.build_record(owner, names.clone(), Some(identity), path)?;
                Ok(StructTarget::Generated(names))
            }
            None if self.is_external(identity) => {
                debug!(identity, path, "External identity compiled as opaque");
                Ok(StructTarget::Opaque)
            }
            None => Err(SchemaError::UnresolvedReference {
                identity: identity.to_string(),
                path: path.to_string(),
            }),
        }
    }

    fn allocate(&mut self, identity: Option<&str>, enclosing: &str, field_name: &str) -> ArtifactNames {
        let base = self.namer.struct_base_name(identity, enclosing, field_name);
        let name = self.type_names.claim(&base, self.namer.marker());
        self.namer.artifact_names(&name)
    }

    fn build_record(
        &mut self,
        owner: &'a Field,
        names: ArtifactNames,
        identity: Option<&str>,
        path: &str,
    ) -> Result<()> {
        if !self.cache.reserve(&names.record) {
            debug!(record = %names.record, "Codec cache hit");
            return Ok(());
        }
        debug!(record = %names.record, path, "Generating record");

        let raw: Vec<&str> = owner.properties.iter().map(|p| p.name.as_str()).collect();
        let accessors = self.namer.accessors(&raw);
        let constants = self.namer.constants(&raw);

        let mut fields = Vec::with_capacity(owner.properties.len());
        for ((prop, accessor), constant) in owner.properties.iter().zip(accessors).zip(constants) {
            let prop_path = format!("{}.{}", path, prop.name);
            let ty = classify(prop, self.policy())?;
            let target = if ty.is_struct_leaf() {
                Some(self.resolve_struct(prop, names.record.simple_name(), &prop_path)?)
            } else {
                None
            };
            let default_value = match &prop.default_value {
                Some(value) => Some(compile_default(&ty, value, &prop_path)?),
                None => None,
            };
            fields.push(RecordField {
                name: prop.name.clone(),
                wire_name: prop.wire_name().to_string(),
                accessor,
                constant,
                signature: signature(&ty, target.as_ref()),
                ty,
                target,
                description: prop.description.clone(),
                default_value,
                sample_value: prop.sample_value.clone(),
                position: prop.position,
                boxed: false,
            });
        }

        let fingerprint = Fingerprint::from_shape(
            names.record.simple_name(),
            fields.iter().map(|f| (f.name.as_str(), f.signature.as_str())),
            owner.capabilities.iter().map(String::as_str),
        );
        self.cache.fill(codec::generate(&names, &fields));

        self.records.push(RecordDefinition {
            methods: methods::synthesize(&names.record, &fields),
            names,
            identity: identity.map(str::to_string),
            description: owner.description.clone(),
            fields,
            capabilities: owner.capabilities.clone(),
            fingerprint,
            root: false,
            recursive: false,
        });
        Ok(())
    }

    /// Flag cycles, attach builders and assemble the set in completion order
    fn finish(mut self) -> Result<ArtifactSet> {
        if let Some(name) = self.cache.pending().first() {
            return Err(SchemaError::UnknownRecord(format!("{} (reserved but never generated)", name)));
        }
        let graph = RecordGraph::from_records(&self.records);
        let analysis = compute_scc_analysis(&graph);
        let mut set = ArtifactSet::default();

        for mut record in std::mem::take(&mut self.records) {
            let name = record.name().clone();
            record.recursive = analysis.is_cyclic(&name);
            debug!(
                record = %name,
                dependencies = graph.dependencies(&name).len(),
                recursive = record.recursive,
                "Finishing record"
            );
            record.root = self.roots.contains(&name);
            for field in &mut record.fields {
                field.boxed = analysis.needs_boxing(&name, &field.name);
            }

            let pair = self
                .cache
                .take(&name)
                .ok_or_else(|| SchemaError::UnknownRecord(name.to_string()))?;
            let builder = record.root.then(|| builder_for(&record));
            set.push_record(record, pair.decoder, pair.encoder, builder);
        }

        info!(
            records = graph.node_count(),
            references = graph.edge_count(),
            artifacts = set.len(),
            cycles = analysis.groups.len(),
            "Compilation complete"
        );
        Ok(set)
    }
}

/// Canonical type text with the STRUCT leaf replaced by the target record's
/// simple name
fn signature(ty: &Type, target: Option<&StructTarget>) -> String {
    match ty {
        Type::Scalar(kind) => kind.token().to_string(),
        Type::Struct => target
            .and_then(|t| t.record())
            .map(|r| r.simple_name().to_string())
            .unwrap_or_else(|| Type::Struct.to_string()),
        Type::List(inner) => format!("{}_LIST", signature(inner, target)),
        Type::Map(inner) => format!("{}_MAP", signature(inner, target)),
    }
}

/// Validate a declared default against the field's type
fn compile_default(ty: &Type, value: &serde_json::Value, path: &str) -> Result<Value> {
    if ty.is_struct_leaf() {
        return Err(SchemaError::InvalidDefault {
            path: path.to_string(),
            reason: format!("defaults are not supported on {} fields", ty),
        });
    }
    decode_detached(&codec::decode_op(ty, None), value, path).map_err(|e| SchemaError::InvalidDefault {
        path: path.to_string(),
        reason: e.to_string(),
    })
}

fn builder_for(record: &RecordDefinition) -> BuilderArtifact {
    let mut positional: Vec<(u32, usize, &RecordField)> = record
        .fields
        .iter()
        .enumerate()
        .filter_map(|(i, f)| f.position.map(|p| (p, i, f)))
        .collect();
    positional.sort_by_key(|(p, i, _)| (*p, *i));

    BuilderArtifact {
        name: record.names.builder.clone(),
        record: record.name().clone(),
        positional: positional.into_iter().map(|(_, _, f)| f.name.clone()).collect(),
        setters: record
            .fields
            .iter()
            .filter(|f| f.position.is_none())
            .map(|f| f.name.clone())
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ScalarKind;
    use serde_json::json;

    fn string(name: &str) -> Field {
        Field::new(name).with_type(Type::Scalar(ScalarKind::String))
    }

    #[test]
    fn test_signature_names_struct_leaf() {
        let config = config::NamingConfig::default();
        let target = StructTarget::Generated(Namer::new(&config).artifact_names("Address"));
        assert_eq!(signature(&Type::list(Type::Struct), Some(&target)), "Address_LIST");
        assert_eq!(signature(&Type::map(Type::Struct), Some(&StructTarget::Opaque)), "STRUCT_MAP");
        assert_eq!(signature(&Type::Scalar(ScalarKind::Long), None), "LONG");
    }

    #[test]
    fn test_default_on_struct_rejected() {
        let err = compile_default(&Type::Struct, &json!({}), "Order.meta").unwrap_err();
        assert!(matches!(err, SchemaError::InvalidDefault { .. }));
    }

    #[test]
    fn test_default_must_coerce() {
        let ok = compile_default(&Type::Scalar(ScalarKind::Int), &json!(3), "Order.qty").unwrap();
        assert_eq!(ok, Value::Int(3));
        let err = compile_default(&Type::Scalar(ScalarKind::Int), &json!("three"), "Order.qty").unwrap_err();
        match err {
            SchemaError::InvalidDefault { path, .. } => assert_eq!(path, "Order.qty"),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_root_must_be_struct() {
        let graph = SchemaGraph::new(vec![string("Order")]);
        let err = Compiler::default().compile(&graph).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidRoot { .. }));

        let graph = SchemaGraph::new(vec![Field::new("Blob").with_type(Type::Struct)]);
        assert!(matches!(
            Compiler::default().compile(&graph),
            Err(SchemaError::InvalidRoot { .. })
        ));
    }

    #[test]
    fn test_builder_positions() {
        let graph = SchemaGraph::new(vec![Field::new("Order").with_properties(vec![
            string("note"),
            string("sku").with_position(1),
            string("id").with_position(0),
            string("extra").with_position(1),
        ])]);
        let set = Compiler::default().compile(&graph).unwrap();
        let record = set.record("Order").unwrap();
        let builder = set.builder_for(record.name()).unwrap();
        assert_eq!(builder.positional, vec!["id", "sku", "extra"]);
        assert_eq!(builder.setters, vec!["note"]);
        assert_eq!(builder.name.simple_name(), "OrderBuilder");
    }

    #[test]
    fn test_nested_records_precede_parents() {
        let graph = SchemaGraph::new(vec![Field::new("Order").with_properties(vec![
            Field::new("customer").with_properties(vec![
                string("name"),
                Field::new("address").with_properties(vec![string("city")]),
            ]),
        ])]);
        let set = Compiler::default().compile(&graph).unwrap();
        let names: Vec<_> = set.records().map(|r| r.name().simple_name().to_string()).collect();
        assert_eq!(names, vec!["OrderCustomerAddress", "OrderCustomer", "Order"]);
        assert!(set.record("Order").unwrap().root);
        assert!(!set.record("OrderCustomer").unwrap().root);
        assert!(set.builder_for(set.record("OrderCustomer").unwrap().name()).is_none());
    }
}
