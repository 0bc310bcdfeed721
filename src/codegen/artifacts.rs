//! Generated artifacts
//!
//! What a compilation run hands to emission collaborators: one record
//! definition, decoder and encoder per generated struct, plus a builder for
//! every root struct. Artifacts carry fully-qualified logical names and a
//! structured body; rendering them into source text is the sink's job.

use std::collections::HashMap;

use super::codec::{DecoderArtifact, EncoderArtifact};
use super::methods::StructuralMethods;
use super::names::{ArtifactNames, QualifiedName};
use crate::error::{Result, SchemaError};
use crate::fingerprint::Fingerprint;
use crate::runtime::{Decoder, Encoder, Record, Structural, TokenBuffer, TokenReader, TokenWriter, Value};
use crate::types::Type;

// =============================================================================
// Record Definition
// =============================================================================

/// What a STRUCT-leaf field points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructTarget {
    /// A record generated in this run
    Generated(ArtifactNames),
    /// No generated properties: read and written as a generic value
    Opaque,
}

impl StructTarget {
    pub fn record(&self) -> Option<&QualifiedName> {
        match self {
            StructTarget::Generated(names) => Some(&names.record),
            StructTarget::Opaque => None,
        }
    }
}

/// A field of a generated record
#[derive(Debug, Clone, PartialEq)]
pub struct RecordField {
    pub name: String,
    pub wire_name: String,
    /// Collision-free accessor identifier
    pub accessor: String,
    /// Collision-free constant identifier (holds the wire name)
    pub constant: String,
    pub ty: Type,
    /// Present for STRUCT leaf kinds
    pub target: Option<StructTarget>,
    /// Type text that participates in the fingerprint
    pub signature: String,
    pub description: Option<String>,
    pub default_value: Option<Value>,
    pub sample_value: Option<serde_json::Value>,
    pub position: Option<u32>,
    /// Direct reference into the record's own cycle
    pub boxed: bool,
}

/// Structural record definition
#[derive(Debug, Clone, PartialEq)]
pub struct RecordDefinition {
    pub names: ArtifactNames,
    pub identity: Option<String>,
    pub description: Option<String>,
    pub fields: Vec<RecordField>,
    pub capabilities: Vec<String>,
    pub fingerprint: Fingerprint,
    pub methods: StructuralMethods,
    /// Generated for a root tree
    pub root: bool,
    /// Part of a reference cycle
    pub recursive: bool,
}

impl RecordDefinition {
    pub fn name(&self) -> &QualifiedName {
        &self.names.record
    }

    pub fn field(&self, name: &str) -> Option<&RecordField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Builder for a root record
#[derive(Debug, Clone, PartialEq)]
pub struct BuilderArtifact {
    pub name: QualifiedName,
    pub record: QualifiedName,
    /// Fields taken positionally, ordered by positional hint
    pub positional: Vec<String>,
    /// Remaining fields, set by name, in declaration order
    pub setters: Vec<String>,
}

/// Runtime counterpart of a builder artifact
#[derive(Debug, Clone)]
pub struct RecordBuilder<'a> {
    builder: &'a BuilderArtifact,
    record: Record,
}

impl<'a> RecordBuilder<'a> {
    pub fn new(builder: &'a BuilderArtifact, initial: Record) -> Self {
        Self { builder, record: initial }
    }

    /// Fill positional parameters in order
    pub fn positional<I>(mut self, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = Value>,
    {
        let mut slots = self.builder.positional.iter();
        for value in values {
            let Some(field) = slots.next() else {
                return Err(SchemaError::UnknownField {
                    record: self.builder.record.to_string(),
                    field: format!("<positional #{}>", self.builder.positional.len() + 1),
                });
            };
            self.record.set(field.clone(), value);
        }
        Ok(self)
    }

    /// Set any declared field by name
    pub fn set(mut self, field: &str, value: impl Into<Value>) -> Result<Self> {
        let declared = self.builder.positional.iter().chain(&self.builder.setters).any(|f| f == field);
        if !declared {
            return Err(SchemaError::UnknownField {
                record: self.builder.record.to_string(),
                field: field.to_string(),
            });
        }
        self.record.set(field, value.into());
        Ok(self)
    }

    pub fn build(self) -> Record {
        self.record
    }
}

// =============================================================================
// Artifact Set
// =============================================================================

/// One generated artifact
#[derive(Debug, Clone)]
pub enum Artifact {
    Record(RecordDefinition),
    Decoder(DecoderArtifact),
    Encoder(EncoderArtifact),
    Builder(BuilderArtifact),
}

impl Artifact {
    pub fn name(&self) -> &QualifiedName {
        match self {
            Artifact::Record(r) => r.name(),
            Artifact::Decoder(d) => &d.name,
            Artifact::Encoder(e) => &e.name,
            Artifact::Builder(b) => &b.name,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Artifact::Record(_) => "record",
            Artifact::Decoder(_) => "decoder",
            Artifact::Encoder(_) => "encoder",
            Artifact::Builder(_) => "builder",
        }
    }
}

/// Emission collaborator
pub trait ArtifactSink {
    /// Receive one artifact; called in dependency order
    fn accept(&mut self, artifact: &Artifact) -> Result<()>;

    /// Called once after the last artifact
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Default, Clone)]
struct RecordSlots {
    record: usize,
    decoder: usize,
    encoder: usize,
    builder: Option<usize>,
}

/// The complete, internally consistent output of one compilation run
#[derive(Debug, Clone, Default)]
pub struct ArtifactSet {
    artifacts: Vec<Artifact>,
    slots: HashMap<QualifiedName, RecordSlots>,
    /// Simple and qualified spellings -> record name
    lookup: HashMap<String, QualifiedName>,
}

impl ArtifactSet {
    /// Append the artifacts of one record; dependencies must come first
    pub(crate) fn push_record(
        &mut self,
        definition: RecordDefinition,
        decoder: DecoderArtifact,
        encoder: EncoderArtifact,
        builder: Option<BuilderArtifact>,
    ) {
        let name = definition.name().clone();
        let mut slots = RecordSlots {
            record: self.artifacts.len(),
            ..RecordSlots::default()
        };
        self.artifacts.push(Artifact::Record(definition));
        slots.decoder = self.artifacts.len();
        self.artifacts.push(Artifact::Decoder(decoder));
        slots.encoder = self.artifacts.len();
        self.artifacts.push(Artifact::Encoder(encoder));
        if let Some(builder) = builder {
            slots.builder = Some(self.artifacts.len());
            self.artifacts.push(Artifact::Builder(builder));
        }

        self.lookup.insert(name.to_string(), name.clone());
        self.lookup.entry(name.name.clone()).or_insert_with(|| name.clone());
        self.slots.insert(name, slots);
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    /// All artifacts in dependency order
    pub fn iter(&self) -> impl Iterator<Item = &Artifact> {
        self.artifacts.iter()
    }

    /// All record definitions in dependency order
    pub fn records(&self) -> impl Iterator<Item = &RecordDefinition> {
        self.artifacts.iter().filter_map(|a| match a {
            Artifact::Record(r) => Some(r),
            _ => None,
        })
    }

    /// Resolve a simple or qualified record name
    pub fn resolve(&self, name: &str) -> Result<&QualifiedName> {
        self.lookup
            .get(name)
            .ok_or_else(|| SchemaError::UnknownRecord(name.to_string()))
    }

    pub fn record(&self, name: &str) -> Option<&RecordDefinition> {
        let qualified = self.lookup.get(name)?;
        self.record_by_name(qualified)
    }

    pub fn record_by_name(&self, name: &QualifiedName) -> Option<&RecordDefinition> {
        match self.slots.get(name).map(|s| &self.artifacts[s.record]) {
            Some(Artifact::Record(r)) => Some(r),
            _ => None,
        }
    }

    pub fn decoder_for(&self, record: &QualifiedName) -> Option<&DecoderArtifact> {
        match self.slots.get(record).map(|s| &self.artifacts[s.decoder]) {
            Some(Artifact::Decoder(d)) => Some(d),
            _ => None,
        }
    }

    pub fn encoder_for(&self, record: &QualifiedName) -> Option<&EncoderArtifact> {
        match self.slots.get(record).map(|s| &self.artifacts[s.encoder]) {
            Some(Artifact::Encoder(e)) => Some(e),
            _ => None,
        }
    }

    pub fn builder_for(&self, record: &QualifiedName) -> Option<&BuilderArtifact> {
        let index = self.slots.get(record)?.builder?;
        match &self.artifacts[index] {
            Artifact::Builder(b) => Some(b),
            _ => None,
        }
    }

    pub fn methods_for(&self, record: &QualifiedName) -> Option<&StructuralMethods> {
        self.record_by_name(record).map(|r| &r.methods)
    }

    /// A fresh record in its initial state (declared defaults, else null)
    pub fn new_record(&self, name: &str) -> Result<Record> {
        let qualified = self.resolve(name)?;
        self.decoder_for(qualified)
            .map(DecoderArtifact::initial_record)
            .ok_or_else(|| SchemaError::UnknownRecord(name.to_string()))
    }

    /// Builder for a root record
    pub fn builder(&self, name: &str) -> Result<RecordBuilder<'_>> {
        let qualified = self.resolve(name)?;
        let builder = self
            .builder_for(qualified)
            .ok_or_else(|| SchemaError::UnknownRecord(format!("{} (no builder)", name)))?;
        Ok(RecordBuilder::new(builder, self.new_record(name)?))
    }

    /// Decode a record of kind `name` from a token stream
    pub fn decode(&self, name: &str, reader: &mut dyn TokenReader) -> Result<Record> {
        let qualified = self.resolve(name)?;
        Decoder::new(self).decode(qualified, reader)
    }

    pub fn decode_json(&self, name: &str, value: &serde_json::Value) -> Result<Record> {
        self.decode(name, &mut TokenBuffer::from_json(value))
    }

    /// Encode a record with the encoder generated for its kind
    pub fn encode(&self, record: &Record, writer: &mut dyn TokenWriter) -> Result<()> {
        Encoder::new(self).encode(record, writer)
    }

    pub fn encode_json(&self, record: &Record) -> Result<serde_json::Value> {
        let mut buffer = TokenBuffer::new();
        self.encode(record, &mut buffer)?;
        buffer.to_json()
    }

    /// Equality, ordering and deep copy for records of this set
    pub fn structural(&self) -> Structural<'_> {
        Structural::new(self)
    }

    /// Hand every artifact to an emission collaborator
    pub fn emit(&self, sink: &mut dyn ArtifactSink) -> Result<()> {
        for artifact in &self.artifacts {
            sink.accept(artifact)?;
        }
        sink.finish()
    }
}
