//! Codec Instruction Generator
//!
//! Derives a decode instruction and a symmetric encode instruction for every
//! field by recursive descent over its type:
//!
//! | Type          | Decode                         | Encode                          |
//! |---------------|--------------------------------|---------------------------------|
//! | SCALAR(k)     | read token as `k`              | write `k` as token              |
//! | LIST(item)    | iterate array, recurse on item | open array, recurse, close      |
//! | MAP(value)    | iterate entries, recurse       | write key, recurse on value     |
//! | STRUCT opaque | read any value                 | write any value                 |
//! | STRUCT        | delegate to the struct decoder | delegate to the struct encoder  |
//!
//! Struct codecs are generated once per record name. `CodecCache` holds a
//! reservation for a record while its fields are being generated so that a
//! self-reference becomes a forward reference instead of a recursion.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::artifacts::{RecordField, StructTarget};
use super::names::{ArtifactNames, QualifiedName};
use crate::runtime::{Record, Value};
use crate::types::{ScalarKind, Type};

// =============================================================================
// Instructions
// =============================================================================

/// Decode instruction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecodeOp {
    ReadScalar(ScalarKind),
    ReadList(Box<DecodeOp>),
    ReadMap(Box<DecodeOp>),
    ReadOpaque,
    ReadStruct {
        record: QualifiedName,
        decoder: QualifiedName,
    },
}

/// Encode instruction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EncodeOp {
    WriteScalar(ScalarKind),
    WriteList(Box<EncodeOp>),
    WriteMap(Box<EncodeOp>),
    WriteOpaque,
    WriteStruct {
        record: QualifiedName,
        encoder: QualifiedName,
    },
}

/// Decode instruction for `ty`. STRUCT leaves without a generated target
/// become opaque reads.
pub fn decode_op(ty: &Type, target: Option<&StructTarget>) -> DecodeOp {
    match ty {
        Type::Scalar(kind) => DecodeOp::ReadScalar(*kind),
        Type::List(item) => DecodeOp::ReadList(Box::new(decode_op(item, target))),
        Type::Map(value) => DecodeOp::ReadMap(Box::new(decode_op(value, target))),
        Type::Struct => match target {
            Some(StructTarget::Generated(names)) => DecodeOp::ReadStruct {
                record: names.record.clone(),
                decoder: names.decoder.clone(),
            },
            Some(StructTarget::Opaque) | None => DecodeOp::ReadOpaque,
        },
    }
}

/// Encode instruction for `ty`, mirroring [`decode_op`]
pub fn encode_op(ty: &Type, target: Option<&StructTarget>) -> EncodeOp {
    match ty {
        Type::Scalar(kind) => EncodeOp::WriteScalar(*kind),
        Type::List(item) => EncodeOp::WriteList(Box::new(encode_op(item, target))),
        Type::Map(value) => EncodeOp::WriteMap(Box::new(encode_op(value, target))),
        Type::Struct => match target {
            Some(StructTarget::Generated(names)) => EncodeOp::WriteStruct {
                record: names.record.clone(),
                encoder: names.encoder.clone(),
            },
            Some(StructTarget::Opaque) | None => EncodeOp::WriteOpaque,
        },
    }
}

// =============================================================================
// Codec Artifacts
// =============================================================================

/// Per-field decode step
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeField {
    pub field: String,
    pub wire_name: String,
    pub op: DecodeOp,
    /// Value the field holds when its key is absent
    pub default: Option<Value>,
}

/// Stream decoder for one record. Field order is irrelevant on the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct DecoderArtifact {
    pub name: QualifiedName,
    pub record: QualifiedName,
    pub fields: Vec<DecodeField>,
}

impl DecoderArtifact {
    /// Field for a wire key; `None` means the key is skipped
    pub fn field_for_key(&self, key: &str) -> Option<&DecodeField> {
        self.fields.iter().find(|f| f.wire_name == key)
    }

    /// Record state before any key is read
    pub fn initial_record(&self) -> Record {
        let mut record = Record::new(self.record.clone());
        for field in &self.fields {
            record.set(field.field.clone(), field.default.clone().unwrap_or(Value::Null));
        }
        record
    }
}

/// Per-field encode step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodeField {
    pub field: String,
    pub wire_name: String,
    pub op: EncodeOp,
}

/// Stream encoder for one record. Fields are written in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncoderArtifact {
    pub name: QualifiedName,
    pub record: QualifiedName,
    pub fields: Vec<EncodeField>,
}

/// Decoder and encoder generated together for one record
#[derive(Debug, Clone, PartialEq)]
pub struct CodecPair {
    pub decoder: DecoderArtifact,
    pub encoder: EncoderArtifact,
}

/// Generate both codecs of a record from its resolved fields
pub fn generate(names: &ArtifactNames, fields: &[RecordField]) -> CodecPair {
    let decoder = DecoderArtifact {
        name: names.decoder.clone(),
        record: names.record.clone(),
        fields: fields
            .iter()
            .map(|f| DecodeField {
                field: f.name.clone(),
                wire_name: f.wire_name.clone(),
                op: decode_op(&f.ty, f.target.as_ref()),
                default: f.default_value.clone(),
            })
            .collect(),
    };
    let encoder = EncoderArtifact {
        name: names.encoder.clone(),
        record: names.record.clone(),
        fields: fields
            .iter()
            .map(|f| EncodeField {
                field: f.name.clone(),
                wire_name: f.wire_name.clone(),
                op: encode_op(&f.ty, f.target.as_ref()),
            })
            .collect(),
    };
    CodecPair { decoder, encoder }
}

// =============================================================================
// Codec Cache
// =============================================================================

#[derive(Debug, Clone)]
enum CacheSlot {
    Reserved,
    Generated(Box<CodecPair>),
}

/// Per-run memo of struct codecs, keyed by record name
#[derive(Debug, Default)]
pub struct CodecCache {
    slots: BTreeMap<QualifiedName, CacheSlot>,
}

impl CodecCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve `record` before generating its fields. Returns false if the
    /// name is already reserved or generated.
    pub fn reserve(&mut self, record: &QualifiedName) -> bool {
        if self.slots.contains_key(record) {
            return false;
        }
        self.slots.insert(record.clone(), CacheSlot::Reserved);
        true
    }

    /// Store the generated codecs for a reserved record
    pub fn fill(&mut self, pair: CodecPair) {
        self.slots
            .insert(pair.decoder.record.clone(), CacheSlot::Generated(Box::new(pair)));
    }

    /// Take the generated codecs out of the cache
    pub fn take(&mut self, record: &QualifiedName) -> Option<CodecPair> {
        match self.slots.remove(record) {
            Some(CacheSlot::Generated(pair)) => Some(*pair),
            Some(slot @ CacheSlot::Reserved) => {
                self.slots.insert(record.clone(), slot);
                None
            }
            None => None,
        }
    }

    /// Records reserved but never generated
    pub fn pending(&self) -> Vec<&QualifiedName> {
        self.slots
            .iter()
            .filter(|(_, slot)| matches!(slot, CacheSlot::Reserved))
            .map(|(name, _)| name)
            .collect()
    }
}
