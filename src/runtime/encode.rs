//! Encoder interpreter
//!
//! Runs an `EncoderArtifact` against a record, writing every declared field in
//! declaration order. Null values are written as explicit `null` tokens.

use super::token::{write_json, Token, TokenWriter};
use super::value::{Record, Value};
use super::{FieldPath, PathSegment};
use crate::codegen::artifacts::ArtifactSet;
use crate::codegen::codec::{EncodeOp, EncoderArtifact};
use crate::codegen::names::QualifiedName;
use crate::error::{Result, SchemaError};
use crate::types::ScalarKind;

/// Source of encoder artifacts by record name
pub trait EncoderLookup {
    fn encoder(&self, record: &QualifiedName) -> Option<&EncoderArtifact>;
}

impl EncoderLookup for ArtifactSet {
    fn encoder(&self, record: &QualifiedName) -> Option<&EncoderArtifact> {
        self.encoder_for(record)
    }
}

pub struct Encoder<'a> {
    lookup: &'a dyn EncoderLookup,
}

impl<'a> Encoder<'a> {
    pub fn new(lookup: &'a dyn EncoderLookup) -> Self {
        Self { lookup }
    }

    /// Encode `record` with the encoder generated for its kind
    pub fn encode(&self, record: &Record, writer: &mut dyn TokenWriter) -> Result<()> {
        let encoder = self
            .lookup
            .encoder(record.name())
            .ok_or_else(|| SchemaError::UnknownRecord(record.name().to_string()))?;
        let mut path = FieldPath::root(record.name().simple_name());
        self.encode_record(encoder, record, writer, &mut path)
    }

    /// Run a single instruction
    pub fn encode_value(
        &self,
        op: &EncodeOp,
        value: &Value,
        writer: &mut dyn TokenWriter,
        path: &mut FieldPath,
    ) -> Result<()> {
        if value.is_null() {
            return writer.write_token(Token::Null);
        }

        match (op, value) {
            (EncodeOp::WriteScalar(kind), _) => {
                let token = scalar_token(*kind, value).ok_or_else(|| mismatch(op, value, path))?;
                writer.write_token(token)
            }
            (EncodeOp::WriteList(item), Value::List(items)) => {
                writer.write_token(Token::StartArray)?;
                for (index, element) in items.iter().enumerate() {
                    path.push(PathSegment::Index(index));
                    self.encode_value(item, element, writer, path)?;
                    path.pop();
                }
                writer.write_token(Token::EndArray)
            }
            (EncodeOp::WriteMap(value_op), Value::Map(entries)) => {
                writer.write_token(Token::StartObject)?;
                for (key, entry) in entries {
                    writer.write_token(Token::FieldName(key.clone()))?;
                    path.push(PathSegment::Key(key.clone()));
                    self.encode_value(value_op, entry, writer, path)?;
                    path.pop();
                }
                writer.write_token(Token::EndObject)
            }
            (EncodeOp::WriteOpaque, _) => write_json(writer, &value.to_json()),
            (EncodeOp::WriteStruct { record, encoder }, Value::Record(nested)) if nested.name() == record => {
                let artifact = self
                    .lookup
                    .encoder(record)
                    .ok_or_else(|| SchemaError::UnknownRecord(encoder.to_string()))?;
                self.encode_record(artifact, nested, writer, path)
            }
            _ => Err(mismatch(op, value, path)),
        }
    }

    fn encode_record(
        &self,
        encoder: &EncoderArtifact,
        record: &Record,
        writer: &mut dyn TokenWriter,
        path: &mut FieldPath,
    ) -> Result<()> {
        writer.write_token(Token::StartObject)?;
        for field in &encoder.fields {
            writer.write_token(Token::FieldName(field.wire_name.clone()))?;
            path.push(PathSegment::Field(field.wire_name.clone()));
            self.encode_value(&field.op, record.get(&field.field), writer, path)?;
            path.pop();
        }
        writer.write_token(Token::EndObject)
    }
}

/// Token for a scalar; narrower integers widen into LONG and DECIMAL
fn scalar_token(kind: ScalarKind, value: &Value) -> Option<Token> {
    match (kind, value) {
        (ScalarKind::String, Value::String(s)) => Some(Token::string(s.clone())),
        (ScalarKind::Int, Value::Int(i)) => Some(Token::number(i.to_string())),
        (ScalarKind::Long, Value::Int(i)) => Some(Token::number(i.to_string())),
        (ScalarKind::Long, Value::Long(l)) => Some(Token::number(l.to_string())),
        (ScalarKind::Decimal, Value::Decimal(d)) => Some(Token::number(d.to_string())),
        (ScalarKind::Decimal, Value::Int(i)) => Some(Token::number(i.to_string())),
        (ScalarKind::Decimal, Value::Long(l)) => Some(Token::number(l.to_string())),
        (ScalarKind::Boolean, Value::Boolean(b)) => Some(Token::boolean(*b)),
        _ => None,
    }
}

fn expected(op: &EncodeOp) -> String {
    match op {
        EncodeOp::WriteScalar(kind) => kind.to_string(),
        EncodeOp::WriteList(_) => "list".to_string(),
        EncodeOp::WriteMap(_) => "map".to_string(),
        EncodeOp::WriteOpaque => "any value".to_string(),
        EncodeOp::WriteStruct { record, .. } => record.simple_name().to_string(),
    }
}

fn mismatch(op: &EncodeOp, value: &Value, path: &FieldPath) -> SchemaError {
    SchemaError::EncodeValue {
        path: path.to_string(),
        expected: expected(op),
        found: value.type_name().to_string(),
    }
}
