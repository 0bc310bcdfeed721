//! Decoder interpreter
//!
//! Runs a `DecoderArtifact` against a token stream. Keys the artifact does not
//! declare are skipped structurally; absent keys keep the record's initial
//! state.

use std::collections::BTreeMap;
use tracing::trace;

use super::token::{read_json, skip_value, Scalar, Token, TokenBuffer, TokenReader};
use super::value::{Decimal, Record, Value};
use super::{FieldPath, PathSegment};
use crate::codegen::artifacts::ArtifactSet;
use crate::codegen::codec::{DecodeOp, DecoderArtifact};
use crate::codegen::names::QualifiedName;
use crate::error::{Result, SchemaError};
use crate::types::ScalarKind;

/// Source of decoder artifacts by record name
pub trait DecoderLookup {
    fn decoder(&self, record: &QualifiedName) -> Option<&DecoderArtifact>;
}

impl DecoderLookup for ArtifactSet {
    fn decoder(&self, record: &QualifiedName) -> Option<&DecoderArtifact> {
        self.decoder_for(record)
    }
}

/// Lookup with no records, for instructions that never delegate
struct Detached;

impl DecoderLookup for Detached {
    fn decoder(&self, _record: &QualifiedName) -> Option<&DecoderArtifact> {
        None
    }
}

pub struct Decoder<'a> {
    lookup: &'a dyn DecoderLookup,
}

impl<'a> Decoder<'a> {
    pub fn new(lookup: &'a dyn DecoderLookup) -> Self {
        Self { lookup }
    }

    /// Decode one record of kind `record` from `reader`
    pub fn decode(&self, record: &QualifiedName, reader: &mut dyn TokenReader) -> Result<Record> {
        let decoder = self
            .lookup
            .decoder(record)
            .ok_or_else(|| SchemaError::UnknownRecord(record.to_string()))?;
        let mut path = FieldPath::root(record.simple_name());
        self.decode_record(decoder, reader, &mut path)
    }

    /// Run a single instruction
    pub fn decode_value(
        &self,
        op: &DecodeOp,
        reader: &mut dyn TokenReader,
        path: &mut FieldPath,
    ) -> Result<Value> {
        if matches!(reader.peek_token(), Some(Token::Null)) {
            reader.next_token();
            return Ok(Value::Null);
        }

        match op {
            DecodeOp::ReadScalar(kind) => {
                let token = next(reader, path)?;
                read_scalar(*kind, token, path)
            }
            DecodeOp::ReadList(item) => {
                expect(reader, path, Token::StartArray)?;
                let mut items = Vec::new();
                loop {
                    if matches!(reader.peek_token(), Some(Token::EndArray)) {
                        reader.next_token();
                        return Ok(Value::List(items));
                    }
                    path.push(PathSegment::Index(items.len()));
                    let value = self.decode_value(item, reader, path)?;
                    path.pop();
                    items.push(value);
                }
            }
            DecodeOp::ReadMap(value_op) => {
                expect(reader, path, Token::StartObject)?;
                let mut entries = BTreeMap::new();
                loop {
                    match next(reader, path)? {
                        Token::EndObject => return Ok(Value::Map(entries)),
                        Token::FieldName(key) => {
                            path.push(PathSegment::Key(key.clone()));
                            let value = self.decode_value(value_op, reader, path)?;
                            path.pop();
                            entries.insert(key, value);
                        }
                        other => {
                            return Err(SchemaError::malformed(
                                &*path,
                                format!("expected map key, found {}", other.describe()),
                            ))
                        }
                    }
                }
            }
            DecodeOp::ReadOpaque => Ok(Value::Opaque(read_json(reader, path)?)),
            DecodeOp::ReadStruct { record, decoder } => {
                let artifact = self
                    .lookup
                    .decoder(record)
                    .ok_or_else(|| SchemaError::UnknownRecord(decoder.to_string()))?;
                Ok(Value::Record(self.decode_record(artifact, reader, path)?))
            }
        }
    }

    fn decode_record(
        &self,
        decoder: &DecoderArtifact,
        reader: &mut dyn TokenReader,
        path: &mut FieldPath,
    ) -> Result<Record> {
        expect(reader, path, Token::StartObject)?;
        let mut record = decoder.initial_record();
        loop {
            match next(reader, path)? {
                Token::EndObject => return Ok(record),
                Token::FieldName(key) => match decoder.field_for_key(&key) {
                    Some(field) => {
                        path.push(PathSegment::Field(field.wire_name.clone()));
                        let value = self.decode_value(&field.op, reader, path)?;
                        path.pop();
                        record.set(field.field.clone(), value);
                    }
                    None => {
                        trace!(record = %decoder.record, key = %key, "Skipping unknown key");
                        path.push(PathSegment::Field(key));
                        skip_value(reader, path)?;
                        path.pop();
                    }
                },
                other => {
                    return Err(SchemaError::malformed(
                        &*path,
                        format!("expected field name, found {}", other.describe()),
                    ))
                }
            }
        }
    }
}

/// Decode a self-contained JSON value with an instruction that has no struct
/// delegation. Used to validate declared defaults at compile time.
pub fn decode_detached(op: &DecodeOp, value: &serde_json::Value, path: &str) -> Result<Value> {
    let mut buffer = TokenBuffer::from_json(value);
    let mut field_path = FieldPath::root(path);
    let decoded = Decoder::new(&Detached).decode_value(op, &mut buffer, &mut field_path)?;
    if !buffer.is_empty() {
        return Err(SchemaError::malformed(path, "trailing tokens after value"));
    }
    Ok(decoded)
}

fn next(reader: &mut dyn TokenReader, path: &FieldPath) -> Result<Token> {
    reader
        .next_token()
        .ok_or_else(|| SchemaError::malformed(path, "unexpected end of stream"))
}

fn expect(reader: &mut dyn TokenReader, path: &FieldPath, wanted: Token) -> Result<()> {
    let token = next(reader, path)?;
    if token == wanted {
        Ok(())
    } else {
        Err(SchemaError::malformed(
            path,
            format!("expected {}, found {}", wanted.describe(), token.describe()),
        ))
    }
}

fn read_scalar(kind: ScalarKind, token: Token, path: &FieldPath) -> Result<Value> {
    let value = match (kind, &token) {
        (ScalarKind::String, Token::Scalar(Scalar::String(s))) => Some(Value::String(s.clone())),
        (ScalarKind::Int, Token::Scalar(Scalar::Number(n))) => n.parse::<i32>().ok().map(Value::Int),
        (ScalarKind::Long, Token::Scalar(Scalar::Number(n))) => n.parse::<i64>().ok().map(Value::Long),
        (ScalarKind::Decimal, Token::Scalar(Scalar::Number(n) | Scalar::String(n))) => {
            Decimal::parse(n).map(Value::Decimal)
        }
        (ScalarKind::Boolean, Token::Scalar(Scalar::Boolean(b))) => Some(Value::Boolean(*b)),
        _ => None,
    };
    value.ok_or_else(|| SchemaError::DecodeValue {
        path: path.to_string(),
        expected: kind,
        found: token.describe(),
    })
}
