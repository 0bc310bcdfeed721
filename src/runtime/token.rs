//! Token streams
//!
//! Decoders read and encoders write a flat stream of JSON-shaped tokens.
//! `TokenBuffer` is the in-memory stream used by the bridge to
//! `serde_json::Value` and by tests.

use serde_json::{Map, Number, Value as Json};
use std::collections::VecDeque;

use super::FieldPath;
use crate::error::{Result, SchemaError};

/// Scalar payload of a token. Numbers keep their literal text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scalar {
    String(String),
    Number(String),
    Boolean(bool),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    StartObject,
    EndObject,
    StartArray,
    EndArray,
    FieldName(String),
    Scalar(Scalar),
    Null,
}

impl Token {
    pub fn string(value: impl Into<String>) -> Self {
        Token::Scalar(Scalar::String(value.into()))
    }

    pub fn number(literal: impl Into<String>) -> Self {
        Token::Scalar(Scalar::Number(literal.into()))
    }

    pub fn boolean(value: bool) -> Self {
        Token::Scalar(Scalar::Boolean(value))
    }

    /// Short description used in error messages
    pub fn describe(&self) -> String {
        match self {
            Token::StartObject => "start of object".to_string(),
            Token::EndObject => "end of object".to_string(),
            Token::StartArray => "start of array".to_string(),
            Token::EndArray => "end of array".to_string(),
            Token::FieldName(name) => format!("field name {:?}", name),
            Token::Scalar(Scalar::String(s)) => format!("string {:?}", s),
            Token::Scalar(Scalar::Number(n)) => format!("number {}", n),
            Token::Scalar(Scalar::Boolean(b)) => format!("boolean {}", b),
            Token::Null => "null".to_string(),
        }
    }
}

pub trait TokenReader {
    fn next_token(&mut self) -> Option<Token>;
    fn peek_token(&mut self) -> Option<&Token>;
}

pub trait TokenWriter {
    fn write_token(&mut self, token: Token) -> Result<()>;
}

/// In-memory token stream
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenBuffer {
    tokens: VecDeque<Token>,
}

impl TokenBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tokens(tokens: impl IntoIterator<Item = Token>) -> Self {
        Self {
            tokens: tokens.into_iter().collect(),
        }
    }

    pub fn from_json(value: &Json) -> Self {
        let mut buffer = Self::new();
        tokenize_json(value, &mut buffer.tokens);
        buffer
    }

    /// Parse JSON text into a token stream
    pub fn parse(text: &str) -> Result<Self> {
        let value: Json = serde_json::from_str(text)?;
        Ok(Self::from_json(&value))
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn into_tokens(self) -> Vec<Token> {
        self.tokens.into_iter().collect()
    }

    /// Rebuild one JSON value from the buffered tokens
    pub fn to_json(&self) -> Result<Json> {
        let mut copy = self.clone();
        read_json(&mut copy, &FieldPath::default())
    }
}

impl TokenReader for TokenBuffer {
    fn next_token(&mut self) -> Option<Token> {
        self.tokens.pop_front()
    }

    fn peek_token(&mut self) -> Option<&Token> {
        self.tokens.front()
    }
}

impl TokenWriter for TokenBuffer {
    fn write_token(&mut self, token: Token) -> Result<()> {
        self.tokens.push_back(token);
        Ok(())
    }
}

fn tokenize_json(value: &Json, out: &mut VecDeque<Token>) {
    match value {
        Json::Null => out.push_back(Token::Null),
        Json::Bool(b) => out.push_back(Token::boolean(*b)),
        Json::Number(n) => out.push_back(Token::number(n.to_string())),
        Json::String(s) => out.push_back(Token::string(s.clone())),
        Json::Array(items) => {
            out.push_back(Token::StartArray);
            for item in items {
                tokenize_json(item, out);
            }
            out.push_back(Token::EndArray);
        }
        Json::Object(entries) => {
            out.push_back(Token::StartObject);
            for (key, item) in entries {
                out.push_back(Token::FieldName(key.clone()));
                tokenize_json(item, out);
            }
            out.push_back(Token::EndObject);
        }
    }
}

/// Write `value` to `writer` as tokens
pub fn write_json(writer: &mut dyn TokenWriter, value: &Json) -> Result<()> {
    let mut tokens = VecDeque::new();
    tokenize_json(value, &mut tokens);
    for token in tokens {
        writer.write_token(token)?;
    }
    Ok(())
}

/// Read exactly one complete value from `reader`
pub fn read_json(reader: &mut dyn TokenReader, path: &FieldPath) -> Result<Json> {
    let token = reader
        .next_token()
        .ok_or_else(|| SchemaError::malformed(path, "unexpected end of stream"))?;
    match token {
        Token::Null => Ok(Json::Null),
        Token::Scalar(Scalar::Boolean(b)) => Ok(Json::Bool(b)),
        Token::Scalar(Scalar::String(s)) => Ok(Json::String(s)),
        Token::Scalar(Scalar::Number(literal)) => literal
            .parse::<Number>()
            .map(Json::Number)
            .map_err(|_| SchemaError::malformed(path, format!("invalid number literal {}", literal))),
        Token::StartArray => {
            let mut items = Vec::new();
            loop {
                if matches!(reader.peek_token(), Some(Token::EndArray)) {
                    reader.next_token();
                    return Ok(Json::Array(items));
                }
                items.push(read_json(reader, path)?);
            }
        }
        Token::StartObject => {
            let mut entries = Map::new();
            loop {
                match reader.next_token() {
                    Some(Token::EndObject) => return Ok(Json::Object(entries)),
                    Some(Token::FieldName(key)) => {
                        let value = read_json(reader, path)?;
                        entries.insert(key, value);
                    }
                    Some(other) => {
                        return Err(SchemaError::malformed(
                            path,
                            format!("expected field name, found {}", other.describe()),
                        ))
                    }
                    None => return Err(SchemaError::malformed(path, "unterminated object")),
                }
            }
        }
        other => Err(SchemaError::malformed(
            path,
            format!("expected a value, found {}", other.describe()),
        )),
    }
}

/// Skip one complete value, including any nested containers
pub fn skip_value(reader: &mut dyn TokenReader, path: &FieldPath) -> Result<()> {
    let mut depth = 0usize;
    loop {
        let token = reader
            .next_token()
            .ok_or_else(|| SchemaError::malformed(path, "unexpected end of stream while skipping"))?;
        match token {
            Token::StartObject | Token::StartArray => depth += 1,
            Token::EndObject | Token::EndArray => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| SchemaError::malformed(path, "unbalanced container end"))?;
            }
            Token::FieldName(name) if depth == 0 => {
                return Err(SchemaError::malformed(
                    path,
                    format!("expected a value, found field name {:?}", name),
                ))
            }
            Token::FieldName(_) => continue,
            Token::Scalar(_) | Token::Null => {}
        }
        if depth == 0 {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tokenize_nested() {
        let buffer = TokenBuffer::from_json(&json!({"a": [1, null], "b": {"c": true}}));
        assert_eq!(
            buffer.into_tokens(),
            vec![
                Token::StartObject,
                Token::FieldName("a".into()),
                Token::StartArray,
                Token::number("1"),
                Token::Null,
                Token::EndArray,
                Token::FieldName("b".into()),
                Token::StartObject,
                Token::FieldName("c".into()),
                Token::boolean(true),
                Token::EndObject,
                Token::EndObject,
            ]
        );
    }

    #[test]
    fn test_read_json_restores_value() {
        let value = json!({"name": "x", "items": [{"k": 1.5}, []], "flag": false});
        let buffer = TokenBuffer::from_json(&value);
        assert_eq!(buffer.to_json().unwrap(), value);
    }

    #[test]
    fn test_skip_value_consumes_whole_container() {
        let mut buffer = TokenBuffer::parse(r#"[{"a": [1, 2, {"b": null}]}, 3]"#).unwrap();
        buffer.write_token(Token::string("tail")).unwrap();
        skip_value(&mut buffer, &FieldPath::default()).unwrap();
        assert_eq!(buffer.next_token(), Some(Token::string("tail")));
    }

    #[test]
    fn test_truncated_stream_is_malformed() {
        let mut buffer = TokenBuffer::from_tokens(vec![Token::StartArray, Token::number("1")]);
        let err = read_json(&mut buffer, &FieldPath::root("Order")).unwrap_err();
        assert!(matches!(err, SchemaError::MalformedStream { ref path, .. } if path == "Order"));

        let mut buffer = TokenBuffer::from_tokens(vec![Token::StartObject, Token::FieldName("a".into())]);
        assert!(skip_value(&mut buffer, &FieldPath::default()).is_err());
    }

    #[test]
    fn test_skip_rejects_field_name_as_value() {
        let mut buffer = TokenBuffer::from_tokens(vec![Token::FieldName("b".into()), Token::number("1")]);
        let err = skip_value(&mut buffer, &FieldPath::root("Order")).unwrap_err();
        match err {
            SchemaError::MalformedStream { path, detail } => {
                assert_eq!(path, "Order");
                assert!(detail.contains("field name \"b\""));
            }
            other => panic!("expected MalformedStream, got {:?}", other),
        }
    }

    #[test]
    fn test_number_literal_kept_exactly() {
        let buffer = TokenBuffer::from_tokens(vec![Token::number("0.12345678901234567890123")]);
        let json = buffer.to_json().unwrap();
        assert_eq!(json.to_string(), "0.12345678901234567890123");
        assert_eq!(
            TokenBuffer::from_json(&json).into_tokens(),
            vec![Token::number("0.12345678901234567890123")]
        );
    }
}
