//! Instruction runtime
//!
//! Executes generated artifacts: decoders and encoders run their
//! instructions against a token stream, and structural methods run against
//! the dynamic value model. Nothing here inspects a schema; every decision
//! comes from an artifact.

pub mod decode;
pub mod encode;
pub mod structural;
pub mod token;
pub mod value;

pub use decode::{decode_detached, Decoder, DecoderLookup};
pub use encode::{Encoder, EncoderLookup};
pub use structural::Structural;
pub use token::{Scalar, Token, TokenBuffer, TokenReader, TokenWriter};
pub use value::{Decimal, Record, Value};

use std::fmt;

/// One step of a path from a record root to a value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Root(String),
    Field(String),
    Index(usize),
    Key(String),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root(name) => write!(f, "{}", name),
            Self::Field(name) => write!(f, ".{}", name),
            Self::Index(i) => write!(f, "[{}]", i),
            Self::Key(key) => write!(f, "[{:?}]", key),
        }
    }
}

/// Location reported by decode and encode errors
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPath {
    segments: Vec<PathSegment>,
}

impl FieldPath {
    pub fn root(name: impl Into<String>) -> Self {
        Self {
            segments: vec![PathSegment::Root(name.into())],
        }
    }

    pub fn push(&mut self, segment: PathSegment) {
        self.segments.push(segment);
    }

    pub fn pop(&mut self) {
        self.segments.pop();
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("<root>");
        }
        for segment in &self.segments {
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_path_display() {
        let mut path = FieldPath::root("Order");
        path.push(PathSegment::Field("lines".into()));
        path.push(PathSegment::Index(2));
        path.push(PathSegment::Key("eu".into()));
        assert_eq!(path.to_string(), "Order.lines[2][\"eu\"]");
        path.pop();
        path.pop();
        assert_eq!(path.to_string(), "Order.lines");
        assert_eq!(FieldPath::default().to_string(), "<root>");
    }
}
