//! Rust Code Emitter
//!
//! Reference `ArtifactSink` that renders record definitions as serde-derived
//! Rust structs. Codec artifacts need no separate source: the derives cover
//! them. Builder artifacts become a `new` constructor taking the positional
//! fields.
//!
//! Key constraints:
//! - Only artifacts are read, never the schema graph
//! - Type names come from the artifact's qualified names
//! - Scalar mappings come from `RustTypeMappings`

use std::collections::HashMap;
use std::fmt::Write as _;

use super::artifacts::{Artifact, ArtifactSink, BuilderArtifact, RecordDefinition, RecordField};
use super::names::{QualifiedName, FINGERPRINT_CONSTANT};
use crate::error::Result;
use crate::types::{ScalarKind, Type};

// =============================================================================
// Type Mappings
// =============================================================================

/// Rust types used for scalar leaves and opaque values
#[derive(Debug, Clone, PartialEq)]
pub struct RustTypeMappings {
    pub string: String,
    pub int: String,
    pub long: String,
    /// `serde_json::Number` by default. It keeps the exact literal only when
    /// the crate compiling the output enables serde_json's
    /// `arbitrary_precision` feature; without it, values are parsed as f64
    /// and lose digits. Map to a string-backed decimal for exact amounts.
    pub decimal: String,
    pub boolean: String,
    pub opaque: String,
    /// Map container; `{}` is replaced by the value type
    pub map: String,
}

impl Default for RustTypeMappings {
    fn default() -> Self {
        Self {
            string: "String".to_string(),
            int: "i32".to_string(),
            long: "i64".to_string(),
            decimal: "serde_json::Number".to_string(),
            boolean: "bool".to_string(),
            opaque: "serde_json::Value".to_string(),
            map: "std::collections::BTreeMap<String, {}>".to_string(),
        }
    }
}

impl RustTypeMappings {
    fn scalar(&self, kind: ScalarKind) -> &str {
        match kind {
            ScalarKind::String => &self.string,
            ScalarKind::Int => &self.int,
            ScalarKind::Long => &self.long,
            ScalarKind::Decimal => &self.decimal,
            ScalarKind::Boolean => &self.boolean,
        }
    }
}

// =============================================================================
// Renderer
// =============================================================================

/// Renders a whole artifact set into one Rust source file
#[derive(Debug, Clone)]
pub struct RustRenderer {
    mappings: RustTypeMappings,
    output: String,
    /// Records seen so far, for builder rendering
    records: HashMap<QualifiedName, RecordDefinition>,
    type_count: usize,
}

impl Default for RustRenderer {
    fn default() -> Self {
        Self::new(RustTypeMappings::default())
    }
}

impl RustRenderer {
    pub fn new(mappings: RustTypeMappings) -> Self {
        let mut output = String::new();
        output.push_str("//! Generated by schemac - DO NOT EDIT\n\n");
        output.push_str("use serde::{Deserialize, Serialize};\n\n");
        Self {
            mappings,
            output,
            records: HashMap::new(),
            type_count: 0,
        }
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn into_output(self) -> String {
        self.output
    }

    /// Number of structs rendered
    pub fn type_count(&self) -> usize {
        self.type_count
    }

    fn emit_record(&mut self, record: &RecordDefinition) {
        let out = &mut self.output;
        let name = record.name().simple_name();

        if let Some(description) = &record.description {
            let _ = writeln!(out, "/// {}", description);
        } else {
            let _ = writeln!(out, "/// {}", name);
        }
        out.push_str("#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]\n");
        let _ = writeln!(out, "pub struct {} {{", name);
        for field in &record.fields {
            emit_field(out, field, &self.mappings);
        }
        out.push_str("}\n\n");

        let _ = writeln!(out, "impl {} {{", name);
        let _ = writeln!(
            out,
            "    pub const {}: i64 = {};",
            FINGERPRINT_CONSTANT,
            record.fingerprint.as_i64()
        );
        for field in &record.fields {
            let _ = writeln!(out, "    pub const {}: &'static str = {:?};", field.constant, field.wire_name);
        }
        out.push_str("}\n\n");

        self.type_count += 1;
        self.records.insert(record.name().clone(), record.clone());
    }

    fn emit_builder(&mut self, builder: &BuilderArtifact) {
        let Some(record) = self.records.get(&builder.record) else {
            return;
        };
        let out = &mut self.output;
        let params: Vec<(&RecordField, String)> = builder
            .positional
            .iter()
            .filter_map(|name| record.field(name))
            .map(|f| (f, rust_field_name(f)))
            .collect();

        let _ = writeln!(out, "impl {} {{", builder.record.simple_name());
        let signature: Vec<String> = params
            .iter()
            .map(|(f, ident)| format!("{}: {}", ident, rust_type(&f.ty, f, &self.mappings)))
            .collect();
        let _ = writeln!(out, "    pub fn new({}) -> Self {{", signature.join(", "));
        out.push_str("        Self {\n");
        for (_, ident) in &params {
            let _ = writeln!(out, "            {}: Some({}),", ident, ident);
        }
        out.push_str("            ..Default::default()\n");
        out.push_str("        }\n");
        out.push_str("    }\n");
        out.push_str("}\n\n");
    }
}

impl ArtifactSink for RustRenderer {
    fn accept(&mut self, artifact: &Artifact) -> Result<()> {
        match artifact {
            Artifact::Record(record) => self.emit_record(record),
            Artifact::Builder(builder) => self.emit_builder(builder),
            Artifact::Decoder(_) | Artifact::Encoder(_) => {}
        }
        Ok(())
    }
}

// =============================================================================
// Field Emission
// =============================================================================

fn emit_field(out: &mut String, field: &RecordField, mappings: &RustTypeMappings) {
    if let Some(description) = &field.description {
        let _ = writeln!(out, "    /// {}", description);
    }
    let ident = rust_field_name(field);
    if ident.trim_start_matches("r#") != field.wire_name {
        let _ = writeln!(out, "    #[serde(rename = {:?})]", field.wire_name);
    }
    out.push_str("    #[serde(default)]\n");
    let _ = writeln!(out, "    pub {}: Option<{}>,", ident, rust_type(&field.ty, field, mappings));
}

fn rust_type(ty: &Type, field: &RecordField, mappings: &RustTypeMappings) -> String {
    match ty {
        Type::Scalar(kind) => mappings.scalar(*kind).to_string(),
        Type::Struct => {
            let inner = match field.target.as_ref().and_then(|t| t.record()) {
                Some(record) => record.simple_name().to_string(),
                None => mappings.opaque.clone(),
            };
            if field.boxed {
                format!("Box<{}>", inner)
            } else {
                inner
            }
        }
        Type::List(item) => format!("Vec<{}>", rust_type(item, field, mappings)),
        Type::Map(value) => mappings.map.replace("{}", &rust_type(value, field, mappings)),
    }
}

fn rust_field_name(field: &RecordField) -> String {
    let snake = to_snake_case(&field.accessor);
    if is_rust_keyword(&snake) {
        format!("r#{}", snake)
    } else {
        snake
    }
}

// =============================================================================
// Helper Utilities
// =============================================================================

/// Convert to snake_case
fn to_snake_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 4);
    let mut prev_lower = false;

    for c in s.chars() {
        if c.is_ascii_uppercase() {
            if prev_lower {
                result.push('_');
            }
            result.push(c.to_ascii_lowercase());
            prev_lower = false;
        } else if c == '-' || c == ' ' {
            result.push('_');
            prev_lower = false;
        } else {
            result.push(c);
            prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
        }
    }

    result
}

fn is_rust_keyword(s: &str) -> bool {
    matches!(
        s,
        "as" | "async" | "await" | "break" | "const" | "continue" | "crate" | "dyn" | "else"
            | "enum" | "extern" | "false" | "fn" | "for" | "if" | "impl" | "in" | "let" | "loop"
            | "match" | "mod" | "move" | "mut" | "pub" | "ref" | "return" | "static" | "struct"
            | "trait" | "true" | "type" | "unsafe" | "use" | "where" | "while" | "yield"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::Compiler;
    use crate::schema::{Field, SchemaGraph};

    #[test]
    fn test_to_snake_case() {
        assert_eq!(to_snake_case("shipTo"), "ship_to");
        assert_eq!(to_snake_case("line2Total"), "line2_total");
        assert_eq!(to_snake_case("id"), "id");
    }

    #[test]
    fn test_keywords_escaped() {
        assert!(is_rust_keyword("type"));
        assert!(!is_rust_keyword("kind"));
    }

    #[test]
    fn test_render_self_referential_record() {
        let graph = SchemaGraph::new(vec![Field::new("node").with_identity("Node").with_properties(vec![
            Field::new("label").with_type(Type::Scalar(ScalarKind::String)).with_position(0),
            Field::new("type").with_type(Type::Scalar(ScalarKind::Int)),
            Field::new("parent").with_identity("Node"),
            Field::new("children").with_type(Type::list(Type::Struct)).with_identity("Node"),
        ])]);
        let set = Compiler::default().compile(&graph).unwrap();
        let mut renderer = RustRenderer::default();
        set.emit(&mut renderer).unwrap();
        let code = renderer.output();

        assert_eq!(renderer.type_count(), 1);
        assert!(code.contains("pub struct Node {"));
        assert!(code.contains("pub parent: Option<Box<Node>>,"));
        assert!(code.contains("pub children: Option<Vec<Node>>,"));
        assert!(!code.contains("#[serde(rename = \"type\")]"));
        assert!(code.contains("pub r#type: Option<i32>,"));
        assert!(code.contains("pub const FINGERPRINT: i64 = "));
        assert!(code.contains("pub fn new(label: String) -> Self {"));
    }

    #[test]
    fn test_field_constant_never_shadows_fingerprint() {
        let graph = SchemaGraph::new(vec![Field::new("Document").with_properties(vec![
            Field::new("fingerprint").with_type(Type::Scalar(ScalarKind::String)),
            Field::new("size").with_type(Type::Scalar(ScalarKind::Long)),
        ])]);
        let set = Compiler::default().compile(&graph).unwrap();
        let mut renderer = RustRenderer::default();
        set.emit(&mut renderer).unwrap();
        let code = renderer.output();

        assert_eq!(code.matches("pub const FINGERPRINT:").count(), 1);
        assert!(code.contains("pub const FINGERPRINT_: &'static str = \"fingerprint\";"));
        assert!(code.contains("pub const SIZE: &'static str = \"size\";"));
    }

    #[test]
    fn test_decimal_mapping_override() {
        let graph = SchemaGraph::new(vec![Field::new("Invoice").with_properties(vec![
            Field::new("total").with_type(Type::Scalar(ScalarKind::Decimal)),
        ])]);
        let set = Compiler::default().compile(&graph).unwrap();
        let mut renderer = RustRenderer::new(RustTypeMappings {
            decimal: "rust_decimal::Decimal".to_string(),
            ..RustTypeMappings::default()
        });
        set.emit(&mut renderer).unwrap();
        assert!(renderer.output().contains("pub total: Option<rust_decimal::Decimal>,"));
    }
}
