//! Name Resolution Pass
//!
//! Assigns every generated artifact a deterministic, collision-free name:
//! - Record names from object identities or `<Enclosing><Field>` synthesis
//! - Encoder/decoder/builder names as record name + suffix in sibling namespaces
//! - Accessor and constant identifiers for sibling fields
//!
//! Collisions are resolved by a fold over raw names that carries an explicit
//! `UsedNames` accumulator. Comparison is case-insensitive, and each colliding
//! identifier gets the shortest unused run of trailing collision markers.
//!
//! Name resolution is language-agnostic. Keyword escaping for a particular
//! target happens in its renderer.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use super::config::NamingConfig;

/// Record-level constant holding the compatibility fingerprint
pub const FINGERPRINT_CONSTANT: &str = "FINGERPRINT";

/// Constant identifiers a field constant may never take
pub const RESERVED_CONSTANTS: &[&str] = &[FINGERPRINT_CONSTANT];

// =============================================================================
// Qualified Name
// =============================================================================

/// Fully-qualified logical artifact name (`namespace.Name`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QualifiedName {
    pub namespace: String,
    pub name: String,
}

impl QualifiedName {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Name without namespace
    pub fn simple_name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            f.write_str(&self.name)
        } else {
            write!(f, "{}.{}", self.namespace, self.name)
        }
    }
}

/// The names of every artifact generated for one record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactNames {
    pub record: QualifiedName,
    pub encoder: QualifiedName,
    pub decoder: QualifiedName,
    pub builder: QualifiedName,
}

// =============================================================================
// Used Names
// =============================================================================

/// Case-insensitive set of identifiers already handed out in one scope
#[derive(Debug, Clone, Default)]
pub struct UsedNames {
    seen: HashSet<String>,
}

impl UsedNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulator with `reserved` already taken
    pub fn reserving<'a>(reserved: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            seen: reserved.into_iter().map(str::to_lowercase).collect(),
        }
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.seen.contains(&identifier.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// Fold step: claim the shortest unused `candidate + marker*`
    pub fn claimed(mut self, candidate: &str, marker: char) -> (Self, String) {
        let identifier = self.claim(candidate, marker);
        (self, identifier)
    }

    /// In-place variant of [`UsedNames::claimed`]
    pub fn claim(&mut self, candidate: &str, marker: char) -> String {
        let mut identifier = candidate.to_string();
        while identifier.is_empty() || self.contains(&identifier) {
            identifier.push(marker);
        }
        self.seen.insert(identifier.to_lowercase());
        identifier
    }
}

/// Derive an identifier for each raw name and make them pairwise distinct.
///
/// Output order follows input order; the first occurrence keeps the plain
/// identifier.
pub fn resolve_identifiers<S, F>(raw: &[S], derive: F, marker: char) -> Vec<String>
where
    S: AsRef<str>,
    F: Fn(&str) -> String,
{
    resolve_identifiers_from(UsedNames::new(), raw, derive, marker)
}

/// Like [`resolve_identifiers`], starting from an accumulator that already
/// holds reserved identifiers
pub fn resolve_identifiers_from<S, F>(used: UsedNames, raw: &[S], derive: F, marker: char) -> Vec<String>
where
    S: AsRef<str>,
    F: Fn(&str) -> String,
{
    raw.iter()
        .fold(
            (used, Vec::with_capacity(raw.len())),
            |(used, mut resolved), name| {
                let (used, identifier) = used.claimed(&derive(name.as_ref()), marker);
                resolved.push(identifier);
                (used, resolved)
            },
        )
        .1
}

// =============================================================================
// Namer
// =============================================================================

/// Applies `NamingConfig` to derive artifact and member names
#[derive(Debug, Clone)]
pub struct Namer<'a> {
    config: &'a NamingConfig,
}

impl<'a> Namer<'a> {
    pub fn new(config: &'a NamingConfig) -> Self {
        Self { config }
    }

    pub fn marker(&self) -> char {
        self.config.collision_marker
    }

    /// Base name of a struct artifact: the identity if declared, else the
    /// enclosing record name followed by the field name.
    pub fn struct_base_name(&self, identity: Option<&str>, enclosing: &str, field_name: &str) -> String {
        match identity {
            Some(identity) => self.type_name(identity),
            None => format!("{}{}", enclosing, self.type_name(field_name)),
        }
    }

    /// All artifact names for a resolved record name
    pub fn artifact_names(&self, record: &str) -> ArtifactNames {
        let c = self.config;
        ArtifactNames {
            record: QualifiedName::new(c.namespace(&c.model_namespace), record),
            encoder: QualifiedName::new(
                c.namespace(&c.encoder_namespace),
                format!("{}{}", record, c.encoder_suffix),
            ),
            decoder: QualifiedName::new(
                c.namespace(&c.decoder_namespace),
                format!("{}{}", record, c.decoder_suffix),
            ),
            builder: QualifiedName::new(
                c.namespace(&c.builder_namespace),
                format!("{}{}", record, c.builder_suffix),
            ),
        }
    }

    /// Collision-free accessor identifiers for sibling fields
    pub fn accessors<S: AsRef<str>>(&self, raw: &[S]) -> Vec<String> {
        resolve_identifiers(raw, |s| self.accessor(s), self.marker())
    }

    /// Collision-free constant identifiers for sibling fields. Never equal to
    /// a record-level constant.
    pub fn constants<S: AsRef<str>>(&self, raw: &[S]) -> Vec<String> {
        let used = UsedNames::reserving(RESERVED_CONSTANTS.iter().copied());
        resolve_identifiers_from(used, raw, |s| self.constant(s), self.marker())
    }

    /// PascalCase type name. Names without separators keep their casing
    /// apart from the first letter.
    pub fn type_name(&self, raw: &str) -> String {
        if !raw.contains(['_', '-', ' ', '.']) {
            return capitalize(raw);
        }
        split_words(raw).iter().map(|w| self.case_word(w)).collect()
    }

    /// camelCase accessor name
    pub fn accessor(&self, raw: &str) -> String {
        let words = split_words(raw);
        let mut result = String::with_capacity(raw.len());
        for (i, word) in words.iter().enumerate() {
            if i == 0 {
                result.push_str(&word.to_lowercase());
            } else {
                result.push_str(&self.case_word(word));
            }
        }
        result
    }

    /// SCREAMING_SNAKE constant name
    pub fn constant(&self, raw: &str) -> String {
        split_words(raw)
            .iter()
            .map(|w| w.to_uppercase())
            .collect::<Vec<_>>()
            .join("_")
    }

    /// Apply casing to a word, preserving acronyms
    fn case_word(&self, word: &str) -> String {
        let upper = word.to_uppercase();
        if self.config.acronyms.contains(&upper) {
            return upper;
        }
        let mut chars = word.chars();
        match chars.next() {
            None => String::new(),
            Some(first) => {
                let mut result = first.to_uppercase().to_string();
                result.extend(chars.map(|c| c.to_ascii_lowercase()));
                result
            }
        }
    }
}

/// Uppercase the first character, keep the rest
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().chain(chars).collect(),
    }
}

/// Split on separators and case boundaries (`fooBar`, `HTTPServer`, `a1B`)
fn split_words(s: &str) -> Vec<String> {
    let chars: Vec<char> = s.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if matches!(c, '_' | '-' | ' ' | '.') {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        if c.is_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower) {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}
