//! # Node Schema Registry
//!
//! A [`Schema`] maps each production name to its ordered slot declarations.
//! It is built once from schema text, validated, and immutable afterwards;
//! nodes keep an `Arc<Production>` so accessors never need the registry.
//!
//! ## Invariants
//! - Every slot names a declared production.
//! - A kind occupies at most one slot per production.
//! - Required slots never form a cycle.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::errors::{SchemaError, SourceContext};
use crate::syntax::Kind;

pub mod builtin;
pub mod parser;
pub mod validators;

pub use validators::{validate_schema_str, ValidationReport};

// ============================================================================
// CORE DATA STRUCTURES
// ============================================================================

/// How many children of a kind a slot may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    Optional,
    Required,
    Repeated,
}

impl Cardinality {
    pub const fn suffix(self) -> char {
        match self {
            Cardinality::Optional => '?',
            Cardinality::Required => '!',
            Cardinality::Repeated => '*',
        }
    }

    pub fn from_suffix(c: char) -> Option<Self> {
        match c {
            '?' => Some(Cardinality::Optional),
            '!' => Some(Cardinality::Required),
            '*' => Some(Cardinality::Repeated),
            _ => None,
        }
    }

    /// Whether more than one child may occupy the slot.
    pub const fn allows_many(self) -> bool {
        matches!(self, Cardinality::Repeated)
    }
}

/// A declared child position within a production.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub kind: Kind,
    pub cardinality: Cardinality,
}

impl Slot {
    /// Accessor name a host binds to: `kind` for single slots, `kind_list`
    /// for repeated ones.
    pub fn accessor_name(&self) -> String {
        match self.cardinality {
            Cardinality::Repeated => format!("{}_list", self.kind),
            Cardinality::Optional | Cardinality::Required => self.kind.to_string(),
        }
    }
}

/// A named grammar rule and its flattened slot list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Production {
    name: Kind,
    token: bool,
    slots: Vec<Slot>,
    index: HashMap<Kind, usize>,
}

impl Production {
    pub(crate) fn new(name: Kind, token: bool, slots: Vec<Slot>) -> Self {
        let index = slots
            .iter()
            .enumerate()
            .map(|(i, slot)| (slot.kind.clone(), i))
            .collect();
        Self {
            name,
            token,
            slots,
            index,
        }
    }

    pub fn name(&self) -> &Kind {
        &self.name
    }

    /// Token productions are leaves that carry source text.
    pub fn is_token(&self) -> bool {
        self.token
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn slot(&self, kind: &str) -> Option<&Slot> {
        self.slot_index(kind).map(|i| &self.slots[i])
    }

    pub fn slot_index(&self, kind: &str) -> Option<usize> {
        self.index.get(kind).copied()
    }

    pub fn required_slots(&self) -> impl Iterator<Item = &Slot> {
        self.slots
            .iter()
            .filter(|s| s.cardinality == Cardinality::Required)
    }
}

/// The registry: every production of one grammar, in declaration order.
#[derive(Debug, Clone)]
pub struct Schema {
    name: String,
    root: Kind,
    productions: Vec<Arc<Production>>,
    by_name: HashMap<Kind, usize>,
}

// ============================================================================
// PUBLIC API IMPLEMENTATION
// ============================================================================

/// A `schema` header name for a source without one: the file stem with
/// every character the header grammar rejects replaced by `_`.
fn schema_ident(source_name: &str) -> String {
    let file = source_name.rsplit(['/', '\\']).next().unwrap_or(source_name);
    let stem = file.split('.').next().unwrap_or(file);
    let mut ident: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    match ident.chars().next() {
        None => ident.push_str("schema"),
        Some(first) if first.is_ascii_digit() => ident.insert(0, '_'),
        Some(_) => {}
    }
    ident
}

impl Schema {
    /// Parses and validates schema text. The first validation error fails the
    /// build; use [`validate_schema_str`] to see every diagnostic.
    pub fn from_source(name: &str, text: &str) -> Result<Self, SchemaError> {
        let source = SourceContext::from_file(name, text);
        let decl = parser::parse_schema(&source)?;
        let (report, expanded) = validators::validate(&decl);
        if let Some(error) = report.errors.into_iter().next() {
            return Err(error);
        }

        let root = decl
            .roots
            .first()
            .map(|r| Kind::new(&r.value))
            .ok_or(SchemaError::MissingRoot)?;
        let schema_name = decl.name.unwrap_or_else(|| schema_ident(name));
        Ok(Self::assemble(schema_name, root, expanded))
    }

    pub(crate) fn assemble(name: String, root: Kind, productions: Vec<Production>) -> Self {
        let productions: Vec<Arc<Production>> = productions.into_iter().map(Arc::new).collect();
        let by_name = productions
            .iter()
            .enumerate()
            .map(|(i, p)| (p.name.clone(), i))
            .collect();
        Self {
            name,
            root,
            productions,
            by_name,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Production a whole-file parse produces.
    pub fn root(&self) -> &Kind {
        &self.root
    }

    /// Looks up a production by name.
    pub fn production(&self, name: &str) -> Result<&Arc<Production>, SchemaError> {
        self.get(name).ok_or_else(|| SchemaError::UnknownProduction {
            name: name.to_string(),
        })
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Production>> {
        self.by_name.get(name).map(|&i| &self.productions[i])
    }

    /// Ordered slot declarations of a production.
    pub fn slots(&self, name: &str) -> Result<&[Slot], SchemaError> {
        self.production(name).map(|p| p.slots())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn productions(&self) -> impl Iterator<Item = &Arc<Production>> {
        self.productions.iter()
    }

    pub fn len(&self) -> usize {
        self.productions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.productions.is_empty()
    }

    /// Flattened schema text in declaration order. Feeding it back to
    /// [`Schema::from_source`] yields an identical registry.
    pub fn canonical(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "schema {};", self.name);
        let _ = writeln!(out, "root {};", self.root);

        for production in &self.productions {
            out.push('\n');
            if production.token {
                let _ = writeln!(out, "token {};", production.name);
                continue;
            }
            let _ = writeln!(out, "node {} {{", production.name);
            for slot in &production.slots {
                let _ = writeln!(out, "    {}{};", slot.kind, slot.cardinality.suffix());
            }
            out.push_str("}\n");
        }
        out
    }

    /// SHA-256 of the canonical form, hex encoded. Changes whenever any
    /// accessor a host could bind to changes.
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.canonical().as_bytes());
        digest.iter().fold(String::with_capacity(64), |mut hex, byte| {
            let _ = write!(hex, "{byte:02x}");
            hex
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEMO: &str = "schema demo;
root sum;
token number;
token plus;
group operand = number, sum;
node sum {
    ..operand*;
    plus!;
}
";

    #[test]
    fn test_lookup_returns_ordered_slots() {
        let schema = Schema::from_source("demo.schema", DEMO).unwrap();
        let slots = schema.slots("sum").unwrap();
        let kinds: Vec<&str> = slots.iter().map(|s| s.kind.as_str()).collect();
        assert_eq!(kinds, ["number", "sum", "plus"]);
        assert_eq!(slots[2].cardinality, Cardinality::Required);
        assert_eq!(schema.root(), "sum");
        assert_eq!(schema.name(), "demo");
    }

    #[test]
    fn test_unknown_production_lookup_fails() {
        let schema = Schema::from_source("demo.schema", DEMO).unwrap();
        let err = schema.production("product").unwrap_err();
        assert!(matches!(err, SchemaError::UnknownProduction { name } if name == "product"));
    }

    #[test]
    fn test_canonical_round_trip_keeps_fingerprint() {
        let schema = Schema::from_source("demo.schema", DEMO).unwrap();
        let again = Schema::from_source("canonical", &schema.canonical()).unwrap();
        assert_eq!(schema.fingerprint(), again.fingerprint());
        assert_eq!(schema.fingerprint().len(), 64);
    }

    #[test]
    fn test_accessor_names_follow_cardinality() {
        let schema = Schema::from_source("demo.schema", DEMO).unwrap();
        let names: Vec<String> = schema.slots("sum").unwrap().iter().map(Slot::accessor_name).collect();
        assert_eq!(names, ["number_list", "sum_list", "plus"]);
    }
}
