//! Schema-driven syntax trees for a Kotlin expression grammar.
//!
//! A [`Schema`] declares every production and its ordered child slots. The
//! parser lowers source text into an immutable [`SyntaxTree`] whose nodes are
//! checked against those slots on construction, and the typed views in
//! [`tree::typed`] bind one accessor to each slot.

pub mod cli;
pub mod config;
pub mod discovery;
pub mod errors;
pub mod parser;
pub mod schema;
pub mod syntax;
pub mod tree;

pub use errors::{KtError, ParseError, SchemaError, StructuralViolation};
pub use parser::{parse, parse_file, parse_with};
pub use schema::{Cardinality, Production, Schema, Slot};
pub use syntax::{Kind, Span};
pub use tree::{NodeBuilder, SyntaxNode, SyntaxTree};
