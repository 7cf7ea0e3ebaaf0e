//! ktsyntax error handling.
//!
//! Two failure families are fatal at the point of detection and are never
//! recovered: [`SchemaError`] for a malformed schema and
//! [`StructuralViolation`] for a node that breaks its production's shape.
//! [`KtError`] unifies them with parse, I/O and config failures.

use std::path::PathBuf;
use std::sync::Arc;

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use crate::syntax::{Kind, Span};

// ============================================================================
// SOURCE CONTEXT
// ============================================================================

/// Named source text attached to diagnostics.
#[derive(Debug, Clone)]
pub struct SourceContext {
    pub name: String,
    pub content: String,
}

impl SourceContext {
    pub fn from_file(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Convert to NamedSource for use with miette error reporting
    pub fn to_named_source(&self) -> Arc<NamedSource<String>> {
        Arc::new(NamedSource::new(self.name.clone(), self.content.clone()))
    }
}

// ============================================================================
// SCHEMA ERRORS
// ============================================================================

/// A malformed schema definition, or a lookup of a production it never declared.
#[derive(Debug, Clone, Error, Diagnostic)]
pub enum SchemaError {
    #[error("schema syntax error: {message}")]
    #[diagnostic(code(ktsyntax::schema::syntax))]
    Syntax {
        message: String,
        #[source_code]
        src: Arc<NamedSource<String>>,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("unknown production '{name}'")]
    #[diagnostic(code(ktsyntax::schema::unknown_production))]
    UnknownProduction { name: String },

    #[error("production '{name}' is declared more than once (line {line})")]
    #[diagnostic(code(ktsyntax::schema::duplicate_production))]
    DuplicateProduction { name: String, line: usize },

    #[error("production '{production}' references undeclared child kind '{kind}'")]
    #[diagnostic(
        code(ktsyntax::schema::undeclared_kind),
        help("declare the kind as a token or node production")
    )]
    UndeclaredKind { production: String, kind: String },

    #[error("group '{name}' is declared more than once (line {line})")]
    #[diagnostic(code(ktsyntax::schema::duplicate_group))]
    DuplicateGroup { name: String, line: usize },

    #[error("'{owner}' splices undeclared group '{group}'")]
    #[diagnostic(code(ktsyntax::schema::undeclared_group))]
    UndeclaredGroup { owner: String, group: String },

    #[error("group '{group}' includes itself")]
    #[diagnostic(code(ktsyntax::schema::recursive_group))]
    RecursiveGroup { group: String },

    #[error("production '{production}' declares slot '{kind}' more than once")]
    #[diagnostic(
        code(ktsyntax::schema::duplicate_slot),
        help("a kind may occupy one slot per production; check spliced groups for overlap")
    )]
    DuplicateSlot { production: String, kind: String },

    #[error("schema declares no root production")]
    #[diagnostic(code(ktsyntax::schema::missing_root), help("add `root <production>;`"))]
    MissingRoot,

    #[error("root '{root}' is not a declared node production")]
    #[diagnostic(code(ktsyntax::schema::unknown_root))]
    UnknownRoot { root: String },

    #[error("required slots form a cycle: {cycle}")]
    #[diagnostic(
        code(ktsyntax::schema::required_cycle),
        help("no finite tree satisfies this; make one of the slots optional")
    )]
    RequiredCycle { cycle: String },
}

// ============================================================================
// STRUCTURAL VIOLATIONS
// ============================================================================

/// A node whose children do not fit its production. This is always a bug in
/// whatever is building the tree.
#[derive(Debug, Clone, Error, Diagnostic)]
pub enum StructuralViolation {
    #[error("node of undeclared production '{kind}'")]
    #[diagnostic(code(ktsyntax::structure::unknown_production), help("this indicates a parser bug"))]
    UnknownProduction { kind: Kind },

    #[error("node production '{kind}' cannot carry token text")]
    #[diagnostic(code(ktsyntax::structure::text_on_node), help("this indicates a parser bug"))]
    TextOnNode { kind: Kind },

    #[error("token '{kind}' cannot have children (got {count})")]
    #[diagnostic(code(ktsyntax::structure::token_with_children), help("this indicates a parser bug"))]
    TokenWithChildren { kind: Kind, count: usize },

    #[error("token '{kind}' must be built with its source text")]
    #[diagnostic(code(ktsyntax::structure::token_without_text), help("use NodeBuilder::token for token productions"))]
    TokenWithoutText { kind: Kind },

    #[error("'{parent}' has no slot for child '{child}' at {span}")]
    #[diagnostic(code(ktsyntax::structure::undeclared_child), help("this indicates a parser bug"))]
    UndeclaredChild { parent: Kind, child: Kind, span: Span },

    #[error("'{parent}' slot '{slot}' holds {count} children, at most one allowed")]
    #[diagnostic(code(ktsyntax::structure::too_many_children), help("this indicates a parser bug"))]
    TooManyChildren { parent: Kind, slot: Kind, count: usize },

    #[error("'{parent}' at {span} is missing required child '{slot}'")]
    #[diagnostic(code(ktsyntax::structure::missing_required), help("this indicates a parser bug"))]
    MissingRequired { parent: Kind, slot: Kind, span: Span },

    #[error("'{parent}' children out of source order: {previous} then {next}")]
    #[diagnostic(code(ktsyntax::structure::out_of_order), help("this indicates a parser bug"))]
    OutOfOrder { parent: Kind, previous: Span, next: Span },

    #[error("child '{child}' at {child_span} lies outside parent '{parent}' at {parent_span}")]
    #[diagnostic(code(ktsyntax::structure::child_outside_parent), help("this indicates a parser bug"))]
    ChildOutsideParent {
        parent: Kind,
        child: Kind,
        parent_span: Span,
        child_span: Span,
    },
}

impl StructuralViolation {
    /// Production of the node that failed to build.
    pub fn parent(&self) -> &Kind {
        match self {
            Self::UnknownProduction { kind }
            | Self::TextOnNode { kind }
            | Self::TokenWithChildren { kind, .. }
            | Self::TokenWithoutText { kind } => kind,
            Self::UndeclaredChild { parent, .. }
            | Self::TooManyChildren { parent, .. }
            | Self::MissingRequired { parent, .. }
            | Self::OutOfOrder { parent, .. }
            | Self::ChildOutsideParent { parent, .. } => parent,
        }
    }
}

// ============================================================================
// PARSE ERRORS
// ============================================================================

/// Source text the expression grammar rejects.
#[derive(Debug, Clone, Error, Diagnostic)]
#[error("syntax error: {message}")]
#[diagnostic(code(ktsyntax::parse))]
pub struct ParseError {
    pub message: String,
    #[source_code]
    pub src: Arc<NamedSource<String>>,
    #[label("here")]
    pub span: SourceSpan,
    #[help]
    pub help: Option<String>,
    /// Byte span, kept alongside the miette span for compact rendering.
    pub location: Span,
}

// ============================================================================
// UNIFIED ERROR
// ============================================================================

#[derive(Debug, Error, Diagnostic)]
pub enum KtError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Structure(#[from] StructuralViolation),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ParseError),

    #[error("failed to read '{}'", .path.display())]
    #[diagnostic(code(ktsyntax::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config '{}': {message}", .path.display())]
    #[diagnostic(code(ktsyntax::config))]
    Config { path: PathBuf, message: String },

    #[error("failed to walk '{}': {message}", .root.display())]
    #[diagnostic(code(ktsyntax::discovery))]
    Walk { root: PathBuf, message: String },

    #[error("failed to start parser thread: {0}")]
    #[diagnostic(code(ktsyntax::thread))]
    Thread(String),

    #[error("failed to serialize tree dump: {0}")]
    #[diagnostic(code(ktsyntax::serialize))]
    Serialize(String),
}

impl KtError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        KtError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Reads a file, attaching the path to any failure.
pub fn read_source(path: &std::path::Path) -> Result<String, KtError> {
    std::fs::read_to_string(path).map_err(|e| KtError::io(path, e))
}

/// Prints an error with full miette diagnostics to stderr.
pub fn print_error(error: KtError) {
    let report = miette::Report::new(error);
    eprintln!("{report:?}");
}
