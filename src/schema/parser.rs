//! Parser for the schema language.
//!
//! Produces raw declarations only; name resolution, group expansion and every
//! consistency check live in [`super::validators`].

use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;

use crate::errors::{SchemaError, SourceContext};
use crate::schema::Cardinality;

#[derive(Parser)]
#[grammar = "schema/grammar.pest"]
struct SchemaParser;

// ============================================================================
// RAW DECLARATIONS
// ============================================================================

/// Everything a schema file declares, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct SchemaDecl {
    pub name: Option<String>,
    pub roots: Vec<Located<String>>,
    pub productions: Vec<ProductionDecl>,
    pub groups: Vec<GroupDecl>,
}

/// A value with the 1-based line it was declared on.
#[derive(Debug, Clone, PartialEq)]
pub struct Located<T> {
    pub value: T,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductionDecl {
    pub name: String,
    pub token: bool,
    pub slots: Vec<SlotDecl>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SlotDecl {
    pub target: SlotTarget,
    pub cardinality: Cardinality,
    pub line: usize,
}

/// What a slot or group item points at before expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotTarget {
    Kind(String),
    Group(String),
}

impl SlotTarget {
    pub fn name(&self) -> &str {
        match self {
            SlotTarget::Kind(name) | SlotTarget::Group(name) => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupDecl {
    pub name: String,
    pub items: Vec<SlotTarget>,
    pub line: usize,
}

// ============================================================================
// PUBLIC API
// ============================================================================

/// Parses schema text into raw declarations.
pub fn parse_schema(source: &SourceContext) -> Result<SchemaDecl, SchemaError> {
    let mut pairs = SchemaParser::parse(Rule::schema_file, &source.content)
        .map_err(|e| convert_parse_error(e, source))?;

    let mut decl = SchemaDecl::default();
    let Some(file) = pairs.next() else {
        return Ok(decl);
    };

    for pair in file.into_inner() {
        let line = pair.line_col().0;
        match pair.as_rule() {
            Rule::header => decl.name = Some(declared_name(pair)),
            Rule::root_decl => decl.roots.push(Located {
                value: declared_name(pair),
                line,
            }),
            Rule::token_decl => decl.productions.push(ProductionDecl {
                name: declared_name(pair),
                token: true,
                slots: Vec::new(),
                line,
            }),
            Rule::node_decl => decl.productions.push(build_node(pair, line)),
            Rule::group_decl => decl.groups.push(build_group(pair, line)),
            _ => {}
        }
    }

    Ok(decl)
}

// ============================================================================
// BUILDERS
// ============================================================================

fn build_node(pair: Pair<Rule>, line: usize) -> ProductionDecl {
    let mut name = String::new();
    let mut slots = Vec::new();

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::ident => name = inner.as_str().to_string(),
            Rule::slot_decl => {
                if let Some(slot) = build_slot(inner) {
                    slots.push(slot);
                }
            }
            _ => {}
        }
    }

    ProductionDecl {
        name,
        token: false,
        slots,
        line,
    }
}

fn build_slot(pair: Pair<Rule>) -> Option<SlotDecl> {
    let line = pair.line_col().0;
    let mut target = None;
    let mut cardinality = None;

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::ident => target = Some(SlotTarget::Kind(inner.as_str().to_string())),
            Rule::splice => target = Some(SlotTarget::Group(declared_name(inner))),
            Rule::cardinality => cardinality = inner.as_str().chars().next().and_then(Cardinality::from_suffix),
            _ => {}
        }
    }

    Some(SlotDecl {
        target: target?,
        cardinality: cardinality?,
        line,
    })
}

fn build_group(pair: Pair<Rule>, line: usize) -> GroupDecl {
    let mut inner = pair.into_inner().filter(|p| p.as_rule() != Rule::kw_group);
    let name = inner
        .next()
        .map(|p| p.as_str().to_string())
        .unwrap_or_default();

    let items = inner
        .filter_map(|item| match item.as_rule() {
            Rule::ident => Some(SlotTarget::Kind(item.as_str().to_string())),
            Rule::splice => Some(SlotTarget::Group(declared_name(item))),
            _ => None,
        })
        .collect();

    GroupDecl { name, items, line }
}

/// First identifier inside a declaration.
fn declared_name(pair: Pair<Rule>) -> String {
    pair.into_inner()
        .find(|p| p.as_rule() == Rule::ident)
        .map(|p| p.as_str().to_string())
        .unwrap_or_default()
}

// ============================================================================
// ERROR HANDLING
// ============================================================================

fn convert_parse_error(error: pest::error::Error<Rule>, source: &SourceContext) -> SchemaError {
    let (start, end) = match error.location {
        pest::error::InputLocation::Pos(pos) => (pos, pos),
        pest::error::InputLocation::Span((start, end)) => (start, end),
    };

    let message = match &error.variant {
        pest::error::ErrorVariant::ParsingError { positives, .. } if !positives.is_empty() => {
            let mut expected: Vec<&str> = positives.iter().map(describe_rule).collect();
            expected.sort_unstable();
            expected.dedup();
            format!("expected {}", expected.join(" or "))
        }
        pest::error::ErrorVariant::CustomError { message } => message.clone(),
        _ => "unexpected input".to_string(),
    };

    SchemaError::Syntax {
        message,
        src: source.to_named_source(),
        span: (start..end).into(),
    }
}

fn describe_rule(rule: &Rule) -> &'static str {
    match rule {
        Rule::ident => "a name",
        Rule::cardinality => "a cardinality ('!', '?' or '*')",
        Rule::slot_decl => "a slot",
        Rule::splice => "a '..group' splice",
        Rule::EOI => "end of file",
        _ => "a declaration",
    }
}
