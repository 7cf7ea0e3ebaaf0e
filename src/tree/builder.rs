//! Validating node construction.
//!
//! [`NodeBuilder`] is the only way to obtain a [`SyntaxNode`]. `finish` checks
//! the collected children against the production before the node exists, so
//! a required slot can never be observed empty.

use std::sync::Arc;

use crate::errors::StructuralViolation;
use crate::schema::{Cardinality, Production, Schema};
use crate::syntax::{Kind, Span};
use crate::tree::SyntaxNode;

#[derive(Debug)]
pub struct NodeBuilder {
    production: Arc<Production>,
    span: Span,
    children: Vec<Arc<SyntaxNode>>,
}

impl NodeBuilder {
    /// Starts an interior node of production `kind`.
    pub fn node(schema: &Schema, kind: &str, span: Span) -> Result<Self, StructuralViolation> {
        let production = lookup(schema, kind)?;
        Ok(Self {
            production,
            span,
            children: Vec::new(),
        })
    }

    /// Builds a leaf of token production `kind` carrying `text`.
    pub fn token(
        schema: &Schema,
        kind: &str,
        span: Span,
        text: &str,
    ) -> Result<Arc<SyntaxNode>, StructuralViolation> {
        let production = lookup(schema, kind)?;
        if !production.is_token() {
            return Err(StructuralViolation::TextOnNode {
                kind: production.name().clone(),
            });
        }
        Ok(Arc::new(SyntaxNode::from_parts(
            production,
            span,
            Some(Arc::from(text)),
            Vec::new(),
            Vec::new(),
        )))
    }

    pub fn kind(&self) -> &Kind {
        self.production.name()
    }

    pub fn span(&self) -> Span {
        self.span
    }

    /// Appends a child. Children must be added in source order.
    pub fn child(&mut self, child: Arc<SyntaxNode>) -> &mut Self {
        self.children.push(child);
        self
    }

    pub fn extend(&mut self, children: impl IntoIterator<Item = Arc<SyntaxNode>>) -> &mut Self {
        self.children.extend(children);
        self
    }

    /// Validates the children and produces the node.
    pub fn finish(self) -> Result<Arc<SyntaxNode>, StructuralViolation> {
        let parent = self.production.name();

        if self.production.is_token() {
            if !self.children.is_empty() {
                return Err(StructuralViolation::TokenWithChildren {
                    kind: parent.clone(),
                    count: self.children.len(),
                });
            }
            // text is only supplied through `NodeBuilder::token`
            return Err(StructuralViolation::TokenWithoutText { kind: parent.clone() });
        }

        let mut slot_table: Vec<Vec<usize>> = vec![Vec::new(); self.production.slots().len()];
        let mut previous: Option<Span> = None;

        for (i, child) in self.children.iter().enumerate() {
            let span = child.span();

            if !self.span.contains(span) {
                return Err(StructuralViolation::ChildOutsideParent {
                    parent: parent.clone(),
                    child: child.kind().clone(),
                    parent_span: self.span,
                    child_span: span,
                });
            }
            if let Some(prev) = previous {
                if span.start < prev.end {
                    return Err(StructuralViolation::OutOfOrder {
                        parent: parent.clone(),
                        previous: prev,
                        next: span,
                    });
                }
            }
            previous = Some(span);

            let Some(index) = self.production.slot_index(child.kind().as_str()) else {
                return Err(StructuralViolation::UndeclaredChild {
                    parent: parent.clone(),
                    child: child.kind().clone(),
                    span,
                });
            };
            slot_table[index].push(i);
        }

        for (slot, filled) in self.production.slots().iter().zip(&slot_table) {
            match slot.cardinality {
                Cardinality::Required if filled.is_empty() => {
                    return Err(StructuralViolation::MissingRequired {
                        parent: parent.clone(),
                        slot: slot.kind.clone(),
                        span: self.span,
                    });
                }
                Cardinality::Optional | Cardinality::Required if filled.len() > 1 => {
                    return Err(StructuralViolation::TooManyChildren {
                        parent: parent.clone(),
                        slot: slot.kind.clone(),
                        count: filled.len(),
                    });
                }
                _ => {}
            }
        }

        Ok(Arc::new(SyntaxNode::from_parts(
            self.production,
            self.span,
            None,
            self.children,
            slot_table,
        )))
    }
}

fn lookup(schema: &Schema, kind: &str) -> Result<Arc<Production>, StructuralViolation> {
    schema
        .get(kind)
        .cloned()
        .ok_or_else(|| StructuralViolation::UnknownProduction { kind: Kind::new(kind) })
}
