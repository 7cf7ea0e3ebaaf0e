//! # Syntax Node & Accessor Layer
//!
//! A [`SyntaxNode`] is an immutable instance of a production. Its children are
//! kept in source order and indexed per slot at construction time, so every
//! accessor is a table lookup that can neither fail nor mutate.
//!
//! Nodes are only built through [`builder::NodeBuilder`], which enforces the
//! production's shape. A node that exists is therefore structurally valid.

use std::iter::FusedIterator;
use std::sync::Arc;

use crate::schema::{Cardinality, Production};
use crate::syntax::{Kind, Span};

pub mod builder;
pub mod dump;
pub mod typed;

pub use builder::NodeBuilder;
pub use dump::{render_tree, TreeDump};

// ============================================================================
// SYNTAX NODE
// ============================================================================

/// An immutable syntax tree node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxNode {
    production: Arc<Production>,
    span: Span,
    text: Option<Arc<str>>,
    children: Vec<Arc<SyntaxNode>>,
    /// Child indices per slot, parallel to `production.slots()`.
    slot_table: Vec<Vec<usize>>,
    height: usize,
}

impl SyntaxNode {
    pub(crate) fn from_parts(
        production: Arc<Production>,
        span: Span,
        text: Option<Arc<str>>,
        children: Vec<Arc<SyntaxNode>>,
        slot_table: Vec<Vec<usize>>,
    ) -> Self {
        let height = 1 + children.iter().map(|c| c.height).max().unwrap_or(0);
        Self {
            production,
            span,
            text,
            children,
            slot_table,
            height,
        }
    }

    pub fn kind(&self) -> &Kind {
        self.production.name()
    }

    pub fn production(&self) -> &Production {
        &self.production
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn is_token(&self) -> bool {
        self.production.is_token()
    }

    /// Source text of a token node; `None` for interior nodes.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Number of nodes on the longest path down to a leaf, this one included.
    pub fn height(&self) -> usize {
        self.height
    }

    /// All children in source order.
    pub fn children(&self) -> &[Arc<SyntaxNode>] {
        &self.children
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    /// Child occupying an optional or required slot, if present.
    ///
    /// For a repeated slot this is the first child of that kind.
    pub fn optional(&self, kind: &str) -> Option<&SyntaxNode> {
        self.slot_indices(kind)?
            .first()
            .map(|&i| &*self.children[i])
    }

    /// Child occupying a required slot.
    ///
    /// Always `Some` when `kind` is a required slot of this production; `None`
    /// only when it is not.
    pub fn required(&self, kind: &str) -> Option<&SyntaxNode> {
        let index = self.production.slot_index(kind)?;
        if self.production.slots()[index].cardinality != Cardinality::Required {
            return None;
        }
        self.slot_table[index].first().map(|&i| &*self.children[i])
    }

    /// Children of `kind` in source order. Empty when the kind is absent or
    /// is not a slot of this production.
    pub fn repeated(&self, kind: &str) -> Children<'_> {
        let indices = self.slot_indices(kind).unwrap_or(&[]);
        Children {
            children: &self.children,
            indices: indices.iter(),
        }
    }

    /// View of one slot shaped by its cardinality; `None` for a kind the
    /// production does not declare.
    pub fn slot(&self, kind: &str) -> Option<SlotView<'_>> {
        let index = self.production.slot_index(kind)?;
        let indices = &self.slot_table[index];
        let first = indices.first().map(|&i| &*self.children[i]);

        match self.production.slots()[index].cardinality {
            Cardinality::Optional => Some(SlotView::Optional(first)),
            Cardinality::Required => first.map(SlotView::Required),
            Cardinality::Repeated => Some(SlotView::Repeated(Children {
                children: &self.children,
                indices: indices.iter(),
            })),
        }
    }

    /// This node and every node below it, pre-order.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }

    fn slot_indices(&self, kind: &str) -> Option<&[usize]> {
        self.production
            .slot_index(kind)
            .map(|index| self.slot_table[index].as_slice())
    }
}

/// A slot's contents, shaped by its cardinality.
#[derive(Debug, Clone)]
pub enum SlotView<'a> {
    Optional(Option<&'a SyntaxNode>),
    Required(&'a SyntaxNode),
    Repeated(Children<'a>),
}

impl<'a> SlotView<'a> {
    pub fn cardinality(&self) -> Cardinality {
        match self {
            SlotView::Optional(_) => Cardinality::Optional,
            SlotView::Required(_) => Cardinality::Required,
            SlotView::Repeated(_) => Cardinality::Repeated,
        }
    }

    /// Number of children the slot holds.
    pub fn len(&self) -> usize {
        match self {
            SlotView::Optional(node) => usize::from(node.is_some()),
            SlotView::Required(_) => 1,
            SlotView::Repeated(children) => children.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ============================================================================
// ITERATORS
// ============================================================================

/// Children of one kind, in source order.
#[derive(Debug, Clone)]
pub struct Children<'a> {
    children: &'a [Arc<SyntaxNode>],
    indices: std::slice::Iter<'a, usize>,
}

impl<'a> Iterator for Children<'a> {
    type Item = &'a SyntaxNode;

    fn next(&mut self) -> Option<Self::Item> {
        self.indices.next().map(|&i| &*self.children[i])
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.indices.size_hint()
    }
}

impl DoubleEndedIterator for Children<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.indices.next_back().map(|&i| &*self.children[i])
    }
}

impl ExactSizeIterator for Children<'_> {}
impl FusedIterator for Children<'_> {}

/// Pre-order walk over a subtree.
#[derive(Debug, Clone)]
pub struct Descendants<'a> {
    stack: Vec<&'a SyntaxNode>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a SyntaxNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev().map(|c| &**c));
        Some(node)
    }
}

// ============================================================================
// SYNTAX TREE
// ============================================================================

/// A root node together with the source it was parsed from.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    name: String,
    source: Arc<str>,
    root: Arc<SyntaxNode>,
}

impl SyntaxTree {
    pub fn new(name: impl Into<String>, source: impl Into<Arc<str>>, root: Arc<SyntaxNode>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            root,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn root(&self) -> &SyntaxNode {
        &self.root
    }

    /// Shared handle to the root, for subtrees that outlive the tree value.
    pub fn root_arc(&self) -> Arc<SyntaxNode> {
        Arc::clone(&self.root)
    }

    /// Source text covered by `node`.
    pub fn text_of(&self, node: &SyntaxNode) -> Option<&str> {
        node.span().slice(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;

    const SCHEMA: &str = "root list;
token item;
token comma;
token label;
node list {
    label?;
    comma*;
    item*;
}
node pair {
    item!;
    label?;
}
";

    fn schema() -> Schema {
        Schema::from_source("list.schema", SCHEMA).unwrap()
    }

    fn token(schema: &Schema, kind: &str, start: usize, text: &str) -> Arc<SyntaxNode> {
        NodeBuilder::token(schema, kind, Span::new(start, start + text.len()), text).unwrap()
    }

    fn sample(schema: &Schema) -> Arc<SyntaxNode> {
        // "a,b"
        let mut list = NodeBuilder::node(schema, "list", Span::new(0, 3)).unwrap();
        list.child(token(schema, "item", 0, "a"))
            .child(token(schema, "comma", 1, ","))
            .child(token(schema, "item", 2, "b"));
        list.finish().unwrap()
    }

    #[test]
    fn test_repeated_keeps_source_order() {
        let schema = schema();
        let list = sample(&schema);
        let items: Vec<&str> = list.repeated("item").filter_map(SyntaxNode::text).collect();
        assert_eq!(items, ["a", "b"]);
        assert_eq!(list.repeated("item").len(), 2);
        assert_eq!(list.children().len(), 3);
    }

    #[test]
    fn test_absent_slots_never_fail() {
        let schema = schema();
        let list = sample(&schema);
        assert!(list.optional("label").is_none());
        assert_eq!(list.repeated("nothing").count(), 0);
        assert!(list.required("item").is_none());
        assert!(list.slot("nothing").is_none());
        assert!(matches!(list.slot("label"), Some(SlotView::Optional(None))));
    }

    #[test]
    fn test_required_slot_view() {
        let schema = schema();
        let mut pair = NodeBuilder::node(&schema, "pair", Span::new(0, 1)).unwrap();
        pair.child(token(&schema, "item", 0, "x"));
        let pair = pair.finish().unwrap();

        assert_eq!(pair.required("item").and_then(SyntaxNode::text), Some("x"));
        let view = pair.slot("item").unwrap();
        assert_eq!(view.cardinality(), Cardinality::Required);
        assert_eq!(view.len(), 1);
    }

    #[test]
    fn test_descendants_are_pre_order() {
        let schema = schema();
        let list = sample(&schema);
        let kinds: Vec<&str> = list.descendants().map(|n| n.kind().as_str()).collect();
        assert_eq!(kinds, ["list", "item", "comma", "item"]);
    }

    #[test]
    fn test_tree_recovers_text() {
        let schema = schema();
        let tree = SyntaxTree::new("inline", "a,b", sample(&schema));
        assert_eq!(tree.text_of(tree.root()), Some("a,b"));
        let comma = tree.root().optional("comma").unwrap();
        assert_eq!(tree.text_of(comma), Some(","));
    }

    #[test]
    fn test_nodes_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SyntaxNode>();
        assert_send_sync::<SyntaxTree>();
        assert_send_sync::<Schema>();
    }
}
