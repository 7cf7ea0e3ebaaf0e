//! Serializable and textual renderings of a tree.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::syntax::Span;
use crate::tree::SyntaxNode;

/// Owned mirror of a subtree, for JSON and YAML output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeDump {
    pub kind: String,
    pub span: Span,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeDump>,
}

impl TreeDump {
    pub fn from_node(node: &SyntaxNode) -> Self {
        Self {
            kind: node.kind().to_string(),
            span: node.span(),
            text: node.text().map(str::to_string),
            children: node.children().iter().map(|c| Self::from_node(c)).collect(),
        }
    }
}

/// Indented one-line-per-node form: `kind @start..end "text"`.
pub fn render_tree(node: &SyntaxNode) -> String {
    let mut out = String::new();
    render_into(&mut out, node, 0);
    out
}

fn render_into(out: &mut String, node: &SyntaxNode, depth: usize) {
    let _ = write!(out, "{:indent$}{} @{}", "", node.kind(), node.span(), indent = depth * 2);
    if let Some(text) = node.text() {
        let _ = write!(out, " {text:?}");
    }
    out.push('\n');
    for child in node.children() {
        render_into(out, child, depth + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;
    use crate::tree::NodeBuilder;

    #[test]
    fn test_render_and_dump() {
        let schema = Schema::from_source("t", "root pair;\ntoken key;\ntoken value;\nnode pair { key!; value?; }\n").unwrap();
        let mut pair = NodeBuilder::node(&schema, "pair", Span::new(0, 5)).unwrap();
        pair.child(NodeBuilder::token(&schema, "key", Span::new(0, 1), "k").unwrap())
            .child(NodeBuilder::token(&schema, "value", Span::new(2, 5), "\"v\"").unwrap());
        let pair = pair.finish().unwrap();

        assert_eq!(
            render_tree(&pair),
            "pair @0..5\n  key @0..1 \"k\"\n  value @2..5 \"\\\"v\\\"\"\n"
        );

        let dump = TreeDump::from_node(&pair);
        let json = serde_json::to_string(&dump).unwrap();
        assert_eq!(
            json,
            r#"{"kind":"pair","span":{"start":0,"end":5},"children":[{"kind":"key","span":{"start":0,"end":1},"text":"k"},{"kind":"value","span":{"start":2,"end":5},"text":"\"v\""}]}"#
        );
        let back: TreeDump = serde_json::from_str(&json).unwrap();
        assert_eq!(back, dump);
    }
}
