// tests/parser_tests.rs

use ktsyntax::schema::builtin;
use ktsyntax::tree::render_tree;
use ktsyntax::{parse, parse_with, KtError, Schema, SyntaxNode, SyntaxTree};

// A helper to get the kinds of a node's children.
fn kinds(node: &SyntaxNode) -> Vec<&str> {
    node.children().iter().map(|c| c.kind().as_str()).collect()
}

fn tree(source: &str) -> SyntaxTree {
    parse(source, "test.kt").unwrap()
}

// ---
// Operators and nesting
// ---

#[test]
fn test_left_associative_additive_chain() {
    let tree = tree("a - b + c");
    let outer = &tree.root().children()[0];
    assert_eq!(kinds(outer), ["additive_expression", "additive_operation", "reference_expression"]);
    assert_eq!(tree.text_of(outer.optional("additive_expression").unwrap()), Some("a - b"));
}

#[test]
fn test_prefix_operators_nest_inward() {
    let tree = tree("!-x");
    let not = &tree.root().children()[0];
    assert_eq!(not.kind(), "prefix_unary_expression");
    assert_eq!(not.required("prefix_unary_operation").and_then(SyntaxNode::text), Some("!"));
    let neg = not.optional("prefix_unary_expression").unwrap();
    assert_eq!(neg.required("prefix_unary_operation").and_then(SyntaxNode::text), Some("-"));
}

#[test]
fn test_array_access_and_safe_cast() {
    let tree = tree("xs[0, 1] as? List");
    let cast = &tree.root().children()[0];
    assert_eq!(cast.kind(), "cast_expression");
    assert_eq!(cast.required("cast_operation").and_then(SyntaxNode::text), Some("as?"));

    let access = cast.optional("array_access").unwrap();
    let indices = access.required("array_indices").unwrap();
    assert_eq!(indices.repeated("integer_constant").count(), 2);
}

#[test]
fn test_operators_may_continue_on_next_line() {
    let tree = tree("a &&\n  b");
    assert_eq!(kinds(tree.root()), ["conjunction_expression"]);
}

// ---
// Literals and names
// ---

#[test]
fn test_literal_forms() {
    let tree = tree("0x1F; 0b101; 1.5e3; 2L; `when`; this; 1_000");
    assert_eq!(
        kinds(tree.root()),
        [
            "integer_constant",
            "binary_constant",
            "float_constant",
            "integer_constant",
            "reference_expression",
            "this_expression",
            "integer_constant",
        ]
    );
    assert_eq!(tree.root().children()[4].text(), Some("`when`"));
}

// ---
// Control flow
// ---

#[test]
fn test_try_catch_finally() {
    let tree = tree("try {\n  risky()\n} catch (e: IOException) {\n  throw e\n} finally { done() }");
    let try_expr = &tree.root().children()[0];
    assert_eq!(kinds(try_expr), ["block", "catch_clause", "finally_clause"]);

    let catch = try_expr.repeated("catch_clause").next().unwrap();
    let param = catch.required("catch_parameter").unwrap();
    assert_eq!(param.required("reference_expression").and_then(SyntaxNode::text), Some("e"));
    let body = catch.required("block").unwrap();
    assert_eq!(kinds(body), ["jump_throw"]);
}

#[test]
fn test_labeled_loop_with_break() {
    let tree = tree("outer@ while (true) { break@outer }");
    let labeled = &tree.root().children()[0];
    assert_eq!(kinds(labeled), ["label", "while_expression"]);
    let body = labeled
        .optional("while_expression")
        .and_then(|w| w.required("block"))
        .unwrap();
    let jump = &body.children()[0];
    assert_eq!(jump.kind(), "jump_break");
    assert_eq!(jump.optional("label_reference").and_then(SyntaxNode::text), Some("@outer"));
}

#[test]
fn test_member_chain_across_lines() {
    let tree = tree("list\n  .filter(p)\n  .size");
    let top = &tree.root().children()[0];
    assert_eq!(top.kind(), "dot_qualified_expression");
    assert_eq!(top.required("selector").map(kinds), Some(vec!["reference_expression"]));
}

// ---
// Failures
// ---

#[test]
fn test_unclosed_paren_is_parse_error() {
    let err = parse("f(a, b", "bad.kt").unwrap_err();
    assert!(matches!(err, KtError::Parse(_)), "got {err:?}");
}

#[test]
fn test_schema_without_node_is_structural_error() {
    // a registry that knows the literals but not the binary levels
    let schema = Schema::from_source(
        "tiny",
        "root file;\ntoken integer_constant;\ntoken additive_operation;\nnode file { integer_constant*; }\n",
    )
    .unwrap();
    assert!(parse_with(&schema, "1\n2", "ok.kt").is_ok());
    assert!(matches!(
        parse_with(&schema, "1 + 2", "bad.kt"),
        Err(KtError::Structure(_))
    ));
}

#[test]
fn test_builtin_and_explicit_schema_agree() {
    let source = "if (a) b?.c else d ?: e";
    let implicit = parse(source, "a.kt").unwrap();
    let explicit = parse_with(builtin::kotlin().unwrap(), source, "a.kt").unwrap();
    assert_eq!(render_tree(implicit.root()), render_tree(explicit.root()));
}
