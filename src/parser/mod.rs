//! Kotlin expression parser.
//!
//! The pest grammar recognizes the source; `Lowering` then turns pest pairs
//! into [`SyntaxNode`]s, building every node through [`NodeBuilder`] so the
//! resulting tree is checked against the schema as it is assembled.
//!
//! Grammar rules named after a schema production lower to that production.
//! The `*_level` rules carry one binary precedence level and fold into
//! left-nested nodes; a level with a single operand disappears.

use std::path::Path;
use std::sync::Arc;

use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;

use crate::errors::{read_source, KtError, ParseError, SourceContext, StructuralViolation};
use crate::schema::{builtin, Schema};
use crate::syntax::{Kind, Span};
use crate::tree::{NodeBuilder, SyntaxNode, SyntaxTree};

mod nesting;

#[derive(Parser)]
#[grammar = "parser/grammar.pest"]
struct KotlinParser;

/// Deepest bracket and keyword nesting accepted before the grammar runs.
pub const MAX_NESTING: usize = 256;

/// Tallest tree lowering will build. Long operator chains nest one node per
/// operator, so this bounds them too.
pub const MAX_TREE_HEIGHT: usize = 1024;

/// Parsing runs on its own thread so the caller's stack size does not matter.
const PARSER_STACK_SIZE: usize = 64 * 1024 * 1024;

// ============================================================================
// PUBLIC API
// ============================================================================

/// Parses Kotlin source against the built-in schema.
pub fn parse(source: &str, name: &str) -> Result<SyntaxTree, KtError> {
    parse_with(builtin::kotlin()?, source, name)
}

/// Parses Kotlin source, building nodes against `schema`.
pub fn parse_with(schema: &Schema, source: &str, name: &str) -> Result<SyntaxTree, KtError> {
    let context = SourceContext::from_file(name, source);
    if let Some(offset) = nesting::first_excess(source, MAX_NESTING) {
        return Err(too_deep(&context, Span::new(offset, offset + 1), MAX_NESTING).into());
    }

    std::thread::scope(|scope| -> Result<SyntaxTree, KtError> {
        let handle = std::thread::Builder::new()
            .name("ktsyntax-parser".to_string())
            .stack_size(PARSER_STACK_SIZE)
            .spawn_scoped(scope, || parse_in_place(schema, &context))
            .map_err(|e| KtError::Thread(e.to_string()))?;
        match handle.join() {
            Ok(result) => result,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    })
}

/// Reads and parses one file.
pub fn parse_file(path: &Path) -> Result<SyntaxTree, KtError> {
    let source = read_source(path)?;
    parse(&source, &path.display().to_string())
}

fn parse_in_place(schema: &Schema, context: &SourceContext) -> Result<SyntaxTree, KtError> {
    let source = context.content.as_str();
    let mut pairs = KotlinParser::parse(Rule::file, source).map_err(|e| convert_parse_error(e, context))?;

    let Some(file) = pairs.next() else {
        return Err(unexpected_end(context).into());
    };
    let root = Lowering { schema, context }.lower(file)?;
    Ok(SyntaxTree::new(&context.name, source, root))
}

// ============================================================================
// LOWERING
// ============================================================================

struct Lowering<'s> {
    schema: &'s Schema,
    context: &'s SourceContext,
}

type Lowered = Result<Arc<SyntaxNode>, KtError>;

impl Lowering<'_> {
    fn lower(&self, pair: Pair<Rule>) -> Lowered {
        match pair.as_rule() {
            Rule::disjunction_level => self.fold_binary(pair, "disjunction_expression"),
            Rule::conjunction_level => self.fold_binary(pair, "conjunction_expression"),
            Rule::equality_level => self.fold_binary(pair, "equality_expression"),
            Rule::comparison_level => self.fold_binary(pair, "comparison_expression"),
            Rule::elvis_level => self.fold_binary(pair, "elvis_expression"),
            Rule::infix_level => self.fold_binary(pair, "infix_call_expression"),
            Rule::range_level => self.fold_binary(pair, "range_expression"),
            Rule::additive_level => self.fold_binary(pair, "additive_expression"),
            Rule::multiplicative_level => self.fold_binary(pair, "multiplicative_expression"),
            Rule::cast_level => self.fold_cast(pair),
            Rule::prefix_level => self.fold_prefix(pair),
            Rule::postfix_level => self.fold_postfix(pair),
            _ => self.lower_production(pair),
        }
    }

    /// A rule that maps one-to-one onto a production of the same name.
    fn lower_production(&self, pair: Pair<Rule>) -> Lowered {
        let kind = format!("{:?}", pair.as_rule());
        let span = span_of(&pair);

        if self.schema.get(&kind).is_some_and(|p| p.is_token()) {
            return Ok(NodeBuilder::token(self.schema, &kind, span, pair.as_str())?);
        }

        let mut builder = NodeBuilder::node(self.schema, &kind, span)?;
        for inner in pair.into_inner().filter(|p| !is_punctuation(p.as_rule())) {
            builder.child(self.lower(inner)?);
        }
        self.checked(builder.finish()?)
    }

    /// `operand (op operand)*` into left-nested nodes of `kind`.
    fn fold_binary(&self, pair: Pair<Rule>, kind: &str) -> Lowered {
        let mut inner = pair.into_inner();
        let Some(first) = inner.next() else {
            return Err(self.missing_operand(kind).into());
        };
        let mut acc = self.lower(first)?;

        while let Some(op) = inner.next() {
            let Some(rhs) = inner.next() else {
                return Err(self.missing_operand(kind).into());
            };
            let op = self.lower(op)?;
            let rhs = self.lower(rhs)?;
            acc = self.combine(kind, [acc, op, rhs])?;
        }
        Ok(acc)
    }

    /// `operand (as Type)*`.
    fn fold_cast(&self, pair: Pair<Rule>) -> Lowered {
        let mut inner = pair.into_inner();
        let Some(first) = inner.next() else {
            return Err(self.missing_operand("cast_expression").into());
        };
        let mut acc = self.lower(first)?;

        while let Some(op) = inner.next() {
            let Some(target) = inner.next() else {
                return Err(self.missing_operand("cast_expression").into());
            };
            let op = self.lower(op)?;
            let target = self.lower(target)?;
            acc = self.combine("cast_expression", [acc, op, target])?;
        }
        Ok(acc)
    }

    /// `op* operand`, folded right so the innermost operator binds first.
    fn fold_prefix(&self, pair: Pair<Rule>) -> Lowered {
        let mut operators = Vec::new();
        let mut operand = None;
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::prefix_unary_operation => operators.push(self.lower(inner)?),
                _ => operand = Some(self.lower(inner)?),
            }
        }

        let Some(mut acc) = operand else {
            return Err(self.missing_operand("prefix_unary_expression").into());
        };
        for op in operators.into_iter().rev() {
            acc = self.combine("prefix_unary_expression", [op, acc])?;
        }
        Ok(acc)
    }

    /// `primary suffix*`; each suffix wraps everything to its left.
    fn fold_postfix(&self, pair: Pair<Rule>) -> Lowered {
        let mut inner = pair.into_inner();
        let Some(first) = inner.next() else {
            return Err(self.missing_operand("call_expression").into());
        };
        let mut acc = self.lower(first)?;

        for suffix in inner {
            let (kind, child) = match suffix.as_rule() {
                Rule::postfix_unary_operation => ("postfix_unary_expression", self.lower(suffix)?),
                Rule::call_suffix => ("call_expression", self.lower(suffix)?),
                Rule::array_indices => ("array_access", self.lower(suffix)?),
                Rule::dot_selector => ("dot_qualified_expression", self.lower_selector(suffix)?),
                Rule::safe_selector => ("safe_access_expression", self.lower_selector(suffix)?),
                Rule::callable_selector => ("callable_reference", self.lower_selector(suffix)?),
                other => {
                    return Err(StructuralViolation::UnknownProduction {
                        kind: Kind::new(format!("{other:?}")),
                    }
                    .into())
                }
            };
            acc = self.combine(kind, [acc, child])?;
        }
        Ok(acc)
    }

    /// The `selector` node inside a `.name`, `?.name` or `::name` suffix.
    fn lower_selector(&self, suffix: Pair<Rule>) -> Lowered {
        let kind = format!("{:?}", suffix.as_rule());
        match suffix.into_inner().next() {
            Some(selector) => self.lower(selector),
            None => Err(self.missing_operand(&kind).into()),
        }
    }

    /// Builds `kind` over `children`, spanning first to last.
    fn combine<const N: usize>(&self, kind: &str, children: [Arc<SyntaxNode>; N]) -> Lowered {
        let span = match (children.first(), children.last()) {
            (Some(first), Some(last)) => first.span().cover(last.span()),
            _ => Span::default(),
        };
        let mut builder = NodeBuilder::node(self.schema, kind, span)?;
        builder.extend(children);
        self.checked(builder.finish()?)
    }

    fn checked(&self, node: Arc<SyntaxNode>) -> Lowered {
        if node.height() > MAX_TREE_HEIGHT {
            return Err(too_deep(self.context, node.span(), MAX_TREE_HEIGHT).into());
        }
        Ok(node)
    }

    // unreachable for pairs the grammar produces
    fn missing_operand(&self, kind: &str) -> StructuralViolation {
        StructuralViolation::UnknownProduction {
            kind: kind.into(),
        }
    }
}

/// Pairs the grammar produces that have no node of their own.
fn is_punctuation(rule: Rule) -> bool {
    matches!(
        rule,
        Rule::EOI
            | Rule::kw_if
            | Rule::kw_else
            | Rule::kw_when
            | Rule::kw_while
            | Rule::kw_for
            | Rule::kw_in
            | Rule::kw_do
            | Rule::kw_try
            | Rule::kw_catch
            | Rule::kw_finally
            | Rule::kw_return
            | Rule::kw_throw
            | Rule::kw_break
            | Rule::kw_continue
    )
}

fn span_of(pair: &Pair<Rule>) -> Span {
    let span = pair.as_span();
    Span::new(span.start(), span.end())
}

// ============================================================================
// ERROR HANDLING
// ============================================================================

fn convert_parse_error(error: pest::error::Error<Rule>, source: &SourceContext) -> ParseError {
    let (start, end) = match error.location {
        pest::error::InputLocation::Pos(pos) => (pos, pos),
        pest::error::InputLocation::Span((start, end)) => (start, end),
    };

    let (message, help) = match &error.variant {
        pest::error::ErrorVariant::ParsingError { positives, .. } if !positives.is_empty() => {
            let mut expected: Vec<&str> = positives.iter().map(describe_rule).collect();
            expected.sort_unstable();
            expected.dedup();
            let help = positives
                .contains(&Rule::EOI)
                .then(|| "statements are separated by newlines or ';'".to_string());
            (format!("expected {}", expected.join(" or ")), help)
        }
        pest::error::ErrorVariant::CustomError { message } => (message.clone(), None),
        _ => ("unexpected input".to_string(), None),
    };

    ParseError {
        message,
        src: source.to_named_source(),
        span: (start..end).into(),
        help,
        location: Span::new(start, end),
    }
}

fn unexpected_end(source: &SourceContext) -> ParseError {
    let end = source.content.len();
    ParseError {
        message: "empty parse result".to_string(),
        src: source.to_named_source(),
        span: (end..end).into(),
        help: None,
        location: Span::new(end, end),
    }
}

fn too_deep(source: &SourceContext, at: Span, limit: usize) -> ParseError {
    let end = source.content.len();
    let location = Span::new(at.start.min(end), at.end.min(end));
    ParseError {
        message: format!("expression is nested too deeply (limit {limit})"),
        src: source.to_named_source(),
        span: location.into(),
        help: Some("split the expression into smaller statements".to_string()),
        location,
    }
}

fn describe_rule(rule: &Rule) -> &'static str {
    match rule {
        Rule::EOI => "end of input",
        Rule::type_reference => "a type",
        Rule::reference_expression | Rule::selector => "a name",
        Rule::block => "a block",
        Rule::condition => "a condition",
        Rule::catch_parameter => "a catch parameter",
        Rule::label_reference => "a label",
        Rule::call_suffix | Rule::value_argument => "arguments",
        Rule::array_indices => "an index",
        Rule::when_entry | Rule::when_else => "a when entry",
        Rule::loop_parameter => "a loop variable",
        Rule::kw_in => "'in'",
        Rule::kw_while => "'while'",
        Rule::kw_else => "'else'",
        Rule::kw_catch => "'catch'",
        Rule::kw_finally => "'finally'",
        Rule::or_operation
        | Rule::and_operation
        | Rule::equality_operation
        | Rule::comparison_operation
        | Rule::elvis_operation
        | Rule::infix_function
        | Rule::range_operation
        | Rule::additive_operation
        | Rule::multiplicative_operation
        | Rule::cast_operation
        | Rule::postfix_unary_operation => "an operator",
        Rule::dot_selector | Rule::safe_selector | Rule::callable_selector => "a member access",
        _ => "an expression",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::render_tree;

    fn tree(source: &str) -> SyntaxTree {
        parse(source, "test.kt").unwrap()
    }

    fn kinds(node: &SyntaxNode) -> Vec<&str> {
        node.children().iter().map(|c| c.kind().as_str()).collect()
    }

    #[test]
    fn test_single_operand_levels_disappear() {
        let tree = tree("x");
        assert_eq!(kinds(tree.root()), ["reference_expression"]);
    }

    #[test]
    fn test_binary_is_left_nested() {
        let tree = tree("a || b || c");
        let outer = &tree.root().children()[0];
        assert_eq!(outer.kind(), "disjunction_expression");
        assert_eq!(kinds(outer), ["disjunction_expression", "or_operation", "reference_expression"]);
        let inner = outer.optional("disjunction_expression").unwrap();
        assert_eq!(tree.text_of(inner), Some("a || b"));
        assert_eq!(outer.repeated("reference_expression").count(), 1);
        assert_eq!(inner.repeated("reference_expression").count(), 2);
    }

    #[test]
    fn test_precedence() {
        let tree = tree("1 + 2 * 3 == x && !y");
        let and = &tree.root().children()[0];
        assert_eq!(and.kind(), "conjunction_expression");
        let eq = and.optional("equality_expression").unwrap();
        let add = eq.optional("additive_expression").unwrap();
        assert!(add.optional("multiplicative_expression").is_some());
        assert!(and.optional("prefix_unary_expression").is_some());
    }

    #[test]
    fn test_postfix_chain() {
        let tree = tree("a.b(1, 2)[0]?.c::d");
        let top = &tree.root().children()[0];
        assert_eq!(top.kind(), "callable_reference");
        let safe = top.optional("safe_access_expression").unwrap();
        let index = safe.optional("array_access").unwrap();
        let call = index.optional("call_expression").unwrap();
        let args = call.required("call_suffix").unwrap();
        assert_eq!(args.repeated("value_argument").count(), 2);
        assert!(call.optional("dot_qualified_expression").is_some());
    }

    #[test]
    fn test_statements_and_control_flow() {
        let source = "if (a) b else { c; d }\nwhile (x) {\n  break@outer\n}\ntry { f() } catch (e: Exception) { g() } finally { h() }";
        let tree = tree(source);
        assert_eq!(kinds(tree.root()), ["if_expression", "while_expression", "try_expression"]);

        let if_expr = &tree.root().children()[0];
        assert!(if_expr.required("condition").is_some());
        let else_block = if_expr
            .optional("else_branch")
            .and_then(|e| e.optional("block"))
            .unwrap();
        assert_eq!(else_block.children().len(), 2);

        let try_expr = &tree.root().children()[2];
        let catch = try_expr.repeated("catch_clause").next().unwrap();
        let param = catch.required("catch_parameter").unwrap();
        assert_eq!(param.required("type_reference").and_then(SyntaxNode::text), Some("Exception"));
        assert!(try_expr.optional("finally_clause").is_some());
    }

    #[test]
    fn test_literals() {
        let tree = tree("1; 0x1F; 0b101; 1.5e3; true; null; \"s\\\"q\"; this");
        assert_eq!(
            kinds(tree.root()),
            [
                "integer_constant",
                "integer_constant",
                "binary_constant",
                "float_constant",
                "boolean_constant",
                "null_constant",
                "string_template",
                "this_expression",
            ]
        );
    }

    #[test]
    fn test_cast_range_elvis_infix() {
        let tree = tree("a as? T ?: 0..<n to m");
        let elvis = &tree.root().children()[0];
        assert_eq!(elvis.kind(), "elvis_expression");
        assert!(elvis.optional("cast_expression").is_some());
        let infix = elvis.optional("infix_call_expression").unwrap();
        assert_eq!(infix.required("infix_function").and_then(SyntaxNode::text), Some("to"));
        assert!(infix.optional("range_expression").is_some());
    }

    #[test]
    fn test_jumps_and_labels() {
        let tree = tree("loop@ while (true) { return@loop 1 }\nthrow e");
        let labeled = &tree.root().children()[0];
        assert_eq!(labeled.kind(), "labeled_expression");
        assert_eq!(labeled.required("label").and_then(SyntaxNode::text), Some("loop@"));
        let ret = labeled
            .optional("while_expression")
            .and_then(|w| w.required("block"))
            .and_then(|b| b.optional("jump_return"))
            .unwrap();
        assert_eq!(kinds(ret), ["label_reference", "integer_constant"]);
        assert_eq!(tree.root().children()[1].kind(), "jump_throw");
    }

    #[test]
    fn test_comments_and_blank_lines() {
        let tree = tree("\n// first\na /* inline */ + b\n\n;\nc // trailing\n");
        assert_eq!(kinds(tree.root()), ["additive_expression", "reference_expression"]);
    }

    #[test]
    fn test_syntax_error_is_reported() {
        let err = parse("a +", "bad.kt").unwrap_err();
        let KtError::Parse(err) = err else {
            panic!("expected a parse error, got {err:?}");
        };
        assert_eq!(err.location.start, 3);
        assert!(err.message.starts_with("expected"));
    }

    #[test]
    fn test_dangling_infix_reports_expected() {
        let err = parse("a b", "bad.kt").unwrap_err();
        let KtError::Parse(err) = err else {
            panic!("expected a parse error, got {err:?}");
        };
        assert!(err.message.contains("an expression"));
    }

    #[test]
    fn test_parse_is_deterministic() {
        let source = "x?.y ?: z(1) * -2";
        assert_eq!(render_tree(tree(source).root()), render_tree(tree(source).root()));
    }

    #[test]
    fn test_unknown_kind_in_custom_schema_is_violation() {
        let schema = Schema::from_source("tiny", "root file;\ntoken integer_constant;\nnode file { integer_constant*; }\n").unwrap();
        assert!(parse_with(&schema, "1\n2", "t").is_ok());
        let err = parse_with(&schema, "x", "t").unwrap_err();
        assert!(matches!(
            err,
            KtError::Structure(StructuralViolation::UnknownProduction { ref kind }) if kind == "reference_expression"
        ));
    }

    #[test]
    fn test_postfix_increment_and_decrement() {
        let tree = tree("i++ + j--\nx.y++");
        let add = &tree.root().children()[0];
        assert_eq!(add.kind(), "additive_expression");
        let ops: Vec<&str> = add
            .repeated("postfix_unary_expression")
            .filter_map(|e| e.required("postfix_unary_operation").and_then(SyntaxNode::text))
            .collect();
        assert_eq!(ops, ["++", "--"]);

        let member = &tree.root().children()[1];
        assert_eq!(member.kind(), "postfix_unary_expression");
        assert!(member.optional("dot_qualified_expression").is_some());
    }

    #[test]
    fn test_loops() {
        let source = "for (x: Int in 0..n) { f(x) }\ndo {\n  i++\n} while (i < 3)";
        let tree = tree(source);
        assert_eq!(kinds(tree.root()), ["for_expression", "do_while_expression"]);

        let for_expr = &tree.root().children()[0];
        let param = for_expr.required("loop_parameter").unwrap();
        assert_eq!(param.required("reference_expression").and_then(SyntaxNode::text), Some("x"));
        assert_eq!(param.optional("type_reference").and_then(SyntaxNode::text), Some("Int"));
        let range = for_expr.required("loop_range").unwrap();
        assert!(range.optional("range_expression").is_some());

        let do_while = &tree.root().children()[1];
        assert_eq!(kinds(do_while), ["block", "condition"]);
    }

    #[test]
    fn test_when_entries() {
        let source = "when (x) {\n  1, 2 -> a\n  in 3..4, !is String -> { b }\n  else -> c\n}\nwhen { ok -> d }";
        let tree = tree(source);
        assert_eq!(kinds(tree.root()), ["when_expression", "when_expression"]);

        let with_subject = &tree.root().children()[0];
        assert!(with_subject.optional("when_subject").is_some());
        let entries: Vec<&SyntaxNode> = with_subject.repeated("when_entry").collect();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].repeated("when_condition").count(), 2);
        assert_eq!(kinds(entries[1]), ["when_range_condition", "when_type_condition", "then_branch"]);
        let is_check = entries[1].optional("when_type_condition").unwrap();
        assert_eq!(is_check.required("is_operation").and_then(SyntaxNode::text), Some("!is"));
        assert_eq!(entries[2].optional("when_else").and_then(SyntaxNode::text), Some("else"));

        let bare = &tree.root().children()[1];
        assert!(bare.optional("when_subject").is_none());
        assert_eq!(bare.repeated("when_entry").count(), 1);
    }

    fn assert_too_deep(source: &str) {
        let err = parse(source, "deep.kt").unwrap_err();
        let KtError::Parse(err) = err else {
            panic!("expected a parse error, got {err:?}");
        };
        assert!(err.message.contains("nested too deeply"), "{}", err.message);
    }

    #[test]
    fn test_deep_nesting_is_an_error() {
        let depth = MAX_NESTING + 50;
        assert_too_deep(&format!("{}x{}", "(".repeat(depth), ")".repeat(depth)));
        assert_too_deep(&format!("{}x", "if (a)\n".repeat(depth)));
        assert_too_deep(&format!("f{}", "(g".repeat(depth) + &")".repeat(depth)));
    }

    #[test]
    fn test_long_operator_chain_is_an_error() {
        let chain = format!("a{}", " + a".repeat(MAX_TREE_HEIGHT + 10));
        assert_too_deep(&chain);
        assert!(parse(&format!("a{}", " + a".repeat(100)), "chain.kt").is_ok());
    }

    #[test]
    fn test_nesting_below_limit_parses_on_small_stack() {
        let depth = MAX_NESTING - 10;
        let source = format!("{}x{}", "(".repeat(depth), ")".repeat(depth));
        let handle = std::thread::Builder::new()
            .stack_size(1024 * 1024)
            .spawn(move || parse(&source, "nested.kt").map(|tree| tree.root().height()))
            .unwrap();
        let height = handle.join().unwrap().unwrap();
        assert!(height > depth);
    }
}
