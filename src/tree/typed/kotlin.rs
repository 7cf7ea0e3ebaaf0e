//! Views for every production of the built-in Kotlin schema.
//!
//! Slot lists follow `kotlin.schema` after group expansion;
//! `test_views_agree_with_registry` fails when the two drift apart.

use super::{TypedNode, ViewInfo};
use crate::schema::Cardinality;
use crate::tree::SyntaxNode;

typed_tokens! {
    IntegerConstant = "integer_constant",
    FloatConstant = "float_constant",
    BinaryConstant = "binary_constant",
    BooleanConstant = "boolean_constant",
    NullConstant = "null_constant",
    StringTemplate = "string_template",
    ReferenceExpression = "reference_expression",
    ThisExpression = "this_expression",
    Label = "label",
    LabelReference = "label_reference",
    TypeReference = "type_reference",
    WhenElse = "when_else",
    InOperation = "in_operation",
    IsOperation = "is_operation",
    PrefixUnaryOperation = "prefix_unary_operation",
    PostfixUnaryOperation = "postfix_unary_operation",
    CastOperation = "cast_operation",
    MultiplicativeOperation = "multiplicative_operation",
    AdditiveOperation = "additive_operation",
    RangeOperation = "range_operation",
    InfixFunction = "infix_function",
    ElvisOperation = "elvis_operation",
    ComparisonOperation = "comparison_operation",
    EqualityOperation = "equality_operation",
    AndOperation = "and_operation",
    OrOperation = "or_operation",
}

// =====================
// Operand groups
// =====================

/// `group! { name, callback! { args } }` calls the callback with the group's
/// members appended to `args`. Each group lists the members it adds to the
/// one it splices, as in `kotlin.schema`.
macro_rules! group {
    (literal, $cb:ident ! { $($args:tt)* }) => {
        $cb! { $($args)*
            integer_constant integer_constant_list IntegerConstant,
            float_constant float_constant_list FloatConstant,
            binary_constant binary_constant_list BinaryConstant,
            boolean_constant boolean_constant_list BooleanConstant,
            null_constant null_constant_list NullConstant,
            string_template string_template_list StringTemplate,
        }
    };
    (primary, $cb:ident ! { $($args:tt)* }) => {
        group! { literal, $cb! { $($args)*
            reference_expression reference_expression_list ReferenceExpression,
            this_expression this_expression_list ThisExpression,
            parenthesized_expression parenthesized_expression_list ParenthesizedExpression,
            if_expression if_expression_list IfExpression,
            when_expression when_expression_list WhenExpression,
            while_expression while_expression_list WhileExpression,
            do_while_expression do_while_expression_list DoWhileExpression,
            for_expression for_expression_list ForExpression,
            try_expression try_expression_list TryExpression,
            jump_return jump_return_list JumpReturn,
            jump_throw jump_throw_list JumpThrow,
            jump_break jump_break_list JumpBreak,
            jump_continue jump_continue_list JumpContinue,
            labeled_expression labeled_expression_list LabeledExpression,
        } }
    };
    (postfix, $cb:ident ! { $($args:tt)* }) => {
        group! { primary, $cb! { $($args)*
            call_expression call_expression_list CallExpression,
            array_access array_access_list ArrayAccess,
            dot_qualified_expression dot_qualified_expression_list DotQualifiedExpression,
            safe_access_expression safe_access_expression_list SafeAccessExpression,
            callable_reference callable_reference_list CallableReference,
            postfix_unary_expression postfix_unary_expression_list PostfixUnaryExpression,
        } }
    };
    (prefix, $cb:ident ! { $($args:tt)* }) => {
        group! { postfix, $cb! { $($args)*
            prefix_unary_expression prefix_unary_expression_list PrefixUnaryExpression,
        } }
    };
    (cast, $cb:ident ! { $($args:tt)* }) => {
        group! { prefix, $cb! { $($args)*
            cast_expression cast_expression_list CastExpression,
        } }
    };
    (multiplicative, $cb:ident ! { $($args:tt)* }) => {
        group! { cast, $cb! { $($args)*
            multiplicative_expression multiplicative_expression_list MultiplicativeExpression,
        } }
    };
    (additive, $cb:ident ! { $($args:tt)* }) => {
        group! { multiplicative, $cb! { $($args)*
            additive_expression additive_expression_list AdditiveExpression,
        } }
    };
    (range, $cb:ident ! { $($args:tt)* }) => {
        group! { additive, $cb! { $($args)*
            range_expression range_expression_list RangeExpression,
        } }
    };
    (infix, $cb:ident ! { $($args:tt)* }) => {
        group! { range, $cb! { $($args)*
            infix_call_expression infix_call_expression_list InfixCallExpression,
        } }
    };
    (elvis, $cb:ident ! { $($args:tt)* }) => {
        group! { infix, $cb! { $($args)*
            elvis_expression elvis_expression_list ElvisExpression,
        } }
    };
    (comparison, $cb:ident ! { $($args:tt)* }) => {
        group! { elvis, $cb! { $($args)*
            comparison_expression comparison_expression_list ComparisonExpression,
        } }
    };
    (equality, $cb:ident ! { $($args:tt)* }) => {
        group! { comparison, $cb! { $($args)*
            equality_expression equality_expression_list EqualityExpression,
        } }
    };
    (conjunction, $cb:ident ! { $($args:tt)* }) => {
        group! { equality, $cb! { $($args)*
            conjunction_expression conjunction_expression_list ConjunctionExpression,
        } }
    };
    (disjunction, $cb:ident ! { $($args:tt)* }) => {
        group! { conjunction, $cb! { $($args)*
            disjunction_expression disjunction_expression_list DisjunctionExpression,
        } }
    };
    (expression, $cb:ident ! { $($args:tt)* }) => {
        group! { disjunction, $cb! { $($args)* } }
    };
}

group! { expression, typed_union! {
    /// Any node that may stand where an expression is expected.
    Expression;
} }

// =====================
// Nodes
// =====================

typed_nodes! {
    File = "file" {
        splice { repeated expression }
    }

    Block = "block" {
        splice { repeated expression }
    }

    ParenthesizedExpression = "parenthesized_expression" {
        splice { optional expression }
    }

    Condition = "condition" {
        splice { optional expression }
    }

    ThenBranch = "then_branch" {
        optional {
            block: Block,
        }
        splice { optional expression }
    }

    ElseBranch = "else_branch" {
        optional {
            block: Block,
        }
        splice { optional expression }
    }

    IfExpression = "if_expression" {
        required {
            condition: Condition,
            then_branch: ThenBranch,
        }
        optional {
            else_branch: ElseBranch,
        }
    }

    WhileExpression = "while_expression" {
        required {
            condition: Condition,
            block: Block,
        }
    }

    DoWhileExpression = "do_while_expression" {
        required {
            block: Block,
            condition: Condition,
        }
    }

    ForExpression = "for_expression" {
        required {
            loop_parameter: LoopParameter,
            loop_range: LoopRange,
            block: Block,
        }
    }

    LoopParameter = "loop_parameter" {
        required {
            reference_expression: ReferenceExpression,
        }
        optional {
            type_reference: TypeReference,
        }
    }

    LoopRange = "loop_range" {
        splice { optional expression }
    }

    WhenExpression = "when_expression" {
        optional {
            when_subject: WhenSubject,
        }
        repeated {
            when_entry_list: WhenEntry,
        }
    }

    WhenSubject = "when_subject" {
        splice { optional expression }
    }

    WhenEntry = "when_entry" {
        required {
            then_branch: ThenBranch,
        }
        optional {
            when_else: WhenElse,
        }
        repeated {
            when_condition_list: WhenCondition,
            when_range_condition_list: WhenRangeCondition,
            when_type_condition_list: WhenTypeCondition,
        }
    }

    WhenCondition = "when_condition" {
        splice { optional expression }
    }

    WhenRangeCondition = "when_range_condition" {
        required {
            in_operation: InOperation,
        }
        splice { optional expression }
    }

    WhenTypeCondition = "when_type_condition" {
        required {
            is_operation: IsOperation,
            type_reference: TypeReference,
        }
    }

    TryExpression = "try_expression" {
        required {
            block: Block,
        }
        optional {
            finally_clause: FinallyClause,
        }
        repeated {
            catch_clause_list: CatchClause,
        }
    }

    CatchClause = "catch_clause" {
        required {
            catch_parameter: CatchParameter,
            block: Block,
        }
    }

    CatchParameter = "catch_parameter" {
        required {
            reference_expression: ReferenceExpression,
            type_reference: TypeReference,
        }
    }

    FinallyClause = "finally_clause" {
        required {
            block: Block,
        }
    }

    JumpReturn = "jump_return" {
        optional {
            label_reference: LabelReference,
        }
        splice { optional expression }
    }

    JumpThrow = "jump_throw" {
        splice { optional expression }
    }

    JumpBreak = "jump_break" {
        optional {
            label_reference: LabelReference,
        }
    }

    JumpContinue = "jump_continue" {
        optional {
            label_reference: LabelReference,
        }
    }

    LabeledExpression = "labeled_expression" {
        required {
            label: Label,
        }
        splice { optional expression }
    }

    CallExpression = "call_expression" {
        required {
            call_suffix: CallSuffix,
        }
        splice { optional postfix }
    }

    CallSuffix = "call_suffix" {
        repeated {
            value_argument_list: ValueArgument,
        }
    }

    ValueArgument = "value_argument" {
        splice { optional expression }
    }

    ArrayAccess = "array_access" {
        required {
            array_indices: ArrayIndices,
        }
        splice { optional postfix }
    }

    ArrayIndices = "array_indices" {
        splice { repeated expression }
    }

    DotQualifiedExpression = "dot_qualified_expression" {
        required {
            selector: Selector,
        }
        splice { optional postfix }
    }

    SafeAccessExpression = "safe_access_expression" {
        required {
            selector: Selector,
        }
        splice { optional postfix }
    }

    CallableReference = "callable_reference" {
        required {
            selector: Selector,
        }
        splice { optional postfix }
    }

    Selector = "selector" {
        required {
            reference_expression: ReferenceExpression,
        }
    }

    PostfixUnaryExpression = "postfix_unary_expression" {
        required {
            postfix_unary_operation: PostfixUnaryOperation,
        }
        splice { optional postfix }
    }

    PrefixUnaryExpression = "prefix_unary_expression" {
        required {
            prefix_unary_operation: PrefixUnaryOperation,
        }
        splice { optional prefix }
    }

    CastExpression = "cast_expression" {
        required {
            cast_operation: CastOperation,
            type_reference: TypeReference,
        }
        optional {
            cast_expression: CastExpression,
        }
        splice { optional prefix }
    }

    MultiplicativeExpression = "multiplicative_expression" {
        required {
            multiplicative_operation: MultiplicativeOperation,
        }
        optional {
            multiplicative_expression: MultiplicativeExpression,
        }
        splice { repeated cast }
    }

    AdditiveExpression = "additive_expression" {
        required {
            additive_operation: AdditiveOperation,
        }
        optional {
            additive_expression: AdditiveExpression,
        }
        splice { repeated multiplicative }
    }

    RangeExpression = "range_expression" {
        required {
            range_operation: RangeOperation,
        }
        optional {
            range_expression: RangeExpression,
        }
        splice { repeated additive }
    }

    InfixCallExpression = "infix_call_expression" {
        required {
            infix_function: InfixFunction,
        }
        optional {
            infix_call_expression: InfixCallExpression,
        }
        splice { repeated range }
    }

    ElvisExpression = "elvis_expression" {
        required {
            elvis_operation: ElvisOperation,
        }
        optional {
            elvis_expression: ElvisExpression,
        }
        splice { repeated infix }
    }

    ComparisonExpression = "comparison_expression" {
        required {
            comparison_operation: ComparisonOperation,
        }
        optional {
            comparison_expression: ComparisonExpression,
        }
        splice { repeated elvis }
    }

    EqualityExpression = "equality_expression" {
        required {
            equality_operation: EqualityOperation,
        }
        optional {
            equality_expression: EqualityExpression,
        }
        splice { repeated comparison }
    }

    ConjunctionExpression = "conjunction_expression" {
        required {
            and_operation: AndOperation,
        }
        optional {
            conjunction_expression: ConjunctionExpression,
        }
        splice { repeated equality }
    }

    DisjunctionExpression = "disjunction_expression" {
        required {
            or_operation: OrOperation,
        }
        optional {
            disjunction_expression: DisjunctionExpression,
        }
        splice { repeated conjunction }
    }
}
