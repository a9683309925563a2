//! Syntactic expression trees.
//!
//! Every composite node owns its children; the tree never shares nodes and
//! has no back-references. Ranges come from the native parser, or are
//! [`Range::SYNTHETIC`] for trees lifted from values.

use serde::Serialize;

use crate::{Operation, Range, Traversal, Value};

/// A node of the expression grammar.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Expression {
    LiteralValue(LiteralValueExpr),
    Template(TemplateExpr),
    TemplateJoin(TemplateJoinExpr),
    TemplateWrap(TemplateWrapExpr),
    Tuple(TupleConsExpr),
    Object(ObjectConsExpr),
    ObjectKey(ObjectConsKeyExpr),
    FunctionCall(FunctionCallExpr),
    ScopeTraversal(ScopeTraversalExpr),
    RelativeTraversal(RelativeTraversalExpr),
    Index(IndexExpr),
    Splat(SplatExpr),
    AnonSymbol(AnonSymbolExpr),
    Conditional(ConditionalExpr),
    For(ForExpr),
    UnaryOp(UnaryOpExpr),
    BinaryOp(BinaryOpExpr),
    Parentheses(ParenthesesExpr),
}

/// A constant value written directly in source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiteralValueExpr {
    pub value: Value,
    pub src_range: Range,
}

/// A string with interpolated parts, e.g. `"hello ${name}"`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateExpr {
    pub parts: Vec<Expression>,
    pub src_range: Range,
}

/// Joins the string elements of a tuple, produced by a `%{ for }` directive.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateJoinExpr {
    pub tuple: Box<Expression>,
}

/// A template consisting of a single interpolation, e.g. `"${x}"`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateWrapExpr {
    pub wrapped: Box<Expression>,
    pub src_range: Range,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TupleConsExpr {
    pub exprs: Vec<Expression>,
    pub src_range: Range,
    pub open_range: Range,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectConsItem {
    pub key: Expression,
    pub value: Expression,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectConsExpr {
    pub items: Vec<ObjectConsItem>,
    pub src_range: Range,
    pub open_range: Range,
}

/// Wraps an object key written in native syntax.
///
/// A bare identifier key such as `name = 1` is parsed as a traversal but
/// means the literal string `"name"`, unless the key was parenthesized.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectConsKeyExpr {
    pub wrapped: Box<Expression>,
    pub force_non_literal: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionCallExpr {
    pub name: String,
    pub args: Vec<Expression>,
    /// The final argument was followed by `...` and expands into arguments.
    pub expand_final: bool,
    pub name_range: Range,
    pub open_paren_range: Range,
    pub close_paren_range: Range,
}

/// A traversal starting from a variable, e.g. `var.name[0]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScopeTraversalExpr {
    pub traversal: Traversal,
    pub src_range: Range,
}

/// A traversal applied to the result of another expression.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelativeTraversalExpr {
    pub source: Box<Expression>,
    pub traversal: Traversal,
    pub src_range: Range,
}

/// Indexing with a key that is not known at parse time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexExpr {
    pub collection: Box<Expression>,
    pub key: Box<Expression>,
    pub src_range: Range,
    pub open_range: Range,
    pub bracket_range: Range,
}

/// `source[*].each` or `source.*.each`.
///
/// `each` is evaluated once per element of `source`, with the element
/// standing in for the [`AnonSymbolExpr`] it contains.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SplatExpr {
    pub source: Box<Expression>,
    pub each: Box<Expression>,
    pub src_range: Range,
    pub marker_range: Range,
}

/// The current element inside the `each` side of a splat.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnonSymbolExpr {
    pub src_range: Range,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConditionalExpr {
    pub condition: Box<Expression>,
    pub true_result: Box<Expression>,
    pub false_result: Box<Expression>,
    pub src_range: Range,
}

/// `[for k, v in coll : v if cond]` or `{for k, v in coll : k => v}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForExpr {
    pub key_var: Option<String>,
    pub val_var: String,
    pub coll_expr: Box<Expression>,
    /// Present only for object-producing for expressions.
    pub key_expr: Option<Box<Expression>>,
    pub val_expr: Box<Expression>,
    pub cond_expr: Option<Box<Expression>>,
    /// Values with equal keys are grouped into tuples (`...` suffix).
    pub group: bool,
    pub src_range: Range,
    pub open_range: Range,
    pub close_range: Range,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnaryOpExpr {
    pub op: Operation,
    pub val: Box<Expression>,
    pub src_range: Range,
    pub symbol_range: Range,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BinaryOpExpr {
    pub lhs: Box<Expression>,
    pub op: Operation,
    pub rhs: Box<Expression>,
    pub src_range: Range,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParenthesesExpr {
    pub inner: Box<Expression>,
    pub src_range: Range,
}

impl Expression {
    /// A literal with a synthetic range.
    pub fn literal(value: impl Into<Value>) -> Self {
        Expression::LiteralValue(LiteralValueExpr {
            value: value.into(),
            src_range: Range::SYNTHETIC,
        })
    }

    /// A tuple constructor with a synthetic range.
    pub fn tuple(exprs: Vec<Expression>) -> Self {
        Expression::Tuple(TupleConsExpr {
            exprs,
            src_range: Range::SYNTHETIC,
            open_range: Range::SYNTHETIC,
        })
    }

    /// An object constructor with a synthetic range.
    pub fn object(items: Vec<ObjectConsItem>) -> Self {
        Expression::Object(ObjectConsExpr {
            items,
            src_range: Range::SYNTHETIC,
            open_range: Range::SYNTHETIC,
        })
    }

    /// Short human-readable name of the node kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Expression::LiteralValue(_) => "literal value",
            Expression::Template(_) => "template",
            Expression::TemplateJoin(_) => "template join",
            Expression::TemplateWrap(_) => "template wrap",
            Expression::Tuple(_) => "tuple constructor",
            Expression::Object(_) => "object constructor",
            Expression::ObjectKey(_) => "object key",
            Expression::FunctionCall(_) => "function call",
            Expression::ScopeTraversal(_) => "scope traversal",
            Expression::RelativeTraversal(_) => "relative traversal",
            Expression::Index(_) => "index",
            Expression::Splat(_) => "splat",
            Expression::AnonSymbol(_) => "anonymous symbol",
            Expression::Conditional(_) => "conditional",
            Expression::For(_) => "for expression",
            Expression::UnaryOp(_) => "unary operation",
            Expression::BinaryOp(_) => "binary operation",
            Expression::Parentheses(_) => "parentheses",
        }
    }

    /// The full source span of the expression.
    pub fn range(&self) -> Range {
        match self {
            Expression::LiteralValue(e) => e.src_range,
            Expression::Template(e) => e.src_range,
            Expression::TemplateJoin(e) => e.tuple.range(),
            Expression::TemplateWrap(e) => e.src_range,
            Expression::Tuple(e) => e.src_range,
            Expression::Object(e) => e.src_range,
            Expression::ObjectKey(e) => e.wrapped.range(),
            Expression::FunctionCall(e) => Range::between(e.name_range, e.close_paren_range),
            Expression::ScopeTraversal(e) => e.src_range,
            Expression::RelativeTraversal(e) => e.src_range,
            Expression::Index(e) => e.src_range,
            Expression::Splat(e) => e.src_range,
            Expression::AnonSymbol(e) => e.src_range,
            Expression::Conditional(e) => e.src_range,
            Expression::For(e) => e.src_range,
            Expression::UnaryOp(e) => e.src_range,
            Expression::BinaryOp(e) => e.src_range,
            Expression::Parentheses(e) => e.src_range,
        }
    }

    /// The range of the token that begins the expression.
    ///
    /// For a function call this is the name, for bracketed constructs the
    /// opening bracket, for operators the operator symbol or left operand.
    pub fn start_range(&self) -> Range {
        match self {
            Expression::FunctionCall(e) => e.name_range,
            Expression::Tuple(e) => e.open_range,
            Expression::Object(e) => e.open_range,
            Expression::Index(e) => e.open_range,
            Expression::For(e) => e.open_range,
            Expression::Splat(e) => e.marker_range,
            Expression::UnaryOp(e) => e.symbol_range,
            Expression::BinaryOp(e) => e.lhs.start_range(),
            Expression::Conditional(e) => e.condition.start_range(),
            Expression::Template(e) => match e.parts.first() {
                Some(first) => first.start_range(),
                None => e.src_range,
            },
            Expression::TemplateJoin(e) => e.tuple.start_range(),
            Expression::TemplateWrap(e) => e.wrapped.start_range(),
            Expression::ObjectKey(e) => e.wrapped.start_range(),
            Expression::LiteralValue(_)
            | Expression::ScopeTraversal(_)
            | Expression::RelativeTraversal(_)
            | Expression::AnonSymbol(_)
            | Expression::Parentheses(_) => self.range(),
        }
    }

    /// Direct children, in the order a walk visits them.
    pub fn children(&self) -> Vec<&Expression> {
        match self {
            Expression::LiteralValue(_)
            | Expression::ScopeTraversal(_)
            | Expression::AnonSymbol(_) => Vec::new(),
            Expression::Template(e) => e.parts.iter().collect(),
            Expression::TemplateJoin(e) => vec![&*e.tuple],
            Expression::TemplateWrap(e) => vec![&*e.wrapped],
            Expression::Tuple(e) => e.exprs.iter().collect(),
            Expression::Object(e) => e
                .items
                .iter()
                .flat_map(|item| [&item.key, &item.value])
                .collect(),
            Expression::ObjectKey(e) => vec![&*e.wrapped],
            Expression::FunctionCall(e) => e.args.iter().collect(),
            Expression::RelativeTraversal(e) => vec![&*e.source],
            Expression::Index(e) => vec![&*e.collection, &*e.key],
            Expression::Splat(e) => vec![&*e.source, &*e.each],
            Expression::Conditional(e) => {
                vec![&*e.condition, &*e.true_result, &*e.false_result]
            }
            Expression::For(e) => {
                let mut children = vec![&*e.coll_expr];
                if let Some(key) = &e.key_expr {
                    children.push(&**key);
                }
                children.push(&*e.val_expr);
                if let Some(cond) = &e.cond_expr {
                    children.push(&**cond);
                }
                children
            }
            Expression::UnaryOp(e) => vec![&*e.val],
            Expression::BinaryOp(e) => vec![&*e.lhs, &*e.rhs],
            Expression::Parentheses(e) => vec![&*e.inner],
        }
    }

    fn children_mut(&mut self) -> Vec<&mut Expression> {
        match self {
            Expression::LiteralValue(_)
            | Expression::ScopeTraversal(_)
            | Expression::AnonSymbol(_) => Vec::new(),
            Expression::Template(e) => e.parts.iter_mut().collect(),
            Expression::TemplateJoin(e) => vec![&mut *e.tuple],
            Expression::TemplateWrap(e) => vec![&mut *e.wrapped],
            Expression::Tuple(e) => e.exprs.iter_mut().collect(),
            Expression::Object(e) => e
                .items
                .iter_mut()
                .flat_map(|item| [&mut item.key, &mut item.value])
                .collect(),
            Expression::ObjectKey(e) => vec![&mut *e.wrapped],
            Expression::FunctionCall(e) => e.args.iter_mut().collect(),
            Expression::RelativeTraversal(e) => vec![&mut *e.source],
            Expression::Index(e) => vec![&mut *e.collection, &mut *e.key],
            Expression::Splat(e) => vec![&mut *e.source, &mut *e.each],
            Expression::Conditional(e) => vec![
                &mut *e.condition,
                &mut *e.true_result,
                &mut *e.false_result,
            ],
            Expression::For(e) => {
                let mut children = vec![&mut *e.coll_expr];
                if let Some(key) = &mut e.key_expr {
                    children.push(&mut **key);
                }
                children.push(&mut *e.val_expr);
                if let Some(cond) = &mut e.cond_expr {
                    children.push(&mut **cond);
                }
                children
            }
            Expression::UnaryOp(e) => vec![&mut *e.val],
            Expression::BinaryOp(e) => vec![&mut *e.lhs, &mut *e.rhs],
            Expression::Parentheses(e) => vec![&mut *e.inner],
        }
    }

    /// Number of nodes in the tree rooted here, including this one.
    pub fn node_count(&self) -> usize {
        1 + self
            .children()
            .into_iter()
            .map(Expression::node_count)
            .sum::<usize>()
    }

    /// Replaces every range in the tree with [`Range::SYNTHETIC`].
    pub fn clear_ranges(&mut self) {
        let synthetic = Range::SYNTHETIC;
        match self {
            Expression::LiteralValue(e) => e.src_range = synthetic,
            Expression::Template(e) => e.src_range = synthetic,
            Expression::TemplateWrap(e) => e.src_range = synthetic,
            Expression::Tuple(e) => {
                e.src_range = synthetic;
                e.open_range = synthetic;
            }
            Expression::Object(e) => {
                e.src_range = synthetic;
                e.open_range = synthetic;
            }
            Expression::FunctionCall(e) => {
                e.name_range = synthetic;
                e.open_paren_range = synthetic;
                e.close_paren_range = synthetic;
            }
            Expression::ScopeTraversal(e) => {
                e.src_range = synthetic;
                e.traversal.reset_ranges(synthetic);
            }
            Expression::RelativeTraversal(e) => {
                e.src_range = synthetic;
                e.traversal.reset_ranges(synthetic);
            }
            Expression::Index(e) => {
                e.src_range = synthetic;
                e.open_range = synthetic;
                e.bracket_range = synthetic;
            }
            Expression::Splat(e) => {
                e.src_range = synthetic;
                e.marker_range = synthetic;
            }
            Expression::AnonSymbol(e) => e.src_range = synthetic,
            Expression::Conditional(e) => e.src_range = synthetic,
            Expression::For(e) => {
                e.src_range = synthetic;
                e.open_range = synthetic;
                e.close_range = synthetic;
            }
            Expression::UnaryOp(e) => {
                e.src_range = synthetic;
                e.symbol_range = synthetic;
            }
            Expression::BinaryOp(e) => e.src_range = synthetic,
            Expression::Parentheses(e) => e.src_range = synthetic,
            Expression::TemplateJoin(_) | Expression::ObjectKey(_) => {}
        }
        for child in self.children_mut() {
            child.clear_ranges();
        }
    }
}
