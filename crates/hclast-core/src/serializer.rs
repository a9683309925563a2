//! Walks an expression tree and builds the serializable AST.

use hclast_ir::{Diagnostics, Expression, Operation, Range, Traverser, Walker, walk};
use serde_json::{Map, Value as Json, json};
use tracing::debug;

use crate::ast::AstNode;
use crate::eval::evaluate;
use crate::operator::operator_name;

/// Builds an [`AstNode`] tree through the [`Walker`] callbacks.
///
/// The node under construction is `current`; its unfinished ancestors sit
/// on `stack`. A node is attached to its parent when the walk exits it.
#[derive(Debug, Default)]
pub struct AstSerializer {
    stack: Vec<AstNode>,
    current: Option<AstNode>,
    warnings: Diagnostics,
}

impl AstSerializer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluation problems hit while computing operator return types.
    pub fn warnings(&self) -> &Diagnostics {
        &self.warnings
    }

    /// Returns the root once the walk has exited it.
    pub fn finish(self) -> Option<AstNode> {
        if self.stack.is_empty() {
            self.current
        } else {
            None
        }
    }

    fn return_type(&mut self, expr: &Expression, op: Operation) -> Json {
        let ty = match evaluate(expr) {
            Ok(value) => value.value_type(),
            Err(diag) => {
                debug!(operator = op.symbol(), %diag, "operation has no constant value");
                self.warnings.push(diag);
                op.result_type()
            }
        };
        json!(ty)
    }

    fn describe(&mut self, expr: &Expression, node: &mut AstNode) {
        let (node_type, meta) = match expr {
            Expression::FunctionCall(call) => {
                let mut meta = Map::new();
                meta.insert("name".into(), json!(call.name));
                meta.insert("expandedFinalArgument".into(), json!(call.expand_final));
                meta.insert("nameRange".into(), json!(call.name_range));
                meta.insert("openParenRange".into(), json!(call.open_paren_range));
                meta.insert("closeParenRange".into(), json!(call.close_paren_range));
                ("function", meta)
            }
            Expression::Tuple(_) => ("Tuple", Map::new()),
            Expression::Object(_) => ("Object", Map::new()),
            Expression::Template(_) => ("Template", Map::new()),
            Expression::TemplateJoin(_) => ("TemplateJoin", Map::new()),
            Expression::TemplateWrap(_) => ("TemplateWrap", Map::new()),
            Expression::ScopeTraversal(trav) => {
                // Index steps have no segment name and are left out.
                let segments: Vec<Json> = trav
                    .traversal
                    .iter()
                    .filter_map(|step| match step {
                        Traverser::Root { name, src_range } | Traverser::Attr { name, src_range } => {
                            Some(json!({ "segment": name, "range": src_range }))
                        }
                        Traverser::Index { .. } => None,
                    })
                    .collect();
                let mut meta = Map::new();
                meta.insert("traversal".into(), Json::Array(segments));
                ("ScopeTraversal", meta)
            }
            Expression::RelativeTraversal(_) => ("RelativeTraversal", Map::new()),
            Expression::LiteralValue(lit) => {
                let mut meta = Map::new();
                meta.insert("type".into(), json!(lit.value.value_type()));
                ("LiteralValue", meta)
            }
            Expression::Index(_) => ("Index", Map::new()),
            Expression::Splat(_) => ("Splat", Map::new()),
            Expression::For(_) => ("For", Map::new()),
            Expression::Conditional(_) => ("Conditional", Map::new()),
            Expression::UnaryOp(unary) => ("UnaryOp", self.operator_meta(expr, unary.op)),
            Expression::BinaryOp(binary) => ("BinaryOp", self.operator_meta(expr, binary.op)),
            Expression::ObjectKey(_) | Expression::AnonSymbol(_) | Expression::Parentheses(_) => {
                debug!(kind = expr.kind(), "unhandled expression in AST walk");
                return;
            }
        };
        node.node_type = node_type.to_string();
        node.meta = meta;
    }

    fn operator_meta(&mut self, expr: &Expression, op: Operation) -> Map<String, Json> {
        let mut meta = Map::new();
        if let Some(name) = operator_name(op) {
            meta.insert("operator".into(), json!(name));
        }
        meta.insert("returnType".into(), self.return_type(expr, op));
        meta
    }
}

impl Walker for AstSerializer {
    fn enter(&mut self, expr: &Expression) -> Diagnostics {
        let mut node = AstNode::new(expr.start_range());
        self.describe(expr, &mut node);
        if let Some(parent) = self.current.take() {
            self.stack.push(parent);
        }
        self.current = Some(node);
        Diagnostics::new()
    }

    fn exit(&mut self, _expr: &Expression) -> Diagnostics {
        if let Some(mut parent) = self.stack.pop() {
            if let Some(done) = self.current.take() {
                parent.children.push(done);
            }
            self.current = Some(parent);
        }
        Diagnostics::new()
    }
}

/// Serializes `expr`, returning the AST together with any warnings from
/// operator return type evaluation.
pub fn serialize(expr: &Expression) -> (AstNode, Diagnostics) {
    let mut serializer = AstSerializer::new();
    walk(expr, &mut serializer);
    let warnings = std::mem::take(&mut serializer.warnings);
    let root = serializer
        .finish()
        .unwrap_or_else(|| AstNode::new(Range::SYNTHETIC));
    (root, warnings)
}
