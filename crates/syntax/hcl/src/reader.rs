//! Maps the tree-sitter HCL syntax tree onto [`Expression`].
//!
//! Source text is always parsed inside a one-attribute wrapper (see the
//! crate root), so the context translates tree byte offsets back into
//! positions within the caller's text.

use hclast_ir::{
    AnonSymbolExpr, BinaryOpExpr, ConditionalExpr, Diagnostic, Expression, ForExpr,
    FunctionCallExpr, IndexExpr, LiteralValueExpr, ObjectConsExpr, ObjectConsItem,
    ObjectConsKeyExpr, Operation, ParenthesesExpr, Pos, Range, RelativeTraversalExpr,
    ScopeTraversalExpr, SplatExpr, Traversal, Traverser, TupleConsExpr, UnaryOpExpr, Value,
};
use tree_sitter::{Node, Tree};

use crate::template::{Directive, Piece, finish_template};

pub(crate) type ReadResult<T> = Result<T, Diagnostic>;

pub(crate) fn error(summary: &str, detail: impl Into<String>, range: Range) -> Diagnostic {
    Diagnostic::error(summary, detail).with_subject(range)
}

/// How literal text between template sequences is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TemplateKind {
    /// `"..."`: backslash escapes are decoded.
    Quoted,
    /// `<<EOT`: text is taken verbatim and split per line.
    Heredoc,
    /// A template with no delimiters, such as a lifted string.
    Bare,
}

/// Children other than comments, which may appear between any two tokens.
fn children<'tree>(node: Node<'tree>) -> Vec<Node<'tree>> {
    let mut cursor = node.walk();
    node.children(&mut cursor)
        .filter(|child| child.kind() != "comment")
        .collect()
}

fn named_children<'tree>(node: Node<'tree>) -> Vec<Node<'tree>> {
    children(node)
        .into_iter()
        .filter(|child| child.is_named())
        .collect()
}

fn child_of_kind<'tree>(node: Node<'tree>, kind: &str) -> Option<Node<'tree>> {
    children(node).into_iter().find(|child| child.kind() == kind)
}

/// The first node in `node` that tree-sitter could not fit into the grammar.
fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    let nested: Vec<_> = node.children(&mut cursor).collect();
    nested.into_iter().find_map(first_error)
}

fn find_kind<'tree>(node: Node<'tree>, kind: &str) -> Option<Node<'tree>> {
    if node.kind() == kind {
        return Some(node);
    }
    named_children(node)
        .into_iter()
        .find_map(|child| find_kind(child, kind))
}

fn binary_operator(kind: &str) -> Option<Operation> {
    Some(match kind {
        "||" => Operation::LogicalOr,
        "&&" => Operation::LogicalAnd,
        "==" => Operation::Equal,
        "!=" => Operation::NotEqual,
        ">" => Operation::GreaterThan,
        ">=" => Operation::GreaterThanOrEqual,
        "<" => Operation::LessThan,
        "<=" => Operation::LessThanOrEqual,
        "+" => Operation::Add,
        "-" => Operation::Subtract,
        "*" => Operation::Multiply,
        "/" => Operation::Divide,
        "%" => Operation::Modulo,
        _ => return None,
    })
}

/// `~` directly after the opening or before the closing delimiter of a
/// template sequence.
fn strip_flags(node: Node<'_>) -> (bool, bool) {
    let kids = children(node);
    let is_strip = |i: usize| kids.get(i).is_some_and(|kid| kid.kind() == "strip_marker");
    let left = is_strip(1);
    let right = kids.len() >= 3 && is_strip(kids.len() - 2);
    (left, right)
}

/// Extends a traversal with `step`, starting a relative traversal when
/// `expr` is not already one.
fn apply_step(expr: Expression, step: Traverser) -> Expression {
    match expr {
        Expression::ScopeTraversal(mut e) => {
            e.src_range = Range::between(e.src_range, step.src_range());
            e.traversal.push(step);
            Expression::ScopeTraversal(e)
        }
        Expression::RelativeTraversal(mut e) => {
            e.src_range = Range::between(e.src_range, step.src_range());
            e.traversal.push(step);
            Expression::RelativeTraversal(e)
        }
        source => {
            let src_range = Range::between(source.range(), step.src_range());
            Expression::RelativeTraversal(RelativeTraversalExpr {
                source: Box::new(source),
                traversal: Traversal::new(vec![step]),
                src_range,
            })
        }
    }
}

/// The key of `a[key]` when it is known without evaluation.
fn literal_key(key: &Expression) -> Option<Value> {
    match key {
        Expression::LiteralValue(lit) => Some(lit.value.clone()),
        Expression::Template(tmpl) => match tmpl.parts.as_slice() {
            [Expression::LiteralValue(lit)] if matches!(lit.value, Value::String(_)) => {
                Some(lit.value.clone())
            }
            _ => None,
        },
        _ => None,
    }
}

fn index_or_step(collection: Expression, key: Expression, open: Range, close: Range) -> Expression {
    let bracket_range = Range::between(open, close);
    match literal_key(&key) {
        Some(value) => apply_step(
            collection,
            Traverser::Index {
                key: value,
                src_range: bracket_range,
            },
        ),
        None => {
            let src_range = Range::between(collection.range(), close);
            Expression::Index(IndexExpr {
                collection: Box::new(collection),
                key: Box::new(key),
                src_range,
                open_range: open,
                bracket_range,
            })
        }
    }
}

pub(crate) struct ReadContext<'a> {
    /// The wrapped text handed to tree-sitter.
    source: &'a str,
    /// Where the caller's text begins within `source`.
    offset: usize,
    len: usize,
    start: Pos,
    /// Offsets of each line start, relative to the caller's text.
    line_starts: Vec<usize>,
}

impl<'a> ReadContext<'a> {
    pub fn new(source: &'a str, offset: usize, len: usize, start: Pos) -> Self {
        let text = source.get(offset..offset + len).unwrap_or("");
        let line_starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            source,
            offset,
            len,
            start,
            line_starts,
        }
    }

    fn node_text(&self, node: Node) -> &str {
        node.utf8_text(self.source.as_bytes()).unwrap_or("")
    }

    fn clamp(&self, byte: usize) -> usize {
        byte.clamp(self.offset, self.offset + self.len)
    }

    /// The position of a byte offset into the wrapped source.
    fn pos(&self, byte: usize) -> Pos {
        let byte = self.clamp(byte);
        let rel = byte - self.offset;
        let line = self.line_starts.partition_point(|&s| s <= rel).saturating_sub(1);
        let line_start = self.line_starts.get(line).copied().unwrap_or(0);
        let columns = self
            .source
            .get(self.offset + line_start..byte)
            .map_or(0, |text| text.chars().count());
        if line == 0 {
            Pos::new(self.start.line, self.start.column + columns, self.start.byte + rel)
        } else {
            Pos::new(self.start.line + line, 1 + columns, self.start.byte + rel)
        }
    }

    fn span(&self, from: usize, to: usize) -> Range {
        Range::new(self.pos(from), self.pos(to))
    }

    fn range(&self, node: Node) -> Range {
        self.span(node.start_byte(), node.end_byte())
    }

    fn missing(&self, what: &str, parent: Node) -> Diagnostic {
        error(
            "Invalid expression",
            format!("Expected {what} in this {}.", parent.kind().replace('_', " ")),
            self.range(parent),
        )
    }

    fn first_named<'t>(&self, node: Node<'t>) -> ReadResult<Node<'t>> {
        named_children(node)
            .into_iter()
            .next()
            .ok_or_else(|| self.missing("a child node", node))
    }

    fn expression_child<'t>(&self, node: Node<'t>) -> ReadResult<Node<'t>> {
        child_of_kind(node, "expression").ok_or_else(|| self.missing("an expression", node))
    }

    fn expression_children<'t>(&self, node: Node<'t>) -> Vec<Node<'t>> {
        children(node)
            .into_iter()
            .filter(|child| child.kind() == "expression")
            .collect()
    }

    /// Reports the first syntax error in the tree, if any.
    fn check_errors(&self, root: Node) -> ReadResult<()> {
        let Some(node) = first_error(root) else {
            return Ok(());
        };
        let range = self.range(node);
        if node.is_missing() {
            if node.kind() == "quoted_template_end" {
                return Err(error(
                    "Unterminated template string",
                    "No closing marker was found for the string.",
                    range,
                ));
            }
            return Err(error(
                "Invalid expression",
                format!("Expected {} here.", node.kind().replace('_', " ")),
                range,
            ));
        }
        let text = self
            .source
            .get(self.clamp(node.start_byte())..self.clamp(node.end_byte()))
            .unwrap_or("")
            .trim();
        let detail = if text.is_empty() {
            "The expression ended unexpectedly.".to_string()
        } else {
            format!("Unexpected {text:?}.")
        };
        Err(error("Invalid expression", detail, range))
    }

    /// Reads the value of the single wrapper attribute.
    pub fn read_root_expression(&self, tree: &Tree) -> ReadResult<Expression> {
        let root = tree.root_node();
        self.check_errors(root)?;
        let body = find_kind(root, "body").ok_or_else(|| self.missing("an expression", root))?;
        let items = named_children(body);
        let attribute = items
            .first()
            .filter(|item| item.kind() == "attribute")
            .ok_or_else(|| self.missing("an expression", body))?;
        if let Some(extra) = items.get(1) {
            return Err(error(
                "Extra characters after expression",
                "An expression was successfully parsed, but extra characters were found after it.",
                self.range(*extra),
            ));
        }
        self.read_node(self.expression_child(*attribute)?)
    }

    /// Reads the body of the wrapper heredoc as a bare template spanning the
    /// whole of the caller's text.
    pub fn read_root_template(&self, tree: &Tree) -> ReadResult<Expression> {
        let root = tree.root_node();
        self.check_errors(root)?;
        let heredoc = find_kind(root, "heredoc_template")
            .ok_or_else(|| self.missing("a template", root))?;
        let end = self.offset + self.len;
        let pieces = self.template_pieces(heredoc, self.offset, end, TemplateKind::Bare)?;
        finish_template(pieces, self.span(self.offset, end), false, false)
    }

    fn read_node(&self, node: Node) -> ReadResult<Expression> {
        match node.kind() {
            "expression" => self.read_expression(node),

            // Wrappers around a single alternative
            "literal_value" | "template_expr" | "collection_value" | "for_expr" | "operation" => {
                self.read_node(self.first_named(node)?)
            }

            // Literals
            "numeric_lit" => self.read_number(node),
            "bool_lit" => Ok(self.literal(Value::Bool(self.node_text(node) == "true"), node)),
            "null_lit" => Ok(self.literal(Value::Null, node)),

            // Templates
            "string_lit" | "quoted_template" => self.read_quoted_template(node),
            "heredoc_template" => self.read_heredoc(node),

            // Collections
            "tuple" => self.read_tuple(node),
            "object" => self.read_object(node),
            "for_tuple_expr" => self.read_for(node, false),
            "for_object_expr" => self.read_for(node, true),

            "variable_expr" => Ok(self.read_variable(node)),
            "function_call" => self.read_function_call(node),
            "unary_operation" => self.read_unary(node),
            "binary_operation" => self.read_binary(node),
            "conditional" => self.read_conditional(node),

            kind => Err(error(
                "Unsupported syntax",
                format!(
                    "Unexpected {} node: {:?}.",
                    kind.replace('_', " "),
                    self.node_text(node)
                ),
                self.range(node),
            )),
        }
    }

    fn literal(&self, value: Value, node: Node) -> Expression {
        Expression::LiteralValue(LiteralValueExpr {
            value,
            src_range: self.range(node),
        })
    }

    fn read_number(&self, node: Node) -> ReadResult<Expression> {
        let text = self.node_text(node);
        let number: f64 = text.parse().map_err(|_| {
            error(
                "Invalid number literal",
                format!("Failed to recognize {text:?} as a number."),
                self.range(node),
            )
        })?;
        Ok(self.literal(Value::Number(number), node))
    }

    fn read_expression(&self, node: Node) -> ReadResult<Expression> {
        let kids = children(node);
        match kids.as_slice() {
            [only] if only.kind() == "conditional" => self.read_conditional(*only),
            _ => self.read_term(&kids, node),
        }
    }

    /// Reads a primary term followed by any traversal, index or splat steps.
    ///
    /// Terms are flattened into their parent node, so `a.b[0]` arrives as the
    /// sibling sequence `variable_expr get_attr index`.
    fn read_term(&self, nodes: &[Node], parent: Node) -> ReadResult<Expression> {
        let Some((first, rest)) = nodes.split_first() else {
            return Err(self.missing("an expression", parent));
        };
        let (mut expr, steps) = if first.kind() == "(" {
            let inner = rest
                .first()
                .filter(|node| node.kind() == "expression")
                .ok_or_else(|| self.missing("an expression", parent))?;
            let close = rest
                .get(1)
                .filter(|node| node.kind() == ")")
                .ok_or_else(|| self.missing("a closing parenthesis", parent))?;
            let paren = Expression::Parentheses(ParenthesesExpr {
                inner: Box::new(self.read_node(*inner)?),
                src_range: self.span(first.start_byte(), close.end_byte()),
            });
            (paren, rest.get(2..).unwrap_or(&[]))
        } else {
            (self.read_node(*first)?, rest)
        };
        for step in steps {
            expr = self.read_step(expr, *step)?;
        }
        Ok(expr)
    }

    fn read_step(&self, expr: Expression, node: Node) -> ReadResult<Expression> {
        match node.kind() {
            "get_attr" => {
                let name = child_of_kind(node, "identifier")
                    .ok_or_else(|| self.missing("an attribute name", node))?;
                Ok(apply_step(
                    expr,
                    Traverser::Attr {
                        name: self.node_text(name).to_string(),
                        src_range: self.range(node),
                    },
                ))
            }
            "index" | "splat" => self.read_step(expr, self.first_named(node)?),
            "new_index" => {
                let key = self.read_node(self.expression_child(node)?)?;
                let kids = children(node);
                let open = kids.first().map_or(node.start_byte(), |kid| kid.end_byte());
                let close = kids.last().map_or(node.end_byte(), |kid| kid.start_byte());
                Ok(index_or_step(
                    expr,
                    key,
                    self.span(node.start_byte(), open),
                    self.span(close, node.end_byte()),
                ))
            }
            "legacy_index" => {
                let digits = self.node_text(node).trim_start_matches('.').trim();
                let index: f64 = digits.parse().map_err(|_| {
                    error(
                        "Invalid legacy index syntax",
                        format!("Failed to recognize {digits:?} as an index."),
                        self.range(node),
                    )
                })?;
                Ok(apply_step(
                    expr,
                    Traverser::Index {
                        key: Value::Number(index),
                        src_range: self.range(node),
                    },
                ))
            }
            "attr_splat" | "full_splat" => self.read_splat(expr, node),
            kind => Err(error(
                "Unsupported syntax",
                format!("Unexpected {} after an expression.", kind.replace('_', " ")),
                self.range(node),
            )),
        }
    }

    /// `.*` takes only the steps the grammar nests under the splat node;
    /// anything after it applies to the splat result.
    fn read_splat(&self, source: Expression, node: Node) -> ReadResult<Expression> {
        let kids = children(node);
        let marker_end = kids
            .iter()
            .take_while(|kid| !kid.is_named())
            .last()
            .map_or(node.end_byte(), |kid| kid.end_byte());
        let marker_range = self.span(node.start_byte(), marker_end);
        let mut each = Expression::AnonSymbol(AnonSymbolExpr {
            src_range: marker_range,
        });
        for step in kids.iter().filter(|kid| kid.is_named()) {
            each = self.read_step(each, *step)?;
        }
        let src_range = Range::between(source.range(), each.range());
        Ok(Expression::Splat(SplatExpr {
            source: Box::new(source),
            each: Box::new(each),
            src_range,
            marker_range,
        }))
    }

    fn read_variable(&self, node: Node) -> Expression {
        let src_range = self.range(node);
        Expression::ScopeTraversal(ScopeTraversalExpr {
            traversal: Traversal::new(vec![Traverser::Root {
                name: self.node_text(node).to_string(),
                src_range,
            }]),
            src_range,
        })
    }

    fn read_function_call(&self, node: Node) -> ReadResult<Expression> {
        let kids = children(node);
        let names: Vec<Node> = kids
            .iter()
            .take_while(|kid| kid.kind() != "(")
            .filter(|kid| kid.kind() == "identifier")
            .copied()
            .collect();
        let (Some(first), Some(last)) = (names.first(), names.last()) else {
            return Err(self.missing("a function name", node));
        };
        let name = names
            .iter()
            .map(|part| self.node_text(*part))
            .collect::<Vec<_>>()
            .join("::");

        let open_paren_range = kids
            .iter()
            .find(|kid| kid.kind() == "(")
            .map_or_else(|| self.span(last.end_byte(), last.end_byte() + 1), |kid| self.range(*kid));
        let close_paren_range = kids
            .iter()
            .rev()
            .find(|kid| kid.kind() == ")")
            .map_or_else(
                || self.span(node.end_byte().saturating_sub(1), node.end_byte()),
                |kid| self.range(*kid),
            );

        let (args, expand_final) = match child_of_kind(node, "function_arguments") {
            Some(arguments) => {
                let args = self
                    .expression_children(arguments)
                    .into_iter()
                    .map(|arg| self.read_node(arg))
                    .collect::<ReadResult<Vec<_>>>()?;
                (args, child_of_kind(arguments, "ellipsis").is_some())
            }
            None => (Vec::new(), false),
        };

        Ok(Expression::FunctionCall(FunctionCallExpr {
            name,
            args,
            expand_final,
            name_range: self.span(first.start_byte(), last.end_byte()),
            open_paren_range,
            close_paren_range,
        }))
    }

    fn read_tuple(&self, node: Node) -> ReadResult<Expression> {
        let exprs = self
            .expression_children(node)
            .into_iter()
            .map(|expr| self.read_node(expr))
            .collect::<ReadResult<Vec<_>>>()?;
        let open_range = children(node)
            .first()
            .map_or(Range::at(self.pos(node.start_byte())), |open| self.range(*open));
        Ok(Expression::Tuple(TupleConsExpr {
            exprs,
            src_range: self.range(node),
            open_range,
        }))
    }

    fn read_object(&self, node: Node) -> ReadResult<Expression> {
        let mut items = Vec::new();
        for elem in children(node).into_iter().filter(|kid| kid.kind() == "object_elem") {
            let [key, value] = self.expression_children(elem)[..] else {
                return Err(self.missing("a key and a value", elem));
            };
            let key = self.read_node(key)?;
            let force_non_literal = matches!(key, Expression::Parentheses(_));
            items.push(ObjectConsItem {
                key: Expression::ObjectKey(ObjectConsKeyExpr {
                    wrapped: Box::new(key),
                    force_non_literal,
                }),
                value: self.read_node(value)?,
            });
        }
        let open_range = children(node)
            .first()
            .map_or(Range::at(self.pos(node.start_byte())), |open| self.range(*open));
        Ok(Expression::Object(ObjectConsExpr {
            items,
            src_range: self.range(node),
            open_range,
        }))
    }

    /// The `k, v` names of a `for` clause, with the key name optional.
    fn for_vars(&self, node: Node) -> ReadResult<(Option<String>, String)> {
        let names: Vec<String> = children(node)
            .into_iter()
            .filter(|kid| kid.kind() == "identifier")
            .map(|kid| self.node_text(kid).to_string())
            .collect();
        match <[String; 2]>::try_from(names) {
            Ok([key, value]) => Ok((Some(key), value)),
            Err(names) => match names.into_iter().next() {
                Some(value) => Ok((None, value)),
                None => Err(self.missing("an iterator variable name", node)),
            },
        }
    }

    fn read_for(&self, node: Node, object: bool) -> ReadResult<Expression> {
        let intro = child_of_kind(node, "for_intro")
            .ok_or_else(|| self.missing("a for clause", node))?;
        let (key_var, val_var) = self.for_vars(intro)?;
        let coll_expr = self.read_node(self.expression_child(intro)?)?;

        let exprs = self.expression_children(node);
        let (key_expr, val_expr) = match (object, exprs.as_slice()) {
            (true, [key, value]) => (Some(Box::new(self.read_node(*key)?)), self.read_node(*value)?),
            (false, [value]) => (None, self.read_node(*value)?),
            _ => return Err(self.missing("a result expression", node)),
        };
        let cond_expr = match child_of_kind(node, "for_cond") {
            Some(cond) => Some(Box::new(self.read_node(self.expression_child(cond)?)?)),
            None => None,
        };

        let kids = children(node);
        let open_range = kids.first().map_or(self.range(node), |kid| self.range(*kid));
        let close_range = kids.last().map_or(self.range(node), |kid| self.range(*kid));
        Ok(Expression::For(ForExpr {
            key_var,
            val_var,
            coll_expr: Box::new(coll_expr),
            key_expr,
            val_expr: Box::new(val_expr),
            cond_expr,
            group: child_of_kind(node, "ellipsis").is_some(),
            src_range: self.range(node),
            open_range,
            close_range,
        }))
    }

    fn read_unary(&self, node: Node) -> ReadResult<Expression> {
        let kids = children(node);
        let Some((symbol, operand)) = kids.split_first() else {
            return Err(self.missing("an operator", node));
        };
        let op = match symbol.kind() {
            "-" => Operation::Negate,
            "!" => Operation::LogicalNot,
            other => {
                return Err(error(
                    "Unsupported syntax",
                    format!("{other:?} is not a unary operator."),
                    self.range(*symbol),
                ));
            }
        };
        let val = self.read_term(operand, node)?;
        let symbol_range = self.range(*symbol);
        Ok(Expression::UnaryOp(UnaryOpExpr {
            op,
            src_range: Range::between(symbol_range, val.range()),
            symbol_range,
            val: Box::new(val),
        }))
    }

    fn read_binary(&self, node: Node) -> ReadResult<Expression> {
        let kids = children(node);
        let (at, op) = kids
            .iter()
            .enumerate()
            .find_map(|(i, kid)| {
                (!kid.is_named())
                    .then(|| binary_operator(kid.kind()))
                    .flatten()
                    .map(|op| (i, op))
            })
            .ok_or_else(|| self.missing("an operator", node))?;
        let lhs = self.read_term(&kids[..at], node)?;
        let rhs = self.read_term(kids.get(at + 1..).unwrap_or(&[]), node)?;
        let src_range = Range::between(lhs.range(), rhs.range());
        Ok(Expression::BinaryOp(BinaryOpExpr {
            lhs: Box::new(lhs),
            op,
            rhs: Box::new(rhs),
            src_range,
        }))
    }

    fn read_conditional(&self, node: Node) -> ReadResult<Expression> {
        let [condition, true_result, false_result] = self.expression_children(node)[..] else {
            return Err(self.missing("a true and a false result", node));
        };
        let condition = self.read_node(condition)?;
        let false_result = self.read_node(false_result)?;
        let src_range = Range::between(condition.range(), false_result.range());
        Ok(Expression::Conditional(ConditionalExpr {
            condition: Box::new(condition),
            true_result: Box::new(self.read_node(true_result)?),
            false_result: Box::new(false_result),
            src_range,
        }))
    }

    fn read_quoted_template(&self, node: Node) -> ReadResult<Expression> {
        let kids = children(node);
        let (Some(open), Some(close)) = (kids.first(), kids.last()) else {
            return Err(self.missing("quotes", node));
        };
        let pieces =
            self.template_pieces(node, open.end_byte(), close.start_byte(), TemplateKind::Quoted)?;
        finish_template(pieces, self.range(node), true, false)
    }

    /// The body runs from the line after the opening marker up to the line
    /// holding the closing marker.
    fn read_heredoc(&self, node: Node) -> ReadResult<Expression> {
        let markers: Vec<Node> = children(node)
            .into_iter()
            .filter(|kid| kid.kind() == "heredoc_identifier")
            .collect();
        let [open, .., close] = markers[..] else {
            return Err(error(
                "Unterminated template string",
                "No closing marker was found for the heredoc.",
                self.range(node),
            ));
        };
        let flush = self
            .source
            .get(node.start_byte()..)
            .is_some_and(|text| text.starts_with("<<-"));

        let body_start = self
            .source
            .get(open.end_byte()..)
            .and_then(|rest| rest.find('\n'))
            .map_or(open.end_byte(), |i| open.end_byte() + i + 1);
        let body_end = self
            .source
            .get(..close.start_byte())
            .and_then(|head| head.rfind('\n'))
            .map_or(close.start_byte(), |i| i + 1)
            .max(body_start);

        let pieces = self.template_pieces(node, body_start, body_end, TemplateKind::Heredoc)?;
        finish_template(pieces, self.range(node), true, flush)
    }

    /// Flattens the sequences of a template between `from` and `to` into
    /// pieces. Literal text is taken from the gaps between sequences.
    fn template_pieces(
        &self,
        node: Node,
        from: usize,
        to: usize,
        kind: TemplateKind,
    ) -> ReadResult<Vec<Piece>> {
        let mut pieces = Vec::new();
        let mut cursor = from;
        self.collect_pieces(node, kind, &mut cursor, &mut pieces)?;
        self.push_literal(&mut pieces, cursor, to, kind)?;
        Ok(pieces)
    }

    fn collect_pieces(
        &self,
        node: Node,
        kind: TemplateKind,
        cursor: &mut usize,
        pieces: &mut Vec<Piece>,
    ) -> ReadResult<()> {
        for child in named_children(node) {
            match child.kind() {
                "template_interpolation" => {
                    self.push_literal(pieces, *cursor, child.start_byte(), kind)?;
                    let (strip_left, strip_right) = strip_flags(child);
                    let expr = child_of_kind(child, "expression").ok_or_else(|| {
                        error(
                            "Invalid template interpolation",
                            "An expression is required inside the interpolation sequence.",
                            self.range(child),
                        )
                    })?;
                    pieces.push(Piece::Interp {
                        expr: self.read_node(expr)?,
                        strip_left,
                        strip_right,
                    });
                    *cursor = child.end_byte();
                }
                "template_directive" | "template_for" | "template_if" => {
                    self.collect_pieces(child, kind, cursor, pieces)?;
                }
                "template_for_start" | "template_for_end" | "template_if_intro"
                | "template_else_intro" | "template_if_end" => {
                    self.push_literal(pieces, *cursor, child.start_byte(), kind)?;
                    let (strip_left, strip_right) = strip_flags(child);
                    pieces.push(Piece::Directive {
                        directive: self.read_directive(child)?,
                        range: self.range(child),
                        strip_left,
                        strip_right,
                    });
                    *cursor = child.end_byte();
                }
                // Literal chunks are recovered from the gaps.
                _ => {}
            }
        }
        Ok(())
    }

    fn read_directive(&self, node: Node) -> ReadResult<Directive> {
        match node.kind() {
            "template_if_intro" => Ok(Directive::If(self.read_node(self.expression_child(node)?)?)),
            "template_else_intro" => Ok(Directive::Else),
            "template_if_end" => Ok(Directive::EndIf),
            "template_for_end" => Ok(Directive::EndFor),
            _ => {
                let (key_var, val_var) = self.for_vars(node)?;
                let coll = self.read_node(self.expression_child(node)?)?;
                Ok(Directive::For {
                    key_var,
                    val_var,
                    coll,
                })
            }
        }
    }

    fn push_literal(
        &self,
        pieces: &mut Vec<Piece>,
        from: usize,
        to: usize,
        kind: TemplateKind,
    ) -> ReadResult<()> {
        let Some(raw) = self.source.get(from..to).filter(|raw| !raw.is_empty()) else {
            return Ok(());
        };
        if kind != TemplateKind::Heredoc {
            pieces.push(Piece::Literal {
                text: self.decode(raw, from, kind == TemplateKind::Quoted)?,
                range: self.span(from, to),
                line_start: false,
            });
            return Ok(());
        }
        let mut at = from;
        for line in raw.split_inclusive('\n') {
            let line_start = self.source.get(..at).is_some_and(|head| head.ends_with('\n'));
            pieces.push(Piece::Literal {
                text: self.decode(line, at, false)?,
                range: self.span(at, at + line.len()),
                line_start,
            });
            at += line.len();
        }
        Ok(())
    }

    /// Decodes `$${` and `%%{`, plus backslash escapes when `escapes` is set.
    fn decode(&self, text: &str, at: usize, escapes: bool) -> ReadResult<String> {
        let mut out = String::with_capacity(text.len());
        let mut i = 0;
        while let Some(c) = text[i..].chars().next() {
            let rest = &text[i..];
            if rest.starts_with("$${") || rest.starts_with("%%{") {
                out.push_str(&rest[1..3]);
                i += 3;
            } else if escapes && c == '\\' {
                let (decoded, len) = self.decode_escape(rest, at + i)?;
                out.push(decoded);
                i += len;
            } else {
                out.push(c);
                i += c.len_utf8();
            }
        }
        Ok(out)
    }

    fn decode_escape(&self, rest: &str, at: usize) -> ReadResult<(char, usize)> {
        let invalid = || {
            let len = rest.chars().take(2).map(char::len_utf8).sum::<usize>();
            error(
                "Invalid escape sequence",
                "The symbol after the backslash is not a valid escape sequence.",
                self.span(at, at + len),
            )
        };
        let unicode = |digits: usize| {
            rest.get(2..2 + digits)
                .filter(|hex| hex.chars().all(|c| c.is_ascii_hexdigit()))
                .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                .and_then(char::from_u32)
                .map(|c| (c, 2 + digits))
        };
        let decoded = match rest.chars().nth(1) {
            Some('n') => Some(('\n', 2)),
            Some('r') => Some(('\r', 2)),
            Some('t') => Some(('\t', 2)),
            Some('"') => Some(('"', 2)),
            Some('\\') => Some(('\\', 2)),
            Some('u') => unicode(4),
            Some('U') => unicode(8),
            _ => None,
        };
        decoded.ok_or_else(invalid)
    }
}
