//! Turning evaluated values back into expression trees.
//!
//! A JSON expression is read as a plain [`Value`], but consumers of the AST
//! expect expression nodes. Lifting rebuilds a tree from the value. Strings
//! are parsed again as templates so `"${var.x}"` surfaces as a traversal.

use hclast_ir::{Diagnostics, Expression, ObjectConsItem, Pos, Value};
use tracing::trace;

/// Filename attached to diagnostics from re-parsed string values.
pub const LIFTED_FILENAME: &str = "<value>";

/// Builds an expression tree from `value`.
///
/// Every node of the result has [`Range::SYNTHETIC`](hclast_ir::Range::SYNTHETIC)
/// as its range. A string that fails to parse as a template still produces
/// a best-effort node; the diagnostics explain what went wrong and lifting
/// of sibling values carries on.
pub fn lift(value: &Value) -> (Expression, Diagnostics) {
    match value {
        Value::Null => (Expression::literal(Value::Null), Diagnostics::new()),
        Value::String(raw) => {
            trace!(len = raw.len(), "lifting string as template");
            let (mut expr, diags) =
                hclast_syntax_hcl::parse_template(raw, LIFTED_FILENAME, Pos::SYNTHETIC);
            expr.clear_ranges();
            (expr, diags)
        }
        Value::Tuple(items) => {
            let mut diags = Diagnostics::new();
            let exprs = items
                .iter()
                .map(|item| {
                    let (expr, more) = lift(item);
                    diags.extend(more);
                    expr
                })
                .collect();
            (Expression::tuple(exprs), diags)
        }
        Value::Object(_) => {
            let mut diags = Diagnostics::new();
            let mut items = Vec::new();
            for (key, element) in value.elements() {
                let (key, more) = lift(&key);
                diags.extend(more);
                let (value, more) = lift(element);
                diags.extend(more);
                items.push(ObjectConsItem { key, value });
            }
            (Expression::object(items), diags)
        }
        other => (Expression::literal(other.clone()), Diagnostics::new()),
    }
}
