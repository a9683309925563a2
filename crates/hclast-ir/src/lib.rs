//! Shared data model for hclast.
//!
//! This crate defines the types that flow between the syntax frontends and
//! the AST serializer:
//!
//! - [`Value`]: a fully-evaluated structural value (null, bool, number,
//!   string, tuple, object)
//! - [`Expression`]: an unevaluated expression tree with source ranges
//! - [`Diagnostics`]: problems reported while producing either of them
//!
//! # Example
//!
//! ```
//! use hclast_ir::Expression;
//!
//! let tuple = Expression::tuple(vec![
//!     Expression::literal(1.0),
//!     Expression::literal(true),
//! ]);
//! assert_eq!(tuple.children().len(), 2);
//! assert_eq!(tuple.node_count(), 3);
//! assert!(tuple.range().is_synthetic());
//! ```

mod diagnostic;
mod expr;
mod operation;
mod pos;
mod traversal;
mod value;
mod walk;

pub use diagnostic::{Diagnostic, Diagnostics, Severity};
pub use expr::{
    AnonSymbolExpr, BinaryOpExpr, ConditionalExpr, Expression, ForExpr, FunctionCallExpr,
    IndexExpr, LiteralValueExpr, ObjectConsExpr, ObjectConsItem, ObjectConsKeyExpr,
    ParenthesesExpr, RelativeTraversalExpr, ScopeTraversalExpr, SplatExpr, TemplateExpr,
    TemplateJoinExpr, TemplateWrapExpr, TupleConsExpr, UnaryOpExpr,
};
pub use operation::Operation;
pub use pos::{Pos, Range};
pub use traversal::{Traversal, Traverser};
pub use value::{Value, ValueType};
pub use walk::{Walker, walk};

#[cfg(test)]
mod tests;
