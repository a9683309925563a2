//! Enter/exit traversal over expression trees.

use crate::{Diagnostics, Expression};

/// Callbacks invoked around each node of a walk.
pub trait Walker {
    /// Called before any of `expr`'s children are visited.
    fn enter(&mut self, expr: &Expression) -> Diagnostics;

    /// Called after all of `expr`'s children have been visited.
    fn exit(&mut self, expr: &Expression) -> Diagnostics;
}

/// Visits `expr` and its descendants depth-first, in [`Expression::children`]
/// order.
///
/// Diagnostics returned by the callbacks are collected; they never stop the
/// walk.
pub fn walk<W: Walker + ?Sized>(expr: &Expression, walker: &mut W) -> Diagnostics {
    let mut diags = walker.enter(expr);
    for child in expr.children() {
        diags.extend(walk(child, walker));
    }
    diags.extend(walker.exit(expr));
    diags
}
