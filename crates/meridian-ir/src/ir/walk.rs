//! Expression tree traversal.
//!
//! Shared traversal logic so analysis passes do not each duplicate the
//! recursive descent. Two entry points:
//!
//! - [`children_of`] — ordered direct children, the order the parser
//!   produced them (and the order the effect inferrer visits them)
//! - [`post_order`] — leaf-first traversal, visitor called after all
//!   children
//!
//! Closure-based rather than a visitor trait: every pass needs the same
//! traversal structure, and a `FnMut` keeps state with the caller.

use crate::ir::expr::{Expr, ExprKind};

/// Ordered direct children of an expression.
///
/// Let-bound definitions contribute their body as the first child so a
/// post-order pass sees the local definition before the body that uses
/// it.
pub fn children_of(expr: &Expr) -> Vec<&Expr> {
    match &expr.kind {
        ExprKind::Int(_) | ExprKind::Bool(_) | ExprKind::Str(_) | ExprKind::Name(_) => Vec::new(),
        ExprKind::App { args, .. } => args.iter().collect(),
        ExprKind::Lambda { body, .. } => vec![body.as_ref()],
        ExprKind::Let { def, body } => vec![def.body.as_ref(), body.as_ref()],
    }
}

/// Walk an expression tree leaf-first, calling the visitor for each node
/// after all of its children.
pub fn post_order<V>(expr: &Expr, visitor: &mut V)
where
    V: FnMut(&Expr),
{
    for child in children_of(expr) {
        post_order(child, visitor);
    }
    visitor(expr);
}
