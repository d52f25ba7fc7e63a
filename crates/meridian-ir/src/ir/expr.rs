//! Expression nodes.
//!
//! Expressions form a pure value tree: children are owned inline, and
//! every node carries a [`NodeId`] through which analyses attach results.
//! Source spans live in the parser-produced
//! [`LocationTable`](meridian_foundation::LocationTable), not here.

use meridian_foundation::NodeId;
use serde::{Deserialize, Serialize};

use crate::ir::module::OpDef;

/// A lambda or operator parameter.
///
/// Parameters carry their own id because analyses key per-parameter
/// results (e.g. the distinguished effect variable of a parameter) on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    pub id: NodeId,
    pub name: String,
}

impl Param {
    pub fn new(id: NodeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// An expression with its stable id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expr {
    pub id: NodeId,
    pub kind: ExprKind,
}

/// Expression variants.
///
/// Operator application is the workhorse: all composite syntax (set and
/// record construction, arithmetic, actions, quantifiers) parses to an
/// `App` with a named opcode and ordered arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExprKind {
    Int(i64),
    Bool(bool),
    Str(String),
    /// Reference to a name bound in an enclosing scope.
    Name(String),
    /// Operator application: `op(a1, ..., an)`.
    App { op: String, args: Vec<Expr> },
    /// Anonymous operator: `(p1, ..., pk) => body`.
    Lambda { params: Vec<Param>, body: Box<Expr> },
    /// Local definition: the opdef is visible in `body`.
    Let { def: Box<OpDef>, body: Box<Expr> },
}

impl Expr {
    pub fn new(id: NodeId, kind: ExprKind) -> Self {
        Self { id, kind }
    }

    pub fn int(id: NodeId, value: i64) -> Self {
        Self::new(id, ExprKind::Int(value))
    }

    pub fn bool(id: NodeId, value: bool) -> Self {
        Self::new(id, ExprKind::Bool(value))
    }

    pub fn str(id: NodeId, value: impl Into<String>) -> Self {
        Self::new(id, ExprKind::Str(value.into()))
    }

    pub fn name(id: NodeId, name: impl Into<String>) -> Self {
        Self::new(id, ExprKind::Name(name.into()))
    }

    pub fn app(id: NodeId, op: impl Into<String>, args: Vec<Expr>) -> Self {
        Self::new(
            id,
            ExprKind::App {
                op: op.into(),
                args,
            },
        )
    }

    pub fn lambda(id: NodeId, params: Vec<Param>, body: Expr) -> Self {
        Self::new(
            id,
            ExprKind::Lambda {
                params,
                body: Box::new(body),
            },
        )
    }

    pub fn let_in(id: NodeId, def: OpDef, body: Expr) -> Self {
        Self::new(
            id,
            ExprKind::Let {
                def: Box::new(def),
                body: Box::new(body),
            },
        )
    }
}
