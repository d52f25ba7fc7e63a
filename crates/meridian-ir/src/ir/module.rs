//! Modules and definitions.
//!
//! A module is an ordered sequence of definitions; definitions other than
//! operator definitions (constants, state variables, type aliases,
//! assumptions, imports, instances, nested modules) shape the environment
//! rather than carrying executable bodies.

use meridian_foundation::NodeId;
use serde::{Deserialize, Serialize};

use crate::ir::expr::{Expr, Param};
use crate::ir::types::TypeTag;

/// Operator-definition qualifier.
///
/// The qualifier declares how stateful the definition is allowed to be;
/// effect inference ignores it, mode checking validates it afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Qualifier {
    Val,
    Def,
    DefRec,
    PureVal,
    PureDef,
    Action,
    Run,
    Temporal,
}

impl Qualifier {
    /// Keyword as written in source.
    pub fn keyword(&self) -> &'static str {
        match self {
            Qualifier::Val => "val",
            Qualifier::Def => "def",
            Qualifier::DefRec => "defrec",
            Qualifier::PureVal => "pureval",
            Qualifier::PureDef => "puredef",
            Qualifier::Action => "action",
            Qualifier::Run => "run",
            Qualifier::Temporal => "temporal",
        }
    }
}

/// Definition visibility within the enclosing module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Visibility {
    Public,
    Private,
}

/// An operator definition: module-level or let-bound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpDef {
    pub id: NodeId,
    pub qualifier: Qualifier,
    pub visibility: Visibility,
    pub name: String,
    /// Parameters for `def f(x, y) = ...` style definitions; empty for
    /// plain values.
    pub params: Vec<Param>,
    /// Optional annotated type, carried but not checked here.
    pub ty: Option<TypeTag>,
    pub body: Box<Expr>,
}

impl OpDef {
    pub fn new(id: NodeId, qualifier: Qualifier, name: impl Into<String>, body: Expr) -> Self {
        Self {
            id,
            qualifier,
            visibility: Visibility::Public,
            name: name.into(),
            params: Vec::new(),
            ty: None,
            body: Box::new(body),
        }
    }

    pub fn with_params(mut self, params: Vec<Param>) -> Self {
        self.params = params;
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_type(mut self, ty: TypeTag) -> Self {
        self.ty = Some(ty);
        self
    }
}

/// A top-level or nested definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Def {
    Const {
        id: NodeId,
        name: String,
        ty: TypeTag,
    },
    Var {
        id: NodeId,
        name: String,
        ty: TypeTag,
    },
    Op(OpDef),
    TypeDef {
        id: NodeId,
        name: String,
        ty: Option<TypeTag>,
    },
    Assume {
        id: NodeId,
        name: String,
        expr: Expr,
    },
    Import {
        id: NodeId,
        name: String,
    },
    Instance {
        id: NodeId,
        name: String,
        module: String,
        overrides: Vec<(String, Expr)>,
    },
    Module(Module),
}

impl Def {
    /// Id of the definition node itself.
    pub fn id(&self) -> NodeId {
        match self {
            Def::Const { id, .. }
            | Def::Var { id, .. }
            | Def::TypeDef { id, .. }
            | Def::Assume { id, .. }
            | Def::Import { id, .. }
            | Def::Instance { id, .. } => *id,
            Def::Op(op) => op.id,
            Def::Module(m) => m.id,
        }
    }
}

/// A module: named, ordered definitions, optional extended modules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub id: NodeId,
    pub name: String,
    pub defs: Vec<Def>,
    /// Names of modules this module extends (resolved externally).
    pub extends: Vec<String>,
}

impl Module {
    pub fn new(id: NodeId, name: impl Into<String>, defs: Vec<Def>) -> Self {
        Self {
            id,
            name: name.into(),
            defs,
            extends: Vec::new(),
        }
    }
}
