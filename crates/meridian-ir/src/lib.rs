// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! IR and scoping for the Meridian specification language.
//!
//! This crate defines the tree the parser produces — modules,
//! definitions, expressions with stable numeric ids — plus the two
//! queries analysis passes depend on: ordered traversal
//! ([`ir::walk`]) and scoped name lookup ([`scope::ScopeTable`]).
//!
//! IR nodes are immutable during analysis; results attach to node ids
//! through side tables owned by the passes themselves.

pub mod ir;
pub mod scope;

pub use ir::{
    children_of, post_order, Def, Expr, ExprKind, Module, OpDef, Param, Qualifier, TypeTag,
    Visibility,
};
pub use scope::{BindingKind, Lookup, ScopeTable};
