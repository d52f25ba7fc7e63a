//! IR data model: modules, definitions, expressions, type tags.

pub mod expr;
pub mod module;
pub mod types;
pub mod walk;

pub use expr::{Expr, ExprKind, Param};
pub use module::{Def, Module, OpDef, Qualifier, Visibility};
pub use types::TypeTag;
pub use walk::{children_of, post_order};
