//! Value-type annotations carried on declarations.
//!
//! The effect engine does not check value types; tags parsed from source
//! are carried through the IR so later passes (and tooling) can consume
//! them. Keeping them here avoids a second parse when a type checker
//! eventually runs over the same tree.

use serde::{Deserialize, Serialize};

/// Value-type tag attached to `const` / `var` / operator definitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeTag {
    Int,
    Str,
    Bool,
    /// Placeholder for declarations whose type was not annotated; records
    /// the arities of any operator parameters so arity errors can still
    /// be reported downstream.
    Untyped { arities: Vec<usize> },
    Set(Box<TypeTag>),
    Seq(Box<TypeTag>),
    Fun(Box<TypeTag>, Box<TypeTag>),
    Oper(Vec<TypeTag>, Box<TypeTag>),
    Tuple(Vec<TypeTag>),
    Record(Vec<(String, TypeTag)>),
    /// Tagged union: discriminator field name plus one record per tag.
    Union {
        tag: String,
        variants: Vec<(String, Vec<(String, TypeTag)>)>,
    },
}

impl TypeTag {
    /// Shorthand for an unannotated declaration with no parameters.
    pub fn untyped() -> Self {
        TypeTag::Untyped {
            arities: Vec::new(),
        }
    }
}
