// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Effect inference for the Meridian specification language.
//!
//! Given a module tree from `meridian-ir`, this crate assigns every
//! expression an *effect*: an abstract summary of which state variables
//! it reads, updates, or references temporally. The engine is a
//! Hindley-Milner-style inference pass over the effect algebra:
//!
//! - [`effect`] — the algebra itself (effects, components, variable
//!   sets, schemes)
//! - [`subst`] — ordered substitutions over effect and set variables
//! - [`simplify`] — canonical forms and the printing the unifier keys on
//! - [`unify`] — structural unification with the kind interaction table,
//!   tuple unpacking, and arrow-fixpoint canonicalization
//! - [`builtins`] — arity-indexed signatures of the built-in operators
//! - [`infer`] — the post-order driver producing scheme/error maps
//! - [`modes`] — qualifier checking on top of the inferred effects
//!
//! Inference is single-threaded and deterministic: identical input IR
//! yields byte-identical output, fresh variable names included.

pub mod builtins;
pub mod effect;
pub mod error;
pub mod infer;
pub mod modes;
pub mod simplify;
pub mod subst;
pub mod unify;

pub use builtins::SignatureTable;
pub use effect::{ComponentKind, Effect, EffectComponent, EffectScheme, StateVar, Variables};
pub use error::{ErrorKind, InferenceError};
pub use infer::{infer_effects, EffectInferrer, InferenceOutput};
pub use modes::{check_modes, Mode};
pub use simplify::{flatten_unions, simplify};
pub use subst::{compose, Binding, Substitution};
pub use unify::{unify, unify_variables};
