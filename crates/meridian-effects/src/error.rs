//! Inference errors.
//!
//! Errors are plain data: a tree of `(location, kind)` frames built by
//! wrapping the failing operation's error with context as it propagates
//! out of the unifier and the inferrer. The printed form is the
//! flattened tree. Normal inference failures never panic; only
//! programmer-contract violations do (documented at their call sites).

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// The catalogue of failure messages.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ErrorKind {
    #[error("couldn't find {0} in the lookup table")]
    NameNotFound(String),

    #[error("expected {expected} arguments, got {got}")]
    ArityMismatch { expected: usize, got: usize },

    #[error("can't unify different kinds of effects: {left} and {right}")]
    EffectKindMismatch { left: String, right: String },

    #[error("expected variables [{left}] and [{right}] to be the same")]
    VariablesMismatch { left: String, right: String },

    #[error("unification of two unions is not supported")]
    UnsupportedUnions,

    #[error("can't bind {name} to {value}: cyclical binding")]
    CyclicalBinding { name: String, value: String },

    #[error("conflicting bindings for {name}: {left} and {right}")]
    InconsistentBinding {
        name: String,
        left: String,
        right: String,
    },

    #[error("signature for {0} is not available")]
    MissingSignature(String),

    #[error("{name} is declared as '{declared}' but its effect requires '{required}'")]
    ModeMismatch {
        name: String,
        declared: String,
        required: String,
    },

    /// Free-form context frame wrapping a deeper error.
    #[error("{0}")]
    Context(String),
}

/// A tree-structured inference error.
///
/// `location` describes where the failure happened (an operand pair, an
/// operator application); `kind` carries the message; `children` hold
/// the deeper causes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferenceError {
    pub location: String,
    pub kind: ErrorKind,
    pub children: Vec<InferenceError>,
}

impl InferenceError {
    /// A leaf error.
    pub fn new(location: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            location: location.into(),
            kind,
            children: Vec::new(),
        }
    }

    /// A context frame around one or more child errors.
    pub fn wrap(location: impl Into<String>, kind: ErrorKind, children: Vec<InferenceError>) -> Self {
        Self {
            location: location.into(),
            kind,
            children,
        }
    }

    /// The message of this frame alone.
    pub fn message(&self) -> String {
        self.kind.to_string()
    }

    /// Leaf frames of the tree, outermost-first.
    pub fn leaves(&self) -> Vec<&InferenceError> {
        if self.children.is_empty() {
            vec![self]
        } else {
            self.children.iter().flat_map(|c| c.leaves()).collect()
        }
    }

    /// Whether any frame in the tree matches the predicate.
    pub fn any(&self, pred: &dyn Fn(&ErrorKind) -> bool) -> bool {
        pred(&self.kind) || self.children.iter().any(|c| c.any(pred))
    }

    fn render(&self, indent: usize, out: &mut String) {
        out.push_str(&"  ".repeat(indent));
        out.push_str(&self.message());
        out.push_str(" at ");
        out.push_str(&self.location);
        out.push('\n');
        for child in &self.children {
            child.render(indent + 1, out);
        }
    }
}

impl fmt::Display for InferenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        self.render(0, &mut out);
        write!(f, "{}", out.trim_end())
    }
}

impl std::error::Error for InferenceError {}
