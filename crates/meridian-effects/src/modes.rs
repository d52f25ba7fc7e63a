//! Mode checking.
//!
//! Validates that each definition's inferred effect stays within what
//! its declared qualifier allows:
//!
//! - **pureval / puredef** — no state interaction at all
//! - **val / def / defrec** — may read, never update, no temporal refs
//! - **action / run** — may read and update, no temporal refs
//! - **temporal** — anything
//!
//! # What This Pass Does NOT Do
//!
//! - **No inference** — it consumes the inferrer's output
//! - **No suppression** — mode errors never remove schemes; callers get
//!   both maps fully populated
//!
//! Runs after inference over the same module tree; violations are
//! reported per definition id with the minimal qualifier the effect
//! would need.

use indexmap::IndexMap;

use meridian_foundation::NodeId;
use meridian_ir::{Def, Module, OpDef, Qualifier};

use crate::effect::{ComponentKind, Effect};
use crate::error::{ErrorKind, InferenceError};
use crate::infer::InferenceOutput;
use crate::simplify::simplify;

/// How stateful an effect is, ordered from least to most.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Mode {
    Pure,
    Read,
    Action,
    Temporal,
}

/// Check every definition of a module tree against its qualifier.
pub fn check_modes(module: &Module, output: &InferenceOutput) -> IndexMap<NodeId, InferenceError> {
    let mut errors = IndexMap::new();
    check_module(module, output, &mut errors);
    errors
}

fn check_module(
    module: &Module,
    output: &InferenceOutput,
    errors: &mut IndexMap<NodeId, InferenceError>,
) {
    for def in &module.defs {
        match def {
            Def::Op(op) => check_opdef(op, output, errors),
            Def::Module(nested) => check_module(nested, output, errors),
            _ => {}
        }
    }
}

fn check_opdef(
    op: &OpDef,
    output: &InferenceOutput,
    errors: &mut IndexMap<NodeId, InferenceError>,
) {
    // Definitions that failed inference have no effect to judge.
    let Some(scheme) = output.get(op.id) else {
        return;
    };

    let required = required_mode(&scheme.effect);
    if required > allowed_mode(op.qualifier) {
        errors.insert(
            op.id,
            InferenceError::new(
                op.name.clone(),
                ErrorKind::ModeMismatch {
                    name: op.name.clone(),
                    declared: op.qualifier.keyword().to_string(),
                    required: suggest_qualifier(required, op).to_string(),
                },
            ),
        );
    }
}

/// The most permissive mode a qualifier allows.
pub fn allowed_mode(qualifier: Qualifier) -> Mode {
    match qualifier {
        Qualifier::PureVal | Qualifier::PureDef => Mode::Pure,
        Qualifier::Val | Qualifier::Def | Qualifier::DefRec => Mode::Read,
        Qualifier::Action | Qualifier::Run => Mode::Action,
        Qualifier::Temporal => Mode::Temporal,
    }
}

/// The minimal mode an effect requires.
///
/// Only components naming concrete state variables count: a component
/// whose variables are still quantified depends on the call site and
/// may well be empty there. An operator is as stateful as its result;
/// parameters contribute only update and temporal leaks (an operator
/// taking a reading argument is not itself a reader).
pub fn required_mode(effect: &Effect) -> Mode {
    match simplify(effect) {
        Effect::Concrete { components } => components
            .iter()
            .filter(|c| c.variables.has_state_vars())
            .map(|c| match c.kind {
                ComponentKind::Read => Mode::Read,
                ComponentKind::Update => Mode::Action,
                ComponentKind::Temporal => Mode::Temporal,
            })
            .max()
            .unwrap_or(Mode::Pure),
        Effect::Arrow { params, result } => {
            let mut mode = required_mode(&result);
            for param in &params {
                let leaked = required_mode(param);
                if leaked >= Mode::Action {
                    mode = mode.max(leaked);
                }
            }
            mode
        }
        Effect::Quantified { .. } => Mode::Pure,
    }
}

fn suggest_qualifier(mode: Mode, op: &OpDef) -> &'static str {
    let parameterized =
        !op.params.is_empty() || matches!(op.body.kind, meridian_ir::ExprKind::Lambda { .. });
    match mode {
        Mode::Pure => {
            if parameterized {
                "puredef"
            } else {
                "pureval"
            }
        }
        Mode::Read => {
            if parameterized {
                "def"
            } else {
                "val"
            }
        }
        Mode::Action => "action",
        Mode::Temporal => "temporal",
    }
}
