//! Substitution algebra.
//!
//! A substitution is an ordered sequence of bindings over two disjoint
//! kinds: effect variables (bound to effects) and set variables (bound
//! to variable sets). Application iterates bindings in order, so later
//! bindings see the results of earlier ones; composition preserves that
//! reading.
//!
//! Substitutions are pure values: `apply` never mutates its input or the
//! substitution itself.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::effect::{Effect, EffectComponent, Variables};
use crate::error::{ErrorKind, InferenceError};
use crate::simplify::{flatten_unions, simplify};

/// One binding: a name mapped to a value of matching kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Binding {
    Effect { name: String, value: Effect },
    Entity { name: String, value: Variables },
}

impl Binding {
    fn key(&self) -> (bool, &str) {
        match self {
            Binding::Effect { name, .. } => (false, name),
            Binding::Entity { name, .. } => (true, name),
        }
    }
}

/// An ordered sequence of bindings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Substitution {
    bindings: Vec<Binding>,
}

impl Substitution {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    /// Build a substitution from raw bindings, without occurs-checking.
    ///
    /// For callers that mint the bound values themselves (instantiation
    /// with fresh names, hash-variable canonicalization) and can
    /// guarantee no cycles; everything else goes through `bind_*` and
    /// [`compose`].
    pub fn from_bindings(bindings: Vec<Binding>) -> Substitution {
        Substitution { bindings }
    }

    /// Singleton substitution binding an effect variable, after the
    /// occurs-check. Binding a name to its own quantified form is a
    /// no-op; binding it to a term containing itself is a cyclical
    /// binding error.
    pub fn bind_effect(name: &str, value: &Effect) -> Result<Substitution, InferenceError> {
        if matches!(value, Effect::Quantified { name: n } if n == name) {
            return Ok(Substitution::empty());
        }
        if value.effect_names().contains(name) {
            return Err(InferenceError::new(
                name,
                ErrorKind::CyclicalBinding {
                    name: name.to_string(),
                    value: value.to_string(),
                },
            ));
        }
        Ok(Substitution {
            bindings: vec![Binding::Effect {
                name: name.to_string(),
                value: value.clone(),
            }],
        })
    }

    /// Singleton substitution binding a set variable, after the
    /// occurs-check.
    pub fn bind_variables(name: &str, value: &Variables) -> Result<Substitution, InferenceError> {
        if matches!(value, Variables::Quantified { name: n } if n == name) {
            return Ok(Substitution::empty());
        }
        let mut quantified = std::collections::BTreeSet::new();
        value.collect_quantified(&mut quantified);
        if quantified.contains(name) {
            return Err(InferenceError::new(
                name,
                ErrorKind::CyclicalBinding {
                    name: name.to_string(),
                    value: value.to_string(),
                },
            ));
        }
        Ok(Substitution {
            bindings: vec![Binding::Entity {
                name: name.to_string(),
                value: value.clone(),
            }],
        })
    }

    /// Substitute every bound name in an effect.
    pub fn apply(&self, effect: &Effect) -> Effect {
        let mut current = effect.clone();
        for binding in &self.bindings {
            current = apply_binding(binding, &current);
        }
        current
    }

    /// Substitute every bound name in a variable set.
    pub fn apply_variables(&self, variables: &Variables) -> Variables {
        let mut current = variables.clone();
        for binding in &self.bindings {
            current = apply_binding_variables(binding, &current);
        }
        current
    }
}

fn apply_binding(binding: &Binding, effect: &Effect) -> Effect {
    match effect {
        Effect::Quantified { name } => match binding {
            Binding::Effect { name: bound, value } if bound == name => value.clone(),
            _ => effect.clone(),
        },
        Effect::Arrow { params, result } => Effect::Arrow {
            params: params.iter().map(|p| apply_binding(binding, p)).collect(),
            result: Box::new(apply_binding(binding, result)),
        },
        Effect::Concrete { components } => Effect::Concrete {
            components: components
                .iter()
                .map(|c| EffectComponent {
                    kind: c.kind,
                    variables: apply_binding_variables(binding, &c.variables),
                })
                .collect(),
        },
    }
}

fn apply_binding_variables(binding: &Binding, variables: &Variables) -> Variables {
    match variables {
        Variables::Quantified { name } => match binding {
            Binding::Entity { name: bound, value } if bound == name => value.clone(),
            _ => variables.clone(),
        },
        Variables::Union { variables } => Variables::Union {
            variables: variables
                .iter()
                .map(|v| apply_binding_variables(binding, v))
                .collect(),
        },
        Variables::Concrete { .. } => variables.clone(),
    }
}

/// Compose two substitutions: apply `s1` to every value in `s2`, then
/// concatenate `s1` with the result.
///
/// The composed substitution reads "s1, then s2". Duplicate `(kind,
/// name)` keys keep the first occurrence; a duplicate whose value
/// disagrees with the kept one is an inconsistency error.
pub fn compose(s1: &Substitution, s2: &Substitution) -> Result<Substitution, InferenceError> {
    let mut out: Vec<Binding> = s1.bindings.clone();

    for binding in &s2.bindings {
        let rewritten = match binding {
            Binding::Effect { name, value } => Binding::Effect {
                name: name.clone(),
                value: s1.apply(value),
            },
            Binding::Entity { name, value } => Binding::Entity {
                name: name.clone(),
                value: s1.apply_variables(value),
            },
        };
        out.push(rewritten);
    }

    dedupe(out)
}

fn dedupe(bindings: Vec<Binding>) -> Result<Substitution, InferenceError> {
    let mut kept: Vec<Binding> = Vec::with_capacity(bindings.len());

    for binding in bindings {
        let Some(existing) = kept.iter().find(|b| b.key() == binding.key()) else {
            kept.push(binding);
            continue;
        };
        if !values_agree(existing, &binding) {
            let (name, left, right) = describe_conflict(existing, &binding);
            return Err(InferenceError::new(
                name.clone(),
                ErrorKind::InconsistentBinding { name, left, right },
            ));
        }
    }

    Ok(Substitution { bindings: kept })
}

fn values_agree(a: &Binding, b: &Binding) -> bool {
    match (a, b) {
        (Binding::Effect { value: va, .. }, Binding::Effect { value: vb, .. }) => {
            simplify(va).to_string() == simplify(vb).to_string()
        }
        (Binding::Entity { value: va, .. }, Binding::Entity { value: vb, .. }) => {
            flatten_unions(va) == flatten_unions(vb)
        }
        _ => false,
    }
}

fn describe_conflict(a: &Binding, b: &Binding) -> (String, String, String) {
    match (a, b) {
        (Binding::Effect { name, value: va }, Binding::Effect { value: vb, .. }) => {
            (name.clone(), va.to_string(), vb.to_string())
        }
        (Binding::Entity { name, value: va }, Binding::Entity { value: vb, .. }) => {
            (name.clone(), va.to_string(), vb.to_string())
        }
        _ => unreachable!("conflicting bindings always share a kind"),
    }
}

impl fmt::Display for Substitution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .bindings
            .iter()
            .map(|b| match b {
                Binding::Effect { name, value } => format!("{} |-> {}", name, value),
                Binding::Entity { name, value } => format!("{} |-> [{}]", name, value),
            })
            .collect();
        write!(f, "[{}]", parts.join(", "))
    }
}
