//! The effect algebra.
//!
//! An effect summarizes how an expression interacts with state
//! variables: which it reads, which it updates, and which it references
//! temporally. Effects are either *concrete* (a set of components),
//! *arrows* (the effect of applying an operator), or *quantified*
//! (an effect variable awaiting substitution).
//!
//! Variable sets have their own little algebra: a concrete set of named
//! state variables, a quantified set variable, or a union of sets. Unions
//! appear during signature propagation and collapse during
//! simplification.
//!
//! # Display
//!
//! `Display` renders the canonical textual form: component kinds in the
//! fixed order Read, Update, Temporal; within a component, state-variable
//! names lexicographically (quoted), then quantified names
//! lexicographically. The unifier relies on this ordering for its
//! print-equality fast path.

use meridian_foundation::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Kind of an effect component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ComponentKind {
    Read,
    Update,
    Temporal,
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 3] =
        [ComponentKind::Read, ComponentKind::Update, ComponentKind::Temporal];

    pub fn label(&self) -> &'static str {
        match self {
            ComponentKind::Read => "Read",
            ComponentKind::Update => "Update",
            ComponentKind::Temporal => "Temporal",
        }
    }
}

/// A named state variable inside a concrete variable set.
///
/// `ref_id` points back at the IR node that introduced the variable into
/// the effect and exists for diagnostics only: two state variables are
/// the same variable iff their names are equal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateVar {
    pub name: String,
    pub ref_id: NodeId,
}

impl StateVar {
    pub fn new(name: impl Into<String>, ref_id: NodeId) -> Self {
        Self {
            name: name.into(),
            ref_id,
        }
    }
}

impl PartialEq for StateVar {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for StateVar {}

impl Hash for StateVar {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl PartialOrd for StateVar {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for StateVar {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.name.cmp(&other.name)
    }
}

/// A set of state variables, possibly symbolic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Variables {
    /// An explicit set of named state variables.
    Concrete { vars: Vec<StateVar> },
    /// A variable standing for a set of state variables.
    Quantified { name: String },
    /// A union of sets, collapsed by simplification.
    Union { variables: Vec<Variables> },
}

impl Variables {
    pub fn concrete(vars: Vec<StateVar>) -> Self {
        Variables::Concrete { vars }
    }

    /// The empty set of state variables.
    pub fn empty() -> Self {
        Variables::Concrete { vars: Vec::new() }
    }

    pub fn quantified(name: impl Into<String>) -> Self {
        Variables::Quantified { name: name.into() }
    }

    pub fn union(variables: Vec<Variables>) -> Self {
        Variables::Union { variables }
    }

    pub fn is_empty_concrete(&self) -> bool {
        matches!(self, Variables::Concrete { vars } if vars.is_empty())
    }

    /// Collect every quantified set-variable name in this tree.
    pub fn collect_quantified(&self, acc: &mut BTreeSet<String>) {
        match self {
            Variables::Concrete { .. } => {}
            Variables::Quantified { name } => {
                acc.insert(name.clone());
            }
            Variables::Union { variables } => {
                for v in variables {
                    v.collect_quantified(acc);
                }
            }
        }
    }

    /// Collect every concrete state-variable name in this tree.
    pub fn collect_state_names(&self, acc: &mut BTreeSet<String>) {
        match self {
            Variables::Concrete { vars } => {
                for v in vars {
                    acc.insert(v.name.clone());
                }
            }
            Variables::Quantified { .. } => {}
            Variables::Union { variables } => {
                for v in variables {
                    v.collect_state_names(acc);
                }
            }
        }
    }

    /// Whether any concrete state variable occurs in this tree.
    pub fn has_state_vars(&self) -> bool {
        match self {
            Variables::Concrete { vars } => !vars.is_empty(),
            Variables::Quantified { .. } => false,
            Variables::Union { variables } => variables.iter().any(Variables::has_state_vars),
        }
    }
}

impl fmt::Display for Variables {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut state = BTreeSet::new();
        let mut quantified = BTreeSet::new();
        self.collect_state_names(&mut state);
        self.collect_quantified(&mut quantified);

        let mut parts: Vec<String> = state.into_iter().map(|n| format!("'{}'", n)).collect();
        parts.extend(quantified);
        write!(f, "{}", parts.join(", "))
    }
}

/// One (kind, variable-set) pair inside a concrete effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectComponent {
    pub kind: ComponentKind,
    pub variables: Variables,
}

impl EffectComponent {
    pub fn new(kind: ComponentKind, variables: Variables) -> Self {
        Self { kind, variables }
    }
}

impl fmt::Display for EffectComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.kind.label(), self.variables)
    }
}

/// An effect: the central object of the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    Concrete {
        components: Vec<EffectComponent>,
    },
    Arrow {
        params: Vec<Effect>,
        result: Box<Effect>,
    },
    Quantified {
        name: String,
    },
}

impl Effect {
    /// The pure effect: reads nothing, updates nothing.
    pub fn pure() -> Self {
        Effect::Concrete {
            components: Vec::new(),
        }
    }

    pub fn concrete(components: Vec<EffectComponent>) -> Self {
        Effect::Concrete { components }
    }

    /// Single-component shorthand.
    pub fn component(kind: ComponentKind, variables: Variables) -> Self {
        Effect::Concrete {
            components: vec![EffectComponent::new(kind, variables)],
        }
    }

    pub fn read(variables: Variables) -> Self {
        Self::component(ComponentKind::Read, variables)
    }

    pub fn update(variables: Variables) -> Self {
        Self::component(ComponentKind::Update, variables)
    }

    pub fn temporal(variables: Variables) -> Self {
        Self::component(ComponentKind::Temporal, variables)
    }

    pub fn arrow(params: Vec<Effect>, result: Effect) -> Self {
        Effect::Arrow {
            params,
            result: Box::new(result),
        }
    }

    pub fn quantified(name: impl Into<String>) -> Self {
        Effect::Quantified { name: name.into() }
    }

    pub fn is_concrete(&self) -> bool {
        matches!(self, Effect::Concrete { .. })
    }

    pub fn is_pure(&self) -> bool {
        matches!(self, Effect::Concrete { components } if components.is_empty())
    }

    /// Free effect-level variable names.
    pub fn effect_names(&self) -> BTreeSet<String> {
        let mut acc = BTreeSet::new();
        self.collect_effect_names(&mut acc);
        acc
    }

    fn collect_effect_names(&self, acc: &mut BTreeSet<String>) {
        match self {
            Effect::Concrete { .. } => {}
            Effect::Quantified { name } => {
                acc.insert(name.clone());
            }
            Effect::Arrow { params, result } => {
                for p in params {
                    p.collect_effect_names(acc);
                }
                result.collect_effect_names(acc);
            }
        }
    }

    /// Free set-variable names (quantified [`Variables`]) anywhere inside.
    pub fn entity_names(&self) -> BTreeSet<String> {
        let mut acc = BTreeSet::new();
        self.collect_entity_names(&mut acc);
        acc
    }

    fn collect_entity_names(&self, acc: &mut BTreeSet<String>) {
        match self {
            Effect::Concrete { components } => {
                for c in components {
                    c.variables.collect_quantified(acc);
                }
            }
            Effect::Quantified { .. } => {}
            Effect::Arrow { params, result } => {
                for p in params {
                    p.collect_entity_names(acc);
                }
                result.collect_entity_names(acc);
            }
        }
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Effect::Concrete { components } => {
                if components.is_empty() {
                    return write!(f, "Pure");
                }
                let mut sorted: Vec<&EffectComponent> = components.iter().collect();
                sorted.sort_by_key(|c| c.kind);
                let parts: Vec<String> = sorted.iter().map(|c| c.to_string()).collect();
                write!(f, "{}", parts.join(" & "))
            }
            Effect::Arrow { params, result } => {
                let ps: Vec<String> = params.iter().map(|p| p.to_string()).collect();
                write!(f, "({}) => {}", ps.join(", "), result)
            }
            Effect::Quantified { name } => write!(f, "{}", name),
        }
    }
}

/// A universally-quantified effect: the storage form of inference
/// results.
///
/// `effect_vars` range over effect-level variables in `effect`,
/// `entity_vars` over set variables. A name never appears in both sets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectScheme {
    pub effect_vars: BTreeSet<String>,
    pub entity_vars: BTreeSet<String>,
    pub effect: Effect,
}

impl EffectScheme {
    /// A scheme with no quantified names (a monomorphic effect).
    pub fn mono(effect: Effect) -> Self {
        Self {
            effect_vars: BTreeSet::new(),
            entity_vars: BTreeSet::new(),
            effect,
        }
    }

    /// Quantify every free name of the effect. Used for built-in
    /// signatures, whose variables are all template parameters.
    pub fn generalize_all(effect: Effect) -> Self {
        Self {
            effect_vars: effect.effect_names(),
            entity_vars: effect.entity_names(),
            effect,
        }
    }
}

impl fmt::Display for EffectScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.effect)
    }
}
