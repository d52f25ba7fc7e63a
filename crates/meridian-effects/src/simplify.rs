//! Effect simplification.
//!
//! Rewrites effects into the canonical form the unifier compares and
//! prints:
//!
//! - duplicate components of the same kind merge by unioning variables
//! - unions flatten: nested unions splice, concrete members merge into
//!   one sorted set, duplicates drop, empty concretes drop, singletons
//!   unwrap
//! - components whose variables are the empty set drop entirely
//! - arrows simplify params and result independently; arrow structure is
//!   never flattened
//!
//! After simplification a concrete effect holds at most one component
//! per kind, in Read, Update, Temporal order, and every surviving union
//! has at least two members.

use crate::effect::{ComponentKind, Effect, EffectComponent, Variables};

/// Rewrite an effect into canonical form.
pub fn simplify(effect: &Effect) -> Effect {
    match effect {
        Effect::Concrete { components } => {
            let mut out = Vec::new();
            for kind in ComponentKind::ALL {
                let of_kind: Vec<Variables> = components
                    .iter()
                    .filter(|c| c.kind == kind)
                    .map(|c| c.variables.clone())
                    .collect();
                if of_kind.is_empty() {
                    continue;
                }
                let merged = flatten_unions(&Variables::union(of_kind));
                if merged.is_empty_concrete() {
                    continue;
                }
                out.push(EffectComponent::new(kind, merged));
            }
            Effect::Concrete { components: out }
        }
        Effect::Arrow { params, result } => Effect::Arrow {
            params: params.iter().map(simplify).collect(),
            result: Box::new(simplify(result)),
        },
        Effect::Quantified { .. } => effect.clone(),
    }
}

/// Collapse a variables tree: splice nested unions, merge concrete
/// members, drop empties and duplicates, unwrap singletons.
pub fn flatten_unions(variables: &Variables) -> Variables {
    match variables {
        Variables::Concrete { vars } => {
            let mut sorted = vars.clone();
            sorted.sort();
            sorted.dedup();
            Variables::Concrete { vars: sorted }
        }
        Variables::Quantified { .. } => variables.clone(),
        Variables::Union { variables } => {
            let mut concrete = Vec::new();
            let mut quantified = Vec::new();
            for member in variables {
                collect_members(&flatten_unions(member), &mut concrete, &mut quantified);
            }

            concrete.sort();
            concrete.dedup();
            quantified.sort();
            quantified.dedup();

            let mut members = Vec::new();
            if !concrete.is_empty() {
                members.push(Variables::Concrete { vars: concrete });
            }
            members.extend(quantified.into_iter().map(|name| Variables::Quantified { name }));

            match members.len() {
                0 => Variables::empty(),
                1 => members.remove(0),
                _ => Variables::Union { variables: members },
            }
        }
    }
}

fn collect_members(
    flattened: &Variables,
    concrete: &mut Vec<crate::effect::StateVar>,
    quantified: &mut Vec<String>,
) {
    match flattened {
        Variables::Concrete { vars } => concrete.extend(vars.iter().cloned()),
        Variables::Quantified { name } => quantified.push(name.clone()),
        Variables::Union { variables } => {
            for v in variables {
                collect_members(v, concrete, quantified);
            }
        }
    }
}
