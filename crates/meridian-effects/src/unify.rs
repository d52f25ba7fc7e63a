//! Structural unification of effects.
//!
//! `unify` computes a most-general substitution making two effects equal,
//! or a descriptive error when none exists. Both inputs are simplified
//! first; canonical-print equality short-circuits to the empty
//! substitution.
//!
//! # Kind interaction
//!
//! Concrete effects unify component-pair-wise under a fixed table:
//! same kinds unify their variable sets; Read is compatible with Update
//! and with Temporal (no constraint); Update dominates Temporal — the
//! temporal side's variables are unified with the empty set. Kinds
//! present on only one side unify with the empty set as well.
//!
//! # Arrow-fixpoint canonicalization
//!
//! Before unifying two arrows, a unary arrow whose single parameter
//! prints equal to its result (and is concrete) has each component's
//! quantified variables replaced by a synthetic variable named by
//! `#`-joining them, recording bindings from every original name to the
//! hash variable. This is a correctness mechanism, not an optimization:
//! it is what lets `(Read[a, b]) => Read[a, b]` unify with
//! `(Read[c]) => Read[c]` — all of `a`, `b`, `c` end up bound to one
//! hashed variable. Without it, arity-unpacked iterator arguments of
//! differing shapes cannot meet.
//!
//! # Deliberate restriction
//!
//! Unifying two non-trivial unions of set variables is unsupported and
//! fails explicitly; in practice at least one side is always concrete or
//! quantified by the time the unifier sees it.

use std::collections::BTreeSet;
use tracing::trace;

use crate::effect::{ComponentKind, Effect, EffectComponent, Variables};
use crate::error::{ErrorKind, InferenceError};
use crate::simplify::{flatten_unions, simplify};
use crate::subst::{compose, Substitution};

/// Unify two effects, producing a most-general substitution.
pub fn unify(e1: &Effect, e2: &Effect) -> Result<Substitution, InferenceError> {
    let a = simplify(e1);
    let b = simplify(e2);
    trace!(left = %a, right = %b, "unifying effects");

    if a.to_string() == b.to_string() {
        return Ok(Substitution::empty());
    }

    match (&a, &b) {
        (
            Effect::Arrow {
                params: p1,
                result: r1,
            },
            Effect::Arrow {
                params: p2,
                result: r2,
            },
        ) => unify_arrows(p1, r1, p2, r2).map_err(|err| with_context(&a, &b, err)),

        (Effect::Concrete { components: c1 }, Effect::Concrete { components: c2 }) => {
            unify_concrete(c1, c2).map_err(|err| with_context(&a, &b, err))
        }

        (Effect::Quantified { name }, other) | (other, Effect::Quantified { name }) => {
            Substitution::bind_effect(name, other)
        }

        _ => Err(InferenceError::new(
            format!("{} and {}", a, b),
            ErrorKind::EffectKindMismatch {
                left: a.to_string(),
                right: b.to_string(),
            },
        )),
    }
}

/// Unify two variable sets.
pub fn unify_variables(v1: &Variables, v2: &Variables) -> Result<Substitution, InferenceError> {
    let a = flatten_unions(v1);
    let b = flatten_unions(v2);

    match (&a, &b) {
        (Variables::Concrete { vars: x }, Variables::Concrete { vars: y }) => {
            let xs: BTreeSet<&str> = x.iter().map(|v| v.name.as_str()).collect();
            let ys: BTreeSet<&str> = y.iter().map(|v| v.name.as_str()).collect();
            if xs == ys {
                Ok(Substitution::empty())
            } else {
                Err(InferenceError::new(
                    format!("[{}] and [{}]", a, b),
                    ErrorKind::VariablesMismatch {
                        left: a.to_string(),
                        right: b.to_string(),
                    },
                ))
            }
        }

        (Variables::Quantified { name: n1 }, Variables::Quantified { name: n2 }) if n1 == n2 => {
            Ok(Substitution::empty())
        }

        (Variables::Quantified { name }, other) | (other, Variables::Quantified { name }) => {
            Substitution::bind_variables(name, other)
        }

        (Variables::Union { variables }, concrete @ Variables::Concrete { .. })
        | (concrete @ Variables::Concrete { .. }, Variables::Union { variables }) => {
            let mut sub = Substitution::empty();
            for member in variables {
                let step = unify_variables(
                    &sub.apply_variables(member),
                    &sub.apply_variables(concrete),
                )?;
                sub = compose(&sub, &step)?;
            }
            Ok(sub)
        }

        (Variables::Union { .. }, Variables::Union { .. }) => Err(InferenceError::new(
            format!("[{}] and [{}]", a, b),
            ErrorKind::UnsupportedUnions,
        )),
    }
}

fn with_context(a: &Effect, b: &Effect, err: InferenceError) -> InferenceError {
    InferenceError::wrap(
        format!("{} and {}", a, b),
        ErrorKind::Context("trying to unify effects".to_string()),
        vec![err],
    )
}

fn unify_arrows(
    p1: &[Effect],
    r1: &Effect,
    p2: &[Effect],
    r2: &Effect,
) -> Result<Substitution, InferenceError> {
    let (p1, p2) = if p1.len() == p2.len() {
        (p1.to_vec(), p2.to_vec())
    } else if p1.len() == 1 && p1[0].is_concrete() {
        (p1.to_vec(), vec![unpack_params(p2, p1.len())?])
    } else if p2.len() == 1 && p2[0].is_concrete() {
        (vec![unpack_params(p1, p2.len())?], p2.to_vec())
    } else {
        return Err(InferenceError::new(
            "operator application",
            ErrorKind::ArityMismatch {
                expected: p1.len(),
                got: p2.len(),
            },
        ));
    };

    let (p1, r1, h1) = hash_fixpoint(p1, r1.clone());
    let (p2, r2, h2) = hash_fixpoint(p2, r2.clone());
    let mut sub = compose(&h1, &h2)?;

    for (x, y) in p1.iter().zip(&p2) {
        let step = unify(&sub.apply(x), &sub.apply(y))?;
        sub = compose(&sub, &step)?;
    }
    let step = unify(&sub.apply(&r1), &sub.apply(&r2))?;
    compose(&sub, &step)
}

/// Combine a parameter list into the single concrete effect that stands
/// in for it during tuple unpacking: all components merged kind-wise
/// into unions.
fn unpack_params(params: &[Effect], expected: usize) -> Result<Effect, InferenceError> {
    let mut by_kind: Vec<(ComponentKind, Vec<Variables>)> = Vec::new();

    for param in params {
        let Effect::Concrete { components } = param else {
            return Err(InferenceError::new(
                "operator application",
                ErrorKind::ArityMismatch {
                    expected,
                    got: params.len(),
                },
            ));
        };
        for component in components {
            match by_kind.iter_mut().find(|(k, _)| *k == component.kind) {
                Some((_, vars)) => vars.push(component.variables.clone()),
                None => by_kind.push((component.kind, vec![component.variables.clone()])),
            }
        }
    }

    let components = by_kind
        .into_iter()
        .map(|(kind, vars)| EffectComponent::new(kind, Variables::union(vars)))
        .collect();
    Ok(simplify(&Effect::concrete(components)))
}

/// Arrow-fixpoint canonicalization (see module docs).
///
/// Applies only to a unary arrow whose parameter prints equal to its
/// result and is concrete; components mixing concrete state variables
/// with quantified names are left untouched.
fn hash_fixpoint(
    params: Vec<Effect>,
    result: Effect,
) -> (Vec<Effect>, Effect, Substitution) {
    if params.len() != 1 || params[0].to_string() != result.to_string() {
        return (params, result, Substitution::empty());
    }
    let Effect::Concrete { components } = &params[0] else {
        return (params, result, Substitution::empty());
    };

    let mut bindings = Vec::new();
    let mut hashed_components = Vec::with_capacity(components.len());

    for component in components {
        let mut names = BTreeSet::new();
        component.variables.collect_quantified(&mut names);

        if names.len() < 2 || component.variables.has_state_vars() {
            hashed_components.push(component.clone());
            continue;
        }

        let hashed = names.iter().cloned().collect::<Vec<_>>().join("#");
        let hash_var = Variables::quantified(hashed.as_str());
        for name in &names {
            bindings.push(crate::subst::Binding::Entity {
                name: name.clone(),
                value: hash_var.clone(),
            });
        }
        hashed_components.push(EffectComponent::new(component.kind, hash_var));
    }

    let canonical = Effect::concrete(hashed_components);
    (
        vec![canonical.clone()],
        canonical,
        Substitution::from_bindings(bindings),
    )
}

enum Interaction {
    UnifyVars,
    Compatible,
    NullifyLeft,
    NullifyRight,
}

/// The kind interaction table.
fn interaction(k1: ComponentKind, k2: ComponentKind) -> Interaction {
    use ComponentKind::*;
    match (k1, k2) {
        (Read, Read) | (Update, Update) | (Temporal, Temporal) => Interaction::UnifyVars,
        (Read, Update) | (Update, Read) | (Read, Temporal) | (Temporal, Read) => {
            Interaction::Compatible
        }
        (Update, Temporal) => Interaction::NullifyRight,
        (Temporal, Update) => Interaction::NullifyLeft,
    }
}

fn unify_concrete(
    c1: &[EffectComponent],
    c2: &[EffectComponent],
) -> Result<Substitution, InferenceError> {
    let mut sub = Substitution::empty();

    for x in c1 {
        for y in c2 {
            let xv = sub.apply_variables(&x.variables);
            let yv = sub.apply_variables(&y.variables);
            let step = match interaction(x.kind, y.kind) {
                Interaction::UnifyVars => unify_variables(&xv, &yv)?,
                Interaction::Compatible => continue,
                Interaction::NullifyLeft => unify_variables(&xv, &Variables::empty())?,
                Interaction::NullifyRight => unify_variables(&yv, &Variables::empty())?,
            };
            sub = compose(&sub, &step)?;
        }
    }

    // Kinds present on one side only unify with the empty set.
    let kinds1: Vec<ComponentKind> = c1.iter().map(|c| c.kind).collect();
    let kinds2: Vec<ComponentKind> = c2.iter().map(|c| c.kind).collect();
    for x in c1.iter().filter(|x| !kinds2.contains(&x.kind)) {
        let step = unify_variables(&sub.apply_variables(&x.variables), &Variables::empty())?;
        sub = compose(&sub, &step)?;
    }
    for y in c2.iter().filter(|y| !kinds1.contains(&y.kind)) {
        let step = unify_variables(&sub.apply_variables(&y.variables), &Variables::empty())?;
        sub = compose(&sub, &step)?;
    }

    Ok(sub)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::StateVar;
    use meridian_foundation::NodeId;

    fn var(name: &str) -> StateVar {
        StateVar::new(name, NodeId(0))
    }

    fn read(names: &[&str]) -> Effect {
        Effect::read(Variables::concrete(names.iter().map(|n| var(n)).collect()))
    }

    #[test]
    fn test_print_equal_effects_unify_empty() {
        let a = read(&["x", "y"]);
        let b = Effect::concrete(vec![EffectComponent::new(
            ComponentKind::Read,
            Variables::union(vec![
                Variables::concrete(vec![var("y")]),
                Variables::concrete(vec![var("x")]),
            ]),
        )]);
        assert!(unify(&a, &b).unwrap().is_empty());
    }

    #[test]
    fn test_quantified_binds_to_concrete() {
        let sub = unify(&Effect::quantified("e1"), &read(&["x"])).unwrap();
        assert_eq!(sub.apply(&Effect::quantified("e1")), read(&["x"]));
    }

    #[test]
    fn test_occurs_check_fails() {
        let arrow = Effect::arrow(vec![Effect::quantified("e1")], Effect::pure());
        let err = unify(&Effect::quantified("e1"), &arrow).unwrap_err();
        assert!(err.any(&|k| matches!(k, ErrorKind::CyclicalBinding { .. })));
    }

    #[test]
    fn test_arrow_vs_concrete_is_kind_mismatch() {
        let arrow = Effect::arrow(vec![Effect::pure()], Effect::pure());
        let err = unify(&arrow, &read(&["x"])).unwrap_err();
        assert!(err.any(&|k| matches!(k, ErrorKind::EffectKindMismatch { .. })));
    }

    #[test]
    fn test_same_kind_unifies_variables() {
        let sub = unify(&read(&["x"]), &Effect::read(Variables::quantified("r1"))).unwrap();
        assert_eq!(
            sub.apply_variables(&Variables::quantified("r1")),
            Variables::concrete(vec![var("x")])
        );
    }

    #[test]
    fn test_concrete_variable_disagreement_fails() {
        let err = unify(&read(&["x"]), &read(&["y"])).unwrap_err();
        assert!(err.any(&|k| matches!(k, ErrorKind::VariablesMismatch { .. })));
    }

    #[test]
    fn test_compatible_kinds_impose_no_constraint() {
        // Read['x'] & Update[u1]  vs  Read[r2] & Update['y']:
        // the cross pairs (Read/Update) are compatible; only the
        // same-kind pairs bind.
        let a = Effect::concrete(vec![
            EffectComponent::new(ComponentKind::Read, Variables::concrete(vec![var("x")])),
            EffectComponent::new(ComponentKind::Update, Variables::quantified("u1")),
        ]);
        let b = Effect::concrete(vec![
            EffectComponent::new(ComponentKind::Read, Variables::quantified("r2")),
            EffectComponent::new(ComponentKind::Update, Variables::concrete(vec![var("y")])),
        ]);
        let sub = unify(&a, &b).unwrap();
        assert_eq!(
            sub.apply_variables(&Variables::quantified("r2")),
            Variables::concrete(vec![var("x")])
        );
        assert_eq!(
            sub.apply_variables(&Variables::quantified("u1")),
            Variables::concrete(vec![var("y")])
        );
    }

    #[test]
    fn test_update_dominates_temporal() {
        // Update['x'] vs Temporal[t1]: the temporal side is nullified,
        // and Update (present on one side only) must also empty — which
        // fails against the concrete 'x'.
        let update = Effect::update(Variables::concrete(vec![var("x")]));
        let temporal = Effect::temporal(Variables::quantified("t1"));
        assert!(unify(&update, &temporal).is_err());

        // With a quantified update side both empty out.
        let update_q = Effect::update(Variables::quantified("u1"));
        let sub = unify(&update_q, &temporal).unwrap();
        assert!(sub
            .apply_variables(&Variables::quantified("t1"))
            .is_empty_concrete());
        assert!(sub
            .apply_variables(&Variables::quantified("u1"))
            .is_empty_concrete());
    }

    #[test]
    fn test_missing_kind_unifies_with_empty() {
        // Pure vs Read[r1] & Temporal[t1]: both sig variables empty out.
        let sig = Effect::concrete(vec![
            EffectComponent::new(ComponentKind::Read, Variables::quantified("r1")),
            EffectComponent::new(ComponentKind::Temporal, Variables::quantified("t1")),
        ]);
        let sub = unify(&Effect::pure(), &sig).unwrap();
        assert!(sub
            .apply_variables(&Variables::quantified("r1"))
            .is_empty_concrete());
        assert!(sub
            .apply_variables(&Variables::quantified("t1"))
            .is_empty_concrete());
    }

    #[test]
    fn test_union_of_unions_unsupported() {
        let u1 = Variables::union(vec![
            Variables::quantified("a"),
            Variables::quantified("b"),
        ]);
        let u2 = Variables::union(vec![
            Variables::quantified("c"),
            Variables::quantified("d"),
        ]);
        let err = unify_variables(&u1, &u2).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::UnsupportedUnions));
    }

    #[test]
    fn test_union_against_concrete_unifies_members() {
        let union = Variables::union(vec![
            Variables::quantified("a"),
            Variables::quantified("b"),
        ]);
        let concrete = Variables::concrete(vec![var("x")]);
        let sub = unify_variables(&union, &concrete).unwrap();
        assert_eq!(
            sub.apply_variables(&Variables::quantified("a")),
            Variables::concrete(vec![var("x")])
        );
        assert_eq!(
            sub.apply_variables(&Variables::quantified("b")),
            Variables::concrete(vec![var("x")])
        );
    }

    #[test]
    fn test_tuple_unpacking_combines_kind_wise() {
        // (Read['s'], Update['t']) => Pure  vs  (Read[r1] & Update[u1]) => Pure
        let actual = Effect::arrow(
            vec![read(&["s"]), Effect::update(Variables::concrete(vec![var("t")]))],
            Effect::pure(),
        );
        let sig = Effect::arrow(
            vec![Effect::concrete(vec![
                EffectComponent::new(ComponentKind::Read, Variables::quantified("r1")),
                EffectComponent::new(ComponentKind::Update, Variables::quantified("u1")),
            ])],
            Effect::pure(),
        );
        let sub = unify(&actual, &sig).unwrap();
        assert_eq!(
            sub.apply_variables(&Variables::quantified("r1")),
            Variables::concrete(vec![var("s")])
        );
        assert_eq!(
            sub.apply_variables(&Variables::quantified("u1")),
            Variables::concrete(vec![var("t")])
        );
    }

    #[test]
    fn test_tuple_unpacking_requires_concrete_singleton() {
        let actual = Effect::arrow(vec![read(&["s"]), Effect::pure()], Effect::pure());
        let sig = Effect::arrow(vec![Effect::quantified("e1")], Effect::pure());
        let err = unify(&actual, &sig).unwrap_err();
        assert!(err.any(&|k| matches!(k, ErrorKind::ArityMismatch { expected: 2, got: 1 })));
    }

    #[test]
    fn test_hash_canonicalization_unifies_fixpoint_arrows() {
        // (Read[a, b]) => Read[a, b]  vs  (Read[c]) => Read[c]
        let left_vars = Variables::union(vec![
            Variables::quantified("a"),
            Variables::quantified("b"),
        ]);
        let left = Effect::arrow(
            vec![Effect::read(left_vars.clone())],
            Effect::read(left_vars),
        );
        let right = Effect::arrow(
            vec![Effect::read(Variables::quantified("c"))],
            Effect::read(Variables::quantified("c")),
        );

        let sub = unify(&left, &right).unwrap();
        let a = flatten_unions(&sub.apply_variables(&Variables::quantified("a")));
        let b = flatten_unions(&sub.apply_variables(&Variables::quantified("b")));
        let c = flatten_unions(&sub.apply_variables(&Variables::quantified("c")));
        assert_eq!(a, b, "both hashed names resolve the same way");
        assert_eq!(a, c, "the hash variable links both arrows");
    }

    #[test]
    fn test_unification_symmetry() {
        let cases = vec![
            (Effect::quantified("e1"), read(&["x"])),
            (read(&["x"]), read(&["x"])),
            (
                Effect::read(Variables::quantified("r1")),
                Effect::concrete(vec![
                    EffectComponent::new(ComponentKind::Read, Variables::concrete(vec![var("x")])),
                    EffectComponent::new(ComponentKind::Update, Variables::quantified("u1")),
                ]),
            ),
            (read(&["x"]), read(&["y"])),
        ];

        for (a, b) in cases {
            let forward = unify(&a, &b);
            let backward = unify(&b, &a);
            assert_eq!(
                forward.is_ok(),
                backward.is_ok(),
                "symmetry broken for {} and {}",
                a,
                b
            );
        }
    }
}
