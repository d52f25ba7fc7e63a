//! Built-in operator signatures.
//!
//! A signature is an arity-indexed effect template: given the number of
//! arguments at a call site, it produces an arrow effect whose
//! quantified variables the inferrer freshens per instantiation. Arity
//! matters because operators like `and`, `or`, and the constructors are
//! variadic.
//!
//! Three propagation families cover most of the table:
//!
//! - **Read/Temporal** — pure operators: they add no effect of their own
//!   and forward whatever their arguments read or reference temporally.
//! - **Read/Update/Temporal** — `and` / `or`, which combine both state
//!   predicates and actions.
//! - **Read/Update** — action combinators (`actionAll`, `actionAny`,
//!   `then`).
//!
//! `assign` is special: it converts its first argument's Read into an
//! Update. `ite` lets both branches update but keeps the condition
//! update-free. Iterators and quantifiers take an arrow over the element
//! effect.
//!
//! Scheduling semantics of the lazy operators (short-circuiting,
//! single-branch `ite`, `actionAny` snapshot/restore, `actionAll`
//! commit-or-revert, the state shift of `then`) live in the evaluator;
//! only their effect shapes are declared here.

use std::collections::HashMap;

use crate::effect::{ComponentKind, Effect, EffectComponent, Variables};
use crate::simplify::simplify;

#[derive(Clone, Copy)]
enum Signature {
    /// Params carry one quantified set variable per kind; the result
    /// unions them kind-wise.
    Propagate(&'static [ComponentKind]),
    /// Hand-written shape.
    Fixed(fn(usize) -> Effect),
}

const READ_TEMPORAL: &[ComponentKind] = &[ComponentKind::Read, ComponentKind::Temporal];
const READ_UPDATE: &[ComponentKind] = &[ComponentKind::Read, ComponentKind::Update];
const READ_UPDATE_TEMPORAL: &[ComponentKind] = &[
    ComponentKind::Read,
    ComponentKind::Update,
    ComponentKind::Temporal,
];

/// The table of built-in operator signatures.
pub struct SignatureTable {
    table: HashMap<&'static str, Signature>,
    /// Natural arity of fixed-arity operators, for bare (unapplied)
    /// references.
    arities: HashMap<&'static str, usize>,
}

impl SignatureTable {
    pub fn new() -> Self {
        let mut table: HashMap<&'static str, Signature> = HashMap::new();
        let mut arities: HashMap<&'static str, usize> = HashMap::new();

        let pure_binary = [
            "iadd", "isub", "imul", "idiv", "imod", "ipow", "ilt", "ilte", "igt", "igte", "eq",
            "neq", "iff", "implies", "item", "field", "range", "contains", "in", "union",
            "intersect", "exclude", "append", "concat", "get",
        ];
        for op in pure_binary {
            table.insert(op, Signature::Propagate(READ_TEMPORAL));
            arities.insert(op, 2);
        }

        let pure_unary = ["iuminus", "not", "size", "length", "head", "tail", "indices", "keys"];
        for op in pure_unary {
            table.insert(op, Signature::Propagate(READ_TEMPORAL));
            arities.insert(op, 1);
        }

        // Variadic constructors: no natural arity for bare references.
        for op in ["Set", "List", "Map", "Rec", "Tup"] {
            table.insert(op, Signature::Propagate(READ_TEMPORAL));
        }
        table.insert("put", Signature::Propagate(READ_TEMPORAL));
        arities.insert("put", 3);

        for op in ["and", "or"] {
            table.insert(op, Signature::Propagate(READ_UPDATE_TEMPORAL));
        }

        for op in ["actionAll", "actionAny"] {
            table.insert(op, Signature::Propagate(READ_UPDATE));
        }
        table.insert("then", Signature::Propagate(READ_UPDATE));
        arities.insert("then", 2);

        table.insert("assign", Signature::Fixed(assign_signature));
        arities.insert("assign", 2);
        table.insert("ite", Signature::Fixed(ite_signature));
        arities.insert("ite", 3);

        for op in ["map", "filter", "forall", "exists"] {
            table.insert(op, Signature::Fixed(iterator_signature));
            arities.insert(op, 2);
        }
        table.insert("fold", Signature::Fixed(fold_signature));
        arities.insert("fold", 3);

        Self { table, arities }
    }

    /// Effect template for `op` applied to `arity` arguments.
    pub fn effect_for(&self, op: &str, arity: usize) -> Option<Effect> {
        match self.table.get(op)? {
            Signature::Propagate(kinds) => Some(propagate(kinds, arity)),
            Signature::Fixed(build) => Some(build(arity)),
        }
    }

    /// Effect template for a bare (unapplied) reference to `op`; only
    /// fixed-arity operators have one.
    pub fn bare(&self, op: &str) -> Option<Effect> {
        let arity = *self.arities.get(op)?;
        self.effect_for(op, arity)
    }

    pub fn contains(&self, op: &str) -> bool {
        self.table.contains_key(op)
    }
}

impl Default for SignatureTable {
    fn default() -> Self {
        Self::new()
    }
}

fn kind_prefix(kind: ComponentKind) -> &'static str {
    match kind {
        ComponentKind::Read => "r",
        ComponentKind::Update => "u",
        ComponentKind::Temporal => "t",
    }
}

fn quantified(kind: ComponentKind, i: usize) -> Variables {
    Variables::quantified(format!("{}{}", kind_prefix(kind), i))
}

/// `(K1[k1_1] & ..., ..., K1[k1_n] & ...) => K1[k1_1, ..., k1_n] & ...`
fn propagate(kinds: &[ComponentKind], arity: usize) -> Effect {
    let params: Vec<Effect> = (1..=arity)
        .map(|i| {
            Effect::concrete(
                kinds
                    .iter()
                    .map(|&kind| EffectComponent::new(kind, quantified(kind, i)))
                    .collect(),
            )
        })
        .collect();

    let result = Effect::concrete(
        kinds
            .iter()
            .map(|&kind| {
                EffectComponent::new(
                    kind,
                    Variables::union((1..=arity).map(|i| quantified(kind, i)).collect()),
                )
            })
            .collect(),
    );

    Effect::arrow(params, simplify(&result))
}

/// `(Read[r1], Read[r2] & Temporal[t2]) => Read[r2] & Update[r1] & Temporal[t2]`
///
/// The first argument is the assignment target: its read effect is
/// converted into an update in the result.
fn assign_signature(_arity: usize) -> Effect {
    Effect::arrow(
        vec![
            Effect::read(Variables::quantified("r1")),
            Effect::concrete(vec![
                EffectComponent::new(ComponentKind::Read, Variables::quantified("r2")),
                EffectComponent::new(ComponentKind::Temporal, Variables::quantified("t2")),
            ]),
        ],
        Effect::concrete(vec![
            EffectComponent::new(ComponentKind::Read, Variables::quantified("r2")),
            EffectComponent::new(ComponentKind::Update, Variables::quantified("r1")),
            EffectComponent::new(ComponentKind::Temporal, Variables::quantified("t2")),
        ]),
    )
}

/// The condition may read but not update; both branches may update.
fn ite_signature(_arity: usize) -> Effect {
    let branch = |i: usize| {
        Effect::concrete(vec![
            EffectComponent::new(ComponentKind::Read, quantified(ComponentKind::Read, i)),
            EffectComponent::new(ComponentKind::Update, quantified(ComponentKind::Update, i)),
            EffectComponent::new(ComponentKind::Temporal, quantified(ComponentKind::Temporal, i)),
        ])
    };
    Effect::arrow(
        vec![
            Effect::concrete(vec![
                EffectComponent::new(ComponentKind::Read, quantified(ComponentKind::Read, 1)),
                EffectComponent::new(ComponentKind::Temporal, quantified(ComponentKind::Temporal, 1)),
            ]),
            branch(2),
            branch(3),
        ],
        Effect::concrete(vec![
            EffectComponent::new(
                ComponentKind::Read,
                Variables::union((1..=3).map(|i| quantified(ComponentKind::Read, i)).collect()),
            ),
            EffectComponent::new(
                ComponentKind::Update,
                Variables::union((2..=3).map(|i| quantified(ComponentKind::Update, i)).collect()),
            ),
            EffectComponent::new(
                ComponentKind::Temporal,
                Variables::union(
                    (1..=3).map(|i| quantified(ComponentKind::Temporal, i)).collect(),
                ),
            ),
        ]),
    )
}

/// `(Read[r1] & Temporal[t1], (Read[r1] & Temporal[t1]) => Read[r2] & Temporal[t2])
///   => Read[r1, r2] & Temporal[t1, t2]`
///
/// The callback receives the collection's element effect; its own reads
/// join the result.
fn iterator_signature(_arity: usize) -> Effect {
    let element = Effect::concrete(vec![
        EffectComponent::new(ComponentKind::Read, Variables::quantified("r1")),
        EffectComponent::new(ComponentKind::Temporal, Variables::quantified("t1")),
    ]);
    let callback_result = Effect::concrete(vec![
        EffectComponent::new(ComponentKind::Read, Variables::quantified("r2")),
        EffectComponent::new(ComponentKind::Temporal, Variables::quantified("t2")),
    ]);
    Effect::arrow(
        vec![
            element.clone(),
            Effect::arrow(vec![element], callback_result),
        ],
        Effect::concrete(vec![
            EffectComponent::new(
                ComponentKind::Read,
                Variables::union(vec![
                    Variables::quantified("r1"),
                    Variables::quantified("r2"),
                ]),
            ),
            EffectComponent::new(
                ComponentKind::Temporal,
                Variables::union(vec![
                    Variables::quantified("t1"),
                    Variables::quantified("t2"),
                ]),
            ),
        ]),
    )
}

/// Like [`iterator_signature`], with an accumulator threaded through:
/// the callback takes `(accumulator, element)`.
fn fold_signature(_arity: usize) -> Effect {
    let element = Effect::concrete(vec![
        EffectComponent::new(ComponentKind::Read, Variables::quantified("r1")),
        EffectComponent::new(ComponentKind::Temporal, Variables::quantified("t1")),
    ]);
    let accumulator = Effect::concrete(vec![
        EffectComponent::new(ComponentKind::Read, Variables::quantified("r2")),
        EffectComponent::new(ComponentKind::Temporal, Variables::quantified("t2")),
    ]);
    let callback_result = Effect::concrete(vec![
        EffectComponent::new(ComponentKind::Read, Variables::quantified("r3")),
        EffectComponent::new(ComponentKind::Temporal, Variables::quantified("t3")),
    ]);
    Effect::arrow(
        vec![
            element.clone(),
            accumulator.clone(),
            Effect::arrow(vec![accumulator, element], callback_result),
        ],
        Effect::concrete(vec![
            EffectComponent::new(
                ComponentKind::Read,
                Variables::union(
                    (1..=3).map(|i| quantified(ComponentKind::Read, i)).collect(),
                ),
            ),
            EffectComponent::new(
                ComponentKind::Temporal,
                Variables::union(
                    (1..=3).map(|i| quantified(ComponentKind::Temporal, i)).collect(),
                ),
            ),
        ]),
    )
}
