//! Effect inference.
//!
//! Walks the IR in strict post-order and produces an effect scheme for
//! every reachable expression id, or a tree-structured error. The
//! inferrer owns all mutable state of a run: the running substitution,
//! the result and error maps, and the fresh-name generator. Callers
//! receive the final maps by value.
//!
//! # Error propagation
//!
//! Errors are recorded against the expression id under evaluation. A
//! parent whose child errored contributes no result and no additional
//! error; sibling subtrees still infer, so one run reports every
//! independent failure.
//!
//! # Determinism
//!
//! Traversal order follows IR order, fresh names come from a monotone
//! counter reset per run, and both output maps preserve insertion
//! order. Two runs over the same IR produce identical output, fresh
//! names included.

use indexmap::IndexMap;
use std::collections::BTreeSet;
use tracing::{debug, trace};

use meridian_foundation::NodeId;
use meridian_ir::{BindingKind, Def, Expr, ExprKind, Lookup, Module, OpDef, Param, ScopeTable};

use crate::builtins::SignatureTable;
use crate::effect::{Effect, EffectScheme, StateVar, Variables};
use crate::error::{ErrorKind, InferenceError};
use crate::simplify::simplify;
use crate::subst::{compose, Binding, Substitution};
use crate::unify::unify;

/// The two result maps of an inference run. Iteration order is
/// traversal order.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct InferenceOutput {
    pub schemes: IndexMap<NodeId, EffectScheme>,
    pub errors: IndexMap<NodeId, InferenceError>,
}

impl InferenceOutput {
    /// Scheme stored for an id.
    ///
    /// # Panics
    /// Panics if the id has no entry; asking for an id that was never
    /// inferred is a programmer-contract violation, not an inference
    /// failure.
    pub fn scheme(&self, id: NodeId) -> &EffectScheme {
        match self.schemes.get(&id) {
            Some(scheme) => scheme,
            None => panic!("no effect scheme recorded for {}", id),
        }
    }

    pub fn get(&self, id: NodeId) -> Option<&EffectScheme> {
        self.schemes.get(&id)
    }

    /// Effect stored for an id; panics like [`InferenceOutput::scheme`].
    pub fn effect(&self, id: NodeId) -> &Effect {
        &self.scheme(id).effect
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Infer effects for every expression reachable from `module`.
pub fn infer_effects(
    scopes: &ScopeTable,
    builtins: &SignatureTable,
    module: &Module,
) -> InferenceOutput {
    EffectInferrer::new(scopes, builtins).infer(module)
}

/// Deterministic fresh-name generator, reset per inference run.
#[derive(Debug, Default)]
struct FreshNames {
    counter: u64,
}

impl FreshNames {
    fn effect(&mut self) -> String {
        let n = self.counter;
        self.counter += 1;
        format!("e{}", n)
    }

    fn entity(&mut self) -> String {
        let n = self.counter;
        self.counter += 1;
        format!("v{}", n)
    }
}

/// One inference run over one module tree.
pub struct EffectInferrer<'a> {
    scopes: &'a ScopeTable,
    builtins: &'a SignatureTable,
    subst: Substitution,
    schemes: IndexMap<NodeId, EffectScheme>,
    errors: IndexMap<NodeId, InferenceError>,
    fresh: FreshNames,
}

impl<'a> EffectInferrer<'a> {
    pub fn new(scopes: &'a ScopeTable, builtins: &'a SignatureTable) -> Self {
        Self {
            scopes,
            builtins,
            subst: Substitution::empty(),
            schemes: IndexMap::new(),
            errors: IndexMap::new(),
            fresh: FreshNames::default(),
        }
    }

    /// Run inference and hand the result maps back by value.
    pub fn infer(mut self, module: &Module) -> InferenceOutput {
        self.visit_module(module);
        InferenceOutput {
            schemes: self.schemes,
            errors: self.errors,
        }
    }

    fn visit_module(&mut self, module: &Module) {
        debug!(module = %module.name, "inferring effects");
        for def in &module.defs {
            self.visit_def(def);
        }
    }

    fn visit_def(&mut self, def: &Def) {
        match def {
            Def::Op(op) => {
                self.infer_opdef(op);
            }
            Def::Assume { id, expr, .. } => {
                if let Some(scheme) = self.infer_expr(expr) {
                    self.schemes.insert(*id, scheme);
                }
            }
            Def::Instance { overrides, .. } => {
                for (_, expr) in overrides {
                    self.infer_expr(expr);
                }
            }
            Def::Module(nested) => self.visit_module(nested),
            Def::Const { .. } | Def::Var { .. } | Def::TypeDef { .. } | Def::Import { .. } => {}
        }
    }

    fn infer_opdef(&mut self, op: &OpDef) -> Option<EffectScheme> {
        let body = self.infer_expr(&op.body)?;

        // The qualifier does not affect inference; parameters turn the
        // definition into an arrow the same way a lambda does.
        let scheme = if op.params.is_empty() {
            self.refresh(&body)
        } else {
            self.close_over_params(&op.params, body.effect)
        };

        debug!(def = %op.name, effect = %scheme.effect, "inferred definition effect");
        self.schemes.insert(op.id, scheme.clone());
        Some(scheme)
    }

    fn infer_expr(&mut self, expr: &Expr) -> Option<EffectScheme> {
        trace!(id = %expr.id, "visiting expression");
        let scheme = match &expr.kind {
            ExprKind::Int(_) | ExprKind::Bool(_) | ExprKind::Str(_) => {
                EffectScheme::mono(Effect::pure())
            }
            ExprKind::Name(name) => self.infer_name(expr.id, name)?,
            ExprKind::App { op, args } => self.infer_app(expr.id, op, args)?,
            ExprKind::Lambda { params, body } => self.infer_lambda(params, body)?,
            ExprKind::Let { def, body } => self.infer_let(def, body)?,
        };
        // Results are stored fully substituted at the moment of
        // insertion.
        let scheme = self.refresh(&scheme);
        self.schemes.insert(expr.id, scheme.clone());
        Some(scheme)
    }

    fn infer_name(&mut self, id: NodeId, name: &str) -> Option<EffectScheme> {
        match self.scopes.lookup(name, id) {
            Lookup::NotFound => {
                self.record_error(
                    id,
                    InferenceError::new(name, ErrorKind::NameNotFound(name.to_string())),
                );
                None
            }
            Lookup::Found { kind, def_id } => match kind {
                // The distinguished per-parameter variable: deterministic,
                // so the enclosing lambda can pick it up without fresh-var
                // churn.
                BindingKind::Param => Some(EffectScheme::mono(Effect::quantified(
                    param_variable(name, def_id),
                ))),
                BindingKind::Const | BindingKind::TypeDef => {
                    Some(EffectScheme::mono(Effect::pure()))
                }
                BindingKind::Var => Some(EffectScheme::mono(Effect::read(Variables::concrete(
                    vec![StateVar::new(name, id)],
                )))),
                BindingKind::Val | BindingKind::Def => {
                    if let Some(scheme) = self.schemes.get(&def_id).cloned() {
                        let instance = self.instantiate(&scheme);
                        Some(EffectScheme::mono(instance))
                    } else if let Some(sig) = self.builtins.bare(name) {
                        let instance = self.instantiate(&EffectScheme::generalize_all(sig));
                        Some(EffectScheme::mono(instance))
                    } else {
                        self.record_error(
                            id,
                            InferenceError::new(name, ErrorKind::MissingSignature(name.to_string())),
                        );
                        None
                    }
                }
            },
        }
    }

    fn infer_app(&mut self, id: NodeId, op: &str, args: &[Expr]) -> Option<EffectScheme> {
        let mut child_failed = false;
        for arg in args {
            if self.infer_expr(arg).is_none() {
                child_failed = true;
            }
        }
        if child_failed {
            return None;
        }

        // Fresh instances of the argument schemes, under the running
        // substitution.
        let instances: Vec<Effect> = args
            .iter()
            .map(|arg| {
                let scheme = self
                    .schemes
                    .get(&arg.id)
                    .cloned()
                    .unwrap_or_else(|| panic!("no scheme recorded for argument {}", arg.id));
                self.instantiate(&scheme)
            })
            .collect();

        let result_name = self.fresh.effect();
        let actual = Effect::arrow(instances, Effect::quantified(result_name.as_str()));

        // The signature is taken under the running substitution so that
        // operators already constrained at earlier sites (parameters in
        // particular) meet this site with their refined effect.
        let signature = self.signature_for(id, op, args.len())?;
        let signature = self.subst.apply(&signature);

        let step = match unify(&actual, &signature) {
            Ok(step) => step,
            Err(err) => {
                self.record_error(
                    id,
                    InferenceError::wrap(
                        format!("applying {}", op),
                        ErrorKind::Context(format!(
                            "couldn't infer the effect of this {} application",
                            op
                        )),
                        vec![err],
                    ),
                );
                return None;
            }
        };

        self.subst = match compose(&self.subst, &step) {
            Ok(sub) => sub,
            Err(err) => {
                self.record_error(id, err);
                return None;
            }
        };

        // Refresh the argument schemes so the result map holds the most
        // refined effect known for every id.
        for arg in args {
            if let Some(old) = self.schemes.get(&arg.id).cloned() {
                let refreshed = self.refresh(&old);
                self.schemes.insert(arg.id, refreshed);
            }
        }

        let result = simplify(&self.subst.apply(&Effect::quantified(result_name.as_str())));
        Some(EffectScheme::mono(result))
    }

    /// The effect an operator is applied at: built-in table first, then
    /// the lookup facility.
    fn signature_for(&mut self, id: NodeId, op: &str, arity: usize) -> Option<Effect> {
        if op == "_" {
            return Some(Effect::quantified(self.fresh.effect()));
        }

        if let Some(sig) = self.builtins.effect_for(op, arity) {
            return Some(self.instantiate(&EffectScheme::generalize_all(sig)));
        }

        match self.scopes.lookup(op, id) {
            Lookup::NotFound => {
                self.record_error(
                    id,
                    InferenceError::new(op, ErrorKind::NameNotFound(op.to_string())),
                );
                None
            }
            Lookup::Found { kind, def_id } => match kind {
                BindingKind::Param => Some(Effect::quantified(param_variable(op, def_id))),
                // Applying a state variable or constant: the unifier
                // reports the kind mismatch at this site.
                BindingKind::Var => Some(Effect::read(Variables::concrete(vec![StateVar::new(
                    op, id,
                )]))),
                BindingKind::Const | BindingKind::TypeDef => Some(Effect::pure()),
                BindingKind::Val | BindingKind::Def => {
                    match self.schemes.get(&def_id).cloned() {
                        Some(scheme) => Some(self.instantiate(&scheme)),
                        None => {
                            self.record_error(
                                id,
                                InferenceError::new(
                                    op,
                                    ErrorKind::MissingSignature(op.to_string()),
                                ),
                            );
                            None
                        }
                    }
                }
            },
        }
    }

    fn infer_lambda(&mut self, params: &[Param], body: &Expr) -> Option<EffectScheme> {
        let body_scheme = self.infer_expr(body)?;
        Some(self.close_over_params(params, body_scheme.effect))
    }

    fn infer_let(&mut self, def: &OpDef, body: &Expr) -> Option<EffectScheme> {
        self.infer_opdef(def)?;
        let body_scheme = self.infer_expr(body)?;
        Some(self.refresh(&body_scheme))
    }

    /// Build the arrow scheme of a parameterized definition. Quantifiers
    /// are the free names of the parameter effects only — the result
    /// stays fixed across call sites while parameters freshen.
    fn close_over_params(&mut self, params: &[Param], body_effect: Effect) -> EffectScheme {
        let param_effects: Vec<Effect> = params
            .iter()
            .map(|p| {
                simplify(
                    &self
                        .subst
                        .apply(&Effect::quantified(param_variable(&p.name, p.id))),
                )
            })
            .collect();

        let mut effect_vars = BTreeSet::new();
        let mut entity_vars = BTreeSet::new();
        for effect in &param_effects {
            effect_vars.extend(effect.effect_names());
            entity_vars.extend(effect.entity_names());
        }

        let arrow = simplify(
            &self
                .subst
                .apply(&Effect::arrow(param_effects, body_effect)),
        );

        EffectScheme {
            effect_vars,
            entity_vars,
            effect: arrow,
        }
    }

    /// Replace every quantified name of a scheme with a freshly minted
    /// variable. The scheme is refreshed first so free names reflect
    /// everything the running substitution has learned since it was
    /// stored.
    fn instantiate(&mut self, scheme: &EffectScheme) -> Effect {
        let scheme = self.refresh(scheme);
        if scheme.effect_vars.is_empty() && scheme.entity_vars.is_empty() {
            return scheme.effect.clone();
        }

        let mut bindings = Vec::new();
        for name in &scheme.effect_vars {
            bindings.push(Binding::Effect {
                name: name.clone(),
                value: Effect::quantified(self.fresh.effect()),
            });
        }
        for name in &scheme.entity_vars {
            bindings.push(Binding::Entity {
                name: name.clone(),
                value: Variables::quantified(self.fresh.entity()),
            });
        }
        Substitution::from_bindings(bindings).apply(&scheme.effect)
    }

    /// Re-apply the running substitution to a stored scheme, keeping
    /// only the quantifiers that remain free in the refined effect.
    fn refresh(&self, scheme: &EffectScheme) -> EffectScheme {
        let effect = simplify(&self.subst.apply(&scheme.effect));
        let effect_names = effect.effect_names();
        let entity_names = effect.entity_names();

        EffectScheme {
            effect_vars: scheme
                .effect_vars
                .iter()
                .filter(|n| effect_names.contains(*n))
                .cloned()
                .collect(),
            entity_vars: scheme
                .entity_vars
                .iter()
                .filter(|n| entity_names.contains(*n))
                .cloned()
                .collect(),
            effect,
        }
    }

    fn record_error(&mut self, id: NodeId, err: InferenceError) {
        self.errors.insert(id, err);
    }
}

/// The distinguished effect variable of a parameter: `e_<name>_<id>`.
fn param_variable(name: &str, def_id: NodeId) -> String {
    format!("e_{}_{}", name, def_id.as_u64())
}
