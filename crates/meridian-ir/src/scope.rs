//! Scope tree and name lookup.
//!
//! # What This Pass Does
//!
//! 1. **Builds a scope tree** from module structure: one scope per
//!    module, one per lambda (its parameters, extent = the lambda body),
//!    one per let (the local definition, extent = the let body).
//! 2. **Maps every expression id** to its innermost enclosing scope.
//! 3. **Answers lookups** — given a name and the id of the expression
//!    referencing it, walk from the innermost scope to the module root;
//!    the innermost binding wins.
//!
//! # What This Pass Does NOT Do
//!
//! - **No import/instance resolution** — cross-module references are
//!   resolved by an outer layer before inference runs.
//! - **No effect or type checking** — this pass only records who binds
//!   what.
//!
//! A missing name yields [`Lookup::NotFound`], never a panic: reporting
//! unresolved names with a proper diagnostic is the caller's job.

use meridian_foundation::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::ir::expr::{Expr, ExprKind, Param};
use crate::ir::module::{Def, Module, OpDef, Qualifier};

/// What kind of binding a name resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BindingKind {
    Param,
    Const,
    Var,
    Val,
    Def,
    TypeDef,
}

/// Result of a name lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lookup {
    Found { kind: BindingKind, def_id: NodeId },
    NotFound,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct Binding {
    kind: BindingKind,
    def_id: NodeId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Scope {
    parent: Option<usize>,
    bindings: HashMap<String, Binding>,
}

/// Scope tree over one module, with per-expression scope assignment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScopeTable {
    scopes: Vec<Scope>,
    /// Innermost scope of each expression id.
    scope_of: HashMap<NodeId, usize>,
}

impl ScopeTable {
    /// Build the scope tree for a module.
    pub fn build(module: &Module) -> Self {
        let mut table = ScopeTable {
            scopes: Vec::new(),
            scope_of: HashMap::new(),
        };
        table.enter_module(module, None);
        table
    }

    /// Resolve `name` as seen from the expression `at`.
    ///
    /// Walks from the innermost scope containing `at` to the root;
    /// shadowing is resolved innermost-wins. Returns
    /// [`Lookup::NotFound`] for unknown names and for ids this table
    /// never saw.
    pub fn lookup(&self, name: &str, at: NodeId) -> Lookup {
        let Some(&start) = self.scope_of.get(&at) else {
            return Lookup::NotFound;
        };

        let mut current = Some(start);
        while let Some(idx) = current {
            let scope = &self.scopes[idx];
            if let Some(binding) = scope.bindings.get(name) {
                return Lookup::Found {
                    kind: binding.kind,
                    def_id: binding.def_id,
                };
            }
            current = scope.parent;
        }
        Lookup::NotFound
    }

    fn new_scope(&mut self, parent: Option<usize>) -> usize {
        self.scopes.push(Scope {
            parent,
            bindings: HashMap::new(),
        });
        self.scopes.len() - 1
    }

    fn bind(&mut self, scope: usize, name: &str, kind: BindingKind, def_id: NodeId) {
        self.scopes[scope]
            .bindings
            .insert(name.to_string(), Binding { kind, def_id });
    }

    fn enter_module(&mut self, module: &Module, parent: Option<usize>) {
        let scope = self.new_scope(parent);

        // All definitions of a module are visible to each other, so
        // register every name before walking any body.
        for def in &module.defs {
            match def {
                Def::Const { id, name, .. } => self.bind(scope, name, BindingKind::Const, *id),
                Def::Var { id, name, .. } => self.bind(scope, name, BindingKind::Var, *id),
                Def::Op(op) => self.bind(scope, &op.name, opdef_kind(op.qualifier), op.id),
                Def::TypeDef { id, name, .. } => self.bind(scope, name, BindingKind::TypeDef, *id),
                Def::Assume { .. } | Def::Import { .. } | Def::Instance { .. } | Def::Module(_) => {}
            }
        }

        for def in &module.defs {
            match def {
                Def::Op(op) => self.enter_opdef(op, scope),
                Def::Assume { expr, .. } => self.enter_expr(expr, scope),
                Def::Instance { overrides, .. } => {
                    for (_, expr) in overrides {
                        self.enter_expr(expr, scope);
                    }
                }
                Def::Module(nested) => self.enter_module(nested, Some(scope)),
                Def::Const { .. } | Def::Var { .. } | Def::TypeDef { .. } | Def::Import { .. } => {}
            }
        }
    }

    fn enter_opdef(&mut self, op: &OpDef, outer: usize) {
        let body_scope = if op.params.is_empty() {
            outer
        } else {
            let scope = self.new_scope(Some(outer));
            self.bind_params(scope, &op.params);
            scope
        };
        self.enter_expr(&op.body, body_scope);
    }

    fn bind_params(&mut self, scope: usize, params: &[Param]) {
        for param in params {
            self.bind(scope, &param.name, BindingKind::Param, param.id);
        }
    }

    fn enter_expr(&mut self, expr: &Expr, scope: usize) {
        self.scope_of.insert(expr.id, scope);

        match &expr.kind {
            ExprKind::Int(_) | ExprKind::Bool(_) | ExprKind::Str(_) | ExprKind::Name(_) => {}

            ExprKind::App { args, .. } => {
                for arg in args {
                    self.enter_expr(arg, scope);
                }
            }

            ExprKind::Lambda { params, body } => {
                // Parameters shadow outer bindings only inside the body.
                let inner = self.new_scope(Some(scope));
                self.bind_params(inner, params);
                self.enter_expr(body, inner);
            }

            ExprKind::Let { def, body } => {
                let inner = self.new_scope(Some(scope));
                self.bind(inner, &def.name, opdef_kind(def.qualifier), def.id);

                // The local definition's own body sees itself only when
                // declared recursive.
                let def_outer = if def.qualifier == Qualifier::DefRec {
                    inner
                } else {
                    scope
                };
                let def_scope = if def.params.is_empty() {
                    def_outer
                } else {
                    let s = self.new_scope(Some(def_outer));
                    self.bind_params(s, &def.params);
                    s
                };
                self.enter_expr(&def.body, def_scope);
                self.enter_expr(body, inner);
            }
        }
    }
}

fn opdef_kind(qualifier: Qualifier) -> BindingKind {
    match qualifier {
        Qualifier::Val | Qualifier::PureVal => BindingKind::Val,
        Qualifier::Def
        | Qualifier::DefRec
        | Qualifier::PureDef
        | Qualifier::Action
        | Qualifier::Run
        | Qualifier::Temporal => BindingKind::Def,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::types::TypeTag;
    use meridian_foundation::NodeId;

    fn id(raw: u64) -> NodeId {
        NodeId(raw)
    }

    /// module m { var s: int; val v = s }
    fn small_module() -> Module {
        let body = Expr::name(id(3), "s");
        Module::new(
            id(10),
            "m",
            vec![
                Def::Var {
                    id: id(1),
                    name: "s".to_string(),
                    ty: TypeTag::Int,
                },
                Def::Op(OpDef::new(id(2), Qualifier::Val, "v", body)),
            ],
        )
    }

    #[test]
    fn test_lookup_var_from_body() {
        let module = small_module();
        let table = ScopeTable::build(&module);

        assert_eq!(
            table.lookup("s", id(3)),
            Lookup::Found {
                kind: BindingKind::Var,
                def_id: id(1)
            }
        );
    }

    #[test]
    fn test_lookup_missing_name() {
        let module = small_module();
        let table = ScopeTable::build(&module);

        assert_eq!(table.lookup("nope", id(3)), Lookup::NotFound);
        // Unknown id: well-formed NotFound, not a panic.
        assert_eq!(table.lookup("s", id(99)), Lookup::NotFound);
    }

    #[test]
    fn test_definitions_see_each_other_regardless_of_order() {
        // val a = b; val b = 1
        let module = Module::new(
            id(10),
            "m",
            vec![
                Def::Op(OpDef::new(id(1), Qualifier::Val, "a", Expr::name(id(2), "b"))),
                Def::Op(OpDef::new(id(3), Qualifier::Val, "b", Expr::int(id(4), 1))),
            ],
        );
        let table = ScopeTable::build(&module);

        assert_eq!(
            table.lookup("b", id(2)),
            Lookup::Found {
                kind: BindingKind::Val,
                def_id: id(3)
            }
        );
    }

    #[test]
    fn test_lambda_param_shadows_module_def() {
        // var x: int; val f = (x) => x
        let lambda = Expr::lambda(
            id(4),
            vec![Param::new(id(2), "x")],
            Expr::name(id(3), "x"),
        );
        let module = Module::new(
            id(10),
            "m",
            vec![
                Def::Var {
                    id: id(1),
                    name: "x".to_string(),
                    ty: TypeTag::Int,
                },
                Def::Op(OpDef::new(id(5), Qualifier::Val, "f", lambda)),
            ],
        );
        let table = ScopeTable::build(&module);

        // Inside the body: the parameter wins.
        assert_eq!(
            table.lookup("x", id(3)),
            Lookup::Found {
                kind: BindingKind::Param,
                def_id: id(2)
            }
        );
        // At the lambda node itself (outside the body): the var wins.
        assert_eq!(
            table.lookup("x", id(4)),
            Lookup::Found {
                kind: BindingKind::Var,
                def_id: id(1)
            }
        );
    }

    #[test]
    fn test_let_binding_visible_in_body_only() {
        // val outer = let val x = 1; x
        let def = OpDef::new(id(2), Qualifier::Val, "x", Expr::int(id(1), 1));
        let let_expr = Expr::let_in(id(4), def, Expr::name(id(3), "x"));
        let module = Module::new(
            id(10),
            "m",
            vec![Def::Op(OpDef::new(id(5), Qualifier::Val, "outer", let_expr))],
        );
        let table = ScopeTable::build(&module);

        assert_eq!(
            table.lookup("x", id(3)),
            Lookup::Found {
                kind: BindingKind::Val,
                def_id: id(2)
            }
        );
        // The definition's own body does not see itself (not defrec).
        assert_eq!(table.lookup("x", id(1)), Lookup::NotFound);
    }

    #[test]
    fn test_defrec_sees_itself() {
        // val outer = let defrec f = f; f  (degenerate but scoping-legal)
        let def = OpDef::new(id(2), Qualifier::DefRec, "f", Expr::name(id(1), "f"));
        let let_expr = Expr::let_in(id(4), def, Expr::name(id(3), "f"));
        let module = Module::new(
            id(10),
            "m",
            vec![Def::Op(OpDef::new(id(5), Qualifier::Val, "outer", let_expr))],
        );
        let table = ScopeTable::build(&module);

        assert_eq!(
            table.lookup("f", id(1)),
            Lookup::Found {
                kind: BindingKind::Def,
                def_id: id(2)
            }
        );
    }

    #[test]
    fn test_nested_module_sees_outer_defs() {
        // module m { var s: int; module inner { val v = s } }
        let inner = Module::new(
            id(20),
            "inner",
            vec![Def::Op(OpDef::new(
                id(2),
                Qualifier::Val,
                "v",
                Expr::name(id(3), "s"),
            ))],
        );
        let module = Module::new(
            id(10),
            "m",
            vec![
                Def::Var {
                    id: id(1),
                    name: "s".to_string(),
                    ty: TypeTag::Int,
                },
                Def::Module(inner),
            ],
        );
        let table = ScopeTable::build(&module);

        assert_eq!(
            table.lookup("s", id(3)),
            Lookup::Found {
                kind: BindingKind::Var,
                def_id: id(1)
            }
        );
    }
}
