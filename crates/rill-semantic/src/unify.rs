//! Unification engine.
//!
//! Implements first-order unification over `Ty` using `ena`'s union-find
//! table, with an occurs check, and a small constraint store for property
//! accesses whose receiver type is not yet known.

use ena::unify::InPlaceUnificationTable;
use rustc_hash::FxHashMap;

use crate::error::{ConstraintOrigin, TypeError};
use crate::ty::{FnTy, ParamTy, Ty, TyVar};

/// A deferred `record.field: ty` constraint.
///
/// Created when a property is read from an expression whose type is still a
/// variable. It is discharged once the receiver resolves to a record.
#[derive(Clone, Debug)]
pub struct FieldConstraint {
    pub record: Ty,
    pub field: String,
    pub ty: Ty,
}

/// The inference context: owns the unification table and the pending
/// field constraints.
pub struct InferCtx {
    table: InPlaceUnificationTable<TyVar>,
    pending_fields: Vec<FieldConstraint>,
}

impl InferCtx {
    pub fn new() -> Self {
        InferCtx {
            table: InPlaceUnificationTable::new(),
            pending_fields: Vec::new(),
        }
    }

    // ── Type Variable Creation ──────────────────────────────────────────

    pub fn fresh_var(&mut self) -> Ty {
        Ty::Var(self.table.new_key(None))
    }

    /// Copy a type built outside this context, replacing each of its
    /// variables with a fresh variable of this context. Occurrences of the
    /// same variable map to the same fresh variable.
    pub fn instantiate(&mut self, ty: &Ty) -> Ty {
        let mut subst = FxHashMap::default();
        self.instantiate_with(ty, &mut subst)
    }

    fn instantiate_with(&mut self, ty: &Ty, subst: &mut FxHashMap<TyVar, Ty>) -> Ty {
        match ty {
            Ty::Var(v) => {
                if let Some(t) = subst.get(v) {
                    return t.clone();
                }
                let fresh = self.fresh_var();
                subst.insert(*v, fresh.clone());
                fresh
            }
            Ty::Con(_) => ty.clone(),
            Ty::Fun(f) => {
                let params = f
                    .params
                    .iter()
                    .map(|(name, p)| {
                        let ty = self.instantiate_with(&p.ty, subst);
                        (
                            name.clone(),
                            ParamTy {
                                ty,
                                optional: p.optional,
                            },
                        )
                    })
                    .collect();
                let ret = Box::new(self.instantiate_with(&f.ret, subst));
                Ty::Fun(FnTy { params, ret })
            }
            Ty::Record(fields) => Ty::Record(
                fields
                    .iter()
                    .map(|(k, t)| (k.clone(), self.instantiate_with(t, subst)))
                    .collect(),
            ),
        }
    }

    // ── Resolution ──────────────────────────────────────────────────────

    /// Resolve a type by following union-find indirection all the way down.
    ///
    /// Unbound variables are normalized to the root key of their class.
    pub fn resolve(&mut self, ty: Ty) -> Ty {
        match ty {
            Ty::Var(v) => match self.table.probe_value(v) {
                Some(inner) => self.resolve(inner),
                None => Ty::Var(self.table.find(v)),
            },
            Ty::Fun(f) => {
                let params = f
                    .params
                    .into_iter()
                    .map(|(name, p)| {
                        let ty = self.resolve(p.ty);
                        (
                            name,
                            ParamTy {
                                ty,
                                optional: p.optional,
                            },
                        )
                    })
                    .collect();
                let ret = Box::new(self.resolve(*f.ret));
                Ty::Fun(FnTy { params, ret })
            }
            Ty::Record(fields) => Ty::Record(
                fields
                    .into_iter()
                    .map(|(k, t)| (k, self.resolve(t)))
                    .collect(),
            ),
            other => other,
        }
    }

    // ── Occurs Check ────────────────────────────────────────────────────

    /// Check if a type variable occurs anywhere within a type.
    pub fn occurs_in(&mut self, var: TyVar, ty: &Ty) -> bool {
        match ty {
            Ty::Var(v) => {
                if self.table.find(*v) == self.table.find(var) {
                    return true;
                }
                match self.table.probe_value(*v) {
                    Some(inner) => self.occurs_in(var, &inner),
                    None => false,
                }
            }
            Ty::Con(_) => false,
            Ty::Fun(f) => {
                f.params.values().any(|p| self.occurs_in(var, &p.ty)) || self.occurs_in(var, &f.ret)
            }
            Ty::Record(fields) => fields.values().any(|t| self.occurs_in(var, t)),
        }
    }

    // ── Unification ─────────────────────────────────────────────────────

    /// Unify two types, making them equal.
    ///
    /// Both types are first resolved through the union-find table, then
    /// compared structurally.
    pub fn unify(&mut self, a: Ty, b: Ty, origin: ConstraintOrigin) -> Result<(), TypeError> {
        let a = self.resolve(a);
        let b = self.resolve(b);

        match (a, b) {
            (Ty::Var(v1), Ty::Var(v2)) if v1 == v2 => Ok(()),

            (Ty::Var(v1), Ty::Var(v2)) => {
                self.table
                    .unify_var_var(v1, v2)
                    .expect("unifying two unbound vars should not fail");
                Ok(())
            }

            (Ty::Var(v), ty) | (ty, Ty::Var(v)) => {
                if self.occurs_in(v, &ty) {
                    Err(TypeError::InfiniteType { var: v, ty, origin })
                } else {
                    self.table
                        .unify_var_value(v, Some(ty))
                        .expect("binding a var to a type after occurs check should not fail");
                    Ok(())
                }
            }

            (Ty::Con(c1), Ty::Con(c2)) if c1 == c2 => Ok(()),

            // Parameters are matched by name. A parameter present on only one
            // side is acceptable when that side declares it optional.
            (Ty::Fun(f1), Ty::Fun(f2)) => {
                for (name, p1) in &f1.params {
                    match f2.params.get(name) {
                        Some(p2) => self.unify(p1.ty.clone(), p2.ty.clone(), origin.clone())?,
                        None if p1.optional => {}
                        None => {
                            return Err(TypeError::MissingParameter {
                                name: name.clone(),
                                origin,
                            })
                        }
                    }
                }
                for (name, p2) in &f2.params {
                    if !f1.params.contains_key(name) && !p2.optional {
                        return Err(TypeError::MissingParameter {
                            name: name.clone(),
                            origin,
                        });
                    }
                }
                self.unify(*f1.ret, *f2.ret, origin)
            }

            // Records are closed: both sides must declare the same fields.
            (Ty::Record(r1), Ty::Record(r2)) => {
                for name in r1.keys() {
                    if !r2.contains_key(name) {
                        return Err(TypeError::NoSuchField {
                            ty: Ty::Record(r2),
                            field: name.clone(),
                        });
                    }
                }
                for name in r2.keys() {
                    if !r1.contains_key(name) {
                        return Err(TypeError::NoSuchField {
                            ty: Ty::Record(r1),
                            field: name.clone(),
                        });
                    }
                }
                for (name, t1) in r1 {
                    let t2 = r2[&name].clone();
                    self.unify(t1, t2, origin.clone())?;
                }
                Ok(())
            }

            (a, b) => Err(TypeError::Mismatch {
                expected: a,
                found: b,
                origin,
            }),
        }
    }

    // ── Field constraints ───────────────────────────────────────────────

    /// Type of `record.field`. Resolves immediately when the receiver is a
    /// known record; otherwise records a pending constraint and returns a
    /// fresh variable.
    pub fn field_of(&mut self, record: Ty, field: &str) -> Result<Ty, TypeError> {
        match self.resolve(record) {
            Ty::Record(fields) => match fields.get(field) {
                Some(t) => Ok(t.clone()),
                None => Err(TypeError::NoSuchField {
                    ty: Ty::Record(fields),
                    field: field.to_string(),
                }),
            },
            var @ Ty::Var(_) => {
                let ty = self.fresh_var();
                self.pending_fields.push(FieldConstraint {
                    record: var,
                    field: field.to_string(),
                    ty: ty.clone(),
                });
                Ok(ty)
            }
            other => Err(TypeError::NotARecord {
                ty: other,
                property: field.to_string(),
            }),
        }
    }

    /// Discharge every pending field constraint whose receiver has become a
    /// record. Repeats until no further progress is possible, since solving
    /// one constraint can resolve the receiver of another.
    pub fn solve_fields(&mut self) -> Result<(), TypeError> {
        loop {
            let pending = std::mem::take(&mut self.pending_fields);
            let before = pending.len();
            for c in pending {
                match self.resolve(c.record.clone()) {
                    Ty::Var(_) => self.pending_fields.push(c),
                    resolved => {
                        let field_ty = self.field_of(resolved, &c.field)?;
                        self.unify(
                            field_ty,
                            c.ty,
                            ConstraintOrigin::Member { property: c.field },
                        )?;
                    }
                }
            }
            if self.pending_fields.len() == before {
                return Ok(());
            }
        }
    }

    /// Field constraints that are still waiting on an unresolved receiver.
    pub fn pending_fields(&self) -> &[FieldConstraint] {
        &self.pending_fields
    }
}

impl Default for InferCtx {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ──────────────────────────────────────────────────────────────
