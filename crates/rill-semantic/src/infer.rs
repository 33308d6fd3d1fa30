//! Type inference for function bodies.
//!
//! Walks a [`FunctionExpression`] wrapped in an [`Extern`] scope, assigns a
//! type (possibly a variable) to every expression slot, and returns a
//! [`PolyType`] for the whole function. The caller then unifies the
//! `PolyType` against a required type, checks that the result is
//! monomorphic, and writes the resolved types back into the tree with
//! [`PolyType::annotate`].
//!
//! Operand types of arithmetic operators are deliberately not unified with
//! each other: whether `int + float` exists is a question for the runtime
//! operator table, answered when the tree is lowered.

use std::collections::BTreeMap;

use crate::ast::{
    walk_types_mut, Block, Expression, FunctionBody, FunctionExpression, ObjectExpression,
    Statement, UnaryOperator,
};
use crate::env::TypeEnv;
use crate::error::{ConstraintOrigin, TypeError};
use crate::ty::{FnTy, ParamTy, Ty};
use crate::unify::InferCtx;

/// An identifier declared outside the function body, such as a built-in.
#[derive(Clone, Debug)]
pub struct ExternDeclaration {
    pub name: String,
    pub ty: Ty,
}

/// A function body together with the external declarations it may refer to.
#[derive(Clone, Debug)]
pub struct Extern {
    pub declarations: Vec<ExternDeclaration>,
    pub block: FunctionExpression,
}

/// The inferred, possibly polymorphic, type of a function.
///
/// Owns the inference context so that further unification can refine it.
pub struct PolyType {
    ctx: InferCtx,
    ty: Ty,
}

impl PolyType {
    /// The current type with all known substitutions applied.
    pub fn ty(&mut self) -> Ty {
        self.ctx.resolve(self.ty.clone())
    }

    /// Unify with a target type built outside this context. Variables in
    /// `target` are treated as fresh unknowns. Pending field constraints are
    /// re-solved afterwards.
    pub fn unify(&mut self, target: &Ty) -> Result<(), TypeError> {
        let target = self.ctx.instantiate(target);
        self.ctx
            .unify(self.ty.clone(), target, ConstraintOrigin::Required)?;
        self.ctx.solve_fields()
    }

    /// The fully resolved type, or `None` if any part of it is still
    /// undetermined or a field constraint has not been discharged.
    pub fn mono_type(&mut self) -> Option<Ty> {
        if !self.ctx.pending_fields().is_empty() {
            return None;
        }
        let ty = self.ty();
        ty.is_mono().then_some(ty)
    }

    /// Write resolved types back into every slot of `f`, which must be the
    /// tree this `PolyType` was inferred from.
    pub fn annotate(&mut self, f: &mut FunctionExpression) {
        let ctx = &mut self.ctx;
        walk_types_mut(f, &mut |slot| {
            if let Some(ty) = slot.take() {
                *slot = Some(ctx.resolve(ty));
            }
        });
    }
}

/// Infer the types of `ext.block`, annotating it in place.
pub fn infer(ext: &mut Extern) -> Result<PolyType, TypeError> {
    let mut ctx = InferCtx::new();
    let mut env = TypeEnv::new();
    for decl in &ext.declarations {
        let ty = ctx.instantiate(&decl.ty);
        env.insert(decl.name.clone(), ty);
    }
    env.push_scope();
    let ty = infer_function(&mut ctx, &mut env, &mut ext.block)?;
    env.pop_scope();
    ctx.solve_fields()?;
    Ok(PolyType { ctx, ty })
}

fn infer_function(
    ctx: &mut InferCtx,
    env: &mut TypeEnv,
    f: &mut FunctionExpression,
) -> Result<Ty, TypeError> {
    // Defaults are evaluated in the defining scope, so they are inferred
    // before the parameters come into scope.
    let mut params = BTreeMap::new();
    for p in &mut f.params {
        let ty = ctx.fresh_var();
        if let Some(default) = &mut p.default {
            let d = infer_expr(ctx, env, default)?;
            ctx.unify(
                ty.clone(),
                d,
                ConstraintOrigin::Default {
                    param: p.key.clone(),
                },
            )?;
        }
        p.ty = Some(ty.clone());
        params.insert(
            p.key.clone(),
            ParamTy {
                ty,
                optional: p.default.is_some(),
            },
        );
    }

    env.push_scope();
    for (name, p) in &params {
        env.insert(name.clone(), p.ty.clone());
    }
    let ret = match &mut f.body {
        FunctionBody::Expression(e) => infer_expr(ctx, env, e),
        FunctionBody::Block(b) => infer_block(ctx, env, b),
    };
    env.pop_scope();

    let ty = Ty::Fun(FnTy {
        params,
        ret: Box::new(ret?),
    });
    f.ty = Some(ty.clone());
    Ok(ty)
}

fn infer_block(ctx: &mut InferCtx, env: &mut TypeEnv, block: &mut Block) -> Result<Ty, TypeError> {
    if block.return_statement().is_none() {
        return Err(TypeError::MissingReturn);
    }
    let ret = ctx.fresh_var();
    env.push_scope();
    let result = infer_statements(ctx, env, block, &ret);
    env.pop_scope();
    result?;
    Ok(ret)
}

fn infer_statements(
    ctx: &mut InferCtx,
    env: &mut TypeEnv,
    block: &mut Block,
    ret: &Ty,
) -> Result<(), TypeError> {
    for stmt in &mut block.body {
        match stmt {
            Statement::Variable(v) => {
                let ty = infer_expr(ctx, env, &mut v.init)?;
                env.insert(v.id.clone(), ty);
            }
            Statement::Return(r) => {
                let ty = infer_expr(ctx, env, &mut r.argument)?;
                ctx.unify(ret.clone(), ty, ConstraintOrigin::Builtin)?;
            }
            Statement::Expression(e) => {
                infer_expr(ctx, env, &mut e.expression)?;
            }
        }
    }
    Ok(())
}

fn infer_object(
    ctx: &mut InferCtx,
    env: &mut TypeEnv,
    o: &mut ObjectExpression,
) -> Result<BTreeMap<String, Ty>, TypeError> {
    let mut fields = BTreeMap::new();
    for p in &mut o.properties {
        let ty = infer_expr(ctx, env, &mut p.value)?;
        fields.insert(p.key.clone(), ty);
    }
    o.ty = Some(Ty::Record(fields.clone()));
    Ok(fields)
}

fn infer_expr(ctx: &mut InferCtx, env: &mut TypeEnv, expr: &mut Expression) -> Result<Ty, TypeError> {
    match expr {
        Expression::Identifier(e) => {
            let ty = env
                .lookup(&e.name)
                .cloned()
                .ok_or_else(|| TypeError::UnboundVariable {
                    name: e.name.clone(),
                })?;
            e.ty = Some(ty.clone());
            Ok(ty)
        }
        Expression::Member(e) => {
            let object = infer_expr(ctx, env, &mut e.object)?;
            let ty = ctx.field_of(object, &e.property)?;
            e.ty = Some(ty.clone());
            Ok(ty)
        }
        Expression::Unary(e) => {
            let operand = infer_expr(ctx, env, &mut e.argument)?;
            let ty = match e.operator {
                UnaryOperator::Not => {
                    ctx.unify(
                        operand,
                        Ty::bool(),
                        ConstraintOrigin::Operand {
                            operator: e.operator.to_string(),
                        },
                    )?;
                    Ty::bool()
                }
                UnaryOperator::Neg => operand,
                UnaryOperator::Exists => Ty::bool(),
            };
            e.ty = Some(ty.clone());
            Ok(ty)
        }
        Expression::Logical(e) => {
            let left = infer_expr(ctx, env, &mut e.left)?;
            let right = infer_expr(ctx, env, &mut e.right)?;
            ctx.unify(left, Ty::bool(), ConstraintOrigin::Logical)?;
            ctx.unify(right, Ty::bool(), ConstraintOrigin::Logical)?;
            e.ty = Some(Ty::bool());
            Ok(Ty::bool())
        }
        Expression::Binary(e) => {
            let left = infer_expr(ctx, env, &mut e.left)?;
            infer_expr(ctx, env, &mut e.right)?;
            let ty = if e.operator.is_arithmetic() {
                left
            } else {
                Ty::bool()
            };
            e.ty = Some(ty.clone());
            Ok(ty)
        }
        Expression::Call(e) => {
            let callee = infer_expr(ctx, env, &mut e.callee)?;
            let args = infer_object(ctx, env, &mut e.arguments)?;
            let ty = infer_call(ctx, callee, args)?;
            e.ty = Some(ty.clone());
            Ok(ty)
        }
        Expression::Function(f) => infer_function(ctx, env, f),
        Expression::Object(o) => Ok(Ty::Record(infer_object(ctx, env, o)?)),
        Expression::Boolean(_) => Ok(Ty::bool()),
        Expression::Integer(_) => Ok(Ty::int()),
        Expression::Float(_) => Ok(Ty::float()),
        Expression::String(_) => Ok(Ty::string()),
        Expression::Regexp(_) => Ok(Ty::regexp()),
        Expression::DateTime(_) => Ok(Ty::time()),
    }
}

fn infer_call(ctx: &mut InferCtx, callee: Ty, args: BTreeMap<String, Ty>) -> Result<Ty, TypeError> {
    match ctx.resolve(callee) {
        Ty::Fun(f) => {
            let callee_ty = Ty::Fun(f.clone());
            for (name, arg) in &args {
                match f.params.get(name) {
                    Some(p) => ctx.unify(
                        p.ty.clone(),
                        arg.clone(),
                        ConstraintOrigin::Argument { name: name.clone() },
                    )?,
                    None => {
                        return Err(TypeError::UnknownArgument {
                            name: name.clone(),
                            callee: callee_ty,
                        })
                    }
                }
            }
            for (name, p) in &f.params {
                if !p.optional && !args.contains_key(name) {
                    return Err(TypeError::MissingArgument {
                        name: name.clone(),
                        callee: callee_ty,
                    });
                }
            }
            Ok(*f.ret)
        }
        var @ Ty::Var(_) => {
            let ret = ctx.fresh_var();
            let expected = Ty::Fun(FnTy {
                params: args
                    .into_iter()
                    .map(|(name, ty)| (name, ParamTy { ty, optional: false }))
                    .collect(),
                ret: Box::new(ret.clone()),
            });
            ctx.unify(var, expected, ConstraintOrigin::Call)?;
            Ok(ret)
        }
        other => Err(TypeError::NotAFunction { ty: other }),
    }
}
