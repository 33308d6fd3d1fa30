//! Lowering of typed semantic trees into evaluator trees.
//!
//! Every node must already carry a concrete type. Operators are resolved
//! against the runtime operator tables here, once, so evaluation never
//! dispatches on operand types. Free identifiers that name a built-in are
//! bound early to the built-in's value; identifiers bound by an enclosing
//! parameter or declaration stay late-bound.

use std::sync::Arc;

use chrono::Utc;
use rill_semantic::ast::{
    Block, Expression, FunctionBody, FunctionExpression, ObjectExpression, Statement,
};
use rill_semantic::Ty;
use rill_values::{lookup_binary_function, lookup_unary_function, BinaryFuncSignature};
use tracing::instrument;

use crate::error::CompileError;
use crate::eval::{
    BinaryEvaluator, BlockEvaluator, CallEvaluator, DeclarationEvaluator, Evaluator,
    FunctionEvaluator, FunctionParam, IdentifierEvaluator, LogicalEvaluator, MemberEvaluator,
    ObjectEvaluator, ReturnEvaluator, UnaryEvaluator, ValueEvaluator,
};
use crate::scope::Scope;

/// Lower a fully annotated function literal.
#[instrument(name = "compiler::lower", level = "trace", skip_all)]
pub fn lower_function(
    f: &FunctionExpression,
    builtins: &Scope,
) -> Result<FunctionEvaluator, CompileError> {
    Lowerer {
        builtins,
        locals: Vec::new(),
    }
    .function(f)
}

struct Lowerer<'a> {
    builtins: &'a Scope,
    /// Names bound by enclosing parameters and declarations, innermost last.
    locals: Vec<String>,
}

fn concrete(ty: &Option<Ty>, kind: &'static str) -> Result<Ty, CompileError> {
    match ty {
        Some(t) if t.is_mono() => Ok(t.clone()),
        _ => Err(CompileError::Untyped { kind }),
    }
}

impl Lowerer<'_> {
    fn function(&mut self, f: &FunctionExpression) -> Result<FunctionEvaluator, CompileError> {
        let ty = concrete(&f.ty, "FunctionExpression")?;

        let mut params = Vec::with_capacity(f.params.len());
        for p in &f.params {
            let default = p.default.as_ref().map(|d| self.expr(d)).transpose()?;
            params.push(FunctionParam {
                name: p.key.clone(),
                ty: concrete(&p.ty, "FunctionParameter")?,
                default,
            });
        }

        let mark = self.locals.len();
        self.locals.extend(f.params.iter().map(|p| p.key.clone()));
        let body = match &f.body {
            FunctionBody::Expression(e) => self.expr(e),
            FunctionBody::Block(b) => self.block(b),
        };
        self.locals.truncate(mark);

        Ok(FunctionEvaluator {
            ty,
            params,
            body: Box::new(body?),
        })
    }

    fn block(&mut self, b: &Block) -> Result<Evaluator, CompileError> {
        let Some((Statement::Return(last), rest)) = b.body.split_last() else {
            return Err(CompileError::MissingReturn);
        };

        let mark = self.locals.len();
        let result = self.block_statements(rest, &last.argument);
        self.locals.truncate(mark);

        let (statements, ret) = result?;
        Ok(Evaluator::Block(BlockEvaluator { statements, ret }))
    }

    fn block_statements(
        &mut self,
        statements: &[Statement],
        ret: &Expression,
    ) -> Result<(Vec<Evaluator>, ReturnEvaluator), CompileError> {
        let mut out = Vec::with_capacity(statements.len());
        for stmt in statements {
            out.push(self.statement(stmt)?);
        }
        let ret = ReturnEvaluator {
            argument: Box::new(self.expr(ret)?),
        };
        Ok((out, ret))
    }

    fn statement(&mut self, stmt: &Statement) -> Result<Evaluator, CompileError> {
        match stmt {
            Statement::Variable(v) => {
                let init = self.expr(&v.init)?;
                self.locals.push(v.id.clone());
                Ok(Evaluator::Declaration(DeclarationEvaluator {
                    id: v.id.clone(),
                    init: Box::new(init),
                }))
            }
            Statement::Return(r) => Ok(Evaluator::Return(ReturnEvaluator {
                argument: Box::new(self.expr(&r.argument)?),
            })),
            Statement::Expression(_) => Err(CompileError::UnsupportedNode { kind: stmt.kind() }),
        }
    }

    fn object(&mut self, o: &ObjectExpression) -> Result<ObjectEvaluator, CompileError> {
        let mut properties = Vec::with_capacity(o.properties.len());
        for p in &o.properties {
            properties.push((p.key.clone(), self.expr(&p.value)?));
        }
        let ty = Ty::record(properties.iter().map(|(k, v)| (k.as_str(), v.ty().clone())));
        debug_assert_eq!(o.ty.as_ref(), Some(&ty));
        Ok(ObjectEvaluator { ty, properties })
    }

    fn is_local(&self, name: &str) -> bool {
        self.locals.iter().any(|l| l == name)
    }

    fn expr(&mut self, e: &Expression) -> Result<Evaluator, CompileError> {
        let kind = e.kind();
        Ok(match e {
            Expression::Identifier(id) => {
                let ty = concrete(&id.ty, kind)?;
                match self.builtins.lookup(&id.name) {
                    Some(value) if !self.is_local(&id.name) => {
                        Evaluator::Value(ValueEvaluator {
                            ty,
                            value: value.clone(),
                        })
                    }
                    _ => Evaluator::Identifier(IdentifierEvaluator {
                        ty,
                        name: id.name.clone(),
                    }),
                }
            }
            Expression::Member(m) => Evaluator::Member(MemberEvaluator {
                ty: concrete(&m.ty, kind)?,
                object: Box::new(self.expr(&m.object)?),
                property: m.property.clone(),
            }),
            Expression::Unary(u) => {
                let ty = concrete(&u.ty, kind)?;
                let operand = self.expr(&u.argument)?;
                let f = lookup_unary_function(u.operator, operand.ty())?;
                debug_assert_eq!(f.ret(), &ty);
                Evaluator::Unary(UnaryEvaluator {
                    ty,
                    operand: Box::new(operand),
                    f,
                })
            }
            Expression::Logical(l) => {
                concrete(&l.ty, kind)?;
                Evaluator::Logical(LogicalEvaluator {
                    operator: l.operator,
                    left: Box::new(self.expr(&l.left)?),
                    right: Box::new(self.expr(&l.right)?),
                })
            }
            Expression::Binary(b) => {
                let ty = concrete(&b.ty, kind)?;
                let left = self.expr(&b.left)?;
                let right = self.expr(&b.right)?;
                let f = lookup_binary_function(&BinaryFuncSignature {
                    operator: b.operator,
                    left: left.ty().clone(),
                    right: right.ty().clone(),
                })?;
                debug_assert_eq!(f.ret(), ty);
                Evaluator::Binary(BinaryEvaluator {
                    ty,
                    left: Box::new(left),
                    right: Box::new(right),
                    f,
                })
            }
            Expression::Call(c) => Evaluator::Call(CallEvaluator {
                ty: concrete(&c.ty, kind)?,
                callee: Box::new(self.expr(&c.callee)?),
                args: self.object(&c.arguments)?,
            }),
            Expression::Function(f) => Evaluator::Function(Arc::new(self.function(f)?)),
            Expression::Object(o) => Evaluator::Object(self.object(o)?),
            Expression::Boolean(b) => Evaluator::Boolean(*b),
            Expression::Integer(i) => Evaluator::Integer(*i),
            Expression::Float(f) => Evaluator::Float(*f),
            Expression::String(s) => Evaluator::String(s.clone()),
            Expression::Regexp(r) => Evaluator::Regexp(r.clone()),
            Expression::DateTime(t) => Evaluator::Time(t.with_timezone(&Utc)),
        })
    }
}
