//! Binding a function against built-ins and a required type.

use std::sync::Arc;

use rill_semantic::ast::{walk_types_mut, FunctionExpression};
use rill_semantic::{infer, Extern, Ty};
use rill_values::{EvalError, Record, Value};
use tracing::instrument;

use crate::error::CompileError;
use crate::eval::FunctionEvaluator;
use crate::lower::lower_function;
use crate::scope::Scope;

/// A function lowered for one concrete type.
#[derive(Debug)]
pub struct CompiledFn {
    root: Arc<FunctionEvaluator>,
    ty: Ty,
    empty: Arc<Scope>,
}

impl CompiledFn {
    fn new(root: FunctionEvaluator, ty: Ty) -> Self {
        CompiledFn {
            root: Arc::new(root),
            ty,
            empty: Arc::new(Scope::new()),
        }
    }

    /// The unified monomorphic function type.
    pub fn ty(&self) -> &Ty {
        &self.ty
    }

    /// The return type.
    pub fn ret_ty(&self) -> &Ty {
        match &self.ty {
            Ty::Fun(f) => &*f.ret,
            other => other,
        }
    }

    /// Invoke the function with `input` as its named arguments.
    pub fn eval(&self, input: &Record) -> Result<Value, EvalError> {
        self.root.call(&self.empty, input)
    }

    pub fn eval_bool(&self, input: &Record) -> Result<bool, EvalError> {
        self.eval(input)?.as_bool()
    }

    pub fn eval_int(&self, input: &Record) -> Result<i64, EvalError> {
        self.eval(input)?.as_int()
    }

    pub fn eval_float(&self, input: &Record) -> Result<f64, EvalError> {
        match self.eval(input)? {
            Value::Float(f) => Ok(f),
            other => Err(EvalError::unexpected("float", &other)),
        }
    }

    pub fn eval_string(&self, input: &Record) -> Result<String, EvalError> {
        match self.eval(input)? {
            Value::String(s) => Ok(s),
            other => Err(EvalError::unexpected("string", &other)),
        }
    }

    pub fn eval_record(&self, input: &Record) -> Result<Record, EvalError> {
        match self.eval(input)? {
            Value::Record(r) => Ok(r),
            other => Err(EvalError::unexpected("record", &other)),
        }
    }
}

/// Compile `f` for the function type `required`.
///
/// The body is cloned, inferred with every binding in `builtins` in scope,
/// unified against `required`, checked for residual type variables, and
/// lowered. Variables in `required` are placeholders that inference may
/// fill in; the resulting [`CompiledFn::ty`] is the fully resolved type.
#[instrument(name = "compiler::compile", level = "debug", skip_all, fields(ty = %required))]
pub fn compile(
    f: &FunctionExpression,
    required: &Ty,
    builtins: &Scope,
) -> Result<CompiledFn, CompileError> {
    if !required.is_function() {
        return Err(CompileError::NotAFunctionType(required.clone()));
    }

    let mut ext = Extern {
        declarations: builtins.declarations(),
        block: f.clone(),
    };
    let mut poly = infer(&mut ext)?;
    poly.unify(required)?;
    let ty = match poly.mono_type() {
        Some(ty) => ty,
        None => return Err(CompileError::Polymorphic(poly.ty())),
    };
    poly.annotate(&mut ext.block);

    // Nested function literals can keep open variables the signature never
    // mentions; every annotated slot must be concrete before lowering.
    let mut residual = None;
    walk_types_mut(&mut ext.block, &mut |slot| {
        if residual.is_none() {
            residual = slot.as_ref().filter(|t| !t.is_mono()).cloned();
        }
    });
    if let Some(t) = residual {
        return Err(CompileError::Polymorphic(t));
    }

    let root = lower_function(&ext.block, builtins)?;
    debug_assert_eq!(root.ty(), &ty);
    Ok(CompiledFn::new(root, ty))
}
