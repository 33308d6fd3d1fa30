//! Per-type memoization of compiled functions.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use rill_semantic::ast::FunctionExpression;
use rill_semantic::{Ty, TyVar};
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::compile::{compile, CompiledFn};
use crate::error::CompileError;
use crate::scope::Scope;

type Outcome = Result<Arc<CompiledFn>, CompileError>;

/// Compiles one function for many concrete types, once per type.
///
/// Both successes and failures are stored. The map lock is held only long
/// enough to find or insert the cell for a type; compilation itself runs
/// inside the cell, so concurrent requests for one type compile once while
/// requests for different types proceed in parallel.
pub struct CompilationCache {
    func: FunctionExpression,
    scope: Scope,
    compiled: Mutex<FxHashMap<Ty, Arc<OnceLock<Outcome>>>>,
    compilations: AtomicUsize,
}

impl CompilationCache {
    pub fn new(func: FunctionExpression, scope: Scope) -> Self {
        CompilationCache {
            func,
            scope,
            compiled: Mutex::new(FxHashMap::default()),
            compilations: AtomicUsize::new(0),
        }
    }

    /// Compile for `fn_type`, or return the stored outcome.
    pub fn compile(&self, fn_type: &Ty) -> Outcome {
        let cell = {
            let mut compiled = self.compiled.lock();
            match compiled.get(fn_type) {
                Some(cell) => {
                    trace!(ty = %fn_type, "compilation cache hit");
                    Arc::clone(cell)
                }
                None => {
                    trace!(ty = %fn_type, "compilation cache miss");
                    let cell = Arc::new(OnceLock::new());
                    compiled.insert(fn_type.clone(), Arc::clone(&cell));
                    cell
                }
            }
        };

        cell.get_or_init(|| {
            self.compilations.fetch_add(1, Ordering::Relaxed);
            let outcome = compile(&self.func, fn_type, &self.scope).map(Arc::new);
            if let Err(e) = &outcome {
                debug!(ty = %fn_type, error = %e, "compilation failed");
            }
            outcome
        })
        .clone()
    }

    /// Compile a one-parameter function for the given parameter type and
    /// check that it returns `return_ty`. Returns the compiled function and
    /// the parameter's name.
    pub fn compile_fn_param(
        &self,
        param_ty: &Ty,
        return_ty: &Ty,
    ) -> Result<(Arc<CompiledFn>, String), CompileError> {
        let [param] = self.func.params.as_slice() else {
            return Err(CompileError::Arity {
                found: self.func.params.len(),
            });
        };

        // The return position is a variable unused by `param_ty`, left open
        // for inference to decide.
        let mut vars = Vec::new();
        param_ty.vars(&mut vars);
        let ret = TyVar(vars.iter().map(|v| v.0 + 1).max().unwrap_or(0));
        let fn_type = Ty::fun([(param.key.as_str(), param_ty.clone())], Ty::Var(ret));
        let compiled = self.compile(&fn_type)?;
        if compiled.ret_ty() != return_ty {
            return Err(CompileError::ResultType {
                expected: return_ty.clone(),
                found: compiled.ret_ty().clone(),
            });
        }
        Ok((compiled, param.key.clone()))
    }

    /// Number of distinct types requested so far.
    pub fn len(&self) -> usize {
        self.compiled.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of times the binder actually ran.
    pub fn compilations(&self) -> usize {
        self.compilations.load(Ordering::Relaxed)
    }
}

/// Compile a one-parameter function without keeping a cache around.
pub fn compile_fn_param(
    func: &FunctionExpression,
    param_ty: &Ty,
    return_ty: &Ty,
    builtins: &Scope,
) -> Result<(Arc<CompiledFn>, String), CompileError> {
    CompilationCache::new(func.clone(), builtins.clone()).compile_fn_param(param_ty, return_ty)
}
