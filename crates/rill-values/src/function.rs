//! Callable values.

use std::fmt;

use rill_semantic::Ty;

use crate::error::EvalError;
use crate::value::{Record, Value};

/// A value that can be called with a record of named arguments.
///
/// Implementations must be safe to call from several threads at once.
pub trait Function: Send + Sync + fmt::Debug {
    /// The function's type; always a `Ty::Fun`.
    fn ty(&self) -> &Ty;

    fn call(&self, args: &Record) -> Result<Value, EvalError>;
}

type NativeFn = dyn Fn(&Record) -> Result<Value, EvalError> + Send + Sync;

/// A built-in implemented in Rust.
pub struct NativeFunction {
    name: String,
    ty: Ty,
    f: Box<NativeFn>,
}

impl NativeFunction {
    pub fn new<F>(name: impl Into<String>, ty: Ty, f: F) -> Self
    where
        F: Fn(&Record) -> Result<Value, EvalError> + Send + Sync + 'static,
    {
        debug_assert!(ty.is_function(), "native function must have a function type");
        NativeFunction {
            name: name.into(),
            ty,
            f: Box::new(f),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Function for NativeFunction {
    fn ty(&self) -> &Ty {
        &self.ty
    }

    fn call(&self, args: &Record) -> Result<Value, EvalError> {
        (self.f)(args)
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction")
            .field("name", &self.name)
            .field("ty", &self.ty)
            .finish_non_exhaustive()
    }
}

/// Fetch a required argument, reporting the function name when absent.
pub fn argument<'a>(function: &str, args: &'a Record, name: &str) -> Result<&'a Value, EvalError> {
    args.get(name).ok_or_else(|| EvalError::Native {
        function: function.to_string(),
        message: format!("missing argument `{}`", name),
    })
}
