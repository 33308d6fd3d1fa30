//! Compiles typed Rill function bodies into reusable evaluator trees.
//!
//! A [`CompilationCache`] holds one function body and the built-ins it may
//! refer to. Each request for a concrete function type binds the body
//! against the built-ins, unifies it with the type, lowers the typed tree
//! and memoizes the result:
//!
//! ```text
//! FunctionExpression + Scope + Ty
//!     -> infer / unify / annotate   (rill-semantic)
//!     -> lower                      (operators resolved via rill-values)
//!     -> CompiledFn                 (eval once per record)
//! ```

pub mod cache;
pub mod compile;
pub mod error;
pub mod eval;
pub mod lower;
pub mod scope;

pub use cache::{compile_fn_param, CompilationCache};
pub use compile::{compile, CompiledFn};
pub use error::CompileError;
pub use eval::{Evaluator, FunctionEvaluator};
pub use lower::lower_function;
pub use scope::Scope;
