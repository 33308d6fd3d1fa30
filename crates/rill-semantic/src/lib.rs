//! Semantic tree, type representation, and type inference for Rill.
//!
//! This crate is the type-level half of the expression compiler: it defines
//! what a function body looks like after parsing ([`ast`]), what a type is
//! ([`ty`]), how two types are made equal ([`unify`]), and how a function
//! body acquires types from its external declarations ([`infer`]).

pub mod ast;
pub mod env;
pub mod error;
pub mod infer;
pub mod ty;
pub mod unify;

pub use error::{ConstraintOrigin, TypeError};
pub use infer::{infer, Extern, ExternDeclaration, PolyType};
pub use ty::{FnTy, ParamTy, Ty, TyCon, TyVar};
