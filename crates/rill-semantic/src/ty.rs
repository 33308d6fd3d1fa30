//! Type representation for the Rill type system.
//!
//! Defines the core `Ty` enum, primitive type constructors (`TyCon`), type
//! variables (`TyVar`), and function signatures (`FnTy`). Types compare and
//! hash structurally, so a fully resolved `Ty` can be used directly as a
//! cache key.

use std::collections::BTreeMap;
use std::fmt;

/// A type variable, identified by a `u32` index into the unification table.
///
/// Type variables are created during inference and unified with concrete types
/// or other variables. The `ena` crate handles the union-find mechanics.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TyVar(pub u32);

/// A primitive type constructor.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TyCon {
    Bool,
    Int,
    Float,
    String,
    Regexp,
    Time,
}

impl TyCon {
    pub fn name(self) -> &'static str {
        match self {
            TyCon::Bool => "bool",
            TyCon::Int => "int",
            TyCon::Float => "float",
            TyCon::String => "string",
            TyCon::Regexp => "regexp",
            TyCon::Time => "time",
        }
    }
}

impl fmt::Display for TyCon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single named parameter of a function type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ParamTy {
    pub ty: Ty,
    /// Optional parameters have a default value and may be omitted by callers.
    pub optional: bool,
}

/// A function signature. Parameters are keyed by name; their declaration
/// order is not part of the type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FnTy {
    pub params: BTreeMap<String, ParamTy>,
    pub ret: Box<Ty>,
}

/// A Rill type.
///
/// - `Var`: an inference variable (to be resolved by unification)
/// - `Con`: a primitive (bool, int, float, string, regexp, time)
/// - `Fun`: a function with named parameters
/// - `Record`: a record with named fields
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Ty {
    /// A type variable (unresolved during inference).
    Var(TyVar),
    /// A primitive type.
    Con(TyCon),
    /// A function type: `(name: T, ...) -> R`.
    Fun(FnTy),
    /// A record type: `{name: T, ...}`.
    Record(BTreeMap<String, Ty>),
}

impl Ty {
    pub fn bool() -> Ty {
        Ty::Con(TyCon::Bool)
    }

    pub fn int() -> Ty {
        Ty::Con(TyCon::Int)
    }

    pub fn float() -> Ty {
        Ty::Con(TyCon::Float)
    }

    pub fn string() -> Ty {
        Ty::Con(TyCon::String)
    }

    pub fn regexp() -> Ty {
        Ty::Con(TyCon::Regexp)
    }

    pub fn time() -> Ty {
        Ty::Con(TyCon::Time)
    }

    /// Create a function type whose parameters are all required.
    pub fn fun<I, S>(params: I, ret: Ty) -> Ty
    where
        I: IntoIterator<Item = (S, Ty)>,
        S: Into<String>,
    {
        let params = params
            .into_iter()
            .map(|(name, ty)| (name.into(), ParamTy { ty, optional: false }))
            .collect();
        Ty::Fun(FnTy {
            params,
            ret: Box::new(ret),
        })
    }

    /// Create a record type from `(field, type)` pairs.
    pub fn record<I, S>(fields: I) -> Ty
    where
        I: IntoIterator<Item = (S, Ty)>,
        S: Into<String>,
    {
        Ty::Record(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Short, human-readable name of the type's kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Ty::Var(_) => "variable",
            Ty::Con(c) => c.name(),
            Ty::Fun(_) => "function",
            Ty::Record(_) => "record",
        }
    }

    pub fn is_function(&self) -> bool {
        matches!(self, Ty::Fun(_))
    }

    /// True when the type contains no type variables.
    pub fn is_mono(&self) -> bool {
        match self {
            Ty::Var(_) => false,
            Ty::Con(_) => true,
            Ty::Fun(f) => f.params.values().all(|p| p.ty.is_mono()) && f.ret.is_mono(),
            Ty::Record(fields) => fields.values().all(Ty::is_mono),
        }
    }

    /// Collect every type variable in the type, in traversal order.
    pub fn vars(&self, out: &mut Vec<TyVar>) {
        match self {
            Ty::Var(v) => out.push(*v),
            Ty::Con(_) => {}
            Ty::Fun(f) => {
                for p in f.params.values() {
                    p.ty.vars(out);
                }
                f.ret.vars(out);
            }
            Ty::Record(fields) => {
                for t in fields.values() {
                    t.vars(out);
                }
            }
        }
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Var(v) => write!(f, "?{}", v.0),
            Ty::Con(c) => write!(f, "{}", c),
            Ty::Fun(fun) => {
                write!(f, "(")?;
                for (i, (name, p)) in fun.params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    let mark = if p.optional { "?" } else { "" };
                    write!(f, "{}{}: {}", name, mark, p.ty)?;
                }
                write!(f, ") -> {}", fun.ret)
            }
            Ty::Record(fields) => {
                write!(f, "{{")?;
                for (i, (name, t)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", name, t)?;
                }
                write!(f, "}}")
            }
        }
    }
}

// ── ena trait implementations ──────────────────────────────────────────

impl ena::unify::UnifyKey for TyVar {
    type Value = Option<Ty>;

    fn index(&self) -> u32 {
        self.0
    }

    fn from_index(u: u32) -> Self {
        TyVar(u)
    }

    fn tag() -> &'static str {
        "TyVar"
    }
}

impl ena::unify::EqUnifyValue for Ty {}
