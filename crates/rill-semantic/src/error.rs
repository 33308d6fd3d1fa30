//! Type error types with provenance tracking.
//!
//! Every unification error carries a `ConstraintOrigin` recording which
//! construct asked for the two types to be equal, so messages can say
//! "argument `x`" or "property `a`" rather than only "expected int".

use std::fmt;

use crate::ty::{Ty, TyVar};

/// Where a type constraint was generated.
#[derive(Clone, Debug, PartialEq)]
pub enum ConstraintOrigin {
    /// Unifying the inferred function against the caller-required type.
    Required,
    /// A call argument matched against the callee's parameter.
    Argument { name: String },
    /// A property access `obj.property`.
    Member { property: String },
    /// The operand of a unary operator.
    Operand { operator: String },
    /// A parameter default matched against the parameter's type.
    Default { param: String },
    /// An operand of `and` / `or`.
    Logical,
    /// Applying an expression whose type is not yet known.
    Call,
    /// Synthetic constraint without a better origin.
    Builtin,
}

impl fmt::Display for ConstraintOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstraintOrigin::Required => write!(f, "required function type"),
            ConstraintOrigin::Argument { name } => write!(f, "argument `{}`", name),
            ConstraintOrigin::Member { property } => write!(f, "property `{}`", property),
            ConstraintOrigin::Operand { operator } => write!(f, "operand of `{}`", operator),
            ConstraintOrigin::Default { param } => write!(f, "default of `{}`", param),
            ConstraintOrigin::Logical => write!(f, "logical operand"),
            ConstraintOrigin::Call => write!(f, "call"),
            ConstraintOrigin::Builtin => write!(f, "builtin"),
        }
    }
}

/// A type error encountered during inference or unification.
#[derive(Clone, Debug, PartialEq)]
pub enum TypeError {
    /// Two types that should be equal are not.
    Mismatch {
        expected: Ty,
        found: Ty,
        origin: ConstraintOrigin,
    },
    /// A type variable appears in its own definition.
    InfiniteType {
        var: TyVar,
        ty: Ty,
        origin: ConstraintOrigin,
    },
    /// Two function types disagree on a parameter that is required on one side.
    MissingParameter {
        name: String,
        origin: ConstraintOrigin,
    },
    /// A call passes an argument the callee does not declare.
    UnknownArgument { name: String, callee: Ty },
    /// A call omits a required argument.
    MissingArgument { name: String, callee: Ty },
    /// An identifier is neither a parameter, a local, nor an extern.
    UnboundVariable { name: String },
    /// A non-function value is called.
    NotAFunction { ty: Ty },
    /// A property is read from a value that is not a record.
    NotARecord { ty: Ty, property: String },
    /// A record type has no field with the requested name.
    NoSuchField { ty: Ty, field: String },
    /// A block does not end with a return statement.
    MissingReturn,
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeError::Mismatch {
                expected,
                found,
                origin,
            } => write!(
                f,
                "type mismatch in {}: expected `{}`, found `{}`",
                origin, expected, found
            ),
            TypeError::InfiniteType { var, ty, origin } => write!(
                f,
                "infinite type in {}: `?{}` occurs in `{}`",
                origin, var.0, ty
            ),
            TypeError::MissingParameter { name, origin } => {
                write!(f, "parameter `{}` missing in {}", name, origin)
            }
            TypeError::UnknownArgument { name, callee } => {
                write!(f, "function `{}` has no parameter `{}`", callee, name)
            }
            TypeError::MissingArgument { name, callee } => {
                write!(f, "missing required argument `{}` to `{}`", name, callee)
            }
            TypeError::UnboundVariable { name } => write!(f, "undefined identifier `{}`", name),
            TypeError::NotAFunction { ty } => write!(f, "`{}` is not a function", ty),
            TypeError::NotARecord { ty, property } => write!(
                f,
                "cannot access property `{}` on non-record type `{}`",
                property, ty
            ),
            TypeError::NoSuchField { ty, field } => {
                write!(f, "type `{}` has no field `{}`", ty, field)
            }
            TypeError::MissingReturn => write!(f, "block has no return statement"),
        }
    }
}

impl std::error::Error for TypeError {}
