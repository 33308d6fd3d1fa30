//! Runtime and operator-resolution errors.

use std::fmt;

use rill_semantic::ast::{BinaryOperator, UnaryOperator};
use rill_semantic::Ty;

use crate::value::Value;

/// An error raised while evaluating a compiled function.
#[derive(Clone, Debug, PartialEq)]
pub enum EvalError {
    /// A name is not bound in the current scope.
    IdentifierNotFound { name: String },
    /// A property was read from a value that is not a record.
    NotARecord { property: String, found: Ty },
    /// A record does not contain the requested property.
    NoSuchProperty { property: String, record: Ty },
    /// A call target is not a function.
    NotCallable { found: Ty },
    /// A call omitted a parameter that has no default.
    MissingArgument { name: String },
    DivisionByZero,
    Overflow { operator: &'static str },
    /// A value had a different kind than the operation needs.
    UnexpectedType { expected: &'static str, found: Ty },
    /// A native function reported a failure.
    Native { function: String, message: String },
}

impl EvalError {
    pub fn unexpected(expected: &'static str, found: &Value) -> Self {
        EvalError::UnexpectedType {
            expected,
            found: found.ty(),
        }
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalError::IdentifierNotFound { name } => write!(f, "undefined identifier `{}`", name),
            EvalError::NotARecord { property, found } => write!(
                f,
                "cannot access property `{}` on value of type `{}`",
                property, found
            ),
            EvalError::NoSuchProperty { property, record } => {
                write!(f, "record `{}` has no property `{}`", record, property)
            }
            EvalError::NotCallable { found } => {
                write!(f, "value of type `{}` is not callable", found)
            }
            EvalError::MissingArgument { name } => write!(f, "missing required argument `{}`", name),
            EvalError::DivisionByZero => write!(f, "division by zero"),
            EvalError::Overflow { operator } => write!(f, "integer overflow in `{}`", operator),
            EvalError::UnexpectedType { expected, found } => {
                write!(f, "expected a {} value, found `{}`", expected, found)
            }
            EvalError::Native { function, message } => write!(f, "{}: {}", function, message),
        }
    }
}

impl std::error::Error for EvalError {}

/// No operator implementation exists for the given operand types.
#[derive(Clone, Debug, PartialEq)]
pub enum OperatorError {
    NoBinaryFunction {
        operator: BinaryOperator,
        left: Ty,
        right: Ty,
    },
    NoUnaryFunction {
        operator: UnaryOperator,
        operand: Ty,
    },
}

impl fmt::Display for OperatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperatorError::NoBinaryFunction {
                operator,
                left,
                right,
            } => write!(
                f,
                "no binary operator `{}` for operands `{}` and `{}`",
                operator, left, right
            ),
            OperatorError::NoUnaryFunction { operator, operand } => write!(
                f,
                "no unary operator `{}` for operand `{}`",
                operator, operand
            ),
        }
    }
}

impl std::error::Error for OperatorError {}
