//! Compile-time errors.

use std::fmt;

use rill_semantic::{Ty, TypeError};
use rill_values::OperatorError;

/// Why a function could not be compiled.
///
/// Errors are `Clone` because the compilation cache stores failures and
/// hands the same error back on every later request for that type.
#[derive(Clone, Debug, PartialEq)]
pub enum CompileError {
    /// The required type is not a function type.
    NotAFunctionType(Ty),
    /// Inference or unification against the required type failed.
    Type(TypeError),
    /// Unification left part of the function's type undetermined.
    Polymorphic(Ty),
    /// A node kind has no evaluator.
    UnsupportedNode { kind: &'static str },
    /// A node reached lowering without a concrete type.
    Untyped { kind: &'static str },
    /// A block does not end with a return statement.
    MissingReturn,
    /// No operator implementation for the operand types.
    Operator(OperatorError),
    /// A single-parameter function has a different number of parameters.
    Arity { found: usize },
    /// The compiled function returns a different type than the caller needs.
    ResultType { expected: Ty, found: Ty },
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::NotAFunctionType(ty) => {
                write!(f, "type must be a function kind, got `{}`", ty)
            }
            CompileError::Type(e) => write!(f, "{}", e),
            CompileError::Polymorphic(ty) => {
                write!(f, "cannot compile polymorphic function `{}`", ty)
            }
            CompileError::UnsupportedNode { kind } if *kind == "ExpressionStatement" => write!(
                f,
                "statement does nothing, side effects are not supported by the compiler"
            ),
            CompileError::UnsupportedNode { kind } => write!(f, "unsupported node kind `{}`", kind),
            CompileError::Untyped { kind } => write!(f, "`{}` has no concrete type", kind),
            CompileError::MissingReturn => write!(f, "block has no return statement"),
            CompileError::Operator(e) => write!(f, "{}", e),
            CompileError::Arity { found } => write!(
                f,
                "function should only have a single parameter, got {}",
                found
            ),
            CompileError::ResultType { expected, found } => write!(
                f,
                "provided function does not evaluate to type {} (found `{}`)",
                expected.kind(),
                found
            ),
        }
    }
}

impl std::error::Error for CompileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CompileError::Type(e) => Some(e),
            CompileError::Operator(e) => Some(e),
            _ => None,
        }
    }
}

impl From<TypeError> for CompileError {
    fn from(e: TypeError) -> Self {
        CompileError::Type(e)
    }
}

impl From<OperatorError> for CompileError {
    fn from(e: OperatorError) -> Self {
        CompileError::Operator(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arity_display() {
        insta::assert_snapshot!(
            CompileError::Arity { found: 2 }.to_string(),
            @"function should only have a single parameter, got 2"
        );
    }

    #[test]
    fn result_type_display_names_expected_kind() {
        let err = CompileError::ResultType {
            expected: Ty::bool(),
            found: Ty::int(),
        };
        insta::assert_snapshot!(err.to_string(), @"provided function does not evaluate to type bool (found `int`)");
    }

    #[test]
    fn unsupported_node_display() {
        insta::assert_snapshot!(
            CompileError::UnsupportedNode { kind: "ExpressionStatement" }.to_string(),
            @"statement does nothing, side effects are not supported by the compiler"
        );
    }
}
