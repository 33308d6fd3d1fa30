//! Runtime values and operator tables for Rill.
//!
//! The compiler asks this crate two questions: what a value is ([`Value`],
//! [`Record`], [`Function`]), and how an operator applies to operands of
//! given types ([`lookup_binary_function`], [`lookup_unary_function`]).

pub mod binary;
pub mod error;
pub mod function;
pub mod unary;
pub mod value;

pub use binary::{lookup_binary_function, BinaryFuncSignature, BinaryFunction};
pub use error::{EvalError, OperatorError};
pub use function::{argument, Function, NativeFunction};
pub use unary::{lookup_unary_function, UnaryFunction};
pub use value::{Record, Value};
