//! The unary operator table.

use rill_semantic::ast::UnaryOperator;
use rill_semantic::{Ty, TyCon};

use crate::error::{EvalError, OperatorError};
use crate::value::Value;

type UnaryImpl = fn(&Value) -> Result<Value, EvalError>;

/// A resolved unary operator.
#[derive(Clone, Debug)]
pub struct UnaryFunction {
    operator: UnaryOperator,
    ret: Ty,
    f: UnaryImpl,
}

impl UnaryFunction {
    pub fn ret(&self) -> &Ty {
        &self.ret
    }

    /// Apply the operator. `exists` inspects nulls; every other operator
    /// maps a null operand to a null result.
    pub fn call(&self, operand: &Value) -> Result<Value, EvalError> {
        if operand.is_null() && self.operator != UnaryOperator::Exists {
            return Ok(Value::Null(self.ret.clone()));
        }
        (self.f)(operand)
    }
}

/// Select the implementation of `operator` for an operand of type `operand`.
pub fn lookup_unary_function(
    operator: UnaryOperator,
    operand: &Ty,
) -> Result<UnaryFunction, OperatorError> {
    let (ret, f): (Ty, UnaryImpl) = match (operator, operand) {
        (UnaryOperator::Not, Ty::Con(TyCon::Bool)) => (Ty::bool(), not),
        (UnaryOperator::Neg, Ty::Con(TyCon::Int)) => (Ty::int(), neg_int),
        (UnaryOperator::Neg, Ty::Con(TyCon::Float)) => (Ty::float(), neg_float),
        (UnaryOperator::Exists, t) if t.is_mono() => (Ty::bool(), exists),
        _ => {
            return Err(OperatorError::NoUnaryFunction {
                operator,
                operand: operand.clone(),
            })
        }
    };
    Ok(UnaryFunction { operator, ret, f })
}

fn not(v: &Value) -> Result<Value, EvalError> {
    Ok(Value::Bool(!v.as_bool()?))
}

fn neg_int(v: &Value) -> Result<Value, EvalError> {
    v.as_int()?
        .checked_neg()
        .map(Value::Int)
        .ok_or(EvalError::Overflow { operator: "-" })
}

fn neg_float(v: &Value) -> Result<Value, EvalError> {
    match v {
        Value::Float(f) => Ok(Value::Float(-f)),
        other => Err(EvalError::unexpected("float", other)),
    }
}

fn exists(v: &Value) -> Result<Value, EvalError> {
    Ok(Value::Bool(!v.is_null()))
}
