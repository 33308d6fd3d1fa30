//! The binary operator table.
//!
//! Maps `(operator, left type, right type)` to an implementation. Lookups
//! happen once per expression when a function is compiled; the returned
//! [`BinaryFunction`] is then applied once per evaluation.
//!
//! Arithmetic results always have the left operand's type, so
//! `float + int` exists but `int + float` does not.

use std::cmp::Ordering;
use std::sync::OnceLock;

use rill_semantic::ast::BinaryOperator;
use rill_semantic::{Ty, TyCon};
use rustc_hash::FxHashMap;

use crate::error::{EvalError, OperatorError};
use crate::value::Value;

/// The key used to look up a binary operator.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BinaryFuncSignature {
    pub operator: BinaryOperator,
    pub left: Ty,
    pub right: Ty,
}

type BinaryImpl = fn(BinaryOperator, &Value, &Value) -> Result<Value, EvalError>;

/// A resolved binary operator.
#[derive(Copy, Clone, Debug)]
pub struct BinaryFunction {
    operator: BinaryOperator,
    ret: TyCon,
    f: BinaryImpl,
}

impl BinaryFunction {
    pub fn ret(&self) -> Ty {
        Ty::Con(self.ret)
    }

    /// Apply the operator. A null operand yields a null of the result type.
    pub fn call(&self, left: &Value, right: &Value) -> Result<Value, EvalError> {
        if left.is_null() || right.is_null() {
            return Ok(Value::Null(self.ret()));
        }
        (self.f)(self.operator, left, right)
    }
}

pub fn lookup_binary_function(sig: &BinaryFuncSignature) -> Result<BinaryFunction, OperatorError> {
    let not_found = || OperatorError::NoBinaryFunction {
        operator: sig.operator,
        left: sig.left.clone(),
        right: sig.right.clone(),
    };
    match (&sig.left, &sig.right) {
        (Ty::Con(l), Ty::Con(r)) => table()
            .get(&(sig.operator, *l, *r))
            .copied()
            .ok_or_else(not_found),
        _ => Err(not_found()),
    }
}

fn table() -> &'static FxHashMap<(BinaryOperator, TyCon, TyCon), BinaryFunction> {
    static TABLE: OnceLock<FxHashMap<(BinaryOperator, TyCon, TyCon), BinaryFunction>> =
        OnceLock::new();
    TABLE.get_or_init(build_table)
}

fn build_table() -> FxHashMap<(BinaryOperator, TyCon, TyCon), BinaryFunction> {
    use BinaryOperator::*;
    use TyCon::{Bool, Float, Int, Regexp, String, Time};

    let mut m = FxHashMap::default();
    let mut add = |operator, l, r, ret, f: BinaryImpl| {
        m.insert((operator, l, r), BinaryFunction { operator, ret, f });
    };

    for op in [Add, Sub, Mul, Div, Mod] {
        add(op, Int, Int, Int, int_arith);
        add(op, Float, Float, Float, float_arith);
        add(op, Float, Int, Float, float_arith);
    }
    add(Add, String, String, String, concat);

    let numeric = [(Int, Int), (Float, Float), (Int, Float), (Float, Int)];
    for op in [Eq, NotEq] {
        for (l, r) in numeric {
            add(op, l, r, Bool, compare);
        }
        add(op, Bool, Bool, Bool, compare);
        add(op, String, String, Bool, compare);
        add(op, Time, Time, Bool, compare);
    }
    for op in [Lt, LtEq, Gt, GtEq] {
        for (l, r) in numeric {
            add(op, l, r, Bool, compare);
        }
        add(op, String, String, Bool, compare);
        add(op, Time, Time, Bool, compare);
    }
    add(RegexMatch, String, Regexp, Bool, regex_match);
    add(NotRegexMatch, String, Regexp, Bool, regex_match);
    m
}

// ── Implementations ────────────────────────────────────────────────────

fn int_arith(op: BinaryOperator, l: &Value, r: &Value) -> Result<Value, EvalError> {
    let (l, r) = (l.as_int()?, r.as_int()?);
    let result = match op {
        BinaryOperator::Add => l.checked_add(r),
        BinaryOperator::Sub => l.checked_sub(r),
        BinaryOperator::Mul => l.checked_mul(r),
        BinaryOperator::Div if r == 0 => return Err(EvalError::DivisionByZero),
        BinaryOperator::Div => l.checked_div(r),
        BinaryOperator::Mod if r == 0 => return Err(EvalError::DivisionByZero),
        BinaryOperator::Mod => l.checked_rem(r),
        _ => None,
    };
    result
        .map(Value::Int)
        .ok_or(EvalError::Overflow {
            operator: op.as_str(),
        })
}

fn float_arith(op: BinaryOperator, l: &Value, r: &Value) -> Result<Value, EvalError> {
    let (l, r) = (l.as_float()?, r.as_float()?);
    let result = match op {
        BinaryOperator::Add => l + r,
        BinaryOperator::Sub => l - r,
        BinaryOperator::Mul => l * r,
        BinaryOperator::Div => l / r,
        BinaryOperator::Mod => l % r,
        _ => return Err(EvalError::UnexpectedType {
            expected: "arithmetic operator",
            found: Ty::float(),
        }),
    };
    Ok(Value::Float(result))
}

fn concat(_: BinaryOperator, l: &Value, r: &Value) -> Result<Value, EvalError> {
    let mut s = l.as_str()?.to_string();
    s.push_str(r.as_str()?);
    Ok(Value::String(s))
}

fn ordering(l: &Value, r: &Value) -> Result<Option<Ordering>, EvalError> {
    Ok(match (l, r) {
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Time(a), Value::Time(b)) => Some(a.cmp(b)),
        (Value::Float(_) | Value::Int(_), Value::Float(_) | Value::Int(_)) => {
            l.as_float()?.partial_cmp(&r.as_float()?)
        }
        (other, _) => return Err(EvalError::unexpected("comparable", other)),
    })
}

fn compare(op: BinaryOperator, l: &Value, r: &Value) -> Result<Value, EvalError> {
    let ord = ordering(l, r)?;
    let result = match (op, ord) {
        // NaN compares unequal to everything.
        (BinaryOperator::NotEq, None) => true,
        (_, None) => false,
        (BinaryOperator::Eq, Some(o)) => o == Ordering::Equal,
        (BinaryOperator::NotEq, Some(o)) => o != Ordering::Equal,
        (BinaryOperator::Lt, Some(o)) => o == Ordering::Less,
        (BinaryOperator::LtEq, Some(o)) => o != Ordering::Greater,
        (BinaryOperator::Gt, Some(o)) => o == Ordering::Greater,
        (BinaryOperator::GtEq, Some(o)) => o != Ordering::Less,
        (_, Some(_)) => false,
    };
    Ok(Value::Bool(result))
}

fn regex_match(op: BinaryOperator, l: &Value, r: &Value) -> Result<Value, EvalError> {
    let matched = r.as_regexp()?.is_match(l.as_str()?);
    Ok(Value::Bool(match op {
        BinaryOperator::NotRegexMatch => !matched,
        _ => matched,
    }))
}
