//! Runtime values.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use regex::Regex;
use rill_semantic::Ty;

use crate::error::EvalError;
use crate::function::Function;

/// A Rill runtime value. Every value knows its own type.
#[derive(Clone, Debug)]
pub enum Value {
    /// An absent value of a known type.
    Null(Ty),
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Regexp(Regex),
    Time(DateTime<Utc>),
    Record(Record),
    Function(Arc<dyn Function>),
}

impl Value {
    pub fn function(f: impl Function + 'static) -> Value {
        Value::Function(Arc::new(f))
    }

    pub fn ty(&self) -> Ty {
        match self {
            Value::Null(t) => t.clone(),
            Value::Bool(_) => Ty::bool(),
            Value::Int(_) => Ty::int(),
            Value::Float(_) => Ty::float(),
            Value::String(_) => Ty::string(),
            Value::Regexp(_) => Ty::regexp(),
            Value::Time(_) => Ty::time(),
            Value::Record(r) => r.ty(),
            Value::Function(f) => f.ty().clone(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null(_))
    }

    pub fn as_bool(&self) -> Result<bool, EvalError> {
        match self {
            Value::Bool(b) => Ok(*b),
            other => Err(EvalError::unexpected("bool", other)),
        }
    }

    pub fn as_int(&self) -> Result<i64, EvalError> {
        match self {
            Value::Int(i) => Ok(*i),
            other => Err(EvalError::unexpected("int", other)),
        }
    }

    /// Floats, with ints widened.
    pub fn as_float(&self) -> Result<f64, EvalError> {
        match self {
            Value::Float(f) => Ok(*f),
            Value::Int(i) => Ok(*i as f64),
            other => Err(EvalError::unexpected("float", other)),
        }
    }

    pub fn as_str(&self) -> Result<&str, EvalError> {
        match self {
            Value::String(s) => Ok(s),
            other => Err(EvalError::unexpected("string", other)),
        }
    }

    pub fn as_regexp(&self) -> Result<&Regex, EvalError> {
        match self {
            Value::Regexp(r) => Ok(r),
            other => Err(EvalError::unexpected("regexp", other)),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null(a), Value::Null(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Regexp(a), Value::Regexp(b)) => a.as_str() == b.as_str(),
            (Value::Time(a), Value::Time(b)) => a == b,
            (Value::Record(a), Value::Record(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Record> for Value {
    fn from(r: Record) -> Self {
        Value::Record(r)
    }
}

/// A record: named fields, iterated in name order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Record {
    fields: BTreeMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.fields.insert(name.into(), value);
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// The record type whose field types are exactly the values' types.
    pub fn ty(&self) -> Ty {
        Ty::Record(
            self.fields
                .iter()
                .map(|(k, v)| (k.clone(), v.ty()))
                .collect(),
        )
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Record {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}
