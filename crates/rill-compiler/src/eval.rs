//! The evaluator tree.
//!
//! An [`Evaluator`] is the executable form of one typed semantic-tree node.
//! Trees are built once by lowering and are immutable afterwards; each
//! invocation supplies its own [`Scope`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use regex::Regex;
use rill_semantic::ast::LogicalOperator;
use rill_semantic::{Ty, TyCon};
use rill_values::{BinaryFunction, EvalError, Function, Record, UnaryFunction, Value};

use crate::scope::Scope;

static BOOL: Ty = Ty::Con(TyCon::Bool);
static INT: Ty = Ty::Con(TyCon::Int);
static FLOAT: Ty = Ty::Con(TyCon::Float);
static STRING: Ty = Ty::Con(TyCon::String);
static REGEXP: Ty = Ty::Con(TyCon::Regexp);
static TIME: Ty = Ty::Con(TyCon::Time);

#[derive(Debug)]
pub enum Evaluator {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Regexp(Regex),
    Time(DateTime<Utc>),
    /// An early-bound built-in.
    Value(ValueEvaluator),
    Identifier(IdentifierEvaluator),
    Member(MemberEvaluator),
    Unary(UnaryEvaluator),
    Logical(LogicalEvaluator),
    Binary(BinaryEvaluator),
    Call(CallEvaluator),
    Function(Arc<FunctionEvaluator>),
    Object(ObjectEvaluator),
    Block(BlockEvaluator),
    Declaration(DeclarationEvaluator),
    Return(ReturnEvaluator),
}

#[derive(Debug)]
pub struct ValueEvaluator {
    pub ty: Ty,
    pub value: Value,
}

#[derive(Debug)]
pub struct IdentifierEvaluator {
    pub ty: Ty,
    pub name: String,
}

#[derive(Debug)]
pub struct MemberEvaluator {
    pub ty: Ty,
    pub object: Box<Evaluator>,
    pub property: String,
}

#[derive(Debug)]
pub struct UnaryEvaluator {
    pub ty: Ty,
    pub operand: Box<Evaluator>,
    pub f: UnaryFunction,
}

#[derive(Debug)]
pub struct LogicalEvaluator {
    pub operator: LogicalOperator,
    pub left: Box<Evaluator>,
    pub right: Box<Evaluator>,
}

#[derive(Debug)]
pub struct BinaryEvaluator {
    pub ty: Ty,
    pub left: Box<Evaluator>,
    pub right: Box<Evaluator>,
    pub f: BinaryFunction,
}

#[derive(Debug)]
pub struct CallEvaluator {
    pub ty: Ty,
    pub callee: Box<Evaluator>,
    pub args: ObjectEvaluator,
}

#[derive(Debug)]
pub struct ObjectEvaluator {
    pub ty: Ty,
    pub properties: Vec<(String, Evaluator)>,
}

/// A block body. `statements` holds everything before the terminal return.
#[derive(Debug)]
pub struct BlockEvaluator {
    pub statements: Vec<Evaluator>,
    pub ret: ReturnEvaluator,
}

#[derive(Debug)]
pub struct DeclarationEvaluator {
    pub id: String,
    pub init: Box<Evaluator>,
}

#[derive(Debug)]
pub struct ReturnEvaluator {
    pub argument: Box<Evaluator>,
}

#[derive(Debug)]
pub struct FunctionParam {
    pub name: String,
    pub ty: Ty,
    pub default: Option<Evaluator>,
}

/// A lowered function literal.
#[derive(Debug)]
pub struct FunctionEvaluator {
    pub ty: Ty,
    pub params: Vec<FunctionParam>,
    pub body: Box<Evaluator>,
}

impl Evaluator {
    /// The resolved type of the node this evaluator was lowered from.
    pub fn ty(&self) -> &Ty {
        match self {
            Evaluator::Boolean(_) => &BOOL,
            Evaluator::Integer(_) => &INT,
            Evaluator::Float(_) => &FLOAT,
            Evaluator::String(_) => &STRING,
            Evaluator::Regexp(_) => &REGEXP,
            Evaluator::Time(_) => &TIME,
            Evaluator::Value(e) => &e.ty,
            Evaluator::Identifier(e) => &e.ty,
            Evaluator::Member(e) => &e.ty,
            Evaluator::Unary(e) => &e.ty,
            Evaluator::Logical(_) => &BOOL,
            Evaluator::Binary(e) => &e.ty,
            Evaluator::Call(e) => &e.ty,
            Evaluator::Function(f) => &f.ty,
            Evaluator::Object(o) => &o.ty,
            Evaluator::Block(b) => b.ret.argument.ty(),
            Evaluator::Declaration(d) => d.init.ty(),
            Evaluator::Return(r) => r.argument.ty(),
        }
    }

    pub fn eval(&self, scope: &mut Scope) -> Result<Value, EvalError> {
        match self {
            Evaluator::Boolean(b) => Ok(Value::Bool(*b)),
            Evaluator::Integer(i) => Ok(Value::Int(*i)),
            Evaluator::Float(f) => Ok(Value::Float(*f)),
            Evaluator::String(s) => Ok(Value::String(s.clone())),
            Evaluator::Regexp(r) => Ok(Value::Regexp(r.clone())),
            Evaluator::Time(t) => Ok(Value::Time(*t)),
            Evaluator::Value(e) => Ok(e.value.clone()),
            Evaluator::Identifier(e) => {
                scope
                    .lookup(&e.name)
                    .cloned()
                    .ok_or_else(|| EvalError::IdentifierNotFound {
                        name: e.name.clone(),
                    })
            }
            Evaluator::Member(e) => match e.object.eval(scope)? {
                Value::Record(r) => {
                    r.get(&e.property)
                        .cloned()
                        .ok_or_else(|| EvalError::NoSuchProperty {
                            property: e.property.clone(),
                            record: r.ty(),
                        })
                }
                other => Err(EvalError::NotARecord {
                    property: e.property.clone(),
                    found: other.ty(),
                }),
            },
            Evaluator::Unary(e) => {
                let operand = e.operand.eval(scope)?;
                e.f.call(&operand)
            }
            Evaluator::Logical(e) => {
                let left = e.left.eval(scope)?.as_bool()?;
                let right = e.right.eval(scope)?.as_bool()?;
                Ok(Value::Bool(match e.operator {
                    LogicalOperator::And => left && right,
                    LogicalOperator::Or => left || right,
                }))
            }
            Evaluator::Binary(e) => {
                let left = e.left.eval(scope)?;
                let right = e.right.eval(scope)?;
                e.f.call(&left, &right)
            }
            Evaluator::Call(e) => {
                let callee = e.callee.eval(scope)?;
                let args = e.args.eval_record(scope)?;
                match callee {
                    Value::Function(f) => f.call(&args),
                    other => Err(EvalError::NotCallable { found: other.ty() }),
                }
            }
            Evaluator::Function(f) => Ok(Value::function(Closure {
                func: Arc::clone(f),
                captured: scope.snapshot(),
            })),
            Evaluator::Object(o) => o.eval_record(scope).map(Value::Record),
            Evaluator::Block(b) => {
                for stmt in &b.statements {
                    if let Evaluator::Return(r) = stmt {
                        return r.argument.eval(scope);
                    }
                    stmt.eval(scope)?;
                }
                b.ret.argument.eval(scope)
            }
            Evaluator::Declaration(d) => {
                let value = d.init.eval(scope)?;
                scope.set(d.id.clone(), value.clone());
                Ok(value)
            }
            Evaluator::Return(r) => r.argument.eval(scope),
        }
    }
}

impl ObjectEvaluator {
    pub fn eval_record(&self, scope: &mut Scope) -> Result<Record, EvalError> {
        let mut record = Record::new();
        for (key, value) in &self.properties {
            record.insert(key.clone(), value.eval(scope)?);
        }
        Ok(record)
    }
}

impl FunctionEvaluator {
    pub fn ty(&self) -> &Ty {
        &self.ty
    }

    /// Invoke the function body with `args` bound over `parent`.
    ///
    /// Missing optional parameters are filled by evaluating their defaults
    /// in `parent`; a missing parameter without a default is an error.
    /// Extra arguments are ignored.
    pub fn call(&self, parent: &Arc<Scope>, args: &Record) -> Result<Value, EvalError> {
        let mut scope = Scope::nest(Arc::clone(parent));
        for p in &self.params {
            let value = match (args.get(&p.name), &p.default) {
                (Some(v), _) => v.clone(),
                (None, Some(default)) => default.eval(&mut Scope::nest(Arc::clone(parent)))?,
                (None, None) => {
                    return Err(EvalError::MissingArgument {
                        name: p.name.clone(),
                    })
                }
            };
            scope.set(p.name.clone(), value);
        }
        self.body.eval(&mut scope)
    }
}

/// A function value: a lowered function literal plus the scope it was
/// created in.
#[derive(Debug)]
pub struct Closure {
    func: Arc<FunctionEvaluator>,
    captured: Arc<Scope>,
}

impl Function for Closure {
    fn ty(&self) -> &Ty {
        &self.func.ty
    }

    fn call(&self, args: &Record) -> Result<Value, EvalError> {
        self.func.call(&self.captured, args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rill_semantic::ast::BinaryOperator;
    use rill_values::{lookup_binary_function, BinaryFuncSignature};

    fn ident(name: &str, ty: Ty) -> Box<Evaluator> {
        Box::new(Evaluator::Identifier(IdentifierEvaluator {
            ty,
            name: name.to_string(),
        }))
    }

    #[test]
    fn identifier_not_found() {
        let e = ident("x", Ty::int());
        assert_eq!(
            e.eval(&mut Scope::new()),
            Err(EvalError::IdentifierNotFound { name: "x".into() })
        );
    }

    #[test]
    fn member_of_non_record() {
        let e = Evaluator::Member(MemberEvaluator {
            ty: Ty::int(),
            object: ident("r", Ty::int()),
            property: "a".into(),
        });
        let mut scope: Scope = [("r", Value::Int(1))].into_iter().collect();
        assert_eq!(
            e.eval(&mut scope),
            Err(EvalError::NotARecord {
                property: "a".into(),
                found: Ty::int(),
            })
        );
    }

    #[test]
    fn call_of_non_function() {
        let e = Evaluator::Call(CallEvaluator {
            ty: Ty::int(),
            callee: Box::new(Evaluator::Integer(3)),
            args: ObjectEvaluator {
                ty: Ty::Record(Default::default()),
                properties: Vec::new(),
            },
        });
        assert_eq!(
            e.eval(&mut Scope::new()),
            Err(EvalError::NotCallable { found: Ty::int() })
        );
    }

    #[test]
    fn logical_evaluates_both_operands() {
        let e = Evaluator::Logical(LogicalEvaluator {
            operator: LogicalOperator::And,
            left: Box::new(Evaluator::Boolean(false)),
            right: ident("missing", Ty::bool()),
        });
        assert_eq!(
            e.eval(&mut Scope::new()),
            Err(EvalError::IdentifierNotFound {
                name: "missing".into()
            })
        );
    }

    #[test]
    fn block_declarations_are_visible_to_later_statements() {
        let add = lookup_binary_function(&BinaryFuncSignature {
            operator: BinaryOperator::Add,
            left: Ty::int(),
            right: Ty::int(),
        })
        .unwrap();
        let block = Evaluator::Block(BlockEvaluator {
            statements: vec![Evaluator::Declaration(DeclarationEvaluator {
                id: "y".into(),
                init: Box::new(Evaluator::Integer(2)),
            })],
            ret: ReturnEvaluator {
                argument: Box::new(Evaluator::Binary(BinaryEvaluator {
                    ty: Ty::int(),
                    left: ident("y", Ty::int()),
                    right: Box::new(Evaluator::Integer(40)),
                    f: add,
                })),
            },
        });
        assert_eq!(block.ty(), &Ty::int());
        assert_eq!(block.eval(&mut Scope::new()), Ok(Value::Int(42)));
    }

    #[test]
    fn missing_required_argument() {
        let f = FunctionEvaluator {
            ty: Ty::fun([("x", Ty::int())], Ty::int()),
            params: vec![FunctionParam {
                name: "x".into(),
                ty: Ty::int(),
                default: None,
            }],
            body: ident("x", Ty::int()),
        };
        assert_eq!(
            f.call(&Arc::new(Scope::new()), &Record::new()),
            Err(EvalError::MissingArgument { name: "x".into() })
        );
    }
}
