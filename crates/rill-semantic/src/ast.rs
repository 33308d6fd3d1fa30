//! The semantic tree.
//!
//! A function body is a tree of expressions and statements. Expression nodes
//! carry an `Option<Ty>` slot that is empty when the tree is built and is
//! filled in by inference. The tree is `Clone` so one generic template can be
//! copied and annotated once per concrete instantiation.
//!
//! There is no parser in this crate; trees are built with the constructor
//! helpers on [`Expression`], [`Statement`] and [`FunctionExpression`].

use std::fmt;

use chrono::{DateTime, FixedOffset};
use regex::Regex;

use crate::ty::Ty;

// ── Operators ──────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    RegexMatch,
    NotRegexMatch,
}

impl BinaryOperator {
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
            BinaryOperator::Mod => "%",
            BinaryOperator::Eq => "==",
            BinaryOperator::NotEq => "!=",
            BinaryOperator::Lt => "<",
            BinaryOperator::LtEq => "<=",
            BinaryOperator::Gt => ">",
            BinaryOperator::GtEq => ">=",
            BinaryOperator::RegexMatch => "=~",
            BinaryOperator::NotRegexMatch => "!~",
        }
    }

    /// Arithmetic operators produce a value of their left operand's type;
    /// every other binary operator produces a bool.
    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinaryOperator::Add
                | BinaryOperator::Sub
                | BinaryOperator::Mul
                | BinaryOperator::Div
                | BinaryOperator::Mod
        )
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    Not,
    Neg,
    Exists,
}

impl UnaryOperator {
    pub fn as_str(self) -> &'static str {
        match self {
            UnaryOperator::Not => "not",
            UnaryOperator::Neg => "-",
            UnaryOperator::Exists => "exists",
        }
    }
}

impl fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum LogicalOperator {
    And,
    Or,
}

impl LogicalOperator {
    pub fn as_str(self) -> &'static str {
        match self {
            LogicalOperator::And => "and",
            LogicalOperator::Or => "or",
        }
    }
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Functions ──────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct FunctionExpression {
    pub params: Vec<FunctionParameter>,
    pub body: FunctionBody,
    pub ty: Option<Ty>,
}

#[derive(Clone, Debug)]
pub struct FunctionParameter {
    pub key: String,
    pub default: Option<Expression>,
    pub ty: Option<Ty>,
}

#[derive(Clone, Debug)]
pub enum FunctionBody {
    Expression(Box<Expression>),
    Block(Block),
}

impl FunctionExpression {
    pub fn new(params: Vec<FunctionParameter>, body: FunctionBody) -> Self {
        FunctionExpression {
            params,
            body,
            ty: None,
        }
    }
}

impl FunctionParameter {
    pub fn new(key: impl Into<String>) -> Self {
        FunctionParameter {
            key: key.into(),
            default: None,
            ty: None,
        }
    }

    pub fn with_default(key: impl Into<String>, default: Expression) -> Self {
        FunctionParameter {
            key: key.into(),
            default: Some(default),
            ty: None,
        }
    }
}

impl FunctionBody {
    pub fn expr(e: Expression) -> Self {
        FunctionBody::Expression(Box::new(e))
    }

    pub fn block(body: Vec<Statement>) -> Self {
        FunctionBody::Block(Block { body })
    }
}

// ── Statements ─────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct Block {
    pub body: Vec<Statement>,
}

impl Block {
    /// The terminal return statement, if the block ends with one.
    pub fn return_statement(&self) -> Option<&ReturnStatement> {
        match self.body.last() {
            Some(Statement::Return(r)) => Some(r),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub enum Statement {
    Variable(VariableDeclaration),
    Return(ReturnStatement),
    Expression(ExpressionStatement),
}

#[derive(Clone, Debug)]
pub struct VariableDeclaration {
    pub id: String,
    pub init: Expression,
}

#[derive(Clone, Debug)]
pub struct ReturnStatement {
    pub argument: Expression,
}

#[derive(Clone, Debug)]
pub struct ExpressionStatement {
    pub expression: Expression,
}

impl Statement {
    pub fn var(id: impl Into<String>, init: Expression) -> Self {
        Statement::Variable(VariableDeclaration {
            id: id.into(),
            init,
        })
    }

    pub fn ret(argument: Expression) -> Self {
        Statement::Return(ReturnStatement { argument })
    }

    pub fn expr(expression: Expression) -> Self {
        Statement::Expression(ExpressionStatement { expression })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Statement::Variable(_) => "VariableDeclaration",
            Statement::Return(_) => "ReturnStatement",
            Statement::Expression(_) => "ExpressionStatement",
        }
    }
}

// ── Expressions ────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub enum Expression {
    Identifier(IdentifierExpression),
    Member(MemberExpression),
    Unary(UnaryExpression),
    Logical(LogicalExpression),
    Binary(BinaryExpression),
    Call(CallExpression),
    Function(Box<FunctionExpression>),
    Object(ObjectExpression),
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Regexp(Regex),
    DateTime(DateTime<FixedOffset>),
}

#[derive(Clone, Debug)]
pub struct IdentifierExpression {
    pub name: String,
    pub ty: Option<Ty>,
}

#[derive(Clone, Debug)]
pub struct MemberExpression {
    pub object: Box<Expression>,
    pub property: String,
    pub ty: Option<Ty>,
}

#[derive(Clone, Debug)]
pub struct UnaryExpression {
    pub operator: UnaryOperator,
    pub argument: Box<Expression>,
    pub ty: Option<Ty>,
}

#[derive(Clone, Debug)]
pub struct LogicalExpression {
    pub operator: LogicalOperator,
    pub left: Box<Expression>,
    pub right: Box<Expression>,
    pub ty: Option<Ty>,
}

#[derive(Clone, Debug)]
pub struct BinaryExpression {
    pub operator: BinaryOperator,
    pub left: Box<Expression>,
    pub right: Box<Expression>,
    pub ty: Option<Ty>,
}

#[derive(Clone, Debug)]
pub struct CallExpression {
    pub callee: Box<Expression>,
    pub arguments: ObjectExpression,
    pub ty: Option<Ty>,
}

#[derive(Clone, Debug)]
pub struct ObjectExpression {
    pub properties: Vec<Property>,
    pub ty: Option<Ty>,
}

#[derive(Clone, Debug)]
pub struct Property {
    pub key: String,
    pub value: Expression,
}

impl ObjectExpression {
    pub fn new<S: Into<String>>(properties: Vec<(S, Expression)>) -> Self {
        ObjectExpression {
            properties: properties
                .into_iter()
                .map(|(key, value)| Property {
                    key: key.into(),
                    value,
                })
                .collect(),
            ty: None,
        }
    }
}

impl Expression {
    pub fn ident(name: impl Into<String>) -> Self {
        Expression::Identifier(IdentifierExpression {
            name: name.into(),
            ty: None,
        })
    }

    pub fn member(object: Expression, property: impl Into<String>) -> Self {
        Expression::Member(MemberExpression {
            object: Box::new(object),
            property: property.into(),
            ty: None,
        })
    }

    pub fn unary(operator: UnaryOperator, argument: Expression) -> Self {
        Expression::Unary(UnaryExpression {
            operator,
            argument: Box::new(argument),
            ty: None,
        })
    }

    pub fn logical(operator: LogicalOperator, left: Expression, right: Expression) -> Self {
        Expression::Logical(LogicalExpression {
            operator,
            left: Box::new(left),
            right: Box::new(right),
            ty: None,
        })
    }

    pub fn binary(operator: BinaryOperator, left: Expression, right: Expression) -> Self {
        Expression::Binary(BinaryExpression {
            operator,
            left: Box::new(left),
            right: Box::new(right),
            ty: None,
        })
    }

    pub fn call<S: Into<String>>(callee: Expression, arguments: Vec<(S, Expression)>) -> Self {
        Expression::Call(CallExpression {
            callee: Box::new(callee),
            arguments: ObjectExpression::new(arguments),
            ty: None,
        })
    }

    pub fn function(f: FunctionExpression) -> Self {
        Expression::Function(Box::new(f))
    }

    pub fn object<S: Into<String>>(properties: Vec<(S, Expression)>) -> Self {
        Expression::Object(ObjectExpression::new(properties))
    }

    pub fn string(s: impl Into<String>) -> Self {
        Expression::String(s.into())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Expression::Identifier(_) => "IdentifierExpression",
            Expression::Member(_) => "MemberExpression",
            Expression::Unary(_) => "UnaryExpression",
            Expression::Logical(_) => "LogicalExpression",
            Expression::Binary(_) => "BinaryExpression",
            Expression::Call(_) => "CallExpression",
            Expression::Function(_) => "FunctionExpression",
            Expression::Object(_) => "ObjectExpression",
            Expression::Boolean(_) => "BooleanLiteral",
            Expression::Integer(_) => "IntegerLiteral",
            Expression::Float(_) => "FloatLiteral",
            Expression::String(_) => "StringLiteral",
            Expression::Regexp(_) => "RegexpLiteral",
            Expression::DateTime(_) => "DateTimeLiteral",
        }
    }

    /// The node's type. Literals have an intrinsic type; every other node
    /// reports its annotation slot, which is `None` before inference.
    pub fn ty(&self) -> Option<Ty> {
        match self {
            Expression::Identifier(e) => e.ty.clone(),
            Expression::Member(e) => e.ty.clone(),
            Expression::Unary(e) => e.ty.clone(),
            Expression::Logical(e) => e.ty.clone(),
            Expression::Binary(e) => e.ty.clone(),
            Expression::Call(e) => e.ty.clone(),
            Expression::Function(e) => e.ty.clone(),
            Expression::Object(e) => e.ty.clone(),
            Expression::Boolean(_) => Some(Ty::bool()),
            Expression::Integer(_) => Some(Ty::int()),
            Expression::Float(_) => Some(Ty::float()),
            Expression::String(_) => Some(Ty::string()),
            Expression::Regexp(_) => Some(Ty::regexp()),
            Expression::DateTime(_) => Some(Ty::time()),
        }
    }
}

// ── Type slot traversal ────────────────────────────────────────────────

/// Visit every type slot in a function, children before parents.
pub fn walk_types_mut(f: &mut FunctionExpression, visit: &mut dyn FnMut(&mut Option<Ty>)) {
    for p in &mut f.params {
        if let Some(d) = &mut p.default {
            walk_expr_types_mut(d, visit);
        }
        visit(&mut p.ty);
    }
    match &mut f.body {
        FunctionBody::Expression(e) => walk_expr_types_mut(e, visit),
        FunctionBody::Block(b) => {
            for s in &mut b.body {
                match s {
                    Statement::Variable(v) => walk_expr_types_mut(&mut v.init, visit),
                    Statement::Return(r) => walk_expr_types_mut(&mut r.argument, visit),
                    Statement::Expression(e) => walk_expr_types_mut(&mut e.expression, visit),
                }
            }
        }
    }
    visit(&mut f.ty);
}

fn walk_object_types_mut(o: &mut ObjectExpression, visit: &mut dyn FnMut(&mut Option<Ty>)) {
    for p in &mut o.properties {
        walk_expr_types_mut(&mut p.value, visit);
    }
    visit(&mut o.ty);
}

fn walk_expr_types_mut(e: &mut Expression, visit: &mut dyn FnMut(&mut Option<Ty>)) {
    match e {
        Expression::Identifier(e) => visit(&mut e.ty),
        Expression::Member(e) => {
            walk_expr_types_mut(&mut e.object, visit);
            visit(&mut e.ty);
        }
        Expression::Unary(e) => {
            walk_expr_types_mut(&mut e.argument, visit);
            visit(&mut e.ty);
        }
        Expression::Logical(e) => {
            walk_expr_types_mut(&mut e.left, visit);
            walk_expr_types_mut(&mut e.right, visit);
            visit(&mut e.ty);
        }
        Expression::Binary(e) => {
            walk_expr_types_mut(&mut e.left, visit);
            walk_expr_types_mut(&mut e.right, visit);
            visit(&mut e.ty);
        }
        Expression::Call(e) => {
            walk_expr_types_mut(&mut e.callee, visit);
            walk_object_types_mut(&mut e.arguments, visit);
            visit(&mut e.ty);
        }
        Expression::Function(f) => walk_types_mut(f, visit),
        Expression::Object(o) => walk_object_types_mut(o, visit),
        Expression::Boolean(_)
        | Expression::Integer(_)
        | Expression::Float(_)
        | Expression::String(_)
        | Expression::Regexp(_)
        | Expression::DateTime(_) => {}
    }
}
