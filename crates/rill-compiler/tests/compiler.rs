//! End-to-end tests: build a semantic tree, compile it for a type, evaluate.

use chrono::{DateTime, TimeZone, Utc};
use regex::Regex;
use rill_compiler::{compile, CompileError, Scope};
use rill_semantic::ast::{
    BinaryOperator, Expression, FunctionBody, FunctionExpression, FunctionParameter,
    LogicalOperator, Statement, UnaryOperator,
};
use rill_semantic::{Ty, TyVar, TypeError};
use rill_values::{argument, EvalError, NativeFunction, OperatorError, Record, Value};

// ── Helpers ────────────────────────────────────────────────────────────

fn func(params: &[&str], body: Expression) -> FunctionExpression {
    FunctionExpression::new(
        params.iter().map(|p| FunctionParameter::new(*p)).collect(),
        FunctionBody::expr(body),
    )
}

fn field(record: &str, property: &str) -> Expression {
    Expression::member(Expression::ident(record), property)
}

/// `(r) => r.a + 1`
fn add_one_to_field() -> FunctionExpression {
    func(
        &["r"],
        Expression::binary(BinaryOperator::Add, field("r", "a"), Expression::Integer(1)),
    )
}

fn record_input(fields: Vec<(&str, Value)>) -> Record {
    [("r", Value::Record(fields.into_iter().collect()))]
        .into_iter()
        .collect()
}

fn var(n: u32) -> Ty {
    Ty::Var(TyVar(n))
}

// ── Binding and evaluation ─────────────────────────────────────────────

#[test]
fn int_field_plus_one() {
    let ty = Ty::fun([("r", Ty::record([("a", Ty::int())]))], Ty::int());
    let compiled = compile(&add_one_to_field(), &ty, &Scope::new()).unwrap();
    assert_eq!(compiled.ty(), &ty);
    assert_eq!(
        compiled.eval(&record_input(vec![("a", Value::Int(5))])),
        Ok(Value::Int(6))
    );
}

#[test]
fn float_field_plus_one() {
    let ty = Ty::fun([("r", Ty::record([("a", Ty::float())]))], Ty::float());
    let compiled = compile(&add_one_to_field(), &ty, &Scope::new()).unwrap();
    assert_eq!(
        compiled.eval_float(&record_input(vec![("a", Value::Float(5.0))])),
        Ok(6.0)
    );
}

#[test]
fn return_type_is_resolved_from_the_body() {
    let required = Ty::fun([("r", Ty::record([("a", Ty::int())]))], var(7));
    let compiled = compile(&add_one_to_field(), &required, &Scope::new()).unwrap();
    assert_eq!(
        compiled.ty(),
        &Ty::fun([("r", Ty::record([("a", Ty::int())]))], Ty::int())
    );
}

#[test]
fn compiling_does_not_touch_the_input_tree() {
    let f = add_one_to_field();
    let ty = Ty::fun([("r", Ty::record([("a", Ty::int())]))], Ty::int());
    compile(&f, &ty, &Scope::new()).unwrap();
    assert!(f.ty.is_none());
    assert!(f.params[0].ty.is_none());
}

#[test]
fn regex_match_on_string_field() {
    // (r) => r.host =~ /^web/ and not (r.host == "web-canary")
    let f = func(
        &["r"],
        Expression::logical(
            LogicalOperator::And,
            Expression::binary(
                BinaryOperator::RegexMatch,
                field("r", "host"),
                Expression::Regexp(Regex::new("^web").unwrap()),
            ),
            Expression::unary(
                UnaryOperator::Not,
                Expression::binary(
                    BinaryOperator::Eq,
                    field("r", "host"),
                    Expression::string("web-canary"),
                ),
            ),
        ),
    );
    let ty = Ty::fun([("r", Ty::record([("host", Ty::string())]))], Ty::bool());
    let compiled = compile(&f, &ty, &Scope::new()).unwrap();

    let host = |h: &str| record_input(vec![("host", Value::from(h))]);
    assert_eq!(compiled.eval_bool(&host("web-01")), Ok(true));
    assert_eq!(compiled.eval_bool(&host("web-canary")), Ok(false));
    assert_eq!(compiled.eval_bool(&host("db-01")), Ok(false));
}

#[test]
fn time_literal_comparison() {
    // (r) => r.t > 2024-01-01T00:00:00+02:00
    let cutoff = DateTime::parse_from_rfc3339("2024-01-01T00:00:00+02:00").unwrap();
    let f = func(
        &["r"],
        Expression::binary(BinaryOperator::Gt, field("r", "t"), Expression::DateTime(cutoff)),
    );
    let ty = Ty::fun([("r", Ty::record([("t", Ty::time())]))], Ty::bool());
    let compiled = compile(&f, &ty, &Scope::new()).unwrap();

    let at = |t: DateTime<Utc>| record_input(vec![("t", Value::Time(t))]);
    let before = Utc.with_ymd_and_hms(2023, 12, 31, 21, 0, 0).unwrap();
    let after = Utc.with_ymd_and_hms(2023, 12, 31, 23, 0, 0).unwrap();
    assert_eq!(compiled.eval_bool(&at(before)), Ok(false));
    assert_eq!(compiled.eval_bool(&at(after)), Ok(true));
}

#[test]
fn object_literal_result() {
    // (r) => {total: r.a * 2, name: "x"}
    let f = func(
        &["r"],
        Expression::object(vec![
            (
                "total",
                Expression::binary(BinaryOperator::Mul, field("r", "a"), Expression::Integer(2)),
            ),
            ("name", Expression::string("x")),
        ]),
    );
    let out = Ty::record([("total", Ty::int()), ("name", Ty::string())]);
    let ty = Ty::fun([("r", Ty::record([("a", Ty::int())]))], out);
    let compiled = compile(&f, &ty, &Scope::new()).unwrap();

    let record = compiled
        .eval_record(&record_input(vec![("a", Value::Int(4))]))
        .unwrap();
    assert_eq!(record.get("total"), Some(&Value::Int(8)));
    assert_eq!(record.get("name"), Some(&Value::from("x")));
}

#[test]
fn block_with_declarations() {
    // (x) => { y = x * 2; return y + 1 }
    let f = FunctionExpression::new(
        vec![FunctionParameter::new("x")],
        FunctionBody::block(vec![
            Statement::var(
                "y",
                Expression::binary(BinaryOperator::Mul, Expression::ident("x"), Expression::Integer(2)),
            ),
            Statement::ret(Expression::binary(
                BinaryOperator::Add,
                Expression::ident("y"),
                Expression::Integer(1),
            )),
        ]),
    );
    let compiled = compile(&f, &Ty::fun([("x", Ty::int())], Ty::int()), &Scope::new()).unwrap();
    let input: Record = [("x", Value::Int(20))].into_iter().collect();
    assert_eq!(compiled.eval_int(&input), Ok(41));
}

#[test]
fn default_parameter_fills_missing_argument() {
    // (x, y = 10) => x + y
    let f = FunctionExpression::new(
        vec![
            FunctionParameter::new("x"),
            FunctionParameter::with_default("y", Expression::Integer(10)),
        ],
        FunctionBody::expr(Expression::binary(
            BinaryOperator::Add,
            Expression::ident("x"),
            Expression::ident("y"),
        )),
    );
    let compiled = compile(&f, &Ty::fun([("x", Ty::int())], Ty::int()), &Scope::new()).unwrap();

    let only_x: Record = [("x", Value::Int(3))].into_iter().collect();
    assert_eq!(compiled.eval_int(&only_x), Ok(13));
    let both: Record = [("x", Value::Int(3)), ("y", Value::Int(4))]
        .into_iter()
        .collect();
    assert_eq!(compiled.eval_int(&both), Ok(7));
}

#[test]
fn nested_function_captures_enclosing_parameter() {
    // (x) => { add = (y) => x + y; return add(y: 1) }
    let add = FunctionExpression::new(
        vec![FunctionParameter::new("y")],
        FunctionBody::expr(Expression::binary(
            BinaryOperator::Add,
            Expression::ident("x"),
            Expression::ident("y"),
        )),
    );
    let f = FunctionExpression::new(
        vec![FunctionParameter::new("x")],
        FunctionBody::block(vec![
            Statement::var("add", Expression::function(add)),
            Statement::ret(Expression::call(
                Expression::ident("add"),
                vec![("y", Expression::Integer(1))],
            )),
        ]),
    );
    let compiled = compile(&f, &Ty::fun([("x", Ty::int())], Ty::int()), &Scope::new()).unwrap();
    let input: Record = [("x", Value::Int(5))].into_iter().collect();
    assert_eq!(compiled.eval_int(&input), Ok(6));
}

// ── Built-ins ──────────────────────────────────────────────────────────

fn builtins() -> Scope {
    let double = NativeFunction::new("double", Ty::fun([("n", Ty::int())], Ty::int()), |args| {
        let n = argument("double", args, "n")?.as_int()?;
        Ok(Value::Int(n * 2))
    });
    [
        ("double", Value::function(double)),
        ("limit", Value::Int(100)),
    ]
    .into_iter()
    .collect()
}

#[test]
fn native_builtin_is_called() {
    // (x) => double(n: x) + 1
    let f = func(
        &["x"],
        Expression::binary(
            BinaryOperator::Add,
            Expression::call(Expression::ident("double"), vec![("n", Expression::ident("x"))]),
            Expression::Integer(1),
        ),
    );
    let compiled = compile(&f, &Ty::fun([("x", Ty::int())], Ty::int()), &builtins()).unwrap();
    let input: Record = [("x", Value::Int(20))].into_iter().collect();
    assert_eq!(compiled.eval_int(&input), Ok(41));
}

#[test]
fn builtin_value_is_bound_at_compile_time() {
    // (x) => x < limit
    let f = func(
        &["x"],
        Expression::binary(BinaryOperator::Lt, Expression::ident("x"), Expression::ident("limit")),
    );
    let compiled = compile(&f, &Ty::fun([("x", Ty::int())], Ty::bool()), &builtins()).unwrap();
    let x = |n: i64| -> Record { [("x", Value::Int(n))].into_iter().collect() };
    assert_eq!(compiled.eval_bool(&x(99)), Ok(true));
    assert_eq!(compiled.eval_bool(&x(100)), Ok(false));
}

#[test]
fn parameter_shadows_builtin() {
    // (limit) => limit + "!" with a string-typed limit
    let f = func(
        &["limit"],
        Expression::binary(
            BinaryOperator::Add,
            Expression::ident("limit"),
            Expression::string("!"),
        ),
    );
    let compiled = compile(
        &f,
        &Ty::fun([("limit", Ty::string())], Ty::string()),
        &builtins(),
    )
    .unwrap();
    let input: Record = [("limit", Value::from("go"))].into_iter().collect();
    assert_eq!(compiled.eval_string(&input), Ok("go!".to_string()));
}

// ── Compile errors ─────────────────────────────────────────────────────

#[test]
fn required_type_must_be_a_function() {
    let err = compile(&add_one_to_field(), &Ty::int(), &Scope::new()).unwrap_err();
    assert_eq!(err, CompileError::NotAFunctionType(Ty::int()));
    insta::assert_snapshot!(err.to_string(), @"type must be a function kind, got `int`");
}

#[test]
fn open_parameter_type_is_polymorphic() {
    let required = Ty::fun([("r", var(0))], var(1));
    let err = compile(&add_one_to_field(), &required, &Scope::new()).unwrap_err();
    assert!(matches!(err, CompileError::Polymorphic(_)), "{err}");
}

#[test]
fn identity_is_polymorphic_without_a_concrete_parameter() {
    let required = Ty::fun([("x", var(0))], var(0));
    let err = compile(&func(&["x"], Expression::ident("x")), &required, &Scope::new()).unwrap_err();
    assert!(matches!(err, CompileError::Polymorphic(_)), "{err}");
}

#[test]
fn return_type_mismatch_is_a_type_error() {
    let required = Ty::fun([("r", Ty::record([("a", Ty::int())]))], Ty::string());
    let err = compile(&add_one_to_field(), &required, &Scope::new()).unwrap_err();
    assert!(
        matches!(err, CompileError::Type(TypeError::Mismatch { .. })),
        "{err}"
    );
}

#[test]
fn required_parameter_missing_from_body() {
    let required = Ty::fun(
        [("r", Ty::record([("a", Ty::int())])), ("extra", Ty::int())],
        Ty::int(),
    );
    let err = compile(&add_one_to_field(), &required, &Scope::new()).unwrap_err();
    assert!(
        matches!(err, CompileError::Type(TypeError::MissingParameter { .. })),
        "{err}"
    );
}

#[test]
fn field_missing_from_required_record() {
    let required = Ty::fun([("r", Ty::record([("b", Ty::int())]))], Ty::int());
    let err = compile(&add_one_to_field(), &required, &Scope::new()).unwrap_err();
    assert!(
        matches!(err, CompileError::Type(TypeError::NoSuchField { .. })),
        "{err}"
    );
}

#[test]
fn int_plus_string_has_no_operator() {
    // (r) => r.a + "x"
    let f = func(
        &["r"],
        Expression::binary(BinaryOperator::Add, field("r", "a"), Expression::string("x")),
    );
    let required = Ty::fun([("r", Ty::record([("a", Ty::int())]))], Ty::int());
    let err = compile(&f, &required, &Scope::new()).unwrap_err();
    assert_eq!(
        err,
        CompileError::Operator(OperatorError::NoBinaryFunction {
            operator: BinaryOperator::Add,
            left: Ty::int(),
            right: Ty::string(),
        })
    );
}

#[test]
fn expression_statement_is_unsupported() {
    // (x) => { x + 1; return x }
    let f = FunctionExpression::new(
        vec![FunctionParameter::new("x")],
        FunctionBody::block(vec![
            Statement::expr(Expression::binary(
                BinaryOperator::Add,
                Expression::ident("x"),
                Expression::Integer(1),
            )),
            Statement::ret(Expression::ident("x")),
        ]),
    );
    let err = compile(&f, &Ty::fun([("x", Ty::int())], Ty::int()), &Scope::new()).unwrap_err();
    assert_eq!(
        err,
        CompileError::UnsupportedNode {
            kind: "ExpressionStatement"
        }
    );
}

#[test]
fn field_read_statement_is_unsupported_for_any_required_type() {
    // (r) => { r.a; return r.a }
    let f = FunctionExpression::new(
        vec![FunctionParameter::new("r")],
        FunctionBody::block(vec![
            Statement::expr(field("r", "a")),
            Statement::ret(field("r", "a")),
        ]),
    );
    let mut required: Vec<Ty> = [Ty::int(), Ty::float(), Ty::string()]
        .into_iter()
        .map(|t| Ty::fun([("r", Ty::record([("a", t.clone())]))], t))
        .collect();
    required.push(Ty::fun([("r", Ty::record([("a", Ty::int())]))], var(0)));

    for ty in &required {
        let err = compile(&f, ty, &Scope::new()).unwrap_err();
        assert_eq!(
            err,
            CompileError::UnsupportedNode {
                kind: "ExpressionStatement"
            },
            "{ty}"
        );
    }
}

#[test]
fn nested_function_with_unconstrained_parameter_is_polymorphic() {
    // (x) => { f = (y) => y; return x }
    let identity = FunctionExpression::new(
        vec![FunctionParameter::new("y")],
        FunctionBody::expr(Expression::ident("y")),
    );
    let f = FunctionExpression::new(
        vec![FunctionParameter::new("x")],
        FunctionBody::block(vec![
            Statement::var("f", Expression::function(identity)),
            Statement::ret(Expression::ident("x")),
        ]),
    );
    let err = compile(&f, &Ty::fun([("x", Ty::int())], Ty::int()), &Scope::new()).unwrap_err();
    assert!(matches!(err, CompileError::Polymorphic(_)), "{err}");
}

// ── Runtime errors ─────────────────────────────────────────────────────

#[test]
fn division_by_zero_at_runtime() {
    // (x) => 10 / x
    let f = func(
        &["x"],
        Expression::binary(BinaryOperator::Div, Expression::Integer(10), Expression::ident("x")),
    );
    let compiled = compile(&f, &Ty::fun([("x", Ty::int())], Ty::int()), &Scope::new()).unwrap();
    let zero: Record = [("x", Value::Int(0))].into_iter().collect();
    assert_eq!(compiled.eval(&zero), Err(EvalError::DivisionByZero));
}

#[test]
fn missing_input_argument() {
    let ty = Ty::fun([("r", Ty::record([("a", Ty::int())]))], Ty::int());
    let compiled = compile(&add_one_to_field(), &ty, &Scope::new()).unwrap();
    assert_eq!(
        compiled.eval(&Record::new()),
        Err(EvalError::MissingArgument { name: "r".into() })
    );
}

#[test]
fn missing_input_property() {
    let ty = Ty::fun([("r", Ty::record([("a", Ty::int())]))], Ty::int());
    let compiled = compile(&add_one_to_field(), &ty, &Scope::new()).unwrap();
    let err = compiled
        .eval(&record_input(vec![("b", Value::Int(1))]))
        .unwrap_err();
    assert_eq!(
        err,
        EvalError::NoSuchProperty {
            property: "a".into(),
            record: Ty::record([("b", Ty::int())]),
        }
    );
}

#[test]
fn null_input_propagates_through_arithmetic() {
    let ty = Ty::fun([("r", Ty::record([("a", Ty::int())]))], Ty::int());
    let compiled = compile(&add_one_to_field(), &ty, &Scope::new()).unwrap();
    assert_eq!(
        compiled.eval(&record_input(vec![("a", Value::Null(Ty::int()))])),
        Ok(Value::Null(Ty::int()))
    );
}
