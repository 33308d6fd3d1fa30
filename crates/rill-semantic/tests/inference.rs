//! Integration tests for inference, unification against a required type, and
//! annotation of the semantic tree.

use rill_semantic::ast::{
    BinaryOperator, Expression, FunctionBody, FunctionExpression, FunctionParameter, Statement,
};
use rill_semantic::{infer, Extern, ExternDeclaration, Ty, TyVar, TypeError};

// ── Helpers ────────────────────────────────────────────────────────────

/// `(r) => r.a + 1`
fn add_one_to_field() -> FunctionExpression {
    FunctionExpression::new(
        vec![FunctionParameter::new("r")],
        FunctionBody::expr(Expression::binary(
            BinaryOperator::Add,
            Expression::member(Expression::ident("r"), "a"),
            Expression::Integer(1),
        )),
    )
}

fn wrap(f: FunctionExpression) -> Extern {
    Extern {
        declarations: Vec::new(),
        block: f,
    }
}

// ── Tests ──────────────────────────────────────────────────────────────

#[test]
fn field_access_is_polymorphic_until_unified() {
    let mut ext = wrap(add_one_to_field());
    let mut poly = infer(&mut ext).expect("inference succeeds");
    assert!(poly.mono_type().is_none());

    let required = Ty::fun([("r", Ty::record([("a", Ty::int())]))], Ty::int());
    poly.unify(&required).expect("unification succeeds");
    assert_eq!(poly.mono_type(), Some(required));
}

#[test]
fn annotate_writes_concrete_types() {
    let mut ext = wrap(add_one_to_field());
    let mut poly = infer(&mut ext).unwrap();
    poly.unify(&Ty::fun(
        [("r", Ty::record([("a", Ty::float())]))],
        Ty::float(),
    ))
    .unwrap();
    poly.annotate(&mut ext.block);

    assert_eq!(ext.block.params[0].ty, Some(Ty::record([("a", Ty::float())])));
    match &ext.block.body {
        FunctionBody::Expression(e) => assert_eq!(e.ty(), Some(Ty::float())),
        other => panic!("expected expression body, got {:?}", other),
    }
}

#[test]
fn return_type_mismatch_is_reported() {
    let mut ext = wrap(add_one_to_field());
    let mut poly = infer(&mut ext).unwrap();
    let err = poly
        .unify(&Ty::fun(
            [("r", Ty::record([("a", Ty::int())]))],
            Ty::string(),
        ))
        .unwrap_err();
    assert!(matches!(err, TypeError::Mismatch { .. }), "got {:?}", err);
}

#[test]
fn required_variables_leave_function_polymorphic() {
    // (x) => x against (x: ?0) -> ?0
    let f = FunctionExpression::new(
        vec![FunctionParameter::new("x")],
        FunctionBody::expr(Expression::ident("x")),
    );
    let mut ext = wrap(f);
    let mut poly = infer(&mut ext).unwrap();
    poly.unify(&Ty::fun([("x", Ty::Var(TyVar(0)))], Ty::Var(TyVar(0))))
        .unwrap();
    assert!(poly.mono_type().is_none());
}

#[test]
fn defaults_make_parameters_optional() {
    // (x, y=10) => x + y
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
    let mut ext = wrap(f);
    let mut poly = infer(&mut ext).unwrap();
    poly.unify(&Ty::fun([("x", Ty::int())], Ty::int())).unwrap();
    let ty = poly.mono_type().expect("monomorphic");
    match ty {
        Ty::Fun(f) => {
            assert!(f.params["y"].optional);
            assert_eq!(f.params["y"].ty, Ty::int());
        }
        other => panic!("expected function, got {:?}", other),
    }
}

#[test]
fn unbound_identifier_fails() {
    let f = FunctionExpression::new(
        vec![FunctionParameter::new("r")],
        FunctionBody::expr(Expression::ident("missing")),
    );
    let err = infer(&mut wrap(f)).err().expect("inference fails");
    assert_eq!(
        err,
        TypeError::UnboundVariable {
            name: "missing".into()
        }
    );
}

#[test]
fn extern_declarations_are_visible() {
    // (r) => { v = double(n: r.a) return v }
    let f = FunctionExpression::new(
        vec![FunctionParameter::new("r")],
        FunctionBody::block(vec![
            Statement::var(
                "v",
                Expression::call(
                    Expression::ident("double"),
                    vec![("n", Expression::member(Expression::ident("r"), "a"))],
                ),
            ),
            Statement::ret(Expression::ident("v")),
        ]),
    );
    let mut ext = Extern {
        declarations: vec![ExternDeclaration {
            name: "double".into(),
            ty: Ty::fun([("n", Ty::int())], Ty::int()),
        }],
        block: f,
    };
    let mut poly = infer(&mut ext).unwrap();
    poly.unify(&Ty::fun([("r", Ty::record([("a", Ty::int())]))], Ty::Var(TyVar(0))))
        .unwrap();
    match poly.mono_type() {
        Some(Ty::Fun(f)) => assert_eq!(*f.ret, Ty::int()),
        other => panic!("expected monomorphic function, got {:?}", other),
    }
}

#[test]
fn unknown_argument_fails() {
    let f = FunctionExpression::new(
        vec![],
        FunctionBody::expr(Expression::call(
            Expression::ident("double"),
            vec![("m", Expression::Integer(1))],
        )),
    );
    let mut ext = Extern {
        declarations: vec![ExternDeclaration {
            name: "double".into(),
            ty: Ty::fun([("n", Ty::int())], Ty::int()),
        }],
        block: f,
    };
    assert!(matches!(
        infer(&mut ext),
        Err(TypeError::UnknownArgument { .. })
    ));
}

#[test]
fn block_without_return_fails() {
    let f = FunctionExpression::new(
        vec![],
        FunctionBody::block(vec![Statement::var("v", Expression::Integer(1))]),
    );
    assert!(matches!(
        infer(&mut wrap(f)),
        Err(TypeError::MissingReturn)
    ));
}
