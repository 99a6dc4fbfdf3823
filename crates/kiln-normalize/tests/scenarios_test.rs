//! End-to-end normalization of complete initializers

mod common;

use common::*;
use kiln_ir::*;
use kiln_normalize::{Disposition, InitError, Outcome};

#[test]
fn test_defaults_in_declaration_order() {
    let ty = record("R", vec![int_field("a"), int_field("b")]);
    let mut method = init_method("R", vec![]);

    let (outcome, bag) = run(&ty, &mut method);

    assert_eq!(outcome, Outcome::Normalized);
    assert!(bag.is_empty());
    assert_eq!(
        body_text(&method),
        "\
var tmp1: int;
move(tmp1, _defaultOf(int));
set_member(this, \"a\", tmp1);
var tmp2: int;
move(tmp2, _defaultOf(int));
set_member(this, \"b\", tmp2);
this.complete();
"
    );
}

#[test]
fn test_explicit_then_default() {
    let ty = record(
        "R",
        vec![int_field("a"), int_field_with("b", plus(field("R", "a"), lit(1)))],
    );
    let mut method = init_method("R", vec![assign("R", "a", lit(5)), complete()]);

    let (outcome, bag) = run(&ty, &mut method);

    assert_eq!(outcome, Outcome::Normalized);
    assert!(bag.is_empty());
    assert_eq!(
        body_text(&method),
        "\
var tmp1: int;
=(tmp1, 5);
set_member(this, \"a\", tmp1);
var tmp2: int;
=(tmp2, +(get_member(this, \"a\"), 1));
set_member(this, \"b\", tmp2);
this.complete();
"
    );
}

#[test]
fn test_omitted_field_is_continuable() {
    let ty = record("R", vec![int_field("a"), FieldDecl::new("c"), int_field("d")]);
    let mut method = init_method("R", vec![]);

    let (outcome, bag) = run(&ty, &mut method);

    assert_eq!(outcome, Outcome::Normalized);
    let reported: Vec<_> = bag.iter().collect();
    assert_eq!(reported.len(), 1);
    assert_eq!(reported[0].disposition, Disposition::Continuable);
    assert!(matches!(
        &reported[0].error,
        InitError::OmittedFieldInit { field, .. } if field == "c"
    ));

    let text = body_text(&method);
    assert!(text.contains("set_member(this, \"a\", tmp1);"));
    assert!(text.contains("set_member(this, \"d\", tmp2);"));
    assert!(!text.contains("\"c\""));
}

#[test]
fn test_used_before_defined_aborts() {
    let ty = record("R", vec![int_field("b"), int_field("a")]);
    let mut method = init_method(
        "R",
        vec![assign("R", "b", plus(field("R", "a"), lit(1))), complete()],
    );
    let original = method.clone();

    let (outcome, bag) = run(&ty, &mut method);

    assert_eq!(outcome, Outcome::Aborted);
    assert!(bag.has_fatal());
    let error = bag.errors().next().unwrap();
    assert!(matches!(error, InitError::UsedBeforeDefined { field, .. } if field == "a"));
    assert_eq!(error.to_string(), "'a' used before defined (first used here)");
    assert_eq!(method, original);
}

#[test]
fn test_parent_field_before_super_init() {
    let base = AggregateType::new("B", AggregateKind::Class).with_field(int_field("p"));
    let ty = AggregateType::new("D", AggregateKind::Class)
        .with_field(int_field("q"))
        .with_parent(base);
    let mut method = init_method(
        "D",
        vec![assign("D", "q", plus(field("B", "p"), lit(1))), super_init(vec![])],
    );

    let (outcome, bag) = run(&ty, &mut method);

    assert_eq!(outcome, Outcome::Aborted);
    let error = bag.errors().next().unwrap();
    assert!(matches!(error, InitError::ParentFieldInPhase1 { field, .. } if field == "p"));
}

#[test]
fn test_reassignment_after_default_is_mutation() {
    let ty = record("R", vec![int_field("a"), int_field("b")]);
    let mut method = init_method(
        "R",
        vec![assign("R", "b", lit(2)), assign("R", "a", lit(3)), complete()],
    );

    let (outcome, bag) = run(&ty, &mut method);

    assert_eq!(outcome, Outcome::Normalized);
    assert!(bag.is_empty());
    assert_eq!(
        body_text(&method),
        "\
var tmp1: int;
move(tmp1, _defaultOf(int));
set_member(this, \"a\", tmp1);
var tmp2: int;
=(tmp2, 2);
set_member(this, \"b\", tmp2);
=(this.a, 3);
this.complete();
"
    );
}

#[test]
fn test_parent_fields_after_super_init() {
    let base = AggregateType::new("B", AggregateKind::Class).with_field(int_field("p"));
    let ty = AggregateType::new("D", AggregateKind::Class)
        .with_field(int_field("q"))
        .with_parent(base);
    let mut method = init_method(
        "D",
        vec![
            super_init(vec![lit(7)]),
            stmt(call("writeln", vec![field("B", "p"), field("D", "q")])),
        ],
    );

    let (outcome, bag) = run(&ty, &mut method);

    assert_eq!(outcome, Outcome::Normalized);
    assert!(bag.is_empty());
    assert_eq!(
        body_text(&method),
        "\
var tmp1: int;
move(tmp1, _defaultOf(int));
set_member(this, \"q\", tmp1);
super.init(7);
writeln(get_member(this, \"p\"), get_member(this, \"q\"));
"
    );
}

#[test]
fn test_super_init_arguments_see_local_fields() {
    let base = AggregateType::new("B", AggregateKind::Class).with_field(int_field("p"));
    let ty = AggregateType::new("D", AggregateKind::Class)
        .with_field(int_field("q"))
        .with_parent(base);
    let mut method = init_method("D", vec![super_init(vec![field("D", "q")])]);

    let (outcome, _) = run(&ty, &mut method);

    assert_eq!(outcome, Outcome::Normalized);
    assert!(body_text(&method).ends_with("super.init(get_member(this, \"q\"));\n"));
}

#[test]
fn test_completion_marker_allows_parent_access() {
    let base = AggregateType::new("B", AggregateKind::Class).with_field(int_field("p"));
    let ty = AggregateType::new("D", AggregateKind::Class)
        .with_field(int_field("q"))
        .with_parent(base);
    let mut method = init_method("D", vec![assign("D", "q", field("B", "p")), complete()]);

    let (outcome, bag) = run(&ty, &mut method);

    assert_eq!(outcome, Outcome::Normalized);
    assert!(bag.is_empty());
    assert!(body_text(&method).contains("=(tmp1, get_member(this, \"p\"));"));
}

#[test]
fn test_this_init_delegation() {
    let ty = record("R", vec![int_field("a"), int_field("b")]);
    let mut method = init_method("R", vec![this_init(vec![lit(1)]), assign("R", "a", lit(5))]);

    let (outcome, bag) = run(&ty, &mut method);

    assert_eq!(outcome, Outcome::Normalized);
    assert!(bag.is_empty());
    assert_eq!(body_text(&method), "this.init(1);\n=(this.a, 5);\n");
}

#[test]
fn test_field_init_before_this_init() {
    let ty = record("R", vec![int_field("a")]);
    let mut method = init_method("R", vec![assign("R", "a", lit(5)), this_init(vec![])]);

    let (outcome, bag) = run(&ty, &mut method);

    assert_eq!(outcome, Outcome::Aborted);
    assert!(matches!(
        bag.errors().next(),
        Some(InitError::FieldInitBeforeThisInit { field, .. }) if field == "a"
    ));
}

#[test]
fn test_compound_assignment_to_pending_field() {
    let ty = record("R", vec![int_field("a")]);
    let compound = stmt(call("+=", vec![field("R", "a"), lit(1)]));
    let mut method = init_method("R", vec![compound]);

    let (outcome, bag) = run(&ty, &mut method);

    assert_eq!(outcome, Outcome::Aborted);
    assert!(matches!(
        bag.errors().next(),
        Some(InitError::UsedBeforeDefined { field, .. }) if field == "a"
    ));
}

#[test]
fn test_member_assignment_by_this() {
    let ty = record("R", vec![int_field("a"), int_field("b")]);
    let by_member = stmt(Expr::assign(
        Expr::member(Expr::this(sp()), "b", sp()),
        lit(4),
        sp(),
    ));
    let mut method = init_method("R", vec![by_member]);

    let (outcome, _) = run(&ty, &mut method);

    assert_eq!(outcome, Outcome::Normalized);
    let text = body_text(&method);
    let a = text.find("set_member(this, \"a\"").unwrap();
    let b = text.find("set_member(this, \"b\"").unwrap();
    assert!(a < b);
    assert!(text.contains("=(tmp2, 4);"));
}

#[test]
fn test_outer_reference_becomes_formal() {
    let outer = FieldDecl::new("outer").with_flags(FieldFlags {
        outer: true,
        ..FieldFlags::default()
    });
    let ty = AggregateType::new("Inner", AggregateKind::Class)
        .with_outer("Outer")
        .with_field(outer)
        .with_field(int_field("x"));
    let mut method = init_method("Inner", vec![]);

    let (outcome, bag) = run(&ty, &mut method);

    assert_eq!(outcome, Outcome::Normalized);
    assert!(bag.is_empty());

    let formal = method.outer.as_ref().unwrap();
    assert_eq!(formal.name, "outer");
    assert_eq!(formal.ty, ValueType::class("Outer"));
    assert!(formal.generic);

    assert_eq!(
        method.pretty_print(),
        "\
proc Inner.init(outer: Outer) {
    set_member(this, \"outer\", outer);
    var tmp1: int;
    move(tmp1, _defaultOf(int));
    set_member(this, \"x\", tmp1);
    this.complete();
}
"
    );
}

#[test]
fn test_own_method_retargeted_in_default() {
    let ty = record(
        "R",
        vec![FieldDecl::new("w").with_init(call("helper", vec![]))],
    )
    .with_method("helper");
    let mut method = init_method("R", vec![]);

    let (outcome, _) = run(&ty, &mut method);

    assert_eq!(outcome, Outcome::Normalized);
    assert!(body_text(&method).contains("init_var(tmp1, this.helper());"));
}

#[test]
fn test_every_field_assigned_once() {
    let ty = record(
        "R",
        vec![int_field("a"), int_field("b"), int_field("c"), int_field("d")],
    );
    let mut method = init_method(
        "R",
        vec![assign("R", "c", lit(3)), assign("R", "a", lit(1)), complete()],
    );

    let (outcome, bag) = run(&ty, &mut method);

    assert_eq!(outcome, Outcome::Normalized);
    assert!(bag.is_empty());
    let text = body_text(&method);
    for name in ["a", "b", "c", "d"] {
        let set = format!("set_member(this, \"{}\"", name);
        assert_eq!(text.matches(&set).count(), 1, "field {}", name);
    }
}

#[test]
fn test_kept_statements_keep_their_spans() {
    let at = |line: usize| Span::new(line * 10, line * 10 + 8, line as u32, 5);
    let with_span = |stmt: Stmt, span: Span| match stmt {
        Stmt::Expr(s) => Stmt::Expr(ExprStmt { span, ..s }),
        other => other,
    };

    let ty = record("R", vec![int_field("a")]);
    let mut method = init_method(
        "R",
        vec![
            with_span(assign("R", "a", lit(1)), at(1)),
            with_span(stmt(call("log", vec![])), at(2)),
            with_span(assign("R", "a", lit(2)), at(3)),
            with_span(complete(), at(4)),
        ],
    );

    let (outcome, bag) = run(&ty, &mut method);

    assert_eq!(outcome, Outcome::Normalized);
    assert!(bag.is_empty());
    let kept: Vec<(String, Span)> = method
        .body
        .stmts
        .iter()
        .filter(|s| s.span() != sp())
        .map(|s| (s.pretty_print(), s.span()))
        .collect();
    assert_eq!(
        kept,
        vec![
            ("log();\n".to_string(), at(2)),
            ("=(this.a, 2);\n".to_string(), at(3)),
            ("this.complete();\n".to_string(), at(4)),
        ]
    );
}
