//! Shared builders for the normalization tests

#![allow(dead_code)]

use kiln_ir::*;
use kiln_normalize::{normalize_initializer, DiagnosticBag, NormalizeConfig, Outcome};

pub fn sp() -> Span {
    Span::dummy()
}

pub fn int() -> ValueType {
    ValueType::scalar(ScalarKind::Int)
}

pub fn type_ref(ty: &ValueType) -> Expr {
    Expr::sym(Symbol::Type(TypeSymbol::of(ty)), sp())
}

/// `name: int`
pub fn int_field(name: &str) -> FieldDecl {
    FieldDecl::new(name).with_type_expr(type_ref(&int())).with_ty(int())
}

/// `name: int = init`
pub fn int_field_with(name: &str, init: Expr) -> FieldDecl {
    int_field(name).with_init(init)
}

pub fn record(name: &str, fields: Vec<FieldDecl>) -> AggregateType {
    fields
        .into_iter()
        .fold(AggregateType::new(name, AggregateKind::Record), AggregateType::with_field)
}

pub fn lit(value: i64) -> Expr {
    Expr::int(value, sp())
}

pub fn name(n: &str) -> Expr {
    Expr::unresolved(n, sp())
}

pub fn field(owner: &str, name: &str) -> Expr {
    Expr::field(owner, name, sp())
}

pub fn call(callee: &str, args: Vec<Expr>) -> Expr {
    Expr::named_call(callee, args, sp())
}

pub fn plus(lhs: Expr, rhs: Expr) -> Expr {
    call("+", vec![lhs, rhs])
}

/// `owner.name = value;`
pub fn assign(owner: &str, name: &str, value: Expr) -> Stmt {
    Stmt::expr(Expr::assign(field(owner, name), value, sp()))
}

pub fn stmt(expr: Expr) -> Stmt {
    Stmt::expr(expr)
}

pub fn this_init(args: Vec<Expr>) -> Stmt {
    Stmt::expr(Expr::method_call(Expr::this(sp()), "init", args, sp()))
}

pub fn super_init(args: Vec<Expr>) -> Stmt {
    Stmt::expr(Expr::method_call(Expr::sym(Symbol::Super, sp()), "init", args, sp()))
}

pub fn complete() -> Stmt {
    Stmt::expr(Expr::method_call(Expr::this(sp()), "complete", vec![], sp()))
}

pub fn if_else(cond: &str, then_stmts: Vec<Stmt>, else_stmts: Option<Vec<Stmt>>) -> Stmt {
    Stmt::If(IfStmt {
        cond: name(cond),
        then_block: Block::new(then_stmts),
        else_block: else_stmts.map(Block::new),
        span: sp(),
    })
}

pub fn while_loop(cond: &str, body: Vec<Stmt>) -> Stmt {
    Stmt::Loop(LoopStmt {
        kind: LoopKind::While,
        cond: name(cond),
        body: Block::new(body),
        span: sp(),
    })
}

pub fn forall(iterand: Expr, body: Vec<Stmt>) -> Stmt {
    Stmt::Forall(ForallStmt {
        iterands: vec![iterand],
        index: Some("i".to_string()),
        body: Block::new(body),
        span: sp(),
    })
}

pub fn parallel(kind: ParallelKind, args: Vec<Expr>, body: Vec<Stmt>) -> Stmt {
    Stmt::Block(Block::with_info(body, kind, args))
}

pub fn init_method(owner: &str, body: Vec<Stmt>) -> InitMethod {
    InitMethod::new(owner, "init", Block::new(body))
}

/// Normalize with the default configuration
pub fn run(ty: &AggregateType, method: &mut InitMethod) -> (Outcome, DiagnosticBag) {
    run_with(ty, method, &NormalizeConfig::default())
}

pub fn run_with(
    ty: &AggregateType,
    method: &mut InitMethod,
    config: &NormalizeConfig,
) -> (Outcome, DiagnosticBag) {
    let mut bag = DiagnosticBag::new();
    let outcome = normalize_initializer(ty, method, config, &mut bag).expect("internal error");
    (outcome, bag)
}

pub fn body_text(method: &InitMethod) -> String {
    method.body.pretty_print()
}
