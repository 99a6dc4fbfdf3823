//! Statement walk
//!
//! The body is consumed statement by statement and rebuilt into a new list.
//! Nested blocks are walked on a forked state and merged back; the arms of a
//! conditional are reconciled according to the configured branch policy.

use kiln_ir::{
    Block, CallExpr, Callee, Expr, ExprStmt, InitMethod, Param, Primitive, Span, Stmt,
    ValueType, VarFlags, VarSymbol,
};

use crate::config::BranchPolicy;
use crate::context::InitContext;
use crate::error::{InitError, InternalError, NormalizeResult};
use crate::phase::{chaining_call, contains_chaining, ChainingCall};
use crate::state::{BlockKind, NormalizeState};

/// Normalize `method` in place
pub fn normalize_body(cx: &mut InitContext<'_>, method: &mut InitMethod) -> NormalizeResult<()> {
    let config = cx.config;
    let mut body = std::mem::take(&mut method.body);

    if !contains_chaining(&body, &config.markers) {
        tracing::debug!(marker = %config.markers.completion, "appending implicit completion");
        let span = body.span;
        let completion = Expr::method_call(
            Expr::this(span),
            config.markers.completion.clone(),
            Vec::new(),
            span,
        );
        body.stmts.push(Stmt::expr(completion));
    }

    let mut state = NormalizeState::begin(cx.ty, &body, &config.markers);
    tracing::debug!(%state, "begin");

    let stmts = std::mem::take(&mut body.stmts);
    let mut out = Vec::with_capacity(stmts.len());
    walk_stmts(cx, stmts, &mut state, None, &mut out)?;

    if !state.is_phase2() {
        tracing::debug!(%state, "flushing fields at tail");
        state.initialize_fields_at_tail(cx, body.span, &mut out)?;
    }

    if cx.outer_requested {
        out.insert(0, make_outer_arg(cx, method)?);
    }

    body.stmts = out;
    method.body = body;
    Ok(())
}

/// Add the synthesized outer formal to `method`; returns the statement that
/// stores it into the outer field
fn make_outer_arg(cx: &mut InitContext<'_>, method: &mut InitMethod) -> NormalizeResult<Stmt> {
    let ty = cx.ty;
    let name = cx.config.emit.outer_name.clone();
    let outer_ty = ty
        .outer
        .as_ref()
        .map_or(ValueType::Unknown, |outer| ValueType::class(outer.clone()));
    let field = ty
        .outer_field()
        .map_or_else(|| name.clone(), |idx| ty.fields[idx].name.clone());

    tracing::debug!(formal = %name, "synthesizing outer formal");
    method.outer = Some(Param {
        name: name.clone(),
        ty: outer_ty.clone(),
        generic: true,
    });

    let span = method.body.span;
    let formal = VarSymbol {
        id: cx.fresh_id()?,
        name,
        ty: outer_ty,
        flags: VarFlags {
            generic: true,
            ..VarFlags::default()
        },
    };
    Ok(Stmt::expr(Expr::prim(
        Primitive::SetMember,
        vec![Expr::this(span), Expr::str(field, span), formal.to_expr(span)],
        span,
    )))
}

fn walk_stmts(
    cx: &mut InitContext<'_>,
    stmts: Vec<Stmt>,
    state: &mut NormalizeState,
    restricted: Option<&'static str>,
    out: &mut Vec<Stmt>,
) -> NormalizeResult<()> {
    for stmt in stmts {
        walk_stmt(cx, stmt, state, restricted, out)?;
    }
    Ok(())
}

fn walk_stmt(
    cx: &mut InitContext<'_>,
    stmt: Stmt,
    state: &mut NormalizeState,
    restricted: Option<&'static str>,
    out: &mut Vec<Stmt>,
) -> NormalizeResult<()> {
    match stmt {
        Stmt::Expr(ExprStmt { expr: Expr::Call(call), span }) => {
            walk_call(cx, call, span, state, restricted, out)
        }

        Stmt::Expr(mut s) => {
            cx.access(state).prepare(&mut s.expr)?;
            out.push(Stmt::Expr(s));
            Ok(())
        }

        Stmt::Def(mut def) => {
            let access = cx.access(state);
            if let Some(type_expr) = &mut def.type_expr {
                access.prepare(type_expr)?;
            }
            if let Some(init) = &mut def.init {
                access.prepare(init)?;
            }
            out.push(Stmt::Def(def));
            Ok(())
        }

        Stmt::Return(mut ret) => {
            if let Some(value) = &mut ret.value {
                cx.access(state).prepare(value)?;
            }
            out.push(Stmt::Return(ret));
            Ok(())
        }

        Stmt::If(mut s) => {
            let config = cx.config;
            cx.access(state).prepare(&mut s.cond)?;

            let before = *state;
            let mut then_state = before.fork(BlockKind::Cond);
            then_state.check_phase(&s.then_block, &config.markers);
            walk_nested(cx, &mut s.then_block, &mut then_state, restricted)?;

            let else_state = match &mut s.else_block {
                Some(else_block) => {
                    let mut else_state = before.fork(BlockKind::Cond);
                    else_state.check_phase(else_block, &config.markers);
                    walk_nested(cx, else_block, &mut else_state, restricted)?;
                    Some(else_state)
                }
                None => None,
            };

            match config.branches.policy {
                BranchPolicy::Strict => {
                    let other = else_state.unwrap_or(before);
                    if !then_state.agrees_with(&other) {
                        tracing::debug!(then = %then_state, other = %other, "branches diverge");
                        return Err(InitError::DivergentBranches { span: s.span }.into());
                    }
                    state.merge(&then_state);
                }
                BranchPolicy::LastWriterWins => {
                    state.merge(&then_state);
                    if let Some(else_state) = &else_state {
                        state.merge(else_state);
                    }
                }
            }

            out.push(Stmt::If(s));
            Ok(())
        }

        Stmt::Loop(mut s) => {
            cx.access(state).prepare(&mut s.cond)?;
            let mut child = state.fork(BlockKind::Loop);
            walk_nested(cx, &mut s.body, &mut child, restricted)?;
            state.merge(&child);
            out.push(Stmt::Loop(s));
            Ok(())
        }

        Stmt::Forall(mut s) => {
            let access = cx.access(state);
            for iterand in &mut s.iterands {
                access.prepare(iterand)?;
            }
            let mut child = state.fork(BlockKind::Forall);
            walk_nested(cx, &mut s.body, &mut child, restricted)?;
            state.merge(&child);
            out.push(Stmt::Forall(s));
            Ok(())
        }

        Stmt::Block(mut block) => {
            if let Some(info) = &mut block.info {
                let access = cx.access(state);
                for arg in &mut info.args {
                    access.prepare(arg)?;
                }
            }
            let mut child = state.fork_block(&block);
            walk_nested(cx, &mut block, &mut child, restricted)?;
            state.merge(&child);
            out.push(Stmt::Block(block));
            Ok(())
        }
    }
}

/// Walk the statements of a nested block on `child`; the block stays
/// restricted when any enclosing block is
fn walk_nested(
    cx: &mut InitContext<'_>,
    block: &mut Block,
    child: &mut NormalizeState,
    restricted: Option<&'static str>,
) -> NormalizeResult<()> {
    let restricted = child.restriction().or(restricted);
    tracing::trace!(state = %child, "enter block");

    let stmts = std::mem::take(&mut block.stmts);
    let mut out = Vec::with_capacity(stmts.len());
    walk_stmts(cx, stmts, child, restricted, &mut out)?;
    block.stmts = out;

    tracing::trace!(state = %child, "leave block");
    Ok(())
}

/// `stmt_span` is the span of the statement wrapping `call`; statements
/// that are kept keep it
fn walk_call(
    cx: &mut InitContext<'_>,
    mut call: CallExpr,
    stmt_span: Span,
    state: &mut NormalizeState,
    restricted: Option<&'static str>,
    out: &mut Vec<Stmt>,
) -> NormalizeResult<()> {
    if let Some(kind) = chaining_call(&call, &cx.config.markers) {
        if let Some(context) = restricted {
            return Err(InitError::ChainingInRestrictedBlock {
                call: format!("{}()", callee_text(&call)),
                context,
                span: call.span,
            }
            .into());
        }

        // Arguments of parent chaining see every local field
        if kind != ChainingCall::ThisInit {
            state.initialize_fields_before(cx, call.span, out)?;
        }
        let access = cx.access(state);
        for arg in &mut call.args {
            access.prepare(arg)?;
        }

        tracing::debug!(?kind, %state, "chaining call");
        state.complete_chaining(cx, &call, out)?;
        out.push(expr_stmt(Expr::Call(call), stmt_span));
        return Ok(());
    }

    let target = call
        .as_assignment()
        .and_then(|(lhs, _)| cx.ty.local_field(lhs));
    if let Some(idx) = target {
        return walk_field_assignment(cx, call, stmt_span, idx, state, restricted, out);
    }

    let mut expr = Expr::Call(call);
    cx.access(state).prepare(&mut expr)?;
    out.push(expr_stmt(expr, stmt_span));
    Ok(())
}

/// `f = value` where `f` is a field of the type under construction
fn walk_field_assignment(
    cx: &mut InitContext<'_>,
    call: CallExpr,
    stmt_span: Span,
    idx: usize,
    state: &mut NormalizeState,
    restricted: Option<&'static str>,
    out: &mut Vec<Stmt>,
) -> NormalizeResult<()> {
    let ty = cx.ty;
    let field = &ty.fields[idx];
    let span = call.span;

    if state.is_phase0() {
        return Err(InitError::FieldInitBeforeThisInit {
            field: field.name.clone(),
            span,
        }
        .into());
    }

    let [lhs, mut rhs]: [Expr; 2] = call
        .args
        .try_into()
        .map_err(|_| InternalError::new("assignment without two operands", span))?;

    if state.is_phase2() || state.is_field_initialized(idx) {
        tracing::trace!(field = %field.name, "field mutation");
        cx.access(state).prepare(&mut rhs)?;
        let lhs_span = lhs.span();
        let lhs = Expr::member(Expr::this(lhs_span), field.name.clone(), lhs_span);
        out.push(expr_stmt(Expr::assign(lhs, rhs, span), stmt_span));
        return Ok(());
    }

    if let Some(context) = restricted {
        return Err(InitError::FieldInitInRestrictedBlock {
            field: field.name.clone(),
            context,
            span,
        }
        .into());
    }

    tracing::debug!(field = %field.name, "explicit field initialization");
    state.initialize_field_from(cx, idx, rhs, span, out)
}

fn expr_stmt(expr: Expr, span: Span) -> Stmt {
    Stmt::Expr(ExprStmt { expr, span })
}

fn callee_text(call: &CallExpr) -> String {
    match &call.callee {
        Callee::Prim(prim) => prim.name().to_string(),
        Callee::Name(name) => name.clone(),
        Callee::Expr(expr) => expr.to_string(),
    }
}
