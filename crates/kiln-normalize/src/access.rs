//! Field accessibility checking and field-reference rewriting
//!
//! `check` decides whether an expression may be evaluated at the current
//! point of initialization. `rewrite` turns bare field references into
//! `get_member(this, "name")` and bare calls of the type's own methods into
//! `this.method(...)`. Both walk the same shapes so that every reference
//! `rewrite` touches has been approved by `check`.

use kiln_ir::{AggregateType, Callee, CallExpr, Expr, Primitive, Span, Symbol, DOT};

use crate::error::InitError;
use crate::state::NormalizeState;

/// Accessibility checker bound to one state
#[derive(Debug, Clone, Copy)]
pub struct FieldAccess<'a> {
    ty: &'a AggregateType,
    state: NormalizeState,
    parent_access: bool,
}

impl<'a> FieldAccess<'a> {
    /// Parent fields are readable in Phase2, or anywhere in an initializer
    /// that carries an explicit completion marker
    pub fn new(ty: &'a AggregateType, state: NormalizeState, has_init_done: bool) -> Self {
        Self {
            ty,
            state,
            parent_access: has_init_done || state.is_phase2(),
        }
    }

    /// Check and rewrite in one go
    pub fn prepare(&self, expr: &mut Expr) -> Result<(), InitError> {
        self.check(expr)?;
        self.rewrite(expr)
    }

    /// Verify that every field `expr` reads is initialized
    pub fn check(&self, expr: &Expr) -> Result<(), InitError> {
        match expr {
            Expr::Literal(_) => Ok(()),

            Expr::Sym(_) => self.check_field_ref(expr),

            Expr::Call(call) => {
                if self.ty.local_field(expr).is_some() || self.ty.super_field(expr).is_some() {
                    return self.check_field_ref(expr);
                }
                if let Callee::Expr(callee) = &call.callee {
                    self.check(callee)?;
                }
                call.args.iter().try_for_each(|arg| self.check(arg))
            }

            // Resolution checks these again
            Expr::Named(_) | Expr::Unresolved(_) => Ok(()),
        }
    }

    fn check_field_ref(&self, expr: &Expr) -> Result<(), InitError> {
        if let Some(idx) = self.ty.local_field(expr) {
            if !self.state.is_field_initialized(idx) {
                return Err(InitError::UsedBeforeDefined {
                    field: self.ty.fields[idx].name.clone(),
                    span: expr.span(),
                });
            }
        } else if let Some(field) = self.ty.super_field(expr) {
            if !self.parent_access {
                return Err(InitError::ParentFieldInPhase1 {
                    field: field.name.clone(),
                    span: expr.span(),
                });
            }
        }
        Ok(())
    }

    /// Rewrite field references and own-method calls in place
    pub fn rewrite(&self, expr: &mut Expr) -> Result<(), InitError> {
        match expr {
            Expr::Sym(sym) => {
                let name = match &sym.symbol {
                    Symbol::Field { name, .. } => name.clone(),
                    _ => return Ok(()),
                };
                let span = sym.span;
                if self.ty.local_field(expr).is_some() || self.ty.super_field(expr).is_some() {
                    self.check_field_ref(expr)?;
                    *expr = get_member(&name, span);
                }
                Ok(())
            }

            Expr::Call(call) => {
                if is_field_access(call) {
                    return Ok(());
                }
                self.retarget_method_call(call);
                if let Callee::Expr(callee) = &mut call.callee {
                    self.rewrite(callee)?;
                }
                call.args.iter_mut().try_for_each(|arg| self.rewrite(arg))
            }

            Expr::Literal(_) | Expr::Named(_) | Expr::Unresolved(_) => Ok(()),
        }
    }

    /// `name(args)` where `name` is one of the type's own methods becomes
    /// `this.name(args)`. Inherited methods are not considered.
    fn retarget_method_call(&self, call: &mut CallExpr) {
        let name = match &call.callee {
            Callee::Name(name) => name,
            _ => return,
        };

        let already_method = matches!(
            call.args.first().and_then(Expr::as_symbol),
            Some(Symbol::MethodToken)
        );
        if already_method || !self.ty.has_method(name) {
            return;
        }

        tracing::trace!(method = %name, "retargeting call to own method");
        let span = call.span;
        let target = Expr::member(Expr::this(span), name.clone(), span);
        call.callee = Callee::Expr(Box::new(target));
    }
}

/// `.`(this, _): already an explicit field access
pub fn is_field_access(call: &CallExpr) -> bool {
    call.is_named(DOT) && call.args.first().is_some_and(Expr::is_this)
}

/// `get_member(this, "name")`
pub fn get_member(name: &str, span: Span) -> Expr {
    Expr::prim(
        Primitive::GetMember,
        vec![Expr::this(span), Expr::str(name, span)],
        span,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phase::InitPhase;
    use crate::state::BlockKind;
    use kiln_ir::{AggregateKind, FieldDecl};

    fn span() -> Span {
        Span::dummy()
    }

    fn record() -> AggregateType {
        AggregateType::new("R", AggregateKind::Record)
            .with_field(FieldDecl::new("a"))
            .with_field(FieldDecl::new("b"))
            .with_method("helper")
    }

    fn derived() -> AggregateType {
        AggregateType::new("D", AggregateKind::Class)
            .with_field(FieldDecl::new("q"))
            .with_parent(AggregateType::new("B", AggregateKind::Class).with_field(FieldDecl::new("p")))
    }

    fn state(phase: InitPhase, curr_field: Option<usize>) -> NormalizeState {
        NormalizeState {
            phase,
            curr_field,
            block: BlockKind::Normal,
            prev_block: BlockKind::Normal,
        }
    }

    #[test]
    fn test_used_before_defined() {
        let ty = record();
        let access = FieldAccess::new(&ty, state(InitPhase::Phase1, Some(1)), false);

        let ok = Expr::named_call("+", vec![Expr::field("R", "a", span()), Expr::int(1, span())], span());
        assert!(access.check(&ok).is_ok());

        let bad = Expr::named_call("+", vec![Expr::field("R", "b", span()), Expr::int(1, span())], span());
        assert!(matches!(
            access.check(&bad),
            Err(InitError::UsedBeforeDefined { ref field, .. }) if field == "b"
        ));

        let bad_member = Expr::member(Expr::this(span()), "b", span());
        assert!(access.check(&bad_member).is_err());
    }

    #[test]
    fn test_computed_callee_is_checked() {
        let ty = record();
        let access = FieldAccess::new(&ty, state(InitPhase::Phase1, Some(1)), false);

        // b.set(1) with b pending
        let call = Expr::call(
            Callee::Expr(Box::new(Expr::member(Expr::field("R", "b", span()), "set", span()))),
            vec![Expr::int(1, span())],
            span(),
        );
        assert!(access.check(&call).is_err());
    }

    #[test]
    fn test_parent_field_rules() {
        let ty = derived();
        let p = Expr::field("B", "p", span());

        let phase1 = FieldAccess::new(&ty, state(InitPhase::Phase1, Some(1)), false);
        assert!(matches!(phase1.check(&p), Err(InitError::ParentFieldInPhase1 { .. })));

        let phase2 = FieldAccess::new(&ty, state(InitPhase::Phase2, None), false);
        assert!(phase2.check(&p).is_ok());

        let init_done = FieldAccess::new(&ty, state(InitPhase::Phase1, Some(1)), true);
        let mut rewritten = p.clone();
        init_done.prepare(&mut rewritten).unwrap();
        assert_eq!(rewritten.to_string(), "get_member(this, \"p\")");
    }

    #[test]
    fn test_rewrite_field_symbols() {
        let ty = record();
        let access = FieldAccess::new(&ty, state(InitPhase::Phase1, None), false);

        let mut expr = Expr::named_call("+", vec![Expr::field("R", "a", span()), Expr::field("R", "b", span())], span());
        access.prepare(&mut expr).unwrap();
        assert_eq!(
            expr.to_string(),
            "+(get_member(this, \"a\"), get_member(this, \"b\"))"
        );
    }

    #[test]
    fn test_rewrite_is_idempotent() {
        let ty = record();
        let access = FieldAccess::new(&ty, state(InitPhase::Phase1, None), false);

        let mut expr = Expr::member(Expr::this(span()), "a", span());
        access.prepare(&mut expr).unwrap();
        assert_eq!(expr.to_string(), "this.a");

        let mut twice = Expr::field("R", "a", span());
        access.prepare(&mut twice).unwrap();
        let once = twice.clone();
        access.prepare(&mut twice).unwrap();
        assert_eq!(twice, once);
    }

    #[test]
    fn test_retarget_own_methods() {
        let ty = record();
        let access = FieldAccess::new(&ty, state(InitPhase::Phase1, None), false);

        let mut own = Expr::named_call("helper", vec![Expr::int(1, span())], span());
        access.prepare(&mut own).unwrap();
        assert_eq!(own.to_string(), "this.helper(1)");

        let mut free = Expr::named_call("compute", vec![], span());
        access.prepare(&mut free).unwrap();
        assert_eq!(free.to_string(), "compute()");

        let mut explicit = Expr::named_call(
            "helper",
            vec![Expr::method_token(span()), Expr::unresolved("x", span())],
            span(),
        );
        access.prepare(&mut explicit).unwrap();
        assert_eq!(explicit.to_string(), "helper(_mt, x)");
    }

    #[test]
    fn test_deferred_shapes() {
        let ty = record();
        let access = FieldAccess::new(&ty, state(InitPhase::Phase1, Some(0)), false);

        let mut named = Expr::named("x", Expr::field("R", "b", span()), span());
        assert!(access.prepare(&mut named).is_ok());

        let mut unresolved = Expr::unresolved("b", span());
        assert!(access.prepare(&mut unresolved).is_ok());
    }
}
