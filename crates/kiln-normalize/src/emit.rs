//! Field initialization emitter
//!
//! Each strategy appends the statements that initialize one field to `out`,
//! in the fixed order temporary definition, temporary initialization, field
//! assignment. Expressions copied into the output go through the
//! accessibility checker first.

use kiln_ir::{
    AggregateType, Callee, Expr, FieldDecl, Primitive, Span, Stmt, Symbol, TypeSymbol, ValueType,
    VarFlags, VarSymbol,
};

use crate::context::InitContext;
use crate::error::{GenericFieldKind, InitError, InternalError, NormalizeResult};
use crate::state::NormalizeState;

impl InitContext<'_> {
    /// Initialize field `idx` from its declaration
    pub fn emit_implicit(
        &mut self,
        state: &NormalizeState,
        idx: usize,
        span: Span,
        out: &mut Vec<Stmt>,
    ) -> NormalizeResult<()> {
        let ty = self.ty;
        let field = &ty.fields[idx];

        if field.flags.outer {
            tracing::debug!(field = %field.name, "outer reference requested");
            self.outer_requested = true;
            return Ok(());
        }

        match (&field.type_expr, &field.init) {
            (None, None) => {
                self.report_continuable(InitError::OmittedFieldInit {
                    field: field.name.clone(),
                    span,
                });
                Ok(())
            }
            (Some(_), None) => self.typed_without_init(state, field, span, out),
            (Some(_), Some(init)) if field.flags.is_generic() => {
                self.generic_with_init(state, field, init.clone(), span, out)
            }
            (None, Some(init)) if field.flags.is_generic() => {
                self.generic_inference(state, field, init.clone(), span, out)
            }
            (type_expr, Some(init)) => {
                if field.ty.is_known() || type_expr.is_some() {
                    self.typed_with_init(state, field, init.clone(), span, out)
                } else {
                    self.inferred_with_init(state, field, init.clone(), span, out)
                }
            }
        }
    }

    /// Initialize field `idx` from the right side of a user assignment
    pub fn emit_explicit(
        &mut self,
        state: &NormalizeState,
        idx: usize,
        init: Expr,
        span: Span,
        out: &mut Vec<Stmt>,
    ) -> NormalizeResult<()> {
        let ty = self.ty;
        let field = &ty.fields[idx];

        if field.flags.param {
            if field.type_expr.is_some() {
                self.generic_with_init(state, field, init, span, out)
            } else {
                self.generic_inference(state, field, init, span, out)
            }
        } else if field.flags.type_variable
            || (field.type_expr.is_none() && field.init.is_none())
        {
            self.generic_inference(state, field, init, span, out)
        } else if field.type_expr.is_some() {
            self.typed_with_init(state, field, init, span, out)
        } else {
            self.inferred_with_init(state, field, init, span, out)
        }
    }

    /// Declared type, no value: default-construct a temporary of the type
    fn typed_without_init(
        &mut self,
        state: &NormalizeState,
        field: &FieldDecl,
        span: Span,
        out: &mut Vec<Stmt>,
    ) -> NormalizeResult<()> {
        let value_ty = &field.ty;
        let flags = temp_flags(field);
        let set = set_primitive(field);

        if value_ty.is_primitive_scalar() || value_ty.is_non_generic_class() {
            tracing::debug!(field = %field.name, strategy = "default_of", "emit");
            let tmp = self.new_temp(value_ty.clone(), flags)?;
            let value = self.default_of(value_ty, span);
            let bind = Expr::prim(Primitive::Move, vec![tmp.to_expr(span), value], span);
            push_via_temp(out, field, tmp, vec![bind], set, span);
        } else if value_ty.is_non_generic_record_with_initializers() {
            tracing::debug!(field = %field.name, strategy = "record_init", "emit");
            let tmp = self.new_temp(value_ty.clone(), flags)?;
            let bind = self.init_call(&tmp, Vec::new(), span);
            push_via_temp(out, field, tmp, vec![bind], set, span);
        } else {
            tracing::debug!(field = %field.name, strategy = "default_init", "emit");
            let mut value = self.default_init(field, span)?;
            self.access(state).prepare(&mut value)?;
            let tmp = self.new_temp(value_ty.clone(), flags)?;
            let bind = Expr::prim(Primitive::Move, vec![tmp.to_expr(span), value], span);
            push_via_temp(out, field, tmp, vec![bind], set, span);
        }

        Ok(())
    }

    /// Generic field with type and value: the value cast to the type
    fn generic_with_init(
        &mut self,
        state: &NormalizeState,
        field: &FieldDecl,
        mut init: Expr,
        span: Span,
        out: &mut Vec<Stmt>,
    ) -> NormalizeResult<()> {
        tracing::debug!(field = %field.name, strategy = "generic_cast", "emit");
        let type_expr = field.type_expr.clone().ok_or_else(|| missing_type_expr(field))?;

        self.access(state).prepare(&mut init)?;
        let cast = Expr::prim(Primitive::Cast, vec![init, type_expr], span);
        out.push(field_set(Primitive::InitField, field, cast, span));
        Ok(())
    }

    /// Generic field without a declared type; the shape of the value decides
    fn generic_inference(
        &mut self,
        state: &NormalizeState,
        field: &FieldDecl,
        mut init: Expr,
        span: Span,
        out: &mut Vec<Stmt>,
    ) -> NormalizeResult<()> {
        let is_param = field.flags.param;
        let is_type = field.flags.type_variable;
        let param_flags = VarFlags {
            param: is_param,
            ..VarFlags::default()
        };
        let type_flags = VarFlags {
            type_variable: true,
            ..VarFlags::default()
        };

        match &init {
            Expr::Literal(_) | Expr::Sym(_) => {
                let value_ty = value_type_of(&init);
                let (tmp_ty, flags, bind) = if is_type {
                    let tmp_ty = match value_ty {
                        ValueType::Any | ValueType::Unknown => ValueType::Unknown,
                        known => known,
                    };
                    (tmp_ty, type_flags, Primitive::Move)
                } else if value_ty.is_primitive_scalar() {
                    (value_ty, param_flags, Primitive::Move)
                } else {
                    (ValueType::Unknown, param_flags, Primitive::InitVar)
                };
                tracing::debug!(field = %field.name, strategy = "generic_symbol", "emit");

                self.access(state).prepare(&mut init)?;
                let tmp = self.new_temp(tmp_ty, flags)?;
                let bind = Expr::prim(bind, vec![tmp.to_expr(span), init], span);
                push_via_temp(out, field, tmp, vec![bind], Primitive::InitField, span);
            }

            Expr::Call(call) => {
                if (is_param || is_type) && call.is_primitive(Primitive::New) {
                    let kind = if is_type {
                        GenericFieldKind::Type
                    } else {
                        GenericFieldKind::Param
                    };
                    return Err(InitError::NewInitOfGenericField {
                        field: field.name.clone(),
                        kind,
                        span: call.span,
                    }
                    .into());
                }
                tracing::debug!(field = %field.name, strategy = "generic_call", "emit");

                let (flags, bind) = if is_type {
                    (type_flags, Primitive::Move)
                } else {
                    (param_flags, Primitive::InitVar)
                };
                self.access(state).prepare(&mut init)?;
                let tmp = self.new_temp(ValueType::Unknown, flags)?;
                let bind = Expr::prim(bind, vec![tmp.to_expr(span), init], span);
                push_via_temp(out, field, tmp, vec![bind], Primitive::InitField, span);
            }

            Expr::Unresolved(_) => {
                tracing::debug!(field = %field.name, strategy = "generic_deferred", "emit");
                out.push(field_set(Primitive::InitField, field, init, span));
            }

            Expr::Named(named) => {
                return Err(InternalError::new(
                    format!("named actual as initial value of field '{}'", field.name),
                    named.span,
                )
                .into());
            }
        }

        Ok(())
    }

    /// Declared (or known) type and a value
    fn typed_with_init(
        &mut self,
        state: &NormalizeState,
        field: &FieldDecl,
        mut init: Expr,
        span: Span,
        out: &mut Vec<Stmt>,
    ) -> NormalizeResult<()> {
        let value_ty = &field.ty;
        let access = self.access(state);

        if value_ty.is_primitive_scalar() || value_ty.is_non_generic_class() {
            tracing::debug!(field = %field.name, strategy = "assign", "emit");
            access.prepare(&mut init)?;
            let tmp = self.new_temp(value_ty.clone(), VarFlags::default())?;
            let bind = Expr::assign(tmp.to_expr(span), init, span);
            push_via_temp(out, field, tmp, vec![bind], Primitive::SetMember, span);
        } else if value_ty.is_non_generic_record_with_initializers() {
            let tmp = self.new_temp(value_ty.clone(), VarFlags::default())?;
            let mut bind = match init {
                Expr::Call(call) if call.is_primitive(Primitive::New) => {
                    tracing::debug!(field = %field.name, strategy = "record_new_splice", "emit");
                    self.splice_new(call.args, &tmp, call.span)?
                }
                other => {
                    tracing::debug!(field = %field.name, strategy = "record_init_from", "emit");
                    self.init_call(&tmp, vec![other], span)
                }
            };
            access.prepare(&mut bind)?;
            push_via_temp(out, field, tmp, vec![bind], Primitive::SetMember, span);
        } else if self.compiler_generated
            && field.init.is_none()
            && might_be_sync_single(self.ty, field)
        {
            tracing::debug!(field = %field.name, strategy = "maybe_sync_single", "emit");
            access.prepare(&mut init)?;
            out.push(field_set(Primitive::InitMaybeSyncSingleField, field, init, span));
        } else if field.type_expr.is_none() {
            tracing::debug!(field = %field.name, strategy = "assign_known", "emit");
            access.prepare(&mut init)?;
            let tmp = self.new_temp(value_ty.clone(), VarFlags::default())?;
            let bind = Expr::assign(tmp.to_expr(span), init, span);
            push_via_temp(out, field, tmp, vec![bind], Primitive::SetMember, span);
        } else {
            tracing::debug!(field = %field.name, strategy = "default_init_assign", "emit");
            let mut value = self.default_init(field, span)?;
            access.prepare(&mut value)?;
            access.prepare(&mut init)?;
            let tmp = self.new_temp(value_ty.clone(), VarFlags::default())?;
            let typed = Expr::prim(Primitive::Move, vec![tmp.to_expr(span), value], span);
            let assign = Expr::assign(tmp.to_expr(span), init, span);
            push_via_temp(out, field, tmp, vec![typed, assign], Primitive::SetMember, span);
        }

        Ok(())
    }

    /// No declared type; the value's shape decides
    fn inferred_with_init(
        &mut self,
        state: &NormalizeState,
        field: &FieldDecl,
        mut init: Expr,
        span: Span,
        out: &mut Vec<Stmt>,
    ) -> NormalizeResult<()> {
        let (tmp_ty, bind) = match &init {
            Expr::Literal(_) | Expr::Sym(_) => {
                let value_ty = value_type_of(&init);
                if value_ty.is_primitive_scalar() {
                    (value_ty, Primitive::Move)
                } else {
                    (ValueType::Unknown, Primitive::InitVar)
                }
            }
            Expr::Call(_) => (ValueType::Unknown, Primitive::InitVar),
            Expr::Unresolved(_) => {
                tracing::debug!(field = %field.name, strategy = "deferred", "emit");
                out.push(field_set(Primitive::SetMember, field, init, span));
                return Ok(());
            }
            Expr::Named(named) => {
                return Err(InternalError::new(
                    format!("named actual as initial value of field '{}'", field.name),
                    named.span,
                )
                .into());
            }
        };
        tracing::debug!(field = %field.name, strategy = "inferred", bind = bind.name(), "emit");

        self.access(state).prepare(&mut init)?;
        let tmp = self.new_temp(tmp_ty, VarFlags::default())?;
        let bind = Expr::prim(bind, vec![tmp.to_expr(span), init], span);
        push_via_temp(out, field, tmp, vec![bind], Primitive::SetMember, span);
        Ok(())
    }

    /// `new R(args)` becomes `init(_mt, tmp, args)` so the record is built
    /// in place
    fn splice_new(&self, args: Vec<Expr>, tmp: &VarSymbol, span: Span) -> NormalizeResult<Expr> {
        let ctor = args.into_iter().next();
        let mut ctor = match ctor {
            Some(Expr::Call(ctor)) => ctor,
            _ => return Err(InternalError::new("'new' without a constructor call", span).into()),
        };

        ctor.callee = Callee::Name(self.config.emit.init_method.clone());
        ctor.args.insert(0, tmp.to_expr(ctor.span));
        ctor.args.insert(0, Expr::method_token(ctor.span));
        Ok(Expr::Call(ctor))
    }

    /// `init(_mt, tmp, args)`
    fn init_call(&self, tmp: &VarSymbol, args: Vec<Expr>, span: Span) -> Expr {
        let mut actuals = vec![Expr::method_token(span), tmp.to_expr(span)];
        actuals.extend(args);
        Expr::named_call(self.config.emit.init_method.clone(), actuals, span)
    }

    /// `_defaultOf(T)`
    fn default_of(&self, ty: &ValueType, span: Span) -> Expr {
        let ty = Expr::sym(Symbol::Type(TypeSymbol::of(ty)), span);
        Expr::named_call(self.config.emit.default_of.clone(), vec![ty], span)
    }

    /// `default_init(<type expr>)`
    fn default_init(&self, field: &FieldDecl, span: Span) -> NormalizeResult<Expr> {
        let type_expr = field.type_expr.clone().ok_or_else(|| missing_type_expr(field))?;
        Ok(Expr::prim(Primitive::Init, vec![type_expr], span))
    }
}

fn missing_type_expr(field: &FieldDecl) -> InternalError {
    InternalError::new(
        format!("field '{}' has no type expression", field.name),
        field.span,
    )
}

/// param and type fields are set with `init_field`, others with `set_member`
fn set_primitive(field: &FieldDecl) -> Primitive {
    if field.flags.is_generic() {
        Primitive::InitField
    } else {
        Primitive::SetMember
    }
}

fn temp_flags(field: &FieldDecl) -> VarFlags {
    VarFlags {
        param: field.flags.param,
        type_variable: field.flags.type_variable,
        generic: false,
    }
}

fn value_type_of(expr: &Expr) -> ValueType {
    match expr {
        Expr::Literal(lit) => lit.value.value_type(),
        Expr::Sym(sym) => sym.symbol.value_type(),
        _ => ValueType::Unknown,
    }
}

/// `<set>(this, "field", value)`
fn field_set(set: Primitive, field: &FieldDecl, value: Expr, span: Span) -> Stmt {
    Stmt::expr(Expr::prim(
        set,
        vec![Expr::this(span), Expr::str(field.name.clone(), span), value],
        span,
    ))
}

fn push_via_temp(
    out: &mut Vec<Stmt>,
    field: &FieldDecl,
    tmp: VarSymbol,
    binds: Vec<Expr>,
    set: Primitive,
    span: Span,
) {
    let value = tmp.to_expr(span);
    out.push(Stmt::def(tmp, span));
    out.extend(binds.into_iter().map(Stmt::expr));
    out.push(field_set(set, field, value, span));
}

/// The declared type may still turn out to be a sync or single type: a
/// type variable, or a call that could be a type function
fn might_be_sync_single(ty: &AggregateType, field: &FieldDecl) -> bool {
    match &field.type_expr {
        Some(expr @ Expr::Sym(sym)) => match &sym.symbol {
            Symbol::Type(named) => named.type_variable,
            Symbol::Var(var) => var.flags.type_variable,
            Symbol::Field { .. } => ty
                .local_field(expr)
                .is_some_and(|idx| ty.fields[idx].flags.type_variable),
            _ => false,
        },
        Some(Expr::Call(call)) => !call.is_any_primitive(),
        _ => false,
    }
}
