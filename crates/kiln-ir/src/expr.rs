//! Expression nodes
//!
//! Expressions come out of scope resolution partially resolved: names that
//! resolved to a declaration are `Sym` nodes, everything else is left as
//! `Unresolved` for the type-resolution phase.

use serde::{Deserialize, Serialize};

use crate::span::Span;
use crate::ty::{ScalarKind, ValueType};

/// Name of the member-access operator
pub const DOT: &str = ".";

/// Name of the simple assignment operator
pub const ASSIGN: &str = "=";

/// Expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Expr {
    /// Immediate value: 42, 1.5, true, "s", nil
    Literal(Literal),

    /// Reference to a resolved symbol
    Sym(SymExpr),

    /// Bare name left for resolution
    Unresolved(UnresolvedExpr),

    /// Call (operators, functions, methods, primitives)
    Call(CallExpr),

    /// Named actual: `name = value`
    Named(NamedExpr),
}

impl Expr {
    /// Get the span of this expression
    pub fn span(&self) -> Span {
        match self {
            Expr::Literal(e) => e.span,
            Expr::Sym(e) => e.span,
            Expr::Unresolved(e) => e.span,
            Expr::Call(e) => e.span,
            Expr::Named(e) => e.span,
        }
    }

    /// Literal expression
    pub fn literal(value: LiteralValue, span: Span) -> Self {
        Expr::Literal(Literal { value, span })
    }

    /// Integer literal
    pub fn int(value: i64, span: Span) -> Self {
        Self::literal(LiteralValue::Int(value), span)
    }

    /// String literal
    pub fn str(value: impl Into<String>, span: Span) -> Self {
        Self::literal(LiteralValue::Str(value.into()), span)
    }

    /// Symbol reference
    pub fn sym(symbol: Symbol, span: Span) -> Self {
        Expr::Sym(SymExpr { symbol, span })
    }

    /// The receiver
    pub fn this(span: Span) -> Self {
        Self::sym(Symbol::This, span)
    }

    /// The method-call marker argument
    pub fn method_token(span: Span) -> Self {
        Self::sym(Symbol::MethodToken, span)
    }

    /// Bare reference to a field of `owner`
    pub fn field(owner: impl Into<String>, name: impl Into<String>, span: Span) -> Self {
        Self::sym(
            Symbol::Field {
                owner: owner.into(),
                name: name.into(),
            },
            span,
        )
    }

    /// Unresolved name
    pub fn unresolved(name: impl Into<String>, span: Span) -> Self {
        Expr::Unresolved(UnresolvedExpr {
            name: name.into(),
            span,
        })
    }

    /// Call with an arbitrary callee
    pub fn call(callee: Callee, args: Vec<Expr>, span: Span) -> Self {
        Expr::Call(CallExpr {
            callee,
            args,
            square: false,
            span,
        })
    }

    /// Call of an unresolved name: `name(args)`
    pub fn named_call(name: impl Into<String>, args: Vec<Expr>, span: Span) -> Self {
        Self::call(Callee::Name(name.into()), args, span)
    }

    /// Primitive call
    pub fn prim(prim: Primitive, args: Vec<Expr>, span: Span) -> Self {
        Self::call(Callee::Prim(prim), args, span)
    }

    /// Member access: `base.member`
    pub fn member(base: Expr, member: impl Into<String>, span: Span) -> Self {
        Self::named_call(DOT, vec![base, Self::str(member, span)], span)
    }

    /// Method call: `base.method(args)`
    pub fn method_call(base: Expr, method: impl Into<String>, args: Vec<Expr>, span: Span) -> Self {
        Self::call(Callee::Expr(Box::new(Self::member(base, method, span))), args, span)
    }

    /// Simple assignment: `lhs = rhs`
    pub fn assign(lhs: Expr, rhs: Expr, span: Span) -> Self {
        Self::named_call(ASSIGN, vec![lhs, rhs], span)
    }

    /// Named actual
    pub fn named(name: impl Into<String>, value: Expr, span: Span) -> Self {
        Expr::Named(NamedExpr {
            name: name.into(),
            value: Box::new(value),
            span,
        })
    }

    /// Borrow as a call
    pub fn as_call(&self) -> Option<&CallExpr> {
        match self {
            Expr::Call(call) => Some(call),
            _ => None,
        }
    }

    /// Borrow the referenced symbol, if this is a symbol reference
    pub fn as_symbol(&self) -> Option<&Symbol> {
        match self {
            Expr::Sym(sym) => Some(&sym.symbol),
            _ => None,
        }
    }

    /// True for a reference to the receiver
    pub fn is_this(&self) -> bool {
        matches!(self.as_symbol(), Some(Symbol::This))
    }

    /// String value of a string literal
    pub fn as_str_literal(&self) -> Option<&str> {
        match self {
            Expr::Literal(Literal {
                value: LiteralValue::Str(s),
                ..
            }) => Some(s),
            _ => None,
        }
    }

    /// Largest variable id referenced by this expression (0 when none)
    pub fn max_var_id(&self) -> u32 {
        match self {
            Expr::Sym(SymExpr {
                symbol: Symbol::Var(var),
                ..
            }) => var.id,
            Expr::Call(call) => {
                let callee = match &call.callee {
                    Callee::Expr(e) => e.max_var_id(),
                    _ => 0,
                };
                call.args.iter().map(Expr::max_var_id).fold(callee, u32::max)
            }
            Expr::Named(named) => named.value.max_var_id(),
            _ => 0,
        }
    }
}

// ============================================================================
// Leaves
// ============================================================================

/// Immediate value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Literal {
    /// Payload
    pub value: LiteralValue,
    /// Location
    #[serde(default)]
    pub span: Span,
}

/// Literal payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiteralValue {
    /// Integer
    Int(i64),
    /// Floating point
    Real(f64),
    /// Boolean
    Bool(bool),
    /// String
    Str(String),
    /// nil
    Nil,
}

impl LiteralValue {
    /// Type of the immediate
    pub fn value_type(&self) -> ValueType {
        match self {
            LiteralValue::Int(_) => ValueType::scalar(ScalarKind::Int),
            LiteralValue::Real(_) => ValueType::scalar(ScalarKind::Real),
            LiteralValue::Bool(_) => ValueType::scalar(ScalarKind::Bool),
            LiteralValue::Str(_) => ValueType::record("string"),
            LiteralValue::Nil => ValueType::Unknown,
        }
    }
}

/// Reference to a resolved symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymExpr {
    /// Referenced symbol
    pub symbol: Symbol,
    /// Location
    #[serde(default)]
    pub span: Span,
}

/// Resolved symbols
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "sym", rename_all = "snake_case")]
pub enum Symbol {
    /// The receiver of the method
    This,
    /// The receiver viewed as its parent type
    Super,
    /// Marker passed as the first actual of explicit method calls
    MethodToken,
    /// A field declared by `owner`
    Field {
        /// Declaring type
        owner: String,
        /// Field name
        name: String,
    },
    /// Local, temporary or formal
    Var(VarSymbol),
    /// A named type
    Type(TypeSymbol),
}

impl Symbol {
    /// Value type of the symbol when it is evident
    pub fn value_type(&self) -> ValueType {
        match self {
            Symbol::Var(var) => var.ty.clone(),
            Symbol::Type(ty) => ty.ty.clone(),
            _ => ValueType::Unknown,
        }
    }
}

/// Local, temporary or formal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarSymbol {
    /// Unique within the method
    pub id: u32,
    /// Printed name
    pub name: String,
    /// Value type when known
    #[serde(default)]
    pub ty: ValueType,
    /// Flags
    #[serde(default)]
    pub flags: VarFlags,
}

impl VarSymbol {
    /// Reference to this variable
    pub fn to_expr(&self, span: Span) -> Expr {
        Expr::sym(Symbol::Var(self.clone()), span)
    }
}

/// Variable flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VarFlags {
    /// Compile-time constant
    #[serde(default)]
    pub param: bool,
    /// Holds a type rather than a value
    #[serde(default)]
    pub type_variable: bool,
    /// Generic formal
    #[serde(default)]
    pub generic: bool,
}

/// A named type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeSymbol {
    /// Type name
    pub name: String,
    /// The named type
    #[serde(default)]
    pub ty: ValueType,
    /// The name is a type variable (e.g. a `type` field or formal)
    #[serde(default)]
    pub type_variable: bool,
}

impl TypeSymbol {
    /// Symbol naming a concrete type
    pub fn of(ty: &ValueType) -> Self {
        Self {
            name: ty.to_string(),
            ty: ty.clone(),
            type_variable: false,
        }
    }
}

/// Bare name awaiting resolution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnresolvedExpr {
    /// Name as written
    pub name: String,
    /// Location
    #[serde(default)]
    pub span: Span,
}

/// Named actual
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedExpr {
    /// Formal name
    pub name: String,
    /// Actual
    pub value: Box<Expr>,
    /// Location
    #[serde(default)]
    pub span: Span,
}

// ============================================================================
// Calls
// ============================================================================

/// Call expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallExpr {
    /// What is called
    pub callee: Callee,
    /// Actuals
    #[serde(default)]
    pub args: Vec<Expr>,
    /// Written with square brackets (indexing)
    #[serde(default)]
    pub square: bool,
    /// Location
    #[serde(default)]
    pub span: Span,
}

impl CallExpr {
    /// Callee is the unresolved name `name`
    pub fn is_named(&self, name: &str) -> bool {
        matches!(&self.callee, Callee::Name(n) if n == name)
    }

    /// Callee is the primitive `prim`
    pub fn is_primitive(&self, prim: Primitive) -> bool {
        matches!(self.callee, Callee::Prim(p) if p == prim)
    }

    /// Callee is any primitive
    pub fn is_any_primitive(&self) -> bool {
        matches!(self.callee, Callee::Prim(_))
    }

    /// `base.member` shape: the `.` operator with a string-literal member
    pub fn member_access(&self) -> Option<(&Expr, &str)> {
        if !self.is_named(DOT) || self.args.len() != 2 {
            return None;
        }
        let member = self.args[1].as_str_literal()?;
        Some((&self.args[0], member))
    }

    /// `base.method(...)` shape: returns the base and the method name
    pub fn method_target(&self) -> Option<(&Expr, &str)> {
        match &self.callee {
            Callee::Expr(callee) => callee.as_call()?.member_access(),
            _ => None,
        }
    }

    /// Simple assignment `=` with both operands
    pub fn as_assignment(&self) -> Option<(&Expr, &Expr)> {
        if self.is_named(ASSIGN) && self.args.len() == 2 {
            Some((&self.args[0], &self.args[1]))
        } else {
            None
        }
    }
}

/// What a call invokes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Callee {
    /// Compiler primitive
    Prim(Primitive),
    /// Unresolved name (operators, free functions, methods without receiver)
    Name(String),
    /// Computed callee such as `this.init`
    Expr(Box<Expr>),
}

/// Compiler primitives the normalized form is built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Primitive {
    /// Bind a value to a temporary
    Move,
    /// Initialize a temporary whose type is inferred from the value
    InitVar,
    /// Default value of a type expression
    Init,
    /// Assign a field of an ordinary aggregate
    SetMember,
    /// Assign a param/type field
    InitField,
    /// Read a field by name
    GetMember,
    /// `new T(...)`
    New,
    /// Cast a value to a type
    Cast,
    /// Field assignment whose protocol depends on whether the resolved type
    /// is a sync/single cell
    InitMaybeSyncSingleField,
}

impl Primitive {
    /// Printed name
    pub fn name(&self) -> &'static str {
        match self {
            Primitive::Move => "move",
            Primitive::InitVar => "init_var",
            Primitive::Init => "default_init",
            Primitive::SetMember => "set_member",
            Primitive::InitField => "init_field",
            Primitive::GetMember => "get_member",
            Primitive::New => "new",
            Primitive::Cast => "cast",
            Primitive::InitMaybeSyncSingleField => "init_maybe_sync_single_field",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_access_shape() {
        let span = Span::dummy();
        let access = Expr::member(Expr::this(span), "x", span);
        let call = access.as_call().unwrap();
        let (base, member) = call.member_access().unwrap();
        assert!(base.is_this());
        assert_eq!(member, "x");

        // A dot call without a string member is not an access
        let odd = Expr::named_call(DOT, vec![Expr::this(span), Expr::int(1, span)], span);
        assert!(odd.as_call().unwrap().member_access().is_none());
    }

    #[test]
    fn test_method_target() {
        let span = Span::dummy();
        let call = Expr::method_call(Expr::this(span), "complete", vec![], span);
        let (base, method) = call.as_call().unwrap().method_target().unwrap();
        assert!(base.is_this());
        assert_eq!(method, "complete");
    }

    #[test]
    fn test_assignment_detection() {
        let span = Span::dummy();
        let assign = Expr::assign(Expr::field("R", "a", span), Expr::int(1, span), span);
        assert!(assign.as_call().unwrap().as_assignment().is_some());

        let compound = Expr::named_call("+=", vec![Expr::field("R", "a", span), Expr::int(1, span)], span);
        let compound = compound.as_call().unwrap();
        assert!(compound.as_assignment().is_none());
    }

    #[test]
    fn test_max_var_id() {
        let span = Span::dummy();
        let var = VarSymbol {
            id: 7,
            name: "x".to_string(),
            ty: ValueType::Unknown,
            flags: VarFlags::default(),
        };
        let expr = Expr::named_call("f", vec![Expr::int(1, span), var.to_expr(span)], span);
        assert_eq!(expr.max_var_id(), 7);
        assert_eq!(Expr::int(3, span).max_var_id(), 0);
    }
}
