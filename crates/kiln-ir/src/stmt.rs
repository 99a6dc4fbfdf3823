//! Statement nodes and blocks

use serde::{Deserialize, Serialize};

use crate::expr::{Expr, VarSymbol};
use crate::span::Span;

/// Statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Stmt {
    /// Local or temporary definition
    Def(DefStmt),

    /// Expression evaluated for effect
    Expr(ExprStmt),

    /// if / else
    If(IfStmt),

    /// while, do-while and for loops
    Loop(LoopStmt),

    /// Data-parallel loop
    Forall(ForallStmt),

    /// Nested block, possibly tagged as a parallel or remote construct
    Block(Block),

    /// return
    Return(ReturnStmt),
}

impl Stmt {
    /// Get the span of this statement
    pub fn span(&self) -> Span {
        match self {
            Stmt::Def(s) => s.span,
            Stmt::Expr(s) => s.span,
            Stmt::If(s) => s.span,
            Stmt::Loop(s) => s.span,
            Stmt::Forall(s) => s.span,
            Stmt::Block(s) => s.span,
            Stmt::Return(s) => s.span,
        }
    }

    /// Expression statement
    pub fn expr(expr: Expr) -> Self {
        let span = expr.span();
        Stmt::Expr(ExprStmt { expr, span })
    }

    /// Definition of `var` without type expression or initializer
    pub fn def(var: VarSymbol, span: Span) -> Self {
        Stmt::Def(DefStmt {
            var,
            type_expr: None,
            init: None,
            span,
        })
    }

    /// Borrow the expression of an expression statement
    pub fn as_expr(&self) -> Option<&Expr> {
        match self {
            Stmt::Expr(s) => Some(&s.expr),
            _ => None,
        }
    }

    /// Largest variable id defined or referenced by this statement
    pub fn max_var_id(&self) -> u32 {
        match self {
            Stmt::Def(s) => {
                let mut id = s.var.id;
                if let Some(e) = &s.type_expr {
                    id = id.max(e.max_var_id());
                }
                if let Some(e) = &s.init {
                    id = id.max(e.max_var_id());
                }
                id
            }
            Stmt::Expr(s) => s.expr.max_var_id(),
            Stmt::If(s) => {
                let mut id = s.cond.max_var_id().max(s.then_block.max_var_id());
                if let Some(else_block) = &s.else_block {
                    id = id.max(else_block.max_var_id());
                }
                id
            }
            Stmt::Loop(s) => s.cond.max_var_id().max(s.body.max_var_id()),
            Stmt::Forall(s) => s
                .iterands
                .iter()
                .map(Expr::max_var_id)
                .fold(s.body.max_var_id(), u32::max),
            Stmt::Block(b) => b.max_var_id(),
            Stmt::Return(s) => s.value.as_ref().map_or(0, Expr::max_var_id),
        }
    }
}

/// `var x: T = e;` and friends
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefStmt {
    /// Defined variable
    pub var: VarSymbol,
    /// Declared type expression
    #[serde(default)]
    pub type_expr: Option<Expr>,
    /// Initializer
    #[serde(default)]
    pub init: Option<Expr>,
    /// Location
    #[serde(default)]
    pub span: Span,
}

/// Expression statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExprStmt {
    /// Expression
    pub expr: Expr,
    /// Location
    #[serde(default)]
    pub span: Span,
}

/// if / else
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IfStmt {
    /// Condition
    pub cond: Expr,
    /// Then arm
    pub then_block: Block,
    /// Else arm
    #[serde(default)]
    pub else_block: Option<Block>,
    /// Location
    #[serde(default)]
    pub span: Span,
}

/// Sequential loop flavors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopKind {
    /// `while cond { ... }`
    While,
    /// `do { ... } while cond;`
    DoWhile,
    /// `for cond { ... }`
    For,
}

/// Sequential loop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopStmt {
    /// Loop flavor
    #[serde(rename = "loop_kind")]
    pub kind: LoopKind,
    /// Condition or iteration header
    pub cond: Expr,
    /// Body
    pub body: Block,
    /// Location
    #[serde(default)]
    pub span: Span,
}

/// Data-parallel loop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForallStmt {
    /// Iterated expressions
    pub iterands: Vec<Expr>,
    /// Index variable name
    #[serde(default)]
    pub index: Option<String>,
    /// Body
    pub body: Block,
    /// Location
    #[serde(default)]
    pub span: Span,
}

/// return
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnStmt {
    /// Returned value
    #[serde(default)]
    pub value: Option<Expr>,
    /// Location
    #[serde(default)]
    pub span: Span,
}

/// A sequence of statements
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Statements in order
    #[serde(default)]
    pub stmts: Vec<Stmt>,
    /// Parallel or remote construct this block implements
    #[serde(default)]
    pub info: Option<BlockInfo>,
    /// Location
    #[serde(default)]
    pub span: Span,
}

impl Block {
    /// Plain block
    pub fn new(stmts: Vec<Stmt>) -> Self {
        Self {
            stmts,
            info: None,
            span: Span::default(),
        }
    }

    /// Block tagged with a parallel or remote construct
    pub fn with_info(stmts: Vec<Stmt>, kind: ParallelKind, args: Vec<Expr>) -> Self {
        Self {
            stmts,
            info: Some(BlockInfo { kind, args }),
            span: Span::default(),
        }
    }

    /// Largest variable id defined or referenced in this block (0 when none)
    pub fn max_var_id(&self) -> u32 {
        let stmts = self.stmts.iter().map(Stmt::max_var_id).fold(0, u32::max);
        match &self.info {
            Some(info) => info.args.iter().map(Expr::max_var_id).fold(stmts, u32::max),
            None => stmts,
        }
    }
}

/// Tag carried by blocks that implement a parallel or remote construct
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockInfo {
    /// Construct
    pub kind: ParallelKind,
    /// Actuals of the construct (e.g. the locale of an `on`)
    #[serde(default)]
    pub args: Vec<Expr>,
}

/// Parallel and remote constructs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParallelKind {
    /// Fire-and-forget task
    Begin,
    /// Task started on a remote locale
    BeginOn,
    /// Each statement runs as its own task
    Cobegin,
    /// One task per iteration
    Coforall,
    /// One remote task per iteration
    CoforallOn,
    /// Remote execution
    On,
}

impl ParallelKind {
    /// Printed keyword
    pub fn keyword(&self) -> &'static str {
        match self {
            ParallelKind::Begin => "begin",
            ParallelKind::BeginOn => "begin on",
            ParallelKind::Cobegin => "cobegin",
            ParallelKind::Coforall => "coforall",
            ParallelKind::CoforallOn => "coforall on",
            ParallelKind::On => "on",
        }
    }
}
