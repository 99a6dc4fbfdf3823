//! Kiln IR
//!
//! The intermediate representation the initializer normalization pass reads
//! and writes.
//!
//! # Structure
//!
//! - `Expr` / `Stmt` / `Block` - partially resolved method bodies
//! - `AggregateType` / `FieldDecl` - class and record descriptors
//! - `InitMethod` - an initializer and its body
//! - `CompilationUnit` - the types and initializers of one source file
//!
//! Every node is serializable so units can be exchanged as JSON.

#![warn(missing_docs)]

pub mod aggregate;
pub mod expr;
pub mod method;
pub mod pretty;
pub mod span;
pub mod stmt;
pub mod ty;

pub use aggregate::{AggregateKind, AggregateType, FieldDecl, FieldFlags};
pub use expr::{
    CallExpr, Callee, Expr, Literal, LiteralValue, NamedExpr, Primitive, SymExpr, Symbol,
    TypeSymbol, UnresolvedExpr, VarFlags, VarSymbol, ASSIGN, DOT,
};
pub use method::{CompilationUnit, InitMethod, Param};
pub use pretty::PrettyPrint;
pub use span::Span;
pub use stmt::{
    Block, BlockInfo, DefStmt, ExprStmt, ForallStmt, IfStmt, LoopKind, LoopStmt, ParallelKind,
    ReturnStmt, Stmt,
};
pub use ty::{ScalarKind, ValueType};
