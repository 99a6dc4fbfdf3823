//! Pretty-printing for the IR
//!
//! Provides the stable, line-oriented text form used by the CLI and tests.

use std::fmt::{self, Write};

use crate::expr::{Callee, CallExpr, Expr, LiteralValue, Symbol};
use crate::method::{InitMethod, Param};
use crate::stmt::{Block, LoopKind, Stmt};

const INDENT: &str = "    ";

/// Trait for pretty-printing IR constructs
pub trait PrettyPrint {
    /// Render as text
    fn pretty_print(&self) -> String;
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::This => write!(f, "this"),
            Symbol::Super => write!(f, "super"),
            Symbol::MethodToken => write!(f, "_mt"),
            Symbol::Field { name, .. } => write!(f, "{}", name),
            Symbol::Var(var) => write!(f, "{}", var.name),
            Symbol::Type(ty) => write!(f, "{}", ty.name),
        }
    }
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralValue::Int(v) => write!(f, "{}", v),
            LiteralValue::Real(v) => write!(f, "{:?}", v),
            LiteralValue::Bool(v) => write!(f, "{}", v),
            LiteralValue::Str(v) => write!(f, "{:?}", v),
            LiteralValue::Nil => write!(f, "nil"),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(lit) => write!(f, "{}", lit.value),
            Expr::Sym(sym) => write!(f, "{}", sym.symbol),
            Expr::Unresolved(name) => write!(f, "{}", name.name),
            Expr::Named(named) => write!(f, "{}={}", named.name, named.value),
            Expr::Call(call) => write!(f, "{}", call),
        }
    }
}

impl fmt::Display for CallExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some((base, member)) = self.member_access() {
            return write!(f, "{}.{}", base, member);
        }

        match &self.callee {
            Callee::Prim(prim) => write!(f, "{}", prim.name())?,
            Callee::Name(name) => write!(f, "{}", name)?,
            Callee::Expr(expr) => write!(f, "{}", expr)?,
        }

        let (open, close) = if self.square { ("[", "]") } else { ("(", ")") };
        write!(f, "{}", open)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", arg)?;
        }
        write!(f, "{}", close)
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ty.is_known() {
            write!(f, "{}: {}", self.name, self.ty)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

fn write_stmt(output: &mut String, stmt: &Stmt, depth: usize) {
    let pad = INDENT.repeat(depth);

    match stmt {
        Stmt::Def(def) => {
            let keyword = if def.var.flags.type_variable {
                "type"
            } else if def.var.flags.param {
                "param"
            } else {
                "var"
            };
            write!(output, "{}{} {}", pad, keyword, def.var.name).unwrap();
            if let Some(type_expr) = &def.type_expr {
                write!(output, ": {}", type_expr).unwrap();
            } else if def.var.ty.is_known() {
                write!(output, ": {}", def.var.ty).unwrap();
            }
            if let Some(init) = &def.init {
                write!(output, " = {}", init).unwrap();
            }
            writeln!(output, ";").unwrap();
        }
        Stmt::Expr(s) => {
            writeln!(output, "{}{};", pad, s.expr).unwrap();
        }
        Stmt::If(s) => {
            writeln!(output, "{}if {} {{", pad, s.cond).unwrap();
            write_block_body(output, &s.then_block, depth + 1);
            if let Some(else_block) = &s.else_block {
                writeln!(output, "{}}} else {{", pad).unwrap();
                write_block_body(output, else_block, depth + 1);
            }
            writeln!(output, "{}}}", pad).unwrap();
        }
        Stmt::Loop(s) => match s.kind {
            LoopKind::While | LoopKind::For => {
                let keyword = if s.kind == LoopKind::While { "while" } else { "for" };
                writeln!(output, "{}{} {} {{", pad, keyword, s.cond).unwrap();
                write_block_body(output, &s.body, depth + 1);
                writeln!(output, "{}}}", pad).unwrap();
            }
            LoopKind::DoWhile => {
                writeln!(output, "{}do {{", pad).unwrap();
                write_block_body(output, &s.body, depth + 1);
                writeln!(output, "{}}} while {};", pad, s.cond).unwrap();
            }
        },
        Stmt::Forall(s) => {
            let iterands: Vec<String> = s.iterands.iter().map(|e| e.to_string()).collect();
            match &s.index {
                Some(index) => {
                    writeln!(output, "{}forall {} in {} {{", pad, index, iterands.join(", ")).unwrap()
                }
                None => writeln!(output, "{}forall {} {{", pad, iterands.join(", ")).unwrap(),
            }
            write_block_body(output, &s.body, depth + 1);
            writeln!(output, "{}}}", pad).unwrap();
        }
        Stmt::Block(block) => {
            match &block.info {
                Some(info) if info.args.is_empty() => {
                    writeln!(output, "{}{} {{", pad, info.kind.keyword()).unwrap()
                }
                Some(info) => {
                    let args: Vec<String> = info.args.iter().map(|e| e.to_string()).collect();
                    writeln!(output, "{}{} {} {{", pad, info.kind.keyword(), args.join(", ")).unwrap()
                }
                None => writeln!(output, "{}{{", pad).unwrap(),
            }
            write_block_body(output, block, depth + 1);
            writeln!(output, "{}}}", pad).unwrap();
        }
        Stmt::Return(s) => match &s.value {
            Some(value) => writeln!(output, "{}return {};", pad, value).unwrap(),
            None => writeln!(output, "{}return;", pad).unwrap(),
        },
    }
}

fn write_block_body(output: &mut String, block: &Block, depth: usize) {
    for stmt in &block.stmts {
        write_stmt(output, stmt, depth);
    }
}

impl PrettyPrint for Stmt {
    fn pretty_print(&self) -> String {
        let mut output = String::new();
        write_stmt(&mut output, self, 0);
        output
    }
}

impl PrettyPrint for Block {
    fn pretty_print(&self) -> String {
        let mut output = String::new();
        write_block_body(&mut output, self, 0);
        output
    }
}

impl PrettyPrint for InitMethod {
    fn pretty_print(&self) -> String {
        let mut output = String::new();

        let params: Vec<String> = self
            .outer
            .iter()
            .chain(self.params.iter())
            .map(|p| p.to_string())
            .collect();
        writeln!(
            output,
            "proc {}.{}({}) {{",
            self.owner,
            self.name,
            params.join(", ")
        )
        .unwrap();
        write_block_body(&mut output, &self.body, 1);
        writeln!(output, "}}").unwrap();

        output
    }
}
