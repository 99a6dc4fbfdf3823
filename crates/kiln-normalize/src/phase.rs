//! Phase classification
//!
//! A static lookahead over a block that answers which initialization phase
//! the block starts in. Chaining markers are recognized by shape only:
//! `this.<this_init>(...)`, `super.<super_init>(...)` and
//! `this.<completion>()`.

use std::fmt;

use kiln_ir::{Block, CallExpr, Stmt, Symbol};

use crate::config::MarkerNames;

/// Initialization phase of an object under construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum InitPhase {
    /// Before any chaining call
    Phase0,
    /// After chaining, before completion
    Phase1,
    /// Fully initialized
    Phase2,
}

impl fmt::Display for InitPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitPhase::Phase0 => write!(f, "Phase0"),
            InitPhase::Phase1 => write!(f, "Phase1"),
            InitPhase::Phase2 => write!(f, "Phase2"),
        }
    }
}

/// Recognized chaining markers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainingCall {
    /// Delegation to another initializer of the same type
    ThisInit,
    /// Chaining to the parent initializer
    SuperInit,
    /// Explicit completion
    InitDone,
}

/// Classify a call as one of the chaining markers
pub fn chaining_call(call: &CallExpr, markers: &MarkerNames) -> Option<ChainingCall> {
    let (base, method) = call.method_target()?;
    match base.as_symbol()? {
        Symbol::This if method == markers.this_init => Some(ChainingCall::ThisInit),
        Symbol::This if method == markers.completion => Some(ChainingCall::InitDone),
        Symbol::Super if method == markers.super_init => Some(ChainingCall::SuperInit),
        _ => None,
    }
}

/// Classify an expression statement as a chaining marker
pub fn chaining_stmt(stmt: &Stmt, markers: &MarkerNames) -> Option<ChainingCall> {
    chaining_call(stmt.as_expr()?.as_call()?, markers)
}

/// Phase `block` provably starts in
pub fn classify(block: &Block, markers: &MarkerNames) -> InitPhase {
    for stmt in &block.stmts {
        let phase = match stmt {
            Stmt::Def(_) => continue,

            Stmt::Expr(_) => match chaining_stmt(stmt, markers) {
                Some(ChainingCall::ThisInit) => InitPhase::Phase0,
                Some(ChainingCall::SuperInit | ChainingCall::InitDone) => InitPhase::Phase1,
                None => continue,
            },

            Stmt::If(s) => {
                let then_phase = classify(&s.then_block, markers);
                match &s.else_block {
                    None => then_phase,
                    Some(else_block) => then_phase.min(classify(else_block, markers)),
                }
            }

            Stmt::Block(inner) => classify(inner, markers),
            Stmt::Forall(s) => classify(&s.body, markers),

            _ => continue,
        };

        if phase != InitPhase::Phase2 {
            return phase;
        }
    }

    InitPhase::Phase2
}

/// Whether any chaining marker appears in `block`, at any depth
pub fn contains_chaining(block: &Block, markers: &MarkerNames) -> bool {
    any_stmt(block, &|stmt| chaining_stmt(stmt, markers).is_some())
}

/// Whether an explicit completion marker appears in `block`, at any depth
pub fn has_init_done(block: &Block, markers: &MarkerNames) -> bool {
    any_stmt(block, &|stmt| {
        chaining_stmt(stmt, markers) == Some(ChainingCall::InitDone)
    })
}

fn any_stmt(block: &Block, pred: &dyn Fn(&Stmt) -> bool) -> bool {
    block.stmts.iter().any(|stmt| {
        pred(stmt)
            || match stmt {
                Stmt::If(s) => {
                    any_stmt(&s.then_block, pred)
                        || s.else_block.as_ref().is_some_and(|b| any_stmt(b, pred))
                }
                Stmt::Loop(s) => any_stmt(&s.body, pred),
                Stmt::Forall(s) => any_stmt(&s.body, pred),
                Stmt::Block(inner) => any_stmt(inner, pred),
                _ => false,
            }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_ir::{Expr, IfStmt, LoopKind, LoopStmt, Span};

    fn marker(base: Expr, method: &str) -> Stmt {
        let span = Span::dummy();
        Stmt::expr(Expr::method_call(base, method, vec![], span))
    }

    fn this_init() -> Stmt {
        marker(Expr::this(Span::dummy()), "init")
    }

    fn super_init() -> Stmt {
        marker(Expr::sym(Symbol::Super, Span::dummy()), "init")
    }

    fn complete() -> Stmt {
        marker(Expr::this(Span::dummy()), "complete")
    }

    fn other() -> Stmt {
        Stmt::expr(Expr::named_call("writeln", vec![], Span::dummy()))
    }

    fn if_stmt(then_stmts: Vec<Stmt>, else_stmts: Option<Vec<Stmt>>) -> Stmt {
        Stmt::If(IfStmt {
            cond: Expr::unresolved("c", Span::dummy()),
            then_block: Block::new(then_stmts),
            else_block: else_stmts.map(Block::new),
            span: Span::dummy(),
        })
    }

    #[test]
    fn test_markers() {
        let markers = MarkerNames::default();
        assert_eq!(chaining_stmt(&this_init(), &markers), Some(ChainingCall::ThisInit));
        assert_eq!(chaining_stmt(&super_init(), &markers), Some(ChainingCall::SuperInit));
        assert_eq!(chaining_stmt(&complete(), &markers), Some(ChainingCall::InitDone));
        assert_eq!(chaining_stmt(&marker(Expr::sym(Symbol::Super, Span::dummy()), "complete"), &markers), None);
        assert_eq!(chaining_stmt(&other(), &markers), None);
    }

    #[test]
    fn test_classify_straight_line() {
        let markers = MarkerNames::default();
        assert_eq!(classify(&Block::new(vec![other()]), &markers), InitPhase::Phase2);
        assert_eq!(classify(&Block::new(vec![other(), this_init()]), &markers), InitPhase::Phase0);
        assert_eq!(classify(&Block::new(vec![super_init(), this_init()]), &markers), InitPhase::Phase1);
        assert_eq!(classify(&Block::new(vec![complete()]), &markers), InitPhase::Phase1);
    }

    #[test]
    fn test_classify_conditionals() {
        let markers = MarkerNames::default();

        let then_only = Block::new(vec![if_stmt(vec![super_init()], None)]);
        assert_eq!(classify(&then_only, &markers), InitPhase::Phase1);

        let either = Block::new(vec![if_stmt(vec![super_init()], Some(vec![this_init()]))]);
        assert_eq!(classify(&either, &markers), InitPhase::Phase0);

        let neither = Block::new(vec![if_stmt(vec![other()], Some(vec![other()])), complete()]);
        assert_eq!(classify(&neither, &markers), InitPhase::Phase1);
    }

    #[test]
    fn test_classify_skips_loops() {
        let markers = MarkerNames::default();
        let body = Block::new(vec![Stmt::Loop(LoopStmt {
            kind: LoopKind::While,
            cond: Expr::unresolved("c", Span::dummy()),
            body: Block::new(vec![this_init()]),
            span: Span::dummy(),
        })]);
        assert_eq!(classify(&body, &markers), InitPhase::Phase2);
        assert!(contains_chaining(&body, &markers));
    }

    #[test]
    fn test_nested_block_is_classified() {
        let markers = MarkerNames::default();
        let body = Block::new(vec![Stmt::Block(Block::new(vec![super_init()]))]);
        assert_eq!(classify(&body, &markers), InitPhase::Phase1);
        assert!(!has_init_done(&body, &markers));

        let nested_done = Block::new(vec![if_stmt(vec![complete()], None)]);
        assert!(has_init_done(&nested_done, &markers));
    }
}
