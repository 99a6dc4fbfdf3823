//! Normalization state tracker
//!
//! `NormalizeState` is a small `Copy` value: the driver forks it when it
//! descends into a nested block and merges the fork back when the block has
//! been walked. No control-flow graph is built.
//!
//! # Invariant
//!
//! Every field before `curr_field` (in declaration order) has been
//! initialized on the current path. `None` means all fields are.

use std::fmt;

use kiln_ir::{AggregateType, Block, CallExpr, Expr, ParallelKind, Span, Stmt};

use crate::config::MarkerNames;
use crate::context::InitContext;
use crate::error::{InternalError, NormalizeResult};
use crate::phase::{chaining_call, classify, ChainingCall, InitPhase};

/// Lexically enclosing block kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    /// Method body or plain nested block
    Normal,
    /// Arm of a conditional
    Cond,
    /// Sequential loop body
    Loop,
    /// begin / begin-on
    Begin,
    /// cobegin
    Cobegin,
    /// coforall / coforall-on
    Coforall,
    /// forall body
    Forall,
    /// on statement
    On,
}

impl From<ParallelKind> for BlockKind {
    fn from(kind: ParallelKind) -> Self {
        match kind {
            ParallelKind::Begin | ParallelKind::BeginOn => BlockKind::Begin,
            ParallelKind::Cobegin => BlockKind::Cobegin,
            ParallelKind::Coforall | ParallelKind::CoforallOn => BlockKind::Coforall,
            ParallelKind::On => BlockKind::On,
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BlockKind::Normal => "normal",
            BlockKind::Cond => "cond",
            BlockKind::Loop => "loop",
            BlockKind::Begin => "begin",
            BlockKind::Cobegin => "cobegin",
            BlockKind::Coforall => "coforall",
            BlockKind::Forall => "forall",
            BlockKind::On => "on",
        };
        write!(f, "{}", name)
    }
}

/// Partial-initialization state of one initializer at one lexical block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizeState {
    /// Current phase
    pub phase: InitPhase,
    /// Index of the first field not yet initialized
    pub curr_field: Option<usize>,
    /// Kind of the enclosing block
    pub block: BlockKind,
    /// Kind of the nearest enclosing block of a different kind
    pub prev_block: BlockKind,
}

impl NormalizeState {
    /// Starting state for an initializer of `ty` with `body`
    pub fn begin(ty: &AggregateType, body: &Block, markers: &MarkerNames) -> Self {
        Self {
            phase: classify(body, markers),
            curr_field: ty.first_real_field(),
            block: BlockKind::Normal,
            prev_block: BlockKind::Normal,
        }
    }

    /// Copy of this state for a nested block of `kind`
    pub fn fork(&self, kind: BlockKind) -> Self {
        let prev_block = if kind != self.block {
            self.block
        } else {
            self.prev_block
        };

        Self {
            phase: self.phase,
            curr_field: self.curr_field,
            block: kind,
            prev_block,
        }
    }

    /// Fork for a nested block; untagged blocks keep the enclosing kind
    pub fn fork_block(&self, block: &Block) -> Self {
        match &block.info {
            Some(info) => self.fork(info.kind.into()),
            None => self.fork(self.block),
        }
    }

    /// Take over the progress made by a walked fork
    pub fn merge(&mut self, fork: &NormalizeState) {
        self.curr_field = fork.curr_field;
        self.phase = fork.phase;
    }

    /// Same phase and same initialized prefix
    pub fn agrees_with(&self, other: &NormalizeState) -> bool {
        self.phase == other.phase && self.curr_field == other.curr_field
    }

    pub fn is_phase0(&self) -> bool {
        self.phase == InitPhase::Phase0
    }

    pub fn is_phase1(&self) -> bool {
        self.phase == InitPhase::Phase1
    }

    pub fn is_phase2(&self) -> bool {
        self.phase == InitPhase::Phase2
    }

    pub fn in_loop_body(&self) -> bool {
        self.block == BlockKind::Loop
    }

    pub fn in_cond_stmt(&self) -> bool {
        self.block == BlockKind::Cond
    }

    pub fn in_parallel_stmt(&self) -> bool {
        matches!(self.block, BlockKind::Begin | BlockKind::Cobegin)
    }

    pub fn in_coforall(&self) -> bool {
        self.block == BlockKind::Coforall
    }

    pub fn in_forall(&self) -> bool {
        self.block == BlockKind::Forall
    }

    pub fn in_on(&self) -> bool {
        self.block == BlockKind::On
    }

    pub fn in_on_in_loop_body(&self) -> bool {
        self.in_on() && self.prev_block == BlockKind::Loop
    }

    pub fn in_on_in_cond_stmt(&self) -> bool {
        self.in_on() && self.prev_block == BlockKind::Cond
    }

    pub fn in_on_in_parallel_stmt(&self) -> bool {
        self.in_on() && matches!(self.prev_block, BlockKind::Begin | BlockKind::Cobegin)
    }

    pub fn in_on_in_coforall(&self) -> bool {
        self.in_on() && self.prev_block == BlockKind::Coforall
    }

    pub fn in_on_in_forall(&self) -> bool {
        self.in_on() && self.prev_block == BlockKind::Forall
    }

    /// Whether field `idx` is already initialized on this path, so that an
    /// explicit assignment to it is a mutation
    pub fn is_field_initialized(&self, idx: usize) -> bool {
        self.curr_field.map_or(true, |curr| idx < curr)
    }

    /// Construct that forbids field initialization and chaining here
    pub fn restriction(&self) -> Option<&'static str> {
        if self.in_loop_body() {
            Some("a loop body")
        } else if self.in_parallel_stmt() {
            Some("a begin or cobegin statement")
        } else if self.in_coforall() {
            Some("a coforall loop")
        } else if self.in_forall() {
            Some("a forall loop")
        } else if self.in_on_in_loop_body() {
            Some("an on statement inside a loop body")
        } else if self.in_on_in_parallel_stmt() {
            Some("an on statement inside a begin or cobegin statement")
        } else if self.in_on_in_coforall() {
            Some("an on statement inside a coforall loop")
        } else if self.in_on_in_forall() {
            Some("an on statement inside a forall loop")
        } else {
            None
        }
    }

    /// Upgrade Phase0 to Phase1 when `block` starts with a parent-chaining
    /// or completion call
    pub fn check_phase(&mut self, block: &Block, markers: &MarkerNames) {
        if self.is_phase0() && classify(block, markers) == InitPhase::Phase1 {
            self.phase = InitPhase::Phase1;
        }
    }

    fn advance(&mut self, ty: &AggregateType) {
        self.curr_field = self
            .curr_field
            .map(|curr| curr + 1)
            .filter(|&next| next < ty.fields.len());
    }

    /// Implicitly initialize every remaining field, emitting into `out`
    pub fn initialize_fields_before(
        &mut self,
        cx: &mut InitContext<'_>,
        span: Span,
        out: &mut Vec<Stmt>,
    ) -> NormalizeResult<()> {
        while let Some(idx) = self.curr_field {
            cx.emit_implicit(self, idx, span, out)?;
            self.advance(cx.ty);
        }
        Ok(())
    }

    /// Implicitly initialize the fields declared before `target`
    pub fn initialize_fields_until(
        &mut self,
        cx: &mut InitContext<'_>,
        target: usize,
        span: Span,
        out: &mut Vec<Stmt>,
    ) -> NormalizeResult<()> {
        while let Some(idx) = self.curr_field.filter(|&idx| idx < target) {
            cx.emit_implicit(self, idx, span, out)?;
            self.advance(cx.ty);
        }
        Ok(())
    }

    /// Explicitly initialize field `target` from `init`, flushing the fields
    /// skipped over first
    pub fn initialize_field_from(
        &mut self,
        cx: &mut InitContext<'_>,
        target: usize,
        init: Expr,
        span: Span,
        out: &mut Vec<Stmt>,
    ) -> NormalizeResult<()> {
        self.initialize_fields_until(cx, target, span, out)?;
        if self.curr_field != Some(target) {
            return Err(InternalError::new(
                format!("field '{}' is not pending", cx.ty.fields[target].name),
                span,
            )
            .into());
        }
        cx.emit_explicit(self, target, init, span, out)?;
        self.advance(cx.ty);
        Ok(())
    }

    /// Flush at the end of the body
    pub fn initialize_fields_at_tail(
        &mut self,
        cx: &mut InitContext<'_>,
        span: Span,
        out: &mut Vec<Stmt>,
    ) -> NormalizeResult<()> {
        if self.curr_field.is_some() {
            self.initialize_fields_before(cx, span, out)?;
        }
        self.phase = InitPhase::Phase2;
        Ok(())
    }

    /// Handle a chaining marker; fields are flushed before parent chaining
    /// and completion
    pub fn complete_chaining(
        &mut self,
        cx: &mut InitContext<'_>,
        call: &CallExpr,
        out: &mut Vec<Stmt>,
    ) -> NormalizeResult<()> {
        let kind = chaining_call(call, &cx.config.markers);
        match kind {
            Some(ChainingCall::ThisInit) => self.curr_field = None,
            Some(ChainingCall::SuperInit | ChainingCall::InitDone) => {
                self.initialize_fields_before(cx, call.span, out)?
            }
            None => {
                return Err(InternalError::new("expected a chaining call", call.span).into());
            }
        }

        self.phase = InitPhase::Phase2;
        Ok(())
    }
}

impl fmt::Display for NormalizeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "phase={} block={}", self.phase, self.block)?;
        if self.block == BlockKind::On {
            write!(f, " (in {})", self.prev_block)?;
        }
        match self.curr_field {
            Some(idx) => write!(f, " field=#{}", idx),
            None => write!(f, " field=done"),
        }
    }
}
