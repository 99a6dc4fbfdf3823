//! Per-initializer context
//!
//! Everything that stays fixed while one initializer is normalized, plus
//! the temporary counter and the diagnostics sink.

use kiln_ir::{AggregateType, Block, Span, ValueType, VarFlags, VarSymbol};

use crate::access::FieldAccess;
use crate::config::NormalizeConfig;
use crate::diagnostic::DiagnosticSink;
use crate::error::{InitError, InternalError};
use crate::state::NormalizeState;

/// Context shared by the tracker, the emitter and the driver
pub struct InitContext<'a> {
    /// Type under construction
    pub ty: &'a AggregateType,
    /// Pass configuration
    pub config: &'a NormalizeConfig,
    /// The initializer was generated by the compiler
    pub compiler_generated: bool,
    /// The body as written contains an explicit completion marker
    pub has_init_done: bool,
    /// The outer-reference field was reached and needs its formal
    pub outer_requested: bool,
    /// `None` once the id space is used up
    next_var_id: Option<u32>,
    body_span: Span,
    sink: &'a mut dyn DiagnosticSink,
}

impl<'a> InitContext<'a> {
    /// Create a context; temporaries are numbered after the largest
    /// variable id used in `body`
    pub fn new(
        ty: &'a AggregateType,
        config: &'a NormalizeConfig,
        body: &Block,
        compiler_generated: bool,
        has_init_done: bool,
        sink: &'a mut dyn DiagnosticSink,
    ) -> Self {
        Self {
            ty,
            config,
            compiler_generated,
            has_init_done,
            outer_requested: false,
            next_var_id: body.max_var_id().checked_add(1),
            body_span: body.span,
            sink,
        }
    }

    /// Fresh temporary named `<prefix><id>`
    pub fn new_temp(
        &mut self,
        ty: ValueType,
        flags: VarFlags,
    ) -> Result<VarSymbol, InternalError> {
        let id = self.fresh_id()?;
        Ok(VarSymbol {
            id,
            name: format!("{}{}", self.config.emit.temp_prefix, id),
            ty,
            flags,
        })
    }

    /// Fresh variable id; fails once every `u32` id is taken
    pub fn fresh_id(&mut self) -> Result<u32, InternalError> {
        let id = self.next_var_id.ok_or_else(|| {
            InternalError::new("variable ids exhausted; no fresh id after u32::MAX", self.body_span)
        })?;
        self.next_var_id = id.checked_add(1);
        Ok(id)
    }

    /// Accessibility checker for the given state
    pub fn access(&self, state: &NormalizeState) -> FieldAccess<'a> {
        FieldAccess::new(self.ty, *state, self.has_init_done)
    }

    /// Report an error that does not stop normalization
    pub fn report_continuable(&mut self, error: InitError) {
        tracing::debug!(error = %error, "continuable diagnostic");
        self.sink.report_continuable(error);
    }
}
