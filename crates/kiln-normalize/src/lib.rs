//! Kiln Initializer Normalization
//!
//! Rewrites user-written initializers into the canonical three-phase form
//! the type-resolution phase expects: every field receives exactly one
//! explicit assignment, in declaration order unless the user reordered
//! them, and every read of a field is proven to happen after the field is
//! initialized.
//!
//! This crate provides:
//! - Phase classification of initializer bodies
//! - A forkable normalization state threaded through nested blocks
//! - The field initialization strategies
//! - Accessibility checking and rewriting of field references
//! - Diagnostics with codespan rendering
//!
//! # Usage
//!
//! ```ignore
//! use kiln_normalize::{normalize_unit, DiagnosticBag, NormalizeConfig};
//!
//! let config = NormalizeConfig::discover(Path::new("."))?;
//! let mut bag = DiagnosticBag::new();
//! let report = normalize_unit(&mut unit, &config, &mut bag)?;
//! ```

pub mod access;
pub mod config;
pub mod context;
pub mod diagnostic;
pub mod driver;
pub mod emit;
pub mod error;
pub mod phase;
pub mod state;

use kiln_ir::{AggregateType, CompilationUnit, InitMethod};
use rustc_hash::FxHashMap;
use serde::Serialize;

// Re-export main types
pub use access::FieldAccess;
pub use config::{BranchPolicy, ConfigError, NormalizeConfig, CONFIG_FILE_NAME};
pub use context::InitContext;
pub use diagnostic::{Diagnostic, DiagnosticBag, DiagnosticSink, Disposition, ErrorCode, Reported};
pub use error::{InitError, InternalError, NormalizeError, NormalizeResult};
pub use phase::{ChainingCall, InitPhase};
pub use state::{BlockKind, NormalizeState};

/// What happened to one initializer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The body was replaced by its normalized form
    Normalized,
    /// A fatal error was reported; the body is unchanged
    Aborted,
}

/// One initializer of a unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEntry {
    /// Position in `CompilationUnit::initializers`
    pub index: usize,
    /// Signature, for display
    pub signature: String,
}

/// Result of normalizing a compilation unit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UnitReport {
    /// Initializers whose body was normalized
    pub normalized: Vec<ReportEntry>,
    /// Initializers abandoned after a fatal error
    pub aborted: Vec<ReportEntry>,
}

impl UnitReport {
    /// Whether the initializer at `index` was normalized
    pub fn is_normalized(&self, index: usize) -> bool {
        self.normalized.iter().any(|entry| entry.index == index)
    }
}

/// Normalize one initializer of `ty`.
///
/// Continuable and fatal user errors go to `sink`. After a fatal error the
/// method is left exactly as it was. An `InternalError` means the input
/// tree is malformed.
#[tracing::instrument(level = "debug", skip_all, fields(init = %method.qualified_name()))]
pub fn normalize_initializer(
    ty: &AggregateType,
    method: &mut InitMethod,
    config: &NormalizeConfig,
    sink: &mut dyn DiagnosticSink,
) -> Result<Outcome, InternalError> {
    if method.owner != ty.name {
        return Err(InternalError::new(
            format!("initializer of '{}' normalized against '{}'", method.owner, ty.name),
            method.span,
        ));
    }

    let has_init_done = phase::has_init_done(&method.body, &config.markers);
    let mut working = method.clone();

    let result = {
        let mut cx = InitContext::new(
            ty,
            config,
            &method.body,
            method.compiler_generated,
            has_init_done,
            sink,
        );
        driver::normalize_body(&mut cx, &mut working)
    };

    match result {
        Ok(()) => {
            *method = working;
            Ok(Outcome::Normalized)
        }
        Err(NormalizeError::Fatal(error)) => {
            tracing::debug!(error = %error, "initializer aborted");
            sink.report_fatal(error);
            Ok(Outcome::Aborted)
        }
        Err(NormalizeError::Internal(error)) => Err(error),
    }
}

/// Normalize every initializer of `unit` against its owner type
pub fn normalize_unit(
    unit: &mut CompilationUnit,
    config: &NormalizeConfig,
    sink: &mut dyn DiagnosticSink,
) -> Result<UnitReport, InternalError> {
    let CompilationUnit {
        types,
        initializers,
        ..
    } = unit;

    let by_name: FxHashMap<&str, &AggregateType> =
        types.iter().map(|ty| (ty.name.as_str(), ty)).collect();

    let mut report = UnitReport::default();
    for (index, method) in initializers.iter_mut().enumerate() {
        let ty = by_name.get(method.owner.as_str()).copied().ok_or_else(|| {
            InternalError::new(format!("unknown owner type '{}'", method.owner), method.span)
        })?;

        let outcome = normalize_initializer(ty, method, config, sink)?;
        let entry = ReportEntry {
            index,
            signature: method.signature(),
        };
        match outcome {
            Outcome::Normalized => report.normalized.push(entry),
            Outcome::Aborted => report.aborted.push(entry),
        }
    }

    Ok(report)
}

/// Phase the initializer starts in, counting the completion marker that is
/// appended to bodies without any chaining call
pub fn start_phase(method: &InitMethod, config: &NormalizeConfig) -> InitPhase {
    if phase::contains_chaining(&method.body, &config.markers) {
        phase::classify(&method.body, &config.markers)
    } else {
        InitPhase::Phase1
    }
}
