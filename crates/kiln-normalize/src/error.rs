//! Error types for initializer normalization
//!
//! `InitError` covers mistakes in the user's program. `InternalError` covers
//! trees that an earlier phase should never have produced.

use std::fmt;

use kiln_ir::Span;
use thiserror::Error;

/// Kind of generic field, for messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenericFieldKind {
    /// `param` field
    Param,
    /// `type` field
    Type,
}

impl fmt::Display for GenericFieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenericFieldKind::Param => write!(f, "param"),
            GenericFieldKind::Type => write!(f, "type"),
        }
    }
}

/// Errors in the user's initializer
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InitError {
    /// Field without type or default that the initializer never sets
    #[error("can't omit initialization of field \"{field}\", no type or default value provided")]
    OmittedFieldInit {
        /// Field name
        field: String,
        /// Where the implicit initialization would have been inserted
        span: Span,
    },

    /// Field read before it is initialized
    #[error("'{field}' used before defined (first used here)")]
    UsedBeforeDefined {
        /// Field name
        field: String,
        /// Location of the read
        span: Span,
    },

    /// Inherited field read before the parent is initialized
    #[error("Cannot access parent field '{field}' during phase 1")]
    ParentFieldInPhase1 {
        /// Field name
        field: String,
        /// Location of the read
        span: Span,
    },

    /// `param` or `type` field initialized with a `new` expression
    #[error("Cannot initialize {kind} field '{field}' with 'new' expression")]
    NewInitOfGenericField {
        /// Field name
        field: String,
        /// param or type
        kind: GenericFieldKind,
        /// Location of the `new` expression
        span: Span,
    },

    /// Field initialized ahead of a delegating `this.init()` call
    #[error("initialization of field '{field}' not allowed before this.init()")]
    FieldInitBeforeThisInit {
        /// Field name
        field: String,
        /// Location of the assignment
        span: Span,
    },

    /// Field initialized inside a loop or parallel construct
    #[error("can't initialize field \"{field}\" inside {context} during phase 1 of initialization")]
    FieldInitInRestrictedBlock {
        /// Field name
        field: String,
        /// Enclosing construct, e.g. "a loop body"
        context: &'static str,
        /// Location of the assignment
        span: Span,
    },

    /// Chaining call inside a loop or parallel construct
    #[error("use of {call} call inside {context}")]
    ChainingInRestrictedBlock {
        /// The call as written, e.g. "super.init()"
        call: String,
        /// Enclosing construct
        context: &'static str,
        /// Location of the call
        span: Span,
    },

    /// The arms of a conditional disagree on what is initialized
    #[error("conditional branches leave fields in different initialization states")]
    DivergentBranches {
        /// Location of the conditional
        span: Span,
    },
}

impl InitError {
    /// Location the error points at
    pub fn span(&self) -> Span {
        use InitError::*;

        match self {
            OmittedFieldInit { span, .. }
            | UsedBeforeDefined { span, .. }
            | ParentFieldInPhase1 { span, .. }
            | NewInitOfGenericField { span, .. }
            | FieldInitBeforeThisInit { span, .. }
            | FieldInitInRestrictedBlock { span, .. }
            | ChainingInRestrictedBlock { span, .. }
            | DivergentBranches { span } => *span,
        }
    }
}

/// Malformed input from an earlier phase
#[derive(Debug, Error, Clone, PartialEq)]
#[error("internal error: {message}")]
pub struct InternalError {
    /// What was wrong
    pub message: String,
    /// Offending node
    pub span: Span,
}

impl InternalError {
    /// Create a new internal error
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

/// Why normalization of one initializer stopped
#[derive(Debug, Error, Clone, PartialEq)]
pub enum NormalizeError {
    /// User error; only this initializer is abandoned
    #[error(transparent)]
    Fatal(#[from] InitError),

    /// Defect in an earlier phase; the whole unit is abandoned
    #[error(transparent)]
    Internal(#[from] InternalError),
}

/// Result alias for the pass internals
pub type NormalizeResult<T> = Result<T, NormalizeError>;
