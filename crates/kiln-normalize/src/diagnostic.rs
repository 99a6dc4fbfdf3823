//! Diagnostic infrastructure for error reporting
//!
//! The pass reports through an injected `DiagnosticSink`. `DiagnosticBag`
//! is the collecting sink used by the CLI and by tests; `Diagnostic` renders
//! a collected error with source context or as JSON.

use codespan_reporting::diagnostic::{Diagnostic as CsDiagnostic, Label, Severity};
use codespan_reporting::files::{Files, SimpleFiles};
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use kiln_ir::Span;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::InitError;

/// Receives the user errors found while normalizing
pub trait DiagnosticSink {
    /// Record an error; normalization of the current initializer goes on
    fn report_continuable(&mut self, error: InitError);

    /// Record an error that stops normalization of the current initializer
    fn report_fatal(&mut self, error: InitError);
}

/// How a reported error affected the pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    /// The pass kept going
    Continuable,
    /// The initializer was abandoned
    Fatal,
}

/// One reported error
#[derive(Debug, Clone, PartialEq)]
pub struct Reported {
    /// Continuable or fatal
    pub disposition: Disposition,
    /// The error
    pub error: InitError,
}

/// Sink that keeps everything in report order
#[derive(Debug, Default)]
pub struct DiagnosticBag {
    reported: Vec<Reported>,
}

impl DiagnosticBag {
    /// Create an empty bag
    pub fn new() -> Self {
        Self::default()
    }

    /// True when nothing was reported
    pub fn is_empty(&self) -> bool {
        self.reported.is_empty()
    }

    /// Number of reported errors
    pub fn len(&self) -> usize {
        self.reported.len()
    }

    /// Reported errors in order
    pub fn iter(&self) -> impl Iterator<Item = &Reported> {
        self.reported.iter()
    }

    /// Errors without their disposition
    pub fn errors(&self) -> impl Iterator<Item = &InitError> {
        self.reported.iter().map(|r| &r.error)
    }

    /// Whether any fatal error was reported
    pub fn has_fatal(&self) -> bool {
        self.reported
            .iter()
            .any(|r| r.disposition == Disposition::Fatal)
    }

    /// Take the collected reports
    pub fn into_vec(self) -> Vec<Reported> {
        self.reported
    }
}

impl DiagnosticSink for DiagnosticBag {
    fn report_continuable(&mut self, error: InitError) {
        self.reported.push(Reported {
            disposition: Disposition::Continuable,
            error,
        });
    }

    fn report_fatal(&mut self, error: InitError) {
        self.reported.push(Reported {
            disposition: Disposition::Fatal,
            error,
        });
    }
}

/// Error code for a diagnostic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorCode(pub &'static str);

impl ErrorCode {
    /// The code as text, e.g. "E4002"
    pub fn as_str(&self) -> &str {
        self.0
    }
}

/// A diagnostic message with source code context
pub struct Diagnostic {
    /// The underlying codespan diagnostic
    inner: CsDiagnostic<usize>,
    /// Error code (e.g., "E4001")
    code: Option<ErrorCode>,
}

impl Diagnostic {
    /// Create a new diagnostic
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Diagnostic {
            inner: CsDiagnostic::new(severity).with_message(message),
            code: None,
        }
    }

    /// Create an error diagnostic
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    /// Set the error code
    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.inner = self.inner.with_code(code.0);
        self.code = Some(code);
        self
    }

    /// Add a primary label (main error location)
    pub fn with_primary_label(mut self, file_id: usize, span: Span, message: impl Into<String>) -> Self {
        let label = Label::primary(file_id, span.start..span.end).with_message(message);
        self.inner.labels.push(label);
        self
    }

    /// Add a note (additional context)
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.inner.notes.push(note.into());
        self
    }

    /// Add a help suggestion
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.inner.notes.push(format!("help: {}", help.into()));
        self
    }

    /// Create diagnostic from an InitError
    pub fn from_init_error(error: &InitError, file_id: usize) -> Self {
        use InitError::*;

        let diag = Diagnostic::error(error.to_string()).with_code(error_code(error));

        match error {
            OmittedFieldInit { span, .. } => diag
                .with_primary_label(file_id, *span, "field initialized implicitly here")
                .with_help("declare a type or a default value, or initialize the field explicitly"),

            UsedBeforeDefined { span, .. } => diag
                .with_primary_label(file_id, *span, "not initialized yet")
                .with_note("fields are initialized in declaration order"),

            ParentFieldInPhase1 { span, .. } => diag
                .with_primary_label(file_id, *span, "parent part of the object is not initialized")
                .with_help("move the access after the parent initializer call"),

            NewInitOfGenericField { span, kind, .. } => diag
                .with_primary_label(file_id, *span, "'new' expression")
                .with_note(format!("a {} field must be known at compile time", kind)),

            FieldInitBeforeThisInit { span, .. } => diag
                .with_primary_label(file_id, *span, "field initialized here")
                .with_note("the delegated initializer initializes every field"),

            FieldInitInRestrictedBlock { span, context, .. } => diag
                .with_primary_label(file_id, *span, format!("inside {}", context)),

            ChainingInRestrictedBlock { span, context, .. } => diag
                .with_primary_label(file_id, *span, format!("inside {}", context)),

            DivergentBranches { span } => diag
                .with_primary_label(file_id, *span, "branches disagree")
                .with_help("initialize the same fields in every arm"),
        }
    }

    /// Emit the diagnostic to stderr
    pub fn emit(
        &self,
        files: &SimpleFiles<String, String>,
        color: ColorChoice,
    ) -> Result<(), codespan_reporting::files::Error> {
        let mut writer = StandardStream::stderr(color);
        let config = codespan_reporting::term::Config::default();
        term::emit(&mut writer, &config, files, &self.inner)
    }

    /// Get the underlying codespan diagnostic (for testing/custom rendering)
    pub fn inner(&self) -> &CsDiagnostic<usize> {
        &self.inner
    }

    /// Error code, if any
    pub fn code(&self) -> Option<&ErrorCode> {
        self.code.as_ref()
    }
}

/// JSON representation of a diagnostic
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonDiagnostic {
    /// Error code (e.g., "E4001")
    pub code: Option<String>,
    /// Severity level
    pub severity: String,
    /// Main error message
    pub message: String,
    /// Source locations with labels
    pub labels: Vec<JsonLabel>,
    /// Additional notes and help
    pub notes: Vec<String>,
}

/// JSON representation of a diagnostic label
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonLabel {
    /// File path
    pub file: String,
    /// Start line (1-indexed)
    pub start_line: usize,
    /// Start column (1-indexed)
    pub start_column: usize,
    /// End line (1-indexed)
    pub end_line: usize,
    /// End column (1-indexed)
    pub end_column: usize,
    /// Label message
    pub message: Option<String>,
}

impl JsonDiagnostic {
    /// Convert a Diagnostic to JSON representation
    pub fn from_diagnostic(diag: &Diagnostic, files: &SimpleFiles<String, String>) -> Self {
        let severity = match diag.inner.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Note => "note",
            Severity::Help => "help",
            Severity::Bug => "bug",
        };

        let labels = diag
            .inner
            .labels
            .iter()
            .filter_map(|label| {
                let file = files.get(label.file_id).ok()?;
                let start = file.location((), label.range.start).ok()?;
                let end = file.location((), label.range.end).ok()?;

                Some(JsonLabel {
                    file: file.name().to_string(),
                    start_line: start.line_number,
                    start_column: start.column_number,
                    end_line: end.line_number,
                    end_column: end.column_number,
                    message: Some(label.message.clone()),
                })
            })
            .collect();

        JsonDiagnostic {
            code: diag.code.as_ref().map(|c| c.0.to_string()),
            severity: severity.to_string(),
            message: diag.inner.message.clone(),
            labels,
            notes: diag.inner.notes.clone(),
        }
    }
}

/// Get error code for an InitError
pub fn error_code(error: &InitError) -> ErrorCode {
    use InitError::*;

    match error {
        OmittedFieldInit { .. } => ErrorCode("E4001"),
        UsedBeforeDefined { .. } => ErrorCode("E4002"),
        ParentFieldInPhase1 { .. } => ErrorCode("E4003"),
        NewInitOfGenericField { .. } => ErrorCode("E4004"),
        FieldInitBeforeThisInit { .. } => ErrorCode("E4005"),
        FieldInitInRestrictedBlock { .. } => ErrorCode("E4006"),
        ChainingInRestrictedBlock { .. } => ErrorCode("E4007"),
        DivergentBranches { .. } => ErrorCode("E4008"),
    }
}

/// Helper to create a SimpleFiles instance from source code
pub fn create_files(path: impl Into<PathBuf>, source: impl Into<String>) -> SimpleFiles<String, String> {
    let mut files = SimpleFiles::new();
    files.add(path.into().display().to_string(), source.into());
    files
}
