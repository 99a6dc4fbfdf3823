//! `kiln normalize`: rewrite every initializer of a unit.

use anyhow::Context;
use kiln_ir::{CompilationUnit, PrettyPrint};
use kiln_normalize::diagnostic::{create_files, error_code, JsonDiagnostic};
use kiln_normalize::{
    normalize_unit, Diagnostic, DiagnosticBag, Disposition, NormalizeConfig, Reported, UnitReport,
};
use serde::Serialize;
use std::path::Path;
use termcolor::ColorChoice;

use crate::output::StyledOutput;
use crate::Format;

/// Everything `--format json` prints
#[derive(Serialize)]
struct JsonOutput<'a> {
    report: &'a UnitReport,
    diagnostics: Vec<JsonEntry>,
    unit: &'a CompilationUnit,
}

#[derive(Serialize)]
struct JsonEntry {
    disposition: Disposition,
    line: u32,
    column: u32,
    #[serde(flatten)]
    diagnostic: JsonDiagnostic,
}

/// Returns false when anything was reported
pub fn execute(
    path: &Path,
    format: Format,
    config: &NormalizeConfig,
    color: ColorChoice,
) -> anyhow::Result<bool> {
    let mut unit = super::read_unit(path)?;
    let mut bag = DiagnosticBag::new();

    let report = normalize_unit(&mut unit, config, &mut bag)
        .with_context(|| format!("Normalization of {} failed", path.display()))?;
    tracing::debug!(
        normalized = report.normalized.len(),
        aborted = report.aborted.len(),
        diagnostics = bag.len(),
        "unit done"
    );

    let source_name = unit
        .source_name
        .clone()
        .unwrap_or_else(|| path.display().to_string());
    let files = create_files(source_name, unit.source.clone().unwrap_or_default());
    let clean = bag.is_empty();
    let reported = bag.into_vec();

    match format {
        Format::Json => {
            let diagnostics = reported
                .iter()
                .map(|r| {
                    let span = r.error.span();
                    JsonEntry {
                        disposition: r.disposition,
                        line: span.line,
                        column: span.column,
                        diagnostic: JsonDiagnostic::from_diagnostic(
                            &Diagnostic::from_init_error(&r.error, 0),
                            &files,
                        ),
                    }
                })
                .collect();
            let json = JsonOutput {
                report: &report,
                diagnostics,
                unit: &unit,
            };
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        Format::Pretty => {
            let mut out = StyledOutput::new(color);
            print_initializers(&mut out, &unit, &report);
            print_diagnostics(&mut out, &unit, &reported, &files, color)?;
            print_summary(&mut out, &report, reported.len());
        }
    }

    Ok(clean)
}

fn print_initializers(out: &mut StyledOutput, unit: &CompilationUnit, report: &UnitReport) {
    let normalized = unit
        .initializers
        .iter()
        .enumerate()
        .filter(|(index, _)| report.is_normalized(*index))
        .map(|(_, method)| method);

    for (i, method) in normalized.enumerate() {
        if i > 0 {
            out.newline();
        }
        out.plain(&method.pretty_print());
    }
    out.flush();
}

fn print_diagnostics(
    out: &mut StyledOutput,
    unit: &CompilationUnit,
    reported: &[Reported],
    files: &codespan_reporting::files::SimpleFiles<String, String>,
    color: ColorChoice,
) -> anyhow::Result<()> {
    for r in reported {
        if unit.source.is_some() {
            Diagnostic::from_init_error(&r.error, 0)
                .emit(files, color)
                .context("Failed to render diagnostic")?;
        } else {
            let span = r.error.span();
            let location = (span.line > 0).then_some((span.line, span.column));
            out.stderr_diagnostic(error_code(&r.error).as_str(), &r.error.to_string(), location);
        }
    }
    Ok(())
}

fn print_summary(out: &mut StyledOutput, report: &UnitReport, diagnostics: usize) {
    out.newline();
    if diagnostics == 0 {
        out.success("ok");
    } else {
        out.error("failed");
    }
    out.plain(&format!(": {} normalized", report.normalized.len()));
    if !report.aborted.is_empty() {
        out.plain(", ");
        out.warning(&format!("{} aborted", report.aborted.len()));
    }
    out.plain(&format!(", {} diagnostic(s)", diagnostics));
    out.newline();
    out.flush();
}
