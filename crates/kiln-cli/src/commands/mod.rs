//! Subcommand implementations

pub mod config;
pub mod normalize;
pub mod phases;

use anyhow::Context;
use kiln_ir::CompilationUnit;
use kiln_normalize::NormalizeConfig;
use std::path::Path;

/// `--config` when given, else `kiln.toml` in the working directory, else
/// the defaults
pub fn load_config(path: Option<&Path>) -> anyhow::Result<NormalizeConfig> {
    match path {
        Some(path) => NormalizeConfig::from_file(path)
            .with_context(|| format!("Failed to load {}", path.display())),
        None => NormalizeConfig::discover(Path::new(".")).context("Failed to load kiln.toml"),
    }
}

/// Read a compilation unit serialized as JSON
pub fn read_unit(path: &Path) -> anyhow::Result<CompilationUnit> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let unit = serde_json::from_str(&text)
        .with_context(|| format!("{} is not a valid compilation unit", path.display()))?;
    Ok(unit)
}
