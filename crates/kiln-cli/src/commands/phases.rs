//! `kiln phases`: show the phase each initializer starts in.

use kiln_normalize::{start_phase, NormalizeConfig};
use std::path::Path;

pub fn execute(path: &Path, config: &NormalizeConfig) -> anyhow::Result<bool> {
    let unit = super::read_unit(path)?;

    let width = unit
        .initializers
        .iter()
        .map(|method| method.qualified_name().len())
        .max()
        .unwrap_or(0);

    for method in &unit.initializers {
        println!(
            "{:width$}  {}",
            method.qualified_name(),
            start_phase(method, config),
            width = width
        );
    }

    Ok(true)
}
