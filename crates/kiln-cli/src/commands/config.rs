//! `kiln config`: print the effective configuration.

use kiln_normalize::NormalizeConfig;

pub fn execute(config: &NormalizeConfig) -> anyhow::Result<bool> {
    print!("{}", config.to_toml_string()?);
    Ok(true)
}
