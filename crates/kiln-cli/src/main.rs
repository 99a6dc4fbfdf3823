//! Kiln command-line tool
//!
//! Reads a compilation unit serialized as JSON, runs initializer
//! normalization over it and prints the rewritten initializers together
//! with the diagnostics.

mod commands;
mod logging;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "kiln")]
#[command(about = "Three-phase initializer normalization", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to ./kiln.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Colored output: auto, always or never
    #[arg(long, global = true, value_parser = ["auto", "always", "never"])]
    color: Option<String>,

    /// Debug logging when KILN_LOG is not set
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize every initializer of a unit
    Normalize {
        /// Compilation unit (JSON)
        unit: PathBuf,
        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Pretty)]
        format: Format,
    },

    /// Show the phase each initializer starts in
    Phases {
        /// Compilation unit (JSON)
        unit: PathBuf,
    },

    /// Print the effective configuration
    Config,
}

/// Output format of `kiln normalize`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Pretty-printed initializers and rendered diagnostics
    Pretty,
    /// The normalized unit, the report and the diagnostics as one JSON object
    Json,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    logging::init_tracing(cli.verbose);
    let color = output::resolve_color_choice(cli.color.as_deref());
    let config = commands::load_config(cli.config.as_deref())?;

    let success = match cli.command {
        Commands::Normalize { unit, format } => {
            commands::normalize::execute(&unit, format, &config, color)?
        }
        Commands::Phases { unit } => commands::phases::execute(&unit, &config)?,
        Commands::Config => commands::config::execute(&config)?,
    };

    if !success {
        std::process::exit(1);
    }
    Ok(())
}
