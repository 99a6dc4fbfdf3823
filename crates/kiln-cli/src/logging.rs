//! Tracing subscriber setup
//!
//! Output format is selected by `KILN_LOG_FORMAT`:
//!
//! - `text` (default): flat `tracing-subscriber` lines
//! - `json`: one JSON object per event
//!
//! ```bash
//! KILN_LOG=debug kiln normalize unit.json
//! KILN_LOG=kiln_normalize::emit=debug KILN_LOG_FORMAT=json kiln normalize unit.json
//! ```
//!
//! Nothing is installed unless `KILN_LOG` or `RUST_LOG` is set or `-v` is
//! given. Everything goes to stderr so stdout stays parseable.

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter, Registry};

/// Tracing output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    fn from_env() -> Self {
        match std::env::var("KILN_LOG_FORMAT")
            .unwrap_or_default()
            .to_lowercase()
            .as_str()
        {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }
}

/// `KILN_LOG` wins over `RUST_LOG`; `-v` alone means `debug`
fn build_filter(verbose: bool) -> EnvFilter {
    if let Ok(val) = std::env::var("KILN_LOG") {
        EnvFilter::builder().parse_lossy(val)
    } else if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("off")
    }
}

/// Install the global subscriber when logging was requested
pub fn init_tracing(verbose: bool) {
    let requested = verbose
        || std::env::var("KILN_LOG").is_ok()
        || std::env::var("RUST_LOG").is_ok();
    if !requested {
        return;
    }

    let filter = build_filter(verbose);

    match LogFormat::from_env() {
        LogFormat::Json => {
            let json_layer = fmt::layer().json().with_writer(std::io::stderr);
            Registry::default().with(filter).with(json_layer).init();
        }
        LogFormat::Text => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}
