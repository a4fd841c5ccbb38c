//! Configuration loading
//!
//! The default cell description is compiled in from `sortbay.toml`. A file
//! given on the command line replaces it entirely; missing sections in that
//! file fall back to the built-in defaults, not to the embedded file.

use std::env;
use std::fs;

use serde::Deserialize;

use sortbay_core::config::CellConfig;
use sortbay_drivers::sim::SimConfig;

use crate::error::Result;

/// Embedded default configuration
const EMBEDDED_CONFIG: &str = include_str!("../sortbay.toml");

/// Everything the supervisor reads at startup
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    #[serde(flatten)]
    pub cell: CellConfig,
    pub sim: SimConfig,
}

/// Parse the config path from command line arguments.
///
/// Supports:
/// - `sortbay-supervisor <path>` (positional)
/// - `sortbay-supervisor --config <path>` (flag-based)
/// - `sortbay-supervisor -c <path>` (short flag)
///
/// Returns `None` when no path is given, selecting the embedded config.
pub fn parse_config_path() -> Option<String> {
    let args: Vec<String> = env::args().collect();
    config_path_from(&args)
}

fn config_path_from(args: &[String]) -> Option<String> {
    for i in 1..args.len() {
        if (args[i] == "--config" || args[i] == "-c") && i + 1 < args.len() {
            return Some(args[i + 1].clone());
        }
    }

    if args.len() > 1 && !args[1].starts_with('-') {
        return Some(args[1].clone());
    }

    None
}

/// Parse and validate a TOML configuration
pub fn parse(text: &str) -> Result<AppConfig> {
    let config: AppConfig = toml::from_str(text)?;
    config.cell.validate()?;
    Ok(config)
}

/// Load from `path`, or the embedded config when `None`
pub fn load(path: Option<&str>) -> Result<AppConfig> {
    match path {
        Some(path) => {
            log::info!("Using config: {}", path);
            parse(&fs::read_to_string(path)?)
        }
        None => {
            log::info!("Using embedded config");
            parse(EMBEDDED_CONFIG)
        }
    }
}
