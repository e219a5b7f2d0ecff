//! tile-forge application library
//!
//! Configuration, logging, progress reporting and output writers for the
//! `tile-forge` command line tool, which fills a 3D grid with oriented tiles
//! using the `wfc-core` solver and rule files read by `wfc-rules`.

pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod setup;

pub use config::{AppConfig, RunSettings};
pub use error::AppError;

use clap::Parser;

/// Parses the command line, resolves the settings and runs one generation.
pub fn run() -> Result<(), AppError> {
    let config = AppConfig::parse();
    let settings = config.resolve()?;
    logging::init_logger(&settings);

    log::info!("tile-forge starting");
    log::debug!("Command line: {:?}", config);
    log::debug!("Resolved settings: {:?}", settings);

    setup::execution::run_standard_mode(&config, &settings)
}
