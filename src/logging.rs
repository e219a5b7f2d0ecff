//! Logging setup for the application.

use crate::config::{GlobalLogLevel, ProgressLogLevel, RunSettings};
use env_logger::{Builder, Env};
use log::LevelFilter;

/// Module path of the progress reporter, filtered separately.
pub const PROGRESS_MODULE: &str = "tile_forge::progress";

pub fn global_filter(level: GlobalLogLevel) -> LevelFilter {
    match level {
        GlobalLogLevel::Trace => LevelFilter::Trace,
        GlobalLogLevel::Debug => LevelFilter::Debug,
        GlobalLogLevel::Info => LevelFilter::Info,
        GlobalLogLevel::Warn => LevelFilter::Warn,
        GlobalLogLevel::Error => LevelFilter::Error,
    }
}

pub fn progress_level(level: ProgressLogLevel) -> log::Level {
    match level {
        ProgressLogLevel::Trace => log::Level::Trace,
        ProgressLogLevel::Debug => log::Level::Debug,
        ProgressLogLevel::Info => log::Level::Info,
        ProgressLogLevel::Warn => log::Level::Warn,
    }
}

/// Initializes the logger from the resolved run settings.
///
/// The global level comes from `settings.log_level`; `RUST_LOG` directives
/// are applied on top of it, so a module can still be opened up for
/// debugging. The progress module always logs at `settings.progress_log_level`.
pub fn init_logger(settings: &RunSettings) {
    let global_level = global_filter(settings.log_level);
    let progress_filter = progress_level(settings.progress_log_level).to_level_filter();

    let mut builder = Builder::new();
    builder.filter_level(global_level);
    builder.parse_env(Env::default());
    builder.filter_module(PROGRESS_MODULE, progress_filter);

    // A second initialisation (e.g. from tests) keeps the first logger.
    if builder.try_init().is_err() {
        log::debug!("Logger already initialized");
        return;
    }

    log::debug!(
        "Logger initialized with global log level: {:?}, progress log level: {:?}",
        settings.log_level,
        settings.progress_log_level
    );
}
