//! Handles the core execution logic: load, compile, solve, write.

use crate::{
    config::{AppConfig, RunSettings},
    error::AppError,
    logging, output,
    progress::{ConsoleProgressReporter, ProgressReporter},
    setup::visualization,
};
use log::{error, info, warn};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wfc_core::{
    PlacementTable, ProgressCallback, ProgressInfo, SolvedGrid, Solver, WfcConfig, WfcError,
};
use wfc_rules::{loader::load_from_file, AdjacencyRules, LoadError, TileSet};

/// A compiled rule file ready for solving.
#[derive(Debug)]
pub struct LoadedRules {
    pub tileset: TileSet,
    pub rules: AdjacencyRules,
    pub voxel_size: f32,
}

/// Reads `path`, expands its tiles with the configured markers and builds the
/// adjacency rules. A configured voxel size replaces the one in the file.
pub fn load_rules(path: &Path, settings: &RunSettings) -> Result<LoadedRules, AppError> {
    info!("Loading rules from: {}", path.display());
    let rule_set = load_from_file(path)?;
    let (tileset, rules) =
        wfc_rules::compile(&rule_set, &settings.markers).map_err(LoadError::from)?;
    let voxel_size = settings.voxel_size.unwrap_or(rule_set.voxel_size);
    info!(
        "Rules loaded: {} tiles, {} actions, voxel size {}",
        tileset.num_tiles(),
        tileset.num_actions(),
        voxel_size
    );
    Ok(LoadedRules {
        tileset,
        rules,
        voxel_size,
    })
}

/// Builds the progress callback: throttled reports plus the optional time limit.
fn progress_callback(
    reporter: Arc<Mutex<ConsoleProgressReporter>>,
    time_limit: Option<Duration>,
) -> ProgressCallback {
    Box::new(move |info: ProgressInfo| {
        {
            let mut reporter = reporter
                .lock()
                .map_err(|_| WfcError::Callback("progress reporter mutex poisoned".to_owned()))?;
            if let Err(e) = reporter.report(&info) {
                warn!("Progress report failed: {}", e);
            }
        }
        if let Some(limit) = time_limit {
            if info.elapsed_time > limit {
                return Err(WfcError::Callback(format!(
                    "time limit of {} exceeded",
                    humantime::format_duration(limit)
                )));
            }
        }
        Ok(())
    })
}

/// Runs the solver over the loaded rules with the resolved settings.
pub fn solve(loaded: &LoadedRules, settings: &RunSettings) -> Result<SolvedGrid, AppError> {
    let report_interval = settings.report_interval()?.unwrap_or(Duration::from_secs(1));
    let reporter = Arc::new(Mutex::new(ConsoleProgressReporter::new(
        report_interval,
        logging::progress_level(settings.progress_log_level),
    )));

    let mut builder = WfcConfig::builder()
        .boundaries(settings.boundaries())
        .max_attempts(settings.max_attempts)
        .capture_states(settings.frames_dir.is_some())
        .progress_callback(progress_callback(
            Arc::clone(&reporter),
            settings.time_limit()?,
        ));
    if let Some(seed) = settings.seed {
        builder = builder.seed(seed);
    }
    if let Some(max) = settings.max_iterations {
        builder = builder.max_iterations(max);
    }

    let solver = Solver::new(
        &loaded.tileset,
        &loaded.rules,
        settings.dimensions(),
        builder.build(),
    )?;
    let result = solver.solve();

    let mut reporter = reporter
        .lock()
        .map_err(|_| AppError::Anyhow(anyhow::anyhow!("progress reporter mutex poisoned")))?;
    match result {
        Ok(solved) => {
            reporter.finish(solved.attempts())?;
            Ok(solved)
        }
        Err(e) => {
            reporter.fail(&e)?;
            Err(e.into())
        }
    }
}

/// Writes the solution, the optional frame export and the optional layer view.
pub fn write_outputs(
    loaded: &LoadedRules,
    solved: &SolvedGrid,
    settings: &RunSettings,
) -> Result<(), AppError> {
    let table = PlacementTable::new(&loaded.tileset, loaded.voxel_size);

    if let Some(dir) = &settings.frames_dir {
        let paths = visualization::export_frames(dir, solved.frames(), &table)?;
        info!("Exported {} frames", paths.len());
    }

    output::save_solution(
        settings.output.as_deref(),
        settings.format,
        solved,
        &loaded.tileset,
        &table,
    )?;

    if settings.print_layers {
        eprint!("{}", output::render_layers(solved, &loaded.tileset));
    }
    Ok(())
}

/// Runs one full generation for the given command line and settings.
pub fn run_standard_mode(config: &AppConfig, settings: &RunSettings) -> Result<(), AppError> {
    info!("Running WFC standard mode...");
    let loaded = load_rules(&config.rule_file, settings)?;
    let solved = solve(&loaded, settings).map_err(|e| {
        error!("Generation failed: {}", e);
        e
    })?;
    write_outputs(&loaded, &solved, settings)?;
    info!("Generation finished.");
    Ok(())
}
