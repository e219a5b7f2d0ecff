//! Command line surface and layered run settings.
//!
//! Settings are resolved from four layers, later layers winning:
//! built-in defaults, an optional TOML file (`--config`), `TILE_FORGE_*`
//! environment variables and finally the flags given on the command line.

use crate::error::AppError;
use clap::{Parser, ValueEnum};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use wfc_core::{Boundaries, BoundaryMode};
use wfc_rules::Markers;

/// Prefix of the environment variables merged into the run settings.
///
/// Nested keys use a double underscore, e.g. `TILE_FORGE_MARKERS__GROUND`.
pub const ENV_PREFIX: &str = "TILE_FORGE_";

/// Format of the placement records written after a successful solve.
#[derive(ValueEnum, Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Pretty-printed JSON array of placement records.
    #[default]
    Json,
    /// One CSV row per placement record.
    Csv,
    /// Layer-by-layer dump of tile labels.
    Text,
}

/// Log level for progress reports.
#[derive(ValueEnum, Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProgressLogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
}

/// Log level for everything outside the progress reporter.
#[derive(ValueEnum, Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GlobalLogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

/// Command line arguments of `tile-forge`.
///
/// Every run setting is optional here; values that are not given fall
/// through to the environment, the configuration file and the defaults.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct AppConfig {
    /// Path to the rule file (`.ron` or `.json`) defining tiles and neighbors.
    #[arg(short, long, value_name = "FILE", env = "TILE_FORGE_RULE_FILE")]
    pub rule_file: PathBuf,

    /// Optional TOML file with run settings.
    #[arg(short, long, value_name = "FILE", env = "TILE_FORGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Width of the output grid.
    #[arg(long)]
    pub width: Option<usize>,

    /// Height of the output grid.
    #[arg(long)]
    pub height: Option<usize>,

    /// Depth (number of layers) of the output grid.
    #[arg(long)]
    pub depth: Option<usize>,

    /// Wrap all axes around unless an axis mode is given explicitly.
    #[arg(long, value_name = "BOOL")]
    pub periodic: Option<bool>,

    /// Boundary handling of the x axis.
    #[arg(long, value_enum)]
    pub boundary_x: Option<BoundaryMode>,

    /// Boundary handling of the y axis.
    #[arg(long, value_enum)]
    pub boundary_y: Option<BoundaryMode>,

    /// Boundary handling of the z axis.
    #[arg(long, value_enum)]
    pub boundary_z: Option<BoundaryMode>,

    /// Number of independent attempts before giving up.
    #[arg(long)]
    pub max_attempts: Option<usize>,

    /// Maximum number of collapses per attempt.
    #[arg(long)]
    pub max_iterations: Option<u64>,

    /// Seed for the random number generator.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Tile seeded into the bottom layer.
    #[arg(long, value_name = "TILE")]
    pub ground: Option<String>,

    /// Tile seeded into the perimeter walls.
    #[arg(long, value_name = "TILE")]
    pub empty: Option<String>,

    /// Tile reserved for the sky.
    #[arg(long, value_name = "TILE")]
    pub sky: Option<String>,

    /// Edge length of one cell in world units, overriding the rule file.
    #[arg(long)]
    pub voxel_size: Option<f32>,

    /// Where to write the placement records. Defaults to stdout.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Format of the placement records.
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Directory receiving one JSON file per collapse step.
    #[arg(long, value_name = "DIR")]
    pub frames_dir: Option<PathBuf>,

    /// Report progress updates every specified interval (e.g., "1s", "500ms").
    #[arg(long, value_name = "DURATION", value_parser = humantime::parse_duration)]
    pub report_progress_interval: Option<Duration>,

    /// Abort the solve once it has run this long (e.g., "30s").
    #[arg(long, value_name = "DURATION", value_parser = humantime::parse_duration)]
    pub time_limit: Option<Duration>,

    /// Log level for everything except progress reports.
    #[arg(long, value_enum)]
    pub log_level: Option<GlobalLogLevel>,

    /// Log level for progress reports.
    #[arg(long, value_enum)]
    pub progress_log_level: Option<ProgressLogLevel>,

    /// Print a colored layer-by-layer view of the result to stderr.
    #[arg(long)]
    pub print_layers: bool,
}

/// Fully resolved settings of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    pub width: usize,
    pub height: usize,
    pub depth: usize,
    /// Default boundary mode of every axis without an explicit mode.
    pub periodic: bool,
    pub boundary_x: Option<BoundaryMode>,
    pub boundary_y: Option<BoundaryMode>,
    pub boundary_z: Option<BoundaryMode>,
    pub max_attempts: usize,
    pub max_iterations: Option<u64>,
    pub seed: Option<u64>,
    pub markers: Markers,
    pub voxel_size: Option<f32>,
    pub output: Option<PathBuf>,
    pub format: OutputFormat,
    pub frames_dir: Option<PathBuf>,
    /// Humantime duration, e.g. `"2s"`.
    pub report_progress_interval: Option<String>,
    /// Humantime duration, e.g. `"1m"`.
    pub time_limit: Option<String>,
    pub log_level: GlobalLogLevel,
    pub progress_log_level: ProgressLogLevel,
    pub print_layers: bool,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            width: 20,
            height: 20,
            depth: 6,
            periodic: true,
            boundary_x: None,
            boundary_y: None,
            boundary_z: None,
            max_attempts: wfc_core::runner::DEFAULT_MAX_ATTEMPTS,
            max_iterations: None,
            seed: None,
            markers: Markers::default(),
            voxel_size: None,
            output: None,
            format: OutputFormat::default(),
            frames_dir: None,
            report_progress_interval: None,
            time_limit: None,
            log_level: GlobalLogLevel::default(),
            progress_log_level: ProgressLogLevel::default(),
            print_layers: false,
        }
    }
}

impl RunSettings {
    pub fn dimensions(&self) -> (usize, usize, usize) {
        (self.width, self.height, self.depth)
    }

    /// Per-axis boundary modes, falling back to `periodic` for unset axes.
    pub fn boundaries(&self) -> Boundaries {
        let fallback = Boundaries::from_periodic(self.periodic);
        Boundaries {
            x: self.boundary_x.unwrap_or(fallback.x),
            y: self.boundary_y.unwrap_or(fallback.y),
            z: self.boundary_z.unwrap_or(fallback.z),
        }
    }

    pub fn report_interval(&self) -> Result<Option<Duration>, AppError> {
        parse_duration_setting(
            "report_progress_interval",
            self.report_progress_interval.as_deref(),
        )
    }

    pub fn time_limit(&self) -> Result<Option<Duration>, AppError> {
        parse_duration_setting("time_limit", self.time_limit.as_deref())
    }

    /// Rejects settings no run could succeed with.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.width == 0 || self.height == 0 || self.depth == 0 {
            return Err(AppError::Config(format!(
                "Grid dimensions must be positive, got {}x{}x{}",
                self.width, self.height, self.depth
            )));
        }
        if self.max_attempts == 0 {
            return Err(AppError::Config(
                "max_attempts must be at least 1".to_owned(),
            ));
        }
        if let Some(size) = self.voxel_size {
            if !size.is_finite() || size <= 0.0 {
                return Err(AppError::Config(format!(
                    "voxel_size must be a positive number, got {size}"
                )));
            }
        }
        self.report_interval()?;
        self.time_limit()?;
        Ok(())
    }
}

fn parse_duration_setting(name: &str, value: Option<&str>) -> Result<Option<Duration>, AppError> {
    value
        .map(|text| {
            humantime::parse_duration(text)
                .map_err(|e| AppError::Config(format!("Invalid duration for {name}: '{text}': {e}")))
        })
        .transpose()
}

/// Values given on the command line; unset fields are not serialized so they
/// never shadow a lower layer.
#[derive(Debug, Default, Serialize)]
struct CliOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    width: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    height: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    depth: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    periodic: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    boundary_x: Option<BoundaryMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    boundary_y: Option<BoundaryMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    boundary_z: Option<BoundaryMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_attempts: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_iterations: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
    markers: MarkerOverrides,
    #[serde(skip_serializing_if = "Option::is_none")]
    voxel_size: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<OutputFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    frames_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    report_progress_interval: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    time_limit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    log_level: Option<GlobalLogLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    progress_log_level: Option<ProgressLogLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    print_layers: Option<bool>,
}

#[derive(Debug, Default, Serialize)]
struct MarkerOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    ground: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    empty: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sky: Option<String>,
}

impl AppConfig {
    fn overrides(&self) -> CliOverrides {
        let format_duration = |d: &Duration| humantime::format_duration(*d).to_string();
        CliOverrides {
            width: self.width,
            height: self.height,
            depth: self.depth,
            periodic: self.periodic,
            boundary_x: self.boundary_x,
            boundary_y: self.boundary_y,
            boundary_z: self.boundary_z,
            max_attempts: self.max_attempts,
            max_iterations: self.max_iterations,
            seed: self.seed,
            markers: MarkerOverrides {
                ground: self.ground.clone(),
                empty: self.empty.clone(),
                sky: self.sky.clone(),
            },
            voxel_size: self.voxel_size,
            output: self.output.clone(),
            format: self.format,
            frames_dir: self.frames_dir.clone(),
            report_progress_interval: self.report_progress_interval.as_ref().map(format_duration),
            time_limit: self.time_limit.as_ref().map(format_duration),
            log_level: self.log_level,
            progress_log_level: self.progress_log_level,
            print_layers: self.print_layers.then_some(true),
        }
    }

    /// The layered configuration sources, lowest priority first.
    pub fn figment(&self) -> Result<Figment, AppError> {
        let mut figment = Figment::from(Serialized::defaults(RunSettings::default()));
        if let Some(path) = &self.config {
            if !path.is_file() {
                return Err(AppError::Config(format!(
                    "Configuration file not found: {}",
                    path.display()
                )));
            }
            figment = figment.merge(Toml::file(path));
        }
        Ok(figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .merge(Serialized::defaults(self.overrides())))
    }

    /// Merges every layer and validates the result.
    pub fn resolve(&self) -> Result<RunSettings, AppError> {
        let settings: RunSettings = self
            .figment()?
            .extract()
            .map_err(|e| AppError::Config(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    fn parse(args: &[&str]) -> AppConfig {
        let mut full = vec!["tile-forge", "--rule-file", "rules.ron"];
        full.extend_from_slice(args);
        AppConfig::try_parse_from(full).unwrap()
    }

    #[test]
    fn test_basic_args() {
        let config = parse(&["--width", "8", "--output", "out.json"]);
        assert_eq!(config.rule_file, PathBuf::from("rules.ron"));
        assert_eq!(config.width, Some(8));
        assert_eq!(config.height, None);
        assert_eq!(config.output, Some(PathBuf::from("out.json")));
        assert!(!config.print_layers);
    }

    #[test]
    fn test_defaults() {
        Jail::expect_with(|_jail| {
            let settings = parse(&[]).resolve().map_err(|e| e.to_string())?;
            assert_eq!(settings.dimensions(), (20, 20, 6));
            assert!(settings.periodic);
            assert_eq!(settings.max_attempts, 10);
            assert_eq!(settings.format, OutputFormat::Json);
            assert_eq!(
                settings.boundaries(),
                Boundaries::uniform(BoundaryMode::Periodic)
            );
            Ok(())
        });
    }

    #[test]
    fn test_progress_interval() {
        let config = parse(&["--report-progress-interval", "2s"]);
        assert_eq!(
            config.report_progress_interval,
            Some(Duration::from_secs(2))
        );
        Jail::expect_with(|_jail| {
            let settings = config.resolve().map_err(|e| e.to_string())?;
            assert_eq!(
                settings.report_interval().map_err(|e| e.to_string())?,
                Some(Duration::from_secs(2))
            );
            Ok(())
        });
    }

    #[test]
    fn test_enum_parsing() {
        let config = parse(&["--format", "csv", "--boundary-z", "clamped"]);
        assert_eq!(config.format, Some(OutputFormat::Csv));
        assert_eq!(config.boundary_z, Some(BoundaryMode::Clamped));

        let err = AppConfig::try_parse_from([
            "tile-forge",
            "--rule-file",
            "r.ron",
            "--format",
            "yaml",
        ]);
        assert!(err.is_err());
    }

    #[test]
    fn test_layers_override_in_order() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "tile-forge.toml",
                r#"
                    width = 5
                    height = 6
                    depth = 2
                    seed = 7
                    time_limit = "1m"

                    [markers]
                    ground = "floor"
                "#,
            )?;
            jail.set_env("TILE_FORGE_HEIGHT", "9");
            jail.set_env("TILE_FORGE_MARKERS__EMPTY", "air");

            let config = parse(&["--config", "tile-forge.toml", "--depth", "3"]);
            let settings = config.resolve().map_err(|e| e.to_string())?;

            assert_eq!(settings.dimensions(), (5, 9, 3));
            assert_eq!(settings.seed, Some(7));
            assert_eq!(settings.markers.ground.as_deref(), Some("floor"));
            assert_eq!(settings.markers.empty.as_deref(), Some("air"));
            assert_eq!(
                settings.time_limit().map_err(|e| e.to_string())?,
                Some(Duration::from_secs(60))
            );
            Ok(())
        });
    }

    #[test]
    fn test_axis_modes_override_periodic() {
        Jail::expect_with(|_jail| {
            let settings = parse(&["--periodic", "false", "--boundary-x", "periodic"])
                .resolve()
                .map_err(|e| e.to_string())?;
            assert_eq!(
                settings.boundaries(),
                Boundaries {
                    x: BoundaryMode::Periodic,
                    y: BoundaryMode::Clamped,
                    z: BoundaryMode::Clamped,
                }
            );
            Ok(())
        });
    }

    #[test]
    fn test_invalid_settings_are_rejected() {
        Jail::expect_with(|jail| {
            assert!(matches!(
                parse(&["--width", "0"]).resolve(),
                Err(AppError::Config(_))
            ));
            assert!(matches!(
                parse(&["--max-attempts", "0"]).resolve(),
                Err(AppError::Config(_))
            ));
            assert!(matches!(
                parse(&["--config", "missing.toml"]).resolve(),
                Err(AppError::Config(_))
            ));

            jail.set_env("TILE_FORGE_TIME_LIMIT", "soon");
            assert!(matches!(parse(&[]).resolve(), Err(AppError::Config(_))));
            Ok(())
        });
    }
}
