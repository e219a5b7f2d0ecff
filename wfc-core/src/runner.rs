use crate::{
    entropy::EntropyModel,
    grid::{Boundaries, Grid},
    observer::{observe, Observation},
    propagator::{ConstraintPropagator, CpuConstraintPropagator},
    random::RandomSource,
    wave::WaveGrid,
    ProgressInfo, WfcError,
};
use log::{debug, info, trace, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use wfc_rules::{ActionId, AdjacencyRules, TileSet};

/// Alias for the complex progress callback function type.
pub type ProgressCallback = Box<dyn Fn(ProgressInfo) -> Result<(), WfcError> + Send + Sync>;

/// Attempts made before giving up when none is configured.
pub const DEFAULT_MAX_ATTEMPTS: usize = 10;

/// Configuration options for the solver.
pub struct WfcConfig {
    /// Per-axis boundary handling.
    pub boundaries: Boundaries,
    /// Attempts before the solve reports a contradiction.
    pub max_attempts: usize,
    /// Called after every collapse and once more on success.
    pub progress_callback: Option<ProgressCallback>,
    /// Checked before every observation; raising it interrupts the solve.
    pub shutdown_signal: Arc<AtomicBool>,
    /// Upper bound on collapses per attempt.
    pub max_iterations: Option<u64>,
    /// Seed for the default random source; entropy-seeded when absent.
    pub seed: Option<u64>,
    /// Keep a copy of the wave after every collapse.
    pub capture_states: bool,
}

impl WfcConfig {
    /// Creates a new builder for `WfcConfig`.
    pub fn builder() -> WfcConfigBuilder {
        WfcConfigBuilder::default()
    }
}

impl Default for WfcConfig {
    fn default() -> Self {
        Self {
            boundaries: Boundaries::default(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            progress_callback: None,
            shutdown_signal: Arc::new(AtomicBool::new(false)),
            max_iterations: None,
            seed: None,
            capture_states: false,
        }
    }
}

impl std::fmt::Debug for WfcConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WfcConfig")
            .field("boundaries", &self.boundaries)
            .field("max_attempts", &self.max_attempts)
            .field("progress_callback", &self.progress_callback.is_some())
            .field("max_iterations", &self.max_iterations)
            .field("seed", &self.seed)
            .field("capture_states", &self.capture_states)
            .finish_non_exhaustive()
    }
}

/// Builder for `WfcConfig`.
///
/// Allows for a more ergonomic construction of `WfcConfig` instances.
#[derive(Default)]
pub struct WfcConfigBuilder {
    boundaries: Boundaries,
    max_attempts: Option<usize>,
    progress_callback: Option<ProgressCallback>,
    shutdown_signal: Option<Arc<AtomicBool>>, // Optional, default is created if None
    max_iterations: Option<u64>,
    seed: Option<u64>,
    capture_states: bool,
}

impl WfcConfigBuilder {
    /// Sets the boundary handling of all three axes.
    pub fn boundaries(mut self, boundaries: Boundaries) -> Self {
        self.boundaries = boundaries;
        self
    }

    /// Sets how many independent attempts are made before giving up.
    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    /// Sets the progress callback function.
    pub fn progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Provides an external shutdown signal.
    /// If not provided, a new signal will be created.
    pub fn shutdown_signal(mut self, signal: Arc<AtomicBool>) -> Self {
        self.shutdown_signal = Some(signal);
        self
    }

    /// Sets the maximum number of collapses allowed per attempt.
    pub fn max_iterations(mut self, max: u64) -> Self {
        self.max_iterations = Some(max);
        self
    }

    /// Sets the seed for the random number generator.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn capture_states(mut self, capture: bool) -> Self {
        self.capture_states = capture;
        self
    }

    /// Builds the `WfcConfig` instance.
    pub fn build(self) -> WfcConfig {
        WfcConfig {
            boundaries: self.boundaries,
            max_attempts: self.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS),
            progress_callback: self.progress_callback,
            shutdown_signal: self
                .shutdown_signal
                .unwrap_or_else(|| Arc::new(AtomicBool::new(false))),
            max_iterations: self.max_iterations,
            seed: self.seed,
            capture_states: self.capture_states,
        }
    }
}

/// How a single attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Every cell holds exactly one action.
    Success,
    /// A cell lost every action, or observation left cells undecided.
    Contradiction,
}

/// A fully resolved grid, one action per cell.
#[derive(Debug, Clone)]
pub struct SolvedGrid {
    actions: Grid<ActionId>,
    attempts: usize,
    frames: Vec<WaveGrid>,
}

impl SolvedGrid {
    pub(crate) fn from_parts(actions: Grid<ActionId>, attempts: usize, frames: Vec<WaveGrid>) -> Self {
        Self {
            actions,
            attempts,
            frames,
        }
    }

    /// Grid size as `(width, height, depth)`.
    pub fn dimensions(&self) -> (usize, usize, usize) {
        (self.actions.width, self.actions.height, self.actions.depth)
    }

    /// Action at `(x, y, z)`, or `None` out of range.
    pub fn get(&self, x: usize, y: usize, z: usize) -> Option<ActionId> {
        self.actions.get(x, y, z).copied()
    }

    /// Attempts used, including the successful one.
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    /// Wave snapshots taken after each collapse of the successful attempt.
    ///
    /// Empty unless `capture_states` was enabled.
    pub fn frames(&self) -> &[WaveGrid] {
        &self.frames
    }
}

/// Drives bounded retries of independent solve attempts.
pub struct Solver<'a> {
    tileset: &'a TileSet,
    rules: &'a AdjacencyRules,
    dimensions: (usize, usize, usize),
    config: WfcConfig,
    entropy: EntropyModel,
    propagator: Box<dyn ConstraintPropagator + Send + Sync>,
}

impl<'a> Solver<'a> {
    /// Creates a solver for a `width x height x depth` grid.
    ///
    /// # Errors
    ///
    /// Returns `WfcError::InvalidDimensions` if any dimension is zero and
    /// `WfcError::RuleMismatch` if the rules were built for another action count.
    pub fn new(
        tileset: &'a TileSet,
        rules: &'a AdjacencyRules,
        (width, height, depth): (usize, usize, usize),
        config: WfcConfig,
    ) -> Result<Self, WfcError> {
        if width == 0 || height == 0 || depth == 0 {
            return Err(WfcError::InvalidDimensions {
                width,
                height,
                depth,
            });
        }
        if rules.num_actions() != tileset.num_actions() {
            return Err(WfcError::RuleMismatch {
                tileset: tileset.num_actions(),
                rules: rules.num_actions(),
            });
        }
        let propagator = Box::new(CpuConstraintPropagator::new(config.boundaries));
        Ok(Self {
            tileset,
            rules,
            dimensions: (width, height, depth),
            entropy: EntropyModel::new(tileset.weights()),
            config,
            propagator,
        })
    }

    /// Replaces the default CPU propagator.
    pub fn with_propagator(
        mut self,
        propagator: Box<dyn ConstraintPropagator + Send + Sync>,
    ) -> Self {
        self.propagator = propagator;
        self
    }

    pub fn config(&self) -> &WfcConfig {
        &self.config
    }

    /// Starts a fresh attempt with its own wave.
    ///
    /// # Errors
    ///
    /// Returns `WfcError::InvalidDimensions` if the wave cannot be allocated.
    pub fn attempt(&self, number: usize, started: Instant) -> Result<SolveAttempt<'_>, WfcError> {
        let (width, height, depth) = self.dimensions;
        Ok(SolveAttempt {
            tileset: self.tileset,
            rules: self.rules,
            entropy: &self.entropy,
            propagator: self.propagator.as_ref(),
            config: &self.config,
            wave: WaveGrid::new(width, height, depth, self.tileset.num_actions())?,
            number,
            iterations: 0,
            frames: Vec::new(),
            started,
        })
    }

    /// Solves with a generator seeded from the configured seed, or from entropy.
    pub fn solve(&self) -> Result<SolvedGrid, WfcError> {
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.solve_with(&mut rng)
    }

    /// Runs up to `max_attempts` fresh attempts with the given random source.
    ///
    /// # Errors
    ///
    /// Returns `WfcError::ExhaustedRetries` when every attempt ends in a
    /// contradiction, or the error raised by a cooperative hook.
    pub fn solve_with<R: RandomSource + ?Sized>(
        &self,
        rng: &mut R,
    ) -> Result<SolvedGrid, WfcError> {
        let (width, height, depth) = self.dimensions;
        let max_attempts = self.config.max_attempts;
        info!(
            "Starting WFC solve: {}x{}x{} grid, {} actions, up to {} attempts, boundaries {:?}",
            width,
            height,
            depth,
            self.tileset.num_actions(),
            max_attempts,
            self.config.boundaries
        );
        let started = Instant::now();

        for number in 1..=max_attempts {
            let mut attempt = self.attempt(number, started)?;
            match attempt.run(rng)? {
                Outcome::Success => {
                    if let Some(solved) = attempt.into_solved() {
                        info!(
                            "WFC solve finished in {:?} on attempt {}/{}",
                            started.elapsed(),
                            number,
                            max_attempts
                        );
                        return Ok(solved);
                    }
                    warn!("Attempt {number} reported success with unresolved cells, retrying");
                }
                Outcome::Contradiction => {
                    warn!("Attempt {number}/{max_attempts} ended in a contradiction");
                }
            }
        }

        Err(WfcError::ExhaustedRetries {
            attempts: max_attempts,
        })
    }
}

/// State of one attempt: a fresh wave plus its iteration counters.
pub struct SolveAttempt<'s> {
    tileset: &'s TileSet,
    rules: &'s AdjacencyRules,
    entropy: &'s EntropyModel,
    propagator: &'s (dyn ConstraintPropagator + Send + Sync),
    config: &'s WfcConfig,
    wave: WaveGrid,
    number: usize,
    iterations: u64,
    frames: Vec<WaveGrid>,
    started: Instant,
}

impl SolveAttempt<'_> {
    pub fn wave(&self) -> &WaveGrid {
        &self.wave
    }

    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    /// Clears the wave and alternates observation and propagation until the
    /// grid is resolved or a contradiction is found.
    ///
    /// # Errors
    ///
    /// Returns `WfcError::Interrupted` when the shutdown signal is raised,
    /// `WfcError::MaxIterationsReached` when the collapse budget runs out, and
    /// any error returned by the progress callback.
    pub fn run<R: RandomSource + ?Sized>(&mut self, rng: &mut R) -> Result<Outcome, WfcError> {
        self.wave.clear(self.tileset);
        self.iterations = 0;
        self.frames.clear();
        debug!("Attempt {}: wave cleared", self.number);

        loop {
            if self.config.shutdown_signal.load(Ordering::Relaxed) {
                warn!("Shutdown signal received, stopping WFC run prematurely.");
                return Err(WfcError::Interrupted);
            }

            match observe(&mut self.wave, self.entropy, rng) {
                Observation::Success => {
                    if !self.wave.is_fully_collapsed() {
                        // Zero-weight actions leave domains with zero entropy
                        // that observation never collapses.
                        warn!(
                            "Attempt {}: {} of {} cells still have several candidates",
                            self.number,
                            self.wave.num_cells() - self.wave.collapsed_count(),
                            self.wave.num_cells()
                        );
                        return Ok(Outcome::Contradiction);
                    }
                    debug!(
                        "Attempt {}: resolved after {} iterations",
                        self.number, self.iterations
                    );
                    self.report_progress()?;
                    return Ok(Outcome::Success);
                }
                Observation::Contradiction { cell } => {
                    warn!(
                        "Attempt {}: contradiction at {:?} after {} iterations",
                        self.number, cell, self.iterations
                    );
                    return Ok(Outcome::Contradiction);
                }
                Observation::InProgress { cell, action } => {
                    self.iterations += 1;
                    if let Some(max) = self.config.max_iterations {
                        if self.iterations > max {
                            warn!("Attempt {}: maximum iterations ({max}) reached", self.number);
                            return Err(WfcError::MaxIterationsReached(max));
                        }
                    }
                    if self.config.capture_states {
                        self.frames.push(self.wave.clone());
                    }
                    let passes = self
                        .propagator
                        .propagate_to_fixpoint(&mut self.wave, self.rules);
                    trace!(
                        "Iter {}: collapsed {:?} to {}, {} propagation passes",
                        self.iterations,
                        cell,
                        action,
                        passes
                    );
                    self.report_progress()?;
                }
            }
        }
    }

    fn report_progress(&self) -> Result<(), WfcError> {
        let Some(callback) = &self.config.progress_callback else {
            return Ok(());
        };
        let (width, height, depth) = self.wave.dimensions();
        callback(ProgressInfo {
            attempt: self.number,
            iterations: self.iterations,
            collapsed_cells: self.wave.collapsed_count(),
            total_cells: width * height * depth,
            elapsed_time: self.started.elapsed(),
        })
    }

    /// The resolved grid, once `run` has returned [`Outcome::Success`].
    pub fn into_solved(self) -> Option<SolvedGrid> {
        if !self.wave.is_fully_collapsed() {
            return None;
        }
        let actions = self.wave.resolved_grid()?;
        Some(SolvedGrid::from_parts(actions, self.number, self.frames))
    }
}
