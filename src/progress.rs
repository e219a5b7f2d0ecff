use anyhow::Result;
use log::Level;
use std::time::Duration;
use wfc_core::{ProgressInfo, WfcError};

/// Trait for reporting the progress of a solve.
///
/// Implementors of this trait can display progress information in various ways
/// (e.g., console output, a progress file).
pub trait ProgressReporter: Send {
    /// Called after every collapse with updated progress information.
    fn report(&mut self, info: &ProgressInfo) -> Result<()>;

    /// Called when the solve completes successfully.
    fn finish(&mut self, attempts: usize) -> Result<()>;

    /// Called when the solve fails with an error.
    fn fail(&mut self, error: &WfcError) -> Result<()>;
}

/// A `ProgressReporter` that writes throttled status lines to the log.
pub struct ConsoleProgressReporter {
    report_interval: Duration,
    level: Level,
    last_report: Option<Duration>,
    last_elapsed: Duration,
    reports: usize,
}

impl ConsoleProgressReporter {
    /// Creates a reporter emitting at most one line per `report_interval` of
    /// solve time, logged at `level`.
    pub fn new(report_interval: Duration, level: Level) -> Self {
        Self {
            report_interval,
            level,
            last_report: None,
            last_elapsed: Duration::ZERO,
            reports: 0,
        }
    }

    /// Number of progress lines emitted so far.
    pub fn reports(&self) -> usize {
        self.reports
    }

    fn format_duration(duration: Duration) -> String {
        let secs = duration.as_secs();
        let millis = duration.subsec_millis();
        format!("{}.{:03}s", secs, millis)
    }

    fn due(&self, elapsed: Duration) -> bool {
        match self.last_report {
            None => true,
            Some(last) => elapsed.saturating_sub(last) >= self.report_interval,
        }
    }
}

impl ProgressReporter for ConsoleProgressReporter {
    fn report(&mut self, info: &ProgressInfo) -> Result<()> {
        self.last_elapsed = info.elapsed_time;
        if !self.due(info.elapsed_time) {
            return Ok(());
        }

        let percentage = if info.total_cells > 0 {
            (info.collapsed_cells as f32 / info.total_cells as f32) * 100.0
        } else {
            100.0
        };
        let elapsed_secs = info.elapsed_time.as_secs_f32();
        let rate = if elapsed_secs > 0.0 {
            info.iterations as f32 / elapsed_secs
        } else {
            0.0
        };

        log::log!(
            self.level,
            "Progress: Attempt {} | Iter: {} | Collapsed: {}/{} ({:.1}%) | Elapsed: {} | Rate: {:.1} collapses/s",
            info.attempt,
            info.iterations,
            info.collapsed_cells,
            info.total_cells,
            percentage,
            Self::format_duration(info.elapsed_time),
            rate
        );

        self.last_report = Some(info.elapsed_time);
        self.reports += 1;
        Ok(())
    }

    fn finish(&mut self, attempts: usize) -> Result<()> {
        log::info!(
            "WFC finished successfully after {} attempt(s). Total time: {}",
            attempts,
            Self::format_duration(self.last_elapsed)
        );
        Ok(())
    }

    fn fail(&mut self, error: &WfcError) -> Result<()> {
        log::error!(
            "WFC failed: {}. Total time: {}",
            error,
            Self::format_duration(self.last_elapsed)
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(iterations: u64, collapsed_cells: usize, elapsed_ms: u64) -> ProgressInfo {
        ProgressInfo {
            attempt: 1,
            iterations,
            collapsed_cells,
            total_cells: 1000,
            elapsed_time: Duration::from_millis(elapsed_ms),
        }
    }

    #[test]
    fn test_console_reporter_throttles() {
        let mut reporter = ConsoleProgressReporter::new(Duration::from_millis(50), Level::Info);

        assert!(reporter.report(&info(10, 50, 0)).is_ok());
        assert_eq!(reporter.reports(), 1);

        // Within the interval: throttled.
        assert!(reporter.report(&info(11, 55, 20)).is_ok());
        assert_eq!(reporter.reports(), 1);

        assert!(reporter.report(&info(20, 100, 60)).is_ok());
        assert_eq!(reporter.reports(), 2);
    }

    #[test]
    fn test_console_reporter_zero_cells() {
        let mut reporter = ConsoleProgressReporter::new(Duration::ZERO, Level::Debug);
        let empty = ProgressInfo {
            total_cells: 0,
            ..info(0, 0, 0)
        };
        assert!(reporter.report(&empty).is_ok());
        assert!(reporter.report(&empty).is_ok());
        assert_eq!(reporter.reports(), 2);
        assert!(reporter.finish(1).is_ok());
        assert!(reporter.fail(&WfcError::Interrupted).is_ok());
    }
}
