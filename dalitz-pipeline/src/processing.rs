//! The event loop: records in, feature matrix out.

use crate::config::PipelineConfig;
use crate::progress::{Clock, ProgressReporter};
use dalitz_core::error::{Error, Result};
use dalitz_core::{EventCandidates, EventSource, FeatureMatrix};
use ndarray::Array2;
use rayon::prelude::*;
use std::ops::{AddAssign, Range};
use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Per-run selection counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SelectionStats {
    /// Records read from the source.
    pub events_read: usize,
    /// Records inside the acceptance window.
    pub events_passed: usize,
    /// Records outside the acceptance window.
    pub events_rejected: usize,
    /// Rejected records whose invariant masses came out NaN.
    pub non_physical: usize,
}

impl SelectionStats {
    /// Fraction of read events that passed.
    #[must_use]
    pub fn acceptance(&self) -> f64 {
        if self.events_read == 0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let ratio = self.events_passed as f64 / self.events_read as f64;
        ratio
    }
}

impl AddAssign for SelectionStats {
    fn add_assign(&mut self, rhs: Self) {
        self.events_read += rhs.events_read;
        self.events_passed += rhs.events_passed;
        self.events_rejected += rhs.events_rejected;
        self.non_physical += rhs.non_physical;
    }
}

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// `(N_passing, 3)` matrix, columns `[s_pos_neg, s_pos_pi0, s_neg_pi0]`.
    pub features: Array2<f64>,
    /// Selection counters.
    pub stats: SelectionStats,
    /// Wall time spent in the loop.
    pub elapsed: Duration,
}

impl RunReport {
    /// Shape of the feature matrix as `(rows, cols)`.
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        self.features.dim()
    }

    /// Serializable summary without the matrix itself.
    #[must_use]
    pub fn summary(&self) -> RunSummary {
        let (rows, cols) = self.shape();
        RunSummary {
            stats: self.stats,
            rows,
            cols,
            elapsed_secs: self.elapsed.as_secs_f64(),
        }
    }
}

/// Run statistics suitable for logging or JSON export.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RunSummary {
    /// Selection counters.
    pub stats: SelectionStats,
    /// Feature matrix rows.
    pub rows: usize,
    /// Feature matrix columns.
    pub cols: usize,
    /// Wall time spent in the loop.
    pub elapsed_secs: f64,
}

/// Single-pass event loop.
///
/// Each record is read, turned into four candidates, selected and, if
/// accepted, appended to the feature matrix before the next record is read.
/// The first field error aborts the run.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Creates a pipeline with the given configuration.
    #[must_use]
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Current configuration.
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Runs the loop over one source.
    ///
    /// # Errors
    /// Returns [`Error::FieldAccess`] for the first bad record, any error the
    /// source raises, or [`Error::EmptyResult`] when nothing passed.
    pub fn run<S>(
        &self,
        source: &S,
        progress: &mut dyn ProgressReporter,
        clock: &dyn Clock,
    ) -> Result<RunReport>
    where
        S: EventSource,
    {
        self.run_many(std::slice::from_ref(source), progress, clock)
    }

    /// Runs the loop over several sources in order, producing one matrix.
    ///
    /// # Errors
    /// See [`run`](Self::run).
    pub fn run_many<S>(
        &self,
        sources: &[S],
        progress: &mut dyn ProgressReporter,
        clock: &dyn Clock,
    ) -> Result<RunReport>
    where
        S: EventSource,
    {
        let start = clock.now();
        let total: usize = sources.iter().map(EventSource::len).sum();
        let interval = self.config.progress_interval.max(1);
        if self.config.show_progress {
            progress.start(total);
        }

        let mut matrix = FeatureMatrix::new();
        let mut stats = SelectionStats::default();
        let mut done = 0usize;

        for source in sources {
            log::debug!("reading {}", source.describe());
            for index in 0..source.len() {
                process_event(source, index, &mut matrix, &mut stats)?;
                done += 1;
                if self.config.show_progress && done % interval == 0 {
                    progress.advance(done);
                }
            }
        }

        if self.config.show_progress {
            progress.finish();
        }
        finish_run(matrix, stats, clock.now().saturating_sub(start))
    }

    /// Runs the loop with event indices partitioned across the rayon pool.
    ///
    /// Chunks are processed independently and concatenated in event order,
    /// so the matrix is identical to the sequential run.
    ///
    /// # Errors
    /// See [`run`](Self::run). When several chunks fail, the error of the
    /// earliest chunk is returned.
    pub fn run_parallel<S>(&self, source: &S, clock: &dyn Clock) -> Result<RunReport>
    where
        S: EventSource + Sync,
    {
        self.run_many_parallel(std::slice::from_ref(source), clock)
    }

    /// Parallel counterpart of [`run_many`](Self::run_many).
    ///
    /// Chunks never span two sources.
    ///
    /// # Errors
    /// See [`run_parallel`](Self::run_parallel).
    pub fn run_many_parallel<S>(&self, sources: &[S], clock: &dyn Clock) -> Result<RunReport>
    where
        S: EventSource + Sync,
    {
        let start = clock.now();
        let chunk = self.config.parallel_chunk_size.max(1);
        let tasks: Vec<(&S, Range<usize>)> = sources
            .iter()
            .flat_map(|source| {
                let len = source.len();
                (0..len)
                    .step_by(chunk)
                    .map(move |lo| (source, lo..(lo + chunk).min(len)))
            })
            .collect();
        log::debug!(
            "processing {} sources in {} chunks of up to {} events",
            sources.len(),
            tasks.len(),
            chunk
        );

        let parts: Vec<Result<(FeatureMatrix, SelectionStats)>> = tasks
            .into_par_iter()
            .map(|(source, range)| process_range(source, range))
            .collect();

        let mut matrix = FeatureMatrix::new();
        let mut stats = SelectionStats::default();
        for part in parts {
            let (mut part, part_stats) = part?;
            matrix.append(&mut part);
            stats += part_stats;
        }
        finish_run(matrix, stats, clock.now().saturating_sub(start))
    }
}

fn process_range<S>(source: &S, range: Range<usize>) -> Result<(FeatureMatrix, SelectionStats)>
where
    S: EventSource + ?Sized,
{
    let mut matrix = FeatureMatrix::new();
    let mut stats = SelectionStats::default();
    for index in range {
        process_event(source, index, &mut matrix, &mut stats)?;
    }
    Ok((matrix, stats))
}

fn process_event<S>(
    source: &S,
    index: usize,
    matrix: &mut FeatureMatrix,
    stats: &mut SelectionStats,
) -> Result<()>
where
    S: EventSource + ?Sized,
{
    let record = source.record(index)?;
    let candidates = EventCandidates::from_record(&record)
        .map_err(|err| Error::FieldAccess { index, source: err })?;
    let selection = candidates.select();

    stats.events_read += 1;
    match selection.accepted() {
        Some(row) => {
            matrix.push(row);
            stats.events_passed += 1;
        }
        None => {
            stats.events_rejected += 1;
            if !selection.is_physical() {
                stats.non_physical += 1;
                log::debug!("event {index}: negative invariant mass radicand, rejected");
            }
        }
    }
    Ok(())
}

fn finish_run(matrix: FeatureMatrix, stats: SelectionStats, elapsed: Duration) -> Result<RunReport> {
    if stats.non_physical > 0 {
        log::warn!(
            "{} events had a negative invariant mass radicand and were rejected",
            stats.non_physical
        );
    }
    log::info!(
        "{} of {} events passed the kinematic selection",
        stats.events_passed,
        stats.events_read
    );
    let features = matrix.finalize()?;
    Ok(RunReport {
        features,
        stats,
        elapsed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::SilentProgress;
    use dalitz_core::EventColumns;
    use std::cell::Cell;

    struct StepClock {
        ticks: Cell<u64>,
    }

    impl Clock for StepClock {
        fn now(&self) -> Duration {
            let t = self.ticks.get();
            self.ticks.set(t + 1);
            Duration::from_millis(t * 250)
        }
    }

    /// Pions at rest-ish and a photon pair of mass 2 * `photon_mag`.
    fn event(photon_mag: f64) -> [f64; 12] {
        use std::f64::consts::{FRAC_PI_2, PI};
        [
            0.3, FRAC_PI_2, 0.0, 0.3, FRAC_PI_2, PI, photon_mag, FRAC_PI_2, 0.0, photon_mag,
            FRAC_PI_2, PI,
        ]
    }

    #[test]
    fn test_run_counts_and_elapsed() {
        let table = EventColumns::from_rows(&[event(0.06), event(0.2), event(0.05)]);
        let clock = StepClock {
            ticks: Cell::new(0),
        };
        let report = Pipeline::default()
            .run(&table, &mut SilentProgress, &clock)
            .unwrap();
        assert_eq!(report.shape(), (2, 3));
        assert_eq!(report.stats.events_read, 3);
        assert_eq!(report.stats.events_passed, 2);
        assert_eq!(report.stats.events_rejected, 1);
        assert_eq!(report.elapsed, Duration::from_millis(250));
    }

    #[test]
    fn test_acceptance_ratio() {
        let stats = SelectionStats {
            events_read: 4,
            events_passed: 1,
            ..SelectionStats::default()
        };
        assert!((stats.acceptance() - 0.25).abs() < f64::EPSILON);
        assert_eq!(SelectionStats::default().acceptance(), 0.0);
    }
}
