//! Progress and timing capabilities injected into the event loop.

use std::io::Write;
use std::time::{Duration, Instant};

/// Receives progress updates from the event loop.
pub trait ProgressReporter {
    /// Called once before the first event with the total event count.
    fn start(&mut self, total: usize);

    /// Called with the number of events processed so far.
    fn advance(&mut self, done: usize);

    /// Called once after the last event.
    fn finish(&mut self);
}

/// Reporter that ignores every update.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn start(&mut self, _total: usize) {}
    fn advance(&mut self, _done: usize) {}
    fn finish(&mut self) {}
}

/// Single-line counter on stderr.
#[derive(Debug, Default)]
pub struct StderrProgress {
    total: usize,
    done: usize,
}

impl StderrProgress {
    /// Creates a reporter with no events counted.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn draw(&self) {
        let mut err = std::io::stderr().lock();
        let pct = if self.total == 0 {
            100.0
        } else {
            #[allow(clippy::cast_precision_loss)]
            let pct = self.done as f64 * 100.0 / self.total as f64;
            pct
        };
        // Progress output is best effort.
        let _ = write!(err, "\r{:>6.1}% | {}/{} events", pct, self.done, self.total);
        let _ = err.flush();
    }
}

impl ProgressReporter for StderrProgress {
    fn start(&mut self, total: usize) {
        self.total = total;
        self.done = 0;
        self.draw();
    }

    fn advance(&mut self, done: usize) {
        self.done = done;
        self.draw();
    }

    fn finish(&mut self) {
        self.done = self.total;
        self.draw();
        let _ = writeln!(std::io::stderr());
    }
}

/// Monotonic time source.
pub trait Clock {
    /// Time elapsed since an arbitrary fixed origin.
    fn now(&self) -> Duration;
}

/// Wall clock backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Creates a clock whose origin is now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_monotonic() {
        let clock = SystemClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }

    #[test]
    fn test_stderr_progress_tracks_counts() {
        let mut progress = StderrProgress::new();
        progress.start(10);
        progress.advance(4);
        assert_eq!(progress.done, 4);
        progress.finish();
        assert_eq!(progress.done, 10);
    }
}
