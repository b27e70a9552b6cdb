//! Pipeline configuration.

/// Configuration for the event loop.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// Report per-event progress through the injected reporter.
    pub show_progress: bool,
    /// Events between progress updates.
    pub progress_interval: usize,
    /// Events per work unit in the parallel run.
    pub parallel_chunk_size: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            show_progress: false,
            progress_interval: 10_000,
            parallel_chunk_size: 65_536,
        }
    }
}

impl PipelineConfig {
    /// Set progress display.
    #[must_use]
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Set progress update interval (clamped to at least one event).
    #[must_use]
    pub fn with_progress_interval(mut self, interval: usize) -> Self {
        self.progress_interval = interval.max(1);
        self
    }

    /// Set parallel chunk size (clamped to at least one event).
    #[must_use]
    pub fn with_parallel_chunk_size(mut self, size: usize) -> Self {
        self.parallel_chunk_size = size.max(1);
        self
    }
}
