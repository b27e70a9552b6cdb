//! dalitz-pipeline: Event loop for kinematic feature extraction.
//!
//! Reads every record of one or more event sources, reconstructs the four
//! candidates, applies the kinematic selection and accumulates accepted
//! events into a feature matrix. Progress display and timing are injected
//! capabilities rather than global state.
//!
#![warn(missing_docs)]

mod config;
mod processing;
pub mod progress;

pub use config::PipelineConfig;
pub use processing::{Pipeline, RunReport, RunSummary, SelectionStats};
pub use progress::{Clock, ProgressReporter, SilentProgress, StderrProgress, SystemClock};
