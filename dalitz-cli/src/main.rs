//! dalitz CLI
//!
//! Runs the π⁺ π⁻ γ γ kinematic selection over event files and writes the
//! Dalitz feature matrix.
#![allow(
    clippy::uninlined_format_args,
    clippy::cast_precision_loss,
    clippy::too_many_lines
)]

use clap::{Parser, Subcommand};
use dalitz_core::{EventCandidates, EventSource, Particle};
use dalitz_io::{open_event_source, AnyEventSource, FourVectorBatchWriter};
use dalitz_pipeline::{
    Pipeline, PipelineConfig, ProgressReporter, SilentProgress, StderrProgress, SystemClock,
};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("I/O error: {0}")]
    DalitzIo(#[from] dalitz_io::Error),

    #[error("Core error: {0}")]
    Core(#[from] dalitz_core::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{failed} of {total} input file(s) failed")]
    InputsFailed { failed: usize, total: usize },
}

/// Kinematic feature extraction for π⁺ π⁻ γ γ events.
#[derive(Parser)]
#[command(name = "dalitz")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbose output (info level logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Select events and build the (N, 3) feature matrix
    Process {
        /// Input event file(s), processed in order
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Event tree name inside HDF5 and ROOT inputs
        #[arg(short, long, default_value = "dalitz_root_tree")]
        tree: String,

        /// Show a progress line on stderr
        #[arg(long)]
        progress: bool,

        /// Write the matrix to this file (.csv, .bin, .dat, .h5)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write the run summary as JSON
        #[arg(long)]
        summary_json: Option<PathBuf>,

        /// Process chunks of events on the rayon pool (no progress line)
        #[arg(long, conflicts_with = "progress")]
        parallel: bool,

        /// Events per parallel chunk
        #[arg(long, default_value = "65536")]
        chunk_size: usize,
    },

    /// Show information about an event file
    Info {
        /// Input event file
        input: PathBuf,

        /// Event tree name inside HDF5 and ROOT inputs
        #[arg(short, long, default_value = "dalitz_root_tree")]
        tree: String,
    },

    /// Dump every event's four-vectors as 16 little-endian doubles
    Export {
        /// Input event file(s)
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,

        /// Event tree name inside HDF5 and ROOT inputs
        #[arg(short, long, default_value = "dalitz_root_tree")]
        tree: String,

        /// Batch size in MB
        #[arg(long, default_value = "10")]
        bufsize_mb: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Process {
            inputs,
            tree,
            progress,
            output,
            summary_json,
            parallel,
            chunk_size,
        } => {
            let sources = open_all(&inputs, &tree)?;
            let config = PipelineConfig::default()
                .with_progress(progress)
                .with_parallel_chunk_size(chunk_size);
            let pipeline = Pipeline::new(config);
            let clock = SystemClock::new();

            let start = Instant::now();
            let report = if parallel {
                pipeline.run_many_parallel(&sources, &clock)?
            } else {
                let mut reporter: Box<dyn ProgressReporter> = if progress {
                    Box::new(StderrProgress::new())
                } else {
                    Box::new(SilentProgress)
                };
                pipeline.run_many(&sources, reporter.as_mut(), &clock)?
            };
            let elapsed = start.elapsed();

            let (rows, cols) = report.shape();
            println!(
                "Took {:.3}s to collect data with shape ({}, {})",
                elapsed.as_secs_f64(),
                rows,
                cols
            );
            log::info!(
                "acceptance {:.4} ({} passed, {} rejected, {} non-physical)",
                report.stats.acceptance(),
                report.stats.events_passed,
                report.stats.events_rejected,
                report.stats.non_physical
            );

            if let Some(path) = output {
                dalitz_io::write_features(&path, report.features.view())?;
                log::info!("wrote {} rows to {}", rows, path.display());
            }

            if let Some(path) = summary_json {
                let file = BufWriter::new(File::create(&path)?);
                serde_json::to_writer_pretty(file, &report.summary())?;
                log::info!("wrote run summary to {}", path.display());
            }
        }

        Commands::Info { input, tree } => {
            let source = open_event_source(&input, &tree)?;

            println!("File: {}", input.display());
            if let AnyEventSource::Mapped(file) = &source {
                println!(
                    "Size: {} bytes ({:.2} MB)",
                    file.file_size(),
                    file.file_size() as f64 / 1_000_000.0
                );
            }
            println!("Entries: {}", source.len());
            println!("Columns: {}", source.field_names().join(", "));

            if !source.is_empty() {
                let record = source.record(0)?;
                let candidates = EventCandidates::from_record(&record)
                    .map_err(|err| dalitz_core::Error::FieldAccess { index: 0, source: err })?;
                println!("First event (E, px, py, pz):");
                for particle in Particle::ALL {
                    let v = candidates.get(particle);
                    println!(
                        "  {:<10} ({:.6}, {:.6}, {:.6}, {:.6})",
                        particle.label(),
                        v.e(),
                        v.px(),
                        v.py(),
                        v.pz()
                    );
                }
                let selection = candidates.select();
                println!(
                    "  m(pi0) = {:.6}, s(+-) = {:.6}, passes = {}",
                    selection.m_pi0, selection.s_pos_neg, selection.passes
                );
            }
        }

        Commands::Export {
            inputs,
            output,
            tree,
            bufsize_mb,
        } => {
            if bufsize_mb == 0 {
                return Err(CliError::InvalidArgument(
                    "--bufsize-mb must be greater than 0".to_string(),
                ));
            }

            let sink = BufWriter::new(File::create(&output)?);
            let mut writer = FourVectorBatchWriter::new(sink, bufsize_mb)?;
            log::info!(
                "batch size: {} MB ({} events)",
                bufsize_mb,
                writer.batch_events()
            );

            let start = Instant::now();
            let mut failed = 0usize;
            for path in &inputs {
                match export_one(path, &tree, &mut writer) {
                    Ok(events) => println!("{}: exported {} events", path.display(), events),
                    Err(err) => {
                        failed += 1;
                        eprintln!("{}: failed: {}", path.display(), err);
                    }
                }
            }
            let (_, stats) = writer.finish()?;

            println!(
                "Exported {} events in {} batches ({:.2} MB) in {:.2}s",
                stats.events,
                stats.batches,
                stats.megabytes(),
                start.elapsed().as_secs_f64()
            );
            println!(
                "Files: {} succeeded, {} failed",
                inputs.len() - failed,
                failed
            );
            if failed > 0 {
                return Err(CliError::InputsFailed {
                    failed,
                    total: inputs.len(),
                });
            }
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

fn open_all(inputs: &[PathBuf], tree: &str) -> Result<Vec<AnyEventSource>> {
    inputs
        .iter()
        .map(|path| {
            let source = open_event_source(path, tree)?;
            log::info!("opened {}", source.describe());
            Ok(source)
        })
        .collect()
}

fn export_one<W: std::io::Write>(
    path: &Path,
    tree: &str,
    writer: &mut FourVectorBatchWriter<W>,
) -> Result<usize> {
    let source = open_event_source(path, tree)?;
    Ok(dalitz_io::export_source(&source, writer)?)
}
