//! CLI interface for Phonosynth
//!
//! Provides command-line interface for:
//! - Reading observed inventories from CSV files
//! - Generating size-matched random inventories (matrix, segment, feature)
//! - Writing one CSV per input and kind

use crate::config::{InputLayout, OutputKind, RunConfig};
use crate::pipeline::{self, RunSummary};
use anyhow::{bail, Context};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "phonosynth")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Generate random phonological inventories matched to observed ones")]
#[command(
    long_about = "Phonosynth - random phonological inventory synthesis\n\n\
    For every input file of observed inventories, Phonosynth generates as many random\n\
    inventories of each size as were observed, with no two items in an inventory sharing\n\
    a feature vector.\n\n\
    Output kinds:\n\
    • matrix:  features chosen one by one with fair coins\n\
    • segment: whole segments drawn from the observed segments by frequency\n\
    • feature: features chosen one by one with observed feature frequencies\n\n\
    Examples:\n\
      phonosynth --all --initial-seed 1 --outdir out data/inventories.csv\n\
      phonosynth --matrix --jobs 0 -v a.csv b.csv"
)]
pub struct Cli {
    /// CSV files of observed inventories, each processed independently
    #[arg(value_name = "INVENTORIES", required = true, num_args = 1..)]
    pub inventories: Vec<PathBuf>,

    /// Generate inventories feature by feature with fair coins
    #[arg(long)]
    pub matrix: bool,

    /// Generate inventories from observed segments
    #[arg(long)]
    pub segment: bool,

    /// Generate inventories feature by feature with observed frequencies
    #[arg(long)]
    pub feature: bool,

    /// Generate all three kinds
    #[arg(long)]
    pub all: bool,

    /// Number of parallel jobs; all available cores if less than 1
    #[arg(short, long, default_value_t = 1, allow_negative_numbers = true)]
    pub jobs: i64,

    /// Seed of the first inventory, increased by one for each following one
    /// (default: unreproducible)
    #[arg(long, value_name = "SEED")]
    pub initial_seed: Option<u64>,

    /// Number of leading columns before the feature columns
    #[arg(long, default_value_t = 2, value_name = "N")]
    pub skipcols: usize,

    /// Index of the column holding the language name
    #[arg(long, default_value_t = 0, value_name = "N")]
    pub language_colindex: usize,

    /// Index of the column holding the segment label
    #[arg(long, default_value_t = 1, value_name = "N")]
    pub seg_colindex: usize,

    /// Directory for temporary memoization files
    #[arg(long, value_name = "DIR", alias = "tmp_directory")]
    pub tmp_directory: Option<PathBuf>,

    /// Output directory
    #[arg(long, default_value = ".", value_name = "DIR")]
    pub outdir: PathBuf,

    /// Enable verbose (debug) logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn kinds(&self) -> Vec<OutputKind> {
        if self.all {
            return OutputKind::ALL.to_vec();
        }
        [
            (self.matrix, OutputKind::Matrix),
            (self.segment, OutputKind::Segment),
            (self.feature, OutputKind::Feature),
        ]
        .into_iter()
        .filter_map(|(on, kind)| on.then_some(kind))
        .collect()
    }

    pub fn to_config(&self) -> RunConfig {
        let defaults = RunConfig::default();
        RunConfig {
            jobs: self.jobs,
            initial_seed: self.initial_seed,
            layout: InputLayout {
                skip_columns: self.skipcols,
                language_column: self.language_colindex,
                segment_column: self.seg_colindex,
            },
            scratch_dir: self.tmp_directory.clone().unwrap_or(defaults.scratch_dir),
            out_dir: self.outdir.clone(),
            kinds: Vec::new(),
        }
        .with_kinds(self.kinds())
    }
}

/// Install the stderr log subscriber. `RUST_LOG` overrides the level picked
/// by `--verbose`.
pub fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = cli.to_config();
    tracing::debug!(?config, "run configuration");

    let summary = pipeline::run(&cli.inventories, &config);
    summary_result(summary, cli.inventories.len())
}

/// Turn a run summary into the process result. Each failure is already
/// logged by the pipeline; the returned error carries the first failing input
/// as context and the overall count.
fn summary_result(summary: RunSummary, total: usize) -> anyhow::Result<()> {
    let incomplete = summary.failed.len() + summary.skipped.len();
    match summary.failed.into_iter().next() {
        Some((input, e)) => Err(e)
            .with_context(|| format!("failed to process {}", input.display()))
            .with_context(|| format!("{incomplete} of {total} inputs did not complete")),
        None if incomplete > 0 => bail!("{incomplete} of {total} inputs did not complete"),
        None => Ok(()),
    }
}
