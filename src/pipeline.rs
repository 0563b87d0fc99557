//! Per-input processing.
//!
//! For each input file: read observed inventories, derive statistics, build
//! and validate every requested strategy, then generate and write one output
//! per kind. All configuration checks for an input happen before any of its
//! inventories are sampled.

use crate::batch::{templates, InventoryBatchBuilder};
use crate::config::{OutputKind, RunConfig};
use crate::error::{Result, SynthError};
use crate::io::{self, ObservedData};
use crate::sampler::FeatureSampler;
use crate::segment::SegmentSampler;
use crate::stats;
use crate::strategy::SamplingStrategy;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Outputs written for one input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InputReport {
    pub input: PathBuf,
    pub outputs: Vec<PathBuf>,
    pub inventories: usize,
}

/// Outcome of a multi-input run.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub completed: Vec<InputReport>,
    pub failed: Vec<(PathBuf, SynthError)>,
    /// Inputs not attempted because an earlier one hit an invariant violation.
    pub skipped: Vec<PathBuf>,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.skipped.is_empty()
    }
}

fn strategy_for(kind: OutputKind, observed: &ObservedData) -> Result<Box<dyn SamplingStrategy>> {
    Ok(match kind {
        OutputKind::Matrix => Box::new(FeatureSampler::uniform(observed.arity())),
        OutputKind::Segment => Box::new(SegmentSampler::new(stats::segment_catalog(observed)?)),
        OutputKind::Feature => Box::new(FeatureSampler::weighted(stats::feature_probabilities(
            observed,
        ))),
    })
}

/// Generate every requested kind for one input file.
pub fn process_input(input: &Path, config: &RunConfig) -> Result<InputReport> {
    let observed = io::read_inventories(input, &config.layout)?;
    let sizes = stats::size_table(&observed);
    let plan = templates(&sizes, config.initial_seed);
    let max_size = sizes.max_size().unwrap_or(0);

    let mut strategies = Vec::with_capacity(config.kinds.len());
    for &kind in &config.kinds {
        let strategy = strategy_for(kind, &observed)?;
        strategy.validate(max_size)?;
        strategies.push((kind, strategy));
    }

    info!(
        input = %input.display(),
        observed = observed.inventories.len(),
        features = observed.arity(),
        templates = plan.len(),
        "generating random inventories"
    );

    let builder = InventoryBatchBuilder::new()
        .with_jobs(config.jobs)
        .with_scratch_dir(&config.scratch_dir);

    let mut outputs = Vec::with_capacity(strategies.len());
    for (kind, strategy) in strategies {
        let inventories = builder.build(&plan, strategy.as_ref())?;
        let out = config.output_path(input, kind);
        io::write_inventories(&out, &inventories, &observed.feature_names)?;
        info!(output = %out.display(), kind = ?kind, "wrote random inventories");
        outputs.push(out);
    }

    Ok(InputReport {
        input: input.to_path_buf(),
        outputs,
        inventories: plan.len(),
    })
}

/// Process inputs one after another.
///
/// A failing input is logged and recorded, and the remaining inputs still
/// run. An invariant violation is a defect rather than bad input, so it stops
/// the whole run.
pub fn run(inputs: &[PathBuf], config: &RunConfig) -> RunSummary {
    let mut summary = RunSummary::default();
    if config.kinds.is_empty() {
        warn!("no output kind selected; nothing to generate");
    }

    for (i, input) in inputs.iter().enumerate() {
        match process_input(input, config) {
            Ok(report) => summary.completed.push(report),
            Err(e) => {
                error!(input = %input.display(), error = %e, "input failed");
                let fatal = matches!(e, SynthError::InvariantViolation { .. });
                summary.failed.push((input.clone(), e));
                if fatal {
                    summary.skipped.extend(inputs[i + 1..].iter().cloned());
                    break;
                }
            }
        }
    }
    summary
}
