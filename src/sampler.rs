//! Constrained feature-by-feature sampler.
//!
//! Builds one inventory row by row. Within a row, each position asks the
//! feasibility oracle which values are still legal given the accepted rows and
//! the positions already decided:
//!
//! - two legal values: biased coin with that column's probability of `Plus`
//! - one legal value: taken as is, no randomness consumed
//! - none: invariant violation, the request was validated as feasible
//!
//! Every position goes through the oracle, the first one included, so a row
//! can never be steered into an exhausted branch. The result has `size`
//! pairwise-distinct rows.

use crate::codec::{self, MAX_WIDTH};
use crate::error::{Result, SynthError};
use crate::feature::{render_partial, Feature, FeatureMatrix};
use crate::oracle::possible_values_remaining;
use crate::strategy::{describe_seed, seeded_rng, Sample, SamplingStrategy};
use rand::Rng;

/// Check that `size` distinct rows of `arity` features exist and that the
/// probabilities are usable, without sampling anything.
pub fn validate_feature_request(size: usize, arity: usize, probabilities: &[f64]) -> Result<()> {
    if arity == 0 {
        return Err(SynthError::EmptyArity);
    }
    if arity > MAX_WIDTH {
        return Err(SynthError::UnsupportedArity { arity });
    }
    if probabilities.len() != arity {
        return Err(SynthError::ProbabilityArity {
            expected: arity,
            actual: probabilities.len(),
        });
    }
    if let Some((index, &value)) = probabilities
        .iter()
        .enumerate()
        .find(|(_, p)| !(0.0..=1.0).contains(*p))
    {
        return Err(SynthError::InvalidProbability { index, value });
    }
    if let Some(space) = codec::vector_space(arity) {
        if size as u128 > space as u128 {
            return Err(SynthError::SizeExceedsVectorSpace { size, arity, space });
        }
    }
    Ok(())
}

/// Sample `size` distinct rows of `arity` features.
///
/// `probabilities[i]` is the chance of `Plus` at position `i` whenever both
/// values are legal there. The same `(size, seed, arity, probabilities)`
/// always yields the same sample; `seed = None` uses system entropy.
///
/// # Examples
///
/// ```
/// use phonosynth::sampler::sample_feature;
///
/// let sample = sample_feature(8, Some(1), 3, &[0.5, 0.5, 0.5]).unwrap();
/// let mut names = sample.names.clone();
/// names.sort();
/// names.dedup();
/// assert_eq!(names.len(), 8);
/// ```
pub fn sample_feature(
    size: usize,
    seed: Option<u64>,
    arity: usize,
    probabilities: &[f64],
) -> Result<Sample> {
    validate_feature_request(size, arity, probabilities)?;

    let mut rng = seeded_rng(seed);
    let mut matrix = FeatureMatrix::with_capacity(arity, size);
    let mut names = Vec::with_capacity(size);
    let mut partial: Vec<Option<Feature>> = vec![None; arity];

    for item in 0..size {
        partial.fill(None);
        for column in 0..arity {
            let legal = possible_values_remaining(matrix.rows(), &partial);
            let value = match (legal.len(), legal.single()) {
                (2, _) => Feature::from_bit(rng.gen_bool(probabilities[column])),
                (1, Some(only)) => only,
                _ => {
                    return Err(SynthError::InvariantViolation {
                        template: String::new(),
                        seed: describe_seed(seed),
                        item,
                        column,
                        partial: render_partial(&partial),
                        accepted: matrix.to_string(),
                    })
                }
            };
            partial[column] = Some(value);
        }

        let row: Vec<Feature> = partial.iter().flatten().copied().collect();
        names.push(codec::item_name(&row));
        matrix.push(row)?;
    }

    tracing::trace!(size, arity, seed = %describe_seed(seed), "sampled feature matrix");
    Ok(Sample {
        names,
        rows: matrix.into_rows(),
    })
}

/// [`sample_feature`] with every position fair (probability 0.5).
pub fn sample_matrix(size: usize, seed: Option<u64>, arity: usize) -> Result<Sample> {
    sample_feature(size, seed, arity, &vec![0.5; arity])
}

/// Feature-by-feature strategy, either uniform ("matrix") or weighted by
/// observed marginals ("feature").
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureSampler {
    probabilities: Vec<f64>,
    uniform: bool,
}

impl FeatureSampler {
    /// Fair coin at every position.
    pub fn uniform(arity: usize) -> Self {
        Self {
            probabilities: vec![0.5; arity],
            uniform: true,
        }
    }

    /// Per-position probability of `Plus`.
    pub fn weighted(probabilities: Vec<f64>) -> Self {
        Self {
            probabilities,
            uniform: false,
        }
    }

    pub fn probabilities(&self) -> &[f64] {
        &self.probabilities
    }

    /// Width of the rows this sampler produces.
    pub fn arity(&self) -> usize {
        self.probabilities.len()
    }
}

impl SamplingStrategy for FeatureSampler {
    fn tag(&self) -> &'static str {
        if self.uniform {
            "matrix"
        } else {
            "feature"
        }
    }

    fn validate(&self, max_size: usize) -> Result<()> {
        validate_feature_request(max_size, self.arity(), &self.probabilities)
    }

    fn cache_material(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(8 + 8 * self.probabilities.len());
        out.extend_from_slice(&(self.arity() as u64).to_le_bytes());
        for p in &self.probabilities {
            out.extend_from_slice(&p.to_bits().to_le_bytes());
        }
        out
    }

    fn sample(&self, size: usize, seed: Option<u64>) -> Result<Sample> {
        sample_feature(size, seed, self.arity(), &self.probabilities)
    }
}
