//! Whole-segment sampler.
//!
//! Draws items from a fixed catalog of observed segments without replacement,
//! weighted by a categorical distribution. Catalog entries are already
//! distinct, so distinct draws give distinct rows and no feasibility search is
//! needed.

use crate::error::{Result, SynthError};
use crate::feature::{Feature, FeatureVector};
use crate::strategy::{seeded_rng, Sample, SamplingStrategy};
use rand::distributions::{Distribution, WeightedIndex};
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// Named archetype rows plus the probability of drawing each.
#[derive(Clone, Debug, PartialEq)]
pub struct SegmentCatalog {
    names: Vec<String>,
    rows: Vec<FeatureVector>,
    probabilities: Vec<f64>,
}

impl SegmentCatalog {
    /// Build a catalog, checking that the three sequences line up, that every
    /// row has the same width, that no two rows are equal and that
    /// probabilities lie in [0, 1].
    pub fn new(names: Vec<String>, rows: Vec<FeatureVector>, probabilities: Vec<f64>) -> Result<Self> {
        check_catalog(&probabilities, &rows, &names)?;
        Ok(Self {
            names,
            rows,
            probabilities,
        })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn rows(&self) -> &[FeatureVector] {
        &self.rows
    }

    pub fn probabilities(&self) -> &[f64] {
        &self.probabilities
    }

}

fn drawable(probabilities: &[f64]) -> usize {
    probabilities.iter().filter(|p| **p > 0.0).count()
}

fn check_catalog(probabilities: &[f64], rows: &[FeatureVector], names: &[String]) -> Result<()> {
    if names.len() != rows.len() || names.len() != probabilities.len() {
        return Err(SynthError::catalog_mismatch(format!(
            "{} names, {} rows, {} probabilities",
            names.len(),
            rows.len(),
            probabilities.len()
        )));
    }
    if let Some(first) = rows.first() {
        if let Some(i) = rows.iter().position(|r| r.len() != first.len()) {
            return Err(SynthError::catalog_mismatch(format!(
                "row {} has {} features, expected {}",
                i,
                rows[i].len(),
                first.len()
            )));
        }
    }
    let mut seen: HashMap<&[Feature], usize> = HashMap::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        if let Some(first) = seen.insert(row.as_slice(), i) {
            return Err(SynthError::catalog_mismatch(format!(
                "segments {:?} and {:?} have identical features",
                names[first], names[i]
            )));
        }
    }
    if let Some((index, &value)) = probabilities
        .iter()
        .enumerate()
        .find(|(_, p)| !(0.0..=1.0).contains(*p))
    {
        return Err(SynthError::InvalidProbability { index, value });
    }
    Ok(())
}

fn check_size(size: usize, probabilities: &[f64]) -> Result<()> {
    if size > probabilities.len() {
        return Err(SynthError::InsufficientCatalog {
            requested: size,
            available: probabilities.len(),
        });
    }
    let available = drawable(probabilities);
    if size > available {
        return Err(SynthError::InsufficientCatalog {
            requested: size,
            available,
        });
    }
    Ok(())
}

/// Draw `size` distinct catalog entries, weighted by `probabilities`, and
/// return their names and rows in draw order.
///
/// Each draw removes the chosen entry from further consideration. Fails with
/// [`SynthError::InsufficientCatalog`] when fewer than `size` entries have a
/// non-zero probability.
pub fn sample_segments(
    size: usize,
    seed: Option<u64>,
    probabilities: &[f64],
    rows: &[FeatureVector],
    names: &[String],
) -> Result<Sample> {
    check_catalog(probabilities, rows, names)?;
    check_size(size, probabilities)?;

    let mut sample = Sample {
        names: Vec::with_capacity(size),
        rows: Vec::with_capacity(size),
    };
    if size == 0 {
        return Ok(sample);
    }

    let mut rng = seeded_rng(seed);
    let mut dist = WeightedIndex::new(probabilities)
        .map_err(|e| SynthError::catalog_mismatch(e.to_string()))?;

    for drawn in 1..=size {
        let i = dist.sample(&mut rng);
        sample.names.push(names[i].clone());
        sample.rows.push(rows[i].clone());
        if drawn < size {
            dist.update_weights(&[(i, &0.0)])
                .map_err(|e| SynthError::catalog_mismatch(e.to_string()))?;
        }
    }
    Ok(sample)
}

/// Strategy drawing whole segments from a catalog.
#[derive(Clone, Debug)]
pub struct SegmentSampler {
    catalog: SegmentCatalog,
}

impl SegmentSampler {
    pub fn new(catalog: SegmentCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &SegmentCatalog {
        &self.catalog
    }
}

impl SamplingStrategy for SegmentSampler {
    fn tag(&self) -> &'static str {
        "segment"
    }

    fn validate(&self, max_size: usize) -> Result<()> {
        check_size(max_size, &self.catalog.probabilities)
    }

    fn cache_material(&self) -> Vec<u8> {
        // Catalogs can be large; fold them into a fixed-size digest.
        let mut hasher = Sha256::new();
        for ((name, row), p) in self
            .catalog
            .names
            .iter()
            .zip(&self.catalog.rows)
            .zip(&self.catalog.probabilities)
        {
            hasher.update((name.len() as u64).to_le_bytes());
            hasher.update(name.as_bytes());
            hasher.update(row.iter().map(|v| v.to_i8() as u8).collect::<Vec<u8>>());
            hasher.update(p.to_bits().to_le_bytes());
        }
        hasher.finalize().to_vec()
    }

    fn sample(&self, size: usize, seed: Option<u64>) -> Result<Sample> {
        sample_segments(
            size,
            seed,
            &self.catalog.probabilities,
            &self.catalog.rows,
            &self.catalog.names,
        )
    }
}
