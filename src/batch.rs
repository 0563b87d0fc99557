//! Inventory batch builder.
//!
//! Turns a size table into generation templates and materializes one
//! inventory per template through a [`SamplingStrategy`], optionally on a
//! worker pool and through a per-batch scratch cache.
//!
//! Templates share nothing mutable: each task owns its seed and its random
//! source. Results come back in template order whatever order tasks finish
//! in, and the scratch cache is cleared only after every task has joined.

use crate::cache::{CacheKey, ScratchCache};
use crate::error::{Result, SynthError};
use crate::feature::FeatureVector;
use crate::strategy::{Sample, SamplingStrategy};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Inventory size → number of inventories of that size. Iterates in
/// ascending size order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeTable(BTreeMap<usize, usize>);

impl SizeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one more inventory of `size`.
    pub fn record(&mut self, size: usize) {
        *self.0.entry(size).or_insert(0) += 1;
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.0.iter().map(|(s, c)| (*s, *c))
    }

    /// Largest size with a non-zero count.
    pub fn max_size(&self) -> Option<usize> {
        self.iter().filter(|(_, c)| *c > 0).map(|(s, _)| s).last()
    }

    /// Total number of inventories requested.
    pub fn total(&self) -> usize {
        self.0.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

impl FromIterator<(usize, usize)> for SizeTable {
    fn from_iter<I: IntoIterator<Item = (usize, usize)>>(iter: I) -> Self {
        SizeTable(iter.into_iter().collect())
    }
}

/// A planned generation job.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub name: String,
    pub size: usize,
    pub seed: Option<u64>,
}

/// One template per requested inventory, named `I1`, `I2`, ... in size-table
/// order.
///
/// With an initial seed the n-th template (0-based) gets
/// `initial_seed + n`; without one every template draws from entropy.
///
/// # Examples
///
/// ```
/// use phonosynth::batch::{templates, SizeTable};
///
/// let table: SizeTable = [(3, 2), (5, 1)].into_iter().collect();
/// let seeds: Vec<_> = templates(&table, Some(10)).iter().map(|t| t.seed).collect();
/// assert_eq!(seeds, vec![Some(10), Some(11), Some(12)]);
/// ```
pub fn templates(table: &SizeTable, initial_seed: Option<u64>) -> Vec<Template> {
    table
        .iter()
        .flat_map(|(size, count)| std::iter::repeat(size).take(count))
        .enumerate()
        .map(|(index, size)| Template {
            name: format!("I{}", index + 1),
            size,
            seed: initial_seed.map(|s| s.wrapping_add(index as u64)),
        })
        .collect()
}

/// A generated inventory: template name plus parallel item names and rows.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    pub name: String,
    pub item_names: Vec<String>,
    pub rows: Vec<FeatureVector>,
}

impl Inventory {
    pub fn from_sample(name: impl Into<String>, sample: Sample) -> Self {
        Self {
            name: name.into(),
            item_names: sample.names,
            rows: sample.rows,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Orchestrates generation of many inventories.
///
/// # Examples
///
/// ```
/// use phonosynth::batch::{templates, InventoryBatchBuilder, SizeTable};
/// use phonosynth::sampler::FeatureSampler;
///
/// let table: SizeTable = [(4, 3)].into_iter().collect();
/// let plan = templates(&table, Some(1));
/// let inventories = InventoryBatchBuilder::new()
///     .with_jobs(2)
///     .build(&plan, &FeatureSampler::uniform(3))
///     .unwrap();
/// assert_eq!(inventories.len(), 3);
/// assert_eq!(inventories[0].name, "I1");
/// ```
#[derive(Clone, Debug, Default)]
pub struct InventoryBatchBuilder {
    jobs: i64,
    scratch_dir: Option<PathBuf>,
}

impl InventoryBatchBuilder {
    /// Sequential, unmemoized builder.
    pub fn new() -> Self {
        Self {
            jobs: 1,
            scratch_dir: None,
        }
    }

    /// Worker count. Zero or negative means all available parallelism.
    pub fn with_jobs(mut self, jobs: i64) -> Self {
        self.jobs = jobs;
        self
    }

    /// Memoize seeded generation calls in a scratch area under `dir`.
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = Some(dir.into());
        self
    }

    fn threads(&self) -> usize {
        if self.jobs <= 0 {
            rayon::current_num_threads()
        } else {
            self.jobs as usize
        }
    }

    /// Validate the whole plan, then materialize every template.
    ///
    /// Configuration errors surface before any sampling. The first failing
    /// task aborts the batch; the scratch area is cleared either way.
    pub fn build(&self, templates: &[Template], strategy: &dyn SamplingStrategy) -> Result<Vec<Inventory>> {
        let max_size = templates.iter().map(|t| t.size).max().unwrap_or(0);
        strategy.validate(max_size)?;

        let cache = match &self.scratch_dir {
            Some(dir) => Some(ScratchCache::create_in(dir)?),
            None => None,
        };

        debug!(
            strategy = strategy.tag(),
            templates = templates.len(),
            threads = self.threads(),
            memoized = cache.is_some(),
            "building inventory batch"
        );

        let result = self.run(templates, strategy, cache.as_ref());

        if let Some(cache) = cache {
            let stats = cache.stats();
            debug!(hits = stats.hits, misses = stats.misses, "scratch cache usage");
            if let Err(e) = cache.clear() {
                warn!(error = %e, "failed to clear scratch cache");
            }
        }
        result
    }

    fn run(
        &self,
        templates: &[Template],
        strategy: &dyn SamplingStrategy,
        cache: Option<&ScratchCache>,
    ) -> Result<Vec<Inventory>> {
        let threads = self.threads();
        if threads <= 1 {
            return templates
                .iter()
                .map(|t| materialize(t, strategy, cache))
                .collect();
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()?;
        pool.install(|| {
            templates
                .par_iter()
                .map(|t| materialize(t, strategy, cache))
                .collect()
        })
    }
}

/// Generate one template's inventory, through the cache when it is seeded.
fn materialize(
    template: &Template,
    strategy: &dyn SamplingStrategy,
    cache: Option<&ScratchCache>,
) -> Result<Inventory> {
    let sample = match (cache, template.seed) {
        (Some(cache), Some(seed)) => {
            let key = CacheKey::new(
                strategy.tag(),
                &strategy.cache_material(),
                template.size,
                seed,
            );
            cache.get_or_insert_with(&key, || strategy.sample(template.size, Some(seed)))
        }
        _ => strategy.sample(template.size, template.seed),
    }
    .map_err(|e: SynthError| e.in_template(&template.name))?;

    debug!(
        template = %template.name,
        size = template.size,
        seed = ?template.seed,
        "materialized inventory"
    );
    Ok(Inventory::from_sample(template.name.clone(), sample))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::FeatureSampler;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn size_table_bookkeeping() {
        let mut t = SizeTable::new();
        t.record(5);
        t.record(3);
        t.record(5);
        assert_eq!(t.total(), 3);
        assert_eq!(t.max_size(), Some(5));
        assert_eq!(t.iter().collect::<Vec<_>>(), vec![(3, 1), (5, 2)]);

        let with_zero: SizeTable = [(5, 2), (9, 0)].into_iter().collect();
        assert_eq!(with_zero.max_size(), Some(5));
        assert!(SizeTable::new().is_empty());
    }

    #[test]
    fn templates_are_named_and_seeded_in_order() {
        let table: SizeTable = [(5, 1), (3, 2)].into_iter().collect();
        let plan = templates(&table, Some(10));
        assert_eq!(
            plan,
            vec![
                Template { name: "I1".into(), size: 3, seed: Some(10) },
                Template { name: "I2".into(), size: 3, seed: Some(11) },
                Template { name: "I3".into(), size: 5, seed: Some(12) },
            ]
        );

        let unseeded = templates(&table, None);
        assert_eq!(unseeded.len(), 3);
        assert!(unseeded.iter().all(|t| t.seed.is_none()));
    }

    /// Counts calls so memoization is observable.
    struct Counting {
        inner: FeatureSampler,
        calls: AtomicUsize,
    }

    impl SamplingStrategy for Counting {
        fn tag(&self) -> &'static str {
            "counting"
        }
        fn validate(&self, max_size: usize) -> Result<()> {
            self.inner.validate(max_size)
        }
        fn cache_material(&self) -> Vec<u8> {
            self.inner.cache_material()
        }
        fn sample(&self, size: usize, seed: Option<u64>) -> Result<Sample> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.sample(size, seed)
        }
    }

    #[test]
    fn memoized_duplicate_templates_sample_once() {
        let scratch = tempfile::tempdir().unwrap();
        let strategy = Counting {
            inner: FeatureSampler::uniform(3),
            calls: AtomicUsize::new(0),
        };
        let t = Template { name: "I1".into(), size: 4, seed: Some(3) };
        let plan = vec![t.clone(), Template { name: "I2".into(), ..t }];

        let out = InventoryBatchBuilder::new()
            .with_scratch_dir(scratch.path())
            .build(&plan, &strategy)
            .unwrap();

        assert_eq!(strategy.calls.load(Ordering::SeqCst), 1);
        assert_eq!(out[0].rows, out[1].rows);
        assert_eq!(out[1].name, "I2");
        // The per-batch directory is gone once the batch returns.
        assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
    }

    #[test]
    fn unseeded_templates_bypass_the_cache() {
        let scratch = tempfile::tempdir().unwrap();
        let strategy = Counting {
            inner: FeatureSampler::uniform(3),
            calls: AtomicUsize::new(0),
        };
        let t = Template { name: "I1".into(), size: 4, seed: None };
        let plan = vec![t.clone(), t];

        InventoryBatchBuilder::new()
            .with_scratch_dir(scratch.path())
            .build(&plan, &strategy)
            .unwrap();
        assert_eq!(strategy.calls.load(Ordering::SeqCst), 2);
    }

    /// Fails every draw of one size the way a broken sampler would.
    struct FailsAtSize(usize);

    impl SamplingStrategy for FailsAtSize {
        fn tag(&self) -> &'static str {
            "fails-at-size"
        }
        fn validate(&self, _max_size: usize) -> Result<()> {
            Ok(())
        }
        fn cache_material(&self) -> Vec<u8> {
            Vec::new()
        }
        fn sample(&self, size: usize, seed: Option<u64>) -> Result<Sample> {
            if size == self.0 {
                return Err(SynthError::InvariantViolation {
                    template: String::new(),
                    seed: format!("{seed:?}"),
                    item: 0,
                    column: 0,
                    partial: String::new(),
                    accepted: String::new(),
                });
            }
            FeatureSampler::uniform(3).sample(size, seed)
        }
    }

    #[test]
    fn failed_batch_still_clears_scratch_area() {
        let scratch = tempfile::tempdir().unwrap();
        let table: SizeTable = [(2, 3), (4, 1), (6, 2)].into_iter().collect();
        let plan = templates(&table, Some(5));

        let err = InventoryBatchBuilder::new()
            .with_jobs(2)
            .with_scratch_dir(scratch.path())
            .build(&plan, &FailsAtSize(4))
            .unwrap_err();

        match err {
            SynthError::InvariantViolation { template, .. } => assert_eq!(template, "I4"),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
    }

    #[test]
    fn infeasible_plan_fails_before_sampling() {
        let strategy = Counting {
            inner: FeatureSampler::uniform(2),
            calls: AtomicUsize::new(0),
        };
        let plan = vec![
            Template { name: "I1".into(), size: 2, seed: Some(1) },
            Template { name: "I2".into(), size: 5, seed: Some(2) },
        ];
        let err = InventoryBatchBuilder::new()
            .with_jobs(4)
            .build(&plan, &strategy)
            .unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(strategy.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn parallel_matches_sequential() {
        let table: SizeTable = [(3, 4), (6, 4), (8, 2)].into_iter().collect();
        let plan = templates(&table, Some(100));
        let strategy = FeatureSampler::weighted(vec![0.7, 0.4, 0.5]);

        let sequential = InventoryBatchBuilder::new().build(&plan, &strategy).unwrap();
        let parallel = InventoryBatchBuilder::new()
            .with_jobs(0)
            .build(&plan, &strategy)
            .unwrap();
        assert_eq!(sequential, parallel);
        let names: Vec<_> = parallel.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, (1..=10).map(|i| format!("I{i}")).collect::<Vec<_>>());
    }
}
