//! Statistics extracted from observed inventories.
//!
//! These tables are all the generators need from the input: how many
//! inventories of each size to produce, which segments exist and how common
//! they are, and how often each feature is `Plus`.

use crate::batch::SizeTable;
use crate::error::Result;
use crate::feature::{Feature, FeatureVector};
use crate::io::ObservedData;
use crate::segment::SegmentCatalog;
use std::collections::HashMap;
use tracing::debug;

/// Number of observed inventories of each size.
pub fn size_table(data: &ObservedData) -> SizeTable {
    let mut table = SizeTable::new();
    for inventory in &data.inventories {
        table.record(inventory.size());
    }
    table
}

/// Distinct segment labels with their feature vectors and occurrence counts,
/// in first-appearance order. A label's vector is the one it first appears
/// with.
pub fn segment_counts(data: &ObservedData) -> Vec<(String, FeatureVector, usize)> {
    let mut out: Vec<(String, FeatureVector, usize)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for segment in data.inventories.iter().flat_map(|i| &i.segments) {
        match index.get(segment.label.as_str()) {
            Some(&i) => out[i].2 += 1,
            None => {
                index.insert(&segment.label, out.len());
                out.push((segment.label.clone(), segment.features.clone(), 1));
            }
        }
    }
    out
}

/// Catalog for segment sampling, each segment weighted by its share of all
/// segment occurrences.
///
/// Labels that share a feature vector cannot be told apart by the generated
/// rows, so they collapse into one entry under the first label, with their
/// counts summed.
pub fn segment_catalog(data: &ObservedData) -> Result<SegmentCatalog> {
    let counts = segment_counts(data);
    let total: usize = counts.iter().map(|(_, _, c)| c).sum();

    let mut names: Vec<String> = Vec::with_capacity(counts.len());
    let mut rows: Vec<FeatureVector> = Vec::with_capacity(counts.len());
    let mut merged: Vec<usize> = Vec::with_capacity(counts.len());
    let mut by_row: HashMap<FeatureVector, usize> = HashMap::new();
    for (name, row, count) in counts {
        match by_row.get(&row) {
            Some(&i) => {
                debug!(label = %name, kept = %names[i], "merging segment with identical features");
                merged[i] += count;
            }
            None => {
                by_row.insert(row.clone(), names.len());
                names.push(name);
                rows.push(row);
                merged.push(count);
            }
        }
    }

    let probabilities = merged
        .into_iter()
        .map(|count| count as f64 / total as f64)
        .collect();
    SegmentCatalog::new(names, rows, probabilities)
}

/// Fraction of segment occurrences with `Plus` at each feature position.
/// Positions with no data get 0.5.
pub fn feature_probabilities(data: &ObservedData) -> Vec<f64> {
    let arity = data.arity();
    let mut plus = vec![0usize; arity];
    let mut seen = 0usize;
    for segment in data.inventories.iter().flat_map(|i| &i.segments) {
        seen += 1;
        for (count, value) in plus.iter_mut().zip(&segment.features) {
            if *value == Feature::Plus {
                *count += 1;
            }
        }
    }
    if seen == 0 {
        return vec![0.5; arity];
    }
    plus.into_iter().map(|c| c as f64 / seen as f64).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::Feature::{Minus, Plus};
    use crate::io::{ObservedInventory, ObservedSegment};
    use crate::segment::SegmentSampler;
    use crate::strategy::SamplingStrategy;

    fn seg(label: &str, features: Vec<Feature>) -> ObservedSegment {
        ObservedSegment {
            label: label.into(),
            features,
        }
    }

    fn data() -> ObservedData {
        ObservedData {
            feature_names: vec!["voice".into(), "nasal".into()],
            inventories: vec![
                ObservedInventory {
                    name: "a".into(),
                    segments: vec![seg("p", vec![Minus, Minus]), seg("m", vec![Plus, Plus])],
                },
                ObservedInventory {
                    name: "b".into(),
                    segments: vec![
                        seg("p", vec![Minus, Minus]),
                        seg("b", vec![Plus, Minus]),
                        seg("m", vec![Plus, Plus]),
                    ],
                },
                ObservedInventory {
                    name: "c".into(),
                    segments: vec![seg("p", vec![Minus, Minus]), seg("b", vec![Plus, Minus])],
                },
            ],
        }
    }

    #[test]
    fn sizes() {
        let t = size_table(&data());
        assert_eq!(t.iter().collect::<Vec<_>>(), vec![(2, 2), (3, 1)]);
    }

    #[test]
    fn segments_in_first_appearance_order() {
        let counts = segment_counts(&data());
        let labels: Vec<_> = counts.iter().map(|(l, _, c)| (l.as_str(), *c)).collect();
        assert_eq!(labels, vec![("p", 3), ("m", 2), ("b", 2)]);

        let catalog = segment_catalog(&data()).unwrap();
        assert_eq!(catalog.names(), &["p", "m", "b"]);
        assert_eq!(catalog.rows()[1], vec![Plus, Plus]);
        let total: f64 = catalog.probabilities().iter().sum();
        assert!((total - 1.0).abs() < 1e-12);
        assert!((catalog.probabilities()[0] - 3.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn labels_sharing_a_vector_become_one_entry() {
        let data = ObservedData {
            feature_names: vec!["voice".into(), "nasal".into()],
            inventories: vec![
                ObservedInventory {
                    name: "x".into(),
                    segments: vec![
                        seg("p", vec![Plus, Minus]),
                        seg("ph", vec![Plus, Minus]),
                        seg("b", vec![Minus, Plus]),
                    ],
                },
                ObservedInventory {
                    name: "y".into(),
                    segments: vec![seg("p", vec![Plus, Minus]), seg("ph", vec![Plus, Minus])],
                },
            ],
        };

        let catalog = segment_catalog(&data).unwrap();
        assert_eq!(catalog.names(), &["p", "b"]);
        assert!((catalog.probabilities()[0] - 4.0 / 5.0).abs() < 1e-12);
        assert!((catalog.probabilities()[1] - 1.0 / 5.0).abs() < 1e-12);

        let sampler = SegmentSampler::new(catalog);
        for seed in 0..50 {
            let s = sampler.sample(2, Some(seed)).unwrap();
            assert_ne!(s.rows[0], s.rows[1], "seed {seed}");
        }
        // Only two distinguishable segments were observed.
        assert!(sampler.validate(3).is_err());
    }

    #[test]
    fn feature_marginals() {
        let p = feature_probabilities(&data());
        assert!((p[0] - 4.0 / 7.0).abs() < 1e-12);
        assert!((p[1] - 2.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn empty_data_defaults_to_fair() {
        let empty = ObservedData {
            feature_names: vec!["f".into(), "g".into()],
            inventories: vec![],
        };
        assert_eq!(feature_probabilities(&empty), vec![0.5, 0.5]);
        assert!(size_table(&empty).is_empty());
        assert!(segment_catalog(&empty).unwrap().is_empty());
    }
}
