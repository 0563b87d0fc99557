//! Properties of the codec, oracle and samplers.

use phonosynth::codec::{decode, encode, item_name};
use phonosynth::oracle::remaining_values;
use phonosynth::{sample_feature, sample_matrix, sample_segments, Feature, SynthError};
use proptest::prelude::*;
use std::collections::HashSet;

fn distinct(rows: &[Vec<Feature>]) -> usize {
    rows.iter().collect::<HashSet<_>>().len()
}

proptest! {
    #[test]
    fn codec_roundtrip((width, value) in (1usize..=20).prop_flat_map(|w| (Just(w), 0u64..(1u64 << w)))) {
        let v = decode(value, width).unwrap();
        prop_assert_eq!(v.len(), width);
        prop_assert_eq!(encode(&v), value);
        prop_assert_eq!(decode(encode(&v), width).unwrap(), v);
    }

    #[test]
    fn feasible_sizes_give_distinct_rows(
        (arity, size) in (1usize..=6).prop_flat_map(|n| (Just(n), 0usize..=(1usize << n))),
        seed in any::<u64>(),
        probs in proptest::collection::vec(0.0f64..=1.0, 6),
    ) {
        let sample = sample_feature(size, Some(seed), arity, &probs[..arity]).unwrap();
        prop_assert_eq!(sample.rows.len(), size);
        prop_assert_eq!(distinct(&sample.rows), size);
        prop_assert!(sample.rows.iter().all(|r| r.len() == arity));
        for (name, row) in sample.names.iter().zip(&sample.rows) {
            prop_assert_eq!(name, &item_name(row));
        }
    }

    #[test]
    fn oversized_requests_are_configuration_errors(
        arity in 1usize..=6,
        extra in 1usize..=4,
        seed in any::<u64>(),
    ) {
        let size = (1usize << arity) + extra;
        let err = sample_matrix(size, Some(seed), arity).unwrap_err();
        prop_assert!(
            matches!(err, SynthError::SizeExceedsVectorSpace { .. }),
            "unexpected error: {}",
            err
        );
    }

    #[test]
    fn same_seed_same_output(
        seed in any::<u64>(),
        size in 0usize..=16,
        probs in proptest::collection::vec(0.0f64..=1.0, 4),
    ) {
        let a = sample_feature(size, Some(seed), 4, &probs).unwrap();
        let b = sample_feature(size, Some(seed), 4, &probs).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn segment_draws_never_repeat(seed in any::<u64>(), size in 0usize..=6) {
        let names: Vec<String> = (0..6).map(|i| format!("seg{i}")).collect();
        let rows: Vec<Vec<Feature>> = (0..6).map(|i| decode(i, 3).unwrap()).collect();
        let probs = [0.3, 0.25, 0.2, 0.1, 0.1, 0.05];
        let s = sample_segments(size, Some(seed), &probs, &rows, &names).unwrap();
        prop_assert_eq!(s.names.iter().collect::<HashSet<_>>().len(), size);
    }
}

#[test]
fn first_item_then_forced_value() {
    let s = sample_feature(2, Some(123), 2, &[1.0, 1.0]).unwrap();
    assert_eq!(s.rows[0], vec![Feature::Plus, Feature::Plus]);
    assert_eq!(s.rows[1], vec![Feature::Plus, Feature::Minus]);
}

#[test]
fn exhaustive_packing_at_the_boundary() {
    for seed in 0..25 {
        for probs in [[0.5, 0.5, 0.5], [1.0, 0.0, 1.0], [0.9, 0.1, 0.3]] {
            let s = sample_feature(8, Some(seed), 3, &probs).unwrap();
            let encoded: HashSet<u64> = s.rows.iter().map(|r| encode(r)).collect();
            assert_eq!(encoded, (0..8).collect::<HashSet<_>>(), "seed {seed}, probs {probs:?}");
        }
    }
}

#[test]
fn full_matrix_leaves_no_legal_value() {
    let all: Vec<_> = (0..8).map(|i| decode(i, 3).unwrap()).collect();
    assert!(remaining_values(&all).is_empty());
    assert_eq!(remaining_values(&all[..7]).single(), Some(Feature::Plus));
}

#[test]
fn different_seeds_differ() {
    let a = sample_matrix(6, Some(1), 5).unwrap();
    let b = sample_matrix(6, Some(2), 5).unwrap();
    assert_ne!(a.rows, b.rows);
}

#[test]
fn segment_request_larger_than_catalog() {
    let names = vec!["a".to_string(), "b".to_string()];
    let rows = vec![vec![Feature::Plus], vec![Feature::Minus]];
    let err = sample_segments(3, Some(1), &[0.5, 0.5], &rows, &names).unwrap_err();
    assert!(matches!(
        err,
        SynthError::InsufficientCatalog { requested: 3, available: 2 }
    ));
}
