//! Feasibility oracle.
//!
//! Answers one question for the sampler: given the rows already accepted and
//! the positions of the current row decided so far, which values may the next
//! undecided position take without forcing the row to duplicate an accepted
//! one?
//!
//! The search partitions rows on the first remaining column and recurses into
//! each partition on the rest. A value stays legal when its partition is empty
//! or when its partition still leaves some suffix unused. Partitions are
//! vectors of borrowed rows plus a slice of column indices, so rows are never
//! copied.

use crate::feature::{Feature, FeatureVector, ValueSet};

/// Legal values for the first column of `matrix`, looking ahead across every
/// remaining column.
///
/// An empty matrix leaves both values open. For a single column the result is
/// the set of values not yet used. A zero-width matrix has no next column and
/// yields the empty set.
///
/// # Examples
///
/// ```
/// use phonosynth::oracle::remaining_values;
/// use phonosynth::Feature::{Minus, Plus};
///
/// // Under Plus both suffixes are taken, under Minus one is free.
/// let m = vec![vec![Plus, Plus], vec![Plus, Minus], vec![Minus, Plus]];
/// let legal = remaining_values(&m);
/// assert!(!legal.contains(Plus));
/// assert!(legal.contains(Minus));
/// ```
pub fn remaining_values(matrix: &[FeatureVector]) -> ValueSet {
    let width = match matrix.first() {
        Some(row) => row.len(),
        None => return ValueSet::BOTH,
    };
    let columns: Vec<usize> = (0..width).collect();
    let rows: Vec<&[Feature]> = matrix.iter().map(|r| r.as_slice()).collect();
    remaining_in(&rows, &columns)
}

/// Legal values for the first undecided position of `partial`.
///
/// Rows of `prior` that agree with every decided position of `partial` are
/// the only ones the current row can still collide with. If none agree, both
/// values are free. Otherwise the answer is [`remaining_values`] over those
/// rows restricted to the undecided positions.
///
/// A fully decided `partial` has no next position and yields the empty set.
pub fn possible_values_remaining(prior: &[FeatureVector], partial: &[Option<Feature>]) -> ValueSet {
    let undecided: Vec<usize> = partial
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.is_none().then_some(i))
        .collect();
    if undecided.is_empty() {
        return ValueSet::EMPTY;
    }

    let matching: Vec<&[Feature]> = prior
        .iter()
        .filter(|row| {
            partial
                .iter()
                .zip(row.iter())
                .all(|(p, v)| p.map_or(true, |p| p == *v))
        })
        .map(|row| row.as_slice())
        .collect();

    if matching.is_empty() {
        return ValueSet::BOTH;
    }
    remaining_in(&matching, &undecided)
}

/// Recursive core over borrowed rows, viewing only `columns`.
fn remaining_in(rows: &[&[Feature]], columns: &[usize]) -> ValueSet {
    let (&head, rest) = match columns.split_first() {
        Some(split) => split,
        None => return ValueSet::EMPTY,
    };

    if rest.is_empty() {
        let mut used = ValueSet::EMPTY;
        for row in rows {
            used.insert(row[head]);
        }
        let mut open = ValueSet::EMPTY;
        for v in Feature::ALL {
            if !used.contains(v) {
                open.insert(v);
            }
        }
        return open;
    }

    let (plus, minus): (Vec<&[Feature]>, Vec<&[Feature]>) =
        rows.iter().copied().partition(|row| row[head] == Feature::Plus);

    let mut legal = ValueSet::EMPTY;
    for (value, partition) in [(Feature::Plus, plus), (Feature::Minus, minus)] {
        if partition.is_empty() || !remaining_in(&partition, rest).is_empty() {
            legal.insert(value);
        }
    }
    legal
}
