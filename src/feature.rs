//! Signed Binary Feature Primitives
//!
//! Every item in an inventory is a vector of binary phonological features,
//! each written as a signed value:
//!
//! - `Minus`: -1 (feature absent)
//! - `Plus`:  +1 (feature present)
//!
//! There is no zero. A position that has not been decided yet during sampling
//! is `None` in an `Option<Feature>` slice, never a third feature value.

use crate::error::{Result, SynthError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Single signed binary feature value.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(i8)]
pub enum Feature {
    /// Negative: -1
    Minus = -1,
    /// Positive: +1
    Plus = 1,
}

impl fmt::Debug for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Feature::Minus => write!(f, "-"),
            Feature::Plus => write!(f, "+"),
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_i8())
    }
}

impl Feature {
    /// Both values, `Plus` first.
    pub const ALL: [Feature; 2] = [Feature::Plus, Feature::Minus];

    #[inline]
    pub const fn to_i8(self) -> i8 {
        self as i8
    }

    /// Bit used by the binary codec: `Plus` is 1, `Minus` is 0.
    #[inline]
    pub const fn bit(self) -> u64 {
        match self {
            Feature::Plus => 1,
            Feature::Minus => 0,
        }
    }

    #[inline]
    pub const fn from_bit(bit: bool) -> Self {
        if bit {
            Feature::Plus
        } else {
            Feature::Minus
        }
    }

    /// Parse a CSV cell. Accepts `+`, `-`, `1`, `+1` and `-1`.
    pub fn parse_cell(cell: &str) -> Option<Self> {
        match cell.trim() {
            "+" | "1" | "+1" => Some(Feature::Plus),
            "-" | "-1" => Some(Feature::Minus),
            _ => None,
        }
    }
}

/// One item: an ordered sequence of feature values.
pub type FeatureVector = Vec<Feature>;

/// Subset of {+1, -1}: the values still legal at one position.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ValueSet {
    plus: bool,
    minus: bool,
}

impl ValueSet {
    pub const EMPTY: ValueSet = ValueSet {
        plus: false,
        minus: false,
    };

    pub const BOTH: ValueSet = ValueSet {
        plus: true,
        minus: true,
    };

    pub const fn only(value: Feature) -> Self {
        match value {
            Feature::Plus => ValueSet {
                plus: true,
                minus: false,
            },
            Feature::Minus => ValueSet {
                plus: false,
                minus: true,
            },
        }
    }

    pub fn insert(&mut self, value: Feature) {
        match value {
            Feature::Plus => self.plus = true,
            Feature::Minus => self.minus = true,
        }
    }

    pub const fn contains(&self, value: Feature) -> bool {
        match value {
            Feature::Plus => self.plus,
            Feature::Minus => self.minus,
        }
    }

    pub const fn len(&self) -> usize {
        self.plus as usize + self.minus as usize
    }

    pub const fn is_empty(&self) -> bool {
        !self.plus && !self.minus
    }

    /// The member of a one-element set.
    pub const fn single(&self) -> Option<Feature> {
        match (self.plus, self.minus) {
            (true, false) => Some(Feature::Plus),
            (false, true) => Some(Feature::Minus),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Feature> + '_ {
        Feature::ALL.into_iter().filter(move |v| self.contains(*v))
    }
}

impl fmt::Debug for ValueSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Rows accepted so far in one inventory under construction.
///
/// Grows by `push` only. Rows are never edited or removed, and every row has
/// the matrix arity.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FeatureMatrix {
    arity: usize,
    rows: Vec<FeatureVector>,
}

impl FeatureMatrix {
    pub fn with_capacity(arity: usize, capacity: usize) -> Self {
        Self {
            arity,
            rows: Vec::with_capacity(capacity),
        }
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[FeatureVector] {
        &self.rows
    }

    /// Append a row. A row of the wrong width leaves the matrix unchanged.
    pub fn push(&mut self, row: FeatureVector) -> Result<()> {
        if row.len() != self.arity {
            return Err(SynthError::RowWidth {
                expected: self.arity,
                actual: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn into_rows(self) -> Vec<FeatureVector> {
        self.rows
    }
}

impl fmt::Display for FeatureMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.rows.is_empty() {
            return write!(f, "(empty)");
        }
        for (i, row) in self.rows.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            for v in row {
                write!(f, "{:?}", v)?;
            }
        }
        Ok(())
    }
}

/// Render a partially decided row, `.` marking undecided positions.
pub fn render_partial(partial: &[Option<Feature>]) -> String {
    partial
        .iter()
        .map(|v| match v {
            Some(Feature::Plus) => '+',
            Some(Feature::Minus) => '-',
            None => '.',
        })
        .collect()
}
