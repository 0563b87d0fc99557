//! Run configuration.

use crate::io;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Kind of random inventory to generate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OutputKind {
    /// Feature-by-feature with fair coins.
    Matrix,
    /// Whole segments drawn from the observed catalog.
    Segment,
    /// Feature-by-feature with observed feature marginals.
    Feature,
}

impl OutputKind {
    pub const ALL: [OutputKind; 3] = [OutputKind::Matrix, OutputKind::Segment, OutputKind::Feature];

    /// Output file suffix appended to the input stem.
    pub const fn suffix(self) -> &'static str {
        match self {
            OutputKind::Matrix => "_random_matrix.csv",
            OutputKind::Segment => "_random_segment.csv",
            OutputKind::Feature => "_random_feature.csv",
        }
    }
}

/// Where to find the language name, segment label and features in an input
/// row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputLayout {
    /// Leading columns that are not features.
    pub skip_columns: usize,
    pub language_column: usize,
    pub segment_column: usize,
}

impl Default for InputLayout {
    fn default() -> Self {
        Self {
            skip_columns: 2,
            language_column: 0,
            segment_column: 1,
        }
    }
}

/// Everything one run needs besides the input paths.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Kinds to generate, deduplicated, in matrix/segment/feature order.
    pub kinds: Vec<OutputKind>,
    /// Worker count; zero or negative uses all available parallelism.
    pub jobs: i64,
    /// Seed of the first template; `None` gives unreproducible output.
    pub initial_seed: Option<u64>,
    pub layout: InputLayout,
    /// Parent of the per-batch scratch cache directories.
    pub scratch_dir: PathBuf,
    pub out_dir: PathBuf,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            kinds: Vec::new(),
            jobs: 1,
            initial_seed: None,
            layout: InputLayout::default(),
            scratch_dir: std::env::temp_dir(),
            out_dir: PathBuf::from("."),
        }
    }
}

impl RunConfig {
    pub fn with_kinds(mut self, kinds: impl IntoIterator<Item = OutputKind>) -> Self {
        let mut kinds: Vec<OutputKind> = kinds.into_iter().collect();
        kinds.sort();
        kinds.dedup();
        self.kinds = kinds;
        self
    }

    /// `<out_dir>/<input stem><suffix>`.
    pub fn output_path(&self, input: &Path, kind: OutputKind) -> PathBuf {
        self.out_dir
            .join(format!("{}{}", io::stem(input), kind.suffix()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_canonicalized() {
        let c = RunConfig::default().with_kinds([
            OutputKind::Feature,
            OutputKind::Matrix,
            OutputKind::Feature,
        ]);
        assert_eq!(c.kinds, vec![OutputKind::Matrix, OutputKind::Feature]);
    }

    #[test]
    fn output_paths() {
        let c = RunConfig {
            out_dir: PathBuf::from("out"),
            ..RunConfig::default()
        };
        assert_eq!(
            c.output_path(Path::new("data/wals.csv"), OutputKind::Segment),
            PathBuf::from("out/wals_random_segment.csv")
        );
    }

    #[test]
    fn defaults() {
        let c = RunConfig::default();
        assert_eq!(c.jobs, 1);
        assert_eq!(c.initial_seed, None);
        assert_eq!(c.layout, InputLayout::default());
        assert!(c.kinds.is_empty());
    }
}
