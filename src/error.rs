//! Error types for inventory synthesis.

use std::path::PathBuf;
use thiserror::Error;

/// Crate result alias.
pub type Result<T> = std::result::Result<T, SynthError>;

/// Errors raised while reading, sampling or writing inventories.
///
/// Configuration errors are detected before any generation work starts.
/// `InvariantViolation` means the sampler reached a state a validated
/// configuration can never produce.
#[derive(Debug, Error)]
pub enum SynthError {
    /// Feature vectors need at least one position.
    #[error("feature arity must be at least 1")]
    EmptyArity,

    /// Arity wider than the binary codec can name.
    #[error("feature arity {arity} exceeds the supported maximum of 64")]
    UnsupportedArity { arity: usize },

    /// More items requested than distinct vectors exist.
    #[error("inventory size {size} exceeds the {space} distinct vectors of arity {arity}")]
    SizeExceedsVectorSpace { size: usize, arity: usize, space: u64 },

    /// Segment sampling without replacement ran out of catalog entries.
    #[error("inventory size {requested} exceeds the {available} drawable catalog segments")]
    InsufficientCatalog { requested: usize, available: usize },

    /// A probability outside [0, 1] (or NaN).
    #[error("probability at index {index} is {value}, expected a value in [0, 1]")]
    InvalidProbability { index: usize, value: f64 },

    /// Probability vector length does not match the feature arity.
    #[error("expected {expected} feature probabilities, got {actual}")]
    ProbabilityArity { expected: usize, actual: usize },

    /// Catalog names, rows and probabilities disagree in length or width.
    #[error("segment catalog is inconsistent: {message}")]
    CatalogMismatch { message: String },

    /// A row pushed into a matrix of a different width.
    #[error("row has {actual} features, matrix arity is {expected}")]
    RowWidth { expected: usize, actual: usize },

    /// Integer does not fit in the requested codec width.
    #[error("value {value} does not fit in {width} bits")]
    Range { value: u64, width: usize },

    /// The feasibility oracle found no legal value for a validated request.
    #[error(
        "no legal value for item {item}, column {column} \
         (template {template}, seed {seed}); partial row {partial}; accepted rows:\n{accepted}"
    )]
    InvariantViolation {
        template: String,
        seed: String,
        item: usize,
        column: usize,
        partial: String,
        accepted: String,
    },

    /// Input file content that cannot be interpreted.
    #[error("{path}:{line}: {message}")]
    MalformedInput {
        path: PathBuf,
        line: u64,
        message: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Scratch-area encode/decode failure.
    #[error("scratch cache error: {0}")]
    Cache(String),

    #[error("worker pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl SynthError {
    pub fn catalog_mismatch(message: impl Into<String>) -> Self {
        Self::CatalogMismatch {
            message: message.into(),
        }
    }

    pub fn malformed(path: impl Into<PathBuf>, line: u64, message: impl Into<String>) -> Self {
        Self::MalformedInput {
            path: path.into(),
            line,
            message: message.into(),
        }
    }

    /// True for errors that are reported before generation starts.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            SynthError::EmptyArity
                | SynthError::UnsupportedArity { .. }
                | SynthError::SizeExceedsVectorSpace { .. }
                | SynthError::InsufficientCatalog { .. }
                | SynthError::InvalidProbability { .. }
                | SynthError::ProbabilityArity { .. }
                | SynthError::CatalogMismatch { .. }
        )
    }

    /// Attach the template name to an invariant violation raised by a sampler.
    pub fn in_template(self, name: &str) -> Self {
        match self {
            SynthError::InvariantViolation {
                seed,
                item,
                column,
                partial,
                accepted,
                ..
            } => SynthError::InvariantViolation {
                template: name.to_string(),
                seed,
                item,
                column,
                partial,
                accepted,
            },
            other => other,
        }
    }
}

impl From<bincode::Error> for SynthError {
    fn from(e: bincode::Error) -> Self {
        SynthError::Cache(e.to_string())
    }
}

impl From<tempfile::PersistError> for SynthError {
    fn from(e: tempfile::PersistError) -> Self {
        SynthError::Io(e.error)
    }
}
