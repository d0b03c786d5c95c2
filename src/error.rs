//! Error type shared by the dataset container, the tree builder and the estimators.

/// Errors raised while configuring, fitting or evaluating a decision tree.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TreeError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("length mismatch for {what}: expected {expected}, got {got}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("sample weight at index {index} must be finite and non-negative, got {value}")]
    InvalidWeight { index: usize, value: f64 },

    #[error("target at index {index} is not a dense non-negative class code")]
    InvalidClassLabel { index: usize },

    #[error("expected {expected} features, got {got}")]
    FeatureMismatch { expected: usize, got: usize },

    #[error("node storage exceeded the maximum of {max} nodes")]
    CapacityExceeded { max: usize },

    #[error("the dataset has no samples with positive weight")]
    EmptyDataset,

    #[error("tree wasn't built yet")]
    NotFitted,
}

pub type Result<T> = std::result::Result<T, TreeError>;
