use super::criterion::Criterion;
use crate::error::{Result, TreeError};

/// How many features are tried at each split.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub enum MaxFeatures {
    /// Every feature, in column order.
    #[default]
    All,
    /// A fixed number of randomly chosen features.
    Count(usize),
    /// A fraction of the features, at least one.
    Fraction(f64),
}

impl MaxFeatures {
    /// Resolves the setting against the number of columns of the training data.
    ///
    /// # Errors
    ///
    /// A count of zero or above `n_features`, or a fraction outside `(0, 1]`.
    pub fn resolve(&self, n_features: usize) -> Result<usize> {
        match *self {
            MaxFeatures::All => Ok(n_features),
            MaxFeatures::Count(count) => {
                if count == 0 || count > n_features {
                    return Err(TreeError::InvalidParameter(format!(
                        "max_features must be between 1 and {}, got {}.",
                        n_features, count
                    )));
                }
                Ok(count)
            }
            MaxFeatures::Fraction(fraction) => {
                if !(fraction > 0.0 && fraction <= 1.0) {
                    return Err(TreeError::InvalidParameter(format!(
                        "max_features should be positive and at most 1.0, got {}.",
                        fraction
                    )));
                }
                Ok(((fraction * n_features as f64) as usize).max(1))
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct TreeParams {
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_depth: Option<usize>,
    pub max_features: MaxFeatures,
    pub seed: Option<u64>,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeParams {
    pub fn new() -> Self {
        Self {
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_depth: None,
            max_features: MaxFeatures::All,
            seed: None,
        }
    }

    pub fn set_min_samples_split(&mut self, min_samples_split: usize) -> Result<()> {
        if min_samples_split < 2 {
            return Err(TreeError::InvalidParameter(
                "The minimum number of samples to split must be greater than 1.".into(),
            ));
        }
        self.min_samples_split = min_samples_split;
        Ok(())
    }

    pub fn set_min_samples_leaf(&mut self, min_samples_leaf: usize) -> Result<()> {
        if min_samples_leaf < 1 {
            return Err(TreeError::InvalidParameter(
                "The minimum number of samples in a leaf must be greater than 0.".into(),
            ));
        }
        self.min_samples_leaf = min_samples_leaf;
        Ok(())
    }

    /// `Some(0)` is allowed and always yields a single leaf.
    pub fn set_max_depth(&mut self, max_depth: Option<usize>) {
        self.max_depth = max_depth;
    }

    pub fn set_max_features(&mut self, max_features: MaxFeatures) -> Result<()> {
        match max_features {
            MaxFeatures::Count(0) => Err(TreeError::InvalidParameter(
                "The number of features must be greater than 0.".into(),
            )),
            MaxFeatures::Fraction(fraction) if !(fraction > 0.0 && fraction <= 1.0) => {
                Err(TreeError::InvalidParameter(
                    "The fraction of features must be in (0, 1].".into(),
                ))
            }
            _ => {
                self.max_features = max_features;
                Ok(())
            }
        }
    }

    pub fn set_seed(&mut self, seed: Option<u64>) {
        self.seed = seed;
    }

    pub fn min_samples_split(&self) -> usize {
        self.min_samples_split
    }

    pub fn min_samples_leaf(&self) -> usize {
        self.min_samples_leaf
    }

    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    pub fn max_features(&self) -> MaxFeatures {
        self.max_features
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }
}

#[derive(Clone, Debug)]
pub struct TreeClassifierParams {
    pub base_params: TreeParams,
    pub criterion: Criterion,
}

impl Default for TreeClassifierParams {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeClassifierParams {
    pub fn new() -> Self {
        Self {
            base_params: TreeParams::new(),
            criterion: Criterion::Gini,
        }
    }

    pub fn set_criterion(&mut self, criterion: Criterion) -> Result<()> {
        if !criterion.is_classification() {
            return Err(TreeError::InvalidParameter(
                "The criterion must be either 'gini' or 'entropy'.".into(),
            ));
        }
        self.criterion = criterion;
        Ok(())
    }

    pub fn criterion(&self) -> Criterion {
        self.criterion
    }
}
