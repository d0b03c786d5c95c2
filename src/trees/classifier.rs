//! Decision Tree Classifier
use super::builder::{build_tree, BuildConfig};
use super::criterion::Criterion;
use super::params::{MaxFeatures, TreeClassifierParams};
use super::tree::Tree;
use crate::{
    data::dataset::{Dataset, WholeNumber},
    error::{Result, TreeError},
    metrics::confusion::ClassificationMetrics,
};
use nalgebra::{DMatrix, DVector};
use rand::{rngs::StdRng, SeedableRng};
use std::marker::PhantomData;
use tracing::info;

/// Decision tree over dense class codes `0..n_classes`.
///
/// Codes must be smaller than the number of training rows. Mapping arbitrary labels to
/// codes (and back) is left to the caller.
#[derive(Clone, Debug)]
pub struct DecisionTreeClassifier<YT: WholeNumber> {
    tree: Option<Tree>,
    n_classes: usize,
    tree_params: TreeClassifierParams,

    _marker: PhantomData<YT>,
}

impl<YT: WholeNumber> Default for DecisionTreeClassifier<YT> {
    fn default() -> Self {
        Self::new()
    }
}

impl<YT: WholeNumber> ClassificationMetrics<YT> for DecisionTreeClassifier<YT> {}

impl<YT: WholeNumber> DecisionTreeClassifier<YT> {
    pub fn new() -> Self {
        Self {
            tree: None,
            n_classes: 0,
            tree_params: TreeClassifierParams::new(),
            _marker: PhantomData,
        }
    }

    /// Creates a classifier with custom parameters.
    ///
    /// # Errors
    ///
    /// Fails for a regression criterion, a minimum split size below 2 or a minimum leaf size
    /// below 1.
    pub fn with_params(
        criterion: Option<Criterion>,
        min_samples_split: Option<usize>,
        min_samples_leaf: Option<usize>,
        max_depth: Option<usize>,
    ) -> Result<Self> {
        let mut tree = Self::new();
        tree.set_criterion(criterion.unwrap_or(Criterion::Gini))?;
        tree.set_min_samples_split(min_samples_split.unwrap_or(2))?;
        tree.set_min_samples_leaf(min_samples_leaf.unwrap_or(1))?;
        tree.set_max_depth(max_depth);
        Ok(tree)
    }

    pub fn set_criterion(&mut self, criterion: Criterion) -> Result<()> {
        self.tree_params.set_criterion(criterion)
    }

    pub fn set_min_samples_split(&mut self, min_samples_split: usize) -> Result<()> {
        self.tree_params
            .base_params
            .set_min_samples_split(min_samples_split)
    }

    pub fn set_min_samples_leaf(&mut self, min_samples_leaf: usize) -> Result<()> {
        self.tree_params
            .base_params
            .set_min_samples_leaf(min_samples_leaf)
    }

    pub fn set_max_depth(&mut self, max_depth: Option<usize>) {
        self.tree_params.base_params.set_max_depth(max_depth)
    }

    pub fn set_max_features(&mut self, max_features: MaxFeatures) -> Result<()> {
        self.tree_params.base_params.set_max_features(max_features)
    }

    pub fn set_seed(&mut self, seed: Option<u64>) {
        self.tree_params.base_params.set_seed(seed)
    }

    pub fn params(&self) -> &TreeClassifierParams {
        &self.tree_params
    }

    pub fn tree(&self) -> Option<&Tree> {
        self.tree.as_ref()
    }

    /// Number of classes seen at fit time: the largest class code plus one.
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn encode_targets(y: &DVector<YT>) -> Result<(Vec<f64>, usize)> {
        let mut codes = Vec::with_capacity(y.len());
        let mut n_classes = 0;
        for (index, label) in y.iter().enumerate() {
            let code = label
                .to_usize()
                .filter(|&code| code < y.len())
                .ok_or(TreeError::InvalidClassLabel { index })?;
            n_classes = n_classes.max(code + 1);
            codes.push(code as f64);
        }
        Ok((codes, n_classes))
    }

    /// Builds the decision tree from a dataset whose targets are class codes.
    ///
    /// # Errors
    ///
    /// Fails when a target isn't a non-negative integer below the number of rows, when the
    /// dataset is empty or inconsistent, or when no sample has a positive weight.
    pub fn fit(&mut self, dataset: &Dataset<YT>) -> Result<()> {
        dataset.check_shape()?;
        if !dataset.is_not_empty() {
            return Err(TreeError::EmptyDataset);
        }
        let (codes, n_classes) = Self::encode_targets(&dataset.y)?;
        let base = &self.tree_params.base_params;
        let config = BuildConfig {
            criterion: self.tree_params.criterion(),
            n_classes,
            max_features: base.max_features().resolve(dataset.ncols())?,
            max_depth: base.max_depth(),
            min_samples_split: base.min_samples_split(),
            min_samples_leaf: base.min_samples_leaf(),
        };
        let mut rng = match base.seed() {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let tree = build_tree(&dataset.x, &codes, &dataset.weights(), &config, &mut rng)?;
        info!(
            criterion = %config.criterion,
            n_classes,
            nodes = tree.node_count(),
            leaves = tree.n_leaves(),
            depth = tree.depth(),
            "fitted decision tree classifier"
        );
        self.tree = Some(tree);
        self.n_classes = n_classes;
        Ok(())
    }

    /// Predicts a class code for every row.
    ///
    /// # Errors
    ///
    /// Fails if the tree wasn't built yet or the number of columns differs from the training
    /// data.
    pub fn predict(&self, features: &DMatrix<f64>) -> Result<DVector<YT>> {
        let tree = self.tree.as_ref().ok_or(TreeError::NotFitted)?;
        let values = tree.predict(features)?;
        values
            .iter()
            .enumerate()
            .map(|(index, &code)| {
                YT::from_f64(code).ok_or(TreeError::InvalidClassLabel { index })
            })
            .collect::<Result<Vec<_>>>()
            .map(DVector::from_vec)
    }

    /// Returns the id of the leaf each row ends up in.
    pub fn apply(&self, features: &DMatrix<f64>) -> Result<Vec<usize>> {
        self.tree
            .as_ref()
            .ok_or(TreeError::NotFitted)?
            .apply(features)
    }

    /// Accuracy of the predictions on `dataset`.
    pub fn score(&self, dataset: &Dataset<YT>) -> Result<f64> {
        let predictions = self.predict(&dataset.x)?;
        self.accuracy(&dataset.y, &predictions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_two_class_split() {
        let x = DMatrix::from_row_slice(4, 1, &[0.0, 0.0, 5.0, 5.0]);
        let y = DVector::from_vec(vec![0u8, 0, 1, 1]);
        let dataset = Dataset::new(x, y);
        let mut classifier = DecisionTreeClassifier::new();
        classifier.fit(&dataset).unwrap();

        assert_eq!(classifier.n_classes(), 2);
        let tree = classifier.tree().unwrap();
        assert_eq!(tree.node_count(), 3);
        assert_eq!(tree.threshold()[0], 2.5);

        let test_x = DMatrix::from_row_slice(3, 1, &[-1.0, 2.5, 2.6]);
        let predictions = classifier.predict(&test_x).unwrap();
        assert_eq!(predictions, DVector::from_vec(vec![0u8, 0, 1]));
    }

    #[test]
    fn test_entropy_criterion() {
        let x = DMatrix::from_row_slice(6, 2, &[
            0.0, 1.0, 0.5, 3.0, 1.0, 2.0, 4.0, 1.0, 4.5, 2.0, 5.0, 3.0,
        ]);
        let y = DVector::from_vec(vec![2u32, 2, 2, 0, 0, 0]);
        let mut classifier =
            DecisionTreeClassifier::with_params(Some(Criterion::Entropy), None, None, None)
                .unwrap();
        classifier.fit(&Dataset::new(x.clone(), y.clone())).unwrap();
        assert_eq!(classifier.n_classes(), 3);
        assert_eq!(classifier.predict(&x).unwrap(), y);
    }

    #[test]
    fn test_rejects_regression_criterion() {
        assert!(
            DecisionTreeClassifier::<u8>::with_params(Some(Criterion::Mse), None, None, None)
                .is_err()
        );
    }

    #[test]
    fn test_rejects_negative_labels() {
        let x = DMatrix::from_row_slice(2, 1, &[0.0, 1.0]);
        let y = DVector::from_vec(vec![0i32, -1]);
        let mut classifier = DecisionTreeClassifier::new();
        assert_eq!(
            classifier.fit(&Dataset::new(x, y)).unwrap_err(),
            TreeError::InvalidClassLabel { index: 1 }
        );
    }

    #[test]
    fn test_rejects_sparse_labels() {
        let x = DMatrix::from_row_slice(2, 1, &[0.0, 1.0]);
        let mut classifier = DecisionTreeClassifier::new();

        let y = DVector::from_vec(vec![0u64, u64::MAX]);
        assert_eq!(
            classifier.fit(&Dataset::new(x.clone(), y)).unwrap_err(),
            TreeError::InvalidClassLabel { index: 1 }
        );

        let y = DVector::from_vec(vec![1u64 << 40, 0]);
        assert_eq!(
            classifier.fit(&Dataset::new(x.clone(), y)).unwrap_err(),
            TreeError::InvalidClassLabel { index: 0 }
        );

        let y = DVector::from_vec(vec![0u64, 2]);
        assert!(classifier.fit(&Dataset::new(x, y)).is_err());
        assert!(classifier.tree().is_none());
    }

    #[test]
    fn test_identical_rows_predict_weighted_majority() {
        let x = DMatrix::from_element(5, 2, 1.0);
        let y = DVector::from_vec(vec![0u8, 1, 1, 0, 2]);
        let dataset = Dataset::new(x.clone(), y)
            .with_sample_weight(DVector::from_vec(vec![1.0, 1.0, 1.0, 1.0, 3.0]))
            .unwrap();
        let mut classifier = DecisionTreeClassifier::new();
        classifier.fit(&dataset).unwrap();

        assert_eq!(classifier.tree().unwrap().node_count(), 1);
        assert_eq!(classifier.predict(&x).unwrap(), DVector::from_element(5, 2u8));
    }

    #[test]
    fn test_majority_tie_picks_lowest_code() {
        let x = DMatrix::from_element(4, 1, 0.0);
        let y = DVector::from_vec(vec![3u8, 1, 3, 1]);
        let mut classifier = DecisionTreeClassifier::new();
        classifier.fit(&Dataset::new(x.clone(), y)).unwrap();
        assert_eq!(classifier.predict(&x).unwrap()[0], 1);
    }

    #[test]
    fn test_zero_max_depth_is_single_leaf() {
        let mut rng = StdRng::seed_from_u64(4);
        let x = DMatrix::from_fn(40, 3, |_, _| rng.gen_range(0.0..1.0));
        let y = DVector::from_fn(40, |i, _| u8::from(x[(i, 0)] > 0.5));
        let mut classifier =
            DecisionTreeClassifier::with_params(None, None, None, Some(0)).unwrap();
        classifier.fit(&Dataset::new(x, y)).unwrap();
        assert_eq!(classifier.tree().unwrap().node_count(), 1);
    }

    #[test]
    fn test_fits_training_data_and_scores() {
        let mut rng = StdRng::seed_from_u64(17);
        let x = DMatrix::from_fn(200, 4, |_, _| rng.gen_range(-1.0..1.0));
        let y = DVector::from_fn(200, |i, _| {
            if x[(i, 1)] > 0.2 {
                2usize
            } else if x[(i, 3)] < -0.4 {
                1
            } else {
                0
            }
        });
        let dataset = Dataset::new(x.clone(), y);
        let mut classifier = DecisionTreeClassifier::new();
        classifier.set_max_features(MaxFeatures::Count(2)).unwrap();
        classifier.set_seed(Some(5));
        classifier.fit(&dataset).unwrap();

        assert_eq!(classifier.score(&dataset).unwrap(), 1.0);
        let leaves = classifier.apply(&x).unwrap();
        let tree = classifier.tree().unwrap();
        assert!(leaves.iter().all(|&leaf| tree.is_leaf(leaf)));
    }

    #[test]
    fn test_predict_before_fit() {
        let classifier = DecisionTreeClassifier::<u8>::new();
        let x = DMatrix::from_element(1, 1, 0.0);
        assert_eq!(classifier.predict(&x).unwrap_err(), TreeError::NotFitted);
    }
}
