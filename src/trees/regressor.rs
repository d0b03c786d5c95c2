//! Decision Tree Regressor
use super::builder::{build_tree, BuildConfig};
use super::criterion::Criterion;
use super::params::{MaxFeatures, TreeParams};
use super::tree::Tree;
use crate::{
    data::dataset::Dataset,
    error::{Result, TreeError},
    metrics::errors::RegressionMetrics,
};
use nalgebra::{DMatrix, DVector};
use rand::{rngs::StdRng, SeedableRng};
use tracing::info;

/// Decision Tree Regressor
#[derive(Clone, Debug, Default)]
pub struct DecisionTreeRegressor {
    tree: Option<Tree>,
    tree_params: TreeParams,
}

impl RegressionMetrics<f64> for DecisionTreeRegressor {}

impl DecisionTreeRegressor {
    /// Creates a new instance of the decision tree regressor with default parameters.
    pub fn new() -> Self {
        Self {
            tree: None,
            tree_params: TreeParams::new(),
        }
    }

    /// Creates a new instance of the decision tree regressor with custom parameters.
    ///
    /// # Arguments
    ///
    /// * `min_samples_split` - The minimum number of samples required to split an internal node.
    /// * `min_samples_leaf` - The minimum number of samples each side of a split must keep.
    /// * `max_depth` - The maximum depth of the tree.
    ///
    /// # Errors
    ///
    /// This method will return an error if the minimum number of samples to split is less than 2
    /// or the minimum number of samples in a leaf is less than 1.
    pub fn with_params(
        min_samples_split: Option<usize>,
        min_samples_leaf: Option<usize>,
        max_depth: Option<usize>,
    ) -> Result<Self> {
        let mut tree = Self::new();

        tree.set_min_samples_split(min_samples_split.unwrap_or(2))?;
        tree.set_min_samples_leaf(min_samples_leaf.unwrap_or(1))?;
        tree.set_max_depth(max_depth);
        Ok(tree)
    }

    /// Sets the minimum number of samples required to split an internal node.
    pub fn set_min_samples_split(&mut self, min_samples_split: usize) -> Result<()> {
        self.tree_params.set_min_samples_split(min_samples_split)
    }

    pub fn set_min_samples_leaf(&mut self, min_samples_leaf: usize) -> Result<()> {
        self.tree_params.set_min_samples_leaf(min_samples_leaf)
    }

    /// Sets the maximum depth of the tree. `None` grows until no node can be split.
    pub fn set_max_depth(&mut self, max_depth: Option<usize>) {
        self.tree_params.set_max_depth(max_depth)
    }

    /// Sets how many randomly chosen features are tried at each split.
    pub fn set_max_features(&mut self, max_features: MaxFeatures) -> Result<()> {
        self.tree_params.set_max_features(max_features)
    }

    /// Seeds the generator that picks candidate features.
    pub fn set_seed(&mut self, seed: Option<u64>) {
        self.tree_params.set_seed(seed)
    }

    pub fn params(&self) -> &TreeParams {
        &self.tree_params
    }

    /// The fitted tree, if any.
    pub fn tree(&self) -> Option<&Tree> {
        self.tree.as_ref()
    }

    /// Builds the decision tree from a dataset.
    ///
    /// # Errors
    ///
    /// This method will return an error if the dataset is empty or inconsistent, if no sample
    /// has a positive weight, or if `max_features` doesn't fit the number of columns.
    pub fn fit(&mut self, dataset: &Dataset<f64>) -> Result<()> {
        dataset.check_shape()?;
        if !dataset.is_not_empty() {
            return Err(TreeError::EmptyDataset);
        }
        let config = BuildConfig {
            criterion: Criterion::Mse,
            n_classes: 0,
            max_features: self.tree_params.max_features().resolve(dataset.ncols())?,
            max_depth: self.tree_params.max_depth(),
            min_samples_split: self.tree_params.min_samples_split(),
            min_samples_leaf: self.tree_params.min_samples_leaf(),
        };
        let mut rng = match self.tree_params.seed() {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let tree = build_tree(
            &dataset.x,
            dataset.y.as_slice(),
            &dataset.weights(),
            &config,
            &mut rng,
        )?;
        info!(
            nodes = tree.node_count(),
            leaves = tree.n_leaves(),
            depth = tree.depth(),
            "fitted decision tree regressor"
        );
        self.tree = Some(tree);
        Ok(())
    }

    /// Predicts the targets for new data.
    ///
    /// # Errors
    ///
    /// This method will return an error if the tree wasn't built yet or the number of columns
    /// differs from the training data.
    pub fn predict(&self, prediction_features: &DMatrix<f64>) -> Result<DVector<f64>> {
        self.tree
            .as_ref()
            .ok_or(TreeError::NotFitted)?
            .predict(prediction_features)
    }

    /// Returns the id of the leaf each row ends up in.
    pub fn apply(&self, prediction_features: &DMatrix<f64>) -> Result<Vec<usize>> {
        self.tree
            .as_ref()
            .ok_or(TreeError::NotFitted)?
            .apply(prediction_features)
    }

    /// Coefficient of determination of the predictions on `dataset`.
    pub fn score(&self, dataset: &Dataset<f64>) -> Result<f64> {
        let predictions = self.predict(&dataset.x)?;
        self.r2(&dataset.y, &predictions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::Rng;

    #[test]
    fn test_fit_and_predict() {
        let x = DMatrix::from_vec(4, 1, vec![0.0, 1.0, 2.0, 3.0]);
        let y = DVector::from_vec(vec![0.0, 0.0, 10.0, 10.0]);
        let dataset = Dataset::new(x, y);
        let mut regressor = DecisionTreeRegressor::new();
        regressor.fit(&dataset).unwrap();

        let tree = regressor.tree().unwrap();
        assert_eq!(tree.node_count(), 3);
        assert_relative_eq!(tree.threshold()[0], 1.5);

        let test_x = DMatrix::from_vec(4, 1, vec![-5.0, 1.5, 1.6, 100.0]);
        let predictions = regressor.predict(&test_x).unwrap();
        assert_eq!(predictions, DVector::from_vec(vec![0.0, 0.0, 10.0, 10.0]));
    }

    #[test]
    fn test_fit_and_predict_with_single_row() {
        let x = DMatrix::from_vec(1, 2, vec![1.0, 2.0]);
        let y = DVector::from_vec(vec![1.0]);
        let dataset = Dataset::new(x, y);
        let mut regressor = DecisionTreeRegressor::new();
        regressor.fit(&dataset).unwrap();

        let test_x = DMatrix::from_vec(1, 2, vec![2.0, 3.0]);
        let predictions = regressor.predict(&test_x).unwrap();
        assert_eq!(predictions, DVector::from_vec(vec![1.0]));
    }

    #[test]
    fn test_predict_before_fit() {
        let regressor = DecisionTreeRegressor::new();
        let test_x = DMatrix::from_vec(1, 1, vec![0.0]);
        assert_eq!(
            regressor.predict(&test_x).unwrap_err(),
            TreeError::NotFitted
        );
    }

    #[test]
    fn test_predict_with_wrong_columns() {
        let x = DMatrix::from_vec(2, 1, vec![0.0, 1.0]);
        let y = DVector::from_vec(vec![0.0, 1.0]);
        let mut regressor = DecisionTreeRegressor::new();
        regressor.fit(&Dataset::new(x, y)).unwrap();

        let test_x = DMatrix::from_vec(1, 2, vec![0.0, 1.0]);
        assert!(matches!(
            regressor.predict(&test_x),
            Err(TreeError::FeatureMismatch { expected: 1, got: 2 })
        ));
    }

    #[test]
    fn test_max_depth_zero_predicts_weighted_mean() {
        let x = DMatrix::from_vec(3, 1, vec![0.0, 1.0, 2.0]);
        let y = DVector::from_vec(vec![1.0, 2.0, 6.0]);
        let dataset = Dataset::new(x.clone(), y)
            .with_sample_weight(DVector::from_vec(vec![2.0, 1.0, 1.0]))
            .unwrap();
        let mut regressor = DecisionTreeRegressor::with_params(None, None, Some(0)).unwrap();
        regressor.fit(&dataset).unwrap();

        let predictions = regressor.predict(&x).unwrap();
        for p in predictions.iter() {
            assert_relative_eq!(*p, 2.5);
        }
    }

    #[test]
    fn test_seeded_fits_match() {
        let mut rng = StdRng::seed_from_u64(8);
        let x = DMatrix::from_fn(120, 5, |_, _| rng.gen_range(0.0..1.0));
        let y = DVector::from_fn(120, |i, _| x[(i, 2)] * 3.0 - x[(i, 4)]);
        let dataset = Dataset::new(x.clone(), y);

        let fit = |seed| {
            let mut regressor = DecisionTreeRegressor::with_params(None, Some(2), Some(6)).unwrap();
            regressor.set_max_features(MaxFeatures::Fraction(0.4)).unwrap();
            regressor.set_seed(Some(seed));
            regressor.fit(&dataset).unwrap();
            regressor
        };
        let first = fit(3);
        let second = fit(3);
        assert_eq!(first.tree(), second.tree());
        assert_eq!(first.predict(&x).unwrap(), second.predict(&x).unwrap());
    }

    #[test]
    fn test_score_on_training_data() {
        let x = DMatrix::from_fn(50, 1, |i, _| i as f64);
        let y = DVector::from_fn(50, |i, _| if i < 25 { 1.0 } else { 4.0 });
        let dataset = Dataset::new(x, y);
        let mut regressor = DecisionTreeRegressor::with_params(None, None, Some(1)).unwrap();
        regressor.fit(&dataset).unwrap();
        assert_relative_eq!(regressor.score(&dataset).unwrap(), 1.0);
    }

    #[test]
    fn test_fit_rejects_empty_dataset() {
        let x = DMatrix::<f64>::zeros(0, 2);
        let y = DVector::<f64>::zeros(0);
        let mut regressor = DecisionTreeRegressor::new();
        assert_eq!(
            regressor.fit(&Dataset::new(x, y)).unwrap_err(),
            TreeError::EmptyDataset
        );
    }

    #[test]
    fn test_fit_rejects_misshaped_dataset() {
        let x = DMatrix::from_vec(3, 1, vec![0.0, 1.0, 2.0]);
        let y = DVector::from_vec(vec![0.0, 1.0]);
        let mut regressor = DecisionTreeRegressor::new();
        assert!(matches!(
            regressor.fit(&Dataset::new(x, y)),
            Err(TreeError::LengthMismatch { what: "y", .. })
        ));
    }
}
