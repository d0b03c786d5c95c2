//! Routing query rows through a fitted [`Tree`].
use super::tree::Tree;
use crate::error::{Result, TreeError};
use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;

impl Tree {
    fn check_features(&self, features: &DMatrix<f64>) -> Result<()> {
        if self.node_count() == 0 {
            return Err(TreeError::NotFitted);
        }
        if features.ncols() != self.n_features() {
            return Err(TreeError::FeatureMismatch {
                expected: self.n_features(),
                got: features.ncols(),
            });
        }
        Ok(())
    }

    /// Leaf id reached by row `row` of `features`. The column count must already be
    /// checked against [`Tree::n_features`].
    fn apply_row(&self, features: &DMatrix<f64>, row: usize) -> usize {
        let feature = self.feature();
        let threshold = self.threshold();
        let left = self.children_left();
        let right = self.children_right();

        let mut node = 0;
        while !self.is_leaf(node) {
            node = if features[(row, feature[node] as usize)] <= threshold[node] {
                left[node] as usize
            } else {
                right[node] as usize
            };
        }
        node
    }

    /// Leaf id reached by every row of `features`.
    ///
    /// # Errors
    ///
    /// Fails when the tree is empty or the column count differs from the one the tree
    /// was fitted on.
    pub fn apply(&self, features: &DMatrix<f64>) -> Result<Vec<usize>> {
        self.check_features(features)?;
        Ok((0..features.nrows())
            .into_par_iter()
            .map(|row| self.apply_row(features, row))
            .collect())
    }

    /// Leaf value reached by every row of `features`.
    pub fn predict(&self, features: &DMatrix<f64>) -> Result<DVector<f64>> {
        let values = self.value();
        let leaves = self.apply(features)?;
        Ok(DVector::from_iterator(
            leaves.len(),
            leaves.into_iter().map(|leaf| values[leaf]),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stump() -> Tree {
        let mut tree = Tree::new(2);
        let root = tree.add_node(1.5, 1, 5.0).unwrap();
        let right = tree.add_terminal_node(10.0).unwrap();
        tree.set_child(root, right, false);
        let left = tree.add_terminal_node(0.0).unwrap();
        tree.set_child(root, left, true);
        tree
    }

    #[test]
    fn test_threshold_is_inclusive_on_the_left() {
        let tree = stump();
        let x = DMatrix::from_row_slice(3, 2, &[9.0, 1.5, 9.0, 1.6, 9.0, -3.0]);
        assert_eq!(tree.apply(&x).unwrap(), vec![2, 1, 2]);
        assert_eq!(
            tree.predict(&x).unwrap(),
            DVector::from_vec(vec![0.0, 10.0, 0.0])
        );
    }

    #[test]
    fn test_predict_is_idempotent() {
        let tree = stump();
        let x = DMatrix::from_fn(50, 2, |i, j| (i * 7 + j * 3) as f64 % 4.0);
        assert_eq!(tree.predict(&x).unwrap(), tree.predict(&x).unwrap());
    }

    #[test]
    fn test_feature_count_is_checked() {
        let tree = stump();
        let x = DMatrix::from_row_slice(1, 3, &[0.0, 0.0, 0.0]);
        assert_eq!(
            tree.predict(&x).unwrap_err(),
            TreeError::FeatureMismatch {
                expected: 2,
                got: 3
            }
        );
    }

    #[test]
    fn test_empty_tree_is_not_fitted() {
        let tree = Tree::new(1);
        let x = DMatrix::from_row_slice(1, 1, &[0.0]);
        assert_eq!(tree.apply(&x).unwrap_err(), TreeError::NotFitted);
    }
}
