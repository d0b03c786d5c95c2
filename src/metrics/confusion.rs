use std::cmp::Ordering;
use std::collections::HashSet;

use nalgebra::{DMatrix, DVector};

use crate::data::dataset::WholeNumber;
use crate::error::{Result, TreeError};

type ConfusionMatrix = DMatrix<usize>;

pub trait ClassificationMetrics<T: WholeNumber> {
    /// Counts of (true class, predicted class) pairs. Rows and columns follow the sorted set
    /// of classes present in either vector.
    fn confusion_matrix(
        &self,
        y_true: &DVector<T>,
        y_pred: &DVector<T>,
    ) -> Result<ConfusionMatrix> {
        if y_true.len() != y_pred.len() {
            return Err(TreeError::LengthMismatch {
                what: "predictions",
                expected: y_true.len(),
                got: y_pred.len(),
            });
        }

        let mut classes_set = HashSet::<T>::new();
        classes_set.extend(y_true.iter());
        classes_set.extend(y_pred.iter());

        let mut classes = Vec::from_iter(classes_set);
        classes.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

        let mut matrix = DMatrix::zeros(classes.len(), classes.len());
        let index_of = |class: &T| classes.iter().position(|c| c == class).unwrap_or(0);

        for (y_t, y_p) in y_true.iter().zip(y_pred.iter()) {
            matrix[(index_of(y_t), index_of(y_p))] += 1;
        }

        Ok(matrix)
    }

    /// Share of predictions equal to the true class.
    fn accuracy(&self, y_true: &DVector<T>, y_pred: &DVector<T>) -> Result<f64> {
        let matrix = self.confusion_matrix(y_true, y_pred)?;
        if y_true.is_empty() {
            return Err(TreeError::EmptyDataset);
        }

        let correct: usize = matrix.diagonal().iter().sum();

        Ok(correct as f64 / y_true.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockClassifier;

    impl ClassificationMetrics<u8> for MockClassifier {}

    #[test]
    fn test_confusion_matrix() {
        let y_true = DVector::from_vec(vec![1, 0, 1, 0, 1]);
        let y_pred = DVector::from_vec(vec![1, 1, 0, 0, 1]);

        let result = MockClassifier.confusion_matrix(&y_true, &y_pred).unwrap();

        assert_eq!(result, DMatrix::from_vec(2, 2, vec![1, 1, 1, 2]));
    }

    #[test]
    fn test_confusion_matrix_unequal() {
        let y_true = DVector::from_vec(vec![1, 0, 1, 0, 1, 0]);
        let y_pred = DVector::from_vec(vec![1, 1, 0, 0, 1]);

        assert!(MockClassifier.confusion_matrix(&y_true, &y_pred).is_err());
    }

    #[test]
    fn test_confusion_matrix_multiclass() {
        let y_true = DVector::from_vec(vec![0, 1, 2, 1, 0, 2]);
        let y_pred = DVector::from_vec(vec![0, 2, 1, 1, 0, 2]);

        let result = MockClassifier.confusion_matrix(&y_true, &y_pred).unwrap();

        assert_eq!(
            result,
            DMatrix::from_vec(3, 3, vec![2, 0, 0, 0, 1, 1, 0, 1, 1])
        );
    }

    #[test]
    fn test_accuracy() {
        let y_true = DVector::from_vec(vec![1, 0, 1, 0, 1]);
        let y_pred = DVector::from_vec(vec![1, 1, 0, 0, 1]);

        assert_eq!(MockClassifier.accuracy(&y_true, &y_pred).unwrap(), 0.6);
    }

    #[test]
    fn test_accuracy_empty() {
        let empty = DVector::<u8>::from_vec(vec![]);
        assert!(MockClassifier.accuracy(&empty, &empty).is_err());
    }
}
