use crate::error::{Result, TreeError};
use nalgebra::{DMatrix, DVector};
use num_traits::{Float, FromPrimitive, Num, ToPrimitive};
use rand::seq::SliceRandom;
use rand::{rngs::StdRng, SeedableRng};
use std::cmp::PartialOrd;
use std::fmt::{Debug, Display};
use std::hash::Hash;
use std::ops::{AddAssign, DivAssign, MulAssign, SubAssign};

pub trait DataValue:
    Debug
    + Clone
    + Copy
    + Num
    + FromPrimitive
    + ToPrimitive
    + AddAssign
    + SubAssign
    + MulAssign
    + DivAssign
    + Send
    + Sync
    + Display
    + 'static
{
}

impl<T> DataValue for T where
    T: Debug
        + Clone
        + Copy
        + Num
        + FromPrimitive
        + ToPrimitive
        + AddAssign
        + SubAssign
        + MulAssign
        + DivAssign
        + Send
        + Sync
        + Display
        + 'static
{
}

pub trait Number: DataValue + PartialOrd {}
impl<T> Number for T where T: DataValue + PartialOrd {}

pub trait WholeNumber: Number + Eq + Hash {}
impl<T> WholeNumber for T where T: Number + Eq + Hash {}

pub trait RealNumber: Number + Float {}
impl<T> RealNumber for T where T: Number + Float {}

pub trait TargetValue: DataValue {}
impl<T> TargetValue for T where T: DataValue {}

/// Feature matrix, targets and optional per-sample weights of a training set.
#[derive(Clone, Debug)]
pub struct Dataset<YT: TargetValue> {
    pub x: DMatrix<f64>,
    pub y: DVector<YT>,
    pub sample_weight: Option<DVector<f64>>,
}

impl<YT: TargetValue> Dataset<YT> {
    pub fn new(x: DMatrix<f64>, y: DVector<YT>) -> Self {
        Self {
            x,
            y,
            sample_weight: None,
        }
    }

    /// Attaches per-sample weights.
    ///
    /// # Errors
    ///
    /// Fails when the weight vector length differs from the number of rows, or when a
    /// weight is negative or not finite. Zero weights are accepted; such samples are
    /// dropped by the tree builder.
    pub fn with_sample_weight(mut self, sample_weight: DVector<f64>) -> Result<Self> {
        if sample_weight.len() != self.x.nrows() {
            return Err(TreeError::LengthMismatch {
                what: "sample_weight",
                expected: self.x.nrows(),
                got: sample_weight.len(),
            });
        }
        if let Some((index, &value)) = sample_weight
            .iter()
            .enumerate()
            .find(|(_, w)| !w.is_finite() || **w < 0.0)
        {
            return Err(TreeError::InvalidWeight { index, value });
        }
        self.sample_weight = Some(sample_weight);
        Ok(self)
    }

    pub fn is_not_empty(&self) -> bool {
        !(self.x.is_empty() || self.y.is_empty())
    }

    pub fn nrows(&self) -> usize {
        self.x.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.x.ncols()
    }

    /// Sample weights as a dense vector; all ones when none were attached.
    pub fn weights(&self) -> Vec<f64> {
        match &self.sample_weight {
            Some(weights) => weights.iter().copied().collect(),
            None => vec![1.0; self.x.nrows()],
        }
    }

    pub(crate) fn check_shape(&self) -> Result<()> {
        if self.y.len() != self.x.nrows() {
            return Err(TreeError::LengthMismatch {
                what: "y",
                expected: self.x.nrows(),
                got: self.y.len(),
            });
        }
        Ok(())
    }

    pub fn train_test_split(&self, train_size: f64, seed: Option<u64>) -> Result<(Self, Self)> {
        if !(0.0..=1.0).contains(&train_size) {
            return Err(TreeError::InvalidParameter(
                "Train size should be between 0.0 and 1.0".into(),
            ));
        }
        self.check_shape()?;
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut indices = (0..self.x.nrows()).collect::<Vec<_>>();
        indices.shuffle(&mut rng);
        let train_size = (self.x.nrows() as f64 * train_size).floor() as usize;
        let (train_indices, test_indices) = indices.split_at(train_size);

        Ok((self.select(train_indices), self.select(test_indices)))
    }

    fn select(&self, indices: &[usize]) -> Self {
        let x = DMatrix::from_fn(indices.len(), self.x.ncols(), |i, j| {
            self.x[(indices[i], j)]
        });
        let y = DVector::from_iterator(indices.len(), indices.iter().map(|&i| self.y[i]));
        let sample_weight = self.sample_weight.as_ref().map(|weights| {
            DVector::from_iterator(indices.len(), indices.iter().map(|&i| weights[i]))
        });
        Self {
            x,
            y,
            sample_weight,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> Dataset<u8> {
        let x = DMatrix::from_row_slice(4, 2, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
        let y = DVector::from_vec(vec![9, 10, 11, 12]);
        Dataset::new(x, y)
    }

    #[test]
    fn test_dataset_new() {
        let x = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 3.0, 4.0]);
        let y = DVector::from_vec(vec![5, 6]);
        let dataset = Dataset::new(x.clone(), y.clone());
        assert_eq!(dataset.x, x);
        assert_eq!(dataset.y, y);
        assert!(dataset.sample_weight.is_none());
        assert_eq!(dataset.weights(), vec![1.0, 1.0]);
    }

    #[test]
    fn test_dataset_is_not_empty() {
        assert!(small().is_not_empty());

        let empty_x = DMatrix::<f64>::from_row_slice(0, 2, &[]);
        let empty_y = DVector::<f64>::from_vec(vec![]);
        let empty_dataset = Dataset::new(empty_x, empty_y);
        assert!(!empty_dataset.is_not_empty());
    }

    #[test]
    fn test_with_sample_weight() {
        let dataset = small()
            .with_sample_weight(DVector::from_vec(vec![1.0, 0.0, 2.0, 0.5]))
            .unwrap();
        assert_eq!(dataset.weights(), vec![1.0, 0.0, 2.0, 0.5]);
    }

    #[test]
    fn test_with_sample_weight_wrong_length() {
        let err = small()
            .with_sample_weight(DVector::from_vec(vec![1.0, 1.0]))
            .unwrap_err();
        assert_eq!(
            err,
            TreeError::LengthMismatch {
                what: "sample_weight",
                expected: 4,
                got: 2
            }
        );
    }

    #[test]
    fn test_with_sample_weight_negative() {
        let err = small()
            .with_sample_weight(DVector::from_vec(vec![1.0, -1.0, 1.0, 1.0]))
            .unwrap_err();
        assert_eq!(
            err,
            TreeError::InvalidWeight {
                index: 1,
                value: -1.0
            }
        );
    }

    #[test]
    fn test_dataset_train_test_split() {
        let (train_dataset, test_dataset) = small().train_test_split(0.75, None).unwrap();
        assert_eq!(train_dataset.x.nrows(), 3);
        assert_eq!(test_dataset.x.nrows(), 1);
    }

    #[test]
    fn test_train_test_split_keeps_rows_together() {
        let dataset = small()
            .with_sample_weight(DVector::from_vec(vec![0.1, 0.2, 0.3, 0.4]))
            .unwrap();
        let (train, test) = dataset.train_test_split(0.5, Some(7)).unwrap();
        for part in [&train, &test] {
            let weights = part.weights();
            for i in 0..part.nrows() {
                let row = (part.y[i] - 9) as usize;
                assert_eq!(part.x[(i, 0)], (2 * row + 1) as f64);
                assert_eq!(weights[i], (row + 1) as f64 / 10.0);
            }
        }
    }

    #[test]
    fn test_train_test_split_rejects_bad_size() {
        assert!(small().train_test_split(1.5, None).is_err());
    }
}
