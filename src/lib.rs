//! # Rusty-cart
//!
//! `rusty-cart` grows single CART decision trees for classification and regression.
//! Trees are grown greedily, depth first, by trying every threshold between consecutive
//! sorted feature values, and are stored as flat parallel arrays for fast inference.
//!
//! ## Getting Started
//!
//! To use `rusty-cart`, add the following to your `Cargo.toml` file:
//!
//! ```toml
//! [dependencies]
//! rusty-cart = "*"
//! ```
//!
//! ## Example Usage
//!
//! As a quick example, here's how you can fit a regression tree on a tiny dataset:
//!
//! ```rust
//! use rusty_cart::data::dataset::Dataset;
//! use rusty_cart::trees::regressor::DecisionTreeRegressor;
//! use nalgebra::{DMatrix, DVector};
//!
//! let x = DMatrix::from_row_slice(4, 1, &[0.0, 1.0, 2.0, 3.0]);
//! let y = DVector::from_vec(vec![0.0, 0.0, 10.0, 10.0]);
//!
//! let dataset = Dataset::new(x, y);
//!
//! let mut model = DecisionTreeRegressor::new();
//!
//! model.fit(&dataset).unwrap();
//!
//! let test_x = DMatrix::from_row_slice(2, 1, &[0.5, 2.5]);
//!
//! let predictions = model.predict(&test_x).unwrap();
//! assert_eq!(predictions, DVector::from_vec(vec![0.0, 10.0]));
//! ```

/// Dataset and data manipulation utilities
pub mod data;
/// Error type
pub mod error;
/// Functions for evaluating model performance
pub mod metrics;
/// Decision trees
pub mod trees;

pub use error::{Result, TreeError};
