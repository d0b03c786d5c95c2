/// Tree growth over an explicit frontier
pub mod builder;
/// Decision tree classifier over dense class codes
pub mod classifier;
/// Impurity criteria
pub mod criterion;
pub mod frontier;
/// Hyperparameters
pub mod params;
mod predictor;
/// Decision tree regressor
pub mod regressor;
pub mod splitter;
/// Flat node storage
pub mod tree;
