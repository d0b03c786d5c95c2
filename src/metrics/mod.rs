/// Classification metrics
pub mod confusion;
/// Regression metrics
pub mod errors;
