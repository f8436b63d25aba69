//! Per-segment authorship classification.

pub mod classifier;

pub use classifier::{Classifier, RateLimiter};
