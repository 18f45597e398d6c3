//! Core processing modules: vectorization and temporal stacking

pub mod stack;
pub mod vectorize;

// Re-export main types
pub use stack::{StackSummary, TemporalStacker};
pub use vectorize::{Region, Vectorizer};
