// mod.rs - Data structures module

pub mod alignment;
pub mod assembly;
pub mod matrix;

// Re-export main types for convenience
pub use alignment::{Alignment, Orientation, Strand};
pub use assembly::{Assembly, Contig};
pub use matrix::{DistanceMatrix, MultiPolicy, PairwiseRecord};
