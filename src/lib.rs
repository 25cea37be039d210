// lib.rs - vdist library root

//! # vdist - Window-based distance distributions for pairs of bacterial assemblies
//!
//! For each ordered pair of assemblies, vdist slides fixed-size windows along
//! their PAF alignments, builds the distribution of per-window differences and
//! splits it into a *vertical* (clock-like) core and *horizontal* (recombined)
//! tails. The distributions feed a corrected PHYLIP distance matrix, and the
//! per-contig region annotations feed masking of a pseudo-alignment.
//!
//! ## Features
//!
//! - **Parallel pairs**: one assembly pair per rayon worker
//! - **Five estimators**: mean, median, interpolated median, mode and smoothed peak
//! - **Threshold search**: kernel smoothing and peak climbing to find the vertical band
//! - **Corrections**: Jukes-Cantor and aligned-fraction, optional symmetrisation
//! - **Masking**: horizontal and unaligned regions replaced in a pseudo-alignment
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use vdist::prelude::*;
//!
//! let records = load_pairwise_records(std::path::Path::new("pairwise.tsv"))?;
//! let mut matrix = DistanceMatrix::from_records(
//!     &records,
//!     DistanceMethod::Peak,
//!     &SmoothingSettings::default(),
//!     MultiPolicy::First,
//!     "pairwise.tsv",
//! )?;
//! matrix.apply_corrections("jukescantor".parse::<Corrections>()?);
//! matrix.symmetrize();
//! write_phylip_output(None, &matrix)?;
//! # Ok::<(), String>(())
//! ```

// Re-export all main modules
pub mod cli;
pub mod core;
pub mod data;
pub mod output;

// Convenience prelude for common imports
pub mod prelude {
    pub use crate::cli::{Args, Command, Config};
    pub use crate::core::{find_thresholds, get_distance, pairwise_comparison, run_pairwise};
    pub use crate::core::{Corrections, DistanceMethod, EngineSettings, SmoothingSettings, Thresholds};
    pub use crate::core::{MaskSettings, PairOutcome, PairwiseResult};
    pub use crate::data::matrix::load_pairwise_records;
    pub use crate::data::{Alignment, Assembly, DistanceMatrix, MultiPolicy, PairwiseRecord};
    pub use crate::output::{write_distributions_file, write_phylip_output, write_regions_file};
}

// Re-export main types at the root level for convenience
pub use cli::Args;
pub use core::{DistanceMethod, EngineSettings, Thresholds};
pub use data::{Assembly, DistanceMatrix, PairwiseRecord};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
