// mod.rs - Core logic module

pub mod cigar;
pub mod correction;
pub mod distribution;
pub mod estimators;
pub mod kernel;
pub mod mask;
pub mod paint;
pub mod pairwise;
pub mod peaks;
pub mod settings;
pub mod smoothing;
pub mod thresholds;
pub mod window;

// Re-export main types for convenience
pub use correction::Corrections;
pub use estimators::{get_distance, DistanceMethod};
pub use mask::{mask_alignment, MaskSettings, RegionsTable};
pub use paint::{ContigRegions, PaintedAssembly};
pub use pairwise::{pairwise_comparison, run_pairwise, Estimates, PairOutcome, PairwiseResult};
pub use settings::{DistributionKind, EngineSettings, KernelSettings, SmoothingSettings};
pub use thresholds::{find_thresholds, Band, Thresholds, WindowClass};
