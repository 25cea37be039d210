// settings.rs - Tunable engine parameters with their defaults

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_TARGET_WINDOW_COUNT: usize = 50_000;
pub const DEFAULT_SMOOTHING_ITERATIONS: usize = 1000;
pub const DEFAULT_KERNEL_MIN_BANDWIDTH: f64 = 2.0;
pub const DEFAULT_KERNEL_MAX_BANDWIDTH: f64 = 10.0;

/// Force-directed smoothing used for point estimates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SmoothingSettings {
    pub iterations: usize,
}

impl Default for SmoothingSettings {
    fn default() -> Self {
        Self { iterations: DEFAULT_SMOOTHING_ITERATIONS }
    }
}

/// Kernel smoothing used for threshold search
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KernelSettings {
    pub min_bandwidth: f64,
    pub max_bandwidth: f64,
}

impl Default for KernelSettings {
    fn default() -> Self {
        Self {
            min_bandwidth: DEFAULT_KERNEL_MIN_BANDWIDTH,
            max_bandwidth: DEFAULT_KERNEL_MAX_BANDWIDTH,
        }
    }
}

/// Which windows make up the distribution persisted for each pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistributionKind {
    /// Only windows classified as vertical
    Vertical,
    /// Every sampled window
    All,
}

impl FromStr for DistributionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "vertical" => Ok(DistributionKind::Vertical),
            "all" => Ok(DistributionKind::All),
            _ => Err(format!("Invalid distribution kind: {}. Use: vertical, all", s)),
        }
    }
}

impl fmt::Display for DistributionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistributionKind::Vertical => write!(f, "vertical"),
            DistributionKind::All => write!(f, "all"),
        }
    }
}

/// Everything a pairwise comparison needs besides its inputs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    pub target_window_count: usize,
    pub ignore_indels: bool,
    pub smoothing: SmoothingSettings,
    pub kernel: KernelSettings,
    pub distribution: DistributionKind,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            target_window_count: DEFAULT_TARGET_WINDOW_COUNT,
            ignore_indels: false,
            smoothing: SmoothingSettings::default(),
            kernel: KernelSettings::default(),
            distribution: DistributionKind::Vertical,
        }
    }
}

impl EngineSettings {
    pub fn validate(&self) -> Result<(), String> {
        if self.target_window_count == 0 {
            return Err("Target window count must be greater than 0".to_string());
        }
        if self.kernel.min_bandwidth < 0.0 {
            return Err("Kernel minimum bandwidth cannot be negative".to_string());
        }
        if self.kernel.max_bandwidth < self.kernel.min_bandwidth {
            return Err(format!(
                "Kernel maximum bandwidth ({}) must not be smaller than the minimum ({})",
                self.kernel.max_bandwidth, self.kernel.min_bandwidth
            ));
        }
        Ok(())
    }
}
