// thresholds.rs - Vertical/horizontal boundaries of a distance distribution

use crate::core::kernel::kernel_smooth;
use crate::core::peaks::{
    find_local_maximum_to_left, find_local_maximum_to_right, find_local_minimum_to_left,
    find_local_minimum_to_right, get_peak_distance,
};
use crate::core::settings::KernelSettings;
use serde::Serialize;
use std::fmt;

/// Boundary indices into a distribution. `None` means no boundary on that
/// side, never index 0 or infinity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Thresholds {
    pub very_low: Option<usize>,
    pub low: Option<usize>,
    pub high: Option<usize>,
    pub very_high: Option<usize>,
}

/// Classification band of a distance index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    VeryLow,
    Low,
    Central,
    High,
    VeryHigh,
}

/// What a window's band says about its history
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WindowClass {
    Vertical,
    Ambiguous,
    Horizontal,
}

impl Band {
    pub fn class(&self) -> WindowClass {
        match self {
            Band::Central => WindowClass::Vertical,
            Band::Low | Band::High => WindowClass::Ambiguous,
            Band::VeryLow | Band::VeryHigh => WindowClass::Horizontal,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Band::VeryLow => "very_low",
            Band::Low => "low",
            Band::Central => "central",
            Band::High => "high",
            Band::VeryHigh => "very_high",
        }
    }
}

impl Thresholds {
    pub fn band(&self, distance: usize) -> Band {
        if self.very_low.is_some_and(|t| distance < t) {
            Band::VeryLow
        } else if self.low.is_some_and(|t| distance < t) {
            Band::Low
        } else if self.very_high.is_some_and(|t| distance > t) {
            Band::VeryHigh
        } else if self.high.is_some_and(|t| distance > t) {
            Band::High
        } else {
            Band::Central
        }
    }

    pub fn classify(&self, distance: usize) -> WindowClass {
        self.band(distance).class()
    }

    /// Band of every index of a distribution with `len` entries
    pub fn group(&self, len: usize) -> Vec<Band> {
        (0..len).map(|i| self.band(i)).collect()
    }
}

impl fmt::Display for Thresholds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |t: Option<usize>| t.map_or_else(|| "none".to_string(), |v| v.to_string());
        write!(
            f,
            "very_low={} low={} high={} very_high={}",
            show(self.very_low),
            show(self.low),
            show(self.high),
            show(self.very_high)
        )
    }
}

/// Result of a threshold search, with the curve it was run on
#[derive(Debug, Clone)]
pub struct ThresholdSearch {
    pub thresholds: Thresholds,
    pub smoothed: Vec<f64>,
    pub peak: usize,
    pub log: Vec<String>,
}

/// From the dominant peak of the kernel-smoothed distribution, the nearest
/// minimum on each side bounds the vertical peak and the maximum beyond it
/// marks where a horizontal mode begins.
pub fn find_thresholds(masses: &[f64], settings: &KernelSettings) -> ThresholdSearch {
    let smoothed = kernel_smooth(masses, settings);
    if smoothed.is_empty() {
        return ThresholdSearch {
            thresholds: Thresholds::default(),
            smoothed,
            peak: 0,
            log: Vec::new(),
        };
    }

    let summary = get_peak_distance(&smoothed);
    let peak = summary.peak;

    let low = find_local_minimum_to_left(&smoothed, peak);
    let very_low = low.and_then(|i| find_local_maximum_to_left(&smoothed, i));
    let high = find_local_minimum_to_right(&smoothed, peak);
    let very_high = high.and_then(|i| find_local_maximum_to_right(&smoothed, i));

    ThresholdSearch {
        thresholds: Thresholds { very_low, low, high, very_high },
        smoothed,
        peak,
        log: summary.log,
    }
}
