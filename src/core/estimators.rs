// estimators.rs - Point estimates over mass distributions

use crate::core::peaks::{get_peak_distance, interpolate};
use crate::core::settings::SmoothingSettings;
use crate::core::smoothing::smooth_distribution;
use std::fmt;
use std::str::FromStr;

/// Point estimate used to turn a distribution into a single distance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceMethod {
    Mean,
    Median,
    InterpolatedMedian,
    Mode,
    Peak,
}

impl FromStr for DistanceMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mean" => Ok(DistanceMethod::Mean),
            "median" => Ok(DistanceMethod::Median),
            "median_int" | "interpolated_median" => Ok(DistanceMethod::InterpolatedMedian),
            "mode" => Ok(DistanceMethod::Mode),
            "peak" => Ok(DistanceMethod::Peak),
            _ => Err(format!("Invalid distance method: {}. Use: mean, median, median_int, mode, peak", s)),
        }
    }
}

impl fmt::Display for DistanceMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DistanceMethod::Mean => "mean",
            DistanceMethod::Median => "median",
            DistanceMethod::InterpolatedMedian => "median_int",
            DistanceMethod::Mode => "mode",
            DistanceMethod::Peak => "peak",
        };
        write!(f, "{}", name)
    }
}

impl DistanceMethod {
    pub fn description(&self) -> &str {
        match self {
            DistanceMethod::Mean => "mean of the distribution",
            DistanceMethod::Median => "median of the distribution",
            DistanceMethod::InterpolatedMedian => "interpolated median of the distribution",
            DistanceMethod::Mode => "most common distance",
            DistanceMethod::Peak => "location of the dominant smoothed peak",
        }
    }
}

/// Weighted mean index
pub fn mean(masses: &[f64]) -> f64 {
    let total: f64 = masses.iter().sum();
    if total == 0.0 {
        return 0.0;
    }
    masses.iter().enumerate().map(|(i, m)| i as f64 * m).sum::<f64>() / total
}

/// First index where the cumulative mass reaches half the total. Not
/// interpolated, so always one of the distribution's indices.
pub fn median(masses: &[f64]) -> usize {
    let half_total_mass = masses.iter().sum::<f64>() / 2.0;
    let mut total = 0.0;
    for (i, m) in masses.iter().enumerate() {
        total += m;
        if total >= half_total_mass {
            return i;
        }
    }
    0
}

/// Median shifted within its bin by the imbalance of mass on either side
pub fn interpolated_median(masses: &[f64]) -> f64 {
    let median = median(masses);
    let (mut below, mut equal, mut above) = (0.0, 0.0, 0.0);
    for (i, &m) in masses.iter().enumerate() {
        if i < median {
            below += m;
        } else if i > median {
            above += m;
        } else {
            equal += m;
        }
    }
    if equal == 0.0 {
        median as f64
    } else {
        median as f64 + (above - below) / (2.0 * equal)
    }
}

/// Index with the highest mass. Ties give the mean of the tied indices.
pub fn mode(masses: &[f64]) -> f64 {
    let max_mass = masses.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let tied: Vec<usize> = masses
        .iter()
        .enumerate()
        .filter(|(_, &m)| m == max_mass)
        .map(|(i, _)| i)
        .collect();
    if tied.is_empty() {
        return 0.0;
    }
    tied.iter().sum::<usize>() as f64 / tied.len() as f64
}

/// Dominant peak of the force-smoothed distribution, refined between its
/// neighbours
pub fn peak(masses: &[f64], settings: &SmoothingSettings) -> f64 {
    if masses.is_empty() {
        return 0.0;
    }
    let smoothed = smooth_distribution(masses, settings.iterations);
    let summary = get_peak_distance(&smoothed);
    let p = summary.peak;
    if p == 0 || p + 1 >= smoothed.len() {
        return p as f64;
    }
    p as f64 + interpolate(smoothed[p - 1], smoothed[p], smoothed[p + 1])
}

/// Distance per base for the chosen method, using default smoothing settings
pub fn get_distance(masses: &[f64], window_size: usize, method: DistanceMethod) -> f64 {
    get_distance_with(masses, window_size, method, &SmoothingSettings::default())
}

pub fn get_distance_with(
    masses: &[f64],
    window_size: usize,
    method: DistanceMethod,
    settings: &SmoothingSettings,
) -> f64 {
    if window_size == 0 {
        return 0.0;
    }
    let d = match method {
        DistanceMethod::Mean => mean(masses),
        DistanceMethod::Median => median(masses) as f64,
        DistanceMethod::InterpolatedMedian => interpolated_median(masses),
        DistanceMethod::Mode => mode(masses),
        DistanceMethod::Peak => peak(masses, settings),
    };
    d / window_size as f64
}
