// correction.rs - Distance corrections applied before matrix output

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Saturated value returned for distances beyond the Jukes-Cantor limit
pub const JUKES_CANTOR_SATURATION: f64 = 25.0;

/// Jukes-Cantor substitution correction. Missing distances stay missing.
pub fn jukes_cantor(distance: Option<f64>) -> Option<f64> {
    let d = distance?;
    if d == 0.0 {
        return Some(0.0);
    }
    if d >= 0.75 {
        return Some(JUKES_CANTOR_SATURATION);
    }
    Some(-0.75 * (1.0 - 4.0 * d / 3.0).ln())
}

/// Scale a distance up by the fraction of the genome that was aligned
pub fn correct_aligned_fraction(distance: Option<f64>, aligned_fraction: Option<f64>) -> Option<f64> {
    match (distance, aligned_fraction) {
        (Some(d), Some(af)) if af > 0.0 => Some(d / af),
        _ => None,
    }
}

/// Which corrections to apply. Jukes-Cantor always runs before the
/// aligned-fraction scaling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Corrections {
    pub jukes_cantor: bool,
    pub aligned_fraction: bool,
}

impl Corrections {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_none(&self) -> bool {
        !self.jukes_cantor && !self.aligned_fraction
    }

    pub fn apply(&self, distance: Option<f64>, aligned_fraction: Option<f64>) -> Option<f64> {
        let mut d = distance;
        if self.jukes_cantor {
            d = jukes_cantor(d);
        }
        if self.aligned_fraction {
            d = correct_aligned_fraction(d, aligned_fraction);
        }
        d
    }
}

impl FromStr for Corrections {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut corrections = Corrections::none();
        for part in s.split(',').map(|p| p.trim().to_lowercase()) {
            match part.as_str() {
                "none" | "" => {}
                "jukescantor" => corrections.jukes_cantor = true,
                "alignedfrac" => corrections.aligned_fraction = true,
                _ => {
                    return Err(format!(
                        "Invalid correction: {}. Use: none, jukescantor, alignedfrac (comma-separated)",
                        part
                    ))
                }
            }
        }
        Ok(corrections)
    }
}

impl fmt::Display for Corrections {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.jukes_cantor, self.aligned_fraction) {
            (false, false) => write!(f, "none"),
            (true, false) => write!(f, "jukescantor"),
            (false, true) => write!(f, "alignedfrac"),
            (true, true) => write!(f, "jukescantor,alignedfrac"),
        }
    }
}
