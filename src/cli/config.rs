// config.rs - Configuration file support

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    // Pairwise inputs/outputs
    pub assemblies: Option<Vec<String>>,
    pub assembly_list: Option<String>,
    pub alignment_dir: Option<String>,
    pub out_distributions: Option<String>,
    pub out_regions: Option<String>,

    // Performance
    pub threads: Option<usize>,

    // Engine settings
    pub window_count: Option<usize>,
    pub ignore_indels: Option<bool>,
    pub smoothing_iterations: Option<usize>,
    pub distribution: Option<String>,
    pub kernel_min_bandwidth: Option<f64>,
    pub kernel_max_bandwidth: Option<f64>,

    // Distance matrix
    pub alignment_results: Option<String>,
    pub method: Option<String>,
    pub correction: Option<String>,
    pub asymmetrical: Option<bool>,
    pub multi: Option<String>,
    pub output: Option<String>,

    // Sample filtering
    pub include_samples: Option<String>,
    pub exclude_samples: Option<String>,
    pub include_samples_list: Option<String>,

    // Masking
    pub reference: Option<String>,
    pub h_char: Option<String>,
    pub u_char: Option<String>,
    pub exclude_invariant: Option<bool>,
}

impl Config {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file '{}': {}", path.display(), e))?;

        let config = Self::from_toml(&content)
            .map_err(|e| format!("Failed to parse config file '{}': {}", path.display(), e))?;

        eprintln!("📄 Loaded configuration from: {}", path.display());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Generate a sample configuration file with comments
    pub fn generate_sample() -> String {
        r#"# vdist.toml - Configuration file for vdist
# Command line arguments override these settings

# =============================================================================
# PAIRWISE INPUT/OUTPUT
# =============================================================================

# Assembly FASTA files (sample name = file name without extension)
assemblies = ["/path/to/sample_1.fasta", "/path/to/sample_2.fasta"]

# Or a file listing assembly paths, one per line
# assembly_list = "assemblies.txt"

# Directory with one <a>_vs_<b>.paf file per ordered pair
# (minimap2 -c --eqx, query = a, target = b)
alignment_dir = "/path/to/alignments"

# Per-pair distance distributions
out_distributions = "pairwise.tsv"

# Thresholds, summary distances and regions per pair (input to `vdist mask`)
out_regions = "regions.tsv"

# =============================================================================
# PERFORMANCE
# =============================================================================

# Number of threads (omit for auto-detection)
# threads = 16

# =============================================================================
# ENGINE SETTINGS
# =============================================================================

# Approximate number of windows sampled per pair
window_count = 50000

# Remove indels instead of compressing each indel run to one difference
ignore_indels = false

# Smoothing iterations used by the peak estimator
smoothing_iterations = 1000

# Distribution written per pair: vertical, all
distribution = "vertical"

# Kernel bandwidth bounds for the threshold search
kernel_min_bandwidth = 2.0
kernel_max_bandwidth = 10.0

# =============================================================================
# DISTANCE MATRIX
# =============================================================================

# Pairwise distributions to read (output of `vdist pairwise`)
alignment_results = "pairwise.tsv"

# Estimator: mean, median, median_int, mode, peak
method = "peak"

# Corrections: none, or a comma list of jukescantor, alignedfrac
correction = "none"

# Keep the matrix asymmetric
asymmetrical = false

# Policy for repeated pairs: first, low, high
multi = "first"

# PHYLIP output (omit for stdout)
# output = "distances.phylip"

# =============================================================================
# SAMPLE FILTERING
# =============================================================================

# Include only samples matching regex pattern
# include_samples = "ST131_.*"

# Exclude samples matching regex pattern
# exclude_samples = "control.*"

# Include only samples listed in a file (one sample per line)
# include_samples_list = "samples.txt"

# =============================================================================
# MASKING
# =============================================================================

# Reference sample of the pseudo-alignment (omit for auto-detection)
# reference = "reference"

# Replacement characters, or "none" to leave the region untouched
h_char = "N"
u_char = "-"

# Also remove invariant columns
exclude_invariant = false
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_config_parses() {
        let config = Config::from_toml(&Config::generate_sample()).unwrap();
        assert_eq!(config.window_count, Some(50000));
        assert_eq!(config.method.as_deref(), Some("peak"));
        assert_eq!(config.assemblies.as_ref().map(|a| a.len()), Some(2));
        assert_eq!(config.threads, None);
        assert_eq!(config.h_char.as_deref(), Some("N"));
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(Config::from_toml("window_size = 100\n").is_err());
    }

    #[test]
    fn test_empty_config() {
        assert_eq!(Config::from_toml("").unwrap(), Config::default());
    }
}
