// merge.rs - Merge configuration file with CLI arguments

use crate::cli::args::{DistanceArgs, MaskArgs, PairwiseArgs, ViewArgs};
use crate::cli::Config;

impl PairwiseArgs {
    /// Merge with configuration from file
    /// CLI arguments take precedence over config file values
    pub fn merge_with_config(mut self, config: Config) -> Self {
        // Input/Output
        if self.assemblies.is_empty() {
            self.assemblies = config.assemblies.unwrap_or_default();
        }
        if self.assembly_list.is_none() {
            self.assembly_list = config.assembly_list;
        }
        if self.alignment_dir.is_none() {
            self.alignment_dir = config.alignment_dir;
        }
        if self.out_distributions.is_none() {
            self.out_distributions = config.out_distributions;
        }
        if self.out_regions.is_none() {
            self.out_regions = config.out_regions;
        }

        // Performance
        if self.threads.is_none() {
            self.threads = config.threads;
        }

        // Engine settings
        if self.window_count.is_none() {
            self.window_count = config.window_count;
        }
        if !self.ignore_indels && config.ignore_indels.unwrap_or(false) {
            self.ignore_indels = true;
        }
        if self.smoothing_iterations.is_none() {
            self.smoothing_iterations = config.smoothing_iterations;
        }
        if self.distribution.is_none() {
            self.distribution = config.distribution;
        }
        if self.kernel_min_bandwidth.is_none() {
            self.kernel_min_bandwidth = config.kernel_min_bandwidth;
        }
        if self.kernel_max_bandwidth.is_none() {
            self.kernel_max_bandwidth = config.kernel_max_bandwidth;
        }

        self
    }

    /// Load the `--config` file, if any, and merge it
    pub fn with_config_file(self) -> Result<Self, String> {
        match self.config.clone() {
            Some(path) => Ok(self.merge_with_config(Config::from_file(path)?)),
            None => Ok(self),
        }
    }
}

impl DistanceArgs {
    pub fn merge_with_config(mut self, config: Config) -> Self {
        if self.alignment_results.is_none() {
            self.alignment_results = config.alignment_results;
        }
        if self.output.is_none() {
            self.output = config.output;
        }
        if self.method.is_none() {
            self.method = config.method;
        }
        if self.correction.is_none() {
            self.correction = config.correction;
        }
        if !self.asymmetrical && config.asymmetrical.unwrap_or(false) {
            self.asymmetrical = true;
        }
        if self.multi.is_none() {
            self.multi = config.multi;
        }
        if self.smoothing_iterations.is_none() {
            self.smoothing_iterations = config.smoothing_iterations;
        }
        if self.threads.is_none() {
            self.threads = config.threads;
        }

        // Sample filtering
        if self.include_samples.is_none() {
            self.include_samples = config.include_samples;
        }
        if self.exclude_samples.is_none() {
            self.exclude_samples = config.exclude_samples;
        }
        if self.include_samples_list.is_none() {
            self.include_samples_list = config.include_samples_list;
        }

        self
    }

    pub fn with_config_file(self) -> Result<Self, String> {
        match self.config.clone() {
            Some(path) => Ok(self.merge_with_config(Config::from_file(path)?)),
            None => Ok(self),
        }
    }
}

impl MaskArgs {
    pub fn merge_with_config(mut self, config: Config) -> Self {
        if self.reference.is_none() {
            self.reference = config.reference;
        }
        if self.h_char.is_none() {
            self.h_char = config.h_char;
        }
        if self.u_char.is_none() {
            self.u_char = config.u_char;
        }
        if !self.exclude_invariant && config.exclude_invariant.unwrap_or(false) {
            self.exclude_invariant = true;
        }
        self
    }

    pub fn with_config_file(self) -> Result<Self, String> {
        match self.config.clone() {
            Some(path) => Ok(self.merge_with_config(Config::from_file(path)?)),
            None => Ok(self),
        }
    }
}

impl ViewArgs {
    /// Only the engine settings apply to `view`
    pub fn load_config(&self) -> Result<Config, String> {
        match &self.config {
            Some(path) => Config::from_file(path),
            None => Ok(Config::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_values_take_precedence() {
        let args = PairwiseArgs {
            window_count: Some(1000),
            ..Default::default()
        };
        let config = Config {
            window_count: Some(5),
            smoothing_iterations: Some(10),
            ignore_indels: Some(true),
            assemblies: Some(vec!["x.fasta".to_string()]),
            ..Default::default()
        };
        let merged = args.merge_with_config(config);
        assert_eq!(merged.window_count, Some(1000));
        assert_eq!(merged.smoothing_iterations, Some(10));
        assert!(merged.ignore_indels);
        assert_eq!(merged.assemblies, vec!["x.fasta"]);
    }

    #[test]
    fn test_config_switch_cannot_unset_cli_switch() {
        let args = DistanceArgs {
            asymmetrical: true,
            ..Default::default()
        };
        let config = Config {
            asymmetrical: Some(false),
            method: Some("mean".to_string()),
            ..Default::default()
        };
        let merged = args.merge_with_config(config);
        assert!(merged.asymmetrical);
        assert_eq!(merged.method.as_deref(), Some("mean"));
    }

    #[test]
    fn test_mask_merge() {
        let args = MaskArgs {
            h_char: Some("none".to_string()),
            ..Default::default()
        };
        let config = Config {
            h_char: Some("X".to_string()),
            u_char: Some("N".to_string()),
            ..Default::default()
        };
        let merged = args.merge_with_config(config);
        assert_eq!(merged.h_char.as_deref(), Some("none"));
        assert_eq!(merged.u_char.as_deref(), Some("N"));
    }
}
