// validation.rs - Input validation utilities

use crate::cli::args::{DistanceArgs, MaskArgs, PairwiseArgs};
use crate::cli::Config;
use crate::core::correction::Corrections;
use crate::core::estimators::DistanceMethod;
use crate::core::mask::{parse_mask_char, MaskSettings};
use crate::core::settings::{
    DistributionKind, EngineSettings, KernelSettings, SmoothingSettings, DEFAULT_KERNEL_MAX_BANDWIDTH,
    DEFAULT_KERNEL_MIN_BANDWIDTH, DEFAULT_SMOOTHING_ITERATIONS, DEFAULT_TARGET_WINDOW_COUNT,
};
use crate::data::matrix::MultiPolicy;
use regex::Regex;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::str::FromStr;

pub struct PairwiseOptions {
    pub assembly_paths: Vec<PathBuf>,
    pub alignment_dir: PathBuf,
    pub out_distributions: PathBuf,
    pub out_regions: Option<PathBuf>,
    pub settings: EngineSettings,
}

pub struct DistanceOptions {
    pub alignment_results: PathBuf,
    pub output: Option<PathBuf>,
    pub method: DistanceMethod,
    pub corrections: Corrections,
    pub multi: MultiPolicy,
    pub symmetrize: bool,
    pub smoothing: SmoothingSettings,
    pub sample_include_regex: Option<Regex>,
    pub sample_exclude_regex: Option<Regex>,
    pub samples_include_list: Option<Vec<String>>,
}

pub struct MaskOptions {
    pub in_tsv: PathBuf,
    pub in_alignment: PathBuf,
    pub out_alignment: PathBuf,
    pub reference: Option<String>,
    pub settings: MaskSettings,
}

/// Engine settings from optional overrides, falling back to defaults
pub fn engine_settings(
    window_count: Option<usize>,
    ignore_indels: bool,
    smoothing_iterations: Option<usize>,
    distribution: Option<&str>,
    kernel_min_bandwidth: Option<f64>,
    kernel_max_bandwidth: Option<f64>,
) -> Result<EngineSettings, String> {
    let distribution = match distribution {
        Some(d) => DistributionKind::from_str(d)?,
        None => DistributionKind::Vertical,
    };
    let settings = EngineSettings {
        target_window_count: window_count.unwrap_or(DEFAULT_TARGET_WINDOW_COUNT),
        ignore_indels,
        smoothing: SmoothingSettings {
            iterations: smoothing_iterations.unwrap_or(DEFAULT_SMOOTHING_ITERATIONS),
        },
        kernel: KernelSettings {
            min_bandwidth: kernel_min_bandwidth.unwrap_or(DEFAULT_KERNEL_MIN_BANDWIDTH),
            max_bandwidth: kernel_max_bandwidth.unwrap_or(DEFAULT_KERNEL_MAX_BANDWIDTH),
        },
        distribution,
    };
    settings.validate()?;
    Ok(settings)
}

/// Engine settings for `view`, which only reads them from the config file
pub fn config_engine_settings(config: &Config) -> Result<EngineSettings, String> {
    engine_settings(
        config.window_count,
        config.ignore_indels.unwrap_or(false),
        config.smoothing_iterations,
        config.distribution.as_deref(),
        config.kernel_min_bandwidth,
        config.kernel_max_bandwidth,
    )
}

fn validate_threads(threads: Option<usize>) -> Result<(), String> {
    if threads == Some(0) {
        return Err("--threads must be greater than 0".to_string());
    }
    Ok(())
}

fn compile_regex(pattern: Option<&String>, name: &str) -> Result<Option<Regex>, String> {
    pattern
        .map(|p| Regex::new(p).map_err(|e| format!("Invalid {} regex: {}", name, e)))
        .transpose()
}

pub fn validate_pairwise(args: &PairwiseArgs) -> Result<PairwiseOptions, String> {
    validate_threads(args.threads)?;

    let mut assembly_paths: Vec<PathBuf> = args.assemblies.iter().map(PathBuf::from).collect();
    if let Some(list) = &args.assembly_list {
        assembly_paths.extend(load_list_from_file(list)?.into_iter().map(PathBuf::from));
    }
    if assembly_paths.len() < 2 {
        return Err("At least two assemblies are required (--assemblies or --assembly-list)".to_string());
    }

    let alignment_dir = PathBuf::from(args.alignment_dir.as_ref().ok_or("--alignment-dir is required")?);
    if !alignment_dir.is_dir() {
        return Err(format!("Alignment directory '{}' does not exist", alignment_dir.display()));
    }
    let out_distributions = PathBuf::from(
        args.out_distributions
            .as_ref()
            .ok_or("--out-distributions is required")?,
    );

    let settings = engine_settings(
        args.window_count,
        args.ignore_indels,
        args.smoothing_iterations,
        args.distribution.as_deref(),
        args.kernel_min_bandwidth,
        args.kernel_max_bandwidth,
    )?;

    Ok(PairwiseOptions {
        assembly_paths,
        alignment_dir,
        out_distributions,
        out_regions: args.out_regions.as_ref().map(PathBuf::from),
        settings,
    })
}

pub fn validate_distance(args: &DistanceArgs) -> Result<DistanceOptions, String> {
    validate_threads(args.threads)?;

    let alignment_results = PathBuf::from(
        args.alignment_results
            .as_ref()
            .ok_or("--alignment-results is required")?,
    );
    let method = match &args.method {
        Some(m) => DistanceMethod::from_str(m)?,
        None => DistanceMethod::Peak,
    };
    let corrections = match &args.correction {
        Some(c) => Corrections::from_str(c)?,
        None => Corrections::none(),
    };
    let multi = match &args.multi {
        Some(m) => MultiPolicy::from_str(m)?,
        None => MultiPolicy::First,
    };

    let smoothing = SmoothingSettings {
        iterations: args.smoothing_iterations.unwrap_or(DEFAULT_SMOOTHING_ITERATIONS),
    };

    let samples_include_list = args
        .include_samples_list
        .as_ref()
        .map(|path| load_list_from_file(path))
        .transpose()?;

    Ok(DistanceOptions {
        alignment_results,
        output: args.output.as_ref().map(PathBuf::from),
        method,
        corrections,
        multi,
        symmetrize: !args.asymmetrical,
        smoothing,
        sample_include_regex: compile_regex(args.include_samples.as_ref(), "include_samples")?,
        sample_exclude_regex: compile_regex(args.exclude_samples.as_ref(), "exclude_samples")?,
        samples_include_list,
    })
}

pub fn validate_mask(args: &MaskArgs) -> Result<MaskOptions, String> {
    let in_tsv = PathBuf::from(args.in_tsv.as_ref().ok_or("--in-tsv is required")?);
    let in_alignment = PathBuf::from(args.in_alignment.as_ref().ok_or("--in-alignment is required")?);
    let out_alignment = PathBuf::from(args.out_alignment.as_ref().ok_or("--out-alignment is required")?);

    let defaults = MaskSettings::default();
    let h_char = match &args.h_char {
        Some(c) => parse_mask_char(c)?,
        None => defaults.h_char,
    };
    let u_char = match &args.u_char {
        Some(c) => parse_mask_char(c)?,
        None => defaults.u_char,
    };

    Ok(MaskOptions {
        in_tsv,
        in_alignment,
        out_alignment,
        reference: args.reference.clone(),
        settings: MaskSettings {
            h_char,
            u_char,
            exclude_invariant: args.exclude_invariant,
        },
    })
}

/// Load non-empty trimmed lines from a file, in order and without duplicates
pub fn load_list_from_file(file_path: &str) -> Result<Vec<String>, String> {
    let file = File::open(file_path)
        .map_err(|e| format!("Failed to open list file '{}': {}", file_path, e))?;

    let reader = BufReader::new(file);
    let mut items: Vec<String> = Vec::new();

    for (line_num, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| format!("Failed to read line {} from '{}': {}", line_num + 1, file_path, e))?;
        let trimmed = line.trim();
        if !trimmed.is_empty() && !items.iter().any(|i| i == trimmed) {
            items.push(trimmed.to_string());
        }
    }

    eprintln!("📋 Loaded {} items from list file '{}'", items.len(), file_path);
    Ok(items)
}
