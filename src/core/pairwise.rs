// pairwise.rs - Per-pair comparison pipeline and the parallel batch driver

use crate::core::cigar::IndelMode;
use crate::core::distribution::{aligned_fraction, build_masses, mean_identity};
use crate::core::estimators::{interpolated_median, mean, median, mode, peak};
use crate::core::paint::{ContigRegions, PaintedAssembly};
use crate::core::settings::{DistributionKind, EngineSettings};
use crate::core::thresholds::{find_thresholds, Thresholds, WindowClass};
use crate::core::window::{choose_window, sample};
use crate::data::alignment::{load_paf, pair_alignment_path, Alignment, Orientation};
use crate::data::assembly::Assembly;
use crate::data::matrix::PairwiseRecord;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::Serialize;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

/// Point estimates of one distribution, as per-base distances
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Estimates {
    pub mean: f64,
    pub median: f64,
    pub median_int: f64,
    pub mode: f64,
    pub peak: f64,
}

impl Estimates {
    pub fn from_masses(masses: &[f64], window_size: usize, settings: &EngineSettings) -> Option<Self> {
        if masses.is_empty() || window_size == 0 {
            return None;
        }
        let w = window_size as f64;
        Some(Self {
            mean: mean(masses) / w,
            median: median(masses) as f64 / w,
            median_int: interpolated_median(masses) / w,
            mode: mode(masses) / w,
            peak: peak(masses, &settings.smoothing) / w,
        })
    }
}

/// Everything computed for one ordered pair of assemblies
#[derive(Debug, Clone)]
pub struct PairwiseResult {
    pub assembly_a: String,
    pub assembly_b: String,
    pub alignment_count: usize,
    pub window_size: usize,
    pub window_step: usize,
    pub aligned_fraction: f64,
    /// Distribution over every sampled window
    pub masses: Vec<f64>,
    /// Kernel-smoothed `masses` used for the threshold search
    pub smoothed: Vec<f64>,
    pub thresholds: Thresholds,
    pub vertical_masses: Vec<f64>,
    pub horizontal_masses: Vec<f64>,
    pub window_count: usize,
    pub vertical_window_count: usize,
    pub horizontal_window_count: usize,
    pub distribution: DistributionKind,
    pub estimates: Option<Estimates>,
    pub regions_a: Vec<(String, ContigRegions)>,
    pub regions_b: Vec<(String, ContigRegions)>,
    pub log: Vec<String>,
}

impl PairwiseResult {
    /// The distribution persisted for this pair
    pub fn persisted_masses(&self) -> &[f64] {
        match self.distribution {
            DistributionKind::Vertical => &self.vertical_masses,
            DistributionKind::All => &self.masses,
        }
    }

    pub fn record(&self) -> PairwiseRecord {
        PairwiseRecord {
            assembly_a: self.assembly_a.clone(),
            assembly_b: self.assembly_b.clone(),
            window_size: self.window_size,
            aligned_fraction: self.aligned_fraction,
            masses: self.persisted_masses().to_vec(),
        }
    }
}

fn masses_or_empty(samples: &[usize]) -> Result<Vec<f64>, String> {
    match samples.iter().max() {
        Some(&max) => build_masses(samples, max),
        None => Ok(Vec::new()),
    }
}

/// Compare assembly `a` (alignment query) with `b` (target). Returns
/// `Ok(None)` when the alignments hold no complete window.
pub fn pairwise_comparison(
    a: &Assembly,
    b: &Assembly,
    alignments: &[Alignment],
    settings: &EngineSettings,
) -> Result<Option<PairwiseResult>, String> {
    let indel_mode = IndelMode::from_ignore_flag(settings.ignore_indels);
    let traces: Vec<Vec<u8>> = alignments.iter().map(|al| indel_mode.apply(&al.trace)).collect();

    let (window_size, window_step) = choose_window(&traces, settings.target_window_count);
    let (samples, max_sample) = sample(&traces, window_size, window_step);
    if samples.is_empty() {
        return Ok(None);
    }
    let masses = build_masses(&samples, max_sample)?;

    let search = find_thresholds(&masses, &settings.kernel);
    let thresholds = search.thresholds;

    let (vertical, horizontal): (Vec<usize>, Vec<usize>) = samples
        .iter()
        .partition(|&&s| thresholds.classify(s) == WindowClass::Vertical);
    let vertical_masses = masses_or_empty(&vertical)?;
    let horizontal_masses = masses_or_empty(&horizontal)?;

    let af = aligned_fraction(
        alignments
            .iter()
            .map(|al| (al.query_name.as_str(), al.query_start, al.query_end)),
        a.total_length(),
    );

    let mut painted_a = PaintedAssembly::new(a);
    let mut painted_b = PaintedAssembly::new(b);
    for alignment in alignments {
        painted_a.add_alignment(alignment, Orientation::Query, window_size, indel_mode)?;
        painted_b.add_alignment(alignment, Orientation::Target, window_size, indel_mode)?;
    }

    let persisted = match settings.distribution {
        DistributionKind::Vertical => &vertical_masses,
        DistributionKind::All => &masses,
    };
    let estimates = Estimates::from_masses(persisted, window_size, settings);

    let mut log = vec![
        format!(
            "{} vs {}: {} alignments, window size {} (step {}), {} windows",
            a.name,
            b.name,
            alignments.len(),
            window_size,
            window_step,
            samples.len()
        ),
        format!(
            "mean identity {:.4}, aligned fraction {:.4}",
            mean_identity(&masses, window_size),
            af
        ),
        format!("thresholds: {}", thresholds),
    ];
    log.extend(search.log);

    Ok(Some(PairwiseResult {
        assembly_a: a.name.clone(),
        assembly_b: b.name.clone(),
        alignment_count: alignments.len(),
        window_size,
        window_step,
        aligned_fraction: af,
        masses,
        smoothed: search.smoothed,
        thresholds,
        window_count: samples.len(),
        vertical_window_count: vertical.len(),
        horizontal_window_count: horizontal.len(),
        vertical_masses,
        horizontal_masses,
        distribution: settings.distribution,
        estimates,
        regions_a: painted_a.regions(&thresholds),
        regions_b: painted_b.regions(&thresholds),
        log,
    }))
}

/// Outcome of one ordered pair, present even when no windows were found
#[derive(Debug, Clone)]
pub struct PairOutcome {
    pub assembly_a: String,
    pub assembly_b: String,
    pub aligned_fraction: f64,
    /// Every contig unaligned, reported when there is no result
    pub unaligned_a: Vec<(String, ContigRegions)>,
    pub unaligned_b: Vec<(String, ContigRegions)>,
    pub result: Option<PairwiseResult>,
}

impl PairOutcome {
    pub fn regions_a(&self) -> &[(String, ContigRegions)] {
        self.result.as_ref().map_or(&self.unaligned_a, |r| &r.regions_a)
    }

    pub fn regions_b(&self) -> &[(String, ContigRegions)] {
        self.result.as_ref().map_or(&self.unaligned_b, |r| &r.regions_b)
    }

    pub fn record(&self) -> PairwiseRecord {
        match &self.result {
            Some(result) => result.record(),
            None => PairwiseRecord {
                assembly_a: self.assembly_a.clone(),
                assembly_b: self.assembly_b.clone(),
                window_size: 0,
                aligned_fraction: self.aligned_fraction,
                masses: Vec::new(),
            },
        }
    }
}

/// Estimates and thresholds recomputed from a stored distribution
#[derive(Debug, Clone, Serialize)]
pub struct PairSummary {
    pub assembly_a: String,
    pub assembly_b: String,
    pub window_size: usize,
    pub aligned_fraction: f64,
    pub estimates: Option<Estimates>,
    pub thresholds: Thresholds,
    pub peak: usize,
    pub masses: Vec<f64>,
    pub smoothed: Vec<f64>,
    pub log: Vec<String>,
}

pub fn summarize_record(record: &PairwiseRecord, settings: &EngineSettings) -> PairSummary {
    let search = find_thresholds(&record.masses, &settings.kernel);
    PairSummary {
        assembly_a: record.assembly_a.clone(),
        assembly_b: record.assembly_b.clone(),
        window_size: record.window_size,
        aligned_fraction: record.aligned_fraction,
        estimates: Estimates::from_masses(&record.masses, record.window_size, settings),
        thresholds: search.thresholds,
        peak: search.peak,
        masses: record.masses.clone(),
        smoothed: search.smoothed,
        log: search.log,
    }
}

/// Every ordered pair of distinct assemblies, `a` major
pub fn ordered_pairs(count: usize) -> Vec<(usize, usize)> {
    (0..count)
        .flat_map(|i| (0..count).filter(move |&j| j != i).map(move |j| (i, j)))
        .collect()
}

pub fn compare_pair(
    a: &Assembly,
    b: &Assembly,
    alignment_dir: &Path,
    settings: &EngineSettings,
) -> Result<PairOutcome, String> {
    let alignments = load_paf(&pair_alignment_path(alignment_dir, &a.name, &b.name))?;
    let result = pairwise_comparison(a, b, &alignments, settings)
        .map_err(|e| format!("{} vs {}: {}", a.name, b.name, e))?;
    let (aligned, unaligned_a, unaligned_b) = match &result {
        Some(r) => (r.aligned_fraction, Vec::new(), Vec::new()),
        None => (
            aligned_fraction(
                alignments
                    .iter()
                    .map(|al| (al.query_name.as_str(), al.query_start, al.query_end)),
                a.total_length(),
            ),
            PaintedAssembly::new(a).regions(&Thresholds::default()),
            PaintedAssembly::new(b).regions(&Thresholds::default()),
        ),
    };
    Ok(PairOutcome {
        assembly_a: a.name.clone(),
        assembly_b: b.name.clone(),
        aligned_fraction: aligned,
        unaligned_a,
        unaligned_b,
        result,
    })
}

fn progress_bar(len: usize) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) ETA: {eta}")
        .map(|s| s.progress_chars("#>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb
}

/// Compare all ordered pairs in parallel. Results come back in pair order;
/// the first failing pair aborts the batch.
pub fn run_pairwise(
    assemblies: &[Assembly],
    alignment_dir: &Path,
    settings: &EngineSettings,
) -> Result<Vec<PairOutcome>, String> {
    let pairs = ordered_pairs(assemblies.len());
    let start = Instant::now();
    println!(
        "🔄 Comparing {} assemblies ({} ordered pairs)...",
        assemblies.len(),
        pairs.len()
    );

    let pb = progress_bar(pairs.len());
    let completed = AtomicUsize::new(0);
    let outcomes = pairs
        .par_iter()
        .map(|&(i, j)| {
            let outcome = compare_pair(&assemblies[i], &assemblies[j], alignment_dir, settings);
            let count = completed.fetch_add(1, Ordering::Relaxed) + 1;
            pb.set_position(count as u64);
            outcome
        })
        .collect::<Result<Vec<_>, String>>();
    pb.finish_and_clear();

    let outcomes = outcomes?;
    let empty = outcomes.iter().filter(|o| o.result.is_none()).count();
    if empty > 0 {
        eprintln!("⚠️  {} pairs had no aligned windows and will have missing distances", empty);
    }
    println!(
        "✅ {} pairwise comparisons completed in {:.2}s",
        outcomes.len(),
        start.elapsed().as_secs_f64()
    );
    Ok(outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::alignment::Strand;
    use crate::data::assembly::Contig;

    fn assembly(name: &str, contig: &str, length: usize) -> Assembly {
        Assembly {
            name: name.to_string(),
            path: Default::default(),
            contigs: vec![Contig { name: contig.to_string(), length }],
        }
    }

    /// Alignment of the whole of `a1` to `b1` with a mismatch every `spacing`
    /// columns and a dense block of mismatches in the middle
    fn alignment(length: usize, spacing: usize, block: (usize, usize)) -> Alignment {
        let trace: Vec<u8> = (0..length)
            .map(|i| {
                if (i >= block.0 && i < block.1 && i % 5 == 0) || i % spacing == 0 {
                    b'X'
                } else {
                    b'='
                }
            })
            .collect();
        Alignment {
            query_name: "a1".to_string(),
            query_length: length,
            query_start: 0,
            query_end: length,
            strand: Strand::Forward,
            target_name: "b1".to_string(),
            target_length: length,
            target_start: 0,
            target_end: length,
            trace,
        }
    }

    fn settings() -> EngineSettings {
        EngineSettings {
            target_window_count: 100,
            ..Default::default()
        }
    }

    #[test]
    fn test_ordered_pairs() {
        assert_eq!(ordered_pairs(3), vec![(0, 1), (0, 2), (1, 0), (1, 2), (2, 0), (2, 1)]);
        assert!(ordered_pairs(1).is_empty());
    }

    #[test]
    fn test_no_windows_gives_none() {
        let a = assembly("A", "a1", 50);
        let b = assembly("B", "b1", 50);
        let al = alignment(50, 10, (0, 0));
        let result = pairwise_comparison(&a, &b, &[al], &settings()).unwrap();
        assert!(result.is_none());
        assert!(pairwise_comparison(&a, &b, &[], &settings()).unwrap().is_none());
    }

    #[test]
    fn test_pairwise_comparison() {
        let a = assembly("A", "a1", 20_000);
        let b = assembly("B", "b1", 20_000);
        let al = alignment(20_000, 100, (9_000, 11_000));
        let result = pairwise_comparison(&a, &b, &[al], &settings()).unwrap().unwrap();

        assert_eq!(result.alignment_count, 1);
        assert_eq!(result.window_size % 100, 0);
        assert!((result.masses.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!((result.aligned_fraction - 1.0).abs() < 1e-12);
        assert_eq!(
            result.window_count,
            result.vertical_window_count + result.horizontal_window_count
        );
        assert!(result.vertical_window_count > 0);

        let record = result.record();
        assert_eq!(record.masses, result.vertical_masses);
        assert_eq!(record.window_size, result.window_size);

        // Regions of each assembly tile its contig
        for regions in [&result.regions_a, &result.regions_b] {
            let (_, r) = &regions[0];
            let total = r.vertical_length() + r.horizontal_length() + r.unaligned_length();
            assert_eq!(total, 20_000);
        }
        assert!(result.estimates.is_some());
    }

    #[test]
    fn test_all_distribution_is_persisted_on_request() {
        let a = assembly("A", "a1", 20_000);
        let b = assembly("B", "b1", 20_000);
        let al = alignment(20_000, 50, (0, 0));
        let mut s = settings();
        s.distribution = DistributionKind::All;
        let result = pairwise_comparison(&a, &b, &[al], &s).unwrap().unwrap();
        assert_eq!(result.record().masses, result.masses);
    }

    #[test]
    fn test_empty_outcome_record() {
        let outcome = PairOutcome {
            assembly_a: "A".to_string(),
            assembly_b: "B".to_string(),
            aligned_fraction: 0.0,
            unaligned_a: Vec::new(),
            unaligned_b: Vec::new(),
            result: None,
        };
        let record = outcome.record();
        assert!(record.masses.is_empty());
        assert_eq!(record.window_size, 0);
    }

    #[test]
    fn test_summarize_record_matches_comparison() {
        let a = assembly("A", "a1", 20_000);
        let b = assembly("B", "b1", 20_000);
        let al = alignment(20_000, 50, (0, 0));
        let s = settings();
        let result = pairwise_comparison(&a, &b, &[al], &s).unwrap().unwrap();
        let summary = summarize_record(&result.record(), &s);
        assert_eq!(summary.estimates, result.estimates);
        assert_eq!(summary.window_size, result.window_size);
        assert_eq!(summary.smoothed.len(), summary.masses.len());

        let empty = summarize_record(&outcome_record(), &s);
        assert!(empty.estimates.is_none());
        assert_eq!(empty.thresholds, Thresholds::default());
    }

    fn outcome_record() -> PairwiseRecord {
        PairwiseRecord {
            assembly_a: "A".to_string(),
            assembly_b: "B".to_string(),
            window_size: 0,
            aligned_fraction: 0.0,
            masses: Vec::new(),
        }
    }
}
