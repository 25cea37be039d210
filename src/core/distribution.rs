// distribution.rs - Mass distributions and alignment coverage

use std::collections::HashMap;

/// Fraction of windows at each difference count, `0..=max_sample`.
/// An empty sample set has no distribution and is reported as an error.
pub fn build_masses(samples: &[usize], max_sample: usize) -> Result<Vec<f64>, String> {
    if samples.is_empty() {
        return Err("No windows were sampled - cannot build a distance distribution".to_string());
    }
    let mut counts = vec![0usize; max_sample + 1];
    for &s in samples {
        if s > max_sample {
            return Err(format!("Window difference count {} exceeds the maximum {}", s, max_sample));
        }
        counts[s] += 1;
    }
    let total = samples.len() as f64;
    Ok(counts.into_iter().map(|c| c as f64 / total).collect())
}

/// Merge overlapping or touching half-open intervals
pub fn coalesce_ranges(mut ranges: Vec<(usize, usize)>) -> Vec<(usize, usize)> {
    ranges.retain(|(start, end)| end > start);
    ranges.sort_unstable();
    let mut merged: Vec<(usize, usize)> = Vec::with_capacity(ranges.len());
    for (start, end) in ranges {
        match merged.last_mut() {
            Some(last) if start <= last.1 => last.1 = last.1.max(end),
            _ => merged.push((start, end)),
        }
    }
    merged
}

/// Union of aligned ranges (per contig) divided by the assembly length
pub fn aligned_fraction<'a, I>(ranges: I, total_length: usize) -> f64
where
    I: IntoIterator<Item = (&'a str, usize, usize)>,
{
    if total_length == 0 {
        return 0.0;
    }
    let mut per_contig: HashMap<&str, Vec<(usize, usize)>> = HashMap::new();
    for (contig, start, end) in ranges {
        per_contig.entry(contig).or_default().push((start, end));
    }
    let aligned: usize = per_contig
        .into_values()
        .map(|r| coalesce_ranges(r).iter().map(|(s, e)| e - s).sum::<usize>())
        .sum();
    aligned as f64 / total_length as f64
}

/// Average per-base identity implied by a distribution
pub fn mean_identity(masses: &[f64], window_size: usize) -> f64 {
    if window_size == 0 {
        return 0.0;
    }
    1.0 - crate::core::estimators::mean(masses) / window_size as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_build_masses() {
        let masses = build_masses(&[0, 0, 1, 3], 3).unwrap();
        assert_eq!(masses.len(), 4);
        assert_relative_eq!(masses[0], 0.5, epsilon = 1e-12);
        assert_relative_eq!(masses[1], 0.25, epsilon = 1e-12);
        assert_relative_eq!(masses[2], 0.0, epsilon = 1e-12);
        assert_relative_eq!(masses[3], 0.25, epsilon = 1e-12);
        assert_relative_eq!(masses.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_build_masses_without_samples() {
        assert!(build_masses(&[], 0).is_err());
    }

    #[test]
    fn test_coalesce_ranges() {
        assert_eq!(coalesce_ranges(vec![(5, 10), (0, 3), (2, 6), (12, 15), (15, 16)]), vec![(0, 10), (12, 16)]);
        assert_eq!(coalesce_ranges(vec![(4, 4)]), vec![]);
    }

    #[test]
    fn test_aligned_fraction_merges_overlaps() {
        let ranges = vec![("c1", 0, 50), ("c1", 25, 75), ("c2", 0, 25), ("c2", 10, 20)];
        assert_relative_eq!(aligned_fraction(ranges, 200), 0.5, epsilon = 1e-12);
        assert_relative_eq!(aligned_fraction(Vec::new(), 200), 0.0, epsilon = 1e-12);
        assert_relative_eq!(aligned_fraction(vec![("c1", 0, 10)], 0), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_mean_identity() {
        assert_relative_eq!(mean_identity(&[0.0, 0.5, 0.5], 100), 0.985, epsilon = 1e-12);
        assert_relative_eq!(mean_identity(&[1.0], 100), 1.0, epsilon = 1e-12);
    }
}
