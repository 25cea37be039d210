// matrix.rs - Pairwise distribution records and the sample distance matrix

use crate::core::correction::Corrections;
use crate::core::estimators::{get_distance_with, DistanceMethod};
use crate::core::settings::SmoothingSettings;
use rayon::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::str::FromStr;

/// Number of leading columns before the masses in a distribution row
pub const RECORD_FIXED_COLUMNS: usize = 4;

/// One persisted pairwise comparison. Empty `masses` means the pair had no
/// aligned windows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairwiseRecord {
    pub assembly_a: String,
    pub assembly_b: String,
    pub window_size: usize,
    pub aligned_fraction: f64,
    pub masses: Vec<f64>,
}

impl PairwiseRecord {
    pub fn distance(&self, method: DistanceMethod, smoothing: &SmoothingSettings) -> Option<f64> {
        if self.masses.is_empty() || self.window_size == 0 {
            return None;
        }
        Some(get_distance_with(&self.masses, self.window_size, method, smoothing))
    }
}

/// Read distribution rows: tab-separated, `#` lines skipped, masses in the
/// trailing columns. Errors name the line and column.
pub fn read_pairwise_records<R: Read>(reader: R, source: &str) -> Result<Vec<PairwiseRecord>, String> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .comment(Some(b'#'))
        .flexible(true)
        .from_reader(reader);

    let mut records = Vec::new();
    for result in csv_reader.records() {
        let row = result.map_err(|e| format!("Failed to read {}: {}", source, e))?;
        let line = row.position().map(|p| p.line()).unwrap_or(0);
        if row.len() == 1 && row.get(0).map_or(true, |f| f.trim().is_empty()) {
            continue;
        }
        if row.len() < RECORD_FIXED_COLUMNS {
            return Err(format!(
                "{} line {}: expected at least {} columns, found {}",
                source,
                line,
                RECORD_FIXED_COLUMNS,
                row.len()
            ));
        }

        let field = |column: usize| row.get(column).unwrap_or("").trim();
        let window_size = field(2).parse::<usize>().map_err(|_| {
            format!("{} line {} column 3: could not convert '{}' to a window size", source, line, field(2))
        })?;
        let aligned_fraction = field(3).parse::<f64>().map_err(|_| {
            format!("{} line {} column 4: could not convert '{}' to a number", source, line, field(3))
        })?;

        let mut masses = Vec::with_capacity(row.len() - RECORD_FIXED_COLUMNS);
        for column in RECORD_FIXED_COLUMNS..row.len() {
            let value = field(column);
            if value.is_empty() && column + 1 == row.len() {
                break;
            }
            let mass = value.parse::<f64>().map_err(|_| {
                format!("{} line {} column {}: could not convert '{}' to a number", source, line, column + 1, value)
            })?;
            masses.push(mass);
        }

        records.push(PairwiseRecord {
            assembly_a: field(0).to_string(),
            assembly_b: field(1).to_string(),
            window_size,
            aligned_fraction,
            masses,
        });
    }
    Ok(records)
}

pub fn load_pairwise_records(path: &Path) -> Result<Vec<PairwiseRecord>, String> {
    let file = File::open(path)
        .map_err(|e| format!("Failed to open pairwise results {}: {}", path.display(), e))?;
    read_pairwise_records(BufReader::new(file), &path.display().to_string())
}

/// How repeated records for the same ordered pair are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MultiPolicy {
    First,
    Low,
    High,
}

impl MultiPolicy {
    /// Whether a repeated record replaces the one already kept. Ties keep
    /// the existing record.
    pub fn prefers_new(&self, existing: Option<f64>, new: Option<f64>) -> bool {
        match (self, existing, new) {
            (MultiPolicy::First, _, _) => false,
            (_, _, None) => false,
            (_, None, Some(_)) => true,
            (MultiPolicy::Low, Some(e), Some(n)) => n < e,
            (MultiPolicy::High, Some(e), Some(n)) => n > e,
        }
    }

    pub fn combine(&self, existing: Option<f64>, new: Option<f64>) -> Option<f64> {
        if self.prefers_new(existing, new) {
            new
        } else {
            existing
        }
    }

    pub fn description(&self) -> &str {
        match self {
            MultiPolicy::First => "first value",
            MultiPolicy::Low => "lowest value",
            MultiPolicy::High => "highest value",
        }
    }
}

impl FromStr for MultiPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "first" => Ok(MultiPolicy::First),
            "low" => Ok(MultiPolicy::Low),
            "high" => Ok(MultiPolicy::High),
            _ => Err(format!("Invalid multi policy: {}. Use: first, low, high", s)),
        }
    }
}

impl fmt::Display for MultiPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MultiPolicy::First => "first",
            MultiPolicy::Low => "low",
            MultiPolicy::High => "high",
        };
        write!(f, "{}", name)
    }
}

/// Square matrix of directed distances over sorted sample names. Cells are
/// addressed by integer sample id; `None` is a missing distance.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    names: Vec<String>,
    index: HashMap<String, usize>,
    distances: Vec<Option<f64>>,
    aligned_fractions: Vec<Option<f64>>,
}

impl DistanceMatrix {
    pub fn new<I: IntoIterator<Item = String>>(names: I) -> Self {
        let mut names: Vec<String> = names.into_iter().collect();
        names.sort();
        names.dedup();
        let index = names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.clone(), i))
            .collect();
        let n = names.len();
        Self {
            names,
            index,
            distances: vec![None; n * n],
            aligned_fractions: vec![None; n * n],
        }
    }

    /// Build from pairwise records: one distance per record with `method`,
    /// zero self-distances, and a completeness check over all ordered pairs.
    pub fn from_records(
        records: &[PairwiseRecord],
        method: DistanceMethod,
        smoothing: &SmoothingSettings,
        multi: MultiPolicy,
        source: &str,
    ) -> Result<Self, String> {
        let mut matrix = Self::new(
            records
                .iter()
                .flat_map(|r| [r.assembly_a.clone(), r.assembly_b.clone()]),
        );

        let distances: Vec<Option<f64>> = records
            .par_iter()
            .map(|r| r.distance(method, smoothing))
            .collect();

        let n = matrix.len();
        let mut filled = vec![false; n * n];
        for (record, distance) in records.iter().zip(distances) {
            let (a, b) = match (matrix.id(&record.assembly_a), matrix.id(&record.assembly_b)) {
                (Some(a), Some(b)) => (a, b),
                _ => continue,
            };
            let cell = a * n + b;
            // distance and aligned fraction always come from the same record
            if !filled[cell] || multi.prefers_new(matrix.distances[cell], distance) {
                matrix.distances[cell] = distance;
                matrix.aligned_fractions[cell] = Some(record.aligned_fraction);
                filled[cell] = true;
            }
        }

        for i in 0..n {
            let cell = i * n + i;
            matrix.distances[cell] = Some(0.0);
            matrix.aligned_fractions[cell] = Some(1.0);
            filled[cell] = true;
        }

        let filled_count = filled.iter().filter(|&&f| f).count();
        if filled_count != n * n {
            return Err(format!(
                "Incorrect number of records in {}: found {} of {} sample pairs - rerun vdist pairwise",
                source,
                filled_count,
                n * n
            ));
        }
        Ok(matrix)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn id(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn get(&self, a: usize, b: usize) -> Option<f64> {
        self.distances[a * self.len() + b]
    }

    pub fn aligned_fraction(&self, a: usize, b: usize) -> Option<f64> {
        self.aligned_fractions[a * self.len() + b]
    }

    pub fn distance(&self, a: &str, b: &str) -> Option<f64> {
        self.get(self.id(a)?, self.id(b)?)
    }

    pub fn set(&mut self, a: usize, b: usize, distance: Option<f64>, aligned_fraction: Option<f64>) {
        let n = self.len();
        self.distances[a * n + b] = distance;
        self.aligned_fractions[a * n + b] = aligned_fraction;
    }

    /// Row `a` of the matrix, one entry per sample id
    pub fn row(&self, a: usize) -> &[Option<f64>] {
        let n = self.len();
        &self.distances[a * n..(a + 1) * n]
    }

    pub fn missing_count(&self) -> usize {
        self.distances.iter().filter(|d| d.is_none()).count()
    }

    pub fn apply_corrections(&mut self, corrections: Corrections) {
        if corrections.is_none() {
            return;
        }
        for (d, af) in self.distances.iter_mut().zip(self.aligned_fractions.iter()) {
            *d = corrections.apply(*d, *af);
        }
    }

    /// Make `d(a,b) == d(b,a)`: the mean when both are present, the present
    /// value when only one is
    pub fn symmetrize(&mut self) {
        let n = self.len();
        for a in 0..n {
            for b in (a + 1)..n {
                let combined = match (self.distances[a * n + b], self.distances[b * n + a]) {
                    (Some(x), Some(y)) => Some((x + y) / 2.0),
                    (Some(x), None) | (None, Some(x)) => Some(x),
                    (None, None) => None,
                };
                self.distances[a * n + b] = combined;
                self.distances[b * n + a] = combined;
            }
        }
    }

    /// Sub-matrix of the samples passing the filters. Every explicitly
    /// listed name must exist.
    pub fn filter_samples(
        &self,
        include: Option<&Regex>,
        exclude: Option<&Regex>,
        names: Option<&[String]>,
    ) -> Result<Self, String> {
        if let Some(names) = names {
            if let Some(missing) = names.iter().find(|n| self.id(n).is_none()) {
                return Err(format!("Could not find sample '{}' in the pairwise results", missing));
            }
        }

        let kept: Vec<String> = self
            .names
            .iter()
            .filter(|name| include.map_or(true, |re| re.is_match(name.as_str())))
            .filter(|name| exclude.map_or(true, |re| !re.is_match(name.as_str())))
            .filter(|name| names.map_or(true, |list| list.contains(*name)))
            .cloned()
            .collect();
        if kept.is_empty() {
            return Err("No samples left after applying sample filters".to_string());
        }

        let mut filtered = Self::new(kept);
        let n = filtered.len();
        for a in 0..n {
            let old_a = self.id(&filtered.names[a]).unwrap_or_default();
            for b in 0..n {
                let old_b = self.id(&filtered.names[b]).unwrap_or_default();
                let cell = a * n + b;
                filtered.distances[cell] = self.get(old_a, old_b);
                filtered.aligned_fractions[cell] = self.aligned_fraction(old_a, old_b);
            }
        }
        Ok(filtered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn two_sample_matrix(ab: Option<f64>, ba: Option<f64>) -> DistanceMatrix {
        let mut m = DistanceMatrix::new(vec!["a".to_string(), "b".to_string()]);
        m.set(0, 0, Some(0.0), Some(1.0));
        m.set(0, 1, ab, Some(0.8));
        m.set(1, 0, ba, Some(0.9));
        m.set(1, 1, Some(0.0), Some(1.0));
        m
    }

    fn record(a: &str, b: &str, masses: Vec<f64>) -> PairwiseRecord {
        PairwiseRecord {
            assembly_a: a.to_string(),
            assembly_b: b.to_string(),
            window_size: 10,
            aligned_fraction: 0.9,
            masses,
        }
    }

    #[test]
    fn test_read_pairwise_records() {
        let text = "# vdist pairwise\n# assembly_a\tassembly_b\twindow_size\taligned_fraction\tmasses\n\
                    a\tb\t100\t0.95\t0.5\t0.25\t0.25\n\
                    b\ta\t100\t0.9\n";
        let records = read_pairwise_records(text.as_bytes(), "test.tsv").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].assembly_a, "a");
        assert_eq!(records[0].window_size, 100);
        assert_eq!(records[0].masses, vec![0.5, 0.25, 0.25]);
        assert!(records[1].masses.is_empty());
        assert_eq!(records[1].distance(DistanceMethod::Mean, &SmoothingSettings::default()), None);
    }

    #[test]
    fn test_read_pairwise_records_reports_bad_field() {
        let text = "a\tb\t100\t0.95\t0.5\tnot_a_num\n";
        let err = read_pairwise_records(text.as_bytes(), "test.tsv").unwrap_err();
        assert!(err.contains("line 1 column 6"), "{}", err);
        assert!(err.contains("could not convert"));

        let err = read_pairwise_records("a\tb\n".as_bytes(), "test.tsv").unwrap_err();
        assert!(err.contains("columns"));
    }

    #[test]
    fn test_corrections_on_matrix() {
        let mut m = two_sample_matrix(Some(0.2), Some(0.1));
        m.apply_corrections("none".parse().unwrap());
        assert_eq!(m.distance("a", "b"), Some(0.2));

        let mut m = two_sample_matrix(Some(0.2), Some(0.1));
        m.apply_corrections("jukescantor".parse().unwrap());
        assert_relative_eq!(m.distance("a", "b").unwrap(), 0.23261619622788, epsilon = 1e-10);
        assert_relative_eq!(m.distance("b", "a").unwrap(), 0.107325632730505, epsilon = 1e-10);
        assert_eq!(m.distance("a", "a"), Some(0.0));

        let mut m = two_sample_matrix(Some(0.2), Some(0.1));
        m.apply_corrections("alignedfrac".parse().unwrap());
        assert_relative_eq!(m.distance("a", "b").unwrap(), 0.2 / 0.8, epsilon = 1e-12);
        assert_relative_eq!(m.distance("b", "a").unwrap(), 0.1 / 0.9, epsilon = 1e-12);
        assert_eq!(m.distance("b", "b"), Some(0.0));

        let mut m = two_sample_matrix(Some(0.2), None);
        m.apply_corrections("jukescantor,alignedfrac".parse().unwrap());
        assert_relative_eq!(m.distance("a", "b").unwrap(), 0.23261619622788 / 0.8, epsilon = 1e-10);
        assert_eq!(m.distance("b", "a"), None);
    }

    #[test]
    fn test_symmetrize() {
        let mut m = two_sample_matrix(Some(0.2), Some(0.1));
        m.symmetrize();
        assert_relative_eq!(m.distance("a", "b").unwrap(), 0.15, epsilon = 1e-12);
        assert_relative_eq!(m.distance("b", "a").unwrap(), 0.15, epsilon = 1e-12);
        assert_eq!(m.distance("a", "a"), Some(0.0));

        let mut m = two_sample_matrix(None, Some(0.1));
        m.symmetrize();
        assert_eq!(m.distance("a", "b"), Some(0.1));
        assert_eq!(m.distance("b", "a"), Some(0.1));

        let mut m = two_sample_matrix(Some(0.2), None);
        m.symmetrize();
        assert_eq!(m.distance("b", "a"), Some(0.2));

        let mut m = two_sample_matrix(None, None);
        m.symmetrize();
        assert_eq!(m.distance("a", "b"), None);
        assert_eq!(m.distance("b", "a"), None);
        assert_eq!(m.distance("b", "b"), Some(0.0));
    }

    #[test]
    fn test_from_records() {
        let records = vec![
            record("b", "a", vec![0.0, 1.0]),
            record("a", "b", vec![1.0]),
        ];
        let settings = SmoothingSettings::default();
        let m = DistanceMatrix::from_records(&records, DistanceMethod::Mean, &settings, MultiPolicy::First, "t")
            .unwrap();
        assert_eq!(m.names(), &["a".to_string(), "b".to_string()]);
        assert_relative_eq!(m.distance("b", "a").unwrap(), 0.1, epsilon = 1e-12);
        assert_eq!(m.distance("a", "b"), Some(0.0));
        assert_eq!(m.distance("a", "a"), Some(0.0));
        assert_eq!(m.aligned_fraction(1, 0), Some(0.9));
    }

    #[test]
    fn test_from_records_size_mismatch() {
        let records = vec![
            record("a", "b", vec![1.0]),
            record("a", "c", vec![1.0]),
        ];
        let err = DistanceMatrix::from_records(
            &records,
            DistanceMethod::Mean,
            &SmoothingSettings::default(),
            MultiPolicy::First,
            "pairs.tsv",
        )
        .unwrap_err();
        assert!(err.contains("rerun vdist pairwise"), "{}", err);
    }

    #[test]
    fn test_multi_policy() {
        assert_eq!(MultiPolicy::First.combine(Some(0.4), Some(0.3)), Some(0.4));
        assert_eq!(MultiPolicy::First.combine(Some(0.4), Some(0.5)), Some(0.4));
        assert_eq!(MultiPolicy::Low.combine(Some(0.4), Some(0.3)), Some(0.3));
        assert_eq!(MultiPolicy::Low.combine(Some(0.4), Some(0.5)), Some(0.4));
        assert_eq!(MultiPolicy::High.combine(Some(0.4), Some(0.3)), Some(0.4));
        assert_eq!(MultiPolicy::High.combine(Some(0.4), Some(0.5)), Some(0.5));
        assert_eq!(MultiPolicy::High.combine(None, Some(0.5)), Some(0.5));
        assert!("bad".parse::<MultiPolicy>().is_err());
    }

    #[test]
    fn test_repeated_pair_keeps_aligned_fraction_of_chosen_record() {
        let with_af = |a: &str, b: &str, masses: Vec<f64>, af: f64| PairwiseRecord {
            window_size: 100,
            aligned_fraction: af,
            ..record(a, b, masses)
        };
        let records = vec![
            with_af("a", "b", vec![0.0, 0.0, 0.0, 0.0, 1.0], 0.5),
            with_af("a", "b", vec![0.0, 1.0], 1.0),
            with_af("b", "a", vec![0.0, 1.0], 1.0),
        ];
        let smoothing = SmoothingSettings::default();

        let mut low =
            DistanceMatrix::from_records(&records, DistanceMethod::Mean, &smoothing, MultiPolicy::Low, "t").unwrap();
        assert_relative_eq!(low.distance("a", "b").unwrap(), 0.01, epsilon = 1e-12);
        assert_eq!(low.aligned_fraction(0, 1), Some(1.0));
        low.apply_corrections("alignedfrac".parse().unwrap());
        assert_relative_eq!(low.distance("a", "b").unwrap(), 0.01, epsilon = 1e-12);

        let mut first =
            DistanceMatrix::from_records(&records, DistanceMethod::Mean, &smoothing, MultiPolicy::First, "t").unwrap();
        assert_eq!(first.aligned_fraction(0, 1), Some(0.5));
        first.apply_corrections("alignedfrac".parse().unwrap());
        assert_relative_eq!(first.distance("a", "b").unwrap(), 0.08, epsilon = 1e-12);

        let high =
            DistanceMatrix::from_records(&records, DistanceMethod::Mean, &smoothing, MultiPolicy::High, "t").unwrap();
        assert_relative_eq!(high.distance("a", "b").unwrap(), 0.04, epsilon = 1e-12);
        assert_eq!(high.aligned_fraction(0, 1), Some(0.5));
    }

    #[test]
    fn test_filter_samples() {
        let mut m = DistanceMatrix::new(["a", "b", "c", "d"].iter().map(|s| s.to_string()));
        for a in 0..4 {
            for b in 0..4 {
                m.set(a, b, Some((a * 10 + b) as f64), Some(1.0));
            }
        }
        let names = vec!["d".to_string(), "b".to_string()];
        let filtered = m.filter_samples(None, None, Some(&names)).unwrap();
        assert_eq!(filtered.names(), &["b".to_string(), "d".to_string()]);
        assert_eq!(filtered.distance("d", "b"), Some(31.0));

        let include = Regex::new("^[abc]$").unwrap();
        let exclude = Regex::new("b").unwrap();
        let filtered = m.filter_samples(Some(&include), Some(&exclude), None).unwrap();
        assert_eq!(filtered.names(), &["a".to_string(), "c".to_string()]);
        assert_eq!(filtered.distance("c", "a"), Some(20.0));

        let missing = vec!["q".to_string()];
        assert!(m.filter_samples(None, None, Some(&missing)).unwrap_err().contains("Could not find sample"));
        let none = Regex::new("^z").unwrap();
        assert!(m.filter_samples(Some(&none), None, None).is_err());
    }
}
