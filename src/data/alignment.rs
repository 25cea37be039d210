// alignment.rs - PAF alignment records between two assemblies

use crate::core::cigar::{expand_cigar, swap_insertions_and_deletions, DELETION, INSERTION};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Which side of an alignment a sequence sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// Assembly A, the PAF query
    Query,
    /// Assembly B, the PAF target
    Target,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strand {
    Forward,
    Reverse,
}

/// One alignment record. `trace` is stored relative to the query: `D` marks
/// a query base missing from the target and `I` a target base missing from
/// the query, so query coordinates advance on every symbol except `I`.
#[derive(Debug, Clone, PartialEq)]
pub struct Alignment {
    pub query_name: String,
    pub query_length: usize,
    pub query_start: usize,
    pub query_end: usize,
    pub strand: Strand,
    pub target_name: String,
    pub target_length: usize,
    pub target_start: usize,
    pub target_end: usize,
    pub trace: Vec<u8>,
}

fn parse_field(fields: &[&str], index: usize, name: &str) -> Result<usize, String> {
    let value = fields
        .get(index)
        .ok_or_else(|| format!("missing {} column", name))?;
    value
        .parse::<usize>()
        .map_err(|_| format!("invalid {} '{}'", name, value))
}

impl Alignment {
    /// Parse one PAF line. The CIGAR comes from the `cg:Z:` tag and must use
    /// `=`/`X` operations.
    pub fn from_paf_line(line: &str) -> Result<Self, String> {
        let fields: Vec<&str> = line.trim_end().split('\t').collect();
        if fields.len() < 12 {
            return Err(format!("expected at least 12 columns, found {}", fields.len()));
        }

        let strand = match fields[4] {
            "+" => Strand::Forward,
            "-" => Strand::Reverse,
            other => return Err(format!("invalid strand '{}'", other)),
        };
        let cigar = fields[12..]
            .iter()
            .find_map(|f| f.strip_prefix("cg:Z:"))
            .ok_or("missing cg:Z: CIGAR tag")?;

        // minimap2's I consumes the query
        let trace = swap_insertions_and_deletions(&expand_cigar(cigar)?);

        let alignment = Self {
            query_name: fields[0].to_string(),
            query_length: parse_field(&fields, 1, "query length")?,
            query_start: parse_field(&fields, 2, "query start")?,
            query_end: parse_field(&fields, 3, "query end")?,
            strand,
            target_name: fields[5].to_string(),
            target_length: parse_field(&fields, 6, "target length")?,
            target_start: parse_field(&fields, 7, "target start")?,
            target_end: parse_field(&fields, 8, "target end")?,
            trace,
        };
        alignment.validate()?;
        Ok(alignment)
    }

    fn validate(&self) -> Result<(), String> {
        if self.query_start > self.query_end || self.query_end > self.query_length {
            return Err(format!(
                "query range {}-{} is invalid for length {}",
                self.query_start, self.query_end, self.query_length
            ));
        }
        if self.target_start > self.target_end || self.target_end > self.target_length {
            return Err(format!(
                "target range {}-{} is invalid for length {}",
                self.target_start, self.target_end, self.target_length
            ));
        }
        let query_consumed = self.trace.iter().filter(|&&op| op != INSERTION).count();
        let target_consumed = self.trace.iter().filter(|&&op| op != DELETION).count();
        if query_consumed != self.query_end - self.query_start {
            return Err(format!(
                "CIGAR covers {} query bases but the record spans {}",
                query_consumed,
                self.query_end - self.query_start
            ));
        }
        if target_consumed != self.target_end - self.target_start {
            return Err(format!(
                "CIGAR covers {} target bases but the record spans {}",
                target_consumed,
                self.target_end - self.target_start
            ));
        }
        Ok(())
    }

    /// Contig name and span on one side
    pub fn span(&self, orientation: Orientation) -> (&str, usize, usize) {
        match orientation {
            Orientation::Query => (self.query_name.as_str(), self.query_start, self.query_end),
            Orientation::Target => (self.target_name.as_str(), self.target_start, self.target_end),
        }
    }

    /// The trace as seen from one side, running forward along that side's
    /// contig. Only `I` holds that side's coordinate still.
    pub fn trace_for(&self, orientation: Orientation) -> Vec<u8> {
        match orientation {
            Orientation::Query => match self.strand {
                Strand::Forward => self.trace.clone(),
                Strand::Reverse => self.trace.iter().rev().copied().collect(),
            },
            Orientation::Target => swap_insertions_and_deletions(&self.trace),
        }
    }
}

/// Parse PAF records, skipping blank lines. Errors name the offending line.
pub fn read_paf<R: BufRead>(reader: R, source: &str) -> Result<Vec<Alignment>, String> {
    let mut alignments = Vec::new();
    for (line_num, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| format!("Failed to read {} line {}: {}", source, line_num + 1, e))?;
        if line.trim().is_empty() {
            continue;
        }
        let alignment = Alignment::from_paf_line(&line)
            .map_err(|e| format!("Invalid alignment in {} line {}: {}", source, line_num + 1, e))?;
        alignments.push(alignment);
    }
    Ok(alignments)
}

pub fn load_paf(path: &Path) -> Result<Vec<Alignment>, String> {
    let file = File::open(path)
        .map_err(|e| format!("Failed to open alignment file {}: {}", path.display(), e))?;
    read_paf(BufReader::new(file), &path.display().to_string())
}

/// Location of the alignments of `a` (query) against `b` (target)
pub fn pair_alignment_path(dir: &Path, a: &str, b: &str) -> PathBuf {
    dir.join(format!("{}_vs_{}.paf", a, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paf(strand: &str, cigar: &str, q: (usize, usize), t: (usize, usize)) -> String {
        format!(
            "q1\t100\t{}\t{}\t{}\tt1\t120\t{}\t{}\t9\t12\t60\tNM:i:1\tcg:Z:{}",
            q.0, q.1, strand, t.0, t.1, cigar
        )
    }

    #[test]
    fn test_parse_swaps_minimap2_indels() {
        // 2I consumes two query bases in minimap2 terms
        let a = Alignment::from_paf_line(&paf("+", "5=2I1X3D", (10, 18), (20, 29))).unwrap();
        assert_eq!(a.trace, b"=====DDXIII".to_vec());
        assert_eq!(a.strand, Strand::Forward);
        assert_eq!(a.span(Orientation::Query), ("q1", 10, 18));
        assert_eq!(a.span(Orientation::Target), ("t1", 20, 29));
        assert_eq!(a.trace_for(Orientation::Target), b"=====IIXDDD".to_vec());
    }

    #[test]
    fn test_reverse_strand_query_trace_is_reversed() {
        let a = Alignment::from_paf_line(&paf("-", "2=1X1I", (0, 4), (0, 3))).unwrap();
        assert_eq!(a.trace, b"==XD".to_vec());
        assert_eq!(a.trace_for(Orientation::Query), b"DX==".to_vec());
    }

    #[test]
    fn test_length_mismatch_is_rejected() {
        let err = Alignment::from_paf_line(&paf("+", "5=", (0, 6), (0, 5))).unwrap_err();
        assert!(err.contains("query"));
        assert!(Alignment::from_paf_line(&paf("+", "5M", (0, 5), (0, 5))).is_err());
    }

    #[test]
    fn test_missing_cigar_tag() {
        let line = "q1\t100\t0\t5\t+\tt1\t100\t0\t5\t5\t5\t60\tNM:i:0";
        assert!(Alignment::from_paf_line(line).unwrap_err().contains("cg:Z:"));
    }

    #[test]
    fn test_read_paf_reports_line() {
        let text = format!("{}\n\nbad line\n", paf("+", "5=", (0, 5), (0, 5)));
        let err = read_paf(text.as_bytes(), "pair.paf").unwrap_err();
        assert!(err.contains("pair.paf line 3"), "{}", err);

        let ok = read_paf(paf("+", "5=", (0, 5), (0, 5)).as_bytes(), "pair.paf").unwrap();
        assert_eq!(ok.len(), 1);
    }

    #[test]
    fn test_pair_alignment_path() {
        let p = pair_alignment_path(Path::new("aln"), "s1", "s2");
        assert_eq!(p, PathBuf::from("aln/s1_vs_s2.paf"));
    }
}
