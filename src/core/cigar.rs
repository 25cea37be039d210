// cigar.rs - Expanded CIGAR transforms and contig coordinate mapping

use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub const MATCH: u8 = b'=';
pub const MISMATCH: u8 = b'X';
pub const INSERTION: u8 = b'I';
pub const DELETION: u8 = b'D';

/// How indels are treated before windows are sampled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndelMode {
    /// Drop every insertion/deletion column
    Remove,
    /// Collapse each indel run to a single column
    Compress,
}

impl IndelMode {
    pub fn from_ignore_flag(ignore_indels: bool) -> Self {
        if ignore_indels {
            IndelMode::Remove
        } else {
            IndelMode::Compress
        }
    }

    pub fn apply(&self, trace: &[u8]) -> Vec<u8> {
        match self {
            IndelMode::Remove => remove_indels(trace),
            IndelMode::Compress => compress_indels(trace),
        }
    }

    /// Transform a trace together with its position map. The map has one more
    /// entry than the trace; the trailing entry is always kept.
    pub fn apply_with_positions(&self, trace: &[u8], positions: &[usize]) -> (Vec<u8>, Vec<usize>) {
        debug_assert_eq!(trace.len() + 1, positions.len());
        let mut new_trace = Vec::with_capacity(trace.len());
        let mut new_positions = Vec::with_capacity(positions.len());
        for (i, &op) in trace.iter().enumerate() {
            let keep = match self {
                IndelMode::Remove => !is_indel(op),
                IndelMode::Compress => i == 0 || op != trace[i - 1] || !is_indel(op),
            };
            if keep {
                new_trace.push(op);
                new_positions.push(positions[i]);
            }
        }
        if let Some(&last) = positions.last() {
            new_positions.push(last);
        }
        (new_trace, new_positions)
    }
}

impl FromStr for IndelMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "remove" | "ignore" => Ok(IndelMode::Remove),
            "compress" => Ok(IndelMode::Compress),
            _ => Err(format!("Invalid indel mode: {}. Use: remove, compress", s)),
        }
    }
}

#[inline]
fn is_indel(op: u8) -> bool {
    op == INSERTION || op == DELETION
}

/// Expand a run-length CIGAR (e.g. `10=1X2I`) to one symbol per alignment column
pub fn expand_cigar(cigar: &str) -> Result<Vec<u8>, String> {
    let mut expanded = Vec::new();
    let mut count: usize = 0;
    let mut have_count = false;

    for c in cigar.bytes() {
        if c.is_ascii_digit() {
            count = count
                .checked_mul(10)
                .and_then(|n| n.checked_add((c - b'0') as usize))
                .ok_or_else(|| format!("CIGAR operation length overflow in '{}'", cigar))?;
            have_count = true;
            continue;
        }
        if !have_count {
            return Err(format!("CIGAR operation '{}' has no length in '{}'", c as char, cigar));
        }
        match c {
            MATCH | MISMATCH | INSERTION | DELETION => {
                expanded.extend(std::iter::repeat(c).take(count));
            }
            b'M' => {
                return Err("CIGAR uses 'M' operations - align with --eqx so matches (=) and mismatches (X) are distinguished".to_string());
            }
            _ => return Err(format!("Unsupported CIGAR operation '{}' in '{}'", c as char, cigar)),
        }
        count = 0;
        have_count = false;
    }

    if have_count {
        return Err(format!("CIGAR '{}' ends with a length but no operation", cigar));
    }
    Ok(expanded)
}

pub fn remove_indels(trace: &[u8]) -> Vec<u8> {
    trace.iter().copied().filter(|&op| !is_indel(op)).collect()
}

pub fn compress_indels(trace: &[u8]) -> Vec<u8> {
    let mut compressed = Vec::with_capacity(trace.len());
    for (i, &op) in trace.iter().enumerate() {
        if i > 0 && is_indel(op) && op == trace[i - 1] {
            continue;
        }
        compressed.push(op);
    }
    compressed
}

/// Swap the roles of insertions and deletions, i.e. view the alignment from the
/// other sequence's side.
pub fn swap_insertions_and_deletions(trace: &[u8]) -> Vec<u8> {
    trace
        .iter()
        .map(|&op| match op {
            INSERTION => DELETION,
            DELETION => INSERTION,
            other => other,
        })
        .collect()
}

/// Contig coordinate of every trace column, plus a trailing entry equal to
/// `ref_end`. Coordinates advance on every column except insertions.
pub fn map_positions(trace: &[u8], ref_start: usize, ref_end: usize) -> Result<Vec<usize>, String> {
    let mut positions = Vec::with_capacity(trace.len() + 1);
    let mut pos = ref_start;
    for &op in trace {
        positions.push(pos);
        if op != INSERTION {
            pos += 1;
        }
    }
    if pos != ref_end {
        return Err(format!(
            "CIGAR consumes {} contig bases but the alignment spans {}-{} ({} bases)",
            pos - ref_start,
            ref_start,
            ref_end,
            ref_end.saturating_sub(ref_start)
        ));
    }
    positions.push(ref_end);
    Ok(positions)
}

/// Mismatches plus indel columns in a (transformed) window
pub fn difference_count(window: &[u8]) -> usize {
    window.iter().filter(|&&op| op != MATCH).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_cigar() {
        assert_eq!(expand_cigar("3=1X2I1D").unwrap(), b"===XIID".to_vec());
        assert_eq!(expand_cigar("").unwrap(), Vec::<u8>::new());
        assert_eq!(expand_cigar("12=").unwrap().len(), 12);
        assert!(expand_cigar("5M").is_err());
        assert!(expand_cigar("=").is_err());
        assert!(expand_cigar("5=3").is_err());
        assert!(expand_cigar("4S").is_err());
    }

    #[test]
    fn test_remove_indels() {
        assert_eq!(remove_indels(b"==X=IID=D"), b"==X==".to_vec());
        assert_eq!(remove_indels(b"===="), b"====".to_vec());
        assert_eq!(remove_indels(b"IIDD"), Vec::<u8>::new());
    }

    #[test]
    fn test_compress_indels() {
        assert_eq!(compress_indels(b"==IIII=DDD=X"), b"==I=D=X".to_vec());
        assert_eq!(compress_indels(b"IIDD"), b"ID".to_vec());
        assert_eq!(compress_indels(b"XX=="), b"XX==".to_vec());
    }

    #[test]
    fn test_swap_insertions_and_deletions() {
        assert_eq!(swap_insertions_and_deletions(b"=IXD"), b"=DXI".to_vec());
    }

    #[test]
    fn test_map_positions() {
        let positions = map_positions(b"==I=D=", 10, 15).unwrap();
        assert_eq!(positions, vec![10, 11, 12, 12, 13, 14, 15]);
        assert!(positions.windows(2).all(|w| w[0] <= w[1]));
        assert!(map_positions(b"===", 0, 5).is_err());
    }

    #[test]
    fn test_apply_with_positions() {
        let trace = b"=II=D";
        let positions = map_positions(trace, 0, 3).unwrap();

        let (removed, removed_pos) = IndelMode::Remove.apply_with_positions(trace, &positions);
        assert_eq!(removed, b"==".to_vec());
        assert_eq!(removed_pos, vec![0, 1, 3]);

        let (compressed, compressed_pos) = IndelMode::Compress.apply_with_positions(trace, &positions);
        assert_eq!(compressed, b"=I=D".to_vec());
        assert_eq!(compressed_pos, vec![0, 1, 1, 2, 3]);
    }

    #[test]
    fn test_difference_count() {
        assert_eq!(difference_count(b"=========="), 0);
        assert_eq!(difference_count(b"==X==I==D="), 3);
        // Without indels, removing them changes nothing
        let trace = b"=X==X=";
        assert_eq!(difference_count(&remove_indels(trace)), difference_count(trace));
    }
}
