// mask.rs - Mask horizontal and unaligned regions in a pseudo-alignment

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

pub const VERTICAL_COLUMN: &str = "assembly_a_vertical_regions";
pub const HORIZONTAL_COLUMN: &str = "assembly_a_horizontal_regions";
pub const UNALIGNED_COLUMN: &str = "assembly_a_unaligned_regions";

const GAP: u8 = b'-';

/// Regions of the reference, as seen from its comparison with one sample
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceRegions {
    pub vertical: Vec<(usize, usize)>,
    pub horizontal: Vec<(usize, usize)>,
    pub unaligned: Vec<(usize, usize)>,
}

impl ReferenceRegions {
    fn end(&self) -> usize {
        self.vertical
            .iter()
            .chain(&self.horizontal)
            .chain(&self.unaligned)
            .map(|&(_, e)| e)
            .max()
            .unwrap_or(0)
    }
}

/// Reference-to-sample regions loaded from a regions table
#[derive(Debug, Clone)]
pub struct RegionsTable {
    pub reference: String,
    pub reference_length: usize,
    /// Keyed by the sample compared against the reference
    pub samples: BTreeMap<String, ReferenceRegions>,
    /// Every sample named in the table except the reference
    pub all_samples: Vec<String>,
    /// The reference was the table's only `assembly_a`, not given by name
    pub reference_detected: bool,
}

/// Replacement characters; `None` leaves that region class untouched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaskSettings {
    pub h_char: Option<u8>,
    pub u_char: Option<u8>,
    pub exclude_invariant: bool,
}

impl Default for MaskSettings {
    fn default() -> Self {
        Self {
            h_char: Some(b'N'),
            u_char: Some(GAP),
            exclude_invariant: false,
        }
    }
}

/// Parse a mask character option: one ASCII character, or `none`
pub fn parse_mask_char(s: &str) -> Result<Option<u8>, String> {
    if s.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    match s.as_bytes() {
        [c] if c.is_ascii_graphic() => Ok(Some(*c)),
        _ => Err(format!("Mask character must be a single character or 'none', got '{}'", s)),
    }
}

/// `contig:start-end` to its parts
pub fn parse_region(region: &str) -> Result<(String, usize, usize), String> {
    let (contig, range) = region
        .rsplit_once(':')
        .ok_or_else(|| format!("Invalid region '{}': expected contig:start-end", region))?;
    let (start, end) = range
        .split_once('-')
        .ok_or_else(|| format!("Invalid region '{}': expected contig:start-end", region))?;
    let start = start
        .parse::<usize>()
        .map_err(|_| format!("Invalid region start in '{}'", region))?;
    let end = end
        .parse::<usize>()
        .map_err(|_| format!("Invalid region end in '{}'", region))?;
    if end < start {
        return Err(format!("Region '{}' ends before it starts", region));
    }
    Ok((contig.to_string(), start, end))
}

fn column_index(headers: &csv::StringRecord, name: &str, source: &str) -> Result<usize, String> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| format!("Could not find a '{}' column in {}", name, source))
}

fn parse_region_lists(
    fields: [&str; 3],
    line: u64,
    source: &str,
) -> Result<ReferenceRegions, String> {
    let mut contig_names = BTreeSet::new();
    let mut lists: [Vec<(usize, usize)>; 3] = Default::default();
    for (list, field) in lists.iter_mut().zip(fields) {
        for region in field.split(',').filter(|r| !r.is_empty()) {
            let (contig, start, end) =
                parse_region(region).map_err(|e| format!("{} line {}: {}", source, line, e))?;
            contig_names.insert(contig);
            list.push((start, end));
        }
    }
    if contig_names.len() > 1 {
        let names: Vec<String> = contig_names.into_iter().collect();
        return Err(format!(
            "Reference genome has more than one contig name ({})",
            names.join(", ")
        ));
    }

    let mut all: Vec<(usize, usize)> = lists.iter().flatten().copied().collect();
    all.sort_unstable();
    let mut expected_start = 0;
    for &(start, end) in &all {
        if start != expected_start {
            return Err(format!(
                "{} line {}: regions do not tile the reference (gap or overlap at {})",
                source, line, expected_start
            ));
        }
        expected_start = end;
    }

    let [vertical, horizontal, unaligned] = lists;
    Ok(ReferenceRegions { vertical, horizontal, unaligned })
}

/// Load the rows whose `assembly_a` is the reference. Without an explicit
/// reference, the table must name exactly one `assembly_a`.
pub fn read_regions_table<R: Read>(
    reader: R,
    source: &str,
    reference: Option<&str>,
) -> Result<RegionsTable, String> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .comment(Some(b'#'))
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|e| format!("Failed to read header of {}: {}", source, e))?
        .clone();
    if headers.get(0) != Some("assembly_a") || headers.get(1) != Some("assembly_b") {
        return Err(format!(
            "The first two columns of {} are not labelled assembly_a and assembly_b",
            source
        ));
    }
    let v_col = column_index(&headers, VERTICAL_COLUMN, source)?;
    let h_col = column_index(&headers, HORIZONTAL_COLUMN, source)?;
    let u_col = column_index(&headers, UNALIGNED_COLUMN, source)?;

    let mut rows = Vec::new();
    for result in csv_reader.records() {
        let row = result.map_err(|e| format!("Failed to read {}: {}", source, e))?;
        rows.push(row);
    }

    let a_names: BTreeSet<&str> = rows.iter().filter_map(|r| r.get(0)).collect();
    let reference_detected = reference.is_none();
    let reference = match reference {
        Some(r) => r.to_string(),
        None if a_names.len() == 1 => a_names.iter().next().copied().unwrap_or_default().to_string(),
        None => {
            return Err(
                "Could not automatically determine the reference name, please specify one with --reference"
                    .to_string(),
            )
        }
    };

    let mut all_samples = BTreeSet::new();
    let mut samples = BTreeMap::new();
    for row in &rows {
        let (a, b) = (row.get(0).unwrap_or(""), row.get(1).unwrap_or(""));
        all_samples.insert(a.to_string());
        all_samples.insert(b.to_string());
        if a != reference {
            continue;
        }
        let line = row.position().map(|p| p.line()).unwrap_or(0);
        let fields = [
            row.get(v_col).unwrap_or(""),
            row.get(h_col).unwrap_or(""),
            row.get(u_col).unwrap_or(""),
        ];
        samples.insert(b.to_string(), parse_region_lists(fields, line, source)?);
    }
    if samples.is_empty() {
        return Err(format!(
            "No reference-to-assembly comparisons found in {} - is the reference name ({}) correct?",
            source, reference
        ));
    }

    let lengths: BTreeSet<usize> = samples.values().map(|r| r.end()).collect();
    if lengths.len() > 1 {
        return Err("Multiple inconsistent reference sequence lengths".to_string());
    }
    let reference_length = lengths.into_iter().next().unwrap_or(0);

    all_samples.remove(&reference);
    Ok(RegionsTable {
        reference,
        reference_length,
        samples,
        all_samples: all_samples.into_iter().collect(),
        reference_detected,
    })
}

pub fn load_regions_table(path: &Path, reference: Option<&str>) -> Result<RegionsTable, String> {
    let file = File::open(path)
        .map_err(|e| format!("Failed to open regions file {}: {}", path.display(), e))?;
    read_regions_table(BufReader::new(file), &path.display().to_string(), reference)
}

/// Alignment column of every reference position, plus a trailing entry for
/// the reference end. Gaps in the aligned reference do not advance it.
pub fn alignment_positions(aligned_reference: &[u8], reference_length: usize) -> Result<Vec<usize>, String> {
    let mut positions = Vec::with_capacity(reference_length + 1);
    for (column, &base) in aligned_reference.iter().enumerate() {
        if base != GAP {
            positions.push(column);
        }
    }
    if positions.len() != reference_length {
        return Err(format!(
            "Length of the reference in the alignment ({}) does not match the regions file ({}) - have regions been masked with dashes?",
            positions.len(),
            reference_length
        ));
    }
    positions.push(aligned_reference.len());
    Ok(positions)
}

/// Masked share of one sample
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaskStats {
    pub unmasked: usize,
    pub horizontal: usize,
    pub unaligned: usize,
}

pub fn mask_sequence(
    sequence: &[u8],
    regions: &ReferenceRegions,
    positions: &[usize],
    settings: &MaskSettings,
) -> (Vec<u8>, MaskStats) {
    let mut masked = sequence.to_vec();
    let reference_length = positions.len().saturating_sub(1);
    let mut stats = MaskStats { unmasked: reference_length, ..Default::default() };

    let mut paint = |ranges: &[(usize, usize)], c: u8| -> usize {
        let mut total = 0;
        for &(start, end) in ranges {
            let (from, to) = (positions[start.min(reference_length)], positions[end.min(reference_length)]);
            for b in masked.iter_mut().take(to).skip(from) {
                *b = c;
            }
            total += end - start;
        }
        total
    };
    if let Some(c) = settings.h_char {
        stats.horizontal = paint(&regions.horizontal, c);
    }
    if let Some(c) = settings.u_char {
        stats.unaligned = paint(&regions.unaligned, c);
    }
    stats.unmasked = stats.unmasked.saturating_sub(stats.horizontal + stats.unaligned);
    (masked, stats)
}

fn is_base(b: u8) -> bool {
    matches!(b.to_ascii_uppercase(), b'A' | b'C' | b'G' | b'T')
}

fn drop_columns(sequences: &mut [(String, Vec<u8>)], keep: &[bool]) {
    for (_, seq) in sequences.iter_mut() {
        let mut column = 0;
        seq.retain(|_| {
            let k = keep[column];
            column += 1;
            k
        });
    }
}

fn alignment_length(sequences: &[(String, Vec<u8>)]) -> usize {
    sequences.first().map_or(0, |(_, s)| s.len())
}

/// Remove columns without a single A/C/G/T; returns how many were removed
pub fn drop_empty_columns(sequences: &mut [(String, Vec<u8>)]) -> usize {
    let len = alignment_length(sequences);
    let keep: Vec<bool> = (0..len)
        .map(|i| sequences.iter().any(|(_, s)| is_base(s[i])))
        .collect();
    let removed = keep.iter().filter(|&&k| !k).count();
    if removed > 0 {
        drop_columns(sequences, &keep);
    }
    removed
}

/// Remove columns with fewer than two distinct bases
pub fn drop_invariant_columns(sequences: &mut [(String, Vec<u8>)]) -> usize {
    let len = alignment_length(sequences);
    let keep: Vec<bool> = (0..len)
        .map(|i| {
            let bases: BTreeSet<u8> = sequences
                .iter()
                .map(|(_, s)| s[i].to_ascii_uppercase())
                .filter(|&b| is_base(b))
                .collect();
            bases.len() >= 2
        })
        .collect();
    let removed = keep.iter().filter(|&&k| !k).count();
    if removed > 0 {
        drop_columns(sequences, &keep);
    }
    removed
}

/// Masked pseudo-alignment, reference first
#[derive(Debug, Clone)]
pub struct MaskedAlignment {
    pub sequences: Vec<(String, Vec<u8>)>,
    pub stats: Vec<(String, MaskStats)>,
    pub empty_columns_removed: usize,
    pub invariant_columns_removed: usize,
    pub original_length: usize,
}

/// Mask every sample shared by the regions table and the pseudo-alignment,
/// then drop empty (and optionally invariant) columns. All consistency
/// checks run before anything is masked.
pub fn mask_alignment(
    table: &RegionsTable,
    sequences: Vec<(String, Vec<u8>)>,
    settings: &MaskSettings,
) -> Result<MaskedAlignment, String> {
    if sequences.is_empty() {
        return Err("No sequences could be loaded from the pseudo-alignment".to_string());
    }
    let lengths: BTreeSet<usize> = sequences.iter().map(|(_, s)| s.len()).collect();
    if lengths.len() != 1 {
        return Err("All sequences in the pseudo-alignment must be the same length".to_string());
    }
    let original_length = alignment_length(&sequences);

    let by_name: HashMap<String, Vec<u8>> = sequences.into_iter().collect();
    let reference_seq = by_name.get(&table.reference).ok_or_else(|| {
        format!("Could not find the reference sequence ({}) in the pseudo-alignment", table.reference)
    })?;

    let shared: Vec<&String> = table
        .samples
        .keys()
        .filter(|name| by_name.contains_key(*name))
        .collect();
    if shared.is_empty() {
        return Err("The regions file and pseudo-alignment have no sample names in common".to_string());
    }

    let positions = alignment_positions(reference_seq, table.reference_length)?;

    let mut masked = vec![(table.reference.clone(), reference_seq.clone())];
    let mut stats = Vec::with_capacity(shared.len());
    for name in shared {
        let (seq, s) = mask_sequence(&by_name[name], &table.samples[name], &positions, settings);
        masked.push((name.clone(), seq));
        stats.push((name.clone(), s));
    }

    let empty_columns_removed = drop_empty_columns(&mut masked);
    let invariant_columns_removed = if settings.exclude_invariant {
        drop_invariant_columns(&mut masked)
    } else {
        0
    };

    Ok(MaskedAlignment {
        sequences: masked,
        stats,
        empty_columns_removed,
        invariant_columns_removed,
        original_length,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "assembly_a\tassembly_b\twindow_size\tassembly_a_vertical_regions\tassembly_a_horizontal_regions\tassembly_a_unaligned_regions\n";

    fn table_text(rows: &[&str]) -> String {
        let mut text = HEADER.to_string();
        for r in rows {
            text.push_str(r);
            text.push('\n');
        }
        text
    }

    fn seqs(items: &[(&str, &str)]) -> Vec<(String, Vec<u8>)> {
        items.iter().map(|(n, s)| (n.to_string(), s.as_bytes().to_vec())).collect()
    }

    #[test]
    fn test_parse_region() {
        assert_eq!(parse_region("chr:10-20").unwrap(), ("chr".to_string(), 10, 20));
        assert_eq!(parse_region("a:b:0-5").unwrap(), ("a:b".to_string(), 0, 5));
        assert!(parse_region("chr10-20").is_err());
        assert!(parse_region("chr:20-10").is_err());
        assert!(parse_region("chr:x-10").is_err());
    }

    #[test]
    fn test_parse_mask_char() {
        assert_eq!(parse_mask_char("N").unwrap(), Some(b'N'));
        assert_eq!(parse_mask_char("none").unwrap(), None);
        assert!(parse_mask_char("NN").is_err());
    }

    #[test]
    fn test_read_regions_table() {
        let text = table_text(&[
            "ref\ts1\t100\tc:0-4,c:6-10\tc:4-6\t",
            "ref\ts2\t100\tc:0-8\t\tc:8-10",
        ]);
        let table = read_regions_table(text.as_bytes(), "regions.tsv", None).unwrap();
        assert_eq!(table.reference, "ref");
        assert!(table.reference_detected);
        assert_eq!(table.reference_length, 10);
        assert_eq!(table.samples["s1"].horizontal, vec![(4, 6)]);
        assert_eq!(table.samples["s2"].unaligned, vec![(8, 10)]);
        assert_eq!(table.all_samples, vec!["s1".to_string(), "s2".to_string()]);
    }

    #[test]
    fn test_regions_table_errors() {
        let two_refs = table_text(&["r1\ts1\t100\tc:0-10\t\t", "r2\ts1\t100\tc:0-10\t\t"]);
        assert!(read_regions_table(two_refs.as_bytes(), "t", None).is_err());
        let named = read_regions_table(two_refs.as_bytes(), "t", Some("r2")).unwrap();
        assert_eq!(named.reference, "r2");
        assert!(!named.reference_detected);
        assert!(read_regions_table(two_refs.as_bytes(), "t", Some("r3")).is_err());

        let contigs = table_text(&["r\ts1\t100\tc1:0-5\tc2:5-10\t"]);
        let err = read_regions_table(contigs.as_bytes(), "t", None).unwrap_err();
        assert!(err.contains("more than one contig"));

        let gap = table_text(&["r\ts1\t100\tc:0-5\tc:6-10\t"]);
        assert!(read_regions_table(gap.as_bytes(), "t", None).unwrap_err().contains("tile"));

        let lengths = table_text(&["r\ts1\t100\tc:0-10\t\t", "r\ts2\t100\tc:0-12\t\t"]);
        assert!(read_regions_table(lengths.as_bytes(), "t", None)
            .unwrap_err()
            .contains("inconsistent"));

        let bad_header = "a\tb\tassembly_a_vertical_regions\n";
        assert!(read_regions_table(bad_header.as_bytes(), "t", None).is_err());
    }

    #[test]
    fn test_alignment_positions() {
        assert_eq!(alignment_positions(b"AC-GT", 4).unwrap(), vec![0, 1, 3, 4, 5]);
        assert!(alignment_positions(b"AC-GT", 5).is_err());
    }

    #[test]
    fn test_mask_sequence() {
        let regions = ReferenceRegions {
            vertical: vec![(0, 2)],
            horizontal: vec![(2, 3)],
            unaligned: vec![(3, 4)],
        };
        let positions = alignment_positions(b"AC-GT", 4).unwrap();
        let (masked, stats) = mask_sequence(b"ACAGT", &regions, &positions, &MaskSettings::default());
        // the gap column stays with the preceding reference position
        assert_eq!(masked, b"ACAN-".to_vec());
        assert_eq!(stats, MaskStats { unmasked: 2, horizontal: 1, unaligned: 1 });

        let settings = MaskSettings { h_char: None, ..Default::default() };
        let (masked, _) = mask_sequence(b"ACAGT", &regions, &positions, &settings);
        assert_eq!(masked, b"ACAG-".to_vec());
    }

    #[test]
    fn test_drop_columns() {
        let mut s = seqs(&[("r", "A-CGT"), ("s1", "A-CGA"), ("s2", "ANCGN")]);
        assert_eq!(drop_empty_columns(&mut s), 1);
        assert_eq!(s[0].1, b"ACGT".to_vec());
        assert_eq!(drop_invariant_columns(&mut s), 3);
        assert_eq!(s[0].1, b"T".to_vec());
        assert_eq!(s[1].1, b"A".to_vec());
        assert_eq!(s[2].1, b"N".to_vec());
    }

    #[test]
    fn test_mask_alignment() {
        let text = table_text(&["ref\ts1\t100\tc:0-4,c:6-10\tc:4-6\t", "ref\ts3\t100\tc:0-10\t\t"]);
        let table = read_regions_table(text.as_bytes(), "t", None).unwrap();
        let alignment = seqs(&[("s1", "ACGTACGTAC"), ("ref", "ACGTTCGTAC"), ("s2", "ACGTACGTAA")]);
        let masked = mask_alignment(&table, alignment, &MaskSettings::default()).unwrap();

        assert_eq!(masked.sequences[0].0, "ref");
        assert_eq!(masked.sequences.len(), 2);
        assert_eq!(masked.sequences[1], ("s1".to_string(), b"ACGTNNGTAC".to_vec()));
        assert_eq!(masked.empty_columns_removed, 0);

        let unequal = seqs(&[("ref", "ACGT"), ("s1", "ACG")]);
        assert!(mask_alignment(&table, unequal, &MaskSettings::default()).is_err());
        let no_ref = seqs(&[("s1", "ACGTACGTAC")]);
        assert!(mask_alignment(&table, no_ref, &MaskSettings::default()).is_err());
        let no_shared = seqs(&[("ref", "ACGTACGTAC"), ("s9", "ACGTACGTAC")]);
        assert!(mask_alignment(&table, no_shared, &MaskSettings::default())
            .unwrap_err()
            .contains("in common"));
    }
}
