// mod.rs - Output formatters module

use crate::core::paint::{ContigRegions, RegionList};
use crate::core::pairwise::{PairOutcome, PairSummary};
use crate::data::matrix::{DistanceMatrix, PairwiseRecord};
use bio::io::fasta;
use std::fs::{create_dir_all, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Column names of the regions table
pub const REGIONS_HEADER: &[&str] = &[
    "assembly_a",
    "assembly_b",
    "window_size",
    "aligned_fraction",
    "window_count",
    "mean",
    "median",
    "median_int",
    "mode",
    "peak",
    "very_low",
    "low",
    "high",
    "very_high",
    "assembly_a_vertical_regions",
    "assembly_a_horizontal_regions",
    "assembly_a_unaligned_regions",
    "assembly_b_vertical_regions",
    "assembly_b_horizontal_regions",
    "assembly_b_unaligned_regions",
];

/// Ensure parent directory exists before creating file
fn ensure_parent_dir(file_path: &Path) -> Result<(), String> {
    if let Some(parent) = file_path.parent() {
        if parent.as_os_str().is_empty() {
            return Ok(());
        }
        create_dir_all(parent)
            .map_err(|e| format!("Failed to create parent directory '{}': {}", parent.display(), e))?;
    }
    Ok(())
}

fn create_output(file_path: &Path) -> Result<BufWriter<File>, String> {
    ensure_parent_dir(file_path)?;
    let file = File::create(file_path)
        .map_err(|e| format!("Failed to create output file '{}': {}", file_path.display(), e))?;
    Ok(BufWriter::new(file))
}

fn write_err(e: io::Error) -> String {
    format!("Write error: {}", e)
}

/// Command, timestamp and version as `#` comment lines
pub fn write_command_header<W: Write>(writer: &mut W, command_line: &str) -> Result<(), String> {
    writeln!(writer, "# Command: {}", command_line).map_err(write_err)?;
    writeln!(writer, "# Generated: {}", chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")).map_err(write_err)?;
    writeln!(writer, "# vdist v{}", crate::VERSION).map_err(write_err)?;
    Ok(())
}

fn format_optional(value: Option<impl ToString>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Distribution rows: `assembly_a assembly_b window_size aligned_fraction masses...`
pub fn write_distributions<W: Write>(
    writer: &mut W,
    records: &[PairwiseRecord],
    command_line: &str,
) -> Result<(), String> {
    write_command_header(writer, command_line)?;
    writeln!(writer, "# assembly_a\tassembly_b\twindow_size\taligned_fraction\tmasses").map_err(write_err)?;
    for record in records {
        write!(
            writer,
            "{}\t{}\t{}\t{:.6}",
            record.assembly_a, record.assembly_b, record.window_size, record.aligned_fraction
        )
        .map_err(write_err)?;
        for mass in &record.masses {
            write!(writer, "\t{}", mass).map_err(write_err)?;
        }
        writeln!(writer).map_err(write_err)?;
    }
    Ok(())
}

pub fn write_distributions_file(
    file_path: &Path,
    records: &[PairwiseRecord],
    command_line: &str,
) -> Result<(), String> {
    let mut writer = create_output(file_path)?;
    write_distributions(&mut writer, records, command_line)?;
    writer.flush().map_err(|e| format!("Flush error: {}", e))?;
    println!("✅ Distance distributions written to: {}", file_path.display());
    Ok(())
}

fn region_columns(regions: &[(String, ContigRegions)]) -> [String; 3] {
    let list = |select: fn(&ContigRegions) -> &[(usize, usize)]| {
        RegionList(regions.iter().map(|(name, r)| (name.as_str(), select(r))).collect()).to_string()
    };
    [
        list(|r| &r.vertical),
        list(|r| &r.horizontal),
        list(|r| &r.unaligned),
    ]
}

/// One row per pair with summary distances, thresholds and region lists.
/// Pairs without windows get empty summaries.
pub fn write_regions<W: Write>(
    writer: &mut W,
    outcomes: &[PairOutcome],
    command_line: &str,
) -> Result<(), String> {
    write_command_header(writer, command_line)?;
    writeln!(writer, "{}", REGIONS_HEADER.join("\t")).map_err(write_err)?;

    for outcome in outcomes {
        let mut fields = vec![outcome.assembly_a.clone(), outcome.assembly_b.clone()];
        match &outcome.result {
            Some(result) => {
                let estimates = result.estimates;
                let t = result.thresholds;
                fields.push(result.window_size.to_string());
                fields.push(format!("{:.6}", result.aligned_fraction));
                fields.push(result.window_count.to_string());
                for value in [
                    estimates.map(|e| e.mean),
                    estimates.map(|e| e.median),
                    estimates.map(|e| e.median_int),
                    estimates.map(|e| e.mode),
                    estimates.map(|e| e.peak),
                ] {
                    fields.push(format_optional(value.map(|v| format!("{:.9}", v))));
                }
                for threshold in [t.very_low, t.low, t.high, t.very_high] {
                    fields.push(format_optional(threshold));
                }
            }
            None => {
                fields.push(String::new());
                fields.push(format!("{:.6}", outcome.aligned_fraction));
                fields.push("0".to_string());
                fields.resize(REGIONS_HEADER.len() - 6, String::new());
            }
        }
        fields.extend(region_columns(outcome.regions_a()));
        fields.extend(region_columns(outcome.regions_b()));
        writeln!(writer, "{}", fields.join("\t")).map_err(write_err)?;
    }
    Ok(())
}

pub fn write_regions_file(
    file_path: &Path,
    outcomes: &[PairOutcome],
    command_line: &str,
) -> Result<(), String> {
    let mut writer = create_output(file_path)?;
    write_regions(&mut writer, outcomes, command_line)?;
    writer.flush().map_err(|e| format!("Flush error: {}", e))?;
    println!("✅ Region annotations written to: {}", file_path.display());
    Ok(())
}

/// Square PHYLIP matrix with 8 decimals; missing distances are written as NA
pub fn write_phylip<W: Write>(writer: &mut W, matrix: &DistanceMatrix) -> Result<(), String> {
    writeln!(writer, "{}", matrix.len()).map_err(write_err)?;
    for (a, name) in matrix.names().iter().enumerate() {
        write!(writer, "{}", name).map_err(write_err)?;
        for distance in matrix.row(a) {
            match distance {
                Some(d) => write!(writer, "\t{:.8}", d),
                None => write!(writer, "\tNA"),
            }
            .map_err(write_err)?;
        }
        writeln!(writer).map_err(write_err)?;
    }
    Ok(())
}

/// PHYLIP to a file, or to stdout when no path is given
pub fn write_phylip_output(file_path: Option<&Path>, matrix: &DistanceMatrix) -> Result<(), String> {
    match file_path {
        Some(path) => {
            let mut writer = create_output(path)?;
            write_phylip(&mut writer, matrix)?;
            writer.flush().map_err(|e| format!("Flush error: {}", e))?;
            eprintln!("✅ Distance matrix written to: {} (PHYLIP format)", path.display());
        }
        None => {
            let stdout = io::stdout();
            let mut writer = BufWriter::new(stdout.lock());
            write_phylip(&mut writer, matrix)?;
            writer.flush().map_err(|e| format!("Flush error: {}", e))?;
        }
    }
    Ok(())
}

/// FASTA records; empty sequences are skipped with a warning. Returns the
/// number of records written.
pub fn write_fasta<W: Write>(writer: W, sequences: &[(String, Vec<u8>)]) -> Result<usize, String> {
    let mut fasta_writer = fasta::Writer::new(writer);
    let mut written = 0;
    for (name, seq) in sequences {
        if seq.is_empty() {
            eprintln!("⚠️  Excluded {} due to empty sequence", name);
            continue;
        }
        fasta_writer.write(name, None, seq).map_err(write_err)?;
        written += 1;
    }
    fasta_writer.flush().map_err(|e| format!("Flush error: {}", e))?;
    Ok(written)
}

pub fn write_fasta_file(file_path: &Path, sequences: &[(String, Vec<u8>)]) -> Result<(), String> {
    let writer = create_output(file_path)?;
    let written = write_fasta(writer, sequences)?;
    println!("✅ {} sequences written to: {}", written, file_path.display());
    Ok(())
}

const HISTOGRAM_WIDTH: usize = 50;

/// Text summary of one pair: estimates, thresholds, a histogram of the
/// distribution with each index's band, and the peak search log
pub fn write_summary<W: Write>(writer: &mut W, summary: &PairSummary) -> Result<(), String> {
    writeln!(writer, "{} vs {}", summary.assembly_a, summary.assembly_b).map_err(write_err)?;
    writeln!(writer, "  window size:       {}", summary.window_size).map_err(write_err)?;
    writeln!(writer, "  aligned fraction:  {:.6}", summary.aligned_fraction).map_err(write_err)?;

    let estimates = match summary.estimates {
        Some(e) => e,
        None => {
            writeln!(writer, "  no aligned windows").map_err(write_err)?;
            return Ok(());
        }
    };
    for (name, value) in [
        ("mean", estimates.mean),
        ("median", estimates.median),
        ("median_int", estimates.median_int),
        ("mode", estimates.mode),
        ("peak", estimates.peak),
    ] {
        writeln!(writer, "  {:<19}{:.9}", format!("{}:", name), value).map_err(write_err)?;
    }
    writeln!(writer, "  thresholds:        {}", summary.thresholds).map_err(write_err)?;
    writeln!(writer).map_err(write_err)?;

    let max = summary.masses.iter().cloned().fold(0.0, f64::max);
    let bands = summary.thresholds.group(summary.masses.len());
    for (i, (mass, band)) in summary.masses.iter().zip(bands).enumerate() {
        let width = if max > 0.0 {
            (mass / max * HISTOGRAM_WIDTH as f64).round() as usize
        } else {
            0
        };
        let marker = if i == summary.peak { "*" } else { " " };
        writeln!(
            writer,
            "{:>5}{} {:<9} {:.6} {}",
            i,
            marker,
            band.name(),
            mass,
            "#".repeat(width)
        )
        .map_err(write_err)?;
    }

    if !summary.log.is_empty() {
        writeln!(writer).map_err(write_err)?;
        for line in &summary.log {
            writeln!(writer, "  {}", line).map_err(write_err)?;
        }
    }
    Ok(())
}
