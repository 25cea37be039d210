// assembly.rs - Genome assemblies and aligned FASTA sequences

use bio::io::fasta;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

const FASTA_EXTENSIONS: &[&str] = &["fasta", "fa", "fna", "fas"];

/// Name and length of one contig
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contig {
    pub name: String,
    pub length: usize,
}

/// An assembly reduced to what the engine needs: its sample name and contig lengths
#[derive(Debug, Clone)]
pub struct Assembly {
    pub name: String,
    pub path: PathBuf,
    pub contigs: Vec<Contig>,
}

/// Sample name of an assembly file: the file name without its FASTA extension
pub fn sample_name(path: &Path) -> Result<String, String> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| format!("Invalid assembly path: {}", path.display()))?;

    for ext in FASTA_EXTENSIONS {
        if let Some(stem) = file_name.strip_suffix(&format!(".{}", ext)) {
            if !stem.is_empty() {
                return Ok(stem.to_string());
            }
        }
    }
    Ok(file_name.to_string())
}

/// Read every record of a FASTA stream as `(id, sequence)`
pub fn read_sequences<R: Read>(reader: R, source: &str) -> Result<Vec<(String, Vec<u8>)>, String> {
    let reader = fasta::Reader::new(reader);
    let mut sequences = Vec::new();
    for record_result in reader.records() {
        let record =
            record_result.map_err(|e| format!("Invalid FASTA record in {}: {}", source, e))?;
        sequences.push((record.id().to_string(), record.seq().to_vec()));
    }
    Ok(sequences)
}

/// Load every record of a FASTA file
pub fn load_sequences(path: &Path) -> Result<Vec<(String, Vec<u8>)>, String> {
    let file = File::open(path)
        .map_err(|e| format!("Failed to open FASTA file {}: {}", path.display(), e))?;
    read_sequences(BufReader::new(file), &path.display().to_string())
}

impl Assembly {
    pub fn from_fasta(path: &Path) -> Result<Self, String> {
        let name = sample_name(path)?;
        let file = File::open(path)
            .map_err(|e| format!("Failed to open assembly {}: {}", path.display(), e))?;
        let mut assembly = Self::from_reader(&name, BufReader::new(file))?;
        assembly.path = path.to_path_buf();
        Ok(assembly)
    }

    pub fn from_reader<R: Read>(name: &str, reader: R) -> Result<Self, String> {
        let contigs: Vec<Contig> = read_sequences(reader, name)?
            .into_iter()
            .map(|(id, seq)| Contig { name: id, length: seq.len() })
            .collect();
        if contigs.is_empty() {
            return Err(format!("Assembly {} contains no sequences", name));
        }
        Ok(Self {
            name: name.to_string(),
            path: PathBuf::new(),
            contigs,
        })
    }

    pub fn total_length(&self) -> usize {
        self.contigs.iter().map(|c| c.length).sum()
    }

    pub fn contig_length(&self, name: &str) -> Option<usize> {
        self.contigs.iter().find(|c| c.name == name).map(|c| c.length)
    }
}

/// Load assemblies sorted by sample name, rejecting duplicate names
pub fn load_assemblies(paths: &[PathBuf]) -> Result<Vec<Assembly>, String> {
    let mut assemblies = paths
        .iter()
        .map(|p| Assembly::from_fasta(p))
        .collect::<Result<Vec<_>, String>>()?;
    assemblies.sort_by(|a, b| a.name.cmp(&b.name));
    for pair in assemblies.windows(2) {
        if pair[0].name == pair[1].name {
            return Err(format!(
                "Duplicate sample name '{}' ({} and {})",
                pair[0].name,
                pair[0].path.display(),
                pair[1].path.display()
            ));
        }
    }
    Ok(assemblies)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_name() {
        assert_eq!(sample_name(Path::new("dir/ecoli_1.fasta")).unwrap(), "ecoli_1");
        assert_eq!(sample_name(Path::new("a.b.fna")).unwrap(), "a.b");
        assert_eq!(sample_name(Path::new("sample.fa")).unwrap(), "sample");
        assert_eq!(sample_name(Path::new("noext")).unwrap(), "noext");
    }

    #[test]
    fn test_assembly_from_reader() {
        let fasta = b">c1 description\nACGTACGT\nACG\n>c2\nTTTT\n";
        let assembly = Assembly::from_reader("s1", &fasta[..]).unwrap();
        assert_eq!(assembly.contigs.len(), 2);
        assert_eq!(assembly.contig_length("c1"), Some(11));
        assert_eq!(assembly.contig_length("c2"), Some(4));
        assert_eq!(assembly.contig_length("c3"), None);
        assert_eq!(assembly.total_length(), 15);
    }

    #[test]
    fn test_empty_assembly_is_rejected() {
        assert!(Assembly::from_reader("empty", &b""[..]).is_err());
    }

    #[test]
    fn test_read_sequences_keeps_gaps() {
        let fasta = b">ref\nAC-GT\n>s1\nACNGT\n";
        let seqs = read_sequences(&fasta[..], "test").unwrap();
        assert_eq!(seqs[0], ("ref".to_string(), b"AC-GT".to_vec()));
        assert_eq!(seqs[1].1, b"ACNGT".to_vec());
    }
}
