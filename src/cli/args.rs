// args.rs - Command line arguments definition

use argh::FromArgs;

#[derive(FromArgs, Debug)]
/// vdist - Window-based distance distributions for pairs of assemblies
pub struct Args {
    #[argh(subcommand)]
    pub command: Command,
}

#[derive(FromArgs, Debug)]
#[argh(subcommand)]
pub enum Command {
    Pairwise(PairwiseArgs),
    Distance(DistanceArgs),
    Mask(MaskArgs),
    View(ViewArgs),
    Config(ConfigArgs),
}

#[derive(FromArgs, Debug, Default)]
#[argh(subcommand, name = "pairwise")]
/// compare every ordered pair of assemblies from their PAF alignments
pub struct PairwiseArgs {
    /// assembly FASTA file (repeat for each assembly)
    #[argh(option)]
    pub assemblies: Vec<String>,

    /// file listing assembly FASTA paths (one per line)
    #[argh(option)]
    pub assembly_list: Option<String>,

    /// directory holding one <a>_vs_<b>.paf file per ordered pair
    #[argh(option)]
    pub alignment_dir: Option<String>,

    /// output file for the per-pair distance distributions (TSV)
    #[argh(option)]
    pub out_distributions: Option<String>,

    /// output file for thresholds, summary distances and regions (TSV)
    #[argh(option)]
    pub out_regions: Option<String>,

    /// number of threads (default: auto-detect)
    #[argh(option)]
    pub threads: Option<usize>,

    /// approximate number of windows sampled per pair (default: 50000)
    #[argh(option)]
    pub window_count: Option<usize>,

    /// remove indels from alignments instead of compressing each run to one difference
    #[argh(switch)]
    pub ignore_indels: bool,

    /// smoothing iterations used by the peak estimator (default: 1000)
    #[argh(option)]
    pub smoothing_iterations: Option<usize>,

    /// distribution written per pair: vertical, all (default: vertical)
    #[argh(option)]
    pub distribution: Option<String>,

    /// minimum kernel bandwidth for the threshold search (default: 2.0)
    #[argh(option)]
    pub kernel_min_bandwidth: Option<f64>,

    /// maximum kernel bandwidth for the threshold search (default: 10.0)
    #[argh(option)]
    pub kernel_max_bandwidth: Option<f64>,

    /// validate inputs and check that every alignment file exists, then exit
    #[argh(switch)]
    pub dry_run: bool,

    /// print the window size, identity, thresholds and peak search of every pair
    #[argh(switch, short = 'v')]
    pub verbose: bool,

    /// path to TOML configuration file
    #[argh(option)]
    pub config: Option<String>,
}

#[derive(FromArgs, Debug, Default)]
#[argh(subcommand, name = "distance")]
/// build a PHYLIP distance matrix from pairwise distributions
pub struct DistanceArgs {
    /// pairwise distributions written by `vdist pairwise`
    #[argh(option)]
    pub alignment_results: Option<String>,

    /// estimator: mean, median, median_int, mode, peak (default: peak)
    #[argh(option)]
    pub method: Option<String>,

    /// corrections: none, or a comma list of jukescantor, alignedfrac (default: none)
    #[argh(option)]
    pub correction: Option<String>,

    /// keep the matrix asymmetric instead of averaging both directions
    #[argh(switch)]
    pub asymmetrical: bool,

    /// policy for repeated pairs: first, low, high (default: first)
    #[argh(option)]
    pub multi: Option<String>,

    /// include only samples matching regex pattern
    #[argh(option)]
    pub include_samples: Option<String>,

    /// exclude samples matching regex pattern
    #[argh(option)]
    pub exclude_samples: Option<String>,

    /// include only samples listed in a file (one sample per line)
    #[argh(option)]
    pub include_samples_list: Option<String>,

    /// smoothing iterations used by the peak estimator (default: 1000)
    #[argh(option)]
    pub smoothing_iterations: Option<usize>,

    /// number of threads (default: auto-detect)
    #[argh(option)]
    pub threads: Option<usize>,

    /// output PHYLIP file (default: stdout)
    #[argh(option)]
    pub output: Option<String>,

    /// path to TOML configuration file
    #[argh(option)]
    pub config: Option<String>,
}

#[derive(FromArgs, Debug, Default)]
#[argh(subcommand, name = "mask")]
/// mask horizontal and unaligned regions in a reference-based pseudo-alignment
pub struct MaskArgs {
    /// regions table written by `vdist pairwise --out-regions`
    #[argh(option)]
    pub in_tsv: Option<String>,

    /// pseudo-alignment FASTA (all sequences the same length)
    #[argh(option)]
    pub in_alignment: Option<String>,

    /// masked pseudo-alignment FASTA
    #[argh(option)]
    pub out_alignment: Option<String>,

    /// reference sample name (default: auto-detect)
    #[argh(option)]
    pub reference: Option<String>,

    /// character for horizontal regions, or none (default: N)
    #[argh(option)]
    pub h_char: Option<String>,

    /// character for unaligned regions, or none (default: -)
    #[argh(option)]
    pub u_char: Option<String>,

    /// also remove columns where every sample has the same base
    #[argh(switch)]
    pub exclude_invariant: bool,

    /// path to TOML configuration file
    #[argh(option)]
    pub config: Option<String>,
}

#[derive(FromArgs, Debug, Default)]
#[argh(subcommand, name = "view")]
/// summarise the distribution of one assembly pair
pub struct ViewArgs {
    /// pairwise distributions written by `vdist pairwise`
    #[argh(option)]
    pub alignment_results: String,

    /// first assembly of the pair
    #[argh(option)]
    pub assembly_a: String,

    /// second assembly of the pair
    #[argh(option)]
    pub assembly_b: String,

    /// print the summary as JSON
    #[argh(switch)]
    pub json: bool,

    /// path to TOML configuration file
    #[argh(option)]
    pub config: Option<String>,
}

#[derive(FromArgs, Debug, Default)]
#[argh(subcommand, name = "config")]
/// print a sample configuration file
pub struct ConfigArgs {
    /// write the sample configuration to this file instead of stdout
    #[argh(option)]
    pub output: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, argh::EarlyExit> {
        Args::from_args(&["vdist"], args)
    }

    #[test]
    fn test_pairwise_repeated_assemblies() {
        let args = parse(&[
            "pairwise",
            "--assemblies",
            "a.fasta",
            "--assemblies",
            "b.fasta",
            "--alignment-dir",
            "paf",
            "--ignore-indels",
        ])
        .unwrap_or_else(|e| panic!("{}", e.output));
        match args.command {
            Command::Pairwise(p) => {
                assert_eq!(p.assemblies, vec!["a.fasta", "b.fasta"]);
                assert_eq!(p.alignment_dir.as_deref(), Some("paf"));
                assert!(p.ignore_indels);
                assert!(p.window_count.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_view_requires_pair() {
        assert!(parse(&["view", "--alignment-results", "d.tsv"]).is_err());
        assert!(parse(&[
            "view",
            "--alignment-results",
            "d.tsv",
            "--assembly-a",
            "x",
            "--assembly-b",
            "y",
            "--json"
        ])
        .is_ok());
    }

    #[test]
    fn test_unknown_subcommand() {
        assert!(parse(&["align"]).is_err());
    }
}
