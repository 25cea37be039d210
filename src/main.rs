// main.rs - CLI entry point

use std::path::Path;
use std::time::Instant;
use vdist::cli::args::{ConfigArgs, DistanceArgs, MaskArgs, PairwiseArgs, ViewArgs};
use vdist::cli::validation::config_engine_settings;
use vdist::cli::{validate_distance, validate_mask, validate_pairwise, Args, Command, Config};
use vdist::core::mask::{load_regions_table, mask_alignment};
use vdist::core::pairwise::{run_pairwise, summarize_record};
use vdist::data::alignment::pair_alignment_path;
use vdist::data::assembly::{load_assemblies, load_sequences};
use vdist::data::matrix::{load_pairwise_records, DistanceMatrix, PairwiseRecord};
use vdist::output::{
    write_distributions_file, write_fasta_file, write_phylip_output, write_regions_file, write_summary,
};

fn main() {
    if let Err(e) = run_main() {
        eprintln!("❌ ERROR: {}", e);
        std::process::exit(1);
    }
}

fn run_main() -> Result<(), String> {
    let args: Args = argh::from_env();
    let command_line = std::env::args().collect::<Vec<String>>().join(" ");

    match args.command {
        Command::Pairwise(a) => run_pairwise_command(a.with_config_file()?, &command_line),
        Command::Distance(a) => run_distance_command(a.with_config_file()?),
        Command::Mask(a) => run_mask_command(a.with_config_file()?),
        Command::View(a) => run_view_command(&a),
        Command::Config(a) => run_config_command(&a),
    }
}

/// Configure the global rayon pool; `report` prints the thread count
fn configure_threads(threads: Option<usize>, report: bool) -> Result<(), String> {
    if let Some(n) = threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build_global()
            .map_err(|e| format!("Failed to configure thread pool: {}", e))?;
        if report {
            println!("🧵 Threads: {}", n);
        }
    } else if report {
        println!("🧵 Threads: {} (auto-detected)", rayon::current_num_threads());
    }
    Ok(())
}

fn run_pairwise_command(args: PairwiseArgs, command_line: &str) -> Result<(), String> {
    let options = validate_pairwise(&args)?;

    println!("🚀 vdist v{}", vdist::VERSION);
    configure_threads(args.threads, true)?;
    println!(
        "⚙️  Window count: {}, indels: {}, distribution: {}",
        options.settings.target_window_count,
        if options.settings.ignore_indels { "removed" } else { "compressed" },
        options.settings.distribution
    );

    let total_start = Instant::now();
    let assemblies = load_assemblies(&options.assembly_paths)?;
    for assembly in &assemblies {
        println!(
            "🧬 {}: {} contigs, {} bp",
            assembly.name,
            assembly.contigs.len(),
            assembly.total_length()
        );
    }

    let missing: Vec<String> = assemblies
        .iter()
        .flat_map(|a| assemblies.iter().filter(move |b| b.name != a.name).map(move |b| (a, b)))
        .map(|(a, b)| pair_alignment_path(&options.alignment_dir, &a.name, &b.name))
        .filter(|path| !path.is_file())
        .map(|path| path.display().to_string())
        .collect();
    if !missing.is_empty() {
        return Err(format!(
            "{} alignment files are missing, first: {}",
            missing.len(),
            missing[0]
        ));
    }

    if args.dry_run {
        println!("✅ Dry run completed successfully");
        return Ok(());
    }

    let outcomes = run_pairwise(&assemblies, &options.alignment_dir, &options.settings)?;
    if args.verbose {
        for result in outcomes.iter().filter_map(|o| o.result.as_ref()) {
            println!("📊 {}", result.log.join("\n   "));
        }
    }

    let records: Vec<PairwiseRecord> = outcomes.iter().map(|o| o.record()).collect();
    write_distributions_file(&options.out_distributions, &records, command_line)?;
    if let Some(path) = &options.out_regions {
        write_regions_file(path, &outcomes, command_line)?;
    }

    println!("🏁 Total time: {:.2}s", total_start.elapsed().as_secs_f64());
    Ok(())
}

/// Progress goes to stderr so the matrix can be written to stdout
fn run_distance_command(args: DistanceArgs) -> Result<(), String> {
    let options = validate_distance(&args)?;
    configure_threads(args.threads, false)?;

    let source = options.alignment_results.display().to_string();
    let records = load_pairwise_records(&options.alignment_results)?;
    eprintln!("📖 Loaded {} pairwise records from {}", records.len(), source);

    eprintln!(
        "🔎 Method: {} ({}), duplicate pairs: {}",
        options.method,
        options.method.description(),
        options.multi.description()
    );
    let matrix = DistanceMatrix::from_records(
        &records,
        options.method,
        &options.smoothing,
        options.multi,
        &source,
    )?;

    let mut matrix = if options.sample_include_regex.is_some()
        || options.sample_exclude_regex.is_some()
        || options.samples_include_list.is_some()
    {
        let filtered = matrix.filter_samples(
            options.sample_include_regex.as_ref(),
            options.sample_exclude_regex.as_ref(),
            options.samples_include_list.as_deref(),
        )?;
        eprintln!("🔍 Sample filters kept {} of {} samples", filtered.len(), matrix.len());
        filtered
    } else {
        matrix
    };

    if !options.corrections.is_none() {
        eprintln!("🔄 Applying corrections: {}", options.corrections);
        matrix.apply_corrections(options.corrections);
    }
    if options.symmetrize {
        matrix.symmetrize();
    }

    let missing = matrix.missing_count();
    if missing > 0 {
        eprintln!("⚠️  {} distances are missing and will be written as NA", missing);
    }

    write_phylip_output(options.output.as_deref(), &matrix)
}

fn run_mask_command(args: MaskArgs) -> Result<(), String> {
    let options = validate_mask(&args)?;

    let table = load_regions_table(&options.in_tsv, options.reference.as_deref())?;
    if table.reference_detected {
        println!("🔎 Automatically determined reference name: {}", table.reference);
    }
    println!(
        "📖 Reference {} ({} bp) with regions for {} samples",
        table.reference,
        table.reference_length,
        table.samples.len()
    );

    let sequences = load_sequences(&options.in_alignment)?;
    println!("📖 Loaded {} sequences from {}", sequences.len(), options.in_alignment.display());

    let masked = mask_alignment(&table, sequences, &options.settings)?;
    for (name, stats) in &masked.stats {
        println!(
            "   {}: {} horizontal and {} unaligned bases masked, {} kept",
            name, stats.horizontal, stats.unaligned, stats.unmasked
        );
    }
    for sample in &table.all_samples {
        if !table.samples.contains_key(sample) {
            eprintln!("⚠️  No comparison of {} against {}: not masked", sample, table.reference);
        }
    }
    println!(
        "✂️  Alignment length {} → {} ({} empty and {} invariant columns removed)",
        masked.original_length,
        masked.original_length - masked.empty_columns_removed - masked.invariant_columns_removed,
        masked.empty_columns_removed,
        masked.invariant_columns_removed
    );

    write_fasta_file(&options.out_alignment, &masked.sequences)
}

fn run_view_command(args: &ViewArgs) -> Result<(), String> {
    let settings = config_engine_settings(&args.load_config()?)?;
    let records = load_pairwise_records(Path::new(&args.alignment_results))?;
    let record = records
        .iter()
        .find(|r| r.assembly_a == args.assembly_a && r.assembly_b == args.assembly_b)
        .ok_or_else(|| {
            format!(
                "Could not find {} vs {} in {}",
                args.assembly_a, args.assembly_b, args.alignment_results
            )
        })?;

    let summary = summarize_record(record, &settings);
    if args.json {
        let json = serde_json::to_string_pretty(&summary)
            .map_err(|e| format!("Failed to serialize summary: {}", e))?;
        println!("{}", json);
    } else {
        let stdout = std::io::stdout();
        write_summary(&mut stdout.lock(), &summary)?;
    }
    Ok(())
}

fn run_config_command(args: &ConfigArgs) -> Result<(), String> {
    let sample_config = Config::generate_sample();
    match &args.output {
        Some(path) => {
            std::fs::write(path, sample_config)
                .map_err(|e| format!("Failed to write config file '{}': {}", path, e))?;
            println!("📄 Sample configuration written to: {}", path);
        }
        None => {
            println!("{}", sample_config);
            println!("\n💡 Save this content to a .toml file and use --config /path/to/config.toml");
        }
    }
    Ok(())
}
