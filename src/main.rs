use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use intein_finder_core::core::config::{Config, DEFAULT_PADDING};
use intein_finder_core::run_pipeline;

#[derive(Parser)]
#[command(name = "intein-finder")]
#[command(about = "Finds putative inteins in query proteins and evaluates splice-junction evidence")]
struct Cli {
    /// FASTA file of query proteins to scan
    #[arg(long)]
    queries_fasta: PathBuf,

    /// FASTA file of reference intein sequences
    #[arg(long)]
    inteins_fasta: PathBuf,

    /// Tabular profile-search hit table (e.g. rpsblast output)
    #[arg(long)]
    profile_hits: PathBuf,

    /// Tabular sequence-search hit table (e.g. mmseqs easy-search output)
    #[arg(long)]
    sequence_hits: PathBuf,

    /// Path to the MSA aligner binary invoked per candidate hit
    #[arg(long)]
    aligner_bin: PathBuf,

    /// Directory for per-hit alignment input/output files
    #[arg(long, default_value = "alignments")]
    alignment_dir: PathBuf,

    /// Directory the output tables are written into
    #[arg(long, default_value = "output")]
    output_dir: PathBuf,

    /// Keep per-hit alignment files instead of discarding them after use
    #[arg(long)]
    keep_alignments: bool,

    /// N-terminal residue strictness (1 or 2)
    #[arg(long, default_value_t = 1)]
    n_term_strictness: u8,

    /// C-terminal dipeptide strictness (1 or 2)
    #[arg(long, default_value_t = 1)]
    c_term_strictness: u8,

    /// Region-refinement strictness; must be 1
    #[arg(long, default_value_t = 1)]
    refinement_strictness: u8,

    /// Drop refined regions outside the expected intein length range
    #[arg(long)]
    use_length_in_refinement: bool,

    /// E-value threshold applied to the profile-search hit table
    #[arg(long, default_value_t = 1e-5)]
    evalue_rpsblast: f64,

    /// E-value threshold applied to the sequence-search hit table
    #[arg(long, default_value_t = 1e-5)]
    evalue_mmseqs: f64,

    /// E-value threshold a single target must clear to refine a region
    #[arg(long, default_value_t = 1e-5)]
    evalue_region_refinement: f64,

    /// Worker threads for the Residue Checker's parallel fan-out
    #[arg(long, default_value_t = num_cpus::get())]
    cpus: usize,

    /// Padding applied on either side of a region before clipping
    #[arg(long, default_value_t = DEFAULT_PADDING)]
    padding: usize,
}

fn main() -> Result<()> {
    simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Info)
        .init()?;

    println!("{}", "intein-finder".bold().green());

    let cli = Cli::parse();

    let config = Config {
        n_term_strictness: cli.n_term_strictness,
        c_term_strictness: cli.c_term_strictness,
        refinement_strictness: cli.refinement_strictness,
        use_length_in_refinement: cli.use_length_in_refinement,
        evalue_rpsblast: cli.evalue_rpsblast,
        evalue_mmseqs: cli.evalue_mmseqs,
        evalue_region_refinement: cli.evalue_region_refinement,
        cpus: cli.cpus,
        padding: cli.padding,
        queries_fasta: cli.queries_fasta,
        inteins_fasta: cli.inteins_fasta,
        profile_hits: cli.profile_hits,
        sequence_hits: cli.sequence_hits,
        aligner_bin: cli.aligner_bin,
        alignment_dir: cli.alignment_dir,
        output_dir: cli.output_dir,
        keep_alignments: cli.keep_alignments,
    };

    run_pipeline(&config)
}
