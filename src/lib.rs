//! Library entry point: wires the core pipeline stages (spec §2) behind
//! a single `run_pipeline` call the binary (and integration tests) drive.

pub mod core;

use std::fs;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::core::aggregator::aggregate;
use crate::core::aligner::{AlignerGateway, CommandLineAligner};
use crate::core::checker::check_residues;
use crate::core::config::Config;
use crate::core::fasta_store::FastaStore;
use crate::core::hit::{parse_hit_line, Hit, HitSource};
use crate::core::output::{
    build_query_summary, write_condensed_criteria_table, write_full_criteria_table,
    write_query_summary_table, write_refined_regions_table, write_regions_table,
};
use crate::core::query::QueryRegistry;
use crate::core::refiner::refine_regions;
use crate::core::region::build_regions_per_query;

/// Reads every hit line from a tabular hit-table file, tagging each with
/// `source` and discarding rows whose evalue exceeds `evalue_threshold`
/// (spec §4.C).
fn load_hits(path: &std::path::Path, source: HitSource, evalue_threshold: f64) -> Result<Vec<Hit>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("could not read hit table {path:?}"))?;

    let mut hits = Vec::new();
    for line in contents.lines() {
        if line.trim().is_empty() {
            continue;
        }
        if let Some(hit) = parse_hit_line(line, source, evalue_threshold)? {
            hits.push(hit);
        }
    }
    Ok(hits)
}

/// Runs the full pipeline: loads inputs, merges regions, checks
/// residues, aggregates verdicts, refines region boundaries, and writes
/// every output table named in spec §4.I under `config.output_dir`.
pub fn run_pipeline(config: &Config) -> Result<()> {
    config.validate().context("invalid configuration")?;

    log::info!("loading query and intein FASTA files");
    let queries = FastaStore::load(&config.queries_fasta)?;
    let inteins = FastaStore::load(&config.inteins_fasta)?;
    if queries.is_empty() {
        log::warn!("{:?} contains no query records", config.queries_fasta);
    } else {
        log::info!("loaded {} query record(s)", queries.len());
    }
    if inteins.is_empty() {
        log::warn!("{:?} contains no intein records", config.inteins_fasta);
    } else {
        log::info!("loaded {} intein record(s)", inteins.len());
    }
    let registry = QueryRegistry::from_store(&queries);

    log::info!("loading hit tables");
    let mut profile_hits = load_hits(&config.profile_hits, HitSource::Profile, config.evalue_rpsblast)?;
    let mut sequence_hits = load_hits(&config.sequence_hits, HitSource::Sequence, config.evalue_mmseqs)?;

    for hit in profile_hits.iter_mut().chain(sequence_hits.iter_mut()) {
        if let Some(canonical) = registry.canonical_id_of(&hit.query) {
            hit.query = canonical.to_string();
        }
    }

    let mut all_hits = Vec::with_capacity(profile_hits.len() + sequence_hits.len());
    all_hits.extend(profile_hits.iter().cloned());
    all_hits.extend(sequence_hits.iter().cloned());

    log::info!("merging {} hits into putative regions", all_hits.len());
    let regions_by_query = build_regions_per_query(&all_hits)?;
    let regions_by_query_plain: std::collections::HashMap<_, _> = regions_by_query
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    fs::create_dir_all(&config.alignment_dir)
        .with_context(|| format!("could not create alignment directory {:?}", config.alignment_dir))?;
    fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("could not create output directory {:?}", config.output_dir))?;

    let aligner: Arc<dyn AlignerGateway> = Arc::new(CommandLineAligner::new(
        config.aligner_bin.clone(),
        config.alignment_dir.clone(),
        config.keep_alignments,
    ));

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.cpus)
        .build()
        .context("could not build worker pool")?;

    log::info!("checking residues across sequence-search hits");
    let criteria_lines = pool.install(|| {
        check_residues(
            &all_hits,
            &regions_by_query_plain,
            &queries,
            &registry,
            &inteins,
            aligner.as_ref(),
            config.padding as u32,
        )
    })?;

    log::info!("aggregating {} criteria lines into region verdicts", criteria_lines.len());
    let checks = aggregate(&criteria_lines, config.n_term_strictness, config.c_term_strictness);

    log::info!("refining region boundaries");
    let refined = refine_regions(
        &regions_by_query,
        &checks,
        config.evalue_region_refinement,
        config.use_length_in_refinement,
    );

    log::info!("writing output tables to {:?}", config.output_dir);
    write_table(&config.output_dir, "regions.tsv", |w| {
        write_regions_table(w, &regions_by_query, &registry)
    })?;
    write_table(&config.output_dir, "criteria_full.tsv", |w| {
        write_full_criteria_table(w, &criteria_lines, &registry)
    })?;
    write_table(&config.output_dir, "criteria_condensed.tsv", |w| {
        write_condensed_criteria_table(
            w,
            &checks,
            &registry,
            config.n_term_strictness,
            config.c_term_strictness,
        )
    })?;
    write_table(&config.output_dir, "regions_refined.tsv", |w| {
        write_refined_regions_table(w, &refined, &registry)
    })?;
    let summary = build_query_summary(&all_hits, &registry);
    write_table(&config.output_dir, "query_summary.tsv", |w| {
        write_query_summary_table(w, &summary)
    })?;

    log::info!("done");
    Ok(())
}

fn write_table(
    output_dir: &std::path::Path,
    file_name: &str,
    write: impl FnOnce(&mut fs::File) -> Result<()>,
) -> Result<()> {
    let path = output_dir.join(file_name);
    let mut file = fs::File::create(&path).with_context(|| format!("could not create {path:?}"))?;
    write(&mut file)
}
