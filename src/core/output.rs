//! Output tables (spec §4.I, §6): tab-separated tables with a literal
//! header row and stable column order, restoring each query's original
//! id (spec §3) at this boundary. Adapted from the teacher's
//! `fasta_utils::write_fasta_sequences` file-writing style: a thin
//! `Write` wrapper, `with_context` on every I/O call.

use std::io::Write;

use anyhow::{Context, Result};
use indexmap::IndexMap;

use crate::core::aggregator::RegionCheck;
use crate::core::checker::CriteriaLine;
use crate::core::hit::{Hit, HitSource};
use crate::core::query::QueryRegistry;
use crate::core::refiner::RefinedRegion;
use crate::core::region::Region;

fn original_id<'a>(registry: &'a QueryRegistry, canonical_id: &'a str) -> &'a str {
    registry.original_id_of(canonical_id).unwrap_or(canonical_id)
}

/// Putative regions table (spec §4.I): `seq, region.id, start, end, len`.
pub fn write_regions_table(
    mut writer: impl Write,
    regions_by_query: &IndexMap<String, Vec<Region>>,
    registry: &QueryRegistry,
) -> Result<()> {
    writeln!(writer, "seq\tregion.id\tstart\tend\tlen").context("writing regions table header")?;

    for (query, regions) in regions_by_query {
        let seq = original_id(registry, query);
        for region in regions {
            let len = region.qend - region.qstart + 1;
            writeln!(
                writer,
                "{}\t{}\t{}\t{}\t{}",
                seq, region.id, region.qstart, region.qend, len
            )
            .context("writing regions table row")?;
        }
    }

    Ok(())
}

/// Full criteria table (spec §4.I): the sorted Residue Checker output.
pub fn write_full_criteria_table(
    mut writer: impl Write,
    lines: &[CriteriaLine],
    registry: &QueryRegistry,
) -> Result<()> {
    writeln!(
        writer,
        "query\ttarget\tevalue\twhich.region\taln.region\tregion.good\thas.start\thas.end\thas.extein.start"
    )
    .context("writing full criteria table header")?;

    for line in lines {
        writeln!(
            writer,
            "{}\t{}\t{:e}\t{}\t{}-{}\t{}\t{}\t{}\t{}",
            original_id(registry, &line.query),
            line.target,
            line.evalue,
            line.region_id,
            line.rs,
            line.re,
            line.region_good,
            line.start_good,
            line.end_good,
            line.extein_good,
        )
        .context("writing full criteria table row")?;
    }

    Ok(())
}

/// Condensed criteria table (spec §4.I).
pub fn write_condensed_criteria_table(
    mut writer: impl Write,
    checks: &IndexMap<(String, usize), RegionCheck>,
    registry: &QueryRegistry,
    n_term_strictness: u8,
    c_term_strictness: u8,
) -> Result<()> {
    writeln!(
        writer,
        "seq\tregion.id\tsingle.target\tsingle.target.evalue\tsingle.target.region\tmulti.target\tregion\tstart\tend\textein"
    )
    .context("writing condensed criteria table header")?;

    for ((query, region_id), check) in checks {
        let (single_target, single_evalue, single_region) = match &check.single_target {
            Some(single) => (
                single.target.clone(),
                format!("{:e}", single.evalue),
                format!("{}-{}", single.rs, single.re),
            ),
            None => ("No".to_string(), String::new(), String::new()),
        };
        let multi_target = check.multi_target_all_good(n_term_strictness, c_term_strictness);

        writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            original_id(registry, query),
            region_id,
            single_target,
            single_evalue,
            single_region,
            multi_target,
            check.region_good,
            check.start_good,
            check.end_good,
            check.extein_good,
        )
        .context("writing condensed criteria table row")?;
    }

    Ok(())
}

/// Refined regions table (spec §4.I): `seq, region.id, start, end, len,
/// refining.target, refining.evalue`.
pub fn write_refined_regions_table(
    mut writer: impl Write,
    refined: &[RefinedRegion],
    registry: &QueryRegistry,
) -> Result<()> {
    writeln!(
        writer,
        "seq\tregion.id\tstart\tend\tlen\trefining.target\trefining.evalue"
    )
    .context("writing refined regions table header")?;

    for region in refined {
        let target = region.refining_target.as_deref().unwrap_or("No");
        let evalue = region
            .refining_evalue
            .map(|e| format!("{e:e}"))
            .unwrap_or_default();

        writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            original_id(registry, &region.query),
            region.region_id,
            region.start,
            region.end,
            region.length,
            target,
            evalue,
        )
        .context("writing refined regions table row")?;
    }

    Ok(())
}

/// One row of the query summary table (spec §4.I, §4.M): per original
/// query id, hit count and best (lowest) evalue from each search.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySummaryRow {
    pub query: String,
    pub profile_hits: usize,
    pub profile_best_evalue: Option<f64>,
    pub sequence_hits: usize,
    pub sequence_best_evalue: Option<f64>,
}

/// Builds the query summary directly off the raw hit lists, before
/// region construction, since it must include hits that fall outside
/// any merged region (spec §4.M).
pub fn build_query_summary(hits: &[Hit], registry: &QueryRegistry) -> Vec<QuerySummaryRow> {
    let mut rows: IndexMap<String, QuerySummaryRow> = IndexMap::new();

    for query in registry_queries_in_order(registry) {
        rows.insert(
            query.clone(),
            QuerySummaryRow {
                query: query.clone(),
                profile_hits: 0,
                profile_best_evalue: None,
                sequence_hits: 0,
                sequence_best_evalue: None,
            },
        );
    }

    for hit in hits {
        let original = original_id(registry, &hit.query).to_string();
        let row = rows.entry(original.clone()).or_insert_with(|| QuerySummaryRow {
            query: original,
            profile_hits: 0,
            profile_best_evalue: None,
            sequence_hits: 0,
            sequence_best_evalue: None,
        });

        match hit.source {
            HitSource::Profile => {
                row.profile_hits += 1;
                row.profile_best_evalue = Some(
                    row.profile_best_evalue
                        .map_or(hit.evalue, |best| best.min(hit.evalue)),
                );
            }
            HitSource::Sequence => {
                row.sequence_hits += 1;
                row.sequence_best_evalue = Some(
                    row.sequence_best_evalue
                        .map_or(hit.evalue, |best| best.min(hit.evalue)),
                );
            }
        }
    }

    rows.into_values().collect()
}

fn registry_queries_in_order(registry: &QueryRegistry) -> Vec<String> {
    (0..registry.len())
        .map(|n| format!("user_query___seq_{n}"))
        .filter_map(|canonical| registry.original_id_of(&canonical).map(str::to_string))
        .collect()
}

/// Writes the query summary table.
pub fn write_query_summary_table(mut writer: impl Write, rows: &[QuerySummaryRow]) -> Result<()> {
    writeln!(
        writer,
        "query\tprofile.hits\tprofile.best.evalue\tsequence.hits\tsequence.best.evalue"
    )
    .context("writing query summary table header")?;

    for row in rows {
        writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{}",
            row.query,
            row.profile_hits,
            row.profile_best_evalue.map(|e| format!("{e:e}")).unwrap_or_default(),
            row.sequence_hits,
            row.sequence_best_evalue.map(|e| format!("{e:e}")).unwrap_or_default(),
        )
        .context("writing query summary table row")?;
    }

    Ok(())
}
