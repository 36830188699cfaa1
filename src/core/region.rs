//! Region Builder (spec §4.D): merges overlapping homology hits into
//! maximal non-overlapping "putative intein regions" per query. Modeled
//! as an ordered `Vec` whose tail is mutated in place during the scan
//! (spec.md §9's "Mutable open map vs. immutable builder" design note) —
//! no shared references escape the builder.

use std::collections::HashMap;

use anyhow::Result;
use indexmap::IndexMap;

use crate::core::error::PipelineError;
use crate::core::hit::Hit;

/// A maximal contiguous `[qstart, qend]` interval on a query, formed by
/// merging overlapping hits. `id` is the zero-based insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub id: usize,
    pub qstart: u32,
    pub qend: u32,
}

/// One (start, end) pair a hit or region contributes to the merge scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub qstart: u32,
    pub qend: u32,
}

/// Merges a query's intervals into maximal non-overlapping regions.
/// Rejects degenerate intervals (`qstart == qend`) as an
/// `InvariantViolation` (spec §4.D, §7, §8).
pub fn build_regions(intervals: &[Interval]) -> Result<Vec<Region>> {
    let mut sorted: Vec<Interval> = intervals.to_vec();
    sorted.sort_by_key(|iv| (iv.qstart, iv.qend));

    let mut regions: Vec<(u32, u32)> = Vec::new();

    for iv in sorted {
        if iv.qstart == iv.qend {
            return Err(PipelineError::InvariantViolation(format!(
                "degenerate hit with qstart == qend == {}",
                iv.qstart
            ))
            .into());
        }

        match regions.last_mut() {
            None => regions.push((iv.qstart, iv.qend)),
            Some((_, le)) if iv.qstart >= *le => regions.push((iv.qstart, iv.qend)),
            Some((_, le)) if iv.qend > *le => *le = iv.qend,
            Some(_) => {}
        }
    }

    Ok(regions
        .into_iter()
        .enumerate()
        .map(|(id, (qstart, qend))| Region { id, qstart, qend })
        .collect())
}

/// Groups hits by query canonical id and builds regions for each,
/// preserving the order queries were first seen in `hits`.
pub fn build_regions_per_query(hits: &[Hit]) -> Result<IndexMap<String, Vec<Region>>> {
    let mut grouped: IndexMap<String, Vec<Interval>> = IndexMap::new();

    for hit in hits {
        grouped
            .entry(hit.query.clone())
            .or_default()
            .push(Interval {
                qstart: hit.qstart,
                qend: hit.qend,
            });
    }

    let mut out = IndexMap::new();
    for (query, intervals) in grouped {
        out.insert(query, build_regions(&intervals)?);
    }

    Ok(out)
}

/// Finds the region enclosing a query position, per the Residue
/// Checker's "locate the enclosing region" step (spec §4.F.1). Uses the
/// midpoint-in-range test the spec specifies, not a containment test on
/// the hit's own span.
pub fn find_enclosing(regions: &[Region], query_middle: f64) -> Option<&Region> {
    regions
        .iter()
        .find(|r| (r.qstart as f64) <= query_middle && query_middle <= (r.qend as f64))
}

/// Index of regions by query, for lookups during the Residue Checker
/// fan-out and Criterion Aggregator passes.
pub type RegionsByQuery = HashMap<String, Vec<Region>>;
