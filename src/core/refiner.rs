//! Region Refiner (spec §4.H): rewrites a region's coarse boundaries
//! with the refined boundaries implied by its best single-target
//! evidence, subject to an optional length gate.

use indexmap::IndexMap;

use crate::core::aggregator::RegionCheck;
use crate::core::region::Region;

/// Refinement length gate (spec §3): `134 - 20` .. `608 + 20`.
pub const REGION_MIN_LEN: u32 = 114;
pub const REGION_MAX_LEN: u32 = 628;

/// Final per-(query, region) record (spec §3).
#[derive(Debug, Clone, PartialEq)]
pub struct RefinedRegion {
    pub query: String,
    pub region_id: usize,
    pub start: u32,
    pub end: u32,
    pub length: u32,
    pub refining_target: Option<String>,
    pub refining_evalue: Option<f64>,
}

/// Rewrites coarse regions with refined boundaries where a qualifying
/// single target exists, then applies the optional length gate
/// (spec §4.H). `refinement_strictness` is validated to be exactly `1`
/// at config time (spec.md §9); this function has nothing left to
/// branch on for other values.
pub fn refine_regions(
    regions_by_query: &IndexMap<String, Vec<Region>>,
    checks: &IndexMap<(String, usize), RegionCheck>,
    evalue_region_refinement: f64,
    use_length_in_refinement: bool,
) -> Vec<RefinedRegion> {
    let mut out = Vec::new();

    for (query, regions) in regions_by_query {
        for region in regions {
            let check = checks.get(&(query.clone(), region.id));

            let refined = match check.and_then(|c| c.single_target.as_ref()) {
                Some(single) if single.evalue <= evalue_region_refinement => RefinedRegion {
                    query: query.clone(),
                    region_id: region.id,
                    start: single.rs,
                    end: single.re,
                    length: single.re - single.rs + 1,
                    refining_target: Some(single.target.clone()),
                    refining_evalue: Some(single.evalue),
                },
                _ => RefinedRegion {
                    query: query.clone(),
                    region_id: region.id,
                    start: region.qstart,
                    end: region.qend,
                    length: region.qend - region.qstart + 1,
                    refining_target: None,
                    refining_evalue: None,
                },
            };

            if use_length_in_refinement
                && !(REGION_MIN_LEN..=REGION_MAX_LEN).contains(&refined.length)
            {
                continue;
            }

            out.push(refined);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::aggregator::SingleTarget;
    use crate::core::residue::Level;

    fn region_check_with_single(query: &str, region_id: usize, rs: u32, re: u32, evalue: f64) -> RegionCheck {
        RegionCheck {
            query: query.to_string(),
            region_id,
            region_good: Level::L1,
            start_good: Level::L1,
            end_good: Level::L1,
            extein_good: Level::L1,
            single_target: Some(SingleTarget {
                target: "intein1".to_string(),
                evalue,
                rs,
                re,
            }),
        }
    }

    #[test]
    fn refinement_gate_drops_below_min_len_when_enabled() {
        let mut regions_by_query = IndexMap::new();
        regions_by_query.insert(
            "q0".to_string(),
            vec![Region { id: 0, qstart: 1, qend: 500 }],
        );
        let mut checks = IndexMap::new();
        // refined length = 110 - below REGION_MIN_LEN (114)
        checks.insert(
            ("q0".to_string(), 0),
            region_check_with_single("q0", 0, 100, 209, 1e-30),
        );

        let gated = refine_regions(&regions_by_query, &checks, 1e-5, true);
        assert!(gated.is_empty());

        let ungated = refine_regions(&regions_by_query, &checks, 1e-5, false);
        assert_eq!(ungated.len(), 1);
        assert_eq!(ungated[0].length, 110);
    }

    #[test]
    fn no_qualifying_single_target_keeps_coarse_region() {
        let mut regions_by_query = IndexMap::new();
        regions_by_query.insert(
            "q0".to_string(),
            vec![Region { id: 0, qstart: 10, qend: 500 }],
        );
        let refined = refine_regions(&regions_by_query, &IndexMap::new(), 1e-5, false);
        assert_eq!(refined.len(), 1);
        assert_eq!(refined[0].start, 10);
        assert_eq!(refined[0].end, 500);
        assert!(refined[0].refining_target.is_none());
    }

    #[test]
    fn single_target_evalue_above_threshold_is_not_used() {
        let mut regions_by_query = IndexMap::new();
        regions_by_query.insert(
            "q0".to_string(),
            vec![Region { id: 0, qstart: 10, qend: 500 }],
        );
        let mut checks = IndexMap::new();
        checks.insert(
            ("q0".to_string(), 0),
            region_check_with_single("q0", 0, 100, 400, 1e-2),
        );
        let refined = refine_regions(&regions_by_query, &checks, 1e-5, false);
        assert_eq!(refined[0].start, 10);
        assert!(refined[0].refining_target.is_none());
    }
}
