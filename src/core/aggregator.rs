//! Criterion Aggregator (spec §4.G): folds per-hit criteria lines into
//! per-(query, region) verdicts using the "best evidence" rule — the
//! first qualifying target in evalue order wins the single-target slot,
//! and every field upgrades monotonically via the `Level` lattice
//! (spec.md §9).

use indexmap::IndexMap;

use crate::core::checker::CriteriaLine;
use crate::core::residue::Level;

/// The best single target whose evidence alone satisfies every
/// criterion for a (query, region) pair (spec §4.G).
#[derive(Debug, Clone, PartialEq)]
pub struct SingleTarget {
    pub target: String,
    pub evalue: f64,
    pub rs: u32,
    pub re: u32,
}

/// Condensed per-(query, region) verdict.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionCheck {
    pub query: String,
    pub region_id: usize,
    pub region_good: Level,
    pub start_good: Level,
    pub end_good: Level,
    pub extein_good: Level,
    pub single_target: Option<SingleTarget>,
}

impl RegionCheck {
    /// Whether the *combined* evidence — possibly assembled from more
    /// than one target hit — satisfies all four criteria (spec §8's
    /// invariant: if this holds, `single_target` must be set too, but
    /// not conversely; this is the "multi.target" condensed-table
    /// column, spec §4.I).
    pub fn multi_target_all_good(&self, n_term_strictness: u8, c_term_strictness: u8) -> bool {
        self.region_good == Level::L1
            && self.start_good.passes(n_term_strictness)
            && self.end_good.passes(c_term_strictness)
            && self.extein_good == Level::L1
    }

    fn new(query: String, region_id: usize) -> Self {
        RegionCheck {
            query,
            region_id,
            region_good: Level::No,
            start_good: Level::No,
            end_good: Level::No,
            extein_good: Level::No,
            single_target: None,
        }
    }
}

/// Folds the sorted criteria lines (spec §4.F's sort: query asc,
/// region_index asc, evalue asc) into one `RegionCheck` per (query,
/// region). Callers MUST supply `lines` already sorted that way — the
/// single-target "first qualifying wins" rule depends on it.
pub fn aggregate(
    lines: &[CriteriaLine],
    n_term_strictness: u8,
    c_term_strictness: u8,
) -> IndexMap<(String, usize), RegionCheck> {
    let mut checks: IndexMap<(String, usize), RegionCheck> = IndexMap::new();

    for line in lines {
        let key = (line.query.clone(), line.region_id);
        let check = checks
            .entry(key)
            .or_insert_with(|| RegionCheck::new(line.query.clone(), line.region_id));

        let start_pass = line.start_good.passes(n_term_strictness);
        let end_pass = line.end_good.passes(c_term_strictness);
        let all_good =
            line.region_good == Level::L1 && start_pass && end_pass && line.extein_good == Level::L1;

        if all_good && check.single_target.is_none() {
            check.single_target = Some(SingleTarget {
                target: line.target.clone(),
                evalue: line.evalue,
                rs: line.rs,
                re: line.re,
            });
        }

        check.region_good = check.region_good.max(line.region_good);
        if start_pass {
            check.start_good = check.start_good.max(line.start_good);
        }
        if end_pass {
            check.end_good = check.end_good.max(line.end_good);
        }
        check.extein_good = check.extein_good.max(line.extein_good);
    }

    checks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(query: &str, region_id: usize, target: &str, evalue: f64, all_good: bool) -> CriteriaLine {
        let (region_good, start_good, end_good, extein_good) = if all_good {
            (Level::L1, Level::L1, Level::L1, Level::L1)
        } else {
            (Level::No, Level::No, Level::No, Level::No)
        };
        CriteriaLine {
            query: query.to_string(),
            target: target.to_string(),
            evalue,
            region_id,
            rs: 10,
            re: 400,
            region_good,
            start_good,
            end_good,
            extein_good,
        }
    }

    #[test]
    fn best_evalue_wins_single_target_slot() {
        // Caller sorts ascending by evalue; the worse hit (1e-15) must
        // not overwrite the better one even if it also passes.
        let lines = vec![
            line("q0", 0, "t1", 1e-20, true),
            line("q0", 0, "t2", 1e-15, true),
        ];
        let checks = aggregate(&lines, 1, 1);
        let check = &checks[&("q0".to_string(), 0)];
        assert_eq!(check.single_target.as_ref().unwrap().target, "t1");
        assert_eq!(check.single_target.as_ref().unwrap().evalue, 1e-20);
    }

    #[test]
    fn fields_never_downgrade() {
        let mut lines = vec![line("q0", 0, "t1", 1e-20, true)];
        lines.push(CriteriaLine {
            region_good: Level::No,
            start_good: Level::No,
            end_good: Level::No,
            extein_good: Level::No,
            ..line("q0", 0, "t2", 1e-10, false)
        });
        let checks = aggregate(&lines, 1, 1);
        let check = &checks[&("q0".to_string(), 0)];
        assert_eq!(check.region_good, Level::L1);
        assert_eq!(check.start_good, Level::L1);
        assert_eq!(check.end_good, Level::L1);
        assert_eq!(check.extein_good, Level::L1);
    }

    #[test]
    fn no_passing_line_means_no_single_target() {
        let lines = vec![line("q0", 0, "t1", 1e-20, false)];
        let checks = aggregate(&lines, 1, 1);
        let check = &checks[&("q0".to_string(), 0)];
        assert!(check.single_target.is_none());
    }

    #[test]
    fn multi_target_can_be_all_good_without_a_single_qualifying_hit() {
        // Region-good comes from one hit, start/end/extein from another;
        // no single line satisfies all four, so single_target stays
        // None even though the combined picture is "all good".
        let region_only = CriteriaLine {
            region_good: Level::L1,
            start_good: Level::No,
            end_good: Level::No,
            extein_good: Level::No,
            ..line("q0", 0, "t1", 1e-20, false)
        };
        let rest_only = CriteriaLine {
            region_good: Level::No,
            start_good: Level::L1,
            end_good: Level::L1,
            extein_good: Level::L1,
            ..line("q0", 0, "t2", 1e-10, false)
        };
        let checks = aggregate(&[region_only, rest_only], 1, 1);
        let check = &checks[&("q0".to_string(), 0)];
        assert!(check.single_target.is_none());
        assert!(check.multi_target_all_good(1, 1));
    }

    #[test]
    fn strictness_2_allows_l2_upgrades() {
        let mut l = line("q0", 0, "t1", 1e-20, false);
        l.start_good = Level::L2;
        l.end_good = Level::L2;
        l.region_good = Level::L1;
        l.extein_good = Level::L1;
        let checks = aggregate(&[l], 2, 2);
        let check = &checks[&("q0".to_string(), 0)];
        assert_eq!(check.start_good, Level::L2);
        assert_eq!(check.end_good, Level::L2);
        assert!(check.single_target.is_some());
    }
}
