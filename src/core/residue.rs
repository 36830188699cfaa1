//! Residue classifier (spec §4.A): maps an amino acid or dipeptide string
//! against curated sets and reports a three-level evidence tag.

use phf::{Set, phf_set};

/// Three-level evidence tag, ordered `No < L2 < L1` so aggregation can use
/// a plain `max` instead of stringly-typed comparisons (spec.md §9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    No,
    L2,
    L1,
}

impl Level {
    /// Strictness-gated pass predicate (spec §4.A): only `L1` passes at
    /// strictness 1; `L1` or `L2` pass at strictness 2.
    pub fn passes(self, strictness: u8) -> bool {
        match self {
            Level::L1 => true,
            Level::L2 => strictness >= 2,
            Level::No => false,
        }
    }

    /// The literal tag used in output tables (spec §4.I): `"L1"`,
    /// `"L2"`, or `"No"`.
    pub fn as_str(self) -> &'static str {
        match self {
            Level::L1 => "L1",
            Level::L2 => "L2",
            Level::No => "No",
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// N-terminus Level 1 residues.
pub static N_TERM_L1: Set<&'static str> = phf_set! { "C", "S", "A", "Q", "P", "T" };
/// N-terminus Level 2 residues.
pub static N_TERM_L2: Set<&'static str> = phf_set! { "V", "F", "N", "G", "M", "L" };

/// C-terminus dipeptide Level 1 set.
pub static C_TERM_L1: Set<&'static str> =
    phf_set! { "HN", "SN", "GN", "GQ", "LD", "FN" };
/// C-terminus dipeptide Level 2 set.
pub static C_TERM_L2: Set<&'static str> = phf_set! {
    "KN", "AN", "HQ", "PP", "TH", "CN", "KQ", "LH", "NS", "NT", "VH"
};

/// Extein-start residues (binary: `L1` or `No`, no Level 2 tier).
pub static EXTEIN_START: Set<&'static str> = phf_set! { "S", "T", "C" };

/// Classifies an upper-cased residue (or dipeptide) string against a
/// Level-1 / Level-2 set pair. Unknown residues yield `No`; there are no
/// error cases (spec §4.A).
pub fn classify(s: &str, l1: &Set<&'static str>, l2: &Set<&'static str>) -> Level {
    let upper = s.to_ascii_uppercase();
    if l1.contains(upper.as_str()) {
        Level::L1
    } else if l2.contains(upper.as_str()) {
        Level::L2
    } else {
        Level::No
    }
}

/// Classifies an extein-start residue: `L1` if it is one of `{S, T, C}`,
/// else `No`. Not a three-tier test (spec §4.F step 7).
pub fn classify_extein_start(residue: Option<&str>) -> Level {
    match residue {
        Some(r) if EXTEIN_START.contains(r.to_ascii_uppercase().as_str()) => Level::L1,
        _ => Level::No,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_residue_tests() {
        assert_eq!(classify("C", &N_TERM_L1, &N_TERM_L2), Level::L1);
        assert_eq!(classify("V", &N_TERM_L1, &N_TERM_L2), Level::L2);
        assert_eq!(classify("X", &N_TERM_L1, &N_TERM_L2), Level::No);
    }

    #[test]
    fn end_dipeptide_tests() {
        assert_eq!(classify("HN", &C_TERM_L1, &C_TERM_L2), Level::L1);
        assert_eq!(classify("AN", &C_TERM_L1, &C_TERM_L2), Level::L2);
        assert_eq!(classify("QQ", &C_TERM_L1, &C_TERM_L2), Level::No);
    }

    #[test]
    fn lowercase_input_is_upcased() {
        assert_eq!(classify("c", &N_TERM_L1, &N_TERM_L2), Level::L1);
        assert_eq!(classify("hn", &C_TERM_L1, &C_TERM_L2), Level::L1);
    }

    #[test]
    fn strictness_gate() {
        assert!(Level::L1.passes(1));
        assert!(Level::L1.passes(2));
        assert!(!Level::L2.passes(1));
        assert!(Level::L2.passes(2));
        assert!(!Level::No.passes(1));
        assert!(!Level::No.passes(2));
    }

    #[test]
    fn extein_start_is_binary() {
        assert_eq!(classify_extein_start(Some("S")), Level::L1);
        assert_eq!(classify_extein_start(Some("t")), Level::L1);
        assert_eq!(classify_extein_start(Some("V")), Level::No);
        assert_eq!(classify_extein_start(None), Level::No);
    }

    #[test]
    fn level_ordering_is_a_lattice() {
        assert!(Level::No < Level::L2);
        assert!(Level::L2 < Level::L1);
        assert_eq!(Level::No.max(Level::L1), Level::L1);
        assert_eq!(Level::L2.max(Level::No), Level::L2);
    }
}
