//! Hit table (spec §4.C): parses a tab-separated homology-hit line into a
//! typed `Hit`, applying the secondary evalue filter the core layers on
//! top of whatever the upstream search tool already thresholded at.

use anyhow::Result;

use crate::core::error::PipelineError;

/// Which homology search a hit came from. Only `Sequence` hits drive
/// residue checking (spec §4.F); `Profile` hits only feed Region Builder
/// and the query summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HitSource {
    Profile,
    Sequence,
}

/// One row of tabular homology output (spec §3, §6). Coordinates are
/// 1-based inclusive, as the upstream search tools emit them.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub source: HitSource,
    pub query: String,
    pub target: String,
    pub pident: f64,
    pub alnlen: u32,
    pub mismatch: u32,
    pub gapopen: u32,
    pub qstart: u32,
    pub qend: u32,
    pub tstart: u32,
    pub tend: u32,
    pub evalue: f64,
    pub bitscore: f64,
    /// Present for sequence-search hits only (index 13 of that format).
    pub target_length: Option<u32>,
}

fn field<'a>(fields: &'a [&'a str], idx: usize, name: &str, line: &str) -> Result<&'a str> {
    fields.get(idx).copied().ok_or_else(|| {
        PipelineError::InputFormat(format!(
            "missing field {idx} ({name}) in hit line: {line:?}"
        ))
        .into()
    })
}

fn parse_field<T: std::str::FromStr>(fields: &[&str], idx: usize, name: &str, line: &str) -> Result<T> {
    let raw = field(fields, idx, name, line)?;
    raw.parse::<T>().map_err(|_| {
        PipelineError::InputFormat(format!(
            "could not parse field {idx} ({name}) = {raw:?} in hit line: {line:?}"
        ))
        .into()
    })
}

/// Parses one tab-separated hit line. Returns `Ok(None)` if the hit's
/// evalue exceeds `evalue_threshold` (the core's secondary filter, spec
/// §4.C) — that is not an error, just a discarded row. Parse errors on
/// required fields are fatal (`InputFormatError`, spec §7).
pub fn parse_hit_line(line: &str, source: HitSource, evalue_threshold: f64) -> Result<Option<Hit>> {
    let fields: Vec<&str> = line.split('\t').collect();

    let evalue: f64 = parse_field(&fields, 10, "evalue", line)?;
    if evalue > evalue_threshold {
        return Ok(None);
    }

    let target_length = if source == HitSource::Sequence {
        Some(parse_field(&fields, 13, "target length", line)?)
    } else {
        None
    };

    let hit = Hit {
        source,
        query: field(&fields, 0, "query", line)?.to_string(),
        target: field(&fields, 1, "target", line)?.to_string(),
        pident: parse_field(&fields, 2, "pident", line)?,
        alnlen: parse_field(&fields, 3, "alnlen", line)?,
        mismatch: parse_field(&fields, 4, "mismatch", line)?,
        gapopen: parse_field(&fields, 5, "gapopen", line)?,
        qstart: parse_field(&fields, 6, "qstart", line)?,
        qend: parse_field(&fields, 7, "qend", line)?,
        tstart: parse_field(&fields, 8, "tstart", line)?,
        tend: parse_field(&fields, 9, "tend", line)?,
        evalue,
        bitscore: parse_field(&fields, 11, "bitscore", line)?,
        target_length,
    };

    Ok(Some(hit))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(evalue: &str) -> String {
        format!("q1\tt1\t99.0\t100\t1\t0\t10\t50\t1\t40\t{evalue}\t200.0")
    }

    #[test]
    fn parses_required_fields() {
        let hit = parse_hit_line(&line("1e-30"), HitSource::Profile, 1e-5)
            .unwrap()
            .unwrap();
        assert_eq!(hit.query, "q1");
        assert_eq!(hit.target, "t1");
        assert_eq!(hit.qstart, 10);
        assert_eq!(hit.qend, 50);
        assert_eq!(hit.evalue, 1e-30);
        assert_eq!(hit.target_length, None);
    }

    #[test]
    fn sequence_hits_carry_target_length() {
        let l = format!("{}\t55\t120", line("1e-30"));
        let hit = parse_hit_line(&l, HitSource::Sequence, 1e-5).unwrap().unwrap();
        assert_eq!(hit.target_length, Some(120));
    }

    #[test]
    fn hits_above_threshold_are_discarded_not_errors() {
        let result = parse_hit_line(&line("0.5"), HitSource::Profile, 1e-5).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn malformed_required_field_is_fatal() {
        let bad = "q1\tt1\t99.0\tNOTANUMBER\t1\t0\t10\t50\t1\t40\t1e-30\t200.0";
        let err = parse_hit_line(bad, HitSource::Profile, 1e-5).unwrap_err();
        assert!(err.to_string().contains("input format error"));
    }
}
