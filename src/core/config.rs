//! Run configuration (spec §4.J): every option a pipeline entry point
//! needs, built directly by the binary's `clap::Parser` or constructed
//! programmatically by library consumers and tests. Validation is
//! centralized in `Config::validate`, the way the teacher's tools
//! fail fast with a message naming the offending option.

use std::path::PathBuf;

use anyhow::Result;

use crate::core::error::PipelineError;

/// Fixed padding used when the clipping window is computed (spec §3),
/// unless overridden.
pub const DEFAULT_PADDING: usize = 10;

#[derive(Debug, Clone)]
pub struct Config {
    pub n_term_strictness: u8,
    pub c_term_strictness: u8,
    pub refinement_strictness: u8,
    pub use_length_in_refinement: bool,

    pub evalue_rpsblast: f64,
    pub evalue_mmseqs: f64,
    pub evalue_region_refinement: f64,

    pub cpus: usize,
    pub padding: usize,

    pub queries_fasta: PathBuf,
    pub inteins_fasta: PathBuf,
    pub profile_hits: PathBuf,
    pub sequence_hits: PathBuf,

    pub aligner_bin: PathBuf,
    pub alignment_dir: PathBuf,
    pub output_dir: PathBuf,
    pub keep_alignments: bool,
}

impl Config {
    /// Validates every option named in spec §4.J, returning the first
    /// violation found as a `ConfigurationError` naming the offending
    /// field.
    pub fn validate(&self) -> Result<()> {
        for (label, value) in [
            ("n_term_strictness", self.n_term_strictness),
            ("c_term_strictness", self.c_term_strictness),
        ] {
            if !(1..=2).contains(&value) {
                return Err(PipelineError::Configuration(format!(
                    "{label} must be 1 or 2, got {value}"
                ))
                .into());
            }
        }

        if self.refinement_strictness != 1 {
            return Err(PipelineError::Configuration(format!(
                "refinement_strictness must be 1, got {}",
                self.refinement_strictness
            ))
            .into());
        }

        for (label, value) in [
            ("evalue_rpsblast", self.evalue_rpsblast),
            ("evalue_mmseqs", self.evalue_mmseqs),
            ("evalue_region_refinement", self.evalue_region_refinement),
        ] {
            if !(value > 0.0 && value <= 0.1) {
                return Err(PipelineError::Configuration(format!(
                    "{label} must be in (0, 0.1], got {value}"
                ))
                .into());
            }
        }

        if self.cpus < 1 {
            return Err(
                PipelineError::Configuration("cpus must be at least 1".to_string()).into(),
            );
        }

        for (label, path) in [
            ("queries_fasta", &self.queries_fasta),
            ("inteins_fasta", &self.inteins_fasta),
            ("profile_hits", &self.profile_hits),
            ("sequence_hits", &self.sequence_hits),
        ] {
            if !path.exists() {
                return Err(PipelineError::Configuration(format!(
                    "{label} path does not exist: {path:?}"
                ))
                .into());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn existing_file() -> PathBuf {
        let file = tempfile::NamedTempFile::new().unwrap();
        let path = file.path().to_path_buf();
        std::mem::forget(file);
        path
    }

    fn valid_config() -> Config {
        let existing = existing_file();
        Config {
            n_term_strictness: 1,
            c_term_strictness: 1,
            refinement_strictness: 1,
            use_length_in_refinement: true,
            evalue_rpsblast: 1e-5,
            evalue_mmseqs: 1e-5,
            evalue_region_refinement: 1e-5,
            cpus: 4,
            padding: DEFAULT_PADDING,
            queries_fasta: existing.clone(),
            inteins_fasta: existing.clone(),
            profile_hits: existing.clone(),
            sequence_hits: existing,
            aligner_bin: PathBuf::from("mafft"),
            alignment_dir: PathBuf::from("/tmp/intein-finder-alignments"),
            output_dir: PathBuf::from("/tmp/intein-finder-output"),
            keep_alignments: false,
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn refinement_strictness_other_than_one_is_rejected() {
        let mut config = valid_config();
        config.refinement_strictness = 2;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("refinement_strictness"));
    }

    #[test]
    fn strictness_out_of_range_is_rejected() {
        let mut config = valid_config();
        config.n_term_strictness = 3;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("n_term_strictness"));
    }

    #[test]
    fn evalue_above_cap_is_rejected() {
        let mut config = valid_config();
        config.evalue_mmseqs = 0.5;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("evalue_mmseqs"));
    }

    #[test]
    fn zero_cpus_is_rejected() {
        let mut config = valid_config();
        config.cpus = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("cpus"));
    }

    #[test]
    fn missing_input_path_is_rejected() {
        let mut config = valid_config();
        config.queries_fasta = PathBuf::from("/no/such/file/here.fasta");
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("queries_fasta"));
    }
}
