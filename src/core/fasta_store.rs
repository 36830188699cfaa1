//! FASTA store (spec §4.B): an in-memory id -> record map for queries and,
//! separately, for inteins. Adapted from the teacher's
//! `utils/fasta_utils.rs`, which loaded a bare `HashMap<String, Vec<u8>>`
//! and `.expect()`-ed on bad records; this version keeps the record's
//! case as read and turns duplicate ids into a reported error instead of
//! silently overwriting the earlier entry.

use std::path::Path;

use anyhow::{Context, Result};
use bio::io::fasta;
use indexmap::IndexMap;

use crate::core::error::PipelineError;

/// A single FASTA record, case preserved exactly as read.
#[derive(Debug, Clone)]
pub struct FastaRecord {
    pub id: String,
    pub seq: Vec<u8>,
}

impl FastaRecord {
    /// Upper-cased sequence, for residue-test consumers (spec §4.B).
    pub fn seq_upper(&self) -> Vec<u8> {
        let mut upper = self.seq.clone();
        upper.make_ascii_uppercase();
        upper
    }
}

/// In-memory mapping from sequence id to record. Preserves the order
/// records were read from the FASTA file, since the Query canonical-id
/// numbering (spec §3) is defined over input order.
#[derive(Debug, Clone, Default)]
pub struct FastaStore {
    records: IndexMap<String, FastaRecord>,
}

impl FastaStore {
    pub fn get(&self, id: &str) -> Option<&FastaRecord> {
        self.records.get(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FastaRecord> {
        self.records.values()
    }

    /// Loads a FASTA file into a store. Duplicate ids within the file are
    /// a fatal `InputFormatError` (spec §4.B, §7).
    pub fn load(path: &Path) -> Result<Self> {
        let reader = fasta::Reader::from_file(path)
            .with_context(|| format!("could not open FASTA file {:?}", path))?;

        let mut records = IndexMap::new();

        for result in reader.records() {
            let record = result
                .with_context(|| format!("failed to parse a FASTA record in {:?}", path))?;
            let id = record.id().to_string();

            if records.contains_key(&id) {
                return Err(PipelineError::InputFormat(format!(
                    "duplicate sequence id {:?} in {:?}",
                    id, path
                ))
                .into());
            }

            records.insert(
                id.clone(),
                FastaRecord {
                    id,
                    seq: record.seq().to_vec(),
                },
            );
        }

        Ok(FastaStore { records })
    }
}
