//! Query canonical-id numbering (spec §3). Canonical ids are used through
//! all external tool invocations; original ids are restored in outputs.

use std::collections::HashMap;

use crate::core::fasta_store::FastaStore;

/// One query protein: its original id (as found in the user's FASTA) and
/// the canonical id assigned to it by stable input-order numbering.
#[derive(Debug, Clone)]
pub struct Query {
    pub original_id: String,
    pub canonical_id: String,
}

/// Bijective lookup between original and canonical query ids, built once
/// from a loaded `FastaStore` in FASTA input order.
#[derive(Debug, Clone, Default)]
pub struct QueryRegistry {
    by_canonical: HashMap<String, Query>,
    by_original: HashMap<String, String>,
}

impl QueryRegistry {
    /// Assigns `user_query___seq_<n>` canonical ids in the order records
    /// were read from `store` (spec §3).
    pub fn from_store(store: &FastaStore) -> Self {
        let mut registry = QueryRegistry::default();

        for (n, record) in store.iter().enumerate() {
            let canonical_id = format!("user_query___seq_{n}");
            registry
                .by_original
                .insert(record.id.clone(), canonical_id.clone());
            registry.by_canonical.insert(
                canonical_id.clone(),
                Query {
                    original_id: record.id.clone(),
                    canonical_id,
                },
            );
        }

        registry
    }

    pub fn by_canonical_id(&self, canonical_id: &str) -> Option<&Query> {
        self.by_canonical.get(canonical_id)
    }

    pub fn original_id_of(&self, canonical_id: &str) -> Option<&str> {
        self.by_canonical
            .get(canonical_id)
            .map(|q| q.original_id.as_str())
    }

    pub fn canonical_id_of(&self, original_id: &str) -> Option<&str> {
        self.by_original.get(original_id).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.by_canonical.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn assigns_stable_numbering_in_input_order() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, ">query_b\nAAAA\n>query_a\nCCCC\n").unwrap();
        file.flush().unwrap();

        let store = FastaStore::load(file.path()).unwrap();
        let registry = QueryRegistry::from_store(&store);

        assert_eq!(registry.len(), 2);
        assert_eq!(
            registry.canonical_id_of("query_b").unwrap(),
            "user_query___seq_0"
        );
        assert_eq!(
            registry.canonical_id_of("query_a").unwrap(),
            "user_query___seq_1"
        );
        assert_eq!(
            registry.original_id_of("user_query___seq_0").unwrap(),
            "query_b"
        );
    }
}
