//! Lookup of stores currently eligible to appear in results.

use std::collections::HashMap;

use stockfinder_core::{StoreId, StoreRecord};

/// Read-only map of approved stores keyed by canonical id.
///
/// Rebuilt for every query so an approval revoked upstream takes effect on the
/// next search.
#[derive(Debug, Clone, Default)]
pub struct ApprovedStoreIndex {
    stores: HashMap<StoreId, StoreRecord>,
}

impl ApprovedStoreIndex {
    /// Keep only `approved` records. Later duplicates of an id replace earlier ones.
    #[must_use]
    pub fn build(records: Vec<StoreRecord>) -> Self {
        let total = records.len();
        let stores: HashMap<StoreId, StoreRecord> = records
            .into_iter()
            .filter(StoreRecord::is_approved)
            .map(|record| (record.id.clone(), record))
            .collect();
        tracing::debug!(total, approved = stores.len(), "built approved store index");
        Self { stores }
    }

    #[must_use]
    pub fn get(&self, id: &StoreId) -> Option<&StoreRecord> {
        self.stores.get(id)
    }

    #[must_use]
    pub fn contains(&self, id: &StoreId) -> bool {
        self.stores.contains_key(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.stores.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }
}
