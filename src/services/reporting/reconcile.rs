use std::collections::BTreeSet;

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, utoipa::ToSchema)]
pub struct EntityPair {
    pub source: String,
    pub tablename: String,
}

impl EntityPair {
    pub fn new(source: impl Into<String>, tablename: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            tablename: tablename.into(),
        }
    }
}

pub type EntityPairSet = BTreeSet<EntityPair>;

/// Pairs in `universe` that neither outcome category accounted for.
pub fn reconcile(universe: &EntityPairSet, accounted: &EntityPairSet) -> EntityPairSet {
    universe.difference(accounted).cloned().collect()
}

pub fn accounted(success: &EntityPairSet, failure: &EntityPairSet) -> EntityPairSet {
    success.union(failure).cloned().collect()
}
