//! Membership cache
//!
//! The set of id64 values known to be in the local store. Built from the store
//! once, grown after every successful persist, never shrunk.

use crate::store::ProfileStore;
use crate::Result;
use std::collections::HashSet;
use std::sync::{PoisonError, RwLock};
use tokio::sync::{Mutex, MutexGuard};

pub struct MembershipCache {
    known: RwLock<HashSet<u64>>,
    /// Held across re-check, fetch, persist and mark so that two callers never
    /// fetch or insert the same id
    fill_gate: Mutex<()>,
}

impl MembershipCache {
    /// Cache seeded with the given ids
    pub fn from_ids(ids: impl IntoIterator<Item = u64>) -> Self {
        Self {
            known: RwLock::new(ids.into_iter().collect()),
            fill_gate: Mutex::new(()),
        }
    }

    /// Scan every id in the store
    pub async fn load(store: &dyn ProfileStore) -> Result<Self> {
        let ids = store.profile_ids().await?;
        tracing::info!(count = ids.len(), "Loaded membership cache");
        Ok(Self::from_ids(ids))
    }

    pub fn contains(&self, id64: u64) -> bool {
        self.known
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&id64)
    }

    pub fn len(&self) -> usize {
        self.known.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Split ids into (known, unknown), each keeping input order
    pub fn partition(&self, ids: &[u64]) -> (Vec<u64>, Vec<u64>) {
        let known = self.known.read().unwrap_or_else(PoisonError::into_inner);
        ids.iter().copied().partition(|id| known.contains(id))
    }

    /// Record ids as persisted; only call after the store write succeeded
    pub(crate) fn mark_known(&self, ids: impl IntoIterator<Item = u64>) {
        self.known
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(ids);
    }

    pub(crate) async fn fill_gate(&self) -> MutexGuard<'_, ()> {
        self.fill_gate.lock().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SteamProfile;
    use crate::store::MemoryProfileStore;

    #[test]
    fn test_partition_keeps_order() {
        let cache = MembershipCache::from_ids([2, 4]);
        let (known, unknown) = cache.partition(&[5, 4, 3, 2, 1]);
        assert_eq!(known, vec![4, 2]);
        assert_eq!(unknown, vec![5, 3, 1]);
    }

    #[test]
    fn test_mark_known_grows() {
        let cache = MembershipCache::from_ids([]);
        assert!(cache.is_empty());
        cache.mark_known([7, 8]);
        cache.mark_known([8]);
        assert_eq!(cache.len(), 2);
        assert!(cache.contains(7));
    }

    #[tokio::test]
    async fn test_load_from_store() {
        let store = MemoryProfileStore::with_profiles([100, 200].map(|id64| SteamProfile {
            id64,
            ..Default::default()
        }));
        let cache = MembershipCache::load(&store).await.unwrap();
        assert_eq!(cache.len(), 2);
        assert!(cache.contains(100));
        assert!(!cache.contains(300));
    }
}
