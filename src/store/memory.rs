//! In-memory profile store
//!
//! Same contract as the SQLite store without a database file. Counts every call
//! and can be told to fail inserts, which makes it the store of choice for
//! exercising the coordinator.

use super::ProfileStore;
use crate::models::SteamProfile;
use crate::{Result, SteamDataError};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;

#[derive(Default)]
pub struct MemoryProfileStore {
    rows: RwLock<BTreeMap<u64, SteamProfile>>,
    fail_inserts: AtomicBool,
    reads: AtomicUsize,
    insert_batches: AtomicUsize,
    inserted_rows: AtomicUsize,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with profiles
    pub fn with_profiles(profiles: impl IntoIterator<Item = SteamProfile>) -> Self {
        let store = Self::new();
        if let Ok(mut rows) = store.rows.write() {
            rows.extend(profiles.into_iter().map(|p| (p.id64, p)));
        }
        store
    }

    /// Make every following insert fail until switched off again
    pub fn set_fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }

    /// Drop a row behind the caller's back
    pub fn remove(&self, id64: u64) -> Option<SteamProfile> {
        self.rows.write().ok()?.remove(&id64)
    }

    pub fn contains(&self, id64: u64) -> bool {
        self.rows
            .read()
            .map(|rows| rows.contains_key(&id64))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.rows.read().map(|rows| rows.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of read calls (all kinds)
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of successful `insert_profiles` calls
    pub fn insert_batch_count(&self) -> usize {
        self.insert_batches.load(Ordering::SeqCst)
    }

    /// Total rows written by successful inserts
    pub fn inserted_row_count(&self) -> usize {
        self.inserted_rows.load(Ordering::SeqCst)
    }

    fn poisoned() -> SteamDataError {
        SteamDataError::Store("memory store lock poisoned".to_string())
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn profile_ids(&self) -> Result<Vec<u64>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let rows = self.rows.read().map_err(|_| Self::poisoned())?;
        Ok(rows.keys().copied().collect())
    }

    async fn profiles_by_id(&self, id64: u64) -> Result<Vec<SteamProfile>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let rows = self.rows.read().map_err(|_| Self::poisoned())?;
        Ok(rows.get(&id64).cloned().into_iter().collect())
    }

    async fn profiles_by_country(&self, country_code: &str) -> Result<Vec<SteamProfile>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let rows = self.rows.read().map_err(|_| Self::poisoned())?;
        Ok(rows
            .values()
            .filter(|p| p.country_code.as_deref() == Some(country_code))
            .cloned()
            .collect())
    }

    async fn insert_profiles(&self, profiles: &[SteamProfile]) -> Result<()> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(SteamDataError::Store("insert rejected".to_string()));
        }

        let mut rows = self.rows.write().map_err(|_| Self::poisoned())?;

        // Validate the whole batch before touching anything
        let mut seen = std::collections::HashSet::new();
        for p in profiles {
            if rows.contains_key(&p.id64) || !seen.insert(p.id64) {
                return Err(SteamDataError::Store(format!(
                    "UNIQUE constraint failed: SteamProfiles.Id64 ({})",
                    p.id64
                )));
            }
        }

        for p in profiles {
            rows.insert(p.id64, p.clone());
        }

        self.insert_batches.fetch_add(1, Ordering::SeqCst);
        self.inserted_rows.fetch_add(profiles.len(), Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(id64: u64) -> SteamProfile {
        SteamProfile {
            id64,
            persona_name: format!("p{}", id64),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_duplicate_rejects_whole_batch() {
        let store = MemoryProfileStore::with_profiles([profile(1)]);
        let result = store.insert_profiles(&[profile(2), profile(1)]).await;
        assert!(result.unwrap_err().is_store_error());
        assert!(!store.contains(2));
        assert_eq!(store.insert_batch_count(), 0);
    }

    #[tokio::test]
    async fn test_fail_switch() {
        let store = MemoryProfileStore::new();
        store.set_fail_inserts(true);
        assert!(store.insert_profiles(&[profile(1)]).await.is_err());

        store.set_fail_inserts(false);
        store.insert_profiles(&[profile(1)]).await.unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.inserted_row_count(), 1);
    }

    #[tokio::test]
    async fn test_reads_are_counted() {
        let store = MemoryProfileStore::with_profiles([profile(1)]);
        assert_eq!(store.profiles_by_id(1).await.unwrap().len(), 1);
        assert!(store.profiles_by_id(2).await.unwrap().is_empty());
        assert_eq!(store.read_count(), 2);
    }
}
