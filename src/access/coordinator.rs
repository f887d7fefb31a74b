//! Profile access coordinator
//!
//! Decides per id whether a profile is read from the local store or fetched
//! from the remote source and written back.

use super::membership::MembershipCache;
use crate::models::SteamProfile;
use crate::remote::RemoteSource;
use crate::store::ProfileStore;
use crate::{Result, SteamDataError};
use futures::future::try_join_all;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Behaviour switches for [`SteamProfileAccess`]
#[derive(Debug, Clone)]
pub struct AccessOptions {
    /// Download avatar images for newly fetched profiles
    pub fetch_avatars: bool,
}

impl Default for AccessOptions {
    fn default() -> Self {
        Self {
            fetch_avatars: true,
        }
    }
}

impl From<&crate::config::SteamDataConfig> for AccessOptions {
    fn from(config: &crate::config::SteamDataConfig) -> Self {
        Self {
            fetch_avatars: config.avatars.fetch,
        }
    }
}

/// Read-through access to Steam profiles
///
/// Profiles whose id is in the membership cache are served from the store.
/// Everything else is fetched remotely as one batch, enriched with avatar
/// bytes, inserted, and only then marked known. Stored profiles are never
/// updated.
pub struct SteamProfileAccess {
    store: Arc<dyn ProfileStore>,
    remote: Arc<dyn RemoteSource>,
    cache: Arc<MembershipCache>,
    options: AccessOptions,
}

impl SteamProfileAccess {
    /// Load the membership cache from the store and build the coordinator
    pub async fn init(
        store: Arc<dyn ProfileStore>,
        remote: Arc<dyn RemoteSource>,
        options: AccessOptions,
    ) -> Result<Self> {
        let cache = MembershipCache::load(store.as_ref()).await?;
        Ok(Self::with_cache(store, remote, Arc::new(cache), options))
    }

    /// Build around an already loaded cache
    pub fn with_cache(
        store: Arc<dyn ProfileStore>,
        remote: Arc<dyn RemoteSource>,
        cache: Arc<MembershipCache>,
        options: AccessOptions,
    ) -> Self {
        Self {
            store,
            remote,
            cache,
            options,
        }
    }

    pub fn cache(&self) -> &MembershipCache {
        &self.cache
    }

    /// Number of ids known to be stored
    pub fn known_count(&self) -> usize {
        self.cache.len()
    }

    /// Get profiles for a set of ids
    ///
    /// Duplicate ids are ignored. The result lists the stored profiles first,
    /// then the freshly fetched ones, each group in request order. Ids the
    /// remote does not know are left out.
    pub async fn get_profiles(
        &self,
        ids: &[u64],
        cancel: &CancellationToken,
    ) -> Result<Vec<SteamProfile>> {
        let ids = unique_ids(ids);
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let (known, unknown) = self.cache.partition(&ids);
        debug!(
            known = known.len(),
            unknown = unknown.len(),
            "Partitioned profile request"
        );

        let mut profiles = Vec::with_capacity(ids.len());
        for id64 in known {
            profiles.push(self.read_stored(id64).await?);
        }

        if !unknown.is_empty() {
            profiles.extend(self.fill(unknown, cancel).await?);
        }

        Ok(profiles)
    }

    /// Get a single profile
    pub async fn get_profile(&self, id64: u64, cancel: &CancellationToken) -> Result<SteamProfile> {
        if self.cache.contains(id64) {
            return self.read_stored(id64).await;
        }

        let _gate = cancellable(cancel, async { Ok(self.cache.fill_gate().await) }).await?;

        // Another caller may have stored it while we waited
        if self.cache.contains(id64) {
            return self.read_stored(id64).await;
        }

        let profile = cancellable(cancel, async {
            let profile = self.remote.fetch_one(id64).await?;
            if profile.id64 != id64 {
                return Err(SteamDataError::RemoteFetch(format!(
                    "requested profile {} but received {}",
                    id64, profile.id64
                )));
            }
            self.attach_avatars(profile).await
        })
        .await?;

        self.persist(std::slice::from_ref(&profile), cancel).await?;
        Ok(profile)
    }

    /// Stored profiles from one country; never contacts the remote
    pub async fn get_profiles_by_country(&self, country_code: &str) -> Result<Vec<SteamProfile>> {
        self.store.profiles_by_country(country_code).await
    }

    /// Fetch, persist and mark the ids that looked unknown, in their order
    async fn fill(&self, unknown: Vec<u64>, cancel: &CancellationToken) -> Result<Vec<SteamProfile>> {
        let _gate = cancellable(cancel, async { Ok(self.cache.fill_gate().await) }).await?;

        let (now_known, missing) = self.cache.partition(&unknown);
        let now_known: HashSet<u64> = now_known.into_iter().collect();

        let mut fetched: HashMap<u64, SteamProfile> = HashMap::new();
        if !missing.is_empty() {
            let batch = cancellable(cancel, self.fetch_batch(&missing)).await?;
            self.persist(&batch, cancel).await?;
            fetched.extend(batch.into_iter().map(|p| (p.id64, p)));
        }

        let mut profiles = Vec::with_capacity(unknown.len());
        for id64 in unknown {
            if now_known.contains(&id64) {
                profiles.push(self.read_stored(id64).await?);
            } else if let Some(profile) = fetched.remove(&id64) {
                profiles.push(profile);
            }
        }
        Ok(profiles)
    }

    async fn fetch_batch(&self, ids: &[u64]) -> Result<Vec<SteamProfile>> {
        let mut records = self.remote.fetch_many(ids).await?;

        let wanted: HashSet<u64> = ids.iter().copied().collect();
        let mut seen = HashSet::with_capacity(records.len());
        records.retain(|p| wanted.contains(&p.id64) && seen.insert(p.id64));

        debug!(
            requested = ids.len(),
            received = records.len(),
            "Fetched remote profiles"
        );

        try_join_all(records.into_iter().map(|p| self.attach_avatars(p))).await
    }

    async fn attach_avatars(&self, mut profile: SteamProfile) -> Result<SteamProfile> {
        if !self.options.fetch_avatars {
            return Ok(profile);
        }

        let (full, medium, small) = tokio::try_join!(
            self.image(&profile.avatar_full_url),
            self.image(&profile.avatar_medium_url),
            self.image(&profile.avatar_small_url),
        )?;

        profile.avatar_full_bytes = full;
        profile.avatar_medium_bytes = medium;
        profile.avatar_small_bytes = small;
        Ok(profile)
    }

    async fn image(&self, url: &str) -> Result<Vec<u8>> {
        if url.is_empty() {
            return Ok(Vec::new());
        }
        self.remote.fetch_image_bytes(url).await
    }

    /// Insert a batch, then mark it known; the caller holds the fill gate
    async fn persist(&self, batch: &[SteamProfile], cancel: &CancellationToken) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }
        if cancel.is_cancelled() {
            return Err(SteamDataError::Cancelled);
        }

        self.store.insert_profiles(batch).await?;
        self.cache.mark_known(batch.iter().map(|p| p.id64));

        info!(count = batch.len(), "Persisted new profiles");
        Ok(())
    }

    async fn read_stored(&self, id64: u64) -> Result<SteamProfile> {
        match self.store.profiles_by_id(id64).await?.into_iter().next() {
            Some(profile) => Ok(profile),
            None => {
                error!(id64, "Membership cache lists a profile the store does not have");
                Err(SteamDataError::DataIntegrity { id64 })
            }
        }
    }
}

/// Race a future against cancellation; cancellation wins ties
async fn cancellable<T>(
    cancel: &CancellationToken,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(SteamDataError::Cancelled),
        result = fut => result,
    }
}

fn unique_ids(ids: &[u64]) -> Vec<u64> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryProfileStore;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Remote that knows every id and records each call
    #[derive(Default)]
    struct EchoRemote {
        batches: Mutex<Vec<Vec<u64>>>,
        images: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl RemoteSource for EchoRemote {
        async fn fetch_one(&self, id64: u64) -> Result<SteamProfile> {
            self.batches.lock().unwrap().push(vec![id64]);
            Ok(remote_profile(id64))
        }

        async fn fetch_many(&self, ids: &[u64]) -> Result<Vec<SteamProfile>> {
            self.batches.lock().unwrap().push(ids.to_vec());
            Ok(ids.iter().map(|id| remote_profile(*id)).collect())
        }

        async fn fetch_image_bytes(&self, url: &str) -> Result<Vec<u8>> {
            self.images.lock().unwrap().push(url.to_string());
            Ok(url.as_bytes().to_vec())
        }
    }

    fn remote_profile(id64: u64) -> SteamProfile {
        SteamProfile {
            id64,
            persona_name: format!("remote-{}", id64),
            avatar_full_url: format!("full/{}", id64),
            avatar_medium_url: format!("medium/{}", id64),
            avatar_small_url: String::new(),
            ..Default::default()
        }
    }

    async fn access(
        stored: &[u64],
        options: AccessOptions,
    ) -> (SteamProfileAccess, Arc<MemoryProfileStore>, Arc<EchoRemote>) {
        let store = Arc::new(MemoryProfileStore::with_profiles(stored.iter().map(|id| {
            SteamProfile {
                id64: *id,
                persona_name: format!("stored-{}", id),
                ..Default::default()
            }
        })));
        let remote = Arc::new(EchoRemote::default());
        let access = SteamProfileAccess::init(store.clone(), remote.clone(), options)
            .await
            .unwrap();
        (access, store, remote)
    }

    #[test]
    fn test_unique_ids_keeps_first_occurrence() {
        assert_eq!(unique_ids(&[3, 1, 3, 2, 1]), vec![3, 1, 2]);
    }

    #[tokio::test]
    async fn test_duplicate_ids_fetched_once() {
        let (access, store, remote) = access(&[], AccessOptions::default()).await;
        let token = CancellationToken::new();

        let profiles = access.get_profiles(&[5, 5, 6], &token).await.unwrap();
        assert_eq!(profiles.len(), 2);
        assert_eq!(*remote.batches.lock().unwrap(), vec![vec![5, 6]]);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_stored_group_comes_first() {
        let (access, _store, _remote) = access(&[2, 4], AccessOptions::default()).await;
        let token = CancellationToken::new();

        let ids: Vec<u64> = access
            .get_profiles(&[3, 4, 1, 2], &token)
            .await
            .unwrap()
            .iter()
            .map(|p| p.id64)
            .collect();
        assert_eq!(ids, vec![4, 2, 3, 1]);
    }

    #[tokio::test]
    async fn test_avatars_attached_and_empty_url_skipped() {
        let (access, store, remote) = access(&[], AccessOptions::default()).await;
        let token = CancellationToken::new();

        let profile = access.get_profile(9, &token).await.unwrap();
        assert_eq!(profile.avatar_full_bytes, b"full/9".to_vec());
        assert_eq!(profile.avatar_medium_bytes, b"medium/9".to_vec());
        assert!(profile.avatar_small_bytes.is_empty());
        assert_eq!(remote.images.lock().unwrap().len(), 2);

        // Stored with its bytes
        let stored = store.profiles_by_id(9).await.unwrap();
        assert_eq!(stored[0].avatar_full_bytes, b"full/9".to_vec());
    }

    #[tokio::test]
    async fn test_avatar_fetch_can_be_disabled() {
        let options = AccessOptions {
            fetch_avatars: false,
        };
        let (access, _store, remote) = access(&[], options).await;
        let token = CancellationToken::new();

        let profile = access.get_profile(9, &token).await.unwrap();
        assert!(!profile.has_avatar_bytes());
        assert!(remote.images.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_profile_known_reads_store_only() {
        let (access, store, remote) = access(&[1], AccessOptions::default()).await;
        let token = CancellationToken::new();

        let profile = access.get_profile(1, &token).await.unwrap();
        assert_eq!(profile.persona_name, "stored-1");
        assert!(remote.batches.lock().unwrap().is_empty());
        assert_eq!(store.insert_batch_count(), 0);
    }

    #[tokio::test]
    async fn test_country_query_never_hits_remote() {
        let (access, store, remote) = access(&[], AccessOptions::default()).await;
        store
            .insert_profiles(&[SteamProfile {
                id64: 11,
                country_code: Some("SE".to_string()),
                ..Default::default()
            }])
            .await
            .unwrap();

        let swedes = access.get_profiles_by_country("SE").await.unwrap();
        assert_eq!(swedes.len(), 1);
        assert!(remote.batches.lock().unwrap().is_empty());
    }
}
