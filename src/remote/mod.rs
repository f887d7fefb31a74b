//! Remote profile source
//!
//! Where profiles come from the first time they are seen. The Steam Web API
//! adapter lives in [`steam`]; tests plug in scripted fakes.

mod steam;

pub use steam::SteamRemoteSource;

use crate::models::SteamProfile;
use crate::Result;
use async_trait::async_trait;

/// Source of truth for profiles not yet in the local store
///
/// Profiles returned here carry URLs but no avatar bytes; the coordinator
/// downloads those through [`RemoteSource::fetch_image_bytes`].
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// Fetch one profile; an unknown id is an error
    async fn fetch_one(&self, id64: u64) -> Result<SteamProfile>;

    /// Fetch many profiles in one batch, all-or-nothing
    ///
    /// Ids the remote does not know are absent from the result.
    async fn fetch_many(&self, ids: &[u64]) -> Result<Vec<SteamProfile>>;

    /// Download a binary asset such as an avatar image
    async fn fetch_image_bytes(&self, url: &str) -> Result<Vec<u8>>;
}
