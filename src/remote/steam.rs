//! Steam Web API adapter

use super::RemoteSource;
use crate::config::SteamDataConfig;
use crate::models::SteamProfile;
use crate::{Result, SteamDataError};
use async_trait::async_trait;
use std::time::Duration;
use steamapi::SteamApiClient;
use tracing::debug;

/// [`RemoteSource`] backed by the Steam Web API
pub struct SteamRemoteSource {
    client: SteamApiClient,
}

impl SteamRemoteSource {
    pub fn new(client: SteamApiClient) -> Self {
        Self { client }
    }

    /// Build the API client from configuration
    ///
    /// Fails with a configuration error when no developer key is available.
    pub fn from_config(config: &SteamDataConfig) -> Result<Self> {
        config.validate()?;
        let key = config.developer_key().ok_or_else(|| {
            SteamDataError::Config("No Steam developer key configured".to_string())
        })?;

        let client = SteamApiClient::with_options(
            key,
            config.steam.base_url.clone(),
            Duration::from_secs(config.steam.timeout_secs),
        )?;

        Ok(Self::new(client))
    }

    pub fn client(&self) -> &SteamApiClient {
        &self.client
    }
}

#[async_trait]
impl RemoteSource for SteamRemoteSource {
    async fn fetch_one(&self, id64: u64) -> Result<SteamProfile> {
        debug!(id64, "Fetching profile from Steam");
        let account = self.client.player_summary(id64).await?;
        SteamProfile::try_from(account)
    }

    async fn fetch_many(&self, ids: &[u64]) -> Result<Vec<SteamProfile>> {
        debug!(count = ids.len(), "Fetching profile batch from Steam");
        self.client
            .player_summaries(ids)
            .await?
            .into_iter()
            .map(SteamProfile::try_from)
            .collect()
    }

    async fn fetch_image_bytes(&self, url: &str) -> Result<Vec<u8>> {
        Ok(self.client.image_bytes(url).await?)
    }
}
