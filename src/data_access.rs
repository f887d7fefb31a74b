//! Data access entry point
//!
//! Wires the SQLite store, the Steam Web API client and the membership cache
//! together from one configuration.

use crate::access::{AccessOptions, SteamProfileAccess};
use crate::config::SteamDataConfig;
use crate::remote::{RemoteSource, SteamRemoteSource};
use crate::store::{ProfileStore, SqliteProfileStore, StoreConfig};
use crate::Result;
use std::sync::Arc;

/// Container for Steam data access
pub struct DataAccess {
    steam: SteamProfileAccess,
}

impl DataAccess {
    /// Open the configured database and API client, then load the membership cache
    ///
    /// Fails with a configuration error when no developer key is available.
    pub async fn open(config: &SteamDataConfig) -> Result<Self> {
        let remote = SteamRemoteSource::from_config(config)?;
        let store = SqliteProfileStore::new(StoreConfig::from(&config.database))?;

        Self::from_parts(
            Arc::new(store),
            Arc::new(remote),
            AccessOptions::from(config),
        )
        .await
    }

    /// Build from arbitrary store and remote implementations
    pub async fn from_parts(
        store: Arc<dyn ProfileStore>,
        remote: Arc<dyn RemoteSource>,
        options: AccessOptions,
    ) -> Result<Self> {
        let steam = SteamProfileAccess::init(store, remote, options).await?;
        tracing::info!(known = steam.known_count(), "Steam data access ready");
        Ok(Self { steam })
    }

    pub fn steam(&self) -> &SteamProfileAccess {
        &self.steam
    }
}
