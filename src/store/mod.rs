//! Local profile store
//!
//! A fixed set of stored queries executed against a relational store, behind
//! the [`ProfileStore`] trait so the coordinator can run against SQLite or an
//! in-memory fake.

mod memory;
mod sqlite;

pub use memory::MemoryProfileStore;
pub use sqlite::{SqliteProfileStore, StoreConfig};

use crate::models::SteamProfile;
use crate::Result;
use async_trait::async_trait;

/// Named statements the store executes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoredQuery {
    SelectAllSteamProfileIds,
    SelectSteamProfileById,
    SelectSteamProfilesByCountry,
    InsertSteamProfile,
}

impl StoredQuery {
    /// SQL text for the statement, with positional parameters
    pub fn sql(self) -> &'static str {
        match self {
            StoredQuery::SelectAllSteamProfileIds => "SELECT Id64 FROM SteamProfiles",
            StoredQuery::SelectSteamProfileById => {
                "SELECT Id64, PersonaName, CountryCode, TimeCreated, LastLogOff,
                        VisibilityState, PersonaState, ProfileState,
                        AvatarFullUrl, AvatarMediumUrl, AvatarSmallUrl,
                        AvatarFullBytes, AvatarMediumBytes, AvatarSmallBytes
                 FROM SteamProfiles WHERE Id64 = ?1"
            }
            StoredQuery::SelectSteamProfilesByCountry => {
                "SELECT Id64, PersonaName, CountryCode, TimeCreated, LastLogOff,
                        VisibilityState, PersonaState, ProfileState,
                        AvatarFullUrl, AvatarMediumUrl, AvatarSmallUrl,
                        AvatarFullBytes, AvatarMediumBytes, AvatarSmallBytes
                 FROM SteamProfiles WHERE CountryCode = ?1 ORDER BY Id64"
            }
            StoredQuery::InsertSteamProfile => {
                "INSERT INTO SteamProfiles
                    (Id64, PersonaName, CountryCode, TimeCreated, LastLogOff,
                     VisibilityState, PersonaState, ProfileState,
                     AvatarFullUrl, AvatarMediumUrl, AvatarSmallUrl,
                     AvatarFullBytes, AvatarMediumBytes, AvatarSmallBytes)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)"
            }
        }
    }
}

/// Persistent storage for profiles
///
/// Reads return an empty vector, never an error, when nothing matches.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Every stored id64
    async fn profile_ids(&self) -> Result<Vec<u64>>;

    /// Point read by id64; zero or one row
    async fn profiles_by_id(&self, id64: u64) -> Result<Vec<SteamProfile>>;

    /// Stored profiles with the given ISO 3166 country code
    async fn profiles_by_country(&self, country_code: &str) -> Result<Vec<SteamProfile>>;

    /// Insert a batch of new profiles
    ///
    /// The batch is atomic: either every profile is stored or none is. An id
    /// that already exists fails the whole batch.
    async fn insert_profiles(&self, profiles: &[SteamProfile]) -> Result<()>;
}
