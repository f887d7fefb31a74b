//! SQLite profile store implementation

use super::{ProfileStore, StoredQuery};
use crate::models::SteamProfile;
use crate::{Result, SteamDataError};
use async_trait::async_trait;
use rusqlite::{params, Connection, Row};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Store configuration
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Path to SQLite database file
    pub path: PathBuf,

    /// Enable WAL mode for better concurrency
    pub wal_mode: bool,
}

impl From<&crate::config::DatabaseConfig> for StoreConfig {
    fn from(config: &crate::config::DatabaseConfig) -> Self {
        Self {
            path: config.path.clone(),
            wal_mode: config.wal_mode,
        }
    }
}

/// SQLite-backed [`ProfileStore`]
///
/// rusqlite is blocking, so every statement runs on the blocking thread pool
/// against a shared connection.
pub struct SqliteProfileStore {
    conn: Arc<Mutex<Connection>>,
    path: Option<PathBuf>,
}

impl SqliteProfileStore {
    /// Open or create a store database
    pub fn new(config: StoreConfig) -> Result<Self> {
        if let Some(parent) = config.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        tracing::info!(path = %config.path.display(), "Opening profile store");

        let conn = Connection::open(&config.path)?;

        if config.wal_mode {
            conn.pragma_update(None, "journal_mode", "WAL")?;
        }

        init_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: Some(config.path),
        })
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: None,
        })
    }

    /// Database file path, `None` for in-memory stores
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Number of stored profiles
    pub async fn count(&self) -> Result<usize> {
        self.with_conn(|conn| {
            let count: i64 =
                conn.query_row("SELECT COUNT(*) FROM SteamProfiles", [], |row| row.get(0))?;
            Ok(count as usize)
        })
        .await
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|_| SteamDataError::Store("connection mutex poisoned".to_string()))?;
            f(&mut guard)
        })
        .await?
    }
}

/// Initialize database schema
fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS SteamProfiles (
            Id64 INTEGER PRIMARY KEY NOT NULL,
            PersonaName TEXT NOT NULL,
            CountryCode TEXT,
            TimeCreated INTEGER NOT NULL,
            LastLogOff INTEGER NOT NULL,
            VisibilityState INTEGER NOT NULL,
            PersonaState INTEGER NOT NULL,
            ProfileState INTEGER NOT NULL,
            AvatarFullUrl TEXT NOT NULL,
            AvatarMediumUrl TEXT NOT NULL,
            AvatarSmallUrl TEXT NOT NULL,
            AvatarFullBytes BLOB,
            AvatarMediumBytes BLOB,
            AvatarSmallBytes BLOB
        );

        CREATE INDEX IF NOT EXISTS idx_steamprofiles_country ON SteamProfiles(CountryCode);
        "#,
    )?;

    Ok(())
}

// SQLite integers are signed; ids and timestamps are stored bit-for-bit.
fn row_to_profile(row: &Row<'_>) -> rusqlite::Result<SteamProfile> {
    Ok(SteamProfile {
        id64: row.get::<_, i64>(0)? as u64,
        persona_name: row.get(1)?,
        country_code: row.get(2)?,
        time_created: row.get::<_, i64>(3)? as u64,
        last_log_off: row.get::<_, i64>(4)? as u64,
        visibility_state: row.get(5)?,
        persona_state: row.get(6)?,
        profile_state: row.get(7)?,
        avatar_full_url: row.get(8)?,
        avatar_medium_url: row.get(9)?,
        avatar_small_url: row.get(10)?,
        avatar_full_bytes: row.get::<_, Option<Vec<u8>>>(11)?.unwrap_or_default(),
        avatar_medium_bytes: row.get::<_, Option<Vec<u8>>>(12)?.unwrap_or_default(),
        avatar_small_bytes: row.get::<_, Option<Vec<u8>>>(13)?.unwrap_or_default(),
    })
}

fn query_profiles(
    conn: &Connection,
    query: StoredQuery,
    key: &dyn rusqlite::ToSql,
) -> Result<Vec<SteamProfile>> {
    let mut stmt = conn.prepare_cached(query.sql())?;
    let rows = stmt.query_map(params![key], row_to_profile)?;
    let mut profiles = Vec::new();
    for row in rows {
        profiles.push(row?);
    }
    Ok(profiles)
}

#[async_trait]
impl ProfileStore for SqliteProfileStore {
    async fn profile_ids(&self) -> Result<Vec<u64>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare_cached(StoredQuery::SelectAllSteamProfileIds.sql())?;
            let ids = stmt.query_map([], |row| row.get::<_, i64>(0))?;
            let mut out = Vec::new();
            for id in ids {
                out.push(id? as u64);
            }
            Ok(out)
        })
        .await
    }

    async fn profiles_by_id(&self, id64: u64) -> Result<Vec<SteamProfile>> {
        self.with_conn(move |conn| {
            query_profiles(conn, StoredQuery::SelectSteamProfileById, &(id64 as i64))
        })
        .await
    }

    async fn profiles_by_country(&self, country_code: &str) -> Result<Vec<SteamProfile>> {
        let code = country_code.to_string();
        self.with_conn(move |conn| {
            query_profiles(conn, StoredQuery::SelectSteamProfilesByCountry, &code)
        })
        .await
    }

    async fn insert_profiles(&self, profiles: &[SteamProfile]) -> Result<()> {
        if profiles.is_empty() {
            return Ok(());
        }

        let batch = profiles.to_vec();
        self.with_conn(move |conn| {
            // Dropping the transaction on error rolls the whole batch back
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare_cached(StoredQuery::InsertSteamProfile.sql())?;
                for p in &batch {
                    stmt.execute(params![
                        p.id64 as i64,
                        &p.persona_name,
                        p.country_code.as_deref(),
                        p.time_created as i64,
                        p.last_log_off as i64,
                        p.visibility_state,
                        p.persona_state,
                        p.profile_state,
                        &p.avatar_full_url,
                        &p.avatar_medium_url,
                        &p.avatar_small_url,
                        &p.avatar_full_bytes,
                        &p.avatar_medium_bytes,
                        &p.avatar_small_bytes,
                    ])?;
                }
            }
            tx.commit()?;

            tracing::debug!(count = batch.len(), "Inserted profile batch");
            Ok(())
        })
        .await
    }
}
