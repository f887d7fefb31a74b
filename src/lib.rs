//! steamdata - read-through data access for Steam profiles
//!
//! Serves Steam user profiles from a local SQLite store when they are already
//! there, and otherwise fetches them from the Steam Web API, downloads their
//! avatars and stores them for next time.
//!
//! # Architecture
//!
//! - **access**: `SteamProfileAccess` coordinator and its membership cache
//! - **store**: `ProfileStore` trait with SQLite and in-memory implementations
//! - **remote**: `RemoteSource` trait with the Steam Web API adapter
//! - **models**: `SteamProfile`
//! - **config**: YAML configuration (database path, developer key)
//! - **data_access**: `DataAccess`, wiring everything from a config
//!
//! # Example
//!
//! ```no_run
//! use steamdata::config::SteamDataConfig;
//! use steamdata::DataAccess;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> steamdata::Result<()> {
//! let config = SteamDataConfig::load_default()?;
//! let data = DataAccess::open(&config).await?;
//!
//! let token = CancellationToken::new();
//! let profiles = data
//!     .steam()
//!     .get_profiles(&[76561197960287930, 76561197960265731], &token)
//!     .await?;
//! for p in &profiles {
//!     println!("{} {}", p.id32(), p.persona_name);
//! }
//! # Ok(())
//! # }
//! ```

pub mod access;
pub mod config;
pub mod data_access;
pub mod error;
pub mod logging;
pub mod models;
pub mod remote;
pub mod store;

// Re-exports
pub use data_access::DataAccess;
pub use error::{Result, SteamDataError};
