//! Configuration system
//!
//! Loads ~/.config/steamdata/config.yaml with:
//! - Local store location (the SQLite connection string)
//! - Steam Web API developer key, host and timeout
//! - Avatar download toggle

mod steamdata_config;

pub use steamdata_config::{
    AvatarConfig, DatabaseConfig, SteamConfig, SteamDataConfig, DEVELOPER_KEY_ENV,
};
