//! Steam Web API client for Rust
//!
//! A small async interface to the `ISteamUser/GetPlayerSummaries` endpoint and
//! the avatar image CDN, plus conversions between the 32-bit and 64-bit forms
//! of a Steam account id.
//!
//! # Example
//!
//! ```no_run
//! use steamapi::SteamApiClient;
//!
//! # async fn run() -> steamapi::Result<()> {
//! let client = SteamApiClient::new("YOUR-DEVELOPER-KEY")?;
//!
//! // One profile
//! let gaben = client.player_summary(76561197960287930).await?;
//! println!("{} ({})", gaben.persona_name, steamapi::steam_id::to_32(gaben.id64()?));
//!
//! // Many profiles, chunked into requests of 100 ids
//! let players = client.player_summaries(&[76561197960287930, 76561197960265731]).await?;
//!
//! // Avatar bytes
//! let avatar = client.image_bytes(&gaben.avatar_full_url).await?;
//! # Ok(())
//! # }
//! ```

use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Public Steam Web API host
pub const DEFAULT_BASE_URL: &str = "https://api.steampowered.com";

/// `GetPlayerSummaries` accepts at most this many ids per call
pub const MAX_IDS_PER_REQUEST: usize = 100;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that can occur when talking to the Steam Web API
#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Steam API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid Steam ID: {0}")]
    InvalidId(String),

    #[error("Player not found: {0}")]
    PlayerNotFound(u64),
}

/// Result type for Steam API operations
pub type Result<T> = std::result::Result<T, Error>;

/// Conversions between the 64-bit and 32-bit Steam account id forms
///
/// The Web API speaks 64-bit ids; Valve's game APIs mostly use the 32-bit
/// account id. For individual accounts in the public universe the two differ by
/// a fixed offset.
pub mod steam_id {
    use super::{Error, Result};

    /// 64-bit id of account number zero
    pub const STEAM_ID64_BASE: u64 = 76_561_197_960_265_728;

    /// 64-bit id to 32-bit account id
    pub fn to_32(id64: u64) -> u32 {
        id64.wrapping_sub(STEAM_ID64_BASE) as u32
    }

    /// 32-bit account id to 64-bit id
    pub fn to_64(id32: u32) -> u64 {
        STEAM_ID64_BASE + u64::from(id32)
    }

    /// Parse user input that may be either form, always returning the 64-bit id
    pub fn parse_id64(input: &str) -> Result<u64> {
        let trimmed = input.trim();
        let value: u64 = trimmed
            .parse()
            .map_err(|_| Error::InvalidId(trimmed.to_string()))?;

        if value >= STEAM_ID64_BASE {
            Ok(value)
        } else if let Ok(id32) = u32::try_from(value) {
            Ok(to_64(id32))
        } else {
            Err(Error::InvalidId(trimmed.to_string()))
        }
    }
}

/// One player object from `GetPlayerSummaries`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SteamAccount {
    /// 64-bit id as a decimal string
    #[serde(rename = "steamid")]
    pub steam_id: String,
    #[serde(rename = "personaname", default)]
    pub persona_name: String,
    #[serde(rename = "profileurl", default)]
    pub profile_url: String,
    /// 32x32 avatar
    #[serde(rename = "avatar", default)]
    pub avatar_url: String,
    /// 64x64 avatar
    #[serde(rename = "avatarmedium", default)]
    pub avatar_medium_url: String,
    /// 184x184 avatar
    #[serde(rename = "avatarfull", default)]
    pub avatar_full_url: String,
    #[serde(rename = "personastate", default)]
    pub persona_state: u32,
    #[serde(rename = "communityvisibilitystate", default)]
    pub community_visibility_state: u32,
    #[serde(rename = "profilestate", default)]
    pub profile_state: u32,
    #[serde(rename = "lastlogoff", default)]
    pub last_log_off: u64,
    #[serde(rename = "timecreated", default)]
    pub time_created: u64,
    #[serde(rename = "loccountrycode", default)]
    pub loc_country_code: Option<String>,
}

impl SteamAccount {
    /// Parse the string `steamid` into a 64-bit id
    pub fn id64(&self) -> Result<u64> {
        self.steam_id
            .parse()
            .map_err(|_| Error::InvalidId(self.steam_id.clone()))
    }
}

#[derive(Debug, Deserialize)]
struct PlayerSummariesEnvelope {
    response: PlayerSummaries,
}

#[derive(Debug, Deserialize)]
struct PlayerSummaries {
    #[serde(default)]
    players: Vec<SteamAccount>,
}

/// Parse a raw `GetPlayerSummaries` body
pub fn parse_player_summaries(body: &str) -> Result<Vec<SteamAccount>> {
    let envelope: PlayerSummariesEnvelope = serde_json::from_str(body)?;
    Ok(envelope.response.players)
}

/// Steam Web API client
#[derive(Debug, Clone)]
pub struct SteamApiClient {
    client: Client,
    key: String,
    base_url: String,
}

impl SteamApiClient {
    /// Create a client for the public API host with the default timeout
    pub fn new(key: impl Into<String>) -> Result<Self> {
        Self::with_options(key, DEFAULT_BASE_URL, DEFAULT_TIMEOUT)
    }

    /// Create a client with an explicit host and per-request timeout
    pub fn with_options(
        key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .default_headers({
                let mut headers = header::HeaderMap::new();
                headers.insert(
                    header::USER_AGENT,
                    header::HeaderValue::from_static("steamapi-rs/0.1"),
                );
                headers
            })
            .build()?;

        Ok(Self {
            client,
            key: key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn player_summaries_url(&self) -> String {
        format!("{}/ISteamUser/GetPlayerSummaries/v0002/", self.base_url)
    }

    /// Fetch a single player summary
    ///
    /// Returns [`Error::PlayerNotFound`] when the API answers without a player
    /// for the id (unknown or deleted account).
    pub async fn player_summary(&self, id64: u64) -> Result<SteamAccount> {
        let wanted = id64.to_string();
        self.player_summaries(&[id64])
            .await?
            .into_iter()
            .find(|p| p.steam_id == wanted)
            .ok_or(Error::PlayerNotFound(id64))
    }

    /// Fetch player summaries for many ids
    ///
    /// Ids are sent in chunks of [`MAX_IDS_PER_REQUEST`]. Ids the API does not
    /// know are silently absent from the result, matching the endpoint itself.
    pub async fn player_summaries(&self, ids: &[u64]) -> Result<Vec<SteamAccount>> {
        let mut players = Vec::with_capacity(ids.len());

        for chunk in ids.chunks(MAX_IDS_PER_REQUEST) {
            let steam_ids = chunk
                .iter()
                .map(|id| id.to_string())
                .collect::<Vec<_>>()
                .join(",");

            debug!(count = chunk.len(), "Requesting player summaries");

            let response = self
                .client
                .get(self.player_summaries_url())
                .query(&[("key", self.key.as_str()), ("steamids", steam_ids.as_str())])
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(Error::Status {
                    status: status.as_u16(),
                    body,
                });
            }

            let body = response.text().await?;
            players.extend(parse_player_summaries(&body)?);
        }

        Ok(players)
    }

    /// Download an image (avatar) and return its raw bytes
    pub async fn image_bytes(&self, url: &str) -> Result<Vec<u8>> {
        debug!(url = %url, "Downloading image");

        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.bytes().await?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "response": {
            "players": [
                {
                    "steamid": "76561197960287930",
                    "communityvisibilitystate": 3,
                    "profilestate": 1,
                    "personaname": "Rabscuttle",
                    "profileurl": "https://steamcommunity.com/id/gabelogannewell/",
                    "avatar": "https://avatars.example/small.jpg",
                    "avatarmedium": "https://avatars.example/medium.jpg",
                    "avatarfull": "https://avatars.example/full.jpg",
                    "lastlogoff": 1500000000,
                    "personastate": 0,
                    "timecreated": 1063407589,
                    "loccountrycode": "US"
                },
                {
                    "steamid": "76561197960265731",
                    "communityvisibilitystate": 1,
                    "personaname": "hidden"
                }
            ]
        }
    }"#;

    #[test]
    fn test_steam_id_conversion() {
        assert_eq!(steam_id::to_32(76561197960287930), 22202);
        assert_eq!(steam_id::to_64(22202), 76561197960287930);
        assert_eq!(steam_id::to_64(steam_id::to_32(76561198000000000)), 76561198000000000);
    }

    #[test]
    fn test_parse_id64_accepts_both_forms() {
        assert_eq!(steam_id::parse_id64("76561197960287930").unwrap(), 76561197960287930);
        assert_eq!(steam_id::parse_id64(" 22202 ").unwrap(), 76561197960287930);
        assert!(matches!(steam_id::parse_id64("gaben"), Err(Error::InvalidId(_))));
        assert!(matches!(steam_id::parse_id64("70000000000"), Err(Error::InvalidId(_))));
    }

    #[test]
    fn test_parse_player_summaries() {
        let players = parse_player_summaries(SAMPLE).unwrap();
        assert_eq!(players.len(), 2);

        let gaben = &players[0];
        assert_eq!(gaben.id64().unwrap(), 76561197960287930);
        assert_eq!(gaben.persona_name, "Rabscuttle");
        assert_eq!(gaben.avatar_full_url, "https://avatars.example/full.jpg");
        assert_eq!(gaben.community_visibility_state, 3);
        assert_eq!(gaben.time_created, 1063407589);
        assert_eq!(gaben.loc_country_code.as_deref(), Some("US"));

        // Private profiles omit most fields
        let hidden = &players[1];
        assert_eq!(hidden.avatar_full_url, "");
        assert_eq!(hidden.time_created, 0);
        assert!(hidden.loc_country_code.is_none());
    }

    #[test]
    fn test_parse_empty_response() {
        let players = parse_player_summaries(r#"{"response":{}}"#).unwrap();
        assert!(players.is_empty());
    }

    #[test]
    fn test_invalid_steamid_string() {
        let account = SteamAccount {
            steam_id: "not-a-number".to_string(),
            ..parse_player_summaries(SAMPLE).unwrap().remove(0)
        };
        assert!(matches!(account.id64(), Err(Error::InvalidId(_))));
    }

    #[test]
    fn test_client_urls() {
        let client =
            SteamApiClient::with_options("key", "http://localhost:8080/", DEFAULT_TIMEOUT).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080");
        assert_eq!(
            client.player_summaries_url(),
            "http://localhost:8080/ISteamUser/GetPlayerSummaries/v0002/"
        );
    }

    #[tokio::test]
    async fn test_empty_id_list_makes_no_request() {
        // An unroutable host would fail if any request were sent
        let client =
            SteamApiClient::with_options("key", "http://127.0.0.1:9", DEFAULT_TIMEOUT).unwrap();
        let players = client.player_summaries(&[]).await.unwrap();
        assert!(players.is_empty());
    }
}
