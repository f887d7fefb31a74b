//! Steam profile record
//!
//! One user profile as first observed through the Steam Web API, together with
//! the avatar images downloaded at that time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use steamapi::{steam_id, SteamAccount};

/// Profile visibility (`communityvisibilitystate`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Private,
    FriendsOnly,
    FriendsOfFriends,
    UsersOnly,
    Public,
    Unknown(u32),
}

impl From<u32> for Visibility {
    fn from(code: u32) -> Self {
        match code {
            1 => Self::Private,
            2 => Self::FriendsOnly,
            3 => Self::FriendsOfFriends,
            4 => Self::UsersOnly,
            5 => Self::Public,
            other => Self::Unknown(other),
        }
    }
}

/// Online state (`personastate`); 0 also covers private profiles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersonaState {
    Offline,
    Online,
    Busy,
    Away,
    Snooze,
    LookingToTrade,
    LookingToPlay,
    Unknown(u32),
}

impl From<u32> for PersonaState {
    fn from(code: u32) -> Self {
        match code {
            0 => Self::Offline,
            1 => Self::Online,
            2 => Self::Busy,
            3 => Self::Away,
            4 => Self::Snooze,
            5 => Self::LookingToTrade,
            6 => Self::LookingToPlay,
            other => Self::Unknown(other),
        }
    }
}

/// A single Steam profile
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SteamProfile {
    /// 64-bit Steam id, used by the Web API
    pub id64: u64,

    /// Steam username, can change often
    pub persona_name: String,

    /// ISO 3166 country code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,

    /// Unix timestamp of account creation
    pub time_created: u64,

    /// Unix timestamp of last logoff, usually private
    pub last_log_off: u64,

    pub visibility_state: u32,
    pub persona_state: u32,

    /// 1 if the user has configured the community profile
    pub profile_state: u32,

    /// 184x184 avatar
    pub avatar_full_url: String,
    /// 64x64 avatar
    pub avatar_medium_url: String,
    /// 32x32 avatar
    pub avatar_small_url: String,

    #[serde(skip)]
    pub avatar_full_bytes: Vec<u8>,
    #[serde(skip)]
    pub avatar_medium_bytes: Vec<u8>,
    #[serde(skip)]
    pub avatar_small_bytes: Vec<u8>,
}

impl SteamProfile {
    /// 32-bit account id, as used by Valve's game APIs
    pub fn id32(&self) -> u32 {
        steam_id::to_32(self.id64)
    }

    pub fn visibility(&self) -> Visibility {
        Visibility::from(self.visibility_state)
    }

    pub fn persona(&self) -> PersonaState {
        PersonaState::from(self.persona_state)
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        timestamp(self.time_created)
    }

    pub fn last_log_off_at(&self) -> Option<DateTime<Utc>> {
        timestamp(self.last_log_off)
    }

    /// True once any avatar payload has been attached
    pub fn has_avatar_bytes(&self) -> bool {
        !(self.avatar_full_bytes.is_empty()
            && self.avatar_medium_bytes.is_empty()
            && self.avatar_small_bytes.is_empty())
    }
}

fn timestamp(secs: u64) -> Option<DateTime<Utc>> {
    if secs == 0 {
        return None;
    }
    i64::try_from(secs)
        .ok()
        .and_then(|s| DateTime::from_timestamp(s, 0))
}

impl TryFrom<SteamAccount> for SteamProfile {
    type Error = crate::SteamDataError;

    fn try_from(account: SteamAccount) -> crate::Result<Self> {
        let id64 = account.id64()?;
        Ok(Self {
            id64,
            persona_name: account.persona_name,
            country_code: account.loc_country_code,
            time_created: account.time_created,
            last_log_off: account.last_log_off,
            visibility_state: account.community_visibility_state,
            persona_state: account.persona_state,
            profile_state: account.profile_state,
            avatar_full_url: account.avatar_full_url,
            avatar_medium_url: account.avatar_medium_url,
            avatar_small_url: account.avatar_url,
            avatar_full_bytes: Vec::new(),
            avatar_medium_bytes: Vec::new(),
            avatar_small_bytes: Vec::new(),
        })
    }
}
