//! Data models
//!
//! Defines SteamProfile and the decoded profile state codes.

mod profile;

pub use profile::{PersonaState, SteamProfile, Visibility};
