//! Profile access
//!
//! The read-through coordinator and the membership cache it routes by.

mod coordinator;
mod membership;

pub use coordinator::{AccessOptions, SteamProfileAccess};
pub use membership::MembershipCache;
