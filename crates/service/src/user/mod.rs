//! The signed-in user's profile record and per-account profile data.

pub mod account;
pub mod profile;

pub use account::{AccountData, AccountDataStore, AccountPatch};
pub use profile::{ProfilePatch, UserProfile, UserProfileStore};
