//! Storage abstractions for the service layer
//!
//! `LocalStorage` is the directory of per-key JSON blobs. `PersistedState`
//! mirrors one whole store under one key, rewriting it after every mutation.
//! `JsonMapStore` is a keyed map on top of `PersistedState`.

pub mod json_map_store;
pub mod local_storage;
pub mod persisted;

pub use json_map_store::JsonMapStore;
pub use local_storage::LocalStorage;
pub use persisted::PersistedState;

/// Storage keys, one per store.
pub mod keys {
    pub const AUTH: &str = "auth-storage";
    pub const BLOG: &str = "blog-storage";
    pub const JOB: &str = "job-storage";
    pub const USER: &str = "user-storage";
    pub const IDENTITY_ACCOUNTS: &str = "identity-accounts";

    /// Per-account profile defaults.
    pub fn user_data(uid: &str) -> String {
        format!("userData_{uid}")
    }
}
