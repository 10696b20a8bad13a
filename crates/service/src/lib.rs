//! Service layer holding the platform state: blog, job and profile stores
//! persisted to local storage, the auth store, and role-gated access.
//! - Each store mirrors its whole state to one storage key.
//! - Lookups return `Option`; mutations return the persistence error, if any.
//! - Auth talks to an `IdentityProvider` and never stores passwords itself.

pub mod access;
pub mod auth;
pub mod blog;
pub mod errors;
pub mod ids;
pub mod jobs;
pub mod storage;
pub mod user;
