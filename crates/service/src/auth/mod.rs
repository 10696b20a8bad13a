//! Auth module: identity provider boundary, its local implementation, and
//! the auth store that resolves roles and persists the signed-in session.

pub mod domain;
pub mod errors;
pub mod provider;
pub mod repo;
pub mod service;

pub use domain::{AuthSession, ProviderUser, Role};
pub use errors::AuthError;
pub use provider::IdentityProvider;
pub use service::{AuthConfig, AuthService};
