//! Concrete identity providers.

pub mod local;

pub use local::LocalIdentityProvider;
