//! Shared runtime helpers for the BlogSphere workspace: logging setup and
//! data directory checks used by the binaries and the platform bootstrap.

pub mod env;
pub mod utils;
