//! Job postings, per-user job bookmarks, and job applications.

pub mod domain;
pub mod store;

pub use domain::{AppliedJob, Job, JobApplication, NewApplication, NewJob};
pub use store::JobStore;
