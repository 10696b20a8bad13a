use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A job posting as persisted in `job-storage`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: String,
    pub title: String,
    pub description: String,
    pub salary: String,
    pub location: String,
    /// Full-time, contract, remote, ...
    #[serde(rename = "type")]
    pub job_type: String,
    pub posted_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewJob {
    pub title: String,
    pub description: String,
    pub salary: String,
    pub location: String,
    #[serde(rename = "type")]
    pub job_type: String,
}

/// An application to a job, identified by `(job_id, user_id)`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JobApplication {
    pub job_id: String,
    pub user_id: String,
    pub name: String,
    /// Resume as a base64 data URL.
    pub resume: String,
    pub about_you: String,
    /// Experience level, free text.
    pub experience: String,
    #[serde(default)]
    pub works_done: String,
    pub applied_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewApplication {
    pub job_id: String,
    pub user_id: String,
    pub name: String,
    pub resume: String,
    pub about_you: String,
    pub experience: String,
    pub works_done: String,
}

/// An application joined with its job. `job` is `None` once the job has
/// been deleted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedJob {
    pub job: Option<Job>,
    pub application: JobApplication,
}
