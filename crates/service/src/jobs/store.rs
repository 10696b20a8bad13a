use std::{collections::HashMap, sync::Arc};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::domain::{AppliedJob, Job, JobApplication, NewApplication, NewJob};
use crate::errors::ServiceError;
use crate::ids::next_id;
use crate::storage::{keys, LocalStorage, PersistedState};

/// Persisted shape of `job-storage`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct JobState {
    /// Newest first.
    #[serde(default)]
    pub jobs: Vec<Job>,
    /// user id -> bookmarked job ids
    #[serde(default)]
    pub bookmarks: HashMap<String, Vec<String>>,
    /// Append-only.
    #[serde(default)]
    pub applications: Vec<JobApplication>,
}

/// Job postings, per-user bookmark lists and applications.
pub struct JobStore {
    state: PersistedState<JobState>,
}

impl JobStore {
    pub async fn open(storage: LocalStorage) -> Result<Arc<Self>, ServiceError> {
        let state = PersistedState::open(storage, keys::JOB).await?;
        Ok(Arc::new(Self { state }))
    }

    /// Prepend a new posting and return its id.
    pub async fn add_job(&self, input: NewJob) -> Result<String, ServiceError> {
        let job = Job {
            id: next_id(),
            title: input.title,
            description: input.description,
            salary: input.salary,
            location: input.location,
            job_type: input.job_type,
            posted_at: Utc::now(),
        };
        let id = job.id.clone();
        self.state.update(|s| s.jobs.insert(0, job)).await?;
        info!(job_id = %id, "job posted");
        Ok(id)
    }

    /// Remove a posting and drop its id from every user's bookmarks.
    /// Applications to it are kept.
    pub async fn delete_job(&self, id: &str) -> Result<bool, ServiceError> {
        let existed = self
            .state
            .update(|s| {
                let before = s.jobs.len();
                s.jobs.retain(|j| j.id != id);
                for ids in s.bookmarks.values_mut() {
                    ids.retain(|j| j != id);
                }
                s.jobs.len() != before
            })
            .await?;
        if existed {
            info!(job_id = %id, "job deleted");
        }
        Ok(existed)
    }

    pub async fn jobs(&self) -> Vec<Job> {
        self.state.read(|s| s.jobs.clone()).await
    }

    pub async fn get_job(&self, id: &str) -> Option<Job> {
        self.state.read(|s| s.jobs.iter().find(|j| j.id == id).cloned()).await
    }

    /// Flip the bookmark for `(user, job)`; returns the new state.
    pub async fn toggle_bookmark(&self, job_id: &str, user_id: &str) -> Result<bool, ServiceError> {
        let now_bookmarked = self
            .state
            .update(|s| {
                let ids = s.bookmarks.entry(user_id.to_string()).or_default();
                if let Some(pos) = ids.iter().position(|j| j == job_id) {
                    ids.remove(pos);
                    false
                } else {
                    ids.push(job_id.to_string());
                    true
                }
            })
            .await?;
        Ok(now_bookmarked)
    }

    pub async fn is_bookmarked(&self, job_id: &str, user_id: &str) -> bool {
        self.state
            .read(|s| s.bookmarks.get(user_id).is_some_and(|ids| ids.iter().any(|j| j == job_id)))
            .await
    }

    pub async fn bookmarked_jobs(&self, user_id: &str) -> Vec<Job> {
        self.state
            .read(|s| {
                let Some(ids) = s.bookmarks.get(user_id) else { return Vec::new() };
                s.jobs.iter().filter(|j| ids.contains(&j.id)).cloned().collect()
            })
            .await
    }

    /// Record an application. Duplicates for the same `(job, user)` are
    /// accepted here; callers check `has_applied` first.
    pub async fn apply_for_job(&self, input: NewApplication) -> Result<JobApplication, ServiceError> {
        let application = JobApplication {
            job_id: input.job_id,
            user_id: input.user_id,
            name: input.name,
            resume: input.resume,
            about_you: input.about_you,
            experience: input.experience,
            works_done: input.works_done,
            applied_at: Utc::now(),
        };
        self.state.update(|s| s.applications.push(application.clone())).await?;
        info!(job_id = %application.job_id, user_id = %application.user_id, "job application recorded");
        Ok(application)
    }

    pub async fn has_applied(&self, job_id: &str, user_id: &str) -> bool {
        self.state
            .read(|s| s.applications.iter().any(|a| a.job_id == job_id && a.user_id == user_id))
            .await
    }

    /// The user's applications joined with their jobs, newest application first.
    pub async fn applied_jobs(&self, user_id: &str) -> Vec<AppliedJob> {
        let mut joined: Vec<AppliedJob> = self
            .state
            .read(|s| {
                s.applications
                    .iter()
                    .filter(|a| a.user_id == user_id)
                    .map(|a| AppliedJob {
                        job: s.jobs.iter().find(|j| j.id == a.job_id).cloned(),
                        application: a.clone(),
                    })
                    .collect()
            })
            .await;
        joined.sort_by(|a, b| b.application.applied_at.cmp(&a.application.applied_at));
        joined
    }
}
