use serde::Serialize;
use service::{
    blog::{Blog, BlogStore},
    jobs::{AppliedJob, Job, JobStore},
    user::AccountData,
};

/// Everything the dashboard shows for one account.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub account: AccountData,
    pub posts: Vec<Blog>,
    /// Sum of views across `posts`.
    pub total_views: u64,
    pub bookmarked_posts: Vec<Blog>,
    pub bookmarked_jobs: Vec<Job>,
    /// Newest application first.
    pub applications: Vec<AppliedJob>,
}

impl Dashboard {
    pub(crate) async fn collect(account: AccountData, blogs: &BlogStore, jobs: &JobStore) -> Self {
        let uid = account.uid.clone();
        let posts = blogs.user_blogs(&uid).await;
        let total_views = posts.iter().map(|b| b.views).sum();
        Self {
            posts,
            total_views,
            bookmarked_posts: blogs.bookmarked_blogs(&uid).await,
            bookmarked_jobs: jobs.bookmarked_jobs(&uid).await,
            applications: jobs.applied_jobs(&uid).await,
            account,
        }
    }
}
