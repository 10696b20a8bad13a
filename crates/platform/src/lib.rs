//! Platform layer: the workflows the pages drive, composed from the service
//! stores. Every workflow resolves the signed-in account first and applies
//! the route guard before touching a store.

pub mod dashboard;
pub mod errors;
pub mod excerpt;
pub mod resume;
pub mod startup;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use service::{
    access::{self, Access, Route},
    auth::{
        domain::{SignInInput, SignUpInput},
        AuthConfig, AuthService, IdentityProvider, Role,
    },
    blog::{BlogStore, Comment, NewBlog, NewComment},
    errors::ServiceError,
    jobs::{JobApplication, JobStore, NewApplication, NewJob},
    storage::LocalStorage,
    user::{AccountData, AccountDataStore, AccountPatch, UserProfileStore},
};

pub use dashboard::Dashboard;
pub use errors::PlatformError;
pub use resume::ResumeFile;

/// A post as written in the editor.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PostDraft {
    pub title: String,
    /// HTML body.
    pub content: String,
    pub image: Option<String>,
}

/// The job application form.
#[derive(Clone, Debug)]
pub struct ApplicationForm {
    pub name: String,
    pub resume: ResumeFile,
    pub about_you: String,
    pub experience: String,
    /// Optional.
    pub works_done: String,
}

fn required(value: &str, field: &str) -> Result<(), PlatformError> {
    if value.trim().is_empty() {
        return Err(PlatformError::validation(format!("{field} is required")));
    }
    Ok(())
}

/// All stores of one data directory plus the auth service on top of them.
pub struct Platform<P: IdentityProvider> {
    pub blogs: Arc<BlogStore>,
    pub jobs: Arc<JobStore>,
    pub profile: Arc<UserProfileStore>,
    pub accounts: AccountDataStore,
    pub auth: AuthService<P>,
    storage: LocalStorage,
}

impl<P: IdentityProvider> Platform<P> {
    /// Open (and rehydrate) every store under `storage`.
    pub async fn open(storage: LocalStorage, provider: Arc<P>, auth_cfg: AuthConfig) -> Result<Self, PlatformError> {
        let blogs = BlogStore::open(storage.clone()).await?;
        let jobs = JobStore::open(storage.clone()).await?;
        let profile = UserProfileStore::open(storage.clone()).await?;
        let accounts = AccountDataStore::new(storage.clone());
        let auth = AuthService::open(storage.clone(), provider, auth_cfg).await?;
        Ok(Self { blogs, jobs, profile, accounts, auth, storage })
    }

    pub fn storage(&self) -> &LocalStorage {
        &self.storage
    }

    /// Register and sign in. The account starts out as a reader.
    #[instrument(skip(self, password))]
    pub async fn sign_up(&self, email: &str, password: &str, display_name: &str) -> Result<AccountData, PlatformError> {
        let input = SignUpInput { email: email.into(), password: password.into(), display_name: display_name.into() };
        let session = self.auth.sign_up(input).await?;
        Ok(self.account_for_session(&session.user, session.role).await?)
    }

    #[instrument(skip(self, password))]
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AccountData, PlatformError> {
        let session = self.auth.sign_in(SignInInput { email: email.into(), password: password.into() }).await?;
        Ok(self.account_for_session(&session.user, session.role).await?)
    }

    pub async fn sign_out(&self) -> Result<(), PlatformError> {
        self.auth.logout().await?;
        Ok(())
    }

    /// Account data of the signed-in user, initialized on first access.
    ///
    /// The stored role decides reader vs writer; an admin session is admin
    /// regardless of what the stored data says.
    pub async fn current_account(&self) -> Result<Option<AccountData>, PlatformError> {
        let Some(user) = self.auth.current_user().await else { return Ok(None) };
        let role = self.auth.user_role().await;
        Ok(Some(self.account_for_session(&user, role).await?))
    }

    async fn account_for_session(&self, user: &service::auth::ProviderUser, role: Role) -> Result<AccountData, ServiceError> {
        let mut data = self.accounts.load_or_init(user, role).await?;
        if role == Role::Admin {
            data.role = Role::Admin;
        }
        Ok(data)
    }

    /// Merge account settings. Name and photo changes are forwarded to the
    /// identity provider. Only an admin may grant the admin role.
    #[instrument(skip(self, patch))]
    pub async fn update_account(&self, patch: AccountPatch) -> Result<AccountData, PlatformError> {
        let account = self.require_signed_in().await?;
        if patch.role == Some(Role::Admin) && account.role != Role::Admin {
            warn!(uid = %account.uid, "attempt to self-assign admin role");
            return Err(PlatformError::Forbidden { route: Route::Profile });
        }

        let forward_name = patch.display_name.clone();
        let forward_photo = patch.photo_url.clone();
        let updated = self.accounts.update(&account.uid, patch).await?;
        if forward_name.is_some() || forward_photo.is_some() {
            let name = forward_name.unwrap_or_else(|| updated.display_name.clone());
            self.auth.update_user_profile(&name, forward_photo.as_deref()).await?;
        }
        info!(uid = %updated.uid, role = %updated.role, "account updated");
        Ok(self.current_account().await?.unwrap_or(updated))
    }

    /// Guard decision for `route` given the current session.
    pub async fn authorize(&self, route: Route) -> Result<Access, PlatformError> {
        let account = self.current_account().await?;
        Ok(access::authorize(route, account.as_ref()))
    }

    async fn require(&self, route: Route) -> Result<AccountData, PlatformError> {
        let account = self.current_account().await?;
        match access::authorize(route, account.as_ref()) {
            Access::Granted => account.ok_or(PlatformError::NotSignedIn),
            Access::RedirectToLogin => Err(PlatformError::NotSignedIn),
            Access::RedirectToUnauthorized => {
                warn!(route = route.path(), "route denied");
                Err(PlatformError::Forbidden { route })
            }
        }
    }

    async fn require_signed_in(&self) -> Result<AccountData, PlatformError> {
        self.require(Route::Profile).await
    }

    /// Add and publish a post by the signed-in writer or admin; returns its id.
    #[instrument(skip(self, draft), fields(title = %draft.title))]
    pub async fn publish_post(&self, draft: PostDraft) -> Result<String, PlatformError> {
        let account = self.require(Route::Write).await?;
        required(&draft.title, "title")?;
        required(&draft.content, "content")?;

        let id = self
            .blogs
            .add_blog(NewBlog {
                excerpt: excerpt::excerpt(&draft.content),
                title: draft.title,
                content: draft.content,
                image: draft.image,
                author: account.display_name.clone(),
                author_id: account.uid.clone(),
            })
            .await?;
        self.blogs.publish_blog(&id).await?;
        Ok(id)
    }

    /// Comment on a post as the signed-in account.
    pub async fn comment_on_post(&self, blog_id: &str, content: &str) -> Result<Option<Comment>, PlatformError> {
        let account = self.require_signed_in().await?;
        required(content, "comment")?;
        let comment = NewComment { content: content.into(), author: account.display_name, author_id: account.uid };
        Ok(self.blogs.add_comment(blog_id, comment).await?)
    }

    pub async fn toggle_post_bookmark(&self, blog_id: &str) -> Result<bool, PlatformError> {
        let account = self.require_signed_in().await?;
        Ok(self.blogs.toggle_bookmark(blog_id, &account.uid).await?)
    }

    pub async fn toggle_job_bookmark(&self, job_id: &str) -> Result<bool, PlatformError> {
        let account = self.require_signed_in().await?;
        Ok(self.jobs.toggle_bookmark(job_id, &account.uid).await?)
    }

    #[instrument(skip(self, input), fields(title = %input.title))]
    pub async fn post_job(&self, input: NewJob) -> Result<String, PlatformError> {
        self.require_signed_in().await?;
        for (value, field) in [
            (&input.title, "title"),
            (&input.description, "description"),
            (&input.salary, "salary"),
            (&input.location, "location"),
            (&input.job_type, "type"),
        ] {
            required(value, field)?;
        }
        Ok(self.jobs.add_job(input).await?)
    }

    /// Admin only. Returns whether the job existed.
    #[instrument(skip(self))]
    pub async fn delete_job(&self, job_id: &str) -> Result<bool, PlatformError> {
        self.require_signed_in().await?;
        if !self.auth.is_admin().await {
            warn!(job_id, "non-admin job deletion refused");
            return Err(PlatformError::Forbidden { route: Route::Jobs });
        }
        Ok(self.jobs.delete_job(job_id).await?)
    }

    /// Validate the form, encode the resume and record the application.
    #[instrument(skip(self, form))]
    pub async fn apply_for_job(&self, job_id: &str, form: ApplicationForm) -> Result<JobApplication, PlatformError> {
        let account = self.require_signed_in().await?;
        required(&form.name, "name")?;
        required(&form.about_you, "about you")?;
        required(&form.experience, "experience")?;
        let resume = resume::to_data_url(&form.resume)?;

        if self.jobs.get_job(job_id).await.is_none() {
            return Err(ServiceError::not_found("job").into());
        }
        if self.jobs.has_applied(job_id, &account.uid).await {
            return Err(PlatformError::AlreadyApplied { job_id: job_id.to_string() });
        }

        let application = self
            .jobs
            .apply_for_job(NewApplication {
                job_id: job_id.to_string(),
                user_id: account.uid,
                name: form.name,
                resume,
                about_you: form.about_you,
                experience: form.experience,
                works_done: form.works_done,
            })
            .await?;
        Ok(application)
    }

    pub async fn dashboard(&self) -> Result<Dashboard, PlatformError> {
        let account = self.require(Route::Dashboard).await?;
        Ok(Dashboard::collect(account, &self.blogs, &self.jobs).await)
    }
}
