use std::sync::Arc;

use platform::{ApplicationForm, Platform, PlatformError, PostDraft, ResumeFile};
use service::auth::{provider::mock::MockIdentityProvider, AuthConfig, Role};
use service::jobs::NewJob;
use service::storage::LocalStorage;
use service::user::AccountPatch;
use uuid::Uuid;

const ADMIN: &str = "admin@blogsphere.local";
const ADMIN_PW: &str = "ilovebooks";

async fn build_platform() -> anyhow::Result<Platform<MockIdentityProvider>> {
    let dir = std::env::temp_dir().join(format!("platform_flow_{}", Uuid::new_v4()));
    let storage = LocalStorage::new(dir).await?;
    let cfg = AuthConfig { admin_email: ADMIN.into(), admin_password: ADMIN_PW.into(), jwt_secret: None, session_ttl_hours: 12 };
    Ok(Platform::open(storage, Arc::new(MockIdentityProvider::default()), cfg).await?)
}

async fn cleanup(p: &Platform<MockIdentityProvider>) {
    let _ = tokio::fs::remove_dir_all(p.storage().root()).await;
}

fn job(title: &str) -> NewJob {
    NewJob {
        title: title.into(),
        description: "Write long-form pieces".into(),
        salary: "$60k".into(),
        location: "Remote".into(),
        job_type: "Full-time".into(),
    }
}

fn form(size: usize) -> ApplicationForm {
    ApplicationForm {
        name: "Ada".into(),
        resume: ResumeFile { file_name: "cv.pdf".into(), mime_type: String::new(), bytes: vec![b'x'; size] },
        about_you: "I write".into(),
        experience: "2-5 years".into(),
        works_done: String::new(),
    }
}

#[tokio::test]
async fn test_publish_requires_writer_and_builds_excerpt() -> anyhow::Result<()> {
    let p = build_platform().await?;
    let draft = PostDraft { title: "Hello".into(), content: format!("<h1>Hi</h1><p>{}</p>", "a".repeat(200)), image: None };

    assert!(matches!(p.publish_post(draft.clone()).await, Err(PlatformError::NotSignedIn)));
    p.sign_up("w@example.com", "Passw0rd", "Wendy").await?;
    assert!(matches!(p.publish_post(draft.clone()).await, Err(PlatformError::Forbidden { .. })));

    p.update_account(AccountPatch { role: Some(Role::Writer), ..Default::default() }).await?;
    let blank = PostDraft { title: "  ".into(), ..draft.clone() };
    assert!(matches!(p.publish_post(blank).await, Err(PlatformError::Validation(_))));

    let id = p.publish_post(draft).await?;
    let blog = p.blogs.get_blog(&id).await.expect("stored");
    assert!(blog.published);
    assert_eq!(blog.author, "Wendy");
    assert!(blog.excerpt.starts_with("Hiaaa"));
    assert_eq!(blog.excerpt.chars().count(), 123);
    assert!(blog.excerpt.ends_with("..."));
    cleanup(&p).await;
    Ok(())
}

#[tokio::test]
async fn test_job_posting_and_admin_only_delete() -> anyhow::Result<()> {
    let p = build_platform().await?;
    assert!(matches!(p.post_job(job("Editor")).await, Err(PlatformError::NotSignedIn)));

    p.sign_up("r@example.com", "Passw0rd", "Rita").await?;
    let incomplete = NewJob { salary: String::new(), ..job("Editor") };
    assert!(matches!(p.post_job(incomplete).await, Err(PlatformError::Validation(_))));
    let id = p.post_job(job("Editor")).await?;
    assert!(matches!(p.delete_job(&id).await, Err(PlatformError::Forbidden { .. })));
    p.sign_out().await?;

    p.sign_up(ADMIN, ADMIN_PW, "x").await?;
    p.sign_in(ADMIN, ADMIN_PW).await?;
    assert!(p.delete_job(&id).await?);
    assert!(p.jobs.get_job(&id).await.is_none());
    cleanup(&p).await;
    Ok(())
}

#[tokio::test]
async fn test_apply_validates_and_rejects_duplicates() -> anyhow::Result<()> {
    let p = build_platform().await?;
    p.sign_up("a@example.com", "Passw0rd", "Ada").await?;
    let id = p.post_job(job("Columnist")).await?;

    let mut missing = form(10);
    missing.experience = String::new();
    assert!(matches!(p.apply_for_job(&id, missing).await, Err(PlatformError::Validation(_))));
    assert!(matches!(
        p.apply_for_job(&id, form(5 * 1024 * 1024 + 1)).await,
        Err(PlatformError::ResumeTooLarge { .. })
    ));
    assert!(matches!(p.apply_for_job("missing", form(10)).await, Err(PlatformError::Service(_))));

    let application = p.apply_for_job(&id, form(10)).await?;
    assert!(application.resume.starts_with("data:application/pdf;base64,"));
    assert!(matches!(p.apply_for_job(&id, form(10)).await, Err(PlatformError::AlreadyApplied { .. })));
    cleanup(&p).await;
    Ok(())
}

#[tokio::test]
async fn test_dashboard_collects_user_state() -> anyhow::Result<()> {
    let p = build_platform().await?;
    assert!(matches!(p.dashboard().await, Err(PlatformError::NotSignedIn)));

    let account = p.sign_up("d@example.com", "Passw0rd", "Dana").await?;
    p.update_account(AccountPatch { role: Some(Role::Writer), ..Default::default() }).await?;
    let post = p.publish_post(PostDraft { title: "One".into(), content: "<p>body</p>".into(), image: None }).await?;
    p.blogs.record_view(&post).await?;
    p.blogs.record_view(&post).await?;
    assert!(p.toggle_post_bookmark(&post).await?);

    let job_id = p.post_job(job("Editor")).await?;
    assert!(p.toggle_job_bookmark(&job_id).await?);
    p.apply_for_job(&job_id, form(10)).await?;
    let comment = p.comment_on_post(&post, "Nice").await?.expect("post exists");
    assert_eq!(comment.author_id, account.uid);

    let dash = p.dashboard().await?;
    assert_eq!(dash.account.uid, account.uid);
    assert_eq!(dash.posts.len(), 1);
    assert_eq!(dash.total_views, 2);
    assert_eq!(dash.bookmarked_posts[0].id, post);
    assert_eq!(dash.bookmarked_jobs[0].id, job_id);
    assert_eq!(dash.applications.len(), 1);
    cleanup(&p).await;
    Ok(())
}
