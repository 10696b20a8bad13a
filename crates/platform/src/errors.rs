use service::{access::Route, auth::AuthError, errors::ServiceError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("sign in required")]
    NotSignedIn,
    #[error("access to {} denied", .route.path())]
    Forbidden { route: Route },
    #[error("{0}")]
    Validation(String),
    #[error("already applied to job {job_id}")]
    AlreadyApplied { job_id: String },
    #[error("resume is {size} bytes; the limit is {limit}")]
    ResumeTooLarge { size: usize, limit: usize },
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl PlatformError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
