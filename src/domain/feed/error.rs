use crate::error::AppError;

#[derive(Debug, thiserror::Error)]
pub enum FeedServiceError {
    #[error("dependency error: {0}")]
    Dependency(String),
    #[error("invalid input: {0}")]
    Invalid(String),
    #[error("{0}")]
    NotFound(String),
    #[error("feed collection failed: {0}")]
    Collection(String),
}

impl From<AppError> for FeedServiceError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::BadRequest(msg) => FeedServiceError::Invalid(msg),
            AppError::NotFound(msg) => FeedServiceError::NotFound(msg),
            AppError::ExternalService(msg) => FeedServiceError::Collection(msg),
            _ => FeedServiceError::Dependency(err.to_string()),
        }
    }
}

impl From<FeedServiceError> for AppError {
    fn from(err: FeedServiceError) -> Self {
        match err {
            FeedServiceError::Invalid(msg) => AppError::BadRequest(msg),
            FeedServiceError::NotFound(msg) => AppError::NotFound(msg),
            FeedServiceError::Collection(msg) => AppError::ExternalService(msg),
            FeedServiceError::Dependency(msg) => AppError::Internal(msg),
        }
    }
}
