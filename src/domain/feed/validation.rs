use crate::error::{AppError, AppResult};
use url::Url;
use uuid::Uuid;

pub fn validate_id(id: &str) -> AppResult<Uuid> {
    Uuid::parse_str(id.trim())
        .map_err(|_| AppError::BadRequest(format!("provided ID is not valid: {}", id)))
}

pub fn validate_ids(ids: &[String]) -> AppResult<Vec<Uuid>> {
    ids.iter().map(|id| validate_id(id)).collect()
}

/// A feed URL must be absolute; relative references have no scheme.
pub fn validate_feed_url(feed_url: &str) -> AppResult<()> {
    match Url::parse(feed_url) {
        Ok(_) => Ok(()),
        Err(url::ParseError::RelativeUrlWithoutBase) => Err(AppError::BadRequest(
            "provided URL has no scheme".to_string(),
        )),
        Err(e) => Err(AppError::BadRequest(format!("provided URL is not valid: {}", e))),
    }
}

pub fn validate_name(name: &str) -> AppResult<()> {
    if name.replace(' ', "").is_empty() {
        return Err(AppError::BadRequest("empty value provided".to_string()));
    }
    Ok(())
}
