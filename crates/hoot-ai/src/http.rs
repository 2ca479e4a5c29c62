//! HTTP utilities for the classifier client.

use crate::error::ClassifierError;

/// Extension trait for `reqwest::Response` to handle common error patterns.
#[async_trait::async_trait]
pub trait ResponseExt {
    /// Ensure the response status is successful, returning a classifier error with details if not.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` for 401/403 and `Unavailable` for any other
    /// non-2xx status, including the response body in the error.
    async fn ensure_success(self, api_name: &str) -> Result<Self, ClassifierError>
    where
        Self: Sized;
}

#[async_trait::async_trait]
impl ResponseExt for reqwest::Response {
    async fn ensure_success(self, api_name: &str) -> Result<Self, ClassifierError> {
        let status = self.status();
        if status.is_success() {
            return Ok(self);
        }

        let body = self.text().await.unwrap_or_default();
        log::error!("{api_name} API error ({status}): {body}");

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            Err(ClassifierError::Unauthorized {
                status: status.as_u16(),
                body,
            })
        } else {
            Err(ClassifierError::Unavailable(format!(
                "{api_name} API failed: {status}"
            )))
        }
    }
}
