use async_trait::async_trait;

use crate::error::AppResult;

/// External blob storage used to host post images.
///
/// Implementations upload `bytes` under `filename` and return the public URL
/// the post should reference. Failures should be reported as
/// `AppError::ServiceUnavailable`.
#[async_trait]
pub trait BlobStorage: Send + Sync {
    async fn upload(&self, filename: &str, bytes: Vec<u8>) -> AppResult<String>;
}
