// src/utils/deadline.rs

use std::future::Future;
use std::time::Duration;

use crate::repository::RepositoryError;

/// Runs a store call under an optional deadline.
///
/// Expiry drops the in-flight future and reports `RepositoryError::Timeout`.
pub async fn with_deadline<T, F>(deadline: Option<Duration>, call: F) -> Result<T, RepositoryError>
where
    F: Future<Output = Result<T, RepositoryError>>,
{
    match deadline {
        Some(limit) => tokio::time::timeout(limit, call)
            .await
            .map_err(|_| RepositoryError::Timeout(limit))?,
        None => call.await,
    }
}
