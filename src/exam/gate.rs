// src/exam/gate.rs

use std::sync::Arc;
use std::time::Duration;

use super::error::ExamError;
use crate::{
    models::{identity::Identity, test_reference::TestReference},
    repository::AuthorizationRegistry,
    utils::deadline::with_deadline,
};

/// Checks a test taker against the authorization registry.
#[derive(Clone)]
pub struct SessionGate {
    registry: Arc<dyn AuthorizationRegistry>,
    deadline: Option<Duration>,
}

impl SessionGate {
    pub fn new(registry: Arc<dyn AuthorizationRegistry>, deadline: Option<Duration>) -> Self {
        Self { registry, deadline }
    }

    /// Validates `raw_identity` and performs one registry lookup.
    ///
    /// Malformed identities fail with `Validation` without touching the registry.
    /// A missing record is `AuthorizationDenied`; a registry failure is
    /// `AuthorizationCheckFailed`.
    pub async fn authorize(
        &self,
        raw_identity: &str,
        reference: &TestReference,
    ) -> Result<Identity, ExamError> {
        let identity = Identity::parse(raw_identity).inspect_err(|e| {
            tracing::info!("Rejected identity for test '{}': {}", reference.slug, e);
        })?;

        let authorized = with_deadline(self.deadline, self.registry.is_authorized(&identity))
            .await
            .map_err(|e| {
                tracing::warn!("Authorization check failed for {}: {}", identity, e);
                ExamError::AuthorizationCheckFailed(e)
            })?;

        if !authorized {
            tracing::info!("{} is not eligible for test '{}'", identity, reference.slug);
            return Err(ExamError::AuthorizationDenied);
        }

        Ok(identity)
    }
}
