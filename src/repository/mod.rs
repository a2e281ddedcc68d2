// src/repository/mod.rs

//! Contracts for the three external stores the exam flow talks to.

pub mod memory;
pub mod postgres;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{
    history::HistoryRecord,
    identity::Identity,
    question::{AssessmentType, Question},
};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RepositoryError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("data error: {0}")]
    Data(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::ColumnDecode { .. }
            | sqlx::Error::Decode(_)
            | sqlx::Error::ColumnNotFound(_)
            | sqlx::Error::TypeNotFound { .. } => RepositoryError::Data(err.to_string()),
            other => RepositoryError::Connection(other.to_string()),
        }
    }
}

/// Result of appending a history record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    Inserted,
    /// A record with the same attempt id is already stored.
    Duplicate,
}

/// Registry of identities allowed to take assessments.
#[async_trait]
pub trait AuthorizationRegistry: Send + Sync {
    /// Returns whether any record matches the identity.
    ///
    /// `Ok(false)` is an explicit denial. `Err` means the registry could not be consulted.
    async fn is_authorized(&self, identity: &Identity) -> Result<bool, RepositoryError>;
}

/// Read access to the question bank.
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    async fn get_type(&self, type_id: i64) -> Result<Option<AssessmentType>, RepositoryError>;

    /// All questions of a type with their choices populated, ordered by id. May be empty.
    async fn get_by_type(&self, type_id: i64) -> Result<Vec<Question>, RepositoryError>;
}

/// Append-only store of submitted results.
#[async_trait]
pub trait HistoryRepository: Send + Sync {
    async fn append(&self, record: &HistoryRecord) -> Result<AppendOutcome, RepositoryError>;
}
