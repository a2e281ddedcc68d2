// src/models/history.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Represents the 'exam_history' table in the database.
/// One row per submitted attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryRecord {
    /// Idempotency key, fixed when the session is created.
    pub attempt_id: Uuid,
    pub identity: String,
    pub type_id: i64,
    pub correct: u32,
    pub total: u32,
    pub passed: bool,
    pub recorded_at: DateTime<Utc>,
}

/// Lifecycle of the background history write for a submitted attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum PersistStatus {
    Pending,
    Saved,
    /// A row for this attempt already existed; nothing new was written.
    Duplicate,
    Failed(String),
}

impl PersistStatus {
    pub fn is_settled(&self) -> bool {
        !matches!(self, PersistStatus::Pending)
    }
}
