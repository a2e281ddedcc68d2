// src/exam/persister.rs

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use uuid::Uuid;

use super::error::ExamError;
use crate::{
    models::history::{HistoryRecord, PersistStatus},
    repository::{AppendOutcome, HistoryRepository, RepositoryError},
    utils::deadline::with_deadline,
};

/// Best-effort writer of submitted results. One attempt per call, never retries.
#[derive(Clone)]
pub struct ResultPersister {
    history: Arc<dyn HistoryRepository>,
    deadline: Option<Duration>,
}

impl ResultPersister {
    pub fn new(history: Arc<dyn HistoryRepository>, deadline: Option<Duration>) -> Self {
        Self { history, deadline }
    }

    /// Writes `record` once and waits for the outcome.
    pub async fn persist(&self, record: &HistoryRecord) -> Result<AppendOutcome, ExamError> {
        self.append(record).await.map_err(ExamError::PersistenceFailed)
    }

    /// Starts the write in the background and returns a handle to observe it.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(&self, record: HistoryRecord) -> PersistReceipt {
        let (tx, rx) = watch::channel(PersistStatus::Pending);
        let persister = self.clone();

        tokio::spawn(async move {
            let status = match persister.persist(&record).await {
                Ok(AppendOutcome::Inserted) => {
                    tracing::info!(
                        "Saved result for attempt {} ({}/{})",
                        record.attempt_id,
                        record.correct,
                        record.total
                    );
                    PersistStatus::Saved
                }
                Ok(AppendOutcome::Duplicate) => {
                    tracing::info!("Result for attempt {} already stored", record.attempt_id);
                    PersistStatus::Duplicate
                }
                Err(e) => failed_status(record.attempt_id, &e),
            };
            tx.send_replace(status);
        });

        PersistReceipt { status: rx }
    }

    async fn append(&self, record: &HistoryRecord) -> Result<AppendOutcome, RepositoryError> {
        with_deadline(self.deadline, self.history.append(record)).await
    }
}

const UNSAVED: &str = "result could not be saved";

/// Logs the store error in full and keeps only the client-facing message.
fn failed_status(attempt_id: Uuid, err: &ExamError) -> PersistStatus {
    match std::error::Error::source(err) {
        Some(cause) => tracing::warn!("Failed to save result for attempt {}: {}", attempt_id, cause),
        None => tracing::warn!("Failed to save result for attempt {}: {}", attempt_id, err),
    }
    PersistStatus::Failed(err.to_string())
}

/// Observer for a background history write.
#[derive(Debug, Clone)]
pub struct PersistReceipt {
    status: watch::Receiver<PersistStatus>,
}

impl PersistReceipt {
    /// Current status without waiting.
    pub fn status(&self) -> PersistStatus {
        self.status.borrow().clone()
    }

    /// Waits until the write has finished one way or the other.
    pub async fn settled(&mut self) -> PersistStatus {
        match self.status.wait_for(PersistStatus::is_settled).await {
            Ok(status) => status.clone(),
            Err(_) => {
                tracing::warn!("History write task ended without reporting a status");
                PersistStatus::Failed(UNSAVED.to_string())
            }
        }
    }
}
