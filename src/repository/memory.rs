// src/repository/memory.rs

//! Process-local stores backed by `HashMap`s. Used by tests and local runs.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{
    AppendOutcome, AuthorizationRegistry, HistoryRepository, QuestionRepository, RepositoryError,
};
use crate::models::{
    history::HistoryRecord,
    identity::Identity,
    question::{AssessmentType, Question},
};

#[derive(Clone, Default)]
pub struct InMemoryRegistry {
    identities: Arc<Mutex<HashSet<String>>>,
}

impl InMemoryRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an identity. Stored lower-cased, the way lookups arrive.
    pub fn allow(&self, identity: &str) -> Result<(), RepositoryError> {
        let mut guard = self
            .identities
            .lock()
            .map_err(|e| RepositoryError::Connection(e.to_string()))?;
        guard.insert(identity.trim().to_lowercase());
        Ok(())
    }
}

#[async_trait]
impl AuthorizationRegistry for InMemoryRegistry {
    async fn is_authorized(&self, identity: &Identity) -> Result<bool, RepositoryError> {
        let guard = self
            .identities
            .lock()
            .map_err(|e| RepositoryError::Connection(e.to_string()))?;
        Ok(guard.contains(identity.as_str()))
    }
}

#[derive(Clone, Default)]
pub struct InMemoryQuestionBank {
    types: Arc<Mutex<HashMap<i64, AssessmentType>>>,
    questions: Arc<Mutex<Vec<Question>>>,
}

impl InMemoryQuestionBank {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_type(&self, assessment: AssessmentType) -> Result<(), RepositoryError> {
        let mut guard = self
            .types
            .lock()
            .map_err(|e| RepositoryError::Connection(e.to_string()))?;
        guard.insert(assessment.id, assessment);
        Ok(())
    }

    pub fn add_question(&self, question: Question) -> Result<(), RepositoryError> {
        let mut guard = self
            .questions
            .lock()
            .map_err(|e| RepositoryError::Connection(e.to_string()))?;
        guard.push(question);
        Ok(())
    }
}

#[async_trait]
impl QuestionRepository for InMemoryQuestionBank {
    async fn get_type(&self, type_id: i64) -> Result<Option<AssessmentType>, RepositoryError> {
        let guard = self
            .types
            .lock()
            .map_err(|e| RepositoryError::Connection(e.to_string()))?;
        Ok(guard.get(&type_id).cloned())
    }

    async fn get_by_type(&self, type_id: i64) -> Result<Vec<Question>, RepositoryError> {
        let guard = self
            .questions
            .lock()
            .map_err(|e| RepositoryError::Connection(e.to_string()))?;
        let mut found: Vec<Question> = guard
            .iter()
            .filter(|q| q.type_id == type_id)
            .cloned()
            .collect();
        found.sort_by_key(|q| q.id);
        Ok(found)
    }
}

#[derive(Clone, Default)]
pub struct InMemoryHistory {
    records: Arc<Mutex<Vec<HistoryRecord>>>,
}

impl InMemoryHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Result<Vec<HistoryRecord>, RepositoryError> {
        let guard = self
            .records
            .lock()
            .map_err(|e| RepositoryError::Connection(e.to_string()))?;
        Ok(guard.clone())
    }
}

#[async_trait]
impl HistoryRepository for InMemoryHistory {
    async fn append(&self, record: &HistoryRecord) -> Result<AppendOutcome, RepositoryError> {
        let mut guard = self
            .records
            .lock()
            .map_err(|e| RepositoryError::Connection(e.to_string()))?;
        if guard.iter().any(|r| r.attempt_id == record.attempt_id) {
            return Ok(AppendOutcome::Duplicate);
        }
        guard.push(record.clone());
        Ok(AppendOutcome::Inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_registry_matches_normalized_identity() {
        let registry = InMemoryRegistry::new();
        registry.allow("Alice@Example.com").unwrap();

        let alice = Identity::parse("ALICE@example.com").unwrap();
        let bob = Identity::parse("bob@example.com").unwrap();
        assert!(registry.is_authorized(&alice).await.unwrap());
        assert!(!registry.is_authorized(&bob).await.unwrap());
    }

    #[tokio::test]
    async fn test_history_rejects_same_attempt_twice() {
        let history = InMemoryHistory::new();
        let record = HistoryRecord {
            attempt_id: Uuid::new_v4(),
            identity: "a@x.com".to_string(),
            type_id: 1,
            correct: 1,
            total: 2,
            passed: false,
            recorded_at: Utc::now(),
        };

        assert_eq!(history.append(&record).await.unwrap(), AppendOutcome::Inserted);
        assert_eq!(history.append(&record).await.unwrap(), AppendOutcome::Duplicate);
        assert_eq!(history.records().unwrap().len(), 1);
    }
}
