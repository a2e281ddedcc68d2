// src/exam/session.rs

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::{
    ExamEngine,
    error::ExamError,
    loader::QuestionSet,
    persister::PersistReceipt,
};
use crate::models::{
    history::{HistoryRecord, PersistStatus},
    identity::Identity,
    score::ScoreResult,
    test_reference::TestReference,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExamStatus {
    NotStarted,
    InProgress,
    Submitted,
    Error,
}

impl fmt::Display for ExamStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ExamStatus::NotStarted => "not started",
            ExamStatus::InProgress => "in progress",
            ExamStatus::Submitted => "submitted",
            ExamStatus::Error => "in error",
        };
        f.write_str(label)
    }
}

/// Position and answers of an attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    index: usize,
    selections: HashMap<i64, i64>,
    question_count: usize,
}

impl SessionState {
    fn new(question_count: usize) -> Self {
        Self {
            index: 0,
            selections: HashMap::new(),
            question_count,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Question id to selected choice id.
    pub fn selections(&self) -> &HashMap<i64, i64> {
        &self.selections
    }

    pub fn answered_count(&self) -> usize {
        self.selections.len()
    }

    pub fn is_complete(&self) -> bool {
        self.selections.len() == self.question_count
    }
}

/// Why a session ended up in `Error`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub message: String,
    /// `start` may be invoked again with the same session.
    pub retryable: bool,
}

struct Active {
    identity: Identity,
    questions: QuestionSet,
    state: SessionState,
}

impl Active {
    fn unanswered(&self) -> Vec<i64> {
        self.questions
            .questions()
            .iter()
            .map(|q| q.id)
            .filter(|id| !self.state.selections.contains_key(id))
            .collect()
    }
}

struct Finished {
    identity: Identity,
    questions: QuestionSet,
    state: SessionState,
    result: ScoreResult,
    submitted_at: DateTime<Utc>,
    persistence: PersistReceipt,
}

enum Phase {
    NotStarted,
    InProgress(Active),
    Submitted(Finished),
    Error(Failure),
}

impl Phase {
    fn status(&self) -> ExamStatus {
        match self {
            Phase::NotStarted => ExamStatus::NotStarted,
            Phase::InProgress(_) => ExamStatus::InProgress,
            Phase::Submitted(_) => ExamStatus::Submitted,
            Phase::Error(_) => ExamStatus::Error,
        }
    }
}

/// One attempt at an assessment, from authorization through submission.
///
/// Events are applied one at a time through `&mut self`. Collaborators
/// come from the shared `ExamEngine`.
pub struct ExamSession {
    engine: Arc<ExamEngine>,
    attempt_id: Uuid,
    reference: TestReference,
    created_at: DateTime<Utc>,
    phase: Phase,
}

impl ExamSession {
    pub fn new(engine: Arc<ExamEngine>, reference: TestReference) -> Self {
        Self {
            engine,
            attempt_id: Uuid::new_v4(),
            reference,
            created_at: Utc::now(),
            phase: Phase::NotStarted,
        }
    }

    /// Authorizes the identity and loads the question set.
    ///
    /// Legal from `NotStarted`, or from `Error` when the failure was retryable.
    /// Any failure moves the session to `Error`.
    pub async fn start(&mut self, raw_identity: &str) -> Result<(), ExamError> {
        match &self.phase {
            Phase::NotStarted => {}
            Phase::Error(failure) if failure.retryable => {}
            other => {
                return Err(ExamError::InvalidTransition {
                    event: "start",
                    status: other.status(),
                });
            }
        }

        let opened = async {
            let identity = self
                .engine
                .gate
                .authorize(raw_identity, &self.reference)
                .await?;
            let questions = self.engine.loader.load_reference(&self.reference).await?;
            Ok::<_, ExamError>((identity, questions))
        }
        .await;

        match opened {
            Ok((identity, questions)) => {
                tracing::info!(
                    "Attempt {} started by {} with {} question(s)",
                    self.attempt_id,
                    identity,
                    questions.len()
                );
                let state = SessionState::new(questions.len());
                self.phase = Phase::InProgress(Active {
                    identity,
                    questions,
                    state,
                });
                Ok(())
            }
            Err(e) => {
                self.phase = Phase::Error(Failure {
                    message: e.to_string(),
                    retryable: e.is_retryable(),
                });
                Err(e)
            }
        }
    }

    /// Records `choice_id` for `question_id`, replacing any earlier selection.
    pub fn select_answer(&mut self, question_id: i64, choice_id: i64) -> Result<(), ExamError> {
        let active = self.active_mut("select an answer")?;
        let question = active
            .questions
            .get(question_id)
            .ok_or(ExamError::UnknownQuestion(question_id))?;

        if !question.has_choice(choice_id) {
            return Err(ExamError::InvalidChoice {
                question_id,
                choice_id,
            });
        }

        active.state.selections.insert(question_id, choice_id);
        Ok(())
    }

    /// Moves the current position by `delta`, clamped to the question range.
    pub fn navigate(&mut self, delta: i64) -> Result<usize, ExamError> {
        let active = self.active_mut("navigate")?;
        let last = active.state.question_count.saturating_sub(1) as i64;
        let target = (active.state.index as i64).saturating_add(delta).clamp(0, last);
        active.state.index = target as usize;
        Ok(active.state.index)
    }

    /// Freezes the answers, scores them and starts the background history write.
    ///
    /// Rejected with `IncompleteSubmission` while any question is unanswered;
    /// the session then stays `InProgress`. The returned result does not
    /// depend on whether the history write succeeds.
    pub fn submit(&mut self) -> Result<ScoreResult, ExamError> {
        let active = match std::mem::replace(&mut self.phase, Phase::NotStarted) {
            Phase::InProgress(active) => active,
            other => {
                let status = other.status();
                self.phase = other;
                return Err(ExamError::InvalidTransition {
                    event: "submit",
                    status,
                });
            }
        };

        let unanswered = active.unanswered();
        if !unanswered.is_empty() {
            self.phase = Phase::InProgress(active);
            return Err(ExamError::IncompleteSubmission { unanswered });
        }

        let Active {
            identity,
            questions,
            state,
        } = active;

        let result = self.engine.scorer.score(&questions, &state.selections);
        let submitted_at = Utc::now();
        tracing::info!(
            "Attempt {} submitted by {}: {}/{} (passed: {})",
            self.attempt_id,
            identity,
            result.correct,
            result.total,
            result.passed
        );

        let record = self.history_record(&identity, &result, submitted_at);
        let persistence = self.engine.persister.spawn(record);

        self.phase = Phase::Submitted(Finished {
            identity,
            questions,
            state,
            result: result.clone(),
            submitted_at,
            persistence,
        });

        Ok(result)
    }

    /// Re-sends the history record after a failed write. Never invoked automatically.
    ///
    /// The record keeps the attempt id, so a write that actually landed
    /// before reporting failure is reported as `Duplicate` instead of
    /// creating a second row.
    pub fn retry_persist(&mut self) -> Result<PersistReceipt, ExamError> {
        let status = self.status();
        let finished = match &self.phase {
            Phase::Submitted(finished)
                if matches!(finished.persistence.status(), PersistStatus::Failed(_)) =>
            {
                finished
            }
            _ => {
                return Err(ExamError::InvalidTransition {
                    event: "retry saving the result",
                    status,
                });
            }
        };

        let record = self.history_record(&finished.identity, &finished.result, finished.submitted_at);
        let receipt = self.engine.persister.spawn(record);
        if let Phase::Submitted(finished) = &mut self.phase {
            finished.persistence = receipt.clone();
        }
        Ok(receipt)
    }

    fn history_record(
        &self,
        identity: &Identity,
        result: &ScoreResult,
        recorded_at: DateTime<Utc>,
    ) -> HistoryRecord {
        HistoryRecord {
            attempt_id: self.attempt_id,
            identity: identity.to_string(),
            type_id: self.reference.type_id,
            correct: result.correct,
            total: result.total,
            passed: result.passed,
            recorded_at,
        }
    }

    fn active_mut(&mut self, event: &'static str) -> Result<&mut Active, ExamError> {
        let status = self.phase.status();
        match &mut self.phase {
            Phase::InProgress(active) => Ok(active),
            _ => Err(ExamError::InvalidTransition { event, status }),
        }
    }

    pub fn status(&self) -> ExamStatus {
        self.phase.status()
    }

    pub fn attempt_id(&self) -> Uuid {
        self.attempt_id
    }

    pub fn reference(&self) -> &TestReference {
        &self.reference
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn identity(&self) -> Option<&Identity> {
        match &self.phase {
            Phase::InProgress(active) => Some(&active.identity),
            Phase::Submitted(finished) => Some(&finished.identity),
            _ => None,
        }
    }

    pub fn questions(&self) -> Option<&QuestionSet> {
        match &self.phase {
            Phase::InProgress(active) => Some(&active.questions),
            Phase::Submitted(finished) => Some(&finished.questions),
            _ => None,
        }
    }

    pub fn state(&self) -> Option<&SessionState> {
        match &self.phase {
            Phase::InProgress(active) => Some(&active.state),
            Phase::Submitted(finished) => Some(&finished.state),
            _ => None,
        }
    }

    pub fn result(&self) -> Option<&ScoreResult> {
        match &self.phase {
            Phase::Submitted(finished) => Some(&finished.result),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&Failure> {
        match &self.phase {
            Phase::Error(failure) => Some(failure),
            _ => None,
        }
    }

    /// Handle on the latest history write, once submitted.
    pub fn persistence(&self) -> Option<PersistReceipt> {
        match &self.phase {
            Phase::Submitted(finished) => Some(finished.persistence.clone()),
            _ => None,
        }
    }
}
