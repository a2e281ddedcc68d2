// src/models/exam.rs

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    exam::session::{ExamSession, ExamStatus, Failure},
    models::{history::PersistStatus, question::PublicQuestion, score::ScoreResult},
};

/// DTO for opening a test link.
#[derive(Debug, Deserialize, Validate)]
pub struct StartExamRequest {
    #[validate(length(min = 1, max = 254, message = "Identity must be between 1 and 254 characters."))]
    pub identity: String,
}

/// DTO for answering one question.
#[derive(Debug, Deserialize)]
pub struct SelectAnswerRequest {
    pub question_id: i64,
    pub choice_id: i64,
}

/// DTO for moving between questions.
#[derive(Debug, Deserialize)]
pub struct NavigateRequest {
    pub delta: i64,
}

/// Snapshot of a live session as returned to the test taker.
#[derive(Debug, Serialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub slug: String,
    pub status: ExamStatus,
    pub index: usize,
    pub question_count: usize,
    pub answered: Vec<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub questions: Option<Vec<PublicQuestion>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ScoreResult>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub persistence: Option<PersistStatus>,

    /// Set when the result could not be saved. The result itself still stands.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<Failure>,
}

pub const UNSAVED_WARNING: &str =
    "Your result is shown but could not be saved. You can ask to send it again.";

impl SessionView {
    pub fn from_session(session: &ExamSession, with_questions: bool) -> Self {
        let mut answered: Vec<i64> = session
            .state()
            .map(|s| s.selections().keys().copied().collect())
            .unwrap_or_default();
        answered.sort_unstable();

        let persistence = session.persistence().map(|p| p.status());
        let warning = matches!(persistence, Some(PersistStatus::Failed(_)))
            .then(|| UNSAVED_WARNING.to_string());

        Self {
            session_id: session.attempt_id(),
            slug: session.reference().slug.clone(),
            status: session.status(),
            index: session.state().map(|s| s.index()).unwrap_or(0),
            question_count: session.questions().map(|q| q.len()).unwrap_or(0),
            answered,
            questions: session
                .questions()
                .filter(|_| with_questions)
                .map(|set| set.questions().iter().map(PublicQuestion::from).collect()),
            result: session.result().cloned(),
            persistence,
            warning,
            failure: session.failure().cloned(),
        }
    }
}
