// src/exam/error.rs

use thiserror::Error;

use super::session::ExamStatus;
use crate::repository::RepositoryError;

/// Everything that can go wrong while taking an assessment.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExamError {
    #[error("invalid identity: {0}")]
    Validation(String),

    #[error("test link '{0}' is not recognised")]
    InvalidTestReference(String),

    #[error("you are not eligible to take this test")]
    AuthorizationDenied,

    #[error("we could not verify your eligibility")]
    AuthorizationCheckFailed(#[source] RepositoryError),

    #[error("questions could not be loaded")]
    QuestionLoadFailed(#[source] RepositoryError),

    #[error("no questions configured for this test")]
    EmptyQuestionSet { type_id: i64 },

    #[error("question {0} is not part of this test")]
    UnknownQuestion(i64),

    #[error("choice {choice_id} does not belong to question {question_id}")]
    InvalidChoice { question_id: i64, choice_id: i64 },

    #[error("{} question(s) still unanswered", .unanswered.len())]
    IncompleteSubmission { unanswered: Vec<i64> },

    #[error("cannot {event} while the session is {status}")]
    InvalidTransition {
        event: &'static str,
        status: ExamStatus,
    },

    #[error("result could not be saved")]
    PersistenceFailed(#[source] RepositoryError),
}

impl ExamError {
    /// Whether re-invoking the same operation may succeed without new input.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ExamError::AuthorizationCheckFailed(_)
                | ExamError::QuestionLoadFailed(_)
                | ExamError::PersistenceFailed(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_split() {
        let transient = || RepositoryError::Connection("down".to_string());
        assert!(ExamError::AuthorizationCheckFailed(transient()).is_retryable());
        assert!(ExamError::QuestionLoadFailed(transient()).is_retryable());
        assert!(!ExamError::AuthorizationDenied.is_retryable());
        assert!(!ExamError::Validation("x".to_string()).is_retryable());
        assert!(!ExamError::EmptyQuestionSet { type_id: 1 }.is_retryable());
    }

    #[test]
    fn test_incomplete_message_counts_ids() {
        let err = ExamError::IncompleteSubmission {
            unanswered: vec![3, 9],
        };
        assert_eq!(err.to_string(), "2 question(s) still unanswered");
    }
}
