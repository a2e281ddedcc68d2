// src/exam/loader.rs

use std::sync::Arc;
use std::time::Duration;

use super::error::ExamError;
use crate::{
    models::{
        question::{AssessmentType, Question},
        test_reference::TestReference,
    },
    repository::QuestionRepository,
    utils::deadline::with_deadline,
};

/// The fixed, ordered questions of one assessment. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionSet {
    assessment: AssessmentType,
    questions: Vec<Question>,
}

impl QuestionSet {
    pub fn assessment(&self) -> &AssessmentType {
        &self.assessment
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn get(&self, question_id: i64) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == question_id)
    }
}

/// Resolves a test reference into its question set.
#[derive(Clone)]
pub struct QuestionBankLoader {
    repository: Arc<dyn QuestionRepository>,
    deadline: Option<Duration>,
}

impl QuestionBankLoader {
    pub fn new(repository: Arc<dyn QuestionRepository>, deadline: Option<Duration>) -> Self {
        Self {
            repository,
            deadline,
        }
    }

    pub async fn load_reference(&self, reference: &TestReference) -> Result<QuestionSet, ExamError> {
        self.load(reference.type_id).await
    }

    /// Fetches every question of `type_id` with its choices.
    ///
    /// An unknown type or a type without questions is `EmptyQuestionSet`,
    /// which is terminal. Store failures are `QuestionLoadFailed`.
    pub async fn load(&self, type_id: i64) -> Result<QuestionSet, ExamError> {
        let assessment = with_deadline(self.deadline, self.repository.get_type(type_id))
            .await
            .map_err(|e| {
                tracing::warn!("Failed to fetch assessment type {}: {}", type_id, e);
                ExamError::QuestionLoadFailed(e)
            })?
            .ok_or(ExamError::EmptyQuestionSet { type_id })?;

        let mut questions = with_deadline(self.deadline, self.repository.get_by_type(type_id))
            .await
            .map_err(|e| {
                tracing::warn!("Failed to fetch questions for type {}: {}", type_id, e);
                ExamError::QuestionLoadFailed(e)
            })?;

        if questions.is_empty() {
            tracing::warn!("Assessment type {} has no questions", type_id);
            return Err(ExamError::EmptyQuestionSet { type_id });
        }

        for question in &mut questions {
            let before = question.choices.len();
            question.choices.retain(|c| c.question_id == question.id);
            if question.choices.len() != before {
                tracing::warn!(
                    "Dropped {} stray choice(s) from question {}",
                    before - question.choices.len(),
                    question.id
                );
            }

            match question.choices.iter().filter(|c| c.is_correct).count() {
                1 => {}
                0 => tracing::warn!("Question {} has no correct choice", question.id),
                n => tracing::warn!(
                    "Question {} has {} correct choices; using the first",
                    question.id,
                    n
                ),
            }
        }

        Ok(QuestionSet {
            assessment,
            questions,
        })
    }
}
