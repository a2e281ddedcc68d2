// src/models/question.rs

use serde::{Deserialize, Serialize};

/// Represents the 'assessment_types' table in the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentType {
    pub id: i64,
    pub name: String,

    /// Gating metadata: the share of questions that must be answered
    /// correctly to pass. Falls back to the configured ratio when unset.
    pub pass_ratio: Option<f64>,
}

/// One answer option of a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub id: i64,
    pub question_id: i64,
    pub text: String,
    pub is_correct: bool,
}

/// A question together with its choices, in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub type_id: i64,
    pub prompt: String,
    pub level: i32,
    pub choices: Vec<Choice>,
}

impl Question {
    /// The choice treated as "the" correct answer.
    ///
    /// Questions are expected to flag exactly one choice. When none or
    /// several are flagged, the first flagged choice wins and a question
    /// with none can never be answered correctly.
    pub fn canonical_choice(&self) -> Option<&Choice> {
        self.choices.iter().find(|c| c.is_correct)
    }

    pub fn has_choice(&self, choice_id: i64) -> bool {
        self.choices.iter().any(|c| c.id == choice_id)
    }
}

/// DTO for sending a choice to the test taker (excludes the correctness flag).
#[derive(Debug, Serialize)]
pub struct PublicChoice {
    pub id: i64,
    pub text: String,
}

/// DTO for sending a question to the test taker.
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub id: i64,
    pub prompt: String,
    pub level: i32,
    pub choices: Vec<PublicChoice>,
}

impl From<&Question> for PublicQuestion {
    fn from(q: &Question) -> Self {
        Self {
            id: q.id,
            prompt: q.prompt.clone(),
            level: q.level,
            choices: q
                .choices
                .iter()
                .map(|c| PublicChoice {
                    id: c.id,
                    text: c.text.clone(),
                })
                .collect(),
        }
    }
}
