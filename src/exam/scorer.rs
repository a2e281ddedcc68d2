// src/exam/scorer.rs

use std::collections::HashMap;

use super::loader::QuestionSet;
use crate::models::{
    question::{AssessmentType, Question},
    score::{PassRatio, QuestionOutcome, ScoreResult},
};

/// Grades selections against canonical correct choices.
#[derive(Debug, Clone, Copy, Default)]
pub struct Scorer {
    default_ratio: PassRatio,
}

impl Scorer {
    pub fn new(default_ratio: PassRatio) -> Self {
        Self { default_ratio }
    }

    /// The assessment's own ratio when it carries a valid one, else the default.
    pub fn ratio_for(&self, assessment: &AssessmentType) -> PassRatio {
        assessment
            .pass_ratio
            .and_then(PassRatio::from_fraction)
            .unwrap_or(self.default_ratio)
    }

    pub fn score(&self, set: &QuestionSet, selections: &HashMap<i64, i64>) -> ScoreResult {
        score(set.questions(), selections, self.ratio_for(set.assessment()))
    }
}

/// Pure scoring: one point per question whose selection is its canonical
/// correct choice. No partial credit, no weighting by level.
///
/// A result over zero questions never passes.
pub fn score(
    questions: &[Question],
    selections: &HashMap<i64, i64>,
    pass_ratio: PassRatio,
) -> ScoreResult {
    let outcomes: Vec<QuestionOutcome> = questions
        .iter()
        .map(|q| {
            let selected = selections.get(&q.id).copied();
            let canonical = q.canonical_choice().map(|c| c.id);
            QuestionOutcome {
                question_id: q.id,
                selected_choice_id: selected,
                correct_choice_id: canonical,
                is_correct: selected.is_some() && selected == canonical,
            }
        })
        .collect();

    let total = outcomes.len() as u32;
    let correct = outcomes.iter().filter(|o| o.is_correct).count() as u32;
    let passed = total > 0 && correct >= pass_ratio.threshold(total);

    ScoreResult {
        correct,
        total,
        passed,
        outcomes,
    }
}
