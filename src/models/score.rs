// src/models/score.rs

use serde::Serialize;

const BASIS_POINTS: u64 = 10_000;

/// Share of correct answers needed to pass, held in basis points so the
/// threshold `ceil(total × ratio)` is computed without float rounding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassRatio(u64);

impl PassRatio {
    /// Builds a ratio from a fraction in `[0, 1]`. Returns `None` otherwise.
    pub fn from_fraction(fraction: f64) -> Option<Self> {
        if !fraction.is_finite() || !(0.0..=1.0).contains(&fraction) {
            return None;
        }
        Some(Self((fraction * BASIS_POINTS as f64).round() as u64))
    }

    pub fn as_fraction(self) -> f64 {
        self.0 as f64 / BASIS_POINTS as f64
    }

    /// Minimum number of correct answers needed out of `total`.
    pub fn threshold(self, total: u32) -> u32 {
        (u64::from(total) * self.0).div_ceil(BASIS_POINTS) as u32
    }
}

impl Default for PassRatio {
    fn default() -> Self {
        Self(8_000)
    }
}

/// Per-question line of the review shown with a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionOutcome {
    pub question_id: i64,
    pub selected_choice_id: Option<i64>,
    pub correct_choice_id: Option<i64>,
    pub is_correct: bool,
}

/// Outcome of a submitted attempt. Computed once at submit time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreResult {
    pub correct: u32,
    pub total: u32,
    pub passed: bool,
    pub outcomes: Vec<QuestionOutcome>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_eighty_percent() {
        let ratio = PassRatio::default();
        assert_eq!(ratio.threshold(10), 8);
        assert_eq!(ratio.threshold(3), 3);
        assert_eq!(ratio.threshold(5), 4);
        assert_eq!(ratio.threshold(0), 0);
    }

    #[test]
    fn test_threshold_is_exact_for_awkward_fractions() {
        // 0.7 * 10 is 7.000000000000001 in f64
        let ratio = PassRatio::from_fraction(0.7).unwrap();
        assert_eq!(ratio.threshold(10), 7);
    }

    #[test]
    fn test_from_fraction_bounds() {
        assert!(PassRatio::from_fraction(-0.1).is_none());
        assert!(PassRatio::from_fraction(1.5).is_none());
        assert!(PassRatio::from_fraction(f64::NAN).is_none());
        assert_eq!(PassRatio::from_fraction(1.0).unwrap().threshold(4), 4);
        assert_eq!(PassRatio::from_fraction(0.0).unwrap().threshold(4), 0);
    }
}
