// src/models/test_result.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use validator::Validate;

use crate::engine::{
    aggregate::GradedResponse,
    competency::{Competency, CompetencyScores, CompetencyVector},
    round2,
};

/// Per-question outcome of an attempt. Stored in the `responses` JSON column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionResponse {
    pub question_id: i64,
    pub selected_option: String,
    pub is_correct: bool,
    pub marks_obtained: f64,
    /// Copied from the question at grading time.
    pub competencies: CompetencyScores,
}

impl GradedResponse for QuestionResponse {
    fn contribution(&self) -> CompetencyVector {
        self.competencies.to_vector()
    }

    fn marks_obtained(&self) -> f64 {
        self.marks_obtained
    }
}

/// Represents the 'test_results' table. One row per attempt, never updated.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TestResult {
    pub id: i64,
    pub user_id: i64,
    pub test_id: i64,
    pub responses: Json<Vec<QuestionResponse>>,
    pub total_score: f64,
    pub total_possible: f64,
    pub percentage: f64,
    pub competency_scores: Json<CompetencyScores>,
    pub attempt_number: i32,
    /// Seconds.
    pub duration_taken: Option<i32>,
    pub completed_at: chrono::DateTime<chrono::Utc>,
}

/// One submitted answer.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct AnswerSubmission {
    pub question_id: i64,
    #[validate(length(max = 500))]
    pub selected_option: String,
}

/// DTO for submitting a test attempt.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitTestRequest {
    pub test_id: i64,
    #[validate(length(min = 1, max = 500), nested)]
    pub answers: Vec<AnswerSubmission>,
    #[validate(range(min = 0))]
    pub duration_taken: Option<i32>,
}

/// Averages over a set of attempts, used by the admin analytics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AveragePerformance {
    pub percentage: f64,
    pub competencies: CompetencyScores,
}

impl AveragePerformance {
    /// Mean percentage and mean competency scores, rounded to 2 decimals.
    /// `None` for an empty slice.
    pub fn of(results: &[TestResult]) -> Option<Self> {
        if results.is_empty() {
            return None;
        }
        let n = results.len() as f64;
        let (percentage_sum, competency_sums) = results.iter().fold(
            (0.0, [0.0; Competency::COUNT]),
            |(pct, mut sums), r| {
                for (sum, value) in sums.iter_mut().zip(r.competency_scores.0.to_vector().as_array()) {
                    *sum += value;
                }
                (pct + r.percentage, sums)
            },
        );

        Some(Self {
            percentage: round2(percentage_sum / n),
            competencies: CompetencyScores::from(CompetencyVector::new(
                competency_sums.map(|s| round2(s / n)),
            )),
        })
    }
}

/// Aggregate numbers over every stored attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlobalAnalytics {
    pub total_results: i64,
    pub average: Option<AveragePerformance>,
}
