// src/engine/aggregate.rs

use serde::Serialize;

use super::{
    competency::{Competency, CompetencyScores, CompetencyVector},
    round2,
};

/// A graded answer: what the question contributes to each competency, and the
/// marks the student earned on it.
pub trait GradedResponse {
    fn contribution(&self) -> CompetencyVector;
    fn marks_obtained(&self) -> f64;
}

/// Running totals over a list of responses.
#[derive(Debug, Clone, Copy, Default)]
struct Tally {
    sums: [f64; Competency::COUNT],
    marks: f64,
    count: usize,
}

impl Tally {
    fn add(self, contribution: &CompetencyVector, marks: f64) -> Self {
        let mut sums = self.sums;
        for (sum, value) in sums.iter_mut().zip(contribution.as_array()) {
            *sum += value;
        }
        Tally {
            sums,
            marks: self.marks + marks,
            count: self.count + 1,
        }
    }

    fn absorb<R: GradedResponse + ?Sized>(self, response: &R) -> Self {
        self.add(&response.contribution(), response.marks_obtained())
    }

    /// Per-dimension mean, with the divisor floored at 1.
    fn mean(&self) -> CompetencyVector {
        let count = self.count.max(1) as f64;
        CompetencyVector::new(self.sums.map(|s| s / count))
    }
}

fn tally<R: GradedResponse>(responses: &[R]) -> Tally {
    responses.iter().fold(Tally::default(), |acc, r| acc.absorb(r))
}

/// Average contribution per dimension, scaled to 0..100 and rounded to 2 decimals.
pub fn compute_competency_averages<R: GradedResponse>(responses: &[R]) -> CompetencyScores {
    scaled_scores(&tally(responses))
}

fn scaled_scores(totals: &Tally) -> CompetencyScores {
    let mean = totals.mean();
    CompetencyScores::from(CompetencyVector::new(
        mean.into_array().map(|m| round2(m * 100.0)),
    ))
}

/// `total / possible` as a 2-decimal percentage.
///
/// A zero (or negative) `possible` is treated as 1 rather than rejected.
pub fn percentage(total: f64, possible: f64) -> f64 {
    let possible = if possible > 0.0 { possible } else { 1.0 };
    round2(total / possible * 100.0)
}

/// Derived aggregates of one test attempt.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AttemptSummary {
    pub competency_scores: CompetencyScores,
    pub total_score: f64,
    pub total_possible: f64,
    pub percentage: f64,
}

/// Computes scores, totals and percentage for a graded attempt in one pass.
pub fn summarize_attempt<R: GradedResponse>(responses: &[R], total_possible: f64) -> AttemptSummary {
    let totals = tally(responses);

    AttemptSummary {
        competency_scores: scaled_scores(&totals),
        total_score: totals.marks,
        total_possible,
        percentage: percentage(totals.marks, total_possible),
    }
}

/// Marks available in a test. A question without positive marks is worth 1.
pub fn total_marks<I: IntoIterator<Item = f64>>(question_marks: I) -> f64 {
    question_marks.into_iter().map(effective_marks).sum()
}

/// Marks a question is worth. Unmarked (zero or negative) questions count as 1,
/// both toward the test total and when answered correctly.
pub fn effective_marks(marks: f64) -> f64 {
    if marks > 0.0 { marks } else { 1.0 }
}

/// Test-level competency profile: per-dimension mean of the questions'
/// contributions, rounded to 2 decimals (not scaled).
pub fn test_competency_profile<I: IntoIterator<Item = CompetencyVector>>(contributions: I) -> CompetencyScores {
    let totals = contributions
        .into_iter()
        .fold(Tally::default(), |acc, v| acc.add(&v, 0.0));
    CompetencyScores::from(CompetencyVector::new(totals.mean().into_array().map(round2)))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Answer {
        contribution: [f64; 6],
        marks: f64,
    }

    impl GradedResponse for Answer {
        fn contribution(&self) -> CompetencyVector {
            CompetencyVector::new(self.contribution)
        }

        fn marks_obtained(&self) -> f64 {
            self.marks
        }
    }

    fn answer(contribution: [f64; 6], marks: f64) -> Answer {
        Answer { contribution, marks }
    }

    #[test]
    fn test_averages_are_scaled_and_rounded() {
        let responses = vec![
            answer([1.0, 0.0, 0.0, 0.0, 0.0, 0.5], 1.0),
            answer([0.0, 1.0, 0.0, 0.0, 0.0, 0.0], 0.0),
            answer([0.0, 0.0, 0.0, 0.0, 0.0, 0.0], 0.0),
        ];
        let scores = compute_competency_averages(&responses);
        assert_eq!(scores.analytical, 33.33);
        assert_eq!(scores.verbal, 33.33);
        assert_eq!(scores.technical, 16.67);
        assert_eq!(scores.creative, 0.0);
    }

    #[test]
    fn test_empty_responses_give_zero_scores() {
        let responses: Vec<Answer> = Vec::new();
        assert_eq!(compute_competency_averages(&responses), CompetencyScores::default());

        let summary = summarize_attempt(&responses, 0.0);
        assert_eq!(summary.total_score, 0.0);
        assert_eq!(summary.percentage, 0.0);
    }

    #[test]
    fn test_half_marks_attempt() {
        // 4 responses, 2 correct worth 5 marks each, 20 marks available
        let responses = vec![
            answer([0.4, 0.0, 0.0, 0.0, 0.0, 0.0], 5.0),
            answer([0.0, 0.6, 0.0, 0.0, 0.0, 0.0], 5.0),
            answer([0.0, 0.0, 0.2, 0.0, 0.0, 0.0], 0.0),
            answer([0.0, 0.0, 0.0, 0.8, 0.0, 0.0], 0.0),
        ];
        let summary = summarize_attempt(&responses, 20.0);
        assert_eq!(summary.total_score, 10.0);
        assert_eq!(summary.percentage, 50.0);
        assert_eq!(summary.competency_scores.analytical, 10.0);
        assert_eq!(summary.competency_scores.scientific, 20.0);
        assert_eq!(summary.competency_scores, compute_competency_averages(&responses));
    }

    #[test]
    fn test_percentage_floors_possible_at_one() {
        assert_eq!(percentage(3.0, 0.0), 300.0);
        assert_eq!(percentage(1.0, 3.0), 33.33);
    }

    #[test]
    fn test_total_marks_counts_unmarked_questions_as_one() {
        assert_eq!(total_marks([2.0, 0.0, 3.0]), 6.0);
        assert_eq!(total_marks(Vec::<f64>::new()), 0.0);
    }

    #[test]
    fn test_effective_marks_floors_unmarked_at_one() {
        assert_eq!(effective_marks(4.0), 4.0);
        assert_eq!(effective_marks(0.0), 1.0);
        assert_eq!(effective_marks(-2.0), 1.0);
    }

    #[test]
    fn test_competency_profile_is_unscaled_mean() {
        let profile = test_competency_profile([
            CompetencyVector::new([1.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
            CompetencyVector::new([0.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
            CompetencyVector::new([0.0, 0.0, 0.0, 0.0, 0.0, 2.0]),
        ]);
        assert_eq!(profile.analytical, 0.33);
        assert_eq!(profile.technical, 0.67);
    }
}
