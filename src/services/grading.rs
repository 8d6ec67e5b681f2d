// src/services/grading.rs

use crate::{
    engine::aggregate::{
        AttemptSummary, effective_marks, summarize_attempt, test_competency_profile, total_marks,
    },
    engine::competency::CompetencyScores,
    models::{
        assessment::{Question, Test},
        test_result::{AnswerSubmission, QuestionResponse},
    },
};

/// Grades submitted answers against a test.
///
/// Answers to questions the test does not contain are skipped; a correct
/// answer earns the question's marks (at least 1), a wrong one earns nothing.
pub fn grade_answers(test: &Test, answers: &[AnswerSubmission]) -> Vec<QuestionResponse> {
    answers
        .iter()
        .filter_map(|answer| {
            let question = test.question(answer.question_id)?;
            let is_correct = question.is_correct(&answer.selected_option);
            Some(QuestionResponse {
                question_id: question.id,
                selected_option: answer.selected_option.clone(),
                is_correct,
                marks_obtained: if is_correct { effective_marks(question.marks) } else { 0.0 },
                competencies: question.competencies,
            })
        })
        .collect()
}

/// Grades and aggregates an attempt in one step.
pub fn score_submission(test: &Test, answers: &[AnswerSubmission]) -> (Vec<QuestionResponse>, AttemptSummary) {
    let responses = grade_answers(test, answers);
    let summary = summarize_attempt(&responses, test.total_possible());
    (responses, summary)
}

/// Values derived from a test's questions when it is created:
/// `(total_marks, competency_profile)`.
pub fn derive_test_totals(questions: &[Question]) -> (f64, CompetencyScores) {
    (
        total_marks(questions.iter().map(|q| q.marks)),
        test_competency_profile(questions.iter().map(|q| q.competencies.to_vector())),
    )
}
