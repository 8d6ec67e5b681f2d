// src/models/assessment.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use validator::Validate;

use crate::engine::competency::CompetencyScores;

pub const QUESTION_TYPES: [&str; 5] = ["MCQ", "TrueFalse", "Numeric", "Scenario", "Descriptive"];
pub const DIFFICULTIES: [&str; 3] = ["Easy", "Medium", "Hard"];

/// One answer choice of a question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct QuestionOption {
    #[validate(length(min = 1, max = 500))]
    pub text: String,
    #[serde(default)]
    pub is_correct: bool,
}

/// A question embedded in a test. Stored inside the test's JSON `questions` column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    /// Position-based id, unique within its test.
    pub id: i64,
    pub question_text: String,
    pub question_type: String,
    pub correct_answer: Option<String>,
    pub marks: f64,
    pub difficulty: String,
    /// What answering this question correctly says about each competency.
    pub competencies: CompetencyScores,
    pub options: Vec<QuestionOption>,
}

impl Question {
    /// A selection is correct when it equals the answer key, or names an
    /// option flagged correct by its text or zero-based index.
    pub fn is_correct(&self, selected: &str) -> bool {
        if self.correct_answer.as_deref() == Some(selected) {
            return true;
        }
        self.options
            .iter()
            .enumerate()
            .any(|(i, opt)| opt.is_correct && (opt.text == selected || i.to_string() == selected))
    }
}

/// Question as sent to test takers (no answer key, no correctness flags).
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub id: i64,
    pub question_text: String,
    pub question_type: String,
    pub marks: f64,
    pub difficulty: String,
    pub options: Vec<String>,
}

impl From<&Question> for PublicQuestion {
    fn from(q: &Question) -> Self {
        Self {
            id: q.id,
            question_text: q.question_text.clone(),
            question_type: q.question_type.clone(),
            marks: q.marks,
            difficulty: q.difficulty.clone(),
            options: q.options.iter().map(|o| o.text.clone()).collect(),
        }
    }
}

/// Represents the 'tests' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Test {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    /// Minutes.
    pub duration: i32,
    pub total_marks: f64,
    pub is_active: bool,
    pub created_by: i64,
    pub questions: Json<Vec<Question>>,
    /// Mean of the questions' competency contributions.
    pub competency_profile: Json<CompetencyScores>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Test {
    pub fn question(&self, id: i64) -> Option<&Question> {
        self.questions.0.iter().find(|q| q.id == id)
    }

    /// Marks an attempt is graded against: the stored total, or one per question.
    pub fn total_possible(&self) -> f64 {
        if self.total_marks > 0.0 {
            self.total_marks
        } else {
            self.questions.0.len() as f64
        }
    }
}

/// Test summary for listings (questions omitted).
#[derive(Debug, Serialize, FromRow)]
pub struct TestSummary {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub duration: i32,
    pub total_marks: f64,
    pub question_count: i64,
    pub competency_profile: Json<CompetencyScores>,
}

/// Test with its questions stripped of answers.
#[derive(Debug, Serialize)]
pub struct PublicTest {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub duration: i32,
    pub total_marks: f64,
    pub questions: Vec<PublicQuestion>,
}

impl From<&Test> for PublicTest {
    fn from(t: &Test) -> Self {
        Self {
            id: t.id,
            title: t.title.clone(),
            description: t.description.clone(),
            duration: t.duration,
            total_marks: t.total_marks,
            questions: t.questions.0.iter().map(PublicQuestion::from).collect(),
        }
    }
}

/// DTO for one question inside a create-test request.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, max = 2000))]
    pub question_text: String,
    #[validate(custom(function = validate_question_type))]
    pub question_type: Option<String>,
    #[validate(length(max = 500))]
    pub correct_answer: Option<String>,
    #[validate(range(min = 0.0))]
    pub marks: Option<f64>,
    #[validate(custom(function = validate_difficulty))]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub competencies: CompetencyScores,
    #[serde(default)]
    #[validate(nested)]
    pub options: Vec<QuestionOption>,
}

/// DTO for creating a test.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTestRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[validate(range(min = 1, max = 600))]
    pub duration: Option<i32>,
    #[validate(length(min = 1, max = 500), nested)]
    pub questions: Vec<CreateQuestionRequest>,
}

fn validate_question_type(kind: &str) -> Result<(), validator::ValidationError> {
    if !QUESTION_TYPES.contains(&kind) {
        return Err(validator::ValidationError::new("invalid_question_type"));
    }
    Ok(())
}

fn validate_difficulty(difficulty: &str) -> Result<(), validator::ValidationError> {
    if !DIFFICULTIES.contains(&difficulty) {
        return Err(validator::ValidationError::new("invalid_difficulty"));
    }
    Ok(())
}

impl CreateQuestionRequest {
    /// Builds the stored question, filling defaults (MCQ, 1 mark, Medium).
    pub fn into_question(self, id: i64) -> Question {
        Question {
            id,
            question_text: self.question_text,
            question_type: self.question_type.unwrap_or_else(|| "MCQ".to_string()),
            correct_answer: self.correct_answer,
            marks: self.marks.unwrap_or(1.0),
            difficulty: self.difficulty.unwrap_or_else(|| "Medium".to_string()),
            competencies: self.competencies,
            options: self.options,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mcq() -> Question {
        Question {
            id: 1,
            question_text: "2 + 2?".to_string(),
            question_type: "MCQ".to_string(),
            correct_answer: None,
            marks: 5.0,
            difficulty: "Easy".to_string(),
            competencies: CompetencyScores {
                analytical: 1.0,
                ..Default::default()
            },
            options: vec![
                QuestionOption { text: "3".to_string(), is_correct: false },
                QuestionOption { text: "4".to_string(), is_correct: true },
            ],
        }
    }

    #[test]
    fn test_correct_by_option_text_or_index() {
        let q = mcq();
        assert!(q.is_correct("4"));
        assert!(q.is_correct("1"));
        assert!(!q.is_correct("3"));
        assert!(!q.is_correct("0"));
    }

    #[test]
    fn test_correct_by_answer_key() {
        let q = Question {
            question_type: "Numeric".to_string(),
            correct_answer: Some("42".to_string()),
            options: vec![],
            ..mcq()
        };
        assert!(q.is_correct("42"));
        assert!(!q.is_correct("41"));
    }

    #[test]
    fn test_public_question_hides_answers() {
        let public = PublicQuestion::from(&mcq());
        assert_eq!(public.options, vec!["3".to_string(), "4".to_string()]);
        let json = serde_json::to_value(&public).unwrap();
        assert!(json.get("correct_answer").is_none());
        assert!(json.get("competencies").is_none());
    }

    #[test]
    fn test_question_defaults() {
        let req: CreateQuestionRequest =
            serde_json::from_value(serde_json::json!({ "question_text": "Describe a team conflict." })).unwrap();
        assert!(req.validate().is_ok());
        let q = req.into_question(3);
        assert_eq!(q.id, 3);
        assert_eq!(q.marks, 1.0);
        assert_eq!(q.question_type, "MCQ");
        assert_eq!(q.difficulty, "Medium");
    }

    #[test]
    fn test_rejects_unknown_question_type() {
        let req: CreateQuestionRequest = serde_json::from_value(serde_json::json!({
            "question_text": "Q",
            "question_type": "Essay"
        }))
        .unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_create_test_request_validates_question_list() {
        let empty: CreateTestRequest = serde_json::from_value(serde_json::json!({
            "title": "Aptitude",
            "questions": []
        }))
        .unwrap();
        assert!(empty.validate().is_err());

        let nested_bad: CreateTestRequest = serde_json::from_value(serde_json::json!({
            "title": "Aptitude",
            "questions": [{ "question_text": "" }]
        }))
        .unwrap();
        assert!(nested_bad.validate().is_err());

        let ok: CreateTestRequest = serde_json::from_value(serde_json::json!({
            "title": "Aptitude",
            "questions": [{ "question_text": "2 + 2?", "options": [{ "text": "4", "is_correct": true }] }]
        }))
        .unwrap();
        assert!(ok.validate().is_ok());
    }
}
