// src/models/recommendation.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use validator::Validate;

use crate::{
    engine::competency::CompetencyScores,
    models::course::{CandidateFilter, CollegeSummary, Course},
};

pub const ALGORITHM: &str = "cosine_similarity_v1";

/// One ranked course as stored in a snapshot. Scores are 2-decimal percentages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub course_id: i64,
    pub score: f64,
    pub base_similarity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotMeta {
    /// How many candidates were scored before truncation.
    pub candidate_count: usize,
    pub filters: CandidateFilter,
    pub algorithm: String,
    /// Time spent ranking, in milliseconds.
    #[serde(default)]
    pub generation_time_ms: u64,
}

/// Everything written by a snapshot upsert.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotPayload {
    pub user_id: i64,
    pub test_result_id: Option<i64>,
    pub competency_vector: CompetencyScores,
    /// Keys of the three strongest competencies, highest first.
    pub top_competencies: Vec<String>,
    pub top_courses: Vec<SnapshotEntry>,
    pub meta: SnapshotMeta,
}

/// Represents the 'recommendations' table: the latest top-N list per
/// test result, or per user when no test result is involved.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct RecommendationSnapshot {
    pub id: i64,
    pub user_id: i64,
    pub test_result_id: Option<i64>,
    pub competency_vector: Json<CompetencyScores>,
    pub top_competencies: Json<Vec<String>>,
    pub top_courses: Json<Vec<SnapshotEntry>>,
    pub meta: Json<SnapshotMeta>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// A freshly ranked course returned to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendedCourse {
    pub course_id: i64,
    pub title: String,
    pub college: Option<CollegeSummary>,
    pub mode: String,
    pub fee_per_year: f64,
    pub enrollment_count: i64,
    pub base_similarity: f64,
    pub final_score: f64,
}

/// A stored entry expanded with the course's current details.
#[derive(Debug, Serialize)]
pub struct ExpandedEntry {
    #[serde(flatten)]
    pub entry: SnapshotEntry,
    /// `None` when the course has since been deleted.
    pub course: Option<Course>,
}

/// Snapshot plus its expanded entries, in stored order.
#[derive(Debug, Serialize)]
pub struct SnapshotDetail {
    pub success: bool,
    pub recommendation: RecommendationSnapshot,
    pub results: Vec<ExpandedEntry>,
}

/// Per-course counts across all stored snapshots.
#[derive(Debug, Serialize, FromRow)]
pub struct TopCourseRow {
    pub course_id: i64,
    pub title: Option<String>,
    pub college_id: Option<i64>,
    pub times_recommended: i64,
    pub avg_score: Option<f64>,
}

/// Body of `POST /api/recommendations/for-result`.
#[derive(Debug, Deserialize, Validate)]
pub struct RecommendForResultRequest {
    pub test_result_id: Option<i64>,
    #[validate(range(min = 1, max = 100))]
    pub top_n: Option<usize>,
    #[serde(default)]
    pub candidate_filters: CandidateFilter,
}

/// Body of `POST /api/recommendations/for-user`.
#[derive(Debug, Deserialize, Validate)]
pub struct RecommendForUserRequest {
    pub user_id: Option<i64>,
    #[validate(range(min = 1, max = 100))]
    pub top_n: Option<usize>,
    #[serde(default)]
    pub candidate_filters: CandidateFilter,
    /// Explicit competency map. When present the result is stored as the
    /// user's general snapshot instead of against a test result.
    pub competencies: Option<serde_json::Value>,
}
