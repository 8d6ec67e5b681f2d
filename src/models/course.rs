// src/models/course.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use validator::Validate;

use crate::engine::{
    boost::BoostSignals,
    competency::{CompetencyScores, CompetencyVector, to_vector},
    ranking::Rankable,
};

pub const COURSE_MODES: [&str; 3] = ["Offline", "Online", "Hybrid"];

/// Represents the 'courses' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Course {
    pub id: i64,
    pub college_id: i64,
    pub title: String,
    pub description: Option<String>,

    /// 'Offline', 'Online' or 'Hybrid'.
    pub mode: String,

    pub fee_per_year: f64,

    /// Subject areas, stored as a JSON array.
    pub topics: Json<Vec<String>>,

    pub enrollment_count: i64,

    /// What the course demands of a student, per competency.
    pub competency_profile: Json<CompetencyScores>,

    /// Retired courses are kept but never recommended.
    pub is_active: bool,

    pub created_at: Option<DateTime<Utc>>,
}

/// DTO for creating a course under a college.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCourseRequest {
    pub college_id: i64,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 20000))]
    pub description: Option<String>,
    #[validate(custom(function = validate_mode))]
    pub mode: Option<String>,
    #[validate(range(min = 0.0))]
    pub fee_per_year: Option<f64>,
    #[validate(custom(function = validate_topics))]
    pub topics: Option<Vec<String>>,
    #[validate(range(min = 0))]
    pub enrollment_count: Option<i64>,
    pub competency_profile: Option<CompetencyScores>,
}

fn validate_mode(mode: &str) -> Result<(), validator::ValidationError> {
    if !COURSE_MODES.contains(&mode) {
        return Err(validator::ValidationError::new("invalid_course_mode"));
    }
    Ok(())
}

fn validate_topics(topics: &[String]) -> Result<(), validator::ValidationError> {
    if topics.len() > 50 {
        return Err(validator::ValidationError::new("too_many_topics"));
    }
    for topic in topics {
        if topic.is_empty() || topic.len() > 100 {
            return Err(validator::ValidationError::new("invalid_topic"));
        }
    }
    Ok(())
}

/// Query parameters for listing courses.
#[derive(Debug, Deserialize)]
pub struct CourseListParams {
    pub college_id: Option<i64>,
    pub mode: Option<String>,
    pub topic: Option<String>,
    pub limit: Option<i64>,
}

/// Narrowing criteria for the recommendation candidate set.
///
/// All present fields must match. Empty lists impose no constraint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CandidateFilter {
    /// Matches courses sharing at least one topic.
    pub topics: Option<Vec<String>>,
    pub mode: Option<String>,
    pub min_fee: Option<f64>,
    pub max_fee: Option<f64>,
    pub college_ids: Option<Vec<i64>>,
}

impl CandidateFilter {
    pub fn topics(&self) -> Option<&[String]> {
        self.topics.as_deref().filter(|t| !t.is_empty())
    }

    pub fn college_ids(&self) -> Option<&[i64]> {
        self.college_ids.as_deref().filter(|c| !c.is_empty())
    }

    /// In-process evaluation of the filter, equivalent to the SQL built by the
    /// Postgres candidate fetcher.
    pub fn matches(&self, candidate: &CourseCandidate) -> bool {
        if !candidate.is_active {
            return false;
        }
        if let Some(topics) = self.topics() {
            if !topics.iter().any(|t| candidate.topics.0.contains(t)) {
                return false;
            }
        }
        if let Some(mode) = &self.mode {
            if &candidate.mode != mode {
                return false;
            }
        }
        if let Some(min) = self.min_fee {
            if candidate.fee_per_year < min {
                return false;
            }
        }
        if let Some(max) = self.max_fee {
            if candidate.fee_per_year > max {
                return false;
            }
        }
        if let Some(ids) = self.college_ids() {
            if !ids.contains(&candidate.college_id) {
                return false;
            }
        }
        true
    }
}

/// College fields embedded in a recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollegeSummary {
    pub id: i64,
    pub name: String,
    pub rating: Option<f64>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
}

/// A course row joined with its college, as considered by the recommender.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CourseCandidate {
    pub id: i64,
    pub title: String,
    pub mode: String,
    pub fee_per_year: f64,
    pub topics: Json<Vec<String>>,
    pub enrollment_count: Option<i64>,

    /// Kept loosely typed: hand-edited rows may carry odd values, which the
    /// vector conversion reads as zero.
    pub competency_profile: Json<serde_json::Value>,

    pub is_active: bool,
    pub created_at: Option<DateTime<Utc>>,

    pub college_id: i64,
    pub college_name: Option<String>,
    pub college_rating: Option<f64>,
    pub college_city: Option<String>,
    pub college_state: Option<String>,
    pub college_country: Option<String>,
}

impl CourseCandidate {
    pub fn college_summary(&self) -> Option<CollegeSummary> {
        self.college_name.as_ref().map(|name| CollegeSummary {
            id: self.college_id,
            name: name.clone(),
            rating: self.college_rating,
            city: self.college_city.clone(),
            state: self.college_state.clone(),
            country: self.college_country.clone(),
        })
    }
}

impl Rankable for CourseCandidate {
    fn competency_vector(&self) -> CompetencyVector {
        to_vector(&self.competency_profile.0)
    }

    fn boost_signals(&self) -> BoostSignals {
        BoostSignals {
            enrollment_count: self.enrollment_count,
            college_rating: self.college_rating,
            created_at: self.created_at,
            eligible: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn candidate() -> CourseCandidate {
        CourseCandidate {
            id: 1,
            title: "B.Sc. Data Science".to_string(),
            mode: "Online".to_string(),
            fee_per_year: 90_000.0,
            topics: Json(vec!["data".to_string(), "statistics".to_string()]),
            enrollment_count: Some(120),
            competency_profile: Json(json!({ "analytical": 0.9, "technical": 0.7 })),
            is_active: true,
            created_at: None,
            college_id: 7,
            college_name: Some("Northfield".to_string()),
            college_rating: Some(4.0),
            college_city: None,
            college_state: None,
            college_country: Some("India".to_string()),
        }
    }

    #[test]
    fn test_empty_filter_matches_active() {
        let filter = CandidateFilter::default();
        assert!(filter.matches(&candidate()));

        let mut retired = candidate();
        retired.is_active = false;
        assert!(!filter.matches(&retired));
    }

    #[test]
    fn test_filters_are_conjunctive() {
        let filter = CandidateFilter {
            topics: Some(vec!["statistics".to_string(), "law".to_string()]),
            mode: Some("Online".to_string()),
            min_fee: Some(50_000.0),
            max_fee: Some(100_000.0),
            college_ids: Some(vec![7, 8]),
        };
        assert!(filter.matches(&candidate()));

        let wrong_mode = CandidateFilter {
            mode: Some("Offline".to_string()),
            ..filter.clone()
        };
        assert!(!wrong_mode.matches(&candidate()));

        let too_cheap = CandidateFilter {
            max_fee: Some(10_000.0),
            ..filter.clone()
        };
        assert!(!too_cheap.matches(&candidate()));

        let other_college = CandidateFilter {
            college_ids: Some(vec![3]),
            ..filter
        };
        assert!(!other_college.matches(&candidate()));
    }

    #[test]
    fn test_empty_lists_impose_nothing() {
        let filter = CandidateFilter {
            topics: Some(vec![]),
            college_ids: Some(vec![]),
            ..Default::default()
        };
        assert!(filter.matches(&candidate()));
    }

    #[test]
    fn test_rankable_reads_profile_and_college() {
        let c = candidate();
        let v = c.competency_vector();
        assert_eq!(v.as_array(), &[0.9, 0.0, 0.0, 0.0, 0.0, 0.7]);
        let signals = c.boost_signals();
        assert_eq!(signals.enrollment_count, Some(120));
        assert_eq!(signals.college_rating, Some(4.0));
        assert_eq!(c.college_summary().map(|s| s.id), Some(7));
    }

    #[test]
    fn test_filter_deserializes_from_partial_json() {
        let filter: CandidateFilter = serde_json::from_value(json!({ "mode": "Hybrid" })).unwrap();
        assert_eq!(filter.mode.as_deref(), Some("Hybrid"));
        assert!(filter.topics().is_none());
    }
}
