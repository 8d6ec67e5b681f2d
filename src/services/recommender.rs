// src/services/recommender.rs

//! Recommendation orchestration: normalize the student's competencies, fetch
//! candidates, rank them, and optionally persist the top-N as a snapshot.

use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    config::RecommenderSettings,
    engine::{
        competency::{CompetencyScores, CompetencySource, to_vector},
        ranking::{ScoredCandidate, rank_candidates},
    },
    error::AppError,
    models::{
        course::{CandidateFilter, CourseCandidate},
        recommendation::{
            ALGORITHM, RecommendationSnapshot, RecommendedCourse, SnapshotEntry, SnapshotMeta,
            SnapshotPayload,
        },
    },
};

/// How many competency keys a snapshot records as the student's strongest.
pub const TOP_COMPETENCY_COUNT: usize = 3;

/// Returned instead of an error when nothing matches the filters.
pub const NO_CANDIDATES_REASON: &str = "no-candidate-courses";

/// Source of courses to rank.
#[async_trait]
pub trait CandidateFetcher: Send + Sync {
    /// Active courses matching `filter`, at most `limit`, in no particular order.
    async fn fetch_candidates(
        &self,
        filter: &CandidateFilter,
        limit: i64,
    ) -> Result<Vec<CourseCandidate>, AppError>;
}

/// Storage for the latest snapshot per key.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Inserts or fully replaces the snapshot stored under `key`.
    async fn upsert_snapshot(
        &self,
        key: SnapshotKey,
        payload: &SnapshotPayload,
    ) -> Result<RecommendationSnapshot, AppError>;
}

#[async_trait]
impl<T: SnapshotStore + ?Sized> SnapshotStore for std::sync::Arc<T> {
    async fn upsert_snapshot(
        &self,
        key: SnapshotKey,
        payload: &SnapshotPayload,
    ) -> Result<RecommendationSnapshot, AppError> {
        (**self).upsert_snapshot(key, payload).await
    }
}

/// Which snapshot a computation replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnapshotKey {
    TestResult(i64),
    User(i64),
}

/// Result-specific computations own a snapshot per test result; everything
/// else replaces the user's general snapshot.
pub fn select_snapshot_key(test_result_id: Option<i64>, user_id: i64) -> SnapshotKey {
    match test_result_id {
        Some(id) => SnapshotKey::TestResult(id),
        None => SnapshotKey::User(user_id),
    }
}

/// One recommendation computation.
pub struct RecommendationRequest<'a, C: ?Sized> {
    pub user_id: i64,
    pub test_result_id: Option<i64>,
    pub competencies: &'a C,
    pub filters: CandidateFilter,
    pub top_n: usize,
    pub persist: bool,
}

impl<'a, C: CompetencySource + ?Sized> RecommendationRequest<'a, C> {
    pub fn new(user_id: i64, competencies: &'a C) -> Self {
        Self {
            user_id,
            test_result_id: None,
            competencies,
            filters: CandidateFilter::default(),
            top_n: crate::config::DEFAULT_TOP_N,
            persist: true,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RecommendationOutcome {
    pub recommendations: Vec<RecommendedCourse>,
    pub persisted: Option<RecommendationSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
}

impl RecommendationOutcome {
    fn no_candidates() -> Self {
        Self {
            recommendations: Vec::new(),
            persisted: None,
            reason: Some(NO_CANDIDATES_REASON),
        }
    }
}

pub struct Recommender<F, S> {
    fetcher: F,
    store: S,
    settings: RecommenderSettings,
}

impl<F: CandidateFetcher, S: SnapshotStore> Recommender<F, S> {
    pub fn new(fetcher: F, store: S, settings: RecommenderSettings) -> Self {
        Self {
            fetcher,
            store,
            settings,
        }
    }

    pub fn settings(&self) -> &RecommenderSettings {
        &self.settings
    }

    pub async fn compute_recommendations<C>(
        &self,
        request: RecommendationRequest<'_, C>,
    ) -> Result<RecommendationOutcome, AppError>
    where
        C: CompetencySource + ?Sized + Sync,
    {
        self.compute_recommendations_at(request, Utc::now()).await
    }

    /// Same as [`compute_recommendations`](Self::compute_recommendations) with
    /// an explicit "now" for the recency boost.
    pub async fn compute_recommendations_at<C>(
        &self,
        request: RecommendationRequest<'_, C>,
        now: DateTime<Utc>,
    ) -> Result<RecommendationOutcome, AppError>
    where
        C: CompetencySource + ?Sized + Sync,
    {
        let user_vector = to_vector(request.competencies);

        let candidates = self
            .fetcher
            .fetch_candidates(&request.filters, self.settings.candidate_limit)
            .await?;

        if candidates.is_empty() {
            tracing::info!(
                "No candidate courses for user {} (filters: {:?})",
                request.user_id,
                request.filters
            );
            return Ok(RecommendationOutcome::no_candidates());
        }

        let candidate_count = candidates.len();
        let started = Instant::now();
        let ranked = rank_candidates(
            &user_vector,
            candidates,
            &self.settings.weights,
            now,
            request.top_n,
        );
        let generation_time_ms = started.elapsed().as_millis() as u64;
        tracing::debug!(
            "Ranked {} candidates for user {} in {}ms, keeping {}",
            candidate_count,
            request.user_id,
            generation_time_ms,
            ranked.len()
        );

        let persisted = if request.persist {
            let payload = SnapshotPayload {
                user_id: request.user_id,
                test_result_id: request.test_result_id,
                competency_vector: CompetencyScores::from(user_vector),
                top_competencies: user_vector
                    .strongest(TOP_COMPETENCY_COUNT)
                    .into_iter()
                    .map(|c| c.key().to_string())
                    .collect(),
                top_courses: ranked.iter().map(snapshot_entry).collect(),
                meta: SnapshotMeta {
                    candidate_count,
                    filters: request.filters.clone(),
                    algorithm: ALGORITHM.to_string(),
                    generation_time_ms,
                },
            };
            let key = select_snapshot_key(request.test_result_id, request.user_id);
            Some(self.store.upsert_snapshot(key, &payload).await?)
        } else {
            None
        };

        Ok(RecommendationOutcome {
            recommendations: ranked.into_iter().map(recommended_course).collect(),
            persisted,
            reason: None,
        })
    }
}

fn snapshot_entry(scored: &ScoredCandidate<CourseCandidate>) -> SnapshotEntry {
    SnapshotEntry {
        course_id: scored.candidate.id,
        score: scored.final_score,
        base_similarity: scored.base_similarity,
    }
}

fn recommended_course(scored: ScoredCandidate<CourseCandidate>) -> RecommendedCourse {
    let college = scored.candidate.college_summary();
    let course = scored.candidate;
    RecommendedCourse {
        course_id: course.id,
        title: course.title,
        college,
        mode: course.mode,
        fee_per_year: course.fee_per_year,
        enrollment_count: scored.enrollment_count,
        base_similarity: scored.base_similarity,
        final_score: scored.final_score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_key_prefers_test_result() {
        assert_eq!(select_snapshot_key(Some(42), 7), SnapshotKey::TestResult(42));
        assert_eq!(select_snapshot_key(None, 7), SnapshotKey::User(7));
    }

    #[test]
    fn test_no_candidates_outcome_serializes_reason() {
        let json = serde_json::to_value(RecommendationOutcome::no_candidates()).unwrap();
        assert_eq!(json["reason"], "no-candidate-courses");
        assert_eq!(json["recommendations"], serde_json::json!([]));
        assert!(json["persisted"].is_null());
    }
}
