// src/repository/memory.rs

//! In-process collaborators for the recommender, used by tests and local tooling.

use std::sync::{
    Mutex,
    atomic::{AtomicI64, Ordering},
};

use async_trait::async_trait;
use chrono::Utc;
use sqlx::types::Json;

use crate::{
    error::AppError,
    models::{
        course::{CandidateFilter, CourseCandidate},
        recommendation::{RecommendationSnapshot, SnapshotPayload},
    },
    services::recommender::{CandidateFetcher, SnapshotKey, SnapshotStore},
};

/// Fixed course catalog filtered in memory.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    courses: Vec<CourseCandidate>,
}

impl InMemoryCatalog {
    pub fn new(courses: Vec<CourseCandidate>) -> Self {
        Self { courses }
    }
}

#[async_trait]
impl CandidateFetcher for InMemoryCatalog {
    async fn fetch_candidates(
        &self,
        filter: &CandidateFilter,
        limit: i64,
    ) -> Result<Vec<CourseCandidate>, AppError> {
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(self
            .courses
            .iter()
            .filter(|c| filter.matches(c))
            .take(limit)
            .cloned()
            .collect())
    }
}

/// Snapshot store keeping one row per key, replaced on upsert.
#[derive(Debug, Default)]
pub struct InMemorySnapshotStore {
    rows: Mutex<Vec<(SnapshotKey, RecommendationSnapshot)>>,
    next_id: AtomicI64,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshots(&self) -> Result<Vec<RecommendationSnapshot>, AppError> {
        let rows = self.rows.lock().map_err(|e| AppError::InternalServerError(e.to_string()))?;
        Ok(rows.iter().map(|(_, s)| s.clone()).collect())
    }

    pub fn get(&self, key: SnapshotKey) -> Result<Option<RecommendationSnapshot>, AppError> {
        let rows = self.rows.lock().map_err(|e| AppError::InternalServerError(e.to_string()))?;
        Ok(rows.iter().find(|(k, _)| *k == key).map(|(_, s)| s.clone()))
    }
}

#[async_trait]
impl SnapshotStore for InMemorySnapshotStore {
    async fn upsert_snapshot(
        &self,
        key: SnapshotKey,
        payload: &SnapshotPayload,
    ) -> Result<RecommendationSnapshot, AppError> {
        let mut rows = self.rows.lock().map_err(|e| AppError::InternalServerError(e.to_string()))?;
        let now = Utc::now();

        let existing = rows.iter().position(|(k, _)| *k == key);
        let (id, created_at) = match existing {
            Some(i) => (rows[i].1.id, rows[i].1.created_at),
            None => (self.next_id.fetch_add(1, Ordering::SeqCst) + 1, now),
        };

        let snapshot = RecommendationSnapshot {
            id,
            user_id: payload.user_id,
            test_result_id: payload.test_result_id,
            competency_vector: Json(payload.competency_vector),
            top_competencies: Json(payload.top_competencies.clone()),
            top_courses: Json(payload.top_courses.clone()),
            meta: Json(payload.meta.clone()),
            created_at,
            updated_at: now,
        };

        match existing {
            Some(i) => rows[i].1 = snapshot.clone(),
            None => rows.push((key, snapshot.clone())),
        }
        Ok(snapshot)
    }
}

/// Snapshot store whose writes always fail; exercises the error path.
#[derive(Debug, Default)]
pub struct FailingSnapshotStore;

#[async_trait]
impl SnapshotStore for FailingSnapshotStore {
    async fn upsert_snapshot(
        &self,
        _key: SnapshotKey,
        _payload: &SnapshotPayload,
    ) -> Result<RecommendationSnapshot, AppError> {
        Err(AppError::InternalServerError("snapshot store unavailable".to_string()))
    }
}
