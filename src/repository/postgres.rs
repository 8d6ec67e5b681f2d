// src/repository/postgres.rs

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder, types::Json};

use crate::{
    error::AppError,
    models::{
        course::{CandidateFilter, CourseCandidate},
        recommendation::{RecommendationSnapshot, SnapshotPayload},
    },
    services::recommender::{CandidateFetcher, SnapshotKey, SnapshotStore},
};

const CANDIDATE_SELECT: &str = r#"
    SELECT
        c.id, c.title, c.mode, c.fee_per_year, c.topics, c.enrollment_count,
        c.competency_profile, c.is_active, c.created_at,
        c.college_id,
        g.name AS college_name,
        g.rating AS college_rating,
        g.city AS college_city,
        g.state AS college_state,
        g.country AS college_country
    FROM courses c
    LEFT JOIN colleges g ON g.id = c.college_id
    WHERE c.is_active = TRUE
"#;

pub(crate) const SNAPSHOT_COLUMNS: &str =
    "id, user_id, test_result_id, competency_vector, top_competencies, top_courses, meta, created_at, updated_at";

/// Appends the candidate filter to a query that already has a `WHERE` clause.
fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &CandidateFilter) {
    if let Some(topics) = filter.topics() {
        builder.push(" AND c.topics ?| ");
        builder.push_bind(topics.to_vec());
    }
    if let Some(mode) = &filter.mode {
        builder.push(" AND c.mode = ");
        builder.push_bind(mode.clone());
    }
    if let Some(min) = filter.min_fee {
        builder.push(" AND c.fee_per_year >= ");
        builder.push_bind(min);
    }
    if let Some(max) = filter.max_fee {
        builder.push(" AND c.fee_per_year <= ");
        builder.push_bind(max);
    }
    if let Some(ids) = filter.college_ids() {
        builder.push(" AND c.college_id = ANY(");
        builder.push_bind(ids.to_vec());
        builder.push(")");
    }
}

/// Candidate fetcher over the `courses` and `colleges` tables.
#[derive(Clone)]
pub struct PgCandidateFetcher {
    pool: PgPool,
}

impl PgCandidateFetcher {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CandidateFetcher for PgCandidateFetcher {
    async fn fetch_candidates(
        &self,
        filter: &CandidateFilter,
        limit: i64,
    ) -> Result<Vec<CourseCandidate>, AppError> {
        let mut query_builder = QueryBuilder::<Postgres>::new(CANDIDATE_SELECT);
        push_filter(&mut query_builder, filter);
        query_builder.push(" LIMIT ");
        query_builder.push_bind(limit);

        query_builder
            .build_query_as::<CourseCandidate>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to fetch candidate courses: {:?}", e);
                AppError::InternalServerError(e.to_string())
            })
    }
}

/// Snapshot store over the `recommendations` table.
///
/// Two partial unique indexes back the upsert: one on `test_result_id`, one on
/// `user_id` for rows without a test result.
#[derive(Clone)]
pub struct PgSnapshotStore {
    pool: PgPool,
}

impl PgSnapshotStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SnapshotStore for PgSnapshotStore {
    async fn upsert_snapshot(
        &self,
        key: SnapshotKey,
        payload: &SnapshotPayload,
    ) -> Result<RecommendationSnapshot, AppError> {
        let conflict_target = match key {
            SnapshotKey::TestResult(_) => "(test_result_id) WHERE test_result_id IS NOT NULL",
            SnapshotKey::User(_) => "(user_id) WHERE test_result_id IS NULL",
        };
        let test_result_id = match key {
            SnapshotKey::TestResult(id) => Some(id),
            SnapshotKey::User(_) => None,
        };

        let sql = format!(
            r#"
            INSERT INTO recommendations
                (user_id, test_result_id, competency_vector, top_competencies, top_courses, meta)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT {conflict_target} DO UPDATE SET
                user_id = EXCLUDED.user_id,
                competency_vector = EXCLUDED.competency_vector,
                top_competencies = EXCLUDED.top_competencies,
                top_courses = EXCLUDED.top_courses,
                meta = EXCLUDED.meta,
                updated_at = NOW()
            RETURNING {SNAPSHOT_COLUMNS}
            "#
        );

        sqlx::query_as::<_, RecommendationSnapshot>(&sql)
            .bind(payload.user_id)
            .bind(test_result_id)
            .bind(Json(&payload.competency_vector))
            .bind(Json(&payload.top_competencies))
            .bind(Json(&payload.top_courses))
            .bind(Json(&payload.meta))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to upsert recommendation snapshot: {:?}", e);
                AppError::InternalServerError(e.to_string())
            })
    }
}
