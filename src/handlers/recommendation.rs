// src/handlers/recommendation.rs

use std::collections::HashMap;

use axum::{
    Json,
    extract::{Extension, Path, State},
    response::IntoResponse,
};
use serde::Serialize;
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

use crate::{
    engine::round2,
    error::AppError,
    handlers::{
        course::COURSE_COLUMNS,
        test_result::{fetch_latest_result, fetch_result},
    },
    models::{
        course::Course,
        recommendation::{
            ExpandedEntry, RecommendForResultRequest, RecommendForUserRequest,
            RecommendationSnapshot, SnapshotDetail, TopCourseRow,
        },
    },
    repository::postgres::SNAPSHOT_COLUMNS,
    services::recommender::{RecommendationOutcome, RecommendationRequest},
    state::AppState,
    utils::jwt::Claims,
};

const TOP_COURSES_LIMIT: i64 = 50;

#[derive(Debug, Serialize)]
struct ComputeResponse {
    success: bool,
    #[serde(flatten)]
    outcome: RecommendationOutcome,
}

impl From<RecommendationOutcome> for ComputeResponse {
    fn from(outcome: RecommendationOutcome) -> Self {
        Self {
            success: true,
            outcome,
        }
    }
}

/// Recomputes the snapshot of one test result.
///
/// Students may only use their own results (others look like 404); admins may use any.
pub async fn for_result(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<RecommendForResultRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let test_result_id = payload
        .test_result_id
        .ok_or_else(|| AppError::BadRequest("test_result_id is required".to_string()))?;

    let result = fetch_result(&state.pool, test_result_id)
        .await?
        .filter(|r| claims.is_admin() || claims.user_id().is_ok_and(|id| id == r.user_id))
        .ok_or_else(|| AppError::NotFound("Test result not found".to_string()))?;

    let recommender = state.recommender();
    let request = RecommendationRequest {
        test_result_id: Some(result.id),
        filters: payload.candidate_filters,
        top_n: recommender.settings().top_n(payload.top_n),
        ..RecommendationRequest::new(result.user_id, &result.competency_scores.0)
    };
    let outcome = recommender.compute_recommendations(request).await?;

    Ok(Json(ComputeResponse::from(outcome)))
}

/// Recomputes recommendations for a user.
///
/// With an explicit `competencies` object the list is stored as the user's
/// general snapshot. Without one, the user's latest attempt is used and its
/// result-keyed snapshot is refreshed.
pub async fn for_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<RecommendForUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let caller_id = claims.user_id()?;
    let user_id = payload.user_id.unwrap_or(caller_id);
    if user_id != caller_id && !claims.is_admin() {
        return Err(AppError::Forbidden(
            "Only admins can compute recommendations for other users".to_string(),
        ));
    }

    let recommender = state.recommender();
    let top_n = recommender.settings().top_n(payload.top_n);

    let outcome = match &payload.competencies {
        Some(competencies) => {
            if !competencies.is_object() {
                return Err(AppError::BadRequest(
                    "competencies must be an object of numbers".to_string(),
                ));
            }
            let request = RecommendationRequest {
                filters: payload.candidate_filters.clone(),
                top_n,
                ..RecommendationRequest::new(user_id, competencies)
            };
            recommender.compute_recommendations(request).await?
        }
        None => {
            let latest = fetch_latest_result(&state.pool, user_id)
                .await?
                .ok_or_else(|| AppError::NotFound("No test results found".to_string()))?;
            let request = RecommendationRequest {
                test_result_id: Some(latest.id),
                filters: payload.candidate_filters.clone(),
                top_n,
                ..RecommendationRequest::new(user_id, &latest.competency_scores.0)
            };
            recommender.compute_recommendations(request).await?
        }
    };

    Ok(Json(ComputeResponse::from(outcome)))
}

/// The caller's most recently updated snapshot, expanded with course details.
pub async fn my_recommendation(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let snapshot = sqlx::query_as::<_, RecommendationSnapshot>(&format!(
        "SELECT {SNAPSHOT_COLUMNS} FROM recommendations WHERE user_id = $1 \
         ORDER BY updated_at DESC, id DESC LIMIT 1"
    ))
    .bind(claims.user_id()?)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| AppError::NotFound("No recommendations found".to_string()))?;

    Ok(Json(expand_snapshot(&pool, snapshot).await?))
}

/// One snapshot by id. Owner or admin.
pub async fn get_recommendation(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let snapshot = fetch_snapshot(&pool, id).await?;
    claims.ensure_owner_or_admin(snapshot.user_id)?;

    Ok(Json(expand_snapshot(&pool, snapshot).await?))
}

/// Deletes a snapshot. Owner or admin.
pub async fn delete_recommendation(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let snapshot = fetch_snapshot(&pool, id).await?;
    claims.ensure_owner_or_admin(snapshot.user_id)?;

    sqlx::query("DELETE FROM recommendations WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await?;

    tracing::info!("Recommendation {} deleted by user {}", id, claims.sub);

    Ok(Json(json!({ "success": true })))
}

/// Courses that appear most often across stored snapshots. Admin only.
pub async fn top_courses(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let mut rows = sqlx::query_as::<_, TopCourseRow>(
        r#"
        SELECT
            (entry->>'course_id')::BIGINT AS course_id,
            c.title,
            c.college_id,
            COUNT(*) AS times_recommended,
            AVG((entry->>'score')::DOUBLE PRECISION) AS avg_score
        FROM recommendations r
        CROSS JOIN LATERAL jsonb_array_elements(r.top_courses) AS entry
        LEFT JOIN courses c ON c.id = (entry->>'course_id')::BIGINT
        GROUP BY (entry->>'course_id')::BIGINT, c.title, c.college_id
        ORDER BY times_recommended DESC, avg_score DESC NULLS LAST
        LIMIT $1
        "#,
    )
    .bind(TOP_COURSES_LIMIT)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to aggregate top courses: {:?}", e);
        AppError::from(e)
    })?;

    for row in &mut rows {
        row.avg_score = row.avg_score.map(round2);
    }

    Ok(Json(json!({ "success": true, "courses": rows })))
}

async fn fetch_snapshot(pool: &PgPool, id: i64) -> Result<RecommendationSnapshot, AppError> {
    sqlx::query_as::<_, RecommendationSnapshot>(&format!(
        "SELECT {SNAPSHOT_COLUMNS} FROM recommendations WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Recommendation not found".to_string()))
}

/// Attaches current course details to each stored entry, keeping stored order.
async fn expand_snapshot(
    pool: &PgPool,
    snapshot: RecommendationSnapshot,
) -> Result<SnapshotDetail, AppError> {
    let ids: Vec<i64> = snapshot.top_courses.0.iter().map(|e| e.course_id).collect();

    let courses: HashMap<i64, Course> = sqlx::query_as::<_, Course>(&format!(
        "SELECT {COURSE_COLUMNS} FROM courses WHERE id = ANY($1)"
    ))
    .bind(ids.as_slice())
    .fetch_all(pool)
    .await?
    .into_iter()
    .map(|c| (c.id, c))
    .collect();

    let results = snapshot
        .top_courses
        .0
        .iter()
        .map(|entry| ExpandedEntry {
            entry: entry.clone(),
            course: courses.get(&entry.course_id).cloned(),
        })
        .collect();

    Ok(SnapshotDetail {
        success: true,
        recommendation: snapshot,
        results,
    })
}
