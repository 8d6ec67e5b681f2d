// src/handlers/test_result.rs

use std::collections::HashMap;

use axum::{
    Json,
    extract::{Extension, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use sqlx::{PgPool, Row, types::Json as SqlJson};
use validator::Validate;

use crate::{
    engine::{
        competency::{Competency, CompetencyScores, to_vector},
        round2,
    },
    error::AppError,
    handlers::assessment::fetch_active_test,
    models::test_result::{AveragePerformance, GlobalAnalytics, SubmitTestRequest, TestResult},
    services::{grading::score_submission, recommender::RecommendationRequest},
    state::AppState,
    utils::jwt::Claims,
};

pub(crate) const TEST_RESULT_COLUMNS: &str = "id, user_id, test_id, responses, total_score, \
     total_possible, percentage, competency_scores, attempt_number, duration_taken, completed_at";

/// Grades and stores an attempt, then refreshes the attempt's recommendations.
///
/// The attempt is committed before recommending; a recommendation failure
/// is logged and reported as `recommendation: null`.
pub async fn submit_test(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<SubmitTestRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let user_id = claims.user_id()?;
    let test = fetch_active_test(&state.pool, payload.test_id).await?;
    let (responses, summary) = score_submission(&test, &payload.answers);

    if responses.is_empty() {
        return Err(AppError::BadRequest(
            "None of the answers belong to this test".to_string(),
        ));
    }

    // attempt_number counts this user's earlier attempts at the same test
    let result = sqlx::query_as::<_, TestResult>(&format!(
        r#"
        INSERT INTO test_results
            (user_id, test_id, responses, total_score, total_possible, percentage,
             competency_scores, attempt_number, duration_taken)
        VALUES (
            $1, $2, $3, $4, $5, $6, $7,
            (SELECT COUNT(*)::INT + 1 FROM test_results WHERE user_id = $1 AND test_id = $2),
            $8
        )
        RETURNING {TEST_RESULT_COLUMNS}
        "#
    ))
    .bind(user_id)
    .bind(test.id)
    .bind(SqlJson(&responses))
    .bind(summary.total_score)
    .bind(summary.total_possible)
    .bind(summary.percentage)
    .bind(SqlJson(summary.competency_scores))
    .bind(payload.duration_taken)
    .fetch_one(&state.pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to store test result: {:?}", e);
        AppError::from(e)
    })?;

    tracing::info!(
        "User {} finished test {} (attempt {}, {}%)",
        user_id,
        test.id,
        result.attempt_number,
        result.percentage
    );

    let recommender = state.recommender();
    let request = RecommendationRequest {
        test_result_id: Some(result.id),
        top_n: recommender.settings().default_top_n,
        ..RecommendationRequest::new(user_id, &result.competency_scores.0)
    };
    let recommendation = match recommender.compute_recommendations(request).await {
        Ok(outcome) => Some(outcome),
        Err(e) => {
            tracing::error!("Recommendation after result {} failed: {}", result.id, e);
            None
        }
    };

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "result": result,
            "recommendation": recommendation
        })),
    ))
}

/// The caller's most recent attempt.
pub async fn my_latest_result(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let result = fetch_latest_result(&pool, claims.user_id()?)
        .await?
        .ok_or_else(|| AppError::NotFound("No test results found".to_string()))?;

    Ok(Json(result))
}

/// All of the caller's attempts, newest first.
pub async fn my_results(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let results = sqlx::query_as::<_, TestResult>(&format!(
        "SELECT {TEST_RESULT_COLUMNS} FROM test_results WHERE user_id = $1 \
         ORDER BY completed_at DESC, id DESC"
    ))
    .bind(claims.user_id()?)
    .fetch_all(&pool)
    .await?;

    Ok(Json(results))
}

/// Every attempt at one test, with averages. Admin only.
pub async fn results_for_test(
    State(pool): State<PgPool>,
    Path(test_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let results = sqlx::query_as::<_, TestResult>(&format!(
        "SELECT {TEST_RESULT_COLUMNS} FROM test_results WHERE test_id = $1 \
         ORDER BY completed_at DESC, id DESC"
    ))
    .bind(test_id)
    .fetch_all(&pool)
    .await?;

    let average = AveragePerformance::of(&results)
        .ok_or_else(|| AppError::NotFound("No results for this test".to_string()))?;

    Ok(Json(json!({
        "success": true,
        "count": results.len(),
        "average": average,
        "results": results
    })))
}

/// Totals and averages over every stored attempt. Admin only.
pub async fn analytics(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let dimension_averages: Vec<String> = Competency::ALL
        .iter()
        .map(|c| {
            format!(
                "AVG(COALESCE((competency_scores->>'{0}')::DOUBLE PRECISION, 0)) AS {0}",
                c.key()
            )
        })
        .collect();
    let sql = format!(
        "SELECT COUNT(*) AS total_results, AVG(percentage) AS avg_percentage, {} FROM test_results",
        dimension_averages.join(", ")
    );

    let row = sqlx::query(&sql).fetch_one(&pool).await.map_err(|e| {
        tracing::error!("Failed to compute analytics: {:?}", e);
        AppError::from(e)
    })?;

    let total_results: i64 = row.try_get("total_results")?;
    let avg_percentage: Option<f64> = row.try_get("avg_percentage")?;

    let average = match avg_percentage {
        Some(percentage) => {
            let mut means = HashMap::with_capacity(Competency::COUNT);
            for c in Competency::ALL {
                let value: Option<f64> = row.try_get(c.key())?;
                means.insert(c.key().to_string(), round2(value.unwrap_or(0.0)));
            }
            Some(AveragePerformance {
                percentage: round2(percentage),
                competencies: CompetencyScores::from(to_vector(&means)),
            })
        }
        None => None,
    };

    Ok(Json(GlobalAnalytics {
        total_results,
        average,
    }))
}

/// Deletes an attempt. Owner or admin. Its result-keyed recommendation goes with it.
pub async fn delete_result(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let owner_id: i64 = sqlx::query_scalar("SELECT user_id FROM test_results WHERE id = $1")
        .bind(id)
        .fetch_optional(&pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Test result not found".to_string()))?;

    claims.ensure_owner_or_admin(owner_id)?;

    sqlx::query("DELETE FROM test_results WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await?;

    tracing::info!("Test result {} deleted by user {}", id, claims.sub);

    Ok(Json(json!({ "success": true })))
}

/// The user's most recent attempt, if any.
pub(crate) async fn fetch_latest_result(
    pool: &PgPool,
    user_id: i64,
) -> Result<Option<TestResult>, AppError> {
    let result = sqlx::query_as::<_, TestResult>(&format!(
        "SELECT {TEST_RESULT_COLUMNS} FROM test_results WHERE user_id = $1 \
         ORDER BY completed_at DESC, id DESC LIMIT 1"
    ))
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(result)
}

/// Loads an attempt by id.
pub(crate) async fn fetch_result(pool: &PgPool, id: i64) -> Result<Option<TestResult>, AppError> {
    let result = sqlx::query_as::<_, TestResult>(&format!(
        "SELECT {TEST_RESULT_COLUMNS} FROM test_results WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(result)
}
