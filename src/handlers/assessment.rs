// src/handlers/assessment.rs

use axum::{
    Json,
    extract::{Extension, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::{PgPool, types::Json as SqlJson};
use validator::Validate;

use crate::{
    error::{AppError, conflict_or_internal},
    models::assessment::{CreateTestRequest, PublicTest, Test, TestSummary},
    services::grading::derive_test_totals,
    utils::{html::clean_optional, jwt::Claims},
};

const TEST_COLUMNS: &str = "id, title, description, duration, total_marks, is_active, created_by, \
     questions, competency_profile, created_at";

const DEFAULT_DURATION_MINUTES: i32 = 30;

/// Lists active tests without their questions.
pub async fn list_tests(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let tests = sqlx::query_as::<_, TestSummary>(
        r#"
        SELECT id, title, description, duration, total_marks,
               jsonb_array_length(questions)::BIGINT AS question_count,
               competency_profile
        FROM tests
        WHERE is_active = TRUE
        ORDER BY id DESC
        "#,
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list tests: {:?}", e);
        AppError::from(e)
    })?;

    Ok(Json(tests))
}

/// Returns an active test with answer keys stripped.
pub async fn get_test(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let test = fetch_active_test(&pool, id).await?;
    Ok(Json(PublicTest::from(&test)))
}

/// Creates a test. Admin only.
///
/// Questions are numbered from 1 in the order given. Total marks and the
/// competency profile are derived from them here and stored with the test.
pub async fn create_test(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateTestRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let created_by = claims.user_id()?;
    let title = payload.title.trim().to_string();
    let questions: Vec<_> = payload
        .questions
        .into_iter()
        .zip(1..)
        .map(|(q, id)| q.into_question(id))
        .collect();
    let (total_marks, competency_profile) = derive_test_totals(&questions);

    let test = sqlx::query_as::<_, Test>(&format!(
        r#"
        INSERT INTO tests (title, description, duration, total_marks, created_by, questions, competency_profile)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {TEST_COLUMNS}
        "#
    ))
    .bind(&title)
    .bind(clean_optional(payload.description))
    .bind(payload.duration.unwrap_or(DEFAULT_DURATION_MINUTES))
    .bind(total_marks)
    .bind(created_by)
    .bind(SqlJson(&questions))
    .bind(SqlJson(competency_profile))
    .fetch_one(&pool)
    .await
    .map_err(|e| conflict_or_internal(e, format!("A test titled '{}' already exists", title)))?;

    tracing::info!(
        "Test {} created with {} questions ({} marks)",
        test.id,
        questions.len(),
        total_marks
    );

    Ok((StatusCode::CREATED, Json(test)))
}

/// Loads an active test or fails with 404.
pub(crate) async fn fetch_active_test(pool: &PgPool, id: i64) -> Result<Test, AppError> {
    sqlx::query_as::<_, Test>(&format!(
        "SELECT {TEST_COLUMNS} FROM tests WHERE id = $1 AND is_active = TRUE"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Test not found".to_string()))
}
