// src/handlers/course.rs

use axum::{
    Json,
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use sqlx::{PgPool, Postgres, QueryBuilder, types::Json as SqlJson};
use validator::Validate;

use crate::{
    error::AppError,
    handlers::college::fetch_college,
    models::{
        course::{Course, CourseListParams, CreateCourseRequest},
        user::{ROLE_ADMIN, ROLE_COLLEGE},
    },
    utils::{html::clean_optional, jwt::Claims},
};

pub(crate) const COURSE_COLUMNS: &str = "id, college_id, title, description, mode, fee_per_year, \
     topics, enrollment_count, competency_profile, is_active, created_at";

const DEFAULT_LIST_LIMIT: i64 = 50;
const MAX_LIST_LIMIT: i64 = 200;

/// Lists active courses, newest first.
///
/// Optional filters: `college_id`, `mode`, `topic` (exact topic match), `limit`.
pub async fn list_courses(
    State(pool): State<PgPool>,
    Query(params): Query<CourseListParams>,
) -> Result<impl IntoResponse, AppError> {
    let mut query_builder = QueryBuilder::<Postgres>::new(format!(
        "SELECT {COURSE_COLUMNS} FROM courses WHERE is_active = TRUE"
    ));

    if let Some(college_id) = params.college_id {
        query_builder.push(" AND college_id = ");
        query_builder.push_bind(college_id);
    }
    if let Some(mode) = params.mode.filter(|m| !m.is_empty()) {
        query_builder.push(" AND mode = ");
        query_builder.push_bind(mode);
    }
    if let Some(topic) = params.topic.filter(|t| !t.is_empty()) {
        query_builder.push(" AND topics ? ");
        query_builder.push_bind(topic);
    }

    query_builder.push(" ORDER BY created_at DESC, id DESC LIMIT ");
    query_builder.push_bind(
        params
            .limit
            .unwrap_or(DEFAULT_LIST_LIMIT)
            .clamp(1, MAX_LIST_LIMIT),
    );

    let courses = query_builder
        .build_query_as::<Course>()
        .fetch_all(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list courses: {:?}", e);
            AppError::from(e)
        })?;

    Ok(Json(courses))
}

/// Returns a course by id, retired or not.
pub async fn get_course(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let course = fetch_course(&pool, id).await?;
    Ok(Json(course))
}

/// Adds a course to a college. Caller must own the college, or be an admin.
pub async fn create_course(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateCourseRequest>,
) -> Result<impl IntoResponse, AppError> {
    if !claims.has_role(&[ROLE_COLLEGE, ROLE_ADMIN]) {
        return Err(AppError::Forbidden("Only college accounts can create courses".to_string()));
    }
    payload.validate()?;

    let college = fetch_college(&pool, payload.college_id).await?;
    claims.ensure_owner_or_admin(college.owner_id)?;

    let course = sqlx::query_as::<_, Course>(&format!(
        r#"
        INSERT INTO courses
            (college_id, title, description, mode, fee_per_year, topics, enrollment_count, competency_profile)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING {COURSE_COLUMNS}
        "#
    ))
    .bind(college.id)
    .bind(payload.title.trim())
    .bind(clean_optional(payload.description))
    .bind(payload.mode.as_deref().unwrap_or("Offline"))
    .bind(payload.fee_per_year.unwrap_or(0.0))
    .bind(SqlJson(payload.topics.unwrap_or_default()))
    .bind(payload.enrollment_count.unwrap_or(0))
    .bind(SqlJson(payload.competency_profile.unwrap_or_default()))
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create course: {:?}", e);
        AppError::from(e)
    })?;

    tracing::info!("Course {} added to college {}", course.id, college.id);

    Ok((StatusCode::CREATED, Json(course)))
}

/// Retires a course: it stays readable but is never recommended again.
pub async fn retire_course(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let course = fetch_course(&pool, id).await?;
    let college = fetch_college(&pool, course.college_id).await?;
    claims.ensure_owner_or_admin(college.owner_id)?;

    sqlx::query("UPDATE courses SET is_active = FALSE WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await?;

    tracing::info!("Course {} retired by user {}", id, claims.sub);

    Ok((StatusCode::OK, Json(json!({ "success": true, "id": id }))))
}

/// Loads a course or fails with 404.
pub(crate) async fn fetch_course(pool: &PgPool, id: i64) -> Result<Course, AppError> {
    sqlx::query_as::<_, Course>(&format!("SELECT {COURSE_COLUMNS} FROM courses WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Course not found".to_string()))
}
