// src/handlers/college.rs

use axum::{
    Json,
    extract::{Extension, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::PgPool;
use validator::Validate;

use crate::{
    error::{AppError, conflict_or_internal},
    models::{
        college::{College, CreateCollegeRequest, DEFAULT_COUNTRY},
        user::{ROLE_ADMIN, ROLE_COLLEGE},
    },
    utils::{html::clean_optional, jwt::Claims},
};

const COLLEGE_COLUMNS: &str =
    "id, owner_id, name, city, state, country, rating, website, description, status, created_at";

/// Lists colleges that are not marked inactive, best rated first.
pub async fn list_colleges(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let colleges = sqlx::query_as::<_, College>(&format!(
        "SELECT {COLLEGE_COLUMNS} FROM colleges WHERE status <> 'inactive' \
         ORDER BY rating DESC NULLS LAST, name ASC"
    ))
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list colleges: {:?}", e);
        AppError::from(e)
    })?;

    Ok(Json(colleges))
}

pub async fn get_college(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let college = fetch_college(&pool, id).await?;
    Ok(Json(college))
}

/// Creates a college listing owned by the caller.
///
/// College accounts start in 'pending'; listings created by an admin are active at once.
pub async fn create_college(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateCollegeRequest>,
) -> Result<impl IntoResponse, AppError> {
    if !claims.has_role(&[ROLE_COLLEGE, ROLE_ADMIN]) {
        return Err(AppError::Forbidden("Only college accounts can create colleges".to_string()));
    }
    payload.validate()?;

    let owner_id = claims.user_id()?;
    let status = if claims.is_admin() { "active" } else { "pending" };

    let college = sqlx::query_as::<_, College>(&format!(
        r#"
        INSERT INTO colleges (owner_id, name, city, state, country, rating, website, description, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING {COLLEGE_COLUMNS}
        "#
    ))
    .bind(owner_id)
    .bind(payload.name.trim())
    .bind(&payload.city)
    .bind(&payload.state)
    .bind(payload.country.as_deref().unwrap_or(DEFAULT_COUNTRY))
    .bind(payload.rating)
    .bind(&payload.website)
    .bind(clean_optional(payload.description))
    .bind(status)
    .fetch_one(&pool)
    .await
    .map_err(|e| conflict_or_internal(e, format!("College '{}' already exists", payload.name)))?;

    tracing::info!("User {} created college {}", owner_id, college.id);

    Ok((StatusCode::CREATED, Json(college)))
}

/// Loads a college or fails with 404.
pub(crate) async fn fetch_college(pool: &PgPool, id: i64) -> Result<College, AppError> {
    sqlx::query_as::<_, College>(&format!("SELECT {COLLEGE_COLUMNS} FROM colleges WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("College not found".to_string()))
}
