use axum::{extract::Path, http::StatusCode, response::IntoResponse, Extension};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::database::models::account::Role;
use crate::database::models::institution::Institution;
use crate::database::DatabaseManager;
use crate::error::ApiError;
use crate::extract::Json;
use crate::middleware::AuthAccount;

#[derive(Debug, Deserialize)]
pub struct CreateInstitutionRequest {
    pub name: String,
    pub code: String,
}

/// POST /api/institutions (admin)
pub async fn create(
    Extension(account): Extension<AuthAccount>,
    Json(body): Json<CreateInstitutionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    account.require_role(Role::Admin)?;

    if body.name.trim().is_empty() || body.code.trim().is_empty() {
        return Err(ApiError::bad_request("Name and code are required"));
    }

    let pool = DatabaseManager::pool().await?;

    let duplicate: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM institutions WHERE code = $1")
            .bind(&body.code)
            .fetch_optional(&pool)
            .await?;
    if duplicate.is_some() {
        return Err(ApiError::conflict("An institution with this code already exists"));
    }

    let institution = sqlx::query_as::<_, Institution>(
        "INSERT INTO institutions (name, code) VALUES ($1, $2) RETURNING *",
    )
    .bind(&body.name)
    .bind(&body.code)
    .fetch_one(&pool)
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": institution })),
    ))
}

/// GET /api/institutions
pub async fn list() -> Result<impl IntoResponse, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let institutions =
        sqlx::query_as::<_, Institution>("SELECT * FROM institutions ORDER BY name")
            .fetch_all(&pool)
            .await?;
    Ok(Json(json!({ "success": true, "data": institutions })))
}

/// GET /api/institutions/:id
pub async fn show(Path(id): Path<Uuid>) -> Result<impl IntoResponse, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let institution =
        sqlx::query_as::<_, Institution>("SELECT * FROM institutions WHERE id = $1")
            .bind(id)
            .fetch_optional(&pool)
            .await?
            .ok_or_else(|| ApiError::not_found("Institution not found"))?;
    Ok(Json(json!({ "success": true, "data": institution })))
}
