// Grace-mark workflow handlers: coordinator recommendation, teacher review,
// and the separate teacher-owned event-scoped assignment path.

use axum::{extract::Path, http::StatusCode, response::IntoResponse, Extension};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::database::models::account::Role;
use crate::database::DatabaseManager;
use crate::error::ApiError;
use crate::extract::Json;
use crate::middleware::AuthAccount;
use crate::services::grace::GraceService;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendRequest {
    pub student_id: Uuid,
    pub marks: i32,
    pub reason: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequest {
    pub student_id: Uuid,
    pub approve: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectAssignRequest {
    pub student_id: Uuid,
    pub event_id: Uuid,
    pub marks: i32,
}

#[derive(Debug, Deserialize)]
pub struct DirectUpdateRequest {
    pub marks: i32,
}

/// POST /api/coordinator/recommendgracemark
///
/// Coordinator recommends marks for a volunteer with at least one Completed
/// event; reviewers are the teachers assigned across those events.
pub async fn recommend(
    Extension(account): Extension<AuthAccount>,
    Json(body): Json<RecommendRequest>,
) -> Result<impl IntoResponse, ApiError> {
    account.require_role(Role::Coordinator)?;
    let institution_id = account.institution_id()?;

    let pool = DatabaseManager::pool().await?;
    let pending = GraceService::new(pool)
        .recommend(
            account.id,
            institution_id,
            body.student_id,
            body.marks,
            &body.reason,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": pending })),
    ))
}

/// GET /api/coordinator/recommendations - the caller's issued
/// recommendation log, newest first
pub async fn coordinator_log(
    Extension(account): Extension<AuthAccount>,
) -> Result<impl IntoResponse, ApiError> {
    account.require_role(Role::Coordinator)?;

    let pool = DatabaseManager::pool().await?;
    let entries = GraceService::new(pool).coordinator_log(account.id).await?;

    Ok(Json(json!({ "success": true, "data": entries })))
}

/// PUT /api/teacher/approverecommendedgracemark
pub async fn review(
    Extension(account): Extension<AuthAccount>,
    Json(body): Json<ReviewRequest>,
) -> Result<impl IntoResponse, ApiError> {
    account.require_role(Role::Teacher)?;

    let pool = DatabaseManager::pool().await?;
    let outcome = GraceService::new(pool)
        .review(account.id, body.student_id, body.approve)
        .await?;

    Ok(Json(json!({ "success": true, "data": outcome })))
}

/// POST /api/teacher/grace-marks - direct event-scoped assignment
pub async fn assign_direct(
    Extension(account): Extension<AuthAccount>,
    Json(body): Json<DirectAssignRequest>,
) -> Result<impl IntoResponse, ApiError> {
    account.require_role(Role::Teacher)?;

    let pool = DatabaseManager::pool().await?;
    let entry = GraceService::new(pool)
        .assign_direct(account.id, body.student_id, body.event_id, body.marks)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": entry })),
    ))
}

/// PUT /api/teacher/grace-marks/:studentId/:eventId
pub async fn update_direct(
    Extension(account): Extension<AuthAccount>,
    Path((student_id, event_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<DirectUpdateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    account.require_role(Role::Teacher)?;

    let pool = DatabaseManager::pool().await?;
    let entry = GraceService::new(pool)
        .update_direct(account.id, student_id, event_id, body.marks)
        .await?;

    Ok(Json(json!({ "success": true, "data": entry })))
}

/// DELETE /api/teacher/grace-marks/:studentId/:eventId
pub async fn delete_direct(
    Extension(account): Extension<AuthAccount>,
    Path((student_id, event_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    account.require_role(Role::Teacher)?;

    let pool = DatabaseManager::pool().await?;
    GraceService::new(pool)
        .delete_direct(account.id, student_id, event_id)
        .await?;

    Ok(Json(json!({ "success": true, "message": "Grace mark entry removed" })))
}

/// GET /api/students/:id/grace-marks - running total plus full history
pub async fn history(
    Extension(account): Extension<AuthAccount>,
    Path(student_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    // Students may only read their own history; staff roles may read any.
    if account.role == Role::Student && account.id != student_id {
        return Err(ApiError::forbidden("You can only view your own grace marks"));
    }

    let pool = DatabaseManager::pool().await?;
    let (total, entries) = GraceService::new(pool).history(student_id).await?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "graceMarks": total,
            "history": entries,
        }
    })))
}
