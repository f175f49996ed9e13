use axum::{extract::Path, http::StatusCode, response::IntoResponse, Extension};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::database::models::account::Role;
use crate::database::DatabaseManager;
use crate::error::ApiError;
use crate::extract::Json;
use crate::middleware::AuthAccount;
use crate::services::events::EventService;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    #[serde(default)]
    pub teacher_ids: Vec<Uuid>,
    #[serde(default)]
    pub participant_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherAssignmentRequest {
    pub teacher_id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantRequest {
    pub student_id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRequest {
    pub student_id: Uuid,
    pub attended: bool,
}

/// POST /api/events (coordinator) - create an event; teachers and
/// volunteers named in the payload are attached and notified
pub async fn create(
    Extension(account): Extension<AuthAccount>,
    Json(body): Json<CreateEventRequest>,
) -> Result<impl IntoResponse, ApiError> {
    account.require_role(Role::Coordinator)?;
    let institution_id = account.institution_id()?;

    let pool = DatabaseManager::pool().await?;
    let event = EventService::new(pool)
        .create(
            account.id,
            institution_id,
            &body.title,
            &body.description,
            body.starts_at,
            body.ends_at,
            &body.teacher_ids,
            &body.participant_ids,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": event })),
    ))
}

/// GET /api/events - events in the caller's institution
pub async fn list(
    Extension(account): Extension<AuthAccount>,
) -> Result<impl IntoResponse, ApiError> {
    let institution_id = account.institution_id()?;
    let pool = DatabaseManager::pool().await?;
    let events = EventService::new(pool).list(institution_id).await?;
    Ok(Json(json!({ "success": true, "data": events })))
}

/// GET /api/events/:id
pub async fn show(
    Extension(account): Extension<AuthAccount>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let institution_id = account.institution_id()?;
    let pool = DatabaseManager::pool().await?;
    let event = EventService::new(pool).show(institution_id, id).await?;
    Ok(Json(json!({ "success": true, "data": event })))
}

/// PUT /api/events/:id/status (coordinator)
pub async fn transition(
    Extension(account): Extension<AuthAccount>,
    Path(id): Path<Uuid>,
    Json(body): Json<StatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    account.require_role(Role::Coordinator)?;
    let institution_id = account.institution_id()?;

    let pool = DatabaseManager::pool().await?;
    let event = EventService::new(pool)
        .transition(institution_id, id, &body.status)
        .await?;
    Ok(Json(json!({ "success": true, "data": event })))
}

/// POST /api/events/:id/teachers (coordinator)
pub async fn assign_teacher(
    Extension(account): Extension<AuthAccount>,
    Path(id): Path<Uuid>,
    Json(body): Json<TeacherAssignmentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    account.require_role(Role::Coordinator)?;
    let institution_id = account.institution_id()?;

    let pool = DatabaseManager::pool().await?;
    EventService::new(pool)
        .assign_teacher(institution_id, id, body.teacher_id)
        .await?;
    Ok(Json(json!({ "success": true, "message": "Teacher assigned" })))
}

/// POST /api/events/:id/participants (coordinator)
pub async fn enroll_participant(
    Extension(account): Extension<AuthAccount>,
    Path(id): Path<Uuid>,
    Json(body): Json<ParticipantRequest>,
) -> Result<impl IntoResponse, ApiError> {
    account.require_role(Role::Coordinator)?;
    let institution_id = account.institution_id()?;

    let pool = DatabaseManager::pool().await?;
    EventService::new(pool)
        .enroll_participant(institution_id, id, body.student_id)
        .await?;
    Ok(Json(json!({ "success": true, "message": "Volunteer enrolled" })))
}

/// PUT /api/events/:id/attendance (teacher assigned to the event)
pub async fn mark_attendance(
    Extension(account): Extension<AuthAccount>,
    Path(id): Path<Uuid>,
    Json(body): Json<AttendanceRequest>,
) -> Result<impl IntoResponse, ApiError> {
    account.require_role(Role::Teacher)?;

    let pool = DatabaseManager::pool().await?;
    let participant = EventService::new(pool)
        .mark_attendance(account.id, id, body.student_id, body.attended)
        .await?;
    Ok(Json(json!({ "success": true, "data": participant })))
}

/// PUT /api/coordinator/volunteers/:studentId - promote a student
pub async fn promote_volunteer(
    Extension(account): Extension<AuthAccount>,
    Path(student_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    account.require_role(Role::Coordinator)?;
    let institution_id = account.institution_id()?;

    let pool = DatabaseManager::pool().await?;
    EventService::new(pool)
        .promote_volunteer(institution_id, student_id)
        .await?;
    Ok(Json(json!({ "success": true, "message": "Student promoted to volunteer" })))
}
