use axum::{
    extract::Path,
    response::{IntoResponse, Json},
    Extension,
};
use serde_json::json;
use uuid::Uuid;

use crate::database::models::notification::Notification;
use crate::database::DatabaseManager;
use crate::error::ApiError;
use crate::middleware::AuthAccount;

/// GET /api/notifications - caller's notifications, newest first
pub async fn list(
    Extension(account): Extension<AuthAccount>,
) -> Result<impl IntoResponse, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let notifications = sqlx::query_as::<_, Notification>(
        "SELECT * FROM notifications
         WHERE recipient_role = $1 AND recipient_id = $2
         ORDER BY created_at DESC",
    )
    .bind(account.role.as_str())
    .bind(account.id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(json!({ "success": true, "data": notifications })))
}

/// PUT /api/notifications/:id/read
pub async fn mark_read(
    Extension(account): Extension<AuthAccount>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let updated = sqlx::query(
        "UPDATE notifications SET is_read = TRUE
         WHERE id = $1 AND recipient_role = $2 AND recipient_id = $3",
    )
    .bind(id)
    .bind(account.role.as_str())
    .bind(account.id)
    .execute(&pool)
    .await?;

    if updated.rows_affected() == 0 {
        return Err(ApiError::not_found("Notification not found"));
    }

    Ok(Json(json!({ "success": true, "message": "Notification marked read" })))
}
