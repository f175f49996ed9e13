use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub recipient_role: String,
    pub recipient_id: Uuid,
    pub event_id: Option<Uuid>,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}
