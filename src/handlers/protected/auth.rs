use axum::{response::Json, Extension};
use serde_json::{json, Value};

use crate::middleware::AuthAccount;

/// GET /api/auth/whoami - echo the authenticated account context
pub async fn whoami(Extension(account): Extension<AuthAccount>) -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "id": account.id,
            "name": account.name,
            "email": account.email,
            "role": account.role.as_str(),
            "institutionId": account.institution_id,
        }
    }))
}
