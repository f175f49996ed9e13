// Public auth handlers: per-role signup, OTP verification and login.

use axum::{extract::Path, http::StatusCode, response::IntoResponse};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::auth::{generate_jwt, Claims};
use crate::extract::Json;
use crate::database::models::account::Role;
use crate::database::DatabaseManager;
use crate::error::ApiError;
use crate::services::credentials::{sha256_hex, verify};
use crate::services::otp;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub institution_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

fn parse_role(role: &str) -> Result<Role, ApiError> {
    Role::parse(role).ok_or_else(|| ApiError::bad_request(format!("Unknown role '{}'", role)))
}

/// POST /auth/:role/signup - create an unverified account and issue an OTP
pub async fn signup(
    Path(role): Path<String>,
    Json(body): Json<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let role = parse_role(&role)?;

    if body.name.trim().is_empty() || body.email.trim().is_empty() || body.password.is_empty() {
        return Err(ApiError::bad_request("Name, email and password are required"));
    }

    let institution_id = match role {
        Role::Admin => None,
        _ => Some(body.institution_id.ok_or_else(|| {
            ApiError::bad_request("Institution is required for this role")
        })?),
    };

    let pool = DatabaseManager::pool().await?;

    if let Some(institution_id) = institution_id {
        let exists: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM institutions WHERE id = $1")
                .bind(institution_id)
                .fetch_optional(&pool)
                .await?;
        if exists.is_none() {
            return Err(ApiError::not_found("Institution not found"));
        }
    }

    let duplicate: Option<(Uuid,)> = sqlx::query_as(&format!(
        "SELECT id FROM {} WHERE email = $1",
        role.table()
    ))
    .bind(&body.email)
    .fetch_optional(&pool)
    .await?;
    if duplicate.is_some() {
        return Err(ApiError::conflict("An account with this email already exists"));
    }

    let password_hash = sha256_hex(&body.password);
    match role {
        Role::Admin => {
            sqlx::query(
                "INSERT INTO admins (name, email, password_hash) VALUES ($1, $2, $3)",
            )
            .bind(&body.name)
            .bind(&body.email)
            .bind(&password_hash)
            .execute(&pool)
            .await?;
        }
        _ => {
            sqlx::query(&format!(
                "INSERT INTO {} (name, email, password_hash, institution_id) VALUES ($1, $2, $3, $4)",
                role.table()
            ))
            .bind(&body.name)
            .bind(&body.email)
            .bind(&password_hash)
            .bind(institution_id)
            .execute(&pool)
            .await?;
        }
    }

    // Dispatching the code by mail is an external concern; in this service
    // the code is issued, stored hashed and logged for the operator.
    let code = otp::issue(&pool, role, &body.email).await?;
    tracing::info!(email = %body.email, role = role.as_str(), otp = %code, "issued signup OTP");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Account created, verification code sent"
        })),
    ))
}

/// POST /auth/:role/verify-otp - mark the account verified
pub async fn verify_otp(
    Path(role): Path<String>,
    Json(body): Json<VerifyOtpRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let role = parse_role(&role)?;

    if body.email.trim().is_empty() || body.otp.trim().is_empty() {
        return Err(ApiError::bad_request("Email and otp are required"));
    }

    let pool = DatabaseManager::pool().await?;

    let account: Option<(Uuid,)> = sqlx::query_as(&format!(
        "SELECT id FROM {} WHERE email = $1",
        role.table()
    ))
    .bind(&body.email)
    .fetch_optional(&pool)
    .await?;
    if account.is_none() {
        return Err(ApiError::not_found("Account not found"));
    }

    otp::consume(&pool, role, &body.email, &body.otp).await?;

    sqlx::query(&format!(
        "UPDATE {} SET is_verified = TRUE WHERE email = $1",
        role.table()
    ))
    .bind(&body.email)
    .execute(&pool)
    .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Account verified"
    })))
}

/// POST /auth/:role/login - authenticate and receive a JWT
pub async fn login(
    Path(role): Path<String>,
    Json(body): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let role = parse_role(&role)?;

    if body.email.trim().is_empty() || body.password.is_empty() {
        return Err(ApiError::bad_request("Email and password are required"));
    }

    let pool = DatabaseManager::pool().await?;

    let sql = match role {
        Role::Admin => {
            "SELECT id, name, email, password_hash, NULL::uuid, is_verified FROM admins WHERE email = $1"
                .to_string()
        }
        _ => format!(
            "SELECT id, name, email, password_hash, institution_id, is_verified FROM {} WHERE email = $1",
            role.table()
        ),
    };

    let account: Option<(Uuid, String, String, String, Option<Uuid>, bool)> =
        sqlx::query_as(&sql).bind(&body.email).fetch_optional(&pool).await?;

    let (id, name, email, password_hash, institution_id, is_verified) =
        account.ok_or_else(|| ApiError::unauthorized("Invalid email or password"))?;

    if !verify(&body.password, &password_hash) {
        return Err(ApiError::unauthorized("Invalid email or password"));
    }
    if !is_verified {
        return Err(ApiError::forbidden("Account is not verified yet"));
    }

    let claims = Claims::new(
        id,
        role.as_str().to_string(),
        institution_id,
        email.clone(),
        name.clone(),
    );
    let token = generate_jwt(claims)?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "token": token,
            "account": {
                "id": id,
                "name": name,
                "email": email,
                "role": role.as_str(),
                "institutionId": institution_id,
            }
        }
    })))
}
