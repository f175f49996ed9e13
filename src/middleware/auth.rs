use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use uuid::Uuid;

use crate::auth::Claims;
use crate::config;
use crate::database::models::account::Role;
use crate::error::ApiError;

/// Authenticated account context extracted from JWT
#[derive(Clone, Debug)]
pub struct AuthAccount {
    pub id: Uuid,
    pub role: Role,
    pub institution_id: Option<Uuid>,
    pub email: String,
    pub name: String,
}

impl AuthAccount {
    /// Reject the request unless the caller holds the given role.
    pub fn require_role(&self, role: Role) -> Result<(), ApiError> {
        if self.role == role {
            Ok(())
        } else {
            Err(ApiError::forbidden(format!(
                "This operation requires the {} role",
                role.as_str()
            )))
        }
    }

    /// Institution the caller belongs to. Admin accounts are not attached
    /// to an institution and cannot perform institution-scoped operations.
    pub fn institution_id(&self) -> Result<Uuid, ApiError> {
        self.institution_id
            .ok_or_else(|| ApiError::forbidden("Account is not attached to an institution"))
    }
}

impl TryFrom<Claims> for AuthAccount {
    type Error = ApiError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let role = Role::parse(&claims.role)
            .ok_or_else(|| ApiError::unauthorized("Unknown role in token"))?;
        Ok(Self {
            id: claims.sub,
            role,
            institution_id: claims.institution,
            email: claims.email,
            name: claims.name,
        })
    }
}

/// JWT authentication middleware that validates tokens and injects the
/// account context into request extensions.
pub async fn jwt_auth_middleware(
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_jwt_from_headers(&headers).map_err(ApiError::unauthorized)?;
    let claims = validate_jwt(&token).map_err(ApiError::unauthorized)?;

    let account = AuthAccount::try_from(claims)?;
    request.extensions_mut().insert(account);

    Ok(next.run(request).await)
}

/// Extract JWT token from Authorization header
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<String, String> {
    let auth_header = headers
        .get("authorization")
        .or_else(|| headers.get("Authorization"))
        .ok_or_else(|| "Missing Authorization header".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    if let Some(token) = auth_str.strip_prefix("Bearer ") {
        if token.trim().is_empty() {
            return Err("Empty JWT token".to_string());
        }
        Ok(token.to_string())
    } else {
        Err("Authorization header must use Bearer token format".to_string())
    }
}

/// Validate JWT token and extract claims
fn validate_jwt(token: &str) -> Result<Claims, String> {
    let secret = &config::config().security.jwt_secret;

    if secret.is_empty() {
        return Err("JWT secret not configured".to_string());
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let validation = Validation::default();

    let token_data = decode::<Claims>(token, &decoding_key, &validation)
        .map_err(|e| format!("Invalid JWT token: {}", e))?;

    Ok(token_data.claims)
}
