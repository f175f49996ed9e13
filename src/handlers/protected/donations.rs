use axum::{http::StatusCode, response::IntoResponse, Extension};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;

use crate::database::models::account::Role;
use crate::database::DatabaseManager;
use crate::error::ApiError;
use crate::extract::Json;
use crate::middleware::AuthAccount;
use crate::services::payments::{DonationService, HttpPaymentGateway};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub donor_name: String,
    pub email: String,
    pub amount: Decimal,
    pub currency: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    pub order_id: String,
    pub payment_id: String,
}

/// POST /api/donations/order - register an order with the gateway and open
/// a ledger row
pub async fn create_order(
    Extension(_account): Extension<AuthAccount>,
    Json(body): Json<CreateOrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let currency = body.currency.as_deref().unwrap_or("INR");

    let pool = DatabaseManager::pool().await?;
    let gateway = HttpPaymentGateway::from_config();
    let donation = DonationService::new(pool, &gateway)
        .create_order(&body.donor_name, &body.email, body.amount, currency)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": donation })),
    ))
}

/// POST /api/donations/verify - settle the ledger row against the gateway
pub async fn verify(
    Extension(_account): Extension<AuthAccount>,
    Json(body): Json<VerifyRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let gateway = HttpPaymentGateway::from_config();
    let donation = DonationService::new(pool, &gateway)
        .verify(&body.order_id, &body.payment_id)
        .await?;

    Ok(Json(json!({ "success": true, "data": donation })))
}

/// GET /api/donations (admin) - full ledger
pub async fn list(
    Extension(account): Extension<AuthAccount>,
) -> Result<impl IntoResponse, ApiError> {
    account.require_role(Role::Admin)?;

    let pool = DatabaseManager::pool().await?;
    let gateway = HttpPaymentGateway::from_config();
    let donations = DonationService::new(pool, &gateway).list().await?;

    Ok(Json(json!({ "success": true, "data": donations })))
}
