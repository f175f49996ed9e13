use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Ledger row for a donation. `status` is created | paid | failed.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Donation {
    pub id: Uuid,
    pub donor_name: String,
    pub email: String,
    pub amount: Decimal,
    pub currency: String,
    pub gateway_order_id: String,
    pub gateway_payment_id: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}
