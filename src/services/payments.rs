use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::config;
use crate::database::models::donation::Donation;

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("Payment verification failed: {0}")]
    Verification(String),
    #[error("Payment gateway error: {0}")]
    Gateway(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Order as registered with the gateway before the client pays.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayOrder {
    pub order_id: String,
}

/// Payment as reported by the gateway after the client paid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayPayment {
    pub payment_id: String,
    pub order_id: String,
    pub status: String,
    /// Amount in minor currency units, as gateways report it
    pub amount: i64,
    pub currency: String,
}

/// Payment processor seam. The HTTP implementation talks to the real
/// gateway; tests substitute a double.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_order(&self, amount_minor: i64, currency: &str)
        -> Result<GatewayOrder, PaymentError>;
    async fn fetch_payment(&self, payment_id: &str) -> Result<GatewayPayment, PaymentError>;
}

/// Razorpay-style REST gateway client authenticated with key id/secret.
pub struct HttpPaymentGateway {
    client: reqwest::Client,
    base_url: String,
    key_id: String,
    key_secret: String,
}

impl HttpPaymentGateway {
    pub fn from_config() -> Self {
        let payment = &config::config().payment;
        Self {
            client: reqwest::Client::new(),
            base_url: payment.gateway_base_url.clone(),
            key_id: payment.key_id.clone(),
            key_secret: payment.key_secret.clone(),
        }
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn create_order(
        &self,
        amount_minor: i64,
        currency: &str,
    ) -> Result<GatewayOrder, PaymentError> {
        #[derive(Deserialize)]
        struct OrderResponse {
            id: String,
        }

        let response = self
            .client
            .post(format!("{}/orders", self.base_url))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&serde_json::json!({
                "amount": amount_minor,
                "currency": currency,
            }))
            .send()
            .await
            .map_err(|e| PaymentError::Gateway(e.to_string()))?;

        if !response.status().is_success() {
            return Err(PaymentError::Gateway(format!(
                "order creation returned {}",
                response.status()
            )));
        }

        let order: OrderResponse = response
            .json()
            .await
            .map_err(|e| PaymentError::Gateway(e.to_string()))?;

        Ok(GatewayOrder { order_id: order.id })
    }

    async fn fetch_payment(&self, payment_id: &str) -> Result<GatewayPayment, PaymentError> {
        #[derive(Deserialize)]
        struct PaymentResponse {
            id: String,
            order_id: String,
            status: String,
            amount: i64,
            currency: String,
        }

        let response = self
            .client
            .get(format!("{}/payments/{}", self.base_url, payment_id))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .send()
            .await
            .map_err(|e| PaymentError::Gateway(e.to_string()))?;

        if !response.status().is_success() {
            return Err(PaymentError::Gateway(format!(
                "payment lookup returned {}",
                response.status()
            )));
        }

        let payment: PaymentResponse = response
            .json()
            .await
            .map_err(|e| PaymentError::Gateway(e.to_string()))?;

        Ok(GatewayPayment {
            payment_id: payment.id,
            order_id: payment.order_id,
            status: payment.status,
            amount: payment.amount,
            currency: payment.currency,
        })
    }
}

/// Convert a ledger amount to the gateway's minor units.
pub fn to_minor_units(amount: Decimal) -> Result<i64, PaymentError> {
    if amount <= Decimal::ZERO {
        return Err(PaymentError::Validation(
            "Amount must be positive".to_string(),
        ));
    }
    (amount * Decimal::from(100))
        .round()
        .to_i64()
        .ok_or_else(|| PaymentError::Validation("Amount out of range".to_string()))
}

/// A payment settles its donation only if it targets the right order, is
/// captured, and covers the exact amount in the same currency.
pub fn check_payment(
    expected_order_id: &str,
    expected_amount_minor: i64,
    expected_currency: &str,
    payment: &GatewayPayment,
) -> Result<(), PaymentError> {
    if payment.order_id != expected_order_id {
        return Err(PaymentError::Verification(
            "Payment does not belong to this order".to_string(),
        ));
    }
    if payment.status != "captured" {
        return Err(PaymentError::Verification(format!(
            "Payment is not captured (status: {})",
            payment.status
        )));
    }
    if payment.amount != expected_amount_minor {
        return Err(PaymentError::Verification(
            "Payment amount does not match the order".to_string(),
        ));
    }
    if payment.currency != expected_currency {
        return Err(PaymentError::Verification(
            "Payment currency does not match the order".to_string(),
        ));
    }
    Ok(())
}

pub struct DonationService<'a> {
    pool: PgPool,
    gateway: &'a dyn PaymentGateway,
}

impl<'a> DonationService<'a> {
    pub fn new(pool: PgPool, gateway: &'a dyn PaymentGateway) -> Self {
        Self { pool, gateway }
    }

    /// Register an order with the gateway and open a ledger row in state
    /// `created`.
    pub async fn create_order(
        &self,
        donor_name: &str,
        email: &str,
        amount: Decimal,
        currency: &str,
    ) -> Result<Donation, PaymentError> {
        if donor_name.trim().is_empty() || email.trim().is_empty() {
            return Err(PaymentError::Validation(
                "Donor name and email are required".to_string(),
            ));
        }
        let amount_minor = to_minor_units(amount)?;

        let order = self.gateway.create_order(amount_minor, currency).await?;

        let donation = sqlx::query_as::<_, Donation>(
            "INSERT INTO donations (donor_name, email, amount, currency, gateway_order_id, status)
             VALUES ($1, $2, $3, $4, $5, 'created')
             RETURNING *",
        )
        .bind(donor_name)
        .bind(email)
        .bind(amount)
        .bind(currency)
        .bind(&order.order_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(donation)
    }

    /// Verify a client-reported payment against the gateway and settle the
    /// ledger row to `paid` or `failed`.
    pub async fn verify(&self, order_id: &str, payment_id: &str) -> Result<Donation, PaymentError> {
        let donation = sqlx::query_as::<_, Donation>(
            "SELECT * FROM donations WHERE gateway_order_id = $1",
        )
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| PaymentError::NotFound("Donation order not found".to_string()))?;

        let payment = self.gateway.fetch_payment(payment_id).await?;

        let amount_minor = to_minor_units(donation.amount)?;
        match check_payment(order_id, amount_minor, &donation.currency, &payment) {
            Ok(()) => {
                let donation = sqlx::query_as::<_, Donation>(
                    "UPDATE donations SET status = 'paid', gateway_payment_id = $1
                     WHERE id = $2 RETURNING *",
                )
                .bind(payment_id)
                .bind(donation.id)
                .fetch_one(&self.pool)
                .await?;
                Ok(donation)
            }
            Err(err) => {
                sqlx::query(
                    "UPDATE donations SET status = 'failed', gateway_payment_id = $1
                     WHERE id = $2",
                )
                .bind(payment_id)
                .bind(donation.id)
                .execute(&self.pool)
                .await?;
                Err(err)
            }
        }
    }

    pub async fn list(&self) -> Result<Vec<Donation>, PaymentError> {
        let donations = sqlx::query_as::<_, Donation>(
            "SELECT * FROM donations ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(donations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn payment(order_id: &str, status: &str, amount: i64, currency: &str) -> GatewayPayment {
        GatewayPayment {
            payment_id: "pay_test".to_string(),
            order_id: order_id.to_string(),
            status: status.to_string(),
            amount,
            currency: currency.to_string(),
        }
    }

    #[test]
    fn minor_units_rounds_to_paise() {
        assert_eq!(to_minor_units(dec("500")).unwrap(), 50_000);
        assert_eq!(to_minor_units(dec("99.99")).unwrap(), 9_999);
    }

    #[test]
    fn minor_units_rejects_non_positive_amounts() {
        assert!(matches!(
            to_minor_units(Decimal::ZERO),
            Err(PaymentError::Validation(_))
        ));
        assert!(matches!(
            to_minor_units(dec("-10")),
            Err(PaymentError::Validation(_))
        ));
    }

    #[test]
    fn captured_matching_payment_passes() {
        let p = payment("order_1", "captured", 50_000, "INR");
        assert!(check_payment("order_1", 50_000, "INR", &p).is_ok());
    }

    #[test]
    fn uncaptured_payment_fails() {
        let p = payment("order_1", "authorized", 50_000, "INR");
        assert!(matches!(
            check_payment("order_1", 50_000, "INR", &p),
            Err(PaymentError::Verification(_))
        ));
    }

    #[test]
    fn wrong_order_or_amount_or_currency_fails() {
        let p = payment("order_2", "captured", 50_000, "INR");
        assert!(check_payment("order_1", 50_000, "INR", &p).is_err());

        let p = payment("order_1", "captured", 40_000, "INR");
        assert!(check_payment("order_1", 50_000, "INR", &p).is_err());

        let p = payment("order_1", "captured", 50_000, "USD");
        assert!(check_payment("order_1", 50_000, "INR", &p).is_err());
    }
}
