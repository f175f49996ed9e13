use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::config;
use crate::database::models::account::Role;
use crate::services::credentials::{sha256_hex, verify};

#[derive(Debug, Error)]
pub enum OtpError {
    #[error("No verification code found for this account")]
    NotIssued,
    #[error("Verification code is incorrect")]
    Mismatch,
    #[error("Verification code has expired")]
    Expired,
    #[error("Verification code was already used")]
    Consumed,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Derive a 6-digit code from a fresh v4 UUID's random bytes.
pub fn generate_code() -> String {
    let uuid = Uuid::new_v4();
    let bytes = uuid.as_bytes();
    let n = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    format!("{:06}", n % 900_000 + 100_000)
}

pub fn expires_at(now: DateTime<Utc>) -> DateTime<Utc> {
    now + Duration::minutes(config::config().otp.expiry_minutes)
}

/// Validity check for a stored code against user input. Consumed wins over
/// expired so a reused code reports the more specific failure.
pub fn check_code(
    input: &str,
    stored_hash: &str,
    expires: DateTime<Utc>,
    consumed_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<(), OtpError> {
    if consumed_at.is_some() {
        return Err(OtpError::Consumed);
    }
    if now > expires {
        return Err(OtpError::Expired);
    }
    if !verify(input, stored_hash) {
        return Err(OtpError::Mismatch);
    }
    Ok(())
}

/// Issue a new OTP for an account, invalidating any earlier unconsumed
/// codes for the same address. Returns the plaintext code so the caller
/// can dispatch it (logged in development, mailed in production).
pub async fn issue(pool: &PgPool, role: Role, email: &str) -> Result<String, OtpError> {
    let code = generate_code();
    let now = Utc::now();

    sqlx::query(
        "UPDATE otp_codes SET consumed_at = $1
         WHERE account_role = $2 AND email = $3 AND consumed_at IS NULL",
    )
    .bind(now)
    .bind(role.as_str())
    .bind(email)
    .execute(pool)
    .await?;

    sqlx::query(
        "INSERT INTO otp_codes (account_role, email, code_hash, expires_at)
         VALUES ($1, $2, $3, $4)",
    )
    .bind(role.as_str())
    .bind(email)
    .bind(sha256_hex(&code))
    .bind(expires_at(now))
    .execute(pool)
    .await?;

    Ok(code)
}

/// Verify and consume the most recent code for an account.
pub async fn consume(pool: &PgPool, role: Role, email: &str, input: &str) -> Result<(), OtpError> {
    let row: Option<(Uuid, String, DateTime<Utc>, Option<DateTime<Utc>>)> = sqlx::query_as(
        "SELECT id, code_hash, expires_at, consumed_at FROM otp_codes
         WHERE account_role = $1 AND email = $2
         ORDER BY created_at DESC LIMIT 1",
    )
    .bind(role.as_str())
    .bind(email)
    .fetch_optional(pool)
    .await?;

    let (id, code_hash, expires, consumed_at) = row.ok_or(OtpError::NotIssued)?;
    check_code(input, &code_hash, expires, consumed_at, Utc::now())?;

    sqlx::query("UPDATE otp_codes SET consumed_at = $1 WHERE id = $2")
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_codes_are_six_digits() {
        for _ in 0..100 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            let n: u32 = code.parse().expect("numeric code");
            assert!((100_000..1_000_000).contains(&n));
        }
    }

    #[test]
    fn check_accepts_a_fresh_matching_code() {
        let now = Utc::now();
        let hash = sha256_hex("482910");
        assert!(check_code("482910", &hash, now + Duration::minutes(5), None, now).is_ok());
    }

    #[test]
    fn check_rejects_wrong_code() {
        let now = Utc::now();
        let hash = sha256_hex("482910");
        let err = check_code("000000", &hash, now + Duration::minutes(5), None, now).unwrap_err();
        assert!(matches!(err, OtpError::Mismatch));
    }

    #[test]
    fn check_rejects_expired_code() {
        let now = Utc::now();
        let hash = sha256_hex("482910");
        let err = check_code("482910", &hash, now - Duration::seconds(1), None, now).unwrap_err();
        assert!(matches!(err, OtpError::Expired));
    }

    #[test]
    fn check_rejects_consumed_code_even_before_expiry() {
        let now = Utc::now();
        let hash = sha256_hex("482910");
        let err = check_code(
            "482910",
            &hash,
            now + Duration::minutes(5),
            Some(now - Duration::minutes(1)),
            now,
        )
        .unwrap_err();
        assert!(matches!(err, OtpError::Consumed));
    }
}
