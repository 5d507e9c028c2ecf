//! One-Time Code Engine
//!
//! Issues and validates one-time code challenges. Every operation takes a
//! `&mut PgConnection` so callers can run it inside a larger transaction,
//! which is what makes registration atomic.
//!
//! A challenge is single-shot: the first successful validation consumes it,
//! and consumption happens with a conditional update so two concurrent
//! submissions of the same code cannot both succeed.

use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use thiserror::Error;
use uuid::Uuid;

use crate::models::otp::{OtpChallenge, OtpPurpose};
use crate::utils::error::AppError;
use crate::utils::security;

/// Errors produced by challenge validation
#[derive(Error, Debug)]
pub enum OtpError {
    /// No unconsumed challenge exists for this account and purpose
    #[error("No pending verification code")]
    NoPendingChallenge,

    /// The newest challenge expired before a valid submission arrived
    #[error("Verification code has expired")]
    Expired,

    /// Submitted code does not match; the challenge stays pending
    #[error("Incorrect verification code")]
    CodeMismatch,

    /// Too many wrong submissions voided the challenge
    #[error("Too many incorrect attempts")]
    TooManyAttempts,

    /// The challenge was consumed by a concurrent submission
    #[error("Verification code already used")]
    AlreadyConsumed,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<OtpError> for AppError {
    fn from(err: OtpError) -> Self {
        match err {
            OtpError::Database(e) => AppError::Database(e),
            other => AppError::Authentication(other.to_string()),
        }
    }
}

/// A freshly issued challenge, returned so the caller can deliver the code
#[derive(Debug, Clone)]
pub struct IssuedChallenge {
    pub challenge_id: Uuid,
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

/// One-time code issuance and validation
#[derive(Clone)]
pub struct OtpEngine {
    code_length: usize,
    expiration_minutes: i64,
    max_attempts: i32,
}

impl OtpEngine {
    pub fn new(code_length: usize, expiration_minutes: i64, max_attempts: i32) -> Self {
        Self {
            code_length,
            expiration_minutes,
            max_attempts,
        }
    }

    /// Issue a new challenge for the account and purpose.
    ///
    /// Earlier pending challenges for the same purpose are voided first, so
    /// only the newest code is ever accepted.
    pub async fn issue(
        &self,
        conn: &mut PgConnection,
        account_id: Uuid,
        purpose: OtpPurpose,
    ) -> Result<IssuedChallenge, OtpError> {
        let purpose_id = self.resolve_purpose(conn, purpose).await?;

        sqlx::query(
            "UPDATE otp_challenges SET used = TRUE
             WHERE account_id = $1 AND purpose_id = $2 AND used = FALSE",
        )
        .bind(account_id)
        .bind(purpose_id)
        .execute(&mut *conn)
        .await?;

        let code = security::generate_otp_code(self.code_length);
        let expires_at = security::expiration_in_minutes(self.expiration_minutes);

        let challenge_id: Uuid = sqlx::query_scalar(
            "INSERT INTO otp_challenges (account_id, purpose_id, code, expires_at)
             VALUES ($1, $2, $3, $4)
             RETURNING id",
        )
        .bind(account_id)
        .bind(purpose_id)
        .bind(&code)
        .bind(expires_at)
        .fetch_one(&mut *conn)
        .await?;

        log::debug!(
            "Issued {} challenge {} for account {}",
            purpose.as_str(),
            challenge_id,
            account_id
        );

        Ok(IssuedChallenge {
            challenge_id,
            code,
            expires_at,
        })
    }

    /// Validate a submitted code against the newest pending challenge.
    ///
    /// Order of checks: missing challenge, expiry, code mismatch, then
    /// consumption. A mismatch leaves the challenge pending until the
    /// attempt cap voids it; expiry and success both mark it used.
    pub async fn validate(
        &self,
        conn: &mut PgConnection,
        account_id: Uuid,
        purpose: OtpPurpose,
        submitted_code: &str,
    ) -> Result<(), OtpError> {
        let purpose_id = self.resolve_purpose(conn, purpose).await?;

        let challenge: Option<OtpChallenge> = sqlx::query_as(
            "SELECT id, account_id, purpose_id, code, expires_at, used, attempts, created_at
             FROM otp_challenges
             WHERE account_id = $1 AND purpose_id = $2 AND used = FALSE
             ORDER BY created_at DESC
             LIMIT 1",
        )
        .bind(account_id)
        .bind(purpose_id)
        .fetch_optional(&mut *conn)
        .await?;

        let challenge = challenge.ok_or(OtpError::NoPendingChallenge)?;

        if challenge.is_expired() {
            self.consume(conn, challenge.id).await?;
            return Err(OtpError::Expired);
        }

        if challenge.code != submitted_code {
            let attempts = challenge.attempts + 1;
            if attempts >= self.max_attempts {
                sqlx::query(
                    "UPDATE otp_challenges SET attempts = $2, used = TRUE WHERE id = $1",
                )
                .bind(challenge.id)
                .bind(attempts)
                .execute(&mut *conn)
                .await?;
                return Err(OtpError::TooManyAttempts);
            }

            sqlx::query("UPDATE otp_challenges SET attempts = $2 WHERE id = $1")
                .bind(challenge.id)
                .bind(attempts)
                .execute(&mut *conn)
                .await?;
            return Err(OtpError::CodeMismatch);
        }

        // Conditional consumption closes the race between two submissions
        // of the same valid code.
        if !self.consume(conn, challenge.id).await? {
            return Err(OtpError::AlreadyConsumed);
        }

        Ok(())
    }

    /// Mark a challenge used; returns whether this call did the marking
    async fn consume(&self, conn: &mut PgConnection, challenge_id: Uuid) -> Result<bool, OtpError> {
        let result = sqlx::query(
            "UPDATE otp_challenges SET used = TRUE WHERE id = $1 AND used = FALSE",
        )
        .bind(challenge_id)
        .execute(conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Look up the purpose id, creating the catalog row when absent
    async fn resolve_purpose(
        &self,
        conn: &mut PgConnection,
        purpose: OtpPurpose,
    ) -> Result<i32, OtpError> {
        let existing: Option<i32> =
            sqlx::query_scalar("SELECT id FROM otp_purposes WHERE name = $1")
                .bind(purpose.as_str())
                .fetch_optional(&mut *conn)
                .await?;

        if let Some(id) = existing {
            return Ok(id);
        }

        let id: i32 = sqlx::query_scalar(
            "INSERT INTO otp_purposes (name, description)
             VALUES ($1, $2)
             ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
             RETURNING id",
        )
        .bind(purpose.as_str())
        .bind(purpose.description())
        .fetch_one(&mut *conn)
        .await?;

        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::PgPool;

    fn engine() -> OtpEngine {
        OtpEngine::new(6, 15, 5)
    }

    async fn insert_account(pool: &PgPool) -> Uuid {
        let role_id: i32 = sqlx::query_scalar("SELECT id FROM roles WHERE name = 'Cliente'")
            .fetch_one(pool)
            .await
            .unwrap();

        sqlx::query_scalar(
            "INSERT INTO accounts (name, email, password_hash, role_id, national_id)
             VALUES ('Test Holder', 'otp-test@example.com', 'hash', $1, '1712345678')
             RETURNING id",
        )
        .bind(role_id)
        .fetch_one(pool)
        .await
        .unwrap()
    }

    #[sqlx::test]
    async fn test_issue_then_validate(pool: PgPool) {
        let account_id = insert_account(&pool).await;
        let engine = engine();

        let mut conn = pool.acquire().await.unwrap();
        let issued = engine
            .issue(&mut conn, account_id, OtpPurpose::AccountVerification)
            .await
            .unwrap();

        assert_eq!(issued.code.len(), 6);

        engine
            .validate(
                &mut conn,
                account_id,
                OtpPurpose::AccountVerification,
                &issued.code,
            )
            .await
            .unwrap();
    }

    #[sqlx::test]
    async fn test_challenge_is_single_shot(pool: PgPool) {
        let account_id = insert_account(&pool).await;
        let engine = engine();

        let mut conn = pool.acquire().await.unwrap();
        let issued = engine
            .issue(&mut conn, account_id, OtpPurpose::AccountVerification)
            .await
            .unwrap();

        engine
            .validate(
                &mut conn,
                account_id,
                OtpPurpose::AccountVerification,
                &issued.code,
            )
            .await
            .unwrap();

        let second = engine
            .validate(
                &mut conn,
                account_id,
                OtpPurpose::AccountVerification,
                &issued.code,
            )
            .await;
        assert!(matches!(second, Err(OtpError::NoPendingChallenge)));
    }

    #[sqlx::test]
    async fn test_concurrent_submission_loses_race(pool: PgPool) {
        let account_id = insert_account(&pool).await;
        let engine = engine();

        let mut conn = pool.acquire().await.unwrap();
        let issued = engine
            .issue(&mut conn, account_id, OtpPurpose::AccountVerification)
            .await
            .unwrap();
        drop(conn);

        // Consume inside an open transaction so the row lock is held while
        // the second submission selects the still-pending challenge
        let mut tx = pool.begin().await.unwrap();
        engine
            .validate(
                &mut tx,
                account_id,
                OtpPurpose::AccountVerification,
                &issued.code,
            )
            .await
            .unwrap();

        let loser = tokio::spawn({
            let pool = pool.clone();
            let engine = engine.clone();
            let code = issued.code.clone();
            async move {
                let mut conn = pool.acquire().await.unwrap();
                engine
                    .validate(
                        &mut conn,
                        account_id,
                        OtpPurpose::AccountVerification,
                        &code,
                    )
                    .await
            }
        });

        // Let the loser reach the conditional update, then release the lock
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
        tx.commit().await.unwrap();

        let second = loser.await.unwrap();
        assert!(matches!(second, Err(OtpError::AlreadyConsumed)));
    }

    #[sqlx::test]
    async fn test_no_pending_challenge(pool: PgPool) {
        let account_id = insert_account(&pool).await;

        let mut conn = pool.acquire().await.unwrap();
        let result = engine()
            .validate(
                &mut conn,
                account_id,
                OtpPurpose::AccountVerification,
                "123456",
            )
            .await;
        assert!(matches!(result, Err(OtpError::NoPendingChallenge)));
    }

    #[sqlx::test]
    async fn test_mismatch_leaves_challenge_pending(pool: PgPool) {
        let account_id = insert_account(&pool).await;
        let engine = engine();

        let mut conn = pool.acquire().await.unwrap();
        let issued = engine
            .issue(&mut conn, account_id, OtpPurpose::AccountVerification)
            .await
            .unwrap();

        let wrong = if issued.code == "000000" {
            "000001"
        } else {
            "000000"
        };

        let result = engine
            .validate(&mut conn, account_id, OtpPurpose::AccountVerification, wrong)
            .await;
        assert!(matches!(result, Err(OtpError::CodeMismatch)));

        // The correct code still works afterwards
        engine
            .validate(
                &mut conn,
                account_id,
                OtpPurpose::AccountVerification,
                &issued.code,
            )
            .await
            .unwrap();
    }

    #[sqlx::test]
    async fn test_attempt_cap_voids_challenge(pool: PgPool) {
        let account_id = insert_account(&pool).await;
        let engine = OtpEngine::new(6, 15, 3);

        let mut conn = pool.acquire().await.unwrap();
        let issued = engine
            .issue(&mut conn, account_id, OtpPurpose::AccountVerification)
            .await
            .unwrap();

        let wrong = if issued.code == "000000" {
            "000001"
        } else {
            "000000"
        };

        for _ in 0..2 {
            let result = engine
                .validate(&mut conn, account_id, OtpPurpose::AccountVerification, wrong)
                .await;
            assert!(matches!(result, Err(OtpError::CodeMismatch)));
        }

        let capped = engine
            .validate(&mut conn, account_id, OtpPurpose::AccountVerification, wrong)
            .await;
        assert!(matches!(capped, Err(OtpError::TooManyAttempts)));

        // Even the right code is dead now
        let after = engine
            .validate(
                &mut conn,
                account_id,
                OtpPurpose::AccountVerification,
                &issued.code,
            )
            .await;
        assert!(matches!(after, Err(OtpError::NoPendingChallenge)));
    }

    #[sqlx::test]
    async fn test_expired_challenge_is_voided(pool: PgPool) {
        let account_id = insert_account(&pool).await;
        let engine = engine();

        let mut conn = pool.acquire().await.unwrap();
        let issued = engine
            .issue(&mut conn, account_id, OtpPurpose::AccountVerification)
            .await
            .unwrap();

        sqlx::query("UPDATE otp_challenges SET expires_at = NOW() - INTERVAL '1 minute' WHERE id = $1")
            .bind(issued.challenge_id)
            .execute(&pool)
            .await
            .unwrap();

        let result = engine
            .validate(
                &mut conn,
                account_id,
                OtpPurpose::AccountVerification,
                &issued.code,
            )
            .await;
        assert!(matches!(result, Err(OtpError::Expired)));

        // Expiry consumed the challenge
        let again = engine
            .validate(
                &mut conn,
                account_id,
                OtpPurpose::AccountVerification,
                &issued.code,
            )
            .await;
        assert!(matches!(again, Err(OtpError::NoPendingChallenge)));
    }

    #[sqlx::test]
    async fn test_new_issue_voids_previous_challenge(pool: PgPool) {
        let account_id = insert_account(&pool).await;
        let engine = engine();

        let mut conn = pool.acquire().await.unwrap();
        let first = engine
            .issue(&mut conn, account_id, OtpPurpose::AccountVerification)
            .await
            .unwrap();
        let second = engine
            .issue(&mut conn, account_id, OtpPurpose::AccountVerification)
            .await
            .unwrap();

        if first.code != second.code {
            let stale = engine
                .validate(
                    &mut conn,
                    account_id,
                    OtpPurpose::AccountVerification,
                    &first.code,
                )
                .await;
            assert!(stale.is_err());
        }

        engine
            .validate(
                &mut conn,
                account_id,
                OtpPurpose::AccountVerification,
                &second.code,
            )
            .await
            .unwrap();
    }

    #[sqlx::test]
    async fn test_purposes_are_independent(pool: PgPool) {
        let account_id = insert_account(&pool).await;
        let engine = engine();

        let mut conn = pool.acquire().await.unwrap();
        let verification = engine
            .issue(&mut conn, account_id, OtpPurpose::AccountVerification)
            .await
            .unwrap();
        let reset = engine
            .issue(&mut conn, account_id, OtpPurpose::PasswordReset)
            .await
            .unwrap();

        // Consuming the reset challenge leaves the verification one pending
        engine
            .validate(&mut conn, account_id, OtpPurpose::PasswordReset, &reset.code)
            .await
            .unwrap();
        engine
            .validate(
                &mut conn,
                account_id,
                OtpPurpose::AccountVerification,
                &verification.code,
            )
            .await
            .unwrap();
    }
}
