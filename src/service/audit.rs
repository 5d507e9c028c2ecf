//! Audit Recorder
//!
//! Writes security-relevant events to the audit log. The action catalog is
//! loaded once at boot and every action the code can emit must be present,
//! otherwise startup fails. A miss discovered at runtime would silently
//! drop evidence.

use std::collections::HashMap;

use sqlx::{PgPool, Postgres};
use thiserror::Error;

use crate::models::audit::{AuditAction, NewAuditEvent};
use crate::utils::error::AppError;

#[derive(Error, Debug)]
pub enum AuditError {
    /// The catalog is missing an action the service can emit
    #[error("Audit catalog is missing action '{0}'")]
    MissingAction(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<AuditError> for AppError {
    fn from(err: AuditError) -> Self {
        match err {
            AuditError::Database(e) => AppError::Database(e),
            AuditError::MissingAction(name) => {
                AppError::Configuration(format!("audit catalog is missing action '{}'", name))
            }
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ActionTypeRow {
    id: i32,
    name: String,
}

/// Records audit events using the pre-resolved action catalog
#[derive(Clone)]
pub struct AuditRecorder {
    action_ids: HashMap<AuditAction, i32>,
}

impl AuditRecorder {
    /// Load the action catalog and verify every emittable action exists
    pub async fn load(pool: &PgPool) -> Result<Self, AuditError> {
        let rows: Vec<ActionTypeRow> =
            sqlx::query_as("SELECT id, name FROM action_types WHERE active = TRUE")
                .fetch_all(pool)
                .await?;

        let by_name: HashMap<String, i32> =
            rows.into_iter().map(|row| (row.name, row.id)).collect();

        let mut action_ids = HashMap::new();
        for action in AuditAction::all() {
            let id = by_name
                .get(action.as_str())
                .copied()
                .ok_or(AuditError::MissingAction(action.as_str()))?;
            action_ids.insert(*action, id);
        }

        log::info!("Audit catalog loaded with {} actions", action_ids.len());

        Ok(Self { action_ids })
    }

    /// Record an event, joining the caller's transaction when given one
    pub async fn record<'e, E>(&self, executor: E, event: &NewAuditEvent) -> Result<(), AuditError>
    where
        E: sqlx::Executor<'e, Database = Postgres>,
    {
        // Catalog completeness was proven at load time
        let action_type_id = self.action_ids[&event.action];

        sqlx::query(
            "INSERT INTO audit_log
                 (action_type_id, account_id, target_account_id, outcome, details,
                  ip_address, user_agent)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(action_type_id)
        .bind(event.account_id)
        .bind(event.target_account_id)
        .bind(event.outcome.as_str())
        .bind(&event.details)
        .bind(&event.ip_address)
        .bind(&event.user_agent)
        .execute(executor)
        .await?;

        Ok(())
    }

    /// Record an event outside any transaction, logging instead of failing.
    ///
    /// Used on failure paths where the primary error should reach the
    /// caller even if the audit write breaks.
    pub async fn record_best_effort(&self, pool: &PgPool, event: &NewAuditEvent) {
        if let Err(err) = self.record(pool, event).await {
            log::error!(
                "Failed to record audit event {}: {}",
                event.action.as_str(),
                err
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::audit::AuditOutcome;
    use sqlx::PgPool;
    use uuid::Uuid;

    async fn insert_account(pool: &PgPool) -> Uuid {
        let role_id: i32 = sqlx::query_scalar("SELECT id FROM roles WHERE name = 'Cliente'")
            .fetch_one(pool)
            .await
            .unwrap();

        sqlx::query_scalar(
            "INSERT INTO accounts (name, email, password_hash, role_id, national_id)
             VALUES ('Audit Holder', 'audit-test@example.com', 'hash', $1, '1798765432')
             RETURNING id",
        )
        .bind(role_id)
        .fetch_one(pool)
        .await
        .unwrap()
    }

    #[sqlx::test]
    async fn test_load_with_seeded_catalog(pool: PgPool) {
        let recorder = AuditRecorder::load(&pool).await.unwrap();
        assert_eq!(recorder.action_ids.len(), AuditAction::all().len());
    }

    #[sqlx::test]
    async fn test_load_fails_on_missing_action(pool: PgPool) {
        sqlx::query("DELETE FROM action_types WHERE name = 'LOGIN_SUCCESS'")
            .execute(&pool)
            .await
            .unwrap();

        let result = AuditRecorder::load(&pool).await;
        assert!(matches!(result, Err(AuditError::MissingAction(_))));
    }

    #[sqlx::test]
    async fn test_load_ignores_inactive_action(pool: PgPool) {
        sqlx::query("UPDATE action_types SET active = FALSE WHERE name = 'LOGIN_SUCCESS'")
            .execute(&pool)
            .await
            .unwrap();

        let result = AuditRecorder::load(&pool).await;
        assert!(matches!(result, Err(AuditError::MissingAction(_))));
    }

    #[sqlx::test]
    async fn test_record_event(pool: PgPool) {
        let recorder = AuditRecorder::load(&pool).await.unwrap();
        let account_id = insert_account(&pool).await;

        let event = NewAuditEvent::new(AuditAction::LoginSuccess, AuditOutcome::Success)
            .actor(account_id)
            .request_info(Some("10.0.0.1".to_string()), Some("curl/8".to_string()));

        recorder.record(&pool, &event).await.unwrap();

        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM audit_log WHERE account_id = $1 AND outcome = 'SUCCESS'",
        )
        .bind(account_id)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(count, 1);
    }

    #[sqlx::test]
    async fn test_record_event_without_actor(pool: PgPool) {
        let recorder = AuditRecorder::load(&pool).await.unwrap();

        // Failed logins for unknown emails have no account id
        let event = NewAuditEvent::new(AuditAction::LoginFailed, AuditOutcome::Failure)
            .details(serde_json::json!({"email": "ghost@example.com"}));

        recorder.record(&pool, &event).await.unwrap();

        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM audit_log WHERE account_id IS NULL")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(count, 1);
    }
}
