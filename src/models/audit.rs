//! Audit Models
//!
//! Typed action catalog, outcomes, and the event payload recorded to the
//! audit log.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Actions recorded to the audit log.
///
/// Every variant must have a matching `action_types.name` row; the recorder
/// refuses to start when one is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuditAction {
    UserRegistered,
    LoginSuccess,
    LoginFailed,
    LoginFailedLocked,
    LoginFailedUnverified,
    VerifyAccountSuccess,
    VerifyAccountFailed,
    PasswordUpdated,
    PasswordUpdateFailed,
    PasswordResetRequested,
    PasswordResetCompleted,
    PasswordResetFailed,
    UserBlocked,
    UserUnblocked,
    TwoFactorEnabled,
    TwoFactorDisabled,
}

impl AuditAction {
    /// Catalog name stored in `action_types.name`
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::UserRegistered => "USER_REGISTERED",
            AuditAction::LoginSuccess => "LOGIN_SUCCESS",
            AuditAction::LoginFailed => "LOGIN_FAILED",
            AuditAction::LoginFailedLocked => "LOGIN_FAILED_LOCKED",
            AuditAction::LoginFailedUnverified => "LOGIN_FAILED_UNVERIFIED",
            AuditAction::VerifyAccountSuccess => "VERIFY_ACCOUNT_SUCCESS",
            AuditAction::VerifyAccountFailed => "VERIFY_ACCOUNT_FAILED",
            AuditAction::PasswordUpdated => "PASSWORD_UPDATED",
            AuditAction::PasswordUpdateFailed => "PASSWORD_UPDATE_FAILED",
            AuditAction::PasswordResetRequested => "PASSWORD_RESET_REQUESTED",
            AuditAction::PasswordResetCompleted => "PASSWORD_RESET_COMPLETED",
            AuditAction::PasswordResetFailed => "PASSWORD_RESET_FAILED",
            AuditAction::UserBlocked => "USER_BLOCKED",
            AuditAction::UserUnblocked => "USER_UNBLOCKED",
            AuditAction::TwoFactorEnabled => "TWO_FACTOR_ENABLED",
            AuditAction::TwoFactorDisabled => "TWO_FACTOR_DISABLED",
        }
    }

    /// Every action the recorder must find in the catalog at boot
    pub fn all() -> &'static [AuditAction] {
        &[
            AuditAction::UserRegistered,
            AuditAction::LoginSuccess,
            AuditAction::LoginFailed,
            AuditAction::LoginFailedLocked,
            AuditAction::LoginFailedUnverified,
            AuditAction::VerifyAccountSuccess,
            AuditAction::VerifyAccountFailed,
            AuditAction::PasswordUpdated,
            AuditAction::PasswordUpdateFailed,
            AuditAction::PasswordResetRequested,
            AuditAction::PasswordResetCompleted,
            AuditAction::PasswordResetFailed,
            AuditAction::UserBlocked,
            AuditAction::UserUnblocked,
            AuditAction::TwoFactorEnabled,
            AuditAction::TwoFactorDisabled,
        ]
    }
}

/// Outcome recorded with each audit event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditOutcome {
    Success,
    Failure,
}

impl AuditOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditOutcome::Success => "SUCCESS",
            AuditOutcome::Failure => "FAILURE",
        }
    }
}

/// A single audit event ready to be recorded
#[derive(Debug, Clone)]
pub struct NewAuditEvent {
    pub action: AuditAction,
    pub outcome: AuditOutcome,
    /// Account performing the action, when known
    pub account_id: Option<Uuid>,
    /// Account being acted upon, for admin operations
    pub target_account_id: Option<Uuid>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub details: Option<serde_json::Value>,
}

impl NewAuditEvent {
    pub fn new(action: AuditAction, outcome: AuditOutcome) -> Self {
        Self {
            action,
            outcome,
            account_id: None,
            target_account_id: None,
            ip_address: None,
            user_agent: None,
            details: None,
        }
    }

    pub fn actor(mut self, account_id: Uuid) -> Self {
        self.account_id = Some(account_id);
        self
    }

    pub fn target(mut self, account_id: Uuid) -> Self {
        self.target_account_id = Some(account_id);
        self
    }

    pub fn request_info(mut self, ip: Option<String>, user_agent: Option<String>) -> Self {
        self.ip_address = ip;
        self.user_agent = user_agent;
        self
    }

    pub fn details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}
