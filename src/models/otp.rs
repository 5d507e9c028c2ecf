//! One-Time Code Models
//!
//! Challenge rows and the purpose catalog for one-time codes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Purposes a one-time code can be issued for.
///
/// Purpose names double as the `otp_purposes.name` catalog values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OtpPurpose {
    /// Initial account verification after registration
    AccountVerification,
    /// Second factor during login
    LoginTwoFactor,
    /// Password reset confirmation
    PasswordReset,
}

impl OtpPurpose {
    /// Catalog name stored in `otp_purposes.name`
    pub fn as_str(&self) -> &'static str {
        match self {
            OtpPurpose::AccountVerification => "VERIFICACION_CUENTA",
            OtpPurpose::LoginTwoFactor => "LOGIN_2FA",
            OtpPurpose::PasswordReset => "PASSWORD_RESET",
        }
    }

    /// Human-readable description for catalog seeding
    pub fn description(&self) -> &'static str {
        match self {
            OtpPurpose::AccountVerification => "Account verification after registration",
            OtpPurpose::LoginTwoFactor => "Second factor code during login",
            OtpPurpose::PasswordReset => "Password reset confirmation",
        }
    }
}

/// A one-time code challenge row
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OtpChallenge {
    pub id: Uuid,
    pub account_id: Uuid,
    pub purpose_id: i32,
    pub code: String,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
    pub attempts: i32,
    pub created_at: DateTime<Utc>,
}

impl OtpChallenge {
    /// Whether the challenge window has passed
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_purpose_catalog_names() {
        assert_eq!(
            OtpPurpose::AccountVerification.as_str(),
            "VERIFICACION_CUENTA"
        );
        assert_eq!(OtpPurpose::LoginTwoFactor.as_str(), "LOGIN_2FA");
        assert_eq!(OtpPurpose::PasswordReset.as_str(), "PASSWORD_RESET");
    }

    #[test]
    fn test_challenge_expiry() {
        let mut challenge = OtpChallenge {
            id: Uuid::new_v4(),
            account_id: Uuid::new_v4(),
            purpose_id: 1,
            code: "123456".to_string(),
            expires_at: Utc::now() + chrono::Duration::minutes(15),
            used: false,
            attempts: 0,
            created_at: Utc::now(),
        };
        assert!(!challenge.is_expired());

        challenge.expires_at = Utc::now() - chrono::Duration::seconds(1);
        assert!(challenge.is_expired());
    }
}
