//! Request and Response Models
//!
//! Data structures for API request and response payloads with validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::account::Account;
use crate::utils::validation::{
    email_validator, name_validator, national_id_validator, otp_code_validator, phone_validator,
};

/// Password strength validator: 8-128 characters with at least one letter
/// and one digit
pub fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    if password.len() < 8 || password.len() > 128 {
        return Err(ValidationError::new("password_length"));
    }
    let has_letter = password.chars().any(|c| c.is_alphabetic());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if !has_letter || !has_digit {
        return Err(ValidationError::new("password_strength"));
    }
    Ok(())
}

/// Request payload for registering a new account
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Holder's display name (1-255 characters)
    #[validate(custom(function = "name_validator"))]
    pub name: String,

    /// Email address (must be unique and valid format)
    #[validate(custom(function = "email_validator"))]
    pub email: String,

    /// Password (8-128 characters with at least a letter and a digit)
    #[validate(custom(function = "validate_password_strength"))]
    pub password: String,

    /// Requested role; must be open for self-registration
    #[validate(range(min = 1, message = "Invalid role"))]
    pub role_id: i32,

    /// Optional national identification number (unique when present)
    #[validate(custom(function = "national_id_validator"))]
    pub national_id: Option<String>,

    /// Optional phone number
    #[validate(custom(function = "phone_validator"))]
    pub phone: Option<String>,

    /// Optional mailing address stored on the client profile
    #[validate(length(max = 255, message = "Address is too long"))]
    pub address: Option<String>,
}

/// Request payload for login
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(custom(function = "email_validator"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password cannot be empty"))]
    pub password: String,
}

/// Request payload for account verification with a one-time code
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct VerifyAccountRequest {
    #[validate(custom(function = "email_validator"))]
    pub email: String,

    #[validate(custom(function = "otp_code_validator"))]
    pub code: String,
}

/// Request payload for completing a two-factor login
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TwoFactorVerifyRequest {
    #[validate(custom(function = "email_validator"))]
    pub email: String,

    #[validate(custom(function = "otp_code_validator"))]
    pub code: String,
}

/// Request payload for changing the password of the authenticated account
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Current password cannot be empty"))]
    pub current_password: String,

    #[validate(custom(function = "validate_password_strength"))]
    pub new_password: String,
}

/// Request payload for starting a password reset
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PasswordResetRequest {
    #[validate(custom(function = "email_validator"))]
    pub email: String,
}

/// Request payload for completing a password reset with a one-time code
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PasswordResetConfirmRequest {
    #[validate(custom(function = "email_validator"))]
    pub email: String,

    #[validate(custom(function = "otp_code_validator"))]
    pub code: String,

    #[validate(custom(function = "validate_password_strength"))]
    pub new_password: String,
}

/// Request payload for blocking or unblocking an account (admin)
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SetAccountStateRequest {
    /// Desired state: `true` unblocks, `false` blocks
    pub active: bool,

    /// Optional reason recorded with the audit event
    #[validate(length(max = 512, message = "Reason is too long"))]
    pub reason: Option<String>,
}

/// Request payload for enabling or disabling the second login factor
#[derive(Debug, Clone, Deserialize)]
pub struct TwoFactorToggleRequest {
    pub enabled: bool,
}

/// Response for account registration
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
}

/// Response for login and two-factor completion.
///
/// When a second factor is pending, `account` and `access_token` are absent
/// and `two_factor_required` is set.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// The authenticated account, present once access is granted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<Account>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    /// Token type, always "Bearer" when a token is present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,

    /// Token lifetime in seconds when a token is present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,

    pub two_factor_required: bool,
}

impl LoginResponse {
    pub fn with_token(account: Account, access_token: String, expires_in: i64) -> Self {
        Self {
            account: Some(account),
            access_token: Some(access_token),
            token_type: Some("Bearer".to_string()),
            expires_in: Some(expires_in),
            two_factor_required: false,
        }
    }

    pub fn two_factor_pending() -> Self {
        Self {
            account: None,
            access_token: None,
            token_type: None,
            expires_in: None,
            two_factor_required: true,
        }
    }
}

/// Response for admin block/unblock operations
#[derive(Debug, Serialize)]
pub struct SetAccountStateResponse {
    pub account: Account,

    /// Whether the operation actually flipped the state
    pub changed: bool,
}

/// Generic acknowledgement response
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

/// Response for health check
#[derive(Debug, Serialize)]
pub struct HealthCheckResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

/// Request metadata captured for audit purposes
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_strength() {
        assert!(validate_password_strength("secret123").is_ok());
        assert!(validate_password_strength("short1").is_err());
        assert!(validate_password_strength("allletters").is_err());
        assert!(validate_password_strength("12345678").is_err());
    }

    #[test]
    fn test_register_request_validation() {
        let request = RegisterRequest {
            name: "Ana Díaz".to_string(),
            email: "ana@example.com".to_string(),
            password: "secret123".to_string(),
            role_id: 2,
            national_id: Some("1712345678".to_string()),
            phone: Some("+593987654321".to_string()),
            address: None,
        };
        assert!(request.validate().is_ok());

        let bad_email = RegisterRequest {
            email: "not-an-email".to_string(),
            ..request.clone()
        };
        assert!(bad_email.validate().is_err());

        let bad_national_id = RegisterRequest {
            national_id: Some("12AB".to_string()),
            ..request.clone()
        };
        assert!(bad_national_id.validate().is_err());

        // The national id is optional
        let without_national_id = RegisterRequest {
            national_id: None,
            ..request
        };
        assert!(without_national_id.validate().is_ok());
    }

    #[test]
    fn test_login_response_shapes() {
        let pending = LoginResponse::two_factor_pending();
        assert!(pending.account.is_none());
        assert!(pending.access_token.is_none());
        assert!(pending.two_factor_required);

        let account = Account {
            id: Uuid::new_v4(),
            name: "Ana Díaz".to_string(),
            email: "ana@example.com".to_string(),
            role_id: 2,
            phone: None,
            national_id: Some("1712345678".to_string()),
            active: true,
            verified: true,
            two_factor_enabled: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let granted = LoginResponse::with_token(account, "token".to_string(), 7200);
        assert!(granted.account.is_some());
        assert_eq!(granted.token_type.as_deref(), Some("Bearer"));
        assert!(!granted.two_factor_required);
    }
}
