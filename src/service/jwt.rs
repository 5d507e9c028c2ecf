//! JWT Authentication Service
//!
//! Access token issuance and validation. Tokens are short-lived HS256 JWTs
//! carrying the account's role, so authorization checks need no database
//! round trip.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;
use uuid::Uuid;

use crate::models::account::Account;
use crate::models::auth::{AuthContext, Claims};
use crate::utils::error::AppError;

/// Errors produced by token operations
#[derive(Error, Debug)]
pub enum JwtError {
    #[error("Token generation failed: {0}")]
    Generation(String),

    #[error("Invalid token: {0}")]
    Invalid(String),
}

impl From<JwtError> for AppError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Generation(msg) => AppError::Internal(msg),
            JwtError::Invalid(msg) => AppError::Authentication(msg),
        }
    }
}

/// JWT service for access token management
#[derive(Clone)]
pub struct JwtService {
    secret: String,
    expires_in: Duration,
}

impl JwtService {
    /// Create a new JWT service with the given signing secret and token
    /// lifetime in hours
    pub fn new(secret: String, expires_hours: i64) -> Self {
        Self {
            secret,
            expires_in: Duration::hours(expires_hours),
        }
    }

    /// Token lifetime in seconds, reported to clients alongside the token
    pub fn expires_in_seconds(&self) -> i64 {
        self.expires_in.num_seconds()
    }

    /// Issue an access token for the given account
    pub fn issue_token(&self, account: &Account, role_name: &str) -> Result<String, JwtError> {
        let now = Utc::now();
        let claims = Claims {
            sub: account.id,
            email: account.email.clone(),
            role_id: account.role_id,
            role_name: role_name.to_string(),
            iat: now.timestamp(),
            exp: (now + self.expires_in).timestamp(),
            jti: Uuid::new_v4(),
        };

        let header = Header::new(Algorithm::HS256);
        let encoding_key = EncodingKey::from_secret(self.secret.as_ref());

        encode(&header, &claims, &encoding_key).map_err(|e| JwtError::Generation(e.to_string()))
    }

    /// Validate a token and extract the authenticated identity
    pub fn validate_token(&self, token: &str) -> Result<AuthContext, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.validate_aud = false;

        let decoding_key = DecodingKey::from_secret(self.secret.as_ref());

        decode::<Claims>(token, &decoding_key, &validation)
            .map(|data| data.claims.into())
            .map_err(|e| JwtError::Invalid(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_service() -> JwtService {
        JwtService::new("test_signing_secret_for_unit_tests".to_string(), 2)
    }

    fn test_account() -> Account {
        Account {
            id: Uuid::new_v4(),
            name: "Test Holder".to_string(),
            email: "holder@example.com".to_string(),
            role_id: 2,
            phone: None,
            national_id: Some("1712345678".to_string()),
            active: true,
            verified: true,
            two_factor_enabled: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_issue_and_validate_round_trip() {
        let service = test_service();
        let account = test_account();

        let token = service.issue_token(&account, "Cliente").unwrap();
        let context = service.validate_token(&token).unwrap();

        assert_eq!(context.account_id, account.id);
        assert_eq!(context.email, account.email);
        assert_eq!(context.role_name, "Cliente");
        assert!(!context.is_admin());
    }

    #[test]
    fn test_rejects_token_from_other_secret() {
        let account = test_account();
        let other = JwtService::new("a_completely_different_secret_value".to_string(), 2);
        let token = other.issue_token(&account, "Cliente").unwrap();

        assert!(test_service().validate_token(&token).is_err());
    }

    #[test]
    fn test_rejects_garbage_token() {
        assert!(test_service().validate_token("not.a.token").is_err());
    }

    #[test]
    fn test_rejects_expired_token() {
        let account = test_account();
        let service = JwtService {
            secret: "test_signing_secret_for_unit_tests".to_string(),
            expires_in: Duration::seconds(-120),
        };
        let token = service.issue_token(&account, "Cliente").unwrap();

        assert!(test_service().validate_token(&token).is_err());
    }

    #[test]
    fn test_expires_in_seconds() {
        assert_eq!(test_service().expires_in_seconds(), 7200);
    }
}
