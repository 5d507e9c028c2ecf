//! Authentication Models
//!
//! JWT claims and the per-request authenticated identity.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Claims carried in an access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Account id (subject)
    pub sub: Uuid,

    /// Account email at issue time
    pub email: String,

    /// Role identifier
    pub role_id: i32,

    /// Role name, used for authorization checks
    pub role_name: String,

    /// Issued-at (unix seconds)
    pub iat: i64,

    /// Expiration (unix seconds)
    pub exp: i64,

    /// Token id
    pub jti: Uuid,
}

/// Authenticated identity attached to a request after token validation
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub account_id: Uuid,
    pub email: String,
    pub role_id: i32,
    pub role_name: String,
}

impl From<Claims> for AuthContext {
    fn from(claims: Claims) -> Self {
        AuthContext {
            account_id: claims.sub,
            email: claims.email,
            role_id: claims.role_id,
            role_name: claims.role_name,
        }
    }
}

impl AuthContext {
    /// Whether this identity holds the administrator role
    pub fn is_admin(&self) -> bool {
        self.role_name == crate::models::account::ROLE_ADMIN
    }
}
