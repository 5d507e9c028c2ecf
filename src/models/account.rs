//! Account Model
//!
//! Core account data structures and type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role names seeded by the catalog migration
pub const ROLE_ADMIN: &str = "Administrador";
pub const ROLE_CLIENT: &str = "Cliente";
pub const ROLE_COLLABORATOR: &str = "Colaborador";

/// Account representation for external API responses
///
/// This struct represents an account without sensitive information like the
/// password hash. All datetime fields use UTC.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Account {
    /// Unique identifier for the account
    pub id: Uuid,

    /// Holder's display name
    pub name: String,

    /// Account email address (unique, normalized)
    pub email: String,

    /// Role identifier
    pub role_id: i32,

    /// Optional phone number in E.164-ish form
    pub phone: Option<String>,

    /// National identification number (unique when present)
    pub national_id: Option<String>,

    /// Whether the account is usable; blocked accounts have this unset
    pub active: bool,

    /// Whether the account completed one-time-code verification
    pub verified: bool,

    /// Whether login requires a second factor
    pub two_factor_enabled: bool,

    /// Timestamp when the account was created
    pub created_at: DateTime<Utc>,

    /// Timestamp when the account was last modified
    pub updated_at: DateTime<Utc>,
}

/// Internal account representation including the password hash
///
/// Used for database operations that need the stored hash. Never exposed in
/// API responses.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct AccountWithPassword {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role_id: i32,
    pub phone: Option<String>,
    pub national_id: Option<String>,
    pub active: bool,
    pub verified: bool,
    pub two_factor_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<AccountWithPassword> for Account {
    /// Strip the password hash for external consumption
    fn from(row: AccountWithPassword) -> Self {
        Account {
            id: row.id,
            name: row.name,
            email: row.email,
            role_id: row.role_id,
            phone: row.phone,
            national_id: row.national_id,
            active: row.active,
            verified: row.verified,
            two_factor_enabled: row.two_factor_enabled,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Role catalog row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Role {
    pub id: i32,
    pub name: String,
    pub active: bool,
    pub visible_at_registration: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_conversion_drops_hash() {
        let row = AccountWithPassword {
            id: Uuid::new_v4(),
            name: "Test Holder".to_string(),
            email: "holder@example.com".to_string(),
            password_hash: "$2b$10$abcdefghijklmnopqrstuv".to_string(),
            role_id: 2,
            phone: Some("+593987654321".to_string()),
            national_id: Some("1712345678".to_string()),
            active: true,
            verified: false,
            two_factor_enabled: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let account: Account = row.into();

        assert_eq!(account.name, "Test Holder");
        assert_eq!(account.email, "holder@example.com");
        assert_eq!(account.national_id, Some("1712345678".to_string()));
        assert!(!account.verified);
    }
}
