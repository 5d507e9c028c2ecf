//! Configuration Module
//!
//! Process configuration loaded from environment variables at startup, plus
//! the database-backed system-parameter cache for runtime tunables.

pub mod parameters;

pub use parameters::SystemParameters;

/// Environment variable helpers
pub mod env {
    use std::env;

    /// Get environment variable as string with default
    pub fn get_string(key: &str, default: &str) -> String {
        env::var(key).unwrap_or_else(|_| default.to_string())
    }

    /// Get environment variable as boolean with default
    pub fn get_bool(key: &str, default: bool) -> bool {
        env::var(key)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Get environment variable as u16 with default
    pub fn get_u16(key: &str, default: u16) -> u16 {
        env::var(key)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Get environment variable as u32 with default
    pub fn get_u32(key: &str, default: u32) -> u32 {
        env::var(key)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Get environment variable as u64 with default
    pub fn get_u64(key: &str, default: u64) -> u64 {
        env::var(key)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Get environment variable as i64 with default
    pub fn get_i64(key: &str, default: i64) -> i64 {
        env::var(key)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Check if environment variable is set
    pub fn is_set(key: &str) -> bool {
        env::var(key).is_ok()
    }

    /// Get an optional environment variable
    pub fn get_optional(key: &str) -> Option<String> {
        env::var(key).ok().filter(|v| !v.is_empty())
    }
}

/// Application configuration combining all service configurations
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Deployment environment (`development` or `production`); selects
    /// which system-parameter column is read
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseSettings,

    /// JWT configuration
    pub jwt: JwtConfig,

    /// Email (SMTP) configuration
    pub email: EmailConfig,

    /// SMS gateway configuration, absent when credentials are not set
    pub sms: Option<SmsConfig>,

    /// Citizen registry API configuration, absent when not set
    pub citizen_api: Option<CitizenApiConfig>,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_seconds: u64,
    pub idle_timeout_seconds: u64,
    pub max_lifetime_seconds: u64,
}

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expires_hours: i64,
}

/// Email (SMTP) configuration
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub from_email: String,
    pub from_name: String,
}

/// SMS gateway configuration (Twilio-compatible REST API)
#[derive(Debug, Clone)]
pub struct SmsConfig {
    pub account_sid: String,
    pub auth_token: String,
    pub from_number: String,
    pub api_base_url: String,
}

/// Citizen registry API configuration
#[derive(Debug, Clone)]
pub struct CitizenApiConfig {
    pub token_url: String,
    pub api_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub scope: String,
    pub subscription_key: String,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        let environment = env::get_string("APP_ENV", "development");

        let server = ServerConfig {
            host: env::get_string("SERVER_HOST", "0.0.0.0"),
            port: env::get_u16("SERVER_PORT", 3000),
        };

        let database = DatabaseSettings {
            url: std::env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?,
            max_connections: env::get_u32("DB_MAX_CONNECTIONS", 20),
            min_connections: env::get_u32("DB_MIN_CONNECTIONS", 1),
            connect_timeout_seconds: env::get_u64("DB_CONNECT_TIMEOUT", 30),
            idle_timeout_seconds: env::get_u64("DB_IDLE_TIMEOUT", 600),
            max_lifetime_seconds: env::get_u64("DB_MAX_LIFETIME", 3600),
        };

        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")
                .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable is required"))?,
            expires_hours: env::get_i64("JWT_EXPIRES_HOURS", 2),
        };

        let email = EmailConfig {
            smtp_host: env::get_string("SMTP_HOST", "localhost"),
            smtp_port: env::get_u16("SMTP_PORT", 587),
            smtp_username: std::env::var("SMTP_USERNAME")
                .map_err(|_| anyhow::anyhow!("SMTP_USERNAME environment variable is required"))?,
            smtp_password: std::env::var("SMTP_PASSWORD")
                .map_err(|_| anyhow::anyhow!("SMTP_PASSWORD environment variable is required"))?,
            from_email: std::env::var("FROM_EMAIL")
                .map_err(|_| anyhow::anyhow!("FROM_EMAIL environment variable is required"))?,
            from_name: env::get_string("FROM_NAME", "Account Service"),
        };

        let sms = match (
            env::get_optional("TWILIO_ACCOUNT_SID"),
            env::get_optional("TWILIO_AUTH_TOKEN"),
            env::get_optional("TWILIO_PHONE_NUMBER"),
        ) {
            (Some(account_sid), Some(auth_token), Some(from_number)) => Some(SmsConfig {
                account_sid,
                auth_token,
                from_number,
                api_base_url: env::get_string("TWILIO_API_URL", "https://api.twilio.com"),
            }),
            _ => None,
        };

        let citizen_api = match (
            env::get_optional("CITIZEN_TOKEN_URL"),
            env::get_optional("CITIZEN_API_URL"),
            env::get_optional("CITIZEN_CLIENT_ID"),
            env::get_optional("CITIZEN_CLIENT_SECRET"),
        ) {
            (Some(token_url), Some(api_url), Some(client_id), Some(client_secret)) => {
                Some(CitizenApiConfig {
                    token_url,
                    api_url,
                    client_id,
                    client_secret,
                    scope: env::get_string("CITIZEN_SCOPE", ""),
                    subscription_key: env::get_string("CITIZEN_API_KEY", ""),
                })
            }
            _ => None,
        };

        Ok(Self {
            environment,
            server,
            database,
            jwt,
            email,
            sms,
            citizen_api,
        })
    }

    /// Sanity-check the loaded configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.jwt.secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters");
        }
        if self.jwt.expires_hours <= 0 {
            anyhow::bail!("JWT_EXPIRES_HOURS must be positive");
        }
        if self.database.max_connections == 0 {
            anyhow::bail!("DB_MAX_CONNECTIONS must be positive");
        }
        Ok(())
    }

    /// Whether this is a production deployment
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AppConfig {
        AppConfig {
            environment: "development".to_string(),
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
            },
            database: DatabaseSettings {
                url: "postgresql://localhost/accounts".to_string(),
                max_connections: 20,
                min_connections: 1,
                connect_timeout_seconds: 30,
                idle_timeout_seconds: 600,
                max_lifetime_seconds: 3600,
            },
            jwt: JwtConfig {
                secret: "0123456789abcdef0123456789abcdef".to_string(),
                expires_hours: 2,
            },
            email: EmailConfig {
                smtp_host: "localhost".to_string(),
                smtp_port: 587,
                smtp_username: "user".to_string(),
                smtp_password: "pass".to_string(),
                from_email: "noreply@example.com".to_string(),
                from_name: "Account Service".to_string(),
            },
            sms: None,
            citizen_api: None,
        }
    }

    #[test]
    fn test_validate_accepts_sane_config() {
        assert!(test_config().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_short_jwt_secret() {
        let mut config = test_config();
        config.jwt.secret = "short".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_nonpositive_expiry() {
        let mut config = test_config();
        config.jwt.expires_hours = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_is_production() {
        let mut config = test_config();
        assert!(!config.is_production());
        config.environment = "production".to_string();
        assert!(config.is_production());
    }
}
