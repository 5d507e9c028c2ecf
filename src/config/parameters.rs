//! System Parameters
//!
//! Runtime tunables stored in the `system_parameters` table. Each parameter
//! carries a development and a production value; the deployment environment
//! decides which column is read. The whole table is loaded once at boot and
//! served from memory afterwards.

use std::collections::HashMap;

use sqlx::PgPool;

/// Parameter names used by the account service
pub const PARAM_OTP_EXPIRATION_MINUTES: &str = "OTP_EXPIRATION_MINUTES";
pub const PARAM_OTP_LENGTH: &str = "OTP_LENGTH";
pub const PARAM_OTP_MAX_ATTEMPTS: &str = "OTP_MAX_ATTEMPTS";

#[derive(Debug, sqlx::FromRow)]
struct ParameterRow {
    name: String,
    dev_value: String,
    prod_value: String,
}

/// In-memory snapshot of the active system parameters
#[derive(Debug, Clone, Default)]
pub struct SystemParameters {
    values: HashMap<String, String>,
}

impl SystemParameters {
    /// Load all active parameters from the database, picking the value
    /// column matching the deployment environment.
    pub async fn load(pool: &PgPool, environment: &str) -> Result<Self, sqlx::Error> {
        let rows: Vec<ParameterRow> = sqlx::query_as(
            "SELECT name, dev_value, prod_value FROM system_parameters WHERE active = TRUE",
        )
        .fetch_all(pool)
        .await?;

        let production = environment == "production";
        let values = rows
            .into_iter()
            .map(|row| {
                let value = if production {
                    row.prod_value
                } else {
                    row.dev_value
                };
                (row.name, value)
            })
            .collect();

        log::info!("Loaded system parameters for {} environment", environment);

        Ok(Self { values })
    }

    /// Build a parameter set from explicit values
    pub fn from_values(values: HashMap<String, String>) -> Self {
        Self { values }
    }

    /// Get a raw string parameter, falling back to the given default
    pub fn get_str<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.values.get(name).map(String::as_str).unwrap_or(default)
    }

    /// Get an integer parameter, falling back to the default when the
    /// parameter is absent or not a number
    pub fn get_i64(&self, name: &str, default: i64) -> i64 {
        self.values
            .get(name)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Minutes before a freshly issued one-time code expires
    pub fn otp_expiration_minutes(&self) -> i64 {
        self.get_i64(PARAM_OTP_EXPIRATION_MINUTES, 15)
    }

    /// Digits in a generated one-time code
    pub fn otp_length(&self) -> usize {
        self.get_i64(PARAM_OTP_LENGTH, 6).clamp(4, 8) as usize
    }

    /// Wrong-code submissions allowed before a challenge is voided
    pub fn otp_max_attempts(&self) -> i32 {
        self.get_i64(PARAM_OTP_MAX_ATTEMPTS, 5) as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(entries: &[(&str, &str)]) -> SystemParameters {
        SystemParameters::from_values(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_defaults_when_empty() {
        let params = SystemParameters::default();
        assert_eq!(params.otp_expiration_minutes(), 15);
        assert_eq!(params.otp_length(), 6);
        assert_eq!(params.otp_max_attempts(), 5);
    }

    #[test]
    fn test_configured_values_win() {
        let params = params(&[
            (PARAM_OTP_EXPIRATION_MINUTES, "30"),
            (PARAM_OTP_LENGTH, "8"),
            (PARAM_OTP_MAX_ATTEMPTS, "3"),
        ]);
        assert_eq!(params.otp_expiration_minutes(), 30);
        assert_eq!(params.otp_length(), 8);
        assert_eq!(params.otp_max_attempts(), 3);
    }

    #[test]
    fn test_unparseable_value_falls_back() {
        let params = params(&[(PARAM_OTP_EXPIRATION_MINUTES, "soon")]);
        assert_eq!(params.otp_expiration_minutes(), 15);
    }

    #[test]
    fn test_otp_length_is_clamped() {
        assert_eq!(params(&[(PARAM_OTP_LENGTH, "2")]).otp_length(), 4);
        assert_eq!(params(&[(PARAM_OTP_LENGTH, "20")]).otp_length(), 8);
    }

    #[test]
    fn test_get_str() {
        let params = params(&[("GREETING", "hola")]);
        assert_eq!(params.get_str("GREETING", "hi"), "hola");
        assert_eq!(params.get_str("MISSING", "hi"), "hi");
    }

    #[sqlx::test]
    async fn test_load_picks_environment_column(pool: PgPool) -> sqlx::Result<()> {
        sqlx::query(
            "INSERT INTO system_parameters (name, dev_value, prod_value, active)
             VALUES ('SAMPLE', 'dev', 'prod', TRUE)",
        )
        .execute(&pool)
        .await?;

        let dev = SystemParameters::load(&pool, "development").await?;
        assert_eq!(dev.get_str("SAMPLE", ""), "dev");

        let prod = SystemParameters::load(&pool, "production").await?;
        assert_eq!(prod.get_str("SAMPLE", ""), "prod");

        Ok(())
    }

    #[sqlx::test]
    async fn test_load_skips_inactive_parameters(pool: PgPool) -> sqlx::Result<()> {
        sqlx::query(
            "INSERT INTO system_parameters (name, dev_value, prod_value, active)
             VALUES ('RETIRED', '1', '1', FALSE)",
        )
        .execute(&pool)
        .await?;

        let params = SystemParameters::load(&pool, "development").await?;
        assert_eq!(params.get_i64("RETIRED", 0), 0);

        Ok(())
    }
}
