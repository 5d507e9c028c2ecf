//! Citizen Registry Service
//!
//! Looks up citizen records by national id through two cache tiers: an
//! in-memory cache for hot entries and the `citizen_records` table for
//! everything fetched before. Only a miss on both reaches the external
//! registry API, which is authenticated with a client-credentials token
//! that is itself cached until shortly before it expires.

use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use moka::future::Cache;
use serde::Deserialize;
use sqlx::PgPool;
use thiserror::Error;

use crate::config::CitizenApiConfig;
use crate::models::citizen::CitizenRecord;
use crate::utils::error::AppError;

/// Hot-entry cache lifetime
const MEMORY_CACHE_TTL_SECS: u64 = 3600;

/// Token cache lifetime, kept under the usual one-hour token expiry
const TOKEN_CACHE_TTL_SECS: u64 = 3480;

#[derive(Error, Debug)]
pub enum CitizenError {
    /// The registry has no record for this national id
    #[error("No citizen record for the given national id")]
    NotFound,

    #[error("Citizen registry unavailable: {0}")]
    Upstream(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<CitizenError> for AppError {
    fn from(err: CitizenError) -> Self {
        match err {
            CitizenError::NotFound => {
                AppError::NotFound("No citizen record for the given national id".to_string())
            }
            CitizenError::Upstream(msg) => AppError::ExternalService(msg),
            CitizenError::Database(e) => AppError::Database(e),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Wire format of the upstream registry
#[derive(Debug, Deserialize)]
struct ApiCitizen {
    #[serde(rename = "tipoIdentificacion")]
    id_kind: String,
    #[serde(rename = "nombreCompleto")]
    full_name: String,
    #[serde(rename = "nombres")]
    given_names: Option<String>,
    #[serde(rename = "apellidos")]
    surnames: Option<String>,
    #[serde(rename = "fechaDefuncion")]
    deceased_date: Option<String>,
}

/// Cached citizen registry lookups
pub struct CitizenService {
    pool: PgPool,
    client: reqwest::Client,
    config: CitizenApiConfig,
    records: Cache<String, CitizenRecord>,
    token: Cache<&'static str, String>,
}

impl CitizenService {
    pub fn new(pool: PgPool, config: CitizenApiConfig) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            pool,
            client,
            config,
            records: Cache::builder()
                .max_capacity(10_000)
                .time_to_live(Duration::from_secs(MEMORY_CACHE_TTL_SECS))
                .build(),
            token: Cache::builder()
                .max_capacity(1)
                .time_to_live(Duration::from_secs(TOKEN_CACHE_TTL_SECS))
                .build(),
        })
    }

    /// Look up a citizen record, hitting the registry only on a full miss
    pub async fn lookup(&self, national_id: &str) -> Result<CitizenRecord, CitizenError> {
        if let Some(record) = self.records.get(national_id).await {
            log::debug!("Citizen lookup served from memory");
            return Ok(record);
        }

        if let Some(record) = self.fetch_from_db(national_id).await? {
            self.records
                .insert(national_id.to_string(), record.clone())
                .await;
            log::debug!("Citizen lookup served from database");
            return Ok(record);
        }

        let record = self.fetch_from_api(national_id).await?;
        self.store(&record).await?;
        self.records
            .insert(national_id.to_string(), record.clone())
            .await;

        Ok(record)
    }

    async fn fetch_from_db(&self, national_id: &str) -> Result<Option<CitizenRecord>, sqlx::Error> {
        sqlx::query_as(
            "SELECT national_id, id_kind, full_name, given_names, surnames, deceased_at, fetched_at
             FROM citizen_records
             WHERE national_id = $1",
        )
        .bind(national_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn store(&self, record: &CitizenRecord) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO citizen_records
                 (national_id, id_kind, full_name, given_names, surnames, deceased_at, fetched_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             ON CONFLICT ON CONSTRAINT citizen_records_identity_key
             DO UPDATE SET full_name = EXCLUDED.full_name,
                           given_names = EXCLUDED.given_names,
                           surnames = EXCLUDED.surnames,
                           deceased_at = EXCLUDED.deceased_at,
                           fetched_at = EXCLUDED.fetched_at",
        )
        .bind(&record.national_id)
        .bind(&record.id_kind)
        .bind(&record.full_name)
        .bind(&record.given_names)
        .bind(&record.surnames)
        .bind(record.deceased_at)
        .bind(record.fetched_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn fetch_from_api(&self, national_id: &str) -> Result<CitizenRecord, CitizenError> {
        let token = self.access_token().await?;

        let url = format!("{}/{}", self.config.api_url.trim_end_matches('/'), national_id);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&token)
            .header("Ocp-Apim-Subscription-Key", &self.config.subscription_key)
            .send()
            .await
            .map_err(|e| CitizenError::Upstream(format!("registry request failed: {}", e)))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(CitizenError::NotFound);
        }
        if !response.status().is_success() {
            return Err(CitizenError::Upstream(format!(
                "registry returned {}",
                response.status()
            )));
        }

        let payload: ApiCitizen = response
            .json()
            .await
            .map_err(|e| CitizenError::Upstream(format!("invalid registry response: {}", e)))?;

        Ok(CitizenRecord {
            national_id: national_id.to_string(),
            id_kind: payload.id_kind,
            full_name: payload.full_name,
            given_names: payload.given_names,
            surnames: payload.surnames,
            deceased_at: payload.deceased_date.as_deref().and_then(parse_registry_date),
            fetched_at: Utc::now(),
        })
    }

    /// Get a client-credentials token, reusing the cached one when fresh
    async fn access_token(&self) -> Result<String, CitizenError> {
        if let Some(token) = self.token.get("access_token").await {
            return Ok(token);
        }

        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("scope", self.config.scope.as_str()),
        ];

        let response = self
            .client
            .post(&self.config.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| CitizenError::Upstream(format!("token request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(CitizenError::Upstream(format!(
                "token endpoint returned {}",
                response.status()
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| CitizenError::Upstream(format!("invalid token response: {}", e)))?;

        self.token
            .insert("access_token", token.access_token.clone())
            .await;

        Ok(token.access_token)
    }
}

/// Registry dates arrive as YYYY-MM-DD; unparseable values are dropped
fn parse_registry_date(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}
