//! Citizen Registry Models
//!
//! Cached rows and API payloads for the external citizen registry lookup.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A cached citizen registry record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CitizenRecord {
    /// National identification number
    pub national_id: String,

    /// Identification kind reported by the registry (e.g. CEDULA)
    pub id_kind: String,

    /// Full legal name
    pub full_name: String,

    /// Given names component
    pub given_names: Option<String>,

    /// Surnames component
    pub surnames: Option<String>,

    /// Date of death when the registry reports the person deceased
    pub deceased_at: Option<DateTime<Utc>>,

    /// When this record was fetched from the upstream registry
    pub fetched_at: DateTime<Utc>,
}

impl CitizenRecord {
    /// Whether the registry reports this person as deceased
    pub fn is_deceased(&self) -> bool {
        self.deceased_at.is_some()
    }
}

/// Response payload for citizen lookups
#[derive(Debug, Clone, Serialize)]
pub struct CitizenLookupResponse {
    pub national_id: String,
    pub id_kind: String,
    pub full_name: String,
    pub given_names: Option<String>,
    pub surnames: Option<String>,
    pub deceased: bool,
}

impl From<CitizenRecord> for CitizenLookupResponse {
    fn from(record: CitizenRecord) -> Self {
        let deceased = record.is_deceased();
        CitizenLookupResponse {
            national_id: record.national_id,
            id_kind: record.id_kind,
            full_name: record.full_name,
            given_names: record.given_names,
            surnames: record.surnames,
            deceased,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_response_flags_deceased() {
        let record = CitizenRecord {
            national_id: "1712345678".to_string(),
            id_kind: "CEDULA".to_string(),
            full_name: "Juan Pérez".to_string(),
            given_names: Some("Juan".to_string()),
            surnames: Some("Pérez".to_string()),
            deceased_at: Some(Utc::now()),
            fetched_at: Utc::now(),
        };

        let response: CitizenLookupResponse = record.into();
        assert!(response.deceased);
    }
}
