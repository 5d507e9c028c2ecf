//! SMS Service
//!
//! Text-message delivery through a Twilio-compatible REST gateway. SMS is an
//! optional channel; when no gateway is configured the service is simply not
//! constructed.

use std::time::Duration;

use log::{error, info};
use serde::Deserialize;

use crate::config::SmsConfig;
use crate::utils::error::{AppError, AppResult};

#[derive(Debug, Deserialize)]
struct SendMessageResponse {
    sid: String,
}

/// Outbound SMS delivery
pub struct SmsService {
    client: reqwest::Client,
    config: SmsConfig,
}

impl SmsService {
    pub fn new(config: SmsConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Send a text message to the given phone number
    pub async fn send_message(&self, to: &str, body: &str) -> AppResult<()> {
        let url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.config.api_base_url, self.config.account_sid
        );

        let params = [
            ("To", to),
            ("From", self.config.from_number.as_str()),
            ("Body", body),
        ];

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&params)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("SMS gateway request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("SMS gateway returned {} for {}: {}", status, to, body);
            return Err(AppError::ExternalService(format!(
                "SMS gateway returned {}",
                status
            )));
        }

        let sent: SendMessageResponse = response
            .json()
            .await
            .map_err(|e| AppError::ExternalService(format!("Invalid SMS gateway response: {}", e)))?;

        info!("SMS {} queued for {}", sent.sid, to);
        Ok(())
    }

    /// Send a one-time code over SMS
    pub async fn send_code(&self, to: &str, code: &str, expires_in_minutes: i64) -> AppResult<()> {
        let body = format!(
            "Your verification code is {}. It expires in {} minutes.",
            code, expires_in_minutes
        );
        self.send_message(to, &body).await
    }
}
