//! Mail API client
//!
//! Posts messages as JSON to `{GMAIL_API_URL}/send` with a bearer token.

use super::EmailSender;
use crate::config::MailConfig;
use crate::error::FinnyError;
use crate::models::EmailMessage;
use crate::Result;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

pub struct HttpMailer {
    client: Client,
    config: MailConfig,
}

impl HttpMailer {
    pub fn new(config: MailConfig) -> Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(60))
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self { client, config })
    }

    fn send_url(&self) -> String {
        format!("{}/send", self.config.api_url)
    }
}

#[async_trait]
impl EmailSender for HttpMailer {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn send(&self, message: &EmailMessage) -> Result<()> {
        debug!(to = %message.to, "Posting email to mail API");

        let response = self
            .client
            .post(self.send_url())
            .bearer_auth(&self.config.token)
            .json(message)
            .send()
            .await
            .map_err(|e| FinnyError::EmailError(format!("Mail API request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FinnyError::EmailError(format!(
                "Mail API returned {}: {}",
                status, body
            )));
        }

        Ok(())
    }
}
