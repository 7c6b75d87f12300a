//! Runtime configuration
//!
//! Everything comes from the environment (optionally seeded from `.env`).
//! Missing collaborator credentials select the demo collaborators instead
//! of failing startup.

use crate::error::FinnyError;
use crate::Result;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::env;

const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_CASH: f64 = 25_000.0;

/// Credentials and URLs for the Lava forwarding proxy
#[derive(Debug, Clone)]
pub struct LavaConfig {
    pub api_key: String,
    pub connection_secret: String,
    pub product_secret: String,
    pub forward_url: String,
    pub chat_url: Option<String>,
}

impl LavaConfig {
    /// Bearer token: base64 of the three secrets as JSON
    pub fn token(&self) -> String {
        let payload = serde_json::json!({
            "secret_key": self.api_key,
            "connection_secret": self.connection_secret,
            "product_secret": self.product_secret,
        });
        STANDARD.encode(payload.to_string())
    }

    pub fn tts_url(&self) -> String {
        format!("{}https://api.openai.com/v1/audio/speech", self.forward_url)
    }

    pub fn chat_completion_url(&self) -> Option<String> {
        self.chat_url
            .as_ref()
            .map(|path| format!("{}{}", self.forward_url, path))
    }
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub api_url: String,
    pub token: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub lava: Option<LavaConfig>,
    pub mail: Option<MailConfig>,
    pub default_cash: f64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let port = match env::var("PORT").or_else(|_| env::var("API_PORT")) {
            Ok(raw) => raw
                .parse()
                .map_err(|_| FinnyError::ConfigError(format!("invalid port: {}", raw)))?,
            Err(_) => DEFAULT_PORT,
        };

        let default_cash = match env::var("FINNY_DEFAULT_CASH") {
            Ok(raw) => raw.parse().map_err(|_| {
                FinnyError::ConfigError(format!("invalid FINNY_DEFAULT_CASH: {}", raw))
            })?,
            Err(_) => DEFAULT_CASH,
        };

        Ok(Self {
            port,
            lava: lava_from_env(),
            mail: mail_from_env(),
            default_cash,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            lava: None,
            mail: None,
            default_cash: DEFAULT_CASH,
        }
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn lava_from_env() -> Option<LavaConfig> {
    Some(LavaConfig {
        api_key: non_empty("LAVA_API_KEY")?,
        connection_secret: non_empty("LAVA_SELF_CONNECTION_SECRET").unwrap_or_default(),
        product_secret: non_empty("LAVA_SELF_PRODUCT_SECRET").unwrap_or_default(),
        forward_url: non_empty("LAVA_FORWARD_URL").unwrap_or_default(),
        chat_url: non_empty("AI_CHAT_URL"),
    })
}

fn mail_from_env() -> Option<MailConfig> {
    Some(MailConfig {
        api_url: non_empty("GMAIL_API_URL")?.trim_end_matches('/').to_string(),
        token: non_empty("GMAIL_TOKEN")?,
    })
}
