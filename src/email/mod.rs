//! Outbound email collaborators
//!
//! Delivery is a best-effort side effect: callers go through
//! [`notify_best_effort`], which reports what happened but never fails.

use crate::models::EmailMessage;
use crate::Result;
use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};

pub mod http;
pub use http::HttpMailer;

pub const DEFAULT_FROM: &str = "finny@finny.ai";
const LOG_PREVIEW_CHARS: usize = 50;

/// Email dispatch collaborator
#[async_trait]
pub trait EmailSender: Send + Sync {
    fn name(&self) -> &'static str;
    async fn send(&self, message: &EmailMessage) -> Result<()>;
}

/// Demo mailer: writes the message to the log instead of sending it
pub struct LogMailer;

#[async_trait]
impl EmailSender for LogMailer {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn send(&self, message: &EmailMessage) -> Result<()> {
        let preview: String = message.body.chars().take(LOG_PREVIEW_CHARS).collect();
        info!(
            to = %message.to,
            subject = %message.subject,
            body = %format!("{}...", preview),
            "Email sent"
        );
        Ok(())
    }
}

/// Outcome of a best-effort notification
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "lowercase")]
pub enum Delivery {
    Sent,
    Failed(String),
}

impl EmailMessage {
    pub fn new(to: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
            from: DEFAULT_FROM.to_string(),
        }
    }
}

/// Send `message`, logging and absorbing any failure
pub async fn notify_best_effort(sender: &dyn EmailSender, message: &EmailMessage) -> Delivery {
    match sender.send(message).await {
        Ok(()) => Delivery::Sent,
        Err(e) => {
            warn!(
                mailer = sender.name(),
                to = %message.to,
                error = %e,
                "Email dispatch failed, continuing"
            );
            Delivery::Failed(e.to_string())
        }
    }
}
