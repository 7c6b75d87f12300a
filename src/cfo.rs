//! CFO insights agent
//!
//! Feeds the workspace's metrics to the LLM and returns a short,
//! bullet-pointed CFO read-out.

use crate::activity::ActivityLog;
use crate::llm::{ChatMessage, ChatModel};
use crate::metrics;
use crate::models::InsightAnswer;
use crate::state::LedgerStore;
use crate::Result;
use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

pub const DEFAULT_QUESTION: &str = "Give a concise CFO summary and risks.";
pub const AGENT_NAME: &str = "cfo_insights";

const SYSTEM_PROMPT: &str =
    "You are a startup CFO. Use the provided metrics. Respond in ≤120 words as bullet points.";

pub struct CfoAgent {
    llm: Arc<dyn ChatModel>,
    ledger: Arc<dyn LedgerStore>,
    activity: Arc<ActivityLog>,
    default_cash: f64,
}

impl CfoAgent {
    pub fn new(
        llm: Arc<dyn ChatModel>,
        ledger: Arc<dyn LedgerStore>,
        activity: Arc<ActivityLog>,
        default_cash: f64,
    ) -> Self {
        Self {
            llm,
            ledger,
            activity,
            default_cash,
        }
    }

    pub async fn insights(
        &self,
        workspace_id: &str,
        question: Option<&str>,
        today: NaiveDate,
    ) -> Result<InsightAnswer> {
        let question = question
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .unwrap_or(DEFAULT_QUESTION);

        let dashboard =
            metrics::load_dashboard(self.ledger.as_ref(), workspace_id, today, self.default_cash)
                .await?;

        let metrics_json = serde_json::to_string(&serde_json::json!({
            "summary": dashboard.summary,
            "burn": dashboard.burn,
        }))?;

        let messages = vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(format!("Metrics: {}\nTask: {}", metrics_json, question)),
        ];

        let started = Instant::now();
        let answer = self.llm.complete(&messages).await?;
        let elapsed = started.elapsed();

        info!(
            workspace_id,
            latency_ms = elapsed.as_millis() as u64,
            "CFO insights generated"
        );

        self.activity
            .record(AGENT_NAME, workspace_id, &messages, elapsed)
            .await?;

        Ok(InsightAnswer {
            answer,
            latency_ms: elapsed.as_millis() as u64,
        })
    }
}
