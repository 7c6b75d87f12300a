//! Core data models for the FINNY agent service

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

//
// ================= Enums =================
//

/// Which intro template the voice generator renders
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MeetingStyle {
    #[default]
    Finance,
    General,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmailIntent {
    Meeting,
    Summary,
    Analysis,
    Unknown,
}

//
// ================= Task / Meeting =================
//

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub title: String,
    pub description: String,
    pub email: String,
}

/// Input to the meeting agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeetingContext {
    pub task_title: String,
    pub task_description: String,
    pub email: String,
}

impl From<&Task> for MeetingContext {
    fn from(task: &Task) -> Self {
        Self {
            task_title: task.title.clone(),
            task_description: task.description.clone(),
            email: task.email.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Meeting {
    pub meeting_url: String,
    pub meeting_id: String,
    pub audio_url: String,
    pub script: Vec<String>,
}

/// What `create_task` hands back to the caller
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskResult {
    pub meeting_url: String,
    pub meeting_id: String,
    pub audio_url: String,
    pub script: Vec<String>,
    pub summary: String,
}

/// Optional material gathered during a meeting
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeetingNotes {
    #[serde(default)]
    pub transcript: Option<String>,
    #[serde(default)]
    pub key_points: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Summary {
    pub meeting_id: String,
    pub summary: String,
    pub key_insights: Vec<String>,
    pub next_steps: Vec<String>,
}

//
// ================= Voice =================
//

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceRequest {
    pub text: String,
    pub voice: String,
    pub speed: f32,
}

/// Audio reference plus the sentence-chunked script it speaks
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VoiceClip {
    pub audio_url: String,
    pub duration: f64,
    pub script: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AudioChunk {
    pub index: usize,
    pub text: String,
    pub audio_url: String,
    pub duration: f64,
    pub start_time: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChunkedAudio {
    pub chunks: Vec<AudioChunk>,
    pub total_duration: f64,
    pub total_chunks: usize,
}

//
// ================= Email =================
//

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub from: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct IntentMatch {
    pub intent: EmailIntent,
    pub confidence: f32,
}

//
// ================= Ledger =================
//

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub id: String,
    pub workspace_id: String,
    pub ts: NaiveDate,
    /// Revenue is positive, expenses negative
    pub amount: f64,
    pub category: Option<String>,
    pub merchant: Option<String>,
    pub note: Option<String>,
    pub source: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CashSnapshot {
    pub workspace_id: String,
    pub as_of: NaiveDate,
    pub cash: f64,
}

/// Transaction as delivered by the bank-data aggregator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatorTransaction {
    pub transaction_id: String,
    pub date: NaiveDate,
    /// Positive for money leaving the account
    pub amount: f64,
    #[serde(default)]
    pub category: Option<Vec<String>>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionQuery {
    pub workspace_id: String,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub days: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionPage {
    pub transactions: Vec<Transaction>,
    pub count: usize,
    pub categories: Vec<String>,
}

//
// ================= Metrics =================
//

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct MonthTotals {
    pub revenue: f64,
    pub expense: f64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct PeriodTotals {
    pub revenue: f64,
    pub expense: f64,
    pub net: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryTotal {
    pub category: String,
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricsSummary {
    pub months: Vec<String>,
    pub by_month: BTreeMap<String, MonthTotals>,
    pub top_categories: Vec<CategoryTotal>,
    pub mtd: PeriodTotals,
    pub ytd: PeriodTotals,
}

/// Months of cash left, or unbounded when nothing is being burned
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(into = "RunwayRepr", try_from = "RunwayRepr")]
pub enum Runway {
    Months(f64),
    Unbounded,
}

const UNBOUNDED_MARKER: &str = "∞";

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RunwayRepr {
    Months(f64),
    Marker(String),
}

impl From<Runway> for RunwayRepr {
    fn from(runway: Runway) -> Self {
        match runway {
            Runway::Months(m) => RunwayRepr::Months(m),
            Runway::Unbounded => RunwayRepr::Marker(UNBOUNDED_MARKER.to_string()),
        }
    }
}

impl TryFrom<RunwayRepr> for Runway {
    type Error = String;

    fn try_from(repr: RunwayRepr) -> std::result::Result<Self, Self::Error> {
        match repr {
            RunwayRepr::Months(m) => Ok(Runway::Months(m)),
            RunwayRepr::Marker(s) if s == UNBOUNDED_MARKER => Ok(Runway::Unbounded),
            RunwayRepr::Marker(s) => Err(format!("unrecognised runway value: {}", s)),
        }
    }
}

impl fmt::Display for Runway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Runway::Months(m) => write!(f, "{:.1} months", m),
            Runway::Unbounded => write!(f, "{}", UNBOUNDED_MARKER),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BurnRunway {
    pub burn_avg_3m: f64,
    pub cash: f64,
    pub runway_months: Runway,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Dashboard {
    pub summary: MetricsSummary,
    pub burn: BurnRunway,
}

//
// ================= CFO / Activity =================
//

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightAnswer {
    pub answer: String,
    pub latency_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub activity_id: Uuid,
    pub agent_name: String,
    pub workspace_id: String,
    pub input_digest: String,
    pub latency_ms: u64,
    pub created_at: DateTime<Utc>,
}

impl fmt::Display for MeetingStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MeetingStyle::Finance => "finance",
            MeetingStyle::General => "general",
        };
        write!(f, "{}", s)
    }
}
