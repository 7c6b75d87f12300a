//! Agent activity log
//!
//! Every agent invocation leaves a record: who ran, for which workspace,
//! a digest of what it was asked, and how long it took.

use crate::models::ActivityRecord;
use crate::Result;
use chrono::Utc;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use uuid::Uuid;

pub const DEFAULT_ACTIVITY_LIMIT: usize = 10;
pub const DEFAULT_RETENTION: usize = 1_000;

/// Activity storage, newest last per workspace
/// Each workspace keeps at most `retention` records; the oldest are dropped first.
pub struct ActivityLog {
    records: Arc<RwLock<HashMap<String, Vec<ActivityRecord>>>>,
    retention: usize,
}

impl ActivityLog {
    pub fn new() -> Self {
        Self::with_retention(DEFAULT_RETENTION)
    }

    pub fn with_retention(retention: usize) -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
            retention: retention.max(1),
        }
    }

    /// Store an activity record for `agent_name`
    pub async fn record<T: Serialize>(
        &self,
        agent_name: &str,
        workspace_id: &str,
        input: &T,
        elapsed: Duration,
    ) -> Result<Uuid> {
        let record = ActivityRecord {
            activity_id: Uuid::new_v4(),
            agent_name: agent_name.to_string(),
            workspace_id: workspace_id.to_string(),
            input_digest: compute_input_digest(input),
            latency_ms: elapsed.as_millis() as u64,
            created_at: Utc::now(),
        };

        let activity_id = record.activity_id;
        let mut records = self.records.write().await;
        let kept = records.entry(record.workspace_id.clone()).or_default();
        kept.push(record);
        if kept.len() > self.retention {
            let excess = kept.len() - self.retention;
            kept.drain(..excess);
        }
        Ok(activity_id)
    }

    /// Most recent records for a workspace, newest first
    pub async fn recent(&self, workspace_id: &str, limit: usize) -> Result<Vec<ActivityRecord>> {
        let records = self.records.read().await;

        let mut items: Vec<ActivityRecord> = records
            .get(workspace_id)
            .cloned()
            .unwrap_or_default();

        // stored oldest first; reverse so equal timestamps keep newest first
        items.reverse();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        items.truncate(limit);
        Ok(items)
    }
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::new()
    }
}

/// SHA256 of the input's JSON form, hex encoded
/// Streams serialization straight into the hasher
pub fn compute_input_digest<T: Serialize>(input: &T) -> String {
    let mut hasher = Sha256::new();

    if serde_json::to_writer(&mut HashWriter(&mut hasher), input).is_err() {
        return String::new();
    }

    hex::encode(hasher.finalize())
}

/// Adapter to allow writing into Sha256 via std::io::Write
struct HashWriter<'a, H: Digest>(&'a mut H);

impl<'a, H: Digest> Write for HashWriter<'a, H> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
