//! Ledger state
//!
//! Transactions and cash snapshots per workspace.
//! Kept in memory behind the [`LedgerStore`] trait.

use crate::error::FinnyError;
use crate::models::{
    AggregatorTransaction, CashSnapshot, Transaction, TransactionPage, TransactionQuery,
};
use crate::Result;
use chrono::{Duration, NaiveDate};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

pub const DEFAULT_LIST_LIMIT: usize = 100;
pub const MAX_LIST_LIMIT: usize = 500;
pub const DEFAULT_LIST_DAYS: i64 = 60;
const FALLBACK_CATEGORY: &str = "Other";

/// Trait for ledger persistence
#[async_trait::async_trait]
pub trait LedgerStore: Send + Sync {
    /// Insert or replace by transaction id
    async fn upsert_transactions(&self, rows: Vec<Transaction>) -> Result<usize>;
    async fn transactions(&self, workspace_id: &str) -> Result<Vec<Transaction>>;
    async fn record_cash(&self, snapshot: CashSnapshot) -> Result<()>;
    async fn latest_cash(&self, workspace_id: &str) -> Result<Option<CashSnapshot>>;
}

/// In-memory ledger for development and the demo
pub struct InMemoryLedgerStore {
    // workspace → id → row
    transactions: Arc<RwLock<HashMap<String, HashMap<String, Transaction>>>>,
    cash: Arc<RwLock<HashMap<String, Vec<CashSnapshot>>>>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self {
            transactions: Arc::new(RwLock::new(HashMap::new())),
            cash: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryLedgerStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn upsert_transactions(&self, rows: Vec<Transaction>) -> Result<usize> {
        let count = rows.len();
        let mut by_workspace = self.transactions.write().await;

        for row in rows {
            by_workspace
                .entry(row.workspace_id.clone())
                .or_default()
                .insert(row.id.clone(), row);
        }

        Ok(count)
    }

    async fn transactions(&self, workspace_id: &str) -> Result<Vec<Transaction>> {
        let by_workspace = self.transactions.read().await;
        Ok(by_workspace
            .get(workspace_id)
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn record_cash(&self, snapshot: CashSnapshot) -> Result<()> {
        let mut cash = self.cash.write().await;
        cash.entry(snapshot.workspace_id.clone())
            .or_default()
            .push(snapshot);
        Ok(())
    }

    async fn latest_cash(&self, workspace_id: &str) -> Result<Option<CashSnapshot>> {
        let cash = self.cash.read().await;
        Ok(cash
            .get(workspace_id)
            .and_then(|snaps| snaps.iter().max_by_key(|s| s.as_of))
            .cloned())
    }
}

/// Filtered, newest-first page of a workspace's transactions
pub async fn list_transactions(
    store: &dyn LedgerStore,
    query: &TransactionQuery,
    today: NaiveDate,
) -> Result<TransactionPage> {
    let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT);
    if limit > MAX_LIST_LIMIT {
        return Err(FinnyError::InvalidInput(format!(
            "limit must be at most {}",
            MAX_LIST_LIMIT
        )));
    }
    let days = query.days.unwrap_or(DEFAULT_LIST_DAYS);
    if days < 0 {
        return Err(FinnyError::InvalidInput("days must not be negative".to_string()));
    }

    let category = query
        .category
        .as_deref()
        .filter(|c| !c.eq_ignore_ascii_case("all"));
    let since = Duration::try_days(days)
        .and_then(|window| today.checked_sub_signed(window))
        .ok_or_else(|| FinnyError::InvalidInput(format!("days out of range: {}", days)))?;

    let all = store.transactions(&query.workspace_id).await?;

    let categories: Vec<String> = all
        .iter()
        .filter_map(|t| t.category.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut transactions: Vec<Transaction> = all
        .into_iter()
        .filter(|t| t.ts >= since)
        .filter(|t| match category {
            Some(c) => t.category.as_deref() == Some(c),
            None => true,
        })
        .collect();

    transactions.sort_by(|a, b| b.ts.cmp(&a.ts).then_with(|| a.id.cmp(&b.id)));
    transactions.truncate(limit);

    Ok(TransactionPage {
        count: transactions.len(),
        transactions,
        categories,
    })
}

/// Convert aggregator rows into ledger rows (outflows become negative)
pub fn from_aggregator(
    workspace_id: &str,
    source_note: &str,
    rows: Vec<AggregatorTransaction>,
) -> Vec<Transaction> {
    rows.into_iter()
        .map(|t| Transaction {
            id: t.transaction_id,
            workspace_id: workspace_id.to_string(),
            ts: t.date,
            amount: -t.amount,
            category: Some(
                t.category
                    .and_then(|c| c.into_iter().next())
                    .unwrap_or_else(|| FALLBACK_CATEGORY.to_string()),
            ),
            merchant: t.name,
            note: Some(source_note.to_string()),
            source: "aggregator".to_string(),
        })
        .collect()
}

/// Six months of plausible startup activity, ending at `today`
pub fn demo_transactions(workspace_id: &str, today: NaiveDate) -> Vec<Transaction> {
    const MONTHLY: &[(&str, &str, f64)] = &[
        ("Stripe payout", "Revenue", 7_800.0),
        ("AWS", "Software", -2_150.0),
        ("Notion", "Software", -320.0),
        ("Payroll", "Payroll", -12_400.0),
        ("WeWork", "Rent", -2_900.0),
        ("Google Ads", "Marketing", -1_250.0),
    ];

    let mut rows = Vec::new();
    for month_back in 0..6i64 {
        let day = today - Duration::days(month_back * 30);
        for (i, (merchant, category, amount)) in MONTHLY.iter().enumerate() {
            rows.push(Transaction {
                id: format!("demo-{}-{}", month_back, i),
                workspace_id: workspace_id.to_string(),
                ts: day - Duration::days(i as i64),
                amount: *amount,
                category: Some(category.to_string()),
                merchant: Some(merchant.to_string()),
                note: Some("Demo seed".to_string()),
                source: "demo".to_string(),
            });
        }
    }
    rows
}
