//! Financial metrics over a workspace's ledger
//!
//! Aggregation is pure (`summarize`, `burn_runway`); the `load_*` functions
//! fetch from a [`LedgerStore`] first.

use crate::models::{
    BurnRunway, CategoryTotal, Dashboard, MetricsSummary, MonthTotals, PeriodTotals, Runway,
    Transaction,
};
use crate::state::LedgerStore;
use crate::Result;
use chrono::{Datelike, Duration, NaiveDate};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

const SUMMARY_WINDOW_DAYS: i64 = 180;
const TOP_CATEGORY_COUNT: usize = 5;
const BURN_WINDOW_MONTHS: usize = 3;
const MIN_BURN: f64 = 1e-6;
const FALLBACK_CATEGORY: &str = "Other";

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

fn month_key(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

impl PeriodTotals {
    fn add(&mut self, amount: f64) {
        if amount >= 0.0 {
            self.revenue += amount;
        } else {
            self.expense += -amount;
        }
    }

    fn finish(self) -> Self {
        Self {
            revenue: round_to(self.revenue, 2),
            expense: round_to(self.expense, 2),
            net: round_to(self.revenue - self.expense, 2),
        }
    }
}

impl MonthTotals {
    fn add(&mut self, amount: f64) {
        if amount >= 0.0 {
            self.revenue += amount;
        } else {
            self.expense += -amount;
        }
    }
}

/// Monthly P&L, top expense categories, month- and year-to-date totals
pub fn summarize(transactions: &[Transaction], today: NaiveDate) -> MetricsSummary {
    let since = today - Duration::days(SUMMARY_WINDOW_DAYS);
    let this_month = month_key(today);

    let mut by_month: BTreeMap<String, MonthTotals> = BTreeMap::new();
    let mut by_category: HashMap<String, f64> = HashMap::new();
    let mut mtd = PeriodTotals::default();
    let mut ytd = PeriodTotals::default();

    for t in transactions.iter().filter(|t| t.ts >= since) {
        let ym = month_key(t.ts);

        by_month.entry(ym.clone()).or_default().add(t.amount);

        if t.amount < 0.0 {
            let category = t
                .category
                .clone()
                .unwrap_or_else(|| FALLBACK_CATEGORY.to_string());
            *by_category.entry(category).or_insert(0.0) += -t.amount;
        }
        if ym == this_month {
            mtd.add(t.amount);
        }
        if t.ts.year() == today.year() {
            ytd.add(t.amount);
        }
    }

    let mut top_categories: Vec<CategoryTotal> = by_category
        .into_iter()
        .map(|(category, amount)| CategoryTotal {
            category,
            amount: round_to(amount, 2),
        })
        .collect();
    top_categories.sort_by(|a, b| {
        b.amount
            .total_cmp(&a.amount)
            .then_with(|| a.category.cmp(&b.category))
    });
    top_categories.truncate(TOP_CATEGORY_COUNT);

    let by_month: BTreeMap<String, MonthTotals> = by_month
        .into_iter()
        .map(|(month, totals)| {
            (
                month,
                MonthTotals {
                    revenue: round_to(totals.revenue, 2),
                    expense: round_to(totals.expense, 2),
                },
            )
        })
        .collect();

    MetricsSummary {
        months: by_month.keys().cloned().collect(),
        by_month,
        top_categories,
        mtd: mtd.finish(),
        ytd: ytd.finish(),
    }
}

/// Average net burn over the last three active months and the runway it implies
pub fn burn_runway(transactions: &[Transaction], cash: f64) -> BurnRunway {
    let mut by_month: BTreeMap<String, MonthTotals> = BTreeMap::new();
    for t in transactions {
        by_month.entry(month_key(t.ts)).or_default().add(t.amount);
    }

    let recent: Vec<f64> = by_month
        .values()
        .rev()
        .take(BURN_WINDOW_MONTHS)
        .map(|m| m.expense - m.revenue)
        .collect();

    let burn_avg = if recent.is_empty() {
        0.0
    } else {
        (recent.iter().sum::<f64>() / recent.len() as f64).max(0.0)
    };

    let runway_months = if burn_avg > MIN_BURN {
        Runway::Months(round_to(cash / burn_avg, 1))
    } else {
        Runway::Unbounded
    };

    BurnRunway {
        burn_avg_3m: round_to(burn_avg, 2),
        cash: round_to(cash, 2),
        runway_months,
    }
}

pub async fn load_summary(
    store: &dyn LedgerStore,
    workspace_id: &str,
    today: NaiveDate,
) -> Result<MetricsSummary> {
    let rows = store.transactions(workspace_id).await?;
    debug!(workspace_id, rows = rows.len(), "Summarizing ledger");
    Ok(summarize(&rows, today))
}

/// Uses the latest cash snapshot, or `default_cash` when none was recorded
pub async fn load_burn_runway(
    store: &dyn LedgerStore,
    workspace_id: &str,
    default_cash: f64,
) -> Result<BurnRunway> {
    let rows = store.transactions(workspace_id).await?;
    let cash = store
        .latest_cash(workspace_id)
        .await?
        .map(|s| s.cash)
        .unwrap_or(default_cash);
    Ok(burn_runway(&rows, cash))
}

/// Both dashboard metrics, fetched concurrently; either both load or neither
pub async fn load_dashboard(
    store: &dyn LedgerStore,
    workspace_id: &str,
    today: NaiveDate,
    default_cash: f64,
) -> Result<Dashboard> {
    let (summary, burn) = tokio::try_join!(
        load_summary(store, workspace_id, today),
        load_burn_runway(store, workspace_id, default_cash),
    )?;

    Ok(Dashboard { summary, burn })
}
