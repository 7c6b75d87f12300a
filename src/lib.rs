//! FINNY Agent Service
//!
//! An AI-CFO demo backend that:
//! - Turns a finance task into a meeting with a spoken intro
//! - Summarizes finished meetings into insights and next steps
//! - Notifies the task owner by email (best effort)
//! - Reports burn, runway and P&L over a workspace ledger
//! - Answers CFO questions through an LLM, logging every agent call
//!
//! TASK WORKFLOW:
//! CREATE MEETING → SUMMARIZE → NOTIFY

pub mod activity;
pub mod agent;
pub mod api;
pub mod cfo;
pub mod classifier;
pub mod config;
pub mod email;
pub mod error;
pub mod llm;
pub mod metrics;
pub mod models;
pub mod state;
pub mod summary;
pub mod voice;

pub use error::{FinnyError, Result};

// Re-export common types
pub use models::*;
pub use classifier::IntentClassifier;
