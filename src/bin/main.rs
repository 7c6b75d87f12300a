use finny_agent::{
    api::ApiState,
    config::Config,
    models::{MeetingNotes, Task},
    state::{demo_transactions, InMemoryLedgerStore, LedgerStore},
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEMO_WORKSPACE: &str = "demo";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("FINNY demo run starting");

    let config = Config::from_env()?;
    let ledger: Arc<dyn LedgerStore> = Arc::new(InMemoryLedgerStore::new());
    let today = chrono::Utc::now().date_naive();
    ledger
        .upsert_transactions(demo_transactions(DEMO_WORKSPACE, today))
        .await?;

    let state = ApiState::from_config(&config, ledger)?;

    let task = Task {
        title: "Cut SaaS Subscriptions".to_string(),
        description: "Review and cancel unused software subscriptions".to_string(),
        email: "founder@startup.io".to_string(),
    };

    info!(title = %task.title, "Running task workflow");

    let result = match state.orchestrator.create_task(DEMO_WORKSPACE, task).await {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Task workflow failed: {}", e);
            return Err(e.into());
        }
    };

    println!("\n=== MEETING CREATED ===");
    println!("Meeting ID: {}", result.meeting_id);
    println!("Meeting URL: {}", result.meeting_url);
    println!("Audio: {}", result.audio_url);
    println!("\nScript:");
    for (i, line) in result.script.iter().enumerate() {
        println!("  {}: {}", i + 1, line);
    }

    let summary = state
        .orchestrator
        .complete_meeting(
            DEMO_WORKSPACE,
            &result.meeting_id,
            MeetingNotes {
                transcript: Some(
                    "Agreed to drop three unused tools and renegotiate AWS.".to_string(),
                ),
                key_points: vec![
                    "Cancel unused design seats".to_string(),
                    "Move staging to spot instances".to_string(),
                ],
            },
        )
        .await?;

    println!("\n=== MEETING SUMMARY ===");
    println!("{}", summary.summary);
    println!("\nNext steps:");
    for step in &summary.next_steps {
        println!("  - {}", step);
    }

    let insights = state.cfo.insights(DEMO_WORKSPACE, None, today).await?;
    println!("\n=== CFO INSIGHTS ({} ms) ===", insights.latency_ms);
    println!("{}", insights.answer);

    Ok(())
}
