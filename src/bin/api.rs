use finny_agent::{
    api::{start_server, ApiState},
    config::Config,
    state::{demo_transactions, InMemoryLedgerStore, LedgerStore},
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    info!("🚀 FINNY Agent - API Server");
    info!("📍 Port: {}", config.port);

    if config.lava.is_none() {
        info!("⚠️  LAVA_API_KEY not set, using demo voice and offline insights");
    }
    if config.mail.is_none() {
        info!("⚠️  GMAIL_API_URL/GMAIL_TOKEN not set, emails will only be logged");
    }

    let ledger: Arc<dyn LedgerStore> = Arc::new(InMemoryLedgerStore::new());

    if std::env::var("FINNY_SEED_DEMO").is_ok() {
        let today = chrono::Utc::now().date_naive();
        let seeded = ledger
            .upsert_transactions(demo_transactions("demo", today))
            .await?;
        info!(seeded, "🌱 Seeded demo workspace");
    }

    let state = ApiState::from_config(&config, ledger)?;

    info!("✅ Agents initialized");
    info!("📡 Starting API server...");

    start_server(state, config.port).await?;

    Ok(())
}
