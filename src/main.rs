//! Reconciliation worker entry point.
//!
//! The transports (bot, HTTP) run elsewhere; this binary owns the periodic
//! sweep that retries pending referral bonuses.

use dotenvy::dotenv;
use pochi::config::{self, settings};
use pochi::core::referral;
use pochi::errors::Result;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();

    // 3. Load wallet settings (config.toml or built-in defaults)
    let wallet_settings = settings::load_default_settings()
        .inspect_err(|e| error!("Failed to load settings: {e}"))?;
    info!(
        currency = %wallet_settings.currency,
        fee_bps = wallet_settings.tip_fee_bps,
        "Settings loaded"
    );

    // 4. Initialize database
    let db = config::database::create_connection()
        .await
        .inspect(|_| info!("Database connected"))
        .inspect_err(|e| error!("Failed to connect to database: {e}"))?;
    config::database::create_tables(&db).await?;

    // 5. Run the pending-bonus sweep forever
    info!(interval_secs = SWEEP_INTERVAL.as_secs(), "Reconciliation sweep started");
    let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
    loop {
        ticker.tick().await;
        match referral::process_pending_referrals(&db, &wallet_settings).await {
            Ok(0) => {}
            Ok(settled) => info!(settled, "Sweep settled pending referral bonuses"),
            Err(e) => error!("Sweep failed: {e}"),
        }
    }
}
