use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use backend::logging;
use backend::services::notify::WebhookNotifier;
use backend::services::scheduler::{HatchScheduler, SchedulerConfig};
use backend::store::{EggStore, PgEggStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::setup();
    dotenvy::from_path(".env").ok();

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let webhook_url =
        std::env::var("NOTIFY_WEBHOOK_URL").expect("NOTIFY_WEBHOOK_URL must be set");

    let store = Arc::new(PgEggStore::connect(&database_url).await?);
    store.run_migrations().await?;

    let config = SchedulerConfig {
        tick_interval: Duration::from_secs(env_or("TICK_INTERVAL_SECS", 30)),
        claim_batch_size: env_or("CLAIM_BATCH_SIZE", 25) as i64,
        claim_lease: time::Duration::seconds(env_or("CLAIM_LEASE_SECS", 300) as i64),
    };

    // Recover anything a previous run left claimed before the loop starts.
    info!("Checking for expired egg claims on startup...");
    match store.release_expired_claims(config.claim_lease).await {
        Ok(0) => {}
        Ok(n) => info!("Re-queued {} eggs from a previous run", n),
        Err(e) => error!("Startup claim sweep failed: {}", e),
    }

    let notifier = Arc::new(WebhookNotifier::new(webhook_url));
    let scheduler = HatchScheduler::new(store.clone(), notifier, config);
    tokio::spawn(scheduler.run());

    info!("Glitch Pets hatch worker running; Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    store.close().await;

    Ok(())
}

fn env_or(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}
