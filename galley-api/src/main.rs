use anyhow::Context;
use galley_api::{app, AppState};
use galley_catalog::{InMemoryCatalog, PricingConfig};
use galley_core::{money, PickupStore, WorkItemStore};
use galley_order::PickupLedger;
use galley_store::app_config::Backend;
use galley_store::{Config, MemoryStore, PersistenceWorker, RedisClient, RetryPolicy};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const SYNC_QUEUE_CAPACITY: usize = 1024;
const RETRY_INTERVAL: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "galley_api=debug,galley_order=debug,galley_store=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Galley API on port {}", config.server.port);

    let catalog = InMemoryCatalog::load(&config.catalog.menu_path)
        .with_context(|| format!("Failed to load menu from {}", config.catalog.menu_path))?;
    tracing::info!(items = catalog.len(), "Menu loaded");

    let ledger = Arc::new(PickupLedger::with_rolling_window(chrono::Duration::minutes(
        config.ledger.rolling_window_minutes,
    )));

    // Persistence backend
    let (work_items, pickups): (Arc<dyn WorkItemStore>, Arc<dyn PickupStore>) = match config.persistence.backend {
        Backend::Memory => {
            let store = Arc::new(MemoryStore::new());
            (store.clone() as Arc<dyn WorkItemStore>, store as Arc<dyn PickupStore>)
        }
        Backend::Redis => {
            let url = config
                .persistence
                .redis_url
                .as_deref()
                .context("persistence.redis_url is required for the redis backend")?;
            let client = Arc::new(RedisClient::new(url).await.context("Failed to configure Redis")?);
            (client.clone() as Arc<dyn WorkItemStore>, client as Arc<dyn PickupStore>)
        }
    };

    match pickups.list_pickups().await {
        Ok(records) => {
            let restored = ledger.restore(records);
            tracing::info!(restored, "Pickup ledger restored");
        }
        Err(e) => tracing::warn!("Starting with an empty pickup ledger: {}", e),
    }

    let (sync, _worker) = PersistenceWorker::spawn(
        work_items,
        pickups,
        RetryPolicy::from(&config.persistence),
        SYNC_QUEUE_CAPACITY,
    );

    let vat_rate = money::from_f64(config.business_rules.vat_rate).context("Invalid business_rules.vat_rate")?;
    let size_step = money::from_f64(config.business_rules.size_step).context("Invalid business_rules.size_step")?;

    let app_state = AppState::new(
        Arc::new(catalog),
        PricingConfig { size_step },
        vat_rate,
        ledger,
        Some(Arc::new(sync)),
    )
    .context("Failed to register metrics")?;

    // re-send what the sync queue refused or the store dropped, and drop old orders
    let tracker = app_state.tracker.clone();
    let retain_completed = config.tracker.retain_completed_orders;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(RETRY_INTERVAL);
        loop {
            interval.tick().await;
            let sent = tracker.retry_pending();
            if sent > 0 {
                tracing::info!(sent, "Re-sent pending sync events");
            }
            tracker.prune_completed(retain_completed);
        }
    });

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
