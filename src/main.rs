//! newsdesk binary entrypoint.
//! Loads config, wires adapters and stores, and serves the Axum router on Shuttle.

use newsdesk::{api, metrics::Metrics, App, AppConfig};
use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compact logs by default; `NEWSDESK_LOG_JSON=1` switches to JSON lines.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("newsdesk=info,warn"));
    let json = std::env::var("NEWSDESK_LOG_JSON")
        .ok()
        .is_some_and(|v| v == "1");

    let registry = tracing_subscriber::registry().with(filter);
    // Shuttle may already have installed a subscriber
    let res = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().compact()).try_init()
    };
    if let Err(e) = res {
        eprintln!("tracing already initialised: {e}");
    }
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = AppConfig::load_default()?;
    let app = App::from_config(&cfg)?;
    let metrics = Metrics::init(app.aggregator.adapter_names().len())?;

    tracing::info!(
        adapters = ?app.aggregator.adapter_names(),
        page_size = cfg.aggregator.default_page_size,
        "newsdesk starting"
    );

    let router = api::create_router(app).merge(metrics.router());
    Ok(router.into())
}
