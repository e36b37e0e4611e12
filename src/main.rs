use std::sync::Arc;

use axum::{routing::get, Router};
use tokio::sync::RwLock;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

mod config;
mod error;
mod handlers;
mod metrics;
mod models;
mod store;

use crate::config::Config;
use crate::metrics::RequestLog;
use crate::store::InventoryStore;

/// Shared application state — cheap to clone (all heap behind Arc).
///
/// Each operation holds the inventory lock for its whole check-then-mutate
/// step, so concurrent requests on the same item are serialized.
#[derive(Clone)]
pub struct AppState {
    pub inventory: Arc<RwLock<InventoryStore>>,
    pub metrics: Arc<RwLock<RequestLog>>,
}

impl AppState {
    pub fn new(metrics_capacity: usize) -> Self {
        Self {
            inventory: Arc::new(RwLock::new(InventoryStore::new())),
            metrics: Arc::new(RwLock::new(RequestLog::with_capacity(metrics_capacity))),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present (ignored in production where env vars are injected)
    dotenv::dotenv().ok();

    // Structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,inventory_tracker=debug")),
        )
        .with_target(false)
        .compact()
        .init();

    let config = Config::from_env()?;

    info!("Inventory tracker starting (in-memory store, nothing persists across restarts)");

    let app = build_router(AppState::new(config.metrics_capacity));

    let addr = config.bind_addr();
    info!("Listening on http://{}", addr);
    info!("Quick-start: POST http://{}/inventory  →  GET http://{}/inventory?name=...", addr, addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_router(state: AppState) -> Router {
    Router::new()
        // ── Health ──────────────────────────────────────────────────────────
        .route("/health", get(handlers::health))

        // ── Inventory ───────────────────────────────────────────────────────
        .route(
            "/inventory",
            get(handlers::inventory::get_item)
                .post(handlers::inventory::add_item)
                .put(handlers::inventory::adjust_item)
                .delete(handlers::inventory::delete_item),
        )

        // ── Metrics ─────────────────────────────────────────────────────────
        .route(
            "/inventory/metrics",
            get(handlers::metrics::get_metrics).delete(handlers::metrics::reset_metrics),
        )
        .route("/inventory/metrics/csv", get(handlers::metrics::export_csv))

        // ── Middleware ──────────────────────────────────────────────────────
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
