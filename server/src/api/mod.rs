//! HTTP surface: the dashboard page and its JSON feed.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::get;
use axum::{Json, Router};
use tracing::{error, info};

use crate::config::{Config, DashboardSettings};
use crate::summary::{Collector, MetricsRecord};

const DASHBOARD_TEMPLATE: &str = include_str!("dashboard.html");

pub struct AppState {
    collector: Arc<Collector>,
    settings: DashboardSettings,
    page: String,
}

impl AppState {
    pub fn new(collector: Arc<Collector>, settings: DashboardSettings) -> Self {
        let page = render_dashboard(&settings);
        Self {
            collector,
            settings,
            page,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(dashboard))
        .route("/api/data", get(snapshot))
        .route("/api/config", get(settings))
        .route("/health", get(health))
        .with_state(Arc::new(state))
}

pub async fn serve(
    config: &Config,
    collector: Arc<Collector>,
) -> Result<(), Box<dyn std::error::Error>> {
    let addr = config.socket_addr();
    let app = router(AppState::new(collector, config.dashboard()));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "dashboard listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown requested"),
        Err(error) => {
            error!(%error, "cannot listen for ctrl-c, running until killed");
            std::future::pending::<()>().await;
        }
    }
}

async fn dashboard(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(state.page.clone())
}

/// Runs a full collection cycle per request. A failed cycle is a bare 500;
/// the details stay in the log.
async fn snapshot(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<MetricsRecord>>, StatusCode> {
    match state.collector.collect().await {
        Ok(records) => Ok(Json(records)),
        Err(error) => {
            error!(%error, "collection cycle failed");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

async fn settings(State(state): State<Arc<AppState>>) -> Json<DashboardSettings> {
    Json(state.settings.clone())
}

async fn health() -> &'static str {
    "OK"
}

fn render_dashboard(settings: &DashboardSettings) -> String {
    DASHBOARD_TEMPLATE
        .replace("{{threshold}}", &settings.alert_threshold.to_string())
        .replace("{{band}}", &settings.depth_band_pct.to_string())
        .replace("{{refresh_ms}}", &settings.refresh_interval_ms.to_string())
}
