pub mod error;
pub mod health;
pub mod readings;
pub mod report;

use axum::{
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::{config::Config, state::AppState};

pub fn router(state: AppState, cfg: &Config) -> Router {
    Router::new()
        .route("/", get(ping))
        .route("/energy/", get(readings::list_readings))
        .route("/energy/:id/", get(readings::get_reading))
        .route("/create_energy/", post(readings::create_reading))
        .route("/report/", get(report::totals))
        .route("/report_by_date/", get(report::report_by_date))
        .route("/forecast_report/", post(report::forecast_report))
        .route("/health", get(health::health_check))
        .route("/health/live", get(health::liveness_check))
        .route("/health/ready", get(health::readiness_check))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(axum::extract::DefaultBodyLimit::max(1024 * 1024))
                .layer(TimeoutLayer::new(Duration::from_secs(cfg.server.request_timeout_secs))),
        )
        .layer(TraceLayer::new_for_http())
}

async fn ping() -> &'static str {
    "OK"
}
