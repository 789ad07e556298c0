use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use std::time::Instant;

use crate::state::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    timestamp: chrono::DateTime<chrono::Utc>,
    checks: HealthChecks,
}

/// Individual health checks
#[derive(Debug, Serialize)]
pub struct HealthChecks {
    store: ComponentHealth,
    forecast: ComponentHealth,
}

/// Health status of a component
#[derive(Debug, Serialize)]
pub struct ComponentHealth {
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ComponentHealth {
    fn healthy(latency_ms: u64) -> Self {
        Self {
            status: "healthy".to_string(),
            latency_ms: Some(latency_ms),
            error: None,
        }
    }

    fn unhealthy(error: String) -> Self {
        Self {
            status: "unhealthy".to_string(),
            latency_ms: None,
            error: Some(error),
        }
    }

    fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// GET /health - Health check endpoint
///
/// Reports reading store connectivity and whether any reference location is
/// configured for forecasting.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let store_health = match check_store(&state).await {
        Ok(latency) => ComponentHealth::healthy(latency),
        Err(e) => ComponentHealth::unhealthy(e.to_string()),
    };
    let forecast_health = check_forecast(&state);

    let all_healthy = store_health.is_healthy() && forecast_health.is_healthy();

    let response = HealthResponse {
        status: if all_healthy {
            "healthy".to_string()
        } else {
            "degraded".to_string()
        },
        timestamp: chrono::Utc::now(),
        checks: HealthChecks {
            store: store_health,
            forecast: forecast_health,
        },
    };

    let status_code = if all_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    tracing::debug!(healthy = all_healthy, "Health check completed");

    (status_code, Json(response))
}

async fn check_store(state: &AppState) -> anyhow::Result<u64> {
    let start = Instant::now();
    state.store.ping().await?;
    Ok(start.elapsed().as_millis() as u64)
}

fn check_forecast(state: &AppState) -> ComponentHealth {
    if state.engine.forecaster().catalog().is_empty() {
        ComponentHealth::unhealthy("no reference locations configured".to_string())
    } else {
        ComponentHealth::healthy(0)
    }
}

/// GET /health/ready - Readiness probe
///
/// Returns 200 once the reading store answers
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    match check_store(&state).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// GET /health/live - Liveness probe
pub async fn liveness_check() -> impl IntoResponse {
    StatusCode::OK
}
