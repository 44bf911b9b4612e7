//! Dependency health probe

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::warn;

use crate::application::error::ErrorReport;
use crate::infra::http::api::models::{HealthChecks, HealthResponse};
use crate::infra::http::api::state::ApiState;

const UP: &str = "up";
const DOWN: &str = "down";

pub async fn health(State(state): State<ApiState>) -> Response {
    let (postgres, redis, storage) = tokio::join!(
        state.database.ping(),
        state.views.health_check(),
        state.storage.health_check(),
    );

    let mut failures = Vec::new();
    if let Err(err) = &postgres {
        failures.push(format!("postgres: {err}"));
    }
    if let Err(err) = &redis {
        failures.push(format!("redis: {err}"));
    }
    if let Err(err) = &storage {
        failures.push(format!("storage: {err}"));
    }

    let checks = HealthChecks {
        postgres: status_label(postgres.is_ok()),
        redis: status_label(redis.is_ok()),
        storage: status_label(storage.is_ok()),
    };

    if failures.is_empty() {
        let body = HealthResponse {
            status: "ok",
            checks,
        };
        return (StatusCode::OK, Json(body)).into_response();
    }

    warn!(target: "folio::http::health", failures = ?failures, "dependency check failed");
    let body = HealthResponse {
        status: "degraded",
        checks,
    };
    let mut response = (StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response();
    ErrorReport {
        source: "infra::http::health",
        status: StatusCode::SERVICE_UNAVAILABLE,
        messages: failures,
    }
    .attach(&mut response);
    response
}

fn status_label(healthy: bool) -> &'static str {
    if healthy { UP } else { DOWN }
}
