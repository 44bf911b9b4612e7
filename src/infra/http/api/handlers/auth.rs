//! Login, logout and identity

use axum::Json;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::warn;

use crate::domain::views::client_fingerprint;

use super::auth_to_api;
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::middleware::{AdminPrincipal, ClientAddr};
use crate::infra::http::api::models::*;
use crate::infra::http::api::state::ApiState;

pub async fn login(
    State(state): State<ApiState>,
    Extension(ClientAddr(client)): Extension<ClientAddr>,
    Json(payload): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    let fingerprint = client_fingerprint(&client, "");
    if !state.login_limiter.allow(&fingerprint) {
        warn!(
            target: "folio::http::auth",
            client = %fingerprint,
            limit = state.login_limiter.limit(),
            "login rate limit exceeded"
        );
        return Ok(ApiError::rate_limited(state.login_limiter.retry_after_secs()));
    }

    let token = state
        .auth
        .login(&payload.username, &payload.password)
        .await
        .map_err(auth_to_api)?;

    Ok(Json(DataEnvelope::new(token)).into_response())
}

/// Tokens are stateless; the client discards its copy.
pub async fn logout() -> StatusCode {
    StatusCode::NO_CONTENT
}

pub async fn me(
    State(state): State<ApiState>,
    Extension(principal): Extension<AdminPrincipal>,
) -> Result<impl IntoResponse, ApiError> {
    let admin = state
        .auth
        .current_admin(principal.user_id)
        .await
        .map_err(auth_to_api)?;

    Ok(Json(DataEnvelope::new(AdminResponse {
        id: admin.id,
        username: admin.username,
    })))
}
