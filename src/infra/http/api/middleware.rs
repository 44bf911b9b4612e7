use std::net::SocketAddr;

use axum::body::Body;
use axum::extract::{ConnectInfo, State};
use axum::http::{HeaderMap, HeaderValue, Request, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::debug;

use crate::application::auth::{AuthError, Claims};

use super::error::ApiError;
use super::state::ApiState;

const FORWARDED_FOR: &str = "x-forwarded-for";
const REAL_IP: &str = "x-real-ip";

/// Authenticated admin identity, inserted into request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminPrincipal {
    pub user_id: i64,
    pub username: String,
}

impl From<Claims> for AdminPrincipal {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.user_id,
            username: claims.username,
        }
    }
}

/// Client address as seen through the proxy chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientAddr(pub String);

pub async fn require_admin(
    State(state): State<ApiState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let token = match extract_token(request.headers().get(header::AUTHORIZATION)) {
        Some(token) => token,
        None => {
            return ApiError::unauthorized(Some("missing bearer token".to_string()))
                .into_response();
        }
    };

    let claims = match state.auth.validate_token(&token) {
        Ok(claims) => claims,
        Err(AuthError::InvalidToken(reason)) => {
            debug!(target: "folio::http::auth", reason = %reason, "token rejected");
            return ApiError::unauthorized(Some("invalid or expired token".to_string()))
                .into_response();
        }
        Err(err) => {
            return ApiError::unauthorized(None)
                .with_source("infra::http::api::require_admin", &err)
                .into_response();
        }
    };

    let principal = AdminPrincipal::from(claims);
    request.extensions_mut().insert(principal.clone());
    let mut response = next.run(request).await;
    // Lets the outer response logger attribute admin failures.
    response.extensions_mut().insert(principal);
    response
}

/// Resolve the client address and store it as [`ClientAddr`].
pub async fn client_addr(mut request: Request<Body>, next: Next) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let addr = resolve_client_addr(request.headers(), peer);
    request.extensions_mut().insert(ClientAddr(addr));
    next.run(request).await
}

/// First `X-Forwarded-For` entry, then `X-Real-IP`, then the socket peer.
pub fn resolve_client_addr(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let forwarded = headers
        .get(FORWARDED_FOR)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty());
    if let Some(addr) = forwarded {
        return addr.to_string();
    }

    let real_ip = headers
        .get(REAL_IP)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty());
    if let Some(addr) = real_ip {
        return addr.to_string();
    }

    peer.map(|addr| addr.ip().to_string()).unwrap_or_default()
}

fn extract_token(header: Option<&HeaderValue>) -> Option<String> {
    let raw = header?.to_str().ok()?;
    let bearer = raw.strip_prefix("Bearer ")?.trim();
    (!bearer.is_empty()).then(|| bearer.to_string())
}
