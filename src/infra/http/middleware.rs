use std::time::Instant;

use axum::{
    body::Body,
    http::{HeaderValue, Method, Request, StatusCode, Uri},
    middleware::Next,
    response::Response,
};
use tracing::{error, warn};
use uuid::Uuid;

use crate::application::error::ErrorReport;
use crate::infra::http::api::middleware::AdminPrincipal;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
}

impl RequestContext {
    /// Reuse an upstream request id when a proxy already assigned one.
    fn from_request(request: &Request<Body>) -> Self {
        let request_id = request
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty() && value.len() <= 128)
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        Self { request_id }
    }
}

/// Tag every request with an id and log 4xx/5xx responses together with the
/// attached [`ErrorReport`].
pub async fn log_responses(mut request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let ctx = RequestContext::from_request(&request);
    request.extensions_mut().insert(ctx.clone());

    let mut response = next.run(request).await;
    let status = response.status();

    if status.is_client_error() || status.is_server_error() {
        let failure = FailedResponse {
            status,
            method: &method,
            uri: &uri,
            elapsed_ms: start.elapsed().as_millis(),
            request_id: &ctx.request_id,
            admin: response
                .extensions()
                .get::<AdminPrincipal>()
                .map(|principal| principal.username.clone()),
            report: response.extensions_mut().remove::<ErrorReport>(),
        };
        failure.log();
    }

    if let Ok(value) = HeaderValue::from_str(&ctx.request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response.extensions_mut().insert(ctx);
    response
}

struct FailedResponse<'a> {
    status: StatusCode,
    method: &'a Method,
    uri: &'a Uri,
    elapsed_ms: u128,
    request_id: &'a str,
    admin: Option<String>,
    report: Option<ErrorReport>,
}

impl FailedResponse<'_> {
    fn log(self) {
        let (source, messages) = match self.report {
            Some(report) => (report.source, report.messages),
            None => ("unknown", Vec::new()),
        };
        let detail = messages
            .first()
            .map(String::as_str)
            .unwrap_or("no diagnostic available");
        let admin = self.admin.as_deref().unwrap_or("");

        if self.status.is_server_error() {
            error!(
                target: "folio::http::response",
                status = self.status.as_u16(),
                method = %self.method,
                path = %self.uri.path(),
                elapsed_ms = self.elapsed_ms,
                source,
                detail,
                chain = ?messages,
                request_id = self.request_id,
                admin,
                "request failed",
            );
        } else {
            warn!(
                target: "folio::http::response",
                status = self.status.as_u16(),
                method = %self.method,
                path = %self.uri.path(),
                elapsed_ms = self.elapsed_ms,
                source,
                detail,
                chain = ?messages,
                request_id = self.request_id,
                admin,
                "client request error",
            );
        }
    }
}
