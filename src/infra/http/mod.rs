pub mod api;
mod middleware;

pub use api::rate_limit::LoginRateLimiter;
pub use api::{ApiState, build_router};
pub use middleware::RequestContext;
