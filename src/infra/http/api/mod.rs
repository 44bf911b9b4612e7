pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod rate_limit;
pub mod state;

pub use state::ApiState;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{delete, get, patch, post, put},
};
use tower_http::cors::{Any, CorsLayer};

use crate::infra::http::middleware::log_responses;

pub fn build_router(state: ApiState) -> Router {
    let upload_limit = state.upload_limit;

    let public = Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/public/posts", get(handlers::list_public_posts))
        .route("/api/public/posts/search", get(handlers::search_posts))
        .route("/api/public/posts/{slug}", get(handlers::get_public_post))
        .route(
            "/api/public/posts/{slug}/view",
            post(handlers::record_post_view),
        )
        .route(
            "/api/public/categories",
            get(handlers::list_public_categories),
        )
        .route(
            "/api/public/categories/{slug}/posts",
            get(handlers::list_category_posts),
        )
        .route("/api/public/tags", get(handlers::list_public_tags))
        .route("/api/public/tags/{slug}/posts", get(handlers::list_tag_posts))
        .route("/api/public/projects", get(handlers::list_public_projects))
        .route(
            "/api/public/projects/{slug}",
            get(handlers::get_public_project),
        )
        .route("/api/admin/auth/login", post(handlers::login))
        .route("/api/admin/auth/logout", post(handlers::logout));

    let admin = Router::new()
        .route("/api/admin/auth/me", get(handlers::me))
        .route(
            "/api/admin/posts",
            get(handlers::list_posts).post(handlers::create_post),
        )
        .route(
            "/api/admin/posts/{id}",
            get(handlers::get_post)
                .put(handlers::update_post)
                .delete(handlers::delete_post),
        )
        .route("/api/admin/posts/{id}/publish", patch(handlers::publish_post))
        .route(
            "/api/admin/categories",
            get(handlers::list_categories).post(handlers::create_category),
        )
        .route(
            "/api/admin/categories/{id}",
            put(handlers::update_category).delete(handlers::delete_category),
        )
        .route(
            "/api/admin/tags",
            get(handlers::list_tags).post(handlers::create_tag),
        )
        .route(
            "/api/admin/tags/{id}",
            put(handlers::update_tag).delete(handlers::delete_tag),
        )
        .route(
            "/api/admin/projects",
            get(handlers::list_projects).post(handlers::create_project),
        )
        .route(
            "/api/admin/projects/reorder",
            patch(handlers::reorder_projects),
        )
        .route(
            "/api/admin/projects/{id}",
            get(handlers::get_project)
                .put(handlers::update_project)
                .delete(handlers::delete_project),
        )
        .route("/api/admin/media", get(handlers::list_media))
        .route(
            "/api/admin/media/upload",
            post(handlers::upload_media).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/api/admin/media/{id}", delete(handlers::delete_media))
        .route(
            "/api/admin/dashboard/stats",
            get(handlers::dashboard_stats),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_admin,
        ));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    public
        .merge(admin)
        .with_state(state)
        .layer(axum_middleware::from_fn(middleware::client_addr))
        .layer(axum_middleware::from_fn(log_responses))
        .layer(cors)
}
