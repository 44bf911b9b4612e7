use std::sync::Arc;

use crate::application::auth::AuthService;
use crate::application::categories::CategoryService;
use crate::application::dashboard::DashboardService;
use crate::application::media::MediaService;
use crate::application::posts::PostService;
use crate::application::projects::ProjectService;
use crate::application::repos::HealthRepo;
use crate::application::storage::ObjectStorage;
use crate::application::tags::TagService;
use crate::application::views::ViewService;

use super::rate_limit::LoginRateLimiter;

#[derive(Clone)]
pub struct ApiState {
    pub posts: Arc<PostService>,
    pub categories: Arc<CategoryService>,
    pub tags: Arc<TagService>,
    pub projects: Arc<ProjectService>,
    pub media: Arc<MediaService>,
    pub views: Arc<ViewService>,
    pub auth: Arc<AuthService>,
    pub dashboard: Arc<DashboardService>,
    pub database: Arc<dyn HealthRepo>,
    pub storage: Arc<dyn ObjectStorage>,
    pub login_limiter: Arc<LoginRateLimiter>,
    /// Request body ceiling for the multipart upload route.
    pub upload_limit: usize,
}
