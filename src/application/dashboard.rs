use std::sync::Arc;

use serde::Serialize;

use crate::application::repos::{DashboardRepo, RepoError};
use crate::domain::entities::{CategoryStat, PostStats, RecentPost};

pub const RECENT_POSTS_LIMIT: u32 = 5;

#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub posts: PostStats,
    pub categories: Vec<CategoryStat>,
    pub recent_posts: Vec<RecentPost>,
}

#[derive(Clone)]
pub struct DashboardService {
    repo: Arc<dyn DashboardRepo>,
}

impl DashboardService {
    pub fn new(repo: Arc<dyn DashboardRepo>) -> Self {
        Self { repo }
    }

    pub async fn stats(&self) -> Result<DashboardStats, RepoError> {
        let posts = self.repo.post_stats().await?;
        let categories = self.repo.category_stats().await?;
        let recent_posts = self.repo.recent_posts(RECENT_POSTS_LIMIT).await?;

        Ok(DashboardStats {
            posts,
            categories,
            recent_posts,
        })
    }
}
