//! In-memory collaborators shared by the integration tests.
#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tokio::time::Instant;

use folio::application::repos::{
    AdminsRepo, CategoriesRepo, CategoryParams, CreatePostParams, DashboardRepo, HealthRepo,
    MediaRepo, NewMediaAsset, PostListScope, PostQueryFilter, PostsRepo, ProjectOrder,
    ProjectParams, ProjectsRepo, RepoError, TagParams, TagsRepo, UpdatePostParams, ViewCounter,
};
use folio::application::storage::{ObjectStorage, StorageError};
use folio::application::views::{ViewStore, ViewStoreError};
use folio::domain::entities::{
    AdminRecord, CategoryRecord, CategoryStat, MediaAsset, PostDetails, PostRecord, PostStats,
    ProjectRecord, RecentPost, TagBrief, TagRecord,
};
use folio::domain::media::PublicUrls;
use folio::domain::types::PostStatus;

pub const PUBLIC_BASE: &str = "http://localhost:9000";
pub const BUCKET: &str = "blog-images";

// ----- Fixtures -----

pub fn jpeg_bytes(width: u32, height: u32) -> Bytes {
    let image = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    encode(DynamicImage::ImageRgb8(image), ImageFormat::Jpeg)
}

pub fn png_with_alpha(width: u32, height: u32) -> Bytes {
    let image = RgbaImage::from_pixel(width, height, Rgba([10, 20, 30, 0]));
    encode(DynamicImage::ImageRgba8(image), ImageFormat::Png)
}

fn encode(image: DynamicImage, format: ImageFormat) -> Bytes {
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, format)
        .expect("fixture image encodes");
    Bytes::from(buffer.into_inner())
}

pub fn decoded_dimensions(bytes: &[u8]) -> (u32, u32) {
    let image = image::load_from_memory(bytes).expect("stored artifact decodes");
    (image.width(), image.height())
}

// ----- Object storage -----

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub body: Bytes,
    pub content_type: String,
}

/// Storage fake with fault injection on puts (by path suffix) and deletes
/// (by exact path).
pub struct MemoryStorage {
    urls: PublicUrls,
    objects: Mutex<BTreeMap<String, StoredObject>>,
    put_log: Mutex<Vec<String>>,
    delete_log: Mutex<Vec<String>>,
    fail_put_suffix: Mutex<Option<String>>,
    fail_delete: Mutex<HashSet<String>>,
    hang_put_suffix: Mutex<Option<String>>,
    hang_next_delete: AtomicBool,
    unavailable: AtomicBool,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self {
            urls: PublicUrls::new(PUBLIC_BASE, BUCKET),
            objects: Mutex::default(),
            put_log: Mutex::default(),
            delete_log: Mutex::default(),
            fail_put_suffix: Mutex::default(),
            fail_delete: Mutex::default(),
            hang_put_suffix: Mutex::default(),
            hang_next_delete: AtomicBool::new(false),
            unavailable: AtomicBool::new(false),
        }
    }
}

impl MemoryStorage {
    pub async fn fail_puts_ending_with(&self, suffix: &str) {
        *self.fail_put_suffix.lock().await = Some(suffix.to_string());
    }

    pub async fn fail_delete_of(&self, path: &str) {
        self.fail_delete.lock().await.insert(path.to_string());
    }

    /// Puts to matching paths never complete.
    pub async fn hang_puts_ending_with(&self, suffix: &str) {
        *self.hang_put_suffix.lock().await = Some(suffix.to_string());
    }

    /// The next delete never completes; later deletes behave normally.
    pub fn hang_next_delete(&self) {
        self.hang_next_delete.store(true, Ordering::SeqCst);
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub async fn object(&self, path: &str) -> Option<StoredObject> {
        self.objects.lock().await.get(path).cloned()
    }

    pub async fn paths(&self) -> Vec<String> {
        self.objects.lock().await.keys().cloned().collect()
    }

    pub async fn puts(&self) -> Vec<String> {
        self.put_log.lock().await.clone()
    }

    pub async fn deletes(&self) -> Vec<String> {
        self.delete_log.lock().await.clone()
    }
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    async fn put(&self, path: &str, body: Bytes, content_type: &str) -> Result<(), StorageError> {
        self.put_log.lock().await.push(path.to_string());
        let failing = self.fail_put_suffix.lock().await.clone();
        if failing.is_some_and(|suffix| path.ends_with(&suffix)) {
            return Err(StorageError::request(path, "injected put failure"));
        }
        let hanging = self.hang_put_suffix.lock().await.clone();
        if hanging.is_some_and(|suffix| path.ends_with(&suffix)) {
            std::future::pending::<()>().await;
        }

        self.objects.lock().await.insert(
            path.to_string(),
            StoredObject {
                body,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<(), StorageError> {
        self.delete_log.lock().await.push(path.to_string());
        if self.fail_delete.lock().await.contains(path) {
            return Err(StorageError::request(path, "injected delete failure"));
        }
        if self.hang_next_delete.swap(false, Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        self.objects.lock().await.remove(path);
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        self.urls.url_for(path)
    }

    fn path_from_url(&self, url: &str) -> Option<String> {
        self.urls.path_for(url)
    }

    async fn health_check(&self) -> Result<(), StorageError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("injected outage".into()));
        }
        Ok(())
    }
}

// ----- View store -----

/// Keys expire against the tokio clock so paused-time tests can advance it.
#[derive(Default)]
pub struct MemoryViewStore {
    entries: Mutex<HashMap<String, Instant>>,
    unavailable: AtomicBool,
}

impl MemoryViewStore {
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub async fn keys(&self) -> Vec<String> {
        self.entries.lock().await.keys().cloned().collect()
    }

    fn check(&self) -> Result<(), ViewStoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(ViewStoreError::Connection("injected outage".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl ViewStore for MemoryViewStore {
    async fn set_if_absent(&self, key: &str, ttl: Duration) -> Result<bool, ViewStoreError> {
        self.check()?;
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(expires_at) if *expires_at > now => Ok(false),
            _ => {
                entries.insert(key.to_string(), now + ttl);
                Ok(true)
            }
        }
    }

    async fn exists(&self, key: &str) -> Result<bool, ViewStoreError> {
        self.check()?;
        let now = Instant::now();
        Ok(self
            .entries
            .lock()
            .await
            .get(key)
            .is_some_and(|expires_at| *expires_at > now))
    }

    async fn ping(&self) -> Result<(), ViewStoreError> {
        self.check()
    }
}

#[derive(Default)]
pub struct CountingViewCounter {
    counts: Mutex<HashMap<i64, u64>>,
    failing: AtomicBool,
}

impl CountingViewCounter {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn count(&self, post_id: i64) -> u64 {
        self.counts
            .lock()
            .await
            .get(&post_id)
            .copied()
            .unwrap_or_default()
    }
}

#[async_trait]
impl ViewCounter for CountingViewCounter {
    async fn increment_view_count(&self, post_id: i64) -> Result<(), RepoError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(RepoError::from_persistence("injected counter failure"));
        }
        *self.counts.lock().await.entry(post_id).or_default() += 1;
        Ok(())
    }
}

// ----- Metadata store -----

#[derive(Default)]
struct Tables {
    next_id: i64,
    posts: BTreeMap<i64, PostRecord>,
    post_tags: HashMap<i64, Vec<i64>>,
    categories: BTreeMap<i64, CategoryRecord>,
    tags: BTreeMap<i64, TagRecord>,
    projects: BTreeMap<i64, ProjectRecord>,
    media: BTreeMap<i64, MediaAsset>,
    admins: BTreeMap<i64, AdminRecord>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn details(&self, post: &PostRecord) -> PostDetails {
        let category = post
            .category_id
            .and_then(|id| self.categories.get(&id));
        let tags = self
            .post_tags
            .get(&post.id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| self.tags.get(id))
                    .map(|tag| TagBrief {
                        id: tag.id,
                        name: tag.name.clone(),
                        slug: tag.slug.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        PostDetails {
            post: post.clone(),
            category_name: category.map(|c| c.name.clone()),
            category_slug: category.map(|c| c.slug.clone()),
            tags,
        }
    }

    fn matching_posts(&self, scope: PostListScope, filter: &PostQueryFilter) -> Vec<&PostRecord> {
        let mut posts: Vec<&PostRecord> = self
            .posts
            .values()
            .filter(|post| match scope {
                PostListScope::Public => post.status == PostStatus::Published,
                PostListScope::Admin { status } => status.is_none_or(|s| post.status == s),
            })
            .filter(|post| {
                filter
                    .category_id
                    .is_none_or(|id| post.category_id == Some(id))
            })
            .filter(|post| {
                filter.tag_id.is_none_or(|id| {
                    self.post_tags
                        .get(&post.id)
                        .is_some_and(|tags| tags.contains(&id))
                })
            })
            .filter(|post| {
                filter.search.as_deref().is_none_or(|needle| {
                    let needle = needle.to_lowercase();
                    [&post.title, &post.content, &post.excerpt]
                        .iter()
                        .any(|field| field.to_lowercase().contains(&needle))
                })
            })
            .collect();

        match scope {
            PostListScope::Public => posts.sort_by(|a, b| {
                b.published_at
                    .cmp(&a.published_at)
                    .then_with(|| b.id.cmp(&a.id))
            }),
            PostListScope::Admin { .. } => posts.sort_by(|a, b| {
                b.created_at
                    .cmp(&a.created_at)
                    .then_with(|| b.id.cmp(&a.id))
            }),
        }
        posts
    }

    fn category_post_count(&self, id: i64) -> i64 {
        self.posts
            .values()
            .filter(|post| post.category_id == Some(id))
            .count() as i64
    }

    fn tag_post_count(&self, id: i64) -> i64 {
        self.post_tags
            .values()
            .filter(|tags| tags.contains(&id))
            .count() as i64
    }
}

/// One in-memory database implementing every repository trait.
#[derive(Default)]
pub struct MemoryRepos {
    tables: Mutex<Tables>,
    unavailable: AtomicBool,
}

impl MemoryRepos {
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub async fn media_count(&self) -> usize {
        self.tables.lock().await.media.len()
    }

    pub async fn view_count(&self, post_id: i64) -> Option<i32> {
        self.tables
            .lock()
            .await
            .posts
            .get(&post_id)
            .map(|post| post.view_count)
    }
}

fn page<T: Clone>(items: Vec<&T>, limit: u32, offset: u64) -> Vec<T> {
    items
        .into_iter()
        .skip(offset as usize)
        .take(limit as usize)
        .cloned()
        .collect()
}

#[async_trait]
impl PostsRepo for MemoryRepos {
    async fn list_posts(
        &self,
        scope: PostListScope,
        filter: &PostQueryFilter,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<PostDetails>, RepoError> {
        let tables = self.tables.lock().await;
        let posts = page(tables.matching_posts(scope, filter), limit, offset);
        Ok(posts.iter().map(|post| tables.details(post)).collect())
    }

    async fn count_posts(
        &self,
        scope: PostListScope,
        filter: &PostQueryFilter,
    ) -> Result<u64, RepoError> {
        let tables = self.tables.lock().await;
        Ok(tables.matching_posts(scope, filter).len() as u64)
    }

    async fn find_post(&self, id: i64) -> Result<Option<PostDetails>, RepoError> {
        let tables = self.tables.lock().await;
        Ok(tables.posts.get(&id).map(|post| tables.details(post)))
    }

    async fn find_post_by_slug(&self, slug: &str) -> Result<Option<PostDetails>, RepoError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .posts
            .values()
            .find(|post| post.slug == slug)
            .map(|post| tables.details(post)))
    }

    async fn post_slug_exists(&self, slug: &str, exclude: Option<i64>) -> Result<bool, RepoError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .posts
            .values()
            .any(|post| post.slug == slug && Some(post.id) != exclude))
    }

    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let mut tables = self.tables.lock().await;
        let id = tables.next_id();
        let now = OffsetDateTime::now_utc();
        let content = params.content;
        let record = PostRecord {
            id,
            title: content.title,
            slug: content.slug,
            content: content.content,
            excerpt: content.excerpt,
            category_id: content.category_id,
            status: params.status,
            view_count: 0,
            reading_time: content.reading_time,
            thumbnail: content.thumbnail,
            created_at: now,
            updated_at: now,
            published_at: (params.status == PostStatus::Published).then_some(now),
        };
        tables.posts.insert(id, record.clone());
        Ok(record)
    }

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError> {
        let mut tables = self.tables.lock().await;
        let post = tables.posts.get_mut(&params.id).ok_or(RepoError::NotFound)?;
        let content = params.content;
        post.title = content.title;
        post.slug = content.slug;
        post.content = content.content;
        post.excerpt = content.excerpt;
        post.category_id = content.category_id;
        post.reading_time = content.reading_time;
        post.thumbnail = content.thumbnail;
        post.updated_at = OffsetDateTime::now_utc();
        Ok(post.clone())
    }

    async fn set_post_published(
        &self,
        id: i64,
        published: bool,
    ) -> Result<PostRecord, RepoError> {
        let mut tables = self.tables.lock().await;
        let post = tables.posts.get_mut(&id).ok_or(RepoError::NotFound)?;
        if published {
            post.status = PostStatus::Published;
            post.published_at.get_or_insert_with(OffsetDateTime::now_utc);
        } else {
            post.status = PostStatus::Draft;
        }
        Ok(post.clone())
    }

    async fn delete_post(&self, id: i64) -> Result<(), RepoError> {
        let mut tables = self.tables.lock().await;
        tables.post_tags.remove(&id);
        tables.posts.remove(&id).map(|_| ()).ok_or(RepoError::NotFound)
    }

    async fn replace_post_tags(&self, post_id: i64, tag_ids: &[i64]) -> Result<(), RepoError> {
        let mut tables = self.tables.lock().await;
        if let Some(missing) = tag_ids.iter().find(|id| !tables.tags.contains_key(*id)) {
            return Err(RepoError::InvalidInput {
                message: format!("tag {missing} does not exist"),
            });
        }
        tables.post_tags.insert(post_id, tag_ids.to_vec());
        Ok(())
    }
}

#[async_trait]
impl ViewCounter for MemoryRepos {
    async fn increment_view_count(&self, post_id: i64) -> Result<(), RepoError> {
        let mut tables = self.tables.lock().await;
        let post = tables.posts.get_mut(&post_id).ok_or(RepoError::NotFound)?;
        post.view_count += 1;
        Ok(())
    }
}

#[async_trait]
impl CategoriesRepo for MemoryRepos {
    async fn list_categories(&self) -> Result<Vec<CategoryRecord>, RepoError> {
        let tables = self.tables.lock().await;
        let mut items: Vec<CategoryRecord> = tables
            .categories
            .values()
            .map(|category| CategoryRecord {
                post_count: tables.category_post_count(category.id),
                ..category.clone()
            })
            .collect();
        items.sort_by(|a, b| {
            a.sort_order
                .cmp(&b.sort_order)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(items)
    }

    async fn find_category(&self, id: i64) -> Result<Option<CategoryRecord>, RepoError> {
        Ok(self.tables.lock().await.categories.get(&id).cloned())
    }

    async fn find_category_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<CategoryRecord>, RepoError> {
        Ok(self
            .tables
            .lock()
            .await
            .categories
            .values()
            .find(|category| category.slug == slug)
            .cloned())
    }

    async fn category_slug_exists(
        &self,
        slug: &str,
        exclude: Option<i64>,
    ) -> Result<bool, RepoError> {
        Ok(self
            .tables
            .lock()
            .await
            .categories
            .values()
            .any(|category| category.slug == slug && Some(category.id) != exclude))
    }

    async fn create_category(&self, params: CategoryParams) -> Result<CategoryRecord, RepoError> {
        let mut tables = self.tables.lock().await;
        let id = tables.next_id();
        let record = CategoryRecord {
            id,
            name: params.name,
            slug: params.slug,
            description: params.description,
            sort_order: params.sort_order,
            post_count: 0,
            created_at: OffsetDateTime::now_utc(),
        };
        tables.categories.insert(id, record.clone());
        Ok(record)
    }

    async fn update_category(
        &self,
        id: i64,
        params: CategoryParams,
    ) -> Result<CategoryRecord, RepoError> {
        let mut tables = self.tables.lock().await;
        let category = tables.categories.get_mut(&id).ok_or(RepoError::NotFound)?;
        category.name = params.name;
        category.slug = params.slug;
        category.description = params.description;
        category.sort_order = params.sort_order;
        Ok(category.clone())
    }

    async fn delete_category(&self, id: i64) -> Result<(), RepoError> {
        self.tables
            .lock()
            .await
            .categories
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }

    async fn count_category_posts(&self, id: i64) -> Result<u64, RepoError> {
        Ok(self.tables.lock().await.category_post_count(id) as u64)
    }
}

#[async_trait]
impl TagsRepo for MemoryRepos {
    async fn list_tags(&self) -> Result<Vec<TagRecord>, RepoError> {
        let tables = self.tables.lock().await;
        let mut items: Vec<TagRecord> = tables
            .tags
            .values()
            .map(|tag| TagRecord {
                post_count: tables.tag_post_count(tag.id),
                ..tag.clone()
            })
            .collect();
        items.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(items)
    }

    async fn find_tag(&self, id: i64) -> Result<Option<TagRecord>, RepoError> {
        Ok(self.tables.lock().await.tags.get(&id).cloned())
    }

    async fn find_tag_by_slug(&self, slug: &str) -> Result<Option<TagRecord>, RepoError> {
        Ok(self
            .tables
            .lock()
            .await
            .tags
            .values()
            .find(|tag| tag.slug == slug)
            .cloned())
    }

    async fn tag_slug_exists(&self, slug: &str, exclude: Option<i64>) -> Result<bool, RepoError> {
        Ok(self
            .tables
            .lock()
            .await
            .tags
            .values()
            .any(|tag| tag.slug == slug && Some(tag.id) != exclude))
    }

    async fn create_tag(&self, params: TagParams) -> Result<TagRecord, RepoError> {
        let mut tables = self.tables.lock().await;
        let id = tables.next_id();
        let record = TagRecord {
            id,
            name: params.name,
            slug: params.slug,
            post_count: 0,
            created_at: OffsetDateTime::now_utc(),
        };
        tables.tags.insert(id, record.clone());
        Ok(record)
    }

    async fn update_tag(&self, id: i64, params: TagParams) -> Result<TagRecord, RepoError> {
        let mut tables = self.tables.lock().await;
        let tag = tables.tags.get_mut(&id).ok_or(RepoError::NotFound)?;
        tag.name = params.name;
        tag.slug = params.slug;
        Ok(tag.clone())
    }

    async fn delete_tag(&self, id: i64) -> Result<(), RepoError> {
        self.tables
            .lock()
            .await
            .tags
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }

    async fn count_tag_usage(&self, id: i64) -> Result<u64, RepoError> {
        Ok(self.tables.lock().await.tag_post_count(id) as u64)
    }
}

#[async_trait]
impl ProjectsRepo for MemoryRepos {
    async fn list_projects(&self, featured_only: bool) -> Result<Vec<ProjectRecord>, RepoError> {
        let tables = self.tables.lock().await;
        let mut items: Vec<ProjectRecord> = tables
            .projects
            .values()
            .filter(|project| !featured_only || project.is_featured)
            .cloned()
            .collect();
        items.sort_by(|a, b| {
            a.sort_order
                .cmp(&b.sort_order)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        Ok(items)
    }

    async fn find_project(&self, id: i64) -> Result<Option<ProjectRecord>, RepoError> {
        Ok(self.tables.lock().await.projects.get(&id).cloned())
    }

    async fn find_project_by_slug(&self, slug: &str) -> Result<Option<ProjectRecord>, RepoError> {
        Ok(self
            .tables
            .lock()
            .await
            .projects
            .values()
            .find(|project| project.slug == slug)
            .cloned())
    }

    async fn project_slug_exists(
        &self,
        slug: &str,
        exclude: Option<i64>,
    ) -> Result<bool, RepoError> {
        Ok(self
            .tables
            .lock()
            .await
            .projects
            .values()
            .any(|project| project.slug == slug && Some(project.id) != exclude))
    }

    async fn create_project(&self, params: ProjectParams) -> Result<ProjectRecord, RepoError> {
        let mut tables = self.tables.lock().await;
        let id = tables.next_id();
        let record = ProjectRecord {
            id,
            title: params.title,
            slug: params.slug,
            description: params.description,
            content: params.content,
            tech_stack: params.tech_stack,
            demo_url: params.demo_url,
            github_url: params.github_url,
            thumbnail: params.thumbnail,
            images: params.images,
            is_featured: params.is_featured,
            sort_order: params.sort_order,
            created_at: OffsetDateTime::now_utc(),
            updated_at: None,
        };
        tables.projects.insert(id, record.clone());
        Ok(record)
    }

    async fn update_project(
        &self,
        id: i64,
        params: ProjectParams,
    ) -> Result<ProjectRecord, RepoError> {
        let mut tables = self.tables.lock().await;
        let project = tables.projects.get_mut(&id).ok_or(RepoError::NotFound)?;
        project.title = params.title;
        project.slug = params.slug;
        project.description = params.description;
        project.content = params.content;
        project.tech_stack = params.tech_stack;
        project.demo_url = params.demo_url;
        project.github_url = params.github_url;
        project.thumbnail = params.thumbnail;
        project.images = params.images;
        project.is_featured = params.is_featured;
        project.sort_order = params.sort_order;
        project.updated_at = Some(OffsetDateTime::now_utc());
        Ok(project.clone())
    }

    async fn delete_project(&self, id: i64) -> Result<(), RepoError> {
        self.tables
            .lock()
            .await
            .projects
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }

    async fn reorder_projects(&self, orders: &[ProjectOrder]) -> Result<(), RepoError> {
        let mut tables = self.tables.lock().await;
        if orders
            .iter()
            .any(|order| !tables.projects.contains_key(&order.id))
        {
            return Err(RepoError::NotFound);
        }
        for order in orders {
            if let Some(project) = tables.projects.get_mut(&order.id) {
                project.sort_order = order.sort_order;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl MediaRepo for MemoryRepos {
    async fn create_media(&self, asset: NewMediaAsset) -> Result<MediaAsset, RepoError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RepoError::from_persistence("injected metadata outage"));
        }
        let mut tables = self.tables.lock().await;
        let id = tables.next_id();
        let record = MediaAsset {
            id,
            filename: asset.filename,
            original_name: asset.original_name,
            path: asset.path,
            url: asset.url,
            mime_type: asset.mime_type,
            size: asset.size,
            width: asset.width,
            height: asset.height,
            thumbnail_sm: asset.thumbnail_sm,
            thumbnail_md: asset.thumbnail_md,
            created_at: OffsetDateTime::now_utc(),
        };
        tables.media.insert(id, record.clone());
        Ok(record)
    }

    async fn find_media(&self, id: i64) -> Result<Option<MediaAsset>, RepoError> {
        Ok(self.tables.lock().await.media.get(&id).cloned())
    }

    async fn delete_media(&self, id: i64) -> Result<(), RepoError> {
        self.tables
            .lock()
            .await
            .media
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }

    async fn list_media(&self, limit: u32, offset: u64) -> Result<Vec<MediaAsset>, RepoError> {
        let tables = self.tables.lock().await;
        let newest_first: Vec<&MediaAsset> = tables.media.values().rev().collect();
        Ok(page(newest_first, limit, offset))
    }

    async fn count_media(&self) -> Result<u64, RepoError> {
        Ok(self.tables.lock().await.media.len() as u64)
    }
}

#[async_trait]
impl AdminsRepo for MemoryRepos {
    async fn find_admin(&self, id: i64) -> Result<Option<AdminRecord>, RepoError> {
        Ok(self.tables.lock().await.admins.get(&id).cloned())
    }

    async fn find_admin_by_username(
        &self,
        username: &str,
    ) -> Result<Option<AdminRecord>, RepoError> {
        Ok(self
            .tables
            .lock()
            .await
            .admins
            .values()
            .find(|admin| admin.username == username)
            .cloned())
    }

    async fn create_admin(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<AdminRecord, RepoError> {
        let mut tables = self.tables.lock().await;
        let id = tables.next_id();
        let record = AdminRecord {
            id,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            created_at: OffsetDateTime::now_utc(),
        };
        tables.admins.insert(id, record.clone());
        Ok(record)
    }
}

#[async_trait]
impl DashboardRepo for MemoryRepos {
    async fn post_stats(&self) -> Result<PostStats, RepoError> {
        let tables = self.tables.lock().await;
        let total = tables.posts.len() as u64;
        let published = tables
            .posts
            .values()
            .filter(|post| post.status == PostStatus::Published)
            .count() as u64;
        Ok(PostStats {
            total,
            published,
            draft: total - published,
        })
    }

    async fn category_stats(&self) -> Result<Vec<CategoryStat>, RepoError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .categories
            .values()
            .map(|category| CategoryStat {
                id: category.id,
                name: category.name.clone(),
                slug: category.slug.clone(),
                post_count: tables.category_post_count(category.id) as u64,
            })
            .collect())
    }

    async fn recent_posts(&self, limit: u32) -> Result<Vec<RecentPost>, RepoError> {
        let tables = self.tables.lock().await;
        let mut posts: Vec<&PostRecord> = tables.posts.values().collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(posts
            .into_iter()
            .take(limit as usize)
            .map(|post| RecentPost {
                id: post.id,
                title: post.title.clone(),
                slug: post.slug.clone(),
                status: post.status,
                view_count: post.view_count,
                created_at: post.created_at,
                published_at: post.published_at,
            })
            .collect())
    }
}

#[async_trait]
impl HealthRepo for MemoryRepos {
    async fn ping(&self) -> Result<(), RepoError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RepoError::from_persistence("injected metadata outage"));
        }
        Ok(())
    }
}

pub fn shared<T>(value: T) -> Arc<T> {
    Arc::new(value)
}
