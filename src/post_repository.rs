use chrono::{NaiveDate, Utc};
use log::{debug, info, warn};
use sqlx::{QueryBuilder, Sqlite, Transaction};
use std::collections::HashMap;
use tokio::task::JoinHandle;

use crate::db::{
    generate_id, DbPool, Post, PostImage, PostInput, PostQuery, PostStatus, PostVersion,
};
use crate::db_types::parse_date;
use crate::error::{AppError, AppResult};
use crate::media_repository::{like_pattern, MediaRepository};

const POST_COLUMNS: &str = "id, title, platform, caption, image_url, image_data, ai_prompt, status, \
     publish_date, created_at, updated_at, user_id";

/// Validated scalar fields shared by create and full update.
struct PostFields<'a> {
    title: &'a str,
    platform: &'a str,
    status: PostStatus,
}

fn validate(input: &PostInput) -> AppResult<PostFields<'_>> {
    let title = required(input.title.as_deref(), "title")?;
    let platform = required(input.platform.as_deref(), "platform")?;
    let status = input
        .status
        .ok_or_else(|| AppError::validation("Missing required field: status"))?;
    Ok(PostFields {
        title,
        platform,
        status,
    })
}

fn required<'a>(value: Option<&'a str>, field: &str) -> AppResult<&'a str> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AppError::validation(format!(
            "Missing required field: {}",
            field
        ))),
    }
}

#[derive(Clone)]
pub struct PostRepository {
    pool: DbPool,
    media: MediaRepository,
}

impl PostRepository {
    pub fn new(pool: DbPool) -> Self {
        Self {
            media: MediaRepository::new(pool.clone()),
            pool,
        }
    }

    pub async fn list(&self, query: &PostQuery) -> AppResult<Vec<Post>> {
        let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM posts WHERE 1=1", POST_COLUMNS));

        if let Some(status) = query.status.as_deref().filter(|s| !s.is_empty() && *s != "all") {
            let status: PostStatus = status
                .parse()
                .map_err(|_| AppError::validation(format!("Invalid status '{}'", status)))?;
            qb.push(" AND status = ").push_bind(status);
        }

        if let Some(platform) = query
            .platform
            .as_deref()
            .filter(|p| !p.is_empty() && *p != "all")
        {
            qb.push(" AND platform = ").push_bind(platform.to_string());
        }

        if let Some(search) = query.search.as_deref().filter(|s| !s.trim().is_empty()) {
            let pattern = like_pattern(search.trim());
            qb.push(" AND (title LIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\' OR caption LIKE ")
                .push_bind(pattern)
                .push(" ESCAPE '\\')");
        }

        // The range only applies when both ends are given.
        if let (Some(start), Some(end)) = (
            query.start_date.as_deref().filter(|s| !s.is_empty()),
            query.end_date.as_deref().filter(|s| !s.is_empty()),
        ) {
            let start = parse_date(start).map_err(AppError::Validation)?;
            let end = parse_date(end).map_err(AppError::Validation)?;
            qb.push(" AND publish_date BETWEEN ")
                .push_bind(start)
                .push(" AND ")
                .push_bind(end);
        }

        qb.push(" ORDER BY publish_date DESC, created_at DESC");
        debug!("Post query: {}", qb.sql());

        let mut posts = qb.build_query_as::<Post>().fetch_all(&self.pool).await?;
        self.attach_children(&mut posts).await?;
        Ok(posts)
    }

    pub async fn get_by_id(&self, id: &str) -> AppResult<Post> {
        let post = sqlx::query_as::<_, Post>(&format!("SELECT {} FROM posts WHERE id = ?", POST_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::not_found("Post not found"))?;

        let mut posts = vec![post];
        self.attach_children(&mut posts).await?;
        Ok(posts.remove(0))
    }

    /// Inserts the post, its ordered images and the initial version together.
    pub async fn create(&self, input: &PostInput) -> AppResult<Post> {
        let fields = validate(input)?;
        let id = input
            .id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .unwrap_or_else(generate_id);
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        sqlx::query(&format!(
            "INSERT INTO posts ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            POST_COLUMNS
        ))
        .bind(&id)
        .bind(fields.title)
        .bind(fields.platform)
        .bind(&input.caption)
        .bind(&input.image_url)
        .bind(&input.image_data)
        .bind(&input.ai_prompt)
        .bind(fields.status)
        .bind(input.publish_date)
        .bind(now)
        .bind(now)
        .bind(&input.user_id)
        .execute(&mut *tx)
        .await?;

        insert_images(&mut tx, &id, input).await?;
        insert_version(&mut tx, &id, &fields, input).await?;

        tx.commit().await?;
        info!("Created post {} with {} image(s)", id, input.images.len());

        self.get_by_id(&id).await
    }

    /// Full update: scalar fields overwritten, image list replaced, version appended.
    pub async fn update(&self, id: &str, input: &PostInput) -> AppResult<Post> {
        let fields = validate(input)?;
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE posts SET title = ?, platform = ?, caption = ?, image_url = ?, image_data = ?, \
             ai_prompt = ?, status = ?, publish_date = ?, updated_at = ? WHERE id = ?",
        )
        .bind(fields.title)
        .bind(fields.platform)
        .bind(&input.caption)
        .bind(&input.image_url)
        .bind(&input.image_data)
        .bind(&input.ai_prompt)
        .bind(fields.status)
        .bind(input.publish_date)
        .bind(now)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Post not found"));
        }

        sqlx::query("DELETE FROM images WHERE post_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        insert_images(&mut tx, id, input).await?;
        insert_version(&mut tx, id, &fields, input).await?;

        tx.commit().await?;
        info!("Updated post {}", id);

        self.get_by_id(id).await
    }

    pub async fn update_publish_date(&self, id: &str, publish_date: Option<NaiveDate>) -> AppResult<()> {
        let result = sqlx::query("UPDATE posts SET publish_date = ?, updated_at = ? WHERE id = ?")
            .bind(publish_date)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Post not found"));
        }
        Ok(())
    }

    /// Images, versions and usage links cascade. Usage counters are untouched.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Post not found"));
        }
        info!("Deleted post {}", id);
        Ok(())
    }

    /// Every post, newest publish date first, with images for the URL fallback.
    pub async fn list_for_export(&self) -> AppResult<Vec<Post>> {
        let mut posts = sqlx::query_as::<_, Post>(&format!(
            "SELECT {} FROM posts ORDER BY publish_date DESC",
            POST_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        self.attach_children(&mut posts).await?;
        Ok(posts)
    }

    /// Records one usage per referenced media id. Failures are logged and
    /// skipped; returns how many increments succeeded.
    pub async fn track_media_usage(&self, post_id: &str, media_ids: &[String]) -> usize {
        let mut tracked = 0;
        for media_id in media_ids {
            match self.media.increment_usage(media_id, post_id).await {
                Ok(()) => tracked += 1,
                Err(e) => warn!(
                    "Failed to record usage of media {} by post {}: {}",
                    media_id, post_id, e
                ),
            }
        }
        tracked
    }

    /// Runs [`track_media_usage`](Self::track_media_usage) in the background so
    /// the post response never waits on it.
    pub fn spawn_usage_tracking(&self, post_id: String, media_ids: Vec<String>) -> JoinHandle<usize> {
        let repo = self.clone();
        tokio::spawn(async move {
            if media_ids.is_empty() {
                return 0;
            }
            let tracked = repo.track_media_usage(&post_id, &media_ids).await;
            debug!("Tracked {}/{} media usages for post {}", tracked, media_ids.len(), post_id);
            tracked
        })
    }

    async fn attach_children(&self, posts: &mut [Post]) -> AppResult<()> {
        if posts.is_empty() {
            return Ok(());
        }

        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT id, post_id, image_url, image_data, media_id, is_primary, position, created_at \
             FROM images WHERE post_id IN (",
        );
        push_ids(&mut qb, posts);
        qb.push(") ORDER BY post_id, position, id");
        let images: Vec<PostImage> = qb.build_query_as().fetch_all(&self.pool).await?;

        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT id, post_id, date, title, caption, status FROM versions WHERE post_id IN (",
        );
        push_ids(&mut qb, posts);
        qb.push(") ORDER BY post_id, date, id");
        let versions: Vec<PostVersion> = qb.build_query_as().fetch_all(&self.pool).await?;

        let mut images_by_post: HashMap<String, Vec<PostImage>> = HashMap::new();
        for image in images {
            images_by_post.entry(image.post_id.clone()).or_default().push(image);
        }
        let mut versions_by_post: HashMap<String, Vec<PostVersion>> = HashMap::new();
        for version in versions {
            versions_by_post
                .entry(version.post_id.clone())
                .or_default()
                .push(version);
        }

        for post in posts.iter_mut() {
            post.images = images_by_post.remove(&post.id).unwrap_or_default();
            post.versions = versions_by_post.remove(&post.id).unwrap_or_default();
        }
        Ok(())
    }
}

fn push_ids(qb: &mut QueryBuilder<'_, Sqlite>, posts: &[Post]) {
    let mut ids = qb.separated(", ");
    for post in posts {
        ids.push_bind(post.id.clone());
    }
}

async fn insert_images(
    tx: &mut Transaction<'_, Sqlite>,
    post_id: &str,
    input: &PostInput,
) -> AppResult<()> {
    let now = Utc::now();
    for (position, image) in input.images.iter().enumerate() {
        sqlx::query(
            "INSERT INTO images (post_id, image_url, image_data, media_id, is_primary, position, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(post_id)
        .bind(&image.image_url)
        .bind(&image.image_data)
        .bind(image.media_id.as_deref().filter(|m| !m.is_empty()))
        .bind(position == 0)
        .bind(position as i64)
        .bind(now)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

async fn insert_version(
    tx: &mut Transaction<'_, Sqlite>,
    post_id: &str,
    fields: &PostFields<'_>,
    input: &PostInput,
) -> AppResult<()> {
    sqlx::query("INSERT INTO versions (post_id, date, title, caption, status) VALUES (?, ?, ?, ?, ?)")
        .bind(post_id)
        .bind(Utc::now())
        .bind(fields.title)
        .bind(input.caption.as_deref().unwrap_or(""))
        .bind(fields.status.as_str())
        .execute(&mut **tx)
        .await?;
    Ok(())
}
