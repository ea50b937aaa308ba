use chrono::Utc;
use log::debug;
use sqlx::{QueryBuilder, Sqlite};
use std::collections::HashMap;

use crate::db::{generate_id, DbPool, Media, MediaQuery, MetadataUpdate, NewMedia};
use crate::db_types::normalize_tags;
use crate::error::{AppError, AppResult};

const MEDIA_SELECT: &str = "SELECT m.id, m.filename, m.original_name, m.file_url, m.thumbnail_url, \
     m.file_size, m.mime_type, m.media_type, m.width, m.height, m.duration, m.uploaded_at, m.user_id, \
     mm.shooting_id, s.name AS shooting_name, \
     COALESCE(mm.is_favorite, 0) AS is_favorite, \
     COALESCE(mm.usage_count, 0) AS usage_count, \
     mm.last_used_at, mm.notes \
     FROM media m \
     LEFT JOIN media_metadata mm ON m.id = mm.media_id \
     LEFT JOIN shootings s ON mm.shooting_id = s.id";

/// Persistence and the faceted read path for library media.
#[derive(Clone)]
pub struct MediaRepository {
    pool: DbPool,
}

impl MediaRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn query(&self, query: &MediaQuery) -> AppResult<Vec<Media>> {
        let mut qb = QueryBuilder::<Sqlite>::new(MEDIA_SELECT);
        qb.push(" WHERE 1=1");

        if let Some(search) = &query.search {
            let pattern = like_pattern(search);
            qb.push(" AND (m.original_name LIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\' OR m.filename LIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\' OR EXISTS (SELECT 1 FROM media_tags t WHERE t.media_id = m.id AND t.tag LIKE ")
                .push_bind(pattern)
                .push(" ESCAPE '\\'))");
        }

        if let Some(media_type) = &query.media_type {
            qb.push(" AND m.media_type = ").push_bind(media_type.clone());
        }

        if let Some(shooting_id) = &query.shooting_id {
            qb.push(" AND mm.shooting_id = ").push_bind(shooting_id.clone());
        }

        if query.favorites_only {
            qb.push(" AND mm.is_favorite = 1");
        }

        match query.is_used {
            Some(true) => {
                qb.push(" AND mm.usage_count > 0");
            }
            Some(false) => {
                qb.push(" AND (mm.usage_count = 0 OR mm.usage_count IS NULL)");
            }
            None => {}
        }

        // Every requested tag must be present on the item.
        for tag in &query.tags {
            qb.push(" AND EXISTS (SELECT 1 FROM media_tags t WHERE t.media_id = m.id AND t.tag = ")
                .push_bind(tag.clone())
                .push(")");
        }

        let order = query.sort_order.as_sql();
        qb.push(format!(
            " ORDER BY {} {}, m.id {}",
            query.sort_by.column(),
            order,
            order
        ));
        qb.push(" LIMIT ")
            .push_bind(query.limit)
            .push(" OFFSET ")
            .push_bind(query.offset);

        debug!("Media query: {}", qb.sql());

        let mut media = qb.build_query_as::<Media>().fetch_all(&self.pool).await?;
        self.attach_tags(&mut media).await?;
        Ok(media)
    }

    pub async fn get_by_id(&self, id: &str) -> AppResult<Media> {
        let mut media = sqlx::query_as::<_, Media>(&format!("{} WHERE m.id = ?", MEDIA_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::not_found("Media not found"))?;

        media.tags = self.tags_for(id).await?;
        Ok(media)
    }

    /// Inserts the media row and its empty metadata sidecar in one transaction.
    pub async fn create(&self, data: NewMedia) -> AppResult<Media> {
        validate_new_media(&data)?;
        let media_type = data
            .media_type
            .ok_or_else(|| AppError::validation("Missing required field: mediaType"))?;
        let id = if data.id.is_empty() {
            generate_id()
        } else {
            data.id.clone()
        };
        let uploaded_at = Utc::now();

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO media (id, filename, original_name, file_url, thumbnail_url, file_size, \
             mime_type, media_type, width, height, duration, uploaded_at, user_id) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, NULL, ?, ?)",
        )
        .bind(&id)
        .bind(&data.filename)
        .bind(&data.original_name)
        .bind(&data.file_url)
        .bind(&data.thumbnail_url)
        .bind(data.file_size)
        .bind(&data.mime_type)
        .bind(media_type)
        .bind(data.width)
        .bind(data.height)
        .bind(uploaded_at)
        .bind(&data.user_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO media_metadata (media_id) VALUES (?)")
            .bind(&id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        self.get_by_id(&id).await
    }

    pub async fn update_metadata(&self, id: &str, update: &MetadataUpdate) -> AppResult<Media> {
        if update.is_empty() {
            return Err(AppError::validation("No fields to update"));
        }

        let mut tx = self.pool.begin().await?;

        let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM media_metadata WHERE media_id = ?")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
        if exists == 0 {
            return Err(AppError::not_found("Media not found"));
        }

        if update.shooting_id.is_some() || update.is_favorite.is_some() || update.notes.is_some() {
            let mut qb = QueryBuilder::<Sqlite>::new("UPDATE media_metadata SET ");
            let mut fields = qb.separated(", ");
            if let Some(shooting_id) = &update.shooting_id {
                fields
                    .push("shooting_id = ")
                    .push_bind_unseparated(shooting_id.clone());
            }
            if let Some(is_favorite) = update.is_favorite {
                fields.push("is_favorite = ").push_bind_unseparated(is_favorite);
            }
            if let Some(notes) = &update.notes {
                fields.push("notes = ").push_bind_unseparated(notes.clone());
            }
            qb.push(" WHERE media_id = ").push_bind(id);
            qb.build().execute(&mut *tx).await?;
        }

        if let Some(tags) = &update.tags {
            sqlx::query("DELETE FROM media_tags WHERE media_id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await?;

            for (position, tag) in normalize_tags(tags).iter().enumerate() {
                sqlx::query("INSERT INTO media_tags (media_id, tag, position) VALUES (?, ?, ?)")
                    .bind(id)
                    .bind(tag)
                    .bind(position as i64)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        tx.commit().await?;

        self.get_by_id(id).await
    }

    /// Removes the media row; metadata, tags and usage links go with it by cascade.
    /// Backing files are left to the caller.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM media WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Media not found"));
        }
        Ok(())
    }

    /// Links the media to the post (a no-op when already linked) and bumps the
    /// lifetime usage counter. The counter moves on every call.
    pub async fn increment_usage(&self, media_id: &str, post_id: &str) -> AppResult<()> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO media_posts (media_id, post_id, created_at) VALUES (?, ?, ?) \
             ON CONFLICT(media_id, post_id) DO NOTHING",
        )
        .bind(media_id)
        .bind(post_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let result = sqlx::query(
            "UPDATE media_metadata SET usage_count = usage_count + 1, last_used_at = ? \
             WHERE media_id = ?",
        )
        .bind(now)
        .bind(media_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Media not found"));
        }

        tx.commit().await?;
        Ok(())
    }

    /// Ids of the posts currently linked to a media item.
    pub async fn linked_post_ids(&self, media_id: &str) -> AppResult<Vec<String>> {
        let ids = sqlx::query_scalar(
            "SELECT post_id FROM media_posts WHERE media_id = ? ORDER BY created_at, post_id",
        )
        .bind(media_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    async fn tags_for(&self, media_id: &str) -> AppResult<Vec<String>> {
        let tags = sqlx::query_scalar(
            "SELECT tag FROM media_tags WHERE media_id = ? ORDER BY position",
        )
        .bind(media_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(tags)
    }

    async fn attach_tags(&self, media: &mut [Media]) -> AppResult<()> {
        if media.is_empty() {
            return Ok(());
        }

        let mut qb = QueryBuilder::<Sqlite>::new("SELECT media_id, tag FROM media_tags WHERE media_id IN (");
        let mut ids = qb.separated(", ");
        for item in media.iter() {
            ids.push_bind(item.id.clone());
        }
        qb.push(") ORDER BY media_id, position");

        let rows: Vec<(String, String)> = qb.build_query_as().fetch_all(&self.pool).await?;

        let mut by_media: HashMap<String, Vec<String>> = HashMap::new();
        for (media_id, tag) in rows {
            by_media.entry(media_id).or_default().push(tag);
        }
        for item in media.iter_mut() {
            item.tags = by_media.remove(&item.id).unwrap_or_default();
        }
        Ok(())
    }
}

fn validate_new_media(data: &NewMedia) -> AppResult<()> {
    let required = [
        ("filename", data.filename.as_str()),
        ("originalName", data.original_name.as_str()),
        ("fileUrl", data.file_url.as_str()),
        ("mimeType", data.mime_type.as_str()),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(AppError::validation(format!(
                "Missing required field: {}",
                field
            )));
        }
    }
    if data.file_size <= 0 {
        return Err(AppError::validation("Missing required field: fileSize"));
    }
    Ok(())
}

/// Substring pattern for LIKE with `%`, `_` and `\` escaped.
pub(crate) fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::db::{create_in_memory_pool, MediaType, NewShooting};
    use crate::db_types::{MediaSortField, SortOrder};
    use crate::shooting_repository::ShootingRepository;

    pub(crate) fn new_media(name: &str, media_type: MediaType, size: i64) -> NewMedia {
        let mime_type = match media_type {
            MediaType::Image => "image/jpeg",
            MediaType::Video => "video/mp4",
        };
        NewMedia {
            id: String::new(),
            filename: format!("stored-{}", name),
            original_name: name.to_string(),
            file_url: format!("http://localhost/uploads/stored-{}", name),
            thumbnail_url: None,
            file_size: size,
            mime_type: mime_type.to_string(),
            media_type: Some(media_type),
            width: None,
            height: None,
            user_id: None,
        }
    }

    async fn setup() -> (DbPool, MediaRepository) {
        let pool = create_in_memory_pool().await.unwrap();
        (pool.clone(), MediaRepository::new(pool))
    }

    async fn insert_post(pool: &DbPool, id: &str) {
        sqlx::query(
            "INSERT INTO posts (id, title, platform, status, created_at, updated_at) \
             VALUES (?, 'title', 'Instagram', 'draft', ?, ?)",
        )
        .bind(id)
        .bind(Utc::now())
        .bind(Utc::now())
        .execute(pool)
        .await
        .unwrap();
    }

    fn tags(values: &[&str]) -> Option<Vec<String>> {
        Some(values.iter().map(|s| s.to_string()).collect())
    }

    #[tokio::test]
    async fn test_create_adds_empty_metadata() {
        let (_pool, repo) = setup().await;
        let media = repo
            .create(new_media("cat.jpg", MediaType::Image, 2048))
            .await
            .unwrap();

        assert_eq!(media.original_name, "cat.jpg");
        assert_eq!(media.media_type, MediaType::Image);
        assert_eq!(media.usage_count, 0);
        assert!(!media.is_favorite);
        assert!(media.tags.is_empty());
        assert!(media.last_used_at.is_none());
        assert!(media.duration.is_none());
    }

    #[tokio::test]
    async fn test_create_rejects_missing_fields() {
        let (pool, repo) = setup().await;

        let mut data = new_media("cat.jpg", MediaType::Image, 2048);
        data.file_url = String::new();
        assert!(matches!(repo.create(data).await, Err(AppError::Validation(_))));

        let data = new_media("empty.jpg", MediaType::Image, 0);
        assert!(matches!(repo.create(data).await, Err(AppError::Validation(_))));

        let mut data = new_media("cat.jpg", MediaType::Image, 2048);
        data.media_type = None;
        assert!(matches!(repo.create(data).await, Err(AppError::Validation(_))));

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM media")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_get_unknown_is_not_found() {
        let (_pool, repo) = setup().await;
        assert!(matches!(
            repo.get_by_id("missing").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_metadata_partial() {
        let (_pool, repo) = setup().await;
        let media = repo
            .create(new_media("cat.jpg", MediaType::Image, 2048))
            .await
            .unwrap();

        let update = MetadataUpdate {
            is_favorite: Some(true),
            tags: tags(&["pets", "indoor"]),
            notes: Some(Some("first shot".to_string())),
            ..Default::default()
        };
        let updated = repo.update_metadata(&media.id, &update).await.unwrap();
        assert!(updated.is_favorite);
        assert_eq!(updated.tags, vec!["pets", "indoor"]);
        assert_eq!(updated.notes.as_deref(), Some("first shot"));

        // Only the supplied field changes
        let update = MetadataUpdate {
            tags: tags(&["cats"]),
            ..Default::default()
        };
        let updated = repo.update_metadata(&media.id, &update).await.unwrap();
        assert!(updated.is_favorite);
        assert_eq!(updated.tags, vec!["cats"]);
        assert_eq!(updated.notes.as_deref(), Some("first shot"));

        let update = MetadataUpdate {
            notes: Some(None),
            ..Default::default()
        };
        let updated = repo.update_metadata(&media.id, &update).await.unwrap();
        assert!(updated.notes.is_none());
    }

    #[tokio::test]
    async fn test_update_metadata_rejects_empty_and_unknown() {
        let (_pool, repo) = setup().await;
        let media = repo
            .create(new_media("cat.jpg", MediaType::Image, 2048))
            .await
            .unwrap();

        assert!(matches!(
            repo.update_metadata(&media.id, &MetadataUpdate::default()).await,
            Err(AppError::Validation(_))
        ));

        let update = MetadataUpdate {
            is_favorite: Some(true),
            ..Default::default()
        };
        assert!(matches!(
            repo.update_metadata("missing", &update).await,
            Err(AppError::NotFound(_))
        ));

        let update = MetadataUpdate {
            shooting_id: Some(Some("no-such-shooting".to_string())),
            ..Default::default()
        };
        assert!(matches!(
            repo.update_metadata(&media.id, &update).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_increment_usage_is_idempotent_for_links() {
        let (pool, repo) = setup().await;
        let media = repo
            .create(new_media("cat.jpg", MediaType::Image, 2048))
            .await
            .unwrap();
        insert_post(&pool, "post-1").await;

        repo.increment_usage(&media.id, "post-1").await.unwrap();
        repo.increment_usage(&media.id, "post-1").await.unwrap();

        let media = repo.get_by_id(&media.id).await.unwrap();
        assert_eq!(media.usage_count, 2);
        assert!(media.last_used_at.is_some());
        assert_eq!(repo.linked_post_ids(&media.id).await.unwrap(), vec!["post-1"]);
    }

    #[tokio::test]
    async fn test_increment_usage_unknown_media() {
        let (pool, repo) = setup().await;
        insert_post(&pool, "post-1").await;
        assert!(repo.increment_usage("missing", "post-1").await.is_err());

        let links: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM media_posts")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(links, 0);
    }

    #[tokio::test]
    async fn test_delete_cascades_metadata_tags_and_links() {
        let (pool, repo) = setup().await;
        let media = repo
            .create(new_media("cat.jpg", MediaType::Image, 2048))
            .await
            .unwrap();
        insert_post(&pool, "post-1").await;
        repo.update_metadata(
            &media.id,
            &MetadataUpdate {
                tags: tags(&["pets"]),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        repo.increment_usage(&media.id, "post-1").await.unwrap();

        repo.delete(&media.id).await.unwrap();

        for table in ["media_metadata", "media_tags", "media_posts"] {
            let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
                .fetch_one(&pool)
                .await
                .unwrap();
            assert_eq!(count, 0, "{} should be empty", table);
        }
        assert!(matches!(
            repo.delete(&media.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_query_tags_use_and_semantics() {
        let (_pool, repo) = setup().await;
        let both = repo
            .create(new_media("studio.jpg", MediaType::Image, 100))
            .await
            .unwrap();
        let red_only = repo
            .create(new_media("red.jpg", MediaType::Image, 100))
            .await
            .unwrap();
        repo.update_metadata(
            &both.id,
            &MetadataUpdate {
                tags: tags(&["red", "studio"]),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        repo.update_metadata(
            &red_only.id,
            &MetadataUpdate {
                tags: tags(&["red"]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let query = MediaQuery {
            tags: vec!["red".to_string(), "studio".to_string()],
            ..Default::default()
        };
        let found = repo.query(&query).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, both.id);
        assert_eq!(found[0].tags, vec!["red", "studio"]);

        let query = MediaQuery {
            tags: vec!["blue".to_string()],
            ..Default::default()
        };
        assert!(repo.query(&query).await.unwrap().is_empty());

        let query = MediaQuery {
            tags: vec!["red".to_string()],
            ..Default::default()
        };
        assert_eq!(repo.query(&query).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_query_search_matches_names_and_individual_tags() {
        let (_pool, repo) = setup().await;
        let beach = repo
            .create(new_media("Beach_Day.JPG", MediaType::Image, 100))
            .await
            .unwrap();
        let tagged = repo
            .create(new_media("img_0001.jpg", MediaType::Image, 100))
            .await
            .unwrap();
        repo.create(new_media("other.jpg", MediaType::Image, 100))
            .await
            .unwrap();
        repo.update_metadata(
            &tagged.id,
            &MetadataUpdate {
                tags: tags(&["sunset", "red"]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let search = |term: &str| MediaQuery {
            search: Some(term.to_string()),
            ..Default::default()
        };

        let found = repo.query(&search("beach")).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, beach.id);

        let found = repo.query(&search("SUNS")).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, tagged.id);

        // Matching is per tag, never across the boundary of two tags
        assert!(repo.query(&search("sunset,red")).await.unwrap().is_empty());
        // Wildcards in the term are literal
        assert!(repo.query(&search("%")).await.unwrap().is_empty());
        assert_eq!(repo.query(&search("_0001")).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_query_type_favorite_and_usage_filters() {
        let (pool, repo) = setup().await;
        let image = repo
            .create(new_media("a.jpg", MediaType::Image, 100))
            .await
            .unwrap();
        let video = repo
            .create(new_media("b.mp4", MediaType::Video, 100))
            .await
            .unwrap();
        insert_post(&pool, "post-1").await;
        repo.increment_usage(&video.id, "post-1").await.unwrap();
        repo.update_metadata(
            &image.id,
            &MetadataUpdate {
                is_favorite: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let videos = repo
            .query(&MediaQuery {
                media_type: Some("video".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(videos.len(), 1);
        assert_eq!(videos[0].id, video.id);

        let favorites = repo
            .query(&MediaQuery {
                favorites_only: true,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(favorites.len(), 1);
        assert_eq!(favorites[0].id, image.id);

        let used = repo
            .query(&MediaQuery {
                is_used: Some(true),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(used.len(), 1);
        assert_eq!(used[0].id, video.id);

        let unused = repo
            .query(&MediaQuery {
                is_used: Some(false),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(unused.len(), 1);
        assert_eq!(unused[0].id, image.id);

        let unknown_type = repo
            .query(&MediaQuery {
                media_type: Some("audio".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(unknown_type.is_empty());
    }

    #[tokio::test]
    async fn test_query_shooting_filter_and_name_enrichment() {
        let (pool, repo) = setup().await;
        let shootings = ShootingRepository::new(pool.clone());
        let beach = shootings
            .create(NewShooting {
                name: "Beach".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        let inside = repo
            .create(new_media("a.jpg", MediaType::Image, 100))
            .await
            .unwrap();
        repo.create(new_media("b.jpg", MediaType::Image, 100))
            .await
            .unwrap();
        repo.update_metadata(
            &inside.id,
            &MetadataUpdate {
                shooting_id: Some(Some(beach.id.clone())),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let found = repo
            .query(&MediaQuery {
                shooting_id: Some(beach.id.clone()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].shooting_name.as_deref(), Some("Beach"));

        let all = repo.query(&MediaQuery::default()).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all.iter().filter(|m| m.shooting_name.is_none()).count(), 1);
    }

    #[tokio::test]
    async fn test_query_sort_and_pagination() {
        let (pool, repo) = setup().await;
        insert_post(&pool, "post-1").await;
        insert_post(&pool, "post-2").await;

        let mut ids = Vec::new();
        for (name, size) in [("c.jpg", 300), ("a.jpg", 100), ("b.jpg", 200)] {
            ids.push(
                repo.create(new_media(name, MediaType::Image, size))
                    .await
                    .unwrap()
                    .id,
            );
        }
        repo.increment_usage(&ids[0], "post-1").await.unwrap();
        repo.increment_usage(&ids[0], "post-2").await.unwrap();
        repo.increment_usage(&ids[2], "post-1").await.unwrap();

        let by_usage = repo
            .query(&MediaQuery {
                sort_by: MediaSortField::UsageCount,
                sort_order: SortOrder::Asc,
                ..Default::default()
            })
            .await
            .unwrap();
        let counts: Vec<i64> = by_usage.iter().map(|m| m.usage_count).collect();
        assert_eq!(counts, vec![0, 1, 2]);

        let by_size = repo
            .query(&MediaQuery {
                sort_by: MediaSortField::FileSize,
                sort_order: SortOrder::Desc,
                ..Default::default()
            })
            .await
            .unwrap();
        let sizes: Vec<i64> = by_size.iter().map(|m| m.file_size).collect();
        assert_eq!(sizes, vec![300, 200, 100]);

        let page = repo
            .query(&MediaQuery {
                sort_by: MediaSortField::Filename,
                sort_order: SortOrder::Asc,
                limit: 1,
                offset: 1,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].original_name, "b.jpg");
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("cat"), "%cat%");
        assert_eq!(like_pattern("50%_off\\"), "%50\\%\\_off\\\\%");
    }
}
