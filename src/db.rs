use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use crate::db_pool::{create_db_pool, create_in_memory_pool, DbPool};
pub use crate::db_types::{
    ImageInput, MediaQuery, MediaSortField, MetadataUpdate, NewMedia, NewShooting, PostInput,
    PostQuery, PublishDateUpdate, SortOrder,
};

/// Classification of a library item, fixed at upload time from the mime type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
}

impl MediaType {
    pub fn from_mime(mime_type: &str) -> Self {
        if mime_type.starts_with("video/") {
            MediaType::Video
        } else {
            MediaType::Image
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Image => "image",
            MediaType::Video => "video",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A library item joined with its metadata sidecar and the owning shooting's name.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Media {
    // === FILE ===
    pub id: String,
    pub filename: String,
    pub original_name: String,
    pub file_url: String,
    pub thumbnail_url: Option<String>,
    pub file_size: i64,
    pub mime_type: String,
    pub media_type: MediaType,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub duration: Option<f64>,
    pub uploaded_at: DateTime<Utc>,
    pub user_id: Option<String>,

    // === METADATA ===
    pub shooting_id: Option<String>,
    pub shooting_name: Option<String>,
    pub is_favorite: bool,
    pub usage_count: i64,
    pub last_used_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    #[sqlx(skip)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Shooting {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub cover_media_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub user_id: Option<String>,
    /// Computed at read time from the metadata rows pointing at this shooting.
    pub media_count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum PostStatus {
    #[serde(alias = "Brouillon")]
    Draft,
    #[serde(alias = "Prêt")]
    Ready,
    #[serde(alias = "Publié")]
    Published,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Ready => "ready",
            PostStatus::Published => "published",
        }
    }
}

impl FromStr for PostStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" | "Brouillon" => Ok(PostStatus::Draft),
            "ready" | "Prêt" => Ok(PostStatus::Ready),
            "published" | "Publié" => Ok(PostStatus::Published),
            _ => Err(()),
        }
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub title: String,
    pub platform: String,
    pub caption: Option<String>,
    // Legacy single-image fields
    pub image_url: Option<String>,
    pub image_data: Option<String>,
    pub ai_prompt: Option<String>,
    pub status: PostStatus,
    pub publish_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user_id: Option<String>,
    #[sqlx(skip)]
    pub images: Vec<PostImage>,
    #[sqlx(skip)]
    pub versions: Vec<PostVersion>,
}

impl Post {
    /// URL of the legacy image field, falling back to the primary image.
    pub fn display_image_url(&self) -> Option<&str> {
        self.image_url
            .as_deref()
            .filter(|url| !url.is_empty())
            .or_else(|| {
                self.images
                    .iter()
                    .find(|img| img.is_primary)
                    .and_then(|img| img.image_url.as_deref())
            })
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PostImage {
    pub id: i64,
    pub post_id: String,
    pub image_url: Option<String>,
    pub image_data: Option<String>,
    pub media_id: Option<String>,
    pub is_primary: bool,
    pub position: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PostVersion {
    pub id: i64,
    pub post_id: String,
    pub date: DateTime<Utc>,
    pub title: Option<String>,
    pub caption: Option<String>,
    pub status: Option<String>,
}

/// Time-plus-random identifier, e.g. `1760000000000-123456789`.
pub fn generate_id() -> String {
    format!(
        "{}-{}",
        Utc::now().timestamp_millis(),
        rand::random::<u32>() % 1_000_000_000
    )
}
