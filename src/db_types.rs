use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use std::str::FromStr;

use crate::db::{MediaType, PostStatus};

pub const DEFAULT_PAGE_LIMIT: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MediaSortField {
    #[default]
    UploadedAt,
    Filename,
    FileSize,
    UsageCount,
}

impl MediaSortField {
    pub fn column(&self) -> &'static str {
        match self {
            MediaSortField::UploadedAt => "m.uploaded_at",
            MediaSortField::Filename => "m.filename",
            MediaSortField::FileSize => "m.file_size",
            MediaSortField::UsageCount => "COALESCE(mm.usage_count, 0)",
        }
    }
}

impl FromStr for MediaSortField {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "uploadedAt" => Ok(MediaSortField::UploadedAt),
            "filename" => Ok(MediaSortField::Filename),
            "fileSize" => Ok(MediaSortField::FileSize),
            "usageCount" => Ok(MediaSortField::UsageCount),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl FromStr for SortOrder {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ASC" => Ok(SortOrder::Asc),
            "DESC" => Ok(SortOrder::Desc),
            _ => Err(()),
        }
    }
}

/// Faceted media library filter. All predicates are combined with AND.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaQuery {
    pub search: Option<String>,
    /// Exact match; an unknown value matches nothing.
    pub media_type: Option<String>,
    pub shooting_id: Option<String>,
    pub favorites_only: bool,
    pub is_used: Option<bool>,
    pub tags: Vec<String>,
    pub sort_by: MediaSortField,
    pub sort_order: SortOrder,
    pub limit: i64,
    pub offset: i64,
}

impl Default for MediaQuery {
    fn default() -> Self {
        Self {
            search: None,
            media_type: None,
            shooting_id: None,
            favorites_only: false,
            is_used: None,
            tags: Vec::new(),
            sort_by: MediaSortField::default(),
            sort_order: SortOrder::default(),
            limit: DEFAULT_PAGE_LIMIT,
            offset: 0,
        }
    }
}

impl MediaQuery {
    /// Builds a query from raw query-string pairs. Never fails: unknown keys are
    /// ignored and malformed values fall back to their defaults.
    pub fn from_pairs(pairs: &[(String, String)], max_limit: i64) -> Self {
        let mut query = MediaQuery::default();

        for (key, value) in pairs {
            let value = value.trim();
            match key.as_str() {
                "search" => query.search = non_empty(value),
                "mediaType" => {
                    query.media_type = non_empty(value).filter(|v| v != "all");
                }
                "shootingId" => query.shooting_id = non_empty(value),
                "isFavorite" => query.favorites_only = value == "true",
                "isUsed" => {
                    query.is_used = match value {
                        "true" => Some(true),
                        "false" => Some(false),
                        _ => None,
                    }
                }
                "tags" | "tags[]" => {
                    for tag in value.split(',').filter_map(non_empty) {
                        if !query.tags.contains(&tag) {
                            query.tags.push(tag);
                        }
                    }
                }
                "sortBy" => query.sort_by = value.parse().unwrap_or_default(),
                "sortOrder" => query.sort_order = value.parse().unwrap_or_default(),
                "limit" => query.limit = value.parse().unwrap_or(DEFAULT_PAGE_LIMIT),
                "offset" => query.offset = value.parse().unwrap_or(0),
                _ => {}
            }
        }

        query.limit = query.limit.clamp(1, max_limit.max(1));
        query.offset = query.offset.max(0);
        query
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Data for a new library row. `uploaded_at` is always assigned by the repository.
#[derive(Debug, Clone, Default)]
pub struct NewMedia {
    pub id: String,
    pub filename: String,
    pub original_name: String,
    pub file_url: String,
    pub thumbnail_url: Option<String>,
    pub file_size: i64,
    pub mime_type: String,
    pub media_type: Option<MediaType>,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub user_id: Option<String>,
}

/// Deserializes a present field (including an explicit `null`) as `Some(_)`,
/// leaving `None` for an absent one.
fn explicit_field<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Partial metadata update; only supplied fields change.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataUpdate {
    #[serde(default, deserialize_with = "explicit_field")]
    pub shooting_id: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
    pub is_favorite: Option<bool>,
    #[serde(default, deserialize_with = "explicit_field")]
    pub notes: Option<Option<String>>,
}

impl MetadataUpdate {
    pub fn is_empty(&self) -> bool {
        self.shooting_id.is_none()
            && self.tags.is_none()
            && self.is_favorite.is_none()
            && self.notes.is_none()
    }
}

/// Trims tags, drops empty ones and collapses duplicates keeping the first position.
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !normalized.iter().any(|t| t == tag) {
            normalized.push(tag.to_string());
        }
    }
    normalized
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewShooting {
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
    pub cover_media_id: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageInput {
    pub image_url: Option<String>,
    pub image_data: Option<String>,
    pub media_id: Option<String>,
}

/// Body of post create and full update.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostInput {
    pub id: Option<String>,
    pub title: Option<String>,
    pub platform: Option<String>,
    pub caption: Option<String>,
    pub image_url: Option<String>,
    pub image_data: Option<String>,
    #[serde(default)]
    pub images: Vec<ImageInput>,
    pub ai_prompt: Option<String>,
    pub status: Option<PostStatus>,
    #[serde(default, deserialize_with = "optional_date")]
    pub publish_date: Option<NaiveDate>,
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishDateUpdate {
    #[serde(default, deserialize_with = "optional_date")]
    pub publish_date: Option<NaiveDate>,
}

/// Accepts `null`, an empty string (unscheduled) or a `YYYY-MM-DD` date.
fn optional_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) if !raw.trim().is_empty() => {
            parse_date(&raw).map(Some).map_err(serde::de::Error::custom)
        }
        _ => Ok(None),
    }
}

/// Parses `YYYY-MM-DD`, also accepting a full timestamp by keeping its date part.
pub fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    let raw = raw.trim();
    let date_part = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map_err(|_| format!("Invalid date '{}', expected YYYY-MM-DD", raw))
}

impl PostInput {
    /// Library media ids referenced by the image list, in list order.
    pub fn media_ids(&self) -> Vec<String> {
        self.images
            .iter()
            .filter_map(|img| img.media_id.clone())
            .filter(|id| !id.is_empty())
            .collect()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostQuery {
    pub status: Option<String>,
    pub platform: Option<String>,
    pub search: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}
