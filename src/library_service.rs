use bytes::Bytes;
use log::{info, warn};
use serde::Serialize;
use std::sync::Arc;

use crate::db::{DbPool, Media, MediaType, NewMedia};
use crate::error::{AppError, AppResult};
use crate::file_store::{unique_filename, FileStore};
use crate::media_repository::MediaRepository;
use crate::mimetype_detector;
use crate::shooting_repository::ShootingRepository;
use crate::thumbnail_generator::ThumbnailGenerator;

/// A file received from a client, before anything is written.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub original_name: String,
    pub content_type: Option<String>,
    pub content: Bytes,
}

impl UploadedFile {
    pub fn new(original_name: impl Into<String>, content_type: Option<String>, content: Bytes) -> Self {
        Self {
            original_name: client_basename(&original_name.into()),
            content_type,
            content,
        }
    }
}

/// Some browsers send the full client path.
fn client_basename(name: &str) -> String {
    name.rsplit(['/', '\\']).next().unwrap_or(name).trim().to_string()
}

/// A file stored outside the library (post editor attachments).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredFile {
    pub image_url: String,
    pub filename: String,
}

/// Coordinates the file store, the thumbnail generator and the repositories so
/// that neither a row without a file nor a file without a row is left behind.
pub struct LibraryService {
    media: MediaRepository,
    shootings: ShootingRepository,
    files: Arc<dyn FileStore>,
    thumbnails: Arc<dyn ThumbnailGenerator>,
}

impl LibraryService {
    pub fn new(
        pool: DbPool,
        files: Arc<dyn FileStore>,
        thumbnails: Arc<dyn ThumbnailGenerator>,
    ) -> Self {
        Self {
            media: MediaRepository::new(pool.clone()),
            shootings: ShootingRepository::new(pool),
            files,
            thumbnails,
        }
    }

    pub fn media(&self) -> &MediaRepository {
        &self.media
    }

    pub fn shootings(&self) -> &ShootingRepository {
        &self.shootings
    }

    pub async fn upload(&self, file: UploadedFile, user_id: Option<String>) -> AppResult<Media> {
        let mime = check_upload(&file)?;
        let media_type = mime.media_type();
        let filename = unique_filename(&file.original_name);

        let file_url = self.files.put(&filename, file.content.clone()).await?;

        let (thumbnail_url, width, height) = match media_type {
            MediaType::Image => match self.thumbnails.generate(&filename, file.content.clone()).await {
                Ok(thumb) => (
                    Some(thumb.url),
                    Some(i64::from(thumb.width)),
                    Some(i64::from(thumb.height)),
                ),
                Err(e) => {
                    warn!("Thumbnail generation failed for {}: {}", file.original_name, e);
                    (None, None, None)
                }
            },
            MediaType::Video => (None, None, None),
        };

        let data = NewMedia {
            filename: filename.clone(),
            original_name: file.original_name.clone(),
            file_url: file_url.clone(),
            thumbnail_url: thumbnail_url.clone(),
            file_size: file.content.len() as i64,
            mime_type: mime.to_string(),
            media_type: Some(media_type),
            width,
            height,
            user_id: user_id.filter(|u| !u.is_empty()),
            ..Default::default()
        };

        match self.media.create(data).await {
            Ok(media) => {
                info!(
                    "Uploaded {} as {} ({} bytes, {})",
                    media.original_name, media.filename, media.file_size, media.media_type
                );
                Ok(media)
            }
            Err(e) => {
                if let Err(cleanup) = self.files.delete(&file_url).await {
                    warn!("Failed to remove {} after insert error: {}", file_url, cleanup);
                }
                if let Some(thumb_url) = &thumbnail_url {
                    if let Err(cleanup) = self.thumbnails.delete(thumb_url).await {
                        warn!("Failed to remove {} after insert error: {}", thumb_url, cleanup);
                    }
                }
                Err(e)
            }
        }
    }

    /// The database row is removed first; file removal afterwards is best effort.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let media = self.media.get_by_id(id).await?;
        self.media.delete(id).await?;

        if let Err(e) = self.files.delete(&media.file_url).await {
            warn!("Failed to delete file {}: {}", media.file_url, e);
        }
        if let Some(thumb_url) = &media.thumbnail_url {
            if let Err(e) = self.thumbnails.delete(thumb_url).await {
                warn!("Failed to delete thumbnail {}: {}", thumb_url, e);
            }
        }

        info!("Deleted media {} ({})", id, media.original_name);
        Ok(())
    }

    /// Stores a post editor attachment without creating a library row.
    pub async fn store_attachment(&self, file: UploadedFile) -> AppResult<StoredFile> {
        check_upload(&file)?;
        let filename = unique_filename(&file.original_name);
        let image_url = self.files.put(&filename, file.content).await?;
        Ok(StoredFile {
            image_url,
            filename,
        })
    }

    /// Stores a batch of attachments, all or nothing. Every file is checked
    /// before the first write, and files already written are removed again if
    /// a later write fails.
    pub async fn store_attachments(&self, files: Vec<UploadedFile>) -> AppResult<Vec<StoredFile>> {
        for file in &files {
            check_upload(file)?;
        }

        let mut stored: Vec<StoredFile> = Vec::with_capacity(files.len());
        for file in files {
            let filename = unique_filename(&file.original_name);
            match self.files.put(&filename, file.content).await {
                Ok(image_url) => stored.push(StoredFile {
                    image_url,
                    filename,
                }),
                Err(e) => {
                    for done in &stored {
                        if let Err(cleanup) = self.files.delete(&done.image_url).await {
                            warn!("Failed to remove {} after write error: {}", done.image_url, cleanup);
                        }
                    }
                    return Err(e.into());
                }
            }
        }
        Ok(stored)
    }
}

fn check_upload(file: &UploadedFile) -> AppResult<mimetype_detector::MimeType> {
    if file.original_name.is_empty() {
        return Err(AppError::validation("Uploaded file has no name"));
    }
    if file.content.is_empty() {
        return Err(AppError::validation("Uploaded file is empty"));
    }
    mimetype_detector::resolve_upload(file.content_type.as_deref(), &file.original_name)
        .map_err(AppError::Validation)
}
