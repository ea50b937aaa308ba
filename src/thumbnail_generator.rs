use async_trait::async_trait;
use bytes::Bytes;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat};
use log::debug;
use std::sync::Arc;

use crate::error::{StorageError, StorageResult};
use crate::file_store::FileStore;

/// A stored thumbnail plus the dimensions of the image it was made from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail {
    pub url: String,
    pub width: u32,
    pub height: u32,
}

#[async_trait]
pub trait ThumbnailGenerator: Send + Sync {
    async fn generate(&self, filename: &str, content: Bytes) -> StorageResult<Thumbnail>;

    /// Removes a thumbnail previously returned by `generate`.
    async fn delete(&self, url: &str) -> StorageResult<()>;
}

/// Square center-cropped thumbnails written to their own file store.
pub struct ImageThumbnailer {
    store: Arc<dyn FileStore>,
    size: u32,
}

impl ImageThumbnailer {
    pub fn new(store: Arc<dyn FileStore>, size: u32) -> Self {
        Self {
            store,
            size: size.max(1),
        }
    }

    pub fn thumbnail_name(filename: &str) -> String {
        format!("thumb_{}", filename)
    }
}

#[async_trait]
impl ThumbnailGenerator for ImageThumbnailer {
    async fn generate(&self, filename: &str, content: Bytes) -> StorageResult<Thumbnail> {
        let size = self.size;
        let (data, width, height) = tokio::task::spawn_blocking(move || render(&content, size))
            .await
            .map_err(|e| StorageError::Task(e.to_string()))??;

        let url = self
            .store
            .put(&Self::thumbnail_name(filename), Bytes::from(data))
            .await?;
        debug!("Thumbnail for {} ({}x{}) stored at {}", filename, width, height, url);

        Ok(Thumbnail { url, width, height })
    }

    async fn delete(&self, url: &str) -> StorageResult<()> {
        self.store.delete(url).await
    }
}

/// Decodes, crops to a `size` square and re-encodes. Returns the encoded
/// thumbnail and the original dimensions.
fn render(content: &[u8], size: u32) -> StorageResult<(Vec<u8>, u32, u32)> {
    let format = image::guess_format(content)?;
    let img = image::load_from_memory_with_format(content, format)?;
    let (width, height) = img.dimensions();

    let thumbnail = img.resize_to_fill(size, size, FilterType::Lanczos3);
    let data = encode_image(thumbnail, output_format(format))?;
    Ok((data, width, height))
}

fn output_format(source: ImageFormat) -> ImageFormat {
    match source {
        ImageFormat::Png | ImageFormat::Gif | ImageFormat::WebP => source,
        _ => ImageFormat::Jpeg,
    }
}

fn encode_image(img: DynamicImage, format: ImageFormat) -> StorageResult<Vec<u8>> {
    // JPEG has no alpha channel
    let img = match format {
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(img.to_rgb8()),
        _ => DynamicImage::ImageRgba8(img.to_rgba8()),
    };
    let mut buffer = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buffer, format)?;
    Ok(buffer.into_inner())
}
