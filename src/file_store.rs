use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::{StorageError, StorageResult};

/// Byte storage addressed by flat file names, exposing each file at a public URL.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Writes `content` as `filename` and returns its public URL.
    async fn put(&self, filename: &str, content: Bytes) -> StorageResult<String>;

    /// Deletes the file behind a URL previously returned by `put`.
    async fn delete(&self, url: &str) -> StorageResult<()>;
}

/// Directory-backed store; files are served by the static route at `url_prefix`.
pub struct LocalFileStore {
    root: PathBuf,
    url_prefix: String,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            url_prefix: url_prefix.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn url_for(&self, filename: &str) -> String {
        format!("{}/{}", self.url_prefix, filename)
    }

    fn path_for(&self, filename: &str) -> StorageResult<PathBuf> {
        check_filename(filename)?;
        Ok(self.root.join(filename))
    }

    fn filename_from_url<'a>(&self, url: &'a str) -> StorageResult<&'a str> {
        url.strip_prefix(self.url_prefix.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
            .ok_or_else(|| StorageError::ForeignUrl(url.to_string()))
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn put(&self, filename: &str, content: Bytes) -> StorageResult<String> {
        let path = self.path_for(filename)?;
        fs::create_dir_all(&self.root).await?;
        fs::write(&path, &content).await?;
        Ok(self.url_for(filename))
    }

    async fn delete(&self, url: &str) -> StorageResult<()> {
        let filename = self.filename_from_url(url)?;
        let path = self.path_for(filename)?;
        fs::remove_file(&path).await?;
        Ok(())
    }
}

fn check_filename(filename: &str) -> StorageResult<()> {
    if filename.is_empty()
        || filename == "."
        || filename == ".."
        || filename.contains(['/', '\\'])
    {
        return Err(StorageError::InvalidName(filename.to_string()));
    }
    Ok(())
}

/// Lowercased extension of a client file name, if any.
pub fn extension_of(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .map(|ext| ext.to_ascii_lowercase())
}

/// Collision-resistant storage name `<millis>-<random>.<ext>` keeping the
/// client file's extension.
pub fn unique_filename(original_name: &str) -> String {
    let stem = format!(
        "{}-{}",
        Utc::now().timestamp_millis(),
        rand::random::<u32>() % 1_000_000_000
    );
    match extension_of(original_name) {
        Some(ext) => format!("{}.{}", stem, ext),
        None => stem,
    }
}
