use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub uploads_path: PathBuf,
    pub thumbnails_path: PathBuf,
    pub public_url: String,
    pub max_upload_bytes: u64,
    pub thumbnail_size: u32,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub host: String,
    pub db_path: String,
    pub max_connections: u32,
    pub max_page_limit: i64,
    pub storage: StorageConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let port: u16 = env::var("POST_PLANNER_PORT")
            .unwrap_or_else(|_| "5001".to_string())
            .parse()?;

        let uploads_path = PathBuf::from(
            env::var("POST_PLANNER_UPLOADS_PATH").unwrap_or_else(|_| "./data/uploads".to_string()),
        );
        let max_upload_mb: u64 = env::var("POST_PLANNER_MAX_UPLOAD_MB")
            .unwrap_or_else(|_| "50".to_string())
            .parse()?;

        Ok(Config {
            port,
            host: env::var("POST_PLANNER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            db_path: env::var("POST_PLANNER_DB_PATH")
                .unwrap_or_else(|_| "./data/social_media.db".to_string()),
            max_connections: env::var("POST_PLANNER_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "8".to_string())
                .parse()?,
            max_page_limit: env::var("POST_PLANNER_MAX_PAGE_LIMIT")
                .unwrap_or_else(|_| "500".to_string())
                .parse()?,
            storage: StorageConfig {
                thumbnails_path: uploads_path.join("thumbs"),
                uploads_path,
                public_url: env::var("POST_PLANNER_PUBLIC_URL")
                    .unwrap_or_else(|_| format!("http://localhost:{}", port))
                    .trim_end_matches('/')
                    .to_string(),
                max_upload_bytes: max_upload_mb * 1024 * 1024,
                thumbnail_size: env::var("POST_PLANNER_THUMBNAIL_SIZE")
                    .unwrap_or_else(|_| "300".to_string())
                    .parse()?,
            },
        })
    }

    pub fn uploads_url(&self) -> String {
        format!("{}/uploads", self.storage.public_url)
    }

    pub fn thumbnails_url(&self) -> String {
        format!("{}/uploads/thumbs", self.storage.public_url)
    }
}
