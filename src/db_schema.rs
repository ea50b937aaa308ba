use sqlx::SqlitePool;

// Schema definitions
pub const MEDIA_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS media (
    id TEXT PRIMARY KEY NOT NULL,
    filename TEXT NOT NULL,
    original_name TEXT NOT NULL,
    file_url TEXT NOT NULL,
    thumbnail_url TEXT,
    file_size INTEGER NOT NULL CHECK(file_size > 0),
    mime_type TEXT NOT NULL,
    media_type TEXT NOT NULL CHECK(media_type IN ('image', 'video')),
    width INTEGER,
    height INTEGER,
    duration REAL,
    uploaded_at DATETIME NOT NULL,
    user_id TEXT
)
"#;

pub const SHOOTINGS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS shootings (
    id TEXT PRIMARY KEY NOT NULL,
    name TEXT NOT NULL UNIQUE,
    description TEXT,
    cover_media_id TEXT,
    created_at DATETIME NOT NULL,
    user_id TEXT
)
"#;

// One row per media item, created together with it.
pub const MEDIA_METADATA_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS media_metadata (
    media_id TEXT PRIMARY KEY NOT NULL,
    shooting_id TEXT,
    is_favorite BOOLEAN NOT NULL DEFAULT FALSE,
    usage_count INTEGER NOT NULL DEFAULT 0 CHECK(usage_count >= 0),
    last_used_at DATETIME,
    notes TEXT,
    FOREIGN KEY (media_id) REFERENCES media(id) ON DELETE CASCADE,
    FOREIGN KEY (shooting_id) REFERENCES shootings(id) ON DELETE SET NULL
)
"#;

// Normalized tag membership; position keeps the list order of the tags.
pub const MEDIA_TAGS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS media_tags (
    media_id TEXT NOT NULL,
    tag TEXT NOT NULL,
    position INTEGER NOT NULL,
    PRIMARY KEY (media_id, tag),
    FOREIGN KEY (media_id) REFERENCES media(id) ON DELETE CASCADE
)
"#;

pub const POSTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS posts (
    id TEXT PRIMARY KEY NOT NULL,
    title TEXT NOT NULL,
    platform TEXT NOT NULL,
    caption TEXT,
    image_url TEXT,
    image_data TEXT,
    ai_prompt TEXT,
    status TEXT NOT NULL,
    publish_date TEXT,
    created_at DATETIME NOT NULL,
    updated_at DATETIME NOT NULL,
    user_id TEXT
)
"#;

// media_id is informational and intentionally not a foreign key: deleting a
// library item leaves the post untouched.
pub const IMAGES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS images (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    post_id TEXT NOT NULL,
    image_url TEXT,
    image_data TEXT,
    media_id TEXT,
    is_primary BOOLEAN NOT NULL DEFAULT FALSE,
    position INTEGER NOT NULL DEFAULT 0,
    created_at DATETIME NOT NULL,
    FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE
)
"#;

pub const VERSIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS versions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    post_id TEXT NOT NULL,
    date DATETIME NOT NULL,
    title TEXT,
    caption TEXT,
    status TEXT,
    FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE
)
"#;

pub const MEDIA_POSTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS media_posts (
    media_id TEXT NOT NULL,
    post_id TEXT NOT NULL,
    created_at DATETIME NOT NULL,
    PRIMARY KEY (media_id, post_id),
    FOREIGN KEY (media_id) REFERENCES media(id) ON DELETE CASCADE,
    FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE
)
"#;

pub const SCHEMA_SQL: &[&str] = &[
    MEDIA_TABLE,
    "CREATE INDEX IF NOT EXISTS idx_media_type ON media(media_type);",
    "CREATE INDEX IF NOT EXISTS idx_media_uploaded ON media(uploaded_at DESC);",
    "CREATE INDEX IF NOT EXISTS idx_media_user ON media(user_id);",
    SHOOTINGS_TABLE,
    MEDIA_METADATA_TABLE,
    "CREATE INDEX IF NOT EXISTS idx_metadata_shooting ON media_metadata(shooting_id);",
    "CREATE INDEX IF NOT EXISTS idx_metadata_favorite ON media_metadata(is_favorite);",
    MEDIA_TAGS_TABLE,
    "CREATE INDEX IF NOT EXISTS idx_media_tags_tag ON media_tags(tag);",
    POSTS_TABLE,
    "CREATE INDEX IF NOT EXISTS idx_posts_publish_date ON posts(publish_date);",
    IMAGES_TABLE,
    "CREATE INDEX IF NOT EXISTS idx_images_post ON images(post_id, position);",
    VERSIONS_TABLE,
    "CREATE INDEX IF NOT EXISTS idx_versions_post ON versions(post_id, date);",
    MEDIA_POSTS_TABLE,
    "CREATE INDEX IF NOT EXISTS idx_media_posts_post ON media_posts(post_id);",
];

pub async fn initialize_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for sql in SCHEMA_SQL {
        sqlx::query(sql).execute(pool).await?;
    }
    Ok(())
}
