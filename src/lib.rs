pub mod config;
pub mod csv_export;
pub mod db;
pub mod db_pool;
pub mod db_schema;
pub mod db_types;
pub mod error;
pub mod file_store;
pub mod handlers_health;
pub mod handlers_media;
pub mod handlers_posts;
pub mod handlers_static;
pub mod handlers_upload;
pub mod library_service;
pub mod media_repository;
pub mod mimetype_detector;
pub mod post_repository;
pub mod shooting_repository;
pub mod thumbnail_generator;
pub mod warp_helpers;
