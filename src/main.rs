use anyhow::{anyhow, Context};
use log::info;
use std::net::SocketAddr;
use std::sync::Arc;
use warp::Filter;

use post_planner::config::Config;
use post_planner::db::create_db_pool;
use post_planner::file_store::{FileStore, LocalFileStore};
use post_planner::handlers_health::build_health_routes;
use post_planner::handlers_media::build_media_routes;
use post_planner::handlers_posts::build_post_routes;
use post_planner::handlers_static::build_static_routes;
use post_planner::handlers_upload::build_upload_routes;
use post_planner::library_service::LibraryService;
use post_planner::post_repository::PostRepository;
use post_planner::thumbnail_generator::{ImageThumbnailer, ThumbnailGenerator};
use post_planner::warp_helpers::{cors, handle_rejection};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = Config::from_env().map_err(|e| anyhow!("Invalid configuration: {}", e))?;

    info!("Starting post planner on {}:{}", config.host, config.port);
    info!("Database: {}", config.db_path);
    info!("Uploads path: {}", config.storage.uploads_path.display());
    info!("Public URL: {}", config.storage.public_url);

    let db_pool = create_db_pool(&config.db_path, config.max_connections)
        .await
        .map_err(|e| anyhow!("Failed to open database {}: {}", config.db_path, e))?;
    info!("Database initialized successfully");

    std::fs::create_dir_all(&config.storage.thumbnails_path).with_context(|| {
        format!(
            "Failed to create {}",
            config.storage.thumbnails_path.display()
        )
    })?;

    let files: Arc<dyn FileStore> = Arc::new(LocalFileStore::new(
        config.storage.uploads_path.clone(),
        config.uploads_url(),
    ));
    let thumbnail_files: Arc<dyn FileStore> = Arc::new(LocalFileStore::new(
        config.storage.thumbnails_path.clone(),
        config.thumbnails_url(),
    ));
    let thumbnails: Arc<dyn ThumbnailGenerator> = Arc::new(ImageThumbnailer::new(
        thumbnail_files,
        config.storage.thumbnail_size,
    ));

    let library = Arc::new(LibraryService::new(db_pool.clone(), files, thumbnails));
    let posts = PostRepository::new(db_pool.clone());

    let routes = build_health_routes(db_pool)
        .or(build_media_routes(
            library.clone(),
            config.max_page_limit,
            config.storage.max_upload_bytes,
        ))
        .or(build_post_routes(posts, config.storage.max_upload_bytes))
        .or(build_upload_routes(library, config.storage.max_upload_bytes))
        .or(build_static_routes(config.storage.uploads_path.clone()))
        .with(cors())
        .with(warp::log("post_planner"))
        .recover(handle_rejection);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", config.host, config.port))?;

    info!("Server started successfully, listening on http://{}", addr);
    warp::serve(routes).run(addr).await;

    Ok(())
}
