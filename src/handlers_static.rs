use std::path::PathBuf;
use warp::Filter;

/// Serves stored originals at `/uploads/<file>` and thumbnails at
/// `/uploads/thumbs/<file>`.
pub fn build_static_routes(
    uploads_path: PathBuf,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::path("uploads")
        .and(warp::get())
        .and(warp::fs::dir(uploads_path))
}
