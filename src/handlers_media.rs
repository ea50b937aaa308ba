use serde_json::json;
use std::sync::Arc;
use warp::multipart::FormData;
use warp::{Filter, Rejection, Reply};

use crate::db::{MediaQuery, MetadataUpdate, NewShooting};
use crate::error::AppError;
use crate::handlers_upload::read_multipart;
use crate::library_service::LibraryService;
use crate::warp_helpers::{app_rejection, with_library, with_page_limit};

const JSON_BODY_LIMIT: u64 = 1024 * 1024;

pub async fn list_media(
    params: Vec<(String, String)>,
    max_limit: i64,
    library: Arc<LibraryService>,
) -> Result<impl Reply, Rejection> {
    let query = MediaQuery::from_pairs(&params, max_limit);
    let media = library.media().query(&query).await.map_err(app_rejection)?;
    Ok(warp::reply::json(&media))
}

pub async fn get_media(id: String, library: Arc<LibraryService>) -> Result<impl Reply, Rejection> {
    let media = library.media().get_by_id(&id).await.map_err(app_rejection)?;
    Ok(warp::reply::json(&media))
}

pub async fn upload_media(
    form: FormData,
    library: Arc<LibraryService>,
) -> Result<impl Reply, Rejection> {
    let mut upload = read_multipart(form, "file", 1)
        .await
        .map_err(app_rejection)?;
    let file = upload
        .files
        .pop()
        .ok_or_else(|| app_rejection(AppError::validation("No file uploaded")))?;
    let user_id = upload.fields.remove("userId");

    let media = library
        .upload(file, user_id)
        .await
        .map_err(app_rejection)?;
    Ok(warp::reply::json(&media))
}

pub async fn update_media(
    id: String,
    update: MetadataUpdate,
    library: Arc<LibraryService>,
) -> Result<impl Reply, Rejection> {
    let media = library
        .media()
        .update_metadata(&id, &update)
        .await
        .map_err(app_rejection)?;
    Ok(warp::reply::json(&media))
}

pub async fn delete_media(id: String, library: Arc<LibraryService>) -> Result<impl Reply, Rejection> {
    library.delete(&id).await.map_err(app_rejection)?;
    Ok(warp::reply::json(&json!({ "message": "Media deleted", "id": id })))
}

pub async fn list_shootings(library: Arc<LibraryService>) -> Result<impl Reply, Rejection> {
    let shootings = library.shootings().list().await.map_err(app_rejection)?;
    Ok(warp::reply::json(&shootings))
}

pub async fn create_shooting(
    data: NewShooting,
    library: Arc<LibraryService>,
) -> Result<impl Reply, Rejection> {
    let shooting = library
        .shootings()
        .create(data)
        .await
        .map_err(app_rejection)?;
    Ok(warp::reply::json(&shooting))
}

pub async fn delete_shooting(
    id: String,
    library: Arc<LibraryService>,
) -> Result<impl Reply, Rejection> {
    library
        .shootings()
        .delete(&id)
        .await
        .map_err(app_rejection)?;
    Ok(warp::reply::json(&json!({ "message": "Shooting deleted", "id": id })))
}

pub fn build_media_routes(
    library: Arc<LibraryService>,
    max_page_limit: i64,
    max_upload_bytes: u64,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let list = warp::path!("api" / "media")
        .and(warp::get())
        .and(warp::query::<Vec<(String, String)>>())
        .and(with_page_limit(max_page_limit))
        .and(with_library(library.clone()))
        .and_then(list_media);

    let upload = warp::path!("api" / "media" / "upload")
        .and(warp::post())
        .and(warp::multipart::form().max_length(max_upload_bytes))
        .and(with_library(library.clone()))
        .and_then(upload_media);

    let shootings_list = warp::path!("api" / "media" / "shootings" / "list")
        .and(warp::get())
        .and(with_library(library.clone()))
        .and_then(list_shootings);

    let shootings_create = warp::path!("api" / "media" / "shootings")
        .and(warp::post())
        .and(warp::body::content_length_limit(JSON_BODY_LIMIT))
        .and(warp::body::json())
        .and(with_library(library.clone()))
        .and_then(create_shooting);

    let shootings_delete = warp::path!("api" / "media" / "shootings" / String)
        .and(warp::delete())
        .and(with_library(library.clone()))
        .and_then(delete_shooting);

    let get = warp::path!("api" / "media" / String)
        .and(warp::get())
        .and(with_library(library.clone()))
        .and_then(get_media);

    let update = warp::path!("api" / "media" / String)
        .and(warp::patch())
        .and(warp::body::content_length_limit(JSON_BODY_LIMIT))
        .and(warp::body::json())
        .and(with_library(library.clone()))
        .and_then(update_media);

    let delete = warp::path!("api" / "media" / String)
        .and(warp::delete())
        .and(with_library(library))
        .and_then(delete_media);

    list.or(upload)
        .or(shootings_list)
        .or(shootings_create)
        .or(shootings_delete)
        .or(get)
        .or(update)
        .or(delete)
}
