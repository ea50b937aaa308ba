use bytes::BufMut;
use futures_util::TryStreamExt;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use warp::multipart::{FormData, Part};
use warp::{Filter, Rejection, Reply};

use crate::error::{AppError, AppResult};
use crate::library_service::{LibraryService, StoredFile, UploadedFile};
use crate::warp_helpers::{app_rejection, with_library};

pub const MAX_ATTACHMENTS: usize = 10;

/// Files sent under one field name plus the plain text fields of the form.
#[derive(Debug, Default)]
pub struct MultipartUpload {
    pub files: Vec<UploadedFile>,
    pub fields: HashMap<String, String>,
}

/// Drains a multipart form. Parts named `file_field` that carry a filename are
/// collected as files (at most `max_files`); other parts without a filename
/// become text fields. Anything else is ignored.
pub async fn read_multipart(
    mut form: FormData,
    file_field: &str,
    max_files: usize,
) -> AppResult<MultipartUpload> {
    let mut upload = MultipartUpload::default();

    while let Some(part) = form.try_next().await.map_err(invalid_form)? {
        let name = part.name().to_string();
        match part.filename().map(str::to_string) {
            Some(filename) if name == file_field => {
                if upload.files.len() >= max_files {
                    return Err(AppError::validation(format!(
                        "Too many files, at most {} allowed",
                        max_files
                    )));
                }
                let content_type = part.content_type().map(str::to_string);
                let content = read_part(part).await?;
                upload
                    .files
                    .push(UploadedFile::new(filename, content_type, content.into()));
            }
            Some(_) => {}
            None => {
                let value = read_part(part).await?;
                upload
                    .fields
                    .insert(name, String::from_utf8_lossy(&value).into_owned());
            }
        }
    }

    Ok(upload)
}

async fn read_part(part: Part) -> AppResult<Vec<u8>> {
    part.stream()
        .try_fold(Vec::new(), |mut data, chunk| async move {
            data.put(chunk);
            Ok(data)
        })
        .await
        .map_err(invalid_form)
}

fn invalid_form(e: warp::Error) -> AppError {
    AppError::validation(format!("Invalid multipart body: {}", e))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SingleUploadResponse {
    message: &'static str,
    image_url: String,
    filename: String,
}

#[derive(Serialize)]
struct MultipleUploadResponse {
    message: &'static str,
    images: Vec<StoredFile>,
}

pub async fn upload_single(
    form: FormData,
    library: Arc<LibraryService>,
) -> Result<impl Reply, Rejection> {
    let upload = read_multipart(form, "image", 1)
        .await
        .map_err(app_rejection)?;
    let file = upload
        .files
        .into_iter()
        .next()
        .ok_or_else(|| app_rejection(AppError::validation("No image provided")))?;

    let stored = library
        .store_attachment(file)
        .await
        .map_err(app_rejection)?;

    Ok(warp::reply::json(&SingleUploadResponse {
        message: "Image uploaded",
        image_url: stored.image_url,
        filename: stored.filename,
    }))
}

pub async fn upload_multiple(
    form: FormData,
    library: Arc<LibraryService>,
) -> Result<impl Reply, Rejection> {
    let upload = read_multipart(form, "images", MAX_ATTACHMENTS)
        .await
        .map_err(app_rejection)?;
    if upload.files.is_empty() {
        return Err(app_rejection(AppError::validation("No image provided")));
    }

    let images = library
        .store_attachments(upload.files)
        .await
        .map_err(app_rejection)?;

    Ok(warp::reply::json(&MultipleUploadResponse {
        message: "Images uploaded",
        images,
    }))
}

pub fn build_upload_routes(
    library: Arc<LibraryService>,
    max_upload_bytes: u64,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let single = warp::path!("api" / "upload")
        .and(warp::post())
        .and(warp::multipart::form().max_length(max_upload_bytes))
        .and(with_library(library.clone()))
        .and_then(upload_single);

    let multiple = warp::path!("api" / "upload" / "multiple")
        .and(warp::post())
        .and(warp::multipart::form().max_length(max_upload_bytes * MAX_ATTACHMENTS as u64))
        .and(with_library(library))
        .and_then(upload_multiple);

    single.or(multiple)
}
