use serde::Serialize;
use std::convert::Infallible;
use std::sync::Arc;

use warp::http::StatusCode;
use warp::{reject, Filter, Rejection, Reply};

use crate::db::DbPool;
use crate::error::AppError;
use crate::library_service::LibraryService;
use crate::post_repository::PostRepository;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
    pub timestamp: String,
}

pub fn with_db(db_pool: DbPool) -> impl Filter<Extract = (DbPool,), Error = Infallible> + Clone {
    warp::any().map(move || db_pool.clone())
}

pub fn with_library(
    library: Arc<LibraryService>,
) -> impl Filter<Extract = (Arc<LibraryService>,), Error = Infallible> + Clone {
    warp::any().map(move || library.clone())
}

pub fn with_posts(
    posts: PostRepository,
) -> impl Filter<Extract = (PostRepository,), Error = Infallible> + Clone {
    warp::any().map(move || posts.clone())
}

pub fn with_page_limit(max_limit: i64) -> impl Filter<Extract = (i64,), Error = Infallible> + Clone {
    warp::any().map(move || max_limit)
}

fn classify(err: &AppError) -> (StatusCode, String) {
    match err {
        AppError::Validation(message) => (StatusCode::BAD_REQUEST, message.clone()),
        AppError::NotFound(message) => (StatusCode::NOT_FOUND, message.clone()),
        AppError::Conflict(message) => (StatusCode::CONFLICT, message.clone()),
        AppError::Storage(e) => {
            log::error!("Storage failure: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Storage error".to_string())
        }
        AppError::Database(e) => {
            log::error!("Database failure: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Database error".to_string())
        }
        AppError::Internal(e) => {
            log::error!("Internal failure: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
        }
    }
}

pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let code;
    let message;
    let timestamp = chrono::Utc::now().to_rfc3339();

    if err.is_not_found() {
        code = StatusCode::NOT_FOUND;
        message = "Not Found".to_string();
    } else if let Some(app_error) = err.find::<AppError>() {
        let (status, text) = classify(app_error);
        code = status;
        message = text;
    } else if let Some(body_error) = err.find::<warp::filters::body::BodyDeserializeError>() {
        code = StatusCode::BAD_REQUEST;
        message = format!("Invalid request body: {}", body_error);
    } else if err.find::<warp::reject::InvalidQuery>().is_some() {
        code = StatusCode::BAD_REQUEST;
        message = "Invalid query string".to_string();
    } else if err.find::<warp::reject::InvalidHeader>().is_some()
        || err.find::<warp::reject::MissingHeader>().is_some()
    {
        code = StatusCode::BAD_REQUEST;
        message = "Invalid or missing header".to_string();
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        code = StatusCode::PAYLOAD_TOO_LARGE;
        message = "Payload too large".to_string();
    } else if err.find::<warp::reject::UnsupportedMediaType>().is_some() {
        code = StatusCode::UNSUPPORTED_MEDIA_TYPE;
        message = "Unsupported media type".to_string();
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        code = StatusCode::METHOD_NOT_ALLOWED;
        message = "Method not allowed".to_string();
    } else {
        log::error!("Unhandled rejection: {:?}", err);
        code = StatusCode::INTERNAL_SERVER_ERROR;
        message = "Internal server error".to_string();
    }

    let error_response = ErrorResponse {
        error: message,
        code: code.as_u16(),
        timestamp,
    };

    Ok(warp::reply::with_status(
        warp::reply::json(&error_response),
        code,
    ))
}

/// Lifts a service error into a warp rejection, recovered by [`handle_rejection`].
pub fn app_rejection(err: AppError) -> Rejection {
    reject::custom(err)
}

pub fn cors() -> warp::cors::Builder {
    warp::cors()
        .allow_any_origin()
        .allow_headers(vec!["content-type", "authorization"])
        .allow_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"])
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn status_of(err: Rejection) -> StatusCode {
        handle_rejection(err).await.unwrap().into_response().status()
    }

    #[tokio::test]
    async fn test_app_errors_map_to_status_codes() {
        assert_eq!(
            status_of(app_rejection(AppError::validation("bad"))).await,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(app_rejection(AppError::not_found("gone"))).await,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(app_rejection(AppError::Conflict("dup".to_string()))).await,
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(app_rejection(AppError::Internal("boom".to_string()))).await,
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(status_of(warp::reject::not_found()).await, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_error_body_hides_internal_details() {
        let (code, message) = classify(&AppError::Database(sqlx::Error::PoolTimedOut));
        assert_eq!(code, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(message, "Database error");

        let (code, message) = classify(&AppError::validation("Missing required field: title"));
        assert_eq!(code, StatusCode::BAD_REQUEST);
        assert_eq!(message, "Missing required field: title");
    }
}
