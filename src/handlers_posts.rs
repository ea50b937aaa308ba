use serde_json::json;
use warp::{Filter, Rejection, Reply};

use crate::csv_export::{export_filename, posts_to_csv};
use crate::db::{PostInput, PostQuery, PublishDateUpdate};
use crate::post_repository::PostRepository;
use crate::warp_helpers::{app_rejection, with_posts};

pub async fn list_posts(query: PostQuery, posts: PostRepository) -> Result<impl Reply, Rejection> {
    let posts = posts.list(&query).await.map_err(app_rejection)?;
    Ok(warp::reply::json(&posts))
}

pub async fn get_post(id: String, posts: PostRepository) -> Result<impl Reply, Rejection> {
    let post = posts.get_by_id(&id).await.map_err(app_rejection)?;
    Ok(warp::reply::json(&post))
}

pub async fn create_post(input: PostInput, posts: PostRepository) -> Result<impl Reply, Rejection> {
    let post = posts.create(&input).await.map_err(app_rejection)?;
    // Usage tracking must not delay or fail the response
    posts.spawn_usage_tracking(post.id.clone(), input.media_ids());
    Ok(warp::reply::json(&post))
}

pub async fn update_post(
    id: String,
    input: PostInput,
    posts: PostRepository,
) -> Result<impl Reply, Rejection> {
    let post = posts.update(&id, &input).await.map_err(app_rejection)?;
    posts.spawn_usage_tracking(post.id.clone(), input.media_ids());
    Ok(warp::reply::json(&post))
}

pub async fn update_post_date(
    id: String,
    body: PublishDateUpdate,
    posts: PostRepository,
) -> Result<impl Reply, Rejection> {
    posts
        .update_publish_date(&id, body.publish_date)
        .await
        .map_err(app_rejection)?;
    Ok(warp::reply::json(&json!({
        "message": "Publish date updated",
        "id": id,
        "publishDate": body.publish_date,
    })))
}

pub async fn delete_post(id: String, posts: PostRepository) -> Result<impl Reply, Rejection> {
    posts.delete(&id).await.map_err(app_rejection)?;
    Ok(warp::reply::json(&json!({ "message": "Post deleted", "id": id })))
}

pub async fn export_csv(posts: PostRepository) -> Result<impl Reply, Rejection> {
    let posts = posts.list_for_export().await.map_err(app_rejection)?;
    let csv = posts_to_csv(&posts);

    let reply = warp::reply::with_header(csv, "Content-Type", "text/csv; charset=utf-8");
    Ok(warp::reply::with_header(
        reply,
        "Content-Disposition",
        format!("attachment; filename={}", export_filename()),
    ))
}

pub fn build_post_routes(
    posts: PostRepository,
    json_body_limit: u64,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let list = warp::path!("api" / "posts")
        .and(warp::get())
        .and(warp::query::<PostQuery>())
        .and(with_posts(posts.clone()))
        .and_then(list_posts);

    let export = warp::path!("api" / "posts" / "export" / "csv")
        .and(warp::get())
        .and(with_posts(posts.clone()))
        .and_then(export_csv);

    let get = warp::path!("api" / "posts" / String)
        .and(warp::get())
        .and(with_posts(posts.clone()))
        .and_then(get_post);

    let create = warp::path!("api" / "posts")
        .and(warp::post())
        .and(warp::body::content_length_limit(json_body_limit))
        .and(warp::body::json())
        .and(with_posts(posts.clone()))
        .and_then(create_post);

    let update = warp::path!("api" / "posts" / String)
        .and(warp::put())
        .and(warp::body::content_length_limit(json_body_limit))
        .and(warp::body::json())
        .and(with_posts(posts.clone()))
        .and_then(update_post);

    let update_date = warp::path!("api" / "posts" / String / "date")
        .and(warp::patch())
        .and(warp::body::content_length_limit(json_body_limit))
        .and(warp::body::json())
        .and(with_posts(posts.clone()))
        .and_then(update_post_date);

    let delete = warp::path!("api" / "posts" / String)
        .and(warp::delete())
        .and(with_posts(posts))
        .and_then(delete_post);

    list.or(export)
        .or(get)
        .or(create)
        .or(update)
        .or(update_date)
        .or(delete)
}
