use bytes::Bytes;
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use std::sync::Arc;
use tempfile::TempDir;

use post_planner::csv_export::posts_to_csv;
use post_planner::db::{
    create_in_memory_pool, ImageInput, MediaQuery, MediaType, MetadataUpdate, NewShooting,
    PostInput, PostStatus,
};
use post_planner::error::AppError;
use post_planner::file_store::LocalFileStore;
use post_planner::library_service::{LibraryService, UploadedFile};
use post_planner::post_repository::PostRepository;
use post_planner::thumbnail_generator::ImageThumbnailer;

struct App {
    _dir: TempDir,
    library: LibraryService,
    posts: PostRepository,
}

async fn app() -> App {
    let dir = TempDir::new().unwrap();
    let pool = create_in_memory_pool().await.unwrap();
    let files = Arc::new(LocalFileStore::new(
        dir.path().join("uploads"),
        "http://localhost:5001/uploads",
    ));
    let thumbs = Arc::new(LocalFileStore::new(
        dir.path().join("uploads/thumbs"),
        "http://localhost:5001/uploads/thumbs",
    ));
    let library = LibraryService::new(
        pool.clone(),
        files,
        Arc::new(ImageThumbnailer::new(thumbs, 300)),
    );
    App {
        _dir: dir,
        library,
        posts: PostRepository::new(pool),
    }
}

fn photo(name: &str) -> UploadedFile {
    let img: ImageBuffer<Rgb<u8>, Vec<u8>> =
        ImageBuffer::from_fn(400, 300, |x, _| Rgb([(x % 255) as u8, 120, 40]));
    let mut buffer = std::io::Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buffer, ImageFormat::Jpeg)
        .unwrap();
    UploadedFile::new(
        name,
        Some("image/jpeg".to_string()),
        Bytes::from(buffer.into_inner()),
    )
}

fn params(raw: &[(&str, &str)]) -> Vec<(String, String)> {
    raw.iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn tag_update(tags: &[&str]) -> MetadataUpdate {
    MetadataUpdate {
        tags: Some(tags.iter().map(|t| t.to_string()).collect()),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_upload_tag_use_and_delete_lifecycle() {
    let app = app().await;

    let media = app.library.upload(photo("cat.jpg"), None).await.unwrap();
    assert_eq!(media.media_type, MediaType::Image);
    assert!(media.thumbnail_url.is_some());
    assert_eq!((media.width, media.height), (Some(400), Some(300)));

    app.library
        .media()
        .update_metadata(
            &media.id,
            &MetadataUpdate {
                is_favorite: Some(true),
                tags: Some(vec!["pets".to_string()]),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let fetched = app.library.media().get_by_id(&media.id).await.unwrap();
    assert!(fetched.is_favorite);
    assert_eq!(fetched.tags, vec!["pets"]);

    let input = PostInput {
        title: Some("Caturday".to_string()),
        platform: Some("Instagram".to_string()),
        status: Some(PostStatus::Draft),
        images: vec![ImageInput {
            image_url: Some(media.file_url.clone()),
            media_id: Some(media.id.clone()),
            ..Default::default()
        }],
        ..Default::default()
    };
    let post = app.posts.create(&input).await.unwrap();
    let tracked = app
        .posts
        .spawn_usage_tracking(post.id.clone(), input.media_ids())
        .await
        .unwrap();
    assert_eq!(tracked, 1);

    let used = app.library.media().get_by_id(&media.id).await.unwrap();
    assert_eq!(used.usage_count, 1);
    assert!(used.last_used_at.is_some());

    app.library.delete(&media.id).await.unwrap();
    assert!(matches!(
        app.library.media().get_by_id(&media.id).await,
        Err(AppError::NotFound(_))
    ));

    // The post keeps its reference to the deleted media
    let post = app.posts.get_by_id(&post.id).await.unwrap();
    assert_eq!(post.images.len(), 1);
    assert_eq!(post.images[0].media_id.as_deref(), Some(media.id.as_str()));
    assert_eq!(post.images[0].image_url.as_deref(), Some(media.file_url.as_str()));
}

#[tokio::test]
async fn test_duplicate_shooting_name_conflicts() {
    let app = app().await;
    let shootings = app.library.shootings();

    let beach = shootings
        .create(NewShooting {
            name: "Beach".to_string(),
            description: Some("Summer 2026".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

    let again = shootings
        .create(NewShooting {
            name: "Beach".to_string(),
            ..Default::default()
        })
        .await;
    assert!(matches!(again, Err(AppError::Conflict(_))));

    let list = shootings.list().await.unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].id, beach.id);
    assert_eq!(list[0].description.as_deref(), Some("Summer 2026"));
}

#[tokio::test]
async fn test_shooting_delete_keeps_media() {
    let app = app().await;
    let shooting = app
        .library
        .shootings()
        .create(NewShooting {
            name: "Studio".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

    let mut ids = Vec::new();
    for name in ["a.jpg", "b.jpg"] {
        let media = app.library.upload(photo(name), None).await.unwrap();
        app.library
            .media()
            .update_metadata(
                &media.id,
                &MetadataUpdate {
                    shooting_id: Some(Some(shooting.id.clone())),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        ids.push(media.id);
    }

    let filtered = MediaQuery::from_pairs(&params(&[("shootingId", shooting.id.as_str())]), 500);
    assert_eq!(app.library.media().query(&filtered).await.unwrap().len(), 2);

    app.library.shootings().delete(&shooting.id).await.unwrap();

    for id in &ids {
        let media = app.library.media().get_by_id(id).await.unwrap();
        assert!(media.shooting_id.is_none());
    }
    assert!(app.library.media().query(&filtered).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_tag_query_round_trip() {
    let app = app().await;
    let tagged = app.library.upload(photo("red.jpg"), None).await.unwrap();
    let plain = app.library.upload(photo("plain.jpg"), None).await.unwrap();
    app.library
        .media()
        .update_metadata(&tagged.id, &tag_update(&["red", "studio"]))
        .await
        .unwrap();
    app.library
        .media()
        .update_metadata(&plain.id, &tag_update(&["red"]))
        .await
        .unwrap();

    let both = MediaQuery::from_pairs(&params(&[("tags", "red"), ("tags", "studio")]), 500);
    let found = app.library.media().query(&both).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, tagged.id);

    let blue = MediaQuery::from_pairs(&params(&[("tags", "blue")]), 500);
    assert!(app.library.media().query(&blue).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_usage_sort_and_invalid_sort_fallback() {
    let app = app().await;
    let mut ids = Vec::new();
    for name in ["one.jpg", "two.jpg", "three.jpg"] {
        ids.push(app.library.upload(photo(name), None).await.unwrap().id);
    }

    let input = PostInput {
        title: Some("Carousel".to_string()),
        platform: Some("Instagram".to_string()),
        status: Some(PostStatus::Ready),
        images: vec![
            ImageInput {
                media_id: Some(ids[1].clone()),
                ..Default::default()
            },
            ImageInput {
                media_id: Some(ids[1].clone()),
                ..Default::default()
            },
            ImageInput {
                media_id: Some(ids[2].clone()),
                ..Default::default()
            },
        ],
        ..Default::default()
    };
    let post = app.posts.create(&input).await.unwrap();
    app.posts.track_media_usage(&post.id, &input.media_ids()).await;

    let ascending = MediaQuery::from_pairs(
        &params(&[("sortBy", "usageCount"), ("sortOrder", "ASC")]),
        500,
    );
    let counts: Vec<i64> = app
        .library
        .media()
        .query(&ascending)
        .await
        .unwrap()
        .iter()
        .map(|m| m.usage_count)
        .collect();
    assert_eq!(counts, vec![0, 1, 2]);

    let default_order: Vec<String> = app
        .library
        .media()
        .query(&MediaQuery::default())
        .await
        .unwrap()
        .into_iter()
        .map(|m| m.id)
        .collect();
    let invalid = MediaQuery::from_pairs(&params(&[("sortBy", "nonsense")]), 500);
    let invalid_order: Vec<String> = app
        .library
        .media()
        .query(&invalid)
        .await
        .unwrap()
        .into_iter()
        .map(|m| m.id)
        .collect();
    assert_eq!(invalid_order, default_order);
}

#[tokio::test]
async fn test_csv_export_of_saved_posts() {
    let app = app().await;
    let input = PostInput {
        title: Some("Quote \"of\" the day".to_string()),
        platform: Some("LinkedIn".to_string()),
        caption: Some("Stay curious".to_string()),
        status: Some(PostStatus::Published),
        publish_date: chrono::NaiveDate::from_ymd_opt(2026, 4, 2),
        images: vec![ImageInput {
            image_url: Some("http://localhost:5001/uploads/q.jpg".to_string()),
            ..Default::default()
        }],
        ..Default::default()
    };
    app.posts.create(&input).await.unwrap();

    let csv = posts_to_csv(&app.posts.list_for_export().await.unwrap());
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(
        lines[0],
        "Title,Platform,Caption,Image URL,AI Prompt,Status,Publish Date"
    );
    assert_eq!(
        lines[1],
        "\"Quote \"\"of\"\" the day\",\"LinkedIn\",\"Stay curious\",\"http://localhost:5001/uploads/q.jpg\",\"\",\"published\",\"2026-04-02\""
    );
}
