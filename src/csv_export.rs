use chrono::Utc;

use crate::db::Post;

pub const CSV_HEADER: [&str; 7] = [
    "Title",
    "Platform",
    "Caption",
    "Image URL",
    "AI Prompt",
    "Status",
    "Publish Date",
];

/// Renders posts as CSV, one row per post in the given order. Every data cell
/// is quoted.
pub fn posts_to_csv(posts: &[Post]) -> String {
    let mut lines = Vec::with_capacity(posts.len() + 1);
    lines.push(CSV_HEADER.join(","));

    for post in posts {
        let publish_date = post
            .publish_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        let row = [
            post.title.as_str(),
            post.platform.as_str(),
            post.caption.as_deref().unwrap_or(""),
            post.display_image_url().unwrap_or(""),
            post.ai_prompt.as_deref().unwrap_or(""),
            post.status.as_str(),
            publish_date.as_str(),
        ];
        lines.push(row.iter().map(|cell| quote(cell)).collect::<Vec<_>>().join(","));
    }

    lines.join("\n")
}

fn quote(cell: &str) -> String {
    format!("\"{}\"", cell.replace('"', "\"\""))
}

pub fn export_filename() -> String {
    format!("social-media-{}.csv", Utc::now().timestamp_millis())
}
