use crate::db::MediaType;
use crate::file_store::extension_of;

/// Detects an accepted MIME type from a file extension. Only the formats the
/// library accepts are known here.
fn from_extension(ext: &str) -> Option<MimeType> {
    let ext_lower = ext.to_lowercase();
    match ext_lower.as_str() {
        // Images
        "jpg" | "jpeg" => Some(MimeType::new("image", "jpeg")),
        "png" => Some(MimeType::new("image", "png")),
        "gif" => Some(MimeType::new("image", "gif")),
        "webp" => Some(MimeType::new("image", "webp")),

        // Videos
        "mp4" => Some(MimeType::new("video", "mp4")),
        "mov" => Some(MimeType::new("video", "quicktime")),
        "avi" => Some(MimeType::new("video", "x-msvideo")),

        _ => None,
    }
}

/// Parses a declared content type, keeping it only when it is accepted.
fn from_declared(content_type: &str) -> Option<MimeType> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    match essence.as_str() {
        "image/jpeg" | "image/jpg" => Some(MimeType::new("image", "jpeg")),
        "image/png" => Some(MimeType::new("image", "png")),
        "image/gif" => Some(MimeType::new("image", "gif")),
        "image/webp" => Some(MimeType::new("image", "webp")),
        "video/mp4" => Some(MimeType::new("video", "mp4")),
        "video/quicktime" => Some(MimeType::new("video", "quicktime")),
        "video/x-msvideo" | "video/avi" => Some(MimeType::new("video", "x-msvideo")),
        _ => None,
    }
}

/// Checks an upload against the accepted formats. The extension must be
/// accepted; a declared type must be accepted too and agree with the extension
/// on image vs video. A missing or generic declared type falls back to the
/// extension.
pub fn resolve_upload(declared: Option<&str>, filename: &str) -> Result<MimeType, String> {
    let by_extension = extension_of(filename)
        .as_deref()
        .and_then(from_extension)
        .ok_or_else(|| format!("File type not allowed: {}", filename))?;

    match declared.map(str::trim).filter(|d| !d.is_empty()) {
        None => Ok(by_extension),
        Some(d) if d.eq_ignore_ascii_case("application/octet-stream") => Ok(by_extension),
        Some(d) => {
            let declared = from_declared(d)
                .ok_or_else(|| format!("File type not allowed: {}", d))?;
            if declared.type_() != by_extension.type_() {
                return Err(format!(
                    "File type {} does not match extension of {}",
                    declared, filename
                ));
            }
            Ok(declared)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MimeType {
    type_: String,
    subtype: String,
}

impl MimeType {
    fn new(type_: &str, subtype: &str) -> Self {
        Self {
            type_: type_.to_string(),
            subtype: subtype.to_string(),
        }
    }

    pub fn type_(&self) -> &str {
        &self.type_
    }

    pub fn media_type(&self) -> MediaType {
        MediaType::from_mime(&self.to_string())
    }
}

impl std::fmt::Display for MimeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.type_, self.subtype)
    }
}
