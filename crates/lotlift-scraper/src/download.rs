//! Photo download for listing uploads.

use futures::stream::{self, StreamExt};
use lotlift_core::Photo;

use crate::error::ScraperError;

/// A downloaded photo ready to attach to a listing form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoFile {
    /// `photo_<n>.<ext>`, numbered from 1 in upload order.
    pub file_name: String,
    pub content_type: String,
    pub source_url: String,
    pub bytes: Vec<u8>,
}

/// Download up to `max` photos, at most `concurrency` at a time.
///
/// Output order follows `photos`. Photos that fail to download or that are
/// not served as images are logged and skipped.
pub async fn download_photos(
    client: &reqwest::Client,
    photos: &[Photo],
    max: usize,
    concurrency: usize,
) -> Vec<PhotoFile> {
    let fetched: Vec<Option<(String, String, Vec<u8>)>> = stream::iter(photos.iter().take(max))
        .map(|photo| async move {
            match fetch_photo(client, &photo.url).await {
                Ok((content_type, bytes)) => Some((photo.url.clone(), content_type, bytes)),
                Err(err) => {
                    tracing::warn!(url = %photo.url, error = %err, "skipping photo");
                    None
                }
            }
        })
        .buffered(concurrency.max(1))
        .collect()
        .await;

    fetched
        .into_iter()
        .flatten()
        .enumerate()
        .map(|(idx, (source_url, content_type, bytes))| PhotoFile {
            file_name: format!("photo_{}.{}", idx + 1, extension_for(&content_type, &source_url)),
            content_type,
            source_url,
            bytes,
        })
        .collect()
}

async fn fetch_photo(client: &reqwest::Client, url: &str) -> Result<(String, Vec<u8>), ScraperError> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(ScraperError::UnexpectedStatus {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map_or_else(
            || "application/octet-stream".to_string(),
            |v| v.split(';').next().unwrap_or(v).trim().to_ascii_lowercase(),
        );
    if !(content_type.starts_with("image/") || content_type == "application/octet-stream") {
        return Err(ScraperError::NotAnImage {
            url: url.to_string(),
            content_type,
        });
    }
    let bytes = response.bytes().await?;
    Ok((content_type, bytes.to_vec()))
}

fn extension_for(content_type: &str, url: &str) -> &'static str {
    match content_type {
        "image/png" => return "png",
        "image/gif" => return "gif",
        "image/webp" => return "webp",
        "image/avif" => return "avif",
        "image/bmp" => return "bmp",
        "image/svg+xml" => return "svg",
        "image/jpeg" | "image/jpg" => return "jpg",
        _ => {}
    }
    let path = url.split(['?', '#']).next().unwrap_or(url).to_ascii_lowercase();
    ["png", "gif", "webp", "avif", "bmp", "svg"]
        .into_iter()
        .find(|ext| path.ends_with(&format!(".{ext}")))
        .unwrap_or("jpg")
}
