//! Image resolution: fetch a source URL and cache a small thumbnail.

use std::io::Cursor;
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use image::ImageFormat;
use dex_core::entry::ImageDescriptor;

/// Longest thumbnail edge in pixels.
pub const THUMBNAIL_SIZE: u32 = 128;

/// Content type of every generated thumbnail.
pub const THUMBNAIL_CONTENT_TYPE: &str = "image/png";

/// HTTP request timeout for fetching a source image.
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("Image fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("Image host returned HTTP {0}")]
    HttpStatus(u16),

    #[error("Image decode failed: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Thumbnail task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Turns an image source into a descriptor with a cached thumbnail.
#[async_trait]
pub trait ImageResolver: Send + Sync {
    async fn resolve(&self, src: &str) -> Result<ImageDescriptor, ImageError>;
}

/// Fetches images over HTTP and thumbnails them locally.
pub struct HttpImageResolver {
    client: reqwest::Client,
}

impl HttpImageResolver {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self { client }
    }
}

impl Default for HttpImageResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageResolver for HttpImageResolver {
    async fn resolve(&self, src: &str) -> Result<ImageDescriptor, ImageError> {
        let response = self.client.get(src).send().await?;
        if !response.status().is_success() {
            return Err(ImageError::HttpStatus(response.status().as_u16()));
        }
        let bytes = response.bytes().await?;

        // Decoding and resizing are CPU-bound.
        let thumbnail = tokio::task::spawn_blocking(move || make_thumbnail(&bytes)).await??;

        tracing::debug!(src, bytes = thumbnail.len(), "Resolved image thumbnail");
        Ok(ImageDescriptor {
            src: src.to_string(),
            thumbnail_b64: Some(thumbnail),
            thumbnail_content_type: Some(THUMBNAIL_CONTENT_TYPE.to_string()),
        })
    }
}

/// Decode `bytes`, shrink to fit [`THUMBNAIL_SIZE`], and return base64 PNG.
pub fn make_thumbnail(bytes: &[u8]) -> Result<String, ImageError> {
    let decoded = image::load_from_memory(bytes)?;
    let thumbnail = if decoded.width() <= THUMBNAIL_SIZE && decoded.height() <= THUMBNAIL_SIZE {
        decoded
    } else {
        decoded.thumbnail(THUMBNAIL_SIZE, THUMBNAIL_SIZE)
    };

    let mut png = Cursor::new(Vec::new());
    thumbnail.write_to(&mut png, ImageFormat::Png)?;
    Ok(general_purpose::STANDARD.encode(png.into_inner()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use image::{DynamicImage, GenericImageView, RgbImage};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::new(width, height));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn thumbnail_fits_bounds_and_keeps_aspect() {
        let b64 = make_thumbnail(&png_bytes(512, 256)).unwrap();
        let decoded = general_purpose::STANDARD.decode(b64).unwrap();
        let thumb = image::load_from_memory(&decoded).unwrap();
        assert_eq!(thumb.dimensions(), (128, 64));
    }

    #[test]
    fn small_images_are_not_upscaled() {
        let b64 = make_thumbnail(&png_bytes(20, 10)).unwrap();
        let decoded = general_purpose::STANDARD.decode(b64).unwrap();
        let thumb = image::load_from_memory(&decoded).unwrap();
        assert_eq!(thumb.dimensions(), (20, 10));
    }

    #[test]
    fn garbage_is_a_decode_error() {
        assert_matches!(make_thumbnail(b"not an image"), Err(ImageError::Decode(_)));
    }
}
