use iced::widget::image::Handle;
use image::ImageReader;
use std::collections::HashMap;
use std::io::Cursor;
use tracing::warn;

use crate::api::ApiClient;
use crate::error::Result;

/// Image bytes ready for display, with natural size when it could be read
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub bytes: Vec<u8>,
    pub dimensions: Option<(u32, u32)>,
}

#[derive(Debug, Clone)]
pub enum Thumbnail {
    Loading,
    Ready {
        handle: Handle,
        dimensions: Option<(u32, u32)>,
    },
    Failed,
}

/// In-memory image cache keyed by source URL.
///
/// Gallery tiles, result tiles, table thumbnails and overlays all draw
/// from here, so every URL is fetched once per session.
#[derive(Debug, Default)]
pub struct ThumbnailCache {
    entries: HashMap<String, Thumbnail>,
}

impl ThumbnailCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `src` as wanted. Returns true if the caller should fetch it.
    pub fn request(&mut self, src: &str) -> bool {
        if self.entries.contains_key(src) {
            return false;
        }
        self.entries.insert(src.to_string(), Thumbnail::Loading);
        true
    }

    /// Store a fetch outcome; returns the natural size if known
    pub fn finish(&mut self, src: String, result: std::result::Result<LoadedImage, String>) -> Option<(u32, u32)> {
        match result {
            Ok(loaded) => {
                let dimensions = loaded.dimensions;
                self.entries.insert(
                    src,
                    Thumbnail::Ready {
                        handle: Handle::from_bytes(loaded.bytes),
                        dimensions,
                    },
                );
                dimensions
            }
            Err(e) => {
                warn!(src = %src, error = %e, "Could not load image");
                self.entries.insert(src, Thumbnail::Failed);
                None
            }
        }
    }

    pub fn get(&self, src: &str) -> Option<&Thumbnail> {
        self.entries.get(src)
    }

    pub fn handle(&self, src: &str) -> Option<&Handle> {
        match self.entries.get(src) {
            Some(Thumbnail::Ready { handle, .. }) => Some(handle),
            _ => None,
        }
    }

    pub fn dimensions(&self, src: &str) -> Option<(u32, u32)> {
        match self.entries.get(src) {
            Some(Thumbnail::Ready { dimensions, .. }) => *dimensions,
            _ => None,
        }
    }
}

/// Natural width and height of an encoded image, without decoding pixels
pub fn read_dimensions(bytes: &[u8]) -> Result<(u32, u32)> {
    let dimensions = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .into_dimensions()?;
    Ok(dimensions)
}

/// Fetch an image and read its natural size off the UI thread
pub async fn load_image(client: ApiClient, src: String) -> std::result::Result<LoadedImage, String> {
    let fetched = client.fetch_image(&src).await.map_err(|e| e.to_string())?;

    tokio::task::spawn_blocking(move || {
        let dimensions = read_dimensions(&fetched.bytes).ok();
        LoadedImage {
            bytes: fetched.bytes,
            dimensions,
        }
    })
    .await
    .map_err(|e| format!("Task join error: {}", e))
}
