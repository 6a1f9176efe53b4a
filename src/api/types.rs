/// Wire types for the gallery and generation APIs
///
/// These structs mirror the JSON bodies exchanged with the servers.
/// They are the only shapes the rest of the client sees from the network.

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Display format for metadata timestamps (sorts chronologically as text)
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Response of `GET /api/uploaded_images`
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct ImageList {
    #[serde(default)]
    pub images: Vec<String>,
}

/// Metadata for a single stored image (`GET /api/metadata?filename=F`)
///
/// The store allows nulls in most columns, so every field except the
/// filename tolerates `null` or absence.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct ImageMetadata {
    #[serde(default)]
    pub id: Option<i64>,
    pub filename: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub timestamp: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub model: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub prompt: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub width: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub height: u32,
    #[serde(default)]
    pub quality: Option<String>,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl ImageMetadata {
    /// Timestamp normalised to `YYYY-MM-DD HH:MM:SS` when it can be parsed
    pub fn display_timestamp(&self) -> String {
        format_timestamp(&self.timestamp)
    }

    /// "W x H"
    pub fn dimensions(&self) -> String {
        format!("{} x {}", self.width, self.height)
    }

    /// Labelled lines for the image details panel
    pub fn detail_lines(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Filename", self.filename.clone()),
            ("Timestamp", self.display_timestamp()),
            ("Model", self.model.clone()),
            ("Prompt", self.prompt.clone()),
            ("Dimensions", self.dimensions()),
            ("Quality", self.quality.clone().unwrap_or_default()),
            ("Style", self.style.clone().unwrap_or_default()),
            ("User", self.user.clone().unwrap_or_default()),
        ]
    }
}

/// Parse the handful of timestamp shapes the metadata store emits.
/// Anything unrecognised is returned verbatim.
pub fn format_timestamp(raw: &str) -> String {
    let trimmed = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return dt.format(TIMESTAMP_FORMAT).to_string();
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed) {
        return dt.format(TIMESTAMP_FORMAT).to_string();
    }
    for pattern in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, pattern) {
            return dt.format(TIMESTAMP_FORMAT).to_string();
        }
    }

    raw.to_string()
}

/// Generation backends exposed by the remote API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GenerationModel {
    #[default]
    Dalle,
    StableDiffusion,
}

impl GenerationModel {
    pub const ALL: [GenerationModel; 2] = [GenerationModel::Dalle, GenerationModel::StableDiffusion];

    /// Path segment used in `/generate-art/{model}`
    pub fn slug(self) -> &'static str {
        match self {
            GenerationModel::Dalle => "dalle",
            GenerationModel::StableDiffusion => "stable-diffusion",
        }
    }
}

impl fmt::Display for GenerationModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationModel::Dalle => write!(f, "DALL·E"),
            GenerationModel::StableDiffusion => write!(f, "Stable Diffusion"),
        }
    }
}

/// Body of `POST /generate-art/{model}`
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub n: u32,
    pub width: u32,
    pub height: u32,
    pub quality: String,
    pub style: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

/// Response of `POST /generate-art/{model}`
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct GenerationResponse {
    #[serde(default)]
    pub images: Vec<GeneratedImage>,
}

/// The API has returned both bare URLs and `{url, metadata}` objects
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum GeneratedImage {
    Url(String),
    Entry {
        url: String,
        #[serde(default)]
        metadata: Option<serde_json::Value>,
    },
}

impl GeneratedImage {
    pub fn url(&self) -> &str {
        match self {
            GeneratedImage::Url(url) => url,
            GeneratedImage::Entry { url, .. } => url,
        }
    }
}

/// Body of `POST /upload-data`: what was asked for and what came back
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct UploadDataRecord {
    pub model: String,
    pub prompt: String,
    pub n: u32,
    pub width: u32,
    pub height: u32,
    pub quality: String,
    pub style: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    pub images: Vec<String>,
}

impl UploadDataRecord {
    pub fn from_generation(
        model: GenerationModel,
        request: &GenerationRequest,
        response: &GenerationResponse,
    ) -> Self {
        Self {
            model: model.slug().to_string(),
            prompt: request.prompt.clone(),
            n: request.n,
            width: request.width,
            height: request.height,
            quality: request.quality.clone(),
            style: request.style.clone(),
            user: request.user.clone(),
            images: response.images.iter().map(|image| image.url().to_string()).collect(),
        }
    }
}

/// Body of `POST /upload`
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct UploadRequest {
    pub images: Vec<UploadImage>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UploadImage {
    pub image_url: String,
    pub generated_image_filename: String,
}

/// One entry of the `POST /upload` response
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct UploadOutcome {
    #[serde(default)]
    pub uploaded_filename: Option<String>,
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_tolerates_nulls() {
        let json = r#"{
            "filename": "a.png",
            "timestamp": null,
            "model": "dalle",
            "prompt": "a cat",
            "width": 1024,
            "height": null,
            "quality": null,
            "style": "vivid"
        }"#;
        let metadata: ImageMetadata = serde_json::from_str(json).unwrap();

        assert_eq!(metadata.timestamp, "");
        assert_eq!(metadata.height, 0);
        assert_eq!(metadata.quality, None);
        assert_eq!(metadata.style.as_deref(), Some("vivid"));
        assert_eq!(metadata.user, None);
        assert_eq!(metadata.id, None);
    }

    #[test]
    fn test_detail_lines() {
        let metadata = ImageMetadata {
            filename: "a.png".to_string(),
            width: 1024,
            height: 768,
            user: Some("ana".to_string()),
            ..ImageMetadata::default()
        };
        let lines = metadata.detail_lines();

        assert_eq!(lines.len(), 8);
        assert_eq!(lines[0], ("Filename", "a.png".to_string()));
        assert_eq!(lines[4], ("Dimensions", "1024 x 768".to_string()));
        assert_eq!(lines[7], ("User", "ana".to_string()));
    }

    #[test]
    fn test_format_timestamp_shapes() {
        assert_eq!(format_timestamp("2024-05-01T10:20:30+00:00"), "2024-05-01 10:20:30");
        assert_eq!(format_timestamp("Wed, 01 May 2024 10:20:30 +0000"), "2024-05-01 10:20:30");
        assert_eq!(format_timestamp("2024-05-01 10:20:30.123456"), "2024-05-01 10:20:30");
        assert_eq!(format_timestamp("2024-05-01 10:20:30"), "2024-05-01 10:20:30");
        assert_eq!(format_timestamp("yesterday"), "yesterday");
    }

    #[test]
    fn test_generation_response_accepts_both_shapes() {
        let json = r#"{ "images": [
            "/images/one.png",
            { "url": "/images/two.png", "metadata": { "model": "dalle" } }
        ] }"#;
        let response: GenerationResponse = serde_json::from_str(json).unwrap();
        let urls: Vec<&str> = response.images.iter().map(GeneratedImage::url).collect();

        assert_eq!(urls, vec!["/images/one.png", "/images/two.png"]);
    }

    #[test]
    fn test_upload_request_field_names() {
        let request = UploadRequest {
            images: vec![UploadImage {
                image_url: "http://host/images/x.png".to_string(),
                generated_image_filename: "x.png".to_string(),
            }],
        };
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["images"][0]["imageUrl"], "http://host/images/x.png");
        assert_eq!(value["images"][0]["generatedImageFilename"], "x.png");
    }

    #[test]
    fn test_request_omits_missing_user() {
        let request = GenerationRequest {
            prompt: "p".to_string(),
            n: 1,
            width: 1024,
            height: 1024,
            quality: "standard".to_string(),
            style: "natural".to_string(),
            user: None,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("user").is_none());
    }
}
