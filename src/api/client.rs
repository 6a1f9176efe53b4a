use iced::futures::future::try_join_all;
use reqwest::header::CONTENT_DISPOSITION;
use reqwest::Response;
use tracing::{debug, instrument};

use super::types::{
    GenerationModel, GenerationRequest, GenerationResponse, ImageList, ImageMetadata,
    UploadDataRecord, UploadOutcome, UploadRequest,
};
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};

/// Raw image bytes plus the header that names them
#[derive(Debug, Clone)]
pub struct FetchedImage {
    pub bytes: Vec<u8>,
    pub content_disposition: Option<String>,
}

/// HTTP client for both the gallery API and the remote generation API.
///
/// Cheap to clone: the underlying connection pool is shared, so each
/// async task takes its own copy.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    api_base: String,
    generation_base: String,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            api_base: config.api_base().to_string(),
            generation_base: config.generation_base().to_string(),
        })
    }

    /// URL an uploaded image is served from
    pub fn image_url(&self, filename: &str) -> String {
        format!("{}/uploaded_images/{}", self.api_base, filename)
    }

    /// Generated image URLs are usually server-relative to the generation API
    pub fn resolve_generated_url(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else if url.starts_with('/') {
            format!("{}{}", self.generation_base, url)
        } else {
            format!("{}/{}", self.generation_base, url)
        }
    }

    /// `GET /api/uploaded_images?page=N`
    #[instrument(skip(self))]
    pub async fn fetch_page(&self, page: u32) -> Result<Vec<String>> {
        let url = format!("{}/api/uploaded_images", self.api_base);
        let response = self.http.get(&url).query(&[("page", page)]).send().await?;
        let list: ImageList = check_status(response)?.json().await?;
        debug!(count = list.images.len(), "Fetched gallery page");
        Ok(list.images)
    }

    /// `GET /api/uploaded_images` without paging
    pub async fn fetch_all_filenames(&self) -> Result<Vec<String>> {
        let url = format!("{}/api/uploaded_images", self.api_base);
        let response = self.http.get(&url).send().await?;
        let list: ImageList = check_status(response)?.json().await?;
        Ok(list.images)
    }

    /// `GET /api/metadata?filename=F`
    pub async fn fetch_metadata(&self, filename: &str) -> Result<ImageMetadata> {
        let url = format!("{}/api/metadata", self.api_base);
        let response = self
            .http
            .get(&url)
            .query(&[("filename", filename)])
            .send()
            .await?;
        Ok(check_status(response)?.json().await?)
    }

    /// Filename list followed by one metadata request per filename.
    /// Requests run concurrently; the first failure fails the whole load.
    #[instrument(skip(self))]
    pub async fn fetch_all_metadata(&self) -> Result<Vec<ImageMetadata>> {
        let filenames = self.fetch_all_filenames().await?;
        debug!(count = filenames.len(), "Fetching metadata for every image");

        try_join_all(filenames.iter().map(|filename| self.fetch_metadata(filename))).await
    }

    /// `POST /generate-art/{model}`
    #[instrument(skip(self, request), fields(model = model.slug()))]
    pub async fn generate(
        &self,
        model: GenerationModel,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse> {
        let url = format!("{}/generate-art/{}", self.generation_base, model.slug());
        let response = self.http.post(&url).json(request).send().await?;
        Ok(check_status(response)?.json().await?)
    }

    /// `POST /upload-data`
    pub async fn upload_data(&self, record: &UploadDataRecord) -> Result<()> {
        let url = format!("{}/upload-data", self.generation_base);
        let response = self.http.post(&url).json(record).send().await?;
        check_status(response)?;
        Ok(())
    }

    /// `POST /upload`
    pub async fn upload_images(&self, request: &UploadRequest) -> Result<Vec<UploadOutcome>> {
        let url = format!("{}/upload", self.api_base);
        let response = self.http.post(&url).json(request).send().await?;
        Ok(check_status(response)?.json().await?)
    }

    /// Fetch any image as raw bytes
    pub async fn fetch_image(&self, url: &str) -> Result<FetchedImage> {
        let response = check_status(self.http.get(url).send().await?)?;
        let content_disposition = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let bytes = response.bytes().await?.to_vec();

        Ok(FetchedImage {
            bytes,
            content_disposition,
        })
    }
}

fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(ClientError::Status {
            url: response.url().to_string(),
            status,
        })
    }
}
