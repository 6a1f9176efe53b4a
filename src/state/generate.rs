/// Generation form controller
///
/// Holds one form per model tab, turns the active form into a
/// `GenerationRequest`, and tracks everything shown around a
/// submission: loading popup, error popup, submission message and
/// the result tiles.

use std::collections::HashMap;
use tracing::{error, info};

use super::data::{Tile, TileId, TileSet, TileSize};
use crate::api::types::{
    GenerationModel, GenerationRequest, GenerationResponse, UploadDataRecord, UploadImage,
    UploadRequest,
};
use crate::api::ApiClient;
use crate::error::{ClientError, Result};

/// Generated images are always requested square
pub const GENERATED_SIZE: u32 = 1024;

pub const DEFAULT_N: &str = "1";
pub const DEFAULT_QUALITY: &str = "standard";
pub const DEFAULT_STYLE: &str = "natural";

/// Choices offered by the quality and style pickers
pub const QUALITY_OPTIONS: [&str; 2] = ["Standard", "HD"];
pub const STYLE_OPTIONS: [&str; 2] = ["Natural", "Vivid"];

static EMPTY_FORM: GenerationForm = GenerationForm {
    prompt: String::new(),
    n: String::new(),
    quality: String::new(),
    style: String::new(),
    user: String::new(),
};

/// Raw form fields as typed by the user
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationForm {
    pub prompt: String,
    pub n: String,
    pub quality: String,
    pub style: String,
    pub user: String,
}

impl GenerationForm {
    /// Fill defaults, lower-case quality and style, and validate `n`
    pub fn to_request(&self) -> Result<GenerationRequest> {
        let n_raw = or_default(&self.n, DEFAULT_N);
        let n = n_raw
            .parse::<u32>()
            .map_err(|_| ClientError::InvalidInput {
                field: "n",
                reason: format!("expected a whole number, got {:?}", n_raw),
            })?;

        let user = self.user.trim();

        Ok(GenerationRequest {
            prompt: self.prompt.clone(),
            n,
            width: GENERATED_SIZE,
            height: GENERATED_SIZE,
            quality: or_default(&self.quality, DEFAULT_QUALITY).to_lowercase(),
            style: or_default(&self.style, DEFAULT_STYLE).to_lowercase(),
            user: (!user.is_empty()).then(|| user.to_string()),
        })
    }
}

fn or_default<'a>(value: &'a str, default: &'a str) -> &'a str {
    let value = value.trim();
    if value.is_empty() {
        default
    } else {
        value
    }
}

/// What a finished submission produced
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOutcome {
    /// Image URLs, already resolved against the generation API
    pub images: Vec<String>,
    /// Set when the images arrived but `/upload-data` failed
    pub upload_error: Option<String>,
}

#[derive(Debug)]
pub struct GenerationController {
    active: GenerationModel,
    forms: HashMap<GenerationModel, GenerationForm>,
    show_parameters: bool,
    loading: bool,
    error: Option<String>,
    /// Bumped on every success; a hide timer only hides its own message
    message_seq: u64,
    message_visible: bool,
    results: TileSet,
}

impl Default for GenerationController {
    fn default() -> Self {
        Self {
            active: GenerationModel::default(),
            forms: HashMap::new(),
            show_parameters: true,
            loading: false,
            error: None,
            message_seq: 0,
            message_visible: false,
            results: TileSet::new(),
        }
    }
}

impl GenerationController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Switch tabs. Exactly one model is active at any time.
    pub fn open_model(&mut self, model: GenerationModel) {
        self.active = model;
    }

    pub fn active_model(&self) -> GenerationModel {
        self.active
    }

    pub fn toggle_parameters(&mut self) {
        self.show_parameters = !self.show_parameters;
    }

    pub fn parameters_visible(&self) -> bool {
        self.show_parameters
    }

    pub fn parameters_label(&self) -> &'static str {
        if self.show_parameters {
            "Hide Parameters"
        } else {
            "Show Parameters"
        }
    }

    pub fn form(&self, model: GenerationModel) -> &GenerationForm {
        self.forms.get(&model).unwrap_or(&EMPTY_FORM)
    }

    pub fn form_mut(&mut self, model: GenerationModel) -> &mut GenerationForm {
        self.forms.entry(model).or_default()
    }

    /// Start a submission: shows the loading popup and builds the request.
    /// Invalid input ends the submission right away.
    pub fn begin_submit(&mut self, model: GenerationModel) -> Option<GenerationRequest> {
        self.loading = true;
        self.error = None;

        let request = self.form(model).to_request();
        match request {
            Ok(request) => Some(request),
            Err(e) => {
                self.finish_submit(Err(e.to_string()), |_| String::new());
                None
            }
        }
    }

    /// Single exit point of a submission. The loading popup is hidden
    /// first, whatever the outcome. Returns the sources of new tiles.
    pub fn finish_submit(
        &mut self,
        result: std::result::Result<GenerationOutcome, String>,
        filename_of: impl Fn(&str) -> String,
    ) -> Vec<String> {
        self.loading = false;

        match result {
            Ok(outcome) => {
                self.results.clear();
                for src in &outcome.images {
                    self.results
                        .push(filename_of(src), src.clone(), TileSize::square());
                }

                self.message_seq += 1;
                self.message_visible = true;

                if let Some(e) = outcome.upload_error {
                    error!(error = %e, "Error uploading generation data");
                    self.error = Some(e);
                }

                outcome.images
            }
            Err(e) => {
                error!(error = %e, "Error fetching and displaying images");
                self.error = Some(e);
                Vec::new()
            }
        }
    }

    /// Current submission message id, for the hide timer
    pub fn message_seq(&self) -> u64 {
        self.message_seq
    }

    pub fn hide_message(&mut self, seq: u64) {
        if seq == self.message_seq {
            self.message_visible = false;
        }
    }

    pub fn message_visible(&self) -> bool {
        self.message_visible
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    /// Size a result tile from its natural dimensions
    pub fn apply_natural_size(&mut self, src: &str, width: u32, height: u32) {
        self.results.resize_source(src, TileSize::from_natural(width, height));
    }

    pub fn results(&self) -> &TileSet {
        &self.results
    }

    pub fn remove_result(&mut self, id: TileId) -> bool {
        self.results.remove(id)
    }

    pub fn result(&self, id: TileId) -> Option<&Tile> {
        self.results.get(id)
    }
}

/// Last path segment of a URL, used as the generated image's filename
pub fn filename_from_url(url: &str) -> String {
    let path = url.split(|c: char| c == '?' || c == '#').next().unwrap_or(url);
    path.rsplit('/').next().unwrap_or(path).to_string()
}

/// `/upload` body for a single result tile
pub fn upload_request_for(tile: &Tile) -> UploadRequest {
    UploadRequest {
        images: vec![UploadImage {
            image_url: tile.src.clone(),
            generated_image_filename: tile.filename.clone(),
        }],
    }
}

/// Generate, then persist the generation record.
///
/// A failed generation is an error. A failed `/upload-data` still
/// returns the images, with the failure attached.
pub async fn run_generation(
    client: ApiClient,
    model: GenerationModel,
    request: GenerationRequest,
) -> std::result::Result<GenerationOutcome, String> {
    let response: GenerationResponse = client
        .generate(model, &request)
        .await
        .map_err(|e| e.to_string())?;

    info!(model = model.slug(), count = response.images.len(), "🎨 Generated images");

    let images = response
        .images
        .iter()
        .map(|image| client.resolve_generated_url(image.url()))
        .collect();

    let record = UploadDataRecord::from_generation(model, &request, &response);
    let upload_error = match client.upload_data(&record).await {
        Ok(()) => {
            info!("Data uploaded successfully");
            None
        }
        Err(e) => Some(format!("Failed to upload data: {}", e)),
    };

    Ok(GenerationOutcome {
        images,
        upload_error,
    })
}

/// Post one result tile to `/upload`; returns how many images the server stored
pub async fn upload_result(client: ApiClient, request: UploadRequest) -> std::result::Result<usize, String> {
    let outcomes = client.upload_images(&request).await.map_err(|e| e.to_string())?;
    let stored = outcomes
        .iter()
        .filter(|outcome| outcome.uploaded_filename.is_some())
        .count();

    if stored == 0 {
        let reason = outcomes
            .first()
            .map(|outcome| outcome.message.clone())
            .unwrap_or_else(|| "server stored nothing".to_string());
        return Err(reason);
    }
    Ok(stored)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(quality: &str, style: &str, n: &str) -> GenerationForm {
        GenerationForm {
            prompt: "a lighthouse at dusk".to_string(),
            n: n.to_string(),
            quality: quality.to_string(),
            style: style.to_string(),
            user: "ana".to_string(),
        }
    }

    #[test]
    fn test_quality_is_lowercased() {
        let request = form("Standard", "Vivid", "2").to_request().unwrap();
        assert_eq!(request.quality, "standard");
        assert_eq!(request.style, "vivid");
        assert_eq!(request.n, 2);

        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["quality"], "standard");
    }

    #[test]
    fn test_defaults_fill_empty_fields() {
        let request = GenerationForm::default().to_request().unwrap();
        assert_eq!(request.n, 1);
        assert_eq!(request.quality, DEFAULT_QUALITY);
        assert_eq!(request.style, DEFAULT_STYLE);
        assert_eq!(request.width, 1024);
        assert_eq!(request.height, 1024);
        assert_eq!(request.user, None);
    }

    #[test]
    fn test_bad_n_is_rejected() {
        let err = form("HD", "Natural", "lots").to_request().unwrap_err();
        assert!(matches!(err, ClientError::InvalidInput { field: "n", .. }));
    }

    #[test]
    fn test_exactly_one_tab_active() {
        let mut controller = GenerationController::new();
        assert_eq!(controller.active_model(), GenerationModel::Dalle);

        controller.open_model(GenerationModel::StableDiffusion);
        assert_eq!(controller.active_model(), GenerationModel::StableDiffusion);

        let active: Vec<_> = GenerationModel::ALL
            .iter()
            .filter(|model| **model == controller.active_model())
            .collect();
        assert_eq!(active.len(), 1);
    }

    #[test]
    fn test_forms_are_per_model() {
        let mut controller = GenerationController::new();
        controller.form_mut(GenerationModel::Dalle).prompt = "cat".to_string();

        assert_eq!(controller.form(GenerationModel::Dalle).prompt, "cat");
        assert_eq!(controller.form(GenerationModel::StableDiffusion).prompt, "");
    }

    #[test]
    fn test_parameters_toggle_label() {
        let mut controller = GenerationController::new();
        assert_eq!(controller.parameters_label(), "Hide Parameters");
        controller.toggle_parameters();
        assert!(!controller.parameters_visible());
        assert_eq!(controller.parameters_label(), "Show Parameters");
    }

    #[test]
    fn test_loading_hidden_on_success() {
        let mut controller = GenerationController::new();
        controller.form_mut(GenerationModel::Dalle).prompt = "x".to_string();
        assert!(controller.begin_submit(GenerationModel::Dalle).is_some());
        assert!(controller.is_loading());

        let sources = controller.finish_submit(
            Ok(GenerationOutcome {
                images: vec!["http://gen/images/a.png".into(), "http://gen/images/b.png".into()],
                upload_error: None,
            }),
            filename_from_url,
        );

        assert!(!controller.is_loading());
        assert_eq!(sources.len(), 2);
        assert_eq!(controller.results().len(), 2);
        assert!(controller.message_visible());
        assert!(controller.error().is_none());
    }

    #[test]
    fn test_loading_hidden_on_error() {
        let mut controller = GenerationController::new();
        controller.begin_submit(GenerationModel::Dalle);
        controller.finish_submit(Err("Failed to fetch images".to_string()), filename_from_url);

        assert!(!controller.is_loading());
        assert_eq!(controller.error(), Some("Failed to fetch images"));
        assert!(controller.results().is_empty());
    }

    #[test]
    fn test_loading_hidden_on_invalid_input() {
        let mut controller = GenerationController::new();
        controller.form_mut(GenerationModel::Dalle).n = "-3".to_string();

        assert!(controller.begin_submit(GenerationModel::Dalle).is_none());
        assert!(!controller.is_loading());
        assert!(controller.error().is_some());
    }

    #[test]
    fn test_upload_data_failure_keeps_results() {
        let mut controller = GenerationController::new();
        controller.begin_submit(GenerationModel::Dalle);
        controller.finish_submit(
            Ok(GenerationOutcome {
                images: vec!["http://gen/images/a.png".into()],
                upload_error: Some("Failed to upload data".into()),
            }),
            filename_from_url,
        );

        assert_eq!(controller.results().len(), 1);
        assert_eq!(controller.error(), Some("Failed to upload data"));
    }

    #[test]
    fn test_new_results_replace_old() {
        let mut controller = GenerationController::new();
        for batch in [vec!["http://g/1.png", "http://g/2.png"], vec!["http://g/3.png"]] {
            controller.begin_submit(GenerationModel::Dalle);
            controller.finish_submit(
                Ok(GenerationOutcome {
                    images: batch.into_iter().map(String::from).collect(),
                    upload_error: None,
                }),
                filename_from_url,
            );
        }
        let names: Vec<&str> = controller.results().iter().map(|t| t.filename.as_str()).collect();
        assert_eq!(names, vec!["3.png"]);
    }

    #[test]
    fn test_stale_hide_timer_is_ignored() {
        let mut controller = GenerationController::new();
        let ok = || {
            Ok(GenerationOutcome {
                images: vec![],
                upload_error: None,
            })
        };

        controller.finish_submit(ok(), filename_from_url);
        let first = controller.message_seq();
        controller.finish_submit(ok(), filename_from_url);

        controller.hide_message(first);
        assert!(controller.message_visible());
        controller.hide_message(controller.message_seq());
        assert!(!controller.message_visible());
    }

    #[test]
    fn test_result_tile_resizes_from_natural_size() {
        let mut controller = GenerationController::new();
        controller.finish_submit(
            Ok(GenerationOutcome {
                images: vec!["http://g/wide.png".into()],
                upload_error: None,
            }),
            filename_from_url,
        );
        controller.apply_natural_size("http://g/wide.png", 2000, 1000);

        let tile = controller.results().iter().next().unwrap();
        assert_eq!(tile.size, TileSize { width: 439.0, height: 250.0 });
    }

    #[test]
    fn test_filename_from_url() {
        assert_eq!(filename_from_url("http://g/images/DALLE_1_0.png"), "DALLE_1_0.png");
        assert_eq!(filename_from_url("/images/x.png?v=2"), "x.png");
        assert_eq!(filename_from_url("plain.png"), "plain.png");
    }

    #[test]
    fn test_upload_request_for_tile() {
        let tile = Tile {
            id: TileId(0),
            filename: "DALLE_1_0.png".to_string(),
            src: "http://g/images/DALLE_1_0.png".to_string(),
            size: TileSize::square(),
        };
        let request = upload_request_for(&tile);
        assert_eq!(request.images[0].generated_image_filename, "DALLE_1_0.png");
        assert_eq!(request.images[0].image_url, "http://g/images/DALLE_1_0.png");
    }
}
