use iced::widget::{button, column, container, row, scrollable, text};
use iced::{event, window, Alignment, Element, Event, Length, Size, Subscription, Task, Theme};
use rfd::MessageLevel;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod api;
mod config;
mod error;
mod state;
mod ui;

use api::{ApiClient, ImageMetadata};
use config::ClientConfig;
use state::actions::{self, FocusOverlay};
use state::data::{TileId, TileOwner};
use state::gallery::{GalleryLoader, ScrollMetrics};
use state::generate::{self as generation, GenerationController};
use state::table::MetadataTable;
use state::thumbnails::{self, LoadedImage, ThumbnailCache};
use ui::generate::GenerateMessage;
use ui::table::TableMessage;

/// Height of the navigation bar above each screen
const CHROME_HEIGHT: f32 = 56.0;

/// How long "Your art is ready!" stays up
const READY_MESSAGE_DURATION: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Gallery,
    Generate,
    Table,
}

impl Screen {
    const ALL: [Screen; 3] = [Screen::Gallery, Screen::Generate, Screen::Table];

    fn title(self) -> &'static str {
        match self {
            Screen::Gallery => "Gallery",
            Screen::Generate => "Generate",
            Screen::Table => "Metadata",
        }
    }
}

/// Main application state
struct ArtGallery {
    config: ClientConfig,
    client: ApiClient,
    screen: Screen,
    gallery: GalleryLoader,
    generation: GenerationController,
    table: MetadataTable,
    /// The table loads once, the first time its screen opens
    table_requested: bool,
    thumbnails: ThumbnailCache,
    focus: Option<FocusOverlay>,
    hovered: Option<(TileOwner, TileId)>,
    /// Status line in the navigation bar
    status: String,
}

/// Application messages (events)
#[derive(Debug, Clone)]
pub enum Message {
    ScreenSelected(Screen),
    PageLoaded(u32, Result<Vec<String>, String>),
    GalleryScrolled(scrollable::Viewport),
    WindowResized(Size),
    TileHovered(TileOwner, TileId),
    TileUnhovered(TileOwner, TileId),
    ImageLoaded(String, Result<LoadedImage, String>),
    /// Open the focus overlay for a gallery tile
    ViewImage { src: String, filename: String },
    FocusLoaded(String, Result<ImageMetadata, String>),
    CloseFocus,
    Download(String),
    DownloadFinished(Result<PathBuf, String>),
    DeleteRequested(TileOwner, TileId),
    DeleteConfirmed(TileOwner, TileId, bool),
    Upload(TileId),
    UploadFinished(Result<usize, String>),
    Generate(GenerateMessage),
    Table(TableMessage),
    AlertClosed,
}

impl ArtGallery {
    fn new() -> (Self, Task<Message>) {
        let config = ClientConfig::load();

        // Without an HTTP client there is nothing to show
        let client = ApiClient::new(&config).expect("Failed to build HTTP client. Check TLS setup.");

        info!(api = config.api_base(), generation = config.generation_base(), "🎨 Art Gallery initialized");

        let mut app = ArtGallery {
            config,
            client,
            screen: Screen::Gallery,
            gallery: GalleryLoader::new(),
            generation: GenerationController::new(),
            table: MetadataTable::new(),
            table_requested: false,
            thumbnails: ThumbnailCache::new(),
            focus: None,
            hovered: None,
            status: String::from("Ready."),
        };

        let task = match app.gallery.begin_load() {
            Some(page) => app.load_page(page),
            None => Task::none(),
        };

        (app, task)
    }

    fn load_page(&self, page: u32) -> Task<Message> {
        let client = self.client.clone();
        Task::perform(
            async move { client.fetch_page(page).await.map_err(|e| e.to_string()) },
            move |result| Message::PageLoaded(page, result),
        )
    }

    fn maybe_load_page(&self, page: Option<u32>) -> Task<Message> {
        page.map(|page| self.load_page(page)).unwrap_or_else(Task::none)
    }

    /// Fetch every source not already cached or in flight
    fn fetch_images(&mut self, sources: impl IntoIterator<Item = String>) -> Task<Message> {
        let tasks: Vec<Task<Message>> = sources
            .into_iter()
            .filter(|src| self.thumbnails.request(src))
            .map(|src| {
                let client = self.client.clone();
                Task::perform(thumbnails::load_image(client, src.clone()), move |result| {
                    Message::ImageLoaded(src.clone(), result)
                })
            })
            .collect();

        Task::batch(tasks)
    }

    fn alert(level: MessageLevel, title: &str, description: String) -> Task<Message> {
        Task::perform(actions::alert(level, title.to_string(), description), |_| {
            Message::AlertClosed
        })
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::ScreenSelected(screen) => {
                self.screen = screen;
                self.hovered = None;

                if screen == Screen::Table && !self.table_requested {
                    self.table_requested = true;
                    let client = self.client.clone();
                    return Task::perform(
                        async move { client.fetch_all_metadata().await.map_err(|e| e.to_string()) },
                        |result| Message::Table(TableMessage::Loaded(result)),
                    );
                }
                Task::none()
            }
            Message::PageLoaded(page, result) => {
                let client = &self.client;
                let sources = self
                    .gallery
                    .finish_load(page, result, |filename| client.image_url(filename));
                self.fetch_images(sources)
            }
            Message::GalleryScrolled(viewport) => {
                let metrics = ScrollMetrics {
                    offset_y: viewport.absolute_offset().y,
                    viewport_height: viewport.bounds().height,
                    content_height: viewport.content_bounds().height,
                };
                let page = self.gallery.on_scroll(metrics);
                self.maybe_load_page(page)
            }
            Message::WindowResized(size) => {
                if self.screen != Screen::Gallery {
                    return Task::none();
                }
                let page = self.gallery.on_resize((size.height - CHROME_HEIGHT).max(0.0));
                self.maybe_load_page(page)
            }
            Message::TileHovered(owner, id) => {
                self.hovered = Some((owner, id));
                Task::none()
            }
            Message::TileUnhovered(owner, id) => {
                if self.hovered == Some((owner, id)) {
                    self.hovered = None;
                }
                Task::none()
            }
            Message::ImageLoaded(src, result) => {
                if let Some((width, height)) = self.thumbnails.finish(src.clone(), result) {
                    self.generation.apply_natural_size(&src, width, height);
                }
                Task::none()
            }
            Message::ViewImage { src, filename } => {
                let client = self.client.clone();
                let fetch = self.fetch_images([src.clone()]);
                Task::batch([
                    fetch,
                    Task::perform(actions::load_focus_metadata(client, filename), move |result| {
                        Message::FocusLoaded(src.clone(), result)
                    }),
                ])
            }
            Message::FocusLoaded(src, result) => {
                match result {
                    Ok(metadata) => {
                        self.gallery.set_scroll_locked(true);
                        self.focus = Some(FocusOverlay { src, metadata });
                    }
                    Err(e) => error!(error = %e, "Error fetching metadata"),
                }
                Task::none()
            }
            Message::CloseFocus => {
                self.focus = None;
                self.gallery.set_scroll_locked(false);
                Task::none()
            }
            Message::Download(src) => {
                self.status = String::from("Downloading…");
                Task::perform(
                    actions::download_image(self.client.clone(), src, self.config.download_dir()),
                    Message::DownloadFinished,
                )
            }
            Message::DownloadFinished(result) => match result {
                Ok(path) => {
                    self.status = format!("Saved {}", path.display());
                    Task::none()
                }
                Err(e) => {
                    self.status = String::from("Download failed.");
                    Self::alert(MessageLevel::Error, "Download failed", e)
                }
            },
            Message::DeleteRequested(owner, id) => {
                Task::perform(actions::confirm_delete(), move |confirmed| {
                    Message::DeleteConfirmed(owner, id, confirmed)
                })
            }
            Message::DeleteConfirmed(owner, id, confirmed) => {
                if !confirmed {
                    return Task::none();
                }
                let removed = match owner {
                    TileOwner::Gallery => self.gallery.remove_tile(id),
                    TileOwner::Results => self.generation.remove_result(id),
                };
                if removed {
                    debug!(?owner, id = id.0, "Tile removed");
                }
                if self.hovered == Some((owner, id)) {
                    self.hovered = None;
                }
                Task::none()
            }
            Message::Upload(id) => match self.generation.result(id) {
                Some(tile) => Task::perform(
                    generation::upload_result(self.client.clone(), generation::upload_request_for(tile)),
                    Message::UploadFinished,
                ),
                None => Task::none(),
            },
            Message::UploadFinished(result) => match result {
                Ok(stored) => Self::alert(
                    MessageLevel::Info,
                    "Upload",
                    format!("Image uploaded successfully ({} stored).", stored),
                ),
                Err(e) => Self::alert(MessageLevel::Error, "Upload failed", format!("Error uploading image: {}", e)),
            },
            Message::Generate(message) => self.update_generation(message),
            Message::Table(message) => self.update_table(message),
            Message::AlertClosed => Task::none(),
        }
    }

    fn update_generation(&mut self, message: GenerateMessage) -> Task<Message> {
        let active = self.generation.active_model();
        match message {
            GenerateMessage::OpenModel(model) => self.generation.open_model(model),
            GenerateMessage::ToggleParameters => self.generation.toggle_parameters(),
            GenerateMessage::PromptChanged(value) => self.generation.form_mut(active).prompt = value,
            GenerateMessage::CountChanged(value) => self.generation.form_mut(active).n = value,
            GenerateMessage::QualitySelected(value) => self.generation.form_mut(active).quality = value,
            GenerateMessage::StyleSelected(value) => self.generation.form_mut(active).style = value,
            GenerateMessage::UserChanged(value) => self.generation.form_mut(active).user = value,
            GenerateMessage::Submit => {
                if self.generation.is_loading() {
                    return Task::none();
                }
                if let Some(request) = self.generation.begin_submit(active) {
                    return Task::perform(
                        generation::run_generation(self.client.clone(), active, request),
                        |result| Message::Generate(GenerateMessage::Finished(result)),
                    );
                }
            }
            GenerateMessage::Finished(result) => {
                let seq_before = self.generation.message_seq();
                let sources = self
                    .generation
                    .finish_submit(result, |src| generation::filename_from_url(src));

                // Sources fetched earlier already know their size
                for src in &sources {
                    if let Some((width, height)) = self.thumbnails.dimensions(src) {
                        self.generation.apply_natural_size(src, width, height);
                    }
                }

                let fetch = self.fetch_images(sources);
                let seq = self.generation.message_seq();
                if seq == seq_before {
                    return fetch;
                }

                let hide = Task::perform(tokio::time::sleep(READY_MESSAGE_DURATION), move |_| {
                    Message::Generate(GenerateMessage::HideMessage(seq))
                });
                return Task::batch([fetch, hide]);
            }
            GenerateMessage::HideMessage(seq) => self.generation.hide_message(seq),
            GenerateMessage::DismissError => self.generation.dismiss_error(),
        }
        Task::none()
    }

    fn update_table(&mut self, message: TableMessage) -> Task<Message> {
        if let Some(target) = message.click_target() {
            self.table.dismiss_filter_boxes(target);
        }

        match message {
            TableMessage::Loaded(result) => {
                self.table.load_finished(result);
                let sources: Vec<String> = self
                    .table
                    .visible_rows()
                    .iter()
                    .map(|row| self.client.image_url(&row.metadata.filename))
                    .collect();
                return self.fetch_images(sources);
            }
            TableMessage::SortBy(column) => {
                self.table.sort_by(column);
            }
            TableMessage::ToggleFilter(column) => self.table.toggle_filter_box(column),
            TableMessage::FilterChanged(column, value, checked) => {
                self.table.set_filter_value(column, value, checked);
            }
            TableMessage::SearchChanged(query) => self.table.set_search(query),
            TableMessage::OpenImage(src) => {
                self.table.open_image_popup(src.clone());
                return self.fetch_images([src]);
            }
            TableMessage::OpenPrompt(prompt) => self.table.open_prompt_popup(prompt),
            TableMessage::ClosePopup => self.table.close_popup(),
            TableMessage::ClickedInside(_) | TableMessage::ClickedElsewhere => {}
        }
        Task::none()
    }

    /// Build the user interface
    fn view(&self) -> Element<'_, Message> {
        let tabs = Screen::ALL.iter().fold(row![].spacing(4), |tabs, screen| {
            tabs.push(
                button(text(screen.title()))
                    .style(if *screen == self.screen {
                        button::primary
                    } else {
                        button::secondary
                    })
                    .on_press(Message::ScreenSelected(*screen)),
            )
        });

        let nav = container(
            row![tabs, text(&self.status).size(14)]
                .spacing(20)
                .align_y(Alignment::Center),
        )
        .padding(10)
        .height(Length::Fixed(CHROME_HEIGHT))
        .width(Length::Fill);

        let screen = match self.screen {
            Screen::Gallery => ui::gallery::view(&self.gallery, &self.thumbnails, self.hovered),
            Screen::Generate => ui::generate::view(&self.generation, &self.thumbnails, self.hovered),
            Screen::Table => ui::table::view(&self.table, &self.client, &self.thumbnails),
        };

        let mut page: Element<Message> = column![nav, screen].into();

        if self.screen == Screen::Table {
            if let Some(popup) = self.table.popup() {
                page = ui::modal(
                    page,
                    ui::overlay::table_popup(popup, &self.thumbnails),
                    Some(Message::Table(TableMessage::ClosePopup)),
                );
            }
        }

        if let Some(focus) = &self.focus {
            page = ui::modal(page, ui::overlay::focus(focus, &self.thumbnails), Some(Message::CloseFocus));
        }

        if self.generation.is_loading() {
            page = ui::modal(page, ui::overlay::loading(), None);
        }

        if let Some(e) = self.generation.error() {
            page = ui::modal(
                page,
                ui::overlay::error(e, Message::Generate(GenerateMessage::DismissError)),
                None,
            );
        }

        page
    }

    fn subscription(&self) -> Subscription<Message> {
        event::listen_with(|event, _status, _window| match event {
            Event::Window(window::Event::Resized(size)) => Some(Message::WindowResized(size)),
            _ => None,
        })
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

/// `RUST_LOG` overrides the default filter
fn init_logging() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,art_gallery=debug")))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn main() -> iced::Result {
    init_logging();

    iced::application("Art Gallery", ArtGallery::update, ArtGallery::view)
        .subscription(ArtGallery::subscription)
        .theme(ArtGallery::theme)
        .centered()
        .run_with(ArtGallery::new)
}
