use iced::widget::{column, container, scrollable, text};
use iced::{Alignment, Element, Length};
use iced_aw::Wrap;

use super::tile_view;
use crate::state::data::{TileId, TileOwner};
use crate::state::gallery::GalleryLoader;
use crate::state::thumbnails::ThumbnailCache;
use crate::Message;

/// Infinite-scroll thumbnail grid
pub fn view<'a>(
    gallery: &'a GalleryLoader,
    thumbnails: &'a ThumbnailCache,
    hovered: Option<(TileOwner, TileId)>,
) -> Element<'a, Message> {
    let tiles: Vec<Element<'a, Message>> = gallery
        .tiles()
        .iter()
        .map(|tile| {
            let is_hovered = hovered == Some((TileOwner::Gallery, tile.id));
            tile_view(
                tile,
                TileOwner::Gallery,
                is_hovered,
                thumbnails,
                vec![
                    (
                        "View",
                        Message::ViewImage {
                            src: tile.src.clone(),
                            filename: tile.filename.clone(),
                        },
                    ),
                    ("Download", Message::Download(tile.src.clone())),
                    ("Delete", Message::DeleteRequested(TileOwner::Gallery, tile.id)),
                ],
            )
        })
        .collect();

    let footer = if gallery.is_loading() {
        text(format!("Loading page {}…", gallery.next_page()))
    } else if gallery.tiles().is_empty() {
        text("No images yet.")
    } else {
        text(format!("{} images", gallery.tiles().len()))
    };

    let content = column![
        Wrap::with_elements(tiles).spacing(12.0).line_spacing(12.0),
        container(footer.size(14)).center_x(Length::Fill),
    ]
    .spacing(16)
    .padding(16)
    .align_x(Alignment::Start)
    .width(Length::Fill);

    scrollable(content)
        .on_scroll(Message::GalleryScrolled)
        .width(Length::Fill)
        .height(Length::Fill)
        .into()
}
