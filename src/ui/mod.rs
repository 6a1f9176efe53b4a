/// Widget layer
///
/// Every function here maps state onto iced widgets; none of them
/// mutate anything. Screens live in their own files, shared pieces
/// (tiles, modals) live here.

pub mod gallery;
pub mod generate;
pub mod overlay;
pub mod table;

use iced::alignment::{Horizontal, Vertical};
use iced::widget::{button, center, container, image, mouse_area, opaque, row, stack, text};
use iced::{Color, ContentFit, Element, Length};

use crate::state::data::{Tile, TileOwner};
use crate::state::thumbnails::{Thumbnail, ThumbnailCache};
use crate::Message;

/// One image tile. Action buttons appear while the pointer is over it.
pub fn tile_view<'a>(
    tile: &'a Tile,
    owner: TileOwner,
    hovered: bool,
    thumbnails: &'a ThumbnailCache,
    actions: Vec<(&'static str, Message)>,
) -> Element<'a, Message> {
    let picture = sized_image(&tile.src, tile.size.width, tile.size.height, thumbnails);

    let content: Element<'a, Message> = if hovered {
        let buttons = actions.into_iter().fold(row![].spacing(4), |buttons, (label, message)| {
            buttons.push(button(text(label).size(12)).padding([2, 6]).on_press(message))
        });

        stack![
            picture,
            container(buttons)
                .width(Length::Fill)
                .height(Length::Fill)
                .padding(6)
                .align_x(Horizontal::Right)
                .align_y(Vertical::Top),
        ]
        .into()
    } else {
        picture
    };

    mouse_area(container(content).style(container::rounded_box))
        .on_enter(Message::TileHovered(owner, tile.id))
        .on_exit(Message::TileUnhovered(owner, tile.id))
        .into()
}

/// Image from the cache at a fixed size, or a placeholder of the same size
pub fn sized_image<'a>(
    src: &str,
    width: f32,
    height: f32,
    thumbnails: &ThumbnailCache,
) -> Element<'a, Message> {
    match thumbnails.get(src) {
        Some(Thumbnail::Ready { handle, .. }) => image(handle.clone())
            .width(Length::Fixed(width))
            .height(Length::Fixed(height))
            .content_fit(ContentFit::Contain)
            .into(),
        other => {
            let label = if matches!(other, Some(Thumbnail::Failed)) {
                "Unavailable"
            } else {
                "Loading…"
            };
            center(text(label).size(12))
                .width(Length::Fixed(width))
                .height(Length::Fixed(height))
                .into()
        }
    }
}

/// Dim the base view and show `content` above it.
/// With `on_blur`, a click on the backdrop sends that message.
pub fn modal<'a>(
    base: impl Into<Element<'a, Message>>,
    content: impl Into<Element<'a, Message>>,
    on_blur: Option<Message>,
) -> Element<'a, Message> {
    let backdrop = center(opaque(content)).style(|_theme| container::Style {
        background: Some(
            Color {
                a: 0.8,
                ..Color::BLACK
            }
            .into(),
        ),
        ..container::Style::default()
    });

    let backdrop: Element<'a, Message> = match on_blur {
        Some(message) => mouse_area(backdrop).on_press(message).into(),
        None => backdrop.into(),
    };

    stack![base.into(), opaque(backdrop)].into()
}
