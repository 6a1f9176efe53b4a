use iced::widget::{button, column, container, image, row, scrollable, text};
use iced::{Alignment, ContentFit, Element, Length};

use super::sized_image;
use super::table::TableMessage;
use crate::state::actions::FocusOverlay;
use crate::state::table::TablePopup;
use crate::state::thumbnails::ThumbnailCache;
use crate::Message;

const FOCUS_MAX_WIDTH: f32 = 900.0;
const FOCUS_MAX_HEIGHT: f32 = 620.0;

fn panel<'a>(content: impl Into<Element<'a, Message>>) -> Element<'a, Message> {
    container(content)
        .padding(20)
        .style(container::rounded_box)
        .into()
}

/// Full-size image with its metadata underneath
pub fn focus<'a>(overlay: &'a FocusOverlay, thumbnails: &'a ThumbnailCache) -> Element<'a, Message> {
    let picture: Element<'a, Message> = match thumbnails.handle(&overlay.src) {
        Some(handle) => image(handle.clone())
            .content_fit(ContentFit::Contain)
            .width(Length::Shrink)
            .height(Length::Shrink)
            .into(),
        None => sized_image(&overlay.src, 400.0, 400.0, thumbnails),
    };

    let details = overlay
        .details()
        .into_iter()
        .fold(column![].spacing(2), |details, (label, value)| {
            details.push(
                row![text(format!("{}:", label)).size(14).width(Length::Fixed(90.0)), text(value).size(14)]
                    .spacing(8),
            )
        });

    let close = button(text("Close")).on_press(Message::CloseFocus);

    panel(
        column![
            container(picture)
                .max_width(FOCUS_MAX_WIDTH)
                .max_height(FOCUS_MAX_HEIGHT),
            details,
            close,
        ]
        .spacing(12)
        .align_x(Alignment::Center),
    )
}

/// Enlarged image or full prompt from the metadata table
pub fn table_popup<'a>(popup: &'a TablePopup, thumbnails: &'a ThumbnailCache) -> Element<'a, Message> {
    let close = button(text("Close")).on_press(Message::Table(TableMessage::ClosePopup));

    let body: Element<'a, Message> = match popup {
        TablePopup::Image { src } => match thumbnails.handle(src) {
            Some(handle) => image(handle.clone())
                .content_fit(ContentFit::Contain)
                .width(Length::Fixed(600.0))
                .into(),
            None => sized_image(src, 600.0, 400.0, thumbnails),
        },
        TablePopup::Prompt { text: prompt } => scrollable(text(prompt.as_str()).size(16))
            .height(Length::Shrink)
            .into(),
    };

    panel(
        column![body, close]
            .spacing(12)
            .max_width(640)
            .align_x(Alignment::Center),
    )
}

/// Shown while a generation request is outstanding
pub fn loading<'a>() -> Element<'a, Message> {
    panel(text("Generating your art…").size(18))
}

pub fn error<'a>(message: &'a str, on_dismiss: Message) -> Element<'a, Message> {
    panel(
        column![
            text("Something went wrong").size(18),
            text(message).size(14),
            button(text("OK")).on_press(on_dismiss),
        ]
        .spacing(12)
        .max_width(480)
        .align_x(Alignment::Center),
    )
}
