use iced::widget::{button, column, pick_list, row, scrollable, text, text_input};
use iced::{Element, Length};
use iced_aw::Wrap;

use super::tile_view;
use crate::api::GenerationModel;
use crate::state::data::{TileId, TileOwner};
use crate::state::generate::{GenerationController, GenerationOutcome, QUALITY_OPTIONS, STYLE_OPTIONS};
use crate::state::thumbnails::ThumbnailCache;
use crate::Message;

#[derive(Debug, Clone)]
pub enum GenerateMessage {
    OpenModel(GenerationModel),
    ToggleParameters,
    PromptChanged(String),
    CountChanged(String),
    QualitySelected(String),
    StyleSelected(String),
    UserChanged(String),
    Submit,
    Finished(Result<GenerationOutcome, String>),
    HideMessage(u64),
    DismissError,
}

fn on(message: GenerateMessage) -> Message {
    Message::Generate(message)
}

/// Model tabs, parameter form and the latest results
pub fn view<'a>(
    controller: &'a GenerationController,
    thumbnails: &'a ThumbnailCache,
    hovered: Option<(TileOwner, TileId)>,
) -> Element<'a, Message> {
    let active = controller.active_model();

    let tabs = GenerationModel::ALL.iter().fold(row![].spacing(4), |tabs, model| {
        let tab = button(text(model.to_string()))
            .style(if *model == active {
                button::primary
            } else {
                button::secondary
            })
            .on_press(on(GenerateMessage::OpenModel(*model)));
        tabs.push(tab)
    });

    let toggle = button(text(controller.parameters_label()))
        .style(button::text)
        .on_press(on(GenerateMessage::ToggleParameters));

    let mut page = column![row![tabs, toggle].spacing(16)].spacing(16).padding(16);

    if controller.parameters_visible() {
        page = page.push(form(controller, active));
    }

    if controller.message_visible() {
        page = page.push(text("Your art is ready!").size(16));
    }

    let tiles: Vec<Element<'a, Message>> = controller
        .results()
        .iter()
        .map(|tile| {
            let is_hovered = hovered == Some((TileOwner::Results, tile.id));
            tile_view(
                tile,
                TileOwner::Results,
                is_hovered,
                thumbnails,
                vec![
                    ("Download", Message::Download(tile.src.clone())),
                    ("Upload", Message::Upload(tile.id)),
                    ("Delete", Message::DeleteRequested(TileOwner::Results, tile.id)),
                ],
            )
        })
        .collect();

    page = page.push(Wrap::with_elements(tiles).spacing(12.0).line_spacing(12.0));

    scrollable(page.width(Length::Fill))
        .width(Length::Fill)
        .height(Length::Fill)
        .into()
}

fn form<'a>(controller: &'a GenerationController, model: GenerationModel) -> Element<'a, Message> {
    let fields = controller.form(model);

    let quality_options: Vec<String> = QUALITY_OPTIONS.iter().map(|s| s.to_string()).collect();
    let style_options: Vec<String> = STYLE_OPTIONS.iter().map(|s| s.to_string()).collect();
    let selected = |value: &str| (!value.is_empty()).then(|| value.to_string());

    let submit = button(text("Generate"))
        .style(button::primary)
        .on_press_maybe((!controller.is_loading()).then(|| on(GenerateMessage::Submit)));

    column![
        text(format!("{} parameters", model)).size(20),
        text_input("Describe the image…", &fields.prompt)
            .on_input(|value| on(GenerateMessage::PromptChanged(value)))
            .on_submit(on(GenerateMessage::Submit)),
        row![
            column![
                text("Images").size(12),
                text_input("1", &fields.n)
                    .on_input(|value| on(GenerateMessage::CountChanged(value)))
                    .width(Length::Fixed(80.0)),
            ]
            .spacing(4),
            column![
                text("Quality").size(12),
                pick_list(quality_options, selected(&fields.quality), |value| {
                    on(GenerateMessage::QualitySelected(value))
                })
                .placeholder("Standard"),
            ]
            .spacing(4),
            column![
                text("Style").size(12),
                pick_list(style_options, selected(&fields.style), |value| {
                    on(GenerateMessage::StyleSelected(value))
                })
                .placeholder("Natural"),
            ]
            .spacing(4),
            column![
                text("User").size(12),
                text_input("user", &fields.user)
                    .on_input(|value| on(GenerateMessage::UserChanged(value)))
                    .width(Length::Fixed(200.0)),
            ]
            .spacing(4),
        ]
        .spacing(16),
        submit,
    ]
    .spacing(12)
    .into()
}
