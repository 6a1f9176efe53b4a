use iced::widget::{
    button, center, checkbox, column, container, mouse_area, row, scrollable, text, text_input,
    Stack,
};
use iced::{Alignment, Element, Length, Padding};

use super::sized_image;
use crate::api::{ApiClient, ImageMetadata};
use crate::state::table::{
    ClickTarget, Column, MetadataTable, SortDirection, TableRow, TableStatus,
};
use crate::state::thumbnails::ThumbnailCache;
use crate::Message;

/// Width of the table thumbnails
const THUMB_WIDTH: f32 = 50.0;

/// Gap between header cells
const CELL_SPACING: f32 = 4.0;

#[derive(Debug, Clone)]
pub enum TableMessage {
    Loaded(Result<Vec<ImageMetadata>, String>),
    SortBy(Column),
    ToggleFilter(Column),
    FilterChanged(Column, String, bool),
    SearchChanged(String),
    OpenImage(String),
    OpenPrompt(String),
    ClosePopup,
    /// Press on a filter box or a filterable header that no inner widget took
    ClickedInside(ClickTarget),
    /// Click on the table background (outside every filter box and header)
    ClickedElsewhere,
}

impl TableMessage {
    /// Where the click behind this message landed, for filter-box dismissal.
    /// `None` for messages that are not clicks or must not dismiss.
    pub fn click_target(&self) -> Option<ClickTarget> {
        match self {
            TableMessage::SortBy(column) if column.is_filterable() => Some(ClickTarget::FilterHeader),
            TableMessage::SortBy(_) => Some(ClickTarget::Elsewhere),
            TableMessage::FilterChanged(..) => Some(ClickTarget::FilterBox),
            TableMessage::ClickedInside(target) => Some(*target),
            TableMessage::OpenImage(_) | TableMessage::OpenPrompt(_) | TableMessage::ClickedElsewhere => {
                Some(ClickTarget::Elsewhere)
            }
            TableMessage::Loaded(_)
            | TableMessage::ToggleFilter(_)
            | TableMessage::SearchChanged(_)
            | TableMessage::ClosePopup => None,
        }
    }
}

fn on(message: TableMessage) -> Message {
    Message::Table(message)
}

fn column_width(column: Column) -> Length {
    Length::Fixed(column_px(column))
}

/// Left edge of `column` within the header row
fn column_offset(column: Column) -> f32 {
    Column::ALL
        .iter()
        .take_while(|other| **other != column)
        .map(|other| column_px(*other) + CELL_SPACING)
        .sum()
}

fn column_px(column: Column) -> f32 {
    match column {
        Column::Index => 50.0,
        Column::Image => 70.0,
        Column::Filename => 240.0,
        Column::Prompt => 90.0,
        Column::User => 120.0,
        Column::Timestamp => 170.0,
        Column::Quality => 100.0,
        Column::Style => 100.0,
        Column::Model => 130.0,
        Column::Size => 120.0,
    }
}

pub fn view<'a>(
    table: &'a MetadataTable,
    client: &ApiClient,
    thumbnails: &'a ThumbnailCache,
) -> Element<'a, Message> {
    let search = text_input("Search…", table.search())
        .on_input(|query| on(TableMessage::SearchChanged(query)))
        .width(Length::Fixed(320.0));

    let body: Element<'a, Message> = match table.status() {
        TableStatus::Loading => center(text("Loading metadata…")).into(),
        TableStatus::Failed(_) if table.row_count() == 0 => {
            center(text("Could not load image metadata.")).into()
        }
        _ => {
            let rows = table
                .visible_rows()
                .into_iter()
                .fold(column![].spacing(2), |rows, row| {
                    rows.push(table_row(row, client, thumbnails))
                });
            scrollable(rows).height(Length::Fill).into()
        }
    };

    let content = column![search, header(table), filter_boxes(table), body]
        .spacing(8)
        .padding(16)
        .width(Length::Fill)
        .height(Length::Fill);

    // Buttons, checkboxes and inputs capture their own clicks, so only
    // presses on empty table space reach this handler
    mouse_area(content)
        .on_press(on(TableMessage::ClickedElsewhere))
        .into()
}

fn header<'a>(table: &'a MetadataTable) -> Element<'a, Message> {
    let sort = table.sort_state();

    Column::ALL
        .iter()
        .fold(row![].spacing(CELL_SPACING), |header, column| {
            let arrow = match sort {
                Some(state) if state.column == *column => match state.direction {
                    SortDirection::Ascending => " ▲",
                    SortDirection::Descending => " ▼",
                },
                _ => "",
            };
            let title = text(format!("{}{}", column.title(), arrow)).size(14);

            let label: Element<'a, Message> = if column.is_sortable() {
                button(title)
                    .style(button::text)
                    .padding(2)
                    .on_press(on(TableMessage::SortBy(*column)))
                    .into()
            } else {
                title.into()
            };

            if !column.is_filterable() {
                return header.push(container(label).width(column_width(*column)));
            }

            let marker = if table.is_filter_open(*column) { "▴" } else { "▾" };
            let cell = row![
                label,
                button(text(marker).size(14))
                    .style(button::text)
                    .padding(2)
                    .on_press(on(TableMessage::ToggleFilter(*column))),
            ]
            .align_y(Alignment::Center);

            // The whole cell counts as the header, not only its buttons
            header.push(
                mouse_area(container(cell).width(column_width(*column)))
                    .on_press(on(TableMessage::ClickedInside(ClickTarget::FilterHeader))),
            )
        })
        .into()
}

/// Open filter boxes, each listing distinct values with counts and
/// anchored under its own column header
fn filter_boxes<'a>(table: &'a MetadataTable) -> Element<'a, Message> {
    let layers = table.open_filter_boxes().map(|column| -> Element<'a, Message> {
        let options = table.filter_options(column).into_iter().fold(
            column![text(column.title()).size(14)].spacing(4),
            |list, option| {
                let value = option.value.clone();
                list.push(
                    checkbox(format!("{} ({})", display_value(&option.value), option.count), option.checked)
                        .on_toggle(move |checked| {
                            on(TableMessage::FilterChanged(column, value.clone(), checked))
                        })
                        .size(14),
                )
            },
        );

        let filter_box = mouse_area(
            container(options)
                .padding(8)
                .style(container::rounded_box),
        )
        .on_press(on(TableMessage::ClickedInside(ClickTarget::FilterBox)));

        container(filter_box)
            .padding(Padding {
                left: column_offset(column),
                ..Padding::ZERO
            })
            .into()
    });

    Stack::with_children(layers).into()
}

fn display_value(value: &str) -> &str {
    if value.is_empty() {
        "(empty)"
    } else {
        value
    }
}

fn table_row<'a>(
    row_data: &'a TableRow,
    client: &ApiClient,
    thumbnails: &'a ThumbnailCache,
) -> Element<'a, Message> {
    let src = client.image_url(&row_data.metadata.filename);

    Column::ALL
        .iter()
        .fold(row![].spacing(CELL_SPACING).align_y(Alignment::Center), |cells, column| {
            let cell: Element<'a, Message> = match column {
                Column::Image => button(sized_image(&src, THUMB_WIDTH, THUMB_WIDTH, thumbnails))
                    .style(button::text)
                    .padding(0)
                    .on_press(on(TableMessage::OpenImage(src.clone())))
                    .into(),
                Column::Prompt => button(text("Prompt").size(12))
                    .padding([2, 6])
                    .on_press(on(TableMessage::OpenPrompt(row_data.metadata.prompt.clone())))
                    .into(),
                other => text(row_data.cell_text(*other)).size(13).into(),
            };
            cells.push(container(cell).width(column_width(*column)))
        })
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_with_open_box() -> MetadataTable {
        let mut table = MetadataTable::new();
        table.load_finished(Ok(vec![ImageMetadata {
            filename: "a.png".to_string(),
            user: Some("ana".to_string()),
            ..ImageMetadata::default()
        }]));
        table.toggle_filter_box(Column::User);
        table
    }

    fn dismiss(table: &mut MetadataTable, message: TableMessage) {
        if let Some(target) = message.click_target() {
            table.dismiss_filter_boxes(target);
        }
    }

    #[test]
    fn test_clicks_inside_box_or_header_keep_boxes_open() {
        let mut table = table_with_open_box();

        for message in [
            TableMessage::ClickedInside(ClickTarget::FilterBox),
            TableMessage::ClickedInside(ClickTarget::FilterHeader),
            TableMessage::FilterChanged(Column::User, "ana".to_string(), true),
            TableMessage::SortBy(Column::Quality),
            TableMessage::SearchChanged("a".to_string()),
        ] {
            dismiss(&mut table, message);
            assert!(table.is_filter_open(Column::User));
        }
    }

    #[test]
    fn test_clicks_elsewhere_close_boxes() {
        for message in [
            TableMessage::ClickedElsewhere,
            TableMessage::SortBy(Column::Filename),
            TableMessage::OpenPrompt("a cat".to_string()),
            TableMessage::OpenImage("http://localhost/a.png".to_string()),
        ] {
            let mut table = table_with_open_box();
            dismiss(&mut table, message);
            assert!(!table.is_filter_open(Column::User));
        }
    }

    #[test]
    fn test_filter_box_anchors_under_its_column() {
        assert_eq!(column_offset(Column::Index), 0.0);
        assert_eq!(column_offset(Column::Filename), 50.0 + 4.0 + 70.0 + 4.0);
        assert_eq!(
            column_offset(Column::User),
            column_offset(Column::Prompt) + column_px(Column::Prompt) + CELL_SPACING
        );
    }
}
