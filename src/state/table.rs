/// Metadata table controller
///
/// Rows are kept in load order; sorting, filtering and searching only
/// change which rows `visible_rows` returns and in what order.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{error, info};

use crate::api::ImageMetadata;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Column {
    Index,
    Image,
    Filename,
    Prompt,
    User,
    Timestamp,
    Quality,
    Style,
    Model,
    Size,
}

impl Column {
    pub const ALL: [Column; 10] = [
        Column::Index,
        Column::Image,
        Column::Filename,
        Column::Prompt,
        Column::User,
        Column::Timestamp,
        Column::Quality,
        Column::Style,
        Column::Model,
        Column::Size,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Column::Index => "#",
            Column::Image => "Image",
            Column::Filename => "Filename",
            Column::Prompt => "Prompt",
            Column::User => "User",
            Column::Timestamp => "Timestamp",
            Column::Quality => "Quality",
            Column::Style => "Style",
            Column::Model => "Model",
            Column::Size => "Size",
        }
    }

    pub fn is_sortable(self) -> bool {
        !matches!(self, Column::Image | Column::Prompt)
    }

    pub fn is_filterable(self) -> bool {
        matches!(
            self,
            Column::User | Column::Quality | Column::Style | Column::Model
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    fn toggled(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

/// The single active sort column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState {
    pub column: Column,
    pub direction: SortDirection,
}

/// Where a click landed, for filter-box dismissal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickTarget {
    FilterBox,
    FilterHeader,
    Elsewhere,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TablePopup {
    Image { src: String },
    Prompt { text: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum TableStatus {
    Loading,
    Ready,
    Failed(String),
}

/// One entry of a filter box
#[derive(Debug, Clone, PartialEq)]
pub struct FilterOption {
    pub value: String,
    pub count: usize,
    pub checked: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    /// 1-based position in load order
    pub position: usize,
    pub metadata: ImageMetadata,
}

impl TableRow {
    /// Text of a cell as displayed, sorted, filtered and searched
    pub fn cell_text(&self, column: Column) -> String {
        let metadata = &self.metadata;
        match column {
            Column::Index => metadata
                .id
                .map(|id| id.to_string())
                .unwrap_or_else(|| self.position.to_string()),
            Column::Image | Column::Filename => metadata.filename.clone(),
            Column::Prompt => metadata.prompt.clone(),
            Column::User => metadata.user.clone().unwrap_or_default(),
            Column::Timestamp => metadata.display_timestamp(),
            Column::Quality => metadata.quality.clone().unwrap_or_default(),
            Column::Style => metadata.style.clone().unwrap_or_default(),
            Column::Model => metadata.model.clone(),
            Column::Size => metadata.dimensions(),
        }
    }

    fn matches_query(&self, query: &str) -> bool {
        Column::ALL
            .iter()
            .any(|column| self.cell_text(*column).to_lowercase().contains(query))
    }
}

#[derive(Debug)]
pub struct MetadataTable {
    rows: Vec<TableRow>,
    status: TableStatus,
    sort: Option<SortState>,
    /// Checked values per filterable column
    filters: BTreeMap<Column, BTreeSet<String>>,
    open_filters: BTreeSet<Column>,
    search: String,
    popup: Option<TablePopup>,
}

impl Default for MetadataTable {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            status: TableStatus::Loading,
            sort: None,
            filters: BTreeMap::new(),
            open_filters: BTreeSet::new(),
            search: String::new(),
            popup: None,
        }
    }
}

impl MetadataTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply the initial load. Any failure leaves the table empty.
    pub fn load_finished(&mut self, result: Result<Vec<ImageMetadata>, String>) {
        match result {
            Ok(records) => {
                info!(count = records.len(), "Metadata table loaded");
                self.rows = records
                    .into_iter()
                    .enumerate()
                    .map(|(i, metadata)| TableRow {
                        position: i + 1,
                        metadata,
                    })
                    .collect();
                self.status = TableStatus::Ready;
            }
            Err(e) => {
                error!(error = %e, "Error fetching data");
                self.rows.clear();
                self.status = TableStatus::Failed(e);
            }
        }
    }

    pub fn status(&self) -> &TableStatus {
        &self.status
    }

    /// Sort by `column`: same column toggles, another column starts ascending
    pub fn sort_by(&mut self, column: Column) -> Option<SortState> {
        if !column.is_sortable() {
            return self.sort;
        }

        let direction = match self.sort {
            Some(current) if current.column == column => current.direction.toggled(),
            _ => SortDirection::Ascending,
        };
        self.sort = Some(SortState { column, direction });
        self.sort
    }

    pub fn sort_state(&self) -> Option<SortState> {
        self.sort
    }

    pub fn toggle_filter_box(&mut self, column: Column) {
        if !column.is_filterable() {
            return;
        }
        if !self.open_filters.remove(&column) {
            self.open_filters.insert(column);
        }
    }

    pub fn is_filter_open(&self, column: Column) -> bool {
        self.open_filters.contains(&column)
    }

    pub fn open_filter_boxes(&self) -> impl Iterator<Item = Column> + '_ {
        self.open_filters.iter().copied()
    }

    /// Close every filter box unless the click was inside one or on a
    /// filterable header
    pub fn dismiss_filter_boxes(&mut self, target: ClickTarget) {
        if target == ClickTarget::Elsewhere {
            self.open_filters.clear();
        }
    }

    /// Distinct values of `column` in first-seen order, with counts
    pub fn filter_options(&self, column: Column) -> Vec<FilterOption> {
        let checked = self.filters.get(&column);
        let mut options: Vec<FilterOption> = Vec::new();

        for row in &self.rows {
            let value = row.cell_text(column);
            match options.iter_mut().find(|option| option.value == value) {
                Some(option) => option.count += 1,
                None => options.push(FilterOption {
                    checked: checked.is_some_and(|set| set.contains(&value)),
                    value,
                    count: 1,
                }),
            }
        }

        options
    }

    pub fn set_filter_value(&mut self, column: Column, value: String, checked: bool) {
        let values = self.filters.entry(column).or_default();
        if checked {
            values.insert(value);
        } else {
            values.remove(&value);
        }
        if values.is_empty() {
            self.filters.remove(&column);
        }
    }

    pub fn set_search(&mut self, query: String) {
        self.search = query;
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    /// Rows after filters and search, in sort order
    pub fn visible_rows(&self) -> Vec<&TableRow> {
        let query = self.search.to_lowercase();

        let mut rows: Vec<&TableRow> = self
            .rows
            .iter()
            .filter(|row| {
                self.filters
                    .iter()
                    .all(|(column, values)| values.is_empty() || values.contains(&row.cell_text(*column)))
            })
            .filter(|row| query.is_empty() || row.matches_query(&query))
            .collect();

        if let Some(sort) = self.sort {
            rows.sort_by(|a, b| {
                let ordering = compare_cells(&a.cell_text(sort.column), &b.cell_text(sort.column));
                match sort.direction {
                    SortDirection::Ascending => ordering,
                    SortDirection::Descending => ordering.reverse(),
                }
            });
        }

        rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn open_image_popup(&mut self, src: String) {
        self.popup = Some(TablePopup::Image { src });
    }

    pub fn open_prompt_popup(&mut self, text: String) {
        self.popup = Some(TablePopup::Prompt { text });
    }

    pub fn close_popup(&mut self) {
        self.popup = None;
    }

    pub fn popup(&self) -> Option<&TablePopup> {
        self.popup.as_ref()
    }
}

/// Numeric when both cells are numbers, otherwise a case-folded string
/// comparison with exact text as the tie-breaker
pub fn compare_cells(a: &str, b: &str) -> Ordering {
    let (a, b) = (a.trim(), b.trim());

    match (parse_number(a), parse_number(b)) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => a
            .to_lowercase()
            .cmp(&b.to_lowercase())
            .then_with(|| a.cmp(b)),
    }
}

/// Finite numbers only; "inf" and "NaN" sort as text
fn parse_number(text: &str) -> Option<f64> {
    text.parse::<f64>().ok().filter(|value| value.is_finite())
}
