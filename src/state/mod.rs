/// State management module
///
/// This module holds all application state, independent of any widget:
/// - Shared tile structures (data.rs)
/// - Infinite-scroll gallery and its page cursor (gallery.rs)
/// - Generation form, submission lifecycle and results (generate.rs)
/// - Metadata table: sort, filter boxes, search, popups (table.rs)
/// - Download / delete / focus overlay actions (actions.rs)
/// - Fetched image cache (thumbnails.rs)

pub mod actions;
pub mod data;
pub mod gallery;
pub mod generate;
pub mod table;
pub mod thumbnails;
