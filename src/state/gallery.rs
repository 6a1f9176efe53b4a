/// Infinite-scroll gallery
///
/// `GalleryLoader` owns the page cursor and the rendered tiles. It never
/// performs I/O itself: `begin_load` hands out the page to fetch, and the
/// caller reports the outcome through `finish_load`.

use tracing::{debug, error};

use super::data::{TileId, TileSet, TileSize};

/// Distance from the bottom (in logical pixels) that triggers the next page
pub const LOAD_THRESHOLD: f32 = 100.0;

/// Next page to request plus the reentrancy flag.
/// Advances only when a page arrives; never resets.
#[derive(Debug, Clone, PartialEq)]
pub struct PageCursor {
    next_page: u32,
    in_flight: bool,
}

impl Default for PageCursor {
    fn default() -> Self {
        Self {
            next_page: 1,
            in_flight: false,
        }
    }
}

/// Snapshot of the gallery's scroll position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollMetrics {
    pub offset_y: f32,
    pub viewport_height: f32,
    pub content_height: f32,
}

impl ScrollMetrics {
    pub fn near_bottom(&self) -> bool {
        self.offset_y + self.viewport_height >= self.content_height - LOAD_THRESHOLD
    }
}

#[derive(Debug, Default)]
pub struct GalleryLoader {
    cursor: PageCursor,
    tiles: TileSet,
    last_metrics: Option<ScrollMetrics>,
    /// Set while the focus overlay is open
    scroll_locked: bool,
}

impl GalleryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the next page. Returns `None` while a fetch is outstanding.
    pub fn begin_load(&mut self) -> Option<u32> {
        if self.cursor.in_flight {
            return None;
        }
        self.cursor.in_flight = true;
        Some(self.cursor.next_page)
    }

    /// Apply the outcome of fetching `page`.
    ///
    /// On success one tile per filename is appended and the cursor moves
    /// past `page`. On failure the cursor stays put so the next trigger
    /// asks for the same page again. Returns the sources of new tiles.
    pub fn finish_load(
        &mut self,
        page: u32,
        result: Result<Vec<String>, String>,
        image_url: impl Fn(&str) -> String,
    ) -> Vec<String> {
        self.cursor.in_flight = false;

        match result {
            Ok(filenames) => {
                debug!(page, count = filenames.len(), "Gallery page loaded");
                self.cursor.next_page = page + 1;

                filenames
                    .into_iter()
                    .map(|filename| {
                        let src = image_url(&filename);
                        self.tiles.push(filename, src.clone(), TileSize::square());
                        src
                    })
                    .collect()
            }
            Err(e) => {
                error!(page, error = %e, "Error loading images");
                Vec::new()
            }
        }
    }

    /// Scroll callback: remembers the position and claims a page
    /// when the bottom is near. Not debounced; the in-flight flag
    /// absorbs bursts.
    pub fn on_scroll(&mut self, metrics: ScrollMetrics) -> Option<u32> {
        self.last_metrics = Some(metrics);
        if self.scroll_locked || !metrics.near_bottom() {
            return None;
        }
        self.begin_load()
    }

    /// Window resize: re-evaluate the trigger with the new viewport height
    pub fn on_resize(&mut self, viewport_height: f32) -> Option<u32> {
        let metrics = self.last_metrics?;
        self.on_scroll(ScrollMetrics {
            viewport_height,
            ..metrics
        })
    }

    pub fn set_scroll_locked(&mut self, locked: bool) {
        self.scroll_locked = locked;
    }

    pub fn remove_tile(&mut self, id: TileId) -> bool {
        self.tiles.remove(id)
    }

    pub fn tiles(&self) -> &TileSet {
        &self.tiles
    }

    pub fn next_page(&self) -> u32 {
        self.cursor.next_page
    }

    pub fn is_loading(&self) -> bool {
        self.cursor.in_flight
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image_url(filename: &str) -> String {
        format!("/uploaded_images/{}", filename)
    }

    fn at_bottom() -> ScrollMetrics {
        ScrollMetrics {
            offset_y: 950.0,
            viewport_height: 600.0,
            content_height: 1600.0,
        }
    }

    #[test]
    fn test_first_page_renders_tiles_and_advances() {
        let mut gallery = GalleryLoader::new();

        let page = gallery.begin_load();
        assert_eq!(page, Some(1));

        let sources = gallery.finish_load(
            1,
            Ok(vec!["a.png".to_string(), "b.png".to_string()]),
            image_url,
        );

        let tiles: Vec<&str> = gallery.tiles().iter().map(|tile| tile.src.as_str()).collect();
        assert_eq!(tiles, vec!["/uploaded_images/a.png", "/uploaded_images/b.png"]);
        assert_eq!(sources.len(), 2);

        // The next scroll trigger asks for page 2
        assert_eq!(gallery.on_scroll(at_bottom()), Some(2));
    }

    #[test]
    fn test_scroll_while_loading_is_a_noop() {
        let mut gallery = GalleryLoader::new();
        assert_eq!(gallery.begin_load(), Some(1));

        for _ in 0..20 {
            assert_eq!(gallery.on_scroll(at_bottom()), None);
        }
        assert!(gallery.is_loading());

        gallery.finish_load(1, Ok(vec!["a.png".to_string()]), image_url);
        assert_eq!(gallery.on_scroll(at_bottom()), Some(2));
        assert_eq!(gallery.on_scroll(at_bottom()), None);
    }

    #[test]
    fn test_failed_page_is_retried() {
        let mut gallery = GalleryLoader::new();
        assert_eq!(gallery.begin_load(), Some(1));

        let sources = gallery.finish_load(1, Err("502 Bad Gateway".to_string()), image_url);
        assert!(sources.is_empty());
        assert!(!gallery.is_loading());
        assert_eq!(gallery.next_page(), 1);
        assert_eq!(gallery.begin_load(), Some(1));
    }

    #[test]
    fn test_scroll_far_from_bottom_does_nothing() {
        let mut gallery = GalleryLoader::new();
        let metrics = ScrollMetrics {
            offset_y: 0.0,
            viewport_height: 600.0,
            content_height: 1600.0,
        };
        assert_eq!(gallery.on_scroll(metrics), None);
        assert!(!gallery.is_loading());
    }

    #[test]
    fn test_threshold_boundary() {
        let metrics = ScrollMetrics {
            offset_y: 900.0,
            viewport_height: 600.0,
            content_height: 1600.0,
        };
        assert!(metrics.near_bottom());

        let metrics = ScrollMetrics {
            offset_y: 899.0,
            ..metrics
        };
        assert!(!metrics.near_bottom());
    }

    #[test]
    fn test_locked_scroll_never_loads() {
        let mut gallery = GalleryLoader::new();
        gallery.set_scroll_locked(true);
        assert_eq!(gallery.on_scroll(at_bottom()), None);

        gallery.set_scroll_locked(false);
        assert_eq!(gallery.on_scroll(at_bottom()), Some(1));
    }

    #[test]
    fn test_resize_uses_last_scroll_position() {
        let mut gallery = GalleryLoader::new();
        assert_eq!(gallery.on_resize(900.0), None);

        let metrics = ScrollMetrics {
            offset_y: 0.0,
            viewport_height: 600.0,
            content_height: 950.0,
        };
        assert_eq!(gallery.on_scroll(metrics), None);
        // Taller window now reaches the bottom
        assert_eq!(gallery.on_resize(900.0), Some(1));
    }

    #[test]
    fn test_delete_removes_only_that_tile() {
        let mut gallery = GalleryLoader::new();
        gallery.begin_load();
        gallery.finish_load(1, Ok(vec!["a.png".into(), "b.png".into()]), image_url);

        let first = gallery.tiles().iter().next().unwrap().id;
        assert!(gallery.remove_tile(first));
        assert_eq!(gallery.tiles().len(), 1);
        assert_eq!(gallery.tiles().iter().next().unwrap().filename, "b.png");
        // Cursor is untouched by deletes
        assert_eq!(gallery.next_page(), 2);
    }
}
