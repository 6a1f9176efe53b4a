/// Shared data structures for the application state
///
/// Tiles are the rendered unit of both the gallery grid and the
/// generation results. They are plain values; the `ui` module turns
/// them into widgets.

/// Gallery thumbnails are fitted inside a square of this size
pub const GALLERY_TILE_SIZE: f32 = 250.0;

/// Generated images are shown at a fixed height...
pub const RESULT_TILE_HEIGHT: f32 = 250.0;

/// ...and never wider than this
pub const RESULT_TILE_MAX_WIDTH: f32 = 439.0;

/// Identifier of a tile within its `TileSet`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileId(pub u64);

/// Which tile collection a tile lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileOwner {
    Gallery,
    Results,
}

/// Display size of a tile in logical pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileSize {
    pub width: f32,
    pub height: f32,
}

impl TileSize {
    /// Square box used by gallery thumbnails and by results whose
    /// natural size is not known yet
    pub fn square() -> Self {
        Self {
            width: GALLERY_TILE_SIZE,
            height: GALLERY_TILE_SIZE,
        }
    }

    /// Result tile size from an image's natural dimensions:
    /// fixed height, width from the aspect ratio, capped.
    pub fn from_natural(width: u32, height: u32) -> Self {
        if width == 0 || height == 0 {
            return Self::square();
        }

        let aspect_ratio = width as f32 / height as f32;
        Self {
            width: (RESULT_TILE_HEIGHT * aspect_ratio).min(RESULT_TILE_MAX_WIDTH),
            height: RESULT_TILE_HEIGHT,
        }
    }
}

/// One rendered image plus its hover actions
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    pub id: TileId,
    /// Filename the server knows the image by
    pub filename: String,
    /// URL the image bytes are fetched from
    pub src: String,
    pub size: TileSize,
}

/// Ordered collection of tiles with stable ids
#[derive(Debug, Clone, Default)]
pub struct TileSet {
    tiles: Vec<Tile>,
    next_id: u64,
}

impl TileSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a tile and return its id
    pub fn push(&mut self, filename: String, src: String, size: TileSize) -> TileId {
        let id = TileId(self.next_id);
        self.next_id += 1;
        self.tiles.push(Tile {
            id,
            filename,
            src,
            size,
        });
        id
    }

    /// Remove a tile; returns false if it was already gone
    pub fn remove(&mut self, id: TileId) -> bool {
        let before = self.tiles.len();
        self.tiles.retain(|tile| tile.id != id);
        self.tiles.len() != before
    }

    /// Drop every tile. Ids keep counting so stale messages never hit a new tile.
    pub fn clear(&mut self) {
        self.tiles.clear();
    }

    pub fn get(&self, id: TileId) -> Option<&Tile> {
        self.tiles.iter().find(|tile| tile.id == id)
    }

    /// Resize every tile showing `src`
    pub fn resize_source(&mut self, src: &str, size: TileSize) {
        for tile in self.tiles.iter_mut().filter(|tile| tile.src == src) {
            tile.size = size;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}
