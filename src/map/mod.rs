pub mod palette;

use rand::Rng;
use rand::seq::SliceRandom;

use crate::error::{Error, Result};

pub use palette::{Color, Palette};

/// Most tiles a map may hold (4096 × 4096).
pub const MAX_MAP_TILES: u64 = 1 << 24;

// ── Tile ──────────────────────────────────────────────────────────────────────

/// One grid cell.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Tile {
    /// Symbol drawn for the cell; a member of the map's glyph palette.
    pub glyph: char,
    /// Symbol color; a member of the map's color palette.
    pub color: Color,
    /// Elevation in half-tile steps. Raised tiles are drawn higher on screen.
    pub height: u32,
    /// Light level, 1.0 = fully lit.
    pub light: f32,
}

impl Tile {
    pub fn new(glyph: char, color: Color, height: u32) -> Self {
        Self { glyph, color, height, light: 1.0 }
    }
}

// ── TileMap ───────────────────────────────────────────────────────────────────

/// Fixed-size grid of tiles built from a [`Palette`].
///
/// Tiles are stored row-major (`y * width + x`). Every tile's glyph and color
/// belong to the palette, which is what lets the atlas cover every tile.
#[derive(Clone, Debug)]
pub struct TileMap {
    tile_size: u32,
    width: u32,
    height: u32,
    tiles: Vec<Tile>,
    palette: Palette,
}

impl TileMap {
    /// Fill a `width × height` grid with random tiles.
    ///
    /// Each cell independently draws a glyph and a color uniformly from the
    /// palette and a height uniformly from `{0, 1}`. Pass a seeded generator
    /// for reproducible maps.
    pub fn generate<R: Rng>(
        tile_size: u32,
        width: u32,
        height: u32,
        palette: Palette,
        rng: &mut R,
    ) -> Result<Self> {
        check_dimensions(tile_size, width, height)?;

        let mut tiles = Vec::with_capacity(width as usize * height as usize);
        for _ in 0..height {
            for _ in 0..width {
                // Palette::new guarantees both sets are non-empty.
                let glyph = *palette.glyphs().choose(rng).unwrap_or(&' ');
                let color = *palette.colors().choose(rng).unwrap_or(&Color::rgb(0, 0, 0));
                let elevation = rng.gen_range(0..=1);
                tiles.push(Tile::new(glyph, color, elevation));
            }
        }

        Ok(Self { tile_size, width, height, tiles, palette })
    }

    /// Build a map from explicit rows (`rows[y][x]`).
    ///
    /// Fails when the rows are ragged or a tile falls outside the palette.
    pub fn from_tiles(tile_size: u32, rows: Vec<Vec<Tile>>, palette: Palette) -> Result<Self> {
        let height = rows.len() as u32;
        let width = rows.first().map_or(0, |r| r.len()) as u32;
        check_dimensions(tile_size, width, height)?;

        if let Some(y) = rows.iter().position(|r| r.len() as u32 != width) {
            return Err(Error::Config(format!("row {y} does not have {width} tiles")));
        }

        let tiles: Vec<Tile> = rows.into_iter().flatten().collect();
        if let Some(i) = tiles.iter().position(|t| !palette.contains(t.glyph, t.color)) {
            let t = &tiles[i];
            return Err(Error::Config(format!(
                "tile ({}, {}) uses {:?}/{} which is not in the palette",
                i as u32 % width,
                i as u32 / width,
                t.glyph,
                t.color,
            )));
        }

        Ok(Self { tile_size, width, height, tiles, palette })
    }

    pub fn tile_size(&self) -> u32 { self.tile_size }
    pub fn width(&self) -> u32 { self.width }
    pub fn height(&self) -> u32 { self.height }
    pub fn palette(&self) -> &Palette { &self.palette }

    pub fn tile(&self, x: u32, y: u32) -> Option<&Tile> {
        self.index(x, y).map(|i| &self.tiles[i])
    }

    /// Mutable access for in-place updates such as lighting.
    pub fn tile_mut(&mut self, x: u32, y: u32) -> Option<&mut Tile> {
        self.index(x, y).map(move |i| &mut self.tiles[i])
    }

    /// Row `y` as a slice. Used by the culler to walk a window without
    /// per-tile bounds checks.
    pub fn row(&self, y: u32) -> Option<&[Tile]> {
        if y >= self.height {
            return None;
        }
        let start = (y * self.width) as usize;
        Some(&self.tiles[start..start + self.width as usize])
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    fn index(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height).then(|| (y * self.width + x) as usize)
    }
}

fn check_dimensions(tile_size: u32, width: u32, height: u32) -> Result<()> {
    if tile_size == 0 {
        return Err(Error::Config("tile size must be at least 1 pixel".into()));
    }
    if width == 0 || height == 0 {
        return Err(Error::Config(format!("map must be at least 1x1, got {width}x{height}")));
    }
    if width as u64 * height as u64 > MAX_MAP_TILES {
        return Err(Error::Config(format!(
            "map {width}x{height} exceeds {MAX_MAP_TILES} tiles"
        )));
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
