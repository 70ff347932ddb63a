use std::collections::HashMap;

use image::{Rgba, RgbaImage};

use super::glyphs;
use super::utils::MAX_TEXTURE_DIM;
use crate::error::{Error, Result};
use crate::map::{Color, Palette};

// ── UvRect / AtlasEntry ───────────────────────────────────────────────────────

/// Normalised texture rectangle, `min` top-left and `max` bottom-right.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct UvRect {
    pub min: [f32; 2],
    pub max: [f32; 2],
}

/// Where one (glyph, color) image lives inside the atlas.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AtlasEntry {
    /// Top-left pixel X inside the atlas.
    pub x: u32,
    /// Top-left pixel Y inside the atlas.
    pub y: u32,
    /// Cell edge length in pixels (the map tile size).
    pub size: u32,
    pub uv: UvRect,
}

// ── Atlas ─────────────────────────────────────────────────────────────────────

/// Packed bitmap holding every glyph in every palette color, plus the lookup
/// table from `(glyph, color)` to its cell.
///
/// Layout: column `i` holds glyph `i`, row `j` holds color `j`, each cell
/// `tile_size × tile_size`. The image is therefore `G·t` wide and `C·t` tall.
pub struct Atlas {
    image: RgbaImage,
    entries: HashMap<(char, Color), AtlasEntry>,
    tile_size: u32,
    palette: Palette,
}

impl Atlas {
    pub fn image(&self) -> &RgbaImage { &self.image }
    pub fn tile_size(&self) -> u32 { self.tile_size }
    pub fn width(&self) -> u32 { self.image.width() }
    pub fn height(&self) -> u32 { self.image.height() }
    pub fn len(&self) -> usize { self.entries.len() }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// Palette this atlas was built from. A map with a different palette
    /// needs a rebuilt atlas.
    pub fn palette(&self) -> &Palette { &self.palette }

    /// Cell for `(glyph, color)`, or `None` if the pair was not in the
    /// palette at build time.
    pub fn lookup(&self, glyph: char, color: Color) -> Option<&AtlasEntry> {
        self.entries.get(&(glyph, color))
    }
}

// ── AtlasBuilder ──────────────────────────────────────────────────────────────

/// Rasterizes a palette into an [`Atlas`].
///
/// Building is a one-shot synchronous step; a palette change means building a
/// fresh atlas, never patching an existing one.
pub struct AtlasBuilder {
    tile_size: u32,
}

impl AtlasBuilder {
    pub fn new(tile_size: u32) -> Self {
        Self { tile_size: tile_size.max(1) }
    }

    /// Fails when the bitmap would not fit in a [`MAX_TEXTURE_DIM`] texture.
    pub fn build(&self, palette: &Palette) -> Result<Atlas> {
        let t = self.tile_size;
        let glyph_list = palette.glyphs();
        let color_list = palette.colors();
        let (atlas_w, atlas_h) = atlas_size(glyph_list.len(), color_list.len(), t)?;

        for &g in glyph_list {
            if glyphs::bitmap(g).is_none() {
                log::warn!("atlas: no built-in bitmap for glyph {g:?}; drawing a box instead");
            }
        }

        let mut image = RgbaImage::new(atlas_w, atlas_h);
        let mut entries = HashMap::with_capacity(glyph_list.len() * color_list.len());

        for (i, &glyph) in glyph_list.iter().enumerate() {
            for (j, &color) in color_list.iter().enumerate() {
                let x = i as u32 * t;
                let y = j as u32 * t;
                draw_glyph(&mut image, glyph, color, x, y, t);

                let uv = UvRect {
                    min: [x as f32 / atlas_w as f32, y as f32 / atlas_h as f32],
                    max: [(x + t) as f32 / atlas_w as f32, (y + t) as f32 / atlas_h as f32],
                };
                entries.insert((glyph, color), AtlasEntry { x, y, size: t, uv });
            }
        }

        log::debug!(
            "atlas: {}x{} px, {} entries ({} glyphs x {} colors)",
            atlas_w,
            atlas_h,
            entries.len(),
            glyph_list.len(),
            color_list.len(),
        );

        Ok(Atlas { image, entries, tile_size: t, palette: palette.clone() })
    }
}

/// Pixel size of the atlas for `glyphs × colors` cells of `tile_size`.
pub fn atlas_size(glyphs: usize, colors: usize, tile_size: u32) -> Result<(u32, u32)> {
    let edge = |cells: usize, axis: &str| {
        u32::try_from(cells)
            .ok()
            .and_then(|n| n.checked_mul(tile_size))
            .filter(|&px| px <= MAX_TEXTURE_DIM)
            .ok_or_else(|| {
                Error::Config(format!(
                    "atlas {axis} of {cells} x {tile_size} px exceeds {MAX_TEXTURE_DIM} px"
                ))
            })
    };
    Ok((edge(glyphs, "width")?, edge(colors, "height")?))
}

/// Draw `glyph` in `color`, centred in the `size × size` cell at `(x0, y0)`.
/// Pixels outside the glyph stay fully transparent.
fn draw_glyph(image: &mut RgbaImage, glyph: char, color: Color, x0: u32, y0: u32, size: u32) {
    let rows = glyphs::bitmap_or_fallback(glyph);
    let scale = glyphs::scale_for(size);
    let gw = glyphs::GLYPH_W * scale;
    let gh = glyphs::GLYPH_H * scale;
    // Signed offsets: a glyph larger than the cell is clipped symmetrically.
    let off_x = (size as i64 - gw as i64) / 2;
    let off_y = (size as i64 - gh as i64) / 2;

    for py in 0..size {
        for px in 0..size {
            let gx = px as i64 - off_x;
            let gy = py as i64 - off_y;
            if gx < 0 || gy < 0 || gx >= gw as i64 || gy >= gh as i64 {
                continue;
            }
            let (bx, by) = (gx as u32 / scale, gy as u32 / scale);
            if glyphs::is_set(rows, bx, by) {
                image.put_pixel(x0 + px, y0 + py, Rgba(color.0));
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
