// ── Visibility culling & isometric projection ────────────────────────────────
//
// Two stages per frame:
//
// 1. A cheap axis-aligned candidate window around the camera. It ignores yaw,
//    so it over-selects, but its size only depends on the viewport.
// 2. Every candidate is projected to screen space and dropped unless it lands
//    inside the viewport plus a one-tile margin.
//
// Survivors become `TileInstance`s carrying their atlas UVs.

use super::atlas::{Atlas, UvRect};
use super::utils::Viewport;
use crate::camera::Camera;
use crate::map::TileMap;

// ── TileInstance ──────────────────────────────────────────────────────────────

/// One visible tile for the current frame.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TileInstance {
    /// Quad centre in whole viewport pixels.
    pub screen_x: i32,
    pub screen_y: i32,
    /// Quad edge length in pixels.
    pub size: f32,
    pub uv: UvRect,
    /// Painter's-algorithm key: smaller draws first.
    pub depth_key: i32,
}

// ── CandidateWindow ───────────────────────────────────────────────────────────

/// Half-open grid rectangle `[x0, x1) × [y0, y1)`, always inside the map.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CandidateWindow {
    pub x0: u32,
    pub x1: u32,
    pub y0: u32,
    pub y1: u32,
}

impl CandidateWindow {
    pub fn is_empty(&self) -> bool {
        self.x0 >= self.x1 || self.y0 >= self.y1
    }

    pub fn len(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            (self.x1 - self.x0) as usize * (self.y1 - self.y0) as usize
        }
    }
}

/// Radius, in tiles, of the square that covers the viewport at any yaw: half
/// the viewport diagonal plus a two-tile margin.
///
/// Pitch is ignored. Rows are squashed by `sin(pitch)` on screen, so at a
/// shallow pitch the visible area reaches further along the view direction
/// than this radius and the far rows near the top and bottom edges are not
/// drawn.
pub fn candidate_radius(viewport: &Viewport, tile_px: f32) -> f32 {
    let w = viewport.width as f32 / tile_px;
    let h = viewport.height as f32 / tile_px;
    ((w * w + h * h).sqrt() / 2.0).ceil() + 2.0
}

/// Grid window around `(cam_x, cam_y)` clamped to `[0, map_w) × [0, map_h)`.
///
/// A camera far outside the map produces an empty window, never an
/// out-of-range index.
pub fn candidate_window(
    cam_x: f32,
    cam_y: f32,
    radius: f32,
    map_w: u32,
    map_h: u32,
) -> CandidateWindow {
    let (x0, x1) = clamp_span(cam_x, radius, map_w);
    let (y0, y1) = clamp_span(cam_y, radius, map_h);
    CandidateWindow { x0, x1, y0, y1 }
}

fn clamp_span(center: f32, radius: f32, limit: u32) -> (u32, u32) {
    let lo = (center - radius).floor().clamp(0.0, limit as f32) as u32;
    let hi = (center + radius).ceil().clamp(0.0, limit as f32) as u32;
    (lo, hi.max(lo))
}

// ── Projector ─────────────────────────────────────────────────────────────────

/// Camera-dependent constants of the projection, computed once per frame.
///
/// ```text
/// wx = x - cam_x            wy = y - cam_y
/// rx = wx·cos(yaw) - wy·sin(yaw)
/// ry = wx·sin(yaw) + wy·cos(yaw)
/// sx = rx·s                  + W/2
/// sy = ry·s·sin(pitch) - h·s/2 + H/2
/// ```
/// `s` is the on-screen tile size: map tile size × zoom × device pixel ratio.
#[derive(Copy, Clone, Debug)]
pub struct Projector {
    cam_x: f32,
    cam_y: f32,
    cos_yaw: f32,
    sin_yaw: f32,
    sin_pitch: f32,
    tile_px: f32,
    half_w: f32,
    half_h: f32,
}

impl Projector {
    pub fn new(camera: &Camera, viewport: &Viewport, tile_size: u32) -> Self {
        let pos = camera.position();
        let (sin_yaw, cos_yaw) = camera.yaw().sin_cos();
        Self {
            cam_x: pos.x,
            cam_y: pos.y,
            cos_yaw,
            sin_yaw,
            sin_pitch: camera.pitch().sin(),
            tile_px: tile_size as f32 * camera.zoom() * viewport.scale_factor,
            half_w: viewport.width as f32 / 2.0,
            half_h: viewport.height as f32 / 2.0,
        }
    }

    /// On-screen tile edge length in pixels.
    pub fn tile_px(&self) -> f32 {
        self.tile_px
    }

    /// Unrounded screen position of grid cell `(x, y)` raised by `height`.
    pub fn project(&self, x: f32, y: f32, height: f32) -> (f32, f32) {
        let wx = x - self.cam_x;
        let wy = y - self.cam_y;
        let rx = wx * self.cos_yaw - wy * self.sin_yaw;
        let ry = wx * self.sin_yaw + wy * self.cos_yaw;
        let sx = rx * self.tile_px;
        let sy = ry * self.tile_px * self.sin_pitch - height * (self.tile_px / 2.0);
        (sx + self.half_w, sy + self.half_h)
    }

    /// Screen position rounded to whole pixels so tiles do not shimmer.
    pub fn to_screen(&self, x: u32, y: u32, height: u32) -> (i32, i32) {
        let (sx, sy) = self.project(x as f32, y as f32, height as f32);
        (sx.round() as i32, sy.round() as i32)
    }

    /// Whether a quad centred at `(sx, sy)` can touch the viewport.
    pub fn on_screen(&self, sx: i32, sy: i32) -> bool {
        let m = self.tile_px;
        let (sx, sy) = (sx as f32, sy as f32);
        sx >= -m && sx <= self.half_w * 2.0 + m && sy >= -m && sy <= self.half_h * 2.0 + m
    }
}

// ── cull_and_project ──────────────────────────────────────────────────────────

/// Per-frame counters, mostly for logging.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CullStats {
    /// Tiles inside the candidate window.
    pub candidates: usize,
    /// Candidates dropped by the screen-space test.
    pub off_screen: usize,
    /// On-screen tiles skipped because the atlas had no entry for them.
    pub missing_atlas: usize,
}

/// Append every visible tile of `map` to `out` (which is cleared first).
///
/// The output is in grid order (row by row); depth sorting happens later.
pub fn cull_and_project(
    map: &TileMap,
    camera: &Camera,
    viewport: &Viewport,
    atlas: &Atlas,
    out: &mut Vec<TileInstance>,
) -> CullStats {
    out.clear();
    let mut stats = CullStats::default();

    let projector = Projector::new(camera, viewport, map.tile_size());
    let tile_px = projector.tile_px();
    if tile_px <= 0.0 || !tile_px.is_finite() {
        return stats;
    }

    let pos = camera.position();
    let radius = candidate_radius(viewport, tile_px);
    let window = candidate_window(pos.x, pos.y, radius, map.width(), map.height());
    stats.candidates = window.len();

    for y in window.y0..window.y1 {
        let Some(row) = map.row(y) else { continue };
        for (x, tile) in (window.x0..window.x1).zip(&row[window.x0 as usize..window.x1 as usize]) {
            let (sx, sy) = projector.to_screen(x, y, tile.height);
            if !projector.on_screen(sx, sy) {
                stats.off_screen += 1;
                continue;
            }
            let Some(entry) = atlas.lookup(tile.glyph, tile.color) else {
                stats.missing_atlas += 1;
                continue;
            };
            out.push(TileInstance {
                screen_x: sx,
                screen_y: sy,
                size: tile_px,
                uv: entry.uv,
                depth_key: sy,
            });
        }
    }

    stats
}

// ── Tests ─────────────────────────────────────────────────────────────────────
