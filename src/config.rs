use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::map::MAX_MAP_TILES;
use crate::map::palette::{DEFAULT_COLORS, DEFAULT_GLYPHS, Palette};
use crate::renderer::atlas::atlas_size;
use crate::renderer::utils::MAX_TEXTURE_DIM;

// ── RenderConfig ──────────────────────────────────────────────────────────────

/// Startup settings for the renderer and its map.
///
/// Every field has a default, so a config file only needs the keys it wants
/// to override:
///
/// ```json
/// { "tile_size": 16, "seed": 42, "color_palette": ["#336699", "#99CCFF"] }
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub title: String,
    /// Initial window size in physical pixels.
    pub window_width: u32,
    pub window_height: u32,
    /// Edge length of one tile at zoom 1, in pixels.
    pub tile_size: u32,
    /// Map size in tiles.
    pub map_width: u32,
    pub map_height: u32,
    pub glyph_palette: Vec<char>,
    /// `#RRGGBB` or `#RRGGBBAA` strings.
    pub color_palette: Vec<String>,
    /// Map generation seed. `None` draws one from OS entropy.
    pub seed: Option<u64>,
    /// Camera speed in tiles per second.
    pub move_speed: f32,
    /// Radians of yaw/pitch per pixel of pointer motion.
    pub look_sensitivity: f32,
    pub initial_pitch: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            title: "isotile".into(),
            window_width: 1280,
            window_height: 720,
            tile_size: 20,
            map_width: 400,
            map_height: 400,
            glyph_palette: DEFAULT_GLYPHS.to_vec(),
            color_palette: DEFAULT_COLORS.iter().map(|c| c.to_string()).collect(),
            seed: None,
            move_speed: 8.0,
            look_sensitivity: 0.002,
            initial_pitch: std::f32::consts::FRAC_PI_6,
        }
    }
}

impl RenderConfig {
    /// Read and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&text)?;
        log::info!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check every field against the limits the renderer can honour: the
    /// atlas and the window must fit in a [`MAX_TEXTURE_DIM`] texture and the
    /// map may hold at most [`MAX_MAP_TILES`] tiles.
    pub fn validate(&self) -> Result<()> {
        if self.tile_size == 0 {
            return Err(Error::Config("tile_size must be at least 1".into()));
        }
        if self.map_width == 0 || self.map_height == 0 {
            return Err(Error::Config(format!(
                "map must be at least 1x1, got {}x{}",
                self.map_width, self.map_height
            )));
        }
        if self.map_width as u64 * self.map_height as u64 > MAX_MAP_TILES {
            return Err(Error::Config(format!(
                "map {}x{} exceeds {MAX_MAP_TILES} tiles",
                self.map_width, self.map_height
            )));
        }
        if self.window_width == 0 || self.window_height == 0 {
            return Err(Error::Config("window size must be non-zero".into()));
        }
        if self.window_width > MAX_TEXTURE_DIM || self.window_height > MAX_TEXTURE_DIM {
            return Err(Error::Config(format!(
                "window {}x{} exceeds {MAX_TEXTURE_DIM} px",
                self.window_width, self.window_height
            )));
        }
        atlas_size(self.glyph_palette.len(), self.color_palette.len(), self.tile_size)?;
        if !(self.move_speed.is_finite() && self.move_speed >= 0.0) {
            return Err(Error::Config(format!("move_speed {} is invalid", self.move_speed)));
        }
        if !self.look_sensitivity.is_finite() {
            return Err(Error::Config("look_sensitivity must be finite".into()));
        }
        if !(0.0..=std::f32::consts::FRAC_PI_2).contains(&self.initial_pitch) {
            return Err(Error::Config(format!(
                "initial_pitch {} is outside [0, pi/2]",
                self.initial_pitch
            )));
        }
        self.palette().map(|_| ())
    }

    /// Typed palette built from the glyph and color lists.
    pub fn palette(&self) -> Result<Palette> {
        Palette::parse(&self.glyph_palette, &self.color_palette)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
