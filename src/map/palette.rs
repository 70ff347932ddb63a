use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Default ground glyphs: sparse grass marks.
pub const DEFAULT_GLYPHS: [char; 4] = ['.', ',', '`', '·'];

/// Default ground colors: a handful of greens.
pub const DEFAULT_COLORS: [&str; 5] = ["#228B22", "#2E8B57", "#6B8E23", "#556B2F", "#7CFC00"];

// ── Color ─────────────────────────────────────────────────────────────────────

/// 8-bit RGBA color. Hashable so it can key atlas lookups.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Color(pub [u8; 4]);

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b, 255])
    }

    /// Parse `#RRGGBB` or `#RRGGBBAA` (the leading `#` is optional).
    pub fn from_hex(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidColor(s.to_string());
        let hex = s.strip_prefix('#').unwrap_or(s);
        if !(hex.len() == 6 || hex.len() == 8) || !hex.is_ascii() {
            return Err(invalid());
        }
        let mut out = [255u8; 4];
        for (i, chunk) in hex.as_bytes().chunks(2).enumerate() {
            let pair = std::str::from_utf8(chunk).map_err(|_| invalid())?;
            out[i] = u8::from_str_radix(pair, 16).map_err(|_| invalid())?;
        }
        Ok(Self(out))
    }

    pub fn to_hex(self) -> String {
        let [r, g, b, a] = self.0;
        if a == 255 {
            format!("#{r:02X}{g:02X}{b:02X}")
        } else {
            format!("#{r:02X}{g:02X}{b:02X}{a:02X}")
        }
    }
}

impl FromStr for Color {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

// ── Palette ───────────────────────────────────────────────────────────────────

/// Ordered glyph and color sets a map is built from.
///
/// Both sets are non-empty and duplicate-free; the order fixes each entry's
/// column (glyph) or row (color) in the texture atlas.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Palette {
    glyphs: Vec<char>,
    colors: Vec<Color>,
}

impl Palette {
    pub fn new(glyphs: Vec<char>, colors: Vec<Color>) -> Result<Self> {
        if glyphs.is_empty() {
            return Err(Error::Config("glyph palette is empty".into()));
        }
        if colors.is_empty() {
            return Err(Error::Config("color palette is empty".into()));
        }
        if let Some(g) = first_duplicate(&glyphs) {
            return Err(Error::Config(format!("glyph {g:?} appears twice in the palette")));
        }
        if let Some(c) = first_duplicate(&colors) {
            return Err(Error::Config(format!("color {c} appears twice in the palette")));
        }
        Ok(Self { glyphs, colors })
    }

    /// Build from hex color strings.
    pub fn parse(glyphs: &[char], colors: &[impl AsRef<str>]) -> Result<Self> {
        let colors = colors
            .iter()
            .map(|c| Color::from_hex(c.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Self::new(glyphs.to_vec(), colors)
    }

    pub fn glyphs(&self) -> &[char] { &self.glyphs }
    pub fn colors(&self) -> &[Color] { &self.colors }

    pub fn contains(&self, glyph: char, color: Color) -> bool {
        self.glyphs.contains(&glyph) && self.colors.contains(&color)
    }
}

impl Default for Palette {
    fn default() -> Self {
        let colors = DEFAULT_COLORS
            .iter()
            .filter_map(|c| Color::from_hex(c).ok())
            .collect();
        Self { glyphs: DEFAULT_GLYPHS.to_vec(), colors }
    }
}

fn first_duplicate<T: PartialEq + Copy>(items: &[T]) -> Option<T> {
    items
        .iter()
        .enumerate()
        .find(|(i, item)| items[..*i].contains(*item))
        .map(|(_, item)| *item)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rgb_and_rgba_hex() {
        assert_eq!(Color::from_hex("#228B22").unwrap(), Color::rgb(0x22, 0x8B, 0x22));
        assert_eq!(Color::from_hex("7CFC0080").unwrap(), Color([0x7C, 0xFC, 0x00, 0x80]));
    }

    #[test]
    fn rejects_malformed_hex() {
        for bad in ["", "#12345", "#GG0000", "#1234567", "#ÿÿÿ"] {
            assert!(Color::from_hex(bad).is_err(), "{bad:?} should not parse");
        }
    }

    #[test]
    fn hex_round_trips_through_display() {
        let c = Color::from_hex("#556b2f").unwrap();
        assert_eq!(c.to_string(), "#556B2F");
    }

    #[test]
    fn default_palette_matches_the_documented_sets() {
        let p = Palette::default();
        assert_eq!(p.glyphs(), &DEFAULT_GLYPHS);
        assert_eq!(p.colors().len(), DEFAULT_COLORS.len());
        assert_eq!(p.colors()[0], Color::rgb(0x22, 0x8B, 0x22));
    }

    #[test]
    fn duplicate_or_empty_sets_are_rejected() {
        assert!(Palette::new(vec![], vec![Color::rgb(0, 0, 0)]).is_err());
        assert!(Palette::new(vec!['.'], vec![]).is_err());
        assert!(Palette::new(vec!['.', '.'], vec![Color::rgb(0, 0, 0)]).is_err());
        let c = Color::rgb(1, 2, 3);
        assert!(Palette::new(vec!['.'], vec![c, c]).is_err());
    }
}
