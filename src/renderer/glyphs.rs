// ── Built-in 5×7 bitmap glyphs ────────────────────────────────────────────────
//
// Terrain maps only need a handful of marks, so instead of shipping a font the
// atlas builder rasterizes these bitmaps, scaled up to fit the tile cell.
// Each row is five bits wide; bit 4 is the leftmost pixel.

/// Bitmap width in pixels.
pub const GLYPH_W: u32 = 5;
/// Bitmap height in pixels.
pub const GLYPH_H: u32 = 7;

type Rows = [u8; GLYPH_H as usize];

const GLYPHS: &[(char, Rows)] = &[
    (' ',  [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b00000]),
    ('.',  [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b01100, 0b01100]),
    (',',  [0b00000, 0b00000, 0b00000, 0b00000, 0b01100, 0b00100, 0b01000]),
    ('`',  [0b01000, 0b00100, 0b00010, 0b00000, 0b00000, 0b00000, 0b00000]),
    ('\'', [0b00100, 0b00100, 0b01000, 0b00000, 0b00000, 0b00000, 0b00000]),
    ('"',  [0b01010, 0b01010, 0b00000, 0b00000, 0b00000, 0b00000, 0b00000]),
    ('·',  [0b00000, 0b00000, 0b00000, 0b01100, 0b01100, 0b00000, 0b00000]),
    (':',  [0b00000, 0b01100, 0b01100, 0b00000, 0b01100, 0b01100, 0b00000]),
    (';',  [0b00000, 0b01100, 0b01100, 0b00000, 0b01100, 0b00100, 0b01000]),
    ('-',  [0b00000, 0b00000, 0b00000, 0b11111, 0b00000, 0b00000, 0b00000]),
    ('=',  [0b00000, 0b00000, 0b11111, 0b00000, 0b11111, 0b00000, 0b00000]),
    ('+',  [0b00000, 0b00100, 0b00100, 0b11111, 0b00100, 0b00100, 0b00000]),
    ('*',  [0b00000, 0b00100, 0b10101, 0b01110, 0b10101, 0b00100, 0b00000]),
    ('~',  [0b00000, 0b00000, 0b01000, 0b10101, 0b00010, 0b00000, 0b00000]),
    ('^',  [0b00100, 0b01010, 0b10001, 0b00000, 0b00000, 0b00000, 0b00000]),
    ('#',  [0b01010, 0b01010, 0b11111, 0b01010, 0b11111, 0b01010, 0b01010]),
    ('%',  [0b11000, 0b11001, 0b00010, 0b00100, 0b01000, 0b10011, 0b00011]),
    ('o',  [0b00000, 0b00000, 0b01110, 0b10001, 0b10001, 0b10001, 0b01110]),
    ('T',  [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100]),
    ('♣',  [0b00100, 0b01110, 0b00100, 0b11111, 0b11111, 0b00100, 0b01110]),
];

/// Drawn for glyphs missing from the table: a hollow box.
const FALLBACK: Rows = [0b11111, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b11111];

/// Bitmap rows for `ch`, or `None` when the glyph is not built in.
pub fn bitmap(ch: char) -> Option<&'static Rows> {
    GLYPHS.iter().find(|(c, _)| *c == ch).map(|(_, rows)| rows)
}

/// Bitmap rows for `ch`, falling back to a hollow box.
pub fn bitmap_or_fallback(ch: char) -> &'static Rows {
    bitmap(ch).unwrap_or(&FALLBACK)
}

/// Whether pixel `(x, y)` of a bitmap is set.
#[inline]
pub fn is_set(rows: &Rows, x: u32, y: u32) -> bool {
    x < GLYPH_W && y < GLYPH_H && rows[y as usize] & (1 << (GLYPH_W - 1 - x)) != 0
}

/// Integer scale so the bitmap covers roughly 70 % of a `tile_size` cell.
/// Never below 1, so tiny tiles still show the glyph (clipped if needed).
pub fn scale_for(tile_size: u32) -> u32 {
    (tile_size * 7 / (10 * GLYPH_H)).max(1)
}
