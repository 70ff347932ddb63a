// ── Viewport ──────────────────────────────────────────────────────────────────
//
// Size of the drawable surface in physical pixels plus the device pixel ratio.
// Projection centres on `(width / 2, height / 2)` and scales tiles by
// `scale_factor`, so a HiDPI window shows the same map area as a 1× one.

/// Largest texture or framebuffer edge, in pixels. This is wgpu's default
/// `max_texture_dimension_2d`, so anything within it can be uploaded on any
/// adapter.
pub const MAX_TEXTURE_DIM: u32 = 8192;

/// Drawable area the frame is projected into.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    /// Width in physical pixels.
    pub width: u32,
    /// Height in physical pixels.
    pub height: u32,
    /// Device pixel ratio (physical pixels per logical pixel).
    pub scale_factor: f32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height, scale_factor: 1.0 }
    }

    pub fn with_scale_factor(mut self, scale_factor: f32) -> Self {
        self.scale_factor = if scale_factor.is_finite() && scale_factor > 0.0 {
            scale_factor
        } else {
            1.0
        };
        self
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Orthographic projection matrix (column-major) mapping pixel coords to clip space.
///
/// `(0, 0)` is the top-left corner, `(width, height)` the bottom-right.
pub fn orthographic_projection(width: f32, height: f32) -> [[f32; 4]; 4] {
    [
        [2.0 / width, 0.0,           0.0, 0.0], // col0
        [0.0,         -2.0 / height, 0.0, 0.0], // col1
        [0.0,         0.0,           1.0, 0.0], // col2
        [-1.0,        1.0,           0.0, 1.0], // col3
    ]
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(m: &[[f32; 4]; 4], x: f32, y: f32) -> (f32, f32) {
        (m[0][0] * x + m[3][0], m[1][1] * y + m[3][1])
    }

    #[test]
    fn ortho_maps_corners_to_clip_space() {
        let m = orthographic_projection(800.0, 600.0);
        for ((px, py), (cx, cy)) in [
            ((0.0, 0.0), (-1.0, 1.0)),
            ((800.0, 600.0), (1.0, -1.0)),
            ((400.0, 300.0), (0.0, 0.0)),
        ] {
            let (x, y) = apply(&m, px, py);
            assert!((x - cx).abs() < 1e-5 && (y - cy).abs() < 1e-5, "({px},{py}) -> ({x},{y})");
        }
    }

    #[test]
    fn invalid_scale_factor_falls_back_to_one() {
        assert_eq!(Viewport::new(10, 10).with_scale_factor(0.0).scale_factor, 1.0);
        assert_eq!(Viewport::new(10, 10).with_scale_factor(f32::NAN).scale_factor, 1.0);
        assert_eq!(Viewport::new(10, 10).with_scale_factor(2.0).scale_factor, 2.0);
    }

    #[test]
    fn zero_sized_viewport_is_empty() {
        assert!(Viewport::new(0, 720).is_empty());
        assert!(!Viewport::new(1, 1).is_empty());
    }
}
