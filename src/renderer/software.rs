// ── CPU raster backend ────────────────────────────────────────────────────────
//
// Draws a `TileBatch` into an in-memory RGBA framebuffer. Tile quads are
// always screen-aligned rectangles, so each pair of triangles is filled as one
// rectangle with nearest-neighbour UV sampling and straight alpha blending.
// Used for headless snapshots and for tests that need real pixels.

use image::{Rgba, RgbaImage};

use super::backend::DrawBackend;
use super::batch::TileBatch;
use super::utils::Viewport;
use crate::error::Error;

pub struct SoftwareBackend {
    framebuffer: RgbaImage,
    clear_color: Rgba<u8>,
    scale_factor: f32,
    draw_calls: u64,
}

impl SoftwareBackend {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            framebuffer: RgbaImage::new(width, height),
            clear_color: Rgba([0, 0, 0, 255]),
            scale_factor: 1.0,
            draw_calls: 0,
        }
    }

    pub fn with_clear_color(mut self, rgba: [u8; 4]) -> Self {
        self.clear_color = Rgba(rgba);
        self
    }

    pub fn with_scale_factor(mut self, scale_factor: f32) -> Self {
        self.scale_factor = scale_factor;
        self
    }

    pub fn framebuffer(&self) -> &RgbaImage {
        &self.framebuffer
    }

    pub fn into_framebuffer(self) -> RgbaImage {
        self.framebuffer
    }

    /// Number of `submit_batch` calls so far.
    pub fn draw_calls(&self) -> u64 {
        self.draw_calls
    }

    fn fill_quad(&mut self, atlas: &RgbaImage, pos: [[f32; 2]; 2], uv: [[f32; 2]; 2]) {
        let [[x0, y0], [x1, y1]] = pos;
        let [[u0, v0], [u1, v1]] = uv;
        if x1 <= x0 || y1 <= y0 || atlas.width() == 0 || atlas.height() == 0 {
            return;
        }

        let fb_w = self.framebuffer.width() as f32;
        let fb_h = self.framebuffer.height() as f32;
        // Pixels whose centres fall inside the quad.
        let px0 = (x0 - 0.5).ceil().clamp(0.0, fb_w) as u32;
        let px1 = (x1 - 0.5).ceil().clamp(0.0, fb_w) as u32;
        let py0 = (y0 - 0.5).ceil().clamp(0.0, fb_h) as u32;
        let py1 = (y1 - 0.5).ceil().clamp(0.0, fb_h) as u32;

        let tex_w = atlas.width();
        let tex_h = atlas.height();

        for py in py0..py1 {
            let fy = (py as f32 + 0.5 - y0) / (y1 - y0);
            let v = v0 + fy * (v1 - v0);
            let ty = ((v * tex_h as f32) as u32).min(tex_h - 1);
            for px in px0..px1 {
                let fx = (px as f32 + 0.5 - x0) / (x1 - x0);
                let u = u0 + fx * (u1 - u0);
                let tx = ((u * tex_w as f32) as u32).min(tex_w - 1);

                let src = atlas.get_pixel(tx, ty);
                if src.0[3] == 0 {
                    continue;
                }
                let dst = self.framebuffer.get_pixel_mut(px, py);
                *dst = blend(*src, *dst);
            }
        }
    }
}

/// `src·α + dst·(1−α)`, the fixed-function `src-alpha, one-minus-src-alpha` mode.
pub fn blend(src: Rgba<u8>, dst: Rgba<u8>) -> Rgba<u8> {
    let a = src.0[3] as u32;
    let inv = 255 - a;
    let mix = |s: u8, d: u8| ((s as u32 * a + d as u32 * inv + 127) / 255) as u8;
    Rgba([
        mix(src.0[0], dst.0[0]),
        mix(src.0[1], dst.0[1]),
        mix(src.0[2], dst.0[2]),
        ((a * 255 + dst.0[3] as u32 * inv + 127) / 255) as u8,
    ])
}

impl DrawBackend for SoftwareBackend {
    type Texture = RgbaImage;
    type Error = Error;

    fn create_atlas_texture(&mut self, image: &RgbaImage) -> Result<RgbaImage, Error> {
        Ok(image.clone())
    }

    fn submit_batch(&mut self, batch: &TileBatch, atlas: &RgbaImage) -> Result<(), Error> {
        for px in self.framebuffer.pixels_mut() {
            *px = self.clear_color;
        }

        for tri_pair in batch.indices.chunks_exact(6) {
            let mut lo = [f32::MAX; 2];
            let mut hi = [f32::MIN; 2];
            let mut uv_lo = [f32::MAX; 2];
            let mut uv_hi = [f32::MIN; 2];
            for &i in tri_pair {
                let (Some(p), Some(uv)) = (batch.positions.get(i as usize), batch.uvs.get(i as usize))
                else {
                    continue;
                };
                for k in 0..2 {
                    lo[k] = lo[k].min(p[k]);
                    hi[k] = hi[k].max(p[k]);
                    uv_lo[k] = uv_lo[k].min(uv[k]);
                    uv_hi[k] = uv_hi[k].max(uv[k]);
                }
            }
            self.fill_quad(atlas, [lo, hi], [uv_lo, uv_hi]);
        }

        self.draw_calls += 1;
        Ok(())
    }

    fn viewport(&self) -> Viewport {
        Viewport::new(self.framebuffer.width(), self.framebuffer.height())
            .with_scale_factor(self.scale_factor)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
