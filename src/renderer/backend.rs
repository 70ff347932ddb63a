use image::RgbaImage;

use super::batch::TileBatch;
use super::utils::Viewport;

/// Anything that can put a [`TileBatch`] on a surface.
///
/// Culling, projection and sorting are backend-agnostic; a backend only has
/// to accept the atlas once and then one batch per frame. Implementations
/// blend with `src-alpha, one-minus-src-alpha`.
pub trait DrawBackend {
    /// Backend-side handle to the uploaded atlas.
    type Texture;
    type Error: std::fmt::Display;

    /// Upload the atlas bitmap. Called before the first frame and again
    /// whenever the atlas is rebuilt.
    fn create_atlas_texture(&mut self, image: &RgbaImage) -> Result<Self::Texture, Self::Error>;

    /// Clear the target and draw the whole batch with a single draw call.
    fn submit_batch(&mut self, batch: &TileBatch, atlas: &Self::Texture) -> Result<(), Self::Error>;

    /// Current drawable size.
    fn viewport(&self) -> Viewport;
}
