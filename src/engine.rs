use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;

use glam::Vec3;
use image::RgbaImage;
use rand::SeedableRng;
use rand::rngs::StdRng;
use winit::application::ApplicationHandler;
use winit::event::{DeviceEvent, DeviceId, ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::PhysicalKey;
use winit::window::{CursorGrabMode, Window, WindowId};

use crate::camera::Camera;
use crate::config::RenderConfig;
use crate::error::{Error, Result};
use crate::input::{ActionMap, CameraAction, CameraController, InputState, default_bindings};
use crate::map::TileMap;
use crate::map::palette::Palette;
use crate::renderer::Renderer;
use crate::renderer::atlas::{Atlas, AtlasBuilder};
use crate::renderer::backend::DrawBackend;
use crate::renderer::batch::{TileBatch, depth_sort};
use crate::renderer::cull::{CullStats, TileInstance, cull_and_project};
use crate::renderer::software::SoftwareBackend;
use crate::renderer::utils::{MAX_TEXTURE_DIM, Viewport};
use crate::signal::{Signal, Subscription};

/// Longest frame step fed to the camera, in seconds. Keeps a stalled window
/// from teleporting the camera when it resumes.
pub const MAX_FRAME_DT: f32 = 0.25;

/// How often the FPS signal is refreshed, in seconds.
pub const FPS_WINDOW: f32 = 0.5;

// ── Scene ─────────────────────────────────────────────────────────────────────

/// Everything a frame is built from: camera, map, atlas and the per-frame
/// scratch buffers, plus the metrics the frame publishes.
///
/// There is no global state; the host owns one `Scene` and hands it to a
/// [`FrameDriver`] each frame.
pub struct Scene {
    pub camera: Camera,
    map: TileMap,
    atlas: Atlas,
    atlas_generation: u64,
    instances: Vec<TileInstance>,
    batch: TileBatch,
    visible_tiles: Signal<usize>,
    fps: Signal<f32>,
}

impl Scene {
    /// Build the atlas for `map`'s palette. Completes before any frame runs.
    pub fn new(map: TileMap, camera: Camera) -> Result<Self> {
        let atlas = AtlasBuilder::new(map.tile_size()).build(map.palette())?;
        log::info!(
            "atlas built: {}x{} px, {} entries",
            atlas.width(),
            atlas.height(),
            atlas.len()
        );
        Ok(Self {
            camera,
            map,
            atlas,
            atlas_generation: 0,
            instances: Vec::new(),
            batch: TileBatch::new(),
            visible_tiles: Signal::new(0),
            fps: Signal::new(0.0),
        })
    }

    /// Generate the map described by `config` and centre the camera on it.
    pub fn from_config(config: &RenderConfig) -> Result<Self> {
        config.validate()?;
        let palette = config.palette()?;
        let seed = config.seed.unwrap_or_else(rand::random);
        log::info!(
            "generating {}x{} map (seed {seed})",
            config.map_width,
            config.map_height
        );

        let mut rng = StdRng::seed_from_u64(seed);
        let map = TileMap::generate(
            config.tile_size,
            config.map_width,
            config.map_height,
            palette,
            &mut rng,
        )?;

        let centre = Vec3::new(config.map_width as f32 / 2.0, config.map_height as f32 / 2.0, 0.0);
        let camera = Camera::new(centre, 0.0, config.initial_pitch);
        Self::new(map, camera)
    }

    pub fn map(&self) -> &TileMap { &self.map }
    pub fn map_mut(&mut self) -> &mut TileMap { &mut self.map }
    pub fn atlas(&self) -> &Atlas { &self.atlas }
    pub fn batch(&self) -> &TileBatch { &self.batch }
    pub fn instances(&self) -> &[TileInstance] { &self.instances }

    /// Bumped every time the atlas is rebuilt.
    pub fn atlas_generation(&self) -> u64 { self.atlas_generation }

    pub fn visible_tiles_signal(&self) -> &Signal<usize> { &self.visible_tiles }
    pub fn fps_signal(&self) -> &Signal<f32> { &self.fps }

    /// Rasterize a new atlas for `palette`. The map keeps its tiles; any tile
    /// whose glyph or color is not in the new palette is skipped when drawn.
    /// On error the current atlas stays in place.
    pub fn rebuild_atlas(&mut self, palette: &Palette) -> Result<()> {
        self.atlas = AtlasBuilder::new(self.map.tile_size()).build(palette)?;
        self.atlas_generation += 1;
        log::debug!(
            "atlas rebuilt (generation {}): {} entries",
            self.atlas_generation,
            self.atlas.len()
        );
        Ok(())
    }

    /// Cull, project, sort and batch for `viewport`, then publish the visible
    /// tile count.
    pub fn prepare_frame(&mut self, viewport: &Viewport) -> CullStats {
        let stats = cull_and_project(
            &self.map,
            &self.camera,
            viewport,
            &self.atlas,
            &mut self.instances,
        );
        if stats.missing_atlas > 0 {
            log::debug!("{} tiles had no atlas entry", stats.missing_atlas);
        }
        depth_sort(&mut self.instances);
        self.batch.fill(&self.instances);
        self.visible_tiles.set(self.instances.len());
        stats
    }

    pub fn publish_fps(&self, fps: f32) {
        self.fps.set(fps);
    }
}

// ── FrameDriver ───────────────────────────────────────────────────────────────

/// Runs frames of a [`Scene`] against one draw backend.
///
/// Construction uploads the atlas, so a driver can never draw without one.
pub struct FrameDriver<B: DrawBackend> {
    backend: B,
    atlas_texture: B::Texture,
    atlas_generation: u64,
}

impl<B: DrawBackend> FrameDriver<B> {
    pub fn new(mut backend: B, scene: &Scene) -> std::result::Result<Self, B::Error> {
        let atlas_texture = backend.create_atlas_texture(scene.atlas().image())?;
        Ok(Self { backend, atlas_texture, atlas_generation: scene.atlas_generation() })
    }

    /// Draw one frame: re-upload the atlas if it changed, prepare the batch
    /// and submit it.
    pub fn render_frame(&mut self, scene: &mut Scene) -> std::result::Result<CullStats, B::Error> {
        if scene.atlas_generation() != self.atlas_generation {
            self.atlas_texture = self.backend.create_atlas_texture(scene.atlas().image())?;
            self.atlas_generation = scene.atlas_generation();
        }

        let viewport = self.backend.viewport();
        let stats = scene.prepare_frame(&viewport);
        self.backend.submit_batch(scene.batch(), &self.atlas_texture)?;
        Ok(stats)
    }

    pub fn backend(&self) -> &B { &self.backend }
    pub fn backend_mut(&mut self) -> &mut B { &mut self.backend }
    pub fn into_backend(self) -> B { self.backend }
}

/// Render a single frame on the CPU and return the pixels.
///
/// `width` and `height` are physical pixels; `scale_factor` is the device
/// pixel ratio the frame is drawn for.
pub fn render_snapshot(
    scene: &mut Scene,
    width: u32,
    height: u32,
    scale_factor: f32,
) -> Result<RgbaImage> {
    if width == 0 || height == 0 || width > MAX_TEXTURE_DIM || height > MAX_TEXTURE_DIM {
        return Err(Error::Config(format!(
            "snapshot size {width}x{height} must be within 1..={MAX_TEXTURE_DIM}"
        )));
    }
    let backend = SoftwareBackend::new(width, height).with_scale_factor(scale_factor);
    let mut driver = FrameDriver::new(backend, scene)?;
    let stats = driver.render_frame(scene)?;
    log::info!(
        "snapshot: {} visible of {} candidates",
        scene.instances().len(),
        stats.candidates
    );
    Ok(driver.into_backend().into_framebuffer())
}

// ── FpsMeter ──────────────────────────────────────────────────────────────────

/// Averages frame rate over [`FPS_WINDOW`]-long windows.
#[derive(Debug, Default)]
pub struct FpsMeter {
    frames: u32,
    elapsed: f32,
}

impl FpsMeter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one frame of `dt` seconds. Returns the average rate when a
    /// window has just closed.
    pub fn tick(&mut self, dt: f32) -> Option<f32> {
        self.frames += 1;
        self.elapsed += dt;
        if self.elapsed < FPS_WINDOW {
            return None;
        }
        let fps = self.frames as f32 / self.elapsed;
        self.frames = 0;
        self.elapsed = 0.0;
        Some(fps)
    }
}

// ── TitleOverlay ──────────────────────────────────────────────────────────────

/// Passive metrics readout in the window title, fed by the scene's signals.
pub struct TitleOverlay {
    visible: Subscription<usize>,
    fps: Subscription<f32>,
}

impl TitleOverlay {
    pub fn attach(scene: &Scene, window: Arc<Window>, title: &str) -> Self {
        let last_visible = Rc::new(Cell::new(0usize));

        let counter = Rc::clone(&last_visible);
        let visible = scene.visible_tiles_signal().subscribe(move |n| counter.set(*n));

        let title = title.to_string();
        let fps = scene.fps_signal().subscribe(move |fps| {
            window.set_title(&format!("{title} | {fps:.0} fps | {} tiles", last_visible.get()));
        });

        Self { visible, fps }
    }

    pub fn detach(self) {
        self.visible.unsubscribe();
        self.fps.unsubscribe();
    }
}

// ── EngineBuilder ─────────────────────────────────────────────────────────────

pub struct EngineBuilder {
    config: RenderConfig,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self { config: RenderConfig::default() }
    }
}

impl EngineBuilder {
    pub fn new() -> Self { Self::default() }
    pub fn from_config(config: RenderConfig) -> Self { Self { config } }
    pub fn with_title(mut self, title: &str) -> Self { self.config.title = title.into(); self }
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.config.window_width = width; self.config.window_height = height; self
    }
    pub fn with_seed(mut self, seed: u64) -> Self { self.config.seed = Some(seed); self }
    pub fn config(&self) -> &RenderConfig { &self.config }

    /// Generate the scene, open the window and run until it is closed.
    pub fn run(self) -> Result<()> {
        let scene = Scene::from_config(&self.config)?;
        let event_loop = EventLoop::new().map_err(|e| Error::EventLoop(e.to_string()))?;

        let mut app = App {
            controller: CameraController::new(self.config.move_speed, self.config.look_sensitivity),
            config: self.config,
            scene,
            driver: None,
            overlay: None,
            input: InputState::new(),
            bindings: default_bindings(),
            fps_meter: FpsMeter::new(),
            last_instant: None,
            error: None,
        };
        event_loop
            .run_app(&mut app)
            .map_err(|e| Error::EventLoop(e.to_string()))?;

        if let Some(overlay) = app.overlay.take() {
            overlay.detach();
        }
        match app.error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

// ── App (winit ApplicationHandler) ────────────────────────────────────────────

struct App {
    config: RenderConfig,
    scene: Scene,
    driver: Option<FrameDriver<Renderer>>,
    overlay: Option<TitleOverlay>,
    input: InputState,
    bindings: ActionMap<CameraAction>,
    controller: CameraController,
    fps_meter: FpsMeter,
    last_instant: Option<Instant>,
    /// Fatal error that stopped the loop, reported once `run_app` returns.
    error: Option<Error>,
}

impl App {
    fn fail(&mut self, event_loop: &ActiveEventLoop, err: Error) {
        log::error!("{err}");
        self.error = Some(err);
        event_loop.exit();
    }

    fn create_driver(&self, event_loop: &ActiveEventLoop) -> Result<FrameDriver<Renderer>> {
        let window = event_loop
            .create_window(
                Window::default_attributes()
                    .with_title(&self.config.title)
                    .with_inner_size(winit::dpi::PhysicalSize::new(
                        self.config.window_width,
                        self.config.window_height,
                    )),
            )
            .map_err(|e| Error::Window(e.to_string()))?;
        let renderer = pollster::block_on(Renderer::new(Arc::new(window)))?;
        FrameDriver::new(renderer, &self.scene)
    }

    fn grab_pointer(&mut self) {
        let Some(driver) = self.driver.as_ref() else { return };
        let window = &driver.backend().window;
        let grabbed = window
            .set_cursor_grab(CursorGrabMode::Locked)
            .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
        match grabbed {
            Ok(()) => {
                window.set_cursor_visible(false);
                self.input.set_pointer_grabbed(true);
            }
            Err(e) => log::warn!("pointer grab unavailable: {e}"),
        }
    }

    fn release_pointer(&mut self) {
        let Some(driver) = self.driver.as_ref() else { return };
        let window = &driver.backend().window;
        if let Err(e) = window.set_cursor_grab(CursorGrabMode::None) {
            log::warn!("pointer release failed: {e}");
        }
        window.set_cursor_visible(true);
        self.input.set_pointer_grabbed(false);
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        let dt = match self.last_instant {
            Some(prev) => now.duration_since(prev).as_secs_f32().min(MAX_FRAME_DT),
            None => 0.0,
        };
        self.last_instant = Some(now);

        if self.input.pointer_grabbed() {
            if self.bindings.is_pressed(CameraAction::ReleasePointer, &self.input) {
                self.release_pointer();
            }
        } else if self.bindings.is_pressed(CameraAction::GrabPointer, &self.input) {
            self.grab_pointer();
        }

        self.controller
            .update(&mut self.scene.camera, &self.bindings, &self.input, dt);
        self.input.clear_frame_state();

        let Some(driver) = self.driver.as_mut() else { return };
        if let Err(err) = driver.render_frame(&mut self.scene) {
            self.fail(event_loop, err);
            return;
        }

        if let Some(fps) = self.fps_meter.tick(dt) {
            self.scene.publish_fps(fps);
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.driver.is_some() {
            return;
        }
        match self.create_driver(event_loop) {
            Ok(driver) => {
                let window = Arc::clone(&driver.backend().window);
                self.overlay = Some(TitleOverlay::attach(&self.scene, window, &self.config.title));
                self.driver = Some(driver);
            }
            Err(err) => self.fail(event_loop, err),
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(driver) = self.driver.as_ref() {
            driver.backend().window.request_redraw();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),

            WindowEvent::Resized(size) => {
                if let Some(driver) = self.driver.as_mut() {
                    driver.backend_mut().resize(size);
                }
            }

            WindowEvent::Focused(false) => self.release_pointer(),

            WindowEvent::KeyboardInput {
                event: KeyEvent { physical_key: PhysicalKey::Code(code), state, repeat, .. },
                ..
            } => match state {
                ElementState::Pressed if !repeat => self.input.press_key(code),
                ElementState::Pressed => {}
                ElementState::Released => self.input.release_key(code),
            },

            WindowEvent::MouseInput { button, state, .. } => match state {
                ElementState::Pressed => self.input.press_mouse(button),
                ElementState::Released => self.input.release_mouse(button),
            },

            WindowEvent::RedrawRequested => self.redraw(event_loop),

            _ => {}
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _id: DeviceId, event: DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            self.input.add_pointer_motion(dx as f32, dy as f32);
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::Tile;
    use crate::map::palette::Color;

    struct RecordingBackend {
        uploads: usize,
        submitted_quads: Vec<usize>,
    }

    impl DrawBackend for RecordingBackend {
        type Texture = (u32, u32);
        type Error = Error;

        fn create_atlas_texture(&mut self, image: &RgbaImage) -> Result<(u32, u32)> {
            self.uploads += 1;
            Ok(image.dimensions())
        }

        fn submit_batch(&mut self, batch: &TileBatch, _atlas: &(u32, u32)) -> Result<()> {
            self.submitted_quads.push(batch.quad_count());
            Ok(())
        }

        fn viewport(&self) -> Viewport {
            Viewport::new(100, 100)
        }
    }

    fn small_scene() -> Scene {
        let palette = Palette::default();
        let color = palette.colors()[0];
        let rows = vec![vec![Tile::new('.', color, 0); 4]; 4];
        let map = TileMap::from_tiles(10, rows, palette).unwrap();
        Scene::new(map, Camera::new(Vec3::new(2.0, 2.0, 0.0), 0.0, std::f32::consts::FRAC_PI_6))
            .unwrap()
    }

    #[test]
    fn driver_uploads_atlas_once_until_rebuilt() {
        let mut scene = small_scene();
        let backend = RecordingBackend { uploads: 0, submitted_quads: vec![] };
        let mut driver = FrameDriver::new(backend, &scene).unwrap();
        driver.render_frame(&mut scene).unwrap();
        driver.render_frame(&mut scene).unwrap();
        assert_eq!(driver.backend().uploads, 1);

        let palette = scene.map().palette().clone();
        scene.rebuild_atlas(&palette).unwrap();
        driver.render_frame(&mut scene).unwrap();
        assert_eq!(driver.backend().uploads, 2);
        assert_eq!(driver.backend().submitted_quads, vec![16, 16, 16]);
    }

    #[test]
    fn visible_count_is_published_every_frame() {
        let mut scene = small_scene();
        let seen = Rc::new(Cell::new(0usize));
        let calls = Rc::new(Cell::new(0u32));
        let (s, c) = (Rc::clone(&seen), Rc::clone(&calls));
        let _sub = scene.visible_tiles_signal().subscribe(move |n| {
            s.set(*n);
            c.set(c.get() + 1);
        });
        let viewport = Viewport::new(100, 100);
        scene.prepare_frame(&viewport);
        scene.prepare_frame(&viewport);
        assert_eq!(seen.get(), 16);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn palette_swap_without_matching_tiles_skips_them() {
        let mut scene = small_scene();
        let other = Palette::new(vec!['#'], vec![Color::rgb(1, 2, 3)]).unwrap();
        scene.rebuild_atlas(&other).unwrap();
        let stats = scene.prepare_frame(&Viewport::new(100, 100));
        assert_eq!(stats.missing_atlas, 16);
        assert!(scene.batch().is_empty());
    }

    #[test]
    fn fps_meter_reports_once_per_window() {
        let mut meter = FpsMeter::new();
        let mut reports = Vec::new();
        for _ in 0..16 {
            if let Some(fps) = meter.tick(0.125) {
                reports.push(fps);
            }
        }
        assert_eq!(reports, vec![8.0; 4]);
    }

    #[test]
    fn scene_from_config_centres_camera() {
        let cfg = RenderConfig { map_width: 10, map_height: 6, seed: Some(1), ..Default::default() };
        let scene = Scene::from_config(&cfg).unwrap();
        assert_eq!(scene.camera.position(), Vec3::new(5.0, 3.0, 0.0));
        assert_eq!(scene.camera.pitch(), cfg.initial_pitch);
        assert_eq!(scene.atlas().len(), 20);
    }
}
