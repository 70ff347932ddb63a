use glam::Vec3;

use crate::signal::Signal;

/// World "up" used to derive the camera's right vector.
pub const WORLD_UP: Vec3 = Vec3::Y;

/// Lowest pitch callers may assign: looking level across the map.
pub const MIN_PITCH: f32 = 0.0;
/// Highest pitch callers may assign: looking straight down.
pub const MAX_PITCH: f32 = std::f32::consts::FRAC_PI_2;

/// Isometric camera: heading, tilt, zoom and a world position.
///
/// `position.x` / `position.y` are grid coordinates in tiles (the point the
/// camera is centred on); `position.z` is carried along but unused by the
/// projection.
///
/// Every field is published through a [`Signal`] so overlays can follow the
/// camera without polling. Mutating yaw or pitch recomputes `forward` and
/// `right` and publishes them first, then the angle itself, so a yaw or
/// pitch listener always fires after the matching basis is out.
///
/// The camera never clamps pitch itself; callers keep it inside
/// [`MIN_PITCH`]`..=`[`MAX_PITCH`].
pub struct Camera {
    position: Signal<Vec3>,
    yaw: Signal<f32>,
    pitch: Signal<f32>,
    zoom: Signal<f32>,
    forward: Signal<Vec3>,
    right: Signal<Vec3>,
}

impl Camera {
    pub fn new(position: Vec3, yaw: f32, pitch: f32) -> Self {
        let (forward, right) = basis(yaw, pitch);
        Self {
            position: Signal::new(position),
            yaw: Signal::new(yaw),
            pitch: Signal::new(pitch),
            zoom: Signal::new(1.0),
            forward: Signal::new(forward),
            right: Signal::new(right),
        }
    }

    // ── Accessors ──────────────────────────────────────────────────────────

    pub fn position(&self) -> Vec3 { self.position.get() }
    pub fn yaw(&self) -> f32 { self.yaw.get() }
    pub fn pitch(&self) -> f32 { self.pitch.get() }
    pub fn zoom(&self) -> f32 { self.zoom.get() }
    pub fn forward(&self) -> Vec3 { self.forward.get() }
    pub fn right(&self) -> Vec3 { self.right.get() }

    // ── Observables ────────────────────────────────────────────────────────

    pub fn position_signal(&self) -> &Signal<Vec3> { &self.position }
    pub fn yaw_signal(&self) -> &Signal<f32> { &self.yaw }
    pub fn pitch_signal(&self) -> &Signal<f32> { &self.pitch }
    pub fn zoom_signal(&self) -> &Signal<f32> { &self.zoom }
    pub fn forward_signal(&self) -> &Signal<Vec3> { &self.forward }
    pub fn right_signal(&self) -> &Signal<Vec3> { &self.right }

    // ── Mutation ───────────────────────────────────────────────────────────

    /// Translate in world space. Camera-relative movement is the caller's job
    /// (pre-multiply by `forward` / `right`).
    pub fn move_by(&mut self, dx: f32, dy: f32, dz: f32) {
        let p = self.position.get() + Vec3::new(dx, dy, dz);
        self.position.set(p);
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position.set(position);
    }

    pub fn rotate(&mut self, d_yaw: f32) {
        let yaw = self.yaw.get() + d_yaw;
        self.set_yaw(yaw);
    }

    pub fn set_yaw(&mut self, yaw: f32) {
        self.publish_basis(yaw, self.pitch.get());
        self.yaw.set(yaw);
    }

    /// Assign pitch as-is. See the type docs for the caller-side clamp.
    pub fn set_pitch(&mut self, pitch: f32) {
        self.publish_basis(self.yaw.get(), pitch);
        self.pitch.set(pitch);
    }

    pub fn set_zoom(&mut self, zoom: f32) {
        self.zoom.set(zoom);
    }

    fn publish_basis(&mut self, yaw: f32, pitch: f32) {
        let (forward, right) = basis(yaw, pitch);
        self.forward.set(forward);
        self.right.set(right);
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec3::ZERO, 0.0, 0.0)
    }
}

/// Forward and right vectors for a heading/tilt pair.
///
/// ```text
/// forward = (cos p · sin y, sin p, cos p · cos y)
/// right   = normalize(WORLD_UP × forward)
/// ```
/// Looking straight down makes the cross product vanish; `right` then takes
/// its limit `(cos y, 0, -sin y)`.
pub fn basis(yaw: f32, pitch: f32) -> (Vec3, Vec3) {
    let (sin_y, cos_y) = yaw.sin_cos();
    let (sin_p, cos_p) = pitch.sin_cos();
    let forward = Vec3::new(cos_p * sin_y, sin_p, cos_p * cos_y);
    let horizontal = WORLD_UP.cross(forward);
    // f32 cos(π/2) is a tiny negative number, which would flip the sign.
    let right = if horizontal.length_squared() > 1e-10 {
        horizontal.normalize()
    } else {
        Vec3::new(cos_y, 0.0, -sin_y)
    };
    (forward, right)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
