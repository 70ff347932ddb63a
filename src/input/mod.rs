use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use glam::Vec2;
pub use winit::event::MouseButton;
pub use winit::keyboard::KeyCode;

use crate::camera::{Camera, MAX_PITCH, MIN_PITCH};

/// Multiplicative zoom change per Q/E press.
pub const ZOOM_STEP: f32 = 1.1;
pub const MIN_ZOOM: f32 = 0.25;
pub const MAX_ZOOM: f32 = 8.0;

/// Represents a raw input source that can be bound to an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputSource {
    Key(KeyCode),
    Mouse(MouseButton),
}

// ── InputState ────────────────────────────────────────────────────────────────

/// Raw hardware state for a single frame.
#[derive(Debug, Default)]
pub struct InputState {
    pub keys_held: HashSet<KeyCode>,
    pub keys_pressed: HashSet<KeyCode>,

    pub mouse_held: HashSet<MouseButton>,
    pub mouse_pressed: HashSet<MouseButton>,

    /// Raw pointer motion accumulated since the last frame, in pixels.
    /// Only collected while the pointer is grabbed.
    look_delta: [f32; 2],
    pointer_grabbed: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear_frame_state(&mut self) {
        self.keys_pressed.clear();
        self.mouse_pressed.clear();
        self.look_delta = [0.0, 0.0];
    }

    pub fn press_key(&mut self, key: KeyCode) {
        if self.keys_held.insert(key) {
            self.keys_pressed.insert(key);
        }
    }

    pub fn release_key(&mut self, key: KeyCode) {
        self.keys_held.remove(&key);
    }

    pub fn press_mouse(&mut self, button: MouseButton) {
        if self.mouse_held.insert(button) {
            self.mouse_pressed.insert(button);
        }
    }

    pub fn release_mouse(&mut self, button: MouseButton) {
        self.mouse_held.remove(&button);
    }

    pub fn add_pointer_motion(&mut self, dx: f32, dy: f32) {
        if self.pointer_grabbed {
            self.look_delta[0] += dx;
            self.look_delta[1] += dy;
        }
    }

    pub fn look_delta(&self) -> [f32; 2] { self.look_delta }

    pub fn pointer_grabbed(&self) -> bool { self.pointer_grabbed }

    pub fn set_pointer_grabbed(&mut self, grabbed: bool) {
        self.pointer_grabbed = grabbed;
        if !grabbed {
            self.look_delta = [0.0, 0.0];
        }
    }

    pub fn is_key_held(&self, key: KeyCode) -> bool { self.keys_held.contains(&key) }
    pub fn is_key_pressed(&self, key: KeyCode) -> bool { self.keys_pressed.contains(&key) }

    pub fn is_mouse_held(&self, button: MouseButton) -> bool { self.mouse_held.contains(&button) }
    pub fn is_mouse_pressed(&self, button: MouseButton) -> bool { self.mouse_pressed.contains(&button) }
}

// ── ActionMap ─────────────────────────────────────────────────────────────────

/// Maps logical actions to one or more physical inputs.
#[derive(Debug, Clone)]
pub struct ActionMap<A: Hash + Eq + Copy> {
    bindings: HashMap<A, Vec<InputSource>>,
}

impl<A: Hash + Eq + Copy> ActionMap<A> {
    pub fn new() -> Self {
        Self { bindings: HashMap::new() }
    }

    pub fn bind(&mut self, action: A, source: InputSource) {
        self.bindings.entry(action).or_default().push(source);
    }

    /// Returns true if the action was triggered this frame (pressed).
    pub fn is_pressed(&self, action: A, input: &InputState) -> bool {
        self.bindings.get(&action).is_some_and(|sources| {
            sources.iter().any(|s| match s {
                InputSource::Key(k) => input.is_key_pressed(*k),
                InputSource::Mouse(b) => input.is_mouse_pressed(*b),
            })
        })
    }

    /// Returns true if the action is currently being held.
    pub fn is_held(&self, action: A, input: &InputState) -> bool {
        self.bindings.get(&action).is_some_and(|sources| {
            sources.iter().any(|s| match s {
                InputSource::Key(k) => input.is_key_held(*k),
                InputSource::Mouse(b) => input.is_mouse_held(*b),
            })
        })
    }
}

impl<A: Hash + Eq + Copy> Default for ActionMap<A> {
    fn default() -> Self { Self::new() }
}

// ── Camera actions ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CameraAction {
    Forward,
    Back,
    Left,
    Right,
    ZoomIn,
    ZoomOut,
    /// Lock the pointer to the window so its motion steers the camera.
    GrabPointer,
    ReleasePointer,
}

/// WASD and arrow keys move, Q zooms in, E zooms out. Left click grabs the
/// pointer and Escape lets it go.
pub fn default_bindings() -> ActionMap<CameraAction> {
    let mut map = ActionMap::new();
    for (action, keys) in [
        (CameraAction::Forward, [KeyCode::KeyW, KeyCode::ArrowUp]),
        (CameraAction::Back, [KeyCode::KeyS, KeyCode::ArrowDown]),
        (CameraAction::Left, [KeyCode::KeyA, KeyCode::ArrowLeft]),
        (CameraAction::Right, [KeyCode::KeyD, KeyCode::ArrowRight]),
    ] {
        for key in keys {
            map.bind(action, InputSource::Key(key));
        }
    }
    map.bind(CameraAction::ZoomIn, InputSource::Key(KeyCode::KeyQ));
    map.bind(CameraAction::ZoomOut, InputSource::Key(KeyCode::KeyE));
    map.bind(CameraAction::GrabPointer, InputSource::Mouse(MouseButton::Left));
    map.bind(CameraAction::ReleasePointer, InputSource::Key(KeyCode::Escape));
    map
}

/// Held movement keys for one frame.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct MoveIntent {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
}

impl MoveIntent {
    pub fn from_input(bindings: &ActionMap<CameraAction>, input: &InputState) -> Self {
        Self {
            forward: bindings.is_held(CameraAction::Forward, input),
            back: bindings.is_held(CameraAction::Back, input),
            left: bindings.is_held(CameraAction::Left, input),
            right: bindings.is_held(CameraAction::Right, input),
        }
    }

    pub fn is_idle(&self) -> bool {
        self.forward == self.back && self.left == self.right
    }
}

// ── CameraController ──────────────────────────────────────────────────────────

/// Turns move intent, pointer deltas and zoom presses into camera mutations.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CameraController {
    /// Tiles per second.
    pub move_speed: f32,
    /// Radians per pixel.
    pub look_sensitivity: f32,
}

impl CameraController {
    pub fn new(move_speed: f32, look_sensitivity: f32) -> Self {
        Self { move_speed, look_sensitivity }
    }

    /// Apply everything the input layer gathered this frame.
    pub fn update(
        &self,
        camera: &mut Camera,
        bindings: &ActionMap<CameraAction>,
        input: &InputState,
        dt: f32,
    ) {
        let [dx, dy] = input.look_delta();
        if dx != 0.0 || dy != 0.0 {
            self.look(camera, dx, dy);
        }

        let intent = MoveIntent::from_input(bindings, input);
        if !intent.is_idle() {
            self.walk(camera, intent, dt);
        }

        let zoom_in = bindings.is_pressed(CameraAction::ZoomIn, input);
        let zoom_out = bindings.is_pressed(CameraAction::ZoomOut, input);
        if zoom_in != zoom_out {
            let factor = if zoom_in { ZOOM_STEP } else { 1.0 / ZOOM_STEP };
            zoom_by(camera, factor);
        }
    }

    /// Pointer moving right turns the map clockwise; moving up tilts toward
    /// a top-down view. Pitch is clamped here before it reaches the camera.
    pub fn look(&self, camera: &mut Camera, dx: f32, dy: f32) {
        camera.rotate(dx * self.look_sensitivity);
        let pitch = (camera.pitch() - dy * self.look_sensitivity).clamp(MIN_PITCH, MAX_PITCH);
        camera.set_pitch(pitch);
    }

    pub fn walk(&self, camera: &mut Camera, intent: MoveIntent, dt: f32) {
        let (forward, right) = ground_axes(camera);
        let mut dir = Vec2::ZERO;
        if intent.forward { dir += forward; }
        if intent.back { dir -= forward; }
        if intent.right { dir += right; }
        if intent.left { dir -= right; }

        let step = dir.normalize_or_zero() * self.move_speed * dt;
        if step != Vec2::ZERO {
            camera.move_by(step.x, step.y, 0.0);
        }
    }
}

/// Multiply zoom by `factor`, keeping it within [`MIN_ZOOM`, `MAX_ZOOM`].
pub fn zoom_by(camera: &mut Camera, factor: f32) {
    let zoom = (camera.zoom() * factor).clamp(MIN_ZOOM, MAX_ZOOM);
    camera.set_zoom(zoom);
}

/// Unit grid-plane directions for "into the screen" and "screen right".
///
/// `forward` points from the looked-at point toward the eye, so walking into
/// the screen goes against its ground projection. When the camera looks
/// straight down that projection vanishes and the yaw alone decides.
pub fn ground_axes(camera: &Camera) -> (Vec2, Vec2) {
    let f = camera.forward();
    let r = camera.right();
    let yaw = camera.yaw();

    let planar = Vec2::new(f.x, f.z);
    let forward = if planar.length_squared() > 1e-10 {
        -planar.normalize()
    } else {
        -Vec2::new(yaw.sin(), yaw.cos())
    };
    let right = Vec2::new(r.x, r.z).try_normalize().unwrap_or(Vec2::new(yaw.cos(), -yaw.sin()));
    (forward, right)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use std::f32::consts::{FRAC_PI_2, FRAC_PI_6};

    fn controller() -> CameraController {
        CameraController::new(8.0, 0.01)
    }

    #[test]
    fn press_is_reported_once_until_released() {
        let mut input = InputState::new();
        input.press_key(KeyCode::KeyW);
        input.press_key(KeyCode::KeyW);
        assert!(input.is_key_pressed(KeyCode::KeyW));
        input.clear_frame_state();
        input.press_key(KeyCode::KeyW);
        assert!(!input.is_key_pressed(KeyCode::KeyW));
        assert!(input.is_key_held(KeyCode::KeyW));
        input.release_key(KeyCode::KeyW);
        assert!(!input.is_key_held(KeyCode::KeyW));
        input.press_key(KeyCode::KeyW);
        assert!(input.is_key_pressed(KeyCode::KeyW));
    }

    #[test]
    fn left_click_and_escape_drive_pointer_grab() {
        let bindings = default_bindings();
        let mut input = InputState::new();
        input.press_mouse(MouseButton::Right);
        assert!(!bindings.is_pressed(CameraAction::GrabPointer, &input));

        input.press_mouse(MouseButton::Left);
        assert!(bindings.is_pressed(CameraAction::GrabPointer, &input));
        input.clear_frame_state();
        assert!(!bindings.is_pressed(CameraAction::GrabPointer, &input));
        assert!(bindings.is_held(CameraAction::GrabPointer, &input));
        input.release_mouse(MouseButton::Left);
        assert!(!bindings.is_held(CameraAction::GrabPointer, &input));

        input.press_key(KeyCode::Escape);
        assert!(bindings.is_pressed(CameraAction::ReleasePointer, &input));
    }

    #[test]
    fn pointer_motion_only_counts_while_grabbed() {
        let mut input = InputState::new();
        input.add_pointer_motion(5.0, 5.0);
        assert_eq!(input.look_delta(), [0.0, 0.0]);
        input.set_pointer_grabbed(true);
        input.add_pointer_motion(5.0, -2.0);
        input.add_pointer_motion(1.0, 1.0);
        assert_eq!(input.look_delta(), [6.0, -1.0]);
        input.set_pointer_grabbed(false);
        assert_eq!(input.look_delta(), [0.0, 0.0]);
    }

    #[test]
    fn arrows_and_wasd_share_actions() {
        let bindings = default_bindings();
        let mut input = InputState::new();
        input.press_key(KeyCode::ArrowUp);
        input.press_key(KeyCode::KeyD);
        let intent = MoveIntent::from_input(&bindings, &input);
        assert_eq!(intent, MoveIntent { forward: true, right: true, ..Default::default() });
    }

    #[test]
    fn pitch_is_clamped_to_quarter_turn() {
        let mut cam = Camera::new(Vec3::ZERO, 0.0, FRAC_PI_6);
        controller().look(&mut cam, 0.0, -10_000.0);
        assert_eq!(cam.pitch(), MAX_PITCH);
        controller().look(&mut cam, 0.0, 10_000.0);
        assert_eq!(cam.pitch(), MIN_PITCH);
    }

    #[test]
    fn pointer_right_increases_yaw() {
        let mut cam = Camera::default();
        controller().look(&mut cam, 10.0, 0.0);
        assert!((cam.yaw() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn walking_forward_at_zero_yaw_decreases_grid_y() {
        let mut cam = Camera::new(Vec3::new(5.0, 5.0, 0.0), 0.0, FRAC_PI_6);
        controller().walk(&mut cam, MoveIntent { forward: true, ..Default::default() }, 0.5);
        let p = cam.position();
        assert!((p.x - 5.0).abs() < 1e-5);
        assert!((p.y - 1.0).abs() < 1e-5, "y = {}", p.y);
    }

    #[test]
    fn ground_axes_survive_top_down_pitch() {
        for yaw in [0.0, 1.0, -2.5] {
            let cam = Camera::new(Vec3::ZERO, yaw, FRAC_PI_2);
            let (f, r) = ground_axes(&cam);
            assert!((f.length() - 1.0).abs() < 1e-5);
            assert!((r.length() - 1.0).abs() < 1e-5);
            assert!(f.dot(r).abs() < 1e-5);
            let expected = -Vec2::new(yaw.sin(), yaw.cos());
            assert!((f - expected).length() < 1e-4, "yaw {yaw}: {f:?}");
        }
    }

    #[test]
    fn zoom_steps_are_clamped() {
        let mut cam = Camera::default();
        for _ in 0..100 {
            zoom_by(&mut cam, ZOOM_STEP);
        }
        assert_eq!(cam.zoom(), MAX_ZOOM);
        for _ in 0..100 {
            zoom_by(&mut cam, 1.0 / ZOOM_STEP);
        }
        assert_eq!(cam.zoom(), MIN_ZOOM);
    }

    #[test]
    fn opposite_keys_cancel() {
        let bindings = default_bindings();
        let mut input = InputState::new();
        input.press_key(KeyCode::KeyW);
        input.press_key(KeyCode::KeyS);
        let mut cam = Camera::new(Vec3::new(1.0, 1.0, 0.0), 0.3, 0.4);
        controller().update(&mut cam, &bindings, &input, 1.0);
        assert_eq!(cam.position(), Vec3::new(1.0, 1.0, 0.0));
    }
}
