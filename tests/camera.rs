use std::f32::consts::{FRAC_PI_2, FRAC_PI_6, PI, TAU};
use std::rc::Rc;
use std::cell::RefCell;

use glam::Vec3;
use isotile::camera::{Camera, MAX_PITCH, basis};

fn assert_unit_and_perpendicular(yaw: f32, pitch: f32) {
    let (f, r) = basis(yaw, pitch);
    assert!((f.length() - 1.0).abs() < 1e-5, "forward not unit at yaw {yaw} pitch {pitch}");
    assert!((r.length() - 1.0).abs() < 1e-5, "right not unit at yaw {yaw} pitch {pitch}");
    assert!(f.dot(r).abs() < 1e-5, "not perpendicular at yaw {yaw} pitch {pitch}");
    assert!(r.y.abs() < 1e-6, "right leaves the horizontal plane at yaw {yaw}");
}

// ── Basis vectors ─────────────────────────────────────────────────────────

#[test]
fn basis_is_orthonormal_for_every_yaw() {
    for step in -64..=64 {
        let yaw = step as f32 * TAU / 32.0;
        for pitch in [0.0, 0.3, FRAC_PI_6, 1.2, MAX_PITCH] {
            assert_unit_and_perpendicular(yaw, pitch);
        }
    }
}

#[test]
fn basis_at_zero_yaw_and_pitch() {
    let (f, r) = basis(0.0, 0.0);
    assert!((f - Vec3::Z).length() < 1e-6);
    assert!((r - Vec3::X).length() < 1e-6);
}

#[test]
fn right_stays_continuous_when_looking_straight_down() {
    for yaw in [0.0, 0.5, PI, -2.0] {
        let (_, just_below) = basis(yaw, FRAC_PI_2 - 1e-3);
        let (_, at_limit) = basis(yaw, FRAC_PI_2);
        assert!((just_below - at_limit).length() < 1e-3, "yaw {yaw}");
    }
}

// ── Mutation & publication ────────────────────────────────────────────────

#[test]
fn rotate_publishes_forward_and_right_before_yaw() {
    let mut cam = Camera::new(Vec3::ZERO, 0.0, FRAC_PI_6);
    let log = Rc::new(RefCell::new(Vec::<&str>::new()));

    let l = Rc::clone(&log);
    let _y = cam.yaw_signal().subscribe(move |_| l.borrow_mut().push("yaw"));
    let l = Rc::clone(&log);
    let _f = cam.forward_signal().subscribe(move |_| l.borrow_mut().push("forward"));
    let l = Rc::clone(&log);
    let _r = cam.right_signal().subscribe(move |_| l.borrow_mut().push("right"));

    cam.rotate(0.25);
    assert_eq!(*log.borrow(), vec!["forward", "right", "yaw"]);
    assert_eq!(cam.yaw(), 0.25);
    assert_eq!((cam.forward(), cam.right()), basis(0.25, FRAC_PI_6));
}

#[test]
fn angle_listeners_see_the_new_basis() {
    let mut cam = Camera::new(Vec3::ZERO, 0.0, FRAC_PI_6);
    let latest_forward = Rc::new(RefCell::new(cam.forward()));
    let checks = Rc::new(RefCell::new(Vec::<bool>::new()));

    let f = Rc::clone(&latest_forward);
    let _f = cam.forward_signal().subscribe(move |v| *f.borrow_mut() = *v);

    let (f, c) = (Rc::clone(&latest_forward), Rc::clone(&checks));
    let _y = cam.yaw_signal().subscribe(move |yaw| {
        c.borrow_mut().push(*f.borrow() == basis(*yaw, FRAC_PI_6).0);
    });
    let (f, c) = (Rc::clone(&latest_forward), Rc::clone(&checks));
    let _p = cam.pitch_signal().subscribe(move |pitch| {
        c.borrow_mut().push(*f.borrow() == basis(1.0, *pitch).0);
    });

    cam.set_yaw(1.0);
    cam.set_pitch(0.4);
    cam.set_pitch(FRAC_PI_6);
    assert_eq!(*checks.borrow(), vec![true, true, true]);
}

#[test]
fn set_pitch_recomputes_basis_before_returning() {
    let mut cam = Camera::new(Vec3::ZERO, 1.0, 0.0);
    let seen = Rc::new(RefCell::new(Vec3::ZERO));
    let s = Rc::clone(&seen);
    let _sub = cam.forward_signal().subscribe(move |f| *s.borrow_mut() = *f);

    cam.set_pitch(0.8);
    assert_eq!(*seen.borrow(), basis(1.0, 0.8).0);
    assert_eq!(cam.forward(), basis(1.0, 0.8).0);
}

#[test]
fn set_pitch_does_not_clamp() {
    let mut cam = Camera::default();
    cam.set_pitch(3.0);
    assert_eq!(cam.pitch(), 3.0);
}

#[test]
fn move_by_adds_world_space_delta() {
    let mut cam = Camera::new(Vec3::new(1.0, 2.0, 3.0), 0.7, 0.2);
    cam.move_by(0.5, -1.0, 0.0);
    assert_eq!(cam.position(), Vec3::new(1.5, 1.0, 3.0));
}

#[test]
fn zoom_starts_at_one_and_is_replaced() {
    let mut cam = Camera::default();
    assert_eq!(cam.zoom(), 1.0);
    cam.set_zoom(2.5);
    assert_eq!(cam.zoom(), 2.5);
    assert_eq!(cam.zoom_signal().get(), 2.5);
}
