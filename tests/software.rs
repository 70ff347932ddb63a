use std::f32::consts::FRAC_PI_6;

use glam::Vec3;
use isotile::camera::Camera;
use isotile::config::RenderConfig;
use isotile::engine::{FrameDriver, Scene, render_snapshot};
use isotile::error::Error;
use isotile::map::palette::{Color, Palette};
use isotile::map::{Tile, TileMap};
use isotile::renderer::software::SoftwareBackend;

const ORANGE: Color = Color::rgb(255, 140, 0);

fn hash_scene() -> Scene {
    let palette = Palette::new(vec!['#'], vec![ORANGE]).unwrap();
    let rows = vec![vec![Tile::new('#', ORANGE, 0); 4]; 4];
    let map = TileMap::from_tiles(10, rows, palette).unwrap();
    Scene::new(map, Camera::new(Vec3::new(2.0, 2.0, 0.0), 0.0, FRAC_PI_6)).unwrap()
}

fn lit_pixels(image: &image::RgbaImage) -> usize {
    image.pixels().filter(|p| p.0 == [255, 140, 0, 255]).count()
}

// ── End-to-end frames ─────────────────────────────────────────────────────

#[test]
fn frame_draws_only_tile_colors_on_black() {
    let mut scene = hash_scene();
    let image = render_snapshot(&mut scene, 100, 100, 1.0).unwrap();

    assert_eq!(image.dimensions(), (100, 100));
    let mut lit = 0;
    for p in image.pixels() {
        match p.0 {
            [0, 0, 0, 255] => {}
            [255, 140, 0, 255] => lit += 1,
            other => panic!("unexpected pixel {other:?}"),
        }
    }
    assert!(lit > 0);
    // The map spans x 25..65, y 35..65 on screen; corners stay clear.
    assert_eq!(image.get_pixel(0, 0).0, [0, 0, 0, 255]);
    assert_eq!(image.get_pixel(99, 99).0, [0, 0, 0, 255]);
    assert_eq!(image.get_pixel(5, 50).0, [0, 0, 0, 255]);
}

#[test]
fn one_submit_per_frame() {
    let mut scene = hash_scene();
    let mut driver = FrameDriver::new(SoftwareBackend::new(100, 100), &scene).unwrap();
    for _ in 0..3 {
        let stats = driver.render_frame(&mut scene).unwrap();
        assert_eq!(stats.candidates, 16);
        assert_eq!(stats.missing_atlas, 0);
    }
    assert_eq!(driver.backend().draw_calls(), 3);
    assert_eq!(scene.batch().quad_count(), 16);
    assert_eq!(scene.batch().indices.len(), 16 * 6);
    assert_eq!(scene.visible_tiles_signal().get(), 16);
}

#[test]
fn moving_the_camera_changes_the_frame() {
    let mut scene = hash_scene();
    let first = render_snapshot(&mut scene, 100, 100, 1.0).unwrap();
    scene.camera.move_by(1.0, 0.0, 0.0);
    let second = render_snapshot(&mut scene, 100, 100, 1.0).unwrap();
    assert_ne!(first, second);
}

#[test]
fn snapshot_from_config_matches_window_size() {
    let config = RenderConfig {
        window_width: 160,
        window_height: 90,
        map_width: 32,
        map_height: 32,
        seed: Some(11),
        ..Default::default()
    };
    let mut a = Scene::from_config(&config).unwrap();
    let mut b = Scene::from_config(&config).unwrap();
    let img_a = render_snapshot(&mut a, config.window_width, config.window_height, 1.0).unwrap();
    let img_b = render_snapshot(&mut b, config.window_width, config.window_height, 1.0).unwrap();
    assert_eq!(img_a.dimensions(), (160, 90));
    assert_eq!(img_a, img_b);
}

#[test]
fn snapshot_scale_factor_enlarges_tiles() {
    let mut scene = hash_scene();
    let normal = render_snapshot(&mut scene, 100, 100, 1.0).unwrap();
    let hidpi = render_snapshot(&mut scene, 100, 100, 2.0).unwrap();
    // Twice the edge length, roughly four times the area.
    assert!(lit_pixels(&hidpi) > 3 * lit_pixels(&normal));
    assert_eq!(hidpi.get_pixel(0, 0).0, [0, 0, 0, 255]);
}

#[test]
fn snapshot_rejects_empty_or_oversized_frames() {
    let mut scene = hash_scene();
    assert!(matches!(render_snapshot(&mut scene, 0, 100, 1.0), Err(Error::Config(_))));
    assert!(matches!(render_snapshot(&mut scene, 100, 1 << 20, 1.0), Err(Error::Config(_))));
}
