use std::io::Write;

use isotile::config::RenderConfig;
use isotile::engine::Scene;
use isotile::error::Error;
use isotile::map::palette::Color;

fn temp_file(name: &str, contents: &str) -> std::path::PathBuf {
    let path = std::env::temp_dir().join(format!("isotile-{}-{name}", std::process::id()));
    let mut f = std::fs::File::create(&path).unwrap();
    f.write_all(contents.as_bytes()).unwrap();
    path
}

#[test]
fn load_reads_overrides_from_disk() {
    let path = temp_file(
        "ok.json",
        r##"{ "tile_size": 8, "glyph_palette": ["#", "~"], "color_palette": ["#102030", "#40506080"] }"##,
    );
    let cfg = RenderConfig::load(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(cfg.tile_size, 8);
    let palette = cfg.palette().unwrap();
    assert_eq!(palette.glyphs(), &['#', '~']);
    assert_eq!(palette.colors(), &[Color([0x10, 0x20, 0x30, 255]), Color([0x40, 0x50, 0x60, 0x80])]);
}

#[test]
fn missing_file_is_an_io_error() {
    let err = RenderConfig::load("/definitely/not/here.json").unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn empty_palette_is_rejected() {
    let err = RenderConfig::from_json_str(r#"{ "glyph_palette": [] }"#).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn duplicate_colors_are_rejected() {
    let err =
        RenderConfig::from_json_str(r##"{ "color_palette": ["#FFFFFF", "ffffff"] }"##).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn zero_map_dimension_is_rejected() {
    let err = RenderConfig::from_json_str(r#"{ "map_width": 0 }"#).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn pitch_outside_quarter_turn_is_rejected() {
    assert!(RenderConfig::from_json_str(r#"{ "initial_pitch": 2.0 }"#).is_err());
    assert!(RenderConfig::from_json_str(r#"{ "initial_pitch": -0.1 }"#).is_err());
}

#[test]
fn huge_tile_size_is_rejected_before_the_atlas_is_built() {
    let cfg = RenderConfig { tile_size: 1 << 30, map_width: 2, map_height: 2, ..Default::default() };
    assert!(matches!(cfg.validate(), Err(Error::Config(_))));
    assert!(matches!(Scene::from_config(&cfg), Err(Error::Config(_))));

    let err = RenderConfig::from_json_str(r#"{ "tile_size": 4000000000 }"#).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn oversized_map_and_window_are_rejected() {
    let wide = RenderConfig { map_width: u32::MAX, map_height: u32::MAX, ..Default::default() };
    assert!(matches!(wide.validate(), Err(Error::Config(_))));
    assert!(matches!(Scene::from_config(&wide), Err(Error::Config(_))));

    let edge = RenderConfig { map_width: 4096, map_height: 4096, ..Default::default() };
    assert!(edge.validate().is_ok());
    let over = RenderConfig { map_width: 4097, map_height: 4096, ..Default::default() };
    assert!(over.validate().is_err());

    let window = RenderConfig { window_width: 100_000, ..Default::default() };
    assert!(matches!(window.validate(), Err(Error::Config(_))));
}
