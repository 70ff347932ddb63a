pub mod camera;
pub mod config;
pub mod engine;
pub mod error;
pub mod input;
pub mod map;
pub mod renderer;
pub mod signal;

pub use camera::Camera;
pub use config::RenderConfig;
pub use engine::{EngineBuilder, FrameDriver, Scene};
pub use error::{Error, Result};
pub use map::{Color, Palette, Tile, TileMap};
pub use signal::Signal;
