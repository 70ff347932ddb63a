use thiserror::Error;

/// Errors raised while setting up or driving the tile renderer.
///
/// Per-frame problems that only affect a single tile (a missing atlas entry,
/// say) are never reported here; those tiles are skipped instead.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("invalid color {0:?}: expected #RRGGBB or #RRGGBBAA")]
    InvalidColor(String),

    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no drawable surface: {0}")]
    Surface(String),

    #[error("no suitable GPU adapter found: {0}")]
    Adapter(String),

    #[error("failed to create GPU device: {0}")]
    Device(String),

    #[error("window creation failed: {0}")]
    Window(String),

    #[error("event loop failed: {0}")]
    EventLoop(String),

    #[error("failed to write snapshot: {0}")]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, Error>;
