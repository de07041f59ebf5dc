use std::io;
use std::path::PathBuf;

/// Failures inside the wallpaper operations.
///
/// None of these cross the method channel as-is: the operations collapse them
/// into `-1` / `false` after logging.
#[derive(Debug, thiserror::Error)]
pub enum WallpaperError {
    #[error("failed to decode image {path:?}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to open image {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("image has no pixels")]
    EmptyImage,

    #[error("invalid target size {width}x{height}")]
    InvalidTarget { width: u32, height: u32 },

    #[error("scaled image {width}x{height} exceeds the {limit} byte allocation limit")]
    TooLarge { width: u32, height: u32, limit: u64 },

    #[error("platform rejected wallpaper: {0}")]
    Apply(#[from] io::Error),

    #[error("platform reported failure status {0}")]
    Status(i32),
}

pub type Result<T> = std::result::Result<T, WallpaperError>;
