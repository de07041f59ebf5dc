use image::imageops::FilterType;
use image::{DynamicImage, ImageReader, RgbaImage};
use log::{debug, error, info, warn};
use std::path::Path;

use super::destination::WallpaperDestination;
use super::error::{Result, WallpaperError};
use super::scale::{fit_to_cover, TargetSize};
use crate::services::{PlatformCapabilities, WallpaperManager};

pub const STATUS_SUCCESS: i32 = 1;
pub const STATUS_FAILURE: i32 = -1;

/// Decodes `path` into an owned raster. The format is sniffed from content,
/// not the extension.
pub fn decode_image(path: &Path) -> Result<DynamicImage> {
    let open_err = |source: std::io::Error| WallpaperError::Open {
        path: path.to_path_buf(),
        source,
    };
    let image = ImageReader::open(path)
        .map_err(open_err)?
        .with_guessed_format()
        .map_err(open_err)?
        .decode()
        .map_err(|source| WallpaperError::Decode {
            path: path.to_path_buf(),
            source,
        })?;

    if image.width() == 0 || image.height() == 0 {
        return Err(WallpaperError::EmptyImage);
    }
    Ok(image)
}

/// The wallpaper operations, bound to one platform manager.
///
/// Capabilities are read from the manager once, here, and every apply
/// branches on that snapshot.
pub struct WallpaperOps<M> {
    manager: M,
    capabilities: PlatformCapabilities,
    filter: FilterType,
}

impl<M: WallpaperManager> WallpaperOps<M> {
    pub fn new(manager: M, filter: FilterType) -> Self {
        let capabilities = manager.capabilities();
        info!(
            "Wallpaper manager ready (destination flag supported: {})",
            capabilities.supports_destination_flag
        );
        Self {
            manager,
            capabilities,
            filter,
        }
    }

    pub fn platform_version(&self) -> String {
        self.manager.platform_version()
    }

    pub fn desired_minimum_width(&self) -> i32 {
        self.manager.desired_minimum_width()
    }

    pub fn desired_minimum_height(&self) -> i32 {
        self.manager.desired_minimum_height()
    }

    /// Decodes, cover-fits and applies the image at `path`.
    ///
    /// Returns `1` on success and `-1` on any failure.
    pub fn set_wallpaper_from_file(&self, path: &Path, destination: WallpaperDestination) -> i32 {
        match self.try_set_wallpaper_from_file(path, destination) {
            Ok(()) => {
                info!("Wallpaper set from {:?} ({})", path, destination);
                STATUS_SUCCESS
            }
            Err(e) => {
                error!("Failed to set wallpaper from {:?}: {}", path, e);
                STATUS_FAILURE
            }
        }
    }

    pub fn try_set_wallpaper_from_file(&self, path: &Path, destination: WallpaperDestination) -> Result<()> {
        let scaled = {
            let original = decode_image(path)?;
            let target = TargetSize::from_platform(
                self.manager.desired_minimum_width(),
                self.manager.desired_minimum_height(),
                (original.width(), original.height()),
            )?;
            fit_to_cover(&original, target, self.filter)?
        };
        self.apply(&scaled, destination)
    }

    /// Hands an already scaled image to the platform.
    pub fn apply(&self, scaled: &RgbaImage, destination: WallpaperDestination) -> Result<()> {
        if self.capabilities.supports_destination_flag {
            let status = self.manager.set_bitmap(scaled, destination)?;
            if status > 0 {
                debug!("Platform accepted wallpaper with status {}", status);
                Ok(())
            } else {
                Err(WallpaperError::Status(status))
            }
        } else {
            if destination != WallpaperDestination::default() {
                debug!("Platform has no destination support, ignoring {}", destination);
            }
            self.manager.set_bitmap_legacy(scaled)?;
            Ok(())
        }
    }

    /// Single attempt; `false` when the platform raises an I/O error.
    pub fn clear_wallpaper(&self) -> bool {
        match self.manager.clear() {
            Ok(()) => {
                info!("Wallpaper cleared");
                true
            }
            Err(e) => {
                warn!("Failed to clear wallpaper: {}", e);
                false
            }
        }
    }
}
