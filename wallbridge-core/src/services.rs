// Platform service traits for dependency injection
use image::RgbaImage;
use std::io;

use crate::core::destination::WallpaperDestination;

/// What the platform's wallpaper service can do, resolved once when the
/// plugin is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlatformCapabilities {
    /// The platform accepts a destination flag and returns a status code.
    /// Older platforms only take the bitmap.
    pub supports_destination_flag: bool,
}

/// Handle to the host's wallpaper-management service.
///
/// Every operation takes one of these explicitly; nothing in this crate looks
/// a platform manager up on its own.
pub trait WallpaperManager {
    fn capabilities(&self) -> PlatformCapabilities;

    /// Human readable host OS version.
    fn platform_version(&self) -> String;

    fn desired_minimum_width(&self) -> i32;

    fn desired_minimum_height(&self) -> i32;

    /// Apply `image` to `destination`, returning the platform's status.
    fn set_bitmap(&self, image: &RgbaImage, destination: WallpaperDestination) -> io::Result<i32>;

    /// Apply `image` on platforms without destination support.
    fn set_bitmap_legacy(&self, image: &RgbaImage) -> io::Result<()>;

    /// Remove the current wallpaper, reverting to the platform default.
    fn clear(&self) -> io::Result<()>;
}

impl<T: WallpaperManager + ?Sized> WallpaperManager for &T {
    fn capabilities(&self) -> PlatformCapabilities {
        (**self).capabilities()
    }

    fn platform_version(&self) -> String {
        (**self).platform_version()
    }

    fn desired_minimum_width(&self) -> i32 {
        (**self).desired_minimum_width()
    }

    fn desired_minimum_height(&self) -> i32 {
        (**self).desired_minimum_height()
    }

    fn set_bitmap(&self, image: &RgbaImage, destination: WallpaperDestination) -> io::Result<i32> {
        (**self).set_bitmap(image, destination)
    }

    fn set_bitmap_legacy(&self, image: &RgbaImage) -> io::Result<()> {
        (**self).set_bitmap_legacy(image)
    }

    fn clear(&self) -> io::Result<()> {
        (**self).clear()
    }
}

impl<T: WallpaperManager + ?Sized> WallpaperManager for Box<T> {
    fn capabilities(&self) -> PlatformCapabilities {
        (**self).capabilities()
    }

    fn platform_version(&self) -> String {
        (**self).platform_version()
    }

    fn desired_minimum_width(&self) -> i32 {
        (**self).desired_minimum_width()
    }

    fn desired_minimum_height(&self) -> i32 {
        (**self).desired_minimum_height()
    }

    fn set_bitmap(&self, image: &RgbaImage, destination: WallpaperDestination) -> io::Result<i32> {
        (**self).set_bitmap(image, destination)
    }

    fn set_bitmap_legacy(&self, image: &RgbaImage) -> io::Result<()> {
        (**self).set_bitmap_legacy(image)
    }

    fn clear(&self) -> io::Result<()> {
        (**self).clear()
    }
}

/// Stand-in used where no wallpaper service exists (wasm, unit tests of
/// the channel layer). Every mutation fails with `Unsupported`.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedWallpaperManager;

impl WallpaperManager for UnsupportedWallpaperManager {
    fn capabilities(&self) -> PlatformCapabilities {
        PlatformCapabilities::default()
    }

    fn platform_version(&self) -> String {
        format!("{} {}", std::env::consts::OS, std::env::consts::ARCH)
    }

    fn desired_minimum_width(&self) -> i32 {
        0
    }

    fn desired_minimum_height(&self) -> i32 {
        0
    }

    fn set_bitmap(&self, _image: &RgbaImage, _destination: WallpaperDestination) -> io::Result<i32> {
        Err(unsupported())
    }

    fn set_bitmap_legacy(&self, _image: &RgbaImage) -> io::Result<()> {
        Err(unsupported())
    }

    fn clear(&self) -> io::Result<()> {
        Err(unsupported())
    }
}

fn unsupported() -> io::Error {
    io::Error::new(io::ErrorKind::Unsupported, "Wallpaper setting not supported on this platform")
}
