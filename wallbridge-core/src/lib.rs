//! Native wallpaper bridge.
//!
//! Hosts talk to [`WallpaperPlugin`] through JSON method calls; the plugin
//! cover-fits images and hands them to an injected [`WallpaperManager`].

pub mod core;
pub mod services;

pub use crate::core::channel::{set_wallpaper_call, Method, MethodCall, MethodResponse, WallpaperPlugin};
pub use crate::core::conf::{Conf, ResampleFilter};
pub use crate::core::destination::WallpaperDestination;
pub use crate::core::error::{Result, WallpaperError};
pub use crate::core::scale::{cover_size, fit_to_cover, ScaleFactor, TargetSize};
pub use crate::core::wallpaper::{decode_image, WallpaperOps, STATUS_FAILURE, STATUS_SUCCESS};
pub use crate::services::{PlatformCapabilities, UnsupportedWallpaperManager, WallpaperManager};

#[cfg(all(not(target_os = "android"), not(target_arch = "wasm32")))]
pub use crate::core::desktop::{get_desktop_environment, DesktopWallpaperManager};
