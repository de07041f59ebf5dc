//! Android glue for wallbridge: a JNI `WallpaperManager` and the native
//! methods the host plugin class binds to.

mod pixels;

#[cfg(target_os = "android")]
mod android_wallpaper;
#[cfg(target_os = "android")]
mod jni_exports;

pub use pixels::{exception_kind, premultiplied_rgba};

#[cfg(target_os = "android")]
pub use android_wallpaper::AndroidWallpaperManager;
