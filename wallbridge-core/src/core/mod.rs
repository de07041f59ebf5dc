pub mod channel;
pub mod conf;
pub mod destination;
pub mod error;
pub mod scale;
pub mod wallpaper;

#[cfg(all(not(target_os = "android"), not(target_arch = "wasm32")))]
pub mod desktop;
