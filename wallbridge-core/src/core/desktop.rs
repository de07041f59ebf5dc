use chrono::Utc;
use image::RgbaImage;
use log::{debug, info, warn};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use super::conf::Conf;
use super::destination::WallpaperDestination;
use crate::services::{PlatformCapabilities, WallpaperManager};

const SCALED_PREFIX: &str = "wallbridge-";

pub fn get_desktop_environment() -> String {
    if let Ok(desktop_session) = std::env::var("DESKTOP_SESSION") {
        let session = desktop_session.to_lowercase();
        if ["gnome", "unity", "cinnamon", "mate", "xfce4", "lxde", "fluxbox",
            "blackbox", "openbox", "icewm", "jwm", "afterstep", "trinity", "kde"].contains(&session.as_str()) {
            return session;
        }

        if session.contains("xfce") || session.starts_with("xubuntu") {
            return "xfce4".to_string();
        } else if session.starts_with("ubuntustudio") || session.starts_with("kubuntu") {
            return "kde".to_string();
        } else if session.starts_with("ubuntu") {
            return "gnome".to_string();
        } else if session.starts_with("lubuntu") {
            return "lxde".to_string();
        }
    }

    if std::env::var("KDE_FULL_SESSION").unwrap_or_default() == "true" {
        return "kde".to_string();
    }

    if std::env::var("GNOME_DESKTOP_SESSION_ID").is_ok() {
        return "gnome".to_string();
    }

    "unknown".to_string()
}

/// Wallpaper sink for desktop hosts.
///
/// Scaled images are written to the cache dir and applied by path. Desktops
/// have no home/lock split, so this always takes the legacy path.
pub struct DesktopWallpaperManager {
    conf: Conf,
}

impl DesktopWallpaperManager {
    pub fn new(conf: Conf) -> Self {
        Self { conf }
    }

    pub fn conf(&self) -> &Conf {
        &self.conf
    }

    fn write_scaled(&self, image: &RgbaImage) -> io::Result<PathBuf> {
        fs::create_dir_all(&self.conf.cache_dir)?;
        self.remove_stale_images();

        let file_name = format!("{}{}.png", SCALED_PREFIX, Utc::now().format("%Y%m%d%H%M%S%3f"));
        let path = self.conf.cache_dir.join(file_name);
        image
            .save(&path)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("Failed to write {:?}: {}", path, e)))?;
        debug!("Wrote scaled wallpaper {}x{} to {:?}", image.width(), image.height(), path);
        Ok(path)
    }

    // Some desktops cache by path, so every apply gets a fresh file name and
    // the previous ones are dropped here.
    fn remove_stale_images(&self) {
        let Ok(entries) = fs::read_dir(&self.conf.cache_dir) else {
            return;
        };
        for path in entries.filter_map(|entry| entry.ok()).map(|entry| entry.path()) {
            let is_ours = path
                .file_name()
                .and_then(|name| name.to_str())
                .map(|name| name.starts_with(SCALED_PREFIX) && name.ends_with(".png"))
                .unwrap_or(false);
            if is_ours {
                if let Err(e) = fs::remove_file(&path) {
                    warn!("Failed to remove stale wallpaper {:?}: {}", path, e);
                }
            }
        }
    }
}

impl WallpaperManager for DesktopWallpaperManager {
    fn capabilities(&self) -> PlatformCapabilities {
        PlatformCapabilities {
            supports_destination_flag: false,
        }
    }

    fn platform_version(&self) -> String {
        format!("{} {}", std::env::consts::OS, std::env::consts::ARCH)
    }

    fn desired_minimum_width(&self) -> i32 {
        i32::try_from(self.conf.desired_width).unwrap_or(i32::MAX)
    }

    fn desired_minimum_height(&self) -> i32 {
        i32::try_from(self.conf.desired_height).unwrap_or(i32::MAX)
    }

    fn set_bitmap(&self, image: &RgbaImage, _destination: WallpaperDestination) -> io::Result<i32> {
        self.set_bitmap_legacy(image).map(|()| 1)
    }

    fn set_bitmap_legacy(&self, image: &RgbaImage) -> io::Result<()> {
        let path = self.write_scaled(image)?;
        set_wallpaper_path(&path)
    }

    fn clear(&self) -> io::Result<()> {
        match &self.conf.clear_to {
            Some(path) => set_wallpaper_path(path),
            None => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "No clear_to wallpaper configured for this desktop",
            )),
        }
    }
}

fn set_wallpaper_path(path: &Path) -> io::Result<()> {
    let file_loc = path.to_string_lossy();

    match ::wallpaper::set_from_path(&file_loc) {
        Ok(_) => {
            if let Err(e) = ::wallpaper::set_mode(::wallpaper::Mode::Crop) {
                debug!("Desktop ignored crop mode: {}", e);
            }
            info!("Wallpaper set successfully to: {}", file_loc);
            Ok(())
        }
        Err(e) => {
            warn!("Failed to set wallpaper through desktop API: {}", e);

            if cfg!(target_os = "linux") && set_wallpaper_linux_fallback(path)? {
                return Ok(());
            }
            Err(io::Error::new(io::ErrorKind::Other, e.to_string()))
        }
    }
}

fn set_wallpaper_linux_fallback(file_path: &Path) -> io::Result<bool> {
    let file_loc = file_path.to_string_lossy();
    let desktop_env = get_desktop_environment();
    debug!("Falling back to {} wallpaper tooling", desktop_env);

    match desktop_env.as_str() {
        "gnome" | "unity" | "cinnamon" => {
            let uri = format!("file://{}", file_loc);
            let output = Command::new("gsettings")
                .args(["set", "org.gnome.desktop.background", "picture-uri", &uri])
                .output()?;
            // Dark-style desktops read a separate key; older versions lack it.
            let _ = Command::new("gsettings")
                .args(["set", "org.gnome.desktop.background", "picture-uri-dark", &uri])
                .output();
            Ok(output.status.success())
        }
        "mate" => {
            let output = Command::new("gsettings")
                .args(["set", "org.mate.background", "picture-filename", &file_loc])
                .output()?;
            Ok(output.status.success())
        }
        "xfce4" => {
            let list_output = Command::new("xfconf-query")
                .args(["-c", "xfce4-desktop", "-l"])
                .output()?;

            if list_output.status.success() {
                let paths = String::from_utf8_lossy(&list_output.stdout);
                for path in paths.lines().filter(|line| line.contains("workspace0/last-image")) {
                    Command::new("xfconf-query")
                        .args(["-c", "xfce4-desktop", "-p", path.trim(), "-s", &file_loc])
                        .output()?;
                }
            }

            let output = Command::new("xfdesktop").arg("--reload").output()?;
            Ok(output.status.success())
        }
        "lxde" => {
            let output = Command::new("pcmanfm")
                .arg(format!("--set-wallpaper={}", file_loc))
                .arg("--wallpaper-mode=crop")
                .output()?;
            Ok(output.status.success())
        }
        "fluxbox" | "jwm" | "openbox" | "afterstep" => {
            let output = Command::new("fbsetbg").arg(file_loc.as_ref()).output()?;
            Ok(output.status.success())
        }
        "icewm" => {
            let output = Command::new("icewmbg").arg(file_loc.as_ref()).output()?;
            Ok(output.status.success())
        }
        "blackbox" => {
            let output = Command::new("bsetbg").args(["-full", &file_loc]).output()?;
            Ok(output.status.success())
        }
        _ => {
            warn!("Desktop environment '{}' not supported", desktop_env);
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager(cache_dir: &Path) -> DesktopWallpaperManager {
        DesktopWallpaperManager::new(Conf {
            cache_dir: cache_dir.to_path_buf(),
            desired_width: 2560,
            desired_height: 1440,
            ..Conf::default()
        })
    }

    #[test]
    fn reports_configured_size_and_legacy_path() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager(dir.path());
        assert_eq!(manager.desired_minimum_width(), 2560);
        assert_eq!(manager.desired_minimum_height(), 1440);
        assert!(!manager.capabilities().supports_destination_flag);
    }

    #[test]
    fn clear_without_fallback_image_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = manager(dir.path()).clear().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Unsupported);
    }

    #[test]
    fn scaled_images_replace_each_other() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager(dir.path());
        fs::write(dir.path().join("wallbridge-old.png"), b"stale").unwrap();
        fs::write(dir.path().join("keep.txt"), b"unrelated").unwrap();

        let path = manager.write_scaled(&RgbaImage::new(4, 4)).unwrap();

        let mut names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names.len(), 2);
        assert!(names.contains(&"keep.txt".to_string()));
        assert_eq!(image::open(&path).unwrap().width(), 4);
    }
}
