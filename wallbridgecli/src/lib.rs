pub use crate::app::{parse_size, WallbridgeCliApp};

mod app {
    use anyhow::{anyhow, Context, Result};
    use log::{info, warn};
    use serde_json::Value;
    use std::io::{self, Write};
    use std::path::Path;
    use wallbridge_core::*;

    /// Parses `1920x1080` (also `1920X1080`, `1920*1080`).
    pub fn parse_size(s: &str) -> Result<TargetSize> {
        let (w, h) = s
            .split_once(['x', 'X', '*'])
            .ok_or_else(|| anyhow!("expected WIDTHxHEIGHT, got {:?}", s))?;
        let width = w.trim().parse().with_context(|| format!("bad width in {:?}", s))?;
        let height = h.trim().parse().with_context(|| format!("bad height in {:?}", s))?;
        Ok(TargetSize::new(width, height)?)
    }

    pub struct WallbridgeCliApp<M: WallpaperManager> {
        plugin: WallpaperPlugin<M>,
        conf: Conf,
    }

    impl WallbridgeCliApp<DesktopWallpaperManager> {
        pub fn new(conf: Conf) -> Self {
            let manager = DesktopWallpaperManager::new(conf.clone());
            Self::with_manager(manager, conf)
        }
    }

    impl<M: WallpaperManager> WallbridgeCliApp<M> {
        pub fn with_manager(manager: M, conf: Conf) -> Self {
            let plugin = WallpaperPlugin::new(manager, &conf);
            Self { plugin, conf }
        }

        fn call(&self, method: Method) -> MethodResponse {
            self.plugin.handle(&MethodCall::without_args(method.name()))
        }

        pub fn platform_version(&self) -> Result<String> {
            match self.call(Method::GetPlatformVersion) {
                MethodResponse::Success { value: Value::String(version) } => Ok(version),
                other => Err(anyhow!("unexpected response {:?}", other)),
            }
        }

        pub fn desired_size(&self) -> Result<(i64, i64)> {
            let width = expect_int(self.call(Method::GetDesiredMinimumWidth))?;
            let height = expect_int(self.call(Method::GetDesiredMinimumHeight))?;
            Ok((width, height))
        }

        /// Returns the channel status, `1` or `-1`.
        pub fn set_wallpaper(&self, path: &Path, destination: WallpaperDestination) -> Result<i64> {
            expect_int(self.plugin.handle(&set_wallpaper_call(path, destination)))
        }

        pub fn clear_wallpaper(&self) -> Result<bool> {
            match self.call(Method::ClearWallpaper) {
                MethodResponse::Success { value: Value::Bool(cleared) } => Ok(cleared),
                other => Err(anyhow!("unexpected response {:?}", other)),
            }
        }

        /// Cover-fits `input` to `size` and writes the result to `output`
        /// without touching the wallpaper.
        pub fn fit_to_file(&self, input: &Path, output: &Path, size: TargetSize) -> Result<(u32, u32)> {
            let scaled = {
                let original = decode_image(input)?;
                fit_to_cover(&original, size, self.conf.filter_type())?
            };
            scaled
                .save(output)
                .with_context(|| format!("Failed to write {:?}", output))?;
            Ok(scaled.dimensions())
        }

        /// Raw envelope round trip.
        pub fn call_raw(&self, method: &str, arguments: Option<&str>) -> Result<String> {
            let arguments = match arguments {
                Some(json) => serde_json::from_str(json).context("arguments must be JSON")?,
                None => Value::Null,
            };
            let request = serde_json::to_string(&MethodCall::new(method, arguments))?;
            info!("Sending {}", request);
            Ok(self.plugin.handle_json(&request))
        }

        fn show_menu(&self) {
            let version = self.platform_version().unwrap_or_else(|e| {
                warn!("Could not read platform version: {}", e);
                "(unknown)".to_string()
            });
            let (width, height) = self.desired_size().unwrap_or_else(|e| {
                warn!("Could not read desired size: {}", e);
                (0, 0)
            });

            println!("\n=== Wallbridge - {} ===", self.plugin.channel());
            println!("Platform: {} | Desired size: {}x{}", version, width, height);
            println!();
            println!("1. Set wallpaper from file");
            println!("2. Clear wallpaper");
            println!("3. Exit");
            print!("\nSelect an option (1-3): ");
            let _ = io::stdout().flush();
        }

        fn prompt(label: &str) -> Result<String> {
            print!("{}", label);
            io::stdout().flush()?;
            let mut input = String::new();
            io::stdin().read_line(&mut input)?;
            Ok(input.trim().to_string())
        }

        /// Interactive menu loop.
        pub fn run(&self) -> Result<()> {
            loop {
                self.show_menu();

                let mut input = String::new();
                if io::stdin().read_line(&mut input)? == 0 {
                    break;
                }

                match input.trim() {
                    "1" => {
                        let path = Self::prompt("Image path: ")?;
                        let location = Self::prompt("Location [home/lock/both] (both): ")?;
                        let destination = if location.is_empty() {
                            WallpaperDestination::default()
                        } else {
                            match WallpaperDestination::parse(&location) {
                                Some(destination) => destination,
                                None => {
                                    println!("Unknown location {:?}", location);
                                    continue;
                                }
                            }
                        };
                        match self.set_wallpaper(Path::new(&path), destination) {
                            Ok(1) => println!("Set wallpaper: {}", path),
                            Ok(_) => println!("Failed to set wallpaper: {}", path),
                            Err(e) => eprintln!("Failed to set wallpaper: {}", e),
                        }
                    }
                    "2" => match self.clear_wallpaper() {
                        Ok(true) => println!("Wallpaper cleared"),
                        Ok(false) => println!("Failed to clear wallpaper"),
                        Err(e) => eprintln!("Failed to clear wallpaper: {}", e),
                    },
                    "3" => {
                        println!("Exiting Wallbridge...");
                        break;
                    }
                    _ => {
                        println!("Invalid option. Please select 1-3.");
                    }
                }
            }

            Ok(())
        }
    }

    fn expect_int(response: MethodResponse) -> Result<i64> {
        match response {
            MethodResponse::Success { value } => value
                .as_i64()
                .ok_or_else(|| anyhow!("expected an integer, got {}", value)),
            other => Err(anyhow!("unexpected response {:?}", other)),
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn parses_sizes() {
            assert_eq!(parse_size("1080x1920").unwrap(), TargetSize::new(1080, 1920).unwrap());
            assert_eq!(parse_size(" 640 X 480 ").unwrap(), TargetSize::new(640, 480).unwrap());
            assert!(parse_size("1080").is_err());
            assert!(parse_size("0x10").is_err());
        }

        fn app() -> WallbridgeCliApp<UnsupportedWallpaperManager> {
            WallbridgeCliApp::with_manager(UnsupportedWallpaperManager, Conf::default())
        }

        #[test]
        fn unsupported_platform_fails_coarsely() {
            let app = app();
            assert!(!app.clear_wallpaper().unwrap());
            assert_eq!(app.set_wallpaper(Path::new("/missing.png"), WallpaperDestination::HOME).unwrap(), -1);
            assert_eq!(app.desired_size().unwrap(), (0, 0));
        }

        #[test]
        fn raw_calls_return_envelopes() {
            let app = app();
            let out: Value = serde_json::from_str(&app.call_raw("doesNotExist", None).unwrap()).unwrap();
            assert_eq!(out["status"], "notImplemented");
            assert!(app.call_raw("clearWallpaper", Some("{not json")).is_err());
        }

        #[test]
        fn fit_writes_covering_image() {
            let dir = tempfile::tempdir().unwrap();
            let input = dir.path().join("in.png");
            let output = dir.path().join("out.png");
            image::RgbImage::new(1000, 500).save(&input).unwrap();

            let size = app().fit_to_file(&input, &output, parse_size("108x192").unwrap()).unwrap();
            assert_eq!(size, (384, 192));
            assert_eq!(image::image_dimensions(&output).unwrap(), (384, 192));
        }
    }
}
