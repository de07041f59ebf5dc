use anyhow::{Context, Result};
use directories::ProjectDirs;
use image::imageops::FilterType;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONF_FILE_NAME: &str = "wallbridge.json";
pub const DEFAULT_CHANNEL: &str = "flutter_wallpaper";

/// Resampling filter used by the cover fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResampleFilter {
    Nearest,
    /// Bilinear, what the platform uses for a filtered bitmap scale.
    #[default]
    Triangle,
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl From<ResampleFilter> for FilterType {
    fn from(filter: ResampleFilter) -> Self {
        match filter {
            ResampleFilter::Nearest => FilterType::Nearest,
            ResampleFilter::Triangle => FilterType::Triangle,
            ResampleFilter::CatmullRom => FilterType::CatmullRom,
            ResampleFilter::Gaussian => FilterType::Gaussian,
            ResampleFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Conf {
    /// Method channel the host registers the plugin under.
    pub channel: String,
    pub filter: ResampleFilter,
    /// Desired wallpaper size reported by the desktop sink.
    pub desired_width: u32,
    pub desired_height: u32,
    /// Where the desktop sink writes scaled images.
    pub cache_dir: PathBuf,
    /// Image the desktop sink re-applies on clear.
    pub clear_to: Option<PathBuf>,
}

impl Default for Conf {
    fn default() -> Self {
        let cache_dir = {
            #[cfg(target_os = "android")]
            {
                PathBuf::from("/data/data/io.wallbridge/cache")
            }

            #[cfg(not(target_os = "android"))]
            {
                ProjectDirs::from("io", "wallbridge", "wallbridge")
                    .map(|dirs| dirs.cache_dir().to_path_buf())
                    .unwrap_or_else(|| std::env::temp_dir().join("wallbridge"))
            }
        };

        Self {
            channel: DEFAULT_CHANNEL.to_string(),
            filter: ResampleFilter::default(),
            desired_width: 1920,
            desired_height: 1080,
            cache_dir,
            clear_to: None,
        }
    }
}

impl Conf {
    /// Loads `wallbridge.json` from the user config dir, or defaults when
    /// there is none.
    pub fn new() -> Result<Self> {
        let proj_dirs = ProjectDirs::from("io", "wallbridge", "wallbridge")
            .context("Failed to get project directories")?;
        let conf_file = proj_dirs.config_dir().join(CONF_FILE_NAME);
        if conf_file.exists() {
            Self::load(&conf_file)
        } else {
            log::debug!("No config at {:?}, using defaults", conf_file);
            Ok(Self::default())
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {:?}", path))?;
        let conf: Conf = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config {:?}", path))?;
        conf.validate()?;
        log::info!("Loaded config from {:?}", path);
        Ok(conf)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).with_context(|| format!("Failed to write config {:?}", path))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.desired_width == 0 || self.desired_height == 0 {
            anyhow::bail!(
                "desired size must be positive, got {}x{}",
                self.desired_width,
                self.desired_height
            );
        }
        if self.channel.is_empty() {
            anyhow::bail!("channel name must not be empty");
        }
        Ok(())
    }

    pub fn filter_type(&self) -> FilterType {
        self.filter.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONF_FILE_NAME);
        fs::write(&path, r#"{ "filter": "lanczos3", "desired_width": 1080 }"#).unwrap();

        let conf = Conf::load(&path).unwrap();
        assert_eq!(conf.filter, ResampleFilter::Lanczos3);
        assert_eq!(conf.desired_width, 1080);
        assert_eq!(conf.desired_height, 1080);
        assert_eq!(conf.channel, DEFAULT_CHANNEL);
    }

    #[test]
    fn zero_size_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONF_FILE_NAME);
        fs::write(&path, r#"{ "desired_height": 0 }"#).unwrap();
        assert!(Conf::load(&path).is_err());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONF_FILE_NAME);
        let conf = Conf {
            clear_to: Some(PathBuf::from("/usr/share/backgrounds/default.png")),
            ..Conf::default()
        };
        conf.save(&path).unwrap();
        let loaded = Conf::load(&path).unwrap();
        assert_eq!(loaded.clear_to, conf.clear_to);
        assert_eq!(loaded.filter_type(), FilterType::Triangle);
    }
}
