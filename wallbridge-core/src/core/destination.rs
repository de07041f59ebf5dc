use serde::{Deserialize, Serialize};
use std::fmt;

/// Where the platform should put the wallpaper.
///
/// Holds the caller's raw flag so values this crate doesn't know about still
/// reach the platform unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WallpaperDestination(i32);

impl WallpaperDestination {
    /// Home screen (`WallpaperManager.FLAG_SYSTEM`).
    pub const HOME: Self = Self(1);
    /// Lock screen (`WallpaperManager.FLAG_LOCK`).
    pub const LOCK: Self = Self(2);
    pub const BOTH: Self = Self(3);

    pub const fn from_raw(flag: i32) -> Self {
        Self(flag)
    }

    pub const fn raw(self) -> i32 {
        self.0
    }

    pub fn name(self) -> Option<&'static str> {
        match self {
            Self::HOME => Some("home"),
            Self::LOCK => Some("lock"),
            Self::BOTH => Some("both"),
            _ => None,
        }
    }

    /// Accepts `home`, `lock`, `both` or a bare integer flag.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "home" | "system" => Some(Self::HOME),
            "lock" => Some(Self::LOCK),
            "both" => Some(Self::BOTH),
            other => other.parse::<i32>().ok().map(Self),
        }
    }
}

impl Default for WallpaperDestination {
    fn default() -> Self {
        Self::BOTH
    }
}

impl fmt::Display for WallpaperDestination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{}", name),
            None => write!(f, "flag {}", self.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_flags_pass_through() {
        let dest = WallpaperDestination::from_raw(42);
        assert_eq!(dest.raw(), 42);
        assert_eq!(dest.name(), None);
        assert_eq!(dest.to_string(), "flag 42");
    }

    #[test]
    fn parses_names_and_numbers() {
        assert_eq!(WallpaperDestination::parse("Lock"), Some(WallpaperDestination::LOCK));
        assert_eq!(WallpaperDestination::parse("3"), Some(WallpaperDestination::BOTH));
        assert_eq!(WallpaperDestination::parse("sideways"), None);
    }

    #[test]
    fn serializes_as_bare_integer() {
        let json = serde_json::to_string(&WallpaperDestination::LOCK).unwrap();
        assert_eq!(json, "2");
        let back: WallpaperDestination = serde_json::from_str("7").unwrap();
        assert_eq!(back.raw(), 7);
    }
}
