//! Method-channel dispatch.
//!
//! The host sends a JSON request envelope naming a method and its arguments;
//! the plugin answers with a JSON response envelope:
//!
//! ```text
//! {"method": "setWallpaperFromFile", "arguments": {"filePath": "/sdcard/a.jpg", "wallpaperLocation": 1}}
//!   -> {"status": "success", "value": 1}
//! {"method": "rotateScreen"}
//!   -> {"status": "notImplemented"}
//! ```
//!
//! Operation failures stay inside the success envelope as `-1` / `false`.
//! The `error` envelope is reserved for requests the plugin can't even read.

use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use super::conf::Conf;
use super::destination::WallpaperDestination;
use super::wallpaper::WallpaperOps;
use crate::services::WallpaperManager;

pub const ERR_BAD_ENVELOPE: &str = "bad_envelope";
pub const ERR_BAD_ARGS: &str = "bad_args";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodCall {
    pub method: String,
    #[serde(default)]
    pub arguments: Value,
}

impl MethodCall {
    pub fn new(method: impl Into<String>, arguments: Value) -> Self {
        Self {
            method: method.into(),
            arguments,
        }
    }

    pub fn without_args(method: impl Into<String>) -> Self {
        Self::new(method, Value::Null)
    }

    pub fn from_json(request: &str) -> serde_json::Result<Self> {
        serde_json::from_str(request)
    }

    /// Typed view of the argument map.
    pub fn arguments<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_value(self.arguments.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum MethodResponse {
    Success { value: Value },
    NotImplemented,
    Error { code: String, message: String },
}

impl MethodResponse {
    pub fn success(value: impl Into<Value>) -> Self {
        Self::Success { value: value.into() }
    }

    pub fn error(code: &str, message: impl fmt::Display) -> Self {
        Self::Error {
            code: code.to_string(),
            message: message.to_string(),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            warn!("Failed to encode response: {}", e);
            r#"{"status":"error","code":"encode","message":"response not encodable"}"#.to_string()
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    GetPlatformVersion,
    SetWallpaperFromFile,
    ClearWallpaper,
    GetDesiredMinimumHeight,
    GetDesiredMinimumWidth,
}

impl Method {
    pub const ALL: [Method; 5] = [
        Method::GetPlatformVersion,
        Method::SetWallpaperFromFile,
        Method::ClearWallpaper,
        Method::GetDesiredMinimumHeight,
        Method::GetDesiredMinimumWidth,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Method::GetPlatformVersion => "getPlatformVersion",
            Method::SetWallpaperFromFile => "setWallpaperFromFile",
            Method::ClearWallpaper => "clearWallpaper",
            Method::GetDesiredMinimumHeight => "getDesiredMinimumHeight",
            Method::GetDesiredMinimumWidth => "getDesiredMinimumWidth",
        }
    }
}

impl FromStr for Method {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Method::ALL.into_iter().find(|m| m.name() == s).ok_or(())
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SetWallpaperArgs {
    file_path: String,
    wallpaper_location: WallpaperDestination,
}

/// Answers method calls arriving on the plugin's channel.
pub struct WallpaperPlugin<M> {
    channel: String,
    ops: WallpaperOps<M>,
}

impl<M: WallpaperManager> WallpaperPlugin<M> {
    pub fn new(manager: M, conf: &Conf) -> Self {
        Self {
            channel: conf.channel.clone(),
            ops: WallpaperOps::new(manager, conf.filter_type()),
        }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn handle(&self, call: &MethodCall) -> MethodResponse {
        let Ok(method) = call.method.parse::<Method>() else {
            debug!("[{}] {} not implemented", self.channel, call.method);
            return MethodResponse::NotImplemented;
        };
        debug!("[{}] {}", self.channel, method);

        match method {
            Method::GetPlatformVersion => MethodResponse::success(self.ops.platform_version()),
            Method::SetWallpaperFromFile => match call.arguments::<SetWallpaperArgs>() {
                Ok(args) => MethodResponse::success(
                    self.ops
                        .set_wallpaper_from_file(Path::new(&args.file_path), args.wallpaper_location),
                ),
                Err(e) => {
                    warn!("[{}] bad arguments for {}: {}", self.channel, method, e);
                    MethodResponse::error(ERR_BAD_ARGS, e)
                }
            },
            Method::ClearWallpaper => MethodResponse::success(self.ops.clear_wallpaper()),
            Method::GetDesiredMinimumHeight => MethodResponse::success(self.ops.desired_minimum_height()),
            Method::GetDesiredMinimumWidth => MethodResponse::success(self.ops.desired_minimum_width()),
        }
    }

    /// Request envelope in, response envelope out.
    pub fn handle_json(&self, request: &str) -> String {
        let response = match MethodCall::from_json(request) {
            Ok(call) => self.handle(&call),
            Err(e) => {
                warn!("[{}] unreadable request: {}", self.channel, e);
                MethodResponse::error(ERR_BAD_ENVELOPE, e)
            }
        };
        response.to_json()
    }
}

/// Builds the `setWallpaperFromFile` request for `path`.
pub fn set_wallpaper_call(path: &Path, destination: WallpaperDestination) -> MethodCall {
    MethodCall::new(
        Method::SetWallpaperFromFile.name(),
        json!({
            "filePath": path.to_string_lossy(),
            "wallpaperLocation": destination.raw(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::wallpaper::tests::{write_png, Call, FakeManager};

    fn plugin(fake: &FakeManager) -> WallpaperPlugin<&FakeManager> {
        WallpaperPlugin::new(fake, &Conf::default())
    }

    #[test]
    fn unknown_method_is_not_implemented() {
        let fake = FakeManager::modern();
        let response = plugin(&fake).handle(&MethodCall::without_args("rotateScreen"));
        assert_eq!(response, MethodResponse::NotImplemented);
        assert!(fake.calls.borrow().is_empty());
    }

    #[test]
    fn queries_answer_with_platform_values() {
        let fake = FakeManager::modern();
        let plugin = plugin(&fake);
        assert_eq!(plugin.channel(), "flutter_wallpaper");
        assert_eq!(
            plugin.handle(&MethodCall::without_args("getDesiredMinimumWidth")),
            MethodResponse::success(1080)
        );
        assert_eq!(
            plugin.handle(&MethodCall::without_args("getDesiredMinimumHeight")),
            MethodResponse::success(1920)
        );
        assert_eq!(
            plugin.handle(&MethodCall::without_args("getPlatformVersion")),
            MethodResponse::success("Fake 1.0")
        );
    }

    #[test]
    fn set_wallpaper_through_channel() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "img.png", 20, 10);
        let fake = FakeManager::modern();

        let response = plugin(&fake).handle(&set_wallpaper_call(&path, WallpaperDestination::BOTH));
        assert_eq!(response, MethodResponse::success(1));
        assert_eq!(
            *fake.calls.borrow(),
            vec![Call::SetBitmap {
                width: 3840,
                height: 1920,
                destination: 3
            }]
        );
    }

    #[test]
    fn failed_set_is_success_envelope_with_minus_one() {
        let fake = FakeManager::modern();
        let call = set_wallpaper_call(Path::new("/no/such/file.jpg"), WallpaperDestination::HOME);
        assert_eq!(plugin(&fake).handle(&call), MethodResponse::success(-1));
    }

    #[test]
    fn clear_failure_is_false() {
        let fake = FakeManager {
            fail_io: true,
            ..FakeManager::modern()
        };
        let response = plugin(&fake).handle(&MethodCall::without_args("clearWallpaper"));
        assert_eq!(response, MethodResponse::success(false));
    }

    #[test]
    fn missing_arguments_are_rejected() {
        let fake = FakeManager::modern();
        let call = MethodCall::new("setWallpaperFromFile", json!({ "filePath": "/a.jpg" }));
        match plugin(&fake).handle(&call) {
            MethodResponse::Error { code, .. } => assert_eq!(code, ERR_BAD_ARGS),
            other => panic!("unexpected response {:?}", other),
        }
        assert!(fake.calls.borrow().is_empty());
    }

    #[test]
    fn json_envelopes() {
        let fake = FakeManager::modern();
        let plugin = plugin(&fake);

        let out: Value = serde_json::from_str(&plugin.handle_json(r#"{"method":"getDesiredMinimumWidth"}"#)).unwrap();
        assert_eq!(out, json!({ "status": "success", "value": 1080 }));

        let out: Value = serde_json::from_str(&plugin.handle_json(r#"{"method":"nope","arguments":{}}"#)).unwrap();
        assert_eq!(out, json!({ "status": "notImplemented" }));

        let out: Value = serde_json::from_str(&plugin.handle_json("not json")).unwrap();
        assert_eq!(out["status"], "error");
        assert_eq!(out["code"], ERR_BAD_ENVELOPE);
    }

    #[test]
    fn method_names_round_trip() {
        for method in Method::ALL {
            assert_eq!(method.name().parse::<Method>(), Ok(method));
        }
    }
}
