//! Entry points for `io.wallbridge.WallbridgePlugin`.
//!
//! ```java
//! public final class WallbridgePlugin implements MethodCallHandler {
//!     private static native long nativeAttach(Context context, String confJson);
//!     private static native String nativeOnMethodCall(long handle, String requestJson);
//!     private static native void nativeDetach(long handle);
//! }
//! ```
//!
//! `nativeAttach` returns an opaque handle owning the plugin. The Java side
//! passes it back on every call and hands it to `nativeDetach` exactly once.

use jni::objects::{JClass, JObject, JString};
use jni::sys::{jlong, jstring};
use jni::JNIEnv;
use log::{error, info};

use crate::android_wallpaper::AndroidWallpaperManager;
use wallbridge_core::{Conf, MethodResponse, WallpaperPlugin};

type AndroidPlugin = WallpaperPlugin<AndroidWallpaperManager>;

fn init_logging() {
    android_logger::init_once(
        android_logger::Config::default()
            .with_max_level(log::LevelFilter::Info)
            .with_tag("wallbridge"),
    );
}

fn read_string(env: &mut JNIEnv, value: &JString) -> Option<String> {
    if value.is_null() {
        return None;
    }
    env.get_string(value).ok().map(String::from)
}

fn load_conf(json: Option<String>) -> Conf {
    let Some(json) = json else {
        return Conf::default();
    };
    match serde_json::from_str::<Conf>(&json) {
        Ok(conf) => conf,
        Err(e) => {
            error!("Ignoring unreadable plugin config: {}", e);
            Conf::default()
        }
    }
}

#[no_mangle]
pub extern "system" fn Java_io_wallbridge_WallbridgePlugin_nativeAttach<'local>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
    context: JObject<'local>,
    conf_json: JString<'local>,
) -> jlong {
    init_logging();

    let conf = load_conf(read_string(&mut env, &conf_json));
    match AndroidWallpaperManager::new(&mut env, &context) {
        Ok(manager) => {
            let plugin: Box<AndroidPlugin> = Box::new(WallpaperPlugin::new(manager, &conf));
            info!("Plugin attached on channel {}", plugin.channel());
            Box::into_raw(plugin) as jlong
        }
        Err(e) => {
            error!("Failed to attach wallpaper plugin: {}", e);
            0
        }
    }
}

#[no_mangle]
pub extern "system" fn Java_io_wallbridge_WallbridgePlugin_nativeOnMethodCall<'local>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
    handle: jlong,
    request_json: JString<'local>,
) -> jstring {
    // SAFETY: non-zero handles come from `nativeAttach` and stay valid until
    // `nativeDetach`, which the host never overlaps with a call.
    let plugin = unsafe { (handle as *const AndroidPlugin).as_ref() };

    let response = match (plugin, read_string(&mut env, &request_json)) {
        (Some(plugin), Some(request)) => plugin.handle_json(&request),
        (None, _) => MethodResponse::error("detached", "plugin is not attached").to_json(),
        (_, None) => MethodResponse::error(wallbridge_core::core::channel::ERR_BAD_ENVELOPE, "null request").to_json(),
    };

    match env.new_string(response) {
        Ok(s) => s.into_raw(),
        Err(e) => {
            error!("Failed to return method response: {}", e);
            std::ptr::null_mut()
        }
    }
}

#[no_mangle]
pub extern "system" fn Java_io_wallbridge_WallbridgePlugin_nativeDetach<'local>(
    _env: JNIEnv<'local>,
    _class: JClass<'local>,
    handle: jlong,
) {
    if handle == 0 {
        return;
    }
    // SAFETY: see `nativeOnMethodCall`; the host calls this once per handle.
    drop(unsafe { Box::from_raw(handle as *mut AndroidPlugin) });
    info!("Plugin detached");
}
