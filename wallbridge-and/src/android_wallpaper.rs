use image::RgbaImage;
use jni::objects::{GlobalRef, JObject, JString, JValue};
use jni::sys::jint;
use jni::{JNIEnv, JavaVM};
use log::{debug, info, warn};
use std::io;

use crate::pixels::{exception_kind, premultiplied_rgba};
use wallbridge_core::{PlatformCapabilities, WallpaperDestination, WallpaperManager};

/// First SDK level whose `WallpaperManager.setBitmap` takes a destination flag.
const SDK_DESTINATION_FLAGS: i32 = 24;

/// `WallpaperManager` backed by `android.app.WallpaperManager` over JNI.
pub struct AndroidWallpaperManager {
    vm: JavaVM,
    wallpaper_manager: GlobalRef,
    sdk_int: i32,
    release: String,
}

impl AndroidWallpaperManager {
    /// Looks up the platform service for `context` once; every later call
    /// goes through the held reference.
    pub fn new(env: &mut JNIEnv, context: &JObject) -> io::Result<Self> {
        let vm = env.get_java_vm().map_err(|e| java_error(env, e))?;

        let manager = env
            .call_static_method(
                "android/app/WallpaperManager",
                "getInstance",
                "(Landroid/content/Context;)Landroid/app/WallpaperManager;",
                &[JValue::Object(context)],
            )
            .and_then(|value| value.l())
            .map_err(|e| java_error(env, e))?;
        if manager.is_null() {
            return Err(io::Error::new(io::ErrorKind::NotFound, "WallpaperManager unavailable"));
        }
        let wallpaper_manager = env.new_global_ref(&manager).map_err(|e| java_error(env, e))?;
        let _ = env.delete_local_ref(manager);

        let sdk_int = env
            .get_static_field("android/os/Build$VERSION", "SDK_INT", "I")
            .and_then(|value| value.i())
            .map_err(|e| java_error(env, e))?;
        let release_obj = env
            .get_static_field("android/os/Build$VERSION", "RELEASE", "Ljava/lang/String;")
            .and_then(|value| value.l())
            .map_err(|e| java_error(env, e))?;
        let release = java_string(env, JString::from(release_obj)).unwrap_or_default();

        info!("Android {} (SDK {}) wallpaper manager attached", release, sdk_int);

        Ok(Self {
            vm,
            wallpaper_manager,
            sdk_int,
            release,
        })
    }

    fn with_env<T>(&self, f: impl FnOnce(&mut JNIEnv) -> io::Result<T>) -> io::Result<T> {
        let mut env = self.vm.attach_current_thread().map_err(|_| {
            io::Error::new(io::ErrorKind::Other, "Failed to attach current thread")
        })?;
        f(&mut env)
    }

    fn call_int(&self, method: &str) -> io::Result<i32> {
        self.with_env(|env| {
            env.call_method(&self.wallpaper_manager, method, "()I", &[])
                .and_then(|value| value.i())
                .map_err(|e| java_error(env, e))
        })
    }
}

impl WallpaperManager for AndroidWallpaperManager {
    fn capabilities(&self) -> PlatformCapabilities {
        PlatformCapabilities {
            supports_destination_flag: self.sdk_int >= SDK_DESTINATION_FLAGS,
        }
    }

    fn platform_version(&self) -> String {
        format!("Android {}", self.release)
    }

    fn desired_minimum_width(&self) -> i32 {
        self.call_int("getDesiredMinimumWidth").unwrap_or_else(|e| {
            warn!("getDesiredMinimumWidth failed: {}", e);
            0
        })
    }

    fn desired_minimum_height(&self) -> i32 {
        self.call_int("getDesiredMinimumHeight").unwrap_or_else(|e| {
            warn!("getDesiredMinimumHeight failed: {}", e);
            0
        })
    }

    fn set_bitmap(&self, image: &RgbaImage, destination: WallpaperDestination) -> io::Result<i32> {
        self.with_env(|env| {
            let mut bitmap = BitmapGuard::new(env, image)?;
            bitmap.with(|env, bitmap| {
                let no_crop = JObject::null();
                env.call_method(
                    &self.wallpaper_manager,
                    "setBitmap",
                    "(Landroid/graphics/Bitmap;Landroid/graphics/Rect;ZI)I",
                    &[
                        JValue::Object(bitmap),
                        JValue::Object(&no_crop),
                        JValue::Bool(0),
                        JValue::Int(destination.raw() as jint),
                    ],
                )
                .and_then(|value| value.i())
                .map_err(|e| java_error(env, e))
            })
        })
    }

    fn set_bitmap_legacy(&self, image: &RgbaImage) -> io::Result<()> {
        self.with_env(|env| {
            let mut bitmap = BitmapGuard::new(env, image)?;
            bitmap.with(|env, bitmap| {
                env.call_method(
                    &self.wallpaper_manager,
                    "setBitmap",
                    "(Landroid/graphics/Bitmap;)V",
                    &[JValue::Object(bitmap)],
                )
                .map(|_| ())
                .map_err(|e| java_error(env, e))
            })
        })
    }

    fn clear(&self) -> io::Result<()> {
        self.with_env(|env| {
            env.call_method(&self.wallpaper_manager, "clear", "()V", &[])
                .map(|_| ())
                .map_err(|e| java_error(env, e))
        })
    }
}

/// An `android.graphics.Bitmap` that is recycled and released when dropped,
/// whichever way the apply call exits.
struct BitmapGuard<'a, 'local> {
    env: &'a mut JNIEnv<'local>,
    bitmap: JObject<'local>,
}

impl<'a, 'local> BitmapGuard<'a, 'local> {
    fn new(env: &'a mut JNIEnv<'local>, image: &RgbaImage) -> io::Result<Self> {
        let bitmap = create_bitmap(env, image.width() as jint, image.height() as jint)
            .map_err(|e| java_error(env, e))?;
        let mut guard = Self { env, bitmap };
        guard.with(|env, bitmap| fill_bitmap(env, bitmap, image))?;
        Ok(guard)
    }

    fn with<T>(&mut self, f: impl FnOnce(&mut JNIEnv<'local>, &JObject<'local>) -> T) -> T {
        f(&mut *self.env, &self.bitmap)
    }
}

impl Drop for BitmapGuard<'_, '_> {
    fn drop(&mut self) {
        if self.env.exception_check().unwrap_or(false) {
            warn!("Clearing pending Java exception before recycling bitmap");
            let _ = self.env.exception_clear();
        }
        if let Err(e) = self.env.call_method(&self.bitmap, "recycle", "()V", &[]) {
            warn!("Failed to recycle bitmap: {}", e);
            let _ = self.env.exception_clear();
        }
        let bitmap = std::mem::replace(&mut self.bitmap, JObject::null());
        let _ = self.env.delete_local_ref(bitmap);
        debug!("Bitmap recycled");
    }
}

fn create_bitmap<'local>(env: &mut JNIEnv<'local>, width: jint, height: jint) -> jni::errors::Result<JObject<'local>> {
    let config = env
        .get_static_field(
            "android/graphics/Bitmap$Config",
            "ARGB_8888",
            "Landroid/graphics/Bitmap$Config;",
        )?
        .l()?;
    let bitmap = env
        .call_static_method(
            "android/graphics/Bitmap",
            "createBitmap",
            "(IILandroid/graphics/Bitmap$Config;)Landroid/graphics/Bitmap;",
            &[JValue::Int(width), JValue::Int(height), JValue::Object(&config)],
        )?
        .l()?;
    env.delete_local_ref(config)?;
    Ok(bitmap)
}

fn fill_bitmap(env: &mut JNIEnv, bitmap: &JObject, image: &RgbaImage) -> io::Result<()> {
    let mut pixels = premultiplied_rgba(image);
    // SAFETY: `pixels` outlives the buffer; the platform copies out of it
    // before `copyPixelsFromBuffer` returns and the local ref is dropped.
    let buffer = unsafe { env.new_direct_byte_buffer(pixels.as_mut_ptr(), pixels.len()) }
        .map_err(|e| java_error(env, e))?;
    let buffer = JObject::from(buffer);
    let copied = env
        .call_method(bitmap, "copyPixelsFromBuffer", "(Ljava/nio/Buffer;)V", &[JValue::Object(&buffer)])
        .map(|_| ())
        .map_err(|e| java_error(env, e));
    let _ = env.delete_local_ref(buffer);
    copied
}

fn java_string(env: &mut JNIEnv, value: JString) -> Option<String> {
    if value.is_null() {
        return None;
    }
    let text = env.get_string(&value).ok().map(String::from);
    let _ = env.delete_local_ref(value);
    text
}

/// Converts a failed JNI call into an `io::Error`, clearing any pending Java
/// exception so the env stays usable.
pub(crate) fn java_error(env: &mut JNIEnv, err: jni::errors::Error) -> io::Error {
    if let jni::errors::Error::JavaException = err {
        if let Some(e) = take_exception(env) {
            return e;
        }
    }
    io::Error::new(io::ErrorKind::Other, format!("JNI call failed: {}", err))
}

fn take_exception(env: &mut JNIEnv) -> Option<io::Error> {
    let throwable = env.exception_occurred().ok()?;
    if throwable.is_null() {
        return None;
    }
    env.exception_clear().ok()?;

    let class_name = env
        .call_method(&throwable, "getClass", "()Ljava/lang/Class;", &[])
        .and_then(|value| value.l())
        .ok()
        .and_then(|class| {
            let name = env
                .call_method(&class, "getName", "()Ljava/lang/String;", &[])
                .and_then(|value| value.l())
                .ok();
            let _ = env.delete_local_ref(class);
            name
        })
        .and_then(|name| java_string(env, JString::from(name)))
        .unwrap_or_else(|| "java.lang.Throwable".to_string());
    let message = env
        .call_method(&throwable, "getMessage", "()Ljava/lang/String;", &[])
        .and_then(|value| value.l())
        .ok()
        .and_then(|message| java_string(env, JString::from(message)))
        .unwrap_or_default();
    if env.exception_check().unwrap_or(false) {
        let _ = env.exception_clear();
    }
    let _ = env.delete_local_ref(throwable);

    warn!("Java exception {}: {}", class_name, message);
    Some(io::Error::new(exception_kind(&class_name), format!("{}: {}", class_name, message)))
}
