use image::RgbaImage;
use std::io;

/// Raw bytes for an `ARGB_8888` bitmap.
///
/// The in-memory byte order of `ARGB_8888` is R, G, B, A, but the platform
/// stores color channels premultiplied by alpha.
pub fn premultiplied_rgba(image: &RgbaImage) -> Vec<u8> {
    let mut bytes = image.as_raw().clone();
    for px in bytes.chunks_exact_mut(4) {
        let alpha = u16::from(px[3]);
        if alpha == 255 {
            continue;
        }
        for channel in &mut px[..3] {
            *channel = ((u16::from(*channel) * alpha + 127) / 255) as u8;
        }
    }
    bytes
}

/// Maps a Java exception class to the closest `io::ErrorKind`.
pub fn exception_kind(class_name: &str) -> io::ErrorKind {
    match class_name {
        "java.lang.SecurityException" => io::ErrorKind::PermissionDenied,
        "java.io.FileNotFoundException" => io::ErrorKind::NotFound,
        "java.lang.IllegalArgumentException" => io::ErrorKind::InvalidInput,
        "java.lang.UnsupportedOperationException" => io::ErrorKind::Unsupported,
        _ => io::ErrorKind::Other,
    }
}
