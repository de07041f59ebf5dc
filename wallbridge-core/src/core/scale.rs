use image::imageops::FilterType;
use image::{DynamicImage, Limits, RgbaImage};
use log::debug;

use super::error::{Result, WallpaperError};

/// Size the platform wants the wallpaper to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetSize {
    pub width: u32,
    pub height: u32,
}

impl TargetSize {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(WallpaperError::InvalidTarget { width, height });
        }
        Ok(Self { width, height })
    }

    /// Builds a target from the platform's signed dimensions, substituting
    /// `fallback` on any axis the platform reports as `<= 0`.
    pub fn from_platform(width: i32, height: i32, fallback: (u32, u32)) -> Result<Self> {
        let pick = |reported: i32, fallback: u32| {
            if reported > 0 {
                reported as u32
            } else {
                fallback
            }
        };
        Self::new(pick(width, fallback.0), pick(height, fallback.1))
    }
}

/// Uniform factor applied to both axes of a source image.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct ScaleFactor(f64);

impl ScaleFactor {
    /// Smallest uniform factor that makes `src_width x src_height` cover `target`.
    pub fn cover(src_width: u32, src_height: u32, target: TargetSize) -> Result<Self> {
        if src_width == 0 || src_height == 0 {
            return Err(WallpaperError::EmptyImage);
        }
        let scale_width = f64::from(target.width) / f64::from(src_width);
        let scale_height = f64::from(target.height) / f64::from(src_height);
        Ok(Self(scale_width.max(scale_height)))
    }

    pub fn get(self) -> f64 {
        self.0
    }

    pub fn apply(self, width: u32, height: u32) -> (u32, u32) {
        let scaled = |v: u32| (f64::from(v) * self.0).round().max(1.0) as u32;
        (scaled(width), scaled(height))
    }
}

/// Output dimensions of a cover fit, without touching any pixels.
pub fn cover_size(src_width: u32, src_height: u32, target: TargetSize) -> Result<(u32, u32)> {
    let factor = ScaleFactor::cover(src_width, src_height, target)?;
    Ok(factor.apply(src_width, src_height))
}

/// Largest RGBA buffer a cover fit may allocate, the same budget `image`
/// applies to decoding.
pub fn max_output_bytes() -> u64 {
    Limits::default().max_alloc.unwrap_or(u64::MAX)
}

/// Refuses output sizes whose RGBA buffer would not fit in `limit` bytes.
pub fn check_output_size(width: u32, height: u32, limit: u64) -> Result<()> {
    let bytes = u64::from(width)
        .checked_mul(u64::from(height))
        .and_then(|pixels| pixels.checked_mul(4));
    match bytes {
        Some(bytes) if bytes <= limit => Ok(()),
        _ => Err(WallpaperError::TooLarge { width, height, limit }),
    }
}

/// Scales `image` uniformly so it covers `target` on both axes.
///
/// Overflow on the longer axis is kept; cropping is left to the platform.
/// Fails with `TooLarge` instead of allocating past [`max_output_bytes`].
pub fn fit_to_cover(image: &DynamicImage, target: TargetSize, filter: FilterType) -> Result<RgbaImage> {
    let factor = ScaleFactor::cover(image.width(), image.height(), target)?;
    let (width, height) = factor.apply(image.width(), image.height());
    check_output_size(width, height, max_output_bytes())?;

    debug!(
        "Cover fit {}x{} -> {}x{} (target {}x{}, factor {:.4})",
        image.width(),
        image.height(),
        width,
        height,
        target.width,
        target.height,
        factor.get()
    );

    if (width, height) == (image.width(), image.height()) {
        return Ok(image.to_rgba8());
    }
    Ok(image.resize_exact(width, height, filter).into_rgba8())
}

#[cfg(test)]
mod tests {
    use super::{check_output_size, cover_size, fit_to_cover, max_output_bytes, ScaleFactor, TargetSize};
    use crate::core::error::WallpaperError;
    use image::imageops::FilterType;
    use image::{DynamicImage, Limits, RgbaImage};
    use proptest::prelude::*;

    fn target(width: u32, height: u32) -> TargetSize {
        TargetSize::new(width, height).unwrap()
    }

    #[test]
    fn wide_image_into_portrait_target() {
        let factor = ScaleFactor::cover(1000, 500, target(1080, 1920)).unwrap();
        assert_eq!(factor.get(), 3.84);
        assert_eq!(factor.apply(1000, 500), (3840, 1920));
    }

    #[test]
    fn square_image_is_downscaled_to_cover() {
        let factor = ScaleFactor::cover(2000, 2000, target(1080, 1920)).unwrap();
        assert_eq!(factor.get(), 0.96);
        assert_eq!(factor.apply(2000, 2000), (1920, 1920));
    }

    #[test]
    fn factor_is_the_larger_ratio() {
        let factor = ScaleFactor::cover(800, 600, target(1920, 1080)).unwrap();
        assert_eq!(factor.get(), (1920.0f64 / 800.0).max(1080.0 / 600.0));
        assert_eq!(factor.apply(800, 600), (1920, 1440));
    }

    #[test]
    fn zero_target_is_rejected() {
        assert!(matches!(
            TargetSize::new(0, 1920),
            Err(WallpaperError::InvalidTarget { width: 0, height: 1920 })
        ));
    }

    #[test]
    fn platform_target_falls_back_per_axis() {
        let t = TargetSize::from_platform(0, 1920, (640, 480)).unwrap();
        assert_eq!(t, target(640, 1920));
        let t = TargetSize::from_platform(-1, -1, (640, 480)).unwrap();
        assert_eq!(t, target(640, 480));
    }

    #[test]
    fn empty_source_is_rejected() {
        assert!(matches!(
            ScaleFactor::cover(0, 10, target(10, 10)),
            Err(WallpaperError::EmptyImage)
        ));
    }

    #[test]
    fn fit_to_cover_produces_scaled_pixels() {
        let src = DynamicImage::ImageRgb8(image::RgbImage::from_pixel(10, 5, image::Rgb([200, 10, 10])));
        let out = fit_to_cover(&src, target(12, 20), FilterType::Triangle).unwrap();
        assert_eq!(out.dimensions(), (40, 20));
        assert_eq!(out.get_pixel(20, 10)[3], 255);
    }

    #[test]
    fn fit_to_cover_keeps_exact_match() {
        let src = DynamicImage::ImageRgba8(RgbaImage::new(1080, 1920));
        let out = fit_to_cover(&src, target(1080, 1920), FilterType::Nearest).unwrap();
        assert_eq!(out.dimensions(), (1080, 1920));
    }

    #[test]
    fn thin_strip_cover_exceeds_budget() {
        let src = DynamicImage::ImageRgb8(image::RgbImage::new(1, 40000));
        let err = fit_to_cover(&src, target(1080, 1920), FilterType::Triangle).unwrap_err();
        assert!(matches!(
            err,
            WallpaperError::TooLarge { width: 1080, height: 43_200_000, .. }
        ));
    }

    #[test]
    fn output_size_check_bounds() {
        assert!(check_output_size(1920, 1080, 1920 * 1080 * 4).is_ok());
        assert!(check_output_size(1920, 1081, 1920 * 1080 * 4).is_err());
        assert!(check_output_size(u32::MAX, u32::MAX, u64::MAX).is_err());
        assert!(check_output_size(3840, 2160, max_output_bytes()).is_ok());
    }

    proptest! {
        #[test]
        fn cover_never_underfills(
            w in 1u32..5000, h in 1u32..5000, tw in 1u32..5000, th in 1u32..5000
        ) {
            let (sw, sh) = cover_size(w, h, target(tw, th)).unwrap();
            prop_assert!(sw >= tw, "{}x{} into {}x{} gave width {}", w, h, tw, th, sw);
            prop_assert!(sh >= th, "{}x{} into {}x{} gave height {}", w, h, tw, th, sh);
        }

        #[test]
        fn cover_preserves_aspect_ratio(
            w in 1u32..5000, h in 1u32..5000, tw in 1u32..5000, th in 1u32..5000
        ) {
            let (sw, sh) = cover_size(w, h, target(tw, th)).unwrap();
            // Each axis is off by at most half a pixel after rounding.
            let skew = (f64::from(sw) * f64::from(h) - f64::from(sh) * f64::from(w)).abs();
            prop_assert!(skew <= 0.5 * f64::from(w + h) + 1.0);
        }

        #[test]
        fn factor_matches_max_ratio(
            w in 1u32..5000, h in 1u32..5000, tw in 1u32..5000, th in 1u32..5000
        ) {
            let factor = ScaleFactor::cover(w, h, target(tw, th)).unwrap();
            let expected = (f64::from(tw) / f64::from(w)).max(f64::from(th) / f64::from(h));
            prop_assert_eq!(factor.get(), expected);
        }
    }
}
