// Single-image resize: open, fit or stretch, save next to the original.

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilterType, PngEncoder};
use image::{DynamicImage, ImageFormat};

use crate::config::{RunConfiguration, SaveOptions, OUTPUT_SUFFIX, RESAMPLE_FILTER};
use crate::error::ResizeError;

/// Resizes one image according to `config` and writes the result into
/// `config.folder`. Returns the path of the written file.
pub fn process_one(image_path: &Path, config: &RunConfiguration) -> Result<PathBuf, ResizeError> {
    let output = output_path(image_path, &config.folder);
    let format = format_for(image_path)?;

    let img = image::open(image_path).map_err(ResizeError::Open)?;
    let resized = resize_image(
        img,
        config.target_width,
        config.target_height,
        config.preserve_aspect_ratio,
    );
    save_image(&resized, &output, format, &SaveOptions::default())?;

    Ok(output)
}

/// `photo.jpg` in any directory becomes `<folder>/photo_red.jpg`.
pub fn output_path(image_path: &Path, folder: &Path) -> PathBuf {
    let stem = image_path
        .file_stem()
        .unwrap_or_default()
        .to_string_lossy();
    let name = match image_path.extension() {
        Some(ext) => format!("{}{}.{}", stem, OUTPUT_SUFFIX, ext.to_string_lossy()),
        None => format!("{}{}", stem, OUTPUT_SUFFIX),
    };
    folder.join(name)
}

pub fn resize_image(
    img: DynamicImage,
    target_width: u32,
    target_height: u32,
    preserve_aspect_ratio: bool,
) -> DynamicImage {
    if preserve_aspect_ratio {
        let (width, height) = fit_within(img.width(), img.height(), target_width, target_height);
        if (width, height) == (img.width(), img.height()) {
            return img;
        }
        img.resize_exact(width, height, RESAMPLE_FILTER)
    } else {
        img.resize_exact(target_width, target_height, RESAMPLE_FILTER)
    }
}

/// Bounding-box fit: the largest size within `max_width` x `max_height`
/// with the aspect ratio of `width` x `height`. Never enlarges.
///
/// The constrained side is pinned to its limit; the other side is rounded
/// down or up, whichever keeps the ratio closer (ties round down).
pub fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if width == 0 || height == 0 || (max_width >= width && max_height >= height) {
        return (width, height);
    }

    let aspect = width as f64 / height as f64;
    let (max_w, max_h) = (max_width as f64, max_height as f64);

    if max_w / max_h >= aspect {
        let new_width = round_to_aspect(max_h * aspect, |n| (aspect - n / max_h).abs());
        (new_width, max_height)
    } else {
        let new_height = round_to_aspect(max_w / aspect, |n| {
            if n == 0.0 {
                0.0
            } else {
                (aspect - max_w / n).abs()
            }
        });
        (max_width, new_height)
    }
}

fn round_to_aspect(value: f64, distance: impl Fn(f64) -> f64) -> u32 {
    let (down, up) = (value.floor(), value.ceil());
    let best = if distance(up) < distance(down) { up } else { down };
    (best as u32).max(1)
}

fn format_for(path: &Path) -> Result<ImageFormat, ResizeError> {
    ImageFormat::from_path(path)
        .map_err(|_| ResizeError::UnsupportedFormat(path.display().to_string()))
}

/// Encodes `img` in memory and writes `path` only once encoding succeeded,
/// so a failed save leaves no partial file behind.
pub fn save_image(
    img: &DynamicImage,
    path: &Path,
    format: ImageFormat,
    options: &SaveOptions,
) -> Result<(), ResizeError> {
    let buffer = encode_to_buffer(img, format, options)?;
    fs::write(path, buffer)?;
    Ok(())
}

fn encode_to_buffer(
    img: &DynamicImage,
    format: ImageFormat,
    options: &SaveOptions,
) -> Result<Vec<u8>, ResizeError> {
    let mut buffer = Cursor::new(Vec::new());

    match format {
        ImageFormat::Jpeg => {
            // JPEG has no alpha channel
            let encoder = JpegEncoder::new_with_quality(&mut buffer, options.quality);
            DynamicImage::ImageRgb8(img.to_rgb8())
                .write_with_encoder(encoder)
                .map_err(ResizeError::Save)?;
        }
        ImageFormat::Png => {
            let compression = if options.optimize {
                CompressionType::Best
            } else {
                CompressionType::Default
            };
            let encoder =
                PngEncoder::new_with_quality(&mut buffer, compression, PngFilterType::Adaptive);
            img.write_with_encoder(encoder).map_err(ResizeError::Save)?;
        }
        other => {
            img.write_to(&mut buffer, other).map_err(ResizeError::Save)?;
        }
    }

    Ok(buffer.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, RgbImage};

    #[test]
    fn output_name_keeps_extension_case() {
        let folder = Path::new("/photos");
        assert_eq!(
            output_path(Path::new("/photos/a.jpg"), folder),
            PathBuf::from("/photos/a_red.jpg")
        );
        assert_eq!(
            output_path(Path::new("/elsewhere/IMG_01.PNG"), folder),
            PathBuf::from("/photos/IMG_01_red.PNG")
        );
        assert_eq!(
            output_path(Path::new("/photos/archive.tar.gif"), folder),
            PathBuf::from("/photos/archive.tar_red.gif")
        );
    }

    #[test]
    fn fit_shrinks_landscape_to_width() {
        assert_eq!(fit_within(800, 600, 400, 400), (400, 300));
        assert_eq!(fit_within(1500, 800, 1024, 1024), (1024, 546));
    }

    #[test]
    fn fit_shrinks_portrait_to_height() {
        assert_eq!(fit_within(500, 2000, 1024, 1024), (256, 1024));
        assert_eq!(fit_within(100, 1000, 50, 2000), (50, 500));
    }

    #[test]
    fn fit_never_enlarges() {
        assert_eq!(fit_within(300, 300, 400, 400), (300, 300));
        assert_eq!(fit_within(400, 400, 400, 400), (400, 400));
        assert_eq!(fit_within(100, 1000, 1024, 2000), (100, 1000));
    }

    #[test]
    fn fit_keeps_at_least_one_pixel() {
        assert_eq!(fit_within(10_000, 1, 100, 100), (100, 1));
        assert_eq!(fit_within(1, 10_000, 100, 100), (1, 100));
    }

    #[test]
    fn fit_preserves_ratio_within_rounding() {
        for &(w, h, tw, th) in &[
            (1920, 1080, 640, 640),
            (1080, 1920, 300, 500),
            (333, 777, 100, 100),
            (4000, 3000, 1024, 768),
        ] {
            let (nw, nh) = fit_within(w, h, tw, th);
            assert!(nw <= tw && nh <= th, "{nw}x{nh} exceeds {tw}x{th}");
            assert!(nw <= w && nh <= h);
            let original = w as f64 / h as f64;
            let (nw, nh) = (nw as f64, nh as f64);
            assert!(
                (nw - nh * original).abs() <= 1.0 || (nh - nw / original).abs() <= 1.0,
                "{nw}x{nh} drifts from {w}x{h}"
            );
        }
    }

    #[test]
    fn stretch_ignores_aspect_ratio() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(800, 600));
        let out = resize_image(img, 123, 456, false);
        assert_eq!(out.dimensions(), (123, 456));
    }

    #[test]
    fn stretch_may_enlarge() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(10, 10));
        let out = resize_image(img, 40, 20, false);
        assert_eq!(out.dimensions(), (40, 20));
    }

    #[test]
    fn failed_encode_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("float_red.bmp");
        let img = DynamicImage::ImageRgb32F(image::Rgb32FImage::new(4, 4));

        let result = save_image(&img, &path, ImageFormat::Bmp, &SaveOptions::default());

        assert!(matches!(result, Err(ResizeError::Save(_))));
        assert!(!path.exists());
    }

    #[test]
    fn saved_file_round_trips_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out_red.png");
        let img = DynamicImage::ImageRgb8(RgbImage::new(7, 3));

        save_image(&img, &path, ImageFormat::Png, &SaveOptions::default()).unwrap();

        assert_eq!(image::open(&path).unwrap().dimensions(), (7, 3));
    }

    #[test]
    fn unknown_extension_is_unsupported() {
        assert!(matches!(
            format_for(Path::new("a.xyz")),
            Err(ResizeError::UnsupportedFormat(_))
        ));
        assert_eq!(format_for(Path::new("a.JPEG")).unwrap(), ImageFormat::Jpeg);
        assert_eq!(format_for(Path::new("a.tiff")).unwrap(), ImageFormat::Tiff);
    }
}
