use std::{io::Cursor, path::Path};

use bytes::Bytes;
use image::{codecs::jpeg::JpegEncoder, imageops::FilterType, GenericImageView};
use lazy_static::lazy_static;
use regex::Regex;

pub const COMPRESSED_SUFFIX: &str = "_compressed";
pub const OUTPUT_EXTENSION: &str = "jpg";
pub const OUTPUT_CONTENT_TYPE: &str = "image/jpeg";

#[derive(Debug, Clone, Copy)]
pub struct NormalizeOptions {
    pub quality: u8,
    pub max_width: u32,
    pub max_height: u32,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            quality: 85,
            max_width: 800,
            max_height: 800,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("cannot decode image: {0}")]
    InvalidImage(#[source] image::ImageError),
    #[error("cannot encode image: {0}")]
    Encode(#[source] image::ImageError),
}

#[derive(Debug, Clone)]
pub struct NormalizedImage {
    pub filename: String,
    pub content_type: &'static str,
    pub width: u32,
    pub height: u32,
    pub body: Bytes,
}

/// Decodes `raw`, flattens it to opaque RGB, shrinks it into the configured
/// box and re-encodes it as JPEG.
pub fn normalize_image(
    raw: &[u8],
    original_name: &str,
    opts: &NormalizeOptions,
) -> Result<NormalizedImage, ImageError> {
    let img = image::load_from_memory(raw).map_err(ImageError::InvalidImage)?;
    let (w, h) = img.dimensions();

    let img = match bounded_size(w, h, opts.max_width, opts.max_height) {
        Some((nw, nh)) => img.resize_exact(nw, nh, FilterType::Lanczos3),
        None => img,
    };

    // alpha and palette modes flatten to opaque truecolor
    let rgb = img.to_rgb8();
    let (width, height) = rgb.dimensions();

    let mut out = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut out, opts.quality);
    rgb.write_with_encoder(encoder).map_err(ImageError::Encode)?;

    Ok(NormalizedImage {
        filename: compressed_filename(original_name),
        content_type: OUTPUT_CONTENT_TYPE,
        width,
        height,
        body: Bytes::from(out.into_inner()),
    })
}

/// Target size when `w x h` overflows the box, scaled by the smaller of the
/// two ratios. `None` means the image already fits and is left alone.
pub fn bounded_size(w: u32, h: u32, max_w: u32, max_h: u32) -> Option<(u32, u32)> {
    let (max_w, max_h) = (max_w.max(1), max_h.max(1));
    if w <= max_w && h <= max_h {
        return None;
    }
    let scale = f64::min(max_w as f64 / w as f64, max_h as f64 / h as f64);
    let nw = ((w as f64 * scale) as u32).clamp(1, max_w);
    let nh = ((h as f64 * scale) as u32).clamp(1, max_h);
    Some((nw, nh))
}

/// `"IMG 0042.png"` becomes `"IMG_0042_compressed.jpg"`.
pub fn compressed_filename(original_name: &str) -> String {
    lazy_static! {
        static ref UNSAFE: Regex = Regex::new(r"[^A-Za-z0-9._-]+").unwrap();
    }
    let stem = Path::new(original_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    let stem = UNSAFE.replace_all(stem, "_");
    let stem = stem.trim_matches(|c| c == '.' || c == '_');
    let stem = if stem.is_empty() { "upload" } else { stem };
    format!("{}{}.{}", stem, COMPRESSED_SUFFIX, OUTPUT_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};

    fn encode(img: DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, format).unwrap();
        buf.into_inner()
    }

    fn png_with_alpha(w: u32, h: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(w, h, Rgba([10, 200, 30, 128]));
        encode(DynamicImage::ImageRgba8(img), ImageFormat::Png)
    }

    #[test]
    fn large_image_is_shrunk_into_the_box() {
        let raw = png_with_alpha(1600, 1200);
        let out = normalize_image(&raw, "progress.png", &NormalizeOptions::default()).unwrap();
        assert_eq!((out.width, out.height), (800, 600));
        assert_eq!(out.filename, "progress_compressed.jpg");
        assert_eq!(out.content_type, "image/jpeg");

        let decoded = image::load_from_memory(&out.body).unwrap();
        assert_eq!(image::guess_format(&out.body).unwrap(), ImageFormat::Jpeg);
        assert_eq!(decoded.dimensions(), (800, 600));
        assert!(!decoded.color().has_alpha());
    }

    #[test]
    fn tall_image_uses_height_ratio() {
        let raw = png_with_alpha(300, 1000);
        let out = normalize_image(&raw, "tall.png", &NormalizeOptions::default()).unwrap();
        assert_eq!((out.width, out.height), (240, 800));
    }

    #[test]
    fn small_image_is_not_upscaled() {
        let raw = png_with_alpha(120, 80);
        let out = normalize_image(&raw, "small.png", &NormalizeOptions::default()).unwrap();
        assert_eq!((out.width, out.height), (120, 80));
    }

    #[test]
    fn garbage_bytes_are_rejected() {
        let err = normalize_image(b"definitely not an image", "x.jpg", &NormalizeOptions::default())
            .unwrap_err();
        assert!(matches!(err, ImageError::InvalidImage(_)));
    }

    #[test]
    fn bounded_size_never_exceeds_bounds() {
        for (w, h) in [(801, 800), (5000, 3), (3, 5000), (1920, 1080), (800, 801)] {
            let (nw, nh) = bounded_size(w, h, 800, 800).unwrap();
            assert!(nw <= 800 && nh <= 800, "{}x{} -> {}x{}", w, h, nw, nh);
            assert!(nw >= 1 && nh >= 1);
        }
        assert_eq!(bounded_size(800, 800, 800, 800), None);
        assert_eq!(bounded_size(1, 1, 800, 800), None);
    }

    #[test]
    fn zero_bounds_shrink_to_a_single_pixel() {
        assert_eq!(bounded_size(640, 480, 0, 0), Some((1, 1)));
        assert_eq!(bounded_size(1, 1, 0, 800), None);
    }

    #[test]
    fn filenames() {
        assert_eq!(compressed_filename("photo.PNG"), "photo_compressed.jpg");
        assert_eq!(compressed_filename("IMG 0042.webp"), "IMG_0042_compressed.jpg");
        assert_eq!(compressed_filename("../../etc/passwd"), "passwd_compressed.jpg");
        assert_eq!(compressed_filename(""), "upload_compressed.jpg");
    }
}
