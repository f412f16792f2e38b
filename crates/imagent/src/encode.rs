// Image file helpers

use crate::Result;
use base64::Engine;
use image::ImageFormat;
use std::io::Cursor;
use std::path::Path;

/// Read any supported image file, re-encode it as PNG and return base64.
///
/// Images with an alpha channel stay RGBA; everything else becomes RGB.
pub fn file_to_base64(path: impl AsRef<Path>) -> Result<String> {
    let img = image::open(path.as_ref())?;
    let img = if img.color().has_alpha() {
        image::DynamicImage::ImageRgba8(img.to_rgba8())
    } else {
        image::DynamicImage::ImageRgb8(img.to_rgb8())
    };

    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png)?;
    Ok(base64::engine::general_purpose::STANDARD.encode(buf.into_inner()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb, Rgba};

    #[test]
    fn test_rgb_round_trip_to_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.jpg");
        let img: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::from_pixel(8, 8, Rgb([200, 10, 10]));
        img.save(&path).unwrap();

        let encoded = file_to_base64(&path).unwrap();
        let bytes = base64::engine::general_purpose::STANDARD.decode(encoded).unwrap();
        let decoded = image::load_from_memory_with_format(&bytes, ImageFormat::Png).unwrap();
        assert_eq!(decoded.width(), 8);
        assert!(!decoded.color().has_alpha());
    }

    #[test]
    fn test_alpha_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.png");
        let img: ImageBuffer<Rgba<u8>, Vec<u8>> =
            ImageBuffer::from_pixel(4, 4, Rgba([0, 0, 0, 128]));
        img.save(&path).unwrap();

        let encoded = file_to_base64(&path).unwrap();
        let bytes = base64::engine::general_purpose::STANDARD.decode(encoded).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert!(decoded.color().has_alpha());
    }

    #[test]
    fn test_missing_file() {
        assert!(file_to_base64("/definitely/not/here.png").is_err());
    }
}
