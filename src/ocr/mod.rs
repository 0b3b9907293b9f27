//! Text recognition for uploaded screenshots.
//!
//! Key items:
//! - `TextRecognizer` - Port turning image bytes into ordered text lines
//! - `TencentOcr` - Tencent Cloud `GeneralBasicOCR` adapter
//! - `sniff_image_format()` - Magic-number check run before any upload

mod tencent;

use async_trait::async_trait;
use strum_macros::Display;

use crate::error_handling::OcrError;

pub use tencent::{TencentCredentials, TencentOcr};

/// Turns an image into text lines, in reading order.
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    /// Recognizes the text in `image`.
    ///
    /// An image without text yields an empty list, not an error.
    async fn recognize(&self, image: &[u8]) -> Result<Vec<String>, OcrError>;
}

/// Image container formats accepted for recognition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum ImageFormat {
    /// PNG
    Png,
    /// JPEG / JFIF
    Jpeg,
    /// Windows bitmap
    Bmp,
    /// GIF87a / GIF89a
    Gif,
    /// RIFF WebP
    Webp,
    /// Little- or big-endian TIFF
    Tiff,
}

/// Identifies the image format from its leading bytes.
pub fn sniff_image_format(bytes: &[u8]) -> Option<ImageFormat> {
    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n";
    const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF];

    if bytes.starts_with(PNG) {
        Some(ImageFormat::Png)
    } else if bytes.starts_with(JPEG) {
        Some(ImageFormat::Jpeg)
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        Some(ImageFormat::Gif)
    } else if bytes.len() >= 12 && bytes.starts_with(b"RIFF") && &bytes[8..12] == b"WEBP" {
        Some(ImageFormat::Webp)
    } else if bytes.starts_with(b"II*\0") || bytes.starts_with(b"MM\0*") {
        Some(ImageFormat::Tiff)
    } else if bytes.starts_with(b"BM") {
        Some(ImageFormat::Bmp)
    } else {
        None
    }
}

/// Rejects input that cannot be an image before it is sent anywhere.
pub fn check_image(bytes: &[u8]) -> Result<ImageFormat, OcrError> {
    if bytes.is_empty() {
        return Err(OcrError::EmptyImage);
    }
    sniff_image_format(bytes).ok_or_else(|| {
        OcrError::InvalidImage("unrecognized image format (expected png, jpeg, bmp, gif, webp or tiff)".into())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_image_format() {
        assert_eq!(
            sniff_image_format(b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR"),
            Some(ImageFormat::Png)
        );
        assert_eq!(
            sniff_image_format(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00]),
            Some(ImageFormat::Jpeg)
        );
        assert_eq!(sniff_image_format(b"GIF89a...."), Some(ImageFormat::Gif));
        assert_eq!(
            sniff_image_format(b"RIFF\x24\0\0\0WEBPVP8 "),
            Some(ImageFormat::Webp)
        );
        assert_eq!(sniff_image_format(b"II*\0\x08\0"), Some(ImageFormat::Tiff));
        assert_eq!(sniff_image_format(b"BM\x36\0"), Some(ImageFormat::Bmp));
        assert_eq!(sniff_image_format(b"RIFF\x24\0\0\0WAVE"), None);
        assert_eq!(sniff_image_format(b"hello world"), None);
    }

    #[test]
    fn test_check_image() {
        assert_eq!(check_image(&[]), Err(OcrError::EmptyImage));
        assert!(matches!(
            check_image(b"%PDF-1.7"),
            Err(OcrError::InvalidImage(_))
        ));
        assert_eq!(check_image(b"GIF87a"), Ok(ImageFormat::Gif));
    }

    #[test]
    fn test_image_format_display() {
        assert_eq!(ImageFormat::Jpeg.to_string(), "jpeg");
    }
}
