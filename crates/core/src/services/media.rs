//! Image inspection for uploaded post images.

use std::io::Cursor;

use image::ImageReader;
use serde::Serialize;

use yatube_common::{AppError, AppResult};

/// Accepted image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// JPEG format
    Jpeg,
    /// PNG format
    Png,
    /// WebP format
    WebP,
    /// GIF format
    Gif,
}

impl ImageFormat {
    /// Get MIME type for this format.
    #[must_use]
    pub const fn mime_type(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::WebP => "image/webp",
            Self::Gif => "image/gif",
        }
    }

    /// Get file extension for this format.
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::WebP => "webp",
            Self::Gif => "gif",
        }
    }

    const fn from_image_format(format: image::ImageFormat) -> Option<Self> {
        match format {
            image::ImageFormat::Jpeg => Some(Self::Jpeg),
            image::ImageFormat::Png => Some(Self::Png),
            image::ImageFormat::WebP => Some(Self::WebP),
            image::ImageFormat::Gif => Some(Self::Gif),
            _ => None,
        }
    }
}

/// What an uploaded image turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImageInfo {
    /// Detected format
    pub format: ImageFormat,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

/// Check that `data` is a decodable image in an accepted format.
///
/// The format is sniffed from the bytes; the client's file name and
/// content type are not trusted.
pub fn inspect_image(data: &[u8]) -> AppResult<ImageInfo> {
    let reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| AppError::Validation(format!("Unreadable image: {e}")))?;

    let format = reader
        .format()
        .and_then(ImageFormat::from_image_format)
        .ok_or_else(|| AppError::Validation("Unknown or unsupported image format".to_string()))?;

    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| AppError::Validation(format!("Corrupt image: {e}")))?;

    Ok(ImageInfo {
        format,
        width,
        height,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;

    /// A 2x1 GIF.
    pub(crate) const SMALL_GIF: &[u8] = &[
        0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x02, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, 0x00, 0x00,
        0x00, 0xFF, 0xFF, 0xFF, 0x21, 0xF9, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x2C, 0x00, 0x00,
        0x00, 0x00, 0x02, 0x00, 0x01, 0x00, 0x00, 0x02, 0x02, 0x0C, 0x0A, 0x00, 0x3B,
    ];

    #[test]
    fn test_inspect_gif() {
        let info = inspect_image(SMALL_GIF).unwrap();
        assert_eq!(info.format, ImageFormat::Gif);
        assert_eq!((info.width, info.height), (2, 1));
        assert_eq!(info.format.mime_type(), "image/gif");
    }

    #[test]
    fn test_rejects_text() {
        let result = inspect_image(b"definitely not an image");
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_rejects_truncated_gif() {
        assert!(inspect_image(&SMALL_GIF[..8]).is_err());
    }
}
