//! keyframe-core: shared image plumbing for Keyframe.
//!
//! Everything that crosses a crate boundary as "a picture" goes through
//! [`EncodedImage`]: the artboard exports it, pose sources return it, and the
//! session records where it was written.

use std::fmt;
use std::io::Cursor;

use image::{ImageFormat, RgbaImage};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, trace};

/// Pixel dimensions of a raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width over height. Zero-height rasters report an aspect of 0.
    pub fn aspect_ratio(&self) -> f64 {
        if self.height == 0 {
            return 0.0;
        }
        f64::from(self.width) / f64::from(self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A self-describing encoded raster (PNG when produced by us, anything the
/// `image` crate understands when handed in from outside).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncodedImage(Vec<u8>);

impl EncodedImage {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Encode an RGBA buffer as PNG. Lossless, so `decode` gives back the
    /// exact same pixels.
    pub fn encode_png(image: &RgbaImage) -> Result<Self, CodecError> {
        let mut buf = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .map_err(CodecError::Encode)?;
        debug!(
            width = image.width(),
            height = image.height(),
            bytes = buf.len(),
            "encoded png"
        );
        Ok(Self(buf))
    }

    /// Decode into straight-alpha RGBA8.
    pub fn decode(&self) -> Result<RgbaImage, CodecError> {
        trace!(bytes = self.0.len(), "decoding image");
        let decoded = image::load_from_memory(&self.0).map_err(CodecError::Decode)?;
        let rgba = decoded.to_rgba8();
        if rgba.width() == 0 || rgba.height() == 0 {
            return Err(CodecError::EmptyImage {
                width: rgba.width(),
                height: rgba.height(),
            });
        }
        Ok(rgba)
    }
}

// Raw bytes are noise in logs and assertion failures.
impl fmt::Debug for EncodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EncodedImage({} bytes)", self.0.len())
    }
}

/// Errors turning bytes into pixels and back.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("failed to encode image: {0}")]
    Encode(#[source] image::ImageError),

    #[error("image has no pixels ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn png_roundtrip_is_lossless() {
        let mut img = RgbaImage::from_pixel(4, 3, Rgba([255, 255, 255, 255]));
        img.put_pixel(1, 2, Rgba([12, 34, 56, 255]));
        img.put_pixel(3, 0, Rgba([200, 0, 100, 128]));

        let encoded = EncodedImage::encode_png(&img).unwrap();
        let decoded = encoded.decode().unwrap();

        assert_eq!(decoded, img);
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let err = EncodedImage::from_bytes(vec![1, 2, 3, 4])
            .decode()
            .unwrap_err();
        assert!(matches!(err, CodecError::Decode(_)));
        assert!(err.to_string().contains("failed to decode image"));
    }

    #[test]
    fn aspect_ratio_handles_zero_height() {
        assert_eq!(Dimensions::new(10, 0).aspect_ratio(), 0.0);
        assert_eq!(Dimensions::new(512, 256).aspect_ratio(), 2.0);
        assert!(Dimensions::new(0, 5).is_empty());
        assert_eq!(Dimensions::new(3, 4).to_string(), "3x4");
    }

    #[test]
    fn debug_does_not_dump_bytes() {
        let img = EncodedImage::from_bytes(vec![0u8; 10]);
        assert_eq!(format!("{img:?}"), "EncodedImage(10 bytes)");
    }
}
