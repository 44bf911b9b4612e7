//! Raster decoding, resizing and JPEG re-encoding.
//!
//! Everything here is CPU bound and synchronous; callers run it on the
//! blocking pool.

use std::io::Cursor;

use bytes::Bytes;
use image::{
    DynamicImage, ImageDecoder, ImageError, ImageReader, codecs::jpeg::JpegEncoder,
    imageops::FilterType,
};
use thiserror::Error;

use crate::domain::media::{JPEG_QUALITY, MEDIUM_THUMBNAIL_WIDTH, SMALL_THUMBNAIL_WIDTH};

#[derive(Debug, Error)]
pub enum ImagingError {
    #[error("failed to decode image")]
    Decode(#[source] ImageError),
    #[error("failed to encode image")]
    Encode(#[source] ImageError),
    #[error("image has no pixels")]
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub bytes: Bytes,
    pub width: u32,
    pub height: u32,
}

/// Main artifact plus both thumbnails, all in the canonical format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedImage {
    pub width: u32,
    pub height: u32,
    pub main: EncodedImage,
    pub small: EncodedImage,
    pub medium: EncodedImage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageProcessor {
    quality: u8,
    small_width: u32,
    medium_width: u32,
}

impl Default for ImageProcessor {
    fn default() -> Self {
        Self {
            quality: JPEG_QUALITY,
            small_width: SMALL_THUMBNAIL_WIDTH,
            medium_width: MEDIUM_THUMBNAIL_WIDTH,
        }
    }
}

impl ImageProcessor {
    pub fn new(quality: u8, small_width: u32, medium_width: u32) -> Self {
        Self {
            quality: quality.clamp(1, 100),
            small_width,
            medium_width,
        }
    }

    pub fn process(&self, data: &[u8]) -> Result<ProcessedImage, ImagingError> {
        let image = decode_oriented(data)?;
        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 {
            return Err(ImagingError::Empty);
        }

        let main = self.encode(&image)?;
        let small = self.encode(&resize_to_width(&image, self.small_width))?;
        let medium = self.encode(&resize_to_width(&image, self.medium_width))?;

        Ok(ProcessedImage {
            width,
            height,
            main,
            small,
            medium,
        })
    }

    pub fn encode(&self, image: &DynamicImage) -> Result<EncodedImage, ImagingError> {
        // JPEG has no alpha channel.
        let rgb = image.to_rgb8();
        let mut buffer = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut buffer, self.quality);
        rgb.write_with_encoder(encoder)
            .map_err(ImagingError::Encode)?;

        Ok(EncodedImage {
            bytes: Bytes::from(buffer),
            width: rgb.width(),
            height: rgb.height(),
        })
    }
}

/// Decode and rotate/flip according to the stored orientation tag so the
/// pixel grid matches what a viewer displays.
pub fn decode_oriented(data: &[u8]) -> Result<DynamicImage, ImagingError> {
    let reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|err| ImagingError::Decode(ImageError::IoError(err)))?;
    let mut decoder = reader.into_decoder().map_err(ImagingError::Decode)?;
    let orientation = decoder.orientation().map_err(ImagingError::Decode)?;
    let mut image = DynamicImage::from_decoder(decoder).map_err(ImagingError::Decode)?;
    image.apply_orientation(orientation);
    Ok(image)
}

/// Downscale to `target` width keeping the aspect ratio. Narrower images are
/// returned unscaled.
pub fn resize_to_width(image: &DynamicImage, target: u32) -> DynamicImage {
    let (width, height) = (image.width(), image.height());
    if width <= target {
        return image.clone();
    }
    image.resize_exact(
        target,
        scaled_height(width, height, target),
        FilterType::Lanczos3,
    )
}

pub fn scaled_height(width: u32, height: u32, target_width: u32) -> u32 {
    if width == 0 {
        return height.max(1);
    }
    let exact = f64::from(height) * f64::from(target_width) / f64::from(width);
    ((exact + 0.5).floor() as u32).max(1)
}
