//! Image decoding, exact-size resizing, and JPEG re-encoding.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;
use std::io::Cursor;
use std::str::FromStr;

use crate::config::ResizeConfig;
use crate::error::{CodecError, ConfigError};

/// Resampling filters allowed for thumbnails.
///
/// Only windowed-sinc and cubic kernels are offered. Nearest, triangle and
/// gaussian either alias or blur visibly at thumbnail scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResizeFilter {
    #[default]
    Lanczos3,
    CatmullRom,
}

impl ResizeFilter {
    fn filter_type(self) -> FilterType {
        match self {
            ResizeFilter::Lanczos3 => FilterType::Lanczos3,
            ResizeFilter::CatmullRom => FilterType::CatmullRom,
        }
    }
}

impl FromStr for ResizeFilter {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lanczos3" | "lanczos" => Ok(ResizeFilter::Lanczos3),
            "catmullrom" | "cubic" => Ok(ResizeFilter::CatmullRom),
            other => Err(ConfigError::ValidationError(format!(
                "resize.filter '{other}' is not supported (expected lanczos3 or catmullrom)"
            ))),
        }
    }
}

/// Decodes arbitrary raster images and produces fixed-size JPEG thumbnails.
#[derive(Debug, Clone)]
pub struct ImageCodec {
    filter: ResizeFilter,
    jpeg_quality: u8,
}

impl ImageCodec {
    pub fn new(filter: ResizeFilter, jpeg_quality: u8) -> Self {
        Self {
            filter,
            jpeg_quality: jpeg_quality.clamp(1, 100),
        }
    }

    /// Build a codec from the `[resize]` section.
    pub fn from_config(config: &ResizeConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(config.filter.parse()?, config.jpeg_quality))
    }

    /// Decode an image, detecting the format from its content.
    pub fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, CodecError> {
        let reader = image::ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| CodecError::Decode(format!("Cannot detect image format: {e}")))?;
        if reader.format().is_none() {
            return Err(CodecError::Decode("Unrecognized image format".to_string()));
        }
        reader
            .decode()
            .map_err(|e| CodecError::Decode(e.to_string()))
    }

    /// Resize to exactly `width` x `height`, ignoring the source aspect ratio.
    ///
    /// Upscaling is allowed.
    pub fn resize(
        &self,
        image: &DynamicImage,
        width: u32,
        height: u32,
    ) -> Result<DynamicImage, CodecError> {
        if width == 0 || height == 0 {
            return Err(CodecError::InvalidDimensions { width, height });
        }
        Ok(image.resize_exact(width, height, self.filter.filter_type()))
    }

    /// Encode as baseline JPEG. Alpha is dropped.
    pub fn encode_jpeg(&self, image: &DynamicImage) -> Result<Vec<u8>, CodecError> {
        let rgb = image.to_rgb8();
        let mut buffer = Vec::new();
        JpegEncoder::new_with_quality(&mut buffer, self.jpeg_quality)
            .encode_image(&rgb)
            .map_err(|e| CodecError::Encode(e.to_string()))?;
        Ok(buffer)
    }

    /// Decode `bytes`, resize, and re-encode as JPEG in one call.
    pub fn thumbnail(&self, bytes: &[u8], width: u32, height: u32) -> Result<Vec<u8>, CodecError> {
        let image = self.decode(bytes)?;
        tracing::trace!(
            "  Source {}x{} -> {}x{}",
            image.width(),
            image.height(),
            width,
            height
        );
        let resized = self.resize(&image, width, height)?;
        self.encode_jpeg(&resized)
    }
}

impl Default for ImageCodec {
    fn default() -> Self {
        Self::new(ResizeFilter::default(), 75)
    }
}
