use crate::{Error, Result};
use image::{DynamicImage, GrayImage, RgbImage, RgbaImage, codecs::jpeg::JpegEncoder};
use tracing::debug;

pub const JPEG_MIME: &str = "image/jpeg";

/// A captured image in whatever form the caller holds it.
#[derive(Debug, Clone)]
pub enum ImageInput {
    Rgb8 {
        width: u32,
        height: u32,
        pixels: Vec<u8>,
    },
    Rgba8 {
        width: u32,
        height: u32,
        pixels: Vec<u8>,
    },
    Luma8 {
        width: u32,
        height: u32,
        pixels: Vec<u8>,
    },
    /// Bytes of an encoded image (PNG, JPEG); decoded and re-encoded before upload.
    Encoded(Vec<u8>),
}

impl ImageInput {
    fn into_dynamic(self) -> Result<DynamicImage> {
        match self {
            Self::Rgb8 {
                width,
                height,
                pixels,
            } => {
                check_dimensions(width, height, 3, pixels.len())?;
                RgbImage::from_raw(width, height, pixels)
                    .map(DynamicImage::ImageRgb8)
                    .ok_or_else(|| Error::validation("RGB buffer does not match dimensions"))
            }
            Self::Rgba8 {
                width,
                height,
                pixels,
            } => {
                check_dimensions(width, height, 4, pixels.len())?;
                RgbaImage::from_raw(width, height, pixels)
                    .map(DynamicImage::ImageRgba8)
                    .ok_or_else(|| Error::validation("RGBA buffer does not match dimensions"))
            }
            Self::Luma8 {
                width,
                height,
                pixels,
            } => {
                check_dimensions(width, height, 1, pixels.len())?;
                GrayImage::from_raw(width, height, pixels)
                    .map(DynamicImage::ImageLuma8)
                    .ok_or_else(|| Error::validation("grayscale buffer does not match dimensions"))
            }
            Self::Encoded(bytes) => {
                if bytes.is_empty() {
                    return Err(Error::validation("image is empty"));
                }
                Ok(image::load_from_memory(&bytes)?)
            }
        }
    }
}

fn check_dimensions(width: u32, height: u32, channels: usize, len: usize) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(Error::validation(format!(
            "image dimensions must be non-zero, got {}x{}",
            width, height
        )));
    }

    let expected = width as usize * height as usize * channels;
    if len != expected {
        return Err(Error::validation(format!(
            "pixel buffer has {} bytes, expected {} for {}x{}",
            len, expected, width, height
        )));
    }

    Ok(())
}

/// Encodes `input` as a baseline JPEG. Alpha is dropped; grayscale is widened to RGB.
pub fn encode_jpeg(input: ImageInput, quality: u8) -> Result<Vec<u8>> {
    if !(1..=100).contains(&quality) {
        return Err(Error::validation(format!(
            "JPEG quality must be between 1 and 100, got {}",
            quality
        )));
    }

    let rgb = DynamicImage::ImageRgb8(input.into_dynamic()?.to_rgb8());

    let mut bytes = Vec::new();
    rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut bytes, quality))?;

    debug!(
        "Encoded {}x{} image to {} JPEG bytes at quality {}",
        rgb.width(),
        rgb.height(),
        bytes.len(),
        quality
    );
    Ok(bytes)
}
