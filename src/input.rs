//! Image inputs and how we normalize them for the engines.

use std::io::Cursor;

use image::{DynamicImage, GrayImage, ImageFormat, RgbImage, RgbaImage};

use crate::prelude::*;

/// File extensions we hand to an engine as-is, matched case-insensitively.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["gif", "png", "jpg", "jpeg", "tif", "tiff"];

/// Pixel layout of a raw [`ImageInput::Bitmap`] buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Luma8,
    Rgb8,
    Rgba8,
}

impl PixelFormat {
    /// Bytes per pixel.
    pub fn channels(self) -> usize {
        match self {
            PixelFormat::Luma8 => 1,
            PixelFormat::Rgb8 => 3,
            PixelFormat::Rgba8 => 4,
        }
    }
}

/// An image to recognize, in any of the representations we accept.
///
/// Non-path variants are normalized by encoding to PNG: to a temporary file
/// for the local engine, or to an in-memory buffer for the cloud engine.
/// Path inputs are passed through untouched.
#[derive(Debug)]
pub enum ImageInput {
    /// Path to an image file with an extension in [`SUPPORTED_EXTENSIONS`].
    Path(PathBuf),
    /// A raw pixel buffer of `width * height * channels` bytes.
    Bitmap {
        data: Vec<u8>,
        width: u32,
        height: u32,
        format: PixelFormat,
    },
    /// An already-decoded image.
    Decoded(DynamicImage),
}

impl From<PathBuf> for ImageInput {
    fn from(path: PathBuf) -> Self {
        ImageInput::Path(path)
    }
}

impl From<DynamicImage> for ImageInput {
    fn from(image: DynamicImage) -> Self {
        ImageInput::Decoded(image)
    }
}

impl ImageInput {
    /// Check that this input is usable, before any temporary file is created
    /// or any engine is invoked.
    ///
    /// Path inputs must carry a supported extension. Bitmap inputs must have
    /// a nonzero area and a buffer matching their declared dimensions.
    pub fn validate(&self) -> Result<()> {
        match self {
            ImageInput::Path(path) => {
                let extension = path
                    .extension()
                    .and_then(|e| e.to_str())
                    .map(|e| e.to_ascii_lowercase());
                match extension {
                    Some(ext) if SUPPORTED_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
                    _ => Err(OcrError::UnsupportedFormat { path: path.clone() }),
                }
            }
            ImageInput::Bitmap {
                data,
                width,
                height,
                format,
            } => {
                if *width == 0 || *height == 0 {
                    return Err(OcrError::invalid_input(format!(
                        "bitmap has zero area ({width}x{height})"
                    )));
                }
                let expected = (*width as usize)
                    .checked_mul(*height as usize)
                    .and_then(|pixels| pixels.checked_mul(format.channels()))
                    .ok_or_else(|| {
                        OcrError::invalid_input(format!(
                            "bitmap dimensions {width}x{height} overflow"
                        ))
                    })?;
                if data.len() != expected {
                    return Err(OcrError::invalid_input(format!(
                        "bitmap buffer is {} bytes but {width}x{height} {format:?} \
                         requires {expected}",
                        data.len()
                    )));
                }
                Ok(())
            }
            ImageInput::Decoded(_) => Ok(()),
        }
    }

    /// Get the bytes to send to a remote engine.
    ///
    /// Path inputs are read as-is; the file is already in a supported format.
    /// Bitmap and decoded inputs are encoded to PNG in memory.
    pub(crate) fn to_engine_bytes(&self) -> Result<Vec<u8>> {
        self.validate()?;
        match self {
            ImageInput::Path(path) => Ok(std::fs::read(path)?),
            ImageInput::Bitmap { .. } => encode_png(&self.to_dynamic()?),
            ImageInput::Decoded(image) => encode_png(image),
        }
    }

    /// Get a path to hand to a local engine, staging non-path inputs as a
    /// PNG file under `dir`. The caller owns `dir` and its cleanup.
    pub(crate) fn stage_for_command(&self, dir: &Path) -> Result<PathBuf> {
        self.validate()?;
        match self {
            ImageInput::Path(path) => Ok(path.clone()),
            _ => {
                let staged = dir.join("input.png");
                std::fs::write(&staged, self.to_engine_bytes()?)?;
                Ok(staged)
            }
        }
    }

    /// Reassemble a validated bitmap into a [`DynamicImage`].
    fn to_dynamic(&self) -> Result<DynamicImage> {
        let ImageInput::Bitmap {
            data,
            width,
            height,
            format,
        } = self
        else {
            return Err(OcrError::invalid_input("not a raw bitmap"));
        };
        let image = match format {
            PixelFormat::Luma8 => {
                GrayImage::from_raw(*width, *height, data.clone()).map(DynamicImage::ImageLuma8)
            }
            PixelFormat::Rgb8 => {
                RgbImage::from_raw(*width, *height, data.clone()).map(DynamicImage::ImageRgb8)
            }
            PixelFormat::Rgba8 => {
                RgbaImage::from_raw(*width, *height, data.clone()).map(DynamicImage::ImageRgba8)
            }
        };
        image.ok_or_else(|| {
            OcrError::invalid_input(format!(
                "bitmap buffer does not fill {width}x{height} {format:?}"
            ))
        })
    }
}

/// Encode a decoded image to an in-memory PNG.
fn encode_png(image: &DynamicImage) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    image.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)?;
    Ok(buffer)
}
