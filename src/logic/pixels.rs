//! Pixel Buffer - Image decoding collaborator
//!
//! Decodes an encoded thumbnail exactly once into an interleaved 8-bit
//! buffer that the OCR, feature and steganography stages all read.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, ImageReader, Limits};
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

/// Image payload could not be turned into pixels
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeFailure {
    #[error("empty image payload")]
    Empty,
    #[error("unrecognized image format: {0}")]
    UnknownFormat(String),
    #[error("image decode failed: {0}")]
    Malformed(String),
    #[error("image has zero area ({width}x{height})")]
    ZeroArea { width: u32, height: u32 },
}

pub type DecodeResult = Result<DecodedImage, DecodeFailure>;

// ============================================================================
// PIXEL BUFFER
// ============================================================================

/// Interleaved 8-bit pixels, `channels` samples per pixel
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    pub width: u32,
    pub height: u32,
    pub channels: u8,
    pub data: Vec<u8>,
}

impl PixelBuffer {
    /// Build from raw samples; `None` if the length does not match
    pub fn from_raw(width: u32, height: u32, channels: u8, data: Vec<u8>) -> Option<Self> {
        let expected = width as usize * height as usize * channels as usize;
        if channels == 0 || data.len() != expected {
            return None;
        }
        Some(Self { width, height, channels, data })
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn is_multichannel(&self) -> bool {
        self.channels > 1
    }

    /// Samples of one channel, in pixel order
    pub fn channel(&self, index: usize) -> impl Iterator<Item = u8> + '_ {
        self.data
            .iter()
            .skip(index)
            .step_by(self.channels.max(1) as usize)
            .copied()
    }

    /// Single-channel intensity (ITU-R 601 luma for colour images)
    pub fn to_luma(&self) -> PixelBuffer {
        let data: Vec<u8> = match self.channels {
            1 => self.data.clone(),
            2 => self.channel(0).collect(),
            n => self
                .data
                .chunks_exact(n as usize)
                .map(|px| {
                    let y = 0.299 * px[0] as f32 + 0.587 * px[1] as f32 + 0.114 * px[2] as f32;
                    y.round().clamp(0.0, 255.0) as u8
                })
                .collect(),
        };

        PixelBuffer {
            width: self.width,
            height: self.height,
            channels: 1,
            data,
        }
    }
}

/// Pixels plus the size of the payload they came from
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedImage {
    pub pixels: PixelBuffer,
    pub encoded_len: usize,
}

// ============================================================================
// DECODING
// ============================================================================

/// Decode an encoded image.
///
/// `mime` is only a hint: when the hinted format fails the format is
/// sniffed from the bytes.
pub fn decode_image(bytes: &[u8], mime: Option<&str>, max_dimension: u32) -> DecodeResult {
    if bytes.is_empty() {
        return Err(DecodeFailure::Empty);
    }

    let hinted = mime.and_then(ImageFormat::from_mime_type);

    let image = match hinted {
        Some(format) => match decode_with(bytes, Some(format), max_dimension) {
            Ok(image) => image,
            Err(e) => {
                log::debug!("Decode as {:?} failed ({}), sniffing format", format, e);
                decode_with(bytes, None, max_dimension)?
            }
        },
        None => decode_with(bytes, None, max_dimension)?,
    };

    let pixels = to_pixel_buffer(&image);
    if pixels.pixel_count() == 0 {
        return Err(DecodeFailure::ZeroArea {
            width: pixels.width,
            height: pixels.height,
        });
    }

    Ok(DecodedImage {
        pixels,
        encoded_len: bytes.len(),
    })
}

fn decode_with(
    bytes: &[u8],
    format: Option<ImageFormat>,
    max_dimension: u32,
) -> Result<DynamicImage, DecodeFailure> {
    let mut reader = ImageReader::new(Cursor::new(bytes));
    match format {
        Some(format) => reader.set_format(format),
        None => {
            reader = reader
                .with_guessed_format()
                .map_err(|e| DecodeFailure::Malformed(e.to_string()))?;
        }
    }

    if reader.format().is_none() {
        return Err(DecodeFailure::UnknownFormat(sniff_prefix(bytes)));
    }

    let mut limits = Limits::default();
    limits.max_image_width = Some(max_dimension);
    limits.max_image_height = Some(max_dimension);
    reader.limits(limits);

    reader
        .decode()
        .map_err(|e| DecodeFailure::Malformed(e.to_string()))
}

/// Normalize any decoded colour type to 8-bit samples, keeping the channel count
fn to_pixel_buffer(image: &DynamicImage) -> PixelBuffer {
    let (width, height) = (image.width(), image.height());
    let channels = image.color().channel_count();

    let data = match channels {
        1 => image.to_luma8().into_raw(),
        2 => image.to_luma_alpha8().into_raw(),
        3 => image.to_rgb8().into_raw(),
        _ => image.to_rgba8().into_raw(),
    };

    PixelBuffer {
        width,
        height,
        channels: channels.clamp(1, 4),
        data,
    }
}

fn sniff_prefix(bytes: &[u8]) -> String {
    hex::encode(&bytes[..bytes.len().min(8)])
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

#[cfg(test)]
pub(crate) mod fixtures {
    use image::{DynamicImage, GrayImage, ImageFormat, RgbImage, RgbaImage};
    use std::io::Cursor;

    pub fn encode_png(image: DynamicImage) -> Vec<u8> {
        let mut buf = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    /// Smooth diagonal gradient, channels strongly correlated
    pub fn gradient_rgb(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| {
            let v = ((x + y) * 255 / (width + height).max(1)) as u8;
            image::Rgb([v, v / 2 + 10, v / 3 + 20])
        });
        encode_png(DynamicImage::ImageRgb8(img))
    }

    /// Solid colour; every LSB is 0
    pub fn solid_rgb(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, image::Rgb(color));
        encode_png(DynamicImage::ImageRgb8(img))
    }

    /// Channels filled from independent pseudo-random streams
    pub fn noisy_rgb(width: u32, height: u32) -> Vec<u8> {
        let mut state: u32 = 0x1234_5678;
        let mut next = move || {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state & 0xff) as u8
        };
        let img = RgbImage::from_fn(width, height, |_, _| image::Rgb([next(), next(), next()]));
        encode_png(DynamicImage::ImageRgb8(img))
    }

    pub fn solid_gray(width: u32, height: u32, value: u8) -> Vec<u8> {
        let img = GrayImage::from_pixel(width, height, image::Luma([value]));
        encode_png(DynamicImage::ImageLuma8(img))
    }

    /// Every gray level equally often: a perfectly uniform histogram
    pub fn uniform_gray() -> Vec<u8> {
        let img = GrayImage::from_fn(256, 4, |x, _| image::Luma([x as u8]));
        encode_png(DynamicImage::ImageLuma8(img))
    }

    pub fn checker_rgba(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_fn(width, height, |x, y| {
            if (x / 4 + y / 4) % 2 == 0 {
                image::Rgba([255, 255, 255, 255])
            } else {
                image::Rgba([0, 0, 0, 255])
            }
        });
        encode_png(DynamicImage::ImageRgba8(img))
    }
}

// ============================================================================
// TESTS
// ============================================================================
