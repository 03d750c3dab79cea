//! Payload decoding: data-URI prefix, base64, image container, RGB pixels.
//!
//! Every decoded frame is normalized to tightly packed RGB8, red first. Alpha
//! is dropped. The display path consumes this layout as-is.

use std::{borrow::Cow, io::Cursor};

use base64::{Engine, engine::general_purpose::STANDARD};
use image::{ExtendedColorType, ImageFormat, RgbImage};

use crate::error::FrameError;

/// Media-type header a browser canvas puts in front of `toDataURL("image/png")`.
pub const DATA_URI_PREFIX: &str = "data:image/png;base64,";

const CHANNELS: usize = 3;

/// A decoded image, row-major, 3 bytes per pixel in R, G, B order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbFrame {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl RgbFrame {
    /// Returns `None` when `pixels` is not exactly `width * height * 3` bytes.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Option<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)?
            .checked_mul(CHANNELS)?;
        (pixels.len() == expected).then_some(RgbFrame {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Bytes per row.
    pub fn pitch(&self) -> usize {
        self.width as usize * CHANNELS
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let at = y as usize * self.pitch() + x as usize * CHANNELS;
        Some([self.pixels[at], self.pixels[at + 1], self.pixels[at + 2]])
    }

    /// Pixels grouped by row, handy for comparing small frames.
    pub fn rows(&self) -> Vec<Vec<[u8; 3]>> {
        if self.width == 0 {
            return Vec::new();
        }
        self.pixels
            .chunks_exact(self.pitch())
            .map(|row| {
                row.chunks_exact(CHANNELS)
                    .map(|px| [px[0], px[1], px[2]])
                    .collect()
            })
            .collect()
    }
}

/// A decoded frame tagged with the connection it arrived on.
#[derive(Debug, Clone)]
pub struct Frame {
    pub connection: u64,
    /// 0-based position within the connection.
    pub sequence: u64,
    pub image: RgbFrame,
}

impl From<RgbImage> for RgbFrame {
    fn from(image: RgbImage) -> Self {
        let (width, height) = image.dimensions();
        RgbFrame {
            width,
            height,
            pixels: image.into_raw(),
        }
    }
}

/// Removes every occurrence of [`DATA_URI_PREFIX`], not only a leading one.
pub fn strip_data_uri(payload: &str) -> Cow<'_, str> {
    if payload.contains(DATA_URI_PREFIX) {
        Cow::Owned(payload.replace(DATA_URI_PREFIX, ""))
    } else {
        Cow::Borrowed(payload)
    }
}

pub fn decode_base64(payload: &str) -> Result<Vec<u8>, FrameError> {
    let trimmed = payload.trim_matches(|c: char| c.is_ascii_whitespace());
    Ok(STANDARD.decode(trimmed)?)
}

/// Sniffs the container format, so anything the `image` crate reads is accepted.
pub fn decode_image(bytes: &[u8]) -> Result<RgbFrame, FrameError> {
    let image = image::load_from_memory(bytes)?;
    Ok(image.into_rgb8().into())
}

/// Text message to pixels: strip prefix, base64 decode, image decode.
pub fn decode_payload(payload: &str) -> Result<RgbFrame, FrameError> {
    let stripped = strip_data_uri(payload);
    let bytes = decode_base64(&stripped)?;
    decode_image(&bytes)
}

pub fn encode_png(frame: &RgbFrame) -> Result<Vec<u8>, FrameError> {
    let mut out = Cursor::new(Vec::new());
    image::write_buffer_with_format(
        &mut out,
        frame.pixels(),
        frame.width(),
        frame.height(),
        ExtendedColorType::Rgb8,
        ImageFormat::Png,
    )
    .map_err(FrameError::Encode)?;
    Ok(out.into_inner())
}

/// The inverse of [`decode_payload`]; what a browser canvas would send.
pub fn encode_data_uri(frame: &RgbFrame) -> Result<String, FrameError> {
    let png = encode_png(frame)?;
    Ok(format!("{DATA_URI_PREFIX}{}", STANDARD.encode(png)))
}
