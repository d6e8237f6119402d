//! Base64 image payload decoding.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::DecodeError;
use crate::image::{PixelBuffer, PixelFormat};

/// Format every decoded payload lands in. 565 halves the footprint of a frame.
pub const DECODE_FORMAT: PixelFormat = PixelFormat::Rgb565;

/// Decode a base64-encoded image (PNG, JPEG, ...) into an opaque 565 buffer.
///
/// Line breaks and other ASCII whitespace in the payload are ignored, as in
/// MIME-wrapped base64. Nothing is allocated for the output on failure.
pub fn decode(encoded: &str) -> Result<PixelBuffer, DecodeError> {
    let compact: String = encoded
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    if compact.is_empty() {
        return Err(DecodeError::EmptyPayload);
    }

    let bytes = STANDARD.decode(compact.as_bytes())?;
    decode_bytes(&bytes)
}

/// Decode raw encoded image bytes into an opaque 565 buffer.
pub fn decode_bytes(bytes: &[u8]) -> Result<PixelBuffer, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::EmptyPayload);
    }

    let img = image::load_from_memory(bytes)?;
    let rgba = img.to_rgba8();
    tracing::debug!("decoded {}x{} image ({:?})", rgba.width(), rgba.height(), img.color());
    Ok(PixelBuffer::from_rgba_image(&rgba, DECODE_FORMAT))
}
