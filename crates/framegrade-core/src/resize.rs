//! Aspect-preserving downscale.
//!
//! ```text
//! scale = max_dimension / max(width, height)
//! scale ≥ 1 → fresh copy, same size
//! scale < 1 → floor(width × scale) × floor(height × scale), bilinear
//!              (each side at least 1)
//! ```

use image::imageops::{self, FilterType};

use crate::image::PixelBuffer;

/// Default bound on the longer side.
pub const DEFAULT_MAX_DIMENSION: u32 = 1000;

/// Target size for `width × height` bounded by `max_dimension`, or `None`
/// when the image already fits.
pub fn target_dimensions(width: u32, height: u32, max_dimension: u32) -> Option<(u32, u32)> {
    let longest = width.max(height);
    if longest <= max_dimension {
        return None;
    }
    // Integer floor of `side × max / longest`; never collapse a side to zero.
    let scaled = |side: u32| (side as u64 * max_dimension as u64 / longest as u64).max(1) as u32;
    Some((scaled(width), scaled(height)))
}

/// Shrink `buffer` so its longer side is at most `max_dimension`.
///
/// Always returns a new buffer in the input's format; `buffer` is released.
pub fn reduce(buffer: PixelBuffer, max_dimension: u32) -> PixelBuffer {
    let (width, height) = (buffer.width(), buffer.height());

    let Some((new_width, new_height)) = target_dimensions(width, height, max_dimension) else {
        let copy = buffer.clone();
        drop(buffer);
        return copy;
    };

    tracing::debug!("downscaling {width}x{height} to {new_width}x{new_height}");
    let resized = imageops::resize(
        &buffer.to_rgba_image(),
        new_width,
        new_height,
        FilterType::Triangle,
    );
    let out = PixelBuffer::from_rgba_image(&resized, buffer.format());
    drop(buffer);
    out
}
