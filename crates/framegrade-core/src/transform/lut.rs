//! Exact gamma correction through a 256-entry lookup table.
//!
//! ```text
//! lut[i] = clamp(round(255 × (i / 255) ^ γ), 0, 255)
//! ```
//!
//! The table is rebuilt for each adjustment call; it is not cached.

use crate::image::{PixelBuffer, pack_argb, unpack_argb};

/// Largest pixel count (4000 × 4000) the gamma pass will touch.
pub const GAMMA_PIXEL_LIMIT: usize = 4000 * 4000;

/// An immutable 8-bit → 8-bit intensity table for one gamma exponent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GammaLut {
    table: [u8; 256],
}

impl GammaLut {
    /// Build the table for exponent `gamma`.
    pub fn new(gamma: f32) -> Self {
        let exponent = f64::from(gamma);
        let mut table = [0u8; 256];
        for (i, slot) in table.iter_mut().enumerate() {
            let normalized = i as f64 / 255.0;
            *slot = (255.0 * normalized.powf(exponent)).round().clamp(0.0, 255.0) as u8;
        }
        Self { table }
    }

    #[inline]
    pub fn lookup(&self, value: u8) -> u8 {
        self.table[value as usize]
    }

    pub fn as_slice(&self) -> &[u8; 256] {
        &self.table
    }

    /// Correct R, G, B of one packed ARGB pixel. Alpha passes through.
    #[inline]
    pub fn apply_pixel(&self, argb: u32) -> u32 {
        let [a, r, g, b] = unpack_argb(argb);
        pack_argb(a, self.lookup(r), self.lookup(g), self.lookup(b))
    }

    /// Run the table over every pixel of `buffer` with the default size limit.
    pub fn apply_to_buffer(&self, buffer: PixelBuffer) -> PixelBuffer {
        self.apply_to_buffer_limited(buffer, GAMMA_PIXEL_LIMIT)
    }

    /// Run the table over every pixel of `buffer`, producing a new buffer of
    /// the same size and format. `buffer` is released.
    ///
    /// Buffers with more than `pixel_limit` pixels are returned as-is; the
    /// pass is skipped, not failed.
    pub fn apply_to_buffer_limited(&self, buffer: PixelBuffer, pixel_limit: usize) -> PixelBuffer {
        let (width, height) = (buffer.width(), buffer.height());
        if buffer.pixel_count() > pixel_limit {
            tracing::warn!("buffer too large for gamma correction: {width}x{height}, skipping gamma");
            return buffer;
        }

        let corrected = PixelBuffer::from_argb_iter(
            width,
            height,
            buffer.format(),
            buffer.argb_pixels().map(|px| self.apply_pixel(px)),
        );
        drop(buffer);
        corrected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::PixelFormat;

    #[test]
    fn test_unit_gamma_is_identity_table() {
        let lut = GammaLut::new(1.0);
        for i in 0..=255u8 {
            assert_eq!(lut.lookup(i), i);
        }
    }

    #[test]
    fn test_endpoints_fixed_for_any_gamma() {
        for g in [0.1_f32, 0.5, 2.2, 3.0] {
            let lut = GammaLut::new(g);
            assert_eq!(lut.lookup(0), 0);
            assert_eq!(lut.lookup(255), 255);
        }
    }

    #[test]
    fn test_table_is_monotonic() {
        let lut = GammaLut::new(1.8);
        assert!(lut.as_slice().windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_known_midpoint() {
        // 255 × (128/255)^2 = 64.25 → 64
        assert_eq!(GammaLut::new(2.0).lookup(128), 64);
        // 255 × (64/255)^0.5 = 127.75 → 128
        assert_eq!(GammaLut::new(0.5).lookup(64), 128);
    }

    #[test]
    fn test_round_trip_within_quantization_error() {
        for g in [0.8_f32, 1.25] {
            let forward = GammaLut::new(g);
            let inverse = GammaLut::new(1.0 / g);
            for i in 0..=255u8 {
                let back = inverse.lookup(forward.lookup(i));
                assert!(
                    (i as i32 - back as i32).abs() <= 2,
                    "gamma {g}: {i} came back as {back}"
                );
            }
        }
    }

    #[test]
    fn test_apply_keeps_alpha() {
        let lut = GammaLut::new(2.0);
        assert_eq!(lut.apply_pixel(0x8080_80FF), 0x8040_40FF);
    }

    #[test]
    fn test_apply_to_buffer_returns_fresh_buffer() {
        let input = PixelBuffer::filled(8, 4, PixelFormat::Argb8888, 0xFF80_8080);
        let input_id = input.id();
        let out = GammaLut::new(2.0).apply_to_buffer(input);
        assert_ne!(out.id(), input_id);
        assert_eq!((out.width(), out.height()), (8, 4));
        assert_eq!(out.format(), PixelFormat::Argb8888);
        assert_eq!(out.pixel(7, 3), 0xFF40_4040);
    }

    #[test]
    fn test_oversized_buffer_is_returned_unchanged() {
        let input = PixelBuffer::filled(4001, 4001, PixelFormat::Rgb565, 0xFF80_8080);
        let input_id = input.id();
        let before = input.pixel(2000, 2000);
        let out = GammaLut::new(2.0).apply_to_buffer(input);
        assert_eq!(out.id(), input_id);
        assert_eq!(out.pixel(2000, 2000), before);
    }

    #[test]
    fn test_limit_is_inclusive() {
        let input = PixelBuffer::filled(10, 10, PixelFormat::Argb8888, 0xFF80_8080);
        let input_id = input.id();
        let out = GammaLut::new(2.0).apply_to_buffer_limited(input, 100);
        assert_ne!(out.id(), input_id);
    }
}
