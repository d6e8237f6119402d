//! Adjustment orchestration.
//!
//! ```text
//!   payload ──→ decode ──→ reduce ──→ color transform ──→ gamma LUT ──→ buffer
//!                                      (FilterCache)      (gamma ≠ 1)
//! ```
//!
//! Every stage consumes its input buffer and hands back a new one.

use serde::{Deserialize, Serialize};

use crate::decode;
use crate::error::DecodeError;
use crate::image::PixelBuffer;
use crate::resize::{self, DEFAULT_MAX_DIMENSION};
use crate::transform::cache::{FilterCache, TransformBuilder};
use crate::transform::lut::{GAMMA_PIXEL_LIMIT, GammaLut};
use crate::transform::params::{AdjustmentParameters, GAMMA_NEUTRAL, ParameterSource};

/// Tunables for [`prepare_image`] and [`apply_adjustments`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Longest side after downscaling.
    pub max_dimension: u32,
    /// Buffers with more pixels than this skip the gamma pass.
    pub gamma_pixel_limit: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_dimension: DEFAULT_MAX_DIMENSION,
            gamma_pixel_limit: GAMMA_PIXEL_LIMIT,
        }
    }
}

/// Apply brightness, contrast, channel gains and exact gamma to `buffer`.
///
/// The color transform excludes the gamma approximation; gamma goes through
/// the LUT instead. Exactly one new buffer comes back even when nothing
/// changes, and `buffer` is always released.
pub fn apply_adjustments<B: TransformBuilder>(
    buffer: PixelBuffer,
    params: &AdjustmentParameters,
    cache: &FilterCache<B>,
    config: &PipelineConfig,
) -> PixelBuffer {
    let params = params.clamped();
    let transform = cache.get_or_build(&params.with_include_gamma(false));

    let (width, height, format) = (buffer.width(), buffer.height(), buffer.format());
    let rendered = match transform {
        Some(t) => PixelBuffer::from_argb_iter(
            width,
            height,
            format,
            buffer.argb_pixels().map(|px| t.apply(px)),
        ),
        None => PixelBuffer::from_argb_iter(width, height, format, buffer.argb_pixels()),
    };
    drop(buffer);

    if params.gamma == GAMMA_NEUTRAL {
        return rendered;
    }
    GammaLut::new(params.gamma_exponent())
        .apply_to_buffer_limited(rendered, config.gamma_pixel_limit)
}

/// [`apply_adjustments`] with parameters read from a key-value store.
pub fn apply_adjustments_from_source<B: TransformBuilder>(
    buffer: PixelBuffer,
    source: &dyn ParameterSource,
    cache: &FilterCache<B>,
    config: &PipelineConfig,
) -> PixelBuffer {
    let params = AdjustmentParameters::from_source(source);
    apply_adjustments(buffer, &params, cache, config)
}

/// Decode a base64 payload, bound its size and apply the adjustments.
pub fn prepare_image<B: TransformBuilder>(
    encoded: &str,
    params: &AdjustmentParameters,
    cache: &FilterCache<B>,
    config: &PipelineConfig,
) -> Result<PixelBuffer, DecodeError> {
    let decoded = decode::decode(encoded)?;
    let reduced = resize::reduce(decoded, config.max_dimension);
    Ok(apply_adjustments(reduced, params, cache, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::PixelFormat;
    use crate::transform::params::{MemoryParameterSource, keys};

    fn grey(format: PixelFormat) -> PixelBuffer {
        PixelBuffer::filled(6, 4, format, 0xFF80_8080)
    }

    #[test]
    fn test_disabled_still_returns_fresh_copy() {
        let cache = FilterCache::new();
        let input = grey(PixelFormat::Argb8888);
        let input_id = input.id();
        let out = apply_adjustments(
            input,
            &AdjustmentParameters::default(),
            &cache,
            &PipelineConfig::default(),
        );
        assert_ne!(out.id(), input_id);
        assert_eq!(out.pixel(5, 3), 0xFF80_8080);
        assert_eq!(out.format(), PixelFormat::Argb8888);
    }

    #[test]
    fn test_brightness_applied() {
        let cache = FilterCache::new();
        let params = AdjustmentParameters {
            enabled: true,
            brightness: 20,
            ..Default::default()
        };
        let out = apply_adjustments(
            grey(PixelFormat::Argb8888),
            &params,
            &cache,
            &PipelineConfig::default(),
        );
        assert_eq!(out.pixel(0, 0), 0xFF94_9494);
    }

    #[test]
    fn test_gamma_goes_through_lut_not_matrix() {
        let cache = FilterCache::new();
        let params = AdjustmentParameters {
            enabled: true,
            gamma: 200,
            ..Default::default()
        };
        let out = apply_adjustments(
            grey(PixelFormat::Argb8888),
            &params,
            &cache,
            &PipelineConfig::default(),
        );
        // Exact: 255 × (128/255)² = 64.25. The affine approximation would give 98.
        assert_eq!(out.pixel(0, 0), 0xFF40_4040);
        assert!(cache.cached_key().is_none());
    }

    #[test]
    fn test_matrix_then_gamma() {
        let cache = FilterCache::new();
        let params = AdjustmentParameters {
            enabled: true,
            brightness: 127,
            gamma: 50,
            ..Default::default()
        };
        let input = PixelBuffer::filled(1, 1, PixelFormat::Argb8888, 0xFF00_0000);
        let out = apply_adjustments(input, &params, &cache, &PipelineConfig::default());
        // brightness clamps to 100; 255 × (100/255)^0.5 = 159.69 → 160
        assert_eq!(out.pixel(0, 0), 0xFFA0_A0A0);
    }

    #[test]
    fn test_gamma_pass_respects_configured_limit() {
        let cache = FilterCache::new();
        let params = AdjustmentParameters {
            enabled: true,
            gamma: 200,
            ..Default::default()
        };
        let config = PipelineConfig {
            gamma_pixel_limit: 10,
            ..Default::default()
        };
        let out = apply_adjustments(grey(PixelFormat::Argb8888), &params, &cache, &config);
        assert_eq!(out.pixel(0, 0), 0xFF80_8080);
    }

    #[test]
    fn test_from_source_uses_store_values() {
        let cache = FilterCache::new();
        let mut source = MemoryParameterSource::new();
        source.set_bool(keys::ENABLED, true);
        source.set_int(keys::RED, 100);
        let out = apply_adjustments_from_source(
            grey(PixelFormat::Argb8888),
            &source,
            &cache,
            &PipelineConfig::default(),
        );
        assert_eq!(out.pixel(0, 0), 0xFFFF_8080);
    }

    #[test]
    fn test_config_serde_defaults() {
        let config: PipelineConfig = serde_json::from_str(r#"{"max_dimension": 640}"#).unwrap();
        assert_eq!(config.max_dimension, 640);
        assert_eq!(config.gamma_pixel_limit, GAMMA_PIXEL_LIMIT);
    }
}
