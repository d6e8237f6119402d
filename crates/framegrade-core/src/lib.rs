//! Framegrade Core — image adjustment and composition for photo-frame displays.
//!
//! Color transforms, exact gamma correction, side-by-side composition,
//! downscaling and payload decoding. Every buffer stage takes its input by
//! value and returns a newly allocated buffer. No UI or platform dependencies.

pub mod composite;
pub mod decode;
pub mod error;
pub mod image;
pub mod pipeline;
pub mod resize;
pub mod transform;

// Re-exports for convenience.
pub use composite::merge;
pub use decode::decode;
pub use error::{DecodeError, ParamsError};
pub use image::{BufferId, PixelBuffer, PixelFormat};
pub use pipeline::{PipelineConfig, apply_adjustments, prepare_image};
pub use resize::reduce;
pub use transform::cache::{FilterCache, FilterKey, MatrixBuilder, TransformBuilder};
pub use transform::lut::GammaLut;
pub use transform::matrix::{ColorTransform, compose};
pub use transform::params::{AdjustmentParameters, MemoryParameterSource, ParameterSource};
