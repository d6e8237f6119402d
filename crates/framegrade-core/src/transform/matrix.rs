//! Affine color transforms and the ordered adjustment steps they are built from.
//!
//! A transform is a 4×5 matrix over `(R, G, B, A)` on the 0..255 scale:
//!
//! ```text
//! out_c = Σ_k in_k × m[c][k] + offset[c]
//! ```
//!
//! The alpha row is always identity. Steps are composed so that each new
//! step consumes the output of everything before it:
//!
//! ```text
//!   Input ──→ Brightness ──→ Contrast ──→ Channel gain ──→ Gamma approx ──→ Output
//! ```

use glam::{Mat4, Vec4};

use crate::image::{pack_argb, unpack_argb};
use crate::transform::params::GAMMA_NEUTRAL;

/// Mid-grey pivot for contrast scaling, in 8-bit units.
const CONTRAST_PIVOT: f32 = 128.0;

/// An affine color transform. Linear part in `matrix`, translation in `offset`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorTransform {
    /// Linear part. Column-major, applied as `matrix * rgba`.
    pub matrix: Mat4,
    /// Added after the linear part. `offset.w` is always 0.
    pub offset: Vec4,
}

impl ColorTransform {
    pub const IDENTITY: Self = Self {
        matrix: Mat4::IDENTITY,
        offset: Vec4::ZERO,
    };

    /// Per-channel scale on R, G, B plus a shared offset. Alpha untouched.
    pub fn scale_offset(scale: [f32; 3], offset: f32) -> Self {
        Self {
            matrix: Mat4::from_diagonal(Vec4::new(scale[0], scale[1], scale[2], 1.0)),
            offset: Vec4::new(offset, offset, offset, 0.0),
        }
    }

    /// `outer ∘ self`: run `self` first, then `outer` on its output.
    pub fn then(self, outer: Self) -> Self {
        Self {
            matrix: outer.matrix * self.matrix,
            offset: outer.matrix * self.offset + outer.offset,
        }
    }

    /// Transform one RGBA sample on the 0..255 scale without clamping.
    pub fn apply_rgba(&self, rgba: Vec4) -> Vec4 {
        self.matrix * rgba + self.offset
    }

    /// Render one packed ARGB pixel, rounding and clamping each channel.
    pub fn apply(&self, argb: u32) -> u32 {
        let [a, r, g, b] = unpack_argb(argb);
        let out = self.apply_rgba(Vec4::new(r as f32, g as f32, b as f32, a as f32));
        let q = |v: f32| v.round().clamp(0.0, 255.0) as u8;
        pack_argb(q(out.w), q(out.x), q(out.y), q(out.z))
    }

    /// The 20 coefficients in row-major 4×5 order, as platform color filters expect.
    pub fn to_row_major(&self) -> [f32; 20] {
        let mut out = [0.0_f32; 20];
        for row in 0..4 {
            let r = self.matrix.row(row);
            out[row * 5..row * 5 + 4].copy_from_slice(&r.to_array());
            out[row * 5 + 4] = self.offset[row];
        }
        out
    }
}

/// One enabled sub-transform of an adjustment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AdjustmentStep {
    /// Additive offset on R, G, B.
    Brightness { offset: f32 },
    /// Scale around the mid-grey pivot.
    Contrast { scale: f32 },
    /// Independent per-channel multipliers.
    ChannelGain { scale: [f32; 3] },
    /// Linear stand-in for a gamma curve, for renderers limited to one affine pass.
    GammaApprox { contrast: f32, brightness: f32 },
}

impl AdjustmentStep {
    pub fn transform(&self) -> ColorTransform {
        match *self {
            Self::Brightness { offset } => ColorTransform::scale_offset([1.0; 3], offset),
            Self::Contrast { scale } => {
                ColorTransform::scale_offset([scale; 3], (1.0 - scale) * CONTRAST_PIVOT)
            }
            Self::ChannelGain { scale } => ColorTransform::scale_offset(scale, 0.0),
            Self::GammaApprox {
                contrast,
                brightness,
            } => ColorTransform::scale_offset([contrast; 3], brightness),
        }
    }
}

/// The enabled steps for these slider values, in application order.
///
/// Inputs are taken as already clamped.
pub fn adjustment_steps(
    brightness: i32,
    contrast: i32,
    red_gain: i32,
    green_gain: i32,
    blue_gain: i32,
    gamma: i32,
    include_gamma: bool,
) -> Vec<AdjustmentStep> {
    let mut steps = Vec::with_capacity(4);

    if brightness != 0 {
        steps.push(AdjustmentStep::Brightness {
            offset: brightness as f32,
        });
    }

    if contrast != 0 {
        steps.push(AdjustmentStep::Contrast {
            scale: (100 + contrast) as f32 / 100.0,
        });
    }

    if red_gain != 0 || green_gain != 0 || blue_gain != 0 {
        let gain = |v: i32| 1.0 + v as f32 / 100.0;
        steps.push(AdjustmentStep::ChannelGain {
            scale: [gain(red_gain), gain(green_gain), gain(blue_gain)],
        });
    }

    if include_gamma && gamma != GAMMA_NEUTRAL {
        let (contrast, brightness) = gamma_approximation(gamma as f32 / 100.0);
        steps.push(AdjustmentStep::GammaApprox {
            contrast,
            brightness,
        });
    }

    steps
}

/// `(contrast_factor, brightness_offset)` approximating `out = in^g`.
///
/// g > 1 darkens: `0.7 + (g−1)×0.3`, `−(g−1)×30`.
/// g < 1 lightens: `1 + (1−g)×0.5`, `(1−g)×40`.
fn gamma_approximation(g: f32) -> (f32, f32) {
    if g > 1.0 {
        (0.7 + (g - 1.0) * 0.3, -(g - 1.0) * 30.0)
    } else {
        (1.0 + (1.0 - g) * 0.5, (1.0 - g) * 40.0)
    }
}

/// Reduce steps left to right into one transform. `None` when there are no steps.
pub fn reduce_steps(steps: &[AdjustmentStep]) -> Option<ColorTransform> {
    steps
        .iter()
        .map(AdjustmentStep::transform)
        .reduce(ColorTransform::then)
}

/// Build the combined transform for these slider values.
///
/// Returns `None` when nothing is enabled. That is distinct from
/// [`ColorTransform::IDENTITY`] and lets callers skip rendering.
pub fn compose(
    brightness: i32,
    contrast: i32,
    red_gain: i32,
    green_gain: i32,
    blue_gain: i32,
    gamma: i32,
    include_gamma: bool,
) -> Option<ColorTransform> {
    reduce_steps(&adjustment_steps(
        brightness,
        contrast,
        red_gain,
        green_gain,
        blue_gain,
        gamma,
        include_gamma,
    ))
}
