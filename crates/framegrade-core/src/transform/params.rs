//! User-facing adjustment parameters and the key-value store they are read from.
//!
//! `AdjustmentParameters` is what every pipeline stage derives its work from.
//! Values outside their range are clamped, never rejected.

use std::collections::HashMap;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::error::ParamsError;

/// Range of the brightness, contrast and per-channel gain sliders.
pub const DELTA_RANGE: RangeInclusive<i32> = -100..=100;

/// Range of the gamma slider, in hundredths (10 = 0.1, 300 = 3.0).
pub const GAMMA_RANGE: RangeInclusive<i32> = 10..=300;

/// Gamma slider value that leaves the image untouched.
pub const GAMMA_NEUTRAL: i32 = 100;

/// Keys under which the parameter store keeps each setting.
pub mod keys {
    pub const ENABLED: &str = "imageAdjustments";
    pub const BRIGHTNESS: &str = "image_brightness";
    pub const CONTRAST: &str = "image_contrast";
    pub const RED: &str = "image_red_channel";
    pub const GREEN: &str = "image_green_channel";
    pub const BLUE: &str = "image_blue_channel";
    pub const GAMMA: &str = "image_gamma";

    /// Keys holding integer slider values.
    pub const INTEGER_KEYS: [&str; 6] = [BRIGHTNESS, CONTRAST, RED, GREEN, BLUE, GAMMA];
}

/// Brightness/contrast/channel/gamma settings for one adjustment pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct AdjustmentParameters {
    /// Master switch. When off, no transform is produced.
    pub enabled: bool,
    /// Additive offset on R, G, B in 8-bit units. Range `[-100, 100]`.
    pub brightness: i32,
    /// Contrast around mid-grey, in percent. Range `[-100, 100]`.
    pub contrast: i32,
    /// Red gain in percent. Range `[-100, 100]`.
    pub red_gain: i32,
    /// Green gain in percent. Range `[-100, 100]`.
    pub green_gain: i32,
    /// Blue gain in percent. Range `[-100, 100]`.
    pub blue_gain: i32,
    /// Gamma exponent in hundredths. Range `[10, 300]`, neutral at 100.
    pub gamma: i32,
    /// Whether the affine gamma approximation is folded into the color transform.
    pub include_gamma: bool,
}

impl Default for AdjustmentParameters {
    /// Disabled, with every slider at its neutral position.
    fn default() -> Self {
        Self {
            enabled: false,
            brightness: 0,
            contrast: 0,
            red_gain: 0,
            green_gain: 0,
            blue_gain: 0,
            gamma: GAMMA_NEUTRAL,
            include_gamma: true,
        }
    }
}

impl AdjustmentParameters {
    /// Read every setting from `source` and clamp it into range.
    pub fn from_source(source: &dyn ParameterSource) -> Self {
        Self {
            enabled: source.get_bool(keys::ENABLED, false),
            brightness: source.get_int(keys::BRIGHTNESS, 0),
            contrast: source.get_int(keys::CONTRAST, 0),
            red_gain: source.get_int(keys::RED, 0),
            green_gain: source.get_int(keys::GREEN, 0),
            blue_gain: source.get_int(keys::BLUE, 0),
            gamma: source.get_int(keys::GAMMA, GAMMA_NEUTRAL),
            include_gamma: true,
        }
        .clamped()
    }

    /// Copy with every integer field forced into its valid range.
    pub fn clamped(self) -> Self {
        let delta = |v: i32| v.clamp(*DELTA_RANGE.start(), *DELTA_RANGE.end());
        Self {
            brightness: delta(self.brightness),
            contrast: delta(self.contrast),
            red_gain: delta(self.red_gain),
            green_gain: delta(self.green_gain),
            blue_gain: delta(self.blue_gain),
            gamma: self.gamma.clamp(*GAMMA_RANGE.start(), *GAMMA_RANGE.end()),
            ..self
        }
    }

    pub fn with_include_gamma(self, include_gamma: bool) -> Self {
        Self {
            include_gamma,
            ..self
        }
    }

    /// True when no slider moves the image, ignoring `enabled`.
    pub fn is_neutral(&self) -> bool {
        let p = self.clamped();
        p.brightness == 0
            && p.contrast == 0
            && p.red_gain == 0
            && p.green_gain == 0
            && p.blue_gain == 0
            && p.gamma == GAMMA_NEUTRAL
    }

    /// Gamma as a floating-point exponent (`gamma / 100`), after clamping.
    pub fn gamma_exponent(&self) -> f32 {
        self.clamped().gamma as f32 / 100.0
    }

    /// Gamma formatted for display, e.g. `"1.00"`.
    pub fn gamma_label(&self) -> String {
        format!("{:.2}", self.gamma_exponent())
    }

    /// Put every slider back to neutral. `enabled` and `include_gamma` are kept.
    pub fn reset_adjustments(&mut self) {
        *self = Self {
            enabled: self.enabled,
            include_gamma: self.include_gamma,
            ..Self::default()
        };
    }
}

/// Key-value store the adjustment settings live in.
pub trait ParameterSource {
    /// Boolean at `key`, or `default` if absent or of another type.
    fn get_bool(&self, key: &str, default: bool) -> bool;

    /// Integer at `key`, or `default` if absent or of another type.
    fn get_int(&self, key: &str, default: i32) -> i32;
}

/// A single stored setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamValue {
    Bool(bool),
    Int(i32),
}

/// In-memory [`ParameterSource`], optionally loaded from a JSON object.
#[derive(Debug, Clone, Default)]
pub struct MemoryParameterSource {
    values: HashMap<String, ParamValue>,
}

impl MemoryParameterSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_bool(&mut self, key: impl Into<String>, value: bool) {
        self.values.insert(key.into(), ParamValue::Bool(value));
    }

    pub fn set_int(&mut self, key: impl Into<String>, value: i32) {
        self.values.insert(key.into(), ParamValue::Int(value));
    }

    /// Load from a flat JSON object such as
    /// `{"imageAdjustments": true, "image_gamma": 120}`.
    ///
    /// Known keys must carry the right type. Unknown keys holding booleans or
    /// integers are kept; anything else under an unknown key is ignored.
    /// Integers beyond `i32` saturate.
    pub fn from_json(json: &str) -> Result<Self, ParamsError> {
        let document: serde_json::Value = serde_json::from_str(json)?;
        let serde_json::Value::Object(map) = document else {
            return Err(ParamsError::NotAnObject);
        };

        let mut source = Self::new();
        for (key, value) in map {
            let wants_int = keys::INTEGER_KEYS.contains(&key.as_str());
            let wants_bool = key == keys::ENABLED;

            match value {
                serde_json::Value::Bool(b) if !wants_int => source.set_bool(key, b),
                serde_json::Value::Number(n) if !wants_bool && n.is_i64() => {
                    let v = n.as_i64().unwrap_or_default();
                    let v = i32::try_from(v).unwrap_or(if v < 0 { i32::MIN } else { i32::MAX });
                    source.set_int(key, v);
                }
                _ if wants_int => {
                    return Err(ParamsError::WrongType {
                        key,
                        expected: "an integer",
                    });
                }
                _ if wants_bool => {
                    return Err(ParamsError::WrongType {
                        key,
                        expected: "a boolean",
                    });
                }
                _ => {}
            }
        }
        Ok(source)
    }
}

impl ParameterSource for MemoryParameterSource {
    fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.values.get(key) {
            Some(ParamValue::Bool(b)) => *b,
            _ => default,
        }
    }

    fn get_int(&self, key: &str, default: i32) -> i32 {
        match self.values.get(key) {
            Some(ParamValue::Int(v)) => *v,
            _ => default,
        }
    }
}
