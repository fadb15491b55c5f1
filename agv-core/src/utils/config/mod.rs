//! Configuration for the AGV drive core.
//!
//! `AgvConfig` bundles the drive and encoder settings a host applies at
//! start-up. Every field goes through the same setters used at runtime, so an
//! invalid value is dropped (with a warning) and the default is kept.

pub mod limits;

use serde::{Deserialize, Serialize};

pub use limits::PwmLimits;

/// Pulses per revolution assumed when nothing else is configured.
pub const DEFAULT_ENCODER_PPR: u32 = 1000;

/// Motor-side settings shared by both wheels (PWM range) or per wheel (polarity).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveConfig {
    pub pwm_min: i32,
    pub pwm_max: i32,
    pub left_inverted: bool,
    pub right_inverted: bool,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            pwm_min: PwmLimits::FULL.min() as i32,
            pwm_max: PwmLimits::FULL.max() as i32,
            left_inverted: false,
            right_inverted: false,
        }
    }
}

impl DriveConfig {
    /// The configured range, if it satisfies `0 <= min < max <= 255`.
    pub fn pwm_limits(&self) -> Option<PwmLimits> {
        PwmLimits::new(self.pwm_min, self.pwm_max)
    }
}

/// Encoder-side settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// Kept signed so that a non-positive request can be rejected instead of
    /// wrapping.
    pub pulses_per_revolution: i32,
    pub left_inverted: bool,
    pub right_inverted: bool,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            pulses_per_revolution: DEFAULT_ENCODER_PPR as i32,
            left_inverted: false,
            right_inverted: false,
        }
    }
}

/// Complete configuration applied by `AgvController::new`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgvConfig {
    pub drive: DriveConfig,
    pub encoder: EncoderConfig,
}
