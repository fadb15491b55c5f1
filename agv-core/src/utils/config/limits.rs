//! Shared PWM magnitude range for both drive motors.

/// Inclusive duty range `[min, max]` applied to every motion command.
///
/// Always satisfies `min < max`; the only way to build one is through
/// [`PwmLimits::new`], which refuses anything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PwmLimits {
    min: u8,
    max: u8,
}

impl Default for PwmLimits {
    fn default() -> Self {
        Self::FULL
    }
}

impl PwmLimits {
    /// Highest duty a motor can be commanded with.
    pub const DUTY_MAX: u8 = u8::MAX;

    /// The whole `0..=255` range.
    pub const FULL: Self = Self {
        min: 0,
        max: Self::DUTY_MAX,
    };

    /// Build a range, or `None` unless `0 <= min < max <= 255`.
    pub fn new(
        min: i32,
        max: i32,
    ) -> Option<Self> {
        if min >= 0 && max <= Self::DUTY_MAX as i32 && min < max {
            Some(Self {
                min: min as u8,
                max: max as u8,
            })
        } else {
            None
        }
    }

    #[inline]
    pub fn min(&self) -> u8 {
        self.min
    }

    #[inline]
    pub fn max(&self) -> u8 {
        self.max
    }

    /// Clamp a requested magnitude into the range. Never fails.
    #[inline]
    pub fn clamp(
        &self,
        magnitude: i32,
    ) -> u8 {
        magnitude.clamp(self.min as i32, self.max as i32) as u8
    }
}
