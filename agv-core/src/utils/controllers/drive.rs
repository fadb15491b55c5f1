//! Differential drive actuation for the two wheel motors.
//!
//! Every motor is wired as a magnitude output (`SetDutyCycle`) plus a direction
//! line (`OutputPin`). Motion primitives take magnitudes only; the primitive
//! picks the logical direction of each wheel and the motor's `inverted` flag
//! decides which line level that maps to. Forward on a non-inverted motor
//! drives the direction line high.

use embedded_hal::{
    digital::{ErrorType as PinErrorType, OutputPin, PinState},
    pwm::{ErrorType as PwmErrorType, SetDutyCycle},
};
use crate::utils::{config::PwmLimits, controllers::Wheel};

/// Errors raised by the motor outputs.
#[derive(Debug)]
pub enum MotorError<P: core::fmt::Debug, D: core::fmt::Debug> {
    Pwm(P),
    Direction(D),
}

/// `MotorError` for a given pair of output types.
pub type DriveError<P, D> =
    MotorError<<P as PwmErrorType>::Error, <D as PinErrorType>::Error>;

/// Logical rotation of one wheel, before polarity inversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// One wheel motor: magnitude output, direction line and polarity.
pub struct Motor<P, D> {
    pwm: P,
    dir: D,
    inverted: bool,
    duty: u8,
    direction: Option<Direction>,
}

impl<P, D> Motor<P, D>
where
    P: SetDutyCycle,
    D: OutputPin,
{
    pub fn new(
        pwm: P,
        dir: D,
    ) -> Self {
        Self {
            pwm,
            dir,
            inverted: false,
            duty: 0,
            direction: None,
        }
    }

    /// Command `duty` (out of 255) in the given logical direction.
    ///
    /// `duty()` and `direction()` only change once both writes went through.
    pub fn drive(
        &mut self,
        duty: u8,
        direction: Direction,
    ) -> Result<(), DriveError<P, D>> {
        self.pwm
            .set_duty_cycle_fraction(duty as u16, PwmLimits::DUTY_MAX as u16)
            .map_err(MotorError::Pwm)?;

        let high = (direction == Direction::Forward) != self.inverted;
        self.dir
            .set_state(PinState::from(high))
            .map_err(MotorError::Direction)?;

        self.duty = duty;
        self.direction = Some(direction);
        Ok(())
    }

    /// Zero the magnitude. The direction line is left as it was.
    pub fn halt(&mut self) -> Result<(), DriveError<P, D>> {
        self.pwm
            .set_duty_cycle_fully_off()
            .map_err(MotorError::Pwm)?;
        self.duty = 0;
        Ok(())
    }

    pub fn set_inverted(
        &mut self,
        inverted: bool,
    ) {
        self.inverted = inverted;
    }

    pub fn is_inverted(&self) -> bool {
        self.inverted
    }

    /// Last duty written (0 after a halt).
    pub fn duty(&self) -> u8 {
        self.duty
    }

    /// Last logical direction written, if any.
    pub fn direction(&self) -> Option<Direction> {
        self.direction
    }

    pub fn release(self) -> (P, D) {
        (self.pwm, self.dir)
    }
}

/// Two-motor differential drive with a shared PWM range.
pub struct DifferentialDrive<P, D> {
    left: Motor<P, D>,
    right: Motor<P, D>,
    limits: PwmLimits,
}

impl<P, D> DifferentialDrive<P, D>
where
    P: SetDutyCycle,
    D: OutputPin,
{
    pub fn new(
        left_pwm: P,
        left_dir: D,
        right_pwm: P,
        right_dir: D,
    ) -> Self {
        Self {
            left: Motor::new(left_pwm, left_dir),
            right: Motor::new(right_pwm, right_dir),
            limits: PwmLimits::FULL,
        }
    }

    fn command(
        &mut self,
        left_speed: i32,
        right_speed: i32,
        left_dir: Direction,
        right_dir: Direction,
    ) -> Result<(), DriveError<P, D>> {
        let left = self.limits.clamp(left_speed);
        let right = self.limits.clamp(right_speed);
        tracing::debug!(left, right, ?left_dir, ?right_dir, "drive command");
        let left = self.left.drive(left, left_dir);
        let right = self.right.drive(right, right_dir);
        let result = left.and(right);

        // never leave one wheel on a half-applied command
        if result.is_err() {
            tracing::warn!("drive command failed, halting both motors");
            if let Err(e) = self.stop() {
                tracing::error!("halt after failed command also failed: {:?}", e);
            }
        }
        result
    }

    pub fn move_forward(
        &mut self,
        left_speed: i32,
        right_speed: i32,
    ) -> Result<(), DriveError<P, D>> {
        self.command(left_speed, right_speed, Direction::Forward, Direction::Forward)
    }

    pub fn move_backward(
        &mut self,
        left_speed: i32,
        right_speed: i32,
    ) -> Result<(), DriveError<P, D>> {
        self.command(left_speed, right_speed, Direction::Backward, Direction::Backward)
    }

    /// Spin in place: left wheel forward, right wheel backward.
    pub fn rotate_clockwise(
        &mut self,
        left_speed: i32,
        right_speed: i32,
    ) -> Result<(), DriveError<P, D>> {
        self.command(left_speed, right_speed, Direction::Forward, Direction::Backward)
    }

    /// Spin in place: left wheel backward, right wheel forward.
    pub fn rotate_anticlockwise(
        &mut self,
        left_speed: i32,
        right_speed: i32,
    ) -> Result<(), DriveError<P, D>> {
        self.command(left_speed, right_speed, Direction::Backward, Direction::Forward)
    }

    /// Zero both magnitudes, ignoring the PWM range.
    ///
    /// Both motors are always attempted; the first failure is returned.
    pub fn stop(&mut self) -> Result<(), DriveError<P, D>> {
        tracing::debug!("stop");
        let left = self.left.halt();
        let right = self.right.halt();
        left.and(right)
    }

    /// Replace the PWM range. Ignored unless `0 <= min < max <= 255`.
    pub fn set_pwm_limits(
        &mut self,
        min: i32,
        max: i32,
    ) {
        match PwmLimits::new(min, max) {
            Some(limits) => self.limits = limits,
            None => tracing::warn!(min, max, "ignoring invalid PWM limits"),
        }
    }

    pub fn pwm_limits(&self) -> PwmLimits {
        self.limits
    }

    pub fn motor(
        &self,
        wheel: Wheel,
    ) -> &Motor<P, D> {
        match wheel {
            Wheel::Left => &self.left,
            Wheel::Right => &self.right,
        }
    }

    fn motor_mut(
        &mut self,
        wheel: Wheel,
    ) -> &mut Motor<P, D> {
        match wheel {
            Wheel::Left => &mut self.left,
            Wheel::Right => &mut self.right,
        }
    }

    pub fn set_motor_inverted(
        &mut self,
        wheel: Wheel,
        inverted: bool,
    ) {
        self.motor_mut(wheel).set_inverted(inverted);
    }

    pub fn is_motor_inverted(
        &self,
        wheel: Wheel,
    ) -> bool {
        self.motor(wheel).is_inverted()
    }

    /// Last duty commanded to `wheel`.
    pub fn duty(
        &self,
        wheel: Wheel,
    ) -> u8 {
        self.motor(wheel).duty()
    }

    pub fn release(self) -> ((P, D), (P, D)) {
        (self.left.release(), self.right.release())
    }
}
