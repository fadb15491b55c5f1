//! Module Exports
//!
//! This file exports the controllers of the drive core and the command
//! dispatcher tying them together.
//!
//! - `encoder`: quadrature decoding of the two wheel encoders
//! - `drive`: direction-aware actuation of the two wheel motors

/// Module for decoding wheel encoders from channel-A edges.
pub mod encoder;
pub mod drive;

use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, channel::Channel};
use embedded_hal::{digital::OutputPin, pwm::SetDutyCycle};
use serde::{Deserialize, Serialize};

use crate::utils::config::AgvConfig;

pub use drive::{DifferentialDrive, Direction, DriveError, Motor, MotorError};
pub use encoder::{EdgeHandler, EncoderChannel, EncoderError, QuadratureDecoder, QuadratureEdge};

/// Channel used to receive drive commands (`DriveCommand` messages).
pub static DRIVE_CHANNEL: Channel<CriticalSectionRawMutex, DriveCommand, 16> = Channel::new();

/// One side of the vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Wheel {
    Left,
    Right,
}

impl Wheel {
    pub const BOTH: [Wheel; 2] = [Wheel::Left, Wheel::Right];
}

/// Drive command variants.
///
/// Speeds are magnitudes; the variant picks the direction. Serialized with
/// tag `"dc"`.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(tag = "dc", rename_all = "snake_case")] // dc = drive command
pub enum DriveCommand {
    // Motion
    /// Both wheels forward.
    Forward { l: i32, r: i32 },
    /// Both wheels backward.
    Backward { l: i32, r: i32 },
    /// In place, clockwise.
    RotateCw { l: i32, r: i32 },
    /// In place, anticlockwise.
    RotateCcw { l: i32, r: i32 },
    Stop,

    // Configuration
    SetPwmLimits { min: i32, max: i32 },
    SetMotorInverted { w: Wheel, inv: bool },
    SetEncoderInverted { w: Wheel, inv: bool },
    SetPpr { w: Wheel, ppr: i32 },
    /// Zero one counter, or both when `w` is absent.
    ResetEncoders { w: Option<Wheel> },
}

/// Owns the drive and shares the decoder with the edge handlers.
pub struct AgvController<'a, P, D> {
    drive: DifferentialDrive<P, D>,
    decoder: &'a QuadratureDecoder,
}

impl<'a, P, D> AgvController<'a, P, D>
where
    P: SetDutyCycle,
    D: OutputPin,
{
    /// Apply `config` and make sure both motors are stopped.
    ///
    /// Invalid configuration values are dropped and the defaults kept.
    pub fn new(
        mut drive: DifferentialDrive<P, D>,
        decoder: &'a QuadratureDecoder,
        config: AgvConfig,
    ) -> Self {
        drive.set_pwm_limits(config.drive.pwm_min, config.drive.pwm_max);
        drive.set_motor_inverted(Wheel::Left, config.drive.left_inverted);
        drive.set_motor_inverted(Wheel::Right, config.drive.right_inverted);

        decoder.set_inverted(Wheel::Left, config.encoder.left_inverted);
        decoder.set_inverted(Wheel::Right, config.encoder.right_inverted);
        for wheel in Wheel::BOTH {
            decoder.set_pulses_per_revolution(wheel, config.encoder.pulses_per_revolution);
        }

        if let Err(e) = drive.stop() {
            tracing::warn!("Initial stop failed: {:?}", e);
        }

        AgvController { drive, decoder }
    }

    /// Execute a single `DriveCommand`.
    pub fn execute_command(
        &mut self,
        command: DriveCommand,
    ) -> Result<(), DriveError<P, D>> {
        match command {
            DriveCommand::Forward { l, r } => self.drive.move_forward(l, r),
            DriveCommand::Backward { l, r } => self.drive.move_backward(l, r),
            DriveCommand::RotateCw { l, r } => self.drive.rotate_clockwise(l, r),
            DriveCommand::RotateCcw { l, r } => self.drive.rotate_anticlockwise(l, r),
            DriveCommand::Stop => self.drive.stop(),
            DriveCommand::SetPwmLimits { min, max } => {
                self.drive.set_pwm_limits(min, max);
                Ok(())
            }
            DriveCommand::SetMotorInverted { w, inv } => {
                self.drive.set_motor_inverted(w, inv);
                Ok(())
            }
            DriveCommand::SetEncoderInverted { w, inv } => {
                self.decoder.set_inverted(w, inv);
                Ok(())
            }
            DriveCommand::SetPpr { w, ppr } => {
                self.decoder.set_pulses_per_revolution(w, ppr);
                Ok(())
            }
            DriveCommand::ResetEncoders { w: Some(w) } => {
                self.decoder.reset(w);
                Ok(())
            }
            DriveCommand::ResetEncoders { w: None } => {
                self.decoder.reset_all();
                Ok(())
            }
        }
    }

    fn dispatch(
        &mut self,
        command: DriveCommand,
    ) -> bool {
        match self.execute_command(command) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(?command, "Drive command failed: {:?}", e);
                false
            }
        }
    }

    /// Execute every command already queued on `channel` without waiting.
    ///
    /// Returns how many of them executed successfully; failed commands are
    /// logged and not counted.
    pub fn poll_commands<const N: usize>(
        &mut self,
        channel: &Channel<CriticalSectionRawMutex, DriveCommand, N>,
    ) -> usize {
        let mut done = 0;
        while let Ok(command) = channel.try_receive() {
            if self.dispatch(command) {
                done += 1;
            }
        }
        done
    }

    /// Receive and execute commands from `DRIVE_CHANNEL` forever.
    pub async fn drive_ch(&mut self) -> ! {
        loop {
            let command = DRIVE_CHANNEL.receiver().receive().await;
            tracing::info!("Received drive command: {:?}", command);
            self.dispatch(command);
        }
    }

    /// Left and right tick counts at the same instant.
    pub fn counts(&self) -> (i32, i32) {
        self.decoder.counts()
    }

    pub fn decoder(&self) -> &'a QuadratureDecoder {
        self.decoder
    }

    pub fn drive(&self) -> &DifferentialDrive<P, D> {
        &self.drive
    }

    pub fn drive_mut(&mut self) -> &mut DifferentialDrive<P, D> {
        &mut self.drive
    }
}
