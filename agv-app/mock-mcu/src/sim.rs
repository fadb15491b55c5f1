//! Simulated wheel hardware.
//!
//! Each `SimWheel` stands in for one motor driver plus one quadrature encoder.
//! The command side writes duty and direction through the `embedded-hal` output
//! traits; a plant thread turns them into A/B levels and calls the wheel's
//! `EdgeHandler` whenever A changes, the way a pin-change interrupt would.

use core::convert::Infallible;
use std::{
    sync::atomic::{AtomicBool, AtomicU16, Ordering},
    thread,
    time::Duration,
};

use agv_core::utils::controllers::EdgeHandler;
use embedded_hal::{
    digital::{ErrorType as PinErrorType, InputPin, OutputPin},
    pwm::{ErrorType as PwmErrorType, SetDutyCycle},
};

/// (A, B) levels in the order that decodes as positive rotation.
const PHASES: [(bool, bool); 4] = [(false, false), (false, true), (true, true), (true, false)];

/// Full duty advances one phase per plant tick.
const DUTY_FULL: u16 = 255;
const PLANT_TICK: Duration = Duration::from_micros(200);

pub struct SimWheel {
    duty: AtomicU16,
    forward: AtomicBool,
    a: AtomicBool,
    b: AtomicBool,
    /// Encoder mounted mirrored, so forward motion decodes as negative.
    mirrored: bool,
}

impl SimWheel {
    pub const fn new(mirrored: bool) -> Self {
        Self {
            duty: AtomicU16::new(0),
            forward: AtomicBool::new(false),
            a: AtomicBool::new(false),
            b: AtomicBool::new(false),
            mirrored,
        }
    }

    pub fn pwm(&'static self) -> SimPwm {
        SimPwm(self)
    }

    pub fn dir(&'static self) -> SimDir {
        SimDir(self)
    }

    pub fn channel_a(&'static self) -> SimInput {
        SimInput(&self.a)
    }

    pub fn channel_b(&'static self) -> SimInput {
        SimInput(&self.b)
    }

    fn set_phase(
        &self,
        phase: usize,
    ) -> bool {
        let (a, b) = PHASES[phase];
        self.b.store(b, Ordering::Release);
        self.a.swap(a, Ordering::AcqRel) != a
    }
}

pub struct SimPwm(&'static SimWheel);

impl PwmErrorType for SimPwm {
    type Error = Infallible;
}

impl SetDutyCycle for SimPwm {
    fn max_duty_cycle(&self) -> u16 {
        DUTY_FULL
    }

    fn set_duty_cycle(
        &mut self,
        duty: u16,
    ) -> Result<(), Infallible> {
        self.0.duty.store(duty, Ordering::Release);
        Ok(())
    }
}

pub struct SimDir(&'static SimWheel);

impl PinErrorType for SimDir {
    type Error = Infallible;
}

impl OutputPin for SimDir {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.0.forward.store(false, Ordering::Release);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.0.forward.store(true, Ordering::Release);
        Ok(())
    }
}

pub struct SimInput(&'static AtomicBool);

impl PinErrorType for SimInput {
    type Error = Infallible;
}

impl InputPin for SimInput {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.0.load(Ordering::Acquire))
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(!self.0.load(Ordering::Acquire))
    }
}

/// Spin the wheel until `running` goes false.
pub fn run_plant(
    wheel: &'static SimWheel,
    mut handler: EdgeHandler<'static, SimInput, SimInput>,
    running: &AtomicBool,
) {
    let mut phase = 0usize;
    let mut acc = 0u16;
    while running.load(Ordering::Acquire) {
        acc += wheel.duty.load(Ordering::Acquire).min(DUTY_FULL);
        while acc >= DUTY_FULL {
            acc -= DUTY_FULL;
            let positive = wheel.forward.load(Ordering::Acquire) != wheel.mirrored;
            phase = if positive { (phase + 1) % 4 } else { (phase + 3) % 4 };
            if wheel.set_phase(phase) {
                let Ok(_) = handler.on_channel_a_edge();
            }
        }
        thread::sleep(PLANT_TICK);
    }
}
