//! Quadrature decoding for the two drive wheels.
//!
//! Each wheel owns an [`EncoderChannel`] holding its tick count and settings.
//! The count is only ever moved by an edge on channel A: the host calls
//! [`EdgeHandler::on_channel_a_edge`] from its pin-change interrupt (rising and
//! falling edges), the handler samples the current A and B levels and adds one
//! signed tick. Callers read and reset counts from the command context at any
//! time; counters are atomics so neither side can observe a torn value.
//!
//! Resolution is one tick per channel-A edge (B edges are not decoded), so
//! `pulses_per_revolution` must be expressed in those units.

use core::sync::atomic::{AtomicBool, AtomicI32, AtomicU32, Ordering};

use embedded_hal::digital::InputPin;

use crate::utils::{config::DEFAULT_ENCODER_PPR, controllers::Wheel};

/// Errors raised while sampling encoder inputs.
#[derive(Debug)]
pub enum EncoderError<E: core::fmt::Debug> {
    ChannelA(E),
    ChannelB(E),
}

/// Direction decided from a single edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    Positive,
    Negative,
}

/// Levels of channels A and B sampled right after A changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuadratureEdge {
    pub a: bool,
    pub b: bool,
}

impl QuadratureEdge {
    pub fn new(
        a: bool,
        b: bool,
    ) -> Self {
        Self { a, b }
    }

    /// Equal levels mean positive rotation, different levels negative.
    #[inline]
    pub fn rotation(&self) -> Rotation {
        if self.a == self.b {
            Rotation::Positive
        } else {
            Rotation::Negative
        }
    }
}

/// Tick counter and settings for one wheel's encoder.
pub struct EncoderChannel {
    ticks: AtomicI32,
    inverted: AtomicBool,
    pulses_per_revolution: AtomicU32,
}

impl Default for EncoderChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl EncoderChannel {
    pub const fn new() -> Self {
        Self {
            ticks: AtomicI32::new(0),
            inverted: AtomicBool::new(false),
            pulses_per_revolution: AtomicU32::new(DEFAULT_ENCODER_PPR),
        }
    }

    /// Apply one edge and return the signed delta that was added.
    ///
    /// The counter wraps on overflow.
    #[inline]
    pub fn apply(
        &self,
        edge: QuadratureEdge,
    ) -> i32 {
        let forward = matches!(edge.rotation(), Rotation::Positive);
        let delta = if forward != self.inverted.load(Ordering::Relaxed) {
            1
        } else {
            -1
        };
        self.ticks.fetch_add(delta, Ordering::Relaxed);
        delta
    }

    #[inline]
    pub fn count(&self) -> i32 {
        self.ticks.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn reset(&self) {
        self.ticks.store(0, Ordering::Relaxed);
    }

    pub fn set_inverted(
        &self,
        inverted: bool,
    ) {
        self.inverted.store(inverted, Ordering::Relaxed);
    }

    pub fn is_inverted(&self) -> bool {
        self.inverted.load(Ordering::Relaxed)
    }

    /// Returns `false` and keeps the previous value unless `ppr > 0`.
    pub fn set_pulses_per_revolution(
        &self,
        ppr: i32,
    ) -> bool {
        if ppr > 0 {
            self.pulses_per_revolution.store(ppr as u32, Ordering::Relaxed);
            true
        } else {
            false
        }
    }

    pub fn pulses_per_revolution(&self) -> u32 {
        self.pulses_per_revolution.load(Ordering::Relaxed)
    }
}

/// Decoder state for both wheels.
///
/// All methods take `&self`; place the decoder in a `static` (see
/// `mk_static!`) to share it between the command loop and the edge handlers.
#[derive(Default)]
pub struct QuadratureDecoder {
    left: EncoderChannel,
    right: EncoderChannel,
}

impl QuadratureDecoder {
    pub const fn new() -> Self {
        Self {
            left: EncoderChannel::new(),
            right: EncoderChannel::new(),
        }
    }

    /// The channel backing `wheel`.
    #[inline]
    pub fn channel(
        &self,
        wheel: Wheel,
    ) -> &EncoderChannel {
        match wheel {
            Wheel::Left => &self.left,
            Wheel::Right => &self.right,
        }
    }

    /// Build the interrupt-side handler for `wheel` from its two input pins.
    pub fn edge_handler<A, B, E>(
        &self,
        wheel: Wheel,
        pin_a: A,
        pin_b: B,
    ) -> EdgeHandler<'_, A, B>
    where
        A: InputPin<Error = E>,
        B: InputPin<Error = E>,
        E: core::fmt::Debug,
    {
        EdgeHandler::new(self.channel(wheel), pin_a, pin_b)
    }

    /// Decode an edge whose levels were already read by the host.
    #[inline]
    pub fn record_edge(
        &self,
        wheel: Wheel,
        edge: QuadratureEdge,
    ) -> i32 {
        self.channel(wheel).apply(edge)
    }

    pub fn count(
        &self,
        wheel: Wheel,
    ) -> i32 {
        self.channel(wheel).count()
    }

    /// Both counts taken with edge handling masked, so they describe the same
    /// instant.
    pub fn counts(&self) -> (i32, i32) {
        critical_section::with(|_| (self.left.count(), self.right.count()))
    }

    pub fn reset(
        &self,
        wheel: Wheel,
    ) {
        self.channel(wheel).reset();
    }

    /// Zero both counters with no edge landing between the two stores.
    pub fn reset_all(&self) {
        critical_section::with(|_| {
            self.left.reset();
            self.right.reset();
        });
    }

    pub fn set_inverted(
        &self,
        wheel: Wheel,
        inverted: bool,
    ) {
        self.channel(wheel).set_inverted(inverted);
    }

    pub fn is_inverted(
        &self,
        wheel: Wheel,
    ) -> bool {
        self.channel(wheel).is_inverted()
    }

    /// Non-positive values are ignored.
    pub fn set_pulses_per_revolution(
        &self,
        wheel: Wheel,
        ppr: i32,
    ) {
        if !self.channel(wheel).set_pulses_per_revolution(ppr) {
            tracing::warn!(?wheel, ppr, "ignoring non-positive pulses per revolution");
        }
    }

    pub fn pulses_per_revolution(
        &self,
        wheel: Wheel,
    ) -> u32 {
        self.channel(wheel).pulses_per_revolution()
    }

    /// Current count expressed in wheel revolutions.
    pub fn revolutions(
        &self,
        wheel: Wheel,
    ) -> f32 {
        let ch = self.channel(wheel);
        ch.count() as f32 / ch.pulses_per_revolution() as f32
    }
}

/// Interrupt-side decoder for one wheel.
///
/// Owns the wheel's A and B inputs and borrows only that wheel's counter.
/// Calls for one wheel must not overlap; the two wheels' handlers may run
/// concurrently and preempt each other.
pub struct EdgeHandler<'a, A, B> {
    channel: &'a EncoderChannel,
    pin_a: A,
    pin_b: B,
}

impl<'a, A, B, E> EdgeHandler<'a, A, B>
where
    A: InputPin<Error = E>,
    B: InputPin<Error = E>,
    E: core::fmt::Debug,
{
    pub fn new(
        channel: &'a EncoderChannel,
        pin_a: A,
        pin_b: B,
    ) -> Self {
        Self {
            channel,
            pin_a,
            pin_b,
        }
    }

    /// Read the current A and B levels.
    pub fn sample(&mut self) -> Result<QuadratureEdge, EncoderError<E>> {
        let a = self.pin_a.is_high().map_err(EncoderError::ChannelA)?;
        let b = self.pin_b.is_high().map_err(EncoderError::ChannelB)?;
        Ok(QuadratureEdge { a, b })
    }

    /// Handle a level change on channel A. Returns the delta applied.
    ///
    /// If either pin cannot be read the count is left untouched.
    pub fn on_channel_a_edge(&mut self) -> Result<i32, EncoderError<E>> {
        let edge = self.sample()?;
        Ok(self.channel.apply(edge))
    }

    /// Give the input pins back.
    pub fn release(self) -> (A, B) {
        (self.pin_a, self.pin_b)
    }
}
