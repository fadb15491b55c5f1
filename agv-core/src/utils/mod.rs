//! Utility re-exports and helper macros for the AGV drive core.
//!
//! - `config`: PWM limits, encoder defaults and the `AgvConfig` bundle
//! - `controllers`: quadrature decoder, differential drive and the command
//!   dispatching `AgvController`
//!
//! The `mk_static!` macro simplifies static initialization in no-std contexts,
//! typically for a `QuadratureDecoder` shared with interrupt handlers.

pub mod config;
pub mod controllers;

pub use config::{AgvConfig, PwmLimits};
pub use controllers::{AgvController, DriveCommand, QuadratureDecoder, Wheel, DRIVE_CHANNEL};

#[macro_export]
/// Initialize a no-std static cell and write the given value into it.
///
/// This macro creates a `static_cell::StaticCell` (re-exported by this crate)
/// for type `$t` and initializes it with `$val`, returning a mutable reference
/// to the stored value.
macro_rules! mk_static {
    ($t:ty, $val:expr) => {{
        static STATIC_CELL: $crate::static_cell::StaticCell<$t> =
            $crate::static_cell::StaticCell::new();
        STATIC_CELL.uninit().write($val)
    }};
}
