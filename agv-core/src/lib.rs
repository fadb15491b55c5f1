//! Core encoder decoding and motor actuation for a two-wheeled differential AGV
//! on no-std embedded platforms.
//!
//! For a host-side simulation, see `agv-app/mock-mcu`.
#![no_std]

pub mod utils;

#[doc(hidden)]
pub use static_cell;
