//! Control core of a keypad-programmed square-wave generator
//!
//! A 4-digit frequency is typed on a matrix keypad, shown on a multiplexed
//! 7-segment display, and played on one output line while a control edge has
//! the generator switched on. Everything here is generic over the line and
//! timer capabilities in [`hal`]; `main.rs` binds them to an ATmega128.

#![cfg_attr(not(test), no_std)]
#![cfg_attr(target_arch = "avr", feature(abi_avr_interrupt))]

pub mod application;
pub mod config;
pub mod control;
pub mod drivers;
pub mod error;
pub mod hal;
pub mod logger;
pub mod os;
pub mod state;
pub mod synth;

pub use application::Application;
pub use control::Transition;
pub use error::Error;
pub use state::{Digit, DigitBuffer, SharedState};
pub use synth::{ChunkPlan, FrequencySynth, Mode};
