//! # keyfob433
//!
//! A portable, no_std Rust firmware core for a battery-powered 433 MHz remote-control keyfob
//! that speaks a commercial garage/gate OOK protocol.
//!
//! The crate covers everything between the pins and the power primitive:
//! - a 64-bit payload with fixed frame markers, duplicated button nibble, 28-bit device ID and
//!   a duplicated rolling byte
//! - an inverse-width OOK waveform encoder (and the matching decoder, for receivers and tests)
//! - a blocking transmitter that plays the waveform on a single GPIO with `embedded-hal` delays
//! - supply voltage measurement against the internal bandgap reference
//! - a three-LED battery indicator state machine
//! - the wake → active → idle → sleep controller that gates transmissions
//!
//! ## Crate features
//! | Feature              | Description |
//! |----------------------|-------------|
//! | `std`                | Disables `#![no_std]`; used for host testing |
//! | `wake-isr` (default) | ISR wake latch guarded by `critical_section` |
//! | `defmt-0-3`          | Uses `defmt` logging |
//! | `log`                | Uses `log` logging |
//!
//! ## Usage
//!
//! ```rust,ignore
//! use keyfob433::config::Config;
//! use keyfob433::controller::Keyfob;
//! use keyfob433::power::{LatchedSleep, WAKE_LATCH};
//!
//! let sleep = LatchedSleep::new(power_down, &WAKE_LATCH);
//! let mut fob = Keyfob::new(
//!     Config::DEFAULT, button, charger, red, yellow, green, tx, adc, delay, clock, sleep,
//! )?;
//! fob.run();
//! ```
//!
//! From both external-interrupt handlers, call [`power::on_wake_interrupt`].
//!
//! --
//! Designed for `#![no_std]` use on small battery-powered MCUs.

#![deny(
    bad_style,
    dead_code,
    improper_ctypes,
    non_shorthand_field_patterns,
    no_mangle_generic_items,
    overflowing_literals,
    path_statements,
    patterns_in_fns_without_body,
    unconditional_recursion,
    unused,
    while_true,
    missing_debug_implementations,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications,
    unused_results
)]
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "wake-isr")]
pub use critical_section;

pub use heapless;

#[macro_use]
mod macros;

pub mod calibration;
pub mod config;
pub mod consts;
pub mod controller;
pub mod encoding;
pub mod error;
pub mod indicator;
pub mod input;
pub mod payload;
pub mod power;
pub mod rng;
pub mod timer;
pub mod transmitter;
pub mod vcc;
