//! Async driver for the M5Stack Unit 8Encoder.
//!
//! This crate provides an Embassy-compatible async I2C driver for the
//! eight-encoder unit: eight push-button rotary encoders with absolute
//! counters, one toggle switch and nine RGB LEDs.
//!
//! # Architecture
//!
//! The crate is split into two layers:
//!
//! - **`driver`** (crate-private) — Low-level register primitives that
//!   handle byte order and the combined write-read transaction.
//! - **[`EightEncoderUnit`]** (public) — Validated, high-level API for
//!   counters, buttons, the switch and the LEDs.
//!
//! # Quick start
//!
//! ```ignore
//! use encoder_unit_driver::{EightEncoderUnit, DEFAULT_ADDRESS};
//!
//! // Construct with any `embedded-hal-async` I2C implementation
//! let mut unit = EightEncoderUnit::new(i2c, DEFAULT_ADDRESS);
//!
//! // Read all eight counters
//! let positions = unit.read_all_positions().await?;
//! ```
//!
//! # Features
//!
//! - **`defmt`** — Enable [`defmt::Format`] implementations on error types
//!   for embedded logging.

#![no_std]

pub use error::EncoderError;
pub use registers::{DEFAULT_ADDRESS, ENCODER_COUNT, LED_COUNT};
pub use unit::EightEncoderUnit;

mod driver;
mod error;
mod registers;
mod unit;
