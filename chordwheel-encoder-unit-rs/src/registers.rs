//! Register map of the M5Stack Unit 8Encoder.
//!
//! The unit exposes a flat 8-bit register space. Multi-byte values are
//! little-endian; per-channel registers are laid out consecutively from a
//! base address:
//!
//! | Base   | Width | Per channel | Access | Meaning                         |
//! |--------|-------|-------------|--------|---------------------------------|
//! | `0x00` | 4     | 8 × i32     | R/W    | absolute counter                |
//! | `0x20` | 4     | 8 × i32     | R      | increment since last read       |
//! | `0x40` | 1     | 8 × u8      | W      | write 1 to reset the counter    |
//! | `0x50` | 1     | 8 × u8      | R      | button level, 0 = pressed       |
//! | `0x60` | 1     | —           | R      | toggle switch, 1 = on           |
//! | `0x70` | 3     | 9 × RGB     | W      | LEDs (8 encoders + switch LED)  |
//! | `0xFE` | 1     | —           | R      | firmware version                |
//! | `0xFF` | 1     | —           | R/W    | I2C address                     |

// ---------------------------------------------------------------------------
// Per-channel registers (base addresses)
// ---------------------------------------------------------------------------

/// Absolute counter, 32-bit signed. Address: `COUNTER + 4 * channel`.
pub const COUNTER: u8 = 0x00;

/// Counter reset. Address: `COUNTER_RESET + channel`; write 1.
pub const COUNTER_RESET: u8 = 0x40;

/// Button level. Address: `BUTTON + channel`; 0 while pressed.
pub const BUTTON: u8 = 0x50;

/// RGB LED. Address: `RGB_LED + 3 * led`; bytes R, G, B.
pub const RGB_LED: u8 = 0x70;

// ---------------------------------------------------------------------------
// Single registers
// ---------------------------------------------------------------------------

/// Toggle switch level, 1 when on.
pub const SWITCH: u8 = 0x60;

/// Firmware version byte.
pub const FIRMWARE_VERSION: u8 = 0xFE;

// ---------------------------------------------------------------------------
// Device constants
// ---------------------------------------------------------------------------

/// Factory I2C address of the unit.
pub const DEFAULT_ADDRESS: u8 = 0x41;

/// Number of rotary encoders on the unit.
pub const ENCODER_COUNT: usize = 8;

/// Number of RGB LEDs: one per encoder plus the switch LED (index 8).
pub const LED_COUNT: usize = 9;
