//! Engine configuration.

use crate::DEBOUNCE_DEPTH;

/// Timing and range constants for the controller.
///
/// All tunables live here; array sizes are crate-level constants
/// ([`ENCODER_COUNT`](crate::ENCODER_COUNT),
/// [`DEBOUNCE_DEPTH`](crate::DEBOUNCE_DEPTH), ...).
///
/// [`EngineConfig::default()`] reproduces the device behaviour: a 20 ms
/// tick, 1 s hold-to-latch, 5 ms debounce window, ±60 raw counter range and
/// two raw transitions per encoder detent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EngineConfig {
    /// Fixed tick period in milliseconds. Default: 20.
    pub tick_period_ms: u64,
    /// Press duration after which a hold fires, in milliseconds. Default: 1000.
    pub hold_ms: u64,
    /// Debounce window in milliseconds. Default: 5.
    pub debounce_window_ms: u64,
    /// Raw counter magnitude at which the hardware counter is reset to 0.
    /// Default: 60.
    pub position_limit: i32,
    /// Raw transitions per musical step. Default: 2.
    pub steps_per_detent: i32,
    /// Read attempts per value per tick before the channel is frozen.
    /// Default: 3.
    pub read_attempts: u8,
    /// Consecutive failed reads tolerated before bus recovery. Default: 10.
    pub bus_fault_threshold: u8,
    /// Consecutive implausible zero readings after which the zero is
    /// accepted as a genuine counter resync. Default: 24.
    pub zero_glitch_tolerance: u8,
    /// MIDI channel (0–15) for every emitted message. Default: 0.
    pub midi_channel: u8,
    /// Initial per-degree and chord velocity. Default: 100.
    pub default_velocity: u8,
    /// Velocity change per encoder detent. Default: 4.
    pub velocity_step: u8,
    /// Double the chord root one octave below the voicing. Default: true.
    pub bass_note: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_period_ms: 20,
            hold_ms: 1000,
            debounce_window_ms: 5,
            position_limit: 60,
            steps_per_detent: 2,
            read_attempts: 3,
            bus_fault_threshold: 10,
            zero_glitch_tolerance: 24,
            midi_channel: 0,
            default_velocity: 100,
            velocity_step: 4,
            bass_note: true,
        }
    }
}

impl EngineConfig {
    /// Pause between two debounce rounds so that a full burst of
    /// [`DEBOUNCE_DEPTH`] samples spans more than the debounce window.
    ///
    /// Formula: `debounce_window_ms / (DEBOUNCE_DEPTH - 1) + 1`.
    pub fn burst_spacing_ms(&self) -> u64 {
        self.debounce_window_ms / (DEBOUNCE_DEPTH as u64 - 1) + 1
    }

    /// Raw counter magnitude beyond which a zero reading is suspicious.
    pub fn zero_glitch_margin(&self) -> i32 {
        2 * self.steps_per_detent
    }
}
