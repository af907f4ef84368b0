//! Diatonic scale and chord engine.
//!
//! [`Harmony`] owns a [`ScaleState`] (root, scale, octave and everything
//! derived from them) and a [`ChordState`] (the selected scale degree and
//! its chord). Every setter recomputes the derived data before returning,
//! so a reader never observes a half-updated scale or chord.
//!
//! # Wrap policy
//!
//! | Parameter    | Range   | Wraps        |
//! |--------------|---------|--------------|
//! | root         | 0–11    | 11 ↔ 0       |
//! | scale index  | 0–8     | 8 ↔ 0        |
//! | octave       | −1–9    | 9 ↔ −1       |
//! | chord degree | 0–6     | VII ↔ I      |
//!
//! No setter can fail: out-of-range input is wrapped into range.

mod chord;
mod harmony;
mod scale_state;
pub mod scales;

pub use chord::{ChordSelection, ChordState, ChordType, ChordVoicing};
pub use harmony::Harmony;
pub use scale_state::{KeyFlags, ScaleState};

/// Lowest octave (MIDI note 0 is C-1).
pub const MIN_OCTAVE: i8 = -1;

/// Highest octave (G9 is MIDI note 127).
pub const MAX_OCTAVE: i8 = 9;

/// Pitch classes per octave.
pub const PITCH_CLASSES: i32 = 12;

/// Note names indexed by pitch class (C = 0).
pub const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Roman numerals indexed by scale degree.
pub const DEGREE_NAMES: [&str; crate::DEGREE_COUNT] = ["I", "II", "III", "IV", "V", "VI", "VII"];

/// Wrap `value` into the inclusive range `[min, max]`.
pub(crate) fn wrap(value: i32, min: i32, max: i32) -> i32 {
    min + (value - min).rem_euclid(max - min + 1)
}

/// MIDI note `semitones_above_c` semitones above the C of `octave`, if it
/// lies in 0..=127.
pub fn midi_note(octave: i8, semitones_above_c: i32) -> Option<u8> {
    let note = (octave as i32 + 1) * PITCH_CLASSES + semitones_above_c;
    u8::try_from(note).ok().filter(|&n| n <= 127)
}
