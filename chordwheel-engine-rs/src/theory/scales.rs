//! Fixed scale table.
//!
//! Nine seven-note scales. `SCALE_OFFSETS[s]` lists the semitone offset of
//! each degree above the root, ascending, always starting at 0.

use crate::DEGREE_COUNT;

/// Number of scales in the table.
pub const SCALE_COUNT: usize = 9;

/// Human-readable scale names for the display, indexed by scale number.
pub const SCALE_NAMES: [&str; SCALE_COUNT] = [
    "Major",
    "Minor",
    "Harm Minor",
    "Mel Minor",
    "Dorian",
    "Phrygian",
    "Lydian",
    "Mixolydian",
    "Locrian",
];

/// Degree offsets in semitones above the root, indexed by scale number.
pub const SCALE_OFFSETS: [[u8; DEGREE_COUNT]; SCALE_COUNT] = [
    [0, 2, 4, 5, 7, 9, 11], // Major (Ionian)
    [0, 2, 3, 5, 7, 8, 10], // Natural minor (Aeolian)
    [0, 2, 3, 5, 7, 8, 11], // Harmonic minor
    [0, 2, 3, 5, 7, 9, 11], // Melodic minor (ascending)
    [0, 2, 3, 5, 7, 9, 10], // Dorian
    [0, 1, 3, 5, 7, 8, 10], // Phrygian
    [0, 2, 4, 6, 7, 9, 11], // Lydian
    [0, 2, 4, 5, 7, 9, 10], // Mixolydian
    [0, 1, 3, 5, 6, 8, 10], // Locrian
];

/// Degree offsets for `scale`, wrapping the index into the table.
pub fn degree_offsets(scale: u8) -> &'static [u8; DEGREE_COUNT] {
    &SCALE_OFFSETS[scale as usize % SCALE_COUNT]
}

/// Display name for `scale`, wrapping the index into the table.
pub fn scale_name(scale: u8) -> &'static str {
    SCALE_NAMES[scale as usize % SCALE_COUNT]
}
