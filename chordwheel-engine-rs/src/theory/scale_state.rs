//! Root, scale index and octave with their derived degree and key data.

use super::scales::{self, SCALE_COUNT};
use super::{midi_note, wrap, MAX_OCTAVE, MIN_OCTAVE, PITCH_CLASSES};
use crate::DEGREE_COUNT;

/// Role of one chromatic key in the current scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyFlags {
    /// The key's pitch class is one of the seven scale degrees.
    pub in_scale: bool,
    /// The key is the scale root. Exactly one key carries this flag.
    pub fundamental: bool,
}

/// Root, scale and octave plus everything derived from them.
///
/// Derived data (degree pitch classes, inter-degree intervals and the
/// 12-key chromatic map) is recomputed by every setter, so it is always
/// consistent with the inputs.
///
/// # Examples
///
/// ```
/// use chordwheel::ScaleState;
///
/// let mut scale = ScaleState::new();
/// scale.set_root(2); // D major
/// assert_eq!(scale.degrees(), &[2, 4, 6, 7, 9, 11, 1]);
/// assert_eq!(scale.intervals(), &[2, 2, 1, 2, 2, 2, 1]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScaleState {
    root: u8,
    scale: u8,
    octave: i8,
    degrees: [u8; DEGREE_COUNT],
    intervals: [u8; DEGREE_COUNT],
    keys: [KeyFlags; 12],
}

impl Default for ScaleState {
    fn default() -> Self {
        Self::new()
    }
}

impl ScaleState {
    /// C major, octave 4.
    pub fn new() -> Self {
        let mut state = Self {
            root: 0,
            scale: 0,
            octave: 4,
            degrees: [0; DEGREE_COUNT],
            intervals: [0; DEGREE_COUNT],
            keys: [KeyFlags::default(); 12],
        };
        state.recompute();
        state
    }

    // ── Inputs ───────────────────────────────────────────────────────

    pub fn root(&self) -> u8 {
        self.root
    }

    pub fn scale(&self) -> u8 {
        self.scale
    }

    pub fn octave(&self) -> i8 {
        self.octave
    }

    /// Set the root pitch class, wrapping into 0–11.
    pub fn set_root(&mut self, pc: i32) {
        self.root = wrap(pc, 0, PITCH_CLASSES - 1) as u8;
        self.recompute();
    }

    /// Set the scale index, wrapping into the scale table.
    pub fn set_scale(&mut self, index: i32) {
        self.scale = wrap(index, 0, SCALE_COUNT as i32 - 1) as u8;
        self.recompute();
    }

    /// Set the octave, wrapping into −1–9.
    pub fn set_octave(&mut self, octave: i32) {
        self.octave = wrap(octave, MIN_OCTAVE as i32, MAX_OCTAVE as i32) as i8;
    }

    // ── Derived data ─────────────────────────────────────────────────

    /// Pitch classes of degrees I–VII, starting at the root.
    pub fn degrees(&self) -> &[u8; DEGREE_COUNT] {
        &self.degrees
    }

    /// Forward semitone distance from each degree to the next; the last
    /// entry closes the octave (VII → I). Always sums to 12.
    pub fn intervals(&self) -> &[u8; DEGREE_COUNT] {
        &self.intervals
    }

    /// The six intervals between successive degrees I → VII.
    pub fn inter_degree_intervals(&self) -> &[u8] {
        &self.intervals[..DEGREE_COUNT - 1]
    }

    /// Chromatic map indexed by pitch class.
    pub fn keys(&self) -> &[KeyFlags; 12] {
        &self.keys
    }

    /// Pitch class of `degree` (wrapped into 0–6).
    pub fn degree_pc(&self, degree: usize) -> u8 {
        self.degrees[degree % DEGREE_COUNT]
    }

    /// Semitones from the root up to `degree` (wrapped into 0–6).
    pub fn semitones_above_root(&self, degree: usize) -> i32 {
        self.intervals[..degree % DEGREE_COUNT]
            .iter()
            .map(|&i| i as i32)
            .sum()
    }

    /// MIDI note of `degree` in the current octave, ascending from the root.
    ///
    /// `None` when the note falls above 127 (high octaves of high roots).
    pub fn degree_note(&self, degree: usize) -> Option<u8> {
        midi_note(
            self.octave,
            self.root as i32 + self.semitones_above_root(degree),
        )
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn recompute(&mut self) {
        let root = self.root as usize;
        let mut keys = [KeyFlags::default(); 12];
        for &offset in scales::degree_offsets(self.scale) {
            keys[(root + offset as usize) % 12].in_scale = true;
        }
        keys[root].fundamental = true;

        // Scale keys in chromatic order from C, then rotated so that
        // degree I is the fundamental.
        let mut ascending = [0u8; DEGREE_COUNT];
        let mut count = 0;
        for (pc, flags) in keys.iter().enumerate() {
            if flags.in_scale && count < DEGREE_COUNT {
                ascending[count] = pc as u8;
                count += 1;
            }
        }
        let start = ascending
            .iter()
            .position(|&pc| keys[pc as usize].fundamental)
            .unwrap_or(0);
        for (i, degree) in self.degrees.iter_mut().enumerate() {
            *degree = ascending[(start + i) % DEGREE_COUNT];
        }

        for i in 0..DEGREE_COUNT {
            let current = self.degrees[i];
            let next = self.degrees[(i + 1) % DEGREE_COUNT];
            self.intervals[i] = (next + 12 - current) % 12;
        }

        self.keys = keys;
    }
}
