//! The scale/chord pair behind every musical parameter.

use super::{ChordSelection, ChordState, ChordType, ChordVoicing, ScaleState};
use crate::voices::NoteSet;

/// Scale and chord state, kept consistent with each other.
///
/// Setters are idempotent and free of I/O: they only update state. Sounding
/// notes are revoiced by the caller (see [`Voices::revoice`]).
///
/// [`Voices::revoice`]: crate::Voices::revoice
///
/// # Examples
///
/// ```
/// use chordwheel::{ChordType, Harmony};
///
/// let mut harmony = Harmony::new();
/// harmony.set_chord_degree(1); // II of C major
/// assert_eq!(harmony.chord().chord_type(), ChordType::Minor);
///
/// harmony.step_root(-1); // B major: II is C# minor
/// assert_eq!(harmony.chord().root(), 1);
/// assert_eq!(harmony.chord().chord_type(), ChordType::Minor);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Harmony {
    scale: ScaleState,
    chord: ChordState,
}

impl Default for Harmony {
    fn default() -> Self {
        Self::new()
    }
}

impl Harmony {
    /// C major, octave 4, degree I diatonic triad.
    pub fn new() -> Self {
        let scale = ScaleState::new();
        let chord = ChordState::new(&scale);
        Self { scale, chord }
    }

    pub fn scale(&self) -> &ScaleState {
        &self.scale
    }

    pub fn chord(&self) -> &ChordState {
        &self.chord
    }

    // ── Setters ──────────────────────────────────────────────────────

    pub fn set_root(&mut self, pc: i32) {
        self.scale.set_root(pc);
        self.chord.recompute(&self.scale);
    }

    pub fn set_scale(&mut self, index: i32) {
        self.scale.set_scale(index);
        self.chord.recompute(&self.scale);
    }

    /// The octave only moves notes, never pitch classes, so the chord's
    /// tones are unchanged.
    pub fn set_octave(&mut self, octave: i32) {
        self.scale.set_octave(octave);
    }

    pub fn set_chord_degree(&mut self, degree: i32) {
        self.chord.set_degree(degree, &self.scale);
    }

    /// Pin the chord to an explicit type.
    pub fn set_chord_type(&mut self, chord_type: ChordType) {
        self.chord
            .set_selection(ChordSelection::Explicit(chord_type), &self.scale);
    }

    pub fn set_chord_selection(&mut self, selection: ChordSelection) {
        self.chord.set_selection(selection, &self.scale);
    }

    // ── Relative steps (encoder rotation) ────────────────────────────

    pub fn step_root(&mut self, delta: i32) {
        self.set_root(self.scale.root() as i32 + delta);
    }

    pub fn step_scale(&mut self, delta: i32) {
        self.set_scale(self.scale.scale() as i32 + delta);
    }

    pub fn step_octave(&mut self, delta: i32) {
        self.set_octave(self.scale.octave() as i32 + delta);
    }

    pub fn step_chord_degree(&mut self, delta: i32) {
        self.set_chord_degree(self.chord.degree() as i32 + delta);
    }

    pub fn step_chord_selection(&mut self, delta: i32) {
        self.set_chord_selection(self.chord.selection().stepped(delta));
    }

    // ── Notes ────────────────────────────────────────────────────────

    /// MIDI note of a single scale degree (empty above 127).
    pub fn degree_notes(&self, degree: usize) -> NoteSet {
        let mut notes = NoteSet::new();
        if let Some(note) = self.scale.degree_note(degree) {
            let _ = notes.push(note);
        }
        notes
    }

    /// MIDI notes of the selected chord.
    pub fn chord_notes(&self, bass: bool) -> NoteSet {
        self.chord.notes(&self.scale, bass)
    }

    /// MIDI notes of the chord on `degree`, using the current selection
    /// (so an explicit type applies to every degree).
    pub fn chord_notes_on(&self, degree: usize, bass: bool) -> NoteSet {
        ChordVoicing::build(&self.scale, degree, self.chord.selection()).notes(&self.scale, degree, bass)
    }

    pub(crate) fn set_chord_sounding(&mut self, sounding: bool) {
        self.chord.set_sounding(sounding);
    }
}
