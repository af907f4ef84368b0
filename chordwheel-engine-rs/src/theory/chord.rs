//! Chord qualities, the selection cycle and voicing.
//!
//! A diatonic chord stacks every other scale degree from the chosen degree
//! and is named by the semitone gaps between its tones (`[4, 3]` is a
//! major triad, `[3, 4, 3]` a minor seventh). An explicit [`ChordType`]
//! overrides the stack with its own intervals above the degree's root.

use heapless::Vec;

use super::{midi_note, wrap, ScaleState};
use crate::voices::NoteSet;
use crate::{DEGREE_COUNT, MAX_CHORD_NOTES};

/// Chord quality, identified by the semitone gaps between stacked tones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChordType {
    Major,
    Minor,
    Diminished,
    Augmented,
    Major7,
    Minor7,
    Dominant7,
    HalfDiminished7,
    Diminished7,
    MinorMajor7,
    AugmentedMajor7,
}

impl ChordType {
    pub const ALL: [ChordType; 11] = [
        ChordType::Major,
        ChordType::Minor,
        ChordType::Diminished,
        ChordType::Augmented,
        ChordType::Major7,
        ChordType::Minor7,
        ChordType::Dominant7,
        ChordType::HalfDiminished7,
        ChordType::Diminished7,
        ChordType::MinorMajor7,
        ChordType::AugmentedMajor7,
    ];

    /// Semitones above the chord root, ascending.
    pub fn intervals(self) -> &'static [u8] {
        match self {
            ChordType::Major => &[0, 4, 7],
            ChordType::Minor => &[0, 3, 7],
            ChordType::Diminished => &[0, 3, 6],
            ChordType::Augmented => &[0, 4, 8],
            ChordType::Major7 => &[0, 4, 7, 11],
            ChordType::Minor7 => &[0, 3, 7, 10],
            ChordType::Dominant7 => &[0, 4, 7, 10],
            ChordType::HalfDiminished7 => &[0, 3, 6, 10],
            ChordType::Diminished7 => &[0, 3, 6, 9],
            ChordType::MinorMajor7 => &[0, 3, 7, 11],
            ChordType::AugmentedMajor7 => &[0, 4, 8, 11],
        }
    }

    pub fn is_seventh(self) -> bool {
        self.intervals().len() == 4
    }

    /// Classify a chord from the ascending gaps between its tones.
    ///
    /// `[4, 3]` is major, `[3, 4]` minor, `[3, 3]` diminished, `[4, 4]`
    /// augmented; three gaps name a seventh chord.
    ///
    /// ```
    /// use chordwheel::ChordType;
    ///
    /// assert_eq!(ChordType::classify(&[4, 3]), Some(ChordType::Major));
    /// assert_eq!(ChordType::classify(&[4, 3, 3]), Some(ChordType::Dominant7));
    /// assert_eq!(ChordType::classify(&[2, 5]), None);
    /// ```
    pub fn classify(gaps: &[u8]) -> Option<ChordType> {
        ChordType::ALL.iter().copied().find(|t| {
            let intervals = t.intervals();
            intervals.len() == gaps.len() + 1
                && intervals
                    .windows(2)
                    .zip(gaps)
                    .all(|(pair, &gap)| pair[1] - pair[0] == gap)
        })
    }

    /// Abbreviated name for the display.
    pub fn short_name(self) -> &'static str {
        match self {
            ChordType::Major => "maj",
            ChordType::Minor => "min",
            ChordType::Diminished => "dim",
            ChordType::Augmented => "aug",
            ChordType::Major7 => "maj7",
            ChordType::Minor7 => "m7",
            ChordType::Dominant7 => "7",
            ChordType::HalfDiminished7 => "m7b5",
            ChordType::Diminished7 => "dim7",
            ChordType::MinorMajor7 => "mMaj7",
            ChordType::AugmentedMajor7 => "+Maj7",
        }
    }
}

/// How the chord type of a degree is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChordSelection {
    /// Stack thirds from the scale itself and classify the result.
    Diatonic { seventh: bool },
    /// User override; kept across root, scale and degree changes.
    Explicit(ChordType),
}

impl Default for ChordSelection {
    fn default() -> Self {
        ChordSelection::Diatonic { seventh: false }
    }
}

impl ChordSelection {
    /// Rotation order of the chord-selection encoder.
    pub const CYCLE: [ChordSelection; 13] = [
        ChordSelection::Diatonic { seventh: false },
        ChordSelection::Diatonic { seventh: true },
        ChordSelection::Explicit(ChordType::Major),
        ChordSelection::Explicit(ChordType::Minor),
        ChordSelection::Explicit(ChordType::Diminished),
        ChordSelection::Explicit(ChordType::Augmented),
        ChordSelection::Explicit(ChordType::Major7),
        ChordSelection::Explicit(ChordType::Minor7),
        ChordSelection::Explicit(ChordType::Dominant7),
        ChordSelection::Explicit(ChordType::HalfDiminished7),
        ChordSelection::Explicit(ChordType::Diminished7),
        ChordSelection::Explicit(ChordType::MinorMajor7),
        ChordSelection::Explicit(ChordType::AugmentedMajor7),
    ];

    /// Move `delta` places through [`CYCLE`](Self::CYCLE), wrapping.
    pub fn stepped(self, delta: i32) -> Self {
        let len = Self::CYCLE.len() as i32;
        let current = Self::CYCLE.iter().position(|&s| s == self).unwrap_or(0) as i32;
        Self::CYCLE[wrap(current + delta, 0, len - 1) as usize]
    }
}

/// A chord rooted on one scale degree: its type and stacked intervals.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChordVoicing {
    pub chord_type: ChordType,
    /// Pitch class of the chord root.
    pub root: u8,
    /// Semitones above the chord root, ascending, starting at 0.
    pub intervals: Vec<u8, 4>,
}

impl ChordVoicing {
    /// Build the chord on `degree` of `scale` according to `selection`.
    pub fn build(scale: &ScaleState, degree: usize, selection: ChordSelection) -> Self {
        let degree = degree % DEGREE_COUNT;
        let root = scale.degree_pc(degree);

        match selection {
            ChordSelection::Explicit(chord_type) => Self {
                chord_type,
                root,
                intervals: chord_type.intervals().iter().copied().collect(),
            },
            ChordSelection::Diatonic { seventh } => {
                let tone_count = if seventh { 4 } else { 3 };
                let mut intervals: Vec<u8, 4> = Vec::new();
                let mut gaps: Vec<u8, 3> = Vec::new();
                let _ = intervals.push(0);

                let mut above_root = 0;
                for k in 1..tone_count {
                    let lower = scale.degree_pc(degree + 2 * (k - 1));
                    let upper = scale.degree_pc(degree + 2 * k);
                    let gap = (upper + 12 - lower) % 12;
                    above_root += gap;
                    let _ = gaps.push(gap);
                    let _ = intervals.push(above_root);
                }

                let chord_type = ChordType::classify(&gaps)
                    .or_else(|| ChordType::classify(&gaps[..2]))
                    .unwrap_or(ChordType::Major);

                Self {
                    chord_type,
                    root,
                    intervals,
                }
            }
        }
    }

    /// Pitch classes of the chord tones, root first.
    pub fn tones(&self) -> Vec<u8, MAX_CHORD_NOTES> {
        self.intervals
            .iter()
            .map(|&i| (self.root + i) % 12)
            .collect()
    }

    /// MIDI notes for this chord built on `degree` of `scale`, stacked
    /// upward from the degree's note in the current octave, optionally with
    /// the root doubled an octave below. Notes outside 0..=127 are dropped.
    pub fn notes(&self, scale: &ScaleState, degree: usize, bass: bool) -> NoteSet {
        let base = scale.root() as i32 + scale.semitones_above_root(degree);
        let mut notes = NoteSet::new();
        if bass {
            if let Some(note) = midi_note(scale.octave(), base - 12) {
                let _ = notes.push(note);
            }
        }
        for &interval in &self.intervals {
            if let Some(note) = midi_note(scale.octave(), base + interval as i32) {
                let _ = notes.push(note);
            }
        }
        notes
    }
}

/// The selected chord: degree, selection and the resulting voicing.
///
/// Recomputed whenever the degree, the selection or the underlying scale
/// changes. An explicit chord type survives every recomputation until the
/// selection itself is changed.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChordState {
    degree: u8,
    selection: ChordSelection,
    voicing: ChordVoicing,
    tones: Vec<u8, MAX_CHORD_NOTES>,
    sounding: bool,
}

impl ChordState {
    /// Degree I, diatonic triad.
    pub fn new(scale: &ScaleState) -> Self {
        let selection = ChordSelection::default();
        let voicing = ChordVoicing::build(scale, 0, selection);
        let tones = voicing.tones();
        Self {
            degree: 0,
            selection,
            voicing,
            tones,
            sounding: false,
        }
    }

    pub fn degree(&self) -> u8 {
        self.degree
    }

    pub fn selection(&self) -> ChordSelection {
        self.selection
    }

    pub fn chord_type(&self) -> ChordType {
        self.voicing.chord_type
    }

    /// Pitch class of the chord root.
    pub fn root(&self) -> u8 {
        self.voicing.root
    }

    /// Chord tones as pitch classes, root first.
    pub fn tones(&self) -> &[u8] {
        &self.tones
    }

    pub fn voicing(&self) -> &ChordVoicing {
        &self.voicing
    }

    pub fn is_sounding(&self) -> bool {
        self.sounding
    }

    pub(crate) fn set_sounding(&mut self, sounding: bool) {
        self.sounding = sounding;
    }

    pub(crate) fn set_degree(&mut self, degree: i32, scale: &ScaleState) {
        self.degree = wrap(degree, 0, DEGREE_COUNT as i32 - 1) as u8;
        self.recompute(scale);
    }

    pub(crate) fn set_selection(&mut self, selection: ChordSelection, scale: &ScaleState) {
        self.selection = selection;
        self.recompute(scale);
    }

    pub(crate) fn recompute(&mut self, scale: &ScaleState) {
        self.voicing = ChordVoicing::build(scale, self.degree as usize, self.selection);
        self.tones = self.voicing.tones();
    }

    /// MIDI notes of the current chord.
    pub fn notes(&self, scale: &ScaleState, bass: bool) -> NoteSet {
        self.voicing.notes(scale, self.degree as usize, bass)
    }
}
