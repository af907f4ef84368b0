//! Per-control record of sounding notes.
//!
//! Every voice the engine starts belongs to exactly one control. Releasing a
//! control, unlatching it, panicking and revoicing all go through this
//! record, so a note can only be stopped by the record that started it and
//! a latch left behind by a previous mode row is still silenced correctly.
//!
//! Two controls may sound the same pitch (two assign slots on one degree, a
//! scale note under a latched chord). The channel only sees one note-on
//! per pitch: a pitch is switched on when its first owner starts it and
//! off when its last owner lets go.

use heapless::Vec;

use crate::output::NoteSink;
use crate::{ENCODER_COUNT, MAX_CHORD_NOTES};

/// MIDI notes sounded by one control.
pub type NoteSet = Vec<u8, MAX_CHORD_NOTES>;

/// What a sounding control is playing, used to recompute its notes after a
/// parameter change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum VoiceSource {
    /// A single scale degree (NoteKey).
    Degree(u8),
    /// The selected chord (ChordTrigger).
    Chord,
    /// The chord on an assign slot's degree (AssignTrigger).
    Assign(u8),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Voice {
    source: VoiceSource,
    notes: NoteSet,
    velocity: u8,
}

/// Number of voices holding each MIDI pitch.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PitchOwners {
    counts: [u8; 128],
}

impl PitchOwners {
    const fn new() -> Self {
        Self { counts: [0; 128] }
    }

    fn acquire<S: NoteSink>(&mut self, note: u8, velocity: u8, channel: u8, sink: &mut S) {
        let Some(count) = self.counts.get_mut(note as usize) else {
            return;
        };
        if *count == 0 {
            sink.note_on(note, velocity, channel);
        }
        *count = count.saturating_add(1);
    }

    fn release<S: NoteSink>(&mut self, note: u8, channel: u8, sink: &mut S) {
        let Some(count) = self.counts.get_mut(note as usize) else {
            return;
        };
        match *count {
            0 => {}
            1 => {
                *count = 0;
                sink.note_off(note, channel);
            }
            _ => *count -= 1,
        }
    }

    fn count(&self, note: u8) -> u8 {
        self.counts.get(note as usize).copied().unwrap_or(0)
    }
}

/// Sounding notes, one optional voice per control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voices {
    slots: [Option<Voice>; ENCODER_COUNT],
    owners: PitchOwners,
    channel: u8,
}

impl Voices {
    pub fn new(channel: u8) -> Self {
        Self {
            slots: Default::default(),
            owners: PitchOwners::new(),
            channel,
        }
    }

    pub fn is_sounding(&self, control: usize) -> bool {
        self.slots.get(control).map_or(false, |slot| slot.is_some())
    }

    /// Notes currently sounded by `control` (empty when silent).
    pub fn notes(&self, control: usize) -> &[u8] {
        match self.slots.get(control) {
            Some(Some(voice)) => &voice.notes,
            _ => &[],
        }
    }

    /// Number of controls currently sounding `pitch`.
    pub fn owners(&self, pitch: u8) -> u8 {
        self.owners.count(pitch)
    }

    pub fn source(&self, control: usize) -> Option<VoiceSource> {
        self.slots.get(control)?.as_ref().map(|voice| voice.source)
    }

    /// Any control is sounding a chord (selected or assigned).
    pub fn any_chord_sounding(&self) -> bool {
        self.slots.iter().flatten().any(|voice| {
            matches!(voice.source, VoiceSource::Chord | VoiceSource::Assign(_))
        })
    }

    /// Start `notes` on `control`, silencing whatever it sounded before.
    /// Pitches another control already sounds are not sent again.
    pub fn start<S: NoteSink>(
        &mut self,
        control: usize,
        source: VoiceSource,
        notes: NoteSet,
        velocity: u8,
        sink: &mut S,
    ) {
        if control >= ENCODER_COUNT {
            return;
        }
        self.release(control, sink);
        for &note in &notes {
            self.owners.acquire(note, velocity, self.channel, sink);
        }
        self.slots[control] = Some(Voice {
            source,
            notes,
            velocity,
        });
    }

    /// Stop every note sounded by `control`, except pitches another control
    /// still holds. Returns `false` if the control was already silent
    /// (nothing is sent).
    pub fn release<S: NoteSink>(&mut self, control: usize, sink: &mut S) -> bool {
        let Some(voice) = self.slots.get_mut(control).and_then(Option::take) else {
            return false;
        };
        for &note in &voice.notes {
            self.owners.release(note, self.channel, sink);
        }
        true
    }

    /// Stop every sounding voice. Returns the number of voices stopped.
    pub fn release_all<S: NoteSink>(&mut self, sink: &mut S) -> usize {
        (0..ENCODER_COUNT)
            .filter(|&control| self.release(control, sink))
            .count()
    }

    /// Replace each sounding voice whose notes changed.
    ///
    /// `resolve` maps a voice source to its notes under the new parameters.
    /// All note-offs of the affected voices (their *old* notes, so an octave
    /// change releases the previous octave) are sent before any note-on of
    /// the new sets. Voices whose notes did not change keep sounding
    /// untouched. Returns the number of voices revoiced.
    pub fn revoice<S, F>(&mut self, sink: &mut S, resolve: F) -> usize
    where
        S: NoteSink,
        F: Fn(VoiceSource) -> NoteSet,
    {
        let mut replacements: [Option<NoteSet>; ENCODER_COUNT] = Default::default();
        for (slot, replacement) in self.slots.iter().zip(replacements.iter_mut()) {
            if let Some(voice) = slot {
                let notes = resolve(voice.source);
                if notes != voice.notes {
                    *replacement = Some(notes);
                }
            }
        }

        for (slot, replacement) in self.slots.iter().zip(replacements.iter()) {
            if let (Some(voice), Some(_)) = (slot, replacement) {
                for &note in &voice.notes {
                    self.owners.release(note, self.channel, sink);
                }
            }
        }

        let mut revoiced = 0;
        for (slot, replacement) in self.slots.iter_mut().zip(replacements) {
            if let (Some(voice), Some(notes)) = (slot.as_mut(), replacement) {
                for &note in &notes {
                    self.owners.acquire(note, voice.velocity, self.channel, sink);
                }
                voice.notes = notes;
                revoiced += 1;
            }
        }
        revoiced
    }
}
