//! Note-output boundary.
//!
//! The engine emits MIDI-style note and controller messages through a
//! [`NoteSink`]. Sinks are synchronous and must not block: the firmware
//! queues bytes and flushes them after the tick.

/// MIDI CC 64, sustain pedal.
pub const CC_SUSTAIN: u8 = 64;

/// MIDI CC 120, all sound off.
pub const CC_ALL_SOUND_OFF: u8 = 120;

/// MIDI CC 123, all notes off.
pub const CC_ALL_NOTES_OFF: u8 = 123;

/// Destination for note and controller messages.
pub trait NoteSink {
    fn note_on(&mut self, pitch: u8, velocity: u8, channel: u8);
    fn note_off(&mut self, pitch: u8, channel: u8);
    fn control_change(&mut self, cc: u8, value: u8, channel: u8);
}

impl<T: NoteSink + ?Sized> NoteSink for &mut T {
    fn note_on(&mut self, pitch: u8, velocity: u8, channel: u8) {
        (**self).note_on(pitch, velocity, channel)
    }

    fn note_off(&mut self, pitch: u8, channel: u8) {
        (**self).note_off(pitch, channel)
    }

    fn control_change(&mut self, cc: u8, value: u8, channel: u8) {
        (**self).control_change(cc, value, channel)
    }
}

/// Sink used while no output is connected; every message is dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl NoteSink for NullSink {
    fn note_on(&mut self, _pitch: u8, _velocity: u8, _channel: u8) {}
    fn note_off(&mut self, _pitch: u8, _channel: u8) {}
    fn control_change(&mut self, _cc: u8, _value: u8, _channel: u8) {}
}
