//! Test doubles shared by the unit tests.

use embedded_hal_async::delay::DelayNs;

use crate::error::{BusFault, TransientIoError};
use crate::output::NoteSink;
use crate::surface::ControlSurface;
use crate::ENCODER_COUNT;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiEvent {
    NoteOn(u8, u8),
    NoteOff(u8),
    Cc(u8, u8),
}

/// Records every message in order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<MidiEvent>,
}

impl RecordingSink {
    pub fn note_ons(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, MidiEvent::NoteOn(..)))
            .count()
    }

    pub fn note_offs(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, MidiEvent::NoteOff(..)))
            .count()
    }

    /// Every pitch that was switched on was switched off as often.
    pub fn balanced(&self) -> bool {
        (0..=127u8).all(|pitch| {
            let ons = self
                .events
                .iter()
                .filter(|e| matches!(e, MidiEvent::NoteOn(p, _) if *p == pitch))
                .count();
            let offs = self
                .events
                .iter()
                .filter(|e| matches!(e, MidiEvent::NoteOff(p) if *p == pitch))
                .count();
            ons == offs
        })
    }

    /// Pitches currently sounding according to the recorded stream.
    pub fn sounding(&self) -> Vec<u8> {
        let mut sounding = Vec::new();
        for event in &self.events {
            match *event {
                MidiEvent::NoteOn(pitch, _) => sounding.push(pitch),
                MidiEvent::NoteOff(pitch) => {
                    if let Some(i) = sounding.iter().position(|&p| p == pitch) {
                        sounding.remove(i);
                    }
                }
                MidiEvent::Cc(..) => {}
            }
        }
        sounding.sort_unstable();
        sounding
    }
}

impl NoteSink for RecordingSink {
    fn note_on(&mut self, pitch: u8, velocity: u8, _channel: u8) {
        self.events.push(MidiEvent::NoteOn(pitch, velocity));
    }

    fn note_off(&mut self, pitch: u8, _channel: u8) {
        self.events.push(MidiEvent::NoteOff(pitch));
    }

    fn control_change(&mut self, cc: u8, value: u8, _channel: u8) {
        self.events.push(MidiEvent::Cc(cc, value));
    }
}

/// Surface whose levels are set directly by the test.
///
/// `pressed` and `panic_pressed` are logical; the surface reports them
/// active-low like the hardware.
#[derive(Debug, Default)]
pub struct ScriptedSurface {
    pub positions: [i32; ENCODER_COUNT],
    pub pressed: [bool; ENCODER_COUNT],
    pub switch_on: bool,
    pub panic_pressed: bool,
    /// Number of upcoming reads (of any kind) that fail.
    pub fail_next: u32,
    /// Every read touching this channel fails.
    pub broken_channel: Option<usize>,
    pub recovery_fails: bool,
    pub bus_resets: u32,
    pub position_resets: Vec<usize>,
}

impl ScriptedSurface {
    fn glitch(&mut self, channel: Option<usize>) -> Result<(), TransientIoError> {
        if channel.is_some() && channel == self.broken_channel {
            return Err(TransientIoError);
        }
        if self.fail_next > 0 {
            self.fail_next -= 1;
            return Err(TransientIoError);
        }
        Ok(())
    }
}

impl ControlSurface for ScriptedSurface {
    async fn read_position(&mut self, channel: usize) -> Result<i32, TransientIoError> {
        self.glitch(Some(channel))?;
        Ok(self.positions[channel])
    }

    async fn read_button_level(&mut self, channel: usize) -> Result<bool, TransientIoError> {
        self.glitch(Some(channel))?;
        Ok(!self.pressed[channel])
    }

    async fn read_switch_level(&mut self) -> Result<bool, TransientIoError> {
        self.glitch(None)?;
        Ok(self.switch_on)
    }

    async fn read_panic_level(&mut self) -> Result<bool, TransientIoError> {
        self.glitch(None)?;
        Ok(!self.panic_pressed)
    }

    async fn reset_position(&mut self, channel: usize) -> Result<(), TransientIoError> {
        self.positions[channel] = 0;
        self.position_resets.push(channel);
        Ok(())
    }

    async fn reset_bus(&mut self) -> Result<(), BusFault> {
        self.bus_resets += 1;
        if self.recovery_fails {
            return Err(BusFault);
        }
        self.fail_next = 0;
        self.positions = [0; ENCODER_COUNT];
        Ok(())
    }
}

/// Delay that returns immediately and adds up what was asked for.
#[derive(Debug, Default)]
pub struct NoDelay {
    pub total_ms: u64,
}

impl DelayNs for NoDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.total_ms += ns as u64 / 1_000_000;
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.total_ms += ms as u64;
    }
}
