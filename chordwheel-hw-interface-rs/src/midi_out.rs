//! Serial MIDI note sink.
//!
//! The engine's [`NoteSink`] is synchronous, so [`MidiOutbox`] only queues
//! the encoded bytes; the control task flushes them to the UART once the
//! tick is done. Running status is not used: every message carries its
//! status byte, so a receiver that joins mid-stream resynchronises on the
//! next message.

use chordwheel::NoteSink;
use defmt::*;
use embassy_rp::peripherals::UART0;
use embassy_rp::uart::{Async, UartTx};
use heapless::Vec;

/// Standard MIDI baud rate.
pub const MIDI_BAUD: u32 = 31_250;

/// Largest burst one tick can produce: a full panic (every voice off plus
/// three controller messages) or a full revoice, with headroom.
const OUTBOX_CAPACITY: usize = 512;

const NOTE_OFF: u8 = 0x80;
const NOTE_ON: u8 = 0x90;
const CONTROL_CHANGE: u8 = 0xB0;

pub type MidiUart = UartTx<'static, UART0, Async>;

#[derive(Default)]
pub struct MidiOutbox {
    bytes: Vec<u8, OUTBOX_CAPACITY>,
    dropped: usize,
}

impl MidiOutbox {
    pub const fn new() -> Self {
        Self {
            bytes: Vec::new(),
            dropped: 0,
        }
    }

    /// Write every queued byte to the UART and clear the queue.
    pub async fn flush(&mut self, uart: &mut MidiUart) {
        if self.dropped > 0 {
            warn!("MIDI outbox full; {} messages dropped", self.dropped);
            self.dropped = 0;
        }
        if self.bytes.is_empty() {
            return;
        }
        if let Err(e) = uart.write(&self.bytes).await {
            error!("MIDI write failed: {}", e);
        }
        self.bytes.clear();
    }

    fn push(&mut self, message: [u8; 3]) {
        if self.bytes.extend_from_slice(&message).is_err() {
            self.dropped += 1;
        }
    }
}

impl NoteSink for MidiOutbox {
    fn note_on(&mut self, pitch: u8, velocity: u8, channel: u8) {
        self.push([NOTE_ON | (channel & 0x0F), pitch & 0x7F, velocity & 0x7F]);
    }

    fn note_off(&mut self, pitch: u8, channel: u8) {
        self.push([NOTE_OFF | (channel & 0x0F), pitch & 0x7F, 0]);
    }

    fn control_change(&mut self, cc: u8, value: u8, channel: u8) {
        self.push([CONTROL_CHANGE | (channel & 0x0F), cc & 0x7F, value & 0x7F]);
    }
}
