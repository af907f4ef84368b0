//! Interaction and music-theory engine for the Chordwheel controller.
//!
//! Eight push-button rotary encoders and one toggle switch drive a diatonic
//! scale/chord engine that emits note-on/note-off events. This crate holds
//! everything between the raw hardware readings and the note sink:
//!
//! ```text
//! ControlSurface ──► Sampler ──► SurfaceReading
//!                                   │
//!             ┌─────────────────────┼──────────────────────┐
//!             ▼                     ▼                      ▼
//!      EncoderChannel         ButtonChannel           toggle switch
//!      (debounce, detent)     (press/hold/latch)      (OperatingMode)
//!             │                     │
//!             ▼                     ▼
//!      Performance::route     ActionTable row ──► ControlAction callbacks
//!             │                     │
//!             └──────► Harmony ◄────┘
//!                        │
//!                        ▼
//!                     Voices ──► NoteSink
//! ```
//!
//! [`Controller::tick`] runs one fixed-period pass over a pre-sampled
//! [`SurfaceReading`]; [`Controller::poll`] samples an async
//! [`ControlSurface`] first, applying the retry and bus-recovery policy.
//!
//! # `no_std` Compatibility
//!
//! No heap allocation. Variable-length sets (chord tones, sounding notes,
//! debounce bursts) use [`heapless::Vec`]. The optional `defmt` feature
//! enables structured logging and `defmt::Format` on public types.

#![cfg_attr(not(test), no_std)]

pub mod action;
pub mod button;
pub mod config;
pub mod controller;
pub mod encoder;
pub mod error;
pub mod mode;
pub mod output;
pub mod router;
pub mod snapshot;
pub mod surface;
pub mod theory;
pub mod voices;

#[cfg(test)]
pub(crate) mod testing;

pub use action::{Action, ActionContext, ActionTable, ControlAction};
pub use button::{ButtonChannel, ButtonEvent, ButtonState};
pub use config::EngineConfig;
pub use controller::{Controller, PanicReport, TickSummary};
pub use encoder::{EncoderChannel, StepEvent};
pub use error::{BusFault, TransientIoError};
pub use mode::{ChordSubMode, OperatingMode, ParamFocus};
pub use output::{NoteSink, NullSink};
pub use router::{Performance, RouteOutcome};
pub use snapshot::Snapshot;
pub use surface::{ControlSurface, PositionSample, SampleError, Sampler, SurfaceReading};
pub use theory::{ChordSelection, ChordState, ChordType, Harmony, ScaleState};
pub use voices::{NoteSet, VoiceSource, Voices};

/// Number of push-button rotary encoders on the unit.
pub const ENCODER_COUNT: usize = 8;

/// Number of degrees in every scale of the scale table.
pub const DEGREE_COUNT: usize = 7;

/// Raw samples per encoder per tick; also the debounce agreement depth.
pub const DEBOUNCE_DEPTH: usize = 3;

/// Upper bound on the MIDI notes a single control can sound at once.
pub const MAX_CHORD_NOTES: usize = 6;

/// Encoder whose button cycles the parameter focus and whose rotation
/// edits the focused parameter, in every mode.
pub const FOCUS_ENCODER: usize = 7;
