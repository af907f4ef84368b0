//! Action dispatch table.
//!
//! Each control's button is bound to an [`Action`] chosen by
//! (operating mode, chord sub-mode, control index):
//!
//! ```text
//! control         0        1        2        3        4        5        6        7
//! Scale        NoteKey  NoteKey  NoteKey  NoteKey  NoteKey  NoteKey  NoteKey  ModeCycle
//! Chord        Chord    NoOp     NoOp     NoOp     NoOp     NoOp     Panic    ModeCycle
//! Assign       Assign0  Assign1  Assign2  Assign3  Assign4  Assign5  Assign6  ModeCycle
//! ```
//!
//! Actions only see an [`ActionContext`]; anything that changes the table
//! itself (sub-mode toggle) or touches every control (panic) is posted as a
//! request and applied by the controller once the callback returns.

use crate::config::EngineConfig;
use crate::mode::{ChordSubMode, OperatingMode};
use crate::output::NoteSink;
use crate::router::Performance;
use crate::voices::{VoiceSource, Voices};
use crate::ENCODER_COUNT;

/// Work an action asks the controller to do after its callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Requests {
    pub panic: bool,
    pub toggle_sub_mode: bool,
}

/// What a callback may touch.
pub struct ActionContext<'a, S: NoteSink> {
    pub perf: &'a mut Performance,
    pub voices: &'a mut Voices,
    pub sink: &'a mut S,
    pub requests: &'a mut Requests,
    pub config: &'a EngineConfig,
    /// Index of the control whose button fired.
    pub control: usize,
}

impl<S: NoteSink> ActionContext<'_, S> {
    /// Sound `source` on this control at its current velocity.
    pub fn sound(&mut self, source: VoiceSource) {
        let notes = self.perf.resolve(source, self.config);
        let velocity = self.perf.velocity_for(source);
        self.voices
            .start(self.control, source, notes, velocity, &mut *self.sink);
    }

    /// Stop whatever this control sounds.
    pub fn silence(&mut self) {
        self.voices.release(self.control, &mut *self.sink);
    }
}

/// Button callbacks of one action. Every callback defaults to doing nothing.
pub trait ControlAction {
    /// Whether a hold moves the button to `Latched`.
    fn allows_latch(&self) -> bool {
        false
    }

    fn on_press_start<S: NoteSink>(&self, _ctx: &mut ActionContext<'_, S>) {}

    fn on_release_short<S: NoteSink>(&self, _ctx: &mut ActionContext<'_, S>) {}

    fn on_hold<S: NoteSink>(&self, _ctx: &mut ActionContext<'_, S>) {}

    fn on_press_while_latched<S: NoteSink>(&self, _ctx: &mut ActionContext<'_, S>) {}
}

// ── Action variants ──────────────────────────────────────────────────

/// Plays one scale degree while held; latchable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NoteKey {
    pub degree: u8,
}

impl ControlAction for NoteKey {
    fn allows_latch(&self) -> bool {
        true
    }

    fn on_press_start<S: NoteSink>(&self, ctx: &mut ActionContext<'_, S>) {
        ctx.sound(VoiceSource::Degree(self.degree));
    }

    fn on_release_short<S: NoteSink>(&self, ctx: &mut ActionContext<'_, S>) {
        ctx.silence();
    }

    fn on_press_while_latched<S: NoteSink>(&self, ctx: &mut ActionContext<'_, S>) {
        ctx.silence();
    }
}

/// Plays the selected chord while held; latchable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChordTrigger;

impl ControlAction for ChordTrigger {
    fn allows_latch(&self) -> bool {
        true
    }

    fn on_press_start<S: NoteSink>(&self, ctx: &mut ActionContext<'_, S>) {
        ctx.sound(VoiceSource::Chord);
    }

    fn on_release_short<S: NoteSink>(&self, ctx: &mut ActionContext<'_, S>) {
        ctx.silence();
    }

    fn on_press_while_latched<S: NoteSink>(&self, ctx: &mut ActionContext<'_, S>) {
        ctx.silence();
    }
}

/// Plays the diatonic chord of the degree bound to an assign slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AssignTrigger {
    pub slot: u8,
}

impl ControlAction for AssignTrigger {
    fn allows_latch(&self) -> bool {
        true
    }

    fn on_press_start<S: NoteSink>(&self, ctx: &mut ActionContext<'_, S>) {
        ctx.sound(VoiceSource::Assign(self.slot));
    }

    fn on_release_short<S: NoteSink>(&self, ctx: &mut ActionContext<'_, S>) {
        ctx.silence();
    }

    fn on_press_while_latched<S: NoteSink>(&self, ctx: &mut ActionContext<'_, S>) {
        ctx.silence();
    }
}

/// Stops all sound on press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Panic;

impl ControlAction for Panic {
    fn on_press_start<S: NoteSink>(&self, ctx: &mut ActionContext<'_, S>) {
        ctx.requests.panic = true;
    }
}

/// Short press cycles the parameter focus; in chord mode a hold toggles
/// the Normal/Assign sub-mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ModeCycle;

impl ControlAction for ModeCycle {
    fn on_release_short<S: NoteSink>(&self, ctx: &mut ActionContext<'_, S>) {
        ctx.perf.cycle_focus();
    }

    fn on_hold<S: NoteSink>(&self, ctx: &mut ActionContext<'_, S>) {
        if ctx.perf.mode() == OperatingMode::Chord {
            ctx.requests.toggle_sub_mode = true;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NoOp;

impl ControlAction for NoOp {}

/// Closed set of actions a control can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Action {
    NoteKey(NoteKey),
    ChordTrigger(ChordTrigger),
    AssignTrigger(AssignTrigger),
    Panic(Panic),
    ModeCycle(ModeCycle),
    NoOp(NoOp),
}

macro_rules! dispatch {
    ($self:ident, $action:ident => $body:expr) => {
        match $self {
            Action::NoteKey($action) => $body,
            Action::ChordTrigger($action) => $body,
            Action::AssignTrigger($action) => $body,
            Action::Panic($action) => $body,
            Action::ModeCycle($action) => $body,
            Action::NoOp($action) => $body,
        }
    };
}

impl ControlAction for Action {
    fn allows_latch(&self) -> bool {
        dispatch!(self, a => a.allows_latch())
    }

    fn on_press_start<S: NoteSink>(&self, ctx: &mut ActionContext<'_, S>) {
        dispatch!(self, a => a.on_press_start(ctx))
    }

    fn on_release_short<S: NoteSink>(&self, ctx: &mut ActionContext<'_, S>) {
        dispatch!(self, a => a.on_release_short(ctx))
    }

    fn on_hold<S: NoteSink>(&self, ctx: &mut ActionContext<'_, S>) {
        dispatch!(self, a => a.on_hold(ctx))
    }

    fn on_press_while_latched<S: NoteSink>(&self, ctx: &mut ActionContext<'_, S>) {
        dispatch!(self, a => a.on_press_while_latched(ctx))
    }
}

// ── Table ────────────────────────────────────────────────────────────

static SCALE_ROW: [Action; ENCODER_COUNT] = [
    Action::NoteKey(NoteKey { degree: 0 }),
    Action::NoteKey(NoteKey { degree: 1 }),
    Action::NoteKey(NoteKey { degree: 2 }),
    Action::NoteKey(NoteKey { degree: 3 }),
    Action::NoteKey(NoteKey { degree: 4 }),
    Action::NoteKey(NoteKey { degree: 5 }),
    Action::NoteKey(NoteKey { degree: 6 }),
    Action::ModeCycle(ModeCycle),
];

static CHORD_ROW: [Action; ENCODER_COUNT] = [
    Action::ChordTrigger(ChordTrigger),
    Action::NoOp(NoOp),
    Action::NoOp(NoOp),
    Action::NoOp(NoOp),
    Action::NoOp(NoOp),
    Action::NoOp(NoOp),
    Action::Panic(Panic),
    Action::ModeCycle(ModeCycle),
];

static ASSIGN_ROW: [Action; ENCODER_COUNT] = [
    Action::AssignTrigger(AssignTrigger { slot: 0 }),
    Action::AssignTrigger(AssignTrigger { slot: 1 }),
    Action::AssignTrigger(AssignTrigger { slot: 2 }),
    Action::AssignTrigger(AssignTrigger { slot: 3 }),
    Action::AssignTrigger(AssignTrigger { slot: 4 }),
    Action::AssignTrigger(AssignTrigger { slot: 5 }),
    Action::AssignTrigger(AssignTrigger { slot: 6 }),
    Action::ModeCycle(ModeCycle),
];

/// Lookup of the active action row.
pub struct ActionTable;

impl ActionTable {
    /// Actions bound to controls 0–7 in the given mode.
    ///
    /// # Examples
    ///
    /// ```
    /// use chordwheel::{Action, ActionTable, ChordSubMode, ControlAction, OperatingMode};
    ///
    /// let row = ActionTable::row(OperatingMode::Chord, ChordSubMode::Normal);
    /// assert!(row[0].allows_latch());
    /// assert!(!row[6].allows_latch());
    /// assert!(matches!(row[7], Action::ModeCycle(_)));
    /// ```
    pub fn row(mode: OperatingMode, sub_mode: ChordSubMode) -> &'static [Action; ENCODER_COUNT] {
        match (mode, sub_mode) {
            (OperatingMode::Scale, _) => &SCALE_ROW,
            (OperatingMode::Chord, ChordSubMode::Normal) => &CHORD_ROW,
            (OperatingMode::Chord, ChordSubMode::Assign) => &ASSIGN_ROW,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MidiEvent, RecordingSink};

    struct Fixture {
        config: EngineConfig,
        perf: Performance,
        voices: Voices,
        sink: RecordingSink,
        requests: Requests,
    }

    impl Fixture {
        fn new() -> Self {
            let config = EngineConfig {
                bass_note: false,
                ..EngineConfig::default()
            };
            Self {
                perf: Performance::new(&config),
                voices: Voices::new(config.midi_channel),
                sink: RecordingSink::default(),
                requests: Requests::default(),
                config,
            }
        }

        fn ctx(&mut self, control: usize) -> ActionContext<'_, RecordingSink> {
            ActionContext {
                perf: &mut self.perf,
                voices: &mut self.voices,
                sink: &mut self.sink,
                requests: &mut self.requests,
                config: &self.config,
                control,
            }
        }
    }

    #[test]
    fn only_note_and_chord_actions_latch() {
        for (mode, sub) in [
            (OperatingMode::Scale, ChordSubMode::Normal),
            (OperatingMode::Chord, ChordSubMode::Normal),
            (OperatingMode::Chord, ChordSubMode::Assign),
        ] {
            for action in ActionTable::row(mode, sub) {
                let expected = matches!(
                    action,
                    Action::NoteKey(_) | Action::ChordTrigger(_) | Action::AssignTrigger(_)
                );
                assert_eq!(action.allows_latch(), expected);
            }
        }
    }

    #[test]
    fn note_key_sounds_degree_and_silences_on_release() {
        let mut fx = Fixture::new();
        let key = Action::NoteKey(NoteKey { degree: 2 });

        key.on_press_start(&mut fx.ctx(2));
        key.on_release_short(&mut fx.ctx(2));

        // E4 in C major.
        assert_eq!(fx.sink.events, vec![MidiEvent::NoteOn(64, 100), MidiEvent::NoteOff(64)]);
    }

    #[test]
    fn chord_trigger_uses_chord_velocity() {
        let mut fx = Fixture::new();
        fx.perf.set_mode(OperatingMode::Chord);
        let trigger = Action::ChordTrigger(ChordTrigger);

        trigger.on_press_start(&mut fx.ctx(0));
        assert_eq!(fx.voices.notes(0), &[60, 64, 67]);
        trigger.on_press_while_latched(&mut fx.ctx(0));
        assert!(!fx.voices.is_sounding(0));
        assert!(fx.sink.balanced());
    }

    #[test]
    fn panic_action_posts_a_request() {
        let mut fx = Fixture::new();
        Action::Panic(Panic).on_press_start(&mut fx.ctx(6));
        assert!(fx.requests.panic);
        assert!(fx.sink.events.is_empty());
    }

    #[test]
    fn mode_cycle_short_press_cycles_focus() {
        let mut fx = Fixture::new();
        Action::ModeCycle(ModeCycle).on_release_short(&mut fx.ctx(7));
        assert_eq!(fx.perf.focus(), crate::mode::ParamFocus::Scale);
    }

    #[test]
    fn mode_cycle_hold_toggles_sub_mode_only_in_chord_mode() {
        let mut fx = Fixture::new();
        let cycle = Action::ModeCycle(ModeCycle);

        cycle.on_hold(&mut fx.ctx(7));
        assert!(!fx.requests.toggle_sub_mode);

        fx.perf.set_mode(OperatingMode::Chord);
        cycle.on_hold(&mut fx.ctx(7));
        assert!(fx.requests.toggle_sub_mode);
    }
}
