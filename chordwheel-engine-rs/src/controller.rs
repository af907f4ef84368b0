//! Fixed-period tick controller.
//!
//! [`Controller`] owns every per-control record and the musical state, and
//! advances them once per tick:
//!
//! ```text
//! poll ──► Sampler::sample ──► tick ──► counter resets
//!                               │
//!     1. panic input (edge)     │
//!     2. toggle switch → mode, action row swap
//!     3. encoders → steps → Performance::route → one revoice
//!     4. buttons → transitions → actions → requests
//!     5. chord "sounding" flag
//! ```
//!
//! All mutation of a tick completes before the next step reads derived
//! state, and nothing inside a tick can fail: I/O faults are absorbed by
//! the sampler, parameter changes wrap.
//!
//! # Unlatching
//!
//! A press on a latched control always releases the notes that control
//! owns, after the callback of whatever action is bound to it *now*. A
//! latch left behind by a mode switch (the row swap does not clear
//! latches) is therefore still silenced by the next press, whatever the
//! new action is. Likewise a press that ends in `Released` without
//! latching (short release, or release after a non-latching hold) always
//! releases the control's notes, so a note started under one row cannot
//! outlive its press under another.

use embedded_hal_async::delay::DelayNs;

use crate::action::{Action, ActionContext, ActionTable, ControlAction, Requests};
use crate::button::{ButtonChannel, ButtonEvent, ButtonState};
use crate::config::EngineConfig;
use crate::encoder::EncoderChannel;
use crate::error::BusFault;
use crate::mode::OperatingMode;
use crate::output::{NoteSink, CC_ALL_NOTES_OFF, CC_ALL_SOUND_OFF, CC_SUSTAIN};
use crate::router::{Performance, RouteOutcome};
use crate::snapshot::Snapshot;
use crate::surface::{ControlSurface, SampleError, Sampler, SurfaceReading};
use crate::voices::Voices;
use crate::ENCODER_COUNT;

/// What one tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TickSummary {
    /// Musical steps routed.
    pub steps: u8,
    /// Button transitions dispatched.
    pub transitions: u8,
    /// Encoders whose hardware counter must be reset to 0.
    pub counter_resets: [bool; ENCODER_COUNT],
    /// The panic path ran during this tick.
    pub panicked: bool,
}

/// Outcome of a panic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PanicReport {
    /// Controls forced out of `Latched`.
    pub unlatched: u8,
    /// Controls forced out of `PressedWaitingHold`.
    pub released: u8,
    /// Voices silenced.
    pub voices: u8,
}

/// The whole interaction engine.
///
/// # Examples
///
/// ```
/// use chordwheel::{Controller, EngineConfig, NullSink, SurfaceReading};
///
/// let mut controller = Controller::new(EngineConfig::default());
/// let mut reading = SurfaceReading::idle();
/// reading.buttons[0] = Some(true);
///
/// let summary = controller.tick(0, &reading, &mut NullSink);
/// assert_eq!(summary.transitions, 1);
/// assert!(controller.voices().is_sounding(0));
/// ```
pub struct Controller {
    config: EngineConfig,
    encoders: [EncoderChannel; ENCODER_COUNT],
    buttons: [ButtonChannel; ENCODER_COUNT],
    panic_pressed: bool,
    performance: Performance,
    voices: Voices,
    row: &'static [Action; ENCODER_COUNT],
    sampler: Sampler,
    changed_display: bool,
    full_redraw: bool,
}

impl Controller {
    pub fn new(config: EngineConfig) -> Self {
        let performance = Performance::new(&config);
        Self {
            encoders: core::array::from_fn(|_| EncoderChannel::new()),
            buttons: [ButtonChannel::new(); ENCODER_COUNT],
            panic_pressed: false,
            row: ActionTable::row(performance.mode(), performance.sub_mode()),
            voices: Voices::new(config.midi_channel),
            sampler: Sampler::new(&config),
            performance,
            changed_display: true,
            full_redraw: true,
            config,
        }
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn performance(&self) -> &Performance {
        &self.performance
    }

    pub fn voices(&self) -> &Voices {
        &self.voices
    }

    pub fn encoder(&self, control: usize) -> Option<&EncoderChannel> {
        self.encoders.get(control)
    }

    pub fn button_states(&self) -> [ButtonState; ENCODER_COUNT] {
        core::array::from_fn(|control| self.buttons[control].state())
    }

    /// Actions currently bound to controls 0–7.
    pub fn row(&self) -> &'static [Action; ENCODER_COUNT] {
        self.row
    }

    pub fn snapshot(&self) -> Snapshot {
        let perf = &self.performance;
        Snapshot {
            mode: perf.mode(),
            sub_mode: perf.sub_mode(),
            focus: perf.focus(),
            scale: *perf.harmony().scale(),
            chord: perf.harmony().chord().clone(),
            buttons: self.button_states(),
            sounding: core::array::from_fn(|control| self.voices.is_sounding(control)),
            velocities: *perf.velocities(),
            chord_velocity: perf.chord_velocity(),
            assign_slots: *perf.assign_slots(),
            full_redraw: self.full_redraw,
        }
    }

    /// A snapshot if anything shown changed since the last call, clearing
    /// the change flags.
    pub fn take_display_changes(&mut self) -> Option<Snapshot> {
        if !self.changed_display {
            return None;
        }
        let snapshot = self.snapshot();
        self.changed_display = false;
        self.full_redraw = false;
        Some(snapshot)
    }

    // ── Tick ─────────────────────────────────────────────────────────

    /// Run one tick over a reading taken at `now_ms`.
    pub fn tick<S: NoteSink>(&mut self, now_ms: u64, reading: &SurfaceReading, sink: &mut S) -> TickSummary {
        let mut summary = TickSummary::default();

        if let Some(pressed) = reading.panic {
            if pressed && !self.panic_pressed {
                self.panic(sink);
                summary.panicked = true;
            }
            self.panic_pressed = pressed;
        }

        if let Some(on) = reading.switch {
            self.apply_mode(OperatingMode::from_switch(on));
        }

        let mut outcome = RouteOutcome::default();
        for (control, burst) in reading.positions.iter().enumerate() {
            let encoder = &mut self.encoders[control];
            for sample in burst {
                if let Some(step) = encoder.read(sample.raw, sample.at_ms, &self.config) {
                    outcome = outcome.merge(self.performance.route(control, step, &self.config));
                    summary.steps = summary.steps.saturating_add(1);
                }
            }
            summary.counter_resets[control] = encoder.counter_reset_pending();
        }
        if outcome.revoice {
            let perf = &self.performance;
            let config = &self.config;
            self.voices.revoice(sink, |source| perf.resolve(source, config));
        }
        self.changed_display |= outcome.redraw;

        for control in 0..ENCODER_COUNT {
            let Some(pressed) = reading.buttons[control] else {
                continue;
            };
            let action = self.row[control];
            let before = self.buttons[control].state();
            let event = self.buttons[control].update(pressed, now_ms, self.config.hold_ms, action.allows_latch());
            if let Some(event) = event {
                summary.transitions = summary.transitions.saturating_add(1);
                summary.panicked |= self.dispatch(control, action, event, sink);
            }
            if before == ButtonState::PressedWaitingHold && self.buttons[control].state() == ButtonState::Released {
                // A press that ends without latching owns nothing afterwards,
                // whatever row its release lands on.
                self.voices.release(control, &mut *sink);
            }
        }

        self.performance.set_chord_sounding(self.voices.any_chord_sounding());
        summary
    }

    /// Sample `surface`, then tick.
    ///
    /// Bus recovery abandons the tick and rebases every encoder on the
    /// zeroed hardware counters. A failed recovery silences everything
    /// before returning the fault; the caller must restart the device.
    pub async fn poll<C, D, S>(
        &mut self,
        surface: &mut C,
        delay: &mut D,
        now_ms: u64,
        sink: &mut S,
    ) -> Result<TickSummary, BusFault>
    where
        C: ControlSurface,
        D: DelayNs,
        S: NoteSink,
    {
        let encoders = &mut self.encoders;
        let config = &self.config;
        let sampled = self
            .sampler
            .sample(surface, delay, now_ms, |control, raw| {
                encoders[control].check_plausible(raw, config)
            })
            .await;

        let reading = match sampled {
            Ok(reading) => reading,
            Err(SampleError::BusRecovered) => {
                for encoder in &mut self.encoders {
                    encoder.rebase(0);
                }
                return Ok(TickSummary::default());
            }
            Err(SampleError::BusFault(fault)) => {
                #[cfg(feature = "defmt")]
                defmt::error!("unrecoverable bus fault; silencing all notes");
                self.panic(sink);
                return Err(fault);
            }
        };

        let summary = self.tick(now_ms, &reading, sink);
        for control in 0..ENCODER_COUNT {
            if !summary.counter_resets[control] {
                continue;
            }
            if surface.reset_position(control).await.is_err() {
                #[cfg(feature = "defmt")]
                defmt::debug!("counter reset of encoder {} failed; retrying next tick", control);
            }
        }
        Ok(summary)
    }

    /// Force every control back to `Released` and silence everything.
    ///
    /// Safe at any point: it bypasses edge detection, so a button still
    /// held down has to be released before it can start a new press.
    pub fn panic<S: NoteSink>(&mut self, sink: &mut S) -> PanicReport {
        let mut report = PanicReport::default();
        for button in &mut self.buttons {
            match button.force_release() {
                ButtonState::Latched => report.unlatched += 1,
                ButtonState::PressedWaitingHold => report.released += 1,
                ButtonState::Released => {}
            }
        }
        report.voices = self.voices.release_all(sink) as u8;

        let channel = self.config.midi_channel;
        sink.control_change(CC_ALL_SOUND_OFF, 0, channel);
        sink.control_change(CC_ALL_NOTES_OFF, 0, channel);
        sink.control_change(CC_SUSTAIN, 0, channel);

        self.performance.set_chord_sounding(false);
        self.changed_display = true;
        #[cfg(feature = "defmt")]
        defmt::info!("panic: {}", report);
        report
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn apply_mode(&mut self, mode: OperatingMode) {
        if mode == self.performance.mode() {
            return;
        }
        self.performance.set_mode(mode);
        self.swap_row();
        #[cfg(feature = "defmt")]
        defmt::info!("mode: {}", mode.name());
    }

    fn swap_row(&mut self) {
        self.row = ActionTable::row(self.performance.mode(), self.performance.sub_mode());
        self.full_redraw = true;
        self.changed_display = true;
    }

    /// Returns `true` if the action triggered a panic.
    fn dispatch<S: NoteSink>(&mut self, control: usize, action: Action, event: ButtonEvent, sink: &mut S) -> bool {
        let mut requests = Requests::default();
        let mut ctx = ActionContext {
            perf: &mut self.performance,
            voices: &mut self.voices,
            sink: &mut *sink,
            requests: &mut requests,
            config: &self.config,
            control,
        };
        match event {
            ButtonEvent::PressStart => action.on_press_start(&mut ctx),
            ButtonEvent::ReleaseShort => action.on_release_short(&mut ctx),
            ButtonEvent::Hold => {
                action.on_hold(&mut ctx);
                #[cfg(feature = "defmt")]
                if self.buttons[control].is_latched() {
                    defmt::info!("control {} latched", control);
                }
            }
            ButtonEvent::PressWhileLatched => {
                action.on_press_while_latched(&mut ctx);
                self.voices.release(control, &mut *sink);
                #[cfg(feature = "defmt")]
                defmt::info!("control {} unlatched", control);
            }
        }
        self.changed_display = true;

        if requests.toggle_sub_mode {
            self.performance.toggle_sub_mode();
            self.swap_row();
            #[cfg(feature = "defmt")]
            defmt::info!("chord sub-mode: {}", self.performance.sub_mode());
        }
        if requests.panic {
            self.panic(sink);
        }
        requests.panic
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::{ChordSubMode, ParamFocus};
    use crate::output::NullSink;
    use crate::testing::{MidiEvent, NoDelay, RecordingSink, ScriptedSurface};
    use crate::FOCUS_ENCODER;
    use embassy_futures::block_on;

    const TICK: u64 = 20;

    /// Drives a controller with hand-built readings, one tick per call.
    struct Rig {
        controller: Controller,
        sink: RecordingSink,
        now: u64,
        positions: [i32; ENCODER_COUNT],
        pressed: [bool; ENCODER_COUNT],
        switch_on: bool,
        panic_pressed: bool,
    }

    impl Rig {
        fn new() -> Self {
            Self::with_config(EngineConfig {
                bass_note: false,
                ..EngineConfig::default()
            })
        }

        fn with_config(config: EngineConfig) -> Self {
            Self {
                controller: Controller::new(config),
                sink: RecordingSink::default(),
                now: 0,
                positions: [0; ENCODER_COUNT],
                pressed: [false; ENCODER_COUNT],
                switch_on: false,
                panic_pressed: false,
            }
        }

        fn tick(&mut self) -> TickSummary {
            let spacing = self.controller.config().burst_spacing_ms();
            let mut reading = SurfaceReading::default();
            for control in 0..ENCODER_COUNT {
                for round in 0..crate::DEBOUNCE_DEPTH as u64 {
                    reading.push_sample(control, self.positions[control], self.now + round * spacing);
                }
                reading.buttons[control] = Some(self.pressed[control]);
            }
            reading.switch = Some(self.switch_on);
            reading.panic = Some(self.panic_pressed);
            let summary = self.controller.tick(self.now, &reading, &mut self.sink);
            self.now += TICK;
            summary
        }

        fn ticks(&mut self, count: usize) {
            for _ in 0..count {
                self.tick();
            }
        }

        fn tap(&mut self, control: usize) {
            self.pressed[control] = true;
            self.tick();
            self.pressed[control] = false;
            self.tick();
        }

        /// Press long enough to fire a hold, then let go.
        fn hold(&mut self, control: usize) {
            self.pressed[control] = true;
            let ticks = (self.controller.config().hold_ms / TICK) as usize + 1;
            self.ticks(ticks);
            self.pressed[control] = false;
            self.tick();
        }

        /// Turn `control` by whole detents, one raw transition per tick.
        fn turn(&mut self, control: usize, detents: i32) {
            let raw_steps = detents.abs() * self.controller.config().steps_per_detent;
            for _ in 0..raw_steps {
                self.positions[control] += detents.signum();
                self.tick();
            }
        }

        fn state(&self, control: usize) -> ButtonState {
            self.controller.button_states()[control]
        }
    }

    #[test]
    fn tap_plays_and_stops_a_scale_degree() {
        let mut rig = Rig::new();
        rig.tap(4);
        // G4 in C major.
        assert_eq!(rig.sink.events, vec![MidiEvent::NoteOn(67, 100), MidiEvent::NoteOff(67)]);
    }

    #[test]
    fn hold_latches_and_next_press_unlatches_with_one_stop() {
        let mut rig = Rig::new();
        rig.hold(0);
        assert_eq!(rig.state(0), ButtonState::Latched);
        assert_eq!(rig.sink.sounding(), vec![60]);

        // Long stay in the latch, including repeated long presses elsewhere.
        rig.ticks(500);
        rig.hold(3);
        assert_eq!(rig.state(0), ButtonState::Latched);

        rig.sink.events.clear();
        rig.tap(0);
        assert_eq!(rig.state(0), ButtonState::Released);
        assert_eq!(rig.sink.events, vec![MidiEvent::NoteOff(60)]);
    }

    #[test]
    fn rotation_routes_velocity_in_scale_mode() {
        let mut rig = Rig::new();
        let before = rig.controller.performance().velocities()[1];
        rig.turn(1, 3);
        assert_eq!(rig.controller.performance().velocities()[1], before + 12);
    }

    #[test]
    fn focus_encoder_wraps_root() {
        let mut rig = Rig::new();
        rig.turn(FOCUS_ENCODER, -1);
        assert_eq!(rig.controller.performance().harmony().scale().root(), 11);
        rig.turn(FOCUS_ENCODER, 1);
        assert_eq!(rig.controller.performance().harmony().scale().root(), 0);
    }

    #[test]
    fn latched_chord_is_revoiced_without_stuck_notes() {
        let mut rig = Rig::new();
        rig.switch_on = true;
        rig.tick();
        rig.hold(0);
        assert_eq!(rig.sink.sounding(), vec![60, 64, 67]);

        // Root up a tone, scale change, octave up, degree and selection.
        rig.turn(FOCUS_ENCODER, 2);
        rig.tap(FOCUS_ENCODER);
        rig.turn(FOCUS_ENCODER, 1);
        rig.tap(FOCUS_ENCODER);
        rig.turn(FOCUS_ENCODER, 1);
        rig.turn(0, 4);
        rig.turn(1, 1);

        // Only one chord ever sounds: every revoice stops the old set first.
        assert_eq!(rig.sink.sounding().len(), rig.controller.voices().notes(0).len());
        assert!(rig.controller.performance().harmony().chord().is_sounding());

        rig.tap(0);
        assert!(rig.sink.sounding().is_empty());
        assert!(rig.sink.balanced());
        assert!(!rig.controller.performance().harmony().chord().is_sounding());
    }

    #[test]
    fn octave_change_releases_the_previous_octave() {
        let mut rig = Rig::new();
        rig.hold(0);
        rig.tap(FOCUS_ENCODER);
        rig.tap(FOCUS_ENCODER);
        assert_eq!(rig.controller.performance().focus(), ParamFocus::Octave);

        rig.sink.events.clear();
        rig.turn(FOCUS_ENCODER, 1);
        assert_eq!(rig.sink.events, vec![MidiEvent::NoteOff(60), MidiEvent::NoteOn(72, 100)]);
    }

    #[test]
    fn panic_forces_every_control_released() {
        let mut rig = Rig::new();
        rig.hold(0);
        rig.hold(2);
        rig.pressed[5] = true;
        rig.tick();
        assert_eq!(rig.state(5), ButtonState::PressedWaitingHold);

        let report = rig.controller.panic(&mut rig.sink);
        assert_eq!(
            report,
            PanicReport {
                unlatched: 2,
                released: 1,
                voices: 3
            }
        );
        assert!(rig.controller.button_states().iter().all(|&s| s == ButtonState::Released));
        assert!(rig.sink.sounding().is_empty());
        assert!(rig.sink.events.ends_with(&[
            MidiEvent::Cc(CC_ALL_SOUND_OFF, 0),
            MidiEvent::Cc(CC_ALL_NOTES_OFF, 0),
            MidiEvent::Cc(CC_SUSTAIN, 0),
        ]));

        // Control 5 is still held: no new press until it is released.
        rig.tick();
        assert_eq!(rig.state(5), ButtonState::Released);
        assert!(rig.sink.sounding().is_empty());
    }

    #[test]
    fn panic_input_edge_runs_the_panic_path_once() {
        let mut rig = Rig::new();
        rig.hold(1);
        rig.panic_pressed = true;
        assert!(rig.tick().panicked);
        assert!(!rig.tick().panicked);
        assert_eq!(rig.state(1), ButtonState::Released);
        assert!(rig.sink.sounding().is_empty());
    }

    #[test]
    fn chord_mode_panic_button() {
        let mut rig = Rig::new();
        rig.switch_on = true;
        rig.tick();
        rig.hold(0);
        rig.pressed[6] = true;
        assert!(rig.tick().panicked);
        assert_eq!(rig.state(0), ButtonState::Released);
        assert!(rig.sink.sounding().is_empty());
    }

    #[test]
    fn stale_latch_after_mode_switch_is_silenced_by_next_press() {
        let mut rig = Rig::new();
        rig.hold(3);
        assert_eq!(rig.sink.sounding(), vec![65]);

        // Chord mode binds control 3 to NoOp.
        rig.switch_on = true;
        rig.tick();
        assert!(matches!(rig.controller.row()[3], Action::NoOp(_)));
        assert_eq!(rig.state(3), ButtonState::Latched);

        rig.tap(3);
        assert_eq!(rig.state(3), ButtonState::Released);
        assert!(rig.sink.sounding().is_empty());
    }

    #[test]
    fn note_pressed_across_a_mode_switch_stops_on_release() {
        let mut rig = Rig::new();
        rig.pressed[3] = true;
        rig.tick();
        assert_eq!(rig.sink.sounding(), vec![65]);

        rig.switch_on = true;
        rig.tick();
        assert!(matches!(rig.controller.row()[3], Action::NoOp(_)));

        rig.pressed[3] = false;
        rig.tick();
        rig.ticks(10);
        assert_eq!(rig.state(3), ButtonState::Released);
        assert!(!rig.controller.voices().is_sounding(3));
        assert!(rig.sink.sounding().is_empty());
        assert!(rig.sink.balanced());
    }

    #[test]
    fn note_held_past_hold_time_under_a_non_latching_row_stops_on_release() {
        let mut rig = Rig::new();
        rig.pressed[3] = true;
        rig.tick();
        rig.switch_on = true;
        rig.tick();

        // NoOp does not latch: the hold is processed but the press stays open.
        let ticks = (rig.controller.config().hold_ms / TICK) as usize + 10;
        rig.ticks(ticks);
        assert_eq!(rig.state(3), ButtonState::PressedWaitingHold);
        assert_eq!(rig.sink.sounding(), vec![65]);

        rig.pressed[3] = false;
        rig.tick();
        assert_eq!(rig.state(3), ButtonState::Released);
        assert!(rig.sink.sounding().is_empty());

        // Later presses on the NoOp control start nothing.
        rig.tap(3);
        assert!(rig.sink.sounding().is_empty());
        assert!(rig.sink.balanced());
    }

    #[test]
    fn mode_cycle_hold_toggles_assign_and_back() {
        let mut rig = Rig::new();
        rig.switch_on = true;
        rig.tick();

        rig.hold(7);
        assert_eq!(rig.controller.performance().sub_mode(), ChordSubMode::Assign);
        // The hold did not count as a short press.
        assert_eq!(rig.controller.performance().focus(), ParamFocus::Root);
        assert!(matches!(rig.controller.row()[0], Action::AssignTrigger(_)));

        rig.hold(7);
        assert_eq!(rig.controller.performance().sub_mode(), ChordSubMode::Normal);
    }

    #[test]
    fn assign_slots_on_one_degree_share_their_notes() {
        let mut rig = Rig::new();
        rig.switch_on = true;
        rig.tick();
        rig.hold(7);
        // Slot 1 → degree I, same as slot 0.
        rig.turn(1, -1);
        assert_eq!(rig.controller.performance().assign_slots()[1], 0);

        rig.hold(0);
        rig.hold(1);
        assert_eq!(
            rig.sink.events,
            vec![MidiEvent::NoteOn(60, 100), MidiEvent::NoteOn(64, 100), MidiEvent::NoteOn(67, 100)]
        );

        // Unlatching slot 1 leaves slot 0's chord sounding.
        rig.tap(1);
        assert_eq!(rig.sink.note_offs(), 0);
        assert_eq!(rig.controller.voices().notes(0), &[60, 64, 67]);
        assert_eq!(rig.state(0), ButtonState::Latched);

        rig.tap(0);
        assert!(rig.sink.sounding().is_empty());
        assert!(rig.sink.balanced());
    }

    #[test]
    fn assign_slot_rotation_revoices_a_latched_slot() {
        let mut rig = Rig::new();
        rig.switch_on = true;
        rig.tick();
        rig.hold(7);
        rig.hold(2);
        // Slot 2 → degree III: E minor.
        assert_eq!(rig.sink.sounding(), vec![64, 67, 71]);

        rig.turn(2, 1);
        // Degree IV: F major.
        assert_eq!(rig.sink.sounding(), vec![65, 69, 72]);
        assert!(!rig.sink.balanced());
        rig.tap(2);
        assert!(rig.sink.balanced());
    }

    #[test]
    fn mode_switch_requests_full_redraw() {
        let mut rig = Rig::new();
        assert!(rig.controller.take_display_changes().is_some_and(|s| s.full_redraw));
        rig.tick();
        assert_eq!(rig.controller.take_display_changes(), None);

        rig.switch_on = true;
        rig.tick();
        let snapshot = rig.controller.take_display_changes().unwrap();
        assert!(snapshot.full_redraw);
        assert_eq!(snapshot.mode, OperatingMode::Chord);

        rig.turn(2, 1);
        let snapshot = rig.controller.take_display_changes().unwrap();
        assert!(!snapshot.full_redraw);
        assert_eq!(snapshot.chord_velocity, 104);
    }

    #[test]
    fn counter_wrap_requests_a_reset_and_the_zeroed_read_is_no_step() {
        let config = EngineConfig {
            position_limit: 4,
            ..EngineConfig::default()
        };
        let mut rig = Rig::with_config(config);
        rig.turn(0, 1);
        rig.positions[0] += 1;
        rig.tick();
        rig.positions[0] += 1;
        let summary = rig.tick();
        assert!(summary.counter_resets[0]);
        assert_eq!(rig.controller.performance().velocities()[0], 108);

        // Hardware applied the reset: reading 0 is not a step.
        rig.positions[0] = 0;
        let summary = rig.tick();
        assert_eq!(summary.steps, 0);
        assert!(!summary.counter_resets[0]);
    }

    #[test]
    fn poll_reads_the_surface_and_resets_wrapped_counters() {
        let config = EngineConfig {
            position_limit: 2,
            ..EngineConfig::default()
        };
        let mut controller = Controller::new(config);
        let mut surface = ScriptedSurface::default();
        let mut sink = RecordingSink::default();
        let mut delay = NoDelay::default();

        surface.positions[3] = 1;
        block_on(controller.poll(&mut surface, &mut delay, 0, &mut sink)).unwrap();
        surface.positions[3] = 2;
        let summary = block_on(controller.poll(&mut surface, &mut delay, 20, &mut sink)).unwrap();

        assert_eq!(summary.steps, 1);
        assert_eq!(surface.position_resets, vec![3]);
        assert_eq!(surface.positions[3], 0);
        assert_eq!(controller.performance().velocities()[3], 104);
    }

    #[test]
    fn poll_rebases_after_bus_recovery() {
        let mut controller = Controller::new(EngineConfig::default());
        let mut surface = ScriptedSurface::default();
        let mut delay = NoDelay::default();

        surface.positions[0] = 9;
        block_on(controller.poll(&mut surface, &mut delay, 0, &mut NullSink)).unwrap();

        surface.fail_next = u32::MAX;
        let summary = block_on(controller.poll(&mut surface, &mut delay, 20, &mut NullSink)).unwrap();
        assert_eq!(summary, TickSummary::default());
        assert_eq!(surface.bus_resets, 1);
        assert_eq!(controller.encoder(0).map(|e| e.last_stable()), Some(0));
    }

    #[test]
    fn poll_silences_everything_on_bus_fault() {
        let mut controller = Controller::new(EngineConfig::default());
        let mut surface = ScriptedSurface::default();
        let mut sink = RecordingSink::default();
        let mut delay = NoDelay::default();

        surface.pressed[2] = true;
        block_on(controller.poll(&mut surface, &mut delay, 0, &mut sink)).unwrap();
        assert!(controller.voices().is_sounding(2));

        surface.fail_next = u32::MAX;
        surface.recovery_fails = true;
        let result = block_on(controller.poll(&mut surface, &mut delay, 20, &mut sink));
        assert_eq!(result, Err(BusFault));
        assert!(sink.sounding().is_empty());
        assert!(sink.events.contains(&MidiEvent::Cc(CC_ALL_NOTES_OFF, 0)));
    }
}
