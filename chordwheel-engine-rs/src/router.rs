//! Parameter router.
//!
//! Routes encoder steps to the parameter each encoder controls in the
//! current mode:
//!
//! ```text
//!                      enc 0       enc 1        enc 2       enc 3–6     enc 7
//! Scale              velocity 0  velocity 1   velocity 2  velocity n  focus
//! Chord / Normal     degree      selection    chord vel   —           focus
//! Chord / Assign     slot 0      slot 1       slot 2      slot n      focus
//! ```
//!
//! "focus" is the parameter chosen by [`ParamFocus`]: root, scale or octave.

use crate::config::EngineConfig;
use crate::encoder::StepEvent;
use crate::mode::{ChordSubMode, OperatingMode, ParamFocus};
use crate::theory::{wrap, Harmony};
use crate::voices::{NoteSet, VoiceSource};
use crate::{DEGREE_COUNT, FOCUS_ENCODER};

/// Chord/Normal encoder that selects the chord degree.
pub const CHORD_DEGREE_ENCODER: usize = 0;

/// Chord/Normal encoder that cycles the chord selection.
pub const CHORD_SELECTION_ENCODER: usize = 1;

/// Chord/Normal encoder that sets the chord velocity.
pub const CHORD_VELOCITY_ENCODER: usize = 2;

/// What a routed step changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RouteOutcome {
    /// Pitches may have changed; sounding voices must be revoiced.
    pub revoice: bool,
    /// Something the display shows changed.
    pub redraw: bool,
}

impl RouteOutcome {
    const NONE: Self = Self {
        revoice: false,
        redraw: false,
    };
    const REDRAW: Self = Self {
        revoice: false,
        redraw: true,
    };
    const REVOICE: Self = Self {
        revoice: true,
        redraw: true,
    };

    pub fn merge(self, other: Self) -> Self {
        Self {
            revoice: self.revoice || other.revoice,
            redraw: self.redraw || other.redraw,
        }
    }
}

/// Musical and UI state edited by the controls.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Performance {
    harmony: Harmony,
    mode: OperatingMode,
    sub_mode: ChordSubMode,
    focus: ParamFocus,
    velocities: [u8; DEGREE_COUNT],
    chord_velocity: u8,
    assign: [u8; DEGREE_COUNT],
}

impl Performance {
    /// Scale mode, focus on root, identity assign slots, every velocity at
    /// `config.default_velocity`.
    pub fn new(config: &EngineConfig) -> Self {
        let velocity = config.default_velocity.clamp(1, 127);
        Self {
            harmony: Harmony::new(),
            mode: OperatingMode::Scale,
            sub_mode: ChordSubMode::Normal,
            focus: ParamFocus::Root,
            velocities: [velocity; DEGREE_COUNT],
            chord_velocity: velocity,
            assign: core::array::from_fn(|slot| slot as u8),
        }
    }

    pub fn harmony(&self) -> &Harmony {
        &self.harmony
    }

    pub fn harmony_mut(&mut self) -> &mut Harmony {
        &mut self.harmony
    }

    pub fn mode(&self) -> OperatingMode {
        self.mode
    }

    pub fn sub_mode(&self) -> ChordSubMode {
        self.sub_mode
    }

    pub fn focus(&self) -> ParamFocus {
        self.focus
    }

    pub fn velocities(&self) -> &[u8; DEGREE_COUNT] {
        &self.velocities
    }

    pub fn chord_velocity(&self) -> u8 {
        self.chord_velocity
    }

    /// Scale degree bound to each assign slot.
    pub fn assign_slots(&self) -> &[u8; DEGREE_COUNT] {
        &self.assign
    }

    pub(crate) fn set_mode(&mut self, mode: OperatingMode) {
        self.mode = mode;
    }

    pub(crate) fn toggle_sub_mode(&mut self) {
        self.sub_mode = self.sub_mode.toggled();
    }

    pub(crate) fn cycle_focus(&mut self) {
        self.focus = self.focus.next();
    }

    /// Apply one encoder step from `control`.
    pub fn route(&mut self, control: usize, step: StepEvent, config: &EngineConfig) -> RouteOutcome {
        let delta = step.delta;
        if control == FOCUS_ENCODER {
            return self.step_focused(delta);
        }

        match (self.mode, self.sub_mode) {
            (OperatingMode::Scale, _) if control < DEGREE_COUNT => {
                step_velocity(&mut self.velocities[control], delta, config);
                RouteOutcome::REDRAW
            }
            (OperatingMode::Chord, ChordSubMode::Normal) => match control {
                CHORD_DEGREE_ENCODER => {
                    self.harmony.step_chord_degree(delta);
                    RouteOutcome::REVOICE
                }
                CHORD_SELECTION_ENCODER => {
                    self.harmony.step_chord_selection(delta);
                    RouteOutcome::REVOICE
                }
                CHORD_VELOCITY_ENCODER => {
                    step_velocity(&mut self.chord_velocity, delta, config);
                    RouteOutcome::REDRAW
                }
                _ => RouteOutcome::NONE,
            },
            (OperatingMode::Chord, ChordSubMode::Assign) if control < DEGREE_COUNT => {
                let slot = &mut self.assign[control];
                *slot = wrap(*slot as i32 + delta, 0, DEGREE_COUNT as i32 - 1) as u8;
                RouteOutcome::REVOICE
            }
            _ => RouteOutcome::NONE,
        }
    }

    /// Notes a voice source plays under the current parameters.
    pub fn resolve(&self, source: VoiceSource, config: &EngineConfig) -> NoteSet {
        match source {
            VoiceSource::Degree(degree) => self.harmony.degree_notes(degree as usize),
            VoiceSource::Chord => self.harmony.chord_notes(config.bass_note),
            VoiceSource::Assign(slot) => {
                let degree = self.assign[slot as usize % DEGREE_COUNT];
                self.harmony.chord_notes_on(degree as usize, config.bass_note)
            }
        }
    }

    /// Velocity a voice source starts with.
    pub fn velocity_for(&self, source: VoiceSource) -> u8 {
        match source {
            VoiceSource::Degree(degree) => self.velocities[degree as usize % DEGREE_COUNT],
            VoiceSource::Chord | VoiceSource::Assign(_) => self.chord_velocity,
        }
    }

    pub(crate) fn set_chord_sounding(&mut self, sounding: bool) {
        self.harmony.set_chord_sounding(sounding);
    }

    fn step_focused(&mut self, delta: i32) -> RouteOutcome {
        match self.focus {
            ParamFocus::Root => self.harmony.step_root(delta),
            ParamFocus::Scale => self.harmony.step_scale(delta),
            ParamFocus::Octave => self.harmony.step_octave(delta),
        }
        RouteOutcome::REVOICE
    }
}

/// Velocities clamp to 1–127 (0 would read as a note-off).
fn step_velocity(velocity: &mut u8, delta: i32, config: &EngineConfig) {
    let stepped = *velocity as i32 + delta * config.velocity_step as i32;
    *velocity = stepped.clamp(1, 127) as u8;
}

#[cfg(test)]
mod tests {
    use super::*;

    const UP: StepEvent = StepEvent { delta: 1 };
    const DOWN: StepEvent = StepEvent { delta: -1 };

    #[test]
    fn scale_mode_rotation_adjusts_velocity_and_clamps() {
        let config = EngineConfig::default();
        let mut perf = Performance::new(&config);

        let outcome = perf.route(3, UP, &config);
        assert_eq!(outcome, RouteOutcome::REDRAW);
        assert_eq!(perf.velocities()[3], 104);

        for _ in 0..20 {
            perf.route(3, UP, &config);
        }
        assert_eq!(perf.velocities()[3], 127);
        for _ in 0..60 {
            perf.route(3, DOWN, &config);
        }
        assert_eq!(perf.velocities()[3], 1);
        assert_eq!(perf.velocities()[2], 100);
    }

    #[test]
    fn focus_encoder_edits_root_scale_or_octave() {
        let config = EngineConfig::default();
        let mut perf = Performance::new(&config);

        assert_eq!(perf.route(FOCUS_ENCODER, DOWN, &config), RouteOutcome::REVOICE);
        assert_eq!(perf.harmony().scale().root(), 11);

        perf.cycle_focus();
        perf.route(FOCUS_ENCODER, UP, &config);
        assert_eq!(perf.harmony().scale().scale(), 1);

        perf.cycle_focus();
        perf.route(FOCUS_ENCODER, UP, &config);
        assert_eq!(perf.harmony().scale().octave(), 5);
    }

    #[test]
    fn chord_normal_rotation_edits_chord() {
        let config = EngineConfig::default();
        let mut perf = Performance::new(&config);
        perf.set_mode(OperatingMode::Chord);

        perf.route(CHORD_DEGREE_ENCODER, DOWN, &config);
        assert_eq!(perf.harmony().chord().degree(), 6);

        perf.route(CHORD_SELECTION_ENCODER, UP, &config);
        assert!(perf.harmony().chord().chord_type().is_seventh());

        perf.route(CHORD_VELOCITY_ENCODER, DOWN, &config);
        assert_eq!(perf.chord_velocity(), 96);

        assert_eq!(perf.route(5, UP, &config), RouteOutcome::default());
    }

    #[test]
    fn assign_rotation_rotates_slot_bindings() {
        let config = EngineConfig::default();
        let mut perf = Performance::new(&config);
        perf.set_mode(OperatingMode::Chord);
        perf.toggle_sub_mode();

        assert_eq!(perf.assign_slots(), &[0, 1, 2, 3, 4, 5, 6]);
        perf.route(6, UP, &config);
        perf.route(0, DOWN, &config);
        assert_eq!(perf.assign_slots(), &[6, 1, 2, 3, 4, 5, 0]);
    }

    #[test]
    fn assign_slot_resolves_to_the_diatonic_chord_of_its_degree() {
        let config = EngineConfig {
            bass_note: false,
            ..EngineConfig::default()
        };
        let mut perf = Performance::new(&config);
        perf.set_mode(OperatingMode::Chord);
        perf.toggle_sub_mode();
        perf.route(0, UP, &config); // slot 0 → degree II

        // D minor in C major, octave 4.
        assert_eq!(&perf.resolve(VoiceSource::Assign(0), &config)[..], &[62, 65, 69]);
    }

    #[test]
    fn velocity_follows_the_source() {
        let config = EngineConfig::default();
        let mut perf = Performance::new(&config);
        perf.route(4, UP, &config);
        assert_eq!(perf.velocity_for(VoiceSource::Degree(4)), 104);
        assert_eq!(perf.velocity_for(VoiceSource::Chord), 100);
        assert_eq!(perf.velocity_for(VoiceSource::Assign(2)), 100);
    }
}
