//! Read-only view of the engine for the display.

use crate::button::ButtonState;
use crate::mode::{ChordSubMode, OperatingMode, ParamFocus};
use crate::theory::{ChordState, ScaleState, DEGREE_NAMES};
use crate::{DEGREE_COUNT, ENCODER_COUNT};

/// Everything the display shows, copied out of the controller.
///
/// `full_redraw` is set when the mode or sub-mode changed since the last
/// snapshot handed out by
/// [`Controller::take_display_changes`](crate::Controller::take_display_changes):
/// the whole screen layout differs, not just some values.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Snapshot {
    pub mode: OperatingMode,
    pub sub_mode: ChordSubMode,
    pub focus: ParamFocus,
    pub scale: ScaleState,
    pub chord: ChordState,
    pub buttons: [ButtonState; ENCODER_COUNT],
    pub sounding: [bool; ENCODER_COUNT],
    pub velocities: [u8; DEGREE_COUNT],
    pub chord_velocity: u8,
    pub assign_slots: [u8; DEGREE_COUNT],
    pub full_redraw: bool,
}

impl Snapshot {
    /// Controls currently latched.
    pub fn latched(&self) -> impl Iterator<Item = usize> + '_ {
        self.buttons
            .iter()
            .enumerate()
            .filter(|(_, state)| **state == ButtonState::Latched)
            .map(|(control, _)| control)
    }

    /// Roman numeral and type name of the selected chord, e.g. `("V", "7")`.
    pub fn chord_label(&self) -> (&'static str, &'static str) {
        (
            DEGREE_NAMES[self.chord.degree() as usize % DEGREE_COUNT],
            self.chord.chord_type().short_name(),
        )
    }
}
