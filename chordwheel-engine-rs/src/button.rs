//! Per-control button state machine.
//!
//! ```text
//!              press                      held ≥ hold_ms, latch allowed
//! Released ───────────► PressedWaitingHold ─────────────────────────► Latched
//!    ▲                        │                                          │
//!    │   release (short)      │                                          │
//!    └────────────────────────┘                                          │
//!    ▲                                                                   │
//!    └─────────────────────────── press (unlatch) ───────────────────────┘
//! ```
//!
//! Transitions are edge-triggered on the per-tick press level. A hold marks
//! the press as processed so the matching release never becomes a short
//! press; the flag persists until the next press starts. A latched control
//! ignores further holds and leaves `Latched` only through a press or a
//! forced release (panic).

/// State of one control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonState {
    #[default]
    Released,
    PressedWaitingHold,
    Latched,
}

/// Transition reported to the active action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonEvent {
    PressStart,
    ReleaseShort,
    Hold,
    PressWhileLatched,
}

/// Button state of one control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ButtonChannel {
    state: ButtonState,
    press_started_ms: u64,
    hold_processed: bool,
    pressed: bool,
}

impl ButtonChannel {
    pub const fn new() -> Self {
        Self {
            state: ButtonState::Released,
            press_started_ms: 0,
            hold_processed: false,
            pressed: false,
        }
    }

    pub fn state(&self) -> ButtonState {
        self.state
    }

    pub fn is_latched(&self) -> bool {
        self.state == ButtonState::Latched
    }

    /// Latched and waiting for the press that unlatches it.
    pub fn waiting_for_next_press(&self) -> bool {
        self.is_latched()
    }

    pub fn hold_processed(&self) -> bool {
        self.hold_processed
    }

    pub fn press_started_ms(&self) -> u64 {
        self.press_started_ms
    }

    /// Advance with this tick's press level.
    ///
    /// `allows_latch` comes from the control's current action: only a
    /// latching action moves to [`ButtonState::Latched`] on hold; the others
    /// get [`ButtonEvent::Hold`] for its side effects and stay pressed.
    ///
    /// # Examples
    ///
    /// ```
    /// use chordwheel::{ButtonChannel, ButtonEvent, ButtonState};
    ///
    /// let mut button = ButtonChannel::new();
    /// assert_eq!(button.update(true, 0, 1000, true), Some(ButtonEvent::PressStart));
    /// assert_eq!(button.update(true, 1000, 1000, true), Some(ButtonEvent::Hold));
    /// assert_eq!(button.state(), ButtonState::Latched);
    /// assert_eq!(button.update(false, 1020, 1000, true), None);
    /// assert_eq!(button.update(true, 3000, 1000, true), Some(ButtonEvent::PressWhileLatched));
    /// assert_eq!(button.state(), ButtonState::Released);
    /// ```
    pub fn update(
        &mut self,
        pressed: bool,
        now_ms: u64,
        hold_ms: u64,
        allows_latch: bool,
    ) -> Option<ButtonEvent> {
        let press_edge = pressed && !self.pressed;
        self.pressed = pressed;

        match self.state {
            ButtonState::Released => {
                if press_edge {
                    self.state = ButtonState::PressedWaitingHold;
                    self.press_started_ms = now_ms;
                    self.hold_processed = false;
                    Some(ButtonEvent::PressStart)
                } else {
                    None
                }
            }
            ButtonState::PressedWaitingHold => {
                if !pressed {
                    self.state = ButtonState::Released;
                    return (!self.hold_processed).then_some(ButtonEvent::ReleaseShort);
                }
                let held_ms = now_ms.saturating_sub(self.press_started_ms);
                if self.hold_processed || held_ms < hold_ms {
                    return None;
                }
                self.hold_processed = true;
                if allows_latch {
                    self.state = ButtonState::Latched;
                }
                Some(ButtonEvent::Hold)
            }
            ButtonState::Latched => {
                if press_edge {
                    self.state = ButtonState::Released;
                    Some(ButtonEvent::PressWhileLatched)
                } else {
                    None
                }
            }
        }
    }

    /// Force the channel to `Released` without waiting for an edge.
    ///
    /// Returns the state it was in. The press level is kept, so a button
    /// still held down does not start a new press until it is released and
    /// pressed again.
    pub fn force_release(&mut self) -> ButtonState {
        let previous = self.state;
        self.state = ButtonState::Released;
        previous
    }
}
