//! Operating mode, chord sub-mode and parameter focus.

/// Top-level mode, driven by the toggle switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OperatingMode {
    /// Switch off: encoder buttons play scale degrees.
    #[default]
    Scale,
    /// Switch on: encoder buttons trigger chords.
    Chord,
}

impl OperatingMode {
    /// Mode selected by the toggle switch level (`true` = switch on).
    pub fn from_switch(on: bool) -> Self {
        if on {
            OperatingMode::Chord
        } else {
            OperatingMode::Scale
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            OperatingMode::Scale => "Scale",
            OperatingMode::Chord => "Chord",
        }
    }
}

/// Sub-mode of [`OperatingMode::Chord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChordSubMode {
    /// One chord trigger, chord degree and type edited by rotation.
    #[default]
    Normal,
    /// Seven chord pads, each bound to its own scale degree.
    Assign,
}

impl ChordSubMode {
    pub fn toggled(self) -> Self {
        match self {
            ChordSubMode::Normal => ChordSubMode::Assign,
            ChordSubMode::Assign => ChordSubMode::Normal,
        }
    }
}

/// Parameter edited by the focus encoder, cycled by a ModeCycle short press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParamFocus {
    #[default]
    Root,
    Scale,
    Octave,
}

impl ParamFocus {
    /// Next focus in the cycle Root → Scale → Octave → Root.
    pub fn next(self) -> Self {
        match self {
            ParamFocus::Root => ParamFocus::Scale,
            ParamFocus::Scale => ParamFocus::Octave,
            ParamFocus::Octave => ParamFocus::Root,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ParamFocus::Root => "Root",
            ParamFocus::Scale => "Scale",
            ParamFocus::Octave => "Octave",
        }
    }
}
