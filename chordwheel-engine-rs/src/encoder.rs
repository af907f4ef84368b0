//! Encoder signal conditioning.
//!
//! Turns the raw absolute counter of one encoder into musical steps:
//!
//! 1. **Debounce** — the last [`DEBOUNCE_DEPTH`] samples must agree and
//!    span more than the debounce window before a value is accepted.
//! 2. **Step extraction** — an accepted change yields a unit step (±1),
//!    whatever its magnitude, rejecting multi-step noise jumps.
//! 3. **Detent accumulation** — unit steps accumulate; once the magnitude
//!    reaches `steps_per_detent` (two raw transitions per physical click) a
//!    [`StepEvent`] is emitted and the accumulator resets.
//! 4. **Range wrap** — when the counter reaches ±`position_limit` the
//!    hardware counter is reset to 0. The jump back to 0 is not a step; a
//!    reading still near the old value means the reset was missed and
//!    counting continues from it.

use crate::config::EngineConfig;
use crate::DEBOUNCE_DEPTH;

/// One musical step of an encoder, `delta` is ±1 per detent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StepEvent {
    pub delta: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum CounterReset {
    Idle,
    /// A hardware reset was requested when the counter read `from`.
    Pending { from: i32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
struct Sample {
    raw: i32,
    at_ms: u64,
}

/// Conditioning state of one encoder.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EncoderChannel {
    last_stable: i32,
    ring: [Option<Sample>; DEBOUNCE_DEPTH],
    head: usize,
    accumulator: i32,
    reset: CounterReset,
    suspect_zero_reads: u8,
    resync: bool,
}

impl Default for EncoderChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl EncoderChannel {
    pub const fn new() -> Self {
        Self {
            last_stable: 0,
            ring: [None; DEBOUNCE_DEPTH],
            head: 0,
            accumulator: 0,
            reset: CounterReset::Idle,
            suspect_zero_reads: 0,
            resync: false,
        }
    }

    /// Last accepted (debounced) counter value.
    pub fn last_stable(&self) -> i32 {
        self.last_stable
    }

    /// Unit steps accumulated towards the next detent.
    pub fn accumulator(&self) -> i32 {
        self.accumulator
    }

    /// The hardware counter should be reset to 0 (range wrap). Stays set
    /// until a reading shows the reset took effect.
    pub fn counter_reset_pending(&self) -> bool {
        matches!(self.reset, CounterReset::Pending { .. })
    }

    /// Feed one raw counter sample taken at `at_ms`.
    ///
    /// Returns a [`StepEvent`] when the sample completes a detent.
    ///
    /// # Examples
    ///
    /// ```
    /// use chordwheel::{EncoderChannel, EngineConfig};
    ///
    /// let config = EngineConfig::default();
    /// let mut enc = EncoderChannel::new();
    ///
    /// // One raw transition: stable after three agreeing samples, no detent yet.
    /// let mut t = 0;
    /// for _ in 0..3 {
    ///     assert_eq!(enc.read(1, t, &config), None);
    ///     t += 3;
    /// }
    /// // Second transition completes the detent.
    /// let mut events = 0;
    /// for _ in 0..3 {
    ///     events += enc.read(2, t, &config).map_or(0, |e| e.delta);
    ///     t += 3;
    /// }
    /// assert_eq!(events, 1);
    /// assert_eq!(enc.accumulator(), 0);
    /// ```
    pub fn read(&mut self, raw: i32, at_ms: u64, config: &EngineConfig) -> Option<StepEvent> {
        if let CounterReset::Pending { from } = self.reset {
            if raw == from {
                // Hardware reset not applied yet.
                return None;
            }
            self.reset = CounterReset::Idle;
            self.clear_ring();
            if reset_missed(raw, from) {
                // Counter kept its value and moved on from there.
                self.last_stable = from;
                #[cfg(feature = "defmt")]
                defmt::debug!("counter reset not applied at {}; counting on", raw);
            }
        }

        self.push(Sample { raw, at_ms });
        let stable = self.stable_value(config.debounce_window_ms)?;

        if self.resync {
            self.resync = false;
            self.last_stable = stable;
            self.accumulator = 0;
            return None;
        }

        if stable == self.last_stable {
            return None;
        }

        let step = (stable - self.last_stable).signum();
        self.last_stable = stable;

        if stable.abs() >= config.position_limit {
            self.reset = CounterReset::Pending { from: stable };
            self.last_stable = 0;
            self.clear_ring();
            #[cfg(feature = "defmt")]
            defmt::debug!("encoder counter at {}; reset requested", stable);
        }

        self.accumulator += step;
        if self.accumulator.abs() >= config.steps_per_detent {
            let delta = self.accumulator / config.steps_per_detent;
            self.accumulator = 0;
            return Some(StepEvent { delta });
        }
        None
    }

    /// Decide whether a raw reading is believable before it is fed.
    ///
    /// A zero while the last accepted value is more than two detents away
    /// (and no counter reset is pending) is treated as a bus glitch. After
    /// `zero_glitch_tolerance` consecutive suspicious zeros the zero is
    /// accepted as a genuine counter resync: it becomes the new baseline
    /// without producing a step.
    pub fn check_plausible(&mut self, raw: i32, config: &EngineConfig) -> bool {
        let suspicious = raw == 0
            && !self.resync
            && !self.counter_reset_pending()
            && self.last_stable.abs() > config.zero_glitch_margin();

        if !suspicious {
            self.suspect_zero_reads = 0;
            return true;
        }

        self.suspect_zero_reads = self.suspect_zero_reads.saturating_add(1);
        if self.suspect_zero_reads > config.zero_glitch_tolerance {
            #[cfg(feature = "defmt")]
            defmt::warn!("encoder reads 0 persistently; resyncing from {}", self.last_stable);
            self.suspect_zero_reads = 0;
            self.resync = true;
            return true;
        }
        false
    }

    /// Forget all history and take `raw` as the baseline (after bus recovery
    /// re-initialised the hardware counters).
    pub fn rebase(&mut self, raw: i32) {
        *self = Self::new();
        self.last_stable = raw;
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn push(&mut self, sample: Sample) {
        self.ring[self.head] = Some(sample);
        self.head = (self.head + 1) % DEBOUNCE_DEPTH;
    }

    fn clear_ring(&mut self) {
        self.ring = [None; DEBOUNCE_DEPTH];
        self.head = 0;
    }

    /// The agreed value, if the ring is full, every sample agrees, and the
    /// samples span more than the window.
    fn stable_value(&self, window_ms: u64) -> Option<i32> {
        let newest = self.ring[(self.head + DEBOUNCE_DEPTH - 1) % DEBOUNCE_DEPTH]?;
        let oldest = self.ring[self.head]?;
        let agree = self
            .ring
            .iter()
            .all(|sample| matches!(sample, Some(s) if s.raw == newest.raw));
        (agree && newest.at_ms.saturating_sub(oldest.at_ms) > window_ms).then_some(newest.raw)
    }
}

/// A reading on the same side as `from` and closer to it than to 0 cannot
/// come from a counter that was just reset.
fn reset_missed(raw: i32, from: i32) -> bool {
    raw.signum() == from.signum() && raw.abs() > from.abs() / 2
}
