//! Hardware collaborator boundary and per-tick sampling.
//!
//! The engine never talks to a bus itself. The firmware implements
//! [`ControlSurface`] over the encoder unit driver; a [`Sampler`] reads it
//! once per tick with the retry and bus-recovery policy:
//!
//! ```text
//! round 0: enc0 enc1 … enc7   ─┐
//!          (delay spacing)     │  DEBOUNCE_DEPTH interleaved rounds,
//! round 1: enc0 enc1 … enc7    │  each sample timestamped
//!          (delay spacing)     │
//! round 2: enc0 enc1 … enc7   ─┘
//! buttons 0–7, switch, panic input
//! ```
//!
//! # Fault policy
//!
//! - A failed read is retried up to `read_attempts` times. A channel that
//!   still fails is left out of this tick's reading (frozen), the other
//!   channels are unaffected.
//! - An implausible position (see
//!   [`EncoderChannel::check_plausible`](crate::EncoderChannel::check_plausible))
//!   is retried the same way but does not count as a bus fault.
//! - Every failed read counts towards a consecutive-fault counter that any
//!   successful read clears. Past `bus_fault_threshold` the sampler calls
//!   [`ControlSurface::reset_bus`]: success abandons the tick with
//!   [`SampleError::BusRecovered`], failure returns
//!   [`SampleError::BusFault`].

use embedded_hal_async::delay::DelayNs;
use heapless::Vec;

use crate::config::EngineConfig;
use crate::error::{BusFault, TransientIoError};
use crate::{DEBOUNCE_DEPTH, ENCODER_COUNT};

/// Hardware inputs of the controller.
///
/// Levels are electrical: buttons and the panic input are active-low
/// (`false` means pressed), the switch level is `true` when on.
#[allow(async_fn_in_trait)]
pub trait ControlSurface {
    /// Raw absolute counter of encoder `channel`.
    async fn read_position(&mut self, channel: usize) -> Result<i32, TransientIoError>;

    /// Push-button level of encoder `channel` (active-low).
    async fn read_button_level(&mut self, channel: usize) -> Result<bool, TransientIoError>;

    /// Toggle switch level.
    async fn read_switch_level(&mut self) -> Result<bool, TransientIoError>;

    /// Auxiliary panic input (active-low). Surfaces without one report
    /// "not pressed".
    async fn read_panic_level(&mut self) -> Result<bool, TransientIoError> {
        Ok(true)
    }

    /// Reset the hardware counter of encoder `channel` to 0.
    async fn reset_position(&mut self, channel: usize) -> Result<(), TransientIoError>;

    /// Recover the bus. On success every counter is back at 0.
    async fn reset_bus(&mut self) -> Result<(), BusFault>;
}

/// One timestamped raw counter reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PositionSample {
    pub raw: i32,
    pub at_ms: u64,
}

/// Everything read from the surface in one tick.
///
/// Press levels are already inverted: `Some(true)` means pressed. `None`
/// (or an empty burst) marks a channel whose reads failed this tick.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SurfaceReading {
    pub positions: [Vec<PositionSample, DEBOUNCE_DEPTH>; ENCODER_COUNT],
    pub buttons: [Option<bool>; ENCODER_COUNT],
    pub switch: Option<bool>,
    pub panic: Option<bool>,
}

impl SurfaceReading {
    /// A reading with every button released, the switch off and no samples.
    pub fn idle() -> Self {
        Self {
            buttons: [Some(false); ENCODER_COUNT],
            switch: Some(false),
            panic: Some(false),
            ..Self::default()
        }
    }

    /// Append a sample to `channel`'s burst. Samples beyond
    /// [`DEBOUNCE_DEPTH`] are dropped.
    pub fn push_sample(&mut self, channel: usize, raw: i32, at_ms: u64) {
        if let Some(burst) = self.positions.get_mut(channel) {
            let _ = burst.push(PositionSample { raw, at_ms });
        }
    }
}

/// Why a tick's sampling was abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SampleError {
    /// The bus was reset successfully; hardware counters are back at 0.
    BusRecovered,
    /// Bus recovery failed.
    BusFault(BusFault),
}

impl From<BusFault> for SampleError {
    fn from(fault: BusFault) -> Self {
        SampleError::BusFault(fault)
    }
}

impl core::fmt::Display for SampleError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            SampleError::BusRecovered => write!(f, "bus recovered, tick abandoned"),
            SampleError::BusFault(fault) => write!(f, "{}", fault),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Level {
    Button(usize),
    Switch,
    Panic,
}

/// Per-tick reader with bounded retry and bus-fault counting.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Sampler {
    attempts: u8,
    threshold: u8,
    spacing_ms: u64,
    consecutive_faults: u8,
}

impl Sampler {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            attempts: config.read_attempts.max(1),
            threshold: config.bus_fault_threshold,
            spacing_ms: config.burst_spacing_ms(),
            consecutive_faults: 0,
        }
    }

    /// Failed reads since the last successful one.
    pub fn consecutive_faults(&self) -> u8 {
        self.consecutive_faults
    }

    /// Read the whole surface for the tick starting at `now_ms`.
    ///
    /// `plausible(channel, raw)` vets each position read; rejected reads
    /// are retried.
    pub async fn sample<C, D, P>(
        &mut self,
        surface: &mut C,
        delay: &mut D,
        now_ms: u64,
        mut plausible: P,
    ) -> Result<SurfaceReading, SampleError>
    where
        C: ControlSurface,
        D: DelayNs,
        P: FnMut(usize, i32) -> bool,
    {
        let mut reading = SurfaceReading::default();
        let mut frozen = [false; ENCODER_COUNT];

        for round in 0..DEBOUNCE_DEPTH {
            if round > 0 {
                delay.delay_ms(self.spacing_ms as u32).await;
            }
            let at_ms = now_ms + round as u64 * self.spacing_ms;
            for channel in 0..ENCODER_COUNT {
                if frozen[channel] {
                    continue;
                }
                match self.read_position(surface, channel, &mut plausible).await? {
                    Some(raw) => reading.push_sample(channel, raw, at_ms),
                    None => {
                        frozen[channel] = true;
                        reading.positions[channel].clear();
                    }
                }
            }
        }

        for channel in 0..ENCODER_COUNT {
            reading.buttons[channel] = self
                .read_level(surface, Level::Button(channel))
                .await?
                .map(|level| !level);
        }
        reading.switch = self.read_level(surface, Level::Switch).await?;
        reading.panic = self.read_level(surface, Level::Panic).await?.map(|level| !level);

        Ok(reading)
    }

    async fn read_position<C, P>(
        &mut self,
        surface: &mut C,
        channel: usize,
        plausible: &mut P,
    ) -> Result<Option<i32>, SampleError>
    where
        C: ControlSurface,
        P: FnMut(usize, i32) -> bool,
    {
        for _ in 0..self.attempts {
            match surface.read_position(channel).await {
                Ok(raw) => {
                    self.consecutive_faults = 0;
                    if plausible(channel, raw) {
                        return Ok(Some(raw));
                    }
                }
                Err(TransientIoError) => self.record_fault(surface).await?,
            }
        }
        #[cfg(feature = "defmt")]
        defmt::debug!("encoder {} frozen this tick", channel);
        Ok(None)
    }

    async fn read_level<C: ControlSurface>(
        &mut self,
        surface: &mut C,
        level: Level,
    ) -> Result<Option<bool>, SampleError> {
        for _ in 0..self.attempts {
            let result = match level {
                Level::Button(channel) => surface.read_button_level(channel).await,
                Level::Switch => surface.read_switch_level().await,
                Level::Panic => surface.read_panic_level().await,
            };
            match result {
                Ok(value) => {
                    self.consecutive_faults = 0;
                    return Ok(Some(value));
                }
                Err(TransientIoError) => self.record_fault(surface).await?,
            }
        }
        Ok(None)
    }

    async fn record_fault<C: ControlSurface>(&mut self, surface: &mut C) -> Result<(), SampleError> {
        self.consecutive_faults = self.consecutive_faults.saturating_add(1);
        #[cfg(feature = "defmt")]
        defmt::debug!("transient read fault ({} consecutive)", self.consecutive_faults);
        if self.consecutive_faults <= self.threshold {
            return Ok(());
        }

        self.consecutive_faults = 0;
        #[cfg(feature = "defmt")]
        defmt::warn!("bus fault threshold exceeded; resetting bus");
        match surface.reset_bus().await {
            Ok(()) => Err(SampleError::BusRecovered),
            Err(fault) => {
                #[cfg(feature = "defmt")]
                defmt::error!("bus recovery failed");
                Err(fault.into())
            }
        }
    }
}
