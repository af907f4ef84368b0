//! [`ControlSurface`] over the eight-encoder unit and the panic button.

use chordwheel::{BusFault, ButtonState, ControlSurface, TransientIoError, ENCODER_COUNT};
use defmt::*;
use embassy_rp::gpio::Input;
use embassy_rp::i2c::{self, I2c};
use embassy_rp::peripherals::I2C0;
use embassy_time::Timer;
use encoder_unit_driver::EightEncoderUnit;

/// Concrete I2C type of the encoder unit (sole device on I2C0).
pub type UnitI2c = I2c<'static, I2C0, i2c::Async>;

/// LED colour of a latched control.
const LATCHED_RGB: [u8; 3] = [0, 24, 8];

/// LED colour of the switch LED while in chord mode.
const CHORD_MODE_RGB: [u8; 3] = [16, 0, 24];

const OFF: [u8; 3] = [0, 0, 0];

/// Settle time after a failed transaction before the bus is probed again.
const BUS_SETTLE_MS: u64 = 5;

pub struct UnitSurface {
    unit: EightEncoderUnit<UnitI2c>,
    /// Active-low, pull-up enabled.
    panic_pin: Input<'static>,
    leds: [[u8; 3]; ENCODER_COUNT + 1],
}

impl UnitSurface {
    pub fn new(unit: EightEncoderUnit<UnitI2c>, panic_pin: Input<'static>) -> Self {
        Self {
            unit,
            panic_pin,
            // Forces the first `show_latches` to write every LED.
            leds: [[0xFF; 3]; ENCODER_COUNT + 1],
        }
    }

    /// Light the LEDs of latched controls and the switch LED in chord
    /// mode. Only LEDs whose colour changed are written.
    pub async fn show_latches(&mut self, buttons: &[ButtonState; ENCODER_COUNT], chord_mode: bool) {
        for (led, state) in buttons.iter().enumerate() {
            let rgb = if *state == ButtonState::Latched { LATCHED_RGB } else { OFF };
            self.set_led(led, rgb).await;
        }
        let rgb = if chord_mode { CHORD_MODE_RGB } else { OFF };
        self.set_led(ENCODER_COUNT, rgb).await;
    }

    async fn set_led(&mut self, led: usize, rgb: [u8; 3]) {
        if self.leds[led] == rgb {
            return;
        }
        match self.unit.set_led(led as u8, rgb).await {
            Ok(()) => self.leds[led] = rgb,
            Err(e) => debug!("LED {} write failed: {}", led, e),
        }
    }
}

impl ControlSurface for UnitSurface {
    async fn read_position(&mut self, channel: usize) -> Result<i32, TransientIoError> {
        self.unit
            .read_position(channel as u8)
            .await
            .map_err(|_| TransientIoError)
    }

    async fn read_button_level(&mut self, channel: usize) -> Result<bool, TransientIoError> {
        self.unit
            .read_button_level(channel as u8)
            .await
            .map_err(|_| TransientIoError)
    }

    async fn read_switch_level(&mut self) -> Result<bool, TransientIoError> {
        self.unit.read_switch_level().await.map_err(|_| TransientIoError)
    }

    async fn read_panic_level(&mut self) -> Result<bool, TransientIoError> {
        Ok(self.panic_pin.is_high())
    }

    async fn reset_position(&mut self, channel: usize) -> Result<(), TransientIoError> {
        self.unit
            .reset_position(channel as u8)
            .await
            .map_err(|_| TransientIoError)
    }

    /// Probe the unit and zero every counter. Any failure is final.
    async fn reset_bus(&mut self) -> Result<(), BusFault> {
        Timer::after_millis(BUS_SETTLE_MS).await;
        match self.unit.firmware_version().await {
            Ok(version) => info!("encoder unit answers (firmware {})", version),
            Err(e) => {
                error!("encoder unit not answering: {}", e);
                return Err(BusFault);
            }
        }
        if let Err(e) = self.unit.reset_all_positions().await {
            error!("counter reset failed: {}", e);
            return Err(BusFault);
        }
        // LED state is unknown after recovery.
        self.leds = [[0xFF; 3]; ENCODER_COUNT + 1];
        Ok(())
    }
}
