//! High-level interface for the M5Stack Unit 8Encoder.
//!
//! [`EightEncoderUnit`] wraps the register driver with index validation,
//! per-channel register addressing and a batch-read convenience method.

use embedded_hal_async::i2c::I2c;

use crate::driver::RegisterDriver;
use crate::error::EncoderError;
use crate::registers::{
    BUTTON, COUNTER, COUNTER_RESET, ENCODER_COUNT, FIRMWARE_VERSION, LED_COUNT, RGB_LED, SWITCH,
};

/// High-level interface for the M5Stack Unit 8Encoder.
///
/// Provides validated, async methods for the eight encoder counters and
/// push-buttons, the toggle switch and the nine RGB LEDs.
///
/// # Example
///
/// ```ignore
/// use encoder_unit_driver::{EightEncoderUnit, DEFAULT_ADDRESS};
///
/// // `i2c` is any `embedded-hal-async` I2C implementation
/// let mut unit = EightEncoderUnit::new(i2c, DEFAULT_ADDRESS);
///
/// let positions = unit.read_all_positions().await?;
/// let pressed = !unit.read_button_level(0).await?;
/// ```
pub struct EightEncoderUnit<I2C> {
    driver: RegisterDriver<I2C>,
}

impl<I2C> EightEncoderUnit<I2C>
where
    I2C: I2c,
{
    /// Create a new unit interface.
    ///
    /// # Arguments
    /// * `i2c` — I2C peripheral (takes ownership for exclusive access)
    /// * `address` — 7-bit I2C device address (factory default 0x41)
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self {
            driver: RegisterDriver::new(i2c, address),
        }
    }

    pub fn address(&self) -> u8 {
        self.driver.address()
    }

    /// Give the I2C peripheral back.
    pub fn release(self) -> I2C {
        self.driver.release()
    }

    // -----------------------------------------------------------------------
    // Counters
    // -----------------------------------------------------------------------

    /// Read the absolute counter of a specific encoder.
    ///
    /// The unit counts two transitions per detent and never wraps on its
    /// own; callers reset it with [`reset_position`](Self::reset_position).
    ///
    /// # Errors
    /// * [`EncoderError::InvalidEncoder`] if `encoder >= 8`
    /// * [`EncoderError::I2c`] on communication failure
    pub async fn read_position(&mut self, encoder: u8) -> Result<i32, EncoderError<I2C::Error>> {
        let encoder = check_encoder::<I2C::Error>(encoder)?;
        self.driver.read_i32(COUNTER + 4 * encoder).await
    }

    /// Read all eight counters in sequence.
    ///
    /// # Errors
    /// Returns the first I2C error encountered; no partial results are
    /// returned to avoid inconsistent state.
    pub async fn read_all_positions(&mut self) -> Result<[i32; ENCODER_COUNT], EncoderError<I2C::Error>> {
        let mut positions = [0i32; ENCODER_COUNT];

        for (encoder, position) in positions.iter_mut().enumerate() {
            *position = self.read_position(encoder as u8).await?;
        }

        Ok(positions)
    }

    /// Overwrite the counter of a specific encoder.
    ///
    /// # Errors
    /// * [`EncoderError::InvalidEncoder`] if `encoder >= 8`
    /// * [`EncoderError::I2c`] on communication failure
    pub async fn set_position(&mut self, encoder: u8, value: i32) -> Result<(), EncoderError<I2C::Error>> {
        let encoder = check_encoder::<I2C::Error>(encoder)?;
        self.driver.write_i32(COUNTER + 4 * encoder, value).await
    }

    /// Reset the counter of a specific encoder to 0.
    pub async fn reset_position(&mut self, encoder: u8) -> Result<(), EncoderError<I2C::Error>> {
        let encoder = check_encoder::<I2C::Error>(encoder)?;
        self.driver.write_u8(COUNTER_RESET + encoder, 1).await
    }

    /// Reset all eight counters to 0.
    pub async fn reset_all_positions(&mut self) -> Result<(), EncoderError<I2C::Error>> {
        for encoder in 0..ENCODER_COUNT as u8 {
            self.reset_position(encoder).await?;
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Buttons and switch
    // -----------------------------------------------------------------------

    /// Read the push-button level of a specific encoder.
    ///
    /// The level is electrical: `false` while the button is pressed.
    pub async fn read_button_level(&mut self, encoder: u8) -> Result<bool, EncoderError<I2C::Error>> {
        let encoder = check_encoder::<I2C::Error>(encoder)?;
        Ok(self.driver.read_u8(BUTTON + encoder).await? != 0)
    }

    /// Read the toggle switch, `true` when on.
    pub async fn read_switch_level(&mut self) -> Result<bool, EncoderError<I2C::Error>> {
        Ok(self.driver.read_u8(SWITCH).await? != 0)
    }

    // -----------------------------------------------------------------------
    // LEDs and identification
    // -----------------------------------------------------------------------

    /// Set one RGB LED. LEDs 0–7 sit next to the encoders, LED 8 next to
    /// the switch.
    ///
    /// # Errors
    /// * [`EncoderError::InvalidLed`] if `led >= 9`
    /// * [`EncoderError::I2c`] on communication failure
    pub async fn set_led(&mut self, led: u8, rgb: [u8; 3]) -> Result<(), EncoderError<I2C::Error>> {
        if led as usize >= LED_COUNT {
            return Err(EncoderError::InvalidLed);
        }
        self.driver.write_rgb(RGB_LED + 3 * led, rgb).await
    }

    /// Read the firmware version byte. Also a cheap liveness probe.
    pub async fn firmware_version(&mut self) -> Result<u8, EncoderError<I2C::Error>> {
        self.driver.read_u8(FIRMWARE_VERSION).await
    }
}

fn check_encoder<E>(encoder: u8) -> Result<u8, EncoderError<E>> {
    if encoder as usize >= ENCODER_COUNT {
        return Err(EncoderError::InvalidEncoder);
    }
    Ok(encoder)
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use embassy_futures::block_on;
    use embedded_hal_async::i2c::{ErrorKind, ErrorType, Operation};
    use std::vec::Vec;

    use crate::registers::DEFAULT_ADDRESS;

    /// Register file behind a fake bus. A write sets the register pointer
    /// from its first byte and stores the rest; a read continues from the
    /// pointer.
    struct FakeUnit {
        registers: [u8; 256],
        pointer: u8,
        writes: Vec<Vec<u8>>,
        fail: bool,
    }

    impl FakeUnit {
        fn new() -> Self {
            Self {
                registers: [0; 256],
                pointer: 0,
                writes: Vec::new(),
                fail: false,
            }
        }
    }

    impl ErrorType for FakeUnit {
        type Error = ErrorKind;
    }

    impl I2c for FakeUnit {
        async fn transaction(
            &mut self,
            address: u8,
            operations: &mut [Operation<'_>],
        ) -> Result<(), Self::Error> {
            if self.fail || address != DEFAULT_ADDRESS {
                return Err(ErrorKind::Other);
            }
            for operation in operations {
                match operation {
                    Operation::Write(bytes) => {
                        self.writes.push(bytes.to_vec());
                        if let Some((&register, data)) = bytes.split_first() {
                            self.pointer = register;
                            for (i, &byte) in data.iter().enumerate() {
                                self.registers[register as usize + i] = byte;
                            }
                        }
                    }
                    Operation::Read(buffer) => {
                        for (i, byte) in buffer.iter_mut().enumerate() {
                            *byte = self.registers[self.pointer as usize + i];
                        }
                    }
                }
            }
            Ok(())
        }
    }

    fn unit_with(setup: impl FnOnce(&mut FakeUnit)) -> EightEncoderUnit<FakeUnit> {
        let mut fake = FakeUnit::new();
        setup(&mut fake);
        EightEncoderUnit::new(fake, DEFAULT_ADDRESS)
    }

    #[test]
    fn reads_little_endian_counters() {
        let mut unit = unit_with(|fake| {
            fake.registers[4 * 3..4 * 3 + 4].copy_from_slice(&(-7i32).to_le_bytes());
            fake.registers[4 * 7..4 * 7 + 4].copy_from_slice(&300i32.to_le_bytes());
        });

        assert_eq!(block_on(unit.read_position(3)), Ok(-7));
        let all = block_on(unit.read_all_positions()).unwrap();
        assert_eq!(all[3], -7);
        assert_eq!(all[7], 300);
        assert_eq!(all[0], 0);
    }

    #[test]
    fn rejects_out_of_range_indices_without_bus_traffic() {
        let mut unit = unit_with(|_| {});
        assert_eq!(block_on(unit.read_position(8)), Err(EncoderError::InvalidEncoder));
        assert_eq!(block_on(unit.reset_position(9)), Err(EncoderError::InvalidEncoder));
        assert_eq!(block_on(unit.set_led(9, [1, 2, 3])), Err(EncoderError::InvalidLed));
        assert!(unit.release().writes.is_empty());
    }

    #[test]
    fn writes_use_the_per_channel_addresses() {
        let mut unit = unit_with(|_| {});
        block_on(unit.set_position(2, 0x0102_0304)).unwrap();
        block_on(unit.reset_position(5)).unwrap();
        block_on(unit.set_led(8, [10, 20, 30])).unwrap();

        let fake = unit.release();
        assert_eq!(fake.writes[0], [0x08, 0x04, 0x03, 0x02, 0x01]);
        assert_eq!(fake.writes[1], [0x45, 1]);
        assert_eq!(fake.writes[2], [0x88, 10, 20, 30]);
    }

    #[test]
    fn buttons_are_active_low_and_switch_active_high() {
        let mut unit = unit_with(|fake| {
            fake.registers[BUTTON as usize..BUTTON as usize + 8].fill(1);
            fake.registers[BUTTON as usize + 4] = 0;
            fake.registers[SWITCH as usize] = 1;
            fake.registers[FIRMWARE_VERSION as usize] = 2;
        });

        assert_eq!(block_on(unit.read_button_level(4)), Ok(false));
        assert_eq!(block_on(unit.read_button_level(3)), Ok(true));
        assert_eq!(block_on(unit.read_switch_level()), Ok(true));
        assert_eq!(block_on(unit.firmware_version()), Ok(2));
    }

    #[test]
    fn bus_errors_propagate() {
        let mut unit = unit_with(|fake| fake.fail = true);
        assert_eq!(block_on(unit.read_position(0)), Err(EncoderError::I2c(ErrorKind::Other)));
        assert_eq!(
            block_on(unit.reset_all_positions()),
            Err(EncoderError::I2c(ErrorKind::Other))
        );
    }
}
