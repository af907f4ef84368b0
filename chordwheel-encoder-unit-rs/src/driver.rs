//! Low-level register access.
//!
//! Implements the I2C primitives of the unit's flat register space. Unlike
//! Seesaw devices the unit answers a combined write-read (repeated start)
//! immediately, so reads are a single `write_read` transaction.
//!
//! This module is crate-private — consumers interact with
//! [`EightEncoderUnit`](crate::EightEncoderUnit) in `unit.rs` instead.

use embedded_hal_async::i2c::I2c;

use crate::error::EncoderError;

/// Low-level register driver.
///
/// Owns an I2C peripheral and provides typed read/write primitives.
pub(crate) struct RegisterDriver<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C> RegisterDriver<I2C>
where
    I2C: I2c,
{
    /// Create a new register driver.
    ///
    /// # Arguments
    /// * `i2c` — I2C peripheral (takes ownership for exclusive access)
    /// * `address` — 7-bit I2C device address (factory default 0x41)
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// Give the I2C peripheral back.
    pub fn release(self) -> I2C {
        self.i2c
    }

    // -----------------------------------------------------------------------
    // Typed read/write helpers
    // -----------------------------------------------------------------------

    /// Read a 32-bit signed integer (little-endian) from a register.
    pub async fn read_i32(&mut self, register: u8) -> Result<i32, EncoderError<I2C::Error>> {
        let mut buf = [0u8; 4];
        self.i2c.write_read(self.address, &[register], &mut buf).await?;
        Ok(i32::from_le_bytes(buf))
    }

    /// Read a single byte from a register.
    pub async fn read_u8(&mut self, register: u8) -> Result<u8, EncoderError<I2C::Error>> {
        let mut buf = [0u8; 1];
        self.i2c.write_read(self.address, &[register], &mut buf).await?;
        Ok(buf[0])
    }

    /// Write a 32-bit signed integer (little-endian) to a register.
    ///
    /// Register address and value go out in a single write transaction:
    /// `[register, b0, b1, b2, b3]`.
    pub async fn write_i32(&mut self, register: u8, value: i32) -> Result<(), EncoderError<I2C::Error>> {
        let mut buf = [0u8; 5];
        buf[0] = register;
        buf[1..5].copy_from_slice(&value.to_le_bytes());

        self.i2c.write(self.address, &buf).await?;

        Ok(())
    }

    /// Write a single byte to a register.
    pub async fn write_u8(&mut self, register: u8, value: u8) -> Result<(), EncoderError<I2C::Error>> {
        self.i2c.write(self.address, &[register, value]).await?;
        Ok(())
    }

    /// Write three consecutive bytes starting at a register.
    pub async fn write_rgb(&mut self, register: u8, rgb: [u8; 3]) -> Result<(), EncoderError<I2C::Error>> {
        self.i2c
            .write(self.address, &[register, rgb[0], rgb[1], rgb[2]])
            .await?;
        Ok(())
    }
}
