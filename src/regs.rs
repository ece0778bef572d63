//! Register access
//!
//! All sensors here use the same pointer-register convention: a one byte
//! write selects the register, and a separate read transfer streams out the
//! contents from that register on. The decode helpers assemble the
//! multi-byte values the sensors return.

use embedded_hal::i2c::I2c;

use crate::i2c::Error;

#[inline(always)]
pub const fn u8_at(b: [u8; 1]) -> u8 {
    b[0]
}

#[inline(always)]
pub const fn i8_at(b: [u8; 1]) -> i8 {
    b[0] as i8
}

#[inline(always)]
pub const fn u16_be(b: [u8; 2]) -> u16 {
    u16::from_be_bytes(b)
}

#[inline(always)]
pub const fn u16_le(b: [u8; 2]) -> u16 {
    u16::from_le_bytes(b)
}

#[inline(always)]
pub const fn i16_be(b: [u8; 2]) -> i16 {
    i16::from_be_bytes(b)
}

#[inline(always)]
pub const fn i16_le(b: [u8; 2]) -> i16 {
    i16::from_le_bytes(b)
}

/// Three bytes, most significant first
#[inline(always)]
pub const fn u24_be(b: [u8; 3]) -> u32 {
    (b[0] as u32) << 16 | (b[1] as u32) << 8 | b[2] as u32
}

/// Three bytes, least significant first
#[inline(always)]
pub const fn u24_le(b: [u8; 3]) -> u32 {
    (b[2] as u32) << 16 | (b[1] as u32) << 8 | b[0] as u32
}

/// Pointer-register access on top of any blocking I2C bus
pub trait RegisterBus {
    /// Select `reg`, then read `buf.len()` bytes in a second transfer
    fn read_regs(&mut self, addr: u8, reg: u8, buf: &mut [u8]) -> Result<(), Error>;

    fn write_reg_8(&mut self, addr: u8, reg: u8, value: u8) -> Result<(), Error>;

    fn read_reg_8(&mut self, addr: u8, reg: u8) -> Result<u8, Error> {
        let mut b = [0; 1];
        self.read_regs(addr, reg, &mut b)?;
        Ok(u8_at(b))
    }

    fn read_reg_16_be(&mut self, addr: u8, reg: u8) -> Result<u16, Error> {
        let mut b = [0; 2];
        self.read_regs(addr, reg, &mut b)?;
        Ok(u16_be(b))
    }

    fn read_reg_24_be(&mut self, addr: u8, reg: u8) -> Result<u32, Error> {
        let mut b = [0; 3];
        self.read_regs(addr, reg, &mut b)?;
        Ok(u24_be(b))
    }
}

impl<I: I2c> RegisterBus for I {
    fn read_regs(&mut self, addr: u8, reg: u8, buf: &mut [u8]) -> Result<(), Error> {
        self.write(addr, &[reg]).map_err(Error::from_hal)?;
        self.read(addr, buf).map_err(Error::from_hal)
    }

    fn write_reg_8(&mut self, addr: u8, reg: u8, value: u8) -> Result<(), Error> {
        self.write(addr, &[reg, value]).map_err(Error::from_hal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTransaction};

    #[test]
    fn decode_helpers() {
        assert_eq!(u8_at([0xF6]), 0xF6);
        assert_eq!(i8_at([0xF6]), -10);
        assert_eq!(u16_be([0x12, 0x34]), 0x1234);
        assert_eq!(u16_le([0x12, 0x34]), 0x3412);
        assert_eq!(i16_be([0xFF, 0xB8]), -72);
        assert_eq!(i16_le([0xB8, 0xFF]), -72);
        assert_eq!(u24_be([0x5D, 0x23, 0x00]), 0x5D2300);
        assert_eq!(u24_le([0x00, 0x23, 0x5D]), 0x5D2300);
    }

    #[test]
    fn read_is_pointer_write_then_read() {
        let expectations = [
            I2cTransaction::write(0x77, vec![0xF6]),
            I2cTransaction::read(0x77, vec![0x6C, 0xFA]),
            I2cTransaction::write(0x77, vec![0xF6]),
            I2cTransaction::read(0x77, vec![0x5D, 0x23, 0x00]),
            I2cTransaction::write(0x77, vec![0xD0]),
            I2cTransaction::read(0x77, vec![0x55]),
        ];
        let mut i2c = I2cMock::new(&expectations);

        assert_eq!(i2c.read_reg_16_be(0x77, 0xF6), Ok(27898));
        assert_eq!(i2c.read_reg_24_be(0x77, 0xF6), Ok(0x5D2300));
        assert_eq!(i2c.read_reg_8(0x77, 0xD0), Ok(0x55));

        i2c.done();
    }

    #[test]
    fn write_reg_is_one_transfer() {
        let expectations = [I2cTransaction::write(0x77, vec![0xF4, 0x2E])];
        let mut i2c = I2cMock::new(&expectations);

        i2c.write_reg_8(0x77, 0xF4, 0x2E).unwrap();

        i2c.done();
    }

    #[test]
    fn failed_pointer_write_skips_the_read() {
        use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};

        let nack = ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address);
        let expectations = [I2cTransaction::write(0x18, vec![0x05]).with_error(nack)];
        let mut i2c = I2cMock::new(&expectations);

        assert_eq!(i2c.read_reg_16_be(0x18, 0x05), Err(Error::Protocol(nack)));

        i2c.done();
    }
}
