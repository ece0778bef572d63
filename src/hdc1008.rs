//! TI HDC1008 humidity and temperature sensor
//!
//! The HDC1008 doesn't stretch the clock during a conversion. Writing the
//! temperature pointer starts one, and the result can only be read after the
//! conversion time has elapsed, so reads here are pointer write, fixed wait,
//! then a plain read.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use crate::i2c::Error;
use crate::regs::{u16_be, RegisterBus};
use crate::time::MilliSeconds;

/// Address with both ADR pins low. ADR0/ADR1 select 0x40..=0x43.
pub const ADDRESS: u8 = 0x40;

pub const MANUFACTURER_ID: u16 = 0x5449;
pub const DEVICE_ID: u16 = 0x1000;

const REG_TEMPERATURE: u8 = 0x00;
const REG_CONFIG: u8 = 0x02;
const REG_SERIAL: [u8; 3] = [0xFB, 0xFC, 0xFD];
const REG_MANUFACTURER_ID: u8 = 0xFE;
const REG_DEVICE_ID: u8 = 0xFF;

/// Generous wait for a combined temperature and humidity conversion
pub const CONVERSION_DELAY: MilliSeconds = MilliSeconds::from_ticks(40);

bitflags::bitflags! {
    /// Configuration register
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct Config: u16 {
        /// Software reset, self clearing
        const RESET = 0x8000;
        const HEAT = 0x2000;
        /// Acquire temperature and humidity in one sequence
        const MODE = 0x1000;
        /// Supply voltage below 2.8 V, read only
        const BTST = 0x0800;
        const TRES_11 = 0x0400;
        const HRES_8 = 0x0200;
        const HRES_11 = 0x0100;
    }
}

/// Temperature reading to whole °C
pub fn celsius(raw: u16) -> i32 {
    (i32::from(raw) * 165) / 65536 - 40
}

/// Humidity reading to whole %RH
pub fn humidity(raw: u16) -> u32 {
    (u32::from(raw) * 100) / 65536
}

/// One temperature and humidity conversion
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Reading {
    pub raw_temperature: u16,
    pub raw_humidity: u16,
}

impl Reading {
    pub fn celsius(&self) -> i32 {
        celsius(self.raw_temperature)
    }

    pub fn fahrenheit(&self) -> i32 {
        self.celsius() * 18 / 10 + 32
    }

    pub fn humidity(&self) -> u32 {
        humidity(self.raw_humidity)
    }
}

pub struct Hdc1008<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C: I2c> Hdc1008<I2C> {
    pub fn new(i2c: I2C) -> Self {
        Self::with_address(i2c, ADDRESS)
    }

    pub fn with_address(i2c: I2C, address: u8) -> Self {
        Hdc1008 { i2c, address }
    }

    fn read_word(&mut self, reg: u8) -> Result<u16, Error> {
        self.i2c.read_reg_16_be(self.address, reg)
    }

    pub fn config(&mut self) -> Result<Config, Error> {
        self.read_word(REG_CONFIG).map(Config::from_bits_truncate)
    }

    pub fn set_config(&mut self, config: Config) -> Result<(), Error> {
        let [hi, lo] = config.bits().to_be_bytes();
        self.i2c
            .write(self.address, &[REG_CONFIG, hi, lo])
            .map_err(Error::from_hal)
    }

    pub fn manufacturer_id(&mut self) -> Result<u16, Error> {
        self.read_word(REG_MANUFACTURER_ID)
    }

    pub fn device_id(&mut self) -> Result<u16, Error> {
        self.read_word(REG_DEVICE_ID)
    }

    /// The 41 bit serial number, as the three registers that hold it
    pub fn serial(&mut self) -> Result<[u16; 3], Error> {
        let mut serial = [0; 3];
        for (word, reg) in serial.iter_mut().zip(REG_SERIAL) {
            *word = self.read_word(reg)?;
        }
        Ok(serial)
    }

    /// Read both channels in one acquisition
    ///
    /// Requires [`Config::MODE`] to be set.
    pub fn read_both<D: DelayNs>(&mut self, delay: &mut D) -> Result<Reading, Error> {
        self.i2c
            .write(self.address, &[REG_TEMPERATURE])
            .map_err(Error::from_hal)?;
        delay.delay_ms(CONVERSION_DELAY.ticks());

        let mut b = [0; 4];
        self.i2c.read(self.address, &mut b).map_err(Error::from_hal)?;
        let reading = Reading {
            raw_temperature: u16_be([b[0], b[1]]),
            raw_humidity: u16_be([b[2], b[3]]),
        };
        trace!(
            "hdc1008 {} C {} %RH",
            reading.celsius(),
            reading.humidity()
        );
        Ok(reading)
    }

    /// Log the id registers, serial and configuration
    pub fn diag(&mut self) -> Result<(), Error> {
        let manufacturer = self.manufacturer_id()?;
        let device = self.device_id()?;
        if manufacturer != MANUFACTURER_ID || device != DEVICE_ID {
            warn!("hdc1008 unexpected ids {:#x} {:#x}", manufacturer, device);
        }
        let serial = self.serial()?;
        info!(
            "hdc1008 serial {:#x} {:#x} {:#x}",
            serial[0],
            serial[1],
            serial[2]
        );
        let config = self.config()?;
        info!("hdc1008 config {:?}", config);
        Ok(())
    }

    /// Releases the bus
    pub fn release(self) -> I2C {
        self.i2c
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i2c::sim;
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTransaction};

    #[test]
    fn conversions() {
        assert_eq!(celsius(0), -40);
        assert_eq!(celsius(0x6000), 21);
        assert_eq!(celsius(0xFFFF), 124);
        assert_eq!(humidity(0x8000), 50);
        assert_eq!(humidity(0xFFFF), 99);
    }

    #[test]
    fn fahrenheit_uses_whole_degrees() {
        let r = Reading {
            raw_temperature: 0x6000,
            raw_humidity: 0,
        };
        // 21 C
        assert_eq!(r.fahrenheit(), 69);
    }

    #[test]
    fn read_both_waits_before_reading() {
        let expectations = [
            I2cTransaction::write(ADDRESS, vec![0x00]),
            I2cTransaction::read(ADDRESS, vec![0x60, 0x00, 0x80, 0x00]),
        ];
        let mut i2c = I2cMock::new(&expectations);
        let mut delay = sim::Recorder::default();

        let mut hdc = Hdc1008::new(i2c.clone());
        let r = hdc.read_both(&mut delay).unwrap();

        assert_eq!(r.celsius(), 21);
        assert_eq!(r.humidity(), 50);
        assert_eq!(delay.calls, [40_000_000]);
        i2c.done();
    }

    #[test]
    fn config_round_trip() {
        let expectations = [
            I2cTransaction::write(0x41, vec![REG_CONFIG, 0x10, 0x00]),
            I2cTransaction::write(0x41, vec![REG_CONFIG]),
            I2cTransaction::read(0x41, vec![0x18, 0x00]),
        ];
        let mut i2c = I2cMock::new(&expectations);

        let mut hdc = Hdc1008::with_address(i2c.clone(), 0x41);
        hdc.set_config(Config::MODE).unwrap();
        assert_eq!(hdc.config(), Ok(Config::MODE | Config::BTST));
        i2c.done();
    }

    #[test]
    fn serial_is_three_words() {
        let expectations = [
            I2cTransaction::write(ADDRESS, vec![0xFB]),
            I2cTransaction::read(ADDRESS, vec![0x01, 0x23]),
            I2cTransaction::write(ADDRESS, vec![0xFC]),
            I2cTransaction::read(ADDRESS, vec![0x45, 0x67]),
            I2cTransaction::write(ADDRESS, vec![0xFD]),
            I2cTransaction::read(ADDRESS, vec![0x89, 0x80]),
        ];
        let mut i2c = I2cMock::new(&expectations);

        let mut hdc = Hdc1008::new(i2c.clone());
        assert_eq!(hdc.serial(), Ok([0x0123, 0x4567, 0x8980]));
        i2c.done();
    }

    #[test]
    fn ids_over_bitbang() {
        let mut target = sim::Target::new(ADDRESS);
        target.regs[0xFE] = 0x54;
        target.regs[0xFF] = 0x49;
        let (_wire, sda, scl) = sim::bus(target);
        let bus = crate::i2c::BitBang::new(sda, scl, sim::NoDelay, Default::default()).unwrap();

        let mut hdc = Hdc1008::new(bus);
        assert_eq!(hdc.manufacturer_id(), Ok(MANUFACTURER_ID));
    }
}
