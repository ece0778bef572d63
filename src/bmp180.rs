//! Bosch BMP180 barometric pressure and temperature sensor
//!
//! Conversions are started by a command write to the control register and
//! read back after a fixed wait. The wait depends on the oversampling
//! setting; the driver sleeps on the delay provider passed to each call.
//!
//! Temperatures are in tenths of a degree Celsius, pressures in pascal.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use crate::i2c::Error;
use crate::regs::{i16_be, u16_be, RegisterBus};
use crate::time::MicroSeconds;
use crate::units;

/// Fixed bus address
pub const ADDRESS: u8 = 0x77;
/// Contents of the chip id register
pub const CHIP_ID: u8 = 0x55;

const REG_CALIBRATION: u8 = 0xAA;
const REG_CONTROL: u8 = 0xF4;
const REG_RESULT: u8 = 0xF6;
const REG_CHIP_ID: u8 = 0xD0;

const CMD_TEMPERATURE: u8 = 0x2E;
const CMD_PRESSURE: u8 = 0x34;

const CALIBRATION_LEN: usize = 22;

/// Temperature conversion time
pub const TEMPERATURE_DELAY: MicroSeconds = MicroSeconds::from_ticks(4500);

/// Pressure oversampling setting
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Oss {
    UltraLowPower,
    #[default]
    Standard,
    HighResolution,
    UltraHighResolution,
}

impl Oss {
    pub const fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(Oss::UltraLowPower),
            1 => Some(Oss::Standard),
            2 => Some(Oss::HighResolution),
            3 => Some(Oss::UltraHighResolution),
            _ => None,
        }
    }

    pub const fn bits(self) -> u8 {
        self as u8
    }

    /// Control register value that starts a pressure conversion
    pub const fn command(self) -> u8 {
        CMD_PRESSURE | self.bits() << 6
    }

    /// Right shift that turns the 24 bit result into the raw reading
    pub const fn shift(self) -> u8 {
        8 - self.bits()
    }

    pub const fn conversion_time(self) -> MicroSeconds {
        MicroSeconds::from_ticks(match self {
            Oss::UltraLowPower => 4500,
            Oss::Standard => 7500,
            Oss::HighResolution => 13500,
            Oss::UltraHighResolution => 25500,
        })
    }
}

/// Factory calibration, read once from the EEPROM at 0xAA
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Calibration {
    pub ac1: i16,
    pub ac2: i16,
    pub ac3: i16,
    pub ac4: u16,
    pub ac5: u16,
    pub ac6: u16,
    pub b1: i16,
    pub b2: i16,
    pub mb: i16,
    pub mc: i16,
    pub md: i16,
}

impl From<[u8; CALIBRATION_LEN]> for Calibration {
    fn from(b: [u8; CALIBRATION_LEN]) -> Self {
        Calibration {
            ac1: i16_be([b[0], b[1]]),
            ac2: i16_be([b[2], b[3]]),
            ac3: i16_be([b[4], b[5]]),
            ac4: u16_be([b[6], b[7]]),
            ac5: u16_be([b[8], b[9]]),
            ac6: u16_be([b[10], b[11]]),
            b1: i16_be([b[12], b[13]]),
            b2: i16_be([b[14], b[15]]),
            mb: i16_be([b[16], b[17]]),
            mc: i16_be([b[18], b[19]]),
            md: i16_be([b[20], b[21]]),
        }
    }
}

impl Calibration {
    /// Compensate a raw temperature reading
    ///
    /// Returns the temperature in 0.1 °C together with the intermediate `b5`
    /// that pressure compensation needs.
    ///
    /// # Panics
    ///
    /// If `x1 + MD` is zero. Factory calibration never gets there, but an
    /// all-zero [`Calibration`] does.
    pub fn temperature(&self, raw: u16) -> (i32, i32) {
        let x1 = ((i32::from(raw) - i32::from(self.ac6)) * i32::from(self.ac5)) >> 15;
        let x2 = (i32::from(self.mc) << 11) / (x1 + i32::from(self.md));
        let b5 = x1 + x2;
        ((b5 + 8) >> 4, b5)
    }

    /// Compensate a raw pressure reading taken with `oss`, in Pa
    ///
    /// `b7` wraps like the unsigned 32-bit term it is, so readings outside the
    /// sensor's range give a meaningless value rather than an overflow.
    ///
    /// # Panics
    ///
    /// If `b4` is zero, which again takes an all-zero `AC4`.
    pub fn pressure(&self, raw: u32, oss: Oss, b5: i32) -> i32 {
        let oss = oss.bits();

        let b6 = b5 - 4000;
        let x1 = (i32::from(self.b2) * (b6 * b6 / 4096)) / 2048;
        let x2 = i32::from(self.ac2) * b6 / 2048;
        let x3 = x1 + x2;
        let b3 = (((i32::from(self.ac1) * 4 + x3) << oss) + 2) / 4;

        let x1 = i32::from(self.ac3) * b6 / 8192;
        let x2 = (i32::from(self.b1) * (b6 * b6 / 4096)) / 65536;
        let x3 = (x1 + x2 + 2) / 4;
        let b4 = (i32::from(self.ac4) * (x3 + 32768) / 32768) as u32;
        let b7 = raw.wrapping_sub(b3 as u32).wrapping_mul(50000 >> oss);

        let p = ((b7 / b4) * 2) as i32;
        let x1 = (p / 256) * (p / 256);
        let x1 = x1.wrapping_mul(3038) / 65536;
        let x2 = p.wrapping_mul(-7357) / 65536;
        p.wrapping_add((x1 + x2 + 3791) / 16)
    }
}

/// One compensated reading
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Measurement {
    /// 0.1 °C
    pub temperature: i32,
    /// Pa
    pub pressure: i32,
}

impl Measurement {
    pub fn deci_fahrenheit(&self) -> i32 {
        units::deci_fahrenheit(self.temperature)
    }

    /// Pressure adjusted to sea level by a fixed site `correction`, in Pa
    pub fn sea_level(&self, correction: i32) -> i32 {
        units::sea_level(self.pressure, correction)
    }
}

/// BMP180 on an I2C bus
pub struct Bmp180<I2C> {
    i2c: I2C,
    oss: Oss,
    calibration: Calibration,
}

impl<I2C: I2c> Bmp180<I2C> {
    /// Read the calibration block and keep it for later conversions
    pub fn new(mut i2c: I2C, oss: Oss) -> Result<Self, Error> {
        let mut buf = [0; CALIBRATION_LEN];
        i2c.read_regs(ADDRESS, REG_CALIBRATION, &mut buf)?;
        let calibration = Calibration::from(buf);
        debug!("bmp180 calibration: {:?}", calibration);

        Ok(Bmp180 {
            i2c,
            oss,
            calibration,
        })
    }

    pub fn id(&mut self) -> Result<u8, Error> {
        self.i2c.read_reg_8(ADDRESS, REG_CHIP_ID)
    }

    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    pub fn oss(&self) -> Oss {
        self.oss
    }

    pub fn set_oss(&mut self, oss: Oss) {
        self.oss = oss;
    }

    pub fn read_raw_temperature<D: DelayNs>(&mut self, delay: &mut D) -> Result<u16, Error> {
        self.i2c
            .write_reg_8(ADDRESS, REG_CONTROL, CMD_TEMPERATURE)?;
        delay.delay_us(TEMPERATURE_DELAY.ticks());
        self.i2c.read_reg_16_be(ADDRESS, REG_RESULT)
    }

    pub fn read_raw_pressure<D: DelayNs>(&mut self, delay: &mut D) -> Result<u32, Error> {
        self.i2c
            .write_reg_8(ADDRESS, REG_CONTROL, self.oss.command())?;
        delay.delay_us(self.oss.conversion_time().ticks());
        let raw = self.i2c.read_reg_24_be(ADDRESS, REG_RESULT)?;
        Ok(raw >> self.oss.shift())
    }

    /// Run a temperature conversion followed by a pressure conversion
    pub fn measure<D: DelayNs>(&mut self, delay: &mut D) -> Result<Measurement, Error> {
        let raw_temperature = self.read_raw_temperature(delay)?;
        let raw_pressure = self.read_raw_pressure(delay)?;

        let (temperature, b5) = self.calibration.temperature(raw_temperature);
        let pressure = self.calibration.pressure(raw_pressure, self.oss, b5);
        trace!(
            "bmp180 raw {} {}, {} dC {} Pa",
            raw_temperature,
            raw_pressure,
            temperature,
            pressure
        );

        Ok(Measurement {
            temperature,
            pressure,
        })
    }

    /// Log the chip id, calibration and one measurement
    pub fn diag<D: DelayNs>(&mut self, delay: &mut D) -> Result<Measurement, Error> {
        let id = self.id()?;
        if id == CHIP_ID {
            info!("bmp180 chip id {:#x}", id);
        } else {
            warn!("bmp180 unexpected chip id {:#x}", id);
        }
        info!("bmp180 calibration: {:?}", self.calibration);

        let m = self.measure(delay)?;
        info!(
            "bmp180 {} dC ({} dF), {} Pa, sea level {} Pa",
            m.temperature,
            m.deci_fahrenheit(),
            m.pressure,
            m.sea_level(units::TUCSON_CORRECTION)
        );
        Ok(m)
    }

    /// Releases the bus
    pub fn release(self) -> I2C {
        self.i2c
    }
}
