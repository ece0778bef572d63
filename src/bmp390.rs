//! Bosch BMP390 barometric pressure and temperature sensor
//!
//! Readings are taken in forced mode: one conversion of both channels is
//! requested through the power control register, then the six data bytes
//! are read out after a fixed wait. Compensation uses 64-bit integer
//! arithmetic on the trimming coefficients stored at 0x31.
//!
//! Temperatures are in hundredths of a degree Celsius, pressures in pascal.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use crate::i2c::Error;
use crate::regs::{i16_le, i8_at, u16_le, u24_le, RegisterBus};
use crate::time::MilliSeconds;

/// Bus address with SDO tied low
pub const ADDRESS: u8 = 0x76;
/// Bus address with SDO tied high
pub const ADDRESS_ALT: u8 = 0x77;
/// Contents of the chip id register
pub const CHIP_ID: u8 = 0x60;

const REG_CHIP_ID: u8 = 0x00;
const REG_PRESSURE: u8 = 0x04;
const REG_TEMPERATURE: u8 = 0x07;
const REG_PWR_CTRL: u8 = 0x1B;
const REG_CALIBRATION: u8 = 0x31;

const CALIBRATION_LEN: usize = 21;

const PRESS_EN: u8 = 1 << 0;
const TEMP_EN: u8 = 1 << 1;

/// Wait between triggering a forced conversion and reading it back
pub const CONVERSION_DELAY: MilliSeconds = MilliSeconds::from_ticks(20);

/// Power mode field of the power control register
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerMode {
    #[default]
    Sleep,
    Forced,
    Normal,
}

impl PowerMode {
    const fn bits(self) -> u8 {
        match self {
            PowerMode::Sleep => 0b00,
            PowerMode::Forced => 0b01,
            PowerMode::Normal => 0b11,
        }
    }

    /// Power control value with both channels enabled
    pub const fn pwr_ctrl(self) -> u8 {
        PRESS_EN | TEMP_EN | self.bits() << 4
    }
}

/// Trimming coefficients
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Calibration {
    pub t1: u16,
    pub t2: u16,
    pub t3: i8,
    pub p1: i16,
    pub p2: i16,
    pub p3: i8,
    pub p4: i8,
    pub p5: u16,
    pub p6: u16,
    pub p7: i8,
    pub p8: i8,
    pub p9: i16,
    pub p10: i8,
    pub p11: i8,
}

impl From<[u8; CALIBRATION_LEN]> for Calibration {
    fn from(b: [u8; CALIBRATION_LEN]) -> Self {
        Calibration {
            t1: u16_le([b[0], b[1]]),
            t2: u16_le([b[2], b[3]]),
            t3: i8_at([b[4]]),
            p1: i16_le([b[5], b[6]]),
            p2: i16_le([b[7], b[8]]),
            p3: i8_at([b[9]]),
            p4: i8_at([b[10]]),
            p5: u16_le([b[11], b[12]]),
            p6: u16_le([b[13], b[14]]),
            p7: i8_at([b[15]]),
            p8: i8_at([b[16]]),
            p9: i16_le([b[17], b[18]]),
            p10: i8_at([b[19]]),
            p11: i8_at([b[20]]),
        }
    }
}

impl Calibration {
    /// Compensate a raw temperature reading
    ///
    /// Returns the temperature in 0.01 °C and `t_lin`, the whole-degree
    /// temperature the pressure compensation is evaluated at.
    pub fn temperature(&self, raw: u32) -> (i32, i64) {
        let d1 = i64::from(raw) - 256 * i64::from(self.t1);
        let d2 = i64::from(self.t2) * d1;
        let d3 = d1 * d1;
        let d4 = d3 * i64::from(self.t3);
        let d5 = (d2 << 18) + d4;
        let d6 = d5 >> 32;

        (((d6 * 100) >> 16) as i32, d6 >> 16)
    }

    /// Compensate a raw pressure reading at temperature `t_lin`, in Pa
    pub fn pressure(&self, raw: u32, t_lin: i64) -> i64 {
        let raw = i64::from(raw);
        let t = t_lin;
        let t2 = t * t;
        let t3 = t2 * t;

        let offset = i64::from(self.p5) * 8
            + i64::from(self.p6) * t / 64
            + i64::from(self.p7) * t2 / 256
            + i64::from(self.p8) * t3 / 32768;

        let sensitivity = (i64::from(self.p1) - 16384) * (1 << 17)
            + (i64::from(self.p2) - 16384) * t * (1 << 8)
            + i64::from(self.p3) * t2 * 32
            + i64::from(self.p4) * t3;
        let linear = sensitivity * raw / 137_438_953_472;

        let square = (raw * raw) >> 16;
        let quadratic = square * (i64::from(self.p9) + i64::from(self.p10) * t) / (1 << 32);
        let cubic = (((square * raw) >> 25) * i64::from(self.p11)) / (1 << 24);

        offset + linear + quadratic + cubic
    }
}

/// One compensated reading
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Measurement {
    /// 0.01 °C
    pub temperature: i32,
    /// Pa
    pub pressure: i64,
}

pub struct Bmp390<I2C> {
    i2c: I2C,
    address: u8,
    calibration: Calibration,
}

impl<I2C: I2c> Bmp390<I2C> {
    /// Read the trimming coefficients from the sensor at `address`
    pub fn new(mut i2c: I2C, address: u8) -> Result<Self, Error> {
        let mut buf = [0; CALIBRATION_LEN];
        i2c.read_regs(address, REG_CALIBRATION, &mut buf)?;
        let calibration = Calibration::from(buf);
        debug!("bmp390 calibration: {:?}", calibration);

        Ok(Bmp390 {
            i2c,
            address,
            calibration,
        })
    }

    pub fn id(&mut self) -> Result<u8, Error> {
        self.i2c.read_reg_8(self.address, REG_CHIP_ID)
    }

    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    /// Enable both channels and enter `mode`
    pub fn enable(&mut self, mode: PowerMode) -> Result<(), Error> {
        self.i2c
            .write_reg_8(self.address, REG_PWR_CTRL, mode.pwr_ctrl())
    }

    fn read_u24(&mut self, reg: u8) -> Result<u32, Error> {
        let mut b = [0; 3];
        self.i2c.read_regs(self.address, reg, &mut b)?;
        Ok(u24_le(b))
    }

    pub fn read_raw_temperature(&mut self) -> Result<u32, Error> {
        self.read_u24(REG_TEMPERATURE)
    }

    pub fn read_raw_pressure(&mut self) -> Result<u32, Error> {
        self.read_u24(REG_PRESSURE)
    }

    /// Trigger a forced conversion and compensate the result
    pub fn measure<D: DelayNs>(&mut self, delay: &mut D) -> Result<Measurement, Error> {
        self.enable(PowerMode::Forced)?;
        delay.delay_ms(CONVERSION_DELAY.ticks());

        // pressure and temperature data are contiguous
        let mut b = [0; 6];
        self.i2c.read_regs(self.address, REG_PRESSURE, &mut b)?;
        let raw_pressure = u24_le([b[0], b[1], b[2]]);
        let raw_temperature = u24_le([b[3], b[4], b[5]]);

        let (temperature, t_lin) = self.calibration.temperature(raw_temperature);
        let pressure = self.calibration.pressure(raw_pressure, t_lin);
        trace!(
            "bmp390 raw {} {}, {} cC {} Pa",
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

    /// Read the chip id a few times and log each result
    ///
    /// Useful for spotting a marginal bus during bring-up. Returns the last
    /// id read.
    pub fn diag(&mut self) -> Result<u8, Error> {
        let mut id = 0;
        for _ in 0..8 {
            id = self.id()?;
            info!("bmp390 chip id {:#x}", id);
        }
        if id != CHIP_ID {
            warn!("bmp390 expected chip id {:#x}", CHIP_ID);
        }
        Ok(id)
    }

    /// Releases the bus
    pub fn release(self) -> I2C {
        self.i2c
    }
}
