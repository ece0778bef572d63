//! Microchip MCP9808 digital temperature sensor
//!
//! Converts continuously; a read of the ambient temperature register returns
//! the most recent result. All registers except resolution are 16 bit,
//! most significant byte first.

use embedded_hal::i2c::I2c;

use crate::i2c::Error;
use crate::regs::RegisterBus;
use crate::time::MilliSeconds;
use crate::units;

/// Address with A2..A0 low
pub const ADDRESS: u8 = 0x18;

pub const MANUFACTURER_ID: u16 = 0x0054;
/// Device id in the high byte, revision in the low byte
pub const DEVICE_ID: u16 = 0x0400;

const REG_CONFIG: u8 = 0x01;
const REG_UPPER: u8 = 0x02;
const REG_LOWER: u8 = 0x03;
const REG_CRITICAL: u8 = 0x04;
const REG_TEMPERATURE: u8 = 0x05;
const REG_MANUFACTURER_ID: u8 = 0x06;
const REG_DEVICE_ID: u8 = 0x07;
const REG_RESOLUTION: u8 = 0x08;

const SIGN: u16 = 0x1000;

/// Temperature resolution
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Resolution {
    /// 0.5 °C
    Half,
    /// 0.25 °C
    Quarter,
    /// 0.125 °C
    Eighth,
    /// 0.0625 °C, the power-on default
    #[default]
    Sixteenth,
}

impl Resolution {
    pub const fn bits(self) -> u8 {
        self as u8
    }

    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => Resolution::Half,
            1 => Resolution::Quarter,
            2 => Resolution::Eighth,
            _ => Resolution::Sixteenth,
        }
    }

    /// Time for one conversion
    pub const fn conversion_time(self) -> MilliSeconds {
        MilliSeconds::from_ticks(match self {
            Resolution::Half => 30,
            Resolution::Quarter => 65,
            Resolution::Eighth => 130,
            Resolution::Sixteenth => 250,
        })
    }
}

/// Ambient temperature register to 0.01 °C
///
/// The alert flags in the top three bits are ignored.
pub fn centi_celsius(raw: u16) -> i32 {
    let tc = (i32::from(raw & 0x0FFF) * 100) >> 4;
    if raw & SIGN != 0 {
        tc - 25600
    } else {
        tc
    }
}

pub struct Mcp9808<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C: I2c> Mcp9808<I2C> {
    pub fn new(i2c: I2C) -> Self {
        Self::with_address(i2c, ADDRESS)
    }

    pub fn with_address(i2c: I2C, address: u8) -> Self {
        Mcp9808 { i2c, address }
    }

    pub fn read_register(&mut self, reg: u8) -> Result<u16, Error> {
        self.i2c.read_reg_16_be(self.address, reg)
    }

    pub fn write_register(&mut self, reg: u8, value: u16) -> Result<(), Error> {
        let [hi, lo] = value.to_be_bytes();
        self.i2c
            .write(self.address, &[reg, hi, lo])
            .map_err(Error::from_hal)
    }

    pub fn manufacturer_id(&mut self) -> Result<u16, Error> {
        self.read_register(REG_MANUFACTURER_ID)
    }

    pub fn device_id(&mut self) -> Result<u16, Error> {
        self.read_register(REG_DEVICE_ID)
    }

    pub fn raw_temperature(&mut self) -> Result<u16, Error> {
        self.read_register(REG_TEMPERATURE)
    }

    /// Latest conversion in 0.01 °C
    pub fn temperature(&mut self) -> Result<i32, Error> {
        self.raw_temperature().map(centi_celsius)
    }

    pub fn resolution(&mut self) -> Result<Resolution, Error> {
        self.i2c
            .read_reg_8(self.address, REG_RESOLUTION)
            .map(Resolution::from_bits)
    }

    pub fn set_resolution(&mut self, resolution: Resolution) -> Result<(), Error> {
        self.i2c
            .write_reg_8(self.address, REG_RESOLUTION, resolution.bits())
    }

    /// Log every register and the current temperature
    pub fn diag(&mut self) -> Result<i32, Error> {
        let manufacturer = self.manufacturer_id()?;
        let device = self.device_id()?;
        if manufacturer != MANUFACTURER_ID {
            warn!("mcp9808 unexpected manufacturer id {:#x}", manufacturer);
        }
        info!("mcp9808 device {:#x} revision {}", device >> 8, device & 0xFF);

        for reg in [REG_CONFIG, REG_UPPER, REG_LOWER, REG_CRITICAL] {
            let value = self.read_register(reg)?;
            debug!("mcp9808 register {} = {:#x}", reg, value);
        }
        let resolution = self.resolution()?;
        debug!("mcp9808 resolution {:?}", resolution);

        let tc = self.temperature()?;
        info!(
            "mcp9808 {} cC ({} cF)",
            tc,
            units::centi_fahrenheit(tc)
        );
        Ok(tc)
    }

    /// Releases the bus
    pub fn release(self) -> I2C {
        self.i2c
    }
}
