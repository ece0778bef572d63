//! Microchip MCP4725 12-bit DAC

use embedded_hal::i2c::I2c;

use crate::i2c::Error;

/// Address with A0 low
pub const ADDRESS: u8 = 0x60;

const CMD_WRITE_DAC: u8 = 0x40;
const CMD_WRITE_DAC_EEPROM: u8 = 0x60;

/// Largest value the DAC accepts
pub const MAX_VALUE: u16 = 0x0FFF;

/// Output state. Anything other than `Normal` turns the amplifier off and
/// pulls the output down through the given resistor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerDown {
    #[default]
    Normal,
    Resistor1k,
    Resistor100k,
    Resistor500k,
}

impl PowerDown {
    pub const fn bits(self) -> u8 {
        self as u8
    }

    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => PowerDown::Normal,
            1 => PowerDown::Resistor1k,
            2 => PowerDown::Resistor100k,
            _ => PowerDown::Resistor500k,
        }
    }
}

/// Contents of the DAC register and EEPROM
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Status {
    /// EEPROM write finished
    pub ready: bool,
    pub power_on_reset: bool,
    pub power_down: PowerDown,
    pub value: u16,
    pub eeprom_power_down: PowerDown,
    pub eeprom_value: u16,
}

impl From<[u8; 5]> for Status {
    fn from(b: [u8; 5]) -> Self {
        Status {
            ready: b[0] & 0x80 != 0,
            power_on_reset: b[0] & 0x40 != 0,
            power_down: PowerDown::from_bits(b[0] >> 1),
            value: u16::from(b[1]) << 4 | u16::from(b[2]) >> 4,
            eeprom_power_down: PowerDown::from_bits(b[3] >> 5),
            eeprom_value: u16::from(b[3] & 0x0F) << 8 | u16::from(b[4]),
        }
    }
}

fn frame(command: u8, value: u16, power_down: PowerDown) -> [u8; 3] {
    let value = value & MAX_VALUE;
    [
        command | power_down.bits() << 1,
        (value >> 4) as u8,
        (value << 4) as u8,
    ]
}

pub struct Mcp4725<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C: I2c> Mcp4725<I2C> {
    pub fn new(i2c: I2C) -> Self {
        Self::with_address(i2c, ADDRESS)
    }

    pub fn with_address(i2c: I2C, address: u8) -> Self {
        Mcp4725 { i2c, address }
    }

    /// Update the output. `value` is truncated to 12 bits.
    pub fn set_value(&mut self, value: u16, power_down: PowerDown) -> Result<(), Error> {
        self.i2c
            .write(self.address, &frame(CMD_WRITE_DAC, value, power_down))
            .map_err(Error::from_hal)
    }

    /// Update the output and make it the power-on default
    pub fn store(&mut self, value: u16, power_down: PowerDown) -> Result<(), Error> {
        debug!("mcp4725 storing {} to eeprom", value & MAX_VALUE);
        self.i2c
            .write(self.address, &frame(CMD_WRITE_DAC_EEPROM, value, power_down))
            .map_err(Error::from_hal)
    }

    pub fn read(&mut self) -> Result<Status, Error> {
        let mut b = [0; 5];
        self.i2c.read(self.address, &mut b).map_err(Error::from_hal)?;
        Ok(Status::from(b))
    }

    /// Releases the bus
    pub fn release(self) -> I2C {
        self.i2c
    }
}
