use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::i2c::I2c;
use embedded_hal_02::blocking::i2c::{Read, Write, WriteRead};

use super::{BitBang, Error, I2cBus};

impl<H, SDA, SCL, D> Write for I2cBus<H, SDA, SCL, D>
where
    H: I2c,
    SDA: InputPin + OutputPin,
    SCL: InputPin + OutputPin,
    D: DelayNs,
{
    type Error = Error;

    fn write(&mut self, addr: u8, bytes: &[u8]) -> Result<(), Self::Error> {
        self.send(addr, bytes)
    }
}

impl<H, SDA, SCL, D> Read for I2cBus<H, SDA, SCL, D>
where
    H: I2c,
    SDA: InputPin + OutputPin,
    SCL: InputPin + OutputPin,
    D: DelayNs,
{
    type Error = Error;

    fn read(&mut self, addr: u8, buffer: &mut [u8]) -> Result<(), Self::Error> {
        self.receive(addr, buffer)
    }
}

impl<H, SDA, SCL, D> WriteRead for I2cBus<H, SDA, SCL, D>
where
    H: I2c,
    SDA: InputPin + OutputPin,
    SCL: InputPin + OutputPin,
    D: DelayNs,
{
    type Error = Error;

    fn write_read(&mut self, addr: u8, bytes: &[u8], buffer: &mut [u8]) -> Result<(), Self::Error> {
        I2c::write_read(self, addr, bytes, buffer)
    }
}

impl<SDA, SCL, D> Write for BitBang<SDA, SCL, D>
where
    SDA: InputPin + OutputPin,
    SCL: InputPin + OutputPin,
    D: DelayNs,
{
    type Error = Error;

    fn write(&mut self, addr: u8, bytes: &[u8]) -> Result<(), Self::Error> {
        BitBang::write(self, addr, bytes)
    }
}

impl<SDA, SCL, D> Read for BitBang<SDA, SCL, D>
where
    SDA: InputPin + OutputPin,
    SCL: InputPin + OutputPin,
    D: DelayNs,
{
    type Error = Error;

    fn read(&mut self, addr: u8, buffer: &mut [u8]) -> Result<(), Self::Error> {
        BitBang::read(self, addr, buffer)
    }
}

impl<SDA, SCL, D> WriteRead for BitBang<SDA, SCL, D>
where
    SDA: InputPin + OutputPin,
    SCL: InputPin + OutputPin,
    D: DelayNs,
{
    type Error = Error;

    fn write_read(&mut self, addr: u8, bytes: &[u8], buffer: &mut [u8]) -> Result<(), Self::Error> {
        BitBang::write_read(self, addr, bytes, buffer)
    }
}
