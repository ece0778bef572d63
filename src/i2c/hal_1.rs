use core::convert::Infallible;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, InputPin, OutputPin};
use embedded_hal::i2c::{ErrorType, I2c, Operation};

use super::{BitBang, Error, I2cBus, Unused};

impl<H, SDA, SCL, D> ErrorType for I2cBus<H, SDA, SCL, D> {
    type Error = Error;
}

impl<SDA, SCL, D> ErrorType for BitBang<SDA, SCL, D> {
    type Error = Error;
}

impl ErrorType for Unused {
    type Error = Error;
}

mod blocking {
    use super::*;

    impl<H, SDA, SCL, D> I2c for I2cBus<H, SDA, SCL, D>
    where
        H: I2c,
        SDA: InputPin + OutputPin,
        SCL: InputPin + OutputPin,
        D: DelayNs,
    {
        fn read(&mut self, addr: u8, buffer: &mut [u8]) -> Result<(), Self::Error> {
            self.receive(addr, buffer)
        }

        fn write(&mut self, addr: u8, bytes: &[u8]) -> Result<(), Self::Error> {
            self.send(addr, bytes)
        }

        fn transaction(
            &mut self,
            addr: u8,
            operations: &mut [Operation<'_>],
        ) -> Result<(), Self::Error> {
            I2cBus::transaction(self, addr, operations)
        }
    }

    impl<SDA, SCL, D> I2c for BitBang<SDA, SCL, D>
    where
        SDA: InputPin + OutputPin,
        SCL: InputPin + OutputPin,
        D: DelayNs,
    {
        fn read(&mut self, addr: u8, buffer: &mut [u8]) -> Result<(), Self::Error> {
            BitBang::read(self, addr, buffer)
        }

        fn write(&mut self, addr: u8, bytes: &[u8]) -> Result<(), Self::Error> {
            BitBang::write(self, addr, bytes)
        }

        fn write_read(
            &mut self,
            addr: u8,
            bytes: &[u8],
            buffer: &mut [u8],
        ) -> Result<(), Self::Error> {
            BitBang::write_read(self, addr, bytes, buffer)
        }

        fn transaction(
            &mut self,
            addr: u8,
            operations: &mut [Operation<'_>],
        ) -> Result<(), Self::Error> {
            BitBang::transaction(self, addr, operations)
        }
    }

    impl I2c for Unused {
        fn transaction(
            &mut self,
            _addr: u8,
            _operations: &mut [Operation<'_>],
        ) -> Result<(), Self::Error> {
            match *self {}
        }
    }
}

impl digital::ErrorType for Unused {
    type Error = Infallible;
}

impl OutputPin for Unused {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        match *self {}
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        match *self {}
    }
}

impl InputPin for Unused {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        match *self {}
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        match *self {}
    }
}

impl DelayNs for Unused {
    fn delay_ns(&mut self, _ns: u32) {
        match *self {}
    }
}
