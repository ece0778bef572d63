//! Inter-Integrated Circuit (I2C) bus
//!
//! An [`I2cBus`] is opened once, on either the hardware I2C unit of the
//! chip or a software master on two GPIO lines, and then used through
//! [`I2cBus::send`] / [`I2cBus::receive`] or the `embedded-hal` traits
//! regardless of the backend behind it.
//!
//! The hardware backend wraps any blocking `embedded_hal::i2c::I2c`
//! implementation for the selected unit, which the board support code is
//! expected to configure for standard mode (100 kHz) with a
//! [`HW_TIMEOUT_US`] transfer timeout. Only one bit-bang bus may exist at a
//! time.
//!
//! ```ignore
//! let i2c = I2cBus::open_hardware(1, board_i2c1).or_spin();
//! let mut bmp = Bmp180::new(i2c, Oss::Standard).or_spin();
//! ```

use core::sync::atomic::{AtomicBool, Ordering};

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::i2c::{I2c, Operation};

use crate::time::{Hertz, RateExtU32};

pub mod bitbang;
mod common;
mod hal_02;
mod hal_1;
#[cfg(test)]
pub(crate) mod sim;

pub use bitbang::{BitBang, Config};
pub use common::{Error, ErrorKind, Fatal, NoAcknowledgeSource};

/// Transfer timeout the hardware unit is configured with, in microseconds
pub const HW_TIMEOUT_US: u32 = 3000;

/// Hardware I2C units of the STM32F103
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Peripheral {
    I2c1,
    I2c2,
}

impl Peripheral {
    pub fn number(self) -> u8 {
        match self {
            Peripheral::I2c1 => 1,
            Peripheral::I2c2 => 2,
        }
    }
}

impl TryFrom<u8> for Peripheral {
    type Error = Error;

    fn try_from(selector: u8) -> Result<Self, Error> {
        match selector {
            1 => Ok(Peripheral::I2c1),
            2 => Ok(Peripheral::I2c2),
            _ => Err(Error::InvalidPeripheral),
        }
    }
}

/// Bus timing of a hardware unit
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum Mode {
    Standard { frequency: Hertz },
}

impl Mode {
    pub fn standard(frequency: Hertz) -> Self {
        Mode::Standard { frequency }
    }

    pub fn get_frequency(&self) -> Hertz {
        match *self {
            Mode::Standard { frequency } => frequency,
        }
    }
}

/// Placeholder for the backend type parameters a bus doesn't use
///
/// Uninhabited, so the corresponding [`I2cBus`] variant can never be built.
#[derive(Debug)]
pub enum Unused {}

/// Hardware I2C unit in master mode
pub struct Hardware<H> {
    peripheral: Peripheral,
    mode: Mode,
    i2c: H,
}

impl<H> Hardware<H> {
    pub fn peripheral(&self) -> Peripheral {
        self.peripheral
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }
}

/// Which backend an [`I2cBus`] was opened on
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Backend {
    Hardware(Peripheral),
    BitBang,
}

/// An open I2C bus
pub enum I2cBus<H, SDA, SCL, D> {
    Hardware(Hardware<H>),
    BitBang(BitBang<SDA, SCL, D>),
}

/// Bus that can only be backed by hardware
pub type HardwareBus<H> = I2cBus<H, Unused, Unused, Unused>;

/// Bus that can only be backed by the software master
pub type BitBangBus<SDA, SCL, D> = I2cBus<Unused, SDA, SCL, D>;

static BITBANG_TAKEN: AtomicBool = AtomicBool::new(false);

impl<H, SDA, SCL, D> I2cBus<H, SDA, SCL, D> {
    pub fn backend(&self) -> Backend {
        match self {
            I2cBus::Hardware(hw) => Backend::Hardware(hw.peripheral),
            I2cBus::BitBang(_) => Backend::BitBang,
        }
    }
}

impl<H, SDA, SCL, D> I2cBus<H, SDA, SCL, D>
where
    H: I2c,
    SDA: InputPin + OutputPin,
    SCL: InputPin + OutputPin,
    D: DelayNs,
{
    /// Open hardware unit `selector` (1 or 2) in standard mode
    ///
    /// `i2c` is the driver for that unit.
    pub fn open_hardware(selector: u8, i2c: H) -> Result<Self, Error> {
        let peripheral = Peripheral::try_from(selector).map_err(|e| {
            warn!("no hardware i2c unit {}", selector);
            e
        })?;
        let mode = Mode::standard(100.kHz());
        debug!(
            "i2c{} open, {} Hz, timeout {} us",
            peripheral.number(),
            mode.get_frequency().raw(),
            HW_TIMEOUT_US
        );
        Ok(I2cBus::Hardware(Hardware {
            peripheral,
            mode,
            i2c,
        }))
    }

    /// Open the software master on `sda` and `scl`
    ///
    /// Fails with [`Error::BusInUse`] if one was already opened. The claim is
    /// not given back when the bus is dropped, only when pin setup fails.
    pub fn open_bitbang(sda: SDA, scl: SCL, delay: D, config: Config) -> Result<Self, Error> {
        if BITBANG_TAKEN.swap(true, Ordering::AcqRel) {
            warn!("bit-bang i2c already open");
            return Err(Error::BusInUse);
        }
        match BitBang::new(sda, scl, delay, config) {
            Ok(bb) => Ok(I2cBus::BitBang(bb)),
            Err(e) => {
                BITBANG_TAKEN.store(false, Ordering::Release);
                Err(e)
            }
        }
    }

    /// Write `bytes` to the device at 7-bit address `addr`, framed by START and STOP
    pub fn send(&mut self, addr: u8, bytes: &[u8]) -> Result<(), Error> {
        match self {
            I2cBus::Hardware(hw) => hw.i2c.write(addr, bytes).map_err(Error::from_hal),
            I2cBus::BitBang(bb) => bb.write(addr, bytes),
        }
    }

    /// Fill `buffer` from the device at `addr`, NACKing the last byte
    pub fn receive(&mut self, addr: u8, buffer: &mut [u8]) -> Result<(), Error> {
        match self {
            I2cBus::Hardware(hw) => hw.i2c.read(addr, buffer).map_err(Error::from_hal),
            I2cBus::BitBang(bb) => bb.read(addr, buffer),
        }
    }

    pub fn transaction(
        &mut self,
        addr: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Error> {
        match self {
            I2cBus::Hardware(hw) => hw
                .i2c
                .transaction(addr, operations)
                .map_err(Error::from_hal),
            I2cBus::BitBang(bb) => bb.transaction(addr, operations),
        }
    }
}

impl<H> I2cBus<H, Unused, Unused, Unused> {
    /// Releases the hardware driver
    pub fn release(self) -> H {
        match self {
            I2cBus::Hardware(hw) => hw.i2c,
            I2cBus::BitBang(bb) => match bb.release().0 {},
        }
    }
}

impl<SDA, SCL, D> I2cBus<Unused, SDA, SCL, D> {
    /// Releases the lines and delay provider
    pub fn release_lines(self) -> (SDA, SCL, D) {
        match self {
            I2cBus::Hardware(hw) => match hw.i2c {},
            I2cBus::BitBang(bb) => bb.release(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTransaction};

    #[test]
    fn selectors_outside_one_and_two_are_rejected() {
        for selector in [0, 3, 255] {
            let mut i2c = I2cMock::new(&[]);
            let res = HardwareBus::open_hardware(selector, i2c.clone());
            assert!(matches!(res, Err(Error::InvalidPeripheral)));
            i2c.done();
        }
    }

    #[test]
    fn hardware_bus_forwards_send_and_receive() {
        let expectations = [
            I2cTransaction::write(0x77, vec![0xD0]),
            I2cTransaction::read(0x77, vec![0x55]),
        ];
        let mut i2c = I2cMock::new(&expectations);

        let mut bus = HardwareBus::open_hardware(2, i2c.clone()).unwrap();
        assert_eq!(bus.backend(), Backend::Hardware(Peripheral::I2c2));

        let mut id = [0];
        bus.send(0x77, &[0xD0]).unwrap();
        bus.receive(0x77, &mut id).unwrap();
        assert_eq!(id, [0x55]);

        i2c.done();
    }

    #[test]
    fn hardware_runs_standard_mode() {
        let mut i2c = I2cMock::new(&[]);
        let bus = HardwareBus::open_hardware(1, i2c.clone()).unwrap();
        match &bus {
            I2cBus::Hardware(hw) => {
                assert_eq!(hw.peripheral(), Peripheral::I2c1);
                assert_eq!(hw.mode(), Mode::Standard { frequency: 100.kHz() });
            }
            I2cBus::BitBang(_) => unreachable!(),
        }
        let _hw = bus.release();
        i2c.done();
    }

    #[test]
    fn hardware_errors_are_mapped() {
        let expectations = [
            I2cTransaction::write(0x40, vec![0x00]).with_error(ErrorKind::Other),
            I2cTransaction::write(0x40, vec![0x00]).with_error(ErrorKind::NoAcknowledge(
                NoAcknowledgeSource::Address,
            )),
        ];
        let mut i2c = I2cMock::new(&expectations);
        let mut bus = HardwareBus::open_hardware(1, i2c.clone()).unwrap();

        assert_eq!(bus.send(0x40, &[0x00]), Err(Error::Timeout));
        assert_eq!(
            bus.send(0x40, &[0x00]),
            Err(Error::Protocol(ErrorKind::NoAcknowledge(
                NoAcknowledgeSource::Address
            )))
        );
        i2c.done();
    }

    // The claim is process wide, so this is the only test that opens a
    // bit-bang bus through `open_bitbang`.
    #[test]
    fn only_one_bitbang_bus() {
        let mut target = sim::Target::new(0x18);
        target.regs[0x06] = 0x54;
        let (_wire, sda, scl) = sim::bus(target);
        let (_wire2, sda2, scl2) = sim::bus(sim::Target::new(0x18));
        let (_wire3, _, scl3) = sim::bus(sim::Target::new(0x18));

        // a failed open leaves no bus behind and doesn't keep the claim
        let broken =
            BitBangBus::open_bitbang(sim::StuckPin, scl3, sim::NoDelay, Config::default());
        assert!(matches!(broken, Err(Error::Protocol(ErrorKind::Bus))));

        let mut bus = BitBangBus::open_bitbang(sda, scl, sim::NoDelay, Config::default()).unwrap();
        assert_eq!(bus.backend(), Backend::BitBang);

        let second = BitBangBus::open_bitbang(sda2, scl2, sim::NoDelay, Config::default());
        assert!(matches!(second, Err(Error::BusInUse)));

        // the first one keeps working
        let mut id = [0];
        bus.send(0x18, &[0x06]).unwrap();
        bus.receive(0x18, &mut id).unwrap();
        assert_eq!(id, [0x54]);

        // handing the lines back doesn't free the claim
        let (sda, scl, _) = bus.release_lines();
        let again = BitBangBus::open_bitbang(sda, scl, sim::NoDelay, Config::default());
        assert!(matches!(again, Err(Error::BusInUse)));
    }
}
