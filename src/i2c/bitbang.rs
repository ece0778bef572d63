//! Software I2C master on two open-drain GPIO lines
//!
//! Both lines must be configured open-drain with pull-ups, so that
//! `set_high` releases the line and `is_high` reads the resolved level.
//! Every edge is followed by a half-period busy-sleep from the supplied
//! delay provider.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::i2c::Operation;
use nb::Error::{Other, WouldBlock};
use nb::Result as NbResult;

use super::Error;
use crate::time::{self, Hertz, RateExtU32};

/// Bit-bang bus timing
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// SCL rate, 100 kHz by default
    pub frequency: Hertz,
    /// How many half periods a target may hold SCL low before the transfer
    /// fails with [`Error::Timeout`]. Zero disables the check.
    pub stretch_limit: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            frequency: 100.kHz(),
            stretch_limit: 1000,
        }
    }
}

impl Config {
    pub fn frequency(mut self, frequency: Hertz) -> Self {
        self.frequency = frequency;
        self
    }

    pub fn stretch_limit(mut self, half_periods: u32) -> Self {
        self.stretch_limit = half_periods;
        self
    }
}

macro_rules! busy_wait {
    ($nb_expr:expr, $exit_cond:expr) => {{
        loop {
            let res = $nb_expr;
            if res != Err(WouldBlock) {
                break res;
            }
            if $exit_cond {
                break res;
            }
        }
    }};
}

/// Software I2C master
pub struct BitBang<SDA, SCL, D> {
    sda: SDA,
    scl: SCL,
    delay: D,
    half_period_ns: u32,
    stretch_limit: u32,
}

impl<SDA, SCL, D> BitBang<SDA, SCL, D> {
    /// Releases the lines and the delay provider
    pub fn release(self) -> (SDA, SCL, D) {
        (self.sda, self.scl, self.delay)
    }
}

impl<SDA, SCL, D> BitBang<SDA, SCL, D>
where
    SDA: InputPin + OutputPin,
    SCL: InputPin + OutputPin,
    D: DelayNs,
{
    /// Take the lines and leave the bus idle (both released)
    pub fn new(sda: SDA, scl: SCL, delay: D, config: Config) -> Result<Self, Error> {
        let mut bus = BitBang {
            sda,
            scl,
            delay,
            half_period_ns: time::half_period_ns(config.frequency),
            stretch_limit: config.stretch_limit,
        };
        bus.sda.set_high().map_err(Error::pin)?;
        bus.scl.set_high().map_err(Error::pin)?;
        debug!(
            "bit-bang i2c at {} Hz, half period {} ns",
            config.frequency.raw(),
            bus.half_period_ns
        );
        Ok(bus)
    }

    fn wait(&mut self) {
        self.delay.delay_ns(self.half_period_ns);
    }

    fn set_sda(&mut self, high: bool) -> Result<(), Error> {
        if high {
            self.sda.set_high()
        } else {
            self.sda.set_low()
        }
        .map_err(Error::pin)
    }

    fn pull_scl(&mut self) -> Result<(), Error> {
        self.scl.set_low().map_err(Error::pin)
    }

    /// Check whether the target has let go of SCL. Returns `WouldBlock` while
    /// it is still being stretched.
    fn scl_released(&mut self) -> NbResult<(), Error> {
        if self.scl.is_high().map_err(Error::pin)? {
            Ok(())
        } else {
            Err(WouldBlock)
        }
    }

    fn release_scl(&mut self) -> Result<(), Error> {
        self.scl.set_high().map_err(Error::pin)?;

        let limit = self.stretch_limit;
        if limit == 0 {
            return Ok(());
        }
        let mut waited = 0;
        busy_wait!(self.scl_released(), {
            waited += 1;
            if waited > limit {
                true
            } else {
                self.wait();
                false
            }
        })
        .map_err(|e| match e {
            WouldBlock => {
                warn!("target held scl for {} half periods", limit);
                Error::Timeout
            }
            Other(e) => e,
        })
    }

    /// Generate START, or repeated START when SCL is low mid-transaction
    fn send_start(&mut self) -> Result<(), Error> {
        self.set_sda(true)?;
        self.release_scl()?;
        self.wait();
        self.set_sda(false)?;
        self.wait();
        self.pull_scl()?;
        self.wait();
        Ok(())
    }

    /// Generate STOP and leave the bus idle
    fn send_stop(&mut self) -> Result<(), Error> {
        self.set_sda(false)?;
        self.wait();
        self.release_scl()?;
        self.wait();
        self.set_sda(true)?;
        self.wait();
        Ok(())
    }

    fn write_bit(&mut self, bit: bool) -> Result<(), Error> {
        self.set_sda(bit)?;
        self.wait();
        self.release_scl()?;
        self.wait();
        self.pull_scl()
    }

    fn read_bit(&mut self) -> Result<bool, Error> {
        self.set_sda(true)?;
        self.wait();
        self.release_scl()?;
        self.wait();
        let bit = self.sda.is_high().map_err(Error::pin)?;
        self.pull_scl()?;
        Ok(bit)
    }

    /// Clock out a byte MSB first, then sample the target's ACK
    fn write_byte(&mut self, byte: u8) -> Result<(), Error> {
        for i in (0..8).rev() {
            self.write_bit((byte >> i) & 1 != 0)?;
        }
        if self.read_bit()? {
            Err(Error::nack())
        } else {
            Ok(())
        }
    }

    fn read_byte(&mut self, ack: bool) -> Result<u8, Error> {
        let mut byte = 0;
        for _ in 0..8 {
            byte = (byte << 1) | u8::from(self.read_bit()?);
        }
        self.write_bit(!ack)?;
        Ok(byte)
    }

    fn send_addr(&mut self, addr: u8, read: bool) -> Result<(), Error> {
        self.write_byte(addr << 1 | u8::from(read))
            .map_err(Error::nack_addr)
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), Error> {
        for &byte in bytes {
            self.write_byte(byte).map_err(Error::nack_data)?;
        }
        Ok(())
    }

    /// Fill `buffer`, NACKing the final byte when `last` is set
    fn read_bytes(&mut self, buffer: &mut [u8], last: bool) -> Result<(), Error> {
        let n = buffer.len();
        for (i, byte) in buffer.iter_mut().enumerate() {
            *byte = self.read_byte(!(last && i + 1 == n))?;
        }
        Ok(())
    }

    fn run(&mut self, addr: u8, operations: &mut [Operation<'_>]) -> Result<(), Error> {
        // direction of the previous operation, `None` before the first START
        let mut reading: Option<bool> = None;

        for i in 0..operations.len() {
            // more bytes follow in this read phase, so the last one here is ACKed
            let next_is_read = operations[i + 1..]
                .iter()
                .map_while(|op| match op {
                    Operation::Read(buffer) => Some(buffer.is_empty()),
                    Operation::Write(_) => None,
                })
                .any(|empty| !empty);
            match &mut operations[i] {
                Operation::Write(bytes) => {
                    if reading != Some(false) {
                        self.send_start()?;
                        self.send_addr(addr, false)?;
                    }
                    self.write_bytes(bytes)?;
                    reading = Some(false);
                }
                Operation::Read(buffer) => {
                    if reading != Some(true) {
                        self.send_start()?;
                        self.send_addr(addr, true)?;
                    }
                    self.read_bytes(buffer, !next_is_read)?;
                    reading = Some(true);
                }
            }
        }
        Ok(())
    }

    /// Execute `operations` as one transaction
    ///
    /// Adjacent operations of the same direction are merged, a change of
    /// direction issues a repeated START and the transaction always ends with
    /// STOP, also on failure.
    pub fn transaction(
        &mut self,
        addr: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Error> {
        if operations.is_empty() {
            return Ok(());
        }
        match self.run(addr, operations) {
            Ok(()) => self.send_stop(),
            Err(e) => {
                trace!("i2c transfer to {} failed: {:?}", addr, e);
                // the first failure is what the caller needs to see
                let _ = self.send_stop();
                Err(e)
            }
        }
    }

    pub fn write(&mut self, addr: u8, bytes: &[u8]) -> Result<(), Error> {
        self.transaction(addr, &mut [Operation::Write(bytes)])
    }

    pub fn read(&mut self, addr: u8, buffer: &mut [u8]) -> Result<(), Error> {
        if buffer.is_empty() {
            return Ok(());
        }
        self.transaction(addr, &mut [Operation::Read(buffer)])
    }

    pub fn write_read(&mut self, addr: u8, bytes: &[u8], buffer: &mut [u8]) -> Result<(), Error> {
        self.transaction(addr, &mut [Operation::Write(bytes), Operation::Read(buffer)])
    }
}
