use core::fmt;

pub use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};

/// I2C error
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
#[non_exhaustive]
pub enum Error {
    /// The bus reported a failure (NACK, arbitration loss, bus error, ...)
    Protocol(ErrorKind),
    /// A transfer or a clock-stretch wait did not finish in time
    Timeout,
    /// The bit-bang backend is already open
    BusInUse,
    /// Hardware selector other than 1 or 2
    InvalidPeripheral,
}

impl Error {
    /// Map an error reported by any `embedded_hal` I2C implementation
    ///
    /// `ErrorKind::Other` is the only kind a peripheral timeout can surface
    /// as, so it becomes [`Error::Timeout`].
    pub fn from_hal<E: embedded_hal::i2c::Error>(e: E) -> Self {
        match e.kind() {
            ErrorKind::Other => Error::Timeout,
            kind => Error::Protocol(kind),
        }
    }

    pub(crate) fn nack() -> Self {
        Error::Protocol(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Unknown))
    }

    pub(crate) fn nack_addr(self) -> Self {
        match self {
            Error::Protocol(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Unknown)) => {
                Error::Protocol(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address))
            }
            e => e,
        }
    }

    pub(crate) fn nack_data(self) -> Self {
        match self {
            Error::Protocol(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Unknown)) => {
                Error::Protocol(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data))
            }
            e => e,
        }
    }

    /// The line driver refused a level change
    pub(crate) fn pin<E>(_: E) -> Self {
        Error::Protocol(ErrorKind::Bus)
    }
}

impl embedded_hal::i2c::Error for Error {
    fn kind(&self) -> ErrorKind {
        match *self {
            Self::Protocol(kind) => kind,
            Self::Timeout | Self::BusInUse | Self::InvalidPeripheral => ErrorKind::Other,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Protocol(kind) => write!(f, "i2c protocol error: {kind}"),
            Self::Timeout => f.write_str("i2c timeout"),
            Self::BusInUse => f.write_str("bit-bang i2c already in use"),
            Self::InvalidPeripheral => f.write_str("no such i2c peripheral"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{}", defmt::Debug2Format(self))
    }
}

/// Give up on an error the application can't recover from
///
/// Boards without a console have nowhere to report a missing sensor, so the
/// demos park the core instead of unwinding.
pub trait Fatal<T> {
    /// Return the value, or log the error and spin forever
    fn or_spin(self) -> T;
}

impl<T> Fatal<T> for Result<T, Error> {
    fn or_spin(self) -> T {
        match self {
            Ok(v) => v,
            Err(e) => {
                error!("fatal i2c error: {:?}", e);
                loop {
                    core::hint::spin_loop();
                }
            }
        }
    }
}
