//! Time units
//!
//! Bus rates and conversion delays are [`fugit`] values. The extension traits
//! re-exported here add `.kHz()`, `.micros()`, `.millis()` and friends to
//! `u32`.
//!
//! ```rust
//! use unwired_sensors::time::{ExtU32, Hertz, MicroSeconds, RateExtU32};
//!
//! let rate: Hertz = 100.kHz();
//! let wait: MicroSeconds = 4500.micros();
//!
//! assert_eq!(rate.raw(), 100_000);
//! assert_eq!(wait.ticks(), 4500);
//! ```

pub use fugit::{
    ExtU32, HertzU32 as Hertz, KilohertzU32 as KiloHertz, MegahertzU32 as MegaHertz,
    MicrosDurationU32 as MicroSeconds, MillisDurationU32 as MilliSeconds, RateExtU32,
};

/// Length of half an SCL period at `rate`, in nanoseconds
///
/// A zero rate is treated as 1 Hz.
pub const fn half_period_ns(rate: Hertz) -> u32 {
    let hz = if rate.raw() == 0 { 1 } else { rate.raw() };
    500_000_000 / hz
}
