//! # Sensor drivers for STM32F103 boards
//!
//! Blocking drivers for a handful of I2C sensors, on top of a bus that can
//! be backed either by one of the chip's hardware I2C units or by a
//! software master on two GPIO lines.
//!
//! - [`bmp180`] and [`bmp390`] barometric pressure / temperature
//! - [`hdc1008`] humidity / temperature
//! - [`mcp9808`] temperature
//! - [`mcp4725`] 12-bit DAC
//!
//! Every driver is generic over [`embedded_hal::i2c::I2c`], so it runs on an
//! [`i2c::I2cBus`] as well as on any other HAL's I2C driver. Conversion
//! waits are fixed busy-sleeps on the [`embedded_hal::delay::DelayNs`]
//! passed to each call; [`delay::BusyDelay`] is a ready-made one.
//!
//! # Usage example
//!
//! ```ignore
//! use unwired_sensors::{
//!     bmp180::{Bmp180, Oss},
//!     delay::BusyDelay,
//!     i2c::{BitBangBus, Config},
//!     prelude::*,
//! };
//!
//! let mut delay = BusyDelay::new(72.MHz());
//! let bus = BitBangBus::open_bitbang(sda, scl, delay, Config::default()).or_spin();
//! let mut bmp = Bmp180::new(bus, Oss::Standard).or_spin();
//!
//! loop {
//!     let m = bmp.measure(&mut delay).or_spin();
//!     // m.temperature is in 0.1 C, m.pressure in Pa
//! }
//! ```
//!
//! # Logging
//!
//! Enable the `defmt` or the `log` feature to get driver diagnostics. With
//! neither, logging compiles to nothing.

#![cfg_attr(not(test), no_std)]

mod fmt;

pub mod bmp180;
pub mod bmp390;
pub mod delay;
pub mod hdc1008;
pub mod i2c;
pub mod mcp4725;
pub mod mcp9808;
pub mod prelude;
pub mod regs;
pub mod time;
pub mod units;
