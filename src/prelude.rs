pub use crate::i2c::Fatal as _unwired_sensors_i2c_Fatal;
pub use crate::regs::RegisterBus as _unwired_sensors_regs_RegisterBus;
pub use crate::time::ExtU32 as _fugit_ExtU32;
pub use crate::time::RateExtU32 as _fugit_RateExtU32;
pub use embedded_hal::delay::DelayNs as _embedded_hal_delay_DelayNs;
pub use embedded_hal::i2c::I2c as _embedded_hal_i2c_I2c;
