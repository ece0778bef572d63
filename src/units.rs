//! Display conversions
//!
//! Integer only, with truncating division, so results match the values the
//! boards have always printed.

/// Standard atmosphere at sea level, in Pa
pub const SEA_LEVEL_PRESSURE: i32 = 101_325;

/// Sea-level correction for a station at about 2400 ft (Tucson), in Pa
pub const TUCSON_CORRECTION: i32 = 8400;

/// 0.1 °C to 0.1 °F
pub fn deci_fahrenheit(deci_celsius: i32) -> i32 {
    320 + deci_celsius * 18 / 10
}

/// 0.01 °C to 0.01 °F
pub fn centi_fahrenheit(centi_celsius: i32) -> i32 {
    3200 + centi_celsius * 18 / 10
}

/// Station pressure to sea-level pressure with a fixed local `correction`
pub fn sea_level(pressure: i32, correction: i32) -> i32 {
    pressure + correction
}

/// Rough altitude in feet from station pressure, using 0.277 ft/Pa
pub fn altitude_feet(pressure: i32) -> i32 {
    (SEA_LEVEL_PRESSURE - pressure) * 277 / 1000
}

/// Depth in feet below the point where `reference` was taken
pub fn depth_feet(pressure: i32, reference: i32) -> i32 {
    (pressure - reference) * 277 / 1000
}
