//! Delays
//!
//! Every wait in this crate is a fixed busy-sleep. [`BusyDelay`] spins the
//! core for a cycle count derived from the system clock, which is all the
//! sensors need and leaves SysTick and the timers free for the application.

use cortex_m::asm;
use embedded_hal::delay::DelayNs;

use crate::time::{Hertz, MicroSeconds};

/// Cycle-counting delay provider
#[derive(Clone, Copy, Debug)]
pub struct BusyDelay {
    sysclk: Hertz,
}

impl BusyDelay {
    /// `sysclk` is the core clock the delay loop runs at
    pub fn new(sysclk: Hertz) -> Self {
        BusyDelay { sysclk }
    }

    pub fn sysclk(&self) -> Hertz {
        self.sysclk
    }

    /// Sleep for given time
    pub fn delay(&mut self, us: MicroSeconds) {
        let mut cycles = u64::from(us.ticks()) * u64::from(self.sysclk.raw()) / 1_000_000;

        // `asm::delay` takes a u32, long waits are split up
        while cycles != 0 {
            let chunk = cycles.min(u64::from(u32::MAX));
            asm::delay(chunk as u32);
            cycles -= chunk;
        }
    }

    fn cycles_for_ns(&self, ns: u32) -> u32 {
        let cycles = (u64::from(ns) * u64::from(self.sysclk.raw()) + 999_999_999) / 1_000_000_000;
        cycles.min(u64::from(u32::MAX)) as u32
    }
}

impl DelayNs for BusyDelay {
    fn delay_ns(&mut self, ns: u32) {
        let cycles = self.cycles_for_ns(ns);
        if cycles != 0 {
            asm::delay(cycles);
        }
    }

    fn delay_us(&mut self, us: u32) {
        self.delay(MicroSeconds::from_ticks(us));
    }

    fn delay_ms(&mut self, ms: u32) {
        for _ in 0..ms {
            self.delay(MicroSeconds::from_ticks(1_000));
        }
    }
}

impl embedded_hal_02::blocking::delay::DelayUs<u32> for BusyDelay {
    fn delay_us(&mut self, us: u32) {
        self.delay(MicroSeconds::from_ticks(us));
    }
}

impl embedded_hal_02::blocking::delay::DelayMs<u32> for BusyDelay {
    fn delay_ms(&mut self, ms: u32) {
        DelayNs::delay_ms(self, ms);
    }
}
