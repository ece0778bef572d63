//! Simulated open-drain bus with one register-file target
//!
//! The target decodes START/STOP and clock edges exactly as a real device
//! would: the first byte of a write sets the register pointer, later bytes
//! are stored at the pointer, and reads stream out from the pointer.

extern crate std;

use core::cell::RefCell;
use core::convert::Infallible;
use std::rc::Rc;
use std::vec::Vec;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorKind, ErrorType, InputPin, OutputPin};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    Start,
    Stop,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Idle,
    Address,
    Write,
    Read,
}

/// Which ninth-clock slot is in flight
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Slot {
    Data,
    TargetAck,
    ControllerAck,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Line {
    Sda,
    Scl,
}

pub type WriteHook = fn(&mut [u8; 256], u8, u8);

pub struct Target {
    pub address: u8,
    pub regs: [u8; 256],
    /// Every register write as `(register, value)`
    pub writes: Vec<(u8, u8)>,
    /// Called after a register write lands
    pub on_write: Option<WriteHook>,
    pointer: u8,
    pointer_set: bool,
}

impl Target {
    pub fn new(address: u8) -> Self {
        Target {
            address,
            regs: [0; 256],
            writes: Vec::new(),
            on_write: None,
            pointer: 0,
            pointer_set: false,
        }
    }

    fn byte_written(&mut self, byte: u8) {
        if !self.pointer_set {
            self.pointer = byte;
            self.pointer_set = true;
            return;
        }
        self.regs[usize::from(self.pointer)] = byte;
        self.writes.push((self.pointer, byte));
        if let Some(hook) = self.on_write {
            hook(&mut self.regs, self.pointer, byte);
        }
        self.pointer = self.pointer.wrapping_add(1);
    }

    fn current(&self) -> u8 {
        self.regs[usize::from(self.pointer)]
    }
}

pub struct Wire {
    pub target: Target,
    pub events: Vec<Event>,
    /// How many polls of SCL the target holds it low after each release
    pub stretch: u32,
    controller_sda: bool,
    controller_scl: bool,
    target_sda: bool,
    scl_hold: u32,
    phase: Phase,
    slot: Slot,
    shift: u8,
    bits: u8,
    nacked: bool,
}

impl Wire {
    fn sda(&self) -> bool {
        self.controller_sda && self.target_sda
    }

    fn scl(&self) -> bool {
        self.controller_scl && self.scl_hold == 0
    }

    fn drive(&mut self, line: Line, high: bool) {
        let (sda0, scl0) = (self.sda(), self.scl());
        match line {
            Line::Sda => self.controller_sda = high,
            Line::Scl => {
                if high && !self.controller_scl {
                    self.scl_hold = self.stretch;
                } else if !high {
                    self.scl_hold = 0;
                }
                self.controller_scl = high;
            }
        }
        let (sda1, scl1) = (self.sda(), self.scl());

        if scl0 && scl1 && sda0 != sda1 {
            if sda1 {
                self.stop();
            } else {
                self.start();
            }
        } else if !scl0 && scl1 {
            self.rising();
        } else if scl0 && !scl1 {
            self.falling();
        }
    }

    fn poll_scl(&mut self) -> bool {
        if self.controller_scl && self.scl_hold > 0 {
            self.scl_hold -= 1;
            if self.scl_hold == 0 {
                self.rising();
            }
        }
        self.scl()
    }

    fn start(&mut self) {
        self.events.push(Event::Start);
        self.phase = Phase::Address;
        self.slot = Slot::Data;
        self.shift = 0;
        self.bits = 0;
        self.target_sda = true;
    }

    fn stop(&mut self) {
        self.events.push(Event::Stop);
        self.phase = Phase::Idle;
        self.slot = Slot::Data;
        self.target_sda = true;
    }

    fn rising(&mut self) {
        let sda = self.sda();
        match (self.phase, self.slot) {
            (Phase::Address | Phase::Write, Slot::Data) => {
                self.shift = (self.shift << 1) | u8::from(sda);
                self.bits += 1;
            }
            (Phase::Read, Slot::ControllerAck) => self.nacked = sda,
            _ => {}
        }
    }

    fn drive_msb(&mut self) {
        self.target_sda = self.target.current() & 0x80 != 0;
    }

    fn falling(&mut self) {
        match self.slot {
            Slot::TargetAck => {
                self.slot = Slot::Data;
                self.shift = 0;
                self.bits = 0;
                self.target_sda = true;
                if self.phase == Phase::Read {
                    self.drive_msb();
                }
            }
            Slot::ControllerAck => {
                self.slot = Slot::Data;
                self.bits = 0;
                if self.nacked {
                    self.phase = Phase::Idle;
                    self.target_sda = true;
                } else {
                    self.drive_msb();
                }
            }
            Slot::Data => match self.phase {
                Phase::Address if self.bits == 8 => {
                    if self.shift >> 1 == self.target.address {
                        self.phase = if self.shift & 1 == 1 {
                            Phase::Read
                        } else {
                            self.target.pointer_set = false;
                            Phase::Write
                        };
                        self.target_sda = false;
                        self.slot = Slot::TargetAck;
                    } else {
                        self.phase = Phase::Idle;
                    }
                }
                Phase::Write if self.bits == 8 => {
                    self.target.byte_written(self.shift);
                    self.target_sda = false;
                    self.slot = Slot::TargetAck;
                }
                Phase::Read => {
                    self.bits += 1;
                    if self.bits < 8 {
                        self.target_sda = (self.target.current() << self.bits) & 0x80 != 0;
                    } else {
                        self.target_sda = true;
                        self.slot = Slot::ControllerAck;
                        self.target.pointer = self.target.pointer.wrapping_add(1);
                    }
                }
                _ => {}
            },
        }
    }
}

pub struct SimPin {
    wire: Rc<RefCell<Wire>>,
    line: Line,
}

impl ErrorType for SimPin {
    type Error = Infallible;
}

impl OutputPin for SimPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.wire.borrow_mut().drive(self.line, false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.wire.borrow_mut().drive(self.line, true);
        Ok(())
    }
}

impl InputPin for SimPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        let mut wire = self.wire.borrow_mut();
        Ok(match self.line {
            Line::Sda => wire.sda(),
            Line::Scl => wire.poll_scl(),
        })
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|high| !high)
    }
}

/// Line whose driver rejects every access
pub struct StuckPin;

impl ErrorType for StuckPin {
    type Error = ErrorKind;
}

impl OutputPin for StuckPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Err(ErrorKind::Other)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Err(ErrorKind::Other)
    }
}

impl InputPin for StuckPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Err(ErrorKind::Other)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Err(ErrorKind::Other)
    }
}

/// Build an idle bus with `target` attached. Returns the shared wire state
/// and the SDA and SCL pins for the controller.
pub fn bus(target: Target) -> (Rc<RefCell<Wire>>, SimPin, SimPin) {
    let wire = Rc::new(RefCell::new(Wire {
        target,
        events: Vec::new(),
        stretch: 0,
        controller_sda: true,
        controller_scl: true,
        target_sda: true,
        scl_hold: 0,
        phase: Phase::Idle,
        slot: Slot::Data,
        shift: 0,
        bits: 0,
        nacked: false,
    }));
    let sda = SimPin {
        wire: wire.clone(),
        line: Line::Sda,
    };
    let scl = SimPin {
        wire: wire.clone(),
        line: Line::Scl,
    };
    (wire, sda, scl)
}

pub struct NoDelay;

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

/// Delay provider that remembers every request, in nanoseconds
#[derive(Default)]
pub struct Recorder {
    pub calls: Vec<u32>,
}

impl Recorder {
    pub fn total_ns(&self) -> u64 {
        self.calls.iter().map(|&ns| u64::from(ns)).sum()
    }
}

impl DelayNs for Recorder {
    fn delay_ns(&mut self, ns: u32) {
        self.calls.push(ns);
    }

    fn delay_us(&mut self, us: u32) {
        self.calls.push(us * 1_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.calls.push(ms * 1_000_000);
    }
}
