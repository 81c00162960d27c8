//! HuC6280 programmable timer
//!
//! A 7-bit down-counter clocked from the CPU clock through a fixed
//! prescaler. When it is decremented at zero it reloads and requests the
//! timer interrupt.
//!
//! # Registers
//!
//! - `$0C00` write: reload value (`& 0x7F`); read: current counter
//! - `$0C01` write: bit 0 starts (0→1 loads the counter) or stops the timer

use emu_core::logging::{log, LogCategory, LogLevel};

/// CPU cycles per counter decrement. Real hardware is closer to 1097.
pub const CYCLES_PER_TIMER_TICK: u32 = 1024;

pub struct Timer {
    reload: u8,
    counter: u8,
    running: bool,
    cycles: u64,
    tick_cycles: u32,
}

impl Timer {
    pub fn new() -> Self {
        Self::with_tick_cycles(CYCLES_PER_TIMER_TICK)
    }

    /// Timer with a custom prescaler threshold (clamped to at least 1).
    pub fn with_tick_cycles(tick_cycles: u32) -> Self {
        Self {
            reload: 0,
            counter: 0,
            running: false,
            cycles: 0,
            tick_cycles: tick_cycles.max(1),
        }
    }

    /// Return to power-on state, keeping the configured threshold.
    pub fn reset(&mut self) {
        *self = Self::with_tick_cycles(self.tick_cycles);
    }

    pub fn write_reload(&mut self, value: u8) {
        self.reload = value & 0x7F;
    }

    pub fn write_control(&mut self, value: u8) {
        let start = value & 0x01 != 0;
        if start && !self.running {
            self.counter = self.reload;
            self.cycles = 0;
            log(LogCategory::Timer, LogLevel::Debug, || {
                format!("Timer started, reload {:02X}", self.reload)
            });
        }
        self.running = start;
    }

    pub fn counter(&self) -> u8 {
        self.counter
    }

    pub fn reload(&self) -> u8 {
        self.reload
    }

    pub fn running(&self) -> bool {
        self.running
    }

    pub fn tick_cycles(&self) -> u32 {
        self.tick_cycles
    }

    /// Advance by `cycles` CPU cycles. Returns true if the counter underflowed
    /// at least once.
    pub fn step(&mut self, cycles: u32) -> bool {
        if !self.running {
            return false;
        }
        let total = self.cycles + cycles as u64;
        let tick = self.tick_cycles as u64;
        let ticks = total / tick;
        self.cycles = total % tick;

        // A counter at n needs n + 1 ticks to fire, then reload + 1 per period.
        let to_first = self.counter as u64 + 1;
        if ticks < to_first {
            self.counter -= ticks as u8;
            return false;
        }
        let rest = (ticks - to_first) % (self.reload as u64 + 1);
        self.counter = self.reload - rest as u8;
        true
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}
