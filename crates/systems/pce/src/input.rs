//! Joypad port and multitap latch.
//!
//! Each pad is read as two nibbles selected by the SEL line. With a multitap
//! attached, every rising edge of SEL steps to the next of five ports and a
//! CLR pulse rewinds to the first. Host state is kept for eight pads.

use crate::config::Region;
use emu_core::logging::{log, LogCategory, LogLevel};

pub const PAD_SLOTS: usize = 8;
pub const MULTITAP_PORTS: usize = 5;

/// Button bits of a pad state (1 = pressed).
pub mod buttons {
    pub const I: u8 = 0x01;
    pub const II: u8 = 0x02;
    pub const SELECT: u8 = 0x04;
    pub const RUN: u8 = 0x08;
    pub const UP: u8 = 0x10;
    pub const RIGHT: u8 = 0x20;
    pub const DOWN: u8 = 0x40;
    pub const LEFT: u8 = 0x80;
}

const SEL: u8 = 0x01;
const CLR: u8 = 0x02;

pub struct Input {
    pads: [u8; PAD_SLOTS],
    active: usize,
    sel: bool,
    region: Region,
}

impl Input {
    pub fn new(region: Region) -> Self {
        Self {
            pads: [0; PAD_SLOTS],
            active: 0,
            sel: false,
            region,
        }
    }

    /// Clear the latch; host pad states are kept.
    pub fn reset(&mut self) {
        self.active = 0;
        self.sel = false;
    }

    /// Host side: set the pressed buttons of pad `index`.
    pub fn set_pad(&mut self, index: usize, state: u8) {
        if let Some(pad) = self.pads.get_mut(index) {
            *pad = state;
        }
    }

    pub fn pad(&self, index: usize) -> u8 {
        self.pads.get(index).copied().unwrap_or(0)
    }

    pub fn active_pad(&self) -> usize {
        self.active
    }

    pub fn write(&mut self, value: u8) {
        let sel = value & SEL != 0;
        if sel && !self.sel {
            self.active = (self.active + 1) % MULTITAP_PORTS;
        }
        if value & CLR != 0 {
            self.active = 0;
        }
        self.sel = sel;
        log(LogCategory::Input, LogLevel::Trace, || {
            format!("Joypad write {:02X}, pad {}", value, self.active)
        });
    }

    pub fn read(&self) -> u8 {
        let pressed = !self.pads[self.active];
        let nibble = (if self.sel { pressed >> 4 } else { pressed }) & 0x0F;
        let mut value = nibble | 0x30 | 0x80;
        if self.region == Region::Japan {
            value |= 0x40;
        }
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_pad_reads_all_released() {
        let input = Input::new(Region::Japan);
        assert_eq!(input.read(), 0xFF);
        let export = Input::new(Region::TurboGrafx);
        assert_eq!(export.read(), 0xBF);
    }

    #[test]
    fn test_nibble_select() {
        let mut input = Input::new(Region::Japan);
        input.set_pad(0, buttons::RUN | buttons::LEFT);
        input.set_pad(1, buttons::I);

        // Rising SEL steps to pad 1; CLR rewinds to pad 0.
        input.write(SEL | CLR);
        assert_eq!(input.active_pad(), 0);
        assert_eq!(input.read() & 0x0F, 0x07);
        input.write(CLR);
        assert_eq!(input.read() & 0x0F, !buttons::RUN & 0x0F);

        input.write(SEL);
        assert_eq!(input.active_pad(), 1);
        assert_eq!(input.read() & 0x0F, 0x0F);
        input.write(0);
        assert_eq!(input.read() & 0x0F, 0x0E);
    }

    #[test]
    fn test_multitap_wraps() {
        let mut input = Input::new(Region::Japan);
        for _ in 0..MULTITAP_PORTS {
            input.write(SEL);
            input.write(0);
        }
        assert_eq!(input.active_pad(), 0);
        input.set_pad(PAD_SLOTS, 0xFF);
        assert_eq!(input.pad(PAD_SLOTS), 0);
    }

    #[test]
    fn test_all_eight_pad_slots_hold_state() {
        let mut input = Input::new(Region::Japan);
        for index in 0..PAD_SLOTS {
            input.set_pad(index, index as u8 + 1);
        }
        input.set_pad(7, 0xFF);
        assert_eq!(input.pad(7), 0xFF);
        assert_eq!(input.pad(5), 6);

        // Slots past the multitap are never scanned.
        for _ in 0..MULTITAP_PORTS - 1 {
            input.write(SEL);
            input.write(0);
        }
        assert_eq!(input.active_pad(), 4);
        input.write(SEL);
        assert_eq!(input.active_pad(), 0);
    }
}
