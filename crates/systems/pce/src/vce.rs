//! HuC6260 video color encoder: 512 palette entries of 9-bit GRB color.
//!
//! Entries 0-255 are background palettes, 256-511 sprite palettes. The CPU
//! selects an entry through the index ports, then streams color words
//! through the data ports; the index advances after each high-byte access.

use emu_core::logging::{log, LogCategory, LogLevel};

pub const PALETTE_ENTRIES: usize = 512;
const INDEX_MASK: u16 = 0x01FF;

/// Pixel clock selected by control bits 0-1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DotClock {
    Mhz5,
    Mhz7,
    Mhz10,
}

pub struct Vce {
    palette: [u16; PALETTE_ENTRIES],
    index: u16,
    control: u8,
}

impl Vce {
    pub fn new() -> Self {
        Self {
            palette: [0; PALETTE_ENTRIES],
            index: 0,
            control: 0,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn write_control(&mut self, value: u8) {
        self.control = value;
        log(LogCategory::Video, LogLevel::Trace, || {
            format!("VCE control = {:02X}", value)
        });
    }

    pub fn control(&self) -> u8 {
        self.control
    }

    pub fn dot_clock(&self) -> DotClock {
        match self.control & 0x03 {
            0 => DotClock::Mhz5,
            1 => DotClock::Mhz7,
            _ => DotClock::Mhz10,
        }
    }

    pub fn write_index_low(&mut self, value: u8) {
        self.index = (self.index & 0x0100) | value as u16;
    }

    pub fn write_index_high(&mut self, value: u8) {
        self.index = (self.index & 0x00FF) | (((value & 0x01) as u16) << 8);
    }

    pub fn index(&self) -> u16 {
        self.index
    }

    pub fn write_data_low(&mut self, value: u8) {
        let entry = &mut self.palette[self.index as usize];
        *entry = (*entry & 0x0100) | value as u16;
    }

    pub fn write_data_high(&mut self, value: u8) {
        let entry = &mut self.palette[self.index as usize];
        *entry = (*entry & 0x00FF) | (((value & 0x01) as u16) << 8);
        self.advance();
    }

    pub fn read_data_low(&self) -> u8 {
        self.palette[self.index as usize] as u8
    }

    /// Only bit 0 is backed; the rest read as ones.
    pub fn read_data_high(&mut self) -> u8 {
        let value = ((self.palette[self.index as usize] >> 8) as u8) | 0xFE;
        self.advance();
        value
    }

    fn advance(&mut self) {
        self.index = (self.index + 1) & INDEX_MASK;
    }

    pub fn palette(&self) -> &[u16; PALETTE_ENTRIES] {
        &self.palette
    }

    pub fn entry(&self, index: usize) -> u16 {
        self.palette[index & (PALETTE_ENTRIES - 1)]
    }

    /// Expand entry `index` to 8-bit-per-channel RGB.
    pub fn rgb(&self, index: usize) -> (u8, u8, u8) {
        let c = self.entry(index);
        let expand = |v: u16| ((v & 0x07) * 255 / 7) as u8;
        (expand(c >> 3), expand(c >> 6), expand(c))
    }
}

impl Default for Vce {
    fn default() -> Self {
        Self::new()
    }
}
