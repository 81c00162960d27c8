//! Interrupt controller
//!
//! Three request lines feed the CPU. The status register records which lines
//! are raised; the mask register disables delivery per line (a set bit
//! masks). The CPU core polls [`InterruptController::pending`] at instruction
//! boundaries.
//!
//! ## Lines
//!
//! - Bit 0: IRQ2, external / CD-ROM
//! - Bit 1: IRQ1, VDC
//! - Bit 2: TIQ, timer

use emu_core::logging::{log, LogCategory, LogLevel};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IrqSource {
    External,
    Vdc,
    Timer,
}

impl IrqSource {
    pub fn bit(self) -> u8 {
        match self {
            IrqSource::External => 0x01,
            IrqSource::Vdc => 0x02,
            IrqSource::Timer => 0x04,
        }
    }
}

pub const IRQ_LINES_MASK: u8 = 0x07;

#[derive(Debug, Default)]
pub struct InterruptController {
    status: u8,
    mask: u8,
}

impl InterruptController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn raise(&mut self, source: IrqSource) {
        if self.status & source.bit() == 0 {
            log(LogCategory::Interrupts, LogLevel::Trace, || {
                format!("IRQ raised: {:?}", source)
            });
        }
        self.status |= source.bit();
    }

    pub fn clear(&mut self, source: IrqSource) {
        self.status &= !source.bit();
    }

    /// Raise or clear `source` to match `level`.
    pub fn set_line(&mut self, source: IrqSource, level: bool) {
        if level {
            self.raise(source);
        } else {
            self.clear(source);
        }
    }

    pub fn set_mask(&mut self, value: u8) {
        self.mask = value & IRQ_LINES_MASK;
    }

    pub fn mask(&self) -> u8 {
        self.mask
    }

    pub fn status(&self) -> u8 {
        self.status
    }

    /// Raised and unmasked lines.
    pub fn pending(&self) -> u8 {
        self.status & !self.mask
    }

    pub fn is_pending(&self, source: IrqSource) -> bool {
        self.pending() & source.bit() != 0
    }
}
