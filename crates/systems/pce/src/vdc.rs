//! HuC6270 video display controller register model.
//!
//! The CPU sees the VDC through three ports in the hardware page: a register
//! select port and a two-byte data port. The frame renderer reads the
//! register file, the status latch and sprite RAM once per scanline.
//!
//! ## Registers
//!
//! | Index | Name | Purpose                                   |
//! |-------|------|-------------------------------------------|
//! | $00   | MAWR | VRAM write address                        |
//! | $01   | MARR | VRAM read address                         |
//! | $02   | VWR  | VRAM data (VRR when read)                 |
//! | $05   | CR   | Control: IRQ enables, display, increment  |
//! | $06   | RCR  | Raster compare                            |
//! | $07   | BXR  | Background X scroll                       |
//! | $08   | BYR  | Background Y scroll                       |
//! | $09   | MWR  | Memory width                              |
//! | $0A   | HSR  | Horizontal sync                           |
//! | $0B   | HDR  | Horizontal display                        |
//! | $0C   | VPR  | Vertical sync (high = VDS, low = VSW)     |
//! | $0D   | VDW  | Vertical display width                    |
//! | $0E   | VCR  | Vertical display end                      |
//! | $0F   | DCR  | DMA control                               |
//! | $10   | SOUR | VRAM DMA source                           |
//! | $11   | DESR | VRAM DMA destination                      |
//! | $12   | LENR | VRAM DMA length                           |
//! | $13   | SATB | Sprite attribute table address            |
//!
//! ## Status latch
//!
//! Bits 0-6: collision, sprite overflow, raster match, SATB DMA done, VRAM
//! DMA done, vertical blank, DMA busy. The renderer sets them through
//! [`Vdc::raise`]; reading the status port returns the latch and clears it.
//!
//! ## VRAM addressing
//!
//! VRAM holds 32 K words (64 KiB). MAWR/MARR are word addresses. Every
//! committing data access (the high byte) steps the address register by
//! 1, 32, 64 or 128 words depending on CR bits 11-12.

use emu_core::logging::{log, LogCategory, LogLevel};

pub const VDC_REGISTER_COUNT: usize = 32;

pub const MAWR: usize = 0x00;
pub const MARR: usize = 0x01;
pub const VWR: usize = 0x02;
pub const VRR: usize = 0x02;
pub const CR: usize = 0x05;
pub const RCR: usize = 0x06;
pub const BXR: usize = 0x07;
pub const BYR: usize = 0x08;
pub const MWR: usize = 0x09;
pub const HSR: usize = 0x0A;
pub const HDR: usize = 0x0B;
pub const VPR: usize = 0x0C;
pub const VDW: usize = 0x0D;
pub const VCR: usize = 0x0E;
pub const DCR: usize = 0x0F;
pub const SOUR: usize = 0x10;
pub const DESR: usize = 0x11;
pub const LENR: usize = 0x12;
pub const SATB: usize = 0x13;

pub const STATUS_BUSY: u8 = 0x40;
pub const VRAM_INCREMENTS: [u16; 4] = [1, 32, 64, 128];
pub const SPRITE_RAM_WORDS: usize = 64 * 4;
pub const IRQ_QUEUE_DEPTH: usize = 4;

const CR_SPRITES_ON: u16 = 0x0040;
const CR_BACKGROUND_ON: u16 = 0x0080;
const DCR_SATB_DONE_IRQ: u16 = 0x0001;
const DCR_VRAM_DONE_IRQ: u16 = 0x0002;
const DCR_SOURCE_DECREMENT: u16 = 0x0004;
const DCR_DEST_DECREMENT: u16 = 0x0008;
const DCR_SATB_AUTO_REPEAT: u16 = 0x0010;

/// Interrupt-capable VDC events. The discriminant is the status bit
/// position and doubles as the 4-bit event code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum VdcEvent {
    SpriteCollision = 0,
    SpriteOverflow = 1,
    RasterMatch = 2,
    SatbDmaDone = 3,
    VramDmaDone = 4,
    VBlank = 5,
}

impl VdcEvent {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn status_bit(self) -> u8 {
        1 << (self as u8)
    }
}

/// Pending VDC interrupts: a bounded stack, newest popped first. Pushing
/// onto a full stack drops the oldest entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IrqQueue {
    events: [VdcEvent; IRQ_QUEUE_DEPTH],
    len: usize,
}

impl IrqQueue {
    pub fn new() -> Self {
        Self {
            events: [VdcEvent::VBlank; IRQ_QUEUE_DEPTH],
            len: 0,
        }
    }

    pub fn push(&mut self, event: VdcEvent) {
        if self.len == IRQ_QUEUE_DEPTH {
            self.events.copy_within(1.., 0);
            self.len -= 1;
        }
        self.events[self.len] = event;
        self.len += 1;
    }

    pub fn pop(&mut self) -> Option<VdcEvent> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        Some(self.events[self.len])
    }

    pub fn peek(&self) -> Option<VdcEvent> {
        self.len.checked_sub(1).map(|top| self.events[top])
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Default for IrqQueue {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Vdc {
    regs: [u16; VDC_REGISTER_COUNT],
    selected: u8,
    status: u8,
    irq_queue: IrqQueue,
    satb_pending: bool,
    mode_change_pending: bool,
    sprite_ram: [u16; SPRITE_RAM_WORDS],
}

impl Vdc {
    pub fn new() -> Self {
        Self {
            regs: [0; VDC_REGISTER_COUNT],
            selected: 0,
            status: 0,
            irq_queue: IrqQueue::new(),
            satb_pending: false,
            mode_change_pending: false,
            sprite_ram: [0; SPRITE_RAM_WORDS],
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Register select port write; only the low 5 bits are decoded.
    pub fn select_register(&mut self, value: u8) {
        self.selected = value & 0x1F;
    }

    pub fn selected_register(&self) -> usize {
        self.selected as usize
    }

    pub fn register(&self, index: usize) -> u16 {
        self.regs[index & (VDC_REGISTER_COUNT - 1)]
    }

    pub fn registers(&self) -> &[u16; VDC_REGISTER_COUNT] {
        &self.regs
    }

    /// Current latch without side effects.
    pub fn status(&self) -> u8 {
        self.status
    }

    /// Status port read: returns the latch and clears it.
    pub fn read_status(&mut self) -> u8 {
        std::mem::take(&mut self.status)
    }

    pub fn set_busy(&mut self, busy: bool) {
        if busy {
            self.status |= STATUS_BUSY;
        } else {
            self.status &= !STATUS_BUSY;
        }
    }

    /// Step applied to MAWR/MARR after each committing data access.
    pub fn vram_increment(&self) -> u16 {
        VRAM_INCREMENTS[((self.regs[CR] >> 11) & 0x03) as usize]
    }

    pub fn write_data_low(&mut self, value: u8) {
        let reg = self.selected as usize;
        self.regs[reg] = (self.regs[reg] & 0xFF00) | value as u16;
        self.note_geometry_write(reg);
    }

    /// High-byte data port write. Returns true if it queued an interrupt
    /// (VRAM DMA completion).
    pub fn write_data_high(&mut self, value: u8, vram: &mut [u8]) -> bool {
        let reg = self.selected as usize;
        self.regs[reg] = (self.regs[reg] & 0x00FF) | ((value as u16) << 8);
        match reg {
            VWR => {
                let addr = self.regs[MAWR];
                write_vram_word(vram, addr, self.regs[VWR]);
                self.regs[MAWR] = addr.wrapping_add(self.vram_increment());
            }
            LENR => return self.run_vram_dma(vram),
            SATB => {
                self.satb_pending = true;
                log(LogCategory::Video, LogLevel::Trace, || {
                    format!("SATB DMA scheduled from {:04X}", self.regs[SATB])
                });
            }
            _ => self.note_geometry_write(reg),
        }
        false
    }

    pub fn read_data_low(&self, vram: &[u8]) -> u8 {
        match self.selected as usize {
            VRR => read_vram_word(vram, self.regs[MARR]) as u8,
            reg => self.regs[reg] as u8,
        }
    }

    pub fn read_data_high(&mut self, vram: &[u8]) -> u8 {
        match self.selected as usize {
            VRR => {
                let addr = self.regs[MARR];
                self.regs[MARR] = addr.wrapping_add(self.vram_increment());
                (read_vram_word(vram, addr) >> 8) as u8
            }
            reg => (self.regs[reg] >> 8) as u8,
        }
    }

    fn note_geometry_write(&mut self, reg: usize) {
        if matches!(reg, MWR | HSR | HDR | VPR | VDW | VCR) {
            self.mode_change_pending = true;
        }
    }

    /// Whether the interrupt enable bit for `event` is set.
    pub fn event_enabled(&self, event: VdcEvent) -> bool {
        match event {
            VdcEvent::SpriteCollision => self.regs[CR] & 0x01 != 0,
            VdcEvent::SpriteOverflow => self.regs[CR] & 0x02 != 0,
            VdcEvent::RasterMatch => self.regs[CR] & 0x04 != 0,
            VdcEvent::VBlank => self.regs[CR] & 0x08 != 0,
            VdcEvent::SatbDmaDone => self.regs[DCR] & DCR_SATB_DONE_IRQ != 0,
            VdcEvent::VramDmaDone => self.regs[DCR] & DCR_VRAM_DONE_IRQ != 0,
        }
    }

    /// Latch `event` in the status register and queue it if its interrupt is
    /// enabled. Returns whether an interrupt was queued.
    pub fn raise(&mut self, event: VdcEvent) -> bool {
        self.status |= event.status_bit();
        if !self.event_enabled(event) {
            return false;
        }
        self.irq_queue.push(event);
        true
    }

    pub fn pop_event(&mut self) -> Option<VdcEvent> {
        self.irq_queue.pop()
    }

    pub fn has_pending_event(&self) -> bool {
        !self.irq_queue.is_empty()
    }

    pub fn irq_queue(&self) -> &IrqQueue {
        &self.irq_queue
    }

    pub fn satb_pending(&self) -> bool {
        self.satb_pending
    }

    pub fn mode_change_pending(&self) -> bool {
        self.mode_change_pending
    }

    /// Consume the one-shot display-mode-change flag.
    pub fn take_mode_change(&mut self) -> bool {
        std::mem::take(&mut self.mode_change_pending)
    }

    /// Copy LENR+1 words from SOUR to DESR, honouring the DCR direction bits.
    fn run_vram_dma(&mut self, vram: &mut [u8]) -> bool {
        let dcr = self.regs[DCR];
        let src_step: u16 = if dcr & DCR_SOURCE_DECREMENT != 0 { 0xFFFF } else { 1 };
        let dst_step: u16 = if dcr & DCR_DEST_DECREMENT != 0 { 0xFFFF } else { 1 };
        let words = self.regs[LENR] as u32 + 1;
        let mut src = self.regs[SOUR];
        let mut dst = self.regs[DESR];

        log(LogCategory::Video, LogLevel::Debug, || {
            format!("VRAM DMA {:04X} -> {:04X}, {} words", src, dst, words)
        });

        for _ in 0..words {
            let word = read_vram_word(vram, src);
            write_vram_word(vram, dst, word);
            src = src.wrapping_add(src_step);
            dst = dst.wrapping_add(dst_step);
        }
        self.regs[SOUR] = src;
        self.regs[DESR] = dst;
        self.raise(VdcEvent::VramDmaDone)
    }

    /// Vertical-blank hook for the renderer: performs the VRAM-to-SATB
    /// transfer if one was scheduled (or auto-repeat is on). Returns whether
    /// the completion interrupt was queued.
    pub fn service_satb_dma(&mut self, vram: &[u8]) -> bool {
        if !self.satb_pending && self.regs[DCR] & DCR_SATB_AUTO_REPEAT == 0 {
            return false;
        }
        self.satb_pending = false;
        let base = self.regs[SATB];
        for (i, slot) in self.sprite_ram.iter_mut().enumerate() {
            *slot = read_vram_word(vram, base.wrapping_add(i as u16));
        }
        self.raise(VdcEvent::SatbDmaDone)
    }

    pub fn sprite_ram(&self) -> &[u16; SPRITE_RAM_WORDS] {
        &self.sprite_ram
    }

    /// First active display line: VDS + VSW.
    pub fn min_line(&self) -> u16 {
        let vpr = self.regs[VPR];
        (vpr >> 8) + (vpr & 0x00FF)
    }

    pub fn max_line(&self) -> u16 {
        self.min_line().wrapping_add(self.regs[VDW])
    }

    pub fn screen_width(&self) -> u16 {
        ((self.regs[HDR] & 0x00FF) + 1) * 8
    }

    pub fn screen_height(&self) -> u16 {
        self.regs[VDW].wrapping_add(1)
    }

    pub fn sprites_enabled(&self) -> bool {
        self.regs[CR] & CR_SPRITES_ON != 0
    }

    pub fn background_enabled(&self) -> bool {
        self.regs[CR] & CR_BACKGROUND_ON != 0
    }
}

impl Default for Vdc {
    fn default() -> Self {
        Self::new()
    }
}

fn vram_byte_index(word_addr: u16) -> usize {
    ((word_addr & 0x7FFF) as usize) * 2
}

/// Read a VRAM word; `vram` must hold at least 64 KiB.
pub fn read_vram_word(vram: &[u8], word_addr: u16) -> u16 {
    let i = vram_byte_index(word_addr);
    u16::from_le_bytes([vram[i], vram[i + 1]])
}

pub fn write_vram_word(vram: &mut [u8], word_addr: u16, value: u16) {
    let i = vram_byte_index(word_addr);
    vram[i..i + 2].copy_from_slice(&value.to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vram() -> Vec<u8> {
        vec![0; 0x10000]
    }

    fn write_reg(vdc: &mut Vdc, vram: &mut [u8], reg: u8, value: u16) {
        vdc.select_register(reg);
        vdc.write_data_low(value as u8);
        vdc.write_data_high((value >> 8) as u8, vram);
    }

    #[test]
    fn test_vram_write_auto_increment() {
        for (field, step) in VRAM_INCREMENTS.iter().copied().enumerate() {
            let mut vdc = Vdc::new();
            let mut vram = vram();
            write_reg(&mut vdc, &mut vram, CR as u8, (field as u16) << 11);
            write_reg(&mut vdc, &mut vram, MAWR as u8, 0x0100);

            vdc.select_register(VWR as u8);
            for n in 0..10u16 {
                vdc.write_data_low(n as u8);
                vdc.write_data_high(0xA0, &mut vram);
            }
            assert_eq!(vdc.register(MAWR), 0x0100 + 10 * step);
            assert_eq!(read_vram_word(&vram, 0x0100), 0xA000);
            assert_eq!(read_vram_word(&vram, 0x0100 + step), 0xA001);
        }
    }

    #[test]
    fn test_vram_read_auto_increment() {
        let mut vdc = Vdc::new();
        let mut vram = vram();
        write_vram_word(&mut vram, 0x0200, 0x1234);
        write_vram_word(&mut vram, 0x0220, 0x5678);
        write_reg(&mut vdc, &mut vram, CR as u8, 1 << 11);
        write_reg(&mut vdc, &mut vram, MARR as u8, 0x0200);

        vdc.select_register(VRR as u8);
        assert_eq!(vdc.read_data_low(&vram), 0x34);
        assert_eq!(vdc.read_data_high(&vram), 0x12);
        assert_eq!(vdc.register(MARR), 0x0220);
        assert_eq!(vdc.read_data_low(&vram), 0x78);
        assert_eq!(vdc.read_data_high(&vram), 0x56);
    }

    #[test]
    fn test_status_clear_on_read() {
        let mut vdc = Vdc::new();
        vdc.raise(VdcEvent::VBlank);
        vdc.raise(VdcEvent::SpriteCollision);
        vdc.set_busy(true);
        assert_eq!(vdc.read_status(), 0x21 | STATUS_BUSY);
        assert_eq!(vdc.read_status(), 0);
    }

    #[test]
    fn test_raise_respects_enable_bits() {
        let mut vdc = Vdc::new();
        let mut vram = vram();
        assert!(!vdc.raise(VdcEvent::VBlank));
        assert!(!vdc.has_pending_event());
        assert_eq!(vdc.status(), 0x20);

        write_reg(&mut vdc, &mut vram, CR as u8, 0x0008);
        assert!(vdc.raise(VdcEvent::VBlank));
        assert_eq!(vdc.pop_event(), Some(VdcEvent::VBlank));
        assert_eq!(vdc.pop_event(), None);
    }

    #[test]
    fn test_irq_queue_is_bounded_lifo() {
        let mut q = IrqQueue::new();
        q.push(VdcEvent::SpriteCollision);
        q.push(VdcEvent::SpriteOverflow);
        q.push(VdcEvent::RasterMatch);
        q.push(VdcEvent::SatbDmaDone);
        q.push(VdcEvent::VBlank);
        assert_eq!(q.len(), IRQ_QUEUE_DEPTH);
        assert_eq!(q.peek(), Some(VdcEvent::VBlank));
        assert_eq!(q.pop(), Some(VdcEvent::VBlank));
        assert_eq!(q.pop(), Some(VdcEvent::SatbDmaDone));
        assert_eq!(q.pop(), Some(VdcEvent::RasterMatch));
        assert_eq!(q.pop(), Some(VdcEvent::SpriteOverflow));
        assert_eq!(q.pop(), None);
    }

    #[test]
    fn test_display_window_bounds() {
        let mut vdc = Vdc::new();
        let mut vram = vram();
        write_reg(&mut vdc, &mut vram, VPR as u8, 0x0F02);
        write_reg(&mut vdc, &mut vram, VDW as u8, 0x00EF);
        write_reg(&mut vdc, &mut vram, HDR as u8, 0x001F);
        assert_eq!(vdc.min_line(), 0x11);
        assert_eq!(vdc.max_line(), 0x11 + 0xEF);
        assert_eq!(vdc.screen_height(), 240);
        assert_eq!(vdc.screen_width(), 256);
        assert!(vdc.take_mode_change());
        assert!(!vdc.take_mode_change());
    }

    #[test]
    fn test_vram_dma_copies_and_signals() {
        let mut vdc = Vdc::new();
        let mut vram = vram();
        for i in 0..4u16 {
            write_vram_word(&mut vram, 0x1000 + i, 0x0100 + i);
        }
        write_reg(&mut vdc, &mut vram, DCR as u8, DCR_VRAM_DONE_IRQ);
        write_reg(&mut vdc, &mut vram, SOUR as u8, 0x1000);
        write_reg(&mut vdc, &mut vram, DESR as u8, 0x2000);
        write_reg(&mut vdc, &mut vram, LENR as u8, 3);

        for i in 0..4u16 {
            assert_eq!(read_vram_word(&vram, 0x2000 + i), 0x0100 + i);
        }
        assert_eq!(vdc.register(SOUR), 0x1004);
        assert_eq!(vdc.register(DESR), 0x2004);
        assert_eq!(vdc.status() & VdcEvent::VramDmaDone.status_bit(), 0x10);
        assert_eq!(vdc.pop_event(), Some(VdcEvent::VramDmaDone));
    }

    #[test]
    fn test_satb_dma_on_vblank() {
        let mut vdc = Vdc::new();
        let mut vram = vram();
        write_vram_word(&mut vram, 0x7F00, 0xCAFE);
        write_vram_word(&mut vram, 0x7FFF, 0xBEEF);

        assert!(!vdc.service_satb_dma(&vram));

        write_reg(&mut vdc, &mut vram, SATB as u8, 0x7F00);
        assert!(vdc.satb_pending());
        // SATB-done IRQ disabled: transfer happens, nothing queued.
        assert!(!vdc.service_satb_dma(&vram));
        assert!(!vdc.satb_pending());
        assert_eq!(vdc.sprite_ram()[0], 0xCAFE);
        assert_eq!(vdc.sprite_ram()[0xFF], 0xBEEF);
        assert_eq!(vdc.status() & 0x08, 0x08);
    }
}
