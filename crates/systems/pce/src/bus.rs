//! PC Engine system bus
//!
//! The bus owns every memory region and peripheral of the machine. The CPU
//! sees a 64 KiB logical space split into eight 8 KiB slots; the MMR
//! registers choose which of 256 banks each slot shows (see [`crate::mapper`]).
//! Bank `$FF` is the hardware page, decoded by offset:
//!
//! | Offset        | Device                                 |
//! |---------------|----------------------------------------|
//! | `$0000-$03FF` | VDC (status/select, data low/high)     |
//! | `$0400-$07FF` | VCE (control, index, data)             |
//! | `$0800-$0BFF` | PSG (write-only)                       |
//! | `$0C00-$0FFF` | Timer (counter/reload, control)        |
//! | `$1000-$13FF` | Joypad                                 |
//! | `$1400-$17FF` | Interrupt controller (mask, status)    |
//! | `$1800-$1FFF` | CD-ROM / expansion (not emulated)      |
//!
//! Every access to the hardware page updates the I/O buffer: the last value
//! seen on the internal data bus. Write-only and unconnected ports read back
//! that value.
//!
//! # Word access
//!
//! `read_word`/`write_word` resolve the slot once and take both bytes from
//! that region without checking for the hardware page. A word access aimed
//! at an I/O slot touches the sink's trap area and never reaches a device.

use crate::bank_table::{BankTable, CartridgeLayout};
use crate::config::{CartridgeInfo, PceConfig};
use crate::input::Input;
use crate::interrupt::{InterruptController, IrqSource};
use crate::mapper::{Mapper, Page, SLOT_COUNT};
use crate::memory::{Memory, RegionId};
use crate::psg::Psg;
use crate::system::PceError;
use crate::timer::Timer;
use crate::vce::Vce;
use crate::vdc::{Vdc, VdcEvent};
use emu_core::logging::{log, LogCategory, LogLevel};
use emu_core::Memory16;

const IO_OFFSET_MASK: u16 = 0x1FFF;
const SF2_PORT_MASK: u16 = 0x1FFC;
const SF2_PORT_BASE: u16 = 0x1FF0;

pub struct Bus {
    memory: Memory,
    banks: BankTable,
    mapper: Mapper,
    vdc: Vdc,
    vce: Vce,
    psg: Psg,
    timer: Timer,
    interrupts: InterruptController,
    input: Input,
    io_buffer: u8,
}

impl Bus {
    /// Bind `rom` as described by `cart` and bring the machine to its
    /// power-on state.
    pub fn new(rom: Vec<u8>, cart: &CartridgeInfo, config: &PceConfig) -> Result<Self, PceError> {
        cart.validate(&rom)?;

        let layout = CartridgeLayout {
            rom_blocks: cart.rom_blocks,
            extra_ram_blocks: cart.extra_ram_blocks,
            mirror_rom: config.mirror_rom,
        };
        let banks = BankTable::build(layout);
        let mapper = Mapper::new(&banks);

        log(LogCategory::Bus, LogLevel::Info, || {
            format!(
                "Cartridge bound: {} ROM banks, {} RAM banks{}",
                layout.rom_blocks,
                layout.extra_ram_blocks,
                if banks.has_sf2_mapper() {
                    ", SF2 mapper"
                } else {
                    ""
                }
            )
        });

        Ok(Self {
            memory: Memory::new(rom, cart.extra_ram_blocks),
            banks,
            mapper,
            vdc: Vdc::new(),
            vce: Vce::new(),
            psg: Psg::new(),
            timer: Timer::with_tick_cycles(config.timer_tick_cycles),
            interrupts: InterruptController::new(),
            input: Input::new(config.region),
            io_buffer: 0,
        })
    }

    /// Power-on reset. Backup RAM and the host's pad states survive.
    pub fn reset(&mut self) {
        self.memory.clear_volatile();
        self.banks = BankTable::build(self.banks.layout());
        self.mapper.power_on(&self.banks);
        self.vdc.reset();
        self.vce.reset();
        self.psg.reset();
        self.timer.reset();
        self.interrupts.reset();
        self.input.reset();
        self.io_buffer = 0;
    }

    // Logical address space

    pub fn read(&mut self, addr: u16) -> u8 {
        match self.mapper.read_page(addr) {
            Page::Flat { region, base, mask } => {
                self.memory.peek(region, base + (addr as usize & mask))
            }
            Page::Io => self.read_io(addr & IO_OFFSET_MASK),
        }
    }

    pub fn write(&mut self, addr: u16, value: u8) {
        match self.mapper.write_page(addr) {
            Page::Flat { region, base, mask } => {
                if self.banks.has_sf2_mapper() {
                    self.check_sf2_port(addr, value);
                }
                self.memory
                    .poke(region, base + (addr as usize & mask), value);
            }
            Page::Io => self.write_io(addr & IO_OFFSET_MASK, value),
        }
    }

    pub fn read_word(&mut self, addr: u16) -> u16 {
        let (region, index) = self.mapper.read_page(addr).raw_index(addr);
        let lo = self.memory.peek(region, index);
        let hi = self.memory.peek(region, index + 1);
        u16::from_le_bytes([lo, hi])
    }

    pub fn write_word(&mut self, addr: u16, value: u16) {
        let (region, index) = self.mapper.write_page(addr).raw_index(addr);
        let [lo, hi] = value.to_le_bytes();
        self.memory.poke(region, index, lo);
        self.memory.poke(region, index + 1, hi);
    }

    /// Select bank `bank` for slot `slot` (TAM).
    pub fn set_bank(&mut self, slot: usize, bank: u8) {
        self.mapper.set_bank(&self.banks, slot, bank);
    }

    /// Current MMR contents (TMA).
    pub fn mmr(&self) -> [u8; SLOT_COUNT] {
        self.mapper.mmr()
    }

    fn check_sf2_port(&mut self, addr: u16, value: u8) {
        if addr & SF2_PORT_MASK != SF2_PORT_BASE {
            return;
        }
        if !matches!(
            self.mapper.read_page(addr),
            Page::Flat {
                region: RegionId::Rom,
                ..
            }
        ) {
            return;
        }
        let page = (addr & 0x03) as u8;
        log(LogCategory::Mapper, LogLevel::Debug, || {
            format!("SF2 page {} selected (write {:02X})", page, value)
        });
        self.banks.select_sf2_page(page);
        self.mapper.refresh(&self.banks);
    }

    // Hardware page

    fn read_io(&mut self, offset: u16) -> u8 {
        let value = match offset >> 10 {
            0 => self.read_vdc(offset),
            1 => self.read_vce(offset),
            2 => self.io_buffer,
            3 => self.read_timer(offset),
            4 => self.input.read(),
            5 => self.read_irq(offset),
            _ => {
                log(LogCategory::Stubs, LogLevel::Debug, || {
                    format!("Read from unimplemented port {:04X}", offset)
                });
                self.io_buffer
            }
        };
        self.io_buffer = value;
        value
    }

    fn write_io(&mut self, offset: u16, value: u8) {
        self.io_buffer = value;
        match offset >> 10 {
            0 => self.write_vdc(offset, value),
            1 => self.write_vce(offset, value),
            2 => self.psg.write(offset, value),
            3 => self.write_timer(offset, value),
            4 => self.input.write(value),
            5 => self.write_irq(offset, value),
            _ => log(LogCategory::Stubs, LogLevel::Debug, || {
                format!("Write to unimplemented port {:04X} = {:02X}", offset, value)
            }),
        }
    }

    fn read_vdc(&mut self, offset: u16) -> u8 {
        match offset & 0x03 {
            0 => {
                let status = self.vdc.read_status();
                self.interrupts.clear(IrqSource::Vdc);
                status
            }
            2 => self.vdc.read_data_low(self.memory.vram()),
            3 => self.vdc.read_data_high(self.memory.vram()),
            _ => self.io_buffer,
        }
    }

    fn write_vdc(&mut self, offset: u16, value: u8) {
        match offset & 0x03 {
            0 => self.vdc.select_register(value),
            2 => self.vdc.write_data_low(value),
            3 => {
                if self.vdc.write_data_high(value, self.memory.vram_mut()) {
                    self.interrupts.raise(IrqSource::Vdc);
                }
            }
            _ => {}
        }
    }

    fn read_vce(&mut self, offset: u16) -> u8 {
        match offset & 0x07 {
            4 => self.vce.read_data_low(),
            5 => self.vce.read_data_high(),
            _ => self.io_buffer,
        }
    }

    fn write_vce(&mut self, offset: u16, value: u8) {
        match offset & 0x07 {
            0 => self.vce.write_control(value),
            2 => self.vce.write_index_low(value),
            3 => self.vce.write_index_high(value),
            4 => self.vce.write_data_low(value),
            5 => self.vce.write_data_high(value),
            _ => {}
        }
    }

    fn read_timer(&mut self, offset: u16) -> u8 {
        if offset & 0x01 == 0 {
            (self.timer.counter() & 0x7F) | (self.io_buffer & 0x80)
        } else {
            self.timer.running() as u8 | (self.io_buffer & 0xFE)
        }
    }

    fn write_timer(&mut self, offset: u16, value: u8) {
        if offset & 0x01 == 0 {
            self.timer.write_reload(value);
        } else {
            self.timer.write_control(value);
        }
    }

    fn read_irq(&mut self, offset: u16) -> u8 {
        match offset & 0x03 {
            2 => self.interrupts.mask() | (self.io_buffer & 0xF8),
            3 => self.interrupts.status() | (self.io_buffer & 0xF8),
            _ => self.io_buffer,
        }
    }

    fn write_irq(&mut self, offset: u16, value: u8) {
        match offset & 0x03 {
            2 => self.interrupts.set_mask(value),
            3 => self.interrupts.clear(IrqSource::Timer),
            _ => {}
        }
    }

    // Clocking and renderer hooks

    /// Advance the timer by `cycles` CPU cycles.
    pub fn tick(&mut self, cycles: u32) {
        if self.timer.step(cycles) {
            self.interrupts.raise(IrqSource::Timer);
        }
    }

    /// Latch a VDC event; raises IRQ1 when its interrupt is enabled.
    pub fn raise_vdc_event(&mut self, event: VdcEvent) -> bool {
        let queued = self.vdc.raise(event);
        if queued {
            self.interrupts.raise(IrqSource::Vdc);
        }
        queued
    }

    /// Vertical-blank SATB transfer. Returns whether an IRQ was queued.
    pub fn service_satb_dma(&mut self) -> bool {
        let queued = self.vdc.service_satb_dma(self.memory.vram());
        if queued {
            self.interrupts.raise(IrqSource::Vdc);
        }
        queued
    }

    /// Take the newest pending VDC event. IRQ1 drops once none remain.
    pub fn pop_vdc_event(&mut self) -> Option<VdcEvent> {
        let event = self.vdc.pop_event();
        if !self.vdc.has_pending_event() {
            self.interrupts.clear(IrqSource::Vdc);
        }
        event
    }

    pub fn next_dda_sample(&mut self, channel: usize) -> u8 {
        self.psg.next_dda_sample(channel)
    }

    pub fn clock_dda(&mut self, channel: usize, psg_cycles: u32) -> u8 {
        self.psg.clock_dda(channel, psg_cycles)
    }

    pub fn set_pad(&mut self, index: usize, state: u8) {
        self.input.set_pad(index, state);
    }

    // Accessors

    pub fn vdc(&self) -> &Vdc {
        &self.vdc
    }

    pub fn vdc_mut(&mut self) -> &mut Vdc {
        &mut self.vdc
    }

    pub fn vce(&self) -> &Vce {
        &self.vce
    }

    pub fn psg(&self) -> &Psg {
        &self.psg
    }

    pub fn timer(&self) -> &Timer {
        &self.timer
    }

    pub fn interrupts(&self) -> &InterruptController {
        &self.interrupts
    }

    pub fn interrupts_mut(&mut self) -> &mut InterruptController {
        &mut self.interrupts
    }

    pub fn input(&self) -> &Input {
        &self.input
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn vram(&self) -> &[u8] {
        self.memory.vram()
    }

    pub fn backup_ram(&self) -> &[u8] {
        self.memory.backup_ram()
    }

    /// Restore battery-backed RAM from a save file. Extra bytes are ignored.
    pub fn load_backup_ram(&mut self, data: &[u8]) {
        let bram = self.memory.backup_ram_mut();
        let n = data.len().min(bram.len());
        bram[..n].copy_from_slice(&data[..n]);
    }

    pub fn io_buffer(&self) -> u8 {
        self.io_buffer
    }
}

impl Memory16 for Bus {
    fn read(&mut self, addr: u16) -> u8 {
        Bus::read(self, addr)
    }

    fn write(&mut self, addr: u16, val: u8) {
        Bus::write(self, addr, val)
    }

    fn read_word(&mut self, addr: u16) -> u16 {
        Bus::read_word(self, addr)
    }

    fn write_word(&mut self, addr: u16, val: u16) {
        Bus::write_word(self, addr, val)
    }
}
