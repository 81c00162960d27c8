//! Address-space mapper: the eight MMR slot registers.
//!
//! The 64 KiB logical space is cut into eight 8 KiB slots; `addr >> 13`
//! picks the slot and `MMR[slot]` picks which of the 256 banks is visible
//! there. Each slot caches a read and a write page descriptor resolved from
//! the bank table, so a bus access is one array lookup plus one index.
//!
//! The cached pages are only ever written by [`Mapper::set_bank`] (and
//! [`Mapper::refresh`]), which always recomputes both sides together.

use crate::bank_table::{BankTable, BankTarget};
use crate::memory::{RegionId, IO_TRAP_OFFSET};
use emu_core::logging::{log, LogCategory, LogLevel};

pub const SLOT_COUNT: usize = 8;
pub const SLOT_SHIFT: u32 = 13;

/// MMR contents after power-on: I/O at $0000, RAM at $2000, ROM bank 0
/// everywhere else (so the vectors at $FFF6-$FFFF come from bank 0).
pub const POWER_ON_BANKS: [u8; SLOT_COUNT] = [0xFF, 0xF8, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];

/// Resolved view of one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    /// `region[base + (addr & mask)]`
    Flat {
        region: RegionId,
        base: usize,
        mask: usize,
    },
    /// The slot shows the hardware page.
    Io,
}

impl Page {
    fn from_target(target: BankTarget) -> Self {
        match target {
            BankTarget::Flat {
                region,
                offset,
                mask,
            } => Page::Flat {
                region,
                base: offset,
                mask,
            },
            BankTarget::Io => Page::Io,
        }
    }

    /// Region index for `addr`, ignoring the I/O sentinel: an I/O slot
    /// resolves into the sink's trap area. Word accesses use this.
    #[inline]
    pub fn raw_index(self, addr: u16) -> (RegionId, usize) {
        match self {
            Page::Flat { region, base, mask } => (region, base + (addr as usize & mask)),
            Page::Io => (RegionId::Sink, IO_TRAP_OFFSET + (addr as usize & 0x1FFF)),
        }
    }
}

pub struct Mapper {
    mmr: [u8; SLOT_COUNT],
    read_pages: [Page; SLOT_COUNT],
    write_pages: [Page; SLOT_COUNT],
}

impl Mapper {
    pub fn new(table: &BankTable) -> Self {
        let mut mapper = Self {
            mmr: [0; SLOT_COUNT],
            read_pages: [Page::Io; SLOT_COUNT],
            write_pages: [Page::Io; SLOT_COUNT],
        };
        mapper.power_on(table);
        mapper
    }

    /// Load [`POWER_ON_BANKS`] into every slot.
    pub fn power_on(&mut self, table: &BankTable) {
        for (slot, &bank) in POWER_ON_BANKS.iter().enumerate() {
            self.set_bank(table, slot, bank);
        }
    }

    /// Select `bank` for `slot` (0-7, higher bits ignored).
    pub fn set_bank(&mut self, table: &BankTable, slot: usize, bank: u8) {
        let slot = slot & (SLOT_COUNT - 1);
        log(LogCategory::Mapper, LogLevel::Trace, || {
            format!("MMR[{}] = {:02X}", slot, bank)
        });
        self.mmr[slot] = bank;
        self.read_pages[slot] = Page::from_target(table.read_target(bank));
        self.write_pages[slot] = Page::from_target(table.write_target(bank));
    }

    /// Re-resolve every slot after the bank table itself changed.
    pub fn refresh(&mut self, table: &BankTable) {
        for slot in 0..SLOT_COUNT {
            self.set_bank(table, slot, self.mmr[slot]);
        }
    }

    #[inline]
    pub fn slot_of(addr: u16) -> usize {
        (addr >> SLOT_SHIFT) as usize
    }

    #[inline]
    pub fn read_page(&self, addr: u16) -> Page {
        self.read_pages[Self::slot_of(addr)]
    }

    #[inline]
    pub fn write_page(&self, addr: u16) -> Page {
        self.write_pages[Self::slot_of(addr)]
    }

    pub fn bank(&self, slot: usize) -> u8 {
        self.mmr[slot & (SLOT_COUNT - 1)]
    }

    pub fn mmr(&self) -> [u8; SLOT_COUNT] {
        self.mmr
    }

    pub fn pages(&self, slot: usize) -> (Page, Page) {
        let slot = slot & (SLOT_COUNT - 1);
        (self.read_pages[slot], self.write_pages[slot])
    }
}
