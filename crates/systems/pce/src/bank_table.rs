//! Global bank table: the 256 bank ids the MMR registers select from.
//!
//! # Bank ids
//!
//! - `$00-$7F`: HuCard ROM, 8 KiB per id (identity up to the image size)
//! - `$40-$40+E`: cartridge RAM when the card declares E banks of it
//! - `$F7`: backup RAM (2 KiB, mirrored through the window)
//! - `$F8`: work RAM, `$F9-$FB` mirror it
//! - `$FF`: hardware I/O page
//!
//! Every other id resolves to the sink so that a stray MMR value traps
//! harmlessly. The table is built once per cartridge and only changes when
//! the Street Fighter II mapper swaps its upper ROM window.

use crate::memory::{RegionId, BACKUP_RAM_SIZE, BANK_SIZE};

pub const BANK_COUNT: usize = 256;
pub const EXTRA_RAM_BANK: u8 = 0x40;
pub const BACKUP_RAM_BANK: u8 = 0xF7;
pub const RAM_BANK: u8 = 0xF8;
pub const RAM_MIRROR_LAST: u8 = 0xFB;
pub const IO_BANK: u8 = 0xFF;

/// ROM ids live below this bound; larger ids never map ROM.
pub const ROM_BANK_LIMIT: usize = 0x80;

/// First id of the window the Street Fighter II mapper swaps.
pub const SF2_WINDOW_FIRST: u8 = 0x40;
pub const SF2_WINDOW_BANKS: usize = 0x40;

const FULL_WINDOW: usize = BANK_SIZE - 1;

/// Where one bank id points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BankTarget {
    /// Flat memory: `region[offset + (addr & mask)]`.
    Flat {
        region: RegionId,
        offset: usize,
        mask: usize,
    },
    /// The hardware page; accesses go to the peripheral dispatcher.
    Io,
}

impl BankTarget {
    const SINK: BankTarget = BankTarget::Flat {
        region: RegionId::Sink,
        offset: 0,
        mask: FULL_WINDOW,
    };

    fn bank(region: RegionId, block: usize) -> Self {
        BankTarget::Flat {
            region,
            offset: block * BANK_SIZE,
            mask: FULL_WINDOW,
        }
    }
}

/// Cartridge metadata the bank table is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartridgeLayout {
    pub rom_blocks: usize,
    pub extra_ram_blocks: usize,
    pub mirror_rom: bool,
}

pub struct BankTable {
    read: [BankTarget; BANK_COUNT],
    write: [BankTarget; BANK_COUNT],
    layout: CartridgeLayout,
}

impl BankTable {
    pub fn build(layout: CartridgeLayout) -> Self {
        let mut table = Self {
            read: [BankTarget::SINK; BANK_COUNT],
            write: [BankTarget::SINK; BANK_COUNT],
            layout,
        };

        for id in 0..ROM_BANK_LIMIT {
            let block = if id < layout.rom_blocks {
                Some(id)
            } else if layout.mirror_rom {
                mirror_rom_bank(id, layout.rom_blocks)
            } else {
                None
            };
            if let Some(block) = block {
                // ROM is read-only; its write side stays on the sink.
                table.read[id] = BankTarget::bank(RegionId::Rom, block);
            }
        }

        let extra_first = EXTRA_RAM_BANK as usize;
        for block in 0..layout.extra_ram_blocks.min(ROM_BANK_LIMIT - extra_first) {
            let target = BankTarget::bank(RegionId::ExtraRam, block);
            table.read[extra_first + block] = target;
            table.write[extra_first + block] = target;
        }

        let bram = BankTarget::Flat {
            region: RegionId::BackupRam,
            offset: 0,
            mask: BACKUP_RAM_SIZE - 1,
        };
        table.read[BACKUP_RAM_BANK as usize] = bram;
        table.write[BACKUP_RAM_BANK as usize] = bram;

        for id in RAM_BANK..=RAM_MIRROR_LAST {
            let ram = BankTarget::bank(RegionId::Ram, 0);
            table.read[id as usize] = ram;
            table.write[id as usize] = ram;
        }

        table.read[IO_BANK as usize] = BankTarget::Io;
        table.write[IO_BANK as usize] = BankTarget::Io;

        table
    }

    #[inline]
    pub fn read_target(&self, bank: u8) -> BankTarget {
        self.read[bank as usize]
    }

    #[inline]
    pub fn write_target(&self, bank: u8) -> BankTarget {
        self.write[bank as usize]
    }

    pub fn layout(&self) -> CartridgeLayout {
        self.layout
    }

    /// Cards with more ROM than the 128 ROM ids can address carry the
    /// Street Fighter II bank-switch port.
    pub fn has_sf2_mapper(&self) -> bool {
        self.layout.rom_blocks > ROM_BANK_LIMIT
    }

    /// Point ids `$40-$7F` at 512 KiB ROM page `page + 1`.
    pub fn select_sf2_page(&mut self, page: u8) {
        let first_block = SF2_WINDOW_BANKS * (page as usize + 1);
        for i in 0..SF2_WINDOW_BANKS {
            let block = first_block + i;
            self.read[SF2_WINDOW_FIRST as usize + i] = if block < self.layout.rom_blocks {
                BankTarget::bank(RegionId::Rom, block)
            } else {
                BankTarget::SINK
            };
        }
    }
}

/// Map a logical ROM bank past the end of the image back into it.
///
/// Power-of-two images mirror by modulo. Other sizes (e.g. 384 KiB = 48
/// banks) split the 128-bank space at bank 64: the lower half mirrors the
/// largest power-of-two prefix, the upper half mirrors the remainder.
pub fn mirror_rom_bank(logical: usize, rom_blocks: usize) -> Option<usize> {
    if rom_blocks == 0 {
        return None;
    }
    if rom_blocks.is_power_of_two() {
        return Some(logical % rom_blocks);
    }
    let lower = rom_blocks.next_power_of_two() >> 1;
    let upper = rom_blocks - lower;
    let bank = logical & 0x7F;
    if bank < 64 {
        Some(bank % lower)
    } else {
        Some((bank - 64) % upper + lower)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(rom_blocks: usize) -> CartridgeLayout {
        CartridgeLayout {
            rom_blocks,
            extra_ram_blocks: 0,
            mirror_rom: false,
        }
    }

    #[test]
    fn test_rom_identity_and_write_protect() {
        let table = BankTable::build(layout(16));
        assert_eq!(
            table.read_target(5),
            BankTarget::Flat {
                region: RegionId::Rom,
                offset: 5 * BANK_SIZE,
                mask: 0x1FFF
            }
        );
        assert_eq!(table.write_target(5), BankTarget::SINK);
    }

    #[test]
    fn test_unmapped_banks_resolve_to_sink() {
        let table = BankTable::build(layout(16));
        for id in [16u8, 0x7F, 0x80, 0xF0, 0xFC, 0xFE] {
            assert_eq!(table.read_target(id), BankTarget::SINK, "bank {id:02X}");
            assert_eq!(table.write_target(id), BankTarget::SINK, "bank {id:02X}");
        }
    }

    #[test]
    fn test_fixed_banks() {
        let table = BankTable::build(layout(4));
        assert_eq!(table.read_target(IO_BANK), BankTarget::Io);
        assert_eq!(table.write_target(IO_BANK), BankTarget::Io);
        for id in RAM_BANK..=RAM_MIRROR_LAST {
            assert_eq!(table.write_target(id), BankTarget::bank(RegionId::Ram, 0));
        }
        match table.read_target(BACKUP_RAM_BANK) {
            BankTarget::Flat { region, mask, .. } => {
                assert_eq!(region, RegionId::BackupRam);
                assert_eq!(mask, 0x7FF);
            }
            BankTarget::Io => panic!("backup RAM mapped as I/O"),
        }
    }

    #[test]
    fn test_every_flat_target_stays_in_bounds() {
        let mut l = layout(48);
        l.extra_ram_blocks = 4;
        l.mirror_rom = true;
        let table = BankTable::build(l);
        let region_len = |r: RegionId| match r {
            RegionId::Rom => 48 * BANK_SIZE,
            RegionId::Ram => 0x2000,
            RegionId::BackupRam => 0x800,
            RegionId::ExtraRam => 4 * BANK_SIZE,
            RegionId::Sink => 0x2004,
        };
        for id in 0..=255u8 {
            for target in [table.read_target(id), table.write_target(id)] {
                if let BankTarget::Flat {
                    region,
                    offset,
                    mask,
                } = target
                {
                    assert!(offset + mask < region_len(region), "bank {id:02X}");
                }
            }
        }
    }

    #[test]
    fn test_extra_ram_overrides_rom() {
        let mut l = layout(0x80);
        l.extra_ram_blocks = 4;
        let table = BankTable::build(l);
        assert_eq!(
            table.read_target(0x41),
            BankTarget::bank(RegionId::ExtraRam, 1)
        );
        assert_eq!(table.write_target(0x43), BankTarget::bank(RegionId::ExtraRam, 3));
        assert_eq!(table.read_target(0x44), BankTarget::bank(RegionId::Rom, 0x44));
    }

    #[test]
    fn test_mirror_rom_bank() {
        assert_eq!(mirror_rom_bank(0x13, 16), Some(3));
        // 384 KiB: lower 32 banks, upper 16 banks.
        assert_eq!(mirror_rom_bank(40, 48), Some(8));
        assert_eq!(mirror_rom_bank(64, 48), Some(32));
        assert_eq!(mirror_rom_bank(0x55, 48), Some(37));
        assert_eq!(mirror_rom_bank(3, 0), None);
    }

    #[test]
    fn test_sf2_page_select() {
        let table_small = BankTable::build(layout(0x80));
        assert!(!table_small.has_sf2_mapper());

        let mut table = BankTable::build(layout(0x140));
        assert!(table.has_sf2_mapper());
        assert_eq!(table.read_target(0x40), BankTarget::bank(RegionId::Rom, 0x40));

        table.select_sf2_page(2);
        assert_eq!(table.read_target(0x40), BankTarget::bank(RegionId::Rom, 0xC0));
        assert_eq!(table.read_target(0x7F), BankTarget::bank(RegionId::Rom, 0xFF));
        assert_eq!(table.read_target(0x3F), BankTarget::bank(RegionId::Rom, 0x3F));

        // A short image leaves the tail of the last page unmapped.
        let mut short = BankTable::build(layout(0x120));
        short.select_sf2_page(3);
        assert_eq!(short.read_target(0x40), BankTarget::bank(RegionId::Rom, 0x100));
        assert_eq!(short.read_target(0x5F), BankTarget::bank(RegionId::Rom, 0x11F));
        assert_eq!(short.read_target(0x60), BankTarget::SINK);
    }
}
