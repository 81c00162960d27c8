//! Physical memory regions backing the logical address space.
//!
//! Every region is allocated once when the machine is built. ROM and the
//! optional cartridge RAM are bound per cartridge; the rest have fixed sizes.
//!
//! | Region     | Size                   |
//! |------------|------------------------|
//! | ROM        | N × 8 KiB              |
//! | RAM        | 8 KiB                  |
//! | Backup RAM | 2 KiB                  |
//! | Extra RAM  | E × 8 KiB (0 if none)  |
//! | VRAM       | 64 KiB                 |
//! | Sink       | 8 KiB + 4 trap bytes   |
//!
//! The sink absorbs accesses to unmapped banks and writes aimed at ROM. Its
//! first [`IO_TRAP_OFFSET`] bytes are the trap area that word accesses on the
//! I/O slot land in.

/// Size of one bank, and of one slot window in the logical address space.
pub const BANK_SIZE: usize = 0x2000;
pub const RAM_SIZE: usize = 0x2000;
pub const BACKUP_RAM_SIZE: usize = 0x0800;
pub const VRAM_SIZE: usize = 0x10000;
pub const IO_TRAP_OFFSET: usize = 4;
pub const SINK_SIZE: usize = BANK_SIZE + IO_TRAP_OFFSET;

/// Value returned for a byte read past the end of a region.
pub const OPEN_BUS: u8 = 0xFF;

/// Identifies one of the CPU-visible regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegionId {
    Rom,
    Ram,
    BackupRam,
    ExtraRam,
    Sink,
}

pub struct Memory {
    rom: Vec<u8>,
    ram: Vec<u8>,
    backup_ram: Vec<u8>,
    extra_ram: Vec<u8>,
    vram: Vec<u8>,
    sink: Vec<u8>,
}

impl Memory {
    /// Bind `rom` and allocate `extra_ram_blocks` banks of cartridge RAM.
    pub fn new(rom: Vec<u8>, extra_ram_blocks: usize) -> Self {
        Self {
            rom,
            ram: vec![0; RAM_SIZE],
            backup_ram: vec![0; BACKUP_RAM_SIZE],
            extra_ram: vec![0; extra_ram_blocks * BANK_SIZE],
            vram: vec![0; VRAM_SIZE],
            sink: vec![0; SINK_SIZE],
        }
    }

    /// Zero every volatile region. Backup RAM is battery-backed and survives.
    pub fn clear_volatile(&mut self) {
        self.ram.fill(0);
        self.extra_ram.fill(0);
        self.vram.fill(0);
        self.sink.fill(0);
    }

    pub fn region(&self, id: RegionId) -> &[u8] {
        match id {
            RegionId::Rom => &self.rom,
            RegionId::Ram => &self.ram,
            RegionId::BackupRam => &self.backup_ram,
            RegionId::ExtraRam => &self.extra_ram,
            RegionId::Sink => &self.sink,
        }
    }

    pub fn region_mut(&mut self, id: RegionId) -> &mut [u8] {
        match id {
            RegionId::Rom => &mut self.rom,
            RegionId::Ram => &mut self.ram,
            RegionId::BackupRam => &mut self.backup_ram,
            RegionId::ExtraRam => &mut self.extra_ram,
            RegionId::Sink => &mut self.sink,
        }
    }

    /// Bounds-checked read; out-of-range indices read as open bus.
    #[inline]
    pub fn peek(&self, id: RegionId, index: usize) -> u8 {
        self.region(id).get(index).copied().unwrap_or(OPEN_BUS)
    }

    /// Bounds-checked write; out-of-range indices are dropped.
    #[inline]
    pub fn poke(&mut self, id: RegionId, index: usize, value: u8) {
        if let Some(slot) = self.region_mut(id).get_mut(index) {
            *slot = value;
        }
    }

    pub fn rom(&self) -> &[u8] {
        &self.rom
    }

    pub fn rom_blocks(&self) -> usize {
        self.rom.len() / BANK_SIZE
    }

    pub fn extra_ram_blocks(&self) -> usize {
        self.extra_ram.len() / BANK_SIZE
    }

    pub fn ram(&self) -> &[u8] {
        &self.ram
    }

    pub fn backup_ram(&self) -> &[u8] {
        &self.backup_ram
    }

    pub fn backup_ram_mut(&mut self) -> &mut [u8] {
        &mut self.backup_ram
    }

    pub fn vram(&self) -> &[u8] {
        &self.vram
    }

    pub fn vram_mut(&mut self) -> &mut [u8] {
        &mut self.vram
    }
}
