//! Machine configuration and cartridge metadata.

use crate::memory::BANK_SIZE;
use crate::system::PceError;
use emu_core::logging::{LogConfig, LogLevel};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Size of the copier header some HuCard dumps carry in front of the ROM.
pub const COPIER_HEADER_SIZE: usize = 512;

/// Console region, reported to software through joypad bit 6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Region {
    #[default]
    Japan,
    TurboGrafx,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PceConfig {
    /// CPU cycles per timer decrement.
    pub timer_tick_cycles: u32,
    pub region: Region,
    /// Mirror small ROM images across the whole ROM bank range.
    pub mirror_rom: bool,
    pub log_level: LogLevel,
}

impl Default for PceConfig {
    fn default() -> Self {
        Self {
            timer_tick_cycles: crate::timer::CYCLES_PER_TIMER_TICK,
            region: Region::Japan,
            mirror_rom: false,
            log_level: LogLevel::Off,
        }
    }
}

impl PceConfig {
    pub fn from_json(json: &str) -> Result<Self, PceError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, PceError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load from a JSON file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, PceError> {
        match fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), PceError> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Push `log_level` into the process-wide logging configuration.
    pub fn apply_logging(&self) {
        LogConfig::global().set_global_level(self.log_level);
    }
}

/// Cartridge metadata the bank table is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartridgeInfo {
    /// ROM size in 8 KiB blocks.
    pub rom_blocks: usize,
    /// Cartridge RAM in 8 KiB blocks, mapped from bank `$40`.
    pub extra_ram_blocks: usize,
}

impl CartridgeInfo {
    /// Describe a plain HuCard image with no cartridge RAM.
    pub fn from_image(rom: &[u8]) -> Result<Self, PceError> {
        if rom.is_empty() {
            return Err(PceError::EmptyRom);
        }
        if rom.len() % BANK_SIZE != 0 {
            return Err(PceError::MisalignedRom { len: rom.len() });
        }
        Ok(Self {
            rom_blocks: rom.len() / BANK_SIZE,
            extra_ram_blocks: 0,
        })
    }

    /// Check the declared size against the image actually supplied.
    pub fn validate(&self, rom: &[u8]) -> Result<(), PceError> {
        if self.rom_blocks == 0 || rom.is_empty() {
            return Err(PceError::EmptyRom);
        }
        if rom.len() % BANK_SIZE != 0 {
            return Err(PceError::MisalignedRom { len: rom.len() });
        }
        let actual = rom.len() / BANK_SIZE;
        if actual != self.rom_blocks {
            return Err(PceError::RomSizeMismatch {
                declared: self.rom_blocks,
                actual,
            });
        }
        Ok(())
    }
}

/// Drop a 512-byte copier header if the image length says one is present.
pub fn strip_copier_header(mut rom: Vec<u8>) -> Vec<u8> {
    if rom.len() > COPIER_HEADER_SIZE && rom.len() % BANK_SIZE == COPIER_HEADER_SIZE {
        rom.drain(..COPIER_HEADER_SIZE);
    }
    rom
}
