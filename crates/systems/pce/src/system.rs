//! PC Engine session object

use crate::bus::Bus;
use crate::config::{strip_copier_header, CartridgeInfo, PceConfig};
use emu_core::logging::{log, LogCategory, LogLevel};
use emu_core::{MountPointInfo, System};
use thiserror::Error;

const CARTRIDGE: &str = "cartridge";

/// PC Engine emulator errors
#[derive(Debug, Error)]
pub enum PceError {
    #[error("ROM image is empty")]
    EmptyRom,
    #[error("ROM image of {len} bytes is not a multiple of 8 KiB")]
    MisalignedRom { len: usize },
    #[error("cartridge declares {declared} ROM banks but the image holds {actual}")]
    RomSizeMismatch { declared: usize, actual: usize },
    #[error("no cartridge mounted")]
    NotInitialized,
    #[error("invalid mount point: {0}")]
    InvalidMountPoint(String),
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// NEC PC Engine / TurboGrafx-16 memory and peripheral core
pub struct PceSystem {
    config: PceConfig,
    bus: Option<Bus>,
    cycles: u64,
}

impl PceSystem {
    /// A machine with no cartridge; [`PceSystem::bus`] fails until one is
    /// mounted.
    pub fn new(config: PceConfig) -> Self {
        config.apply_logging();
        Self {
            config,
            bus: None,
            cycles: 0,
        }
    }

    pub fn with_rom(rom: Vec<u8>, cart: &CartridgeInfo, config: PceConfig) -> Result<Self, PceError> {
        let mut system = Self::new(config);
        system.load_rom(rom, cart)?;
        Ok(system)
    }

    /// Bind a ROM. The previous cartridge, if any, is dropped only on success.
    pub fn load_rom(&mut self, rom: Vec<u8>, cart: &CartridgeInfo) -> Result<(), PceError> {
        self.bus = Some(Bus::new(rom, cart, &self.config)?);
        self.cycles = 0;
        Ok(())
    }

    pub fn config(&self) -> &PceConfig {
        &self.config
    }

    pub fn bus(&self) -> Result<&Bus, PceError> {
        self.bus.as_ref().ok_or(PceError::NotInitialized)
    }

    pub fn bus_mut(&mut self) -> Result<&mut Bus, PceError> {
        self.bus.as_mut().ok_or(PceError::NotInitialized)
    }

    /// CPU cycles ticked since the cartridge was mounted or last reset.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }
}

impl Default for PceSystem {
    fn default() -> Self {
        Self::new(PceConfig::default())
    }
}

impl System for PceSystem {
    type Error = PceError;

    fn reset(&mut self) {
        if let Some(bus) = self.bus.as_mut() {
            bus.reset();
        }
        self.cycles = 0;
    }

    fn tick(&mut self, cycles: u32) -> Result<(), Self::Error> {
        self.bus_mut()?.tick(cycles);
        self.cycles += cycles as u64;
        Ok(())
    }

    fn mount_points(&self) -> Vec<MountPointInfo> {
        vec![MountPointInfo {
            id: CARTRIDGE.to_string(),
            name: "HuCard".to_string(),
            extensions: vec!["pce".to_string()],
            required: true,
        }]
    }

    fn mount(&mut self, mount_point_id: &str, data: &[u8]) -> Result<(), Self::Error> {
        if mount_point_id != CARTRIDGE {
            return Err(PceError::InvalidMountPoint(mount_point_id.to_string()));
        }
        let rom = strip_copier_header(data.to_vec());
        let cart = CartridgeInfo::from_image(&rom)?;
        log(LogCategory::Bus, LogLevel::Info, || {
            format!("Mounting HuCard ({} KiB)", rom.len() / 1024)
        });
        self.load_rom(rom, &cart)
    }

    fn unmount(&mut self, mount_point_id: &str) -> Result<(), Self::Error> {
        if mount_point_id != CARTRIDGE {
            return Err(PceError::InvalidMountPoint(mount_point_id.to_string()));
        }
        self.bus = None;
        self.cycles = 0;
        Ok(())
    }

    fn is_mounted(&self, mount_point_id: &str) -> bool {
        mount_point_id == CARTRIDGE && self.bus.is_some()
    }
}
