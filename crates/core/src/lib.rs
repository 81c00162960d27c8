//! Core emulator primitives and traits.

pub mod logging;

/// Memory interface a CPU core drives.
///
/// Reads take `&mut self` because hardware ports have read side effects
/// (status latches clear, address registers auto-increment).
pub trait Memory16 {
    /// Read a byte from the logical address space
    fn read(&mut self, addr: u16) -> u8;

    /// Write a byte to the logical address space
    fn write(&mut self, addr: u16, val: u8);

    /// Read a little-endian word. Implementations may take shortcuts the
    /// byte path does not.
    fn read_word(&mut self, addr: u16) -> u16 {
        let lo = self.read(addr) as u16;
        let hi = self.read(addr.wrapping_add(1)) as u16;
        (hi << 8) | lo
    }

    /// Write a little-endian word
    fn write_word(&mut self, addr: u16, val: u16) {
        self.write(addr, val as u8);
        self.write(addr.wrapping_add(1), (val >> 8) as u8);
    }
}

/// Description of a mount point (media slot) that a system supports
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountPointInfo {
    /// Unique identifier for this mount point (e.g., "Cartridge", "BIOS")
    pub id: String,
    /// User-friendly name for display
    pub name: String,
    /// File extensions accepted by this mount point
    pub extensions: Vec<String>,
    /// Whether this mount point is required for the system to function
    pub required: bool,
}

/// A high-level System trait tying components together.
///
/// The CPU interpreter and the renderers live outside the system; the host
/// loop drives the CPU and reports the cycles it consumed through `tick`.
pub trait System {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Reset to initial power-on state
    fn reset(&mut self);

    /// Advance clocked peripherals by `cycles` CPU cycles.
    fn tick(&mut self, cycles: u32) -> Result<(), Self::Error>;

    /// Get the list of mount points this system supports
    fn mount_points(&self) -> Vec<MountPointInfo>;

    /// Load media into a specific mount point
    fn mount(&mut self, mount_point_id: &str, data: &[u8]) -> Result<(), Self::Error>;

    /// Unload media from a specific mount point
    fn unmount(&mut self, mount_point_id: &str) -> Result<(), Self::Error>;

    /// Check if a mount point has media loaded
    fn is_mounted(&self, mount_point_id: &str) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FlatMemory {
        ram: Vec<u8>,
    }

    impl Memory16 for FlatMemory {
        fn read(&mut self, addr: u16) -> u8 {
            self.ram[addr as usize]
        }

        fn write(&mut self, addr: u16, val: u8) {
            self.ram[addr as usize] = val;
        }
    }

    #[test]
    fn default_word_access_is_little_endian() {
        let mut mem = FlatMemory {
            ram: vec![0; 0x10000],
        };
        mem.write_word(0x1234, 0xBEEF);
        assert_eq!(mem.read(0x1234), 0xEF);
        assert_eq!(mem.read(0x1235), 0xBE);
        assert_eq!(mem.read_word(0x1234), 0xBEEF);
    }

    #[test]
    fn default_word_access_wraps_at_top_of_memory() {
        let mut mem = FlatMemory {
            ram: vec![0; 0x10000],
        };
        mem.write_word(0xFFFF, 0x1122);
        assert_eq!(mem.read(0xFFFF), 0x22);
        assert_eq!(mem.read(0x0000), 0x11);
    }

    struct MockSystem {
        mounted: bool,
        cycles: u64,
    }

    impl System for MockSystem {
        type Error = std::convert::Infallible;

        fn reset(&mut self) {
            self.cycles = 0;
        }

        fn tick(&mut self, cycles: u32) -> Result<(), Self::Error> {
            self.cycles += cycles as u64;
            Ok(())
        }

        fn mount_points(&self) -> Vec<MountPointInfo> {
            vec![MountPointInfo {
                id: "test".to_string(),
                name: "Test Slot".to_string(),
                extensions: vec!["bin".to_string()],
                required: false,
            }]
        }

        fn mount(&mut self, _mount_point_id: &str, _data: &[u8]) -> Result<(), Self::Error> {
            self.mounted = true;
            Ok(())
        }

        fn unmount(&mut self, _mount_point_id: &str) -> Result<(), Self::Error> {
            self.mounted = false;
            Ok(())
        }

        fn is_mounted(&self, _mount_point_id: &str) -> bool {
            self.mounted
        }
    }

    #[test]
    fn test_system_mount_operations() {
        let mut sys = MockSystem {
            mounted: false,
            cycles: 0,
        };

        assert!(!sys.is_mounted("test"));
        assert!(sys.mount("test", &[1, 2, 3]).is_ok());
        assert!(sys.is_mounted("test"));
        assert!(sys.unmount("test").is_ok());
        assert!(!sys.is_mounted("test"));
    }

    #[test]
    fn test_system_tick_and_reset() {
        let mut sys = MockSystem {
            mounted: false,
            cycles: 0,
        };
        sys.tick(100).unwrap();
        sys.tick(28).unwrap();
        assert_eq!(sys.cycles, 128);
        sys.reset();
        assert_eq!(sys.cycles, 0);
        assert_eq!(sys.mount_points()[0].id, "test");
    }
}
