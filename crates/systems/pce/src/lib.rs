//! NEC PC Engine / TurboGrafx-16 memory bus and peripheral register core
//!
//! This crate models everything the HuC6280 CPU sees on its bus: the MMR
//! bank mapper, the memory regions behind it, and the register files of the
//! on-board peripherals. The CPU interpreter and the frame/audio renderers
//! are external; they drive the [`Bus`] and read peripheral state through
//! its accessors.
//!
//! # Architecture
//!
//! - **Mapper**: eight 8 KiB slots, 256 selectable banks
//! - **RAM**: 8 KB work RAM, 2 KB backup RAM, optional cartridge RAM
//! - **VDC**: HuC6270 register model with 64 KB VRAM, VRAM and SATB DMA
//! - **VCE**: HuC6260 palette, 512 entries
//! - **PSG**: six wavetable channels with DDA sample buffers
//! - **Timer**, **interrupt controller** and **joypad/multitap** latch

pub mod bank_table;
pub mod bus;
pub mod config;
pub mod input;
pub mod interrupt;
pub mod mapper;
pub mod memory;
pub mod psg;
pub mod system;
pub mod timer;
pub mod vce;
pub mod vdc;

pub use bus::Bus;
pub use config::{CartridgeInfo, PceConfig, Region};
pub use interrupt::IrqSource;
pub use system::{PceError, PceSystem};
pub use vdc::VdcEvent;
