//! famicore-core - NES emulation integration layer.
//!
//! This crate wires the CPU, PPU, and cartridge crates into a complete
//! console behind a small host-facing API.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                       Console                           │
//! │  ┌───────────────────────────────────────────────────┐  │
//! │  │                     NesBus                        │  │
//! │  │  ┌─────┐  ┌─────┐  ┌─────┐  ┌───────────┐         │  │
//! │  │  │ RAM │  │ PPU │  │ APU │  │ Cartridge │  Pads   │  │
//! │  │  │ 2KB │  │     │  │sink │  │ + Mapper  │         │  │
//! │  │  └─────┘  └─────┘  └─────┘  └───────────┘         │  │
//! │  └───────────────────────────────────────────────────┘  │
//! │                          ▲                              │
//! │                     ┌────┴────┐                         │
//! │                     │   CPU   │                         │
//! │                     │  6502   │                         │
//! │                     └─────────┘                         │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use famicore_core::{Button, Console};
//!
//! let rom_data = std::fs::read("game.nes").expect("failed to read ROM");
//! let mut console = Console::new(&rom_data).expect("bad ROM");
//!
//! loop {
//!     console.set_button(0, Button::Start, true);
//!     console.run_frame();
//!     let _rgba = console.framebuffer(); // 256x240x4 bytes
//! }
//! ```
//!
//! Determinism: for a fixed ROM and a fixed input sequence applied at
//! frame boundaries, every frame's framebuffer is bit-identical across
//! runs. The core is single-threaded and never blocks.

mod apu;
mod bus;
mod console;
mod controller;
pub mod palette;

pub use apu::Apu;
pub use bus::NesBus;
pub use console::{Console, ConsoleError, FRAMEBUFFER_SIZE};
pub use controller::{Button, Controller};

// Re-export the component crates' main types.
pub use famicore_cart::{Cartridge, Mapper, Mirroring, Rom, RomError, RomHeader};
pub use famicore_cpu::{Bus, Cpu, Status as CpuStatus};
pub use famicore_ppu::{FRAME_HEIGHT, FRAME_WIDTH, Ppu};

/// NES screen dimensions.
pub mod screen {
    /// Screen width in pixels.
    pub const WIDTH: usize = 256;
    /// Screen height in pixels.
    pub const HEIGHT: usize = 240;
    /// Pixels per frame.
    pub const PIXELS: usize = WIDTH * HEIGHT;
}
