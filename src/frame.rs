//! Packing of the expander's output byte.
//!
//! | bit | line            |
//! |-----|-----------------|
//! | 0   | register select |
//! | 1   | read/write      |
//! | 2   | enable          |
//! | 3   | backlight       |
//! | 4-7 | data nibble     |
//!
//! Read/write stays low, the driver never reads from the controller.

use crate::{Backlight, Mode};

const ENABLE: u8 = 0x04;

/// Control lines presented to the expander together with a data nibble.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OutputFrame {
    pub mode: Mode,
    pub enable: bool,
    pub backlight: Backlight,
}

impl Default for OutputFrame {
    fn default() -> Self {
        Self {
            mode: Mode::Command,
            enable: false,
            backlight: Backlight::On,
        }
    }
}

impl OutputFrame {
    pub fn with_mode(self, mode: Mode) -> Self {
        Self { mode, ..self }
    }

    pub fn with_enable(self, enable: bool) -> Self {
        Self { enable, ..self }
    }

    pub fn with_backlight(self, backlight: Backlight) -> Self {
        Self { backlight, ..self }
    }

    /// Control lines only, data nibble zero.
    pub fn idle(self) -> u8 {
        let enable = if self.enable { ENABLE } else { 0 };
        self.mode as u8 | enable | self.backlight as u8
    }

    /// Output byte carrying bits 7-4 of `instruction`.
    pub fn high_nibble(self, instruction: u8) -> u8 {
        self.idle() | (instruction & 0xf0)
    }

    /// Output byte carrying bits 3-0 of `instruction`.
    pub fn low_nibble(self, instruction: u8) -> u8 {
        self.idle() | (instruction << 4)
    }
}
