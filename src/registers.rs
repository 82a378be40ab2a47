//! Cumulative flag registers mirrored from the controller.
//!
//! Entry mode set and display control are single instructions carrying several flags at once.
//! The controller has no way to change one flag alone, so the driver keeps the last sent flags
//! and re-sends the whole set, `opcode | bits`, whenever one of them changes.

use core::marker::PhantomData;

use crate::Instruction;

/// A flag of one of the controller's cumulative instructions.
pub trait RegisterFlag: Copy {
    /// Instruction the flags are OR-ed into.
    const OPCODE: Instruction;

    fn mask(self) -> u8;
}

/// Flags of the entry mode set instruction.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EntryMode {
    /// Shift the display with every write (autoscroll).
    Increment = 0x01,
    /// Text runs left to right, cursor moves right.
    LeftToRight = 0x02,
}

impl RegisterFlag for EntryMode {
    const OPCODE: Instruction = Instruction::EntryModeSet;

    fn mask(self) -> u8 {
        self as u8
    }
}

/// Flags of the display control instruction.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayControl {
    CursorBlink = 0x01,
    CursorOn = 0x02,
    DisplayOn = 0x04,
}

impl RegisterFlag for DisplayControl {
    const OPCODE: Instruction = Instruction::DisplayControl;

    fn mask(self) -> u8 {
        self as u8
    }
}

/// Last flags sent with the instruction `F::OPCODE`. Starts out with every flag cleared.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FlagRegister<F> {
    bits: u8,
    _flag: PhantomData<F>,
}

impl<F: RegisterFlag> Default for FlagRegister<F> {
    fn default() -> Self {
        Self {
            bits: 0,
            _flag: PhantomData,
        }
    }
}

impl<F: RegisterFlag> FlagRegister<F> {
    /// Sets `flag`, leaving all others untouched.
    pub fn set(&mut self, flag: F) {
        self.bits |= flag.mask();
    }

    /// Clears `flag`, leaving all others untouched.
    pub fn clear(&mut self, flag: F) {
        self.bits &= !flag.mask();
    }

    pub fn contains(&self, flag: F) -> bool {
        self.bits & flag.mask() != 0
    }

    pub fn bits(&self) -> u8 {
        self.bits
    }

    /// The complete instruction to send, opcode OR-ed with the current flags.
    pub fn instruction(&self) -> u8 {
        F::OPCODE as u8 | self.bits
    }
}

#[cfg(feature = "defmt")]
impl<F> defmt::Format for FlagRegister<F> {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "FlagRegister({=u8:#x})", self.bits)
    }
}
