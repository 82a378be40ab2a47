#![no_std]
//! Driver for HD44780 compatible character LCDs wired to a PCF8574 I/O expander, like the
//! common 1602 and 2004 "I2C backpack" modules. It requires an I2C instance implementing
//! [`embedded_hal::i2c::I2c`] and an instance to delay execution implementing
//! [`embedded_hal::delay::DelayNs`].
//!
//! The expander exposes a single byte. Four of its lines drive the controller's control pins
//! (register select, read/write, enable and the backlight transistor), the other four carry
//! the data nibble. Every instruction is therefore sent as two nibbles, each latched by an
//! enable pulse.
//!
//! Usage:
//! ```ignore
//! const LCD_ADDRESS: u8 = 0x27; // Address depends on hardware, see link below
//!
//! // Create a I2C instance, needs to implement embedded_hal::i2c::I2c, this
//! // particular uses the arduino_hal crate for avr microcontrollers like the arduinos.
//! let dp = arduino_hal::Peripherals::take().unwrap();
//! let pins = arduino_hal::pins!(dp);
//! let mut i2c = arduino_hal::I2c::new(
//!     dp.TWI, //
//!     pins.a4.into_pull_up_input(), // use respective pins
//!     pins.a5.into_pull_up_input(),
//!     50000,
//! );
//! let mut delay = arduino_hal::Delay::new();
//!
//! let mut lcd = lcd_pcf8574_i2c::sync_lcd::Lcd::new(&mut i2c, &mut delay)
//!     .with_address(LCD_ADDRESS)
//!     .with_columns(20)
//!     .with_rows(4)
//!     .init().unwrap();
//! lcd.set_cursor(3, 1).unwrap();
//! ufmt::uwrite!(lcd, "{}", 42).unwrap();
//! ```
//!
//! This [site][lcd address] describes how to find the address of your LCD devices.
//!
//! [lcd address]: https://www.ardumotive.com/i2clcden.html

pub mod frame;
pub mod geometry;
pub mod registers;
pub mod sync_lcd;

#[cfg(feature = "async")]
pub mod async_lcd;

#[cfg(test)]
mod test_support;

pub use frame::OutputFrame;
pub use geometry::Geometry;
pub use registers::{DisplayControl, EntryMode, FlagRegister};

/// Default address of a PCF8574 backpack with all address jumpers open.
pub const DEFAULT_ADDRESS: u8 = 0x27;

/// State of the backlight line, bit 3 of every frame.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Backlight {
    Off = 0x00,
    On = 0x08,
}

/// Register select line: instruction register or data register.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    Command = 0x00,
    Data = 0x01,
}

/// Controller opcodes. Parametrised instructions are OR-ed with their arguments.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Instruction {
    Clear = 0x01,
    ReturnHome = 0x02,
    EntryModeSet = 0x04,
    DisplayControl = 0x08,
    CursorOrDisplayShift = 0x10,
    FunctionSet = 0x20,
    SetCgramAddr = 0x40,
    SetDdramAddr = 0x80,
}

#[repr(u8)]
#[derive(Copy, Clone)]
enum Shift {
    CursorLeft = 0x00,
    CursorRight = 0x04,
    DisplayLeft = 0x08,
    DisplayRight = 0x0C,
}

#[repr(u8)]
#[derive(Copy, Clone)]
enum BitMode {
    Bit4 = 0x00,
    Bit8 = 0x10,
}

const TWO_LINES: u8 = 0x08;

/// Function set: 8 bit bus. Only its high nibble is ever sent.
const FUNCTION_SET_8BIT: u8 = Instruction::FunctionSet as u8 | BitMode::Bit8 as u8;
/// Function set: 4 bit bus. Sent as a high nibble to leave 8 bit mode.
const FUNCTION_SET_4BIT: u8 = Instruction::FunctionSet as u8 | BitMode::Bit4 as u8;
/// Function set: 4 bit bus, two lines, 5x8 font.
const FUNCTION_SET_4BIT_2LINE: u8 = FUNCTION_SET_4BIT | TWO_LINES;

/// Settle times in microseconds, taken from the HD44780U instruction table.
mod settle {
    /// High part of the enable pulse must be longer than 450 ns.
    pub const ENABLE_PULSE: u32 = 1;
    pub const BETWEEN_NIBBLES: u32 = 37;
    pub const COMMAND: u32 = 37;
    pub const WRITE_DATA: u32 = 41;
    /// Clear and return home walk the whole DDRAM.
    pub const CLEAR_HOME: u32 = 1600;
    /// Delays after each of the three 8 bit primes during initialization.
    pub const PRIMES: [u32; 3] = [4200, 150, 37];
    /// Power on until Vcc is stable, in milliseconds.
    pub const POWER_ON_MS: u32 = 50;
}

/// Narrow sink for character codes. Text streaming is built on top of it, independent of how
/// the bytes reach the display.
pub trait ByteSink {
    type Error;

    /// Writes one character code at the current address.
    fn write_byte(&mut self, byte: u8) -> Result<(), Self::Error>;

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        for b in bytes {
            self.write_byte(*b)?;
        }
        Ok(())
    }
}
