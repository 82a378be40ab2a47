use embedded_hal::{delay::DelayNs, i2c::I2c};
use ufmt_write::uWrite;

use crate::{
    settle, Backlight, ByteSink, DisplayControl, EntryMode, FlagRegister, Geometry, Instruction,
    Mode, OutputFrame, Shift, DEFAULT_ADDRESS, FUNCTION_SET_4BIT, FUNCTION_SET_4BIT_2LINE,
    FUNCTION_SET_8BIT,
};

/// API to write to the LCD.
pub struct Lcd<'a, I, D>
where
    I: I2c,
    D: DelayNs,
{
    i2c: &'a mut I,
    delay: &'a mut D,
    address: u8,
    geometry: Geometry,
    frame: OutputFrame,
    display_control: FlagRegister<DisplayControl>,
    entry_mode: FlagRegister<EntryMode>,
}

impl<'a, I, D> Lcd<'a, I, D>
where
    I: I2c,
    D: DelayNs,
{
    /// Create new instance with only the I2C and delay instance. Defaults to a 16x2 display at
    /// [`DEFAULT_ADDRESS`] with the backlight on.
    pub fn new(i2c: &'a mut I, delay: &'a mut D) -> Self {
        Self {
            i2c,
            delay,
            address: DEFAULT_ADDRESS,
            geometry: Geometry::default(),
            frame: OutputFrame::default(),
            display_control: FlagRegister::default(),
            entry_mode: FlagRegister::default(),
        }
    }

    /// Set the 7 bit I2C address, see [lcd address].
    ///
    /// [lcd address]: https://badboi.dev/rust,/microcontrollers/2020/11/09/i2c-hello-world.html
    pub fn with_address(mut self, address: u8) -> Self {
        self.address = address & 0x7f;
        self
    }

    /// Number of columns, clamped to `1..=40`.
    pub fn with_columns(mut self, columns: u8) -> Self {
        self.geometry = Geometry::new(columns, self.geometry.rows());
        self
    }

    /// Number of rows, clamped to `1..=4`.
    pub fn with_rows(mut self, rows: u8) -> Self {
        self.geometry = Geometry::new(self.geometry.columns(), rows);
        self
    }

    pub fn with_backlight(mut self, backlight: Backlight) -> Self {
        self.frame = self.frame.with_backlight(backlight);
        self
    }

    /// Initializes the hardware.
    ///
    /// Follows "Initializing by Instruction" for the 4 bit interface from the HD44780U
    /// datasheet: three 8 bit function sets, then the switch to 4 bit. Until that switch the
    /// controller still listens on 8 lines, so only high nibbles are sent.
    /// Leaves the display on, cleared, with text running left to right.
    pub fn init(mut self) -> Result<Self, I::Error> {
        // Reset the expander outputs, then wait for Vcc to settle.
        self.frame = self.frame.with_mode(Mode::Command).with_enable(false);
        self.write_frame(self.frame.idle())?;
        self.delay.delay_ms(settle::POWER_ON_MS);

        for wait in settle::PRIMES.iter() {
            self.write_high_nibble(FUNCTION_SET_8BIT)?;
            self.delay.delay_us(*wait);
        }

        self.write_high_nibble(FUNCTION_SET_4BIT)?;
        self.delay.delay_us(settle::COMMAND);

        self.command(FUNCTION_SET_4BIT_2LINE, settle::COMMAND)?;

        self.display()?;
        self.clear()?;
        self.left_to_right()?;

        #[cfg(feature = "defmt")]
        defmt::debug!(
            "lcd {=u8:#x} initialized, {}x{}",
            self.address,
            self.geometry.columns(),
            self.geometry.rows()
        );
        Ok(self)
    }

    fn write_frame(&mut self, byte: u8) -> Result<(), I::Error> {
        self.i2c.write(self.address, &[byte])
    }

    /// Latches bits 7-4 of `data` with one enable pulse.
    fn write_high_nibble(&mut self, data: u8) -> Result<(), I::Error> {
        self.write_frame(self.frame.with_enable(true).high_nibble(data))?;
        self.delay.delay_us(settle::ENABLE_PULSE);
        self.write_frame(self.frame.with_enable(false).high_nibble(data))
    }

    /// Latches bits 3-0 of `data` with one enable pulse.
    fn write_low_nibble(&mut self, data: u8) -> Result<(), I::Error> {
        self.write_frame(self.frame.with_enable(true).low_nibble(data))?;
        self.delay.delay_us(settle::ENABLE_PULSE);
        self.write_frame(self.frame.with_enable(false).low_nibble(data))
    }

    /// Sends a full byte to the register selected by `mode` and waits `settle_us`.
    fn send(&mut self, data: u8, mode: Mode, settle_us: u32) -> Result<(), I::Error> {
        self.frame = self.frame.with_mode(mode);
        self.write_high_nibble(data)?;
        self.delay.delay_us(settle::BETWEEN_NIBBLES);
        self.write_low_nibble(data)?;
        self.delay.delay_us(settle_us);
        Ok(())
    }

    fn command(&mut self, data: u8, settle_us: u32) -> Result<(), I::Error> {
        self.send(data, Mode::Command, settle_us)
    }

    fn update_display_control(&mut self) -> Result<(), I::Error> {
        self.command(self.display_control.instruction(), settle::COMMAND)
    }

    fn update_entry_mode(&mut self) -> Result<(), I::Error> {
        self.command(self.entry_mode.instruction(), settle::COMMAND)
    }

    /// Switches the backlight. Not a controller instruction, only the backlight line of the
    /// expander is written.
    pub fn set_backlight(&mut self, backlight: Backlight) -> Result<(), I::Error> {
        self.frame = self.frame.with_backlight(backlight);
        self.write_frame(backlight as u8)
    }

    pub fn backlight(&mut self) -> Result<(), I::Error> {
        self.set_backlight(Backlight::On)
    }

    pub fn no_backlight(&mut self) -> Result<(), I::Error> {
        self.set_backlight(Backlight::Off)
    }

    /// Clear the display
    pub fn clear(&mut self) -> Result<(), I::Error> {
        self.command(Instruction::Clear as u8, settle::CLEAR_HOME)
    }

    /// Return cursor to upper left corner, i.e. (0,0), and undo any display shift.
    pub fn home(&mut self) -> Result<(), I::Error> {
        self.command(Instruction::ReturnHome as u8, settle::CLEAR_HOME)
    }

    pub fn left_to_right(&mut self) -> Result<(), I::Error> {
        self.entry_mode.set(EntryMode::LeftToRight);
        self.update_entry_mode()
    }

    pub fn right_to_left(&mut self) -> Result<(), I::Error> {
        self.entry_mode.clear(EntryMode::LeftToRight);
        self.update_entry_mode()
    }

    /// Shift the display instead of the cursor with every write.
    pub fn autoscroll(&mut self) -> Result<(), I::Error> {
        self.entry_mode.set(EntryMode::Increment);
        self.update_entry_mode()
    }

    pub fn no_autoscroll(&mut self) -> Result<(), I::Error> {
        self.entry_mode.clear(EntryMode::Increment);
        self.update_entry_mode()
    }

    /// Turn the display on. DDRAM content is kept while it is off.
    pub fn display(&mut self) -> Result<(), I::Error> {
        self.display_control.set(DisplayControl::DisplayOn);
        self.update_display_control()
    }

    pub fn no_display(&mut self) -> Result<(), I::Error> {
        self.display_control.clear(DisplayControl::DisplayOn);
        self.update_display_control()
    }

    /// Show the underline cursor.
    pub fn cursor(&mut self) -> Result<(), I::Error> {
        self.display_control.set(DisplayControl::CursorOn);
        self.update_display_control()
    }

    pub fn no_cursor(&mut self) -> Result<(), I::Error> {
        self.display_control.clear(DisplayControl::CursorOn);
        self.update_display_control()
    }

    /// Blink the character at the cursor position.
    pub fn blink(&mut self) -> Result<(), I::Error> {
        self.display_control.set(DisplayControl::CursorBlink);
        self.update_display_control()
    }

    pub fn no_blink(&mut self) -> Result<(), I::Error> {
        self.display_control.clear(DisplayControl::CursorBlink);
        self.update_display_control()
    }

    /// Scrolls the display one char to the left
    pub fn scroll_display_left(&mut self) -> Result<(), I::Error> {
        self.command(
            Instruction::CursorOrDisplayShift as u8 | Shift::DisplayLeft as u8,
            settle::COMMAND,
        )
    }

    /// Scrolls the display one char to the right
    pub fn scroll_display_right(&mut self) -> Result<(), I::Error> {
        self.command(
            Instruction::CursorOrDisplayShift as u8 | Shift::DisplayRight as u8,
            settle::COMMAND,
        )
    }

    /// Moves the cursor one char to the left
    pub fn move_cursor_left(&mut self) -> Result<(), I::Error> {
        self.command(
            Instruction::CursorOrDisplayShift as u8 | Shift::CursorLeft as u8,
            settle::COMMAND,
        )
    }

    /// Moves the cursor one char to the right
    pub fn move_cursor_right(&mut self) -> Result<(), I::Error> {
        self.command(
            Instruction::CursorOrDisplayShift as u8 | Shift::CursorRight as u8,
            settle::COMMAND,
        )
    }

    /// Stores a custom 5x8 glyph in CGRAM. `location` wraps modulo 8; print the glyph by
    /// writing its location as character code.
    ///
    /// Leaves the cursor at (0, 0), since CGRAM writes move the address counter into CGRAM.
    pub fn define_glyph(&mut self, location: u8, charmap: &[u8; 8]) -> Result<(), I::Error> {
        let location = location % 8;
        self.command(
            Instruction::SetCgramAddr as u8 | (location << 3),
            settle::COMMAND,
        )?;
        for row in charmap.iter() {
            self.write_byte(*row)?;
        }
        self.set_cursor(0, 0)
    }

    /// Set the cursor to (col, row). Coordinates are zero-based and clamped to the display.
    pub fn set_cursor(&mut self, col: u8, row: u8) -> Result<(), I::Error> {
        #[cfg(feature = "defmt")]
        {
            if col > self.geometry.column_max() || row > self.geometry.row_max() {
                defmt::trace!("cursor ({}, {}) clamped", col, row);
            }
        }
        let address = self.geometry.ddram_address(col, row);
        self.command(Instruction::SetDdramAddr as u8 | address, settle::COMMAND)
    }

    /// Writes one character code at the cursor.
    pub fn write_byte(&mut self, character: u8) -> Result<(), I::Error> {
        self.send(character, Mode::Data, settle::WRITE_DATA)
    }

    /// Write string to display. Characters beyond U+00FF are truncated to their low byte.
    pub fn write_str(&mut self, data: &str) -> Result<(), I::Error> {
        for c in data.chars() {
            self.write_byte(c as u8)?;
        }
        Ok(())
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn columns(&self) -> u8 {
        self.geometry.columns()
    }

    pub fn rows(&self) -> u8 {
        self.geometry.rows()
    }

    pub fn backlight_state(&self) -> Backlight {
        self.frame.backlight
    }

    pub fn display_control(&self) -> FlagRegister<DisplayControl> {
        self.display_control
    }

    pub fn entry_mode(&self) -> FlagRegister<EntryMode> {
        self.entry_mode
    }
}

impl<'a, I, D> ByteSink for Lcd<'a, I, D>
where
    I: I2c,
    D: DelayNs,
{
    type Error = I::Error;

    fn write_byte(&mut self, byte: u8) -> Result<(), Self::Error> {
        Lcd::write_byte(self, byte)
    }
}

impl<'a, I, D> uWrite for Lcd<'a, I, D>
where
    I: I2c,
    D: DelayNs,
{
    type Error = I::Error;

    fn write_str(&mut self, s: &str) -> Result<(), Self::Error> {
        Lcd::write_str(self, s)
    }
}

impl<'a, I, D> core::fmt::Write for Lcd<'a, I, D>
where
    I: I2c,
    D: DelayNs,
{
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        Lcd::write_str(self, s).map_err(|_| core::fmt::Error)
    }
}
