use embedded_hal_async::{delay::DelayNs, i2c::I2c};

use crate::{
    settle, Backlight, DisplayControl, EntryMode, FlagRegister, Geometry, Instruction, Mode,
    OutputFrame, Shift, DEFAULT_ADDRESS, FUNCTION_SET_4BIT, FUNCTION_SET_4BIT_2LINE,
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

    /// Set the 7 bit I2C address.
    pub fn with_address(mut self, address: u8) -> Self {
        self.address = address & 0x7f;
        self
    }

    pub fn with_columns(mut self, columns: u8) -> Self {
        self.geometry = Geometry::new(columns, self.geometry.rows());
        self
    }

    pub fn with_rows(mut self, rows: u8) -> Self {
        self.geometry = Geometry::new(self.geometry.columns(), rows);
        self
    }

    pub fn with_backlight(mut self, backlight: Backlight) -> Self {
        self.frame = self.frame.with_backlight(backlight);
        self
    }

    /// Initializes the hardware, see [`crate::sync_lcd::Lcd::init`].
    pub async fn init(mut self) -> Result<Self, I::Error> {
        self.frame = self.frame.with_mode(Mode::Command).with_enable(false);
        self.write_frame(self.frame.idle()).await?;
        self.delay.delay_ms(settle::POWER_ON_MS).await;

        // Still in 8 bit mode, high nibbles only
        for wait in settle::PRIMES.iter() {
            self.write_high_nibble(FUNCTION_SET_8BIT).await?;
            self.delay.delay_us(*wait).await;
        }

        self.write_high_nibble(FUNCTION_SET_4BIT).await?;
        self.delay.delay_us(settle::COMMAND).await;

        self.command(FUNCTION_SET_4BIT_2LINE, settle::COMMAND).await?;

        self.display().await?;
        self.clear().await?;
        self.left_to_right().await?;

        #[cfg(feature = "defmt")]
        defmt::debug!(
            "lcd {=u8:#x} initialized, {}x{}",
            self.address,
            self.geometry.columns(),
            self.geometry.rows()
        );
        Ok(self)
    }

    async fn write_frame(&mut self, byte: u8) -> Result<(), I::Error> {
        self.i2c.write(self.address, &[byte]).await
    }

    async fn write_high_nibble(&mut self, data: u8) -> Result<(), I::Error> {
        self.write_frame(self.frame.with_enable(true).high_nibble(data)).await?;
        self.delay.delay_us(settle::ENABLE_PULSE).await;
        self.write_frame(self.frame.with_enable(false).high_nibble(data)).await
    }

    async fn write_low_nibble(&mut self, data: u8) -> Result<(), I::Error> {
        self.write_frame(self.frame.with_enable(true).low_nibble(data)).await?;
        self.delay.delay_us(settle::ENABLE_PULSE).await;
        self.write_frame(self.frame.with_enable(false).low_nibble(data)).await
    }

    async fn send(&mut self, data: u8, mode: Mode, settle_us: u32) -> Result<(), I::Error> {
        self.frame = self.frame.with_mode(mode);
        self.write_high_nibble(data).await?;
        self.delay.delay_us(settle::BETWEEN_NIBBLES).await;
        self.write_low_nibble(data).await?;
        self.delay.delay_us(settle_us).await;
        Ok(())
    }

    async fn command(&mut self, data: u8, settle_us: u32) -> Result<(), I::Error> {
        self.send(data, Mode::Command, settle_us).await
    }

    async fn update_display_control(&mut self) -> Result<(), I::Error> {
        self.command(self.display_control.instruction(), settle::COMMAND).await
    }

    async fn update_entry_mode(&mut self) -> Result<(), I::Error> {
        self.command(self.entry_mode.instruction(), settle::COMMAND).await
    }

    pub async fn set_backlight(&mut self, backlight: Backlight) -> Result<(), I::Error> {
        self.frame = self.frame.with_backlight(backlight);
        self.write_frame(backlight as u8).await
    }

    pub async fn backlight(&mut self) -> Result<(), I::Error> {
        self.set_backlight(Backlight::On).await
    }

    pub async fn no_backlight(&mut self) -> Result<(), I::Error> {
        self.set_backlight(Backlight::Off).await
    }

    /// Clear the display
    pub async fn clear(&mut self) -> Result<(), I::Error> {
        self.command(Instruction::Clear as u8, settle::CLEAR_HOME).await
    }

    /// Return cursor to upper left corner, i.e. (0,0).
    pub async fn home(&mut self) -> Result<(), I::Error> {
        self.command(Instruction::ReturnHome as u8, settle::CLEAR_HOME).await
    }

    pub async fn left_to_right(&mut self) -> Result<(), I::Error> {
        self.entry_mode.set(EntryMode::LeftToRight);
        self.update_entry_mode().await
    }

    pub async fn right_to_left(&mut self) -> Result<(), I::Error> {
        self.entry_mode.clear(EntryMode::LeftToRight);
        self.update_entry_mode().await
    }

    pub async fn autoscroll(&mut self) -> Result<(), I::Error> {
        self.entry_mode.set(EntryMode::Increment);
        self.update_entry_mode().await
    }

    pub async fn no_autoscroll(&mut self) -> Result<(), I::Error> {
        self.entry_mode.clear(EntryMode::Increment);
        self.update_entry_mode().await
    }

    pub async fn display(&mut self) -> Result<(), I::Error> {
        self.display_control.set(DisplayControl::DisplayOn);
        self.update_display_control().await
    }

    pub async fn no_display(&mut self) -> Result<(), I::Error> {
        self.display_control.clear(DisplayControl::DisplayOn);
        self.update_display_control().await
    }

    /// Show the underline cursor.
    pub async fn cursor(&mut self) -> Result<(), I::Error> {
        self.display_control.set(DisplayControl::CursorOn);
        self.update_display_control().await
    }

    pub async fn no_cursor(&mut self) -> Result<(), I::Error> {
        self.display_control.clear(DisplayControl::CursorOn);
        self.update_display_control().await
    }

    /// Blink the character at the cursor position.
    pub async fn blink(&mut self) -> Result<(), I::Error> {
        self.display_control.set(DisplayControl::CursorBlink);
        self.update_display_control().await
    }

    pub async fn no_blink(&mut self) -> Result<(), I::Error> {
        self.display_control.clear(DisplayControl::CursorBlink);
        self.update_display_control().await
    }

    /// Scrolls the display one char to the left
    pub async fn scroll_display_left(&mut self) -> Result<(), I::Error> {
        self.command(
            Instruction::CursorOrDisplayShift as u8 | Shift::DisplayLeft as u8,
            settle::COMMAND,
        )
        .await
    }

    /// Scrolls the display one char to the right
    pub async fn scroll_display_right(&mut self) -> Result<(), I::Error> {
        self.command(
            Instruction::CursorOrDisplayShift as u8 | Shift::DisplayRight as u8,
            settle::COMMAND,
        )
        .await
    }

    /// Moves the cursor one char to the left
    pub async fn move_cursor_left(&mut self) -> Result<(), I::Error> {
        self.command(
            Instruction::CursorOrDisplayShift as u8 | Shift::CursorLeft as u8,
            settle::COMMAND,
        )
        .await
    }

    /// Moves the cursor one char to the right
    pub async fn move_cursor_right(&mut self) -> Result<(), I::Error> {
        self.command(
            Instruction::CursorOrDisplayShift as u8 | Shift::CursorRight as u8,
            settle::COMMAND,
        )
        .await
    }

    /// Stores a custom glyph in CGRAM, see [`crate::sync_lcd::Lcd::define_glyph`].
    pub async fn define_glyph(&mut self, location: u8, charmap: &[u8; 8]) -> Result<(), I::Error> {
        let location = location % 8;
        self.command(
            Instruction::SetCgramAddr as u8 | (location << 3),
            settle::COMMAND,
        )
        .await?;
        for row in charmap.iter() {
            self.write_byte(*row).await?;
        }
        self.set_cursor(0, 0).await
    }

    /// Set the cursor to (col, row). Coordinates are zero-based and clamped to the display.
    pub async fn set_cursor(&mut self, col: u8, row: u8) -> Result<(), I::Error> {
        #[cfg(feature = "defmt")]
        {
            if col > self.geometry.column_max() || row > self.geometry.row_max() {
                defmt::trace!("cursor ({}, {}) clamped", col, row);
            }
        }
        let address = self.geometry.ddram_address(col, row);
        self.command(Instruction::SetDdramAddr as u8 | address, settle::COMMAND)
            .await
    }

    pub async fn write_byte(&mut self, character: u8) -> Result<(), I::Error> {
        self.send(character, Mode::Data, settle::WRITE_DATA).await
    }

    /// Write string to display.
    pub async fn write_str(&mut self, data: &str) -> Result<(), I::Error> {
        for c in data.chars() {
            self.write_byte(c as u8).await?;
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

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::test_support::{self, command, data, RecordingDelay, ADDRESS};
    use embassy_futures::block_on;
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTransaction};

    #[test]
    fn init_sequence() {
        let mut i2c = I2cMock::new(&test_support::init_sequence());
        let mut delay = RecordingDelay::default();

        let lcd = block_on(Lcd::new(&mut i2c, &mut delay).init()).unwrap();
        assert_eq!(lcd.display_control().instruction(), 0x0c);

        assert_eq!(delay.take(), test_support::init_waits());
        i2c.done();
    }

    #[test]
    fn cursor_and_glyph() {
        let glyph = [0x04; 8];
        let mut expected = command(0x80 | (0x40 + 15));
        expected.extend(command(0x40 | (1 << 3)));
        for row in glyph.iter() {
            expected.extend(data(*row));
        }
        expected.extend(command(0x80));
        expected.extend(command(0x08 | 0b001));
        expected.extend(command(0x08 | 0b011));
        expected.extend(data(b'o'));
        expected.extend(data(b'k'));
        let mut i2c = I2cMock::new(&expected);
        let mut delay = RecordingDelay::default();

        let mut lcd = Lcd::new(&mut i2c, &mut delay);
        block_on(async {
            lcd.set_cursor(99, 1).await.unwrap();
            lcd.define_glyph(9, &glyph).await.unwrap();
            lcd.blink().await.unwrap();
            lcd.cursor().await.unwrap();
            lcd.write_str("ok").await.unwrap();
        });

        i2c.done();
    }

    #[test]
    fn set_cursor_is_clamped() {
        let mut expected = command(0x80 | (0x54 + 19)); // (19, 3)
        expected.extend(command(0x80 | (0x14 + 19))); // (25, 2) -> (19, 2)
        expected.extend(command(0x80 | (0x54 + 5))); // (5, 9) -> (5, 3)
        let mut i2c = I2cMock::new(&expected);
        let mut delay = RecordingDelay::default();

        let mut lcd = Lcd::new(&mut i2c, &mut delay).with_columns(20).with_rows(4);
        block_on(async {
            lcd.set_cursor(19, 3).await.unwrap();
            lcd.set_cursor(25, 2).await.unwrap();
            lcd.set_cursor(5, 9).await.unwrap();
        });

        i2c.done();
    }

    #[test]
    fn entry_mode_flags_accumulate() {
        let mut expected = command(0x04 | 0b10); // left to right
        expected.extend(command(0x04 | 0b11)); // autoscroll
        expected.extend(command(0x04 | 0b01)); // right to left
        expected.extend(command(0x04 | 0b00)); // no autoscroll
        let mut i2c = I2cMock::new(&expected);
        let mut delay = RecordingDelay::default();

        let mut lcd = Lcd::new(&mut i2c, &mut delay);
        block_on(async {
            lcd.left_to_right().await.unwrap();
            lcd.autoscroll().await.unwrap();
            lcd.right_to_left().await.unwrap();
            assert!(lcd.entry_mode().contains(EntryMode::Increment));
            lcd.no_autoscroll().await.unwrap();
        });
        assert_eq!(lcd.entry_mode().bits(), 0);

        i2c.done();
    }

    #[test]
    fn display_control_flags_accumulate() {
        let mut expected = command(0x08 | 0b001); // blink
        expected.extend(command(0x08 | 0b011)); // cursor
        expected.extend(command(0x08 | 0b111)); // display
        expected.extend(command(0x08 | 0b101)); // no cursor
        expected.extend(command(0x08 | 0b100)); // no blink
        expected.extend(command(0x08 | 0b000)); // no display
        let mut i2c = I2cMock::new(&expected);
        let mut delay = RecordingDelay::default();

        let mut lcd = Lcd::new(&mut i2c, &mut delay);
        block_on(async {
            lcd.blink().await.unwrap();
            lcd.cursor().await.unwrap();
            lcd.display().await.unwrap();
            lcd.no_cursor().await.unwrap();
            assert!(lcd.display_control().contains(DisplayControl::CursorBlink));
            lcd.no_blink().await.unwrap();
            lcd.no_display().await.unwrap();
        });
        assert_eq!(lcd.display_control().bits(), 0);

        i2c.done();
    }

    #[test]
    fn clear_and_home_settle_longest() {
        let mut expected = std::vec::Vec::new();
        for op in [0x0c, 0x06, 0x18, 0x80, 0x01, 0x02].iter() {
            expected.extend(command(*op));
        }
        expected.extend(data(b'a'));
        let mut i2c = I2cMock::new(&expected);
        let mut delay = RecordingDelay::default();

        let mut lcd = Lcd::new(&mut i2c, &mut delay);
        block_on(async {
            lcd.display().await.unwrap();
            lcd.left_to_right().await.unwrap();
            lcd.scroll_display_left().await.unwrap();
            lcd.set_cursor(0, 0).await.unwrap();
            lcd.clear().await.unwrap();
            lcd.home().await.unwrap();
            lcd.write_byte(b'a').await.unwrap();
        });

        let waits = delay.take();
        let settles: std::vec::Vec<u32> = waits.chunks(4).map(|c| c[3]).collect();
        assert_eq!(settles, std::vec![37, 37, 37, 37, 1600, 1600, 41]);
        let longest_other = waits[..16].iter().chain(waits[24..].iter()).max().unwrap();
        assert!(settles[4] > *longest_other);
        assert!(settles[5] > *longest_other);
        i2c.done();
    }

    #[test]
    fn backlight_writes_only_the_backlight_line() {
        let expected = std::vec![
            I2cTransaction::write(ADDRESS, std::vec![0b0000_0000]),
            I2cTransaction::write(ADDRESS, std::vec![0b0000_1000]),
            I2cTransaction::write(ADDRESS, std::vec![0b0000_0000]),
        ];
        let mut i2c = I2cMock::new(&expected);
        let mut delay = RecordingDelay::default();

        let mut lcd = Lcd::new(&mut i2c, &mut delay);
        block_on(async {
            lcd.no_backlight().await.unwrap();
            assert_eq!(lcd.backlight_state(), Backlight::Off);
            lcd.backlight().await.unwrap();
            assert_eq!(lcd.backlight_state(), Backlight::On);
            lcd.set_backlight(Backlight::Off).await.unwrap();
        });
        assert_eq!(lcd.backlight_state(), Backlight::Off);
        assert!(delay.take().is_empty());

        i2c.done();
    }

    #[test]
    fn shift_commands() {
        let mut expected = command(0x18);
        expected.extend(command(0x1c));
        expected.extend(command(0x10));
        expected.extend(command(0x14));
        let mut i2c = I2cMock::new(&expected);
        let mut delay = RecordingDelay::default();

        let mut lcd = Lcd::new(&mut i2c, &mut delay);
        block_on(async {
            lcd.scroll_display_left().await.unwrap();
            lcd.scroll_display_right().await.unwrap();
            lcd.move_cursor_left().await.unwrap();
            lcd.move_cursor_right().await.unwrap();
        });
        assert_eq!(lcd.display_control().bits(), 0);
        assert_eq!(lcd.entry_mode().bits(), 0);

        i2c.done();
    }
}
