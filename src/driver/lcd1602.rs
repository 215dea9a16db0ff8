use std::thread::sleep;
use std::time::Duration;

use anyhow::{Context as _, Result, bail};

use crate::driver::I2cBus;

pub const ADDRESS: u16 = 0x27;
pub const COLUMNS: usize = 16;
pub const LINES: u8 = 2;

// PCF8574 pin mapping of the common backpack.
const RS: u8 = 0x01;
const ENABLE: u8 = 0x04;
const BACKLIGHT: u8 = 0x08;

const CMD_CLEAR: u8 = 0x01;
const CMD_ENTRY_MODE_INCREMENT: u8 = 0x06;
const CMD_DISPLAY_ON: u8 = 0x0c;
const CMD_FUNCTION_4BIT_2LINE: u8 = 0x28;
const CMD_SET_DDRAM: u8 = 0x80;

const LINE_OFFSETS: [u8; LINES as usize] = [0x00, 0x40];

/// HD44780 16x2 character display behind a PCF8574 I2C expander.
pub struct Lcd1602<B> {
    bus: B,
}

impl<B: I2cBus> Lcd1602<B> {
    pub fn new(bus: B) -> Result<Self> {
        let mut lcd = Self { bus };
        lcd.init().context("failed to initialize LCD")?;
        Ok(lcd)
    }

    fn init(&mut self) -> Result<()> {
        // Force 8-bit mode three times, then switch to 4-bit.
        for _ in 0..3 {
            self.write_nibble(0x03, 0)?;
            sleep(Duration::from_millis(5));
        }
        self.write_nibble(0x02, 0)?;

        self.command(CMD_FUNCTION_4BIT_2LINE)?;
        self.command(CMD_DISPLAY_ON)?;
        self.command(CMD_ENTRY_MODE_INCREMENT)?;
        self.clear()
    }

    pub fn clear(&mut self) -> Result<()> {
        self.command(CMD_CLEAR)?;
        sleep(Duration::from_millis(2));
        Ok(())
    }

    /// Overwrites a whole line, padding or truncating to the display width.
    pub fn print_line(&mut self, line: u8, text: &str) -> Result<()> {
        let Some(&offset) = LINE_OFFSETS.get(usize::from(line)) else {
            bail!("LCD line out of range: expected 0-{}, got {line}", LINES - 1);
        };

        self.command(CMD_SET_DDRAM | offset)?;
        for byte in fit_line(text).bytes() {
            self.write_byte(byte, RS)?;
        }

        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    fn command(&mut self, value: u8) -> Result<()> {
        self.write_byte(value, 0)
    }

    fn write_byte(&mut self, value: u8, mode: u8) -> Result<()> {
        self.write_nibble(value >> 4, mode)?;
        self.write_nibble(value & 0x0f, mode)
    }

    fn write_nibble(&mut self, nibble: u8, mode: u8) -> Result<()> {
        let data = (nibble << 4) | mode | BACKLIGHT;
        self.bus.write_byte(ADDRESS, data | ENABLE)?;
        self.bus.write_byte(ADDRESS, data & !ENABLE)
    }
}

/// ASCII-only, exactly [`COLUMNS`] characters.
pub fn fit_line(text: &str) -> String {
    let mut line: String = text
        .chars()
        .map(|c| if c.is_ascii() && !c.is_ascii_control() { c } else { '?' })
        .take(COLUMNS)
        .collect();
    while line.len() < COLUMNS {
        line.push(' ');
    }
    line
}
